// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth client descriptor and persisted user credentials.

use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// OAuth client application, as downloaded from the Cloud Console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// The descriptor nests the application under its type.
#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse an "installed" or "web" client descriptor.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let file: ClientSecretsFile = serde_json::from_str(json)
            .map_err(|e| AppError::AuthConfig(format!("Malformed client secrets: {}", e)))?;

        let secrets = file.installed.or(file.web).ok_or_else(|| {
            AppError::AuthConfig(
                "Client secrets must contain an \"installed\" or \"web\" application".into(),
            )
        })?;

        if secrets.client_id.trim().is_empty() {
            return Err(AppError::AuthConfig("Client secrets have an empty client_id".into()));
        }

        Ok(secrets)
    }
}

/// User credentials persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub access_token: String,
    /// Absent when the server never issued one
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
    /// Granted OAuth scopes
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Token endpoint the refresh token belongs to
    pub token_uri: String,
    /// Set when the server rejected the refresh token
    #[serde(default)]
    pub invalid: bool,
}

impl StoredCredentials {
    /// Whether the access token expires within `margin` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin >= self.expires_at
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_installed_secrets() {
        let json = r#"{"installed": {
            "client_id": "abc.apps.googleusercontent.com",
            "client_secret": "shh",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token",
            "redirect_uris": ["http://localhost"]
        }}"#;

        let secrets = ClientSecrets::from_json(json).unwrap();
        assert_eq!(secrets.client_id, "abc.apps.googleusercontent.com");
        assert_eq!(secrets.redirect_uris, vec!["http://localhost"]);
    }

    #[test]
    fn test_parse_web_secrets() {
        let json = r#"{"web": {
            "client_id": "web-client",
            "client_secret": "shh",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token"
        }}"#;

        let secrets = ClientSecrets::from_json(json).unwrap();
        assert_eq!(secrets.client_id, "web-client");
        assert!(secrets.redirect_uris.is_empty());
    }

    #[test]
    fn test_reject_unknown_client_type() {
        let err = ClientSecrets::from_json(r#"{"service_account": {}}"#).unwrap_err();
        assert!(matches!(err, AppError::AuthConfig(_)));

        let err = ClientSecrets::from_json("not json").unwrap_err();
        assert!(matches!(err, AppError::AuthConfig(_)));
    }

    #[test]
    fn test_expires_within_margin() {
        let now = Utc::now();
        let creds = StoredCredentials {
            access_token: "a".into(),
            refresh_token: Some("r".into()),
            expires_at: now + Duration::minutes(3),
            scopes: vec![],
            token_uri: "https://oauth2.googleapis.com/token".into(),
            invalid: false,
        };

        assert!(creds.expires_within(now, Duration::minutes(5)));
        assert!(!creds.expires_within(now, Duration::minutes(1)));
    }
}
