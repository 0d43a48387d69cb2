// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth2 authorization for the Reporting API.
//!
//! Handles:
//! - Client secrets loading
//! - Credential state classification (missing / expired / valid)
//! - Silent token refresh when the access token is expiring
//! - Interactive consent (PKCE authorization code flow) when nothing usable is stored

use crate::config::Config;
use crate::db::CredentialStore;
use crate::error::AppError;
use crate::models::{ClientSecrets, StoredCredentials};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Read-only access to Analytics reporting. Nothing broader is ever requested.
pub const ANALYTICS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

// ─────────────────────────────────────────────────────────────────────────────
// Credential state
// ─────────────────────────────────────────────────────────────────────────────

/// What the stored credentials allow us to do.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialState {
    /// Nothing usable: consent is required.
    NoCredentials,
    /// Access token expiring, refresh token available.
    Expired(StoredCredentials),
    /// Access token usable as-is.
    Valid(StoredCredentials),
}

impl CredentialState {
    /// Classify whatever the store returned.
    pub fn classify(stored: Option<StoredCredentials>, now: DateTime<Utc>) -> Self {
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);

        match stored {
            None => CredentialState::NoCredentials,
            Some(c) if c.invalid => CredentialState::NoCredentials,
            Some(c) if !c.expires_within(now, margin) => CredentialState::Valid(c),
            Some(c) if c.has_refresh_token() => CredentialState::Expired(c),
            Some(_) => CredentialState::NoCredentials,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CredentialState::NoCredentials => "no_credentials",
            CredentialState::Expired(_) => "expired",
            CredentialState::Valid(_) => "valid",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Consent capability
// ─────────────────────────────────────────────────────────────────────────────

/// Parameters of one interactive authorization attempt.
#[derive(Debug, Clone)]
pub struct ConsentRequest {
    client_id: String,
    auth_uri: String,
    scope: String,
    state: String,
    code_challenge: String,
}

impl ConsentRequest {
    /// Readonly-scoped request with a fresh `state` and the S256 challenge
    /// for `code_verifier`.
    pub fn new(secrets: &ClientSecrets, code_verifier: &str) -> Result<Self, AppError> {
        Ok(Self {
            client_id: secrets.client_id.clone(),
            auth_uri: secrets.auth_uri.clone(),
            scope: ANALYTICS_READONLY_SCOPE.to_string(),
            state: generate_state()?,
            code_challenge: generate_code_challenge(code_verifier),
        })
    }

    /// Anti-forgery value the callback must echo back.
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Authorization URL the user visits, for a given redirect URI.
    pub fn authorization_url(&self, redirect_uri: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&code_challenge={}&code_challenge_method=S256&access_type=offline&prompt=consent",
            self.auth_uri,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&self.scope),
            urlencoding::encode(&self.state),
            urlencoding::encode(&self.code_challenge),
        )
    }
}

/// Authorization code returned by a completed consent step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentGrant {
    pub code: String,
    /// Must match the redirect URI used in the authorization URL
    pub redirect_uri: String,
}

/// Performs the user-facing consent step.
///
/// The production implementation is [`crate::services::LoopbackConsent`];
/// tests substitute a stub.
#[allow(async_fn_in_trait)]
pub trait ConsentFlow {
    async fn request_consent(&self, request: &ConsentRequest) -> Result<ConsentGrant, AppError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Token endpoint
// ─────────────────────────────────────────────────────────────────────────────

/// Token response from the authorization server.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Convert into storable credentials.
    ///
    /// `previous_refresh_token` is kept when the server does not rotate it.
    pub fn into_credentials(
        self,
        now: DateTime<Utc>,
        token_uri: &str,
        previous_refresh_token: Option<String>,
    ) -> StoredCredentials {
        let expires_in = self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let scopes = self
            .scope
            .as_deref()
            .unwrap_or(ANALYTICS_READONLY_SCOPE)
            .split(' ')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        StoredCredentials {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh_token),
            expires_at: now + Duration::seconds(expires_in),
            scopes,
            token_uri: token_uri.to_string(),
            invalid: false,
        }
    }
}

/// OAuth error body (`{"error": "...", "error_description": "..."}`).
#[derive(Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client for the OAuth token endpoint.
#[derive(Clone)]
pub struct TokenEndpoint {
    http: reqwest::Client,
    token_uri: String,
    client_id: String,
    client_secret: String,
}

impl TokenEndpoint {
    pub fn new(http: reqwest::Client, token_uri: &str, secrets: &ClientSecrets) -> Self {
        Self {
            http,
            token_uri: token_uri.to_string(),
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
        }
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AppError> {
        self.post_grant(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("code_verifier", code_verifier),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .await
    }

    /// Refresh an expired access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        self.post_grant(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
    }

    async fn post_grant(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(&self.token_uri)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::AuthFlow(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            return Err(match serde_json::from_str::<TokenErrorBody>(&body) {
                Ok(err) => AppError::AuthFlow(format!(
                    "Token endpoint returned {}: {}: {}",
                    status,
                    err.error,
                    err.error_description.unwrap_or_default()
                )),
                Err(_) => AppError::AuthFlow(format!("Token endpoint returned {}: {}", status, body)),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::AuthFlow(format!("Failed to parse token response: {}", e)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorized client
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP client carrying a usable bearer token.
#[derive(Clone)]
pub struct AuthorizedClient {
    http: reqwest::Client,
    access_token: String,
}

impl AuthorizedClient {
    pub fn new(http: reqwest::Client, access_token: impl Into<String>) -> Self {
        Self {
            http,
            access_token: access_token.into(),
        }
    }

    /// Start an authorized POST request.
    pub fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.http.post(url).bearer_auth(&self.access_token)
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for AuthorizedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedClient")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authenticator
// ─────────────────────────────────────────────────────────────────────────────

/// Produces an [`AuthorizedClient`] from stored or newly granted credentials.
pub struct Authenticator<C> {
    http: reqwest::Client,
    client_secrets_path: PathBuf,
    store: CredentialStore,
    consent: C,
}

impl<C: ConsentFlow> Authenticator<C> {
    pub fn new(config: &Config, consent: C) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_secrets_path: config.client_secrets_path.clone(),
            store: CredentialStore::new(config.credentials_path.clone()),
            consent,
        }
    }

    /// Load the client secrets descriptor.
    pub fn load_client_secrets(&self) -> Result<ClientSecrets, AppError> {
        let json = fs::read_to_string(&self.client_secrets_path).map_err(|e| {
            AppError::AuthConfig(format!(
                "Cannot read client secrets at {}: {}. Download an OAuth client \
                 descriptor from the Cloud Console and save it there.",
                self.client_secrets_path.display(),
                e
            ))
        })?;
        ClientSecrets::from_json(&json)
    }

    /// Return a client authorized for the Reporting API.
    ///
    /// 1. Load client secrets (always, so a broken descriptor fails early)
    /// 2. Classify stored credentials
    /// 3. Valid: use as-is
    /// 4. Expired: refresh; a rejected refresh falls through to consent
    /// 5. Nothing usable: interactive consent
    pub async fn obtain_client(&self) -> Result<AuthorizedClient, AppError> {
        let secrets = self.load_client_secrets()?;
        let state = CredentialState::classify(self.store.load()?, Utc::now());

        tracing::info!(
            state = state.name(),
            path = %self.store.path().display(),
            "Loaded stored credentials"
        );

        let credentials = match state {
            CredentialState::Valid(credentials) => credentials,
            CredentialState::Expired(credentials) => {
                match self.refresh(&secrets, credentials).await? {
                    Some(renewed) => renewed,
                    None => self.authorize_interactively(&secrets).await?,
                }
            }
            CredentialState::NoCredentials => self.authorize_interactively(&secrets).await?,
        };

        tracing::debug!(
            expires_at = %credentials.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "Using access token"
        );

        Ok(AuthorizedClient::new(
            self.http.clone(),
            credentials.access_token,
        ))
    }

    /// Refresh expiring credentials.
    ///
    /// Returns `None` when the server rejected the refresh token; the stored
    /// credentials are then marked invalid.
    async fn refresh(
        &self,
        secrets: &ClientSecrets,
        credentials: StoredCredentials,
    ) -> Result<Option<StoredCredentials>, AppError> {
        tracing::info!("Access token expired, refreshing");

        let endpoint = TokenEndpoint::new(self.http.clone(), &credentials.token_uri, secrets);
        let refresh_token = credentials.refresh_token.clone().unwrap_or_default();

        let tokens = match endpoint.refresh(&refresh_token).await {
            Ok(t) => t,
            Err(e) if e.is_invalid_grant() => {
                tracing::warn!(error = %e, "Refresh token rejected, re-authorization required");
                self.store.mark_invalid(credentials)?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let renewed =
            tokens.into_credentials(Utc::now(), &credentials.token_uri, Some(refresh_token));
        self.store.save(&renewed)?;

        tracing::info!("Token refreshed and stored");
        Ok(Some(renewed))
    }

    /// Run the consent flow, exchange the code and persist the result.
    async fn authorize_interactively(
        &self,
        secrets: &ClientSecrets,
    ) -> Result<StoredCredentials, AppError> {
        let code_verifier = generate_code_verifier()?;
        let request = ConsentRequest::new(secrets, &code_verifier)?;

        tracing::info!("No usable credentials, starting interactive authorization");
        let grant = self.consent.request_consent(&request).await?;

        let endpoint = TokenEndpoint::new(self.http.clone(), &secrets.token_uri, secrets);
        let tokens = endpoint
            .exchange_code(&grant.code, &code_verifier, &grant.redirect_uri)
            .await?;

        let credentials = tokens.into_credentials(Utc::now(), &secrets.token_uri, None);
        if !credentials.has_refresh_token() {
            tracing::warn!("Authorization server issued no refresh token");
        }
        self.store.save(&credentials)?;

        tracing::info!("Authorization complete, credentials stored");
        Ok(credentials)
    }
}

// ─── PKCE Utilities ──────────────────────────────────────────────────────────

fn random_token() -> Result<String, AppError> {
    let mut bytes = [0u8; 32];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::AuthFlow("System random source unavailable".into()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Generate a PKCE code verifier (43 characters of unreserved URI characters).
pub fn generate_code_verifier() -> Result<String, AppError> {
    random_token()
}

/// Generate the anti-forgery `state` parameter.
pub fn generate_state() -> Result<String, AppError> {
    random_token()
}

/// Derive the PKCE code challenge from a code verifier using S256.
pub fn generate_code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
