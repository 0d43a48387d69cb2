// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File-backed store for the user's OAuth credentials.
//!
//! One JSON document at a fixed path. A missing file and a file that does
//! not decode (including stores written by other OAuth clients) both mean
//! "not authorized"; the next consent overwrites it. I/O failures are errors.

use crate::error::AppError;
use crate::models::StoredCredentials;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Credential store rooted at a single file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load credentials, or `None` if nothing has been stored yet.
    pub fn load(&self) -> Result<Option<StoredCredentials>, AppError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::io(&self.path, e)),
        };

        match serde_json::from_str(&data) {
            Ok(credentials) => Ok(Some(credentials)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Stored credentials unreadable, ignoring them"
                );
                Ok(None)
            }
        }
    }

    /// Write credentials, replacing any previous contents.
    pub fn save(&self, credentials: &StoredCredentials) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(credentials)
            .map_err(|e| AppError::AuthConfig(format!("Failed to serialize credentials: {}", e)))?;

        fs::write(&self.path, json).map_err(|e| AppError::io(&self.path, e))?;
        restrict_permissions(&self.path)?;

        tracing::debug!(path = %self.path.display(), "Credentials stored");
        Ok(())
    }

    /// Flag the stored credentials as unusable so the next lookup re-authorizes.
    pub fn mark_invalid(&self, mut credentials: StoredCredentials) -> Result<(), AppError> {
        credentials.invalid = true;
        self.save(&credentials)
    }
}

/// Tokens are bearer secrets: owner read/write only.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), AppError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| AppError::io(path, e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), AppError> {
    Ok(())
}
