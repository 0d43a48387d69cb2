// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.
//!
//! Every variant is fatal: the pipeline has no partial-success mode, so
//! errors propagate straight to `main` and abort the run.

/// OAuth error code for a rejected authorization code or refresh token.
pub const INVALID_GRANT: &str = "invalid_grant";

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Client secrets error: {0}")]
    AuthConfig(String),

    #[error("Authorization flow failed: {0}")]
    AuthFlow(String),

    #[error("{}", transport_message(.status, .body))]
    Transport {
        /// HTTP status, or `None` when no response was received.
        status: Option<u16>,
        body: String,
    },

    #[error("Reporting API error {code} ({status}): {message}")]
    Api {
        code: u16,
        status: String,
        message: String,
    },

    #[error("Report response contains no report blocks")]
    EmptyResponse,

    #[error("Report row {row} has no metric values")]
    MalformedRow { row: usize },

    #[error("Report row {row} has non-integer metric value {value:?}")]
    ValueFormat { row: usize, value: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn transport_message(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(status) => format!("HTTP {}: {}", status, body),
        None => format!("Request failed: {}", body),
    }
}

impl AppError {
    /// Wrap an I/O error together with the path it occurred on.
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Build a transport error from a reqwest failure that produced no response.
    pub fn transport(err: reqwest::Error) -> Self {
        AppError::Transport {
            status: err.status().map(|s| s.as_u16()),
            body: err.to_string(),
        }
    }

    /// Whether the authorization server rejected a grant (revoked or expired refresh token).
    pub fn is_invalid_grant(&self) -> bool {
        matches!(self, AppError::AuthFlow(msg) if msg.contains(INVALID_GRANT))
    }

    /// Whether the error was raised while checking the shape of a report response.
    pub fn is_response_shape_error(&self) -> bool {
        matches!(
            self,
            AppError::EmptyResponse | AppError::MalformedRow { .. } | AppError::ValueFormat { .. }
        )
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;
