// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-shot OAuth redirect handler served on the loopback interface.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

use crate::error::AppError;

/// Outcome delivered to the waiting consent flow: the authorization code.
pub type CallbackOutcome = Result<String, AppError>;

const SUCCESS_PAGE: &str =
    "<html><body><p>Authorization complete. You may close this window.</p></body></html>";
const FAILURE_PAGE: &str =
    "<html><body><p>Authorization failed. Check the terminal for details.</p></body></html>";

/// Query parameters the authorization server appends to the redirect.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<str>,
    sender: Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>,
}

/// Router that answers the first redirect and forwards its outcome on `sender`.
pub fn routes(expected_state: String, sender: oneshot::Sender<CallbackOutcome>) -> Router {
    Router::new()
        .route("/", get(oauth_callback))
        .with_state(CallbackState {
            expected_state: expected_state.into(),
            sender: Arc::new(Mutex::new(Some(sender))),
        })
}

async fn oauth_callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<&'static str>) {
    let outcome = check_callback(&state.expected_state, params);
    let response = match &outcome {
        Ok(_) => (StatusCode::OK, Html(SUCCESS_PAGE)),
        Err(e) => {
            tracing::warn!(error = %e, "OAuth callback rejected");
            (StatusCode::BAD_REQUEST, Html(FAILURE_PAGE))
        }
    };

    match state.sender.lock().await.take() {
        Some(sender) => {
            // Receiver only goes away if the flow was abandoned
            let _ = sender.send(outcome);
        }
        None => tracing::debug!("Ignoring repeated OAuth callback"),
    }

    response
}

/// Validate redirect parameters and extract the authorization code.
pub fn check_callback(expected_state: &str, params: CallbackParams) -> CallbackOutcome {
    if let Some(error) = params.error {
        return Err(AppError::AuthFlow(format!(
            "Authorization denied by user or server: {}",
            error
        )));
    }

    if params.state.as_deref() != Some(expected_state) {
        return Err(AppError::AuthFlow(
            "OAuth state mismatch; possible forged redirect".into(),
        ));
    }

    params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::AuthFlow("Redirect carried no authorization code".into()))
}
