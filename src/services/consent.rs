// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interactive consent via a loopback redirect.
//!
//! Binds an ephemeral port on 127.0.0.1, shows the authorization URL (and
//! tries to open it in a browser), then waits until the authorization
//! server redirects back with a code or an error.

use crate::error::AppError;
use crate::routes::callback::{self, CallbackOutcome};
use crate::services::auth::{ConsentFlow, ConsentGrant, ConsentRequest};
use std::net::Ipv4Addr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Consent flow backed by a local HTTP listener.
#[derive(Debug, Clone)]
pub struct LoopbackConsent {
    open_browser: bool,
}

impl Default for LoopbackConsent {
    fn default() -> Self {
        Self { open_browser: true }
    }
}

impl LoopbackConsent {
    pub fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }

    /// Bind the loopback listener and start serving the redirect handler.
    pub async fn listen(&self, request: &ConsentRequest) -> Result<PendingConsent, AppError> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .map_err(|e| AppError::AuthFlow(format!("Cannot bind loopback listener: {}", e)))?;
        let port = listener
            .local_addr()
            .map_err(|e| AppError::AuthFlow(format!("Cannot read loopback address: {}", e)))?
            .port();

        let redirect_uri = format!("http://127.0.0.1:{}/", port);
        let authorization_url = request.authorization_url(&redirect_uri);

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = callback::routes(request.state().to_string(), outcome_tx);

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!(error = %e, "Loopback callback server failed");
            }
        });

        tracing::info!(port, "Waiting for OAuth redirect");
        Ok(PendingConsent {
            redirect_uri,
            authorization_url,
            outcome_rx,
            shutdown_tx,
        })
    }
}

/// A running loopback listener waiting for the authorization redirect.
#[derive(Debug)]
pub struct PendingConsent {
    redirect_uri: String,
    authorization_url: String,
    outcome_rx: oneshot::Receiver<CallbackOutcome>,
    shutdown_tx: oneshot::Sender<()>,
}

impl PendingConsent {
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn authorization_url(&self) -> &str {
        &self.authorization_url
    }

    /// Wait for the first redirect, then stop the listener.
    pub async fn wait(self) -> Result<ConsentGrant, AppError> {
        let outcome = self.outcome_rx.await.map_err(|_| {
            AppError::AuthFlow("Callback listener stopped before receiving a redirect".into())
        });
        let _ = self.shutdown_tx.send(());

        let code = outcome??;
        Ok(ConsentGrant {
            code,
            redirect_uri: self.redirect_uri,
        })
    }
}

impl ConsentFlow for LoopbackConsent {
    async fn request_consent(&self, request: &ConsentRequest) -> Result<ConsentGrant, AppError> {
        let pending = self.listen(request).await?;

        eprintln!(
            "\nOpen the following URL in your browser to authorize read-only Analytics access:\n\n    {}\n",
            pending.authorization_url()
        );

        if self.open_browser {
            if let Err(e) = open::that(pending.authorization_url()) {
                tracing::warn!(error = %e, "Could not open a browser; use the URL above");
            }
        }

        pending.wait().await
    }
}
