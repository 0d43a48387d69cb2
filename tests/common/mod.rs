// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Form, Router,
};
use chrono::{Duration, Utc};
use ga_extract::config::Config;
use ga_extract::error::AppError;
use ga_extract::models::StoredCredentials;
use ga_extract::services::{ConsentFlow, ConsentGrant, ConsentRequest};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Scope the tool requests.
#[allow(dead_code)]
pub const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";

/// Response body of the two-row example report.
#[allow(dead_code)]
pub fn sample_report_json() -> Value {
    serde_json::json!({
        "reports": [{
            "columnHeader": {
                "dimensions": ["ga:date", "ga:deviceCategory", "ga:medium"],
                "metricHeader": {
                    "metricHeaderEntries": [
                        {"name": "ga:users", "type": "INTEGER"},
                        {"name": "ga:sessions", "type": "INTEGER"}
                    ]
                }
            },
            "data": {
                "rows": [
                    {"dimensions": ["20210110", "mobile", "organic"], "metrics": [{"values": ["10", "5"]}]},
                    {"dimensions": ["20210111", "desktop", "referral"], "metrics": [{"values": ["20", "8"]}]}
                ],
                "totals": [{"values": ["30", "13"]}],
                "rowCount": 2
            }
        }]
    })
}

/// Expected serialization of [`sample_report_json`].
#[allow(dead_code)]
pub const SAMPLE_CSV: &str = "date,deviceCategory,medium,users,sessions\n\
20210110,mobile,organic,10,5\n\
20210111,desktop,referral,20,8\n";

// ─── Mock Google endpoints ───────────────────────────────────────────────────

/// Requests seen by the mock and the replies it gives.
pub struct MockState {
    pub token_requests: Vec<HashMap<String, String>>,
    /// (Authorization header, JSON body)
    pub report_requests: Vec<(Option<String>, Value)>,
    pub token_reply: (StatusCode, Value),
    pub report_reply: (StatusCode, String),
}

/// Mock of the OAuth token endpoint (`/token`) and `reports:batchGet` (`/batchGet`).
#[derive(Clone)]
pub struct MockGoogle {
    pub state: Arc<Mutex<MockState>>,
}

#[allow(dead_code)]
impl MockGoogle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                token_requests: Vec::new(),
                report_requests: Vec::new(),
                token_reply: (
                    StatusCode::OK,
                    serde_json::json!({
                        "access_token": "ya29.fresh",
                        "refresh_token": "1//fresh-refresh",
                        "expires_in": 3599,
                        "scope": READONLY_SCOPE,
                        "token_type": "Bearer"
                    }),
                ),
                report_reply: (StatusCode::OK, sample_report_json().to_string()),
            })),
        }
    }

    pub fn set_token_reply(&self, status: StatusCode, body: Value) {
        self.state.lock().unwrap().token_reply = (status, body);
    }

    pub fn set_report_reply(&self, status: StatusCode, body: impl Into<String>) {
        self.state.lock().unwrap().report_reply = (status, body.into());
    }

    pub fn token_requests(&self) -> Vec<HashMap<String, String>> {
        self.state.lock().unwrap().token_requests.clone()
    }

    pub fn report_requests(&self) -> Vec<(Option<String>, Value)> {
        self.state.lock().unwrap().report_requests.clone()
    }

    /// Serve on an ephemeral loopback port; returns the base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/token", post(token_handler))
            .route("/batchGet", post(report_handler))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }
}

async fn token_handler(
    State(mock): State<MockGoogle>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, axum::Json<Value>) {
    let mut state = mock.state.lock().unwrap();
    state.token_requests.push(form);
    let (status, body) = state.token_reply.clone();
    (status, axum::Json(body))
}

async fn report_handler(
    State(mock): State<MockGoogle>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let mut state = mock.state.lock().unwrap();
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let json = serde_json::from_str(&body).unwrap_or(Value::Null);
    state.report_requests.push((auth, json));

    let (status, reply) = state.report_reply.clone();
    (status, [(header::CONTENT_TYPE, "application/json")], reply)
}

// ─── Consent stub ────────────────────────────────────────────────────────────

/// Consent flow that answers immediately without a browser.
#[derive(Clone, Default)]
pub struct StubConsent {
    pub calls: Arc<AtomicUsize>,
    pub deny: bool,
    pub seen_scopes: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl StubConsent {
    pub fn granting() -> Self {
        Self::default()
    }

    pub fn denying() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ConsentFlow for StubConsent {
    async fn request_consent(&self, request: &ConsentRequest) -> Result<ConsentGrant, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_scopes
            .lock()
            .unwrap()
            .push(request.scope().to_string());

        if self.deny {
            return Err(AppError::AuthFlow(
                "Authorization denied by user or server: access_denied".into(),
            ));
        }

        Ok(ConsentGrant {
            code: "4/stub-code".to_string(),
            redirect_uri: "http://127.0.0.1:9/".to_string(),
        })
    }
}

// ─── Workspace ───────────────────────────────────────────────────────────────

/// Config whose files live in a temp dir and whose endpoints point at `base_url`.
#[allow(dead_code)]
pub fn test_config(dir: &TempDir, base_url: &str) -> Config {
    let client_secrets_path = dir.path().join("secrets.json");
    write_client_secrets(&client_secrets_path, &format!("{}/token", base_url));

    Config {
        client_secrets_path,
        credentials_path: dir.path().join("analyticsreporting.dat"),
        output_path: dir.path().join("out.csv"),
        reporting_endpoint: format!("{}/batchGet", base_url),
        ..Config::test_default()
    }
}

#[allow(dead_code)]
pub fn write_client_secrets(path: &Path, token_uri: &str) {
    let secrets = serde_json::json!({
        "installed": {
            "client_id": "test-client.apps.googleusercontent.com",
            "client_secret": "test-secret",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": token_uri,
            "redirect_uris": ["http://localhost"]
        }
    });
    std::fs::write(path, secrets.to_string()).unwrap();
}

/// Credentials expiring `minutes` from now (negative for already expired).
#[allow(dead_code)]
pub fn credentials_expiring_in(
    minutes: i64,
    refresh_token: Option<&str>,
    token_uri: &str,
) -> StoredCredentials {
    StoredCredentials {
        access_token: "ya29.stored".to_string(),
        refresh_token: refresh_token.map(String::from),
        expires_at: Utc::now() + Duration::minutes(minutes),
        scopes: vec![READONLY_SCOPE.to_string()],
        token_uri: token_uri.to_string(),
        invalid: false,
    }
}
