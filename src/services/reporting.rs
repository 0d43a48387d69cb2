// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Analytics Reporting API v4 client.
//!
//! One `reports:batchGet` call per run: a single attempt, first page only.

use crate::config::Config;
use crate::error::AppError;
use crate::models::{DateRange, ReportQuery, ReportResponse};
use crate::services::auth::AuthorizedClient;
use chrono::NaiveDate;
use serde::Deserialize;

/// Google API error envelope (`{"error": {"code", "message", "status"}}`).
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Fetches the fixed report for a view.
#[derive(Debug, Clone)]
pub struct ReportingClient {
    endpoint: String,
    view_id: String,
}

impl ReportingClient {
    pub fn new(config: &Config) -> Self {
        Self {
            endpoint: config.reporting_endpoint.clone(),
            view_id: config.view_id.clone(),
        }
    }

    /// Build the query `fetch` would send for these dates.
    pub fn query(&self, start: NaiveDate, end: NaiveDate) -> Result<ReportQuery, AppError> {
        Ok(ReportQuery::new(
            self.view_id.clone(),
            DateRange::new(start, end)?,
        ))
    }

    /// Issue the batch query and parse the response.
    pub async fn fetch(
        &self,
        client: &AuthorizedClient,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ReportResponse, AppError> {
        let query = self.query(start, end)?;

        tracing::info!(
            view_id = %self.view_id,
            start = %start,
            end = %end,
            "Requesting report"
        );

        let response = client
            .post(&self.endpoint)
            .json(&query.to_request_body())
            .send()
            .await
            .map_err(AppError::transport)?;

        let status = response.status();
        let body = response.text().await.map_err(AppError::transport)?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), body));
        }

        let report = ReportResponse::from_json(&body).map_err(|e| AppError::Transport {
            status: Some(status.as_u16()),
            body: format!("Undecodable report response: {}", e),
        })?;

        if report
            .first_report()
            .is_some_and(|r| r.next_page_token.is_some())
        {
            tracing::warn!("Report has more pages; only the first page is used");
        }

        Ok(report)
    }
}

/// Map a non-2xx response to `Api` when it carries a Google error payload.
fn classify_error(status: u16, body: String) -> AppError {
    match serde_json::from_str::<ApiErrorEnvelope>(&body) {
        Ok(envelope) => {
            let err = envelope.error;
            tracing::error!(status, message = %err.message, "Reporting API error");
            AppError::Api {
                code: err.code.unwrap_or(status),
                status: err.status.unwrap_or_default(),
                message: err.message,
            }
        }
        Err(_) => {
            tracing::error!(status, "Reporting request failed");
            AppError::Transport {
                status: Some(status),
                body,
            }
        }
    }
}
