// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report query sent to `reports:batchGet`.

use crate::error::AppError;
use chrono::NaiveDate;
use serde::Serialize;

/// Namespace prefix the Reporting API uses for metric and dimension names.
pub const GA_PREFIX: &str = "ga:";

/// Metrics requested, in order.
pub const METRICS: [&str; 2] = ["users", "sessions"];

/// Dimensions requested, in order.
pub const DIMENSIONS: [&str; 3] = ["date", "deviceCategory", "medium"];

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::Config(format!(
                "Start date {} is after end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }
}

/// A single-report query with the fixed metric and dimension set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    view_id: String,
    date_range: DateRange,
}

impl ReportQuery {
    pub fn new(view_id: impl Into<String>, date_range: DateRange) -> Self {
        Self {
            view_id: view_id.into(),
            date_range,
        }
    }

    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    /// Metric expressions in request order, prefixed with `ga:`.
    pub fn metric_expressions(&self) -> Vec<String> {
        METRICS.iter().map(|m| format!("{}{}", GA_PREFIX, m)).collect()
    }

    /// Dimension names in request order, prefixed with `ga:`.
    pub fn dimension_names(&self) -> Vec<String> {
        DIMENSIONS
            .iter()
            .map(|d| format!("{}{}", GA_PREFIX, d))
            .collect()
    }

    /// Build the JSON request body.
    pub fn to_request_body(&self) -> BatchGetRequest {
        BatchGetRequest {
            report_requests: vec![ReportRequest {
                view_id: self.view_id.clone(),
                date_ranges: vec![WireDateRange {
                    start_date: self.date_range.start.format("%Y-%m-%d").to_string(),
                    end_date: self.date_range.end.format("%Y-%m-%d").to_string(),
                }],
                metrics: self
                    .metric_expressions()
                    .into_iter()
                    .map(|expression| Metric { expression })
                    .collect(),
                dimensions: self
                    .dimension_names()
                    .into_iter()
                    .map(|name| Dimension { name })
                    .collect(),
            }],
        }
    }
}

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetRequest {
    pub report_requests: Vec<ReportRequest>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub view_id: String,
    pub date_ranges: Vec<WireDateRange>,
    pub metrics: Vec<Metric>,
    pub dimensions: Vec<Dimension>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metric {
    pub expression: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dimension {
    pub name: String,
}
