// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run configuration loaded from environment variables.
//!
//! Built once at startup and passed by reference into the authenticator and
//! the report fetcher; nothing below `main` reads the environment.

use crate::error::AppError;
use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;

/// Reporting API v4 batch endpoint.
pub const DEFAULT_REPORTING_ENDPOINT: &str =
    "https://analyticsreporting.googleapis.com/v4/reports:batchGet";

const DEFAULT_CLIENT_SECRETS_PATH: &str = "secrets.json";
const DEFAULT_CREDENTIALS_PATH: &str = "analyticsreporting.dat";
const DEFAULT_OUTPUT_PATH: &str = "out.csv";

/// Fixed report date range.
const REPORT_START_DATE: &str = "2021-01-10";
const REPORT_END_DATE: &str = "2021-01-11";

/// Run configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Analytics view the report is scoped to
    pub view_id: String,
    /// OAuth client descriptor ("installed" or "web" application JSON)
    pub client_secrets_path: PathBuf,
    /// Persisted OAuth credentials
    pub credentials_path: PathBuf,
    /// Destination of the comma-separated output
    pub output_path: PathBuf,
    /// Full URL of the `reports:batchGet` method
    pub reporting_endpoint: String,
    /// First day of the report (inclusive)
    pub start_date: NaiveDate,
    /// Last day of the report (inclusive)
    pub end_date: NaiveDate,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let view_id = lookup("VIEW_ID")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Config("Missing required environment variable: VIEW_ID".into()))?;
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            view_id,
            client_secrets_path: var_or("CLIENT_SECRETS_PATH", DEFAULT_CLIENT_SECRETS_PATH).into(),
            credentials_path: var_or("CREDENTIALS_PATH", DEFAULT_CREDENTIALS_PATH).into(),
            output_path: var_or("OUTPUT_PATH", DEFAULT_OUTPUT_PATH).into(),
            reporting_endpoint: var_or("REPORTING_ENDPOINT", DEFAULT_REPORTING_ENDPOINT),
            start_date: parse_date(REPORT_START_DATE)?,
            end_date: parse_date(REPORT_END_DATE)?,
        })
    }

    /// Config with fixed local paths, for tests.
    pub fn test_default() -> Self {
        Self {
            view_id: "123456789".to_string(),
            client_secrets_path: DEFAULT_CLIENT_SECRETS_PATH.into(),
            credentials_path: DEFAULT_CREDENTIALS_PATH.into(),
            output_path: DEFAULT_OUTPUT_PATH.into(),
            reporting_endpoint: DEFAULT_REPORTING_ENDPOINT.to_string(),
            start_date: NaiveDate::from_ymd_opt(2021, 1, 10).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2021, 1, 11).unwrap_or_default(),
        }
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| AppError::Config(format!("Invalid date {:?}: {}", value, e)))
}
