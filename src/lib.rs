// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! ga-extract: pull a fixed Google Analytics report into a flat file
//!
//! Authenticates against the Analytics Reporting API, fetches users and
//! sessions by date, device category and medium for one date range, and
//! writes the rows as comma-separated text.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use error::Result;
use models::FlattenedTable;
use services::{flatten, write_csv, Authenticator, ConsentFlow, ReportingClient};

/// Authenticate, fetch, flatten and write.
///
/// The output file is only written once the whole table has been built.
pub async fn run<C: ConsentFlow>(config: &Config, consent: C) -> Result<FlattenedTable> {
    let authenticator = Authenticator::new(config, consent);
    let client = authenticator.obtain_client().await?;

    let reporting = ReportingClient::new(config);
    let response = reporting
        .fetch(&client, config.start_date, config.end_date)
        .await?;

    let table = flatten(&response)?;
    write_csv(&config.output_path, &table)?;

    Ok(table)
}
