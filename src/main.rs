// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! ga-extract
//!
//! One-shot export of a fixed Analytics report to `out.csv`.

use anyhow::Context;
use ga_extract::{config::Config, services::LoopbackConsent};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Structured JSON logging on stderr
    init_logging();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        view_id = %config.view_id,
        output = %config.output_path.display(),
        "Starting report extraction"
    );

    let table = ga_extract::run(&config, LoopbackConsent::default())
        .await
        .context("Report extraction failed")?;

    tracing::info!(rows = table.data_rows().len(), "Done");
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ga_extract=debug,info")),
        )
        .with(format)
        .init();
}
