// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Comma-separated output.
//!
//! Fields are joined with a bare comma; values containing commas or
//! newlines are written as-is.

use crate::error::AppError;
use crate::models::FlattenedTable;
use std::fs;
use std::path::Path;

/// Render the table, one `\n`-terminated line per row.
pub fn render_csv(table: &FlattenedTable) -> String {
    let mut out = String::new();
    for row in table.rows() {
        let line: Vec<String> = row.iter().map(ToString::to_string).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

/// Write the table to `path`, replacing any existing file.
pub fn write_csv(path: &Path, table: &FlattenedTable) -> Result<(), AppError> {
    fs::write(path, render_csv(table)).map_err(|e| AppError::io(path, e))?;
    tracing::info!(
        path = %path.display(),
        rows = table.data_rows().len(),
        "Report written"
    );
    Ok(())
}
