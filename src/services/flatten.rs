// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Projection of a report response onto a flat table.

use crate::error::AppError;
use crate::models::query::GA_PREFIX;
use crate::models::{Cell, FlattenedTable, ReportResponse, ReportRow};

/// Flatten the first report block into a header row plus one row per data row.
///
/// Rows keep the service's order. Only the first metric value set of each
/// row is read.
pub fn flatten(response: &ReportResponse) -> Result<FlattenedTable, AppError> {
    let report = response.first_report().ok_or(AppError::EmptyResponse)?;
    let header = &report.column_header;

    let header_row = header
        .dimensions
        .iter()
        .map(String::as_str)
        .chain(
            header
                .metric_header
                .metric_header_entries
                .iter()
                .map(|e| e.name.as_str()),
        )
        .map(|name| Cell::from(strip_namespace(name)))
        .collect();

    let mut table = FlattenedTable::new(header_row);
    for (index, row) in report.data.rows.iter().enumerate() {
        table.push_row(flatten_row(index, row)?);
    }

    tracing::debug!(rows = report.data.rows.len(), "Flattened report");
    Ok(table)
}

fn flatten_row(index: usize, row: &ReportRow) -> Result<Vec<Cell>, AppError> {
    let values = row
        .metrics
        .first()
        .ok_or(AppError::MalformedRow { row: index })?;

    let mut cells: Vec<Cell> = row.dimensions.iter().cloned().map(Cell::Text).collect();
    for value in &values.values {
        let n = value.parse::<i64>().map_err(|_| AppError::ValueFormat {
            row: index,
            value: value.clone(),
        })?;
        cells.push(Cell::Int(n));
    }
    Ok(cells)
}

/// Drop the reporting namespace prefix (`ga:date` -> `date`).
pub fn strip_namespace(name: &str) -> &str {
    name.strip_prefix(GA_PREFIX).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_namespace() {
        assert_eq!(strip_namespace("ga:date"), "date");
        assert_eq!(strip_namespace("date"), "date");
        // Only a leading prefix is namespace
        assert_eq!(strip_namespace("custom:ga:x"), "custom:ga:x");
    }

    #[test]
    fn test_metric_coercion() {
        let row = |v: &str| ReportRow {
            dimensions: vec!["20210110".into()],
            metrics: vec![crate::models::response::DateRangeValues {
                values: vec![v.into()],
            }],
        };

        assert_eq!(flatten_row(0, &row("42")).unwrap()[1], Cell::Int(42));
        assert_eq!(
            flatten_row(0, &row("9223372036854775807")).unwrap()[1],
            Cell::Int(i64::MAX)
        );
        for bad in ["4.2", "abc", "", "1e3", "9223372036854775808"] {
            assert!(matches!(
                flatten_row(3, &row(bad)),
                Err(AppError::ValueFormat { row: 3, .. })
            ));
        }
    }
}
