// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed `reports:batchGet` response.
//!
//! The service omits empty arrays, so every container defaults to empty.

use serde::Deserialize;

/// Top-level batch response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    #[serde(default)]
    pub reports: Vec<Report>,
}

impl ReportResponse {
    /// Parse a response body.
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    /// The only block this program reads.
    pub fn first_report(&self) -> Option<&Report> {
        self.reports.first()
    }
}

/// One result set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub column_header: ColumnHeader,
    #[serde(default)]
    pub data: ReportData,
    /// Present when more rows are available; never followed.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnHeader {
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub metric_header: MetricHeader,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricHeader {
    #[serde(default)]
    pub metric_header_entries: Vec<MetricHeaderEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricHeaderEntry {
    pub name: String,
    /// Declared value type, e.g. `INTEGER`
    #[serde(rename = "type", default)]
    pub metric_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    #[serde(default)]
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportRow {
    #[serde(default)]
    pub dimensions: Vec<String>,
    /// One value set per requested date range
    #[serde(default)]
    pub metrics: Vec<DateRangeValues>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeValues {
    #[serde(default)]
    pub values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sparse_response() {
        // A report with no matching rows comes back without `rows`
        let body = r#"{
            "reports": [{
                "columnHeader": {
                    "dimensions": ["ga:date"],
                    "metricHeader": {"metricHeaderEntries": [{"name": "ga:users", "type": "INTEGER"}]}
                },
                "data": {"totals": [{"values": ["0"]}]}
            }]
        }"#;

        let response = ReportResponse::from_json(body).unwrap();
        let report = response.first_report().unwrap();
        assert!(report.data.rows.is_empty());
        assert_eq!(
            report.column_header.metric_header.metric_header_entries[0]
                .metric_type
                .as_deref(),
            Some("INTEGER")
        );
    }

    #[test]
    fn test_parse_empty_object() {
        let response = ReportResponse::from_json("{}").unwrap();
        assert!(response.first_report().is_none());
    }
}
