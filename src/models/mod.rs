// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod credentials;
pub mod query;
pub mod response;
pub mod table;

pub use credentials::{ClientSecrets, StoredCredentials};
pub use query::{DateRange, ReportQuery};
pub use response::{ReportResponse, ReportRow};
pub use table::{Cell, FlattenedTable};
