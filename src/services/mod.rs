// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod consent;
pub mod flatten;
pub mod output;
pub mod reporting;

pub use auth::{
    AuthorizedClient, Authenticator, ConsentFlow, ConsentGrant, ConsentRequest, CredentialState,
};
pub use consent::{LoopbackConsent, PendingConsent};
pub use flatten::flatten;
pub use output::{render_csv, write_csv};
pub use reporting::ReportingClient;
