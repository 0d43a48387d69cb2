//! Persistence layer (local credential file).

pub mod credential_store;

pub use credential_store::CredentialStore;
