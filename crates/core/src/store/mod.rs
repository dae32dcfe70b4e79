//! The record store seam.
//!
//! Persistence, authentication, and row-level authorization live in an
//! external hosted backend; this module is the thin typed client for the
//! four calls ERA makes against it. [`HttpRecordStore`] talks to the real
//! backend, [`MemoryRecordStore`] backs tests and local demos.

mod http;
mod memory;

pub use http::HttpRecordStore;
pub use memory::MemoryRecordStore;

use crate::audit::AuditEntry;
use async_trait::async_trait;
use era_identifier::PatientTag;
use era_types::{PatientAttributes, Role};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("record store returned status {0}")]
    Status(u16),
    #[error("failed to decode record store response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("record store unavailable")]
    Unavailable,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Access to the hosted record store.
///
/// Every method is one outbound call; none of them cache. Errors are
/// transport or status failures; "not found" and "token not recognised"
/// are `Ok(None)`, so callers can tell a definite negative from an outage.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Resolves a bearer token to the authenticated user's id, or `None`
    /// when the token is not recognised.
    async fn verify_token(&self, token: &str) -> StoreResult<Option<String>>;

    /// Fetches one patient's profile by canonical tag.
    async fn fetch_patient(&self, tag: &PatientTag) -> StoreResult<Option<PatientAttributes>>;

    /// Fetches the roles assigned to a user. Evaluated fresh per request.
    async fn fetch_roles(&self, user_id: &str) -> StoreResult<Vec<Role>>;

    /// Appends one audit entry.
    async fn append_audit(&self, entry: &AuditEntry) -> StoreResult<()>;
}
