//! # ERA Core
//!
//! Core business logic for the ERA record-access system: the guarded
//! pipeline between a responder's scan and an AI diagnosis suggestion.
//!
//! This crate contains:
//! - the request guards (rate limiting, role gate) and their shared state
//! - the record store seam and its HTTP/in-memory implementations
//! - the diagnosis/chat/lookup orchestration ([`TriageService`])
//! - best-effort audit logging
//!
//! **No API concerns**: HTTP routing, status-code mapping, and OpenAPI
//! documentation belong in `api-rest`/`api-shared`.

pub mod audit;
pub mod chat;
pub mod config;
pub mod diagnosis;
pub mod error;
pub mod rate_limit;
pub mod roles;
pub mod store;

pub use config::CoreConfig;
pub use diagnosis::TriageService;
pub use error::DiagnosisError;
pub use rate_limit::RateLimiter;
pub use store::{HttpRecordStore, MemoryRecordStore, RecordStore, StoreError};
