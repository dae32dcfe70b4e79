//! # API Shared
//!
//! Shared utilities and definitions for the ERA API surface.
//!
//! Contains:
//! - Wire request/response types (`wire` module)
//! - Shared services like `HealthService`
//! - Authentication utilities (bearer token parsing)
//!
//! Used by `api-rest` and the runtime binary for common functionality.

pub mod auth;
pub mod health;
pub mod wire;

pub use health::HealthService;
pub use wire::*;
