//! # ERA Inference
//!
//! The guarded bridge to the external text-generation endpoint.
//!
//! This crate owns the two halves of the model contract:
//! - building the request: a fixed instruction template plus the patient's
//!   attributes, submitted to an OpenAI-style `/chat/completions` endpoint
//!   with a JSON response-mode hint and a bounded transport timeout
//!   ([`ModelClient`]);
//! - enforcing the response: strict structural validation of the model's
//!   output before it enters internal data structures ([`validate`]).
//!
//! The response-mode hint is best effort only. [`validate::parse_diagnosis`]
//! is the actual enforcement point; malformed output is rejected, never
//! coerced into a default diagnosis.

mod client;
mod error;
pub mod prompt;
pub mod validate;

pub use client::{ModelClient, ModelConfig};
pub use error::InferenceError;

use async_trait::async_trait;
use era_types::{ChatMessage, DiagnosisResult, PatientAttributes};

/// The inference seam between the orchestrator and the external endpoint.
///
/// [`ModelClient`] is the production implementation; tests substitute stubs
/// so the guard pipeline can be exercised without network access.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Submits one diagnosis request and returns the validated result.
    async fn analyze(&self, patient: &PatientAttributes)
        -> Result<DiagnosisResult, InferenceError>;

    /// Proxies a chatbot transcript and returns the assistant's reply text.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, InferenceError>;
}
