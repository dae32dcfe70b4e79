//! Request and response bodies for the REST API.
//!
//! Request bodies that wrap externally supplied, loosely typed JSON
//! (`patientData`, `messages`) deliberately carry `serde_json::Value`:
//! schema validation happens in core with specific caller-facing errors,
//! not in the deserializer with framework-shaped ones.

use era_types::{DiagnosisResult, PatientAttributes};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Uniform error body: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Body of `POST /api/resolve`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResolveReq {
    /// Raw scan/paste input: a bare UUID or a `/patient/<uuid>` URL.
    pub input: String,
}

/// Response of `POST /api/resolve`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRes {
    /// The canonical patient identifier.
    pub patient_id: String,
}

/// Response of `GET /api/patients/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub patient: PatientAttributes,
}

/// Body of `POST /api/diagnosis`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisReq {
    /// The patient's profile; validated against the attribute schema in
    /// core.
    #[schema(value_type = Object)]
    pub patient_data: Option<serde_json::Value>,
}

/// Response of `POST /api/diagnosis`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiagnosisRes {
    pub analysis: DiagnosisResult,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatReq {
    /// Transcript messages `[{role, content}]`; validated in core.
    #[schema(value_type = Object)]
    pub messages: Option<serde_json::Value>,
}

/// Response of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatRes {
    pub message: String,
}
