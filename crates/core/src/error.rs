use crate::store::StoreError;
use era_identifier::IdentifierError;
use era_inference::InferenceError;

/// Everything that can end a request before (or instead of) a diagnosis.
///
/// Guard failures are specific so the API layer can map each to its status
/// code and caller-facing message; nothing here escalates privilege or
/// masks an upstream condition as a generic failure.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosisError {
    #[error("authorization required")]
    MissingToken,
    #[error("invalid authentication")]
    InvalidToken,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("failed to verify user role")]
    RoleLookup(#[source] StoreError),
    #[error("insufficient permissions for AI diagnosis")]
    Forbidden,
    #[error("patient data required")]
    MissingPatientData,
    #[error("invalid patient data structure: {0}")]
    InvalidPatientData(String),
    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),
    #[error("patient record not found")]
    PatientNotFound,
    #[error("{0}")]
    InvalidChat(String),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("record store failure: {0}")]
    Store(#[from] StoreError),
}
