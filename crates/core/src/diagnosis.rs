//! The guarded diagnosis pipeline.
//!
//! One request walks authentication → rate limit → role gate → input
//! validation → model call → response validation → audit. The first failing
//! guard rejects the request and skips every later stage, including the
//! audit entry; in particular no upstream call is ever made for a request a
//! guard would have rejected.

use crate::audit::{self, AuditEntry};
use crate::chat;
use crate::error::DiagnosisError;
use crate::rate_limit::RateLimiter;
use crate::roles;
use crate::store::RecordStore;
use era_identifier::PatientTag;
use era_inference::Engine;
use era_types::{DiagnosisResult, PatientAttributes};
use std::sync::Arc;

/// Request-scoped orchestration over the record store, the rate limiter and
/// the inference engine.
///
/// Cheap to clone; all state is shared behind `Arc`s. The rate limiter map
/// is the only cross-request mutable state.
#[derive(Clone)]
pub struct TriageService {
    store: Arc<dyn RecordStore>,
    engine: Arc<dyn Engine>,
    limiter: Arc<RateLimiter>,
}

impl TriageService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        engine: Arc<dyn Engine>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            store,
            engine,
            limiter,
        }
    }

    /// Resolves the bearer token to a user id.
    ///
    /// A missing token and a token the store does not recognise are distinct
    /// failures; a store outage during verification surfaces as a store
    /// error rather than being mistaken for a bad credential.
    async fn authenticate(&self, token: Option<&str>) -> Result<String, DiagnosisError> {
        let token = token.ok_or(DiagnosisError::MissingToken)?;
        match self.store.verify_token(token).await? {
            Some(user_id) => Ok(user_id),
            None => Err(DiagnosisError::InvalidToken),
        }
    }

    /// Runs one AI diagnosis request end to end.
    ///
    /// `patient_data` arrives as loose JSON and is schema-validated here,
    /// after the role gate and before the model call, so a missing body and a
    /// shape mismatch reject with their own reasons without spending an
    /// upstream call.
    pub async fn diagnose(
        &self,
        token: Option<&str>,
        patient_data: Option<serde_json::Value>,
    ) -> Result<DiagnosisResult, DiagnosisError> {
        let user_id = self.authenticate(token).await?;

        if !self.limiter.allow(&user_id) {
            return Err(DiagnosisError::RateLimited);
        }

        let permitted = roles::authorize(self.store.as_ref(), &user_id)
            .await
            .map_err(DiagnosisError::RoleLookup)?;
        if !permitted {
            return Err(DiagnosisError::Forbidden);
        }

        let raw = patient_data.ok_or(DiagnosisError::MissingPatientData)?;
        let patient: PatientAttributes = serde_json::from_value(raw)
            .map_err(|e| DiagnosisError::InvalidPatientData(e.to_string()))?;

        let analysis = self.engine.analyze(&patient).await?;

        audit::record(
            self.store.as_ref(),
            AuditEntry::ai_diagnosis(&user_id, &patient.name, analysis.triage_level),
        )
        .await;

        Ok(analysis)
    }

    /// Proxies one chatbot exchange under the same authentication and rate
    /// limiting as diagnosis. Not audited.
    pub async fn chat(
        &self,
        token: Option<&str>,
        messages: Option<serde_json::Value>,
    ) -> Result<String, DiagnosisError> {
        let user_id = self.authenticate(token).await?;

        if !self.limiter.allow(&user_id) {
            return Err(DiagnosisError::RateLimited);
        }

        let transcript = chat::parse_transcript(messages)?;
        Ok(self.engine.chat(&transcript).await?)
    }

    /// Resolves raw scan input and fetches the patient's profile.
    ///
    /// Record visibility is the store's row-level concern; the only guards
    /// here are authentication and identifier validity.
    pub async fn lookup(
        &self,
        token: Option<&str>,
        raw_tag: &str,
    ) -> Result<PatientAttributes, DiagnosisError> {
        self.authenticate(token).await?;

        let tag = PatientTag::resolve(raw_tag)?;
        match self.store.fetch_patient(&tag).await? {
            Some(patient) => Ok(patient),
            None => Err(DiagnosisError::PatientNotFound),
        }
    }
}
