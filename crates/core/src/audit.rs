//! Best-effort audit trail of inference invocations.
//!
//! A failed append is warned and swallowed: the diagnosis response already
//! computed for the responder is never rolled back over a logging problem.

use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use era_types::TriageLevel;
use serde::Serialize;

/// Action name recorded for AI diagnosis invocations.
pub const ACTION_AI_DIAGNOSIS: &str = "ai_diagnosis";

/// One audit record.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub user_id: String,
    pub action: String,
    pub metadata: serde_json::Value,
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    /// Entry for one completed AI diagnosis request.
    pub fn ai_diagnosis(user_id: &str, patient_name: &str, triage_level: TriageLevel) -> Self {
        Self {
            user_id: user_id.to_owned(),
            action: ACTION_AI_DIAGNOSIS.to_owned(),
            metadata: serde_json::json!({
                "patientName": patient_name,
                "triageLevel": triage_level.as_str(),
            }),
            at: Utc::now(),
        }
    }
}

/// Appends `entry`, warning instead of failing when the store rejects it.
pub async fn record(store: &dyn RecordStore, entry: AuditEntry) {
    if let Err(error) = store.append_audit(&entry).await {
        tracing::warn!(%error, action = %entry.action, "audit append failed");
    }
}
