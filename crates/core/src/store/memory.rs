//! In-memory [`RecordStore`] for tests and local demos.

use super::{RecordStore, StoreError, StoreResult};
use crate::audit::AuditEntry;
use async_trait::async_trait;
use era_identifier::PatientTag;
use era_types::{PatientAttributes, Role};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Map-backed store populated builder-style.
///
/// The failure toggles simulate a store outage for one call kind, so guard
/// behaviour under storage errors can be exercised without a network.
#[derive(Default)]
pub struct MemoryRecordStore {
    tokens: HashMap<String, String>,
    patients: HashMap<Uuid, PatientAttributes>,
    roles: HashMap<String, Vec<Role>>,
    audit: Mutex<Vec<AuditEntry>>,
    fail_role_fetch: bool,
    fail_audit: bool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bearer token resolving to `user_id`.
    pub fn with_token(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), user_id.into());
        self
    }

    pub fn with_patient(mut self, tag: &PatientTag, patient: PatientAttributes) -> Self {
        self.patients.insert(tag.uuid(), patient);
        self
    }

    pub fn with_roles(mut self, user_id: impl Into<String>, roles: &[Role]) -> Self {
        self.roles.insert(user_id.into(), roles.to_vec());
        self
    }

    /// Makes every role fetch fail with [`StoreError::Unavailable`].
    pub fn failing_role_fetch(mut self) -> Self {
        self.fail_role_fetch = true;
        self
    }

    /// Makes every audit append fail with [`StoreError::Unavailable`].
    pub fn failing_audit(mut self) -> Self {
        self.fail_audit = true;
        self
    }

    /// Snapshot of the audit entries appended so far.
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn verify_token(&self, token: &str) -> StoreResult<Option<String>> {
        Ok(self.tokens.get(token).cloned())
    }

    async fn fetch_patient(&self, tag: &PatientTag) -> StoreResult<Option<PatientAttributes>> {
        Ok(self.patients.get(&tag.uuid()).cloned())
    }

    async fn fetch_roles(&self, user_id: &str) -> StoreResult<Vec<Role>> {
        if self.fail_role_fetch {
            return Err(StoreError::Unavailable);
        }
        Ok(self.roles.get(user_id).cloned().unwrap_or_default())
    }

    async fn append_audit(&self, entry: &AuditEntry) -> StoreResult<()> {
        if self.fail_audit {
            return Err(StoreError::Unavailable);
        }
        self.audit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry.clone());
        Ok(())
    }
}
