//! HTTP implementation of [`RecordStore`] against the hosted backend.
//!
//! The backend exposes a token-introspection endpoint plus filtered row
//! reads and inserts. All calls share one client carrying the service key
//! and the uniform outbound timeout from [`CoreConfig`].

use super::{RecordStore, StoreError, StoreResult};
use crate::audit::AuditEntry;
use crate::config::CoreConfig;
use async_trait::async_trait;
use era_identifier::PatientTag;
use era_types::{BloodType, PatientAttributes, Role};
use reqwest::StatusCode;
use serde::Deserialize;

pub struct HttpRecordStore {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
}

/// Row shape of the `patients` table (snake_case columns).
#[derive(Deserialize)]
struct PatientRow {
    name: String,
    age: u32,
    blood_type: BloodType,
    #[serde(default)]
    allergies: Vec<String>,
    #[serde(default)]
    medications: Vec<String>,
    #[serde(default)]
    conditions: Vec<String>,
}

impl From<PatientRow> for PatientAttributes {
    fn from(row: PatientRow) -> Self {
        Self {
            name: row.name,
            age: row.age,
            blood_type: row.blood_type,
            allergies: row.allergies,
            medications: row.medications,
            conditions: row.conditions,
        }
    }
}

#[derive(Deserialize)]
struct RoleRow {
    role: Role,
}

impl HttpRecordStore {
    /// Builds the store client with the configured service key and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transport`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: &CoreConfig) -> StoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.record_store_url().trim_end_matches('/').to_string(),
            service_key: config.record_store_key().to_string(),
        })
    }

    async fn read_rows<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        filter: (&str, String),
        select: &str,
    ) -> StoreResult<Vec<T>> {
        let response = self
            .http
            .get(format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .query(&[(filter.0, filter.1.as_str()), ("select", select)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn verify_token(&self, token: &str) -> StoreResult<Option<String>> {
        let response = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let user: AuthUser = serde_json::from_str(&body)?;
        Ok(Some(user.id))
    }

    async fn fetch_patient(&self, tag: &PatientTag) -> StoreResult<Option<PatientAttributes>> {
        let rows: Vec<PatientRow> = self
            .read_rows(
                "patients",
                ("id", format!("eq.{}", tag)),
                "name,age,blood_type,allergies,medications,conditions",
            )
            .await?;
        Ok(rows.into_iter().next().map(PatientAttributes::from))
    }

    async fn fetch_roles(&self, user_id: &str) -> StoreResult<Vec<Role>> {
        let rows: Vec<RoleRow> = self
            .read_rows("user_roles", ("user_id", format!("eq.{}", user_id)), "role")
            .await?;
        Ok(rows.into_iter().map(|row| row.role).collect())
    }

    async fn append_audit(&self, entry: &AuditEntry) -> StoreResult<()> {
        let response = self
            .http
            .post(format!("{}/rest/v1/audit_log", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=minimal")
            .json(entry)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status.as_u16()));
        }
        Ok(())
    }
}
