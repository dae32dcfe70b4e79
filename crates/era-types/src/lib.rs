//! # ERA Types
//!
//! Shared domain types for the ERA record-access system.
//!
//! Everything here is a plain data type with strict serde definitions: the
//! wire format is camelCase JSON, enums are closed (an unrecognised
//! `triageLevel` or `bloodType` fails deserialization instead of being
//! coerced), and validated newtypes guarantee their invariant once
//! constructed.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// Wraps a `String` and ensures it contains at least one non-whitespace
/// character. The input is trimmed of leading and trailing whitespace during
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the
    /// trimmed result is empty, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// ABO/Rh blood type, the eight clinically distinct values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
        }
    }
}

impl std::fmt::Display for BloodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Three-way severity classification attached to a diagnosis result.
///
/// Closed set: anything outside these three values is rejected at the
/// deserialization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TriageLevel {
    Critical,
    Urgent,
    Stable,
}

impl TriageLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Urgent => "urgent",
            Self::Stable => "stable",
        }
    }
}

impl std::fmt::Display for TriageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A role assigned to an authenticated user in the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Medic,
    Patient,
}

impl Role {
    /// True for the roles permitted to request AI diagnosis and view all
    /// patient records, as opposed to a patient's own restricted role.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Admin | Self::Medic)
    }
}

/// A patient's medical profile, as fetched from the record store or supplied
/// by the caller.
///
/// Treated as an immutable snapshot per request. `allergies` is carried as a
/// sequence but treated as a set; `medications` and `conditions` keep their
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientAttributes {
    pub name: String,
    pub age: u32,
    pub blood_type: BloodType,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
}

/// One candidate condition in a diagnosis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProbableCondition {
    pub condition: String,
    /// Confidence in percent. Numeric by type; the response validator
    /// additionally enforces the [0, 100] range.
    pub confidence: f64,
    #[serde(default)]
    pub severity: String,
}

/// A medication suggestion with its rationale and warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRecommendation {
    pub medication: String,
    pub reason: String,
    #[serde(default)]
    pub warning: String,
}

/// The validated output of one AI diagnosis request.
///
/// `triage_level`, `probable_conditions`, and `immediate_actions` are
/// required (the sequences may be empty); `medication_recommendations` is
/// optional. Field names on the wire match what the model is instructed to
/// produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub triage_level: TriageLevel,
    pub probable_conditions: Vec<ProbableCondition>,
    pub immediate_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_recommendations: Option<Vec<MedicationRecommendation>>,
    #[serde(default)]
    pub explanation: String,
}

/// Sender of one chatbot transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message in a chatbot transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}
