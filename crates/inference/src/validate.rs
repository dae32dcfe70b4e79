//! Boundary validation on both sides of the model call.
//!
//! [`require_attributes`] rejects a request locally before any network call
//! is made; [`parse_diagnosis`] enforces the response shape after. Neither
//! performs clinical validation: shape only, plausibility is out of scope.

use crate::InferenceError;
use era_types::{DiagnosisResult, NonEmptyText, PatientAttributes};

/// Checks that the attributes required for a diagnosis request are present.
///
/// `age` and `blood_type` are guaranteed by construction of
/// [`PatientAttributes`]; the remaining requirement is a non-blank name.
///
/// # Errors
///
/// Returns [`InferenceError::InvalidAttributes`] so the caller can reject
/// without spending an upstream call.
pub fn require_attributes(patient: &PatientAttributes) -> Result<(), InferenceError> {
    NonEmptyText::new(&patient.name)
        .map_err(|_| InferenceError::InvalidAttributes("name must not be blank".into()))?;
    Ok(())
}

/// Parses and structurally validates the model's raw response text.
///
/// The text must be a single JSON object with the diagnosis result shape:
/// `triageLevel` limited to the three enumerated values,
/// `probableConditions` and `immediateActions` present (possibly empty),
/// confidence values numeric and within `[0, 100]`.
///
/// # Errors
///
/// Returns [`InferenceError::Parse`] on any parse or shape failure. There is
/// no fallback diagnosis.
pub fn parse_diagnosis(raw: &str) -> Result<DiagnosisResult, InferenceError> {
    let result: DiagnosisResult =
        serde_json::from_str(raw).map_err(|e| InferenceError::Parse(e.to_string()))?;

    for candidate in &result.probable_conditions {
        if !(0.0..=100.0).contains(&candidate.confidence) {
            return Err(InferenceError::Parse(format!(
                "confidence {} outside [0, 100] for condition '{}'",
                candidate.confidence, candidate.condition
            )));
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use era_types::{BloodType, TriageLevel};

    fn patient(name: &str) -> PatientAttributes {
        PatientAttributes {
            name: name.into(),
            age: 40,
            blood_type: BloodType::APositive,
            allergies: vec![],
            medications: vec![],
            conditions: vec![],
        }
    }

    #[test]
    fn test_require_attributes_accepts_named_patient() {
        assert!(require_attributes(&patient("Ada")).is_ok());
    }

    #[test]
    fn test_require_attributes_rejects_blank_name() {
        assert!(matches!(
            require_attributes(&patient("   ")),
            Err(InferenceError::InvalidAttributes(_))
        ));
        assert!(require_attributes(&patient("")).is_err());
    }

    #[test]
    fn test_parse_diagnosis_minimal() {
        let raw = r#"{"triageLevel":"urgent","probableConditions":[],"immediateActions":[]}"#;
        let result = parse_diagnosis(raw).unwrap();
        assert_eq!(result.triage_level, TriageLevel::Urgent);
        assert!(result.probable_conditions.is_empty());
    }

    #[test]
    fn test_parse_diagnosis_full() {
        let raw = r#"{
            "triageLevel": "critical",
            "probableConditions": [
                {"condition": "anaphylaxis", "confidence": 87.5, "severity": "severe"}
            ],
            "immediateActions": ["administer epinephrine", "call for transport"],
            "medicationRecommendations": [
                {"medication": "epinephrine", "reason": "suspected anaphylaxis",
                 "warning": "monitor for arrhythmia"}
            ],
            "explanation": "Rapid-onset reaction consistent with known allergy."
        }"#;
        let result = parse_diagnosis(raw).unwrap();
        assert_eq!(result.triage_level, TriageLevel::Critical);
        assert_eq!(result.probable_conditions[0].confidence, 87.5);
        assert_eq!(
            result.medication_recommendations.as_ref().unwrap()[0].medication,
            "epinephrine"
        );
    }

    #[test]
    fn test_parse_diagnosis_rejects_unknown_triage_level() {
        let raw = r#"{"triageLevel":"unknown","probableConditions":[],"immediateActions":[]}"#;
        assert!(matches!(parse_diagnosis(raw), Err(InferenceError::Parse(_))));
    }

    #[test]
    fn test_parse_diagnosis_rejects_non_json() {
        assert!(parse_diagnosis("the patient is probably fine").is_err());
    }

    #[test]
    fn test_parse_diagnosis_rejects_fenced_json() {
        // Models sometimes wrap output in markdown fences despite the
        // instruction; that is a contract violation, not something to strip.
        let raw = "```json\n{\"triageLevel\":\"stable\",\"probableConditions\":[],\"immediateActions\":[]}\n```";
        assert!(parse_diagnosis(raw).is_err());
    }

    #[test]
    fn test_parse_diagnosis_rejects_missing_action_list() {
        let raw = r#"{"triageLevel":"stable","probableConditions":[]}"#;
        assert!(parse_diagnosis(raw).is_err());
    }

    #[test]
    fn test_parse_diagnosis_rejects_non_numeric_confidence() {
        let raw = r#"{"triageLevel":"stable",
            "probableConditions":[{"condition":"x","confidence":"high","severity":"mild"}],
            "immediateActions":[]}"#;
        assert!(parse_diagnosis(raw).is_err());
    }

    #[test]
    fn test_parse_diagnosis_rejects_out_of_range_confidence() {
        for confidence in ["120", "-3"] {
            let raw = format!(
                r#"{{"triageLevel":"stable",
                    "probableConditions":[{{"condition":"x","confidence":{confidence},"severity":"mild"}}],
                    "immediateActions":[]}}"#
            );
            assert!(parse_diagnosis(&raw).is_err(), "confidence {confidence} must be rejected");
        }
    }
}
