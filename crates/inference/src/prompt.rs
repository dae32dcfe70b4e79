//! Fixed instruction templates and patient attribute rendering.
//!
//! The diagnosis template pins the output contract: a single JSON object
//! whose field names match the diagnosis result wire format exactly. The
//! template text is part of the external contract and changes to it must be
//! mirrored in the response validator's expectations.

use era_types::PatientAttributes;

/// System instruction for diagnosis requests.
pub const DIAGNOSIS_SYSTEM_PROMPT: &str = "\
You are an emergency-medicine triage assistant. A first responder has \
scanned a patient's emergency record and needs a rapid, structured \
assessment.

Weigh all of the following when forming your assessment:
- the patient's known medical conditions (history),
- active medications, specifically checking for interaction risks,
- known allergies, which are CRITICAL and must be flagged against any \
medication you suggest,
- the patient's age,
- the patient's blood type.

Respond with a SINGLE JSON object and nothing else. No prose, no markdown, \
no code fences. The object must have exactly these fields:
{
  \"triageLevel\": \"critical\" | \"urgent\" | \"stable\",
  \"probableConditions\": [
    {\"condition\": string, \"confidence\": number between 0 and 100, \
\"severity\": string}
  ],
  \"immediateActions\": [string],
  \"medicationRecommendations\": [
    {\"medication\": string, \"reason\": string, \"warning\": string}
  ],
  \"explanation\": string
}
\"medicationRecommendations\" may be omitted when you have none. Never \
recommend a medication the patient is allergic to; if an allergy is \
relevant, state it in the \"warning\" field.";

/// System instruction for the companion chatbot.
pub const CHAT_SYSTEM_PROMPT: &str = "\
You are the ERA assistant, supporting emergency responders who look up \
patient records in the field. Answer concisely and practically. You are not \
a doctor and must say so when asked for a definitive diagnosis; recommend \
contacting emergency medical services for anything life-threatening.";

/// Renders a patient's attributes as the user message of a diagnosis
/// request.
pub fn patient_summary(patient: &PatientAttributes) -> String {
    format!(
        "Patient presentation:\n\
         Name: {}\n\
         Age: {}\n\
         Blood type: {}\n\
         Known allergies: {}\n\
         Active medications: {}\n\
         Known conditions: {}",
        patient.name,
        patient.age,
        patient.blood_type,
        join_or_none(&patient.allergies),
        join_or_none(&patient.medications),
        join_or_none(&patient.conditions),
    )
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none recorded".to_string()
    } else {
        items.join(", ")
    }
}
