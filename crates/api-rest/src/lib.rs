//! # API REST
//!
//! REST API implementation for ERA.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - the mapping from pipeline errors to status codes and caller-facing
//!   error bodies
//! - OpenAPI/Swagger documentation
//!
//! Uses `api-shared` for wire types and `era-core` for all behaviour.

use axum::{
    extract::{Path as AxumPath, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

use api_shared::wire::{
    ChatReq, ChatRes, DiagnosisReq, DiagnosisRes, ErrorRes, HealthRes, PatientRes, ResolveReq,
    ResolveRes,
};
use api_shared::{auth, HealthService};
use era_core::config::request_timeout_from_env_value;
use era_core::{
    CoreConfig, DiagnosisError, HttpRecordStore, RateLimiter, TriageService,
};
use era_identifier::PatientTag;
use era_inference::{InferenceError, ModelClient, ModelConfig};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub triage: TriageService,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, resolve, get_patient, diagnose, chat),
    components(schemas(
        HealthRes,
        ErrorRes,
        ResolveReq,
        ResolveRes,
        PatientRes,
        DiagnosisReq,
        DiagnosisRes,
        ChatReq,
        ChatRes,
        era_types::PatientAttributes,
        era_types::DiagnosisResult,
        era_types::ProbableCondition,
        era_types::MedicationRecommendation,
        era_types::TriageLevel,
        era_types::BloodType,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router over the given state.
///
/// Swagger UI is merged by the binaries, not here, so tests drive the bare
/// API surface.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/resolve", post(resolve))
        .route("/api/patients/:id", get(get_patient))
        .route("/api/diagnosis", post(diagnose))
        .route("/api/chat", post(chat))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Builds the production state from environment variables.
///
/// Returns the rate limiter handle alongside the state so the caller can
/// run the periodic sweep of expired windows.
///
/// # Environment Variables
/// - `RECORD_STORE_URL` / `RECORD_STORE_SERVICE_KEY`: hosted record store
/// - `MODEL_API_URL` (default `https://api.openai.com/v1`), `MODEL_API_KEY`,
///   `MODEL_NAME` (default `gpt-4o-mini`): inference endpoint
/// - `ERA_REQUEST_TIMEOUT_SECS`: uniform outbound timeout (default 10)
pub fn state_from_env() -> anyhow::Result<(AppState, Arc<RateLimiter>)> {
    use anyhow::Context;

    let timeout = request_timeout_from_env_value(std::env::var("ERA_REQUEST_TIMEOUT_SECS").ok())?;

    let record_store_url =
        std::env::var("RECORD_STORE_URL").context("RECORD_STORE_URL must be set")?;
    let record_store_key = std::env::var("RECORD_STORE_SERVICE_KEY")
        .context("RECORD_STORE_SERVICE_KEY must be set")?;
    let config = CoreConfig::new(record_store_url, record_store_key, timeout)?;
    let store = HttpRecordStore::new(&config)?;

    let model_api_url =
        std::env::var("MODEL_API_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model_api_key = std::env::var("MODEL_API_KEY").context("MODEL_API_KEY must be set")?;
    let model_name = std::env::var("MODEL_NAME").unwrap_or_else(|_| "gpt-4o-mini".into());
    let engine = ModelClient::new(ModelConfig::new(
        model_api_url,
        model_api_key,
        model_name,
        timeout,
    ))?;

    let limiter = Arc::new(RateLimiter::default());
    let triage = TriageService::new(Arc::new(store), Arc::new(engine), limiter.clone());

    Ok((AppState { triage }, limiter))
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    auth::parse_bearer(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok()),
    )
}

/// Maps a pipeline error to its status code and caller-facing body.
///
/// Upstream conditions keep their own statuses (429/402) instead of being
/// masked as generic failures; guard failures each carry their specific
/// message.
fn error_response(error: &DiagnosisError) -> (StatusCode, Json<ErrorRes>) {
    let (status, message) = match error {
        DiagnosisError::MissingToken => (StatusCode::UNAUTHORIZED, "Authorization required".into()),
        DiagnosisError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid authentication".into()),
        DiagnosisError::RateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please try again later.".into(),
        ),
        DiagnosisError::RoleLookup(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to verify user role".into(),
        ),
        DiagnosisError::Forbidden => (
            StatusCode::FORBIDDEN,
            "Insufficient permissions for AI diagnosis".into(),
        ),
        DiagnosisError::MissingPatientData => {
            (StatusCode::BAD_REQUEST, "Patient data required".into())
        }
        DiagnosisError::InvalidPatientData(_) => {
            (StatusCode::BAD_REQUEST, "Invalid patient data structure".into())
        }
        DiagnosisError::InvalidIdentifier(_) => {
            (StatusCode::BAD_REQUEST, "Invalid patient identifier".into())
        }
        DiagnosisError::PatientNotFound => {
            (StatusCode::NOT_FOUND, "Patient record not found".into())
        }
        DiagnosisError::InvalidChat(message) => (StatusCode::BAD_REQUEST, message.clone()),
        DiagnosisError::Inference(inference) => match inference {
            InferenceError::UpstreamRateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "AI service rate limit exceeded. Please try again later.".into(),
            ),
            InferenceError::UpstreamPayment => (
                StatusCode::PAYMENT_REQUIRED,
                "AI service payment required. Please check your account.".into(),
            ),
            InferenceError::InvalidAttributes(_) => {
                (StatusCode::BAD_REQUEST, "Invalid patient data structure".into())
            }
            InferenceError::Parse(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to parse AI analysis".into(),
            ),
            InferenceError::UpstreamStatus(_)
            | InferenceError::Transport(_)
            | InferenceError::EmptyResponse => {
                (StatusCode::INTERNAL_SERVER_ERROR, "AI analysis failed".into())
            }
        },
        DiagnosisError::Store(store) => (StatusCode::INTERNAL_SERVER_ERROR, store.to_string()),
    };
    (status, Json(ErrorRes::new(message)))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/api/resolve",
    request_body = ResolveReq,
    responses(
        (status = 200, description = "Canonical patient identifier", body = ResolveRes),
        (status = 400, description = "Input could not be resolved", body = ErrorRes)
    )
)]
/// Resolve raw scan/paste input into a canonical patient identifier
///
/// Accepts a bare UUID (hex case-insensitive) or an absolute URL with a
/// `/patient/<uuid>` path. Pure syntax: no record is fetched, so no
/// authentication applies.
#[axum::debug_handler]
async fn resolve(Json(req): Json<ResolveReq>) -> Result<Json<ResolveRes>, (StatusCode, Json<ErrorRes>)> {
    match PatientTag::resolve(&req.input) {
        Ok(tag) => Ok(Json(ResolveRes {
            patient_id: tag.to_string(),
        })),
        Err(_) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorRes::new("Invalid patient identifier")),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}",
    params(
        ("id" = String, Path, description = "Canonical patient identifier")
    ),
    responses(
        (status = 200, description = "Patient profile", body = PatientRes),
        (status = 400, description = "Invalid identifier", body = ErrorRes),
        (status = 401, description = "Missing or invalid credentials", body = ErrorRes),
        (status = 404, description = "No such patient", body = ErrorRes),
        (status = 500, description = "Record store failure", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Fetch one patient's profile by identifier
///
/// Requires a bearer token; row visibility beyond that is enforced by the
/// record store.
#[axum::debug_handler]
async fn get_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
) -> Result<Json<PatientRes>, (StatusCode, Json<ErrorRes>)> {
    match state.triage.lookup(bearer(&headers), &id).await {
        Ok(patient) => Ok(Json(PatientRes { patient })),
        Err(error) => {
            tracing::error!("Patient lookup error: {:?}", error);
            Err(error_response(&error))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/diagnosis",
    request_body = DiagnosisReq,
    responses(
        (status = 200, description = "AI diagnosis result", body = DiagnosisRes),
        (status = 400, description = "Missing or malformed patient data", body = ErrorRes),
        (status = 401, description = "Missing or invalid credentials", body = ErrorRes),
        (status = 402, description = "AI service payment required", body = ErrorRes),
        (status = 403, description = "Caller lacks a privileged role", body = ErrorRes),
        (status = 429, description = "Rate limit exceeded (local or upstream)", body = ErrorRes),
        (status = 500, description = "Role verification or AI analysis failure", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Request an AI diagnosis suggestion for a patient
///
/// Runs the guarded pipeline: authentication, per-user rate limiting, role
/// gate, input validation, then one bounded call to the model endpoint
/// whose output is structurally validated and audited.
#[axum::debug_handler]
async fn diagnose(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DiagnosisReq>,
) -> Result<Json<DiagnosisRes>, (StatusCode, Json<ErrorRes>)> {
    match state
        .triage
        .diagnose(bearer(&headers), req.patient_data)
        .await
    {
        Ok(analysis) => Ok(Json(DiagnosisRes { analysis })),
        Err(error) => {
            tracing::error!("AI diagnosis error: {:?}", error);
            Err(error_response(&error))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatReq,
    responses(
        (status = 200, description = "Assistant reply", body = ChatRes),
        (status = 400, description = "Invalid transcript", body = ErrorRes),
        (status = 401, description = "Missing or invalid credentials", body = ErrorRes),
        (status = 402, description = "AI service payment required", body = ErrorRes),
        (status = 429, description = "Rate limit exceeded (local or upstream)", body = ErrorRes),
        (status = 500, description = "AI proxy failure", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Companion chatbot proxy
///
/// Validates the transcript (at most 20 messages, 2000 characters each,
/// roles `user`/`assistant`), applies the same per-user rate limiting as
/// diagnosis, and proxies to the chat-completion endpoint under a fixed
/// system instruction.
#[axum::debug_handler]
async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChatReq>,
) -> Result<Json<ChatRes>, (StatusCode, Json<ErrorRes>)> {
    match state.triage.chat(bearer(&headers), req.messages).await {
        Ok(message) => Ok(Json(ChatRes { message })),
        Err(error) => {
            tracing::error!("Chat proxy error: {:?}", error);
            Err(error_response(&error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use era_core::MemoryRecordStore;
    use era_inference::Engine;
    use era_types::{
        BloodType, ChatMessage, DiagnosisResult, PatientAttributes, Role, TriageLevel,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const TAG: &str = "550e8400-e29b-41d4-a716-446655440000";

    enum StubBehaviour {
        Succeed,
        UpstreamRateLimited,
        UpstreamPayment,
        MalformedOutput,
    }

    struct StubEngine(StubBehaviour);

    #[async_trait]
    impl Engine for StubEngine {
        async fn analyze(
            &self,
            _patient: &PatientAttributes,
        ) -> Result<DiagnosisResult, InferenceError> {
            match self.0 {
                StubBehaviour::Succeed => Ok(DiagnosisResult {
                    triage_level: TriageLevel::Urgent,
                    probable_conditions: vec![],
                    immediate_actions: vec!["monitor airway".into()],
                    medication_recommendations: None,
                    explanation: "stub".into(),
                }),
                StubBehaviour::UpstreamRateLimited => Err(InferenceError::UpstreamRateLimited),
                StubBehaviour::UpstreamPayment => Err(InferenceError::UpstreamPayment),
                StubBehaviour::MalformedOutput => Err(InferenceError::Parse("not json".into())),
            }
        }

        async fn chat(&self, _messages: &[ChatMessage]) -> Result<String, InferenceError> {
            Ok("stub reply".into())
        }
    }

    fn sample_patient() -> PatientAttributes {
        PatientAttributes {
            name: "Grace Hopper".into(),
            age: 52,
            blood_type: BloodType::ONegative,
            allergies: vec!["penicillin".into()],
            medications: vec![],
            conditions: vec![],
        }
    }

    fn build_app(behaviour: StubBehaviour) -> Router {
        let tag = PatientTag::parse(TAG).unwrap();
        let store = MemoryRecordStore::new()
            .with_token("medic-token", "medic-1")
            .with_roles("medic-1", &[Role::Medic])
            .with_token("patient-token", "patient-1")
            .with_roles("patient-1", &[Role::Patient])
            .with_patient(&tag, sample_patient());
        let triage = TriageService::new(
            Arc::new(store),
            Arc::new(StubEngine(behaviour)),
            Arc::new(RateLimiter::default()),
        );
        router(AppState { triage })
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn diagnosis_request(token: Option<&str>) -> Request<Body> {
        post_json(
            "/api/diagnosis",
            token,
            json!({"patientData": serde_json::to_value(sample_patient()).unwrap()}),
        )
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_app(StubBehaviour::Succeed);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_resolve_accepts_uuid_and_url() {
        let app = build_app(StubBehaviour::Succeed);

        let (status, body) = send(&app, post_json("/api/resolve", None, json!({"input": TAG}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patientId"], TAG);

        let url = format!("https://era.example.org/patient/{TAG}");
        let (status, body) = send(&app, post_json("/api/resolve", None, json!({"input": url}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patientId"], TAG);
    }

    #[tokio::test]
    async fn test_resolve_rejects_invalid_input() {
        let app = build_app(StubBehaviour::Succeed);
        for input in ["", "not a uuid", "https://example.com/other/123"] {
            let (status, body) =
                send(&app, post_json("/api/resolve", None, json!({"input": input}))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "input: {input:?}");
            assert_eq!(body["error"], "Invalid patient identifier");
        }
    }

    #[tokio::test]
    async fn test_diagnosis_requires_authorization() {
        let app = build_app(StubBehaviour::Succeed);

        let (status, body) = send(&app, diagnosis_request(None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authorization required");

        let (status, body) = send(&app, diagnosis_request(Some("stolen-token"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid authentication");
    }

    #[tokio::test]
    async fn test_diagnosis_rejects_unprivileged_role() {
        let app = build_app(StubBehaviour::Succeed);
        let (status, body) = send(&app, diagnosis_request(Some("patient-token"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Insufficient permissions for AI diagnosis");
    }

    #[tokio::test]
    async fn test_diagnosis_validates_patient_data() {
        let app = build_app(StubBehaviour::Succeed);

        let (status, body) = send(
            &app,
            post_json("/api/diagnosis", Some("medic-token"), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Patient data required");

        let (status, body) = send(
            &app,
            post_json(
                "/api/diagnosis",
                Some("medic-token"),
                json!({"patientData": {"name": "X"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid patient data structure");
    }

    #[tokio::test]
    async fn test_diagnosis_success() {
        let app = build_app(StubBehaviour::Succeed);
        let (status, body) = send(&app, diagnosis_request(Some("medic-token"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["triageLevel"], "urgent");
        assert_eq!(body["analysis"]["immediateActions"][0], "monitor airway");
    }

    #[tokio::test]
    async fn test_diagnosis_rate_limit() {
        let app = build_app(StubBehaviour::Succeed);
        for _ in 0..10 {
            let (status, _) = send(&app, diagnosis_request(Some("medic-token"))).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, body) = send(&app, diagnosis_request(Some("medic-token"))).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Rate limit exceeded. Please try again later.");
    }

    #[tokio::test]
    async fn test_diagnosis_upstream_error_mapping() {
        let app = build_app(StubBehaviour::UpstreamRateLimited);
        let (status, body) = send(&app, diagnosis_request(Some("medic-token"))).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body["error"],
            "AI service rate limit exceeded. Please try again later."
        );

        let app = build_app(StubBehaviour::UpstreamPayment);
        let (status, body) = send(&app, diagnosis_request(Some("medic-token"))).await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(
            body["error"],
            "AI service payment required. Please check your account."
        );

        let app = build_app(StubBehaviour::MalformedOutput);
        let (status, body) = send(&app, diagnosis_request(Some("medic-token"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to parse AI analysis");
    }

    #[tokio::test]
    async fn test_chat_happy_path() {
        let app = build_app(StubBehaviour::Succeed);
        let (status, body) = send(
            &app,
            post_json(
                "/api/chat",
                Some("medic-token"),
                json!({"messages": [{"role": "user", "content": "Patient is dizzy."}]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "stub reply");
    }

    #[tokio::test]
    async fn test_chat_requires_authorization() {
        let app = build_app(StubBehaviour::Succeed);
        let (status, body) = send(
            &app,
            post_json(
                "/api/chat",
                None,
                json!({"messages": [{"role": "user", "content": "hi"}]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authorization required");
    }

    #[tokio::test]
    async fn test_chat_transcript_validation() {
        let app = build_app(StubBehaviour::Succeed);

        let too_many: Vec<_> = (0..21)
            .map(|i| json!({"role": "user", "content": format!("m{i}")}))
            .collect();
        let (status, body) = send(
            &app,
            post_json("/api/chat", Some("medic-token"), json!({"messages": too_many})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Too many messages");

        let (status, body) = send(
            &app,
            post_json(
                "/api/chat",
                Some("medic-token"),
                json!({"messages": [{"role": "user", "content": "x".repeat(2001)}]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message content too long");

        let (status, body) = send(
            &app,
            post_json(
                "/api/chat",
                Some("medic-token"),
                json!({"messages": [{"role": "system", "content": "x"}]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid message role");
    }

    #[tokio::test]
    async fn test_get_patient() {
        let app = build_app(StubBehaviour::Succeed);

        let request = Request::builder()
            .uri(format!("/api/patients/{TAG}"))
            .header(header::AUTHORIZATION, "Bearer medic-token")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patient"]["name"], "Grace Hopper");
        assert_eq!(body["patient"]["bloodType"], "O-");
    }

    #[tokio::test]
    async fn test_get_patient_failure_modes() {
        let app = build_app(StubBehaviour::Succeed);

        let request = Request::builder()
            .uri(format!("/api/patients/{TAG}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authorization required");

        let request = Request::builder()
            .uri("/api/patients/not-a-tag")
            .header(header::AUTHORIZATION, "Bearer medic-token")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid patient identifier");

        let unknown = "00000000-0000-0000-0000-000000000000";
        let request = Request::builder()
            .uri(format!("/api/patients/{unknown}"))
            .header(header::AUTHORIZATION, "Bearer medic-token")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Patient record not found");
    }
}
