#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("patient data is missing required fields: {0}")]
    InvalidAttributes(String),
    #[error("model endpoint rate limit exceeded")]
    UpstreamRateLimited,
    #[error("model endpoint payment required")]
    UpstreamPayment,
    #[error("model endpoint returned status {0}")]
    UpstreamStatus(u16),
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model response contained no content")]
    EmptyResponse,
    #[error("failed to parse model analysis: {0}")]
    Parse(String),
}
