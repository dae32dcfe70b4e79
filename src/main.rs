use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_rest::{router, state_from_env, ApiDoc};

/// Interval between sweeps of expired rate-limit windows.
const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Main entry point for the ERA application
///
/// Starts the REST server and a background task that periodically reclaims
/// rate-limit entries for users who have gone quiet.
///
/// # Environment Variables
/// - `ERA_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `RECORD_STORE_URL` / `RECORD_STORE_SERVICE_KEY`: hosted record store
/// - `MODEL_API_URL` / `MODEL_API_KEY` / `MODEL_NAME`: inference endpoint
/// - `ERA_REQUEST_TIMEOUT_SECS`: uniform outbound timeout in seconds
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup, or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("era=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("ERA_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting ERA REST on {}", rest_addr);

    let (state, limiter) = state_from_env()?;

    // Reclaim windows for users who stopped sending requests.
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let dropped = limiter.sweep();
            if dropped > 0 {
                tracing::debug!(dropped, "swept expired rate-limit windows");
            }
        }
    });

    let app = router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
