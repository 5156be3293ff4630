use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::health::HealthResponse, services::health_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "health",
    responses((status = 200, description = "Service health", body = HealthResponse))
)]
/// Return the current health status of the orchestrator and ping the battle store.
pub async fn healthcheck(State(state): State<SharedState>) -> Json<HealthResponse> {
    let status = health_service::health_status(&state).await;
    Json(status)
}

/// Configure the health routes subtree. The root path answers like `/healthcheck`.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/", get(healthcheck))
        .route("/healthcheck", get(healthcheck))
}
