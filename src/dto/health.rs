use serde::Serialize;
use utoipa::ToSchema;

const OK: &str = "ok";
const DEGRADED: &str = "degraded";

/// Health payload returned by `/` and `/healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when the battle store answers, `degraded` otherwise.
    pub status: String,
}

impl HealthResponse {
    /// The orchestrator and its store are reachable.
    pub fn ok() -> Self {
        Self {
            status: OK.to_string(),
        }
    }

    /// The orchestrator serves requests but the store did not answer.
    pub fn degraded() -> Self {
        Self {
            status: DEGRADED.to_string(),
        }
    }

    /// Whether the payload reports a healthy service.
    pub fn is_ok(&self) -> bool {
        self.status == OK
    }
}
