use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};

use crate::{
    dao::models::BattleId,
    dto::battle::{StartBattleResponse, StopBattleResponse},
    services::battle_service,
    state::SharedState,
};

/// Battle control endpoints used by the scheduler and by joining players.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/battle/start/{battle_id}", post(start_battle))
        .route("/battle/stop/{battle_id}", post(stop_battle))
}

#[utoipa::path(
    post,
    path = "/battle/start/{battle_id}",
    tag = "battle",
    params(("battle_id" = String, Path, description = "Battle identifier")),
    responses((status = 200, description = "Start outcome", body = StartBattleResponse))
)]
/// Start a pending battle, resume a running one or repair a stranded one.
///
/// Every outcome, including a refusal, is reported in the body with a 200 status.
pub async fn start_battle(
    State(state): State<SharedState>,
    Path(battle_id): Path<String>,
) -> Json<StartBattleResponse> {
    let outcome = battle_service::request_start(&state, &BattleId::new(battle_id)).await;
    Json(outcome.into())
}

#[utoipa::path(
    post,
    path = "/battle/stop/{battle_id}",
    tag = "battle",
    params(("battle_id" = String, Path, description = "Battle identifier")),
    responses((status = 200, description = "Stop outcome", body = StopBattleResponse))
)]
/// Ask the orchestrator of a battle to stop at its next wait point.
pub async fn stop_battle(
    State(state): State<SharedState>,
    Path(battle_id): Path<String>,
) -> Json<StopBattleResponse> {
    Json(battle_service::request_stop(&state, &BattleId::new(battle_id)).into())
}
