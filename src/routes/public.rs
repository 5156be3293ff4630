use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dao::models::{BattleId, Participant, RowSet},
    dto::battle::{BattleStatusView, LeaderboardQuery, PullResponse, StatsQuery},
    error::AppError,
    services::public_service,
    state::SharedState,
};

/// Pull endpoints that let clients catch up on data they missed on the channel.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/battle/get_stats", post(get_stats))
        .route("/battle/leaderboard", post(get_leaderboard))
        .route("/battle/{battle_id}/participants", get(get_participants))
        .route("/battle/{battle_id}/status", get(get_status))
}

#[utoipa::path(
    post,
    path = "/battle/get_stats",
    tag = "public",
    params(StatsQuery),
    responses(
        (status = 200, description = "Answer distribution", body = PullResponse<RowSet>),
        (status = 400, description = "Missing question id"),
        (status = 404, description = "No stats for this question"),
        (status = 503, description = "Battle store unavailable")
    )
)]
/// Return every answer-distribution row of a question.
pub async fn get_stats(
    State(state): State<SharedState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<PullResponse<RowSet>>, AppError> {
    query.validate()?;
    let stats = public_service::get_stats(&state, &query.mcq_id).await?;
    Ok(Json(PullResponse::ok(stats)))
}

#[utoipa::path(
    post,
    path = "/battle/leaderboard",
    tag = "public",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Current ranking", body = PullResponse<RowSet>),
        (status = 400, description = "Missing battle id"),
        (status = 404, description = "No leaderboard for this battle"),
        (status = 503, description = "Battle store unavailable")
    )
)]
/// Return the full ranking of a battle.
pub async fn get_leaderboard(
    State(state): State<SharedState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<PullResponse<RowSet>>, AppError> {
    query.validate()?;
    let battle_id = BattleId::new(query.battle_id);
    let leaderboard = public_service::get_leaderboard(&state, &battle_id).await?;
    Ok(Json(PullResponse::ok(leaderboard)))
}

#[utoipa::path(
    get,
    path = "/battle/{battle_id}/participants",
    tag = "public",
    params(("battle_id" = String, Path, description = "Battle identifier")),
    responses(
        (status = 200, description = "Joined players", body = PullResponse<Vec<Participant>>),
        (status = 503, description = "Battle store unavailable")
    )
)]
/// Return the players who joined a battle.
pub async fn get_participants(
    State(state): State<SharedState>,
    Path(battle_id): Path<String>,
) -> Result<Json<PullResponse<Vec<Participant>>>, AppError> {
    let participants = public_service::get_participants(&state, &BattleId::new(battle_id)).await?;
    Ok(Json(PullResponse::ok(participants)))
}

#[utoipa::path(
    get,
    path = "/battle/{battle_id}/status",
    tag = "public",
    params(("battle_id" = String, Path, description = "Battle identifier")),
    responses(
        (status = 200, description = "Persisted and in-process status", body = PullResponse<BattleStatusView>),
        (status = 404, description = "Unknown battle"),
        (status = 503, description = "Battle store unavailable")
    )
)]
/// Return the persisted status of a battle and whether this process drives it.
pub async fn get_status(
    State(state): State<SharedState>,
    Path(battle_id): Path<String>,
) -> Result<Json<PullResponse<BattleStatusView>>, AppError> {
    let view = public_service::get_status(&state, &BattleId::new(battle_id)).await?;
    Ok(Json(PullResponse::ok(view)))
}
