//! Read-only projections of battle data for clients that missed a broadcast.

use tracing::warn;

use crate::{
    dao::models::{BattleId, Participant, RowSet},
    dto::battle::BattleStatusView,
    error::ServiceError,
    state::SharedState,
};

/// Return every answer-distribution row of a question.
pub async fn get_stats(state: &SharedState, mcq_id: &str) -> Result<RowSet, ServiceError> {
    let rows = state
        .store()
        .fetch_stats_rows(mcq_id)
        .await
        .inspect_err(|err| warn!(mcq_id, error = %err, "stats lookup failed"))?;
    non_empty(rows, "No stats found")
}

/// Return the full ranking of a battle.
pub async fn get_leaderboard(
    state: &SharedState,
    battle_id: &BattleId,
) -> Result<RowSet, ServiceError> {
    let rows = state
        .store()
        .fetch_leaderboard_rows(battle_id)
        .await
        .inspect_err(|err| warn!(%battle_id, error = %err, "leaderboard lookup failed"))?;
    non_empty(rows, "No leaderboard found")
}

fn non_empty(rows: RowSet, missing: &str) -> Result<RowSet, ServiceError> {
    if rows.is_empty() {
        return Err(ServiceError::NotFound(missing.to_string()));
    }
    Ok(rows)
}

/// Return the players who joined a battle.
pub async fn get_participants(
    state: &SharedState,
    battle_id: &BattleId,
) -> Result<Vec<Participant>, ServiceError> {
    Ok(state.store().fetch_participants(battle_id).await?)
}

/// Return the persisted status of a battle and whether it is driven here.
pub async fn get_status(
    state: &SharedState,
    battle_id: &BattleId,
) -> Result<BattleStatusView, ServiceError> {
    let status = state
        .store()
        .fetch_status(battle_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Battle not found".into()))?;
    let running_for_secs = state.registry().running_for(battle_id);

    Ok(BattleStatusView {
        status,
        running: running_for_secs.is_some(),
        running_for_secs,
    })
}
