use serde::Serialize;
use tracing::warn;

use crate::{
    dao::models::{BattleId, Leaderboard, Question, QuestionStats},
    dto::broadcast::{BattleEvent, notice},
    state::SharedState,
};

/// Announce a fresh start; the first question follows after the grace window.
pub async fn publish_start_pending(state: &SharedState, battle_id: &BattleId) -> bool {
    let payload = notice("Battle will begin shortly (5 s buffer for late joiners)");
    send_event(state, battle_id, BattleEvent::BattleStartPending, &payload).await
}

/// Announce that the phase loop of a fresh start begins now.
pub async fn publish_start(state: &SharedState, battle_id: &BattleId) -> bool {
    let payload = notice("Battle officially started");
    send_event(state, battle_id, BattleEvent::BattleStart, &payload).await
}

/// Tell subscribers that a running battle continues.
pub async fn publish_resume(state: &SharedState, battle_id: &BattleId, message: &str) -> bool {
    send_event(state, battle_id, BattleEvent::BattleResume, &notice(message)).await
}

/// Open a question; the full question row is the payload.
pub async fn publish_question(state: &SharedState, battle_id: &BattleId, question: &Question) -> bool {
    send_event(state, battle_id, BattleEvent::NewQuestion, question).await
}

/// Reveal the answer distribution of the current question.
pub async fn publish_stats(state: &SharedState, battle_id: &BattleId, stats: &QuestionStats) -> bool {
    send_event(state, battle_id, BattleEvent::ShowStats, stats).await
}

/// Show the ranking after the current question.
pub async fn publish_leaderboard(
    state: &SharedState,
    battle_id: &BattleId,
    leaderboard: &Leaderboard,
) -> bool {
    send_event(state, battle_id, BattleEvent::UpdateLeaderboard, leaderboard).await
}

/// Close the battle.
pub async fn publish_end(state: &SharedState, battle_id: &BattleId, message: &str) -> bool {
    send_event(state, battle_id, BattleEvent::BattleEnd, &notice(message)).await
}

async fn send_event(
    state: &SharedState,
    battle_id: &BattleId,
    event: BattleEvent,
    payload: &impl Serialize,
) -> bool {
    match serde_json::to_value(payload) {
        Ok(value) => state.events().publish(battle_id, event, value).await,
        Err(err) => {
            warn!(%battle_id, %event, error = %err, "failed to serialize battle event payload");
            false
        }
    }
}
