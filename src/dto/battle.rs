//! DTO definitions for the battle control and pull endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::BattleStatus,
    services::battle_service::{StartOutcome, StopOutcome},
};

/// Answer to a start request. Always returned with a 200 status; `success`
/// tells whether the battle is (or keeps) running.
#[derive(Debug, Serialize, ToSchema)]
pub struct StartBattleResponse {
    /// Whether the battle is running after the request.
    pub success: bool,
    /// Outcome description.
    pub message: String,
}

impl From<StartOutcome> for StartBattleResponse {
    fn from(outcome: StartOutcome) -> Self {
        Self {
            success: outcome.accepted,
            message: outcome.message,
        }
    }
}

/// Answer to a stop request.
#[derive(Debug, Serialize, ToSchema)]
pub struct StopBattleResponse {
    /// Whether a running orchestrator was signalled.
    pub success: bool,
    /// Outcome description.
    pub message: String,
}

impl From<StopOutcome> for StopBattleResponse {
    fn from(outcome: StopOutcome) -> Self {
        Self {
            success: outcome.stopped,
            message: outcome.message,
        }
    }
}

/// Query of the stats pull endpoint.
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// Question whose answer distribution is requested.
    #[validate(length(min = 1))]
    pub mcq_id: String,
}

/// Query of the leaderboard pull endpoint.
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Battle whose ranking is requested.
    #[validate(length(min = 1))]
    pub battle_id: String,
}

/// Envelope of every pull endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct PullResponse<T> {
    /// Always `true`; failures use the error body instead.
    pub success: bool,
    /// Requested rows.
    pub data: T,
}

impl<T> PullResponse<T> {
    /// Wrap successfully pulled data.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Persisted status of a battle next to whether this process drives it.
#[derive(Debug, Serialize, ToSchema)]
pub struct BattleStatusView {
    /// Persisted status.
    pub status: BattleStatus,
    /// An orchestrator of this process owns the battle.
    pub running: bool,
    /// Seconds since the orchestrator claimed the battle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running_for_secs: Option<u64>,
}
