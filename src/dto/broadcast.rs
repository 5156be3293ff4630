//! Wire format of the events published on a battle channel.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::dao::models::BattleId;

/// Event name used for every message; the concrete type travels in the payload.
pub const BROADCAST_EVENT: &str = "broadcast";

/// Typed events emitted on a battle channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BattleEvent {
    /// Fresh start accepted; the first question follows after the grace window.
    BattleStartPending,
    /// Fresh start: the phase loop is about to begin.
    BattleStart,
    /// A running (or repaired) battle was joined again.
    BattleResume,
    /// A question is open for answers.
    NewQuestion,
    /// Answer distribution of the current question.
    ShowStats,
    /// Ranking after the current question.
    UpdateLeaderboard,
    /// The battle is over.
    BattleEnd,
}

impl BattleEvent {
    /// Wire name of the event.
    pub fn as_str(self) -> &'static str {
        match self {
            BattleEvent::BattleStartPending => "battle_start_pending",
            BattleEvent::BattleStart => "battle_start",
            BattleEvent::BattleResume => "battle_resume",
            BattleEvent::NewQuestion => "new_question",
            BattleEvent::ShowStats => "show_stats",
            BattleEvent::UpdateLeaderboard => "update_leaderboard",
            BattleEvent::BattleEnd => "battle_end",
        }
    }
}

impl fmt::Display for BattleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body posted to the realtime broadcast endpoint.
#[derive(Debug, Serialize)]
pub struct BroadcastEnvelope {
    /// Messages delivered in order; always one here.
    pub messages: Vec<BroadcastMessage>,
}

/// One message addressed to a channel topic.
#[derive(Debug, Serialize)]
pub struct BroadcastMessage {
    /// Channel topic, `battle:<id>`.
    pub topic: String,
    /// Always [`BROADCAST_EVENT`].
    pub event: &'static str,
    /// Typed event body.
    pub payload: EventPayload,
}

/// Typed payload wrapper understood by the clients' broadcast handler.
#[derive(Debug, Serialize)]
pub struct EventPayload {
    /// Event type clients dispatch on.
    #[serde(rename = "type")]
    pub kind: BattleEvent,
    /// Event-specific body.
    pub data: Value,
}

impl BroadcastEnvelope {
    /// Wrap `data` in a single message for the channel of `battle_id`.
    pub fn new(battle_id: &BattleId, kind: BattleEvent, data: Value) -> Self {
        Self {
            messages: vec![BroadcastMessage {
                topic: channel_topic(battle_id),
                event: BROADCAST_EVENT,
                payload: EventPayload { kind, data },
            }],
        }
    }
}

/// Channel a battle's events are published on.
pub fn channel_topic(battle_id: &BattleId) -> String {
    format!("battle:{battle_id}")
}

/// Human-readable notice attached to lifecycle events (`{"message": ...}`).
pub fn notice(message: &str) -> Value {
    serde_json::json!({ "message": message })
}
