//! Battle domain models shared by the store, services and DTOs.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use utoipa::ToSchema;

/// Opaque identifier of a scheduled battle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct BattleId(String);

impl BattleId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BattleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BattleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lifecycle of a battle as persisted in the schedule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum BattleStatus {
    /// Scheduled but not started yet.
    Pending,
    /// Started; an orchestrator is (or should be) driving it.
    Active,
    /// Finished; never restarted.
    Completed,
}

impl BattleStatus {
    /// Value written to the store for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            BattleStatus::Pending => "Pending",
            BattleStatus::Active => "Active",
            BattleStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for BattleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a persisted status string is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown battle status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for BattleStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(BattleStatus::Pending),
            "active" => Ok(BattleStatus::Active),
            "completed" => Ok(BattleStatus::Completed),
            _ => Err(UnknownStatus(value.to_string())),
        }
    }
}

/// A question row as served by the question lookups.
///
/// Columns other than the identifier and ordering fields are kept verbatim in
/// `extra` so the `new_question` broadcast carries the full row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Question {
    /// Question identifier.
    #[serde(rename = "mcq_id", deserialize_with = "opaque_id")]
    pub id: String,
    /// Sequence position inside the battle; strictly increasing.
    #[serde(default)]
    pub react_order: i64,
    /// Number of questions in the battle.
    #[serde(rename = "total_mcqs", default)]
    pub total: i64,
    /// Remaining columns (prompt, options, ...).
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

/// Answer distribution for one question, opaque to the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct QuestionStats(pub Map<String, Value>);

/// Current ranking of a battle, opaque to the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct Leaderboard(pub Map<String, Value>);

/// Every row a lookup returned, passed through untouched to pull clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Vec<Object>)]
pub struct RowSet(pub Vec<Value>);

impl RowSet {
    /// Whether the lookup returned no row.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Participant who joined a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Participant {
    /// Row identifier.
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    /// Account of the player.
    #[serde(deserialize_with = "opaque_id")]
    pub user_id: String,
    /// Display name.
    #[serde(default)]
    pub username: Option<String>,
    /// Membership state (`joined`, ...).
    pub status: String,
}

/// Accept identifiers stored either as text or as numbers.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}
