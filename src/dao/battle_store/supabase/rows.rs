use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

use crate::dao::models::BattleStatus;

use super::error::{SupabaseError, SupabaseResult};

pub const PARTICIPANTS_TABLE: &str = "battle_participants";
pub const SCHEDULE_TABLE: &str = "battle_schedule";
pub const PARTICIPANT_COLUMNS: &str = "id,user_id,username,status";
pub const JOINED: &str = "joined";

pub const RPC_FIRST_QUESTION: &str = "get_first_mcq";
pub const RPC_NEXT_QUESTION: &str = "get_next_mcq";
pub const RPC_STATS: &str = "get_battle_stats";
pub const RPC_LEADERBOARD: &str = "get_leader_board";

#[derive(Debug, Serialize)]
pub struct BattleArgs<'a> {
    pub battle_id_input: &'a str,
}

#[derive(Debug, Serialize)]
pub struct StatsArgs<'a> {
    pub mcq_id_input: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NextQuestionArgs<'a> {
    pub battle_id_input: &'a str,
    pub react_order_input: i64,
}

#[derive(Debug, Serialize)]
pub struct StatusPatch {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct StatusRow {
    #[serde(default)]
    pub status: Option<String>,
}

impl StatusRow {
    /// Interpret the persisted string; anything unknown counts as not started.
    pub fn into_status(self) -> BattleStatus {
        match self.status.as_deref().map(str::parse::<BattleStatus>) {
            Some(Ok(status)) => status,
            Some(Err(err)) => {
                warn!(error = %err, "treating unknown battle status as pending");
                BattleStatus::Pending
            }
            None => BattleStatus::Pending,
        }
    }
}

/// Reduce a list-or-object payload to its first row.
pub fn first_row(path: &str, payload: Value) -> SupabaseResult<Option<Value>> {
    match payload {
        Value::Null => Ok(None),
        Value::Array(rows) => Ok(rows.into_iter().find(|row| !row.is_null())),
        Value::Object(_) => Ok(Some(payload)),
        other => Err(SupabaseError::InvalidRow {
            path: path.to_string(),
            detail: format!("expected a row or a list of rows, got `{other}`"),
        }),
    }
}

/// Decode the first row of `payload` into `T`, if any.
pub fn decode_first<T>(path: &str, payload: Value) -> SupabaseResult<Option<T>>
where
    T: DeserializeOwned,
{
    first_row(path, payload)?
        .map(|row| {
            serde_json::from_value(row).map_err(|source| SupabaseError::DeserializeRow {
                path: path.to_string(),
                source,
            })
        })
        .transpose()
}

/// Decode every row of a list payload into `T`.
pub fn decode_all<T>(path: &str, payload: Value) -> SupabaseResult<Vec<T>>
where
    T: DeserializeOwned,
{
    let rows = match payload {
        Value::Null => return Ok(Vec::new()),
        Value::Array(rows) => rows,
        row @ Value::Object(_) => vec![row],
        other => {
            return Err(SupabaseError::InvalidRow {
                path: path.to_string(),
                detail: format!("expected a list of rows, got `{other}`"),
            });
        }
    };

    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|source| SupabaseError::DeserializeRow {
                path: path.to_string(),
                source,
            })
        })
        .collect()
}
