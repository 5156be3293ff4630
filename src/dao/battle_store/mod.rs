/// Supabase (PostgREST) implementation.
pub mod supabase;

use crate::dao::models::{
    BattleId, BattleStatus, Leaderboard, Participant, Question, QuestionStats, RowSet,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the remote procedures holding battle state.
///
/// Phase lookups are normalized to an explicit `Option` holding the first row:
/// callers never see the list-or-object shape returned by the backend. The
/// `*_rows` variants keep every row for the pull endpoints.
pub trait BattleStore: Send + Sync {
    /// Players who joined the battle.
    fn fetch_participants(
        &self,
        battle_id: &BattleId,
    ) -> BoxFuture<'static, StorageResult<Vec<Participant>>>;
    /// Persisted status, `None` when the battle is unknown.
    fn fetch_status(
        &self,
        battle_id: &BattleId,
    ) -> BoxFuture<'static, StorageResult<Option<BattleStatus>>>;
    /// Overwrite the persisted status.
    fn set_status(
        &self,
        battle_id: &BattleId,
        status: BattleStatus,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Question the battle opens with.
    fn fetch_first_question(
        &self,
        battle_id: &BattleId,
    ) -> BoxFuture<'static, StorageResult<Option<Question>>>;
    /// First stats row of a question, as broadcast by `show_stats`.
    fn fetch_stats(
        &self,
        question_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionStats>>>;
    /// Every stats row of a question.
    fn fetch_stats_rows(&self, question_id: &str) -> BoxFuture<'static, StorageResult<RowSet>>;
    /// First leaderboard row, as broadcast by `update_leaderboard`.
    fn fetch_leaderboard(
        &self,
        battle_id: &BattleId,
    ) -> BoxFuture<'static, StorageResult<Option<Leaderboard>>>;
    /// Every leaderboard row.
    fn fetch_leaderboard_rows(
        &self,
        battle_id: &BattleId,
    ) -> BoxFuture<'static, StorageResult<RowSet>>;
    /// Question following sequence position `after`.
    fn fetch_next_question(
        &self,
        battle_id: &BattleId,
        after: i64,
    ) -> BoxFuture<'static, StorageResult<Option<Question>>>;
    /// Cheap round-trip used by the health endpoint.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
