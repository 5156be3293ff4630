//! In-memory collaborators used by the unit tests.

use std::{
    collections::HashMap,
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::future::BoxFuture;
use serde_json::{Map, Value, json};

use crate::{
    dao::{
        battle_store::BattleStore,
        models::{
            BattleId, BattleStatus, Leaderboard, Participant, Question, QuestionStats, RowSet,
        },
        storage::{StorageError, StorageResult},
    },
    dto::broadcast::BattleEvent,
    services::broadcaster::EventSink,
    state::{AppState, SharedState},
};

/// Question `order` of a battle with `total` questions.
pub fn question(order: i64, total: i64) -> Question {
    let mut extra = Map::new();
    extra.insert("question".into(), json!(format!("Question {order}?")));
    Question {
        id: format!("q-{order}"),
        react_order: order,
        total,
        extra,
    }
}

/// Leaderboard rows served for every battle, best first.
pub fn leaderboard_rows() -> Vec<Value> {
    vec![
        json!({ "username": "alice", "score": 30 }),
        json!({ "username": "bob", "score": 20 }),
    ]
}

fn injected(call: &str) -> StorageError {
    StorageError::unavailable(format!("{call} failed"), io::Error::other("injected failure"))
}

#[derive(Default)]
struct FakeData {
    statuses: HashMap<BattleId, BattleStatus>,
    questions: HashMap<BattleId, Vec<Question>>,
    status_writes: Vec<(BattleId, BattleStatus)>,
    first_question_calls: HashMap<BattleId, usize>,
    failing_stats: Option<String>,
    failing_status_reads: bool,
    status_read_delay: Option<Duration>,
}

/// Store keeping battles in memory. Every call yields once before touching
/// the data so concurrent callers interleave like they would over the network.
#[derive(Clone, Default)]
pub struct FakeStore {
    data: Arc<Mutex<FakeData>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a battle with `status` and `count` questions.
    pub fn with_battle(self, battle_id: &str, status: BattleStatus, count: i64) -> Self {
        {
            let mut data = self.data.lock().unwrap();
            let id = BattleId::from(battle_id);
            data.statuses.insert(id.clone(), status);
            data.questions
                .insert(id, (1..=count).map(|order| question(order, count)).collect());
        }
        self
    }

    /// Make the stats lookup of `question_id` fail.
    pub fn fail_stats_for(self, question_id: &str) -> Self {
        self.data.lock().unwrap().failing_stats = Some(question_id.to_string());
        self
    }

    /// Make every status read fail.
    pub fn fail_status_reads(self) -> Self {
        self.data.lock().unwrap().failing_status_reads = true;
        self
    }

    /// Answer status reads `delay` after the value was read.
    pub fn slow_status_reads(self, delay: Duration) -> Self {
        self.data.lock().unwrap().status_read_delay = Some(delay);
        self
    }

    pub fn status(&self, battle_id: &str) -> Option<BattleStatus> {
        self.data
            .lock()
            .unwrap()
            .statuses
            .get(&BattleId::from(battle_id))
            .copied()
    }

    /// Status writes for `battle_id`, in order.
    pub fn status_writes(&self, battle_id: &str) -> Vec<BattleStatus> {
        let id = BattleId::from(battle_id);
        self.data
            .lock()
            .unwrap()
            .status_writes
            .iter()
            .filter(|(written, _)| *written == id)
            .map(|(_, status)| *status)
            .collect()
    }

    /// How many orchestrator runs looked up the first question of `battle_id`.
    pub fn first_question_calls(&self, battle_id: &str) -> usize {
        self.data
            .lock()
            .unwrap()
            .first_question_calls
            .get(&BattleId::from(battle_id))
            .copied()
            .unwrap_or(0)
    }
}

impl BattleStore for FakeStore {
    fn fetch_participants(
        &self,
        battle_id: &BattleId,
    ) -> BoxFuture<'static, StorageResult<Vec<Participant>>> {
        let battle_id = battle_id.clone();
        Box::pin(async move {
            tokio::task::yield_now().await;
            Ok(vec![Participant {
                id: format!("{battle_id}-p1"),
                user_id: "user-1".into(),
                username: Some("alice".into()),
                status: "joined".into(),
            }])
        })
    }

    fn fetch_status(
        &self,
        battle_id: &BattleId,
    ) -> BoxFuture<'static, StorageResult<Option<BattleStatus>>> {
        let data = self.data.clone();
        let battle_id = battle_id.clone();
        Box::pin(async move {
            tokio::task::yield_now().await;
            let (status, delay) = {
                let data = data.lock().unwrap();
                if data.failing_status_reads {
                    return Err(injected("fetch_status"));
                }
                (data.statuses.get(&battle_id).copied(), data.status_read_delay)
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(status)
        })
    }

    fn set_status(
        &self,
        battle_id: &BattleId,
        status: BattleStatus,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let data = self.data.clone();
        let battle_id = battle_id.clone();
        Box::pin(async move {
            tokio::task::yield_now().await;
            let mut data = data.lock().unwrap();
            data.statuses.insert(battle_id.clone(), status);
            data.status_writes.push((battle_id, status));
            Ok(())
        })
    }

    fn fetch_first_question(
        &self,
        battle_id: &BattleId,
    ) -> BoxFuture<'static, StorageResult<Option<Question>>> {
        let data = self.data.clone();
        let battle_id = battle_id.clone();
        Box::pin(async move {
            tokio::task::yield_now().await;
            let mut data = data.lock().unwrap();
            *data
                .first_question_calls
                .entry(battle_id.clone())
                .or_default() += 1;
            Ok(data
                .questions
                .get(&battle_id)
                .and_then(|questions| questions.first().cloned()))
        })
    }

    fn fetch_stats(
        &self,
        question_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionStats>>> {
        let data = self.data.clone();
        let question_id = question_id.to_string();
        Box::pin(async move {
            tokio::task::yield_now().await;
            let data = data.lock().unwrap();
            if data.failing_stats.as_deref() == Some(question_id.as_str()) {
                return Err(injected("fetch_stats"));
            }
            let mut stats = Map::new();
            stats.insert("mcq_id".into(), json!(question_id));
            stats.insert("A".into(), json!(3));
            Ok(Some(QuestionStats(stats)))
        })
    }

    fn fetch_stats_rows(&self, question_id: &str) -> BoxFuture<'static, StorageResult<RowSet>> {
        let stats = self.fetch_stats(question_id);
        Box::pin(async move {
            let rows = stats.await?.map(|stats| Value::Object(stats.0));
            Ok(RowSet(rows.into_iter().collect()))
        })
    }

    fn fetch_leaderboard(
        &self,
        _battle_id: &BattleId,
    ) -> BoxFuture<'static, StorageResult<Option<Leaderboard>>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            Ok(leaderboard_rows().into_iter().find_map(|row| match row {
                Value::Object(row) => Some(Leaderboard(row)),
                _ => None,
            }))
        })
    }

    fn fetch_leaderboard_rows(
        &self,
        _battle_id: &BattleId,
    ) -> BoxFuture<'static, StorageResult<RowSet>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            Ok(RowSet(leaderboard_rows()))
        })
    }

    fn fetch_next_question(
        &self,
        battle_id: &BattleId,
        after: i64,
    ) -> BoxFuture<'static, StorageResult<Option<Question>>> {
        let data = self.data.clone();
        let battle_id = battle_id.clone();
        Box::pin(async move {
            tokio::task::yield_now().await;
            let data = data.lock().unwrap();
            Ok(data.questions.get(&battle_id).and_then(|questions| {
                questions
                    .iter()
                    .find(|question| question.react_order > after)
                    .cloned()
            }))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Sink remembering every published event.
#[derive(Clone, Default)]
pub struct RecordingSink {
    published: Arc<Mutex<Vec<(BattleId, BattleEvent, Value)>>>,
    undeliverable: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records events but reports every delivery as failed.
    pub fn undeliverable() -> Self {
        Self {
            undeliverable: true,
            ..Self::default()
        }
    }

    /// Event types published for `battle_id`, in order.
    pub fn events(&self, battle_id: &str) -> Vec<BattleEvent> {
        let id = BattleId::from(battle_id);
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(published, _, _)| *published == id)
            .map(|(_, event, _)| *event)
            .collect()
    }

    /// Payloads published for `battle_id` with type `event`.
    pub fn payloads(&self, battle_id: &str, event: BattleEvent) -> Vec<Value> {
        let id = BattleId::from(battle_id);
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(published, kind, _)| *published == id && *kind == event)
            .map(|(_, _, payload)| payload.clone())
            .collect()
    }

    pub fn count(&self, battle_id: &str, event: BattleEvent) -> usize {
        self.events(battle_id)
            .into_iter()
            .filter(|published| *published == event)
            .count()
    }
}

impl EventSink for RecordingSink {
    fn publish(
        &self,
        battle_id: &BattleId,
        event: BattleEvent,
        payload: Value,
    ) -> BoxFuture<'static, bool> {
        self.published
            .lock()
            .unwrap()
            .push((battle_id.clone(), event, payload));
        let delivered = !self.undeliverable;
        Box::pin(async move { delivered })
    }
}

/// Shared state wired to the given fakes.
pub fn state_with(store: &FakeStore, sink: &RecordingSink) -> SharedState {
    AppState::new(Arc::new(store.clone()), Arc::new(sink.clone()))
}
