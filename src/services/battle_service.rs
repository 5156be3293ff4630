//! Start and stop coordination. Reconciles the persisted status of a battle
//! with the registry of running orchestrators before anything is spawned.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{
    dao::models::{BattleId, BattleStatus},
    services::{battle_events, orchestrator},
    state::{Registration, SharedState},
};

/// Delay between `battle_start_pending` and `battle_start` on a fresh start,
/// leaving late subscribers time to join the channel.
pub const START_GRACE: Duration = Duration::from_secs(5);

/// What a start request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAction {
    /// An orchestrator already runs; subscribers were told to resume.
    Resumed,
    /// The battle was active without an orchestrator; a new one was spawned.
    ZombieRepaired,
    /// A pending battle was started.
    Started,
    /// The battle already finished.
    Rejected,
    /// The store knows no such battle.
    NotFound,
    /// The store could not be reached.
    Unavailable,
    /// The battle was stopped during the start grace window.
    Cancelled,
}

/// Structured answer to a start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    /// Whether the battle is (or keeps) running after the request.
    pub accepted: bool,
    /// Human-readable explanation returned to the caller.
    pub message: String,
    /// Branch of the decision table that was taken.
    pub action: StartAction,
}

impl StartOutcome {
    fn accepted(action: StartAction, message: impl Into<String>) -> Self {
        Self {
            accepted: true,
            message: message.into(),
            action,
        }
    }

    fn refused(action: StartAction, message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            message: message.into(),
            action,
        }
    }
}

/// Start, resume or repair `battle_id` depending on its persisted status.
///
/// | status    | registered | action                           |
/// |-----------|------------|----------------------------------|
/// | Active    | yes        | resume                           |
/// | Active    | no         | repair zombie, spawn orchestrator|
/// | Completed | any        | reject                           |
/// | Pending   | no         | fresh start                      |
/// | Pending   | yes        | inconsistent, resume             |
///
/// Registry membership is checked and taken in a single step so concurrent
/// requests for the same battle spawn at most one orchestrator. Once the
/// battle is claimed the rest of the start runs on its own task, so a caller
/// that goes away mid-request cannot leave the battle half started.
pub async fn request_start(state: &SharedState, battle_id: &BattleId) -> StartOutcome {
    info!(%battle_id, "start requested");
    log_participants(state, battle_id).await;

    let status = match read_status(state, battle_id).await {
        Ok(status) => status,
        Err(refusal) => return refusal,
    };
    info!(%battle_id, %status, "current battle status");

    match status {
        BattleStatus::Completed => reject_finished(battle_id),
        BattleStatus::Active => match state.registry().try_register(battle_id) {
            Some(registration) => start_claimed(state, registration).await,
            None => resume(state, battle_id).await,
        },
        BattleStatus::Pending => match state.registry().try_register(battle_id) {
            Some(registration) => start_claimed(state, registration).await,
            None => {
                warn!(
                    %battle_id,
                    "pending battle is already registered; treating start as resume"
                );
                resume(state, battle_id).await
            }
        },
    }
}

async fn read_status(
    state: &SharedState,
    battle_id: &BattleId,
) -> Result<BattleStatus, StartOutcome> {
    match state.store().fetch_status(battle_id).await {
        Ok(Some(status)) => Ok(status),
        Ok(None) => {
            warn!(%battle_id, "start requested for unknown battle");
            Err(StartOutcome::refused(StartAction::NotFound, "Battle not found"))
        }
        Err(err) => {
            error!(%battle_id, error = %err, "failed to read battle status");
            Err(StartOutcome::refused(
                StartAction::Unavailable,
                "Battle store unavailable",
            ))
        }
    }
}

fn reject_finished(battle_id: &BattleId) -> StartOutcome {
    info!(%battle_id, "battle already completed; not starting");
    StartOutcome::refused(StartAction::Rejected, "Battle already finished")
}

/// Finish a start on a detached task owning `registration`.
async fn start_claimed(state: &SharedState, registration: Registration) -> StartOutcome {
    let battle_id = registration.battle_id().clone();
    match tokio::spawn(run_claimed(state.clone(), registration)).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(%battle_id, error = %err, "start task failed");
            StartOutcome::refused(StartAction::Unavailable, "Battle start failed")
        }
    }
}

async fn run_claimed(state: SharedState, registration: Registration) -> StartOutcome {
    let battle_id = registration.battle_id().clone();

    // Only the registration holder writes the status, so this read is stable
    // until the registration is given back.
    let status = match read_status(&state, &battle_id).await {
        Ok(status) => status,
        Err(refusal) => return refusal,
    };
    match status {
        BattleStatus::Completed => reject_finished(&battle_id),
        BattleStatus::Pending => fresh_start(&state, registration).await,
        BattleStatus::Active => repair_zombie(&state, registration).await,
    }
}

async fn resume(state: &SharedState, battle_id: &BattleId) -> StartOutcome {
    info!(%battle_id, "battle already running; joining ongoing flow");
    battle_events::publish_resume(
        state,
        battle_id,
        "A new player joined an active battle, continuing broadcast",
    )
    .await;
    StartOutcome::accepted(StartAction::Resumed, "Joined ongoing battle successfully")
}

async fn repair_zombie(state: &SharedState, registration: Registration) -> StartOutcome {
    let battle_id = registration.battle_id().clone();
    warn!(%battle_id, "battle active without orchestrator; restarting");
    battle_events::publish_resume(state, &battle_id, "Orchestrator resumed automatically").await;
    orchestrator::spawn(state.clone(), registration);
    StartOutcome::accepted(StartAction::ZombieRepaired, "Battle resumed successfully")
}

async fn fresh_start(state: &SharedState, registration: Registration) -> StartOutcome {
    let battle_id = registration.battle_id().clone();

    if let Err(err) = state
        .store()
        .set_status(&battle_id, BattleStatus::Active)
        .await
    {
        error!(%battle_id, error = %err, "failed to mark battle active");
        return StartOutcome::refused(StartAction::Unavailable, "Battle store unavailable");
    }

    battle_events::publish_start_pending(state, &battle_id).await;
    info!(%battle_id, grace_secs = START_GRACE.as_secs(), "holding start for late subscribers");

    let stopped = tokio::select! {
        biased;
        _ = registration.cancellation().cancelled() => true,
        _ = sleep(START_GRACE) => false,
    };
    if stopped {
        warn!(%battle_id, "battle stopped during start grace window");
        return StartOutcome::refused(StartAction::Cancelled, "Battle start cancelled");
    }

    battle_events::publish_start(state, &battle_id).await;
    orchestrator::spawn(state.clone(), registration);
    info!(%battle_id, "buffered start triggered");

    StartOutcome::accepted(
        StartAction::Started,
        format!(
            "Battle {battle_id} will start after {} s buffer",
            START_GRACE.as_secs()
        ),
    )
}

async fn log_participants(state: &SharedState, battle_id: &BattleId) {
    match state.store().fetch_participants(battle_id).await {
        Ok(participants) => info!(%battle_id, joined = participants.len(), "joined players"),
        Err(err) => warn!(%battle_id, error = %err, "failed to fetch participants"),
    }
}

/// Structured answer to a stop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopOutcome {
    /// Whether a running orchestrator was signalled.
    pub stopped: bool,
    /// Human-readable explanation returned to the caller.
    pub message: String,
}

/// Signal the orchestrator owning `battle_id` to stop at its next wait point.
///
/// The persisted status is left untouched: a stopped battle stays active and a
/// later start request repairs it.
pub fn request_stop(state: &SharedState, battle_id: &BattleId) -> StopOutcome {
    match state.registry().cancel(battle_id) {
        Some(run_id) => {
            info!(%battle_id, %run_id, "stop requested");
            StopOutcome {
                stopped: true,
                message: "Battle stop requested".into(),
            }
        }
        None => StopOutcome {
            stopped: false,
            message: "Battle is not running".into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use futures::future::join_all;

    use super::*;
    use crate::{
        dto::broadcast::BattleEvent,
        test_support::{FakeStore, RecordingSink, state_with},
    };

    async fn drain(state: &SharedState) {
        // Long enough for any battle in these tests to play out.
        sleep(Duration::from_secs(600)).await;
        assert!(state.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_start_publishes_pending_then_start_then_questions() {
        let store = FakeStore::new().with_battle("b1", BattleStatus::Pending, 1);
        let sink = RecordingSink::new();
        let state = state_with(&store, &sink);

        let outcome = request_start(&state, &BattleId::from("b1")).await;

        assert!(outcome.accepted);
        assert_eq!(outcome.action, StartAction::Started);
        assert_eq!(outcome.message, "Battle b1 will start after 5 s buffer");
        assert_eq!(
            &sink.events("b1")[..2],
            &[BattleEvent::BattleStartPending, BattleEvent::BattleStart]
        );

        drain(&state).await;
        assert_eq!(
            sink.events("b1"),
            vec![
                BattleEvent::BattleStartPending,
                BattleEvent::BattleStart,
                BattleEvent::NewQuestion,
                BattleEvent::ShowStats,
                BattleEvent::UpdateLeaderboard,
                BattleEvent::BattleEnd,
            ]
        );
        assert_eq!(
            store.status_writes("b1"),
            vec![BattleStatus::Active, BattleStatus::Completed]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_starts_spawn_a_single_orchestrator() {
        let store = FakeStore::new().with_battle("b1", BattleStatus::Pending, 2);
        let sink = RecordingSink::new();
        let state = state_with(&store, &sink);
        let battle = BattleId::from("b1");

        let outcomes = join_all((0..8).map(|_| request_start(&state, &battle))).await;

        let started = outcomes
            .iter()
            .filter(|outcome| outcome.action == StartAction::Started)
            .count();
        assert_eq!(started, 1);
        assert!(outcomes.iter().all(|outcome| outcome.accepted));
        assert!(
            outcomes
                .iter()
                .all(|outcome| matches!(outcome.action, StartAction::Started | StartAction::Resumed))
        );

        drain(&state).await;
        assert_eq!(store.first_question_calls("b1"), 1);
        assert_eq!(sink.count("b1", BattleEvent::BattleStart), 1);
        assert_eq!(sink.count("b1", BattleEvent::BattleEnd), 1);
        assert_eq!(
            store.status_writes("b1"),
            vec![BattleStatus::Active, BattleStatus::Completed]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn active_battle_without_orchestrator_is_repaired() {
        let store = FakeStore::new().with_battle("b1", BattleStatus::Active, 1);
        let sink = RecordingSink::new();
        let state = state_with(&store, &sink);

        let outcome = request_start(&state, &BattleId::from("b1")).await;

        assert!(outcome.accepted);
        assert_eq!(outcome.action, StartAction::ZombieRepaired);
        assert_eq!(sink.count("b1", BattleEvent::BattleResume), 1);
        assert_eq!(
            sink.payloads("b1", BattleEvent::BattleResume)[0]["message"],
            "Orchestrator resumed automatically"
        );

        drain(&state).await;
        assert_eq!(store.first_question_calls("b1"), 1);
        assert_eq!(sink.count("b1", BattleEvent::BattleStart), 0);
        assert_eq!(store.status("b1"), Some(BattleStatus::Completed));
        assert_eq!(
            &sink.events("b1")[..2],
            &[BattleEvent::BattleResume, BattleEvent::NewQuestion]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn zombie_repair_announces_resume_before_first_question() {
        for round in 0..20 {
            let battle = format!("b{round}");
            let store = FakeStore::new().with_battle(&battle, BattleStatus::Active, 1);
            let sink = RecordingSink::new();
            let state = state_with(&store, &sink);

            let outcome = request_start(&state, &BattleId::from(battle.as_str())).await;
            assert_eq!(outcome.action, StartAction::ZombieRepaired);

            while sink.count(&battle, BattleEvent::NewQuestion) == 0 {
                tokio::task::yield_now().await;
            }
            assert_eq!(sink.events(&battle)[0], BattleEvent::BattleResume);
            assert!(state.registry().cancel(&BattleId::from(battle.as_str())).is_some());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_racing_the_final_phase_does_not_replay_the_battle() {
        let store = FakeStore::new()
            .with_battle("b1", BattleStatus::Active, 1)
            .slow_status_reads(Duration::from_secs(3));
        let sink = RecordingSink::new();
        let state = state_with(&store, &sink);
        let battle = BattleId::from("b1");
        let registration = state.registry().try_register(&battle).unwrap();
        orchestrator::spawn(state.clone(), registration);

        // The status is read as Active at 39s; the run completes at 40s.
        sleep(Duration::from_secs(39)).await;
        let outcome = request_start(&state, &battle).await;

        assert!(!outcome.accepted);
        assert_eq!(outcome.action, StartAction::Rejected);
        drain(&state).await;
        assert_eq!(store.status_writes("b1"), vec![BattleStatus::Completed]);
        assert_eq!(store.first_question_calls("b1"), 1);
        assert_eq!(sink.count("b1", BattleEvent::BattleEnd), 1);
        assert_eq!(sink.count("b1", BattleEvent::BattleResume), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_start_request_still_starts_the_battle() {
        let store = FakeStore::new().with_battle("b1", BattleStatus::Pending, 1);
        let sink = RecordingSink::new();
        let state = state_with(&store, &sink);

        let abandoned = tokio::time::timeout(
            Duration::from_secs(2),
            request_start(&state, &BattleId::from("b1")),
        )
        .await;
        assert!(abandoned.is_err());

        drain(&state).await;
        assert_eq!(
            store.status_writes("b1"),
            vec![BattleStatus::Active, BattleStatus::Completed]
        );
        assert_eq!(sink.count("b1", BattleEvent::BattleStart), 1);
        assert_eq!(sink.count("b1", BattleEvent::BattleEnd), 1);
        assert_eq!(store.first_question_calls("b1"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_on_running_battle_only_resumes() {
        let store = FakeStore::new().with_battle("b1", BattleStatus::Active, 1);
        let sink = RecordingSink::new();
        let state = state_with(&store, &sink);
        let battle = BattleId::from("b1");
        let _held = state.registry().try_register(&battle).unwrap();

        let outcome = request_start(&state, &battle).await;

        assert!(outcome.accepted);
        assert_eq!(outcome.action, StartAction::Resumed);
        assert_eq!(outcome.message, "Joined ongoing battle successfully");
        assert_eq!(sink.events("b1"), vec![BattleEvent::BattleResume]);
        assert_eq!(store.first_question_calls("b1"), 0);
        assert!(store.status_writes("b1").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn completed_battle_is_rejected_without_side_effects() {
        let store = FakeStore::new().with_battle("b1", BattleStatus::Completed, 2);
        let sink = RecordingSink::new();
        let state = state_with(&store, &sink);

        let outcome = request_start(&state, &BattleId::from("b1")).await;

        assert!(!outcome.accepted);
        assert_eq!(outcome.action, StartAction::Rejected);
        assert_eq!(outcome.message, "Battle already finished");
        assert!(sink.events("b1").is_empty());
        assert!(store.status_writes("b1").is_empty());
        assert!(state.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_battle_is_not_started() {
        let store = FakeStore::new();
        let sink = RecordingSink::new();
        let state = state_with(&store, &sink);

        let outcome = request_start(&state, &BattleId::from("ghost")).await;

        assert!(!outcome.accepted);
        assert_eq!(outcome.action, StartAction::NotFound);
        assert!(sink.events("ghost").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_status_refuses_the_start() {
        let store = FakeStore::new()
            .with_battle("b1", BattleStatus::Pending, 1)
            .fail_status_reads();
        let sink = RecordingSink::new();
        let state = state_with(&store, &sink);

        let outcome = request_start(&state, &BattleId::from("b1")).await;

        assert!(!outcome.accepted);
        assert_eq!(outcome.action, StartAction::Unavailable);
        assert!(sink.events("b1").is_empty());
        assert!(state.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_grace_window_cancels_the_start() {
        let store = FakeStore::new().with_battle("b1", BattleStatus::Pending, 1);
        let sink = RecordingSink::new();
        let state = state_with(&store, &sink);
        let battle = BattleId::from("b1");

        let (outcome, stop) = tokio::join!(request_start(&state, &battle), async {
            sleep(Duration::from_secs(2)).await;
            request_stop(&state, &battle)
        });

        assert!(stop.stopped);
        assert!(!outcome.accepted);
        assert_eq!(outcome.action, StartAction::Cancelled);
        assert_eq!(sink.events("b1"), vec![BattleEvent::BattleStartPending]);
        assert_eq!(store.first_question_calls("b1"), 0);
        assert!(state.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_mid_run_leaves_the_battle_active() {
        let store = FakeStore::new().with_battle("b1", BattleStatus::Active, 3);
        let sink = RecordingSink::new();
        let state = state_with(&store, &sink);
        let battle = BattleId::from("b1");

        request_start(&state, &battle).await;
        sleep(Duration::from_secs(25)).await;
        let stop = request_stop(&state, &battle);

        assert!(stop.stopped);
        assert_eq!(stop.message, "Battle stop requested");
        drain(&state).await;
        assert_eq!(sink.count("b1", BattleEvent::BattleEnd), 0);
        assert!(store.status_writes("b1").is_empty());
        assert_eq!(store.status("b1"), Some(BattleStatus::Active));

        // A later start repairs the stopped battle.
        let outcome = request_start(&state, &battle).await;
        assert_eq!(outcome.action, StartAction::ZombieRepaired);
    }

    #[test]
    fn stop_without_orchestrator_reports_not_running() {
        let store = FakeStore::new();
        let sink = RecordingSink::new();
        let state = state_with(&store, &sink);

        let stop = request_stop(&state, &BattleId::from("b1"));

        assert!(!stop.stopped);
        assert_eq!(stop.message, "Battle is not running");
    }
}
