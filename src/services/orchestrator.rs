//! Phase loop driving one battle from its first question to its end.

use std::time::Duration;

use thiserror::Error;
use tokio::{task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

use crate::{
    dao::{
        models::{BattleId, BattleStatus},
        storage::StorageError,
    },
    services::battle_events,
    state::{
        Registration, SharedState,
        phase::{BattlePhase, PhaseEvent, PhaseMachine, TransitionError},
    },
};

/// Reasons a run stops before the battle is completed.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A store call failed; the run is abandoned without retry.
    #[error("store call `{call}` failed")]
    Store {
        /// Store call that failed.
        call: &'static str,
        /// Storage failure.
        #[source]
        source: StorageError,
    },
    /// The store served data the phase machine cannot accept.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

fn store_error(call: &'static str) -> impl FnOnce(StorageError) -> OrchestratorError {
    move |source| OrchestratorError::Store { call, source }
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every question was played and the battle is marked completed.
    Completed {
        /// Number of questions played.
        questions: usize,
    },
    /// The battle has no question at all.
    NoQuestions,
    /// An operator stopped the battle.
    Cancelled,
}

/// Run the phase loop of the registered battle on its own task.
pub fn spawn(state: SharedState, registration: Registration) -> JoinHandle<()> {
    tokio::spawn(run(state, registration))
}

/// Drive the registered battle to its end, then give the registration back.
///
/// The registration is released whatever happens inside the loop, including panics.
pub async fn run(state: SharedState, registration: Registration) {
    let battle_id = registration.battle_id().clone();
    let span = info_span!("orchestrator", %battle_id, run_id = %registration.run_id());

    async move {
        info!("orchestrator started");
        match drive(&state, &battle_id, registration.cancellation()).await {
            Ok(outcome) => info!(?outcome, "orchestrator finished"),
            Err(err) => error!(error = %err, "orchestrator aborted"),
        }
        drop(registration);
        info!("orchestrator stopped");
    }
    .instrument(span)
    .await
}

async fn drive(
    state: &SharedState,
    battle_id: &BattleId,
    cancel: &CancellationToken,
) -> Result<RunOutcome, OrchestratorError> {
    let store = state.store();

    let Some(first) = store
        .fetch_first_question(battle_id)
        .await
        .map_err(store_error("fetch_first_question"))?
    else {
        warn!("no questions found for battle");
        battle_events::publish_end(state, battle_id, "No questions found").await;
        return Ok(RunOutcome::NoQuestions);
    };

    let mut machine = PhaseMachine::start(first);
    if let BattlePhase::Question(question) = machine.phase() {
        info!(
            react_order = question.react_order,
            total = question.total,
            "question opened"
        );
        battle_events::publish_question(state, battle_id, question).await;
    }

    while let Some(dwell) = machine.phase().dwell() {
        if !pause(dwell, cancel).await {
            return Ok(RunOutcome::Cancelled);
        }

        let event = match machine.phase() {
            BattlePhase::Question(question) => {
                let stats = store
                    .fetch_stats(&question.id)
                    .await
                    .map_err(store_error("fetch_stats"))?
                    .unwrap_or_default();
                info!(react_order = question.react_order, "showing stats");
                battle_events::publish_stats(state, battle_id, &stats).await;
                PhaseEvent::StatsShown
            }
            BattlePhase::Stats(question) => {
                let leaderboard = store
                    .fetch_leaderboard(battle_id)
                    .await
                    .map_err(store_error("fetch_leaderboard"))?
                    .unwrap_or_default();
                info!(react_order = question.react_order, "showing leaderboard");
                battle_events::publish_leaderboard(state, battle_id, &leaderboard).await;
                PhaseEvent::LeaderboardShown
            }
            BattlePhase::Leaderboard(question) => {
                match store
                    .fetch_next_question(battle_id, question.react_order)
                    .await
                    .map_err(store_error("fetch_next_question"))?
                {
                    Some(next) => PhaseEvent::NextQuestion(next),
                    None => PhaseEvent::QuestionsExhausted,
                }
            }
            BattlePhase::Terminated => break,
        };

        match machine.apply(event)? {
            BattlePhase::Question(question) => {
                info!(
                    react_order = question.react_order,
                    total = question.total,
                    "question opened"
                );
                battle_events::publish_question(state, battle_id, question).await;
            }
            BattlePhase::Terminated => {
                store
                    .set_status(battle_id, BattleStatus::Completed)
                    .await
                    .map_err(store_error("set_status"))?;
                battle_events::publish_end(state, battle_id, "Battle completed").await;
                info!("battle completed");
            }
            BattlePhase::Stats(_) | BattlePhase::Leaderboard(_) => {}
        }
    }

    Ok(RunOutcome::Completed {
        questions: machine.questions_opened(),
    })
}

/// Wait for `dwell` unless the battle is stopped first. Returns `false` on stop.
async fn pause(dwell: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            info!("battle stopped by operator");
            false
        }
        _ = sleep(dwell) => true,
    }
}
