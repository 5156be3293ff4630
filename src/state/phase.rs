//! Phase state machine pacing one battle question by question.

use std::time::Duration;

use thiserror::Error;

use crate::dao::models::Question;

/// Time a question stays open before its stats are revealed.
pub const QUESTION_DWELL: Duration = Duration::from_secs(20);
/// Time the stats stay on screen before the leaderboard.
pub const STATS_DWELL: Duration = Duration::from_secs(10);
/// Time the leaderboard stays on screen before the next question.
pub const LEADERBOARD_DWELL: Duration = Duration::from_secs(10);

/// Phases a battle cycles through for each question.
#[derive(Debug, Clone, PartialEq)]
pub enum BattlePhase {
    /// The question is open for answers.
    Question(Question),
    /// Answer distribution of the question is shown.
    Stats(Question),
    /// Ranking after the question is shown.
    Leaderboard(Question),
    /// No question is left; the battle is over.
    Terminated,
}

impl BattlePhase {
    /// How long the phase lasts before the next transition, if it ever ends.
    pub fn dwell(&self) -> Option<Duration> {
        match self {
            BattlePhase::Question(_) => Some(QUESTION_DWELL),
            BattlePhase::Stats(_) => Some(STATS_DWELL),
            BattlePhase::Leaderboard(_) => Some(LEADERBOARD_DWELL),
            BattlePhase::Terminated => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            BattlePhase::Question(_) => "question",
            BattlePhase::Stats(_) => "stats",
            BattlePhase::Leaderboard(_) => "leaderboard",
            BattlePhase::Terminated => "terminated",
        }
    }
}

/// Events moving a battle from one phase to the next.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseEvent {
    /// Stats of the current question were published.
    StatsShown,
    /// The leaderboard was published.
    LeaderboardShown,
    /// The store returned the question following the current one.
    NextQuestion(Question),
    /// The store has no question after the current one.
    QuestionsExhausted,
}

impl PhaseEvent {
    fn name(&self) -> &'static str {
        match self {
            PhaseEvent::StatsShown => "stats_shown",
            PhaseEvent::LeaderboardShown => "leaderboard_shown",
            PhaseEvent::NextQuestion(_) => "next_question",
            PhaseEvent::QuestionsExhausted => "questions_exhausted",
        }
    }
}

/// Error returned when an event cannot be applied in the current phase.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    /// The event does not belong to the current phase.
    #[error("invalid transition: {event} cannot be applied while in {from}")]
    Invalid {
        from: &'static str,
        event: &'static str,
    },
    /// The next question does not come after the current one.
    #[error("question sequence went from {current} to {next}")]
    OutOfOrder { current: i64, next: i64 },
}

/// Per-battle phase state machine.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: BattlePhase,
    questions_opened: usize,
}

impl PhaseMachine {
    /// Start in the question phase with the battle's first question.
    pub fn start(first: Question) -> Self {
        Self {
            phase: BattlePhase::Question(first),
            questions_opened: 1,
        }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> &BattlePhase {
        &self.phase
    }

    /// Number of questions opened so far, the current one included.
    pub fn questions_opened(&self) -> usize {
        self.questions_opened
    }

    /// Apply `event`, returning the new phase.
    pub fn apply(&mut self, event: PhaseEvent) -> Result<&BattlePhase, TransitionError> {
        let next = self.compute_transition(event)?;
        if matches!(next, BattlePhase::Question(_)) {
            self.questions_opened += 1;
        }
        self.phase = next;
        Ok(&self.phase)
    }

    fn compute_transition(&self, event: PhaseEvent) -> Result<BattlePhase, TransitionError> {
        let next = match (&self.phase, event) {
            (BattlePhase::Question(question), PhaseEvent::StatsShown) => {
                BattlePhase::Stats(question.clone())
            }
            (BattlePhase::Stats(question), PhaseEvent::LeaderboardShown) => {
                BattlePhase::Leaderboard(question.clone())
            }
            (BattlePhase::Leaderboard(current), PhaseEvent::NextQuestion(next)) => {
                if next.react_order <= current.react_order {
                    return Err(TransitionError::OutOfOrder {
                        current: current.react_order,
                        next: next.react_order,
                    });
                }
                BattlePhase::Question(next)
            }
            (BattlePhase::Leaderboard(_), PhaseEvent::QuestionsExhausted) => {
                BattlePhase::Terminated
            }
            (from, event) => {
                return Err(TransitionError::Invalid {
                    from: from.name(),
                    event: event.name(),
                });
            }
        };

        Ok(next)
    }
}
