//! Battles currently owned by an orchestrator of this process.

use std::{sync::Arc, time::Instant};

use dashmap::{DashMap, mapref::entry::Entry};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::dao::models::BattleId;

/// Unique identifier of one orchestrator run.
pub type RunId = Uuid;

#[derive(Debug)]
struct RegistryEntry {
    run_id: RunId,
    cancel: CancellationToken,
    since: Instant,
}

/// Process-local set of battles owned by a running orchestrator.
///
/// Membership is taken with [`BattleRegistry::try_register`] and given back
/// when the returned [`Registration`] is dropped.
#[derive(Debug, Clone, Default)]
pub struct BattleRegistry {
    entries: Arc<DashMap<BattleId, RegistryEntry>>,
}

impl BattleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim `battle_id`, returning `None` when it is already owned.
    pub fn try_register(&self, battle_id: &BattleId) -> Option<Registration> {
        match self.entries.entry(battle_id.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let run_id = Uuid::new_v4();
                let cancel = CancellationToken::new();
                slot.insert(RegistryEntry {
                    run_id,
                    cancel: cancel.clone(),
                    since: Instant::now(),
                });
                Some(Registration {
                    entries: self.entries.clone(),
                    battle_id: battle_id.clone(),
                    run_id,
                    cancel,
                })
            }
        }
    }

    /// Whether an orchestrator currently owns `battle_id`.
    pub fn contains(&self, battle_id: &BattleId) -> bool {
        self.entries.contains_key(battle_id)
    }

    /// Signal the owner of `battle_id` to stop, returning the signalled run.
    ///
    /// The entry stays until the owner observes the signal and drops its registration.
    pub fn cancel(&self, battle_id: &BattleId) -> Option<RunId> {
        self.entries.get(battle_id).map(|entry| {
            entry.cancel.cancel();
            entry.run_id
        })
    }

    /// Seconds elapsed since `battle_id` was claimed, if it is.
    pub fn running_for(&self, battle_id: &BattleId) -> Option<u64> {
        self.entries
            .get(battle_id)
            .map(|entry| entry.since.elapsed().as_secs())
    }

    /// Number of battles currently owned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no battle is currently owned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Proof of ownership of a battle; releases the registry entry on drop.
#[derive(Debug)]
pub struct Registration {
    entries: Arc<DashMap<BattleId, RegistryEntry>>,
    battle_id: BattleId,
    run_id: RunId,
    cancel: CancellationToken,
}

impl Registration {
    /// Battle owned by this registration.
    pub fn battle_id(&self) -> &BattleId {
        &self.battle_id
    }

    /// Identifier of the run holding the battle.
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Token signalled when an operator stops the battle.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let run_id = self.run_id;
        self.entries
            .remove_if(&self.battle_id, |_, entry| entry.run_id == run_id);
    }
}
