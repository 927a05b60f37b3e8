//! Pending rescan state.
//!
//! Records the last dirty time of every section waiting for a rescan and the
//! time of the most recent trigger. Pure bookkeeping: every method takes the
//! current instant as an argument, so the decision logic is deterministic.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::types::CollectionId;

/// What the scheduler loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing is pending.
    Idle,
    /// Work is pending but the last trigger is still inside `run_time`.
    CoolingDown,
    /// Work is pending but nothing has been quiet for `dwell_time` yet.
    Settling,
    /// This section was removed from the pending set and must be triggered.
    Dispatch(CollectionId),
}

/// Sections waiting for a rescan, keyed by last dirty time.
#[derive(Debug, Default)]
pub struct PendingUpdates {
    /// Pending changes: section -> last dirty timestamp.
    pending: HashMap<CollectionId, Instant>,
    /// When any section was last triggered.
    last_trigger: Option<Instant>,
}

impl PendingUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a section dirty.
    ///
    /// Resets its quiet period; an earlier timestamp is overwritten.
    pub fn record(&mut self, collection: CollectionId, now: Instant) {
        self.pending.insert(collection, now);
    }

    /// Decide the next step and, when dispatching, remove the chosen section.
    ///
    /// At most one section is selected per call. Among sections quiet for
    /// longer than `dwell_time`, the one dirtied earliest wins; ties go to
    /// the lower ID.
    pub fn next_step(&mut self, now: Instant, dwell_time: Duration, run_time: Duration) -> Step {
        if self.pending.is_empty() {
            return Step::Idle;
        }

        if self.in_cooldown(now, run_time) {
            return Step::CoolingDown;
        }

        match self.take_ready(now, dwell_time) {
            Some(collection) => Step::Dispatch(collection),
            None => Step::Settling,
        }
    }

    /// Remove and return the earliest section that has been quiet for
    /// longer than `dwell_time`.
    pub fn take_ready(&mut self, now: Instant, dwell_time: Duration) -> Option<CollectionId> {
        let (collection, dirty_at) = self
            .pending
            .iter()
            .map(|(collection, dirty_at)| (*collection, *dirty_at))
            .min_by_key(|(collection, dirty_at)| (*dirty_at, *collection))?;

        // The earliest entry is the quietest; if it is not ready, none are.
        if now.saturating_duration_since(dirty_at) > dwell_time {
            self.pending.remove(&collection);
            Some(collection)
        } else {
            None
        }
    }

    /// Whether the last trigger is less than `run_time` ago.
    pub fn in_cooldown(&self, now: Instant, run_time: Duration) -> bool {
        self.last_trigger
            .is_some_and(|last| now.saturating_duration_since(last) < run_time)
    }

    /// Record a trigger. The trigger time never moves backwards.
    pub fn mark_triggered(&mut self, now: Instant) {
        self.last_trigger = Some(match self.last_trigger {
            Some(last) => last.max(now),
            None => now,
        });
    }

    pub fn last_trigger(&self) -> Option<Instant> {
        self.last_trigger
    }

    /// Pending sections, ordered by ID.
    pub fn pending_ids(&self) -> Vec<CollectionId> {
        let mut ids: Vec<CollectionId> = self.pending.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn contains(&self, collection: CollectionId) -> bool {
        self.pending.contains_key(&collection)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
