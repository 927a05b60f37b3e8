//! Background task that turns pending sections into rescans.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::plex::RefreshClient;
use crate::types::CollectionId;

use super::clock::{Clock, TokioClock};
use super::pending::{PendingUpdates, Step};

/// Timing parameters of the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTiming {
    /// Quiet period before a section is eligible.
    pub dwell_time: Duration,
    /// Minimum spacing between two triggers.
    pub run_time: Duration,
    /// Pause after each dispatch attempt.
    pub poll_interval: Duration,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self::from(&SchedulerConfig::default())
    }
}

impl From<&SchedulerConfig> for SchedulerTiming {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            dwell_time: config.dwell_time(),
            run_time: config.run_time(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// Point-in-time view of the scheduler state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    pub pending: Vec<CollectionId>,
    pub last_trigger: Option<Instant>,
}

/// Producer side of the scheduler. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    state: Arc<Mutex<PendingUpdates>>,
    clock: Arc<dyn Clock>,
}

impl SchedulerHandle {
    /// Mark a section dirty, restarting its quiet period.
    pub fn queue_update(&self, collection: CollectionId) {
        crate::log_event!("scheduler", "queued", "section {collection}");
        let now = self.clock.now();
        self.state.lock().record(collection, now);
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        let state = self.state.lock();
        SchedulerSnapshot {
            pending: state.pending_ids(),
            last_trigger: state.last_trigger(),
        }
    }
}

/// Debounced, rate-limited rescan scheduler.
///
/// Owns the pending state and the refresh client. Producers get a
/// [`SchedulerHandle`]; the loop itself runs via [`UpdateScheduler::run`]
/// until its cancellation token fires.
pub struct UpdateScheduler {
    state: Arc<Mutex<PendingUpdates>>,
    clock: Arc<dyn Clock>,
    client: Arc<dyn RefreshClient>,
    timing: SchedulerTiming,
}

impl UpdateScheduler {
    pub fn new(client: Arc<dyn RefreshClient>, timing: SchedulerTiming) -> Self {
        Self {
            state: Arc::new(Mutex::new(PendingUpdates::new())),
            clock: Arc::new(TokioClock),
            client,
            timing,
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create a producer handle sharing this scheduler's state.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            state: self.state.clone(),
            clock: self.clock.clone(),
        }
    }

    /// Run the loop on a new task.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Main loop:
    /// 1. Nothing pending: sleep `dwell_time`
    /// 2. Last trigger within `run_time`: sleep `dwell_time`
    /// 3. Otherwise trigger at most one quiet section, then sleep `poll_interval`
    pub async fn run(self, cancel: CancellationToken) {
        crate::log_event!(
            "scheduler",
            "alive",
            "dwell {:?}, run {:?}",
            self.timing.dwell_time,
            self.timing.run_time
        );

        // Only this loop sets the trigger time, so a local copy stays current
        let mut last_trigger: Option<Instant> = None;

        loop {
            let pause = match self.next_step(last_trigger) {
                Step::Idle => self.timing.dwell_time,
                Step::CoolingDown => {
                    crate::debug_event!("scheduler", "waiting for scan");
                    self.timing.dwell_time
                }
                Step::Settling => self.timing.poll_interval,
                Step::Dispatch(collection) => match self.dispatch(collection, &cancel).await {
                    Some(triggered) => {
                        last_trigger = Some(triggered);
                        self.timing.poll_interval
                    }
                    None => break,
                },
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = sleep(pause) => {}
            }
        }

        crate::log_event!("scheduler", "stopped");
    }

    /// Cooldown is decided from `last_trigger` without taking the lock.
    fn next_step(&self, last_trigger: Option<Instant>) -> Step {
        let now = self.clock.now();
        let cooling = last_trigger
            .is_some_and(|last| now.saturating_duration_since(last) < self.timing.run_time);
        if cooling {
            return Step::CoolingDown;
        }

        self.state
            .lock()
            .next_step(now, self.timing.dwell_time, self.timing.run_time)
    }

    /// Trigger one section and return the recorded trigger time, or `None`
    /// if cancelled mid-call.
    ///
    /// The lock is not held while the request is in flight, so producers
    /// are never blocked by a slow server.
    async fn dispatch(
        &self,
        collection: CollectionId,
        cancel: &CancellationToken,
    ) -> Option<Instant> {
        crate::log_event!("scheduler", "time to scan", "section {collection}");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            result = self.client.refresh(collection) => result,
        };

        match result {
            Ok(()) => crate::debug_event!("scheduler", "refresh accepted", "section {collection}"),
            // Not re-queued; the next change under this section queues it again.
            Err(e) => tracing::error!("[scheduler] refresh of section {collection} failed: {e}"),
        }

        let now = self.clock.now();
        let mut state = self.state.lock();
        state.mark_triggered(now);
        state.last_trigger()
    }
}
