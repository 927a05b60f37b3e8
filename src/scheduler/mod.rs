//! Debounced, rate-limited rescan scheduling.
//!
//! Sections are queued whenever something under their watch roots changes.
//! A section is only rescanned once it has been quiet for `dwell_time`, and
//! no two rescans (of any section) start less than `run_time` apart.
//!
//! # Architecture
//!
//! ```text
//! EventRouter --queue_update--> SchedulerHandle
//!                                    |
//!                          Arc<Mutex<PendingUpdates>>
//!                                    |
//!                              UpdateScheduler (task)
//!                                    |
//!                            RefreshClient::refresh
//! ```

mod clock;
mod pending;
mod worker;

pub use clock::{Clock, TokioClock};
pub use pending::{PendingUpdates, Step};
pub use worker::{SchedulerHandle, SchedulerSnapshot, SchedulerTiming, UpdateScheduler};
