//! Per-refresh tick scheduling.
//!
//! Playback and camera updates run on a callback invoked once per display
//! refresh. The [`TickScheduler`] trait abstracts that loop so components
//! can be driven by a real refresh source or by synthetic timestamps in
//! tests. Every registration returns a [`CancelToken`]; once cancelled,
//! the callback is never invoked again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::clock::TimestampNs;

/// Callback invoked once per refresh with the current timestamp.
pub type TickCallback = Box<dyn FnMut(TimestampNs)>;

/// Handle that stops a registered tick callback.
///
/// Clones share the same flag. Cancelling is idempotent.
#[derive(Debug, Clone)]
pub struct CancelToken {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    fn new(id: u64) -> Self {
        Self {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Registration id assigned by the scheduler.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop the callback from being invoked again.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether the callback has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A source of per-refresh ticks.
pub trait TickScheduler {
    /// Register a callback to run on every tick until its token is cancelled.
    fn register_tick(&mut self, callback: TickCallback) -> CancelToken;
}

struct Registration {
    token: CancelToken,
    callback: TickCallback,
}

/// Scheduler driven by explicit timestamps.
///
/// Used by headless simulation and by tests; a display loop calls
/// [`ManualScheduler::fire`] once per refresh.
#[derive(Default)]
pub struct ManualScheduler {
    next_id: u64,
    registrations: Vec<Registration>,
    last_fired_ns: Option<TimestampNs>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every live callback with `now`. Returns how many ran.
    ///
    /// A callback cancelled by an earlier callback in the same pass is
    /// skipped.
    pub fn fire(&mut self, now: TimestampNs) -> usize {
        self.registrations.retain(|r| !r.token.is_cancelled());
        self.last_fired_ns = Some(now);

        let mut invoked = 0;
        for registration in &mut self.registrations {
            if registration.token.is_cancelled() {
                continue;
            }
            (registration.callback)(now);
            invoked += 1;
        }
        invoked
    }

    /// Number of registrations that have not been cancelled.
    pub fn active_count(&self) -> usize {
        self.registrations
            .iter()
            .filter(|r| !r.token.is_cancelled())
            .count()
    }

    /// Timestamp of the most recent [`fire`](Self::fire).
    pub fn last_fired_ns(&self) -> Option<TimestampNs> {
        self.last_fired_ns
    }
}

impl TickScheduler for ManualScheduler {
    fn register_tick(&mut self, callback: TickCallback) -> CancelToken {
        let token = CancelToken::new(self.next_id);
        self.next_id += 1;
        tracing::trace!(id = token.id(), "Tick callback registered");
        self.registrations.push(Registration {
            token: token.clone(),
            callback,
        });
        token
    }
}
