//! Cancellable deferred commit.
//!
//! Continuous edits (a slider drag, typing in a style field) reschedule a
//! single deadline; the host polls it with the current time. Each schedule
//! is tagged with the document generation so a deadline set before a reload
//! can never fire against the new document.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(Instant, u64)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)start the quiet period from `now`.
    pub fn schedule(&mut self, now: Instant, generation: u64) {
        self.pending = Some((now + self.delay, generation));
    }

    /// Drop the pending deadline, if any.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(deadline, _)| deadline)
    }

    /// True exactly once when the deadline has passed and was scheduled for
    /// `generation`. A due deadline from another generation is dropped.
    pub fn fire_if_due(&mut self, now: Instant, generation: u64) -> bool {
        match self.pending {
            Some((deadline, _)) if now < deadline => false,
            Some((_, scheduled)) => {
                self.pending = None;
                if scheduled != generation {
                    log::debug!("stale commit dropped (generation {scheduled} != {generation})");
                }
                scheduled == generation
            }
            None => false,
        }
    }
}
