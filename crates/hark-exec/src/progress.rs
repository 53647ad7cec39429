//! Shared build progress with bounded lock contention.
//!
//! Each task owns a [`ProgressReporter`] that buffers completed units
//! locally and only takes the shared lock once roughly 2% of the total has
//! accumulated, so the counter is touched about fifty times per task at
//! most.

use std::sync::{Arc, Mutex};

/// Fraction of the total work each reporter buffers before flushing.
const FLUSH_DIVISOR: u64 = 50;

/// Shared completed-work counter for one build phase.
#[derive(Debug)]
pub struct ProgressCounter {
    label: &'static str,
    total: u64,
    flush_every: u64,
    state: Mutex<ProgressState>,
}

#[derive(Debug, Default)]
struct ProgressState {
    done: u64,
    last_percent: u32,
}

impl ProgressCounter {
    /// Create a counter for `total` units of work.
    pub fn new(label: &'static str, total: u64) -> Arc<Self> {
        Arc::new(Self {
            label,
            total,
            flush_every: (total / FLUSH_DIVISOR).max(1),
            state: Mutex::new(ProgressState::default()),
        })
    }

    /// Total units of work.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Units reported so far.
    pub fn done(&self) -> u64 {
        self.state.lock().map(|s| s.done).unwrap_or(0)
    }

    /// Completed percentage, 0..=100.
    pub fn percent(&self) -> u32 {
        percent_of(self.done(), self.total)
    }

    /// A buffering reporter for one task.
    pub fn reporter(self: &Arc<Self>) -> ProgressReporter {
        ProgressReporter {
            counter: Arc::clone(self),
            pending: 0,
        }
    }

    fn add(&self, units: u64) {
        // A poisoned lock only loses progress output.
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        state.done = state.done.saturating_add(units).min(self.total);
        let percent = percent_of(state.done, self.total);
        if percent > state.last_percent {
            state.last_percent = percent;
            tracing::debug!(phase = self.label, percent, "build progress");
        }
    }
}

fn percent_of(done: u64, total: u64) -> u32 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u32
}

/// Per-task progress buffer. Flushes on drop.
#[derive(Debug)]
pub struct ProgressReporter {
    counter: Arc<ProgressCounter>,
    pending: u64,
}

impl ProgressReporter {
    /// Record `units` of completed work.
    #[inline]
    pub fn advance(&mut self, units: u64) {
        self.pending += units;
        if self.pending >= self.counter.flush_every {
            self.flush();
        }
    }

    /// Push buffered units to the shared counter.
    pub fn flush(&mut self) {
        if self.pending > 0 {
            self.counter.add(self.pending);
            self.pending = 0;
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.flush();
    }
}
