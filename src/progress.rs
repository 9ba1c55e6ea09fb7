use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::Result;

use crate::error::SplitsError;

/// Host-side progress and cancellation collaborator.
///
/// Every call is advisory: the algorithms give the same answer when all of
/// them are no-ops. Only `check_for_cancel` can change control flow, by
/// returning `SplitsError::Cancelled`.
pub trait Progress {
    fn begin_task(&self, _name: &str) {}
    fn set_maximum_progress(&self, _max: u64) {}
    fn set_progress(&self, _value: u64) {}
    fn subtask(&self, _label: &str) {}
    fn check_for_cancel(&self) -> Result<()> {
        Ok(())
    }
}

/// Poll an optional progress handle.
#[inline]
pub(crate) fn check(progress: Option<&dyn Progress>) -> Result<()> {
    match progress {
        Some(p) => p.check_for_cancel(),
        None => Ok(()),
    }
}

/// Shareable cancellation switch. Cancel from any thread; the running
/// computation unwinds at its next poll.
#[derive(Debug, Default)]
pub struct CancellationFlag {
    cancelled: AtomicBool,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Progress for CancellationFlag {
    fn check_for_cancel(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(SplitsError::Cancelled.into());
        }
        Ok(())
    }
}

/// Reports task boundaries through `log` and cancels after `budget` polls
/// (`u64::MAX` = never). Used by the CLI runner.
#[derive(Debug)]
pub struct LogProgress {
    max: AtomicU64,
    polls: AtomicU64,
    budget: u64,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::with_poll_budget(u64::MAX)
    }

    pub fn with_poll_budget(budget: u64) -> Self {
        Self {
            max: AtomicU64::new(0),
            polls: AtomicU64::new(0),
            budget,
        }
    }

    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for LogProgress {
    fn begin_task(&self, name: &str) {
        debug!("Task: {}", name);
    }

    fn set_maximum_progress(&self, max: u64) {
        self.max.store(max, Ordering::Relaxed);
    }

    fn set_progress(&self, value: u64) {
        let max = self.max.load(Ordering::Relaxed);
        if max > 0 {
            trace!("Progress {}/{}", value, max);
        }
    }

    fn subtask(&self, label: &str) {
        debug!("  {}", label);
    }

    fn check_for_cancel(&self) -> Result<()> {
        let n = self.polls.fetch_add(1, Ordering::Relaxed) + 1;
        if n > self.budget {
            return Err(SplitsError::Cancelled.into());
        }
        Ok(())
    }
}
