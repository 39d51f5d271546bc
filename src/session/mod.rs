//! Caller-side ownership of the current run
//!
//! A [`RunSession`] holds at most one [`RunOutcome`]. Starting a run hands out a
//! [`RunTicket`] stamped with a generation; a newer `begin()` supersedes it, and
//! outcomes delivered with a stale ticket are released and dropped instead of
//! replacing the current one.

use crate::runner::RunOutcome;

/// Proof of which generation a run was started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTicket {
    generation: u64,
}

impl RunTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
pub struct RunSession {
    generation: u64,
    current: Option<RunOutcome>,
}

impl RunSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run, releasing whatever the previous one owned.
    pub fn begin(&mut self) -> RunTicket {
        self.generation += 1;
        self.release_current();
        tracing::debug!(generation = self.generation, "run started");
        RunTicket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: RunTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Store `outcome` if `ticket` is still current. A stale outcome is
    /// released and `None` returned.
    pub fn complete(&mut self, ticket: RunTicket, outcome: RunOutcome) -> Option<&RunOutcome> {
        if !self.is_current(ticket) {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "discarding stale run"
            );
            outcome.cleanup.release();
            return None;
        }
        self.release_current();
        self.current = Some(outcome);
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&RunOutcome> {
        self.current.as_ref()
    }

    /// Release the current run, if any.
    pub fn teardown(&mut self) {
        self.release_current();
    }

    fn release_current(&mut self) {
        if let Some(outcome) = self.current.take() {
            outcome.cleanup.release();
        }
    }
}

impl Drop for RunSession {
    fn drop(&mut self) {
        self.release_current();
    }
}
