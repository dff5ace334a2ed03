use std::time::{Duration, Instant};

/// Shared cancellation point for the harvest and analysis stages.
///
/// Expiry is never an error: stages stop early and hand on what they have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub fn never() -> Self {
        Self { at: None }
    }

    pub fn after(limit: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(limit),
        }
    }

    pub fn from_limit(limit: Option<Duration>) -> Self {
        match limit {
            Some(l) if !l.is_zero() => Self::after(l),
            _ => Self::never(),
        }
    }

    pub fn expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Time left, or `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::never()
    }
}
