//! Work budget and cooperative cancellation for long scans.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cloneable cancellation flag shared between a caller and a running scan.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Iteration, time and cancellation limits for one scan.
#[derive(Debug)]
pub struct Budget {
    max_iterations: u64,
    deadline: Option<Instant>,
    token: Option<CancellationToken>,
    iterations: u64,
    exhausted: bool,
}

impl Budget {
    /// Deadline checks happen once every this many iterations.
    const CLOCK_INTERVAL: u64 = 256;

    /// Start a budget now.
    pub fn start(
        max_iterations: u64,
        max_duration: Option<Duration>,
        token: Option<CancellationToken>,
    ) -> Self {
        Self {
            max_iterations,
            deadline: max_duration.map(|d| Instant::now() + d),
            token,
            iterations: 0,
            exhausted: false,
        }
    }

    /// Consume one unit of work. Returns `false` once the budget is spent.
    pub fn tick(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        if self.iterations >= self.max_iterations
            || self.token.as_ref().is_some_and(|t| t.is_cancelled())
        {
            self.exhausted = true;
            return false;
        }
        if self.iterations % Self::CLOCK_INTERVAL == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    self.exhausted = true;
                    return false;
                }
            }
        }
        self.iterations += 1;
        true
    }

    /// Units consumed so far.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Whether any limit was hit.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
