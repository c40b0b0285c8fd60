//! Waiting and cancellation.
//!
//! Every suspension of the loop goes through a [`Pacer`]. Interruptible
//! waits (period sleep, dosing pulse, valve moves) return
//! `ControlError::Interrupted` as soon as shutdown is requested; the safe
//! close dwell uses [`Pacer::hold`] and always runs to completion.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use verdant_hal::drivers::simulation::{Journal, JournalEntry};

use crate::error::ControlError;

/// Granularity at which a sleeping pacer checks for cancellation.
const SLICE: Duration = Duration::from_millis(10);

/// Source of time for the control loop.
pub trait Pacer {
    /// Wait for `duration` unless shutdown is requested first.
    fn pause(&mut self, duration: Duration) -> Result<(), ControlError>;

    /// Wait for `duration` regardless of shutdown requests.
    fn hold(&mut self, duration: Duration);

    /// Whether shutdown has been requested.
    fn cancelled(&self) -> bool;

    /// Monotonic time since the pacer was created.
    fn now(&self) -> Duration;
}

/// Real-time pacer driven by the shutdown flag set from the signal handler.
#[derive(Debug, Clone)]
pub struct ThreadPacer {
    running: Arc<AtomicBool>,
    origin: Instant,
}

impl ThreadPacer {
    /// Pacer observing `running`; clearing it requests shutdown.
    pub fn new(running: Arc<AtomicBool>) -> Self {
        Self {
            running,
            origin: Instant::now(),
        }
    }
}

impl Pacer for ThreadPacer {
    fn pause(&mut self, duration: Duration) -> Result<(), ControlError> {
        let deadline = Instant::now() + duration;
        loop {
            if self.cancelled() {
                return Err(ControlError::Interrupted);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep(SLICE.min(deadline - now));
        }
    }

    fn hold(&mut self, duration: Duration) {
        thread::sleep(duration);
    }

    #[inline]
    fn cancelled(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }

    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Pacer that records waits in the simulation journal without sleeping.
///
/// `cancel_after(n)` simulates a shutdown request arriving during the n-th
/// interruptible wait (1-based).
#[derive(Debug, Clone)]
pub struct SimulatedPacer {
    journal: Journal,
    pauses: usize,
    cancel_after: Option<usize>,
    elapsed: Duration,
}

impl SimulatedPacer {
    /// Pacer recording into `journal`.
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            pauses: 0,
            cancel_after: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Request shutdown during the `n`-th interruptible wait.
    pub fn cancel_after(mut self, n: usize) -> Self {
        self.cancel_after = Some(n);
        self
    }

    /// Total simulated time spent waiting.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl Pacer for SimulatedPacer {
    fn pause(&mut self, duration: Duration) -> Result<(), ControlError> {
        if self.cancelled() {
            return Err(ControlError::Interrupted);
        }
        self.pauses += 1;
        self.journal.record(JournalEntry::Wait {
            duration,
            interruptible: true,
        });
        if self.cancelled() {
            return Err(ControlError::Interrupted);
        }
        self.elapsed += duration;
        Ok(())
    }

    fn hold(&mut self, duration: Duration) {
        self.journal.record(JournalEntry::Wait {
            duration,
            interruptible: false,
        });
        self.elapsed += duration;
    }

    fn cancelled(&self) -> bool {
        self.cancel_after.is_some_and(|n| self.pauses >= n)
    }

    fn now(&self) -> Duration {
        self.elapsed
    }
}
