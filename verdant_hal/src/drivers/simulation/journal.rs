//! Shared record of everything the simulated rig was asked to do.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// One observable driver interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    /// Line claimed as output at `initial`.
    Bind {
        /// Global GPIO number.
        gpio: u32,
        /// Level applied while binding.
        initial: bool,
    },
    /// Line level change.
    Write {
        /// Global GPIO number.
        gpio: u32,
        /// New level.
        high: bool,
    },
    /// Line returned to the driver.
    Release {
        /// Global GPIO number.
        gpio: u32,
    },
    /// External driver invocation.
    Command {
        /// Program path.
        program: String,
        /// Arguments.
        args: Vec<String>,
    },
    /// Command line sent to the probe, without terminator.
    SerialTx(String),
    /// Probe transport dropped.
    SerialClosed,
    /// Pacer wait.
    Wait {
        /// Requested duration.
        duration: Duration,
        /// Whether cancellation could cut it short.
        interruptible: bool,
    },
}

/// Clonable handle to one journal.
///
/// Unbounded by default. A bounded journal keeps only the newest entries,
/// so queries on it only see that window.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<VecDeque<JournalEntry>>>,
    capacity: Option<usize>,
}

impl Journal {
    /// Empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty journal that keeps at most `capacity` entries.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: Some(capacity),
        }
    }

    /// Append an entry, evicting the oldest when full.
    pub fn record(&self, entry: JournalEntry) {
        let mut entries = self.entries.lock();
        if let Some(cap) = self.capacity {
            if cap == 0 {
                return;
            }
            while entries.len() >= cap {
                entries.pop_front();
            }
        }
        entries.push_back(entry);
    }

    /// Snapshot of all retained entries.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of entries matching `pred`.
    pub fn count(&self, pred: impl Fn(&JournalEntry) -> bool) -> usize {
        self.entries.lock().iter().filter(|e| pred(e)).count()
    }

    /// Last level driven on `gpio`, `None` if it was never bound.
    pub fn level(&self, gpio: u32) -> Option<bool> {
        self.entries.lock().iter().rev().find_map(|e| match *e {
            JournalEntry::Bind { gpio: g, initial } if g == gpio => Some(initial),
            JournalEntry::Write { gpio: g, high } if g == gpio => Some(high),
            _ => None,
        })
    }

    /// Number of releases of `gpio`.
    pub fn releases(&self, gpio: u32) -> usize {
        self.count(|e| matches!(e, JournalEntry::Release { gpio: g } if *g == gpio))
    }

    /// Every command line sent to the probe.
    pub fn serial_tx(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter_map(|e| match e {
                JournalEntry::SerialTx(cmd) => Some(cmd.clone()),
                _ => None,
            })
            .collect()
    }
}
