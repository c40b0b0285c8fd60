//! Simulated measurement driver binaries.

use std::time::Duration;

use parking_lot::Mutex;
use verdant_common::hal::driver::{CommandOutput, CommandRunner, HalError};

use super::journal::{Journal, JournalEntry};
use super::signal::Signal;

struct Route {
    program: String,
    arg_prefix: Vec<String>,
    signal: Signal,
}

/// `CommandRunner` answering from scripted signals.
///
/// Each invocation is matched against routes by program and leading
/// arguments; the first match samples its signal. A signal fault is returned
/// as the runner error, so `HalError::Timeout` in a script behaves like a hung
/// driver.
pub struct SimulatedRunner {
    journal: Journal,
    routes: Mutex<Vec<Route>>,
}

impl SimulatedRunner {
    /// Runner with no routes.
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            routes: Mutex::new(Vec::new()),
        }
    }

    /// Answer `program` invocations whose arguments start with `arg_prefix`.
    ///
    /// Replaces an existing route with the same key.
    pub fn respond(&self, program: &str, arg_prefix: &[&str], signal: Signal) {
        let arg_prefix: Vec<String> = arg_prefix.iter().map(|a| a.to_string()).collect();
        let mut routes = self.routes.lock();
        routes.retain(|r| !(r.program == program && r.arg_prefix == arg_prefix));
        routes.push(Route {
            program: program.to_string(),
            arg_prefix,
            signal,
        });
    }
}

impl CommandRunner for SimulatedRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        _timeout: Duration,
    ) -> Result<CommandOutput, HalError> {
        self.journal.record(JournalEntry::Command {
            program: program.to_string(),
            args: args.to_vec(),
        });

        let mut routes = self.routes.lock();
        let route = routes
            .iter_mut()
            .find(|r| r.program == program && args.starts_with(&r.arg_prefix))
            .ok_or_else(|| HalError::CommandFailed {
                program: program.to_string(),
                reason: "No such file or directory (simulated)".to_string(),
            })?;

        let value = route.signal.sample()?;
        Ok(CommandOutput {
            status: Some(0),
            stdout: format!("{value:.3}\n"),
        })
    }
}

impl std::fmt::Debug for SimulatedRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedRunner")
            .field("routes", &self.routes.lock().len())
            .finish()
    }
}
