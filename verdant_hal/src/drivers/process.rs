//! `CommandRunner` backed by real child processes.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::{debug, warn};
use verdant_common::hal::driver::{CommandOutput, CommandRunner, HalError};

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const KILL_GRACE: Duration = Duration::from_millis(200);

/// Runs driver binaries with an enforced deadline.
///
/// On expiry the child receives SIGTERM, then SIGKILL once the grace period
/// has passed.
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    poll_interval: Duration,
    kill_grace: Duration,
}

impl SystemCommandRunner {
    /// Runner with default polling and grace periods.
    pub fn new() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            kill_grace: KILL_GRACE,
        }
    }

    fn terminate(&self, child: &mut Child, program: &str) {
        match i32::try_from(child.id()) {
            Ok(pid) => {
                if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
                    debug!("SIGTERM to {} failed: {}", program, e);
                }
            }
            Err(_) => debug!("pid of {} does not fit pid_t", program),
        }

        let grace_end = Instant::now() + self.kill_grace;
        while Instant::now() < grace_end {
            if let Ok(Some(_)) = child.try_wait() {
                return;
            }
            thread::sleep(self.poll_interval);
        }

        warn!("{} ignored SIGTERM, killing", program);
        let _ = child.kill();
        let _ = child.wait();
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, HalError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| HalError::CommandFailed {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        let deadline = Instant::now() + timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                self.terminate(&mut child, program);
                return Err(HalError::Timeout {
                    operation: program.to_string(),
                    after: timeout,
                });
            }
            thread::sleep(self.poll_interval);
        };

        // Measurement drivers print a single line, well below the pipe buffer.
        let mut stdout = String::new();
        if let Some(mut pipe) = child.stdout.take() {
            pipe.read_to_string(&mut stdout)?;
        }

        Ok(CommandOutput {
            status: status.code(),
            stdout,
        })
    }
}
