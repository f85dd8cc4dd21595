//! Command execution with transient-failure retry
//!
//! The hypervisor CLI occasionally prints "close failed" as its first output
//! line while a previous operation is still settling. That condition is
//! recoverable: the whole command is re-run until it produces a real result.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::{trace, warn};

use crate::{Error, Result};

/// Launches one fully-formed command string and captures its output.
///
/// Implementations reap the child themselves; a failure while reaping is not
/// a command failure. Only a failure to launch is an error.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &str) -> Result<String>;
}

/// Runs command strings through `sh -c`, stdout captured, stderr discarded.
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Result<String> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| Error::Spawn {
                command: command.to_string(),
                source,
            })?;

        let mut output = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout.read_to_string(&mut output)?;
        }

        if let Err(e) = child.wait() {
            warn!("IOError trying to close command pipe: {e}");
        }

        Ok(output)
    }
}

/// Retry policy for the transient close failure.
///
/// `max_attempts: None` retries forever at a fixed interval. That is the
/// reference behavior: a long test run should not fail on a known-flaky
/// condition, even if it means a call that never returns.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: Option<u32>,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            delay: Duration::from_secs(1),
        }
    }
}

/// Executes hypervisor commands, retrying whole invocations while the output
/// reports the transient failure condition.
pub struct CommandExecutor {
    runner: Box<dyn CommandRunner>,
    policy: RetryPolicy,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self::with_runner(Box::new(ShellRunner), RetryPolicy::default())
    }

    pub fn with_runner(runner: Box<dyn CommandRunner>, policy: RetryPolicy) -> Self {
        Self { runner, policy }
    }

    /// Run `command` and return its full captured output.
    ///
    /// Empty output is success. Output whose first line starts with
    /// "close failed" (case-insensitive) triggers a retry of the entire
    /// command after `policy.delay`.
    pub fn run(&self, command: &str) -> Result<String> {
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            trace!(command, attempts, "executing");

            let output = self.runner.run(command)?;

            if output.is_empty() || !is_transient_failure(&output) {
                return Ok(output);
            }

            warn!(
                command,
                output = %output.trim_end(),
                "failed executing command, will try again"
            );

            if let Some(max) = self.policy.max_attempts {
                if attempts >= max {
                    return Err(Error::RetriesExhausted {
                        command: command.to_string(),
                        attempts,
                    });
                }
            }

            std::thread::sleep(self.policy.delay);
        }
    }
}

fn is_transient_failure(output: &str) -> bool {
    output
        .lines()
        .next()
        .is_some_and(|line| line.to_ascii_lowercase().starts_with("close failed"))
}
