// EN: src/system/executor.rs

use crate::CancellationToken;
use crate::core::task::Task;
use colored::*;
use std::io::ErrorKind;
use std::process::{Command as StdCommand, Stdio};
use std::sync::atomic::Ordering;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Command '{command}' exited with a non-zero error code ({code}).")]
    NonZeroExitStatus { command: String, code: i32 },
    #[error("{0} task(s) failed.")]
    TasksFailed(usize),
    #[error("Operation was cancelled by the user.")]
    Cancelled,
}

/// Receives the tasks produced by the dispatcher, in order.
pub trait Executor {
    fn execute(&mut self, task: &Task) -> Result<(), ExecutionError>;

    /// Called once every command was resolved. Reports failures that were deferred.
    fn finish(&mut self) -> Result<(), ExecutionError> {
        Ok(())
    }
}

/// Collects tasks instead of running them.
impl Executor for Vec<Task> {
    fn execute(&mut self, task: &Task) -> Result<(), ExecutionError> {
        self.push(task.clone());
        Ok(())
    }
}

/// Runs every task as soon as it is produced.
#[derive(Debug)]
pub struct ImmediateExecutor {
    keep_going: bool,
    failures: usize,
    cancellation_token: CancellationToken,
}

impl ImmediateExecutor {
    pub fn new(keep_going: bool, cancellation_token: CancellationToken) -> Self {
        Self {
            keep_going,
            failures: 0,
            cancellation_token,
        }
    }
}

impl Executor for ImmediateExecutor {
    fn execute(&mut self, task: &Task) -> Result<(), ExecutionError> {
        println!("{} {}", "→".blue(), task.to_string().green());
        match execute_task(task, &self.cancellation_token) {
            Err(ExecutionError::NonZeroExitStatus { command, code }) if self.keep_going => {
                log::warn!("'{}' failed with exit code {}; continuing", command, code);
                self.failures += 1;
                Ok(())
            }
            other => other,
        }
    }

    fn finish(&mut self) -> Result<(), ExecutionError> {
        match self.failures {
            0 => Ok(()),
            n => Err(ExecutionError::TasksFailed(n)),
        }
    }
}

/// Prints every task instead of running it (`--dry-run`).
#[derive(Debug, Default)]
pub struct ReportingExecutor {
    reported: usize,
}

impl ReportingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reported(&self) -> usize {
        self.reported
    }
}

impl Executor for ReportingExecutor {
    fn execute(&mut self, task: &Task) -> Result<(), ExecutionError> {
        println!("{} {}", "→".blue(), render_shell_line(task).green());
        if let Some(dir) = task.working_dir() {
            println!("    {} {}", "in".dimmed(), dir.display());
        }
        self.reported += 1;
        Ok(())
    }
}

/// Renders a task the way it could be pasted into a shell.
pub fn render_shell_line(task: &Task) -> String {
    shlex::try_join(task.args().iter().map(String::as_str)).unwrap_or_else(|_| task.to_string())
}

/// Spawns the process described by `task` and waits for it, honouring cancellation.
pub fn execute_task(task: &Task, cancellation_token: &CancellationToken) -> Result<(), ExecutionError> {
    let Some((program, args)) = task.args().split_first() else {
        return Err(ExecutionError::EmptyCommand);
    };
    if cancellation_token.load(Ordering::Relaxed) {
        return Err(ExecutionError::Cancelled);
    }
    let command_line = task.to_string();

    let mut command = StdCommand::new(program);
    command
        .args(args)
        .envs(task.env())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    if let Some(dir) = task.working_dir() {
        command.current_dir(dunce::simplified(dir));
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            if e.kind() == ErrorKind::NotFound {
                log::debug!("Program '{}' was not found in PATH", program);
            }
            return Err(ExecutionError::CommandFailed(command_line, e));
        }
    };

    // Non-blocking wait loop to allow for cancellation.
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                // Ctrl+C reaches the child too, which may exit before the loop sees the token.
                if !status.success() && cancellation_token.load(Ordering::Relaxed) {
                    return Err(ExecutionError::Cancelled);
                }
                if !status.success() {
                    return Err(ExecutionError::NonZeroExitStatus {
                        command: command_line,
                        code: status.code().unwrap_or(-1),
                    });
                }
                return Ok(());
            }
            Ok(None) => {
                if cancellation_token.load(Ordering::Relaxed) {
                    log::debug!(
                        "Cancellation requested, killing child process (PID: {})...",
                        child.id()
                    );
                    if let Err(e) = child.kill() {
                        log::warn!("Failed to kill child process {}: {}", child.id(), e);
                    }
                    child.wait().ok();
                    return Err(ExecutionError::Cancelled);
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => return Err(ExecutionError::CommandFailed(command_line, e)),
        }
    }
}
