//! Running external processes.
//!
//! Every operation in this crate ends in exactly one call to
//! [`Executor::execute`]. Production code uses [`HostExecutor`], tests can
//! substitute [`crate::fakes::FakeExecutor`].
use crate::{
    command::ZfsCommand,
    error::{Result, ZfsError},
};
use std::{
    path::Path,
    process::{self, Stdio},
    sync::Arc,
};

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    /// Exit code, [`None`] if the process was killed by a signal.
    pub status: Option<i32>,

    pub stdout: String,

    pub stderr: String,
}

impl Output {
    /// Successful, empty output.
    pub fn success() -> Self {
        Self {
            status: Some(0),
            ..Default::default()
        }
    }

    /// Successful output with `stdout`.
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::success()
        }
    }

    /// Failed output with exit `code` and `stderr`.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    /// Whether the process exited with code 0
    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }
}

impl From<process::Output> for Output {
    fn from(output: process::Output) -> Self {
        Self {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Shared, thread safe executor handle.
pub type BoxedExecutor = Arc<dyn Executor>;

/// Runs a [`ZfsCommand`] with the given `program`.
///
/// Implementations must return the output of a process that ran, whatever
/// its exit code. Only failing to start it at all is an error.
pub trait Executor: Send + Sync {
    /// Execute `command` using the binary at `program`, blocking until it
    /// exits.
    ///
    /// # Errors
    ///
    /// - [`ZfsError::Unavailable`] if the program couldn't be started.
    fn execute(&self, program: &Path, command: &ZfsCommand) -> Result<Output>;
}

/// Executes commands as real child processes on this host.
///
/// Child processes inherit the environment, with any overrides from the
/// command applied on top. There is no timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostExecutor;

impl HostExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Perform some type coercion to get the commonly used trait object.
    pub fn as_executor(self) -> BoxedExecutor {
        Arc::new(self)
    }
}

impl Executor for HostExecutor {
    fn execute(&self, program: &Path, command: &ZfsCommand) -> Result<Output> {
        let args = command.args();
        log::debug!("running {} {}", program.display(), args.join(" "));

        let output = process::Command::new(program)
            .args(&args)
            .envs(command.env_vars())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| ZfsError::unavailable(program.display(), e))?;
        let output = Output::from(output);

        log::debug!(
            "{} {} exited with {:?}",
            program.display(),
            command.subcommand(),
            output.status
        );
        if !output.stdout.is_empty() {
            log::trace!("stdout: {}", output.stdout);
        }
        if !output.stderr.is_empty() {
            log::trace!("stderr: {}", output.stderr);
        }
        Ok(output)
    }
}
