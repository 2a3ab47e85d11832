//! Error handling stuff
use displaydoc::Display;
use std::{fmt, io};
use thiserror::Error;

pub type Result<T, E = ZfsError> = std::result::Result<T, E>;

/// Error type for everything in [`crate`]
#[derive(Debug, Display, Error)]
pub enum ZfsError {
    /// Invalid argument: {0}
    InvalidArgument(String),

    /// {0}
    CommandFailed(Box<CommandFailure>),

    /// {what} is unavailable: {source}
    Unavailable { what: String, source: io::Error },

    /// Platform `{0}` is not supported
    UnsupportedPlatform(String),
}

impl ZfsError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn unavailable(what: impl fmt::Display, source: io::Error) -> Self {
        Self::Unavailable {
            what: what.to_string(),
            source,
        }
    }

    /// The failed command, if this error came from a non-zero exit.
    pub fn command_failure(&self) -> Option<&CommandFailure> {
        match self {
            Self::CommandFailed(info) => Some(info),
            _ => None,
        }
    }
}

/// A `zfs` or `zpool` process that ran and exited unsuccessfully.
///
/// Output is kept exactly as the tool wrote it.
#[derive(Debug, Clone)]
pub struct CommandFailure {
    /// `zfs` or `zpool`
    pub command: String,

    /// Subcommand, such as `create` or `get`.
    pub subcommand: String,

    /// Datasets, pools, snapshots or properties the command was run on.
    pub targets: Vec<String>,

    /// Full argument vector, subcommand included.
    pub args: Vec<String>,

    /// Exit code, [`None`] if killed by a signal.
    pub status: Option<i32>,

    pub stdout: String,

    pub stderr: String,
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Command [{} {}] failed", self.command, self.args.join(" "))?;
        match self.status {
            Some(code) => write!(f, " with exit code {code}")?,
            None => write!(f, " without an exit code")?,
        }
        write!(f, "\nstdout: {}", self.stdout.trim_end())?;
        write!(f, "\nstderr: {}", self.stderr.trim_end())
    }
}

/// Error text.
pub(crate) mod text {
    pub const EMPTY: &str = "cannot be empty";

    pub const NEGATIVE_DEPTH: &str = "depth cannot be negative";

    pub const ALL_WITH_OTHERS: &str = "cannot use 'all' with other properties";

    pub const ALL_COLUMNS_WITH_OTHERS: &str = "cannot use 'all' with other columns";

    pub const NO_PROPERTY: &str = "cannot request no property type";

    pub const PROPERTY_EQUALS: &str = "property name cannot contain '='";
}
