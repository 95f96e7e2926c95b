use std::path::PathBuf;
use std::{fmt, io};

/// Errors that stop a queue from being built. Nothing that happens while
/// jobs run is reported this way: per-job failures end up in that job's
/// [`JobState`](crate::types::states::JobState) instead.
#[derive(Debug)]
pub enum QueueError {
    /// The computer kind was neither `CPU` nor `GPU`.
    InvalidComputerKind(String),
    /// The root directory couldn't be listed.
    RootDir { path: PathBuf, source: io::Error },
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidComputerKind(kind) => {
                write!(f, "computer={kind}, not 'CPU' or 'GPU'")
            },
            Self::RootDir { path, source } => {
                write!(f, "cannot list {}: {source}", path.display())
            },
        }
    }
}

impl std::error::Error for QueueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidComputerKind(_) => None,
            Self::RootDir { source, .. } => Some(source),
        }
    }
}

// io::Error has no PartialEq, so compare on kind for the sake of tests.
impl PartialEq for QueueError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidComputerKind(a), Self::InvalidComputerKind(b)) => {
                a == b
            },
            (
                Self::RootDir { path: a, source: x },
                Self::RootDir { path: b, source: y },
            ) => a == b && x.kind() == y.kind(),
            _ => false,
        }
    }
}

/// Failure to start a job's process.
#[derive(Debug)]
pub enum LaunchError {
    /// The job has an empty command.
    EmptyCommand,
    /// The per-job log file couldn't be created.
    LogFile { path: PathBuf, source: io::Error },
    /// The process couldn't be spawned: bad executable, bad directory, etc.
    Spawn(io::Error),
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::EmptyCommand => f.write_str("empty command"),
            Self::LogFile { path, source } => {
                write!(f, "cannot create {}: {source}", path.display())
            },
            Self::Spawn(source) => write!(f, "cannot spawn process: {source}"),
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::EmptyCommand => None,
            Self::LogFile { source, .. } | Self::Spawn(source) => Some(source),
        }
    }
}
