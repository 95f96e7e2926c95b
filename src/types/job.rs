use std::fmt;
use std::path::{Path, PathBuf};

/// Identifies a job within one queue. Ids are handed out in discovery order
/// starting from [`JobId::FIRST`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct JobId(pub u64);

impl JobId {
    pub const FIRST: JobId = JobId(100);

    pub fn next(self) -> JobId {
        JobId(self.0 + 1)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Static description of one simulation job. Never changes once built.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JobRecord {
    id: JobId,
    path: PathBuf,
    name: String,
    command: Vec<String>,
}

impl JobRecord {
    pub fn new(
        id: JobId,
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        command: Vec<String>,
    ) -> Self {
        Self {
            id,
            path: path.into(),
            name: name.into(),
            command,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// The job's directory, which is also the process's working directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Program followed by its arguments.
    pub fn command(&self) -> &[String] {
        &self.command
    }
}
