use std::path::PathBuf;
use std::time::Duration;

use crate::supervisor::LOG_FILE_NAME;
use crate::types::computer::Launcher;

/// Filename fragments marking a directory as holding a simulation.
const DEFAULT_SUFFIXES: [&str; 2] = [".lmp", ".in"];

/// The set of accepted filename fragments. Always holds the defaults; can
/// grow but never shrink.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SuffixSet(Vec<String>);

impl Default for SuffixSet {
    fn default() -> Self {
        Self(DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect())
    }
}

impl SuffixSet {
    /// Adds suffixes not already present, keeping insertion order. Empty
    /// strings are ignored since they'd match every file.
    pub fn extend<I, S>(&mut self, suffixes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for suffix in suffixes {
            let suffix = suffix.into();
            if !suffix.is_empty() && !self.0.contains(&suffix) {
                self.0.push(suffix);
            }
        }
    }

    /// Whether `filename` contains any suffix anywhere in it. This is a
    /// substring test, not an extension match: `.in` accepts `in.melt.inp`
    /// and `data.init` alike.
    pub fn matches(&self, filename: &str) -> bool {
        self.0.iter().any(|suffix| filename.contains(suffix.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything a [`JobQueue`](crate::queue::JobQueue) needs to know up front.
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Directory holding one subdirectory per simulation.
    pub root_dir: PathBuf,
    /// Subdirectories to use, in order, instead of scanning `root_dir`.
    pub simulation_dirs: Option<Vec<String>>,
    pub suffixes: SuffixSet,
    /// Time between progress samples (and dashboard redraws).
    pub sampling_interval: Duration,
    /// Per-job output file, relative to the job's directory.
    pub log_file_name: String,
    pub launcher: Launcher,
    /// Kill jobs that run longer than this.
    pub timeout: Option<Duration>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./"),
            simulation_dirs: None,
            suffixes: SuffixSet::default(),
            sampling_interval: Duration::from_secs(1),
            log_file_name: LOG_FILE_NAME.to_string(),
            launcher: Launcher::default(),
            timeout: None,
        }
    }
}
