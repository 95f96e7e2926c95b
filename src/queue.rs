//! Discovers simulation jobs and runs them one after another.
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::select;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::QueueConfig;
use crate::dashboard::{Dashboard, JobRow};
use crate::error::QueueError;
use crate::progress::{LammpsLog, ProgressSource};
use crate::report::{JobReport, RunSummary};
use crate::supervisor::ProcessSupervisor;
use crate::types::computer::ComputerKind;
use crate::types::job::{JobId, JobRecord};
use crate::types::states::JobState;

/// Floor on the sampling interval; the ticker can't run at zero.
const MIN_SAMPLING_INTERVAL: Duration = Duration::from_millis(10);

/// An ordered set of simulation jobs, run strictly one at a time.
pub struct JobQueue {
    config: QueueConfig,
    /// Directory names, relative to the root, in discovery order.
    candidates: Vec<String>,
    jobs: BTreeMap<JobId, JobRecord>,
    progress: Arc<dyn ProgressSource>,
}

impl JobQueue {
    /// Creates a queue and discovers its candidate directories. No jobs
    /// exist until [`build`](JobQueue::build) is called.
    pub fn new(config: QueueConfig) -> Result<Self, QueueError> {
        let candidates =
            Self::discover(&config.root_dir, config.simulation_dirs.as_deref())?;
        debug!(?candidates, "discovered candidate directories");

        Ok(Self {
            config,
            candidates,
            jobs: BTreeMap::new(),
            progress: Arc::new(LammpsLog),
        })
    }

    /// Replaces the source of remaining-time estimates.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSource>) -> Self {
        self.progress = progress;
        self
    }

    /// Lists candidate job directories. Explicit names are taken verbatim and
    /// in order. Otherwise every immediate subdirectory of `root_dir` is
    /// returned, in whatever order the filesystem lists them: this is not
    /// sorted and varies between platforms.
    pub fn discover(
        root_dir: &Path,
        explicit: Option<&[String]>,
    ) -> Result<Vec<String>, QueueError> {
        if let Some(names) = explicit {
            return Ok(names.to_vec());
        }

        let root_err = |source| QueueError::RootDir {
            path: root_dir.to_path_buf(),
            source,
        };

        let mut dirs = Vec::new();
        for entry in fs::read_dir(root_dir).map_err(root_err)? {
            let entry = entry.map_err(root_err)?;
            // Follows symlinks, so linked simulation directories count.
            if entry.path().is_dir() {
                dirs.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        Ok(dirs)
    }

    /// Whether some file in `dir` has an accepted suffix somewhere in its
    /// name. Unreadable directories fail the check.
    pub fn sanity_check(&self, dir: &Path) -> bool {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(%error, dir = %dir.display(), "cannot list directory, skipping");
                return false;
            },
        };

        entries.filter_map(Result::ok).any(|entry| {
            self.config
                .suffixes
                .matches(&entry.file_name().to_string_lossy())
        })
    }

    /// (Re)builds the job list: one job per candidate directory passing the
    /// sanity check, numbered from [`JobId::FIRST`] in discovery order.
    /// Returns the number of jobs.
    pub fn build(
        &mut self,
        computer: &str,
        input_filename: &str,
    ) -> Result<usize, QueueError> {
        let kind: ComputerKind = computer.parse()?;

        let mut jobs = BTreeMap::new();
        let mut id = JobId::FIRST;
        for name in &self.candidates {
            let path = self.config.root_dir.join(name);

            if !self.sanity_check(&path) {
                debug!(dir = %path.display(), "no input files, skipping");
                continue;
            }

            let command = self.config.launcher.command(kind, &path, input_filename);
            jobs.insert(id, JobRecord::new(id, path, name.clone(), command));
            id = id.next();
        }

        info!(jobs = jobs.len(), computer = %kind, "built queue");
        self.jobs = jobs;
        Ok(self.jobs.len())
    }

    pub fn jobs(&self) -> &BTreeMap<JobId, JobRecord> {
        &self.jobs
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Runs every job in id order, never more than one at a time, redrawing
    /// `dashboard` as they progress. A job that fails to launch, fails, or
    /// times out doesn't stop the ones after it; cancelling `cancel` kills
    /// the running job and skips the rest.
    pub async fn run<W: Write>(
        &self,
        dashboard: &mut Dashboard<W>,
        cancel: &CancellationToken,
    ) -> RunSummary {
        let mut rows: Vec<JobRow> = self
            .jobs
            .values()
            .map(|job| JobRow::new(job.id(), job.name()))
            .collect();
        let mut states = vec![JobState::Pending; rows.len()];

        if let Err(error) = dashboard.clear(None) {
            debug!(%error, "failed to clear terminal");
        }

        let t0 = Instant::now();
        for (idx, job) in self.jobs.values().enumerate() {
            if cancel.is_cancelled() {
                states[idx] = JobState::Skipped;
                continue;
            }
            states[idx] = self
                .run_job(job.clone(), idx, &mut rows, dashboard, cancel)
                .await;
        }
        let wall_time = t0.elapsed();

        let reports = self
            .jobs
            .values()
            .zip(states)
            .zip(&rows)
            .map(|((job, state), row)| JobReport::new(job, state, row))
            .collect();

        RunSummary::new(reports, wall_time, cancel.is_cancelled())
    }

    /// Launches one job and samples it until it exits.
    #[instrument(skip_all, fields(job = %job.id(), name = job.name()))]
    async fn run_job<W: Write>(
        &self,
        job: JobRecord,
        idx: usize,
        rows: &mut [JobRow],
        dashboard: &mut Dashboard<W>,
        cancel: &CancellationToken,
    ) -> JobState {
        let mut sup = match ProcessSupervisor::launch(
            job,
            &self.config.log_file_name,
            Arc::clone(&self.progress),
        ) {
            Ok(sup) => sup,
            Err(error) => {
                error!(%error, "failed to launch job, moving on");
                return JobState::LaunchFailed;
            },
        };

        let mut ticker = time::interval(
            self.config.sampling_interval.max(MIN_SAMPLING_INTERVAL),
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut killed_as = None;
        loop {
            select! {
                _ = ticker.tick() => {},
                _ = cancel.cancelled() => {
                    warn!("interrupted, stopping job");
                    killed_as = Some(JobState::Cancelled);
                    break;
                },
            }

            if !sup.is_alive() {
                break;
            }

            let timings = sup.sample(Instant::now()).await;
            rows[idx].elapsed = timings.elapsed;
            rows[idx].remaining = timings.remaining;
            if let Err(error) = dashboard.render(rows, rows.len()) {
                debug!(%error, "failed to draw dashboard");
            }

            if let Some(limit) = self.config.timeout {
                if timings.elapsed >= limit {
                    warn!(?limit, "timed out, stopping job");
                    killed_as = Some(JobState::TimedOut);
                    break;
                }
            }
        }

        // Nothing of a stopped job may outlive it into the next one.
        if killed_as.is_some() {
            sup.terminate().await;
        }

        match (sup.await_completion().await, killed_as) {
            (_, Some(state)) => state,
            (Ok(status), None) if status.success() => {
                info!("job complete");
                JobState::Complete
            },
            (Ok(status), None) => {
                warn!(%status, "job failed");
                JobState::Failed {
                    exit_code: status.code(),
                }
            },
            (Err(error), None) => {
                error!(%error, "lost track of job process");
                JobState::Failed { exit_code: None }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn discover_lists_only_directories() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("a")).unwrap();
        fs::create_dir(root.path().join("b")).unwrap();
        touch(&root.path().join("notes.lmp"));

        let mut found = JobQueue::discover(root.path(), None).unwrap();
        found.sort();
        assert_eq!(found, ["a", "b"]);

        let explicit = vec!["z".to_string(), "a".to_string()];
        assert_eq!(
            JobQueue::discover(root.path(), Some(&explicit)).unwrap(),
            explicit
        );

        assert!(matches!(
            JobQueue::discover(&root.path().join("missing"), None),
            Err(QueueError::RootDir { .. })
        ));
    }

    #[test]
    fn sanity_check_uses_substrings() {
        let root = tempfile::tempdir().unwrap();
        let mut config = QueueConfig {
            root_dir: root.path().to_path_buf(),
            ..QueueConfig::default()
        };
        config.suffixes.extend([".data"]);
        let queue = JobQueue::new(config).unwrap();

        let dir = root.path().join("d");
        fs::create_dir(&dir).unwrap();
        assert!(!queue.sanity_check(&dir));

        touch(&dir.join("README"));
        assert!(!queue.sanity_check(&dir));

        touch(&dir.join("atoms.data.gz"));
        assert!(queue.sanity_check(&dir));

        let other = root.path().join("e");
        fs::create_dir(&other).unwrap();
        touch(&other.join("in.melt"));
        assert!(!queue.sanity_check(&other));
        touch(&other.join("input.lmp_old"));
        assert!(queue.sanity_check(&other));

        assert!(!queue.sanity_check(&root.path().join("missing")));
    }
}
