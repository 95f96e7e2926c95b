//! Runs and watches a single job's process.
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use itertools::Itertools;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tokio::task::{self, JoinHandle};
use tokio::time;
use tracing::{debug, info, instrument, warn};

use crate::error::LaunchError;
use crate::line_reader::LineReader;
use crate::progress::ProgressSource;
use crate::types::job::{JobId, JobRecord};

/// Name of the file, inside each job's directory, that receives the job's
/// standard output and is read back for progress estimates.
pub const LOG_FILE_NAME: &str = "simq-out.txt";

/// How long to keep relaying standard error after the process has exited.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// How long a terminated job gets to wind down before it's killed outright.
const TERM_GRACE: Duration = Duration::from_secs(5);

/// Timings as of the latest sample.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Timings {
    pub elapsed: Duration,
    /// Zero whenever no estimate is available.
    pub remaining: Duration,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Liveness {
    Running,
    Complete(ExitStatus),
}

/// Owns one running job: its child process, the task draining its standard
/// error, and the timings derived from both. Built by [`launch`] and used for
/// exactly one job.
///
/// The process is started as the leader of a new process group, so that
/// anything it forks (MPI ranks) can be signalled along with it.
///
/// [`launch`]: ProcessSupervisor::launch
pub struct ProcessSupervisor {
    job: JobRecord,
    log_path: PathBuf,
    progress: Arc<dyn ProgressSource>,
    child: Child,
    #[cfg(unix)]
    pgid: Option<libc::pid_t>,
    stderr_drain: Option<JoinHandle<()>>,
    start_time: Instant,
    timings: Timings,
    liveness: Liveness,
}

impl ProcessSupervisor {
    /// Starts the job's process with its standard output going to
    /// `log_name` in the job's directory (created or truncated) and each
    /// line of its standard error logged as it arrives.
    ///
    /// Must be called within a tokio runtime.
    pub fn launch(
        job: JobRecord,
        log_name: &str,
        progress: Arc<dyn ProgressSource>,
    ) -> Result<Self, LaunchError> {
        Self::launch_with_stderr(job, log_name, progress, log_stderr_line)
    }

    /// As [`launch`](ProcessSupervisor::launch), but hands each standard
    /// error line to `sink` instead of the log.
    #[instrument(name = "launch", skip_all, fields(job = %job.id(), name = job.name()))]
    pub fn launch_with_stderr<S>(
        job: JobRecord,
        log_name: &str,
        progress: Arc<dyn ProgressSource>,
        sink: S,
    ) -> Result<Self, LaunchError>
    where
        S: FnMut(JobId, &str) + Send + 'static,
    {
        let (program, args) =
            job.command().split_first().ok_or(LaunchError::EmptyCommand)?;

        let log_path = job.path().join(log_name);
        let stdout = File::create(&log_path).map_err(|source| {
            LaunchError::LogFile {
                path: log_path.clone(),
                source,
            }
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(job.path())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(LaunchError::Spawn)?;

        let start_time = Instant::now();
        info!(command = %job.command().iter().join(" "), pid = ?child.id(), "launched");

        let stderr_drain = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(drain_stderr(job.id(), stderr, sink)));

        Ok(Self {
            #[cfg(unix)]
            pgid: child.id().and_then(|pid| libc::pid_t::try_from(pid).ok()),
            job,
            log_path,
            progress,
            child,
            stderr_drain,
            start_time,
            timings: Timings::default(),
            liveness: Liveness::Running,
        })
    }

    /// Recomputes timings as of `now`. The remaining time comes from the
    /// progress source and falls back to zero when it has nothing to offer.
    ///
    /// The progress source runs on the blocking pool: a long log can take a
    /// while to read and the stderr relay shares this thread.
    pub async fn sample(&mut self, now: Instant) -> Timings {
        let progress = Arc::clone(&self.progress);
        let log_path = self.log_path.clone();
        let remaining =
            match task::spawn_blocking(move || progress.remaining(&log_path))
                .await
            {
                Ok(remaining) => remaining,
                Err(error) => {
                    debug!(job = %self.job.id(), %error, "progress source failed");
                    None
                },
            };

        self.timings = Timings {
            elapsed: now.saturating_duration_since(self.start_time),
            remaining: remaining.unwrap_or(Duration::ZERO),
        };
        self.timings
    }

    /// Whether the process is still running. Once this returns false it will
    /// keep doing so.
    pub fn is_alive(&mut self) -> bool {
        if let Liveness::Complete(_) = self.liveness {
            return false;
        }

        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                self.liveness = Liveness::Complete(status);
                false
            },
            Err(error) => {
                // Can't tell; let await_completion find out.
                warn!(job = %self.job.id(), %error, "failed to poll process");
                true
            },
        }
    }

    /// Stops the job: SIGTERM to its whole process group, so `mpirun` can
    /// pass it on to the ranks, then SIGKILL to whatever is left once the
    /// leader exits or [`TERM_GRACE`] runs out. The leader still needs
    /// reaping via [`await_completion`].
    ///
    /// [`await_completion`]: ProcessSupervisor::await_completion
    pub async fn terminate(&mut self) {
        if let Liveness::Complete(_) = self.liveness {
            return;
        }

        #[cfg(unix)]
        {
            if let Some(pgid) = self.pgid {
                self.signal_group(pgid, libc::SIGTERM);

                match time::timeout(TERM_GRACE, self.child.wait()).await {
                    Ok(Ok(status)) => self.liveness = Liveness::Complete(status),
                    Ok(Err(error)) => {
                        warn!(job = %self.job.id(), %error, "failed waiting for process")
                    },
                    Err(_) => {
                        debug!(job = %self.job.id(), "ignored SIGTERM, killing")
                    },
                }

                // Ranks that outlived the leader still count as the job.
                self.signal_group(pgid, libc::SIGKILL);
            }
        }

        if let Liveness::Running = self.liveness {
            if let Err(error) = self.child.start_kill() {
                warn!(job = %self.job.id(), %error, "failed to kill process");
            }
        }
    }

    #[cfg(unix)]
    fn signal_group(&self, pgid: libc::pid_t, signal: libc::c_int) {
        // SAFETY: killpg has no memory-safety preconditions.
        if unsafe { libc::killpg(pgid, signal) } != 0 {
            let error = io::Error::last_os_error();
            // ESRCH: the whole group is already gone.
            if error.raw_os_error() != Some(libc::ESRCH) {
                warn!(job = %self.job.id(), %error, signal, "failed to signal process group");
            }
        }
    }

    /// Waits for the process to exit and reaps it, then waits for its
    /// standard error to be fully relayed.
    pub async fn await_completion(&mut self) -> io::Result<ExitStatus> {
        let status = match self.liveness {
            Liveness::Complete(status) => status,
            Liveness::Running => {
                let status = self.child.wait().await?;
                self.liveness = Liveness::Complete(status);
                status
            },
        };

        // Grandchildren can inherit the pipe and hold it open past the
        // process's own exit; stop relaying for them after a grace period.
        if let Some(mut drain) = self.stderr_drain.take() {
            match time::timeout(DRAIN_GRACE, &mut drain).await {
                Ok(Ok(())) => {},
                Ok(Err(error)) => {
                    warn!(job = %self.job.id(), %error, "stderr relay task failed")
                },
                Err(_) => {
                    debug!(job = %self.job.id(), "stderr still open, detaching");
                    drain.abort();
                },
            }
        }

        debug!(job = %self.job.id(), %status, "reaped");
        Ok(status)
    }
}

fn log_stderr_line(job: JobId, line: &str) {
    warn!(%job, "STDERR: {line}");
}

/// Hands each line of a job's standard error to `sink` as soon as it
/// arrives, until the pipe closes or breaks.
async fn drain_stderr<R, S>(job: JobId, stderr: R, mut sink: S)
where
    R: AsyncRead + Unpin,
    S: FnMut(JobId, &str),
{
    let mut reader: LineReader<R> = stderr.into();

    loop {
        match reader.read_line().await {
            Ok(Some(line)) => sink(job, &String::from_utf8_lossy(&line)),
            Ok(None) => break,
            Err(error) => {
                warn!(%job, %error, "failed reading stderr");
                break;
            },
        }
    }
}
