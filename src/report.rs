//! End-of-run summary, printed for the operator and optionally saved as
//! YAML.
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::dashboard::JobRow;
use crate::types::job::JobRecord;
use crate::types::states::JobState;

/// Final word on one job.
#[derive(Clone, Debug, Serialize)]
pub struct JobReport {
    pub id: u64,
    pub name: String,
    pub path: PathBuf,
    pub command: Vec<String>,
    pub state: JobState,
    pub exit_code: Option<i32>,
    /// As of the last sample taken while the job ran.
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
}

impl JobReport {
    pub fn new(job: &JobRecord, state: JobState, row: &JobRow) -> Self {
        Self {
            id: job.id().0,
            name: job.name().to_string(),
            path: job.path().to_path_buf(),
            command: job.command().to_vec(),
            state,
            exit_code: state.exit_code(),
            elapsed_secs: rounded_secs(row.elapsed),
            remaining_secs: rounded_secs(row.remaining),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub jobs: Vec<JobReport>,
    pub wall_time_secs: f64,
    /// Whether the run was interrupted before all jobs finished.
    pub interrupted: bool,
}

impl RunSummary {
    pub fn new(jobs: Vec<JobReport>, wall_time: Duration, interrupted: bool) -> Self {
        Self {
            jobs,
            wall_time_secs: wall_time.as_secs_f64(),
            interrupted,
        }
    }

    pub fn count(&self, state: JobState) -> usize {
        self.jobs.iter().filter(|j| j.state == state).count()
    }

    /// Jobs whose process was started, however they ended.
    pub fn launched(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| {
                !matches!(
                    j.state,
                    JobState::Pending | JobState::Skipped | JobState::LaunchFailed
                )
            })
            .count()
    }

    /// The closing line(s) shown to the operator.
    pub fn message(&self) -> String {
        if self.jobs.is_empty() {
            return "Found no LAMMPS input files. Pro-tip: check input filename formatting."
                .to_string();
        }

        let completed = self.count(JobState::Complete);
        let mut msg = format!(
            "{completed} runs completed. Run time: {:.2} hrs",
            self.wall_time_secs / 3600.0
        );

        let unfinished = self.jobs.len() - completed;
        if unfinished > 0 {
            msg.push_str(&format!(" ({unfinished} did not complete)"));
        }
        if self.interrupted {
            msg.push_str("\nRun interrupted.");
        }
        msg
    }

    pub fn to_yaml(&self) -> serde_yaml::Result<String> {
        serde_yaml::to_string(self)
    }
}

fn rounded_secs(d: Duration) -> u64 {
    d.as_secs_f64().round_ties_even() as u64
}
