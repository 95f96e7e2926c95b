use serde::Serialize;

/// Where a job is in its life. Jobs start `Pending` and end in one of the
/// other states.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JobState {
    Pending,
    /// Exited with a zero status.
    Complete,
    /// Could not be started at all.
    LaunchFailed,
    /// Exited with a non-zero status, or was killed by a signal (no exit
    /// code then).
    Failed { exit_code: Option<i32> },
    /// Killed after running past the configured timeout.
    TimedOut,
    /// Killed because the run was interrupted.
    Cancelled,
    /// Never launched because the run was interrupted first.
    Skipped,
}

impl JobState {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            JobState::Complete => Some(0),
            JobState::Failed { exit_code } => *exit_code,
            _ => None,
        }
    }
}

// This impl is used to allow job reports to be serialised to YAML.
impl Serialize for JobState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use JobState::*;

        serializer.serialize_str(match self {
            Pending => "pending",
            Complete => "complete",
            LaunchFailed => "launch-failed",
            Failed { exit_code: _ } => "failed",
            TimedOut => "timed-out",
            Cancelled => "cancelled",
            Skipped => "skipped",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_as_plain_names() {
        let yaml = serde_yaml::to_string(&vec![
            JobState::Complete,
            JobState::Failed { exit_code: Some(3) },
            JobState::TimedOut,
            JobState::LaunchFailed,
        ])
        .unwrap();

        assert_eq!(
            yaml,
            "- complete\n- failed\n- timed-out\n- launch-failed\n"
        );
    }
}
