use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::trace;

use crate::parser;

/// Something that can estimate how much longer a job has left, given the log
/// file its process writes to.
///
/// Returning `None` means "unknown": the file may not exist yet, may be
/// malformed, or may not contain an estimate. Callers treat all of these the
/// same way.
pub trait ProgressSource: Send + Sync {
    fn remaining(&self, log_path: &Path) -> Option<Duration>;
}

/// Reads the `CPULeft` thermo column of a LAMMPS log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LammpsLog;

impl ProgressSource for LammpsLog {
    fn remaining(&self, log_path: &Path) -> Option<Duration> {
        let raw = match fs::read(log_path) {
            Ok(raw) => raw,
            Err(error) => {
                trace!(%error, path = %log_path.display(), "log not readable");
                return None;
            },
        };

        match parser::cpu_left(&String::from_utf8_lossy(&raw)) {
            Ok(secs) if secs.is_finite() && secs >= 0.0 => {
                Some(Duration::from_secs(secs.round_ties_even() as u64))
            },
            Ok(secs) => {
                trace!(secs, "ignoring nonsensical estimate");
                None
            },
            Err(error) => {
                trace!(%error, path = %log_path.display(), "no estimate in log");
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_latest_estimate() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("out.txt");

        assert_eq!(LammpsLog.remaining(&log), None);

        fs::write(&log, "Step Temp\n0 1\n").unwrap();
        assert_eq!(LammpsLog.remaining(&log), None);

        fs::write(&log, "Step CPULeft\n0 0\n100 61.6\n").unwrap();
        assert_eq!(LammpsLog.remaining(&log), Some(Duration::from_secs(62)));

        // Halves go to the even neighbour.
        fs::write(&log, "Step CPULeft\n0 0\n100 60.5\n").unwrap();
        assert_eq!(LammpsLog.remaining(&log), Some(Duration::from_secs(60)));
    }
}
