//! In-place terminal table of job timings.
use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};

use crate::types::job::JobId;
use crate::util::format_hms;

/// Lines cleared on top of one per job, covering the header and the slack
/// left by anything printed between redraws.
pub const EXTRA_LINES: usize = 5;

const HEADER: [&str; 4] = ["Job ID", "Name", "Elapsed Time", "Remaining Time"];

/// One line of the table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JobRow {
    pub id: JobId,
    pub name: String,
    pub elapsed: Duration,
    pub remaining: Duration,
}

impl JobRow {
    pub fn new(id: JobId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            elapsed: Duration::ZERO,
            remaining: Duration::ZERO,
        }
    }
}

/// Draws the job table onto a terminal (or anything else that accepts
/// bytes), overwriting the previous frame.
pub struct Dashboard<W: Write> {
    out: W,
}

impl<W: Write> Dashboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// With `None`, wipes the whole screen including scrollback. With
    /// `Some(n)`, wipes rows `1..=n` only. Either way the cursor ends up at
    /// the top-left.
    pub fn clear(&mut self, lines: Option<u16>) -> io::Result<()> {
        match lines {
            None => queue!(
                self.out,
                Clear(ClearType::FromCursorUp),
                Clear(ClearType::All),
                Clear(ClearType::Purge),
                MoveTo(0, 0)
            )?,
            Some(n) => queue!(
                self.out,
                MoveTo(0, n.saturating_sub(1)),
                Clear(ClearType::FromCursorUp),
                MoveTo(0, 0)
            )?,
        }
        self.out.flush()
    }

    /// Redraws the table. `total_jobs` sizes the area cleared first, so it
    /// should stay the same for the whole run.
    pub fn render(&mut self, rows: &[JobRow], total_jobs: usize) -> io::Result<()> {
        let lines = u16::try_from(total_jobs + EXTRA_LINES).unwrap_or(u16::MAX);
        self.clear(Some(lines))?;

        writeln!(
            self.out,
            "{} \t\t {} \t\t\t {} \t\t {}",
            HEADER[0], HEADER[1], HEADER[2], HEADER[3]
        )?;
        for row in rows {
            writeln!(
                self.out,
                "{} \t\t {} \t {} \t\t {}",
                row.id,
                row.name,
                format_hms(row.elapsed),
                format_hms(row.remaining)
            )?;
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<JobRow> {
        vec![
            JobRow {
                id: JobId(100),
                name: "sim1".into(),
                elapsed: Duration::from_secs(3725),
                remaining: Duration::from_secs(61),
            },
            JobRow::new(JobId(101), "sim2"),
        ]
    }

    #[test]
    fn render_is_repeatable() {
        let mut dash = Dashboard::new(Vec::new());
        dash.render(&rows(), 2).unwrap();
        let once = dash.into_inner();

        let mut dash = Dashboard::new(Vec::new());
        dash.render(&rows(), 2).unwrap();
        dash.render(&rows(), 2).unwrap();
        let twice = dash.into_inner();

        assert_eq!([once.as_slice(), once.as_slice()].concat(), twice);
    }

    #[test]
    fn render_layout() {
        let mut dash = Dashboard::new(Vec::new());
        dash.render(&rows(), 2).unwrap();
        let out = String::from_utf8(dash.into_inner()).unwrap();

        // Clear 7 rows, home, then the table.
        assert_eq!(
            out,
            "\x1b[7;1H\x1b[1J\x1b[1;1H\
             Job ID \t\t Name \t\t\t Elapsed Time \t\t Remaining Time\n\
             100 \t\t sim1 \t 1:02:05 \t\t 0:01:01\n\
             101 \t\t sim2 \t 0:00:00 \t\t 0:00:00\n"
        );
    }

    #[test]
    fn full_clear() {
        let mut dash = Dashboard::new(Vec::new());
        dash.clear(None).unwrap();
        assert_eq!(
            dash.into_inner(),
            b"\x1b[1J\x1b[2J\x1b[3J\x1b[1;1H".to_vec()
        );
    }
}
