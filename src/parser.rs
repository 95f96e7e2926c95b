//! implements a reader for the thermodynamic output sections of a LAMMPS log.
//!
//! A log holds one section per `run` command: a header line whose first
//! token is `Step` naming the columns, rows of numbers, and finally a line
//! starting `Loop time`. Only single-line thermo styles are understood.
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParsingError {
    /// No thermo header has been written yet.
    NoRuns,
    /// The latest run doesn't print the requested column.
    MissingColumn,
    /// The latest run has a header but no complete data rows yet.
    NoData,
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::NoRuns => "no runs in log",
            Self::MissingColumn => "column not in latest run",
            Self::NoData => "no data rows in latest run",
        })
    }
}

impl std::error::Error for ParsingError {}

/// One run section: its column names and its most recent complete row.
struct RunSection<'a> {
    columns: Vec<&'a str>,
    last_row: Option<Vec<f64>>,
}

impl<'a> RunSection<'a> {
    fn new(header: &'a str) -> Self {
        Self {
            columns: header.split_whitespace().collect(),
            last_row: None,
        }
    }

    /// Records a line if it's a complete row of numbers for this section.
    /// Warnings, partial writes and other chatter are skipped.
    fn push_line(&mut self, line: &str) {
        let row: Option<Vec<f64>> = line
            .split_whitespace()
            .map(|tok| tok.parse::<f64>().ok())
            .collect();

        if let Some(row) = row {
            if row.len() == self.columns.len() {
                self.last_row = Some(row);
            }
        }
    }
}

/// Returns the latest value of `column` in the last run section of `log`.
pub fn last_run_value(log: &str, column: &str) -> Result<f64, ParsingError> {
    let mut latest: Option<RunSection> = None;
    let mut in_run = false;

    for line in log.lines() {
        let trimmed = line.trim_start();
        match trimmed.split_whitespace().next() {
            Some("Step") => {
                latest = Some(RunSection::new(trimmed));
                in_run = true;
            },
            Some("Loop") if trimmed.starts_with("Loop time") => in_run = false,
            Some(_) if in_run => {
                if let Some(run) = latest.as_mut() {
                    run.push_line(trimmed);
                }
            },
            _ => {},
        }
    }

    let run = latest.ok_or(ParsingError::NoRuns)?;
    let idx = run
        .columns
        .iter()
        .position(|c| *c == column)
        .ok_or(ParsingError::MissingColumn)?;
    let row = run.last_row.ok_or(ParsingError::NoData)?;

    Ok(row[idx])
}

/// Returns the latest `CPULeft` estimate, in seconds, of the last run.
pub fn cpu_left(log: &str) -> Result<f64, ParsingError> {
    last_run_value(log, "CPULeft")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_RUNS: &str = "\
LAMMPS (2 Aug 2023)
units lj
Per MPI rank memory allocation (min/avg/max) = 3.4 | 3.4 | 3.4 Mbytes
   Step          Temp          E_pair        CPULeft
         0   3              -6.7733681      0
       100   1.6758903     -4.7955425       12.5
Loop time of 0.8 on 4 procs for 100 steps with 4000 atoms

   Step          Temp          CPULeft
       100   1.6758903      0
       200   1.6649129      301.2
WARNING: Lost atoms (src/thermo.cpp:488)
       300   1.6631522      245.7
       40";

    #[test]
    fn test_cpu_left() {
        #[track_caller]
        fn ok(log: &str, expected: f64) {
            assert_eq!(cpu_left(log), Ok(expected));
        }

        #[track_caller]
        fn err(log: &str, expected: ParsingError) {
            assert_eq!(cpu_left(log), Err(expected));
        }

        // The last complete row of the last run wins; the partly-written
        // final line is ignored.
        ok(TWO_RUNS, 245.7);

        // A finished run still reports its final row.
        ok(
            "Step CPULeft\n0 0\n10 4\nLoop time of 1 on 1 procs\n",
            4.0,
        );

        err("", ParsingError::NoRuns);
        err("LAMMPS (2 Aug 2023)\nunits lj\n", ParsingError::NoRuns);
        err("Step Temp\n0 1.0\n", ParsingError::MissingColumn);
        err("Step Temp CPULeft\n", ParsingError::NoData);

        // An earlier run having the column doesn't help the latest one.
        err(
            "Step CPULeft\n0 5\nLoop time of 1\nStep Temp\n0 1\n",
            ParsingError::MissingColumn,
        );

        // Rows after the loop summary don't belong to the run.
        ok("Step CPULeft\n0 7\nLoop time of 1\n1 2\n", 7.0);
    }

    #[test]
    fn test_other_columns() {
        assert_eq!(last_run_value(TWO_RUNS, "Step"), Ok(300.0));
        assert_eq!(last_run_value(TWO_RUNS, "Temp"), Ok(1.6631522));
        assert_eq!(
            last_run_value(TWO_RUNS, "E_pair"),
            Err(ParsingError::MissingColumn)
        );
    }
}
