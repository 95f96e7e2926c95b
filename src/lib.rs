//! Runs a directory of LAMMPS simulations one after another, showing each
//! job's elapsed and estimated remaining time in a live terminal table.
pub mod config;
pub mod dashboard;
pub mod error;
pub mod line_reader;
pub mod parser;
pub mod progress;
pub mod queue;
pub mod report;
pub mod supervisor;
pub mod types;
pub mod util;
