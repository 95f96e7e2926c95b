use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(about, long_about = None, version)]
pub(crate) struct Args {
    /// Path to the root directory containing simulations. Must also be set in
    /// the case of a single simulation.
    #[arg(short = 'd', long = "root_dir", default_value = "./")]
    pub(crate) root_dir: PathBuf,
    /// Name(s) of directories containing simulation files. If not set, every
    /// directory within root_dir is assumed to contain a simulation.
    #[arg(short, long = "simulation_dir", num_args = 1..)]
    pub(crate) simulation_dir: Option<Vec<String>>,
    /// Name of the LAMMPS input script, the same in every simulation.
    #[arg(short, long = "input_format", default_value = "run.lmp")]
    pub(crate) input_format: String,
    /// Kind of machine to run on.
    #[arg(short, long, default_value = "GPU", value_parser = ["CPU", "GPU"])]
    pub(crate) computer: String,
    /// Seconds between progress monitor updates.
    #[arg(short, long, default_value_t = 1.0)]
    pub(crate) update: f64,
    /// Extra filename fragments marking a directory as a simulation, on top
    /// of `.lmp` and `.in`.
    #[arg(long = "suffix")]
    pub(crate) suffixes: Vec<String>,
    /// Kill any simulation still running after this many seconds.
    #[arg(short, long)]
    pub(crate) timeout: Option<f64>,
    /// MPI launcher executable.
    #[arg(long, default_value = "mpirun")]
    pub(crate) mpirun: String,
    /// LAMMPS executable.
    #[arg(long, default_value = "lmp")]
    pub(crate) lmp: String,
    /// Writes a YAML summary of the run to this file.
    #[arg(short, long)]
    pub(crate) report: Option<PathBuf>,
    /// Enables verbose, human-friendly logging.
    #[arg(long, default_value_t)]
    pub(crate) debug: bool,
    /// Logs as JSON.
    #[arg(long, default_value_t, conflicts_with = "debug")]
    pub(crate) json: bool,
}
