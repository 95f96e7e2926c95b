use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::QueueError;

/// The kind of machine jobs are launched on, which decides how LAMMPS is
/// invoked.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ComputerKind {
    /// Four MPI ranks, plain CPU styles.
    Cpu,
    /// One MPI rank driving a single GPU through the KOKKOS package.
    Gpu,
}

impl FromStr for ComputerKind {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CPU" => Ok(ComputerKind::Cpu),
            "GPU" => Ok(ComputerKind::Gpu),
            _ => Err(QueueError::InvalidComputerKind(s.to_string())),
        }
    }
}

impl fmt::Display for ComputerKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ComputerKind::Cpu => "CPU",
            ComputerKind::Gpu => "GPU",
        })
    }
}

/// Executables used to build launch commands.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Launcher {
    /// MPI launcher, `mpirun` by default.
    pub mpirun: String,
    /// Simulation binary, `lmp` by default.
    pub binary: String,
}

impl Default for Launcher {
    fn default() -> Self {
        Self {
            mpirun: "mpirun".to_string(),
            binary: "lmp".to_string(),
        }
    }
}

impl Launcher {
    /// Builds the argv that runs `input` inside `workdir`.
    pub fn command(
        &self,
        kind: ComputerKind,
        workdir: &Path,
        input: &str,
    ) -> Vec<String> {
        let workdir = workdir.to_string_lossy().into_owned();

        let mut argv = vec![self.mpirun.clone()];
        match kind {
            ComputerKind::Cpu => {
                argv.extend(["-np".into(), "4".into(), "-wdir".into(), workdir]);
                argv.push(self.binary.clone());
            },
            ComputerKind::Gpu => {
                argv.extend(["-n".into(), "1".into(), "-wdir".into(), workdir]);
                argv.push(self.binary.clone());
                argv.extend(
                    [
                        "-k", "on", "g", "1", "-sf", "kk", "-pk", "kokkos",
                        "newton", "on", "neigh", "half",
                    ]
                    .map(String::from),
                );
            },
        }
        argv.extend(["-in".to_string(), input.to_string()]);

        argv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!("CPU".parse::<ComputerKind>(), Ok(ComputerKind::Cpu));
        assert_eq!("GPU".parse::<ComputerKind>(), Ok(ComputerKind::Gpu));
        assert_eq!(
            "gpu".parse::<ComputerKind>(),
            Err(QueueError::InvalidComputerKind("gpu".into()))
        );
        assert_eq!(ComputerKind::Gpu.to_string(), "GPU");
    }

    #[test]
    fn test_commands() {
        let launcher = Launcher::default();
        let dir = Path::new("/data/sims/sim1");

        assert_eq!(
            launcher.command(ComputerKind::Cpu, dir, "run.lmp").join(" "),
            "mpirun -np 4 -wdir /data/sims/sim1 lmp -in run.lmp"
        );
        assert_eq!(
            launcher.command(ComputerKind::Gpu, dir, "run.lmp").join(" "),
            "mpirun -n 1 -wdir /data/sims/sim1 lmp -k on g 1 -sf kk -pk kokkos \
             newton on neigh half -in run.lmp"
        );

        let custom = Launcher {
            mpirun: "/opt/mpi/bin/mpirun".into(),
            binary: "lmp_kokkos".into(),
        };
        let argv = custom.command(ComputerKind::Cpu, dir, "in.melt");
        assert_eq!(argv.first().map(String::as_str), Some("/opt/mpi/bin/mpirun"));
        assert_eq!(argv[5], "lmp_kokkos");
        assert_eq!(argv.last().map(String::as_str), Some("in.melt"));
    }
}
