//! Job scripts for running sweep cases locally or under SLURM.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

/// Name of the per-case solver configuration file.
pub const CASE_CONFIG_FILE: &str = "case.cfg";

/// Batch-scheduler settings for `submit.slurm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlurmConfig {
    /// Partition (`--partition`).
    pub partition: String,
    /// Wall-clock limit (`--time`), `HH:MM:SS`.
    pub time: String,
    /// Node count (`--nodes`).
    pub nodes: u32,
    /// Task count (`--ntasks`).
    pub ntasks: u32,
    /// Environment setup line run before the solver, if any.
    pub module_load: Option<String>,
    /// Solver executable.
    pub solver: String,
}

impl Default for SlurmConfig {
    fn default() -> Self {
        Self {
            partition: "standard".to_string(),
            time: "01:00:00".to_string(),
            nodes: 1,
            ntasks: 4,
            module_load: Some("module load su2/4.1.0".to_string()),
            solver: "SU2_CFD".to_string(),
        }
    }
}

/// `run.sh`: run the solver on the case config in the current directory.
#[must_use]
pub fn run_script(config: &SlurmConfig) -> String {
    format!("#!/bin/bash\n{} {CASE_CONFIG_FILE}\n", config.solver)
}

/// `submit.slurm` for one case directory.
#[must_use]
pub fn submit_script(job_name: &str, config: &SlurmConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#!/bin/bash");
    let _ = writeln!(out, "#SBATCH --job-name={job_name}");
    let _ = writeln!(out, "#SBATCH --output=output.log");
    let _ = writeln!(out, "#SBATCH --error=error.log");
    let _ = writeln!(out, "#SBATCH --time={}", config.time);
    let _ = writeln!(out, "#SBATCH --partition={}", config.partition);
    let _ = writeln!(out, "#SBATCH --nodes={}", config.nodes);
    let _ = writeln!(out, "#SBATCH --ntasks={}", config.ntasks);
    out.push('\n');
    if let Some(module_load) = &config.module_load {
        let _ = writeln!(out, "{module_load}");
    }
    let _ = writeln!(out, "srun {} {CASE_CONFIG_FILE}", config.solver);
    out
}

/// `submit_all.slurm`: submit every listed case directory in order.
///
/// Paths are written as given; callers pass them relative to wherever
/// the script will be run from, or absolute.
#[must_use]
pub fn submit_all_script<S: AsRef<str>>(case_dirs: &[S]) -> String {
    let mut out = String::from("#!/bin/bash\n\n");
    for dir in case_dirs {
        let _ = writeln!(out, "cd {}", dir.as_ref());
        out.push_str("sbatch submit.slurm\n");
        out.push_str("cd - > /dev/null\n");
    }
    out
}
