//! wedgemesh: extract wedge geometry from CFD field snapshots, mesh it,
//! and lay out solver sweeps.
//!
//! Four subcommands, each one stage of the workflow:
//!
//! - `extract`: `.npz` archives to `.npy` boundary point lists
//! - `mesh`: point lists to Gmsh scripts (and meshes, given `--gmsh`)
//! - `sweep`: meshes and a config template to solver case directories
//! - `inspect`: one archive key, every intermediate written to disk
//!
//! # Usage
//!
//! ```text
//! wedgemesh extract snapshots/ points/ --key density --jobs 8 --error-log errors.csv
//! wedgemesh mesh points/ meshes/ --topology double-ramp --gmsh gmsh
//! wedgemesh sweep meshes/ template.cfg cases/ --extension msh
//! wedgemesh inspect snapshots/double_ramp_0.046_0.12_ma_2.0_pres_1000_a.npz debug/
//! ```
//!
//! Logging goes to stderr and honors `RUST_LOG`; summaries go to stdout.

#![allow(clippy::print_stdout)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use wedgemesh_export::{GasProperties, SlurmConfig};
use wedgemesh_io::{
    ExtractOptions, InspectOutputs, MeshOptions, SkippedUnit, SweepConditions, SweepOptions,
};
use wedgemesh_pipeline::approximate::ApproximationConfig;
use wedgemesh_pipeline::mask::MaskConfig;
use wedgemesh_pipeline::{
    CornerPolicy, LowerWallPolicy, MeshTopology, MetadataFilter, NormalizeConfig, PipelineConfig,
    ScalingPolicy,
};

/// Wedge geometry extraction, meshing and solver sweep generation.
#[derive(Parser, Debug)]
#[command(name = "wedgemesh", version)]
struct Cli {
    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract boundary point lists from `.npz` field archives.
    Extract(ExtractArgs),
    /// Turn point lists into Gmsh scripts and meshes.
    Mesh(MeshArgs),
    /// Write solver case directories for every mesh and flow condition.
    Sweep(SweepArgs),
    /// Run one archive key and write every intermediate.
    Inspect(InspectArgs),
}

// ---------------------------------------------------------------------------
// Shared arguments
// ---------------------------------------------------------------------------

/// Field colormap selection.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColormapArg {
    /// Dark-purple to yellow.
    Viridis,
    /// Black to white.
    Grayscale,
}

/// Top-right corner clean-up selection.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CornerArg {
    /// Leave vertices alone.
    Keep,
    /// Drop duplicate top-right vertices.
    DropDuplicate,
}

/// Lower-wall synthesis selection.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LowerWallArg {
    /// Upper wall only.
    Omit,
    /// Mirror every point onto the floor row.
    Mirror,
}

/// Pipeline parameters, either individually or as one JSON document.
#[derive(Args, Debug)]
struct PipelineArgs {
    /// Colormap used to rasterize the field.
    #[arg(long, value_enum, default_value_t = ColormapArg::Viridis)]
    colormap: ColormapArg,

    /// Median filter radius in pixels (0 disables).
    #[arg(long, default_value_t = MaskConfig::DEFAULT_MEDIAN_RADIUS)]
    median_radius: u32,

    /// Gaussian blur sigma (0 disables).
    #[arg(long, default_value_t = MaskConfig::DEFAULT_GAUSSIAN_SIGMA)]
    gaussian_sigma: f32,

    /// Intensities at or below this value are foreground.
    #[arg(long, default_value_t = MaskConfig::DEFAULT_THRESHOLD)]
    threshold: u8,

    /// Simplification tolerance as a fraction of the contour perimeter.
    #[arg(long, default_value_t = ApproximationConfig::DEFAULT_EPSILON_FACTOR)]
    epsilon_factor: f64,

    /// Do not snap the second-leftmost vertex onto the left wall row.
    #[arg(long)]
    no_align_left_wall: bool,

    /// Top-right corner clean-up.
    #[arg(long, value_enum, default_value_t = CornerArg::DropDuplicate)]
    corner_policy: CornerArg,

    /// Boundary points before lower-wall synthesis.
    #[arg(long, default_value_t = NormalizeConfig::DEFAULT_TARGET_COUNT)]
    target_count: usize,

    /// Lower-wall synthesis.
    #[arg(long, value_enum, default_value_t = LowerWallArg::Mirror)]
    lower_wall: LowerWallArg,

    /// Physical height spanned by the reference pixels.
    #[arg(long, default_value_t = 1.0)]
    domain_height: f64,

    /// Scale x from the floor width instead of reusing the y scale.
    #[arg(long)]
    anisotropic: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// Missing fields take their defaults.
    #[arg(long, conflicts_with = "config")]
    config_json: Option<String>,

    /// Full pipeline config read from a JSON file.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl PipelineArgs {
    /// Build a [`PipelineConfig`] from the arguments.
    ///
    /// A JSON config (inline or from a file) wins over the individual
    /// flags.
    fn to_config(&self) -> anyhow::Result<PipelineConfig> {
        if let Some(json) = &self.config_json {
            return serde_json::from_str(json).context("parsing --config-json");
        }
        if let Some(path) = &self.config {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            return serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()));
        }

        let mut config = PipelineConfig::default();
        config.colormap = match self.colormap {
            ColormapArg::Viridis => wedgemesh_pipeline::Colormap::Viridis,
            ColormapArg::Grayscale => wedgemesh_pipeline::Colormap::Grayscale,
        };
        config.mask = MaskConfig {
            median_radius: self.median_radius,
            gaussian_sigma: self.gaussian_sigma,
            threshold: self.threshold,
        };
        config.approximation = ApproximationConfig {
            epsilon_factor: self.epsilon_factor,
            align_left_wall: !self.no_align_left_wall,
            corner_policy: match self.corner_policy {
                CornerArg::Keep => CornerPolicy::Keep,
                CornerArg::DropDuplicate => CornerPolicy::DropDuplicateTopRight,
            },
            ..ApproximationConfig::default()
        };
        config.normalize = NormalizeConfig {
            target_count: self.target_count,
            lower_wall: match self.lower_wall {
                LowerWallArg::Omit => LowerWallPolicy::Omit,
                LowerWallArg::Mirror => LowerWallPolicy::MirrorToFloor,
            },
        };
        config.scale.domain_height = self.domain_height;
        config.scale.policy = if self.anisotropic {
            ScalingPolicy::Anisotropic
        } else {
            ScalingPolicy::Isotropic
        };
        Ok(config)
    }
}

/// Batch execution settings shared by `extract` and `mesh`.
#[derive(Args, Debug)]
struct BatchArgs {
    /// Worker threads (1 runs sequentially).
    #[arg(long, short, default_value_t = 1)]
    jobs: usize,

    /// Empty the output directory before writing. Refused when the
    /// output directory holds the inputs.
    #[arg(long)]
    clear: bool,

    /// CSV file receiving skipped units.
    #[arg(long)]
    error_log: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// extract
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Directory holding `.npz` archives.
    input_dir: PathBuf,

    /// Directory receiving `<stem>_<key>.npy` point lists.
    output_dir: PathBuf,

    /// Field key to extract (repeatable).
    #[arg(long = "key", default_value = "density")]
    keys: Vec<String>,

    /// Only archives with this first ramp value.
    #[arg(long)]
    ramp1: Option<f64>,

    /// Only archives with this second ramp value.
    #[arg(long)]
    ramp2: Option<f64>,

    /// Only archives at or above this Mach number.
    #[arg(long)]
    min_mach: Option<f64>,

    /// Only archives at or below this Mach number.
    #[arg(long)]
    max_mach: Option<f64>,

    #[command(flatten)]
    pipeline: PipelineArgs,

    #[command(flatten)]
    batch: BatchArgs,
}

fn run_extract(args: &ExtractArgs) -> anyhow::Result<ExitCode> {
    let config = args.pipeline.to_config()?;
    let options = ExtractOptions {
        input_dir: args.input_dir.clone(),
        output_dir: args.output_dir.clone(),
        keys: args.keys.clone(),
        filter: MetadataFilter {
            ramp1: args.ramp1,
            ramp2: args.ramp2,
            min_mach: args.min_mach,
            max_mach: args.max_mach,
        },
        clear_output: args.batch.clear,
        jobs: args.batch.jobs,
        error_log: args.batch.error_log.clone(),
    };
    let report = wedgemesh_io::run_extraction(&options, &config)
        .with_context(|| format!("extracting from {}", args.input_dir.display()))?;
    println!(
        "extracted {} point lists into {}",
        report.processed.len(),
        args.output_dir.display()
    );
    Ok(summarize_skipped(&report.skipped))
}

// ---------------------------------------------------------------------------
// mesh
// ---------------------------------------------------------------------------

/// Boundary layout presets.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum TopologyArg {
    /// 12 vertices: six outline points mirrored to the floor.
    DoubleRamp,
    /// 6 vertices.
    SingleRamp,
}

#[derive(Args, Debug)]
struct MeshArgs {
    /// Directory holding `.npy` point lists.
    points_dir: PathBuf,

    /// Directory receiving `.geo` scripts and `.msh` meshes.
    output_dir: PathBuf,

    /// Boundary layout preset.
    #[arg(long, value_enum, default_value_t = TopologyArg::DoubleRamp)]
    topology: TopologyArg,

    /// Custom wall node counts, one per wall curve (overrides --topology).
    #[arg(long, value_delimiter = ',', requires = "inlet_outlet_nodes")]
    wall_nodes: Option<Vec<u32>>,

    /// Custom inlet and outlet node count (with --wall-nodes).
    #[arg(long)]
    inlet_outlet_nodes: Option<u32>,

    /// gmsh executable; without it only `.geo` scripts are written.
    #[arg(long)]
    gmsh: Option<PathBuf>,

    #[command(flatten)]
    batch: BatchArgs,
}

impl MeshArgs {
    fn topology(&self) -> anyhow::Result<MeshTopology> {
        match (&self.wall_nodes, self.inlet_outlet_nodes) {
            (Some(walls), Some(io_nodes)) => {
                let vertices = 2 * (walls.len() + 1);
                Ok(MeshTopology::new(vertices, io_nodes, walls.clone())?)
            }
            (None, Some(_)) => bail!("--inlet-outlet-nodes needs --wall-nodes"),
            _ => Ok(match self.topology {
                TopologyArg::DoubleRamp => MeshTopology::double_ramp(),
                TopologyArg::SingleRamp => MeshTopology::single_ramp(),
            }),
        }
    }
}

fn run_mesh(args: &MeshArgs) -> anyhow::Result<ExitCode> {
    let options = MeshOptions {
        points_dir: args.points_dir.clone(),
        output_dir: args.output_dir.clone(),
        topology: args.topology()?,
        gmsh: args.gmsh.clone(),
        clear_output: args.batch.clear,
        jobs: args.batch.jobs,
        error_log: args.batch.error_log.clone(),
    };
    let report = wedgemesh_io::run_meshing(&options)
        .with_context(|| format!("meshing {}", args.points_dir.display()))?;
    println!(
        "meshed {} point lists into {}",
        report.processed.len(),
        args.output_dir.display()
    );
    Ok(summarize_skipped(&report.skipped))
}

// ---------------------------------------------------------------------------
// sweep
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
struct SweepArgs {
    /// Directory holding meshes.
    mesh_dir: PathBuf,

    /// Solver configuration template.
    template: PathBuf,

    /// Directory receiving one subdirectory per case.
    output_dir: PathBuf,

    /// Mesh file extension.
    #[arg(long, default_value = "su2")]
    extension: String,

    /// Static temperature in kelvin (repeatable; default 250, 275, 300).
    #[arg(long = "temperature")]
    temperatures: Vec<f64>,

    /// Mach number (repeatable). Switches from filename conditions to
    /// a grid; needs --pressure.
    #[arg(long = "mach", requires = "pressures")]
    machs: Vec<f64>,

    /// Static pressure in pascals (repeatable, with --mach).
    #[arg(long = "pressure", requires = "machs")]
    pressures: Vec<f64>,

    /// Ratio of specific heats.
    #[arg(long, default_value_t = GasProperties::AIR.gamma)]
    gamma: f64,

    /// Specific gas constant in J/(kg K).
    #[arg(long, default_value_t = GasProperties::AIR.gas_constant)]
    gas_constant: f64,

    /// SLURM partition.
    #[arg(long)]
    partition: Option<String>,

    /// SLURM wall-clock limit, `HH:MM:SS`.
    #[arg(long)]
    time: Option<String>,

    /// SLURM node count.
    #[arg(long)]
    nodes: Option<u32>,

    /// SLURM task count.
    #[arg(long)]
    ntasks: Option<u32>,

    /// Environment setup line run before the solver.
    #[arg(long, conflicts_with = "no_module_load")]
    module_load: Option<String>,

    /// Skip the environment setup line.
    #[arg(long)]
    no_module_load: bool,

    /// Solver executable.
    #[arg(long)]
    solver: Option<String>,

    /// Do not write `submit_all.slurm`.
    #[arg(long)]
    no_master_script: bool,

    /// Empty the output directory before writing. Refused when the
    /// output directory holds the inputs.
    #[arg(long)]
    clear: bool,

    /// CSV file receiving skipped meshes and cases.
    #[arg(long)]
    error_log: Option<PathBuf>,
}

impl SweepArgs {
    fn conditions(&self) -> SweepConditions {
        let temperatures = if self.temperatures.is_empty() {
            SweepConditions::DEFAULT_TEMPERATURES.to_vec()
        } else {
            self.temperatures.clone()
        };
        if self.machs.is_empty() {
            SweepConditions::FromFilename { temperatures }
        } else {
            SweepConditions::Grid {
                machs: self.machs.clone(),
                temperatures,
                pressures: self.pressures.clone(),
            }
        }
    }

    fn slurm(&self) -> SlurmConfig {
        let mut slurm = SlurmConfig::default();
        if let Some(partition) = &self.partition {
            slurm.partition.clone_from(partition);
        }
        if let Some(time) = &self.time {
            slurm.time.clone_from(time);
        }
        if let Some(nodes) = self.nodes {
            slurm.nodes = nodes;
        }
        if let Some(ntasks) = self.ntasks {
            slurm.ntasks = ntasks;
        }
        if self.no_module_load {
            slurm.module_load = None;
        } else if let Some(line) = &self.module_load {
            slurm.module_load = Some(line.clone());
        }
        if let Some(solver) = &self.solver {
            slurm.solver.clone_from(solver);
        }
        slurm
    }
}

fn run_sweep(args: &SweepArgs) -> anyhow::Result<ExitCode> {
    let options = SweepOptions {
        mesh_dir: args.mesh_dir.clone(),
        mesh_extension: args.extension.clone(),
        template: args.template.clone(),
        output_dir: args.output_dir.clone(),
        conditions: args.conditions(),
        gas: GasProperties {
            gamma: args.gamma,
            gas_constant: args.gas_constant,
        },
        slurm: args.slurm(),
        master_script: !args.no_master_script,
        clear_output: args.clear,
        error_log: args.error_log.clone(),
    };
    let report = wedgemesh_io::run_sweep(&options)
        .with_context(|| format!("writing sweep into {}", args.output_dir.display()))?;
    println!(
        "wrote {} cases into {}",
        report.processed.len(),
        args.output_dir.display()
    );
    Ok(summarize_skipped(&report.skipped))
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
struct InspectArgs {
    /// The `.npz` archive.
    archive: PathBuf,

    /// Directory receiving the artifacts.
    output_dir: PathBuf,

    /// Field key.
    #[arg(long, default_value = "density")]
    key: String,

    /// Skip the per-stage PNGs.
    #[arg(long)]
    no_stages: bool,

    /// Skip both SVG drawings.
    #[arg(long)]
    no_svg: bool,

    /// Print the ordered points as JSON on stdout.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

fn run_inspect(args: &InspectArgs) -> anyhow::Result<ExitCode> {
    let config = args.pipeline.to_config()?;
    let outputs = InspectOutputs {
        stages: !args.no_stages,
        diagnostic_svg: !args.no_svg,
        boundary_svg: !args.no_svg,
    };
    let inspection =
        wedgemesh_io::inspect_unit(&args.archive, &args.key, &config, &args.output_dir, outputs)
            .with_context(|| format!("inspecting {} [{}]", args.archive.display(), args.key))?;

    if args.json {
        let json = serde_json::to_string_pretty(inspection.staged.ordered.points())
            .context("serializing points")?;
        println!("{json}");
    } else {
        let refs = &inspection.staged.references;
        println!(
            "{} [{}]: {} x {} px, {} components, contour {} px",
            display_name(&args.archive),
            args.key,
            inspection.staged.dimensions.width,
            inspection.staged.dimensions.height,
            inspection.staged.component_count,
            inspection.staged.contour.len(),
        );
        println!(
            "references: left-upper ({}, {}), left-lower ({}, {}), right-lower ({}, {})",
            refs.left_upper.x,
            refs.left_upper.y,
            refs.left_lower.x,
            refs.left_lower.y,
            refs.right_lower.x,
            refs.right_lower.y,
        );
        for (i, p) in inspection.staged.ordered.points().iter().enumerate() {
            println!("{:>3}  {:>12.6} {:>12.6}", i + 1, p.x, p.y);
        }
    }
    for path in &inspection.written {
        tracing::debug!(path = %path.display(), "wrote");
    }
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}

/// Report skipped units; a batch with any skipped unit exits with 2.
fn summarize_skipped(skipped: &[SkippedUnit]) -> ExitCode {
    if skipped.is_empty() {
        return ExitCode::SUCCESS;
    }
    println!("skipped {}:", skipped.len());
    for unit in skipped {
        if unit.key.is_empty() {
            println!("  {} ({}): {}", unit.filename, unit.kind, unit.message);
        } else {
            println!(
                "  {} [{}] ({}): {}",
                unit.filename, unit.key, unit.kind, unit.message
            );
        }
    }
    ExitCode::from(2)
}

/// Initialize logging.
///
/// `RUST_LOG` wins; otherwise wedgemesh crates log at `info` (`debug`
/// with `--verbose`) and everything else at `warn`.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,wedgemesh={level},wedgemesh_io={level},wedgemesh_pipeline={level},wedgemesh_export={level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Command::Extract(args) => run_extract(args),
        Command::Mesh(args) => run_mesh(args),
        Command::Sweep(args) => run_sweep(args),
        Command::Inspect(args) => run_inspect(args),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
