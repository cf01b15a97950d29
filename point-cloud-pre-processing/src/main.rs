//! CFD point cloud preprocessing
//!
//! Converts a scattered point cloud into gridded slices and line profiles,
//! inspects processed output and manages the simulation case registry.

use anyhow::{Context, Result, bail};
use case_registry::{BestCase, CaseRegistry, CaseStatus, NewCase};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use constants::case_schema::{get_design_parameter, get_performance_metric};
use indexmap::IndexMap;
use std::path::PathBuf;
use std::process;

use point_cloud_pre_processing::dds_writer::write_slice_texture;
use point_cloud_pre_processing::logging::init_logging;
use point_cloud_pre_processing::{
    ArtifactCache, Axis, BoxFilter, DiskCache, LoadOutcome, PlaneFamily, PointCloudConverter,
    PreprocessConfig, RegionStats, read_point_cloud,
};

#[derive(Parser, Debug)]
#[command(name = "point-cloud-pre-processing")]
#[command(about = "Slice and profile scattered CFD point clouds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate slices and profiles into an output directory
    Process(ProcessArgs),
    /// Show the metadata and artifacts of a processed directory
    Info {
        dir: PathBuf,
    },
    /// Statistics of one variable over the raw points in a box
    Stats(StatsArgs),
    /// Write one slice variable as a DDS texture
    ExportTexture(ExportTextureArgs),
    /// Manage simulation cases
    Case(CaseArgs),
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Input point cloud (.csv, .las or .laz)
    input: PathBuf,

    #[arg(long)]
    out: PathBuf,

    /// JSON processing configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Slices per plane family
    #[arg(long)]
    slices: Option<usize>,

    /// Grid resolution per slice axis and profile
    #[arg(long)]
    grid: Option<usize>,

    #[arg(long)]
    slice_tolerance: Option<f64>,

    #[arg(long)]
    bin_width_factor: Option<f64>,
}

#[derive(Args, Debug)]
struct StatsArgs {
    input: PathBuf,

    #[arg(long)]
    variable: String,

    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    x: Option<Vec<f64>>,

    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    y: Option<Vec<f64>>,

    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    z: Option<Vec<f64>>,
}

#[derive(Args, Debug)]
struct ExportTextureArgs {
    /// Processed output directory
    dir: PathBuf,

    #[arg(long)]
    plane: PlaneFamily,

    #[arg(long)]
    index: usize,

    #[arg(long)]
    variable: String,

    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct CaseArgs {
    /// Case registry file
    #[arg(long, default_value = "cases.json")]
    db: PathBuf,

    #[command(subcommand)]
    action: CaseAction,
}

#[derive(Subcommand, Debug)]
enum CaseAction {
    /// List cases, newest first
    List,
    /// Create a case
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "planned")]
        status: CaseStatus,
        /// Design parameter as name=value, repeatable
        #[arg(long = "param", value_parser = parse_assignment)]
        params: Vec<(String, f64)>,
        /// Performance metric as name=value, repeatable
        #[arg(long = "metric", value_parser = parse_assignment)]
        metrics: Vec<(String, f64)>,
    },
    /// Record metrics and mark a case completed
    Complete {
        name: String,
        #[arg(long = "metric", value_parser = parse_assignment)]
        metrics: Vec<(String, f64)>,
    },
    /// Change the status of a case
    Status { name: String, status: CaseStatus },
    Delete { name: String },
    /// Show design parameters of several cases side by side
    Compare { names: Vec<String> },
    /// Range of every design parameter over all cases
    Bounds,
    /// Completed-case count and best cases by emissions, efficiency and peak temperature
    Summary {
        /// First creation date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last creation date to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    Export { name: String, out: PathBuf },
    Import { file: PathBuf },
}

fn parse_assignment(s: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for '{name}': {e}"))?;
    Ok((name.trim().to_string(), value))
}

fn main() {
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process(args) => run_process(args),
        Commands::Info { dir } => run_info(dir),
        Commands::Stats(args) => run_stats(args),
        Commands::ExportTexture(args) => run_export_texture(args),
        Commands::Case(args) => run_case(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run_process(args: ProcessArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => PreprocessConfig::from_json_file(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => PreprocessConfig::default(),
    };
    if let Some(slices) = args.slices {
        config.slice_count = slices;
    }
    if let Some(grid) = args.grid {
        config.grid_size = grid;
    }
    if let Some(tolerance) = args.slice_tolerance {
        config.slice_tolerance = tolerance;
    }
    if let Some(factor) = args.bin_width_factor {
        config.bin_width_factor = factor;
    }

    let cloud = read_point_cloud(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;
    let cache = DiskCache::open(&args.out)
        .with_context(|| format!("open output directory {}", args.out.display()))?;

    let mut converter = PointCloudConverter::new(config, cache)?;
    match converter.load(cloud)? {
        LoadOutcome::AlreadyProcessed => {
            println!("{} is up to date", args.out.display());
        }
        LoadOutcome::Processed(report) => {
            println!("Processing complete:");
            println!(
                "  Slices: {} written, {} below point threshold",
                report.slices_written, report.slices_skipped
            );
            println!("  Profiles: {}", report.profiles_written);
            println!("  Output: {}", args.out.display());
        }
    }
    Ok(())
}

fn run_info(dir: PathBuf) -> Result<()> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let cache = DiskCache::open(&dir)?;
    let Some(metadata) = cache.metadata()? else {
        bail!("{} holds no processed dataset", dir.display());
    };

    let bounds = &metadata.bounds;
    println!("Dataset: {} points", bounds.num_points);
    println!("  Variables: {}", bounds.variables.join(", "));
    for axis in Axis::ALL {
        let (min, max) = bounds.range(axis);
        println!("  {axis}: {min:.4} to {max:.4}");
    }
    println!(
        "  Config: {} slices per plane, {}x{} grid",
        metadata.config.slice_count, metadata.config.grid_size, metadata.config.grid_size
    );

    println!("Artifacts:");
    for key in cache.keys()? {
        println!("  {key} ({})", key.file_name());
    }
    Ok(())
}

fn run_stats(args: StatsArgs) -> Result<()> {
    let cloud = read_point_cloud(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;

    let mut region = BoxFilter::default();
    for (axis, range) in [(Axis::X, &args.x), (Axis::Y, &args.y), (Axis::Z, &args.z)] {
        if let Some([min, max]) = range.as_deref() {
            region = region.with(axis, (*min, *max));
        }
    }

    match RegionStats::compute(&cloud, &args.variable, &region)? {
        Some(stats) => {
            println!("{} over {} points:", args.variable, stats.count);
            println!("  min:  {:.6}", stats.min);
            println!("  max:  {:.6}", stats.max);
            println!("  mean: {:.6}", stats.mean);
            println!("  std:  {:.6}", stats.std_dev);
        }
        None => println!("No points with a value for {} in the region", args.variable),
    }
    Ok(())
}

fn run_export_texture(args: ExportTextureArgs) -> Result<()> {
    let cache = DiskCache::open(&args.dir)?;
    let Some(slice) = cache.slice(args.plane, args.index)? else {
        bail!(
            "no {} slice {} in {}",
            args.plane,
            args.index,
            args.dir.display()
        );
    };
    write_slice_texture(&args.out, &slice, &args.variable)?;
    println!("Saved {}", args.out.display());
    Ok(())
}

fn run_case(args: CaseArgs) -> Result<()> {
    let mut registry = CaseRegistry::open(&args.db)
        .with_context(|| format!("open case registry {}", args.db.display()))?;

    match args.action {
        CaseAction::List => {
            for case in registry.list() {
                println!(
                    "{:<24} {:<10} {}  {}",
                    case.name,
                    case.status,
                    case.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    case.description
                );
            }
        }
        CaseAction::Add {
            name,
            description,
            status,
            params,
            metrics,
        } => {
            let mut new_case = NewCase::new(name).description(description).status(status);
            for (param, value) in params {
                new_case = new_case.parameter(param, value);
            }
            for (metric, value) in metrics {
                new_case = new_case.metric(metric, value);
            }
            let case = registry.create(new_case)?;
            println!("Created case {}", case.name);
        }
        CaseAction::Complete { name, metrics } => {
            let metrics: IndexMap<String, f64> = metrics.into_iter().collect();
            registry.record_metrics(&name, metrics)?;
            println!("Case {name} completed");
        }
        CaseAction::Status { name, status } => {
            registry.update_status(&name, status)?;
            println!("Case {name} is now {status}");
        }
        CaseAction::Delete { name } => {
            if registry.delete(&name)? {
                println!("Deleted case {name}");
            } else {
                println!("No case named {name}");
            }
        }
        CaseAction::Compare { names } => {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            for case in registry.compare(&names) {
                println!("{}:", case.name);
                for (param, value) in &case.design_parameters {
                    let unit = get_design_parameter(param).map_or("", |p| p.unit);
                    println!("  {param}: {value} {unit}");
                }
                if let Some(metrics) = case.metrics() {
                    for (metric, value) in metrics {
                        let unit = get_performance_metric(metric).map_or("", |m| m.unit);
                        println!("  {metric}: {value} {unit}");
                    }
                }
            }
        }
        CaseAction::Bounds => {
            for (param, (min, max)) in registry.parameter_bounds() {
                let unit = get_design_parameter(&param).map_or("", |p| p.unit);
                println!("{param}: {min} to {max} {unit}");
            }
        }
        CaseAction::Summary { from, to } => {
            let range = match (from, to) {
                (None, None) => None,
                (from, to) => Some((start_of_day(from), end_of_day(to))),
            };
            let summary = registry.summary(range);
            println!("Completed cases: {} of {}", summary.completed, summary.total);
            println!("Running cases: {}", summary.running);
            print_best("Lowest NOx", "nox_emissions", summary.lowest_nox.as_ref());
            print_best(
                "Best efficiency",
                "combustion_efficiency",
                summary.highest_efficiency.as_ref(),
            );
            print_best(
                "Lowest peak temperature",
                "temperature_max",
                summary.lowest_peak_temperature.as_ref(),
            );
        }
        CaseAction::Export { name, out } => {
            registry.export_case(&name, &out)?;
            println!("Exported {name} to {}", out.display());
        }
        CaseAction::Import { file } => {
            let name = registry.import_case(&file)?;
            println!("Imported as {name}");
        }
    }
    Ok(())
}

fn start_of_day(date: Option<NaiveDate>) -> DateTime<Utc> {
    date.map_or(DateTime::<Utc>::MIN_UTC, |d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Inclusive end: the last instant of `date`.
fn end_of_day(date: Option<NaiveDate>) -> DateTime<Utc> {
    date.and_then(|d| d.succ_opt())
        .map_or(DateTime::<Utc>::MAX_UTC, |next| {
            next.and_time(NaiveTime::MIN).and_utc() - chrono::TimeDelta::nanoseconds(1)
        })
}

fn print_best(label: &str, metric: &str, best: Option<&BestCase>) {
    let unit = get_performance_metric(metric).map_or("", |m| m.unit);
    match best {
        Some(best) => println!("{label}: {:.1} {unit} ({})", best.value, best.name),
        None => println!("{label}: no data"),
    }
}
