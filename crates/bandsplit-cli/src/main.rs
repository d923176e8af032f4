//! bandsplit CLI: split, merge and measure images.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::error::Error as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bandsplit::{
    BackgroundPolicy, CutPlan, OutputFormat, PersistenceGuard, SplitConfig, SplitReport, Splitter,
    DEFAULT_SCAN_WIDER_FACTOR,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "bandsplit")]
#[command(about = "Split long images into pieces along uniform background bands")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split an image into slices written next to it as <stem>.<k><ext>.
    Split(CliSplitArgs),

    /// Stack images top to bottom into one output image.
    Merge {
        /// Output image; its extension selects the format.
        output: PathBuf,
        /// Input images, in top-to-bottom order.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Print the width and height of an image.
    Size {
        /// Path to the image.
        image: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct CliSplitArgs {
    /// Path to the input image.
    image: PathBuf,

    /// Number of slices to produce (at least 2).
    #[arg(short = 'n', long = "units")]
    units: u32,

    /// Band thickness in pixels [default: 20].
    #[arg(short = 'b', long = "band")]
    band: Option<u32>,

    /// Pixels ignored at both ends of every scanned line [default: 0].
    #[arg(short = 'm', long)]
    margin: Option<u32>,

    /// Background: white, black, blackorwhite, dominant, fuzzy, auto or #RRGGBB
    /// [default: auto (corner sample)].
    #[arg(short = 'c', long = "color", value_parser = parse_policy)]
    color: Option<BackgroundPolicy>,

    /// Fraction of mismatching pixels tolerated per line [default: 0.05].
    #[arg(short = 't', long)]
    diff_threshold: Option<f64>,

    /// Refuse images whose cut axis is not longer than this [default: 0].
    #[arg(short = 's', long)]
    size_threshold: Option<u32>,

    /// Per-channel color tolerance [default: 1].
    #[arg(short = 'a', long)]
    tolerance: Option<u32>,

    /// Cut with vertical lines even when the image is taller than wide.
    #[arg(short = 'v', long)]
    split_vertically: bool,

    /// Start searching for each band earlier than the nominal unit edge.
    #[arg(short = 'w', long)]
    scan_wider: bool,

    /// Merge a final slice narrower than half a unit into the previous one.
    #[arg(long)]
    merge_thin_tail: bool,

    /// Drop a final slice whose pixel standard deviation is below this value.
    #[arg(long)]
    blank_stddev: Option<f64>,

    /// Encode slices in this format instead of the input's.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// JSON configuration file; flags given on the command line override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON report (the cut plan when combined with --dry-run).
    #[arg(long)]
    report: Option<PathBuf>,

    /// Compute and print the cut plan without writing slices.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Jpeg,
    Png,
    Webp,
    Bmp,
    Tiff,
}

impl FormatArg {
    fn to_core(self) -> OutputFormat {
        match self {
            Self::Jpeg => OutputFormat::Jpeg,
            Self::Png => OutputFormat::Png,
            Self::Webp => OutputFormat::WebP,
            Self::Bmp => OutputFormat::Bmp,
            Self::Tiff => OutputFormat::Tiff,
        }
    }
}

fn parse_policy(token: &str) -> Result<BackgroundPolicy, String> {
    token.parse().map_err(|e: bandsplit::SplitError| e.to_string())
}

impl CliSplitArgs {
    /// Defaults, then the JSON file, then explicit flags.
    fn to_config(&self) -> CliResult<SplitConfig> {
        let mut cfg = match &self.config {
            Some(path) => SplitConfig::from_json_file(path)?,
            None => SplitConfig::default(),
        };

        cfg.units = self.units;
        if let Some(band) = self.band {
            cfg.scan.band_thickness = band;
        }
        if let Some(margin) = self.margin {
            cfg.scan.margin = margin;
        }
        if let Some(policy) = self.color {
            cfg.background = policy;
        }
        if let Some(t) = self.diff_threshold {
            cfg.scan.diff_threshold = t;
        }
        if let Some(s) = self.size_threshold {
            cfg.size_threshold = s;
        }
        if let Some(a) = self.tolerance {
            cfg.scan.color_tolerance = a;
        }
        if self.split_vertically {
            cfg.split_vertically = true;
        }
        if self.scan_wider {
            cfg.scan.scan_wider_factor = Some(DEFAULT_SCAN_WIDER_FACTOR);
        }
        if self.merge_thin_tail {
            cfg.tail.merge_thin = true;
        }
        if let Some(stddev) = self.blank_stddev {
            cfg.tail.blank_stddev_threshold = Some(stddev);
        }
        if let Some(format) = self.format {
            cfg.output_format = Some(format.to_core());
        }
        Ok(cfg)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Split(args) => run_split(&args),
        Commands::Merge { output, inputs } => run_merge(&output, &inputs),
        Commands::Size { image } => run_size(&image),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

// ── split ──────────────────────────────────────────────────────────────

fn run_split(args: &CliSplitArgs) -> CliResult<()> {
    let config = args.to_config()?;
    tracing::debug!(?config, "effective configuration");
    let splitter = Splitter::with_config(config)?;

    if args.dry_run {
        let plan = splitter.plan_file(&args.image)?;
        print_plan(&plan);
        if let Some(path) = &args.report {
            write_json(path, &plan)?;
        }
        return Ok(());
    }

    let report = splitter.split_file(&args.image)?;
    print_report(&report);
    if let Some(path) = &args.report {
        write_json(path, &report)?;
    }
    Ok(())
}

fn print_plan(plan: &CutPlan) {
    println!(
        "{}x{} {} unit={} reference={}",
        plan.width, plan.height, plan.orientation, plan.unit_size, plan.reference
    );
    for (k, span) in plan.spans.iter().enumerate() {
        println!(
            "{:>3}  [{:>6}, {:>6})  {:?}",
            k + 1,
            span.start,
            span.end,
            span.source
        );
    }
}

fn print_report(report: &SplitReport) {
    for slice in &report.slices {
        println!("{}", slice.path.display());
    }
    tracing::info!(
        "Wrote {} slice(s) from {}",
        report.slices.len(),
        report.input.display()
    );
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, &json)
        .map_err(|e| -> CliError { format!("failed to write {}: {}", path.display(), e).into() })?;
    tracing::info!("Report written to {}", path.display());
    Ok(())
}

// ── merge ──────────────────────────────────────────────────────────────

fn run_merge(output: &Path, inputs: &[PathBuf]) -> CliResult<()> {
    let saved = bandsplit::merge_files(inputs, output, &PersistenceGuard::default())?;
    println!("{} {} {}", saved.path.display(), saved.width, saved.height);
    Ok(())
}

// ── size ───────────────────────────────────────────────────────────────

fn run_size(image: &Path) -> CliResult<()> {
    let (w, h) = bandsplit::image_size(image)?;
    println!("{} {}", w, h);
    Ok(())
}
