//! visfile: render the disk usage of a directory as a treemap or pie chart.
//!
//! Thin binary entry point. All logic lives in the `visfile-core` and
//! `visfile-render` crates.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use visfile_core::layout::ChartKind;
use visfile_core::model::{format_count, format_size};
use visfile_render::sink::PngSink;
use visfile_render::{Config, ErrorKind};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Render the disk usage of a directory as a squarified treemap or pie chart PNG."
)]
struct Args {
    /// Directory to scan.
    directory: PathBuf,

    /// Output PNG path.
    #[arg(default_value = "treemap.png")]
    output: PathBuf,

    /// Chart type.
    #[arg(short = 't', long = "type", value_enum, default_value_t = ChartArg::Treemap)]
    chart: ChartArg,

    /// Image width in pixels (overrides the config file).
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels (overrides the config file).
    #[arg(long)]
    height: Option<u32>,

    /// Deepest treemap level to subdivide.
    #[arg(long)]
    max_depth: Option<usize>,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the scanned tree as JSON on stdout.
    #[arg(long)]
    dump_json: bool,

    /// Scanner threads (0 = one per CPU).
    #[arg(long)]
    workers: Option<usize>,

    /// Measure symlinks themselves instead of their targets.
    #[arg(long)]
    no_follow_symlinks: bool,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ChartArg {
    Treemap,
    Pie,
}

impl From<ChartArg> for ChartKind {
    fn from(arg: ChartArg) -> Self {
        match arg {
            ChartArg::Treemap => ChartKind::Treemap,
            ChartArg::Pie => ChartKind::Pie,
        }
    }
}

/// A failed run and the exit code it maps to.
struct Failure {
    code: u8,
    error: anyhow::Error,
}

impl Failure {
    const USAGE: u8 = 1;
    const SCAN: u8 = 2;
    const RENDER: u8 = 3;
    const WRITE: u8 = 4;

    fn usage(error: anyhow::Error) -> Self {
        Self {
            code: Self::USAGE,
            error,
        }
    }
}

impl From<visfile_render::Error> for Failure {
    fn from(err: visfile_render::Error) -> Self {
        let code = match err.kind() {
            ErrorKind::Scan => Self::SCAN,
            ErrorKind::Layout | ErrorKind::Render => Self::RENDER,
            ErrorKind::Sink => Self::WRITE,
        };
        Self {
            code,
            error: err.into(),
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(Failure::USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Logs go to stderr so `--dump-json` output stays clean.
    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            eprintln!("error: {:#}", failure.error);
            ExitCode::from(failure.code)
        }
    }
}

fn run(args: &Args) -> Result<(), Failure> {
    let config = build_config(args).map_err(Failure::usage)?;

    if !args.directory.exists() {
        return Err(Failure::usage(anyhow::anyhow!(
            "directory does not exist: {}",
            args.directory.display()
        )));
    }
    if !args.directory.is_dir() {
        return Err(Failure::usage(anyhow::anyhow!(
            "not a directory: {}",
            args.directory.display()
        )));
    }

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create output directory {}", parent.display()))
            .map_err(|error| Failure {
                code: Failure::WRITE,
                error,
            })?;
    }

    let kind = ChartKind::from(args.chart);
    tracing::info!("visfile {} starting: {kind} of {}", env!("CARGO_PKG_VERSION"), args.directory.display());

    let tree =
        visfile_render::scan_and_render_with(&args.directory, &args.output, kind, &config, &PngSink)?;

    if args.dump_json {
        let json = serde_json::to_string_pretty(&tree)
            .context("cannot serialize tree")
            .map_err(Failure::usage)?;
        println!("{json}");
    }

    let warnings = tree.all_warnings().count();
    eprintln!(
        "{} written: {} in {} files{}",
        args.output.display(),
        format_size(tree.total_size),
        format_count(tree.file_count),
        if warnings > 0 {
            format!(" ({warnings} paths skipped)")
        } else {
            String::new()
        }
    );
    Ok(())
}

/// Config file (or defaults) with command-line overrides applied.
fn build_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    if let Some(depth) = args.max_depth {
        config.layout.treemap.max_depth = Some(depth);
    }
    if let Some(workers) = args.workers {
        config.scan.workers = workers;
    }
    if args.no_follow_symlinks {
        config.scan.follow_symlinks = false;
    }
    Ok(config)
}
