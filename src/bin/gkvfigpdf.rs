//! gkvfigpdf CLI
//!
//! ```text
//! gkvfigpdf run --dir <GKV_OUTPUT_DIR> [--out <DIR>] [--uniform-dt]
//! gkvfigpdf version
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use gkvfigpdf::config::ReportConfig;
use gkvfigpdf::pipeline::ReportStage;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gkvfigpdf",
    about = "Generate a figure-summary PDF from GKV simulation output",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the summary PDF for one run directory
    Run(RunArgs),
    /// Show version information
    Version,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// GKV output directory (contains gkvp_namelist.001, log/, hst/)
    #[arg(long, short = 'd')]
    dir: PathBuf,

    /// Directory in which the timestamped output directory is created
    /// (defaults to the current working directory)
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,

    /// Use the uniform-grid stencil for the entropy-balance derivatives
    #[arg(long)]
    uniform_dt: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_report(args),
        Commands::Version => {
            show_version();
            Ok(())
        }
    }
}

fn run_report(args: RunArgs) -> Result<()> {
    let config = ReportConfig {
        run_dir: args.dir,
        output_root: args.out,
        uniform_time_grid: args.uniform_dt,
    };
    let stage = ReportStage::new(config)?;
    let result = stage.run()?;
    println!("{}", result.pdf_path.display());
    Ok(())
}

fn show_version() {
    println!("gkvfigpdf {}", gkvfigpdf::VERSION);
}
