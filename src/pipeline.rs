//! Report Stage - one-shot batch orchestrator
//!
//! ```text
//! GKV output directory
//!     │
//! ┌───┴───────────────────────────────────────────────┐
//! │  ReportStage (this module)                        │
//! │    ├─ 1. Parse gkvp_namelist.001                  │
//! │    ├─ 2. Parse log/gkvp.000000.0.log.001          │
//! │    ├─ 3. Load hst/ tables, derive entropy balance │
//! │    ├─ 4. Render text section + figure pages       │
//! │    └─ 5. Write fig_stdout.pdf + summary.json      │
//! └───────────────────────────────────────────────────┘
//!     │
//!     ▼ figpdf_YYYYMMDD_HHMMSS/
//!       ├── fig_stdout.pdf
//!       └── summary.json
//! ```
//!
//! Every invocation writes into a fresh timestamped directory; a collision
//! within one second gets a numeric suffix instead of reusing the path.

use crate::config::ReportConfig;
use crate::entropy::entropy_balance;
use crate::history::HstArchive;
use crate::logfile::LogSummary;
use crate::namelist::SimulationConfig;
use crate::report::build_document;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const PDF_FILE_NAME: &str = "fig_stdout.pdf";
pub const SUMMARY_FILE_NAME: &str = "summary.json";

/// Machine-readable run manifest written next to the PDF.
#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryJson {
    /// Crate version that produced the report.
    pub version: String,
    /// Generation timestamp, RFC 3339.
    pub generated: String,
    /// Input GKV output directory.
    pub run_dir: String,
    /// Calculation type from the run log.
    pub calc_type: String,
    /// Species count from the run log.
    pub nprocs: usize,
    /// Largest poloidal mode number from the run log.
    pub global_ny: usize,
    /// Figure pages present in the PDF, in order.
    pub figures_rendered: Vec<String>,
    /// Planned figures dropped for lack of data.
    pub figures_skipped: Vec<String>,
    /// Total page count of the PDF.
    pub n_pages: usize,
    /// Path of the generated PDF.
    pub pdf_path: String,
}

/// What a completed run hands back to the caller.
#[derive(Debug)]
pub struct ReportResult {
    pub output_dir: PathBuf,
    pub pdf_path: PathBuf,
    pub n_pages: usize,
    pub figures_rendered: Vec<String>,
    pub figures_skipped: Vec<String>,
}

#[derive(Debug)]
pub struct ReportStage {
    config: ReportConfig,
}

impl ReportStage {
    /// Validate the input contract. All four paths are fatal when missing;
    /// everything below them degrades per figure.
    pub fn new(config: ReportConfig) -> Result<Self> {
        if !config.run_dir.is_dir() {
            bail!("GKV output directory not found: {}", config.run_dir.display());
        }
        if !config.namelist_path().is_file() {
            bail!("Namelist not found: {}", config.namelist_path().display());
        }
        if !config.log_path().is_file() {
            bail!("Run log not found: {}", config.log_path().display());
        }
        if !config.hst_dir().is_dir() {
            bail!("hst directory not found: {}", config.hst_dir().display());
        }
        Ok(ReportStage { config })
    }

    pub fn run(&self) -> Result<ReportResult> {
        log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        log::info!("GKV figure summary: {}", self.config.run_dir.display());
        log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        log::info!("[1/5] Parsing namelist");
        let namelist = SimulationConfig::load(&self.config.namelist_path())?;
        log::info!("      {} groups", namelist.groups.len());

        log::info!("[2/5] Parsing run log");
        let summary = LogSummary::load(&self.config.log_path())?;
        log::info!(
            "      calc_type={} nprocs={} global_ny={}",
            summary.calc_type,
            summary.nprocs,
            summary.global_ny
        );

        log::info!("[3/5] Loading hst tables");
        let mut hst = HstArchive::load(
            &self.config.hst_dir(),
            summary.nprocs,
            summary.is_lin_freq(),
        )?;
        let mut balances = Vec::new();
        for s in 0..summary.nprocs {
            if let Some(bln) = hst.get_species("bln", s) {
                match entropy_balance(bln, !self.config.uniform_time_grid) {
                    Ok(table) => balances.push((s, table)),
                    Err(e) => {
                        log::warn!("entropy balance for species {} unavailable: {:#}", s, e)
                    }
                }
            }
        }
        for (s, table) in balances {
            hst.insert(format!("ent.{}", s), table);
        }
        log::info!("      {} tables", hst.len());

        log::info!("[4/5] Rendering figures");
        let outcome = build_document(&self.config.run_dir, &namelist, &summary, &hst)?;
        log::info!(
            "      {} pages, {} figures skipped",
            outcome.doc.n_pages(),
            outcome.skipped.len()
        );

        log::info!("[5/5] Writing output");
        let output_dir = create_output_dir(self.config.output_root())?;
        let pdf_path = output_dir.join(PDF_FILE_NAME);
        outcome.doc.save(&pdf_path)?;

        let manifest = SummaryJson {
            version: crate::VERSION.to_string(),
            generated: chrono::Local::now().to_rfc3339(),
            run_dir: self.config.run_dir.display().to_string(),
            calc_type: summary.calc_type.clone(),
            nprocs: summary.nprocs,
            global_ny: summary.global_ny,
            figures_rendered: outcome.rendered.clone(),
            figures_skipped: outcome.skipped.clone(),
            n_pages: outcome.doc.n_pages(),
            pdf_path: pdf_path.display().to_string(),
        };
        let manifest_path = output_dir.join(SUMMARY_FILE_NAME);
        let json = serde_json::to_string_pretty(&manifest)?;
        fs::write(&manifest_path, json)
            .with_context(|| format!("failed to write {}", manifest_path.display()))?;

        log::info!("Report complete: {}", pdf_path.display());
        Ok(ReportResult {
            output_dir,
            pdf_path,
            n_pages: outcome.doc.n_pages(),
            figures_rendered: outcome.rendered,
            figures_skipped: outcome.skipped,
        })
    }
}

/// `figpdf_YYYYMMDD_HHMMSS` under `root`, with a `_2`, `_3`, ... suffix when
/// a same-second run already claimed the name.
fn create_output_dir(root: &Path) -> Result<PathBuf> {
    let stamp = chrono::Local::now().format("figpdf_%Y%m%d_%H%M%S").to_string();
    let mut dir = root.join(&stamp);
    let mut attempt = 1;
    while dir.exists() {
        attempt += 1;
        dir = root.join(format!("{}_{}", stamp, attempt));
    }
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    Ok(dir)
}
