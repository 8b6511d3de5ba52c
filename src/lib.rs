//! gkvfigpdf - figure-summary PDF generator for GKV simulation output
//!
//! Turns the ASCII output of a GKV gyrokinetic simulation run (Fortran
//! namelist, run log, `hst/` history directory) into a single multi-page
//! PDF of diagnostic plots plus a `summary.json` run manifest.
//!
//! # Pipeline
//!
//! 1. Parse `gkvp_namelist.001` ([`namelist`])
//! 2. Parse `log/gkvp.000000.0.log.001` ([`logfile`])
//! 3. Load and concatenate the `hst/` file families ([`history`])
//! 4. Derive the per-species entropy balance ([`entropy`])
//! 5. Render the text section and figure pages ([`report`], [`figures`])
//! 6. Assemble one PDF through the in-crate writer ([`pdf`])
//!
//! The orchestration lives in [`pipeline::ReportStage`]:
//!
//! ```no_run
//! use gkvfigpdf::config::ReportConfig;
//! use gkvfigpdf::pipeline::ReportStage;
//!
//! # fn main() -> anyhow::Result<()> {
//! let stage = ReportStage::new(ReportConfig::new("/data/gkv_run"))?;
//! let result = stage.run()?;
//! println!("{}", result.pdf_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! Missing run directory, namelist, log or `hst/` directory is fatal;
//! anything below that degrades to a warning and a dropped figure page.

pub mod config;
pub mod entropy;
pub mod figures;
pub mod history;
pub mod logfile;
pub mod namelist;
pub mod pdf;
pub mod pipeline;
pub mod report;

/// Crate version, surfaced in the CLI and the run manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use config::ReportConfig;
pub use pipeline::{ReportResult, ReportStage};
