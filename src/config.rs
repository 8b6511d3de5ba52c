//! Run configuration and input-path contract

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Relative locations of the required inputs inside a GKV output directory.
pub const NAMELIST_FILE: &str = "gkvp_namelist.001";
pub const LOG_FILE: &str = "log/gkvp.000000.0.log.001";
pub const HST_DIR: &str = "hst";

/// Everything the report stage needs to know up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// GKV output directory to summarise.
    pub run_dir: PathBuf,
    /// Where the timestamped output directory is created. Defaults to the
    /// current working directory.
    pub output_root: Option<PathBuf>,
    /// Use the uniform-grid stencil for the entropy-balance derivatives
    /// instead of the non-uniform default.
    pub uniform_time_grid: bool,
}

impl ReportConfig {
    pub fn new(run_dir: impl Into<PathBuf>) -> Self {
        ReportConfig {
            run_dir: run_dir.into(),
            output_root: None,
            uniform_time_grid: false,
        }
    }

    pub fn namelist_path(&self) -> PathBuf {
        self.run_dir.join(NAMELIST_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.run_dir.join(LOG_FILE)
    }

    pub fn hst_dir(&self) -> PathBuf {
        self.run_dir.join(HST_DIR)
    }

    pub fn output_root(&self) -> &Path {
        self.output_root.as_deref().unwrap_or_else(|| Path::new("."))
    }
}
