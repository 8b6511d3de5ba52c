//! Loader for the `hst/` time-series directory
//!
//! GKV appends history output under `hst/` as `gkvp.<tag>.<part>` files,
//! restarting into a new part each continuation (`.001`, `.002`, ...).
//! Species-resolved quantities carry the species index before the part
//! number (`gkvp.ges.0.001`). Parts concatenate in ascending filename order.
//!
//! Only the directory itself is mandatory. A missing or unparsable family is
//! logged and skipped; the figures that need it are dropped from the report.

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Tags concatenated across parts, one table per run.
const CONCAT_TAGS: &[&str] = &["dtc", "eng", "men", "wes", "wem"];
/// Tags concatenated across parts, one table per species.
const SPECIES_TAGS: &[&str] = &["ges", "gem", "qes", "qem", "bln"];
/// Tags read from part `001` only.
const SINGLE_PART_TAGS: &[&str] = &["mtr", "mtf"];

/// A rectangular numeric table, row-major.
#[derive(Debug, Clone)]
pub struct TimeSeriesTable {
    ncols: usize,
    data: Vec<f64>,
}

impl TimeSeriesTable {
    /// Parse whitespace-delimited rows; `#` comment lines and blank lines
    /// are skipped, every data row must have the same column count.
    pub fn parse(text: &str) -> Result<Self> {
        let mut ncols = 0;
        let mut data = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let row: Vec<f64> = trimmed
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<f64>()
                        .with_context(|| format!("bad number '{}' on line {}", tok, lineno + 1))
                })
                .collect::<Result<_>>()?;
            if ncols == 0 {
                ncols = row.len();
            } else if row.len() != ncols {
                bail!(
                    "ragged table: line {} has {} columns, expected {}",
                    lineno + 1,
                    row.len(),
                    ncols
                );
            }
            data.extend(row);
        }
        if ncols == 0 {
            bail!("table has no data rows");
        }
        Ok(TimeSeriesTable { ncols, data })
    }

    /// Build a table from row-major values. `data.len()` must be a
    /// multiple of `ncols`.
    pub fn from_flat(ncols: usize, data: Vec<f64>) -> Result<Self> {
        if ncols == 0 || data.len() % ncols != 0 {
            bail!("flat data of length {} does not fill {} columns", data.len(), ncols);
        }
        Ok(TimeSeriesTable { ncols, data })
    }

    pub fn nrows(&self) -> usize {
        self.data.len() / self.ncols
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.ncols + col]
    }

    pub fn col(&self, col: usize) -> Vec<f64> {
        (0..self.nrows()).map(|r| self.value(r, col)).collect()
    }

    /// Column 0, the time axis of every hst table.
    pub fn times(&self) -> Vec<f64> {
        self.col(0)
    }
}

/// All hst tables found for a run, keyed by tag (`"dtc"`, `"ges.0"`, ...).
#[derive(Debug, Default)]
pub struct HstArchive {
    tables: BTreeMap<String, TimeSeriesTable>,
}

impl HstArchive {
    /// Load every conventional file family under `hst_dir`.
    ///
    /// `nprocs` bounds the species index of the per-species families;
    /// `lin_freq` additionally pulls in the `frq`/`dsp` linear diagnostics.
    pub fn load(hst_dir: &Path, nprocs: usize, lin_freq: bool) -> Result<Self> {
        if !hst_dir.is_dir() {
            bail!("hst directory not found: {}", hst_dir.display());
        }
        let names = list_file_names(hst_dir)?;
        let mut archive = HstArchive::default();

        for tag in SINGLE_PART_TAGS {
            let path = hst_dir.join(format!("gkvp.{}.001", tag));
            match std::fs::read_to_string(&path) {
                Ok(text) => archive.insert_parsed(tag, &text),
                Err(_) => log::warn!("hst file gkvp.{}.001 not found, skipping", tag),
            }
        }

        for tag in CONCAT_TAGS {
            match concat_parts(hst_dir, &names, &format!("gkvp.{}.", tag))? {
                Some(text) => archive.insert_parsed(tag, &text),
                None => log::warn!("hst family gkvp.{}.* not found, skipping", tag),
            }
        }

        for tag in SPECIES_TAGS {
            for s in 0..nprocs {
                let key = format!("{}.{}", tag, s);
                match concat_parts(hst_dir, &names, &format!("gkvp.{}.{}.", tag, s))? {
                    Some(text) => archive.insert_parsed(&key, &text),
                    None => log::warn!("hst family gkvp.{}.{}.* not found, skipping", tag, s),
                }
            }
        }

        if lin_freq {
            match concat_parts(hst_dir, &names, "gkvp.frq.")? {
                Some(text) => archive.insert_parsed("frq", &text),
                None => log::warn!("hst family gkvp.frq.* not found, skipping"),
            }
            // Only the final restart's dispersion solve is meaningful.
            match last_nonempty_part(hst_dir, &names, "gkvp.dsp.")? {
                Some(text) => archive.insert_parsed("dsp", &text),
                None => log::warn!("no non-empty gkvp.dsp.* part found, skipping"),
            }
        }

        Ok(archive)
    }

    fn insert_parsed(&mut self, key: &str, text: &str) {
        match TimeSeriesTable::parse(text) {
            Ok(table) => {
                log::debug!("hst table {}: {} x {}", key, table.nrows(), table.ncols());
                self.tables.insert(key.to_string(), table);
            }
            Err(e) => log::warn!("hst table {} unusable, skipping: {:#}", key, e),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, table: TimeSeriesTable) {
        self.tables.insert(key.into(), table);
    }

    pub fn get(&self, key: &str) -> Option<&TimeSeriesTable> {
        self.tables.get(key)
    }

    /// Species-resolved lookup, e.g. `get_species("ges", 0)`.
    pub fn get_species(&self, tag: &str, species: usize) -> Option<&TimeSeriesTable> {
        self.tables.get(&format!("{}.{}", tag, species))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn list_file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list hst directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Concatenate all parts with the given filename prefix, in sorted order.
/// Returns None when no part exists.
fn concat_parts(dir: &Path, names: &[String], prefix: &str) -> Result<Option<String>> {
    let mut text = String::new();
    let mut found = false;
    for name in names.iter().filter(|n| n.starts_with(prefix)) {
        let path = dir.join(name);
        let part = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        text.push_str(&part);
        if !text.ends_with('\n') {
            text.push('\n');
        }
        found = true;
    }
    Ok(if found { Some(text) } else { None })
}

fn last_nonempty_part(dir: &Path, names: &[String], prefix: &str) -> Result<Option<String>> {
    for name in names.iter().filter(|n| n.starts_with(prefix)).rev() {
        let path = dir.join(name);
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if text.split_whitespace().next().is_some() {
            return Ok(Some(text));
        }
    }
    Ok(None)
}
