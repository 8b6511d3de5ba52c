//! Run-log reader for `log/gkvp.000000.0.log.001`
//!
//! The GKV master-rank log carries three things the report needs: the run
//! geometry (`nprocs`, `global_ny`, calculation type), the parameter echo
//! printed at startup, and the elapsed-time accounting printed at the end of
//! the run. The elapsed-time tables live at fixed line positions inside the
//! final 80 lines of the log, at three levels of detail.

use anyhow::{bail, Context, Result};
use std::path::Path;

/// How many trailing log lines the elapsed-time tables occupy.
const TAIL_LINES: usize = 80;

/// 1-based inclusive line ranges inside the log tail, per detail level.
const COARSE_RANGES: &[(usize, usize)] = &[(3, 14)];
const MEDIUM_RANGES: &[(usize, usize)] = &[(6, 7), (18, 35), (72, 79), (14, 14)];
const FINE_RANGES: &[(usize, usize)] = &[
    (6, 7),
    (18, 20),
    (39, 47),
    (22, 24),
    (48, 59),
    (29, 29),
    (60, 62),
    (31, 31),
    (63, 65),
    (33, 34),
    (66, 68),
    (72, 79),
    (14, 14),
];

/// Parameter-echo patterns for the report text pages, grouped into blocks.
/// A trailing '=' means the name must be followed by an assignment; plain
/// patterns match as substrings.
const PATTERN_BLOCKS: &[&[&str]] = &[
    &[
        "nxw, nyw =",
        "global_ny =",
        "global_nz =",
        "global_nv, global_nm =",
        "nx, ny, nz =",
        "nv, nm =",
        "nzb, nvb =",
        "number of species =",
        "nproc",
    ],
    &["q_0 =", "s_hat =", "eps_r =", "s_input, s_0 =", "nss, ntheta ="],
    &[
        "lx, ly, lz =",
        "lz, z0 =",
        "lz_l, z0_l =",
        "kxmin, kymin =",
        "kxmax, kymax =",
        "kperp_max =",
        "m_j, del_c =",
        "dz =",
        "dv, vmax =",
        "dm, mmax =",
    ],
    &[
        "time_advnc =",
        "flag_time_adv =",
        "courant num",
        "dt_perp =",
        "dt_zz =",
        "dt_vl =",
        "dt_col =",
        "dt_linear =",
        "dt_max =",
        "dt =",
    ],
    &["a, b, nu"],
];

/// One labelled timing from the elapsed-time tables.
#[derive(Debug, Clone)]
pub struct ElapsedEntry {
    pub label: String,
    pub seconds: f64,
}

/// The three elapsed-time tables, coarse to fine.
#[derive(Debug, Clone, Default)]
pub struct ElapsedTables {
    pub coarse: Vec<ElapsedEntry>,
    pub medium: Vec<ElapsedEntry>,
    pub fine: Vec<ElapsedEntry>,
}

/// Everything the report extracts from the run log.
#[derive(Debug, Clone)]
pub struct LogSummary {
    /// Number of particle species (one flux page each).
    pub nprocs: usize,
    /// Largest poloidal mode number; per-mode series count is `global_ny + 1`.
    pub global_ny: usize,
    /// Calculation type, e.g. "nonlinear" or "lin_freq".
    pub calc_type: String,
    /// Total elapsed seconds, when the run printed it.
    pub elapsed_seconds: Option<f64>,
    /// Number of warning lines in the log.
    pub warning_count: usize,
    /// Parameter-echo lines grouped into display blocks.
    pub parameter_blocks: Vec<Vec<String>>,
    pub elapsed: ElapsedTables,
}

impl LogSummary {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read run log {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse run log {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();

        let nprocs = lines
            .iter()
            .find(|l| l.contains("nprocs") && l.contains("rank"))
            .and_then(|l| int_after_equals(l));
        let nprocs = match nprocs {
            Some(v) if v > 0 => v as usize,
            _ => bail!("run log does not report nprocs ('# nprocs, rank = ...')"),
        };

        let global_ny = lines
            .iter()
            .find(|l| l.contains("global_ny"))
            .and_then(|l| int_after_equals(l))
            .context("run log does not report global_ny")?;
        if global_ny < 0 {
            bail!("run log reports a negative global_ny ({})", global_ny);
        }

        let calc_type = lines
            .iter()
            .find(|l| l.contains("Type of calc"))
            .and_then(|l| word_after_separator(l))
            .context("run log does not report the calculation type")?;

        let elapsed_seconds = lines
            .iter()
            .find(|l| l.contains("elapsed time") && l.contains('='))
            .and_then(|l| f64_after_equals(l));

        let warning_count = lines
            .iter()
            .filter(|l| l.to_ascii_lowercase().contains("warning"))
            .count();

        let parameter_blocks = extract_parameter_blocks(&lines);
        let elapsed = extract_elapsed_tables(&lines);

        Ok(LogSummary {
            nprocs,
            global_ny: global_ny as usize,
            calc_type,
            elapsed_seconds,
            warning_count,
            parameter_blocks,
            elapsed,
        })
    }

    /// True when the run was a linear growth-rate scan.
    pub fn is_lin_freq(&self) -> bool {
        self.calc_type == "lin_freq"
    }
}

fn int_after_equals(line: &str) -> Option<i64> {
    line.split('=')
        .nth(1)?
        .split_whitespace()
        .next()?
        .trim_end_matches(',')
        .parse()
        .ok()
}

fn f64_after_equals(line: &str) -> Option<f64> {
    line.split('=')
        .nth(1)?
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

/// First word after ':' (or '=' as a fallback).
fn word_after_separator(line: &str) -> Option<String> {
    let idx = line.find(':').or_else(|| line.find('='))?;
    line[idx + 1..]
        .split_whitespace()
        .next()
        .map(|w| w.to_string())
}

/// Collapse whitespace runs so the fixed-width log columns compare cleanly.
fn normalize(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_parameter_blocks(lines: &[&str]) -> Vec<Vec<String>> {
    let normalized: Vec<String> = lines.iter().map(|l| normalize(l)).collect();
    let mut blocks = Vec::new();
    for patterns in PATTERN_BLOCKS {
        let mut block = Vec::new();
        for pattern in *patterns {
            if let Some(idx) = normalized.iter().position(|l| l.contains(pattern)) {
                block.push(lines[idx].trim_end().to_string());
            }
        }
        if !block.is_empty() {
            blocks.push(block);
        }
    }
    blocks
}

fn extract_elapsed_tables(lines: &[&str]) -> ElapsedTables {
    let start = lines.len().saturating_sub(TAIL_LINES);
    let tail = &lines[start..];
    ElapsedTables {
        coarse: select_entries(tail, COARSE_RANGES),
        medium: select_entries(tail, MEDIUM_RANGES),
        fine: select_entries(tail, FINE_RANGES),
    }
}

fn select_entries(tail: &[&str], ranges: &[(usize, usize)]) -> Vec<ElapsedEntry> {
    let mut entries = Vec::new();
    for &(first, last) in ranges {
        for lineno in first..=last {
            let Some(line) = tail.get(lineno - 1) else {
                continue;
            };
            if let Some(entry) = parse_timing_line(line) {
                entries.push(entry);
            }
        }
    }
    entries
}

/// Parse a `#  label = seconds ...` timing line; anything else yields None.
fn parse_timing_line(line: &str) -> Option<ElapsedEntry> {
    let (left, right) = line.split_once('=')?;
    let seconds: f64 = right.split_whitespace().next()?.parse().ok()?;
    let label = normalize(left.trim_start_matches('#'));
    if label.is_empty() {
        return None;
    }
    Some(ElapsedEntry { label, seconds })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log() -> String {
        let mut lines = vec![
            "# GKV-plus start".to_string(),
            "# nprocs, rank = 2 0".to_string(),
            "#  nxw, nyw =     8     8".to_string(),
            "#  global_ny =     3".to_string(),
            "#  lx, ly, lz =   10.0  10.0   3.14".to_string(),
            "#  dt_max =   0.005".to_string(),
            "#  dt     =   0.001".to_string(),
            "# Type of calc. : nonlinear".to_string(),
            "WARNING: something minor".to_string(),
        ];
        // Pad so the timing table lands inside the final 80 lines.
        for step in 0..60 {
            lines.push(format!("# step {:>6} ok", step));
        }
        let mut tail: Vec<String> = (1..=80)
            .map(|i| format!("#   section_{:02}  =  {:.3}  ( 0.0)", i, i as f64 * 0.5))
            .collect();
        tail[0] = "####### elapsed time [sec] = 123.5".to_string();
        lines.extend(tail);
        lines.join("\n")
    }

    #[test]
    fn extracts_run_geometry() {
        let summary = LogSummary::parse(&sample_log()).unwrap();
        assert_eq!(summary.nprocs, 2);
        assert_eq!(summary.global_ny, 3);
        assert_eq!(summary.calc_type, "nonlinear");
        assert!(!summary.is_lin_freq());
        assert_eq!(summary.elapsed_seconds, Some(123.5));
        assert_eq!(summary.warning_count, 1);
    }

    #[test]
    fn coarse_table_covers_tail_lines_3_to_14() {
        let summary = LogSummary::parse(&sample_log()).unwrap();
        assert_eq!(summary.elapsed.coarse.len(), 12);
        assert_eq!(summary.elapsed.coarse[0].label, "section_03");
        assert!((summary.elapsed.coarse[0].seconds - 1.5).abs() < 1e-12);
        assert_eq!(summary.elapsed.coarse[11].label, "section_14");
    }

    #[test]
    fn parameter_blocks_match_by_pattern() {
        let summary = LogSummary::parse(&sample_log()).unwrap();
        let flat: Vec<&String> = summary.parameter_blocks.iter().flatten().collect();
        assert!(flat.iter().any(|l| l.contains("nxw, nyw")));
        assert!(flat.iter().any(|l| l.contains("lx, ly, lz")));
        // 'dt =' must not match the 'dt_max =' line.
        let dt_lines: Vec<&&String> = flat.iter().filter(|l| l.contains("dt")).collect();
        assert_eq!(dt_lines.len(), 2);
    }

    #[test]
    fn missing_nprocs_is_fatal() {
        let err = LogSummary::parse("# Type of calc. : nonlinear\n# global_ny = 3\n");
        assert!(err.is_err());
    }

    #[test]
    fn short_logs_yield_partial_timing_tables() {
        let text = "# nprocs, rank = 1 0\n# global_ny = 1\n# Type of calc. : nonlinear\n";
        let summary = LogSummary::parse(text).unwrap();
        assert!(summary.elapsed.coarse.is_empty());
    }
}
