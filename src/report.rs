//! Report assembly
//!
//! Builds the full document: the text section first (run header, namelist,
//! log parameter echo), then the statically planned figure pages. A figure
//! whose data is unavailable is logged and dropped; the document is still
//! produced as long as at least the text section exists.

use crate::figures;
use crate::history::HstArchive;
use crate::logfile::LogSummary;
use crate::namelist::SimulationConfig;
use crate::pdf::{CoreFont, PageContent, PdfDocument, PAGE_HEIGHT};
use anyhow::{Context, Result};
use chrono::Local;
use std::path::Path;

const MARGIN: f64 = 56.7;
const LEADING: f64 = 11.0;
const BODY_SIZE: f64 = 8.5;
const MAX_BODY_CHARS: usize = 100;

/// The static figure plan. Order is fixed; membership depends only on the
/// run geometry from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FigureSpec {
    ElapsedTime,
    FieldLineMetrics,
    PoloidalMetrics,
    LinearFrequency,
    TimeSeries,
    SpeciesFlux(usize),
    EnergyBalance,
}

impl FigureSpec {
    pub fn name(&self) -> String {
        match self {
            FigureSpec::ElapsedTime => "elapsed_time".to_string(),
            FigureSpec::FieldLineMetrics => "metrics_z".to_string(),
            FigureSpec::PoloidalMetrics => "metrics_theta".to_string(),
            FigureSpec::LinearFrequency => "linear_frequency".to_string(),
            FigureSpec::TimeSeries => "time_series".to_string(),
            FigureSpec::SpeciesFlux(s) => format!("flux.{}", s),
            FigureSpec::EnergyBalance => "energy_balance".to_string(),
        }
    }

    /// Figure order of the report: timing, geometry, linear diagnostics
    /// (when applicable), field time series, one flux page per species,
    /// energy balance.
    pub fn plan(log: &LogSummary) -> Vec<FigureSpec> {
        let mut plan = vec![
            FigureSpec::ElapsedTime,
            FigureSpec::FieldLineMetrics,
            FigureSpec::PoloidalMetrics,
        ];
        if log.is_lin_freq() {
            plan.push(FigureSpec::LinearFrequency);
        }
        plan.push(FigureSpec::TimeSeries);
        for s in 0..log.nprocs {
            plan.push(FigureSpec::SpeciesFlux(s));
        }
        plan.push(FigureSpec::EnergyBalance);
        plan
    }
}

/// Finished document plus the per-figure outcome lists.
pub struct BuildOutcome {
    pub doc: PdfDocument,
    pub rendered: Vec<String>,
    pub skipped: Vec<String>,
}

pub fn build_document(
    run_dir: &Path,
    namelist: &SimulationConfig,
    log: &LogSummary,
    hst: &HstArchive,
) -> Result<BuildOutcome> {
    let mut doc = PdfDocument::new();
    let mut rendered = Vec::new();
    let mut skipped = Vec::new();

    for page in text_section_pages(run_dir, namelist, log) {
        doc.add_page(page);
    }
    rendered.push("text_section".to_string());

    for spec in FigureSpec::plan(log) {
        let mut page = PageContent::new();
        match render_figure(&spec, &mut page, log, hst) {
            Ok(()) => {
                doc.add_page(page);
                rendered.push(spec.name());
            }
            Err(e) => {
                log::warn!("figure {} skipped: {:#}", spec.name(), e);
                skipped.push(spec.name());
            }
        }
    }

    Ok(BuildOutcome {
        doc,
        rendered,
        skipped,
    })
}

fn render_figure(
    spec: &FigureSpec,
    page: &mut PageContent,
    log: &LogSummary,
    hst: &HstArchive,
) -> Result<()> {
    match spec {
        FigureSpec::ElapsedTime => figures::elapsed_time(page, &log.elapsed),
        FigureSpec::FieldLineMetrics => {
            let mtr = hst.get("mtr").context("mtr table not loaded")?;
            figures::metric_panels(
                page,
                mtr,
                "Field-aligned coordinate z",
                &figures::FIELD_LINE_LABELS,
            )
        }
        FigureSpec::PoloidalMetrics => {
            let mtf = hst.get("mtf").context("mtf table not loaded")?;
            figures::metric_panels(page, mtf, "Poloidal angle theta", &figures::POLOIDAL_LABELS)
        }
        FigureSpec::LinearFrequency => {
            let frq = hst.get("frq").context("frq table not loaded")?;
            figures::linear_frequency(page, log.global_ny, frq, hst.get("dsp"))
        }
        FigureSpec::TimeSeries => {
            let dtc = hst.get("dtc").context("dtc table not loaded")?;
            let eng = hst.get("eng").context("eng table not loaded")?;
            // The vector-potential panel only applies to multi-species
            // (electromagnetic) runs, and degrades away when men is absent.
            let men = if log.nprocs > 1 { hst.get("men") } else { None };
            figures::time_series(page, log.global_ny, dtc, eng, men)
        }
        FigureSpec::SpeciesFlux(s) => {
            let ent = hst
                .get_species("ent", *s)
                .with_context(|| format!("entropy table for species {} not available", s))?;
            let ges = hst
                .get_species("ges", *s)
                .with_context(|| format!("ges table for species {} not loaded", s))?;
            let gem = hst
                .get_species("gem", *s)
                .with_context(|| format!("gem table for species {} not loaded", s))?;
            let qes = hst
                .get_species("qes", *s)
                .with_context(|| format!("qes table for species {} not loaded", s))?;
            let qem = hst
                .get_species("qem", *s)
                .with_context(|| format!("qem table for species {} not loaded", s))?;
            figures::species_flux(page, *s, log.global_ny, ent, ges, gem, qes, qem)
        }
        FigureSpec::EnergyBalance => {
            let ents: Vec<(usize, &crate::history::TimeSeriesTable)> = (0..log.nprocs)
                .filter_map(|s| hst.get_species("ent", s).map(|t| (s, t)))
                .collect();
            let wes = hst.get("wes").context("wes table not loaded")?;
            let wem = if log.nprocs > 1 { hst.get("wem") } else { None };
            figures::energy_balance(page, log.global_ny, &ents, wes, wem)
        }
    }
}

// ====== TEXT SECTION ======

enum TextLine {
    Heading(String),
    Section(String),
    Body(String),
    Blank,
}

fn text_section_lines(
    run_dir: &Path,
    namelist: &SimulationConfig,
    log: &LogSummary,
) -> Vec<TextLine> {
    let mut lines = Vec::new();
    lines.push(TextLine::Heading("GKV run summary".to_string()));
    lines.push(TextLine::Body(format!("Run directory : {}", run_dir.display())));
    lines.push(TextLine::Body(format!(
        "Generated     : {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )));
    lines.push(TextLine::Body(format!(
        "Type of calc. : {}   nprocs = {}   global_ny = {}",
        log.calc_type, log.nprocs, log.global_ny
    )));
    let elapsed = log
        .elapsed_seconds
        .map(|v| format!("{:.3}", v))
        .unwrap_or_else(|| "N/A".to_string());
    lines.push(TextLine::Body(format!(
        "Elapsed [sec] : {}   warnings in log: {}",
        elapsed, log.warning_count
    )));
    lines.push(TextLine::Blank);

    for group in &namelist.groups {
        lines.push(TextLine::Section(group.name.clone()));
        for (key, values) in &group.entries {
            let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            lines.push(TextLine::Body(format!(
                "  {} = {}",
                key,
                rendered.join(", ")
            )));
        }
        lines.push(TextLine::Blank);
    }

    lines.push(TextLine::Section("log".to_string()));
    for block in &log.parameter_blocks {
        for line in block {
            lines.push(TextLine::Body(line.trim().to_string()));
        }
        lines.push(TextLine::Blank);
    }
    lines
}

fn text_section_pages(
    run_dir: &Path,
    namelist: &SimulationConfig,
    log: &LogSummary,
) -> Vec<PageContent> {
    let lines = text_section_lines(run_dir, namelist, log);
    let usable = PAGE_HEIGHT - 2.0 * MARGIN;
    let per_page = (usable / LEADING) as usize;

    let mut pages = Vec::new();
    for chunk in lines.chunks(per_page.max(1)) {
        let mut page = PageContent::new();
        let mut y = MARGIN;
        for line in chunk {
            match line {
                TextLine::Heading(text) => {
                    page.text(CoreFont::HelveticaBold, 13.0, MARGIN, y, text);
                }
                TextLine::Section(text) => {
                    page.text(CoreFont::HelveticaBold, 10.0, MARGIN, y, text);
                    let width = CoreFont::HelveticaBold.text_width(10.0, text);
                    page.hline(MARGIN, MARGIN + width, y + 10.5, 0.5);
                }
                TextLine::Body(text) => {
                    page.text(CoreFont::Courier, BODY_SIZE, MARGIN, y, &clip(text));
                }
                TextLine::Blank => {}
            }
            y += LEADING;
        }
        pages.push(page);
    }
    pages
}

fn clip(text: &str) -> String {
    if text.chars().count() <= MAX_BODY_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_BODY_CHARS - 3).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logfile::ElapsedTables;

    fn log(nprocs: usize, calc_type: &str) -> LogSummary {
        LogSummary {
            nprocs,
            global_ny: 2,
            calc_type: calc_type.to_string(),
            elapsed_seconds: Some(10.0),
            warning_count: 0,
            parameter_blocks: vec![vec!["#  nxw, nyw = 8 8".to_string()]],
            elapsed: ElapsedTables::default(),
        }
    }

    #[test]
    fn plan_for_a_nonlinear_two_species_run() {
        let names: Vec<String> = FigureSpec::plan(&log(2, "nonlinear"))
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "elapsed_time",
                "metrics_z",
                "metrics_theta",
                "time_series",
                "flux.0",
                "flux.1",
                "energy_balance"
            ]
        );
    }

    #[test]
    fn lin_freq_runs_add_the_frequency_page() {
        let plan = FigureSpec::plan(&log(1, "lin_freq"));
        assert!(plan.contains(&FigureSpec::LinearFrequency));
    }

    #[test]
    fn text_section_paginates() {
        let namelist = SimulationConfig::parse(
            "&physp nx = 1, ny = 2,\n&end\n&calct calc_type = \"nonlinear\",\n&end\n",
        )
        .unwrap();
        let pages = text_section_pages(Path::new("/tmp/run"), &namelist, &log(1, "nonlinear"));
        assert_eq!(pages.len(), 1);
        assert!(!pages[0].is_empty());
    }

    #[test]
    fn missing_tables_skip_figures_but_keep_the_text_section() {
        let namelist = SimulationConfig::parse("&physp nx = 1,\n&end\n").unwrap();
        let hst = HstArchive::default();
        let outcome =
            build_document(Path::new("/tmp/run"), &namelist, &log(1, "nonlinear"), &hst).unwrap();
        assert_eq!(outcome.rendered, vec!["text_section"]);
        assert_eq!(outcome.skipped.len(), 6);
        assert_eq!(outcome.doc.n_pages(), 1);
    }

    #[test]
    fn long_body_lines_are_clipped() {
        let long = "x".repeat(300);
        assert_eq!(clip(&long).chars().count(), MAX_BODY_CHARS);
    }
}
