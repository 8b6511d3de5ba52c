//! End-to-end run against a synthetic GKV output directory.

use gkvfigpdf::config::ReportConfig;
use gkvfigpdf::history::HstArchive;
use gkvfigpdf::namelist::SimulationConfig;
use gkvfigpdf::pipeline::ReportStage;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const GLOBAL_NY: usize = 2;
const NROWS: usize = 8;

fn write(path: &Path, text: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

fn table_text(ncols: usize, nrows: usize, t_offset: f64) -> String {
    let mut text = String::new();
    for r in 0..nrows {
        let row: Vec<String> = (0..ncols)
            .map(|c| {
                if c == 0 {
                    format!("{:.4}", t_offset + r as f64 * 0.5)
                } else {
                    format!("{:.6e}", 0.1 + 0.01 * (r + c) as f64)
                }
            })
            .collect();
        text.push_str(&row.join("  "));
        text.push('\n');
    }
    text
}

fn metric_text() -> String {
    let mut text = String::new();
    for r in 0..9 {
        let z = -3.0 + r as f64 * 0.75;
        let row: Vec<String> = std::iter::once(format!("{:.4}", z))
            .chain((1..13).map(|c| format!("{:.6e}", 1.0 + 0.1 * (r + c) as f64)))
            .collect();
        text.push_str(&row.join("  "));
        text.push('\n');
    }
    text
}

fn log_text() -> String {
    let mut lines = vec![
        "# GKV-plus nonlinear run".to_string(),
        "# nprocs, rank = 1 0".to_string(),
        "#  nxw, nyw =     8     8".to_string(),
        "#  global_ny =     2".to_string(),
        "#  lx, ly, lz =   10.0  10.0   3.14".to_string(),
        "#  kxmin, kymin =   0.1   0.1".to_string(),
        "#  dt_max =   0.005".to_string(),
        "# Type of calc. : nonlinear".to_string(),
    ];
    for step in 0..40 {
        lines.push(format!("# step {:>6} ok", step));
    }
    let mut tail: Vec<String> = (1..=80)
        .map(|i| format!("#   section_{:02}  =  {:.3}  ( 0.0)", i, i as f64 * 0.25))
        .collect();
    tail[0] = "####### elapsed time [sec] =   42.125".to_string();
    lines.extend(tail);
    lines.join("\n")
}

const NAMELIST: &str = r#"&cmemo memo = "integration fixture", &end
&calct calc_type = "nonlinear",
       lin_freq = .false.,
&end
&physp nx = 7, global_ny = 2,
       R0_Ln = 2.5d0, 2.5d0,
&end
"#;

/// Lay down a complete single-species nonlinear run.
fn write_fixture(run_dir: &Path) {
    write(&run_dir.join("gkvp_namelist.001"), NAMELIST);
    write(&run_dir.join("log/gkvp.000000.0.log.001"), &log_text());

    let hst = run_dir.join("hst");
    write(&hst.join("gkvp.mtr.001"), &metric_text());
    write(&hst.join("gkvp.mtf.001"), &metric_text());
    // dtc split over two restarts
    write(&hst.join("gkvp.dtc.001"), &table_text(4, 4, 0.0));
    write(&hst.join("gkvp.dtc.002"), &table_text(4, 4, 2.0));
    write(&hst.join("gkvp.eng.001"), &table_text(GLOBAL_NY + 3, NROWS, 0.0));
    write(&hst.join("gkvp.men.001"), &table_text(GLOBAL_NY + 3, NROWS, 0.0));
    write(&hst.join("gkvp.wes.001"), &table_text(GLOBAL_NY + 3, NROWS, 0.0));
    for tag in ["ges", "gem", "qes", "qem"] {
        write(
            &hst.join(format!("gkvp.{}.0.001", tag)),
            &table_text(GLOBAL_NY + 3, NROWS, 0.0),
        );
    }
    write(&hst.join("gkvp.bln.0.001"), &table_text(21, NROWS, 0.0));
}

#[test]
fn full_run_produces_the_expected_pages() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_fixture(input.path());

    let mut config = ReportConfig::new(input.path());
    config.output_root = Some(output.path().to_path_buf());
    let result = ReportStage::new(config).unwrap().run().unwrap();

    // text section + elt + mtr + mtf + time series + flux.0 + energy
    assert_eq!(result.n_pages, 7);
    assert!(result.figures_skipped.is_empty(), "{:?}", result.figures_skipped);
    assert_eq!(result.figures_rendered[0], "text_section");
    assert!(result.figures_rendered.contains(&"flux.0".to_string()));

    let bytes = fs::read(&result.pdf_path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(bytes.ends_with(b"%%EOF\n"));
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Count 7"));

    let manifest = fs::read_to_string(result.output_dir.join("summary.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&manifest).unwrap();
    assert_eq!(parsed["n_pages"], 7);
    assert_eq!(parsed["calc_type"], "nonlinear");
}

#[test]
fn missing_optional_family_drops_one_page() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_fixture(input.path());
    fs::remove_file(input.path().join("hst/gkvp.mtf.001")).unwrap();

    let mut config = ReportConfig::new(input.path());
    config.output_root = Some(output.path().to_path_buf());
    let result = ReportStage::new(config).unwrap().run().unwrap();

    assert_eq!(result.n_pages, 6);
    assert_eq!(result.figures_skipped, vec!["metrics_theta".to_string()]);
    assert!(result.pdf_path.is_file());
}

#[test]
fn missing_namelist_is_fatal_and_writes_nothing() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_fixture(input.path());
    fs::remove_file(input.path().join("gkvp_namelist.001")).unwrap();

    let mut config = ReportConfig::new(input.path());
    config.output_root = Some(output.path().to_path_buf());
    let err = ReportStage::new(config).unwrap_err();
    assert!(err.to_string().contains("Namelist"));
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}

#[test]
fn consecutive_runs_use_distinct_directories() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_fixture(input.path());

    let mut config = ReportConfig::new(input.path());
    config.output_root = Some(output.path().to_path_buf());
    let stage = ReportStage::new(config).unwrap();
    let first = stage.run().unwrap();
    let second = stage.run().unwrap();

    assert_ne!(first.output_dir, second.output_dir);
    assert!(first.pdf_path.is_file());
    assert!(second.pdf_path.is_file());
}

#[test]
fn golden_namelist_values() {
    let config = SimulationConfig::parse(NAMELIST).unwrap();
    assert_eq!(config.str("cmemo", "memo"), Some("integration fixture"));
    assert_eq!(config.str("calct", "calc_type"), Some("nonlinear"));
    assert_eq!(config.f64("physp", "nx"), Some(7.0));
    let r0_ln = config.values("physp", "R0_Ln").unwrap();
    assert_eq!(r0_ln.len(), 2);
    assert_eq!(r0_ln[0].as_f64(), Some(2.5));
}

#[test]
fn golden_hst_concatenation() {
    let input = TempDir::new().unwrap();
    write_fixture(input.path());
    let archive = HstArchive::load(&input.path().join("hst"), 1, false).unwrap();

    let dtc = archive.get("dtc").unwrap();
    assert_eq!(dtc.nrows(), 8);
    assert_eq!(dtc.ncols(), 4);
    // part boundary: rows 0..4 from .001, rows 4..8 from .002
    assert!((dtc.value(3, 0) - 1.5).abs() < 1e-12);
    assert!((dtc.value(4, 0) - 2.0).abs() < 1e-12);
    // value(1, 2) = 0.1 + 0.01 * (1 + 2)
    assert!((dtc.value(1, 2) - 0.13).abs() < 1e-12);

    let bln = archive.get_species("bln", 0).unwrap();
    assert_eq!(bln.ncols(), 21);
    assert_eq!(bln.nrows(), 8);
}
