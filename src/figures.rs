//! Figure rendering with plotters
//!
//! One function per figure page. Every function draws onto a fresh A4
//! [`PageContent`] through the PDF backend, so a figure is exactly one page
//! of the report: stacked panels for time series, a 2x6 grid for the
//! metric coefficients, 2x2 for the linear diagnostics and the energy
//! balance, 3x2 per species for fluxes.
//!
//! Labels stay ASCII because the document uses the non-embedded core fonts.

use crate::entropy::{col, BALANCE_COLS};
use crate::history::TimeSeriesTable;
use crate::logfile::{ElapsedEntry, ElapsedTables};
use crate::pdf::backend::PdfBackend;
use crate::pdf::PageContent;
use anyhow::{bail, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::PI;

const TIME_DESC: &str = "Time t vref/Lref";

/// Panel labels for the field-aligned metric table (`mtr`), columns 3..13.
pub const FIELD_LINE_LABELS: [&str; 11] = [
    "B [Bref]",
    "dB/dx [Bref/Lref]",
    "dB/dy [Bref/Lref]",
    "dB/dz [Bref]",
    "g^xx",
    "g^xy",
    "g^xz [1/Lref]",
    "g^yy",
    "g^yz [1/Lref]",
    "g^zz [1/Lref^2]",
    "Jacobian [Lref]",
];

/// Panel labels for the poloidal-angle metric table (`mtf`).
pub const POLOIDAL_LABELS: [&str; 11] = [
    "B [Bref]",
    "dB/drho [Bref/Lref]",
    "dB/dtheta [Bref/Lref]",
    "dB/dzeta [Bref]",
    "g^rho,rho",
    "g^rho,theta",
    "g^rho,zeta [1/Lref]",
    "g^theta,theta",
    "g^theta,zeta [1/Lref]",
    "g^zeta,zeta [1/Lref^2]",
    "Jacobian [Lref]",
];

type Area<'b> = DrawingArea<PdfBackend<'b>, Shift>;

// ====== RANGE HELPERS ======

fn padded_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if lo > hi {
        return (0.0, 1.0);
    }
    if lo == hi {
        let pad = lo.abs().max(1.0) * 0.1;
        return (lo - pad, hi + pad);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Positive finite range for log-scale axes.
fn positive_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (mut lo, mut hi) = (f64::INFINITY, 0.0f64);
    for v in values {
        if v.is_finite() && v > 0.0 {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if hi == 0.0 {
        return (1e-12, 1.0);
    }
    if lo == hi {
        return (lo / 10.0, hi * 10.0);
    }
    (lo, hi)
}

fn finite_points(t: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    t.iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect()
}

fn placeholder(area: &Area<'_>, message: &str) -> Result<()> {
    let (w, h) = area.dim_in_pixel();
    area.draw(&Text::new(
        message.to_string(),
        (w as i32 / 2 - 70, h as i32 / 2),
        ("sans-serif", 11).into_font().color(&BLACK),
    ))?;
    Ok(())
}

// ====== SHARED PANELS ======

/// Labelled line panel on a linear y axis. NaN samples are dropped per
/// series, which blanks the entropy-derivative boundary rows.
fn linear_series_panel(
    area: &Area<'_>,
    title: &str,
    y_desc: &str,
    t: &[f64],
    series: &[(String, Vec<f64>)],
) -> Result<()> {
    let (x0, x1) = padded_range(t.iter().copied());
    let (y0, y1) = padded_range(series.iter().flat_map(|(_, v)| v.iter().copied()));
    let mut builder = ChartBuilder::on(area);
    builder
        .margin(6)
        .x_label_area_size(24)
        .y_label_area_size(48);
    if !title.is_empty() {
        builder.caption(title, ("sans-serif", 9));
    }
    let mut chart = builder.build_cartesian_2d(x0..x1, y0..y1)?;
    chart
        .configure_mesh()
        .x_desc(TIME_DESC)
        .y_desc(y_desc)
        .label_style(("sans-serif", 7))
        .axis_desc_style(("sans-serif", 8))
        .draw()?;
    for (i, (label, values)) in series.iter().enumerate() {
        let color = Palette99::pick(i);
        chart
            .draw_series(LineSeries::new(finite_points(t, values), color.stroke_width(1)))?
            .label(label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 14, y)], color.stroke_width(1))
            });
    }
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .border_style(&BLACK.mix(0.4))
        .background_style(&WHITE.mix(0.85))
        .label_font(("sans-serif", 7))
        .draw()?;
    Ok(())
}

/// Same as [`linear_series_panel`] on a log y axis; non-positive samples
/// are dropped.
fn log_series_panel(
    area: &Area<'_>,
    y_desc: &str,
    t: &[f64],
    series: &[(String, Vec<f64>)],
) -> Result<()> {
    let (x0, x1) = padded_range(t.iter().copied());
    let (y0, y1) = positive_range(series.iter().flat_map(|(_, v)| v.iter().copied()));
    let mut chart = ChartBuilder::on(area)
        .margin(6)
        .x_label_area_size(24)
        .y_label_area_size(48)
        .build_cartesian_2d(x0..x1, (y0..y1).log_scale())?;
    chart
        .configure_mesh()
        .x_desc(TIME_DESC)
        .y_desc(y_desc)
        .label_style(("sans-serif", 7))
        .axis_desc_style(("sans-serif", 8))
        .draw()?;
    for (i, (label, values)) in series.iter().enumerate() {
        let color = Palette99::pick(i);
        let points: Vec<(f64, f64)> = t
            .iter()
            .zip(values)
            .filter(|(a, b)| a.is_finite() && b.is_finite() && **b > 0.0)
            .map(|(a, b)| (*a, *b))
            .collect();
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(1)))?
            .label(label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 14, y)], color.stroke_width(1))
            });
    }
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .border_style(&BLACK.mix(0.4))
        .background_style(&WHITE.mix(0.85))
        .label_font(("sans-serif", 7))
        .draw()?;
    Ok(())
}

/// Outline bar chart for one elapsed-time table.
fn bar_panel(area: &Area<'_>, title: &str, entries: &[ElapsedEntry]) -> Result<()> {
    if entries.is_empty() {
        return placeholder(area, "No timing data");
    }
    let n = entries.len();
    let max = entries
        .iter()
        .map(|e| e.seconds)
        .fold(0.0f64, f64::max)
        .max(1e-12);
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 9))
        .margin(6)
        .x_label_area_size(64)
        .y_label_area_size(48)
        .build_cartesian_2d((0..n).into_segmented(), 0.0..max * 1.15)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|x| match x {
            SegmentValue::CenterOf(i) if *i < n => entries[*i].label.clone(),
            _ => String::new(),
        })
        .y_desc("Elapsed time [sec]")
        .label_style(("sans-serif", 6))
        .axis_desc_style(("sans-serif", 8))
        .draw()?;
    chart.draw_series(entries.iter().enumerate().map(|(i, e)| {
        Rectangle::new(
            [
                (SegmentValue::Exact(i), 0.0),
                (SegmentValue::Exact(i + 1), e.seconds),
            ],
            BLUE.stroke_width(1),
        )
    }))?;
    Ok(())
}

/// Total + per-mode series from a `(t, total, m_y=0.., ...)` table.
fn mode_series(table: &TimeSeriesTable, global_ny: usize) -> Vec<(String, Vec<f64>)> {
    let mut series = vec![("Total".to_string(), table.col(1))];
    for my in 0..=global_ny {
        let c = my + 2;
        if c >= table.ncols() {
            break;
        }
        series.push((format!("m_y={}", my), table.col(c)));
    }
    series
}

fn sum_cols(table: &TimeSeriesTable, a: usize, b: usize) -> Vec<f64> {
    (0..table.nrows())
        .map(|r| table.value(r, a) + table.value(r, b))
        .collect()
}

// ====== FIGURE PAGES ======

/// Three stacked bar charts of the coarse/medium/fine elapsed-time tables.
pub fn elapsed_time(page: &mut PageContent, tables: &ElapsedTables) -> Result<()> {
    if tables.coarse.is_empty() && tables.medium.is_empty() && tables.fine.is_empty() {
        bail!("no elapsed-time tables in the run log");
    }
    let root = PdfBackend::new(page).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.margin(30, 30, 40, 40).split_evenly((3, 1));
    bar_panel(&areas[0], "Coarsely-classified elapsed time", &tables.coarse)?;
    bar_panel(&areas[1], "Moderately-classified elapsed time", &tables.medium)?;
    bar_panel(&areas[2], "Finely-classified elapsed time", &tables.fine)?;
    root.present()?;
    Ok(())
}

/// Eleven metric-coefficient panels in a 2x6 grid; the twelfth cell stays
/// blank. Plots file columns 3..13 against column 1, clipped to one poloidal
/// turn.
pub fn metric_panels(
    page: &mut PageContent,
    table: &TimeSeriesTable,
    x_desc: &str,
    y_labels: &[&str; 11],
) -> Result<()> {
    if table.ncols() < 13 {
        bail!("metric table has {} columns, expected 13", table.ncols());
    }
    let root = PdfBackend::new(page).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.margin(30, 30, 36, 20).split_evenly((6, 2));
    let x = table.times();
    for (idx, y_desc) in y_labels.iter().enumerate() {
        let y = table.col(idx + 2);
        let points: Vec<(f64, f64)> = finite_points(&x, &y)
            .into_iter()
            .filter(|(xv, _)| (-PI..=PI).contains(xv))
            .collect();
        let (y0, y1) = padded_range(points.iter().map(|(_, v)| *v));
        let mut chart = ChartBuilder::on(&areas[idx])
            .margin(4)
            .x_label_area_size(18)
            .y_label_area_size(44)
            .build_cartesian_2d(-PI..PI, y0..y1)?;
        chart
            .configure_mesh()
            .x_labels(7)
            .x_desc(x_desc)
            .y_desc(*y_desc)
            .label_style(("sans-serif", 6))
            .axis_desc_style(("sans-serif", 7))
            .draw()?;
        chart.draw_series(LineSeries::new(points.clone(), BLUE.stroke_width(1)))?;
        chart.draw_series(
            points
                .iter()
                .map(|p| Circle::new(*p, 2, BLUE.stroke_width(1))),
        )?;
    }
    root.present()?;
    Ok(())
}

/// Linear-run diagnostics: growth rate and frequency over the second half
/// of the run (top row), and their k_y spectra from the dispersion solve
/// (bottom row). An absent or unconverged `dsp` table degrades the bottom
/// row to a notice.
pub fn linear_frequency(
    page: &mut PageContent,
    global_ny: usize,
    frq: &TimeSeriesTable,
    dsp: Option<&TimeSeriesTable>,
) -> Result<()> {
    if frq.ncols() < 2 || frq.nrows() == 0 {
        bail!("frq table is too small ({} columns)", frq.ncols());
    }
    let root = PdfBackend::new(page).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.margin(100, 100, 40, 40).split_evenly((2, 2));

    let t = frq.times();
    let tend = t.last().copied().unwrap_or(0.0);
    let keep: Vec<usize> = (0..frq.nrows())
        .filter(|&r| t[r] >= tend / 2.0)
        .collect();
    let t_cut: Vec<f64> = keep.iter().map(|&r| t[r]).collect();

    let pick = |col_idx: usize| -> Vec<f64> {
        keep.iter().map(|&r| frq.value(r, col_idx)).collect()
    };
    let mut growth = Vec::new();
    let mut freq = Vec::new();
    for my in 1..=global_ny {
        if 2 * my >= frq.ncols() {
            break;
        }
        growth.push((format!("m_y={}", my), pick(2 * my)));
        freq.push((format!("m_y={}", my), pick(2 * my - 1)));
    }
    linear_series_panel(&areas[0], "", "Growthrate gamma [vref/Lref]", &t_cut, &growth)?;
    linear_series_panel(&areas[1], "", "Frequency omega_r [vref/Lref]", &t_cut, &freq)?;

    match dsp_spectrum(dsp) {
        Some((ky, freq_s, grow_s)) => {
            spectrum_panel(&areas[2], "Growthrate gamma [vref/Lref]", &ky, &grow_s)?;
            spectrum_panel(&areas[3], "Frequency omega_r [vref/Lref]", &ky, &freq_s)?;
        }
        None => {
            placeholder(&areas[2], "dsp spectrum not available")?;
            placeholder(&areas[3], "dsp spectrum not available")?;
        }
    }
    root.present()?;
    Ok(())
}

/// Rows of the dispersion table with k_x = 0, as (k_y, frequency, growth).
fn dsp_spectrum(dsp: Option<&TimeSeriesTable>) -> Option<(Vec<f64>, Vec<f64>, Vec<f64>)> {
    let d = dsp?;
    if d.ncols() < 4 {
        return None;
    }
    let mut ky = Vec::new();
    let mut freq = Vec::new();
    let mut grow = Vec::new();
    for r in 0..d.nrows() {
        if d.value(r, 0).abs() < 1e-10 {
            ky.push(d.value(r, 1));
            freq.push(d.value(r, 2));
            grow.push(d.value(r, 3));
        }
    }
    if ky.is_empty() {
        return None;
    }
    Some((ky, freq, grow))
}

fn spectrum_panel(area: &Area<'_>, y_desc: &str, ky: &[f64], values: &[f64]) -> Result<()> {
    let (x0, x1) = padded_range(ky.iter().copied());
    let (y0, y1) = padded_range(values.iter().copied());
    let mut chart = ChartBuilder::on(area)
        .margin(6)
        .x_label_area_size(24)
        .y_label_area_size(48)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    chart
        .configure_mesh()
        .x_desc("Poloidal wave number k_y rho_ref")
        .y_desc(y_desc)
        .label_style(("sans-serif", 7))
        .axis_desc_style(("sans-serif", 8))
        .draw()?;
    let points = finite_points(ky, values);
    chart.draw_series(LineSeries::new(points.clone(), BLUE.stroke_width(1)))?;
    chart.draw_series(
        points
            .iter()
            .map(|p| Circle::new(*p, 2, BLUE.stroke_width(1))),
    )?;
    Ok(())
}

/// Stacked log-scale time series: time step sizes, electrostatic potential
/// per mode, and (for electromagnetic runs) the vector potential per mode.
pub fn time_series(
    page: &mut PageContent,
    global_ny: usize,
    dtc: &TimeSeriesTable,
    eng: &TimeSeriesTable,
    men: Option<&TimeSeriesTable>,
) -> Result<()> {
    if dtc.ncols() < 4 {
        bail!("dtc table has {} columns, expected 4", dtc.ncols());
    }
    if eng.ncols() < 2 {
        bail!("eng table has {} columns, expected at least 2", eng.ncols());
    }
    let root = PdfBackend::new(page).into_drawing_area();
    root.fill(&WHITE)?;
    let nrows = if men.is_some() { 3 } else { 2 };
    let areas = root.margin(30, 30, 40, 50).split_evenly((nrows, 1));

    let t = dtc.times();
    let dt_series = vec![
        ("dt".to_string(), dtc.col(1)),
        ("dt_limit".to_string(), dtc.col(2)),
        ("dt_N".to_string(), dtc.col(3)),
    ];
    log_series_panel(&areas[0], "Time step size dt [vref/Lref]", &t, &dt_series)?;

    log_series_panel(
        &areas[1],
        "Electrostatic potential <|phi_k|^2>",
        &eng.times(),
        &mode_series(eng, global_ny),
    )?;

    if let Some(men) = men {
        log_series_panel(
            &areas[2],
            "Vector potential <|Apara_k|^2>",
            &men.times(),
            &mode_series(men, global_ny),
        )?;
    }
    root.present()?;
    Ok(())
}

/// The nine entropy-balance series of one species: the three balance
/// sides, the four transfer terms, the dissipation and the closure error.
fn entropy_series(ent: &TimeSeriesTable) -> Vec<(String, Vec<f64>)> {
    let dsdt = sum_cols(ent, col::DSDT_NZ, col::DSDT_ZF);
    let rse = sum_cols(ent, col::RE_NZ, col::RE_ZF);
    let rsm = sum_cols(ent, col::RM_NZ, col::RM_ZF);
    let ds = sum_cols(ent, col::DS_NZ, col::DS_ZF);
    let ge = ent.col(col::GE);
    let gm = ent.col(col::GM);
    let qe = ent.col(col::QE);
    let qm = ent.col(col::QM);
    let error: Vec<f64> = (0..ent.nrows())
        .map(|r| {
            dsdt[r] - rse[r] - rsm[r] - ds[r] - ge[r] - gm[r] - qe[r] - qm[r]
        })
        .collect();
    vec![
        ("dS_s/dt".to_string(), dsdt),
        ("R_sE".to_string(), rse),
        ("R_sM".to_string(), rsm),
        ("T_s Gamma_sE/L_ps".to_string(), ge),
        ("T_s Gamma_sM/L_ps".to_string(), gm),
        ("Theta_sE/L_Ts".to_string(), qe),
        ("Theta_sM/L_Ts".to_string(), qm),
        ("D_s".to_string(), ds),
        ("Error".to_string(), error),
    ]
}

/// Per-species flux page: entropy balance plus the four particle/energy
/// flux panels, each with the total and the per-mode contributions.
pub fn species_flux(
    page: &mut PageContent,
    species: usize,
    global_ny: usize,
    ent: &TimeSeriesTable,
    ges: &TimeSeriesTable,
    gem: &TimeSeriesTable,
    qes: &TimeSeriesTable,
    qem: &TimeSeriesTable,
) -> Result<()> {
    if ent.ncols() < BALANCE_COLS {
        bail!("entropy table has {} columns, expected {}", ent.ncols(), BALANCE_COLS);
    }
    for (name, table) in [("ges", ges), ("gem", gem), ("qes", qes), ("qem", qem)] {
        if table.ncols() < 2 {
            bail!("{} table has {} columns, expected at least 2", name, table.ncols());
        }
    }
    let root = PdfBackend::new(page).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.margin(30, 30, 40, 50).split_evenly((3, 2));

    let title = format!("species = {}", species);
    linear_series_panel(
        &areas[0],
        &title,
        "Entropy variables",
        &ent.times(),
        &entropy_series(ent),
    )?;
    // areas[1] stays blank.

    linear_series_panel(
        &areas[2],
        &title,
        "Particle flux by ExB flows Gamma_sE",
        &ges.times(),
        &mode_series(ges, global_ny),
    )?;
    linear_series_panel(
        &areas[3],
        &title,
        "Particle flux by magnetic flutters Gamma_sM",
        &gem.times(),
        &mode_series(gem, global_ny),
    )?;
    linear_series_panel(
        &areas[4],
        &title,
        "Energy flux by ExB flows Theta_sE",
        &qes.times(),
        &mode_series(qes, global_ny),
    )?;
    linear_series_panel(
        &areas[5],
        &title,
        "Energy flux by magnetic flutters Theta_sM",
        &qem.times(),
        &mode_series(qem, global_ny),
    )?;
    root.present()?;
    Ok(())
}

/// Energy-balance page: field-energy derivatives against the species drive
/// terms (top row) and the field energies on log axes (bottom row). The
/// W_M panel stays blank for electrostatic runs.
pub fn energy_balance(
    page: &mut PageContent,
    global_ny: usize,
    ents: &[(usize, &TimeSeriesTable)],
    wes: &TimeSeriesTable,
    wem: Option<&TimeSeriesTable>,
) -> Result<()> {
    let Some(&(first_species, ent0)) = ents.first() else {
        bail!("no entropy tables available");
    };
    if first_species != 0 {
        bail!("entropy table for species 0 is required");
    }
    if wes.ncols() < 2 {
        bail!("wes table has {} columns, expected at least 2", wes.ncols());
    }
    let root = PdfBackend::new(page).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.margin(60, 60, 40, 50).split_evenly((2, 2));

    let t = ent0.times();
    let mut series_e = vec![(
        "dW_E/dt".to_string(),
        sum_cols(ent0, col::DWEDT_NZ, col::DWEDT_ZF),
    )];
    let mut series_m = vec![(
        "dW_M/dt".to_string(),
        sum_cols(ent0, col::DWMDT_NZ, col::DWMDT_ZF),
    )];
    for &(s, ent) in ents {
        let rse = sum_cols(ent, col::RE_NZ, col::RE_ZF);
        let rsm = sum_cols(ent, col::RM_NZ, col::RM_ZF);
        series_e.push((
            format!("-R_sE(s={})", s),
            rse.iter().map(|v| -v).collect(),
        ));
        series_m.push((
            format!("-R_sM(s={})", s),
            rsm.iter().map(|v| -v).collect(),
        ));
    }
    linear_series_panel(&areas[0], "", "Entropy variables", &t, &series_e)?;
    linear_series_panel(&areas[1], "", "Entropy variables", &t, &series_m)?;

    log_series_panel(
        &areas[2],
        "Electrostatic energy W_E",
        &wes.times(),
        &mode_series(wes, global_ny),
    )?;
    if let Some(wem) = wem {
        log_series_panel(
            &areas[3],
            "Magnetic field energy W_M",
            &wem.times(),
            &mode_series(wem, global_ny),
        )?;
    }
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::entropy_balance as derive_balance;

    fn table(ncols: usize, nrows: usize) -> TimeSeriesTable {
        let mut text = String::new();
        for r in 0..nrows {
            let row: Vec<String> = (0..ncols)
                .map(|c| {
                    if c == 0 {
                        format!("{:.3}", r as f64 * 0.5)
                    } else {
                        format!("{:.6}", 0.1 + 0.01 * (r * ncols + c) as f64)
                    }
                })
                .collect();
            text.push_str(&row.join(" "));
            text.push('\n');
        }
        TimeSeriesTable::parse(&text).unwrap()
    }

    fn elapsed() -> ElapsedTables {
        let entries = |n: usize| {
            (0..n)
                .map(|i| ElapsedEntry {
                    label: format!("part_{}", i),
                    seconds: 1.0 + i as f64,
                })
                .collect()
        };
        ElapsedTables {
            coarse: entries(4),
            medium: entries(8),
            fine: entries(16),
        }
    }

    #[test]
    fn elapsed_time_page_renders() {
        let mut page = PageContent::new();
        elapsed_time(&mut page, &elapsed()).unwrap();
        assert!(!page.is_empty());
    }

    #[test]
    fn metric_page_renders_and_checks_width() {
        let mut page = PageContent::new();
        metric_panels(&mut page, &table(13, 9), "Field-aligned coordinate z", &FIELD_LINE_LABELS)
            .unwrap();
        assert!(!page.is_empty());

        let mut page = PageContent::new();
        let err = metric_panels(&mut page, &table(4, 9), "z", &FIELD_LINE_LABELS);
        assert!(err.is_err());
    }

    #[test]
    fn time_series_page_renders_without_men() {
        let mut page = PageContent::new();
        time_series(&mut page, 2, &table(4, 8), &table(5, 8), None).unwrap();
        assert!(!page.is_empty());
    }

    #[test]
    fn flux_page_renders_with_nan_boundary_rows() {
        let bln = table(21, 8);
        let ent = derive_balance(&bln, true).unwrap();
        let flux = table(5, 8);
        let mut page = PageContent::new();
        species_flux(&mut page, 0, 2, &ent, &flux, &flux, &flux, &flux).unwrap();
        assert!(!page.is_empty());
    }

    #[test]
    fn energy_page_requires_species_zero() {
        let bln = table(21, 8);
        let ent = derive_balance(&bln, true).unwrap();
        let mut page = PageContent::new();
        let err = energy_balance(&mut page, 2, &[(1, &ent)], &table(5, 8), None);
        assert!(err.is_err());
        energy_balance(&mut page, 2, &[(0, &ent)], &table(5, 8), None).unwrap();
    }

    #[test]
    fn frequency_page_degrades_without_dsp() {
        let mut page = PageContent::new();
        linear_frequency(&mut page, 3, &table(8, 10), None).unwrap();
        assert!(page.ops.contains("dsp spectrum not available"));
    }
}
