//! Entropy-balance table derived from the `bln` history output
//!
//! The 21-column `bln` table carries, per species, the entropy S_s, the
//! field energies W_E/W_M and the transfer/dissipation terms, each split
//! into a zonal-flow and a non-zonal part. The balance diagnostic replaces
//! the S/W columns by their time derivatives, computed with a five-point
//! finite-difference stencil. The first and last two rows have no full
//! stencil and carry NaN derivatives; plotting skips them.

use crate::history::TimeSeriesTable;
use anyhow::{bail, Result};

/// Column count of both the `bln` input and the derived balance table.
pub const BALANCE_COLS: usize = 21;

/// Balance-table column indices, for the figure code.
pub mod col {
    pub const TIME: usize = 0;
    pub const DSDT_NZ: usize = 1;
    pub const DSDT_ZF: usize = 2;
    pub const DWEDT_NZ: usize = 3;
    pub const DWEDT_ZF: usize = 4;
    pub const DWMDT_NZ: usize = 5;
    pub const DWMDT_ZF: usize = 6;
    pub const RE_NZ: usize = 7;
    pub const RE_ZF: usize = 8;
    pub const RM_NZ: usize = 9;
    pub const RM_ZF: usize = 10;
    pub const DS_NZ: usize = 15;
    pub const DS_ZF: usize = 16;
    pub const GE: usize = 17;
    pub const GM: usize = 18;
    pub const QE: usize = 19;
    pub const QM: usize = 20;
}

/// Compute the entropy-balance table from a raw `bln` table.
///
/// Columns 1..=6 (S/W values) become d/dt columns; columns 0 and 7..=20 are
/// copied through. `non_uniform` selects the variable-step stencil, the
/// default for restarted runs whose output cadence changes between parts.
pub fn entropy_balance(bln: &TimeSeriesTable, non_uniform: bool) -> Result<TimeSeriesTable> {
    if bln.ncols() < BALANCE_COLS {
        bail!(
            "bln table has {} columns, expected at least {}",
            bln.ncols(),
            BALANCE_COLS
        );
    }
    let n = bln.nrows();
    let t = bln.times();

    let mut derivatives = Vec::with_capacity(6);
    for c in 1..=6 {
        let y = bln.col(c);
        derivatives.push(if non_uniform {
            non_uniform_derivative(&t, &y)
        } else {
            uniform_derivative(&t, &y)
        });
    }

    let mut data = Vec::with_capacity(n * BALANCE_COLS);
    for r in 0..n {
        data.push(t[r]);
        for d in &derivatives {
            data.push(d[r]);
        }
        for c in 7..BALANCE_COLS {
            data.push(bln.value(r, c));
        }
    }
    TimeSeriesTable::from_flat(BALANCE_COLS, data)
}

/// Five-point central difference on a uniform grid, spacing taken from the
/// forward step at each point. Boundary rows stay NaN.
pub fn uniform_derivative(t: &[f64], y: &[f64]) -> Vec<f64> {
    let n = t.len();
    let mut dydt = vec![f64::NAN; n];
    if n < 5 {
        return dydt;
    }
    for i in 2..n - 2 {
        let dt = t[i + 1] - t[i];
        let cef = 1.0 / (12.0 * dt);
        dydt[i] = cef * (-y[i + 2] + 8.0 * y[i + 1] - 8.0 * y[i - 1] + y[i - 2]);
    }
    dydt
}

/// Five-point Lagrange derivative on a non-uniform grid. Exact for
/// polynomials up to degree four. Boundary rows stay NaN.
pub fn non_uniform_derivative(t: &[f64], y: &[f64]) -> Vec<f64> {
    let n = t.len();
    let mut dydt = vec![f64::NAN; n];
    if n < 5 {
        return dydt;
    }
    for i in 2..n - 2 {
        let (t_m2, t_m1, t_0, t_p1, t_p2) = (t[i - 2], t[i - 1], t[i], t[i + 1], t[i + 2]);

        let cefm2 = ((t_0 - t_m1) * (t_0 - t_p1) * (t_0 - t_p2))
            / ((t_m2 - t_m1) * (t_m2 - t_0) * (t_m2 - t_p1) * (t_m2 - t_p2));
        let cefm1 = ((t_0 - t_m2) * (t_0 - t_p1) * (t_0 - t_p2))
            / ((t_m1 - t_m2) * (t_m1 - t_0) * (t_m1 - t_p1) * (t_m1 - t_p2));

        let term1 = (t_0 - t_m1) * (t_0 - t_p1) * (t_0 - t_p2);
        let term2 = (t_0 - t_m2) * (t_0 - t_p1) * (t_0 - t_p2);
        let term3 = (t_0 - t_m2) * (t_0 - t_m1) * (t_0 - t_p2);
        let term4 = (t_0 - t_m2) * (t_0 - t_m1) * (t_0 - t_p1);
        let cefp0 = (term1 + term2 + term3 + term4)
            / ((t_0 - t_m2) * (t_0 - t_m1) * (t_0 - t_p1) * (t_0 - t_p2));

        let cefp1 = ((t_0 - t_m2) * (t_0 - t_m1) * (t_0 - t_p2))
            / ((t_p1 - t_m2) * (t_p1 - t_m1) * (t_p1 - t_0) * (t_p1 - t_p2));
        let cefp2 = ((t_0 - t_m2) * (t_0 - t_m1) * (t_0 - t_p1))
            / ((t_p2 - t_m2) * (t_p2 - t_m1) * (t_p2 - t_0) * (t_p2 - t_p1));

        dydt[i] = cefm2 * y[i - 2]
            + cefm1 * y[i - 1]
            + cefp0 * y[i]
            + cefp1 * y[i + 1]
            + cefp2 * y[i + 2];
    }
    dydt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bln_with_cubic_entropy(t: &[f64]) -> TimeSeriesTable {
        let mut text = String::new();
        for &ti in t {
            let mut row = vec![ti];
            row.push(ti * ti * ti); // Ss_nz = t^3
            row.extend(std::iter::repeat(0.5).take(19));
            text.push_str(
                &row.iter()
                    .map(|v| format!("{:.12e}", v))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
            text.push('\n');
        }
        TimeSeriesTable::parse(&text).unwrap()
    }

    #[test]
    fn non_uniform_stencil_is_exact_for_cubics() {
        let t = [0.0, 0.1, 0.3, 0.6, 1.0, 1.5, 2.1];
        let y: Vec<f64> = t.iter().map(|v| v * v * v).collect();
        let d = non_uniform_derivative(&t, &y);
        for i in 2..t.len() - 2 {
            let exact = 3.0 * t[i] * t[i];
            assert!((d[i] - exact).abs() < 1e-9, "i={}: {} vs {}", i, d[i], exact);
        }
        assert!(d[0].is_nan() && d[1].is_nan());
        assert!(d[t.len() - 1].is_nan() && d[t.len() - 2].is_nan());
    }

    #[test]
    fn uniform_stencil_is_exact_for_cubics_on_a_uniform_grid() {
        let t: Vec<f64> = (0..9).map(|i| 0.25 * i as f64).collect();
        let y: Vec<f64> = t.iter().map(|v| v * v * v).collect();
        let d = uniform_derivative(&t, &y);
        for i in 2..t.len() - 2 {
            let exact = 3.0 * t[i] * t[i];
            assert!((d[i] - exact).abs() < 1e-9);
        }
    }

    #[test]
    fn balance_table_keeps_shape_and_transfer_columns() {
        let t = [0.0, 0.2, 0.5, 0.9, 1.4, 2.0, 2.7];
        let bln = bln_with_cubic_entropy(&t);
        let balance = entropy_balance(&bln, true).unwrap();
        assert_eq!(balance.ncols(), BALANCE_COLS);
        assert_eq!(balance.nrows(), bln.nrows());
        // dSs/dt of t^3 at an interior row
        let exact = 3.0 * t[3] * t[3];
        assert!((balance.value(3, col::DSDT_NZ) - exact).abs() < 1e-6);
        // boundary rows carry NaN derivatives
        assert!(balance.value(0, col::DSDT_NZ).is_nan());
        assert!(balance.value(6, col::DWMDT_ZF).is_nan());
        // copied-through transfer column
        assert_eq!(balance.value(3, col::GE), 0.5);
    }

    #[test]
    fn narrow_bln_table_is_rejected() {
        let bln = TimeSeriesTable::parse("0.0 1.0 2.0\n").unwrap();
        assert!(entropy_balance(&bln, true).is_err());
    }

    #[test]
    fn short_tables_are_all_nan_derivatives() {
        let d = non_uniform_derivative(&[0.0, 1.0], &[0.0, 1.0]);
        assert!(d.iter().all(|v| v.is_nan()));
    }
}
