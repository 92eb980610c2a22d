//! Penalized least squares
//!
//! Solves `min ||y - Xb||^2 + sum_j penalty_j * b_j^2` through the normal
//! equations `(X'X + diag(penalty)) b = X'y` and Gauss-Jordan elimination
//! with partial pivoting. The systems built by the forecasting models have
//! a few dozen columns at most, so a dense solve is plenty.

use crate::{MathError, Result};

/// Pivots smaller than this are treated as a singular system
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Fit coefficients for a design matrix given as rows.
///
/// `penalties` holds one ridge penalty per column; use a tiny value (or
/// zero) for columns that should be left effectively unpenalized.
pub fn solve_penalized(design: &[Vec<f64>], target: &[f64], penalties: &[f64]) -> Result<Vec<f64>> {
    if design.is_empty() {
        return Err(MathError::InsufficientData(
            "Design matrix has no rows".to_string(),
        ));
    }
    if design.len() != target.len() {
        return Err(MathError::InvalidInput(format!(
            "Design matrix has {} rows but target has {} values",
            design.len(),
            target.len()
        )));
    }

    let p = design[0].len();
    if p == 0 {
        return Ok(Vec::new());
    }
    if penalties.len() != p {
        return Err(MathError::InvalidInput(format!(
            "Expected {} penalties, got {}",
            p,
            penalties.len()
        )));
    }
    if let Some(row) = design.iter().position(|row| row.len() != p) {
        return Err(MathError::InvalidInput(format!(
            "Design row {} has {} columns, expected {}",
            row,
            design[row].len(),
            p
        )));
    }

    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, &y) in design.iter().zip(target) {
        for a in 0..p {
            let xa = row[a];
            if xa == 0.0 {
                continue;
            }
            xty[a] += xa * y;
            for b in a..p {
                xtx[a][b] += xa * row[b];
            }
        }
    }
    for a in 0..p {
        for b in 0..a {
            xtx[a][b] = xtx[b][a];
        }
        xtx[a][a] += penalties[a].max(0.0);
    }

    gauss_jordan(xtx, xty)
}

/// Ordinary least squares with a negligible ridge for numerical stability
pub fn solve_ols(design: &[Vec<f64>], target: &[f64]) -> Result<Vec<f64>> {
    let p = design.first().map(Vec::len).unwrap_or(0);
    solve_penalized(design, target, &vec![1e-10; p])
}

fn gauss_jordan(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let p = b.len();
    for i in 0..p {
        let pivot_row = (i..p)
            .max_by(|&r, &s| a[r][i].abs().total_cmp(&a[s][i].abs()))
            .unwrap_or(i);
        if a[pivot_row][i].abs() < PIVOT_TOLERANCE {
            return Err(MathError::CalculationError(format!(
                "Normal equations are singular at column {}",
                i
            )));
        }
        if pivot_row != i {
            a.swap(i, pivot_row);
            b.swap(i, pivot_row);
        }

        let inv_pivot = 1.0 / a[i][i];
        for j in i..p {
            a[i][j] *= inv_pivot;
        }
        b[i] *= inv_pivot;

        for r in 0..p {
            if r == i {
                continue;
            }
            let factor = a[r][i];
            if factor == 0.0 {
                continue;
            }
            for j in i..p {
                a[r][j] -= factor * a[i][j];
            }
            b[r] -= factor * b[i];
        }
    }

    if b.iter().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Least squares solution is not finite".to_string(),
        ));
    }

    Ok(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_exact_line() {
        let design: Vec<Vec<f64>> = (0..10).map(|i| vec![1.0, i as f64]).collect();
        let target: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * i as f64).collect();

        let coef = solve_ols(&design, &target).unwrap();
        assert!((coef[0] - 3.0).abs() < 1e-6);
        assert!((coef[1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_penalty_shrinks_coefficient() {
        let design: Vec<Vec<f64>> = (0..20).map(|i| vec![1.0, i as f64 / 20.0]).collect();
        let target: Vec<f64> = (0..20).map(|i| i as f64 / 20.0).collect();

        let free = solve_penalized(&design, &target, &[0.0, 0.0]).unwrap();
        let shrunk = solve_penalized(&design, &target, &[0.0, 100.0]).unwrap();
        assert!(shrunk[1].abs() < free[1].abs());
    }

    #[test]
    fn test_singular_system_is_reported() {
        let design: Vec<Vec<f64>> = (0..5).map(|_| vec![1.0, 1.0]).collect();
        let target = vec![1.0; 5];

        let result = solve_penalized(&design, &target, &[0.0, 0.0]);
        assert!(matches!(result, Err(MathError::CalculationError(_))));
    }

    #[test]
    fn test_dimension_mismatch() {
        let design = vec![vec![1.0, 2.0], vec![1.0, 3.0]];
        assert!(solve_ols(&design, &[1.0]).is_err());
        assert!(solve_penalized(&design, &[1.0, 2.0], &[0.0]).is_err());
        assert!(solve_ols(&[], &[]).is_err());
    }
}
