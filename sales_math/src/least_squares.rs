//! Dense ordinary least squares
//!
//! Used to estimate linear time-series coefficients. The system is solved
//! through an SVD so rank-deficient designs yield the minimum-norm solution
//! instead of a division by zero.

use crate::{MathError, Result};
use nalgebra::{DMatrix, DVector};

const SINGULAR_EPS: f64 = 1e-10;

/// Solve `min ||X b - y||` for `b`
///
/// `rows` holds the design matrix row by row; every row must have the same width.
pub fn solve(rows: &[Vec<f64>], target: &[f64]) -> Result<Vec<f64>> {
    if rows.is_empty() {
        return Err(MathError::InsufficientData(
            "Least squares needs at least one observation".to_string(),
        ));
    }
    if rows.len() != target.len() {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but target has {} values",
            rows.len(),
            target.len()
        )));
    }

    let width = rows[0].len();
    if width == 0 {
        return Ok(Vec::new());
    }
    if rows.iter().any(|r| r.len() != width) {
        return Err(MathError::InvalidInput(
            "Design rows have inconsistent widths".to_string(),
        ));
    }

    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    if flat.iter().chain(target.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Design or target contains non-finite values".to_string(),
        ));
    }

    let x = DMatrix::from_row_slice(rows.len(), width, &flat);
    let y = DVector::from_column_slice(target);

    let solution = x
        .svd(true, true)
        .solve(&y, SINGULAR_EPS)
        .map_err(|e| MathError::CalculationError(e.to_string()))?;

    let coefficients: Vec<f64> = solution.iter().copied().collect();
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(MathError::CalculationError(
            "Least squares produced non-finite coefficients".to_string(),
        ));
    }

    Ok(coefficients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_line() {
        // y = 1 + 2x
        let rows: Vec<Vec<f64>> = (0..5).map(|x| vec![1.0, x as f64]).collect();
        let target: Vec<f64> = (0..5).map(|x| 1.0 + 2.0 * x as f64).collect();
        let b = solve(&rows, &target).unwrap();
        assert_relative_eq!(b[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(b[1], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mismatched_lengths() {
        let rows = vec![vec![1.0], vec![2.0]];
        assert!(solve(&rows, &[1.0]).is_err());
    }

    #[test]
    fn test_rank_deficient_design_still_solves() {
        let rows = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]];
        let b = solve(&rows, &[2.0, 4.0, 6.0]).unwrap();
        assert_relative_eq!(b[0] + b[1], 2.0, epsilon = 1e-9);
    }
}
