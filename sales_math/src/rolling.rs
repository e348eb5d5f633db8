//! Rolling window statistics
//!
//! Every position gets a value as long as its window holds at least one
//! observation (the window may be partial at either end of the series).
//! Positions where the statistic is undefined are returned as `None`.

use crate::statistics;
use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Placement of a rolling window relative to the current position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowAlignment {
    /// Window `[i - w + 1, i]`
    Trailing,
    /// Window of `w` rows starting at `i - w / 2`
    #[default]
    Centered,
}

impl WindowAlignment {
    /// Inclusive-exclusive bounds of the window for position `i` in a series of length `len`
    pub fn bounds(self, i: usize, window: usize, len: usize) -> (usize, usize) {
        match self {
            WindowAlignment::Trailing => ((i + 1).saturating_sub(window), (i + 1).min(len)),
            WindowAlignment::Centered => {
                let end = i + 1 + (window - 1) / 2;
                (end.saturating_sub(window), end.min(len))
            }
        }
    }
}

fn check_window(window: usize) -> Result<()> {
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Window must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Rolling mean with a minimum of one observation per window
pub fn rolling_mean(
    values: &[f64],
    window: usize,
    alignment: WindowAlignment,
) -> Result<Vec<Option<f64>>> {
    check_window(window)?;

    Ok((0..values.len())
        .map(|i| {
            let (start, end) = alignment.bounds(i, window, values.len());
            statistics::mean(&values[start..end]).ok()
        })
        .collect())
}

/// Rolling sample standard deviation; `None` where the window holds a single value
pub fn rolling_std(
    values: &[f64],
    window: usize,
    alignment: WindowAlignment,
) -> Result<Vec<Option<f64>>> {
    check_window(window)?;

    Ok((0..values.len())
        .map(|i| {
            let (start, end) = alignment.bounds(i, window, values.len());
            statistics::sample_std_dev(&values[start..end]).ok()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_centered_bounds() {
        assert_eq!(WindowAlignment::Centered.bounds(0, 3, 10), (0, 2));
        assert_eq!(WindowAlignment::Centered.bounds(5, 3, 10), (4, 7));
        assert_eq!(WindowAlignment::Centered.bounds(9, 3, 10), (8, 10));
        // even windows hold exactly w rows: i-3 ..= i+2
        assert_eq!(WindowAlignment::Centered.bounds(5, 6, 10), (2, 8));
        assert_eq!(WindowAlignment::Centered.bounds(0, 6, 10), (0, 3));
    }

    #[test]
    fn test_trailing_bounds() {
        assert_eq!(WindowAlignment::Trailing.bounds(0, 3, 10), (0, 1));
        assert_eq!(WindowAlignment::Trailing.bounds(4, 3, 10), (2, 5));
    }

    #[test]
    fn test_centered_rolling_mean() {
        let values = [100.0, 110.0, 105.0, 130.0];
        let means: Vec<f64> = rolling_mean(&values, 3, WindowAlignment::Centered)
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(means.len(), 4);
        assert_relative_eq!(means[0], 105.0);
        assert_relative_eq!(means[1], 105.0);
        assert_relative_eq!(means[2], 115.0);
        assert_relative_eq!(means[3], 117.5);
    }

    #[test]
    fn test_trailing_std_first_position_is_undefined() {
        let values = [1.0, 3.0, 5.0];
        let stds = rolling_std(&values, 3, WindowAlignment::Trailing).unwrap();
        assert_eq!(stds[0], None);
        assert_relative_eq!(stds[1].unwrap(), 2.0_f64.sqrt());
        assert_relative_eq!(stds[2].unwrap(), 2.0);
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(rolling_mean(&[1.0], 0, WindowAlignment::Trailing).is_err());
        assert!(rolling_std(&[1.0], 0, WindowAlignment::Centered).is_err());
    }
}
