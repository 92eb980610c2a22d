//! Order statistics

use crate::{MathError, Result};

/// Percentile with linear interpolation between closest ranks.
///
/// `q` is expressed in percent (`0.0..=100.0`). NaN values are ignored.
pub fn percentile(values: &[f64], q: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Percentile must be between 0 and 100, got {}",
            q
        )));
    }

    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take a percentile of an empty sample".to_string(),
        ));
    }
    sorted.sort_by(f64::total_cmp);

    percentile_of_sorted(&sorted, q)
}

/// Same as [`percentile`] for a slice that is already sorted and NaN free
pub fn percentile_of_sorted(sorted: &[f64], q: f64) -> Result<f64> {
    if sorted.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take a percentile of an empty sample".to_string(),
        ));
    }
    let q = q.clamp(0.0, 100.0);
    let position = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Median of a sample
pub fn median(values: &[f64]) -> Result<f64> {
    percentile(values, 50.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let values = vec![4.0, 1.0, 3.0, 2.0];
        assert!((percentile(&values, 0.0).unwrap() - 1.0).abs() < 1e-12);
        assert!((percentile(&values, 100.0).unwrap() - 4.0).abs() < 1e-12);
        assert!((percentile(&values, 25.0).unwrap() - 1.75).abs() < 1e-12);
        assert!((median(&values).unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_rejects_bad_input() {
        assert!(percentile(&[], 50.0).is_err());
        assert!(percentile(&[f64::NAN], 50.0).is_err());
        assert!(percentile(&[1.0], 120.0).is_err());
    }

    #[test]
    fn test_percentile_of_sorted_empty_slice() {
        assert!(matches!(
            percentile_of_sorted(&[], 50.0),
            Err(MathError::InsufficientData(_))
        ));
        assert_eq!(percentile_of_sorted(&[2.0, 4.0], 50.0).unwrap(), 3.0);
    }
}
