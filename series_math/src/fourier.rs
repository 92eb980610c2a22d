//! Fourier features for periodic components

use std::f64::consts::PI;

/// Build the Fourier design block for a periodic signal.
///
/// Each row holds `sin(2πkt/P), cos(2πkt/P)` for `k = 1..=order`, giving
/// `2 * order` columns. `t` and `period` must share a unit (days in
/// practice).
pub fn fourier_series(t: &[f64], period: f64, order: usize) -> Vec<Vec<f64>> {
    t.iter()
        .map(|&ti| {
            let mut row = Vec::with_capacity(2 * order);
            for k in 1..=order {
                let angle = 2.0 * PI * k as f64 * ti / period;
                row.push(angle.sin());
                row.push(angle.cos());
            }
            row
        })
        .collect()
}

/// Concatenate design blocks column-wise. All blocks must have the same
/// number of rows.
pub fn hstack(blocks: &[Vec<Vec<f64>>]) -> Vec<Vec<f64>> {
    let rows = blocks.first().map(Vec::len).unwrap_or(0);
    (0..rows)
        .map(|i| {
            blocks
                .iter()
                .flat_map(|block| block[i].iter().copied())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourier_shape_and_periodicity() {
        let t = vec![0.0, 1.0, 7.0];
        let block = fourier_series(&t, 7.0, 3);

        assert_eq!(block.len(), 3);
        assert_eq!(block[0].len(), 6);
        for (a, b) in block[0].iter().zip(&block[2]) {
            assert!((a - b).abs() < 1e-9);
        }
        assert!((block[0][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hstack() {
        let a = vec![vec![1.0], vec![2.0]];
        let b = vec![vec![3.0, 4.0], vec![5.0, 6.0]];
        let stacked = hstack(&[a, b]);
        assert_eq!(stacked, vec![vec![1.0, 3.0, 4.0], vec![2.0, 5.0, 6.0]]);
    }
}
