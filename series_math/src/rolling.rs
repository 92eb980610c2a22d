//! Rolling aggregation over grouped, sorted observations
//!
//! Used to smooth forecast errors across horizons: observations are
//! grouped by a sorted integer key (the horizon) and every output value
//! aggregates at least `window` observations, taken from the key itself
//! and from the keys just below it.

use crate::{MathError, Result};

/// One contiguous run of equal keys
struct Group {
    key: i64,
    start: usize,
    end: usize,
}

fn group_sorted(values: &[f64], keys: &[i64], window: usize) -> Result<Vec<Group>> {
    if values.len() != keys.len() {
        return Err(MathError::InvalidInput(format!(
            "Got {} values but {} keys",
            values.len(),
            keys.len()
        )));
    }
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Rolling window must be at least 1".to_string(),
        ));
    }
    if keys.windows(2).any(|pair| pair[1] < pair[0]) {
        return Err(MathError::InvalidInput(
            "Keys must be sorted in ascending order".to_string(),
        ));
    }

    let mut groups: Vec<Group> = Vec::new();
    for (i, &key) in keys.iter().enumerate() {
        match groups.last_mut() {
            Some(group) if group.key == key => group.end = i + 1,
            _ => groups.push(Group {
                key,
                start: i,
                end: i + 1,
            }),
        }
    }
    Ok(groups)
}

/// Trailing rolling mean per key.
///
/// Walking from the largest key down, each output averages exactly
/// `window` observations; when the earliest contributing key holds more
/// observations than needed, its mean stands in for the excess. Keys too
/// close to the start to gather `window` observations are dropped.
pub fn rolling_mean_by_group(values: &[f64], keys: &[i64], window: usize) -> Result<Vec<(i64, f64)>> {
    let groups = group_sorted(values, keys, window)?;
    let sums: Vec<f64> = groups
        .iter()
        .map(|g| values[g.start..g.end].iter().sum())
        .collect();
    let counts: Vec<usize> = groups.iter().map(|g| g.end - g.start).collect();

    let mut result = vec![0.0; groups.len()];
    let mut trailing = groups.len() as isize - 1;
    let mut x_sum = 0.0;
    let mut n_sum = 0usize;

    for i in (0..groups.len()).rev() {
        x_sum += sums[i];
        n_sum += counts[i];
        while n_sum >= window && trailing >= 0 {
            let t = trailing as usize;
            let excess_n = n_sum - window;
            let excess_x = excess_n as f64 * sums[i] / counts[i] as f64;
            result[t] = (x_sum - excess_x) / window as f64;
            x_sum -= sums[t];
            n_sum -= counts[t];
            trailing -= 1;
        }
    }

    let first = (trailing + 1) as usize;
    Ok(groups[first..]
        .iter()
        .zip(&result[first..])
        .map(|(g, &v)| (g.key, v))
        .collect())
}

/// Trailing rolling median per key.
///
/// Each key contributes all of its own observations, topped up with the
/// observations immediately before it until `window` values are collected.
pub fn rolling_median_by_group(values: &[f64], keys: &[i64], window: usize) -> Result<Vec<(i64, f64)>> {
    let groups = group_sorted(values, keys, window)?;

    let mut result = Vec::new();
    for group in groups.iter().rev() {
        let mut sample: Vec<f64> = values[group.start..group.end].to_vec();
        let mut next = group.start;
        while sample.len() < window && next > 0 {
            next -= 1;
            sample.push(values[next]);
        }
        if sample.len() < window {
            break;
        }
        result.push((group.key, crate::stats::median(&sample)?));
    }

    result.reverse();
    Ok(result)
}
