//! Descriptive statistics over cleaned series.

use log::warn;

use crate::domain::SeriesStats;

/// Replace NaN/Inf with `0.0` in place; returns how many values were replaced.
pub fn zero_non_finite(values: &mut [f64]) -> usize {
    let mut replaced = 0;
    for v in values.iter_mut().filter(|v| !v.is_finite()) {
        *v = 0.0;
        replaced += 1;
    }
    replaced
}

/// Mean / total / max / min over the finite values of `values`.
///
/// An empty (or all non-finite) series yields all zeros and a warning.
pub fn summarize(values: &[f64]) -> SeriesStats {
    let mut n = 0usize;
    let mut total = 0.0;
    let mut max = f64::NEG_INFINITY;
    let mut min = f64::INFINITY;

    for &v in values.iter().filter(|v| v.is_finite()) {
        n += 1;
        total += v;
        max = max.max(v);
        min = min.min(v);
    }

    if n == 0 {
        warn!("No valid values to summarize; reporting zeros");
        return SeriesStats::default();
    }

    SeriesStats {
        mean: total / n as f64,
        total,
        max,
        min,
    }
}
