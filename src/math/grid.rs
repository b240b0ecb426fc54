//! Spend grid generation.

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
///
/// Returns `None` for a non-finite or inverted range, or fewer than 2 steps.
pub fn linspace(min: f64, max: f64, steps: usize) -> Option<Vec<f64>> {
    if !(min.is_finite() && max.is_finite() && max > min) || steps < 2 {
        return None;
    }

    let step = (max - min) / (steps as f64 - 1.0);
    let mut out: Vec<f64> = (0..steps).map(|i| min + step * i as f64).collect();
    // Pin the end point exactly; accumulated rounding must not move it.
    out[steps - 1] = max;
    Some(out)
}

/// `[start, start + step, ...]` strictly below `end`.
pub fn arange(start: f64, end: f64, step: f64) -> Vec<f64> {
    if !(step > 0.0 && start.is_finite() && end.is_finite()) || end <= start {
        return Vec::new();
    }
    let n = ((end - start) / step).ceil() as usize;
    (0..n).map(|i| start + step * i as f64).collect()
}
