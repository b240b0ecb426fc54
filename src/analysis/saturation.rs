//! Saturation-point detection.
//!
//! The saturation point is the first spend level (after skipping the noisy
//! start of the curve) where the marginal return falls below a fixed fraction
//! of its peak. The result is always clamped to `[20%, 90%]` of the maximum
//! spend so edge artifacts are never reported as saturation.

use crate::math::marginal_returns;

/// Fraction of the peak marginal return that counts as saturated.
pub const SATURATION_THRESHOLD: f64 = 0.1;
/// Leading points ignored by the search (numerical noise near zero spend).
pub const SATURATION_SKIP_POINTS: usize = 5;
/// Used when marginal returns are empty or never positive.
pub const SATURATION_DEGENERATE: f64 = 0.6;
/// Used when marginal returns never drop below the threshold.
pub const SATURATION_CONSERVATIVE: f64 = 0.7;
pub const SATURATION_MIN_BOUND: f64 = 0.2;
pub const SATURATION_MAX_BOUND: f64 = 0.9;

/// Spend level at which `response` saturates.
pub fn find_saturation_point(spend: &[f64], response: &[f64]) -> f64 {
    let max_spend = max_spend(spend);
    let marginal = marginal_returns(spend, response);
    let max_marginal = marginal
        .iter()
        .copied()
        .filter(|m| m.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);

    let raw = if marginal.is_empty() || !(max_marginal > 0.0) {
        max_spend * SATURATION_DEGENERATE
    } else {
        let cutoff = max_marginal * SATURATION_THRESHOLD;
        marginal
            .iter()
            .enumerate()
            .skip(SATURATION_SKIP_POINTS)
            .find(|(_, m)| **m < cutoff)
            .map(|(i, _)| spend[i])
            .unwrap_or(max_spend * SATURATION_CONSERVATIVE)
    };

    clamp_saturation(raw, max_spend)
}

/// Clamp a saturation estimate to `[20%, 90%]` of `max_spend`.
pub fn clamp_saturation(point: f64, max_spend: f64) -> f64 {
    let max_spend = if max_spend.is_finite() { max_spend.max(0.0) } else { 0.0 };
    let point = if point.is_finite() {
        point
    } else {
        max_spend * SATURATION_DEGENERATE
    };
    point.clamp(max_spend * SATURATION_MIN_BOUND, max_spend * SATURATION_MAX_BOUND)
}

fn max_spend(spend: &[f64]) -> f64 {
    spend.iter().copied().filter(|s| s.is_finite()).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{hill, linspace};

    #[test]
    fn detects_first_point_below_threshold() {
        let spend = linspace(0.0, 100.0, 101).unwrap();
        // Marginal return 10 up to spend 50, then 0.5.
        let response: Vec<f64> = spend
            .iter()
            .map(|&x| if x <= 50.0 { 10.0 * x } else { 500.0 + 0.5 * (x - 50.0) })
            .collect();
        assert_eq!(find_saturation_point(&spend, &response), 50.0);
    }

    #[test]
    fn linear_response_uses_conservative_estimate() {
        let spend = linspace(0.0, 1000.0, 100).unwrap();
        let response: Vec<f64> = spend.iter().map(|x| 3.0 * x).collect();
        assert!((find_saturation_point(&spend, &response) - 700.0).abs() < 1e-9);
    }

    #[test]
    fn flat_response_is_degenerate() {
        let spend = linspace(0.0, 1000.0, 100).unwrap();
        let response = vec![0.0; 100];
        assert!((find_saturation_point(&spend, &response) - 600.0).abs() < 1e-9);
        assert!((find_saturation_point(&[5.0], &[1.0]) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn early_saturation_is_clamped_to_lower_bound() {
        // Steep Hill curve saturates almost immediately.
        let spend = linspace(0.0, 1000.0, 100).unwrap();
        let response: Vec<f64> = spend.iter().map(|&x| hill(x, 5.0, 3.0)).collect();
        assert!((find_saturation_point(&spend, &response) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn skipped_points_are_ignored() {
        let spend = linspace(0.0, 100.0, 11).unwrap();
        // Marginal dips at index 1 (inside the skip window) and at index 7.
        let response = [0.0, 10.0, 10.1, 20.0, 30.0, 40.0, 50.0, 60.0, 60.1, 70.0, 80.0];
        assert_eq!(find_saturation_point(&spend, &response), 70.0);
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_saturation(1.0, 100.0), 20.0);
        assert_eq!(clamp_saturation(95.0, 100.0), 90.0);
        assert_eq!(clamp_saturation(f64::NAN, 100.0), 60.0);
    }
}
