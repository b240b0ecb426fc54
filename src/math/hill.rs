//! Hill saturation and discrete derivatives.
//!
//! The Hill curve is:
//!
//! - `h(x; k, s) = x^s / (k^s + x^s)`
//!
//! Numerical notes:
//! - For `x = 0` the value is exactly `0` whenever `s > 0`.
//! - Large `x^s` overflows to `inf`; we evaluate the equivalent
//!   `1 / (1 + (k/x)^s)` instead, which stays in `[0, 1]`.

/// Hill saturation at `x` with half-saturation `k` and slope `s`.
///
/// Callers must ensure `k > 0` and `s > 0`; negative spend is treated as zero.
pub fn hill(x: f64, k: f64, s: f64) -> f64 {
    let x = x.max(0.0);
    if x == 0.0 {
        return 0.0;
    }
    1.0 / (1.0 + (k / x).powf(s))
}

/// Forward difference `dy/dx` between consecutive points (`len - 1` values).
///
/// Intervals with zero width contribute a marginal of `0`.
pub fn marginal_returns(x: &[f64], y: &[f64]) -> Vec<f64> {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| {
            let dx = xs[1] - xs[0];
            if dx.abs() < f64::EPSILON {
                0.0
            } else {
                (ys[1] - ys[0]) / dx
            }
        })
        .collect()
}

/// `true` if every value is finite and the sequence never decreases.
pub fn is_finite_non_decreasing(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite()) && values.windows(2).all(|w| w[1] >= w[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hill_limits() {
        assert_eq!(hill(0.0, 10.0, 1.2), 0.0);
        assert!((hill(10.0, 10.0, 1.2) - 0.5).abs() < 1e-12, "half-saturation at x = k");
        assert!(hill(1e300, 10.0, 3.0) <= 1.0);
        assert!(hill(1e300, 10.0, 3.0) > 0.999);
    }

    #[test]
    fn hill_matches_textbook_form() {
        let (x, k, s) = (3.0_f64, 5.0_f64, 1.3_f64);
        let direct = x.powf(s) / (k.powf(s) + x.powf(s));
        assert!((hill(x, k, s) - direct).abs() < 1e-12);
    }

    #[test]
    fn hill_has_diminishing_returns() {
        let a = hill(100.0, 1000.0, 1.0);
        let b = hill(1000.0, 1000.0, 1.0);
        let c = hill(10000.0, 1000.0, 1.0);
        assert!(a < b && b < c);
        // Per unit of spend, the second step returns far less than the first.
        assert!((c - b) / 9000.0 < (b - a) / 900.0);
    }

    #[test]
    fn marginal_returns_of_a_line() {
        let x = [0.0, 1.0, 2.0, 4.0];
        let y = [0.0, 2.0, 4.0, 8.0];
        assert_eq!(marginal_returns(&x, &y), vec![2.0, 2.0, 2.0]);
        assert!(marginal_returns(&[1.0], &[1.0]).is_empty());
    }

    #[test]
    fn monotonic_check() {
        assert!(is_finite_non_decreasing(&[0.0, 0.0, 1.0]));
        assert!(!is_finite_non_decreasing(&[0.0, 2.0, 1.0]));
        assert!(!is_finite_non_decreasing(&[0.0, f64::NAN]));
    }
}
