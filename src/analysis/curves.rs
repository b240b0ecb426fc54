//! Response-curve generation.
//!
//! Every channel gets a curve; the only question is which tier produced it.
//!
//! | tier         | needs                                  | response                       |
//! |--------------|----------------------------------------|--------------------------------|
//! | `Hill`       | `ec` and `slope` for the channel       | `hill(x, ec', slope') * scale` |
//! | `Simplified` | the channel is covered by the artifact | `sqrt(x) * (8 + 3i)`           |
//! | `Synthetic`  | nothing                                | `x^(0.8 + 0.3i) * (8 + 3i) / 1000` |
//!
//! A tier either yields a finite, non-decreasing response or a
//! [`FallbackReason`]; the reason of the last failed tier is attached to the
//! curve that is finally returned.

use log::{debug, warn};
use rayon::prelude::*;

use crate::analysis::saturation::{clamp_saturation, find_saturation_point};
use crate::domain::{CurveBundle, CurveTier, FallbackReason, Param, ResponseCurve};
use crate::error::{MmmError, Result};
use crate::math::{arange, hill, is_finite_non_decreasing, linspace};
use crate::models::MediaModel;

/// Points on the spend grid for the Hill and simplified tiers.
pub const CURVE_POINTS: usize = 100;
/// Spend ceiling when the channel has no spend history.
pub const DEFAULT_MAX_SPEND: f64 = 100_000.0;
/// Observed maximum spend is doubled, then clamped to this range.
pub const MAX_SPEND_MULTIPLIER: f64 = 2.0;
pub const MIN_MAX_SPEND: f64 = 50_000.0;
pub const MAX_MAX_SPEND: f64 = 200_000.0;

/// Floor for every reported efficiency.
pub const MIN_EFFICIENCY: f64 = 0.001;

const SYNTHETIC_GRID_END: f64 = 100_000.0;
const SYNTHETIC_GRID_STEP: f64 = 1_000.0;

/// Response curves for all channels, or just `channel` when given.
///
/// Curves are independent of each other and computed in parallel.
pub fn generate_curves<M: MediaModel + Sync + ?Sized>(
    model: &M,
    channels: &[String],
    channel: Option<&str>,
) -> Result<CurveBundle> {
    let targets = super::contribution::resolve_targets(channels, channel)?;

    let curves = targets
        .par_iter()
        .map(|&idx| (channels[idx].clone(), curve_for_index(model, idx)))
        .collect();

    Ok(CurveBundle { curves })
}

/// Response curve for a single named channel.
pub fn generate_curve<M: MediaModel + ?Sized>(
    model: &M,
    channels: &[String],
    channel: &str,
) -> Result<ResponseCurve> {
    let idx = channels
        .iter()
        .position(|c| c == channel)
        .ok_or_else(|| MmmError::unknown_channel(channel, channels))?;
    Ok(curve_for_index(model, idx))
}

/// Walk the tiers for channel `idx` until one succeeds.
pub fn curve_for_index<M: MediaModel + ?Sized>(model: &M, idx: usize) -> ResponseCurve {
    let mut reason = None;

    for tier in [CurveTier::Hill, CurveTier::Simplified] {
        let attempt = match tier {
            CurveTier::Hill => hill_curve(model, idx),
            _ => simplified_curve(model, idx),
        };
        match attempt {
            Ok(mut curve) => {
                curve.fallback_reason = reason;
                return curve;
            }
            Err(why) => {
                if tier == CurveTier::Hill {
                    debug!("channel {idx}: Hill curve unavailable ({why:?})");
                } else {
                    warn!("channel {idx}: simplified curve unavailable ({why:?}), using synthetic");
                }
                reason = Some(why);
            }
        }
    }

    synthetic_curve(idx, reason)
}

type TierResult = std::result::Result<ResponseCurve, FallbackReason>;

fn hill_curve<M: MediaModel + ?Sized>(model: &M, idx: usize) -> TierResult {
    let posterior = model.posterior();
    let (Some(ec), Some(slope)) = (
        posterior.get(Param::HalfSaturation),
        posterior.get(Param::Slope),
    ) else {
        return Err(FallbackReason::MissingHillParameters);
    };
    let (Some(&ec), Some(&slope)) = (ec.get(idx), slope.get(idx)) else {
        return Err(FallbackReason::ParameterOutOfRange);
    };
    if !(ec.is_finite() && slope.is_finite()) {
        return Err(FallbackReason::InvalidHillParameters);
    }

    let spend = spend_domain(model, idx)?;
    let max_spend = spend[spend.len() - 1];
    let roi = posterior.value(Param::Roi, idx).filter(|r| r.is_finite());

    // ec and slope are rescaled onto the spend domain.
    let half_saturation = max_spend * (0.2 + ec * 0.3);
    let shape = match roi {
        Some(roi) => 0.7 + roi * 0.4 + idx as f64 * 0.1,
        None => 0.8 + idx as f64 * 0.2,
    };
    if !(half_saturation > 0.0 && half_saturation.is_finite() && shape > 0.0 && shape.is_finite())
    {
        return Err(FallbackReason::InvalidHillParameters);
    }
    let scale = match roi {
        Some(roi) => roi * max_spend * 0.15,
        None => max_spend * 0.3,
    };

    let response = spend
        .iter()
        .map(|&x| hill(x, half_saturation, shape) * scale)
        .collect();
    finish(model, idx, spend, response, CurveTier::Hill)
}

fn simplified_curve<M: MediaModel + ?Sized>(model: &M, idx: usize) -> TierResult {
    if idx >= model.channel_count() {
        return Err(FallbackReason::ChannelUnresolved);
    }
    let spend = spend_domain(model, idx)?;
    let factor = 8.0 + idx as f64 * 3.0;
    let response = spend.iter().map(|x| x.sqrt() * factor).collect();
    finish(model, idx, spend, response, CurveTier::Simplified)
}

/// Index-derived curve on a fixed grid. Never fails.
fn synthetic_curve(idx: usize, reason: Option<FallbackReason>) -> ResponseCurve {
    let i = idx as f64;
    let spend = arange(0.0, SYNTHETIC_GRID_END, SYNTHETIC_GRID_STEP);
    let exponent = 0.8 + i * 0.3;
    let factor = 8.0 + i * 3.0;
    let response = spend.iter().map(|x| x.powf(exponent) * factor / 1000.0).collect();
    let max_spend = spend.last().copied().unwrap_or(0.0);

    ResponseCurve {
        spend,
        response,
        saturation_point: clamp_saturation(40_000.0 + i * 8_000.0, max_spend),
        efficiency: (0.05 + i * 0.02).max(MIN_EFFICIENCY),
        adstock_rate: 0.2 + i * 0.1,
        tier: CurveTier::Synthetic,
        fallback_reason: reason,
    }
}

fn finish<M: MediaModel + ?Sized>(
    model: &M,
    idx: usize,
    spend: Vec<f64>,
    response: Vec<f64>,
    tier: CurveTier,
) -> TierResult {
    if !is_finite_non_decreasing(&response) {
        return Err(FallbackReason::InvalidResponse);
    }
    Ok(ResponseCurve {
        saturation_point: find_saturation_point(&spend, &response),
        efficiency: efficiency(model, idx),
        adstock_rate: adstock_rate(model, idx),
        spend,
        response,
        tier,
        fallback_reason: None,
    })
}

/// `[0, max]` with `max` derived from the channel's observed spend.
fn spend_domain<M: MediaModel + ?Sized>(
    model: &M,
    idx: usize,
) -> std::result::Result<Vec<f64>, FallbackReason> {
    let max_spend = match model.spend_tensor().and_then(|t| t.channel_max(idx)) {
        Some(observed) => {
            (observed * MAX_SPEND_MULTIPLIER).clamp(MIN_MAX_SPEND, MAX_MAX_SPEND)
        }
        None => DEFAULT_MAX_SPEND,
    };
    linspace(0.0, max_spend, CURVE_POINTS).ok_or(FallbackReason::InvalidSpendDomain)
}

/// ROI for the channel, else an index-derived default. Floored at 0.001.
pub fn efficiency<M: MediaModel + ?Sized>(model: &M, idx: usize) -> f64 {
    model
        .posterior()
        .value(Param::Roi, idx)
        .filter(|r| r.is_finite())
        .unwrap_or(1.0 + idx as f64 * 0.2)
        .max(MIN_EFFICIENCY)
}

/// Adstock posterior for the channel, else `0.3 + (0.05 i mod 0.5)`.
pub fn adstock_rate<M: MediaModel + ?Sized>(model: &M, idx: usize) -> f64 {
    model
        .posterior()
        .value(Param::AdstockRate, idx)
        .filter(|a| a.is_finite())
        .unwrap_or_else(|| 0.3 + (idx as f64 * 0.05) % 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChannelSource, ModelSource, Posterior, SpendTensor};
    use ndarray::Array3;

    struct Fixture {
        posterior: Posterior,
        spend: Option<SpendTensor>,
    }

    impl MediaModel for Fixture {
        fn model_type(&self) -> &str {
            "fixture"
        }
        fn source(&self) -> ModelSource {
            ModelSource::Trained
        }
        fn posterior(&self) -> &Posterior {
            &self.posterior
        }
        fn spend_tensor(&self) -> Option<&SpendTensor> {
            self.spend.as_ref()
        }
        fn channel_source(&self) -> ChannelSource {
            ChannelSource::default()
        }
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("C{i}")).collect()
    }

    /// Two channels with full Hill parameters; channel 1 peaks at 40k spend.
    fn full_model() -> Fixture {
        let mut posterior = Posterior::new();
        posterior.insert("roi", vec![1.5, 0.9]);
        posterior.insert("ec", vec![0.4, 0.5]);
        posterior.insert("slope", vec![1.0, 1.2]);
        posterior.insert("adstock_rate", vec![0.35, 0.25]);
        let spend = Array3::from_shape_fn((2, 4, 2), |(r, t, c)| {
            if c == 1 { 10_000.0 * (t + 1) as f64 } else { 1_000.0 + r as f64 }
        });
        Fixture {
            posterior,
            spend: Some(SpendTensor::new(spend)),
        }
    }

    fn assert_well_formed(curve: &ResponseCurve) {
        assert_eq!(curve.spend.len(), curve.response.len());
        assert_eq!(curve.spend[0], 0.0);
        assert_eq!(curve.response[0], 0.0);
        assert!(is_finite_non_decreasing(&curve.response));
        let max = curve.spend[curve.spend.len() - 1];
        assert!(curve.saturation_point >= 0.2 * max - 1e-9);
        assert!(curve.saturation_point <= 0.9 * max + 1e-9);
        assert!(curve.efficiency >= MIN_EFFICIENCY);
    }

    #[test]
    fn hill_tier_uses_posterior_values() {
        let model = full_model();
        let curve = curve_for_index(&model, 0);
        assert_eq!(curve.tier, CurveTier::Hill);
        assert_eq!(curve.fallback_reason, None);
        assert_eq!(curve.spend.len(), CURVE_POINTS);
        assert_eq!(curve.efficiency, 1.5);
        assert_eq!(curve.adstock_rate, 0.35);
        assert_well_formed(&curve);
    }

    #[test]
    fn spend_domain_tracks_observed_maximum() {
        let model = full_model();
        // Channel 0 peaks at 1001, so the domain is clamped up to the minimum.
        assert_eq!(*curve_for_index(&model, 0).spend.last().unwrap(), MIN_MAX_SPEND);
        // Channel 1 peaks at 40k, doubled to 80k.
        assert_eq!(*curve_for_index(&model, 1).spend.last().unwrap(), 80_000.0);

        let none = Fixture {
            posterior: full_model().posterior,
            spend: None,
        };
        assert_eq!(*curve_for_index(&none, 0).spend.last().unwrap(), DEFAULT_MAX_SPEND);
    }

    #[test]
    fn missing_hill_parameters_fall_back_to_simplified() {
        let mut posterior = Posterior::new();
        posterior.insert("roi", vec![1.2, 0.8]);
        let model = Fixture {
            posterior,
            spend: full_model().spend,
        };
        let curve = curve_for_index(&model, 1);
        assert_eq!(curve.tier, CurveTier::Simplified);
        assert_eq!(curve.fallback_reason, Some(FallbackReason::MissingHillParameters));
        assert!((curve.response[1] - curve.spend[1].sqrt() * 11.0).abs() < 1e-9);
        assert_eq!(curve.efficiency, 0.8);
        assert_well_formed(&curve);
    }

    #[test]
    fn non_positive_half_saturation_is_invalid() {
        let mut model = full_model();
        model.posterior.insert("ec", vec![-1.0, 0.5]);
        let curve = curve_for_index(&model, 0);
        assert_eq!(curve.tier, CurveTier::Simplified);
        assert_eq!(curve.fallback_reason, Some(FallbackReason::InvalidHillParameters));
        assert_well_formed(&curve);
    }

    #[test]
    fn uncovered_channel_is_synthetic() {
        let model = full_model();
        let curve = curve_for_index(&model, 3);
        assert_eq!(curve.tier, CurveTier::Synthetic);
        assert_eq!(curve.fallback_reason, Some(FallbackReason::ChannelUnresolved));
        assert_eq!(curve.spend.len(), 100);
        assert_eq!(*curve.spend.last().unwrap(), 99_000.0);
        assert!((curve.efficiency - 0.11).abs() < 1e-12);
        assert!((curve.adstock_rate - 0.5).abs() < 1e-12);
        // 40k + 3 * 8k = 64k, inside [0.2, 0.9] x 99k.
        assert_eq!(curve.saturation_point, 64_000.0);
        assert_well_formed(&curve);
    }

    #[test]
    fn fallback_parameters_without_posterior() {
        let model = Fixture {
            posterior: Posterior::new(),
            spend: None,
        };
        assert!((efficiency(&model, 2) - 1.4).abs() < 1e-12);
        assert!((adstock_rate(&model, 2) - 0.4).abs() < 1e-12);

        let mut posterior = Posterior::new();
        posterior.insert("roi", vec![-3.0]);
        let negative = Fixture { posterior, spend: None };
        assert_eq!(efficiency(&negative, 0), MIN_EFFICIENCY);
    }

    #[test]
    fn all_curves_are_generated_by_name() {
        let model = full_model();
        let bundle = generate_curves(&model, &names(2), None).unwrap();
        assert_eq!(bundle.curves.len(), 2);
        for curve in bundle.curves.values() {
            assert_well_formed(curve);
        }

        let single = generate_curves(&model, &names(2), Some("C1")).unwrap();
        assert_eq!(single.curves.keys().collect::<Vec<_>>(), vec!["C1"]);
        assert_eq!(single.curves["C1"], generate_curve(&model, &names(2), "C1").unwrap());
    }

    #[test]
    fn unknown_channel_is_an_error() {
        let model = full_model();
        let err = generate_curves(&model, &names(2), Some("Radio")).unwrap_err();
        assert!(matches!(err, MmmError::UnknownChannel { .. }));
        assert!(generate_curve(&model, &names(2), "Radio").is_err());
    }
}
