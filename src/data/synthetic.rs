//! Synthetic model generation.
//!
//! Used whenever the trained artifact's runtime is unavailable. Output is a
//! plausible model: per-channel posterior means drawn from fixed ranges and an
//! upward-trending spend history. Everything is deterministic given the seed.

use ndarray::{Array3, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Uniform};

use crate::domain::{Param, Posterior, SpendTensor};
use crate::error::{MmmError, Result};
use crate::models::SyntheticModel;

pub const DEFAULT_CHANNELS: usize = 5;
pub const DEFAULT_TIME_PERIODS: usize = 156;
pub const DEFAULT_REGIONS: usize = 40;

/// Ranges for each generated parameter (inclusive).
const ROI_RANGE: (f64, f64) = (0.8, 1.8);
const HALF_SATURATION_RANGE: (f64, f64) = (0.2, 0.6);
const SLOPE_RANGE: (f64, f64) = (0.8, 1.4);
const CONTRIBUTION_RANGE: (f64, f64) = (0.3, 0.8);
const ADSTOCK_RANGE: (f64, f64) = (0.2, 0.5);

/// Per-period base spend before accumulation.
const BASE_SPEND_RANGE: (f64, f64) = (500.0, 2500.0);

/// Extents of a generated model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticDims {
    pub channels: usize,
    pub time_periods: usize,
    pub regions: usize,
}

impl Default for SyntheticDims {
    fn default() -> Self {
        Self {
            channels: DEFAULT_CHANNELS,
            time_periods: DEFAULT_TIME_PERIODS,
            regions: DEFAULT_REGIONS,
        }
    }
}

/// Generate a synthetic model with the default extents.
pub fn generate(seed: u64) -> Result<SyntheticModel> {
    generate_with(seed, SyntheticDims::default())
}

/// Generate a synthetic model.
///
/// Parameters are drawn in a fixed order (ROI, half-saturation, slope,
/// contribution coefficient, adstock) followed by the spend tensor, so the same
/// seed always reproduces the same model bit for bit.
pub fn generate_with(seed: u64, dims: SyntheticDims) -> Result<SyntheticModel> {
    if dims.channels == 0 {
        return Err(MmmError::InvalidSynthetic("channel count must be > 0".to_string()));
    }

    let mut rng = StdRng::seed_from_u64(seed);

    let mut posterior = Posterior::new();
    for (param, range) in [
        (Param::Roi, ROI_RANGE),
        (Param::HalfSaturation, HALF_SATURATION_RANGE),
        (Param::Slope, SLOPE_RANGE),
        (Param::ContributionCoefficient, CONTRIBUTION_RANGE),
        (Param::AdstockRate, ADSTOCK_RANGE),
    ] {
        let values = draw_uniform(&mut rng, range, dims.channels);
        ensure_finite(param.name(), &values)?;
        posterior.insert(param.name(), values);
    }

    let base = Uniform::new_inclusive(BASE_SPEND_RANGE.0, BASE_SPEND_RANGE.1);
    let mut spend = Array3::from_shape_simple_fn(
        (dims.regions, dims.time_periods, dims.channels),
        || base.sample(&mut rng),
    );

    // Cumulative sum along time, per region and channel.
    for mut region in spend.axis_iter_mut(Axis(0)) {
        for mut channel in region.axis_iter_mut(Axis(1)) {
            let mut running = 0.0;
            for v in channel.iter_mut() {
                running += *v;
                *v = running;
            }
        }
    }

    if let Some(bad) = spend.iter().find(|v| !v.is_finite()) {
        return Err(MmmError::InvalidSynthetic(format!("spend tensor contains {bad}")));
    }

    let spend = SpendTensor::new(spend);
    let total_spend = spend.region_sum();
    let channel_names = (0..dims.channels).map(|i| format!("Channel_{i}")).collect();

    Ok(SyntheticModel {
        seed,
        posterior,
        spend,
        total_spend,
        channel_names,
    })
}

fn draw_uniform(rng: &mut StdRng, (low, high): (f64, f64), n: usize) -> Vec<f64> {
    let dist = Uniform::new_inclusive(low, high);
    (0..n).map(|_| dist.sample(rng)).collect()
}

fn ensure_finite(name: &str, values: &[f64]) -> Result<()> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(bad) => Err(MmmError::InvalidSynthetic(format!("parameter '{name}' drew {bad}"))),
        None => Ok(()),
    }
}
