//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - read from a trained-model artifact (posterior summaries, spend history)
//! - computed per request (contribution series, summaries, response curves)
//! - handed to the dashboard/export layer as JSON

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use ndarray::{Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

/// Posterior parameters the engine knows how to consume.
///
/// Each has a canonical name plus the legacy names older artifacts were saved
/// with (`roi_m`, `ec_m`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    Roi,
    /// Half-saturation ratio of the Hill curve.
    HalfSaturation,
    /// Hill slope.
    Slope,
    AdstockRate,
    ContributionCoefficient,
}

impl Param {
    pub const ALL: [Param; 5] = [
        Param::Roi,
        Param::HalfSaturation,
        Param::Slope,
        Param::AdstockRate,
        Param::ContributionCoefficient,
    ];

    /// Canonical posterior name.
    pub fn name(self) -> &'static str {
        match self {
            Param::Roi => "roi",
            Param::HalfSaturation => "ec",
            Param::Slope => "slope",
            Param::AdstockRate => "adstock_rate",
            Param::ContributionCoefficient => "contribution_coefficient",
        }
    }

    /// Names accepted on lookup, canonical first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Param::Roi => &["roi", "roi_m"],
            Param::HalfSaturation => &["ec", "ec_m"],
            Param::Slope => &["slope", "slope_m"],
            Param::AdstockRate => &["adstock_rate", "alpha_m"],
            Param::ContributionCoefficient => &["contribution_coefficient", "contr_coef"],
        }
    }
}

/// Named posterior summary: one averaged scalar per channel for each parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Posterior {
    values: BTreeMap<String, Vec<f64>>,
}

impl Posterior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, per_channel: Vec<f64>) {
        self.values.insert(name.into(), per_channel);
    }

    /// Look a parameter up by any of its accepted names.
    pub fn get(&self, param: Param) -> Option<&[f64]> {
        param
            .aliases()
            .iter()
            .find_map(|name| self.values.get(*name))
            .map(Vec::as_slice)
    }

    pub fn contains(&self, param: Param) -> bool {
        self.get(param).is_some()
    }

    /// Per-channel value, if the parameter exists and covers `channel_idx`.
    pub fn value(&self, param: Param, channel_idx: usize) -> Option<f64> {
        self.get(param).and_then(|v| v.get(channel_idx).copied())
    }

    /// Raw parameter names as stored in the artifact.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Longest per-channel vector across parameters.
    pub fn channel_extent(&self) -> usize {
        self.values.values().map(Vec::len).max().unwrap_or(0)
    }
}

/// Media spend history, dimensions `(region, time, channel)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendTensor(Array3<f64>);

impl SpendTensor {
    pub fn new(values: Array3<f64>) -> Self {
        Self(values)
    }

    /// Build from nested `[region][time][channel]` vectors.
    ///
    /// Rejects ragged input and non-finite or negative values.
    pub fn from_nested(nested: Vec<Vec<Vec<f64>>>) -> Result<Self, String> {
        let regions = nested.len();
        let times = nested.first().map(Vec::len).unwrap_or(0);
        let channels = nested
            .first()
            .and_then(|r| r.first())
            .map(Vec::len)
            .unwrap_or(0);

        let mut flat = Vec::with_capacity(regions * times * channels);
        for (r, region) in nested.into_iter().enumerate() {
            if region.len() != times {
                return Err(format!(
                    "spend tensor region {r} has {} time periods, expected {times}",
                    region.len()
                ));
            }
            for (t, row) in region.into_iter().enumerate() {
                if row.len() != channels {
                    return Err(format!(
                        "spend tensor region {r} time {t} has {} channels, expected {channels}",
                        row.len()
                    ));
                }
                for v in row {
                    if !(v.is_finite() && v >= 0.0) {
                        return Err(format!("spend tensor value {v} at region {r} time {t} is invalid"));
                    }
                    flat.push(v);
                }
            }
        }

        Array3::from_shape_vec((regions, times, channels), flat)
            .map(Self)
            .map_err(|e| format!("spend tensor shape error: {e}"))
    }

    pub fn values(&self) -> &Array3<f64> {
        &self.0
    }

    pub fn region_count(&self) -> usize {
        self.0.dim().0
    }

    pub fn time_period_count(&self) -> usize {
        self.0.dim().1
    }

    pub fn channel_count(&self) -> usize {
        self.0.dim().2
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Average over regions: `(time, channel)`.
    pub fn region_mean(&self) -> Option<Array2<f64>> {
        self.0.mean_axis(Axis(0))
    }

    /// Sum over regions: `(time, channel)`.
    pub fn region_sum(&self) -> Array2<f64> {
        self.0.sum_axis(Axis(0))
    }

    /// Largest single spend value observed for a channel.
    pub fn channel_max(&self, channel_idx: usize) -> Option<f64> {
        if channel_idx >= self.channel_count() || self.is_empty() {
            return None;
        }
        self.0
            .index_axis(Axis(2), channel_idx)
            .iter()
            .copied()
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }
}

/// Where channel names can come from, in the shapes artifacts have used over time.
///
/// Fields hold raw JSON so the extractor can decide whether each one is
/// well-typed instead of failing deserialization of the whole artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelSource {
    /// Explicit per-channel names (`channel_names` or `media.columns`).
    pub explicit: Option<serde_json::Value>,
    /// Named coordinate on the media data (`media.coords.media_channel`).
    pub coordinate: Option<serde_json::Value>,
    /// Model specification's list (`model_spec.media_names`).
    pub spec_names: Option<serde_json::Value>,
    /// Bare channel count (`n_media_channels`).
    pub channel_count: Option<usize>,
}

/// Whether the cached model came from a trained artifact or was generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    Trained,
    Synthetic,
}

/// Summary statistics over one contribution series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub mean: f64,
    pub total: f64,
    pub max: f64,
    pub min: f64,
}

/// Output of `get_contribution_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionBundle {
    pub channels: Vec<String>,
    pub data: BTreeMap<String, Vec<f64>>,
    pub summary: BTreeMap<String, SeriesStats>,
    /// `[channel_count, time_period_count]`.
    pub shape: [usize; 2],
}

/// Per-channel business summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub name: String,
    pub total_spend: f64,
    pub total_contribution: f64,
    pub contribution_share: f64,
    pub efficiency: f64,
    pub avg_weekly_spend: f64,
    pub avg_weekly_contribution: f64,
}

/// Which algorithm produced a response curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveTier {
    /// Hill saturation from `ec` / `slope` posteriors.
    Hill,
    /// `sqrt(spend)` curve over the observed spend domain.
    Simplified,
    /// Fixed grid, parameters derived from the channel index only.
    Synthetic,
}

/// Why a curve was produced by a lower tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// `ec` or `slope` is absent from the posterior.
    MissingHillParameters,
    /// A Hill parameter exists but has no value for this channel.
    ParameterOutOfRange,
    /// Hill parameters are non-finite or yield a non-positive shape.
    InvalidHillParameters,
    /// The computed response is non-finite or decreasing.
    InvalidResponse,
    /// The channel index is not covered by any data in the artifact.
    ChannelUnresolved,
    /// The spend domain could not be built.
    InvalidSpendDomain,
}

/// Response (saturation) curve for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseCurve {
    pub spend: Vec<f64>,
    pub response: Vec<f64>,
    pub saturation_point: f64,
    pub efficiency: f64,
    pub adstock_rate: f64,
    pub tier: CurveTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

/// Output of `get_response_curves`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveBundle {
    pub curves: BTreeMap<String, ResponseCurve>,
}

/// Descriptive information about the cached model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub source: ModelSource,
    pub path: PathBuf,
    pub loaded_at: DateTime<Utc>,
    pub channels: Vec<String>,
    pub channel_count: usize,
    pub time_period_count: usize,
    pub region_count: usize,
    /// Spend over all regions, periods and channels, when the artifact has it.
    pub total_media_spend: Option<f64>,
    pub parameters: Vec<String>,
    pub missing: Vec<String>,
    /// ROI posterior and spend tensor are both present.
    pub has_required: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posterior_lookup_accepts_legacy_names() {
        let mut posterior = Posterior::new();
        posterior.insert("roi_m", vec![1.2, 0.9]);
        posterior.insert("alpha_m", vec![0.3, 0.4]);

        assert_eq!(posterior.get(Param::Roi), Some(&[1.2, 0.9][..]));
        assert_eq!(posterior.value(Param::AdstockRate, 1), Some(0.4));
        assert_eq!(posterior.value(Param::AdstockRate, 2), None);
        assert!(!posterior.contains(Param::Slope));
    }

    #[test]
    fn canonical_name_wins_over_alias() {
        let mut posterior = Posterior::new();
        posterior.insert("roi", vec![2.0]);
        posterior.insert("roi_m", vec![1.0]);
        assert_eq!(posterior.value(Param::Roi, 0), Some(2.0));
    }

    #[test]
    fn spend_tensor_rejects_ragged_input() {
        let nested = vec![vec![vec![1.0, 2.0]], vec![vec![1.0]]];
        let err = SpendTensor::from_nested(nested).unwrap_err();
        assert!(err.contains("channels"), "{err}");
    }

    #[test]
    fn spend_tensor_rejects_negative_values() {
        let nested = vec![vec![vec![1.0, -2.0]]];
        assert!(SpendTensor::from_nested(nested).is_err());
    }

    #[test]
    fn spend_tensor_reductions() {
        // 2 regions x 2 periods x 1 channel.
        let nested = vec![vec![vec![1.0], vec![3.0]], vec![vec![5.0], vec![7.0]]];
        let tensor = SpendTensor::from_nested(nested).unwrap();
        assert_eq!(tensor.region_count(), 2);
        assert_eq!(tensor.time_period_count(), 2);
        assert_eq!(tensor.channel_count(), 1);

        let mean = tensor.region_mean().unwrap();
        assert_eq!(mean[[0, 0]], 3.0);
        assert_eq!(mean[[1, 0]], 5.0);

        let sum = tensor.region_sum();
        assert_eq!(sum[[1, 0]], 10.0);

        assert_eq!(tensor.channel_max(0), Some(7.0));
        assert_eq!(tensor.channel_max(1), None);
    }
}
