//! Contribution series and channel summaries.
//!
//! A channel's contribution at period `t` is `roi[channel] * spend[t, channel]`,
//! where `spend` is the region-averaged spend history. Both inputs are required;
//! without either one there is nothing meaningful to report, so their absence is
//! an error rather than a fallback.

use std::collections::BTreeMap;

use log::warn;
use ndarray::Array2;

use crate::domain::{ChannelSummary, ContributionBundle, Param, SeriesStats};
use crate::error::{MmmError, Result};
use crate::math::{summarize, zero_non_finite};
use crate::models::MediaModel;

/// Totals at or below this are treated as zero when dividing.
pub const MIN_TOTAL: f64 = 1e-10;

/// Contribution series for every channel of a model.
#[derive(Debug, Clone)]
pub struct ContributionTable {
    pub channels: Vec<String>,
    pub series: Vec<Vec<f64>>,
    pub stats: Vec<SeriesStats>,
    /// Region-averaged spend, `(time, channel)`.
    pub spend: Array2<f64>,
}

impl ContributionTable {
    /// Build contribution series for all `channels` (positional).
    pub fn build<M: MediaModel + ?Sized>(model: &M, channels: &[String]) -> Result<Self> {
        let roi = model
            .posterior()
            .get(Param::Roi)
            .ok_or_else(|| MmmError::MissingParameter(Param::Roi.name().to_string()))?;
        let spend = model
            .spend_tensor()
            .filter(|t| !t.is_empty())
            .and_then(|t| t.region_mean())
            .ok_or_else(|| MmmError::MissingParameter("media_spend".to_string()))?;

        let series: Vec<Vec<f64>> = (0..channels.len())
            .map(|idx| channel_contributions(roi, &spend, idx))
            .collect();
        let stats = series.iter().map(|s| summarize(s)).collect();

        Ok(Self {
            channels: channels.to_vec(),
            series,
            stats,
            spend,
        })
    }

    pub fn time_period_count(&self) -> usize {
        self.spend.nrows()
    }

    /// `(total, average per period)` of the region-averaged spend for a channel.
    ///
    /// Contributions are computed on the same basis, so `total / spend` is the
    /// channel's ROI. A channel with no spend column reports zero spend.
    fn channel_spend(&self, idx: usize) -> (f64, f64) {
        if idx >= self.spend.ncols() {
            warn!("No spend history for channel {}; reporting zero spend", self.channels[idx]);
            return (0.0, 0.0);
        }
        let column = self.spend.column(idx);
        (column.sum(), column.mean().unwrap_or(0.0))
    }

    /// Business summary for every channel.
    ///
    /// Shares are computed over positive contributions only, so they sum to 1
    /// whenever any channel contributes.
    pub fn summaries(&self) -> Vec<ChannelSummary> {
        let positive_total: f64 = self.stats.iter().map(|s| s.total.max(0.0)).sum();

        self.channels
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let stats = &self.stats[idx];
                let (total_spend, avg_weekly_spend) = self.channel_spend(idx);

                let contribution_share = if positive_total > MIN_TOTAL {
                    stats.total.max(0.0) / positive_total
                } else {
                    0.0
                };
                let efficiency = if total_spend > MIN_TOTAL {
                    stats.total / total_spend
                } else {
                    0.0
                };

                ChannelSummary {
                    name: name.clone(),
                    total_spend,
                    total_contribution: stats.total,
                    contribution_share,
                    efficiency,
                    avg_weekly_spend,
                    avg_weekly_contribution: stats.mean,
                }
            })
            .collect()
    }
}

/// `roi * spend` over time for one channel, with non-finite values zeroed.
///
/// A channel index beyond the ROI vector or the spend columns yields a zero
/// series of the right length.
pub fn channel_contributions(roi: &[f64], spend: &Array2<f64>, idx: usize) -> Vec<f64> {
    let n_times = spend.nrows();
    if idx >= roi.len() || idx >= spend.ncols() {
        warn!(
            "Channel index {idx} not covered by ROI ({}) or spend data ({} channels); reporting zeros",
            roi.len(),
            spend.ncols()
        );
        return vec![0.0; n_times];
    }

    let channel_roi = roi[idx];
    let mut series: Vec<f64> = spend.column(idx).iter().map(|s| channel_roi * s).collect();

    let replaced = zero_non_finite(&mut series);
    if replaced > 0 {
        warn!("Found {replaced} invalid contribution values for channel {idx}; set to 0");
    }
    series
}

/// Resolve an optional channel filter against the known names.
pub fn resolve_targets(channels: &[String], channel: Option<&str>) -> Result<Vec<usize>> {
    match channel {
        None => Ok((0..channels.len()).collect()),
        Some(name) => channels
            .iter()
            .position(|c| c == name)
            .map(|idx| vec![idx])
            .ok_or_else(|| MmmError::unknown_channel(name, channels)),
    }
}

/// Contribution series plus summary statistics, optionally for one channel.
pub fn contribution_data<M: MediaModel + ?Sized>(
    model: &M,
    channels: &[String],
    channel: Option<&str>,
) -> Result<ContributionBundle> {
    let targets = resolve_targets(channels, channel)?;
    let table = ContributionTable::build(model, channels)?;

    let mut data = BTreeMap::new();
    let mut summary = BTreeMap::new();
    for &idx in &targets {
        let name = &table.channels[idx];
        data.insert(name.clone(), table.series[idx].clone());
        summary.insert(name.clone(), table.stats[idx]);
    }

    Ok(ContributionBundle {
        channels: targets.iter().map(|&i| table.channels[i].clone()).collect(),
        data,
        summary,
        shape: [targets.len(), table.time_period_count()],
    })
}

/// Channel summaries keyed by name, optionally restricted to one channel.
pub fn channel_summary<M: MediaModel + ?Sized>(
    model: &M,
    channels: &[String],
    channel: Option<&str>,
) -> Result<BTreeMap<String, ChannelSummary>> {
    let targets = resolve_targets(channels, channel)?;
    let table = ContributionTable::build(model, channels)?;
    let mut all = table.summaries();

    // Descending index order keeps earlier indices valid while removing.
    let mut out = BTreeMap::new();
    for idx in targets.into_iter().rev() {
        let summary = all.swap_remove(idx);
        out.insert(summary.name.clone(), summary);
    }
    Ok(out)
}
