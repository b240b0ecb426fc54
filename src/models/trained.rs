//! Trained model artifacts read from disk.
//!
//! The on-disk form is JSON. Posterior entries may be stored either as one mean
//! per channel or as a `draws x channel` matrix; the latter is averaged here so
//! the rest of the engine only ever sees per-channel means.
//!
//! Several channel-name shapes are accepted because artifacts written by
//! different pipeline versions put them in different places.

use std::collections::BTreeMap;

use ndarray::Array2;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{ChannelSource, ModelSource, Posterior, SpendTensor};
use crate::models::MediaModel;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    model_type: String,
    posterior: Posterior,
    spend: Option<SpendTensor>,
    total_spend: Option<Array2<f64>>,
    channels: ChannelSource,
    n_times: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ArtifactFile {
    #[serde(default)]
    model_type: Option<String>,
    #[serde(default)]
    posterior: BTreeMap<String, PosteriorEntry>,
    #[serde(default)]
    media_spend: Option<Vec<Vec<Vec<f64>>>>,
    #[serde(default)]
    total_spend: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    channel_names: Option<Value>,
    #[serde(default)]
    media: Option<MediaSection>,
    #[serde(default)]
    model_spec: Option<ModelSpecSection>,
    #[serde(default)]
    n_media_channels: Option<usize>,
    #[serde(default)]
    n_times: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PosteriorEntry {
    Means(Vec<f64>),
    Draws(Vec<Vec<f64>>),
}

#[derive(Debug, Deserialize)]
struct MediaSection {
    #[serde(default)]
    columns: Option<Value>,
    #[serde(default)]
    coords: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ModelSpecSection {
    #[serde(default)]
    media_names: Option<Value>,
}

/// Coordinate name carrying channel labels on the media data.
const CHANNEL_COORD: &str = "media_channel";

impl TrainedModel {
    /// Parse and validate an artifact.
    ///
    /// Any structural inconsistency is an error: a damaged artifact must not be
    /// mistaken for a usable one.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, String> {
        let file: ArtifactFile =
            serde_json::from_slice(bytes).map_err(|e| format!("invalid artifact JSON: {e}"))?;
        Self::from_file(file)
    }

    fn from_file(file: ArtifactFile) -> Result<Self, String> {
        let mut posterior = Posterior::new();
        for (name, entry) in file.posterior {
            let per_channel = match entry {
                PosteriorEntry::Means(v) => v,
                PosteriorEntry::Draws(draws) => mean_over_draws(&name, &draws)?,
            };
            posterior.insert(name, per_channel);
        }

        let spend = file
            .media_spend
            .map(SpendTensor::from_nested)
            .transpose()?;

        if let (Some(tensor), Some(n_times)) = (&spend, file.n_times) {
            if tensor.time_period_count() != n_times {
                return Err(format!(
                    "n_times={n_times} disagrees with spend tensor ({} periods)",
                    tensor.time_period_count()
                ));
            }
        }
        if let (Some(tensor), Some(n_channels)) = (&spend, file.n_media_channels) {
            if tensor.channel_count() != n_channels {
                return Err(format!(
                    "n_media_channels={n_channels} disagrees with spend tensor ({} channels)",
                    tensor.channel_count()
                ));
            }
        }

        let total_spend = file
            .total_spend
            .map(|rows| matrix_from_rows(&rows))
            .transpose()?;
        if let (Some(tensor), Some(total)) = (&spend, &total_spend) {
            let expected = (tensor.time_period_count(), tensor.channel_count());
            if total.dim() != expected {
                return Err(format!(
                    "total_spend shape {:?} disagrees with spend tensor {:?}",
                    total.dim(),
                    expected
                ));
            }
        }

        let (columns, coordinate) = match file.media {
            Some(mut media) => (media.columns, media.coords.remove(CHANNEL_COORD)),
            None => (None, None),
        };

        let channels = ChannelSource {
            explicit: file.channel_names.or(columns),
            coordinate,
            spec_names: file.model_spec.and_then(|s| s.media_names),
            channel_count: file.n_media_channels,
        };

        Ok(Self {
            model_type: file
                .model_type
                .unwrap_or_else(|| "Trained MMM Model".to_string()),
            posterior,
            spend,
            total_spend,
            channels,
            n_times: file.n_times,
        })
    }
}

impl MediaModel for TrainedModel {
    fn model_type(&self) -> &str {
        &self.model_type
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

    fn total_spend(&self) -> Option<&Array2<f64>> {
        self.total_spend.as_ref()
    }

    fn channel_source(&self) -> ChannelSource {
        self.channels.clone()
    }

    fn time_period_count(&self) -> usize {
        match &self.spend {
            Some(tensor) => tensor.time_period_count(),
            None => self.n_times.unwrap_or(0),
        }
    }
}

/// Per-channel mean over posterior draws, using an incremental mean so long
/// chains of large values do not overflow an intermediate sum.
fn mean_over_draws(name: &str, draws: &[Vec<f64>]) -> Result<Vec<f64>, String> {
    let Some(first) = draws.first() else {
        return Ok(Vec::new());
    };
    let width = first.len();
    let mut mean = vec![0.0; width];

    for (k, draw) in draws.iter().enumerate() {
        if draw.len() != width {
            return Err(format!(
                "posterior '{name}' draw {k} has {} channels, expected {width}",
                draw.len()
            ));
        }
        let n = (k + 1) as f64;
        for (m, &x) in mean.iter_mut().zip(draw) {
            *m += (x - *m) / n;
        }
    }
    Ok(mean)
}

fn matrix_from_rows(rows: &[Vec<f64>]) -> Result<Array2<f64>, String> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    let mut flat = Vec::with_capacity(n_rows * n_cols);
    for (i, row) in rows.iter().enumerate() {
        if row.len() != n_cols {
            return Err(format!("total_spend row {i} has {} columns, expected {n_cols}", row.len()));
        }
        flat.extend_from_slice(row);
    }
    Array2::from_shape_vec((n_rows, n_cols), flat).map_err(|e| format!("total_spend shape error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Param;

    #[test]
    fn parses_means_and_draws() {
        let json = br#"{
            "posterior": {
                "roi_m": [1.0, 2.0],
                "ec": [[0.2, 0.4], [0.4, 0.6]]
            },
            "media_spend": [[[1.0, 2.0], [3.0, 4.0]]]
        }"#;
        let model = TrainedModel::from_json_slice(json).unwrap();
        assert_eq!(model.posterior().get(Param::Roi), Some(&[1.0, 2.0][..]));
        let ec = model.posterior().get(Param::HalfSaturation).unwrap();
        assert!((ec[0] - 0.3).abs() < 1e-12);
        assert!((ec[1] - 0.5).abs() < 1e-12);
        assert_eq!(model.time_period_count(), 2);
        assert_eq!(model.channel_count(), 2);
    }

    #[test]
    fn ragged_draws_are_rejected() {
        let json = br#"{"posterior": {"roi": [[1.0, 2.0], [1.0]]}}"#;
        let err = TrainedModel::from_json_slice(json).unwrap_err();
        assert!(err.contains("draw 1"), "{err}");
    }

    #[test]
    fn inconsistent_extents_are_rejected() {
        let json = br#"{
            "posterior": {"roi": [1.0]},
            "media_spend": [[[1.0], [2.0]]],
            "n_times": 3
        }"#;
        assert!(TrainedModel::from_json_slice(json).is_err());
    }

    #[test]
    fn channel_sources_are_collected() {
        let json = br#"{
            "posterior": {"roi": [1.0]},
            "media": {"columns": ["TV"], "coords": {"media_channel": ["Radio"]}},
            "model_spec": {"media_names": ["Print"]},
            "n_media_channels": 1
        }"#;
        let model = TrainedModel::from_json_slice(json).unwrap();
        let source = model.channel_source();
        assert_eq!(source.explicit, Some(serde_json::json!(["TV"])));
        assert_eq!(source.coordinate, Some(serde_json::json!(["Radio"])));
        assert_eq!(source.spec_names, Some(serde_json::json!(["Print"])));
        assert_eq!(source.channel_count, Some(1));
        assert!(model.spend_tensor().is_none());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(TrainedModel::from_json_slice(b"\x00\x01not json").is_err());
    }
}
