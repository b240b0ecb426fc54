//! Synthetic model variant.

use ndarray::Array2;

use crate::domain::{ChannelSource, ModelSource, Posterior, SpendTensor};
use crate::models::MediaModel;

/// Generated stand-in for a trained model (see `data::synthetic::generate`).
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticModel {
    pub seed: u64,
    pub posterior: Posterior,
    pub spend: SpendTensor,
    /// Spend summed over regions, `(time, channel)`.
    pub total_spend: Array2<f64>,
    pub channel_names: Vec<String>,
}

impl MediaModel for SyntheticModel {
    fn model_type(&self) -> &str {
        "Synthetic MMM Model"
    }

    fn source(&self) -> ModelSource {
        ModelSource::Synthetic
    }

    fn posterior(&self) -> &Posterior {
        &self.posterior
    }

    fn spend_tensor(&self) -> Option<&SpendTensor> {
        Some(&self.spend)
    }

    fn total_spend(&self) -> Option<&Array2<f64>> {
        Some(&self.total_spend)
    }

    fn channel_source(&self) -> ChannelSource {
        ChannelSource {
            explicit: Some(serde_json::Value::from(self.channel_names.clone())),
            channel_count: Some(self.spend.channel_count()),
            ..ChannelSource::default()
        }
    }
}
