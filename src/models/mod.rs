//! Model artifact variants.
//!
//! Downstream code never inspects a concrete artifact type. Everything it needs
//! goes through the [`MediaModel`] capability set:
//!
//! - named posterior access
//! - an optional spend tensor
//! - an optional channel-name source
//!
//! Two variants implement it: a trained artifact read from disk and the
//! synthetic stand-in generated when the trained artifact's runtime is missing.

use ndarray::Array2;

use crate::domain::{ChannelSource, ModelSource, Posterior, SpendTensor};

pub mod synthetic;
pub mod trained;

pub use synthetic::SyntheticModel;
pub use trained::TrainedModel;

/// Capabilities the analytics engine needs from a fitted model.
pub trait MediaModel {
    fn model_type(&self) -> &str;

    fn source(&self) -> ModelSource;

    fn posterior(&self) -> &Posterior;

    fn spend_tensor(&self) -> Option<&SpendTensor>;

    /// Spend summed over regions, `(time, channel)`, when the artifact stores it.
    fn total_spend(&self) -> Option<&Array2<f64>> {
        None
    }

    fn channel_source(&self) -> ChannelSource;

    fn time_period_count(&self) -> usize {
        self.spend_tensor().map_or(0, SpendTensor::time_period_count)
    }

    fn region_count(&self) -> usize {
        self.spend_tensor().map_or(0, SpendTensor::region_count)
    }

    /// Number of channel positions actually backed by data (tensor or posterior).
    fn channel_count(&self) -> usize {
        let tensor = self.spend_tensor().map_or(0, SpendTensor::channel_count);
        tensor.max(self.posterior().channel_extent())
    }
}

/// The single model instance held by the loader cache.
#[derive(Debug, Clone)]
pub enum LoadedModel {
    Trained(TrainedModel),
    Synthetic(SyntheticModel),
}

impl LoadedModel {
    fn inner(&self) -> &dyn MediaModel {
        match self {
            LoadedModel::Trained(m) => m,
            LoadedModel::Synthetic(m) => m,
        }
    }
}

impl MediaModel for LoadedModel {
    fn model_type(&self) -> &str {
        self.inner().model_type()
    }

    fn source(&self) -> ModelSource {
        self.inner().source()
    }

    fn posterior(&self) -> &Posterior {
        self.inner().posterior()
    }

    fn spend_tensor(&self) -> Option<&SpendTensor> {
        self.inner().spend_tensor()
    }

    fn total_spend(&self) -> Option<&Array2<f64>> {
        self.inner().total_spend()
    }

    fn channel_source(&self) -> ChannelSource {
        self.inner().channel_source()
    }

    fn time_period_count(&self) -> usize {
        self.inner().time_period_count()
    }

    fn region_count(&self) -> usize {
        self.inner().region_count()
    }

    fn channel_count(&self) -> usize {
        self.inner().channel_count()
    }
}
