//! The four read operations over a model artifact, plus model info.
//!
//! `MmmService` is cheap to construct: it only records the artifact path. The
//! artifact itself is loaded on first use through the shared [`ModelLoader`],
//! so every service pointing at the same path sees the same cached model.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::analysis::{channel_summary, contribution_data, extract_channel_names, generate_curves};
use crate::config::Settings;
use crate::data::ModelLoader;
use crate::domain::{ChannelSummary, ContributionBundle, CurveBundle, ModelInfo, Param};
use crate::error::Result;
use crate::models::{LoadedModel, MediaModel};

#[derive(Debug, Clone)]
pub struct MmmService {
    path: PathBuf,
    loader: Arc<ModelLoader>,
}

impl MmmService {
    /// Service over `path` using the process-wide loader.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_loader(path, ModelLoader::global())
    }

    pub fn with_loader(path: impl Into<PathBuf>, loader: Arc<ModelLoader>) -> Self {
        Self {
            path: path.into(),
            loader,
        }
    }

    /// Service for `settings`, using the process-wide loader for its seed so
    /// synthetic models built from different seeds never share a cache entry.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_loader(
            settings.model_path.clone(),
            ModelLoader::for_seed(settings.synthetic_seed),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn model(&self) -> Result<Arc<LoadedModel>> {
        self.loader.load(&self.path)
    }

    pub fn channel_names(&self) -> Result<Vec<String>> {
        let model = self.model()?;
        Ok(extract_channel_names(model.as_ref()))
    }

    pub fn contribution_data(&self, channel: Option<&str>) -> Result<ContributionBundle> {
        let model = self.model()?;
        let channels = extract_channel_names(model.as_ref());
        contribution_data(model.as_ref(), &channels, channel)
    }

    pub fn response_curves(&self, channel: Option<&str>) -> Result<CurveBundle> {
        let model = self.model()?;
        let channels = extract_channel_names(model.as_ref());
        let bundle = generate_curves(model.as_ref(), &channels, channel)?;
        debug!("generated {} response curve(s)", bundle.curves.len());
        Ok(bundle)
    }

    pub fn channel_summary(&self, channel: Option<&str>) -> Result<BTreeMap<String, ChannelSummary>> {
        let model = self.model()?;
        let channels = extract_channel_names(model.as_ref());
        channel_summary(model.as_ref(), &channels, channel)
    }

    pub fn model_info(&self) -> Result<ModelInfo> {
        let entry = self.loader.load_entry(&self.path)?;
        let model = entry.model.as_ref();
        let posterior = model.posterior();

        let mut parameters = Vec::new();
        let mut missing = Vec::new();
        for param in Param::ALL {
            if posterior.contains(param) {
                parameters.push(param.name().to_string());
            } else {
                missing.push(param.name().to_string());
            }
        }
        let has_spend = model.spend_tensor().is_some_and(|t| !t.is_empty());
        if !has_spend {
            missing.push("media_spend".to_string());
        }

        Ok(ModelInfo {
            model_type: model.model_type().to_string(),
            source: model.source(),
            path: entry.path,
            loaded_at: entry.loaded_at,
            channels: extract_channel_names(model),
            channel_count: model.channel_count(),
            time_period_count: model.time_period_count(),
            region_count: model.region_count(),
            total_media_spend: total_media_spend(model),
            has_required: posterior.contains(Param::Roi) && has_spend,
            parameters,
            missing,
        })
    }
}

/// Grand total from the stored `(time, channel)` totals, else from the tensor.
fn total_media_spend<M: MediaModel + ?Sized>(model: &M) -> Option<f64> {
    match model.total_spend() {
        Some(totals) => Some(totals.sum()),
        None => model
            .spend_tensor()
            .filter(|t| !t.is_empty())
            .map(|t| t.values().sum()),
    }
}
