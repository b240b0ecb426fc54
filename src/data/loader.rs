//! Model loading with a process-wide, load-once cache.
//!
//! Resolution order for a requested path:
//!
//! 1. path missing or not a regular file -> `ModelNotFound` (no fallback)
//! 2. reader succeeds -> trained model
//! 3. reader reports its runtime is unavailable -> synthetic model (warning only)
//! 4. any other reader failure -> `ModelLoad` (no fallback)
//!
//! Entries are keyed by the resolved path and never evicted. Each path owns a
//! slot whose value is set once; a load holds only that slot's init lock, so
//! concurrent first callers of one path trigger a single read and hits on
//! other paths never wait for it.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use chrono::{DateTime, Utc};
use log::{info, warn};
use thiserror::Error;

use crate::data::synthetic;
use crate::error::{MmmError, Result};
use crate::models::{LoadedModel, TrainedModel};

/// Failure modes of an artifact reader.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The library needed to decode this artifact is not available.
    #[error("runtime unavailable: {0}")]
    RuntimeUnavailable(String),
    /// The artifact exists but cannot be decoded.
    #[error("{0}")]
    Corrupt(Box<dyn std::error::Error + Send + Sync>),
}

/// Decodes a trained-model artifact.
pub trait ArtifactReader: Send + Sync {
    fn read(&self, path: &Path) -> std::result::Result<TrainedModel, ReadError>;
}

/// Built-in reader: JSON artifacts only.
///
/// Artifacts in other formats (pickled models, NetCDF inference data) need a
/// runtime this process does not have, so they are reported as unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeReader;

impl ArtifactReader for NativeReader {
    fn read(&self, path: &Path) -> std::result::Result<TrainedModel, ReadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("json") => {
                let bytes = std::fs::read(path).map_err(|e| ReadError::Corrupt(Box::new(e)))?;
                TrainedModel::from_json_slice(&bytes).map_err(|msg| ReadError::Corrupt(msg.into()))
            }
            other => Err(ReadError::RuntimeUnavailable(format!(
                "no reader for '.{}' artifacts",
                other.unwrap_or("")
            ))),
        }
    }
}

/// A cached model plus when it was loaded.
#[derive(Debug, Clone)]
pub struct CachedModel {
    pub path: PathBuf,
    pub model: Arc<LoadedModel>,
    pub loaded_at: DateTime<Utc>,
}

/// Cache slot for one path. `value` is only set while holding `init`.
#[derive(Default)]
struct Slot {
    value: OnceLock<CachedModel>,
    init: Mutex<()>,
}

/// Loads model artifacts once per path and hands out shared references.
pub struct ModelLoader {
    reader: Box<dyn ArtifactReader>,
    synthetic_seed: u64,
    cache: RwLock<HashMap<PathBuf, Arc<Slot>>>,
    loads: AtomicUsize,
}

impl fmt::Debug for ModelLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelLoader")
            .field("synthetic_seed", &self.synthetic_seed)
            .field("loads", &self.load_count())
            .finish()
    }
}

pub const DEFAULT_SYNTHETIC_SEED: u64 = 42;

impl ModelLoader {
    pub fn new(reader: Box<dyn ArtifactReader>, synthetic_seed: u64) -> Self {
        Self {
            reader,
            synthetic_seed,
            cache: RwLock::new(HashMap::new()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Process-wide loader using the built-in reader and the default seed.
    pub fn global() -> Arc<ModelLoader> {
        Self::for_seed(DEFAULT_SYNTHETIC_SEED)
    }

    /// Process-wide loader for `seed`, using the built-in reader.
    ///
    /// There is exactly one loader per seed, so a path is read at most once per
    /// seed for the life of the process.
    pub fn for_seed(seed: u64) -> Arc<ModelLoader> {
        static LOADERS: OnceLock<Mutex<HashMap<u64, Arc<ModelLoader>>>> = OnceLock::new();
        let mut loaders = LOADERS
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(
            loaders
                .entry(seed)
                .or_insert_with(|| Arc::new(ModelLoader::new(Box::new(NativeReader), seed))),
        )
    }

    pub fn synthetic_seed(&self) -> u64 {
        self.synthetic_seed
    }

    /// Load `path`, or return the cached model if it was loaded before.
    pub fn load(&self, path: &Path) -> Result<Arc<LoadedModel>> {
        self.load_entry(path).map(|entry| entry.model)
    }

    /// Like [`load`](Self::load), but returns the cache entry metadata too.
    pub fn load_entry(&self, path: &Path) -> Result<CachedModel> {
        // A directory is not a model file, whatever it contains.
        if !path.is_file() {
            return Err(MmmError::ModelNotFound(path.to_path_buf()));
        }
        let key = path.canonicalize()?;

        let slot = self.slot(&key);
        if let Some(entry) = slot.value.get() {
            return Ok(entry.clone());
        }

        let _init = slot.init.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Another caller may have finished the load while we waited.
        if let Some(entry) = slot.value.get() {
            return Ok(entry.clone());
        }

        let model = self.read_uncached(&key)?;
        let entry = CachedModel {
            path: key,
            model: Arc::new(model),
            loaded_at: Utc::now(),
        };
        // Cannot already be set: every writer holds `init`.
        let _ = slot.value.set(entry.clone());
        Ok(entry)
    }

    fn slot(&self, key: &Path) -> Arc<Slot> {
        if let Some(slot) = self
            .cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
        {
            return Arc::clone(slot);
        }
        let mut cache = self.cache.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(cache.entry(key.to_path_buf()).or_default())
    }

    fn read_uncached(&self, path: &Path) -> Result<LoadedModel> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        info!("Loading MMM model from {}", path.display());

        match self.reader.read(path) {
            Ok(model) => {
                info!("Loaded trained MMM model from {}", path.display());
                Ok(LoadedModel::Trained(model))
            }
            Err(ReadError::RuntimeUnavailable(reason)) => {
                warn!(
                    "Model runtime not available ({reason}); using synthetic model (seed {})",
                    self.synthetic_seed
                );
                synthetic::generate(self.synthetic_seed).map(LoadedModel::Synthetic)
            }
            Err(ReadError::Corrupt(source)) => {
                log::error!("Error loading MMM model from {}: {source}", path.display());
                Err(MmmError::ModelLoad {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    /// Number of times the underlying reader has been invoked.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Drop every cached model.
    pub fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}
