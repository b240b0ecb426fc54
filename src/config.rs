//! Runtime settings.
//!
//! Values come from the process environment (after loading `.env` if present);
//! command-line flags override them in `app`.

use std::path::PathBuf;

use crate::data::loader::DEFAULT_SYNTHETIC_SEED;
use crate::error::{MmmError, Result};

pub const MODEL_PATH_VAR: &str = "MMM_MODEL_PATH";
pub const SYNTHETIC_SEED_VAR: &str = "MMM_SYNTHETIC_SEED";
pub const DEFAULT_MODEL_PATH: &str = "data/models/saved_mmm.pkl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub model_path: PathBuf,
    /// Seed for the synthetic model used when the trained artifact cannot be read.
    pub synthetic_seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            synthetic_seed: DEFAULT_SYNTHETIC_SEED,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(path) = lookup(MODEL_PATH_VAR).filter(|p| !p.trim().is_empty()) {
            settings.model_path = PathBuf::from(path.trim());
        }
        if let Some(raw) = lookup(SYNTHETIC_SEED_VAR) {
            settings.synthetic_seed = raw.trim().parse().map_err(|_| {
                MmmError::Config(format!("{SYNTHETIC_SEED_VAR} must be a non-negative integer, got '{raw}'"))
            })?;
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.model_path, PathBuf::from("data/models/saved_mmm.pkl"));
        assert_eq!(settings.synthetic_seed, 42);
    }

    #[test]
    fn reads_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            (MODEL_PATH_VAR, " /srv/mmm/model.json "),
            (SYNTHETIC_SEED_VAR, "7"),
        ]))
        .unwrap();
        assert_eq!(settings.model_path, PathBuf::from("/srv/mmm/model.json"));
        assert_eq!(settings.synthetic_seed, 7);
    }

    #[test]
    fn blank_path_keeps_default() {
        let settings = Settings::from_lookup(lookup(&[(MODEL_PATH_VAR, "  ")])).unwrap();
        assert_eq!(settings.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn bad_seed_is_a_config_error() {
        let err = Settings::from_lookup(lookup(&[(SYNTHETIC_SEED_VAR, "-1")])).unwrap_err();
        assert!(matches!(err, MmmError::Config(_)));
        assert_eq!(err.exit_code(), 2);
    }
}
