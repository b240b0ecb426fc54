//! `mmm-insights` library crate.
//!
//! The binary (`mmm`) is a thin wrapper around this library so that:
//!
//! - the analytics are testable without spawning processes
//! - an HTTP or export layer can call [`app::MmmService`] directly
//!
//! Layout: `data` loads and caches models, `models` defines what a model can
//! answer, `analysis` turns that into contributions, summaries and curves.

pub mod analysis;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod math;
pub mod models;

pub use app::MmmService;
pub use error::{MmmError, Result};
