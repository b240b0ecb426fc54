//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - posterior parameters and the spend tensor (`Posterior`, `SpendTensor`)
//! - channel-name sources (`ChannelSource`)
//! - the data products returned to callers (`ContributionBundle`,
//!   `ChannelSummary`, `ResponseCurve`, `ModelInfo`)

pub mod types;

pub use types::*;
