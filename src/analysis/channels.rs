//! Channel name extraction.
//!
//! Names are looked up in the shapes artifacts have used over time, first match
//! wins:
//!
//! 1. explicit per-channel names
//! 2. the `media_channel` coordinate on the media data
//! 3. the model specification's name list
//! 4. `Channel_{i}` synthesized from a bare channel count
//!
//! If none is usable we return [`DEFAULT_CHANNEL_NAMES`] with a warning rather
//! than failing: names are cosmetic, and every other operation still works
//! positionally.

use std::collections::HashSet;

use log::{debug, warn};
use serde_json::Value;

use crate::models::MediaModel;

pub const DEFAULT_CHANNEL_NAMES: [&str; 5] = [
    "Google_Search",
    "Google_Display",
    "Facebook",
    "Instagram",
    "YouTube",
];

/// Ordered channel names for `model`.
pub fn extract_channel_names<M: MediaModel + ?Sized>(model: &M) -> Vec<String> {
    let source = model.channel_source();

    let candidates = [
        ("explicit names", source.explicit.as_ref()),
        ("media_channel coordinate", source.coordinate.as_ref()),
        ("model spec names", source.spec_names.as_ref()),
    ];
    for (label, value) in candidates {
        if let Some(names) = value.and_then(name_list) {
            debug!("Channel names taken from {label}");
            return validate_channel_names(names);
        }
    }

    if let Some(n) = source.channel_count.filter(|&n| n > 0) {
        debug!("Channel names synthesized from channel count {n}");
        return (0..n).map(placeholder).collect();
    }

    warn!("Could not extract channel names from model, using defaults");
    default_names()
}

/// Clean a raw name list.
///
/// - surrounding whitespace is trimmed
/// - missing, non-string, or blank entries become `Channel_{i}`
/// - a repeated name gets an `_{i}` suffix so names stay unique
pub fn validate_channel_names(raw: Vec<Option<String>>) -> Vec<String> {
    if raw.is_empty() {
        warn!("Empty channel list provided, using defaults");
        return default_names();
    }

    let mut seen = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());

    for (i, entry) in raw.into_iter().enumerate() {
        let name = match entry.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            Some(_) => {
                warn!("Empty channel name at index {i}");
                placeholder(i)
            }
            None => {
                warn!("Non-string channel name at index {i}");
                placeholder(i)
            }
        };

        let name = if seen.contains(&name) {
            let renamed = format!("{name}_{i}");
            warn!("Duplicate channel name '{name}' at index {i}, renamed to '{renamed}'");
            renamed
        } else {
            name
        };
        seen.insert(name.clone());
        out.push(name);
    }

    out
}

/// A non-empty JSON array, with string entries kept and anything else marked missing.
fn name_list(value: &Value) -> Option<Vec<Option<String>>> {
    match value {
        Value::Array(items) if !items.is_empty() => Some(
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    }
}

fn placeholder(i: usize) -> String {
    format!("Channel_{i}")
}

fn default_names() -> Vec<String> {
    DEFAULT_CHANNEL_NAMES.iter().map(|s| s.to_string()).collect()
}
