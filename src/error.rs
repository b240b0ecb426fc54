use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the analytics engine.
///
/// Per-value numeric corruption (NaN/Inf samples) never reaches this type: it is
/// zeroed and logged where it is found.
#[derive(Debug, Error)]
pub enum MmmError {
    #[error("MMM model file not found at {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("Failed to load MMM model from {}: {source}", path.display())]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Required model data '{0}' is missing from the artifact")]
    MissingParameter(String),

    #[error("Channel '{channel}' not found in model. Available channels: {available:?}")]
    UnknownChannel {
        channel: String,
        available: Vec<String>,
    },

    #[error("Synthetic model generation produced invalid data: {0}")]
    InvalidSynthetic(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MmmError {
    /// Process exit code used by the `mmm` binary.
    ///
    /// - 2: usage / configuration / unknown channel
    /// - 3: artifact lacks the data an operation needs
    /// - 4: model could not be loaded or generated
    pub fn exit_code(&self) -> u8 {
        match self {
            MmmError::Config(_) | MmmError::UnknownChannel { .. } => 2,
            MmmError::MissingParameter(_) => 3,
            MmmError::ModelNotFound(_)
            | MmmError::ModelLoad { .. }
            | MmmError::InvalidSynthetic(_)
            | MmmError::Io(_)
            | MmmError::Json(_) => 4,
        }
    }

    pub(crate) fn unknown_channel(channel: &str, available: &[String]) -> Self {
        MmmError::UnknownChannel {
            channel: channel.to_string(),
            available: available.to_vec(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MmmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(MmmError::ModelNotFound(PathBuf::from("x")).exit_code(), 4);
        assert_eq!(MmmError::MissingParameter("roi".into()).exit_code(), 3);
        assert_eq!(MmmError::unknown_channel("TV", &[]).exit_code(), 2);
    }

    #[test]
    fn unknown_channel_lists_available_names() {
        let err = MmmError::unknown_channel("TV", &["Search".to_string()]);
        let msg = err.to_string();
        assert!(msg.contains("'TV'"), "{msg}");
        assert!(msg.contains("Search"), "{msg}");
    }
}
