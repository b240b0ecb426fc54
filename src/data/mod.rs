//! Model acquisition: loading trained artifacts and generating synthetic ones.

pub mod loader;
pub mod synthetic;

pub use loader::{ArtifactReader, CachedModel, ModelLoader, NativeReader, ReadError};
pub use synthetic::{SyntheticDims, generate, generate_with};
