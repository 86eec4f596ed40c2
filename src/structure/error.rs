// ABOUTME: Error types for structure determination.
// ABOUTME: Every variant is tagged with the offending context path.

use thiserror::Error;

use crate::container::ContainerError;

/// Errors raised while classifying a container tree into structural
/// contexts. Fatal to the offending subtree only.
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("duplicate context path: {path:?}")]
    DuplicateContext { path: String },

    #[error("recursion depth {max_depth} exceeded at {path:?}")]
    DepthExceeded { path: String, max_depth: usize },

    #[error("no structure recognizer accepted {path:?}")]
    Unrecognized { path: String },

    #[error("recognizer {recognizer} failed at {path:?}: {message}")]
    Recognizer {
        path: String,
        recognizer: String,
        message: String,
    },

    #[error("container error at {path:?}: {source}")]
    Container {
        path: String,
        #[source]
        source: ContainerError,
    },
}

impl StructureError {
    /// Context path the error is tagged with.
    pub fn path(&self) -> &str {
        match self {
            StructureError::DuplicateContext { path }
            | StructureError::DepthExceeded { path, .. }
            | StructureError::Unrecognized { path }
            | StructureError::Recognizer { path, .. }
            | StructureError::Container { path, .. } => path,
        }
    }
}
