// ABOUTME: Container/file abstraction consumed by the structure resolver.
// ABOUTME: Defines ContainerNode and ContainerSource traits plus memory and fs implementations.

mod fs;
mod memory;

pub use fs::FsContainer;
pub use memory::{MemoryContainer, MemoryNodeBuilder};

use std::io::Read;
use std::sync::Arc;

use crate::structure::ModificationType;

/// Shared handle to a node in a container tree.
pub type NodeHandle = Arc<dyn ContainerNode>;

/// A node in an archive-like container tree.
///
/// Leaves are plain files; non-leaves can enumerate ordered children and
/// resolve `/`-separated relative paths.
pub trait ContainerNode: Send + Sync {
    /// Last path segment of this node.
    fn name(&self) -> &str;

    /// True for plain files; a leaf never has children.
    fn is_leaf(&self) -> bool;

    /// Resolve a `/`-separated path relative to this node.
    fn child(&self, path: &str) -> Option<NodeHandle>;

    /// Direct children in a stable order. Empty for leaves.
    fn children(&self) -> Vec<NodeHandle>;

    /// Open the node's content for reading. Fails for non-leaves.
    fn open(&self) -> Result<Box<dyn Read + Send>, ContainerError>;
}

/// A rooted container plus the mount hook used to materialize
/// modification requirements before later stages read a context as a
/// normal directory tree.
pub trait ContainerSource: Send + Sync {
    fn root(&self) -> NodeHandle;

    /// Prepare the context at `path` (relative to the root, "" for the
    /// root itself) according to `modification`.
    fn materialize(&self, path: &str, modification: ModificationType)
    -> Result<(), ContainerError>;
}

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("no such path in container: {0}")]
    NotFound(String),

    #[error("cannot materialize {path}: {reason}")]
    Materialize { path: String, reason: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
