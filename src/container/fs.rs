// ABOUTME: Filesystem-backed container source over std::fs.
// ABOUTME: Directories are non-leaves; materialization of exploded trees is a no-op.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::structure::ModificationType;

use super::{ContainerError, ContainerNode, ContainerSource, NodeHandle};

#[derive(Debug)]
struct FsNode {
    path: PathBuf,
}

impl FsNode {
    fn handle(path: PathBuf) -> NodeHandle {
        Arc::new(FsNode { path })
    }
}

impl ContainerNode for FsNode {
    fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    fn is_leaf(&self) -> bool {
        !self.path.is_dir()
    }

    fn child(&self, path: &str) -> Option<NodeHandle> {
        let joined = self.path.join(path);
        joined.exists().then(|| FsNode::handle(joined))
    }

    fn children(&self) -> Vec<NodeHandle> {
        let Ok(entries) = std::fs::read_dir(&self.path) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();
        paths.into_iter().map(FsNode::handle).collect()
    }

    fn open(&self) -> Result<Box<dyn Read + Send>, ContainerError> {
        if self.path.is_dir() {
            return Err(ContainerError::NotAFile(self.path.display().to_string()));
        }
        let file = File::open(&self.path).map_err(|source| ContainerError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(Box::new(file))
    }
}

/// Container source rooted at a filesystem path.
///
/// Exploded deployments are already directory trees, so `Unpack`-style
/// modifications are satisfied trivially; asking to materialize a plain
/// file is refused because this source carries no archive codec.
#[derive(Debug, Clone)]
pub struct FsContainer {
    root: PathBuf,
}

impl FsContainer {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ContainerError> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            return Err(ContainerError::NotFound(root.display().to_string()));
        }
        Ok(Self { root })
    }
}

impl ContainerSource for FsContainer {
    fn root(&self) -> NodeHandle {
        FsNode::handle(self.root.clone())
    }

    fn materialize(
        &self,
        path: &str,
        modification: ModificationType,
    ) -> Result<(), ContainerError> {
        let target = if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        };
        if !target.exists() {
            return Err(ContainerError::NotFound(target.display().to_string()));
        }
        if target.is_dir() {
            tracing::debug!(path, ?modification, "context already exploded on disk");
            return Ok(());
        }
        Err(ContainerError::Materialize {
            path: target.display().to_string(),
            reason: "filesystem source cannot unpack packed archives".to_string(),
        })
    }
}
