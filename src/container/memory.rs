// ABOUTME: In-memory container tree for embedding and tests.
// ABOUTME: Built with a nesting builder; records materialization requests.

use std::io::{Cursor, Read};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::structure::ModificationType;

use super::{ContainerError, ContainerNode, ContainerSource, NodeHandle};

#[derive(Debug)]
struct MemoryNode {
    name: String,
    content: Option<Vec<u8>>,
    children: Vec<Arc<MemoryNode>>,
}

impl ContainerNode for MemoryNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_leaf(&self) -> bool {
        self.content.is_some()
    }

    fn child(&self, path: &str) -> Option<NodeHandle> {
        let (head, rest) = match path.split_once('/') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let child = self.children.iter().find(|c| c.name == head)?;
        match rest {
            Some(rest) if !rest.is_empty() => child.child(rest),
            _ => Some(child.clone() as NodeHandle),
        }
    }

    fn children(&self) -> Vec<NodeHandle> {
        self.children.iter().map(|c| c.clone() as NodeHandle).collect()
    }

    fn open(&self) -> Result<Box<dyn Read + Send>, ContainerError> {
        match &self.content {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(ContainerError::NotAFile(self.name.clone())),
        }
    }
}

/// Builder for in-memory container trees.
///
/// Intermediate directories along `/`-separated paths are created on
/// demand, so a whole artifact can be described in one chain:
///
/// ```
/// use gantry::container::MemoryNodeBuilder;
///
/// let source = MemoryNodeBuilder::dir("app.ear")
///     .with_file("meta-inf/application.xml", b"<application/>")
///     .with_file("lib/util.jar", b"")
///     .build();
/// ```
#[derive(Debug)]
pub struct MemoryNodeBuilder {
    name: String,
    content: Option<Vec<u8>>,
    children: Vec<MemoryNodeBuilder>,
}

impl MemoryNodeBuilder {
    pub fn dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            content: None,
            children: Vec::new(),
        }
    }

    pub fn file(name: &str, content: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            content: Some(content.to_vec()),
            children: Vec::new(),
        }
    }

    /// Add a file at a `/`-separated path, creating intermediate
    /// directories.
    pub fn with_file(mut self, path: &str, content: &[u8]) -> Self {
        self.insert(path, Some(content.to_vec()));
        self
    }

    /// Add an empty directory at a `/`-separated path.
    pub fn with_dir(mut self, path: &str) -> Self {
        self.insert(path, None);
        self
    }

    /// Nest an already-built subtree as a direct child.
    pub fn with_child(mut self, child: MemoryNodeBuilder) -> Self {
        self.children.push(child);
        self
    }

    fn insert(&mut self, path: &str, content: Option<Vec<u8>>) {
        match path.split_once('/') {
            Some((head, rest)) => {
                let dir = match self.children.iter_mut().find(|c| c.name == head) {
                    Some(dir) => dir,
                    None => {
                        self.children.push(MemoryNodeBuilder::dir(head));
                        self.children.last_mut().expect("just pushed")
                    }
                };
                dir.insert(rest, content);
            }
            None => match content {
                Some(bytes) => self.children.push(MemoryNodeBuilder::file(path, &bytes)),
                None => self.children.push(MemoryNodeBuilder::dir(path)),
            },
        }
    }

    pub fn build(self) -> MemoryContainer {
        MemoryContainer {
            root: Arc::new(self.freeze()),
            materialized: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn freeze(self) -> MemoryNode {
        MemoryNode {
            name: self.name,
            content: self.content,
            children: self.children.into_iter().map(|c| Arc::new(c.freeze())).collect(),
        }
    }
}

/// In-memory `ContainerSource`. Materialization is a no-op that records
/// the request so embedders and tests can assert on mount behavior.
#[derive(Clone)]
pub struct MemoryContainer {
    root: Arc<MemoryNode>,
    materialized: Arc<Mutex<Vec<(String, ModificationType)>>>,
}

impl MemoryContainer {
    /// Materialization requests seen so far, in order.
    pub fn materialized(&self) -> Vec<(String, ModificationType)> {
        self.materialized.lock().clone()
    }
}

impl ContainerSource for MemoryContainer {
    fn root(&self) -> NodeHandle {
        self.root.clone()
    }

    fn materialize(
        &self,
        path: &str,
        modification: ModificationType,
    ) -> Result<(), ContainerError> {
        if !path.is_empty() && self.root.child(path).is_none() {
            return Err(ContainerError::NotFound(path.to_string()));
        }
        tracing::debug!(path, ?modification, "materializing in-memory context");
        self.materialized.lock().push((path.to_string(), modification));
        Ok(())
    }
}
