// ABOUTME: Recursive structure resolver over an ordered recognizer list.
// ABOUTME: First accepting recognizer wins; failures roll back partial contexts.

use std::sync::Arc;

use crate::config::StructureConfig;
use crate::container::{ContainerSource, NodeHandle};

use super::error::StructureError;
use super::metadata::StructureMetaData;
use super::recognizer::{StructureContext, StructureRecognizer};
use super::recognizers::{
    ArchiveRecognizer, DescriptorArchiveRecognizer, DirectoryRecognizer, FileRecognizer,
};

/// Optional hook around structure determination.
///
/// Runs before the recognizers see the root and again after the last
/// recognizer finished; the metadata is frozen once the post hook
/// returns.
pub trait StructureListener: Send + Sync {
    fn before_determination(
        &self,
        _root: &NodeHandle,
        _metadata: &mut StructureMetaData,
    ) -> Result<(), StructureError> {
        Ok(())
    }

    fn after_determination(
        &self,
        _root: &NodeHandle,
        _metadata: &mut StructureMetaData,
    ) -> Result<(), StructureError> {
        Ok(())
    }
}

/// Recursively classifies a container tree into structural contexts.
pub struct StructureResolver {
    config: StructureConfig,
    recognizers: Vec<Arc<dyn StructureRecognizer>>,
    listener: Option<Arc<dyn StructureListener>>,
}

impl StructureResolver {
    /// Resolver with the built-in recognizer set for `config`.
    pub fn new(config: StructureConfig) -> Self {
        let mut resolver = Self::bare(config);
        resolver.add_recognizer(Arc::new(DescriptorArchiveRecognizer::new()));
        resolver.add_recognizer(Arc::new(ArchiveRecognizer::new()));
        resolver.add_recognizer(Arc::new(FileRecognizer::new()));
        resolver.add_recognizer(Arc::new(DirectoryRecognizer::new()));
        resolver
    }

    /// Resolver with no recognizers registered.
    pub fn bare(config: StructureConfig) -> Self {
        Self {
            config,
            recognizers: Vec::new(),
            listener: None,
        }
    }

    pub fn config(&self) -> &StructureConfig {
        &self.config
    }

    /// Register a recognizer, kept sorted ascending by relative order;
    /// registration sequence breaks ties stably.
    pub fn add_recognizer(&mut self, recognizer: Arc<dyn StructureRecognizer>) {
        let order = recognizer.relative_order();
        let index = self
            .recognizers
            .partition_point(|r| r.relative_order() <= order);
        self.recognizers.insert(index, recognizer);
    }

    pub fn set_listener(&mut self, listener: Arc<dyn StructureListener>) {
        self.listener = Some(listener);
    }

    /// Classify the source's container tree into structural contexts.
    pub fn determine_structure(
        &self,
        source: &dyn ContainerSource,
    ) -> Result<StructureMetaData, StructureError> {
        let root = source.root();
        let mut metadata = StructureMetaData::new();

        if let Some(listener) = &self.listener {
            listener.before_determination(&root, &mut metadata)?;
        }

        let recognized = self.determine_node(root.clone(), String::new(), 0, &mut metadata)?;
        if !recognized {
            return Err(StructureError::Unrecognized {
                path: root.name().to_string(),
            });
        }

        if let Some(listener) = &self.listener {
            listener.after_determination(&root, &mut metadata)?;
        }

        tracing::debug!(
            root = root.name(),
            contexts = metadata.len(),
            "structure determined"
        );
        Ok(metadata)
    }

    /// Try recognizers in order for one candidate node. The first that
    /// accepts short-circuits the rest. A recognizer error removes the
    /// contexts that invocation registered and is re-raised path-tagged.
    pub(super) fn determine_node(
        &self,
        node: NodeHandle,
        path: String,
        depth: usize,
        metadata: &mut StructureMetaData,
    ) -> Result<bool, StructureError> {
        if depth > self.config.max_depth {
            return Err(StructureError::DepthExceeded {
                path,
                max_depth: self.config.max_depth,
            });
        }

        for recognizer in &self.recognizers {
            let mut ctx = StructureContext {
                resolver: self,
                node: node.clone(),
                path: path.clone(),
                depth,
                metadata,
                added: Vec::new(),
            };
            match recognizer.determine(&mut ctx) {
                Ok(true) => {
                    tracing::debug!(path = %path, recognizer = recognizer.name(), "context recognized");
                    return Ok(true);
                }
                Ok(false) => {
                    // A declining recognizer must not leave entries behind.
                    let added = std::mem::take(&mut ctx.added);
                    for p in added {
                        metadata.remove_context(&p);
                    }
                }
                Err(error) => {
                    let added = std::mem::take(&mut ctx.added);
                    for p in &added {
                        metadata.remove_context(p);
                    }
                    tracing::warn!(
                        path = %path,
                        recognizer = recognizer.name(),
                        rolled_back = added.len(),
                        %error,
                        "recognizer failed"
                    );
                    return Err(match error {
                        e @ StructureError::DuplicateContext { .. } => e,
                        e @ StructureError::DepthExceeded { .. } => e,
                        // Nested failures stay tagged with the deepest path.
                        e @ StructureError::Recognizer { .. } => e,
                        e => StructureError::Recognizer {
                            path: path.clone(),
                            recognizer: recognizer.name().to_string(),
                            message: e.to_string(),
                        },
                    });
                }
            }
        }
        Ok(false)
    }
}
