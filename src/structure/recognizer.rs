// ABOUTME: StructureRecognizer trait and the per-node determination context.
// ABOUTME: Recognizers run in ascending relative_order; first acceptance wins.

use crate::config::StructureConfig;
use crate::container::NodeHandle;

use super::error::StructureError;
use super::metadata::{ContextInfo, StructureMetaData};
use super::resolver::StructureResolver;

/// A pluggable structure recognizer.
///
/// Recognizers are consulted in ascending `relative_order`; lower runs
/// first, so specific recognizers (an explicit embedded descriptor)
/// register lower orders than generic fallbacks ("this is a directory,
/// recurse"). Returning `Ok(true)` short-circuits the rest.
pub trait StructureRecognizer: Send + Sync {
    fn name(&self) -> &str;

    fn relative_order(&self) -> i32;

    /// Classify the candidate node. Register contexts and recurse through
    /// `ctx`; an error removes the contexts this call registered.
    fn determine(&self, ctx: &mut StructureContext<'_>) -> Result<bool, StructureError>;
}

/// Per-node state handed to a recognizer: the candidate node, its path
/// relative to the deployment root, and the metadata under construction.
pub struct StructureContext<'a> {
    pub(super) resolver: &'a StructureResolver,
    pub(super) node: NodeHandle,
    pub(super) path: String,
    pub(super) depth: usize,
    pub(super) metadata: &'a mut StructureMetaData,
    pub(super) added: Vec<String>,
}

impl StructureContext<'_> {
    pub fn node(&self) -> &NodeHandle {
        &self.node
    }

    /// Path of the candidate node relative to the deployment root;
    /// empty for the root itself.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn config(&self) -> &StructureConfig {
        self.resolver.config()
    }

    /// Path of a direct child of the candidate node.
    pub fn child_path(&self, child_name: &str) -> String {
        if self.path.is_empty() {
            child_name.to_string()
        } else {
            format!("{}/{}", self.path, child_name)
        }
    }

    /// Register a context. The entry is removed again if this recognizer
    /// invocation later fails.
    pub fn add_context(&mut self, info: ContextInfo) -> Result<(), StructureError> {
        let path = info.path().to_string();
        self.metadata.add_context(info)?;
        self.added.push(path);
        Ok(())
    }

    pub fn context_mut(&mut self, path: &str) -> Option<&mut ContextInfo> {
        self.metadata.context_mut(path)
    }

    /// Recurse into one named child through the full ordered recognizer
    /// list. Returns whether any recognizer accepted it.
    pub fn determine_child(&mut self, child: &NodeHandle) -> Result<bool, StructureError> {
        let child_path = self.child_path(child.name());
        self.resolver
            .determine_node(child.clone(), child_path, self.depth + 1, self.metadata)
    }

    /// Recurse into several children. A failing child is logged and does
    /// not abort its siblings; the first error is surfaced after every
    /// sibling was attempted.
    pub fn determine_children<I>(&mut self, children: I) -> Result<(), StructureError>
    where
        I: IntoIterator<Item = NodeHandle>,
    {
        let mut first_error = None;
        for child in children {
            if let Err(error) = self.determine_child(&child) {
                tracing::warn!(
                    path = %error.path(),
                    %error,
                    "structure determination failed for nested context"
                );
                first_error.get_or_insert(error);
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
