// ABOUTME: Generic directory fallback recognizer.
// ABOUTME: Accepts any non-leaf node; optionally declines below a depth threshold.

use crate::container::NodeHandle;
use crate::structure::error::StructureError;
use crate::structure::metadata::{ContextInfo, MetadataKind};
use crate::structure::recognizer::{StructureContext, StructureRecognizer};

use super::ORDER_DIRECTORY;

/// The generic fallback: any non-leaf node becomes a directory context.
/// Runs last so every more specific recognizer gets first refusal.
pub struct DirectoryRecognizer {
    relative_order: i32,
    leaf_depth: Option<usize>,
}

impl DirectoryRecognizer {
    pub fn new() -> Self {
        Self {
            relative_order: ORDER_DIRECTORY,
            leaf_depth: None,
        }
    }

    /// Decline candidates deeper than `depth`, terminating recursion for
    /// trees where only the top levels are deployments.
    pub fn with_leaf_depth(depth: usize) -> Self {
        Self {
            relative_order: ORDER_DIRECTORY,
            leaf_depth: Some(depth),
        }
    }
}

impl Default for DirectoryRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureRecognizer for DirectoryRecognizer {
    fn name(&self) -> &str {
        "directory"
    }

    fn relative_order(&self) -> i32 {
        self.relative_order
    }

    fn determine(&self, ctx: &mut StructureContext<'_>) -> Result<bool, StructureError> {
        let node = ctx.node().clone();
        if node.is_leaf() {
            return Ok(false);
        }
        if let Some(limit) = self.leaf_depth
            && ctx.depth() > limit
        {
            return Ok(false);
        }
        let config = ctx.config().clone();

        let mut info = ContextInfo::new(ctx.path());
        info.add_classpath_entry(ctx.path(), true);
        for mp in &config.metadata_paths {
            if node.child(mp).is_some_and(|dir| !dir.is_leaf()) {
                info.add_metadata_location(mp, MetadataKind::Default);
            }
        }
        // Leaf archives inside a directory go on its classpath.
        for child in node.children() {
            if child.is_leaf() && config.is_archive_name(child.name()) {
                info.add_classpath_entry(ctx.child_path(child.name()), true);
            }
        }
        ctx.add_context(info)?;

        // Leaves stay candidates here so standalone descriptor files in a
        // deploy directory reach the file recognizer; unrecognized leaves
        // simply produce no context.
        let candidates: Vec<NodeHandle> = node
            .children()
            .into_iter()
            .filter(|c| {
                !config.is_ignored(c.name())
                    && !config.metadata_paths.iter().any(|mp| mp == c.name())
            })
            .collect();
        ctx.determine_children(candidates)?;

        Ok(true)
    }
}
