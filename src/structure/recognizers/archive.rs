// ABOUTME: Recognizer for nodes named like archives (.ear/.jar/.war/...).
// ABOUTME: Registers a classpath context and recurses into nested archives.

use crate::container::NodeHandle;
use crate::structure::error::StructureError;
use crate::structure::metadata::{ContextInfo, MetadataKind};
use crate::structure::recognizer::{StructureContext, StructureRecognizer};

use super::ORDER_ARCHIVE;

/// Accepts non-leaf nodes whose name matches a configured archive suffix.
pub struct ArchiveRecognizer {
    relative_order: i32,
}

impl ArchiveRecognizer {
    pub fn new() -> Self {
        Self {
            relative_order: ORDER_ARCHIVE,
        }
    }

    pub fn with_relative_order(relative_order: i32) -> Self {
        Self { relative_order }
    }
}

impl Default for ArchiveRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureRecognizer for ArchiveRecognizer {
    fn name(&self) -> &str {
        "archive"
    }

    fn relative_order(&self) -> i32 {
        self.relative_order
    }

    fn determine(&self, ctx: &mut StructureContext<'_>) -> Result<bool, StructureError> {
        let node = ctx.node().clone();
        if node.is_leaf() {
            return Ok(false);
        }
        let config = ctx.config().clone();
        if !config.is_archive_name(node.name()) {
            return Ok(false);
        }

        let mut info = ContextInfo::new(ctx.path());
        info.add_classpath_entry(ctx.path(), true);
        for mp in &config.metadata_paths {
            if node.child(mp).is_some_and(|dir| !dir.is_leaf()) {
                info.add_metadata_location(mp, MetadataKind::Default);
            }
        }
        ctx.add_context(info)?;

        let candidates: Vec<NodeHandle> = node
            .children()
            .into_iter()
            .filter(|c| {
                !c.is_leaf() && config.is_archive_name(c.name()) && !config.is_ignored(c.name())
            })
            .collect();
        ctx.determine_children(candidates)?;

        Ok(true)
    }
}
