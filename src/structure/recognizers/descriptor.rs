// ABOUTME: Recognizer for containers carrying an explicit embedded descriptor.
// ABOUTME: Registers default plus additive alternative metadata locations, then recurses.

use crate::config::StructureConfig;
use crate::container::NodeHandle;
use crate::structure::error::StructureError;
use crate::structure::metadata::{ContextInfo, MetadataKind};
use crate::structure::recognizer::{StructureContext, StructureRecognizer};

use super::ORDER_DESCRIPTOR_ARCHIVE;

/// Accepts a non-leaf node that carries at least one recognized
/// descriptor under a configured metadata directory. The most specific
/// built-in, so it runs before the suffix and fallback recognizers.
pub struct DescriptorArchiveRecognizer {
    relative_order: i32,
}

impl DescriptorArchiveRecognizer {
    pub fn new() -> Self {
        Self {
            relative_order: ORDER_DESCRIPTOR_ARCHIVE,
        }
    }

    pub fn with_relative_order(relative_order: i32) -> Self {
        Self { relative_order }
    }
}

impl Default for DescriptorArchiveRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

fn has_descriptor(config: &StructureConfig, metadata_dir: &NodeHandle) -> bool {
    !metadata_dir.is_leaf()
        && metadata_dir
            .children()
            .iter()
            .any(|c| c.is_leaf() && config.is_descriptor_name(c.name()))
}

impl StructureRecognizer for DescriptorArchiveRecognizer {
    fn name(&self) -> &str {
        "descriptor-archive"
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

        let Some(default_location) = config
            .metadata_paths
            .iter()
            .find(|mp| {
                node.child(mp)
                    .map(|dir| has_descriptor(&config, &dir))
                    .unwrap_or(false)
            })
            .cloned()
        else {
            return Ok(false);
        };

        let mut info = ContextInfo::new(ctx.path());
        info.add_metadata_location(&default_location, MetadataKind::Default);
        info.add_classpath_entry(ctx.path(), true);

        // Descriptors embedded in nested libraries are additive with the
        // default location, not exclusive of it.
        for child in node.children() {
            if child.is_leaf() || !config.is_archive_name(child.name()) {
                continue;
            }
            for mp in &config.metadata_paths {
                if let Some(dir) = child.child(mp)
                    && has_descriptor(&config, &dir)
                {
                    info.add_metadata_location(
                        format!("{}/{}", ctx.child_path(child.name()), mp),
                        MetadataKind::Alternative,
                    );
                }
            }
        }

        ctx.add_context(info)?;

        // Archive-in-archive: delegate candidate children back into the
        // full ordered recognizer list.
        let candidates: Vec<NodeHandle> = node
            .children()
            .into_iter()
            .filter(|c| {
                !c.is_leaf()
                    && !config.is_ignored(c.name())
                    && !config.metadata_paths.iter().any(|mp| mp == c.name())
            })
            .collect();
        ctx.determine_children(candidates)?;

        Ok(true)
    }
}
