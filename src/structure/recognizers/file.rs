// ABOUTME: Recognizer for standalone descriptor files.
// ABOUTME: A node recognized as a file never recurses.

use crate::structure::error::StructureError;
use crate::structure::metadata::ContextInfo;
use crate::structure::recognizer::{StructureContext, StructureRecognizer};

use super::ORDER_FILE;

/// Accepts leaves whose suffix matches a configured descriptor suffix,
/// e.g. a `-service.xml` dropped straight into the deploy directory.
pub struct FileRecognizer {
    relative_order: i32,
}

impl FileRecognizer {
    pub fn new() -> Self {
        Self {
            relative_order: ORDER_FILE,
        }
    }

    pub fn with_relative_order(relative_order: i32) -> Self {
        Self { relative_order }
    }
}

impl Default for FileRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureRecognizer for FileRecognizer {
    fn name(&self) -> &str {
        "file"
    }

    fn relative_order(&self) -> i32 {
        self.relative_order
    }

    fn determine(&self, ctx: &mut StructureContext<'_>) -> Result<bool, StructureError> {
        let node = ctx.node().clone();
        if !node.is_leaf() || !ctx.config().is_descriptor_name(node.name()) {
            return Ok(false);
        }

        let mut info = ContextInfo::new(ctx.path());
        info.add_classpath_entry(ctx.path(), true);
        ctx.add_context(info)?;
        Ok(true)
    }
}
