// ABOUTME: Core value types shared across the engine.
// ABOUTME: Validated unit names and attachment key aliases.

mod unit_name;

pub use unit_name::{UnitName, UnitNameError};

/// Attachment keys are plain string tokens; deployers agree on them by
/// convention, the way wire labels are agreed on.
pub type AttachmentKey = String;
