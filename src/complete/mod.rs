// ABOUTME: Completeness checking after processing.
// ABOUTME: Exports the checker and the classified IncompleteDeployments report.

mod checker;
mod report;

pub use checker::CompletenessChecker;
pub use report::{IncompleteDeployments, MissingDependency, MissingKind};
