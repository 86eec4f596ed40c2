// ABOUTME: Classified report of unresolved state after processing.
// ABOUTME: Rendering omits every category that is empty.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::graph::ContextState;
use crate::types::UnitName;

/// Distinguishes a genuinely missing dependency from one whose target is
/// still being resolved by an external worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MissingKind {
    HardMissing,
    BlockedOnAsync,
}

/// One unresolved demand: the demanded target, the graph state it must
/// reach, and how the miss is classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingDependency {
    pub target: String,
    pub required_state: ContextState,
    pub kind: MissingKind,
}

/// Snapshot report of everything still incomplete, built fresh on every
/// completeness check and never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IncompleteDeployments {
    pub deployments_in_error: BTreeMap<UnitName, String>,
    pub contexts_in_error: BTreeMap<String, String>,
    pub deployments_missing_deployer: BTreeSet<UnitName>,
    pub contexts_missing_dependencies: BTreeMap<String, Vec<MissingDependency>>,
}

impl IncompleteDeployments {
    /// True when anything at all is unresolved; a report containing only
    /// blocked-on-async demands is still incomplete.
    pub fn is_incomplete(&self) -> bool {
        !self.deployments_in_error.is_empty()
            || !self.contexts_in_error.is_empty()
            || !self.deployments_missing_deployer.is_empty()
            || self
                .contexts_missing_dependencies
                .values()
                .any(|d| !d.is_empty())
    }

    /// True when the only thing standing between here and complete is
    /// asynchronous work still in flight. Callers may retry later instead
    /// of treating this as a genuine failure.
    pub fn only_blocked_on_async(&self) -> bool {
        self.is_incomplete()
            && self.deployments_in_error.is_empty()
            && self.contexts_in_error.is_empty()
            && self.deployments_missing_deployer.is_empty()
            && self
                .contexts_missing_dependencies
                .values()
                .flatten()
                .all(|d| d.kind == MissingKind::BlockedOnAsync)
    }
}

impl fmt::Display for IncompleteDeployments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary of incomplete deployments (see details above):")?;

        if !self.deployments_missing_deployer.is_empty() {
            writeln!(f, "\nDEPLOYMENTS MISSING DEPLOYERS:")?;
            for name in &self.deployments_missing_deployer {
                writeln!(f, "  {name}")?;
            }
        }

        if !self.deployments_in_error.is_empty() {
            writeln!(f, "\nDEPLOYMENTS IN ERROR:")?;
            for (name, problem) in &self.deployments_in_error {
                writeln!(f, "  {name} -> {problem}")?;
            }
        }

        if self.contexts_missing_dependencies.values().any(|d| !d.is_empty()) {
            writeln!(f, "\nCONTEXTS MISSING DEPENDENCIES:")?;
            for (context, demands) in &self.contexts_missing_dependencies {
                if demands.is_empty() {
                    continue;
                }
                writeln!(f, "  {context}")?;
                for demand in demands {
                    let kind = match demand.kind {
                        MissingKind::HardMissing => "missing",
                        MissingKind::BlockedOnAsync => "blocked-on-async",
                    };
                    writeln!(
                        f,
                        "    requires {}{{{}}} [{kind}]",
                        demand.target, demand.required_state
                    )?;
                }
            }
        }

        if !self.contexts_in_error.is_empty() {
            writeln!(f, "\nCONTEXTS IN ERROR:")?;
            for (context, problem) in &self.contexts_in_error {
                writeln!(f, "  {context} -> {problem}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_complete_and_renders_no_headers() {
        let report = IncompleteDeployments::default();
        assert!(!report.is_incomplete());

        let rendered = report.to_string();
        assert!(!rendered.contains("DEPLOYMENTS IN ERROR"));
        assert!(!rendered.contains("CONTEXTS IN ERROR"));
        assert!(!rendered.contains("MISSING DEPLOYERS"));
        assert!(!rendered.contains("MISSING DEPENDENCIES"));
    }

    #[test]
    fn async_only_report_omits_error_headers() {
        let mut report = IncompleteDeployments::default();
        report.contexts_missing_dependencies.insert(
            "Bean".to_string(),
            vec![MissingDependency {
                target: "Dependency".to_string(),
                required_state: ContextState::Installed,
                kind: MissingKind::BlockedOnAsync,
            }],
        );

        assert!(report.is_incomplete());
        assert!(report.only_blocked_on_async());

        let rendered = report.to_string();
        assert!(!rendered.contains("DEPLOYMENTS IN ERROR"));
        assert!(rendered.contains("CONTEXTS MISSING DEPENDENCIES"));
        assert!(rendered.contains("requires Dependency{Installed} [blocked-on-async]"));
    }

    #[test]
    fn hard_miss_is_not_async_only() {
        let mut report = IncompleteDeployments::default();
        report.contexts_missing_dependencies.insert(
            "a".to_string(),
            vec![MissingDependency {
                target: "gone".to_string(),
                required_state: ContextState::Installed,
                kind: MissingKind::HardMissing,
            }],
        );
        assert!(report.is_incomplete());
        assert!(!report.only_blocked_on_async());
    }

    #[test]
    fn serializes_to_json() {
        let mut report = IncompleteDeployments::default();
        report
            .contexts_in_error
            .insert("x".to_string(), "boom".to_string());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["contexts_in_error"]["x"], "boom");
    }
}
