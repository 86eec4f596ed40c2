// ABOUTME: Single-pass completeness scan over the live dependency graph.
// ABOUTME: Classifies unresolved demands as hard-missing or blocked-on-async.

use crate::graph::{ContextState, DependencyGraph};
use crate::unit::{DeploymentUnit, UnitState};

use super::report::{IncompleteDeployments, MissingDependency, MissingKind};

/// Scans the dependency graph state for the units in scope.
///
/// The scan is a flat, non-recursive pass over current state: it never
/// blocks, never retries, and needs no cycle detection — two mutually
/// unresolved contexts simply both stay listed until something changes
/// externally.
pub struct CompletenessChecker;

impl CompletenessChecker {
    pub fn check<'a, I>(roots: I, graph: &dyn DependencyGraph) -> IncompleteDeployments
    where
        I: IntoIterator<Item = &'a DeploymentUnit>,
    {
        let mut report = IncompleteDeployments::default();

        for root in roots {
            if !root.any_output_produced() {
                report.deployments_missing_deployer.insert(root.name().clone());
            }
            collect_unit_failures(root, &mut report);

            for (owner, context_name) in root.collect_context_names() {
                let Some(context) = graph.context(&context_name) else {
                    continue;
                };
                if context.state() == ContextState::Installed {
                    continue;
                }

                if let Some(problem) = context.problem() {
                    report.contexts_in_error.insert(context_name.clone(), problem.clone());
                    report.deployments_in_error.entry(owner.clone()).or_insert(problem);
                    continue;
                }

                for demand in context.unresolved_demands() {
                    let kind = classify_demand(graph, &demand.target);
                    report
                        .contexts_missing_dependencies
                        .entry(context_name.clone())
                        .or_default()
                        .push(MissingDependency {
                            target: demand.target,
                            required_state: demand.required_state,
                            kind,
                        });
                }
            }
        }

        report
    }
}

/// Classify by the demanded target itself: a target that exists, has not
/// failed, and is installing asynchronously is merely in flight; anything
/// else is a hard miss.
fn classify_demand(graph: &dyn DependencyGraph, target: &str) -> MissingKind {
    match graph.context(target) {
        Some(target_context)
            if target_context.is_asynchronous()
                && target_context.state() != ContextState::Failed
                && target_context.state() != ContextState::Installed =>
        {
            MissingKind::BlockedOnAsync
        }
        _ => MissingKind::HardMissing,
    }
}

fn collect_unit_failures(unit: &DeploymentUnit, report: &mut IncompleteDeployments) {
    if unit.state() == UnitState::Failed {
        let message = unit
            .problem()
            .map(|p| p.message.clone())
            .unwrap_or_else(|| "unknown failure".to_string());
        report.deployments_in_error.insert(unit.name().clone(), message);
    }
    for nested in unit.children().iter().chain(unit.components().iter()) {
        collect_unit_failures(nested, report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ContextSeed, MemoryGraph};
    use crate::types::UnitName;

    fn unit(name: &str) -> DeploymentUnit {
        DeploymentUnit::new(UnitName::new(name).unwrap())
    }

    #[test]
    fn installed_contexts_are_ignored() {
        let graph = MemoryGraph::new();
        graph.install_context("ok", ContextSeed::new()).unwrap();

        let mut root = unit("app.jar");
        root.produced_output = true;
        root.register_context_name("ok");

        let report = CompletenessChecker::check([&root], &graph);
        assert!(!report.is_incomplete());
    }

    #[test]
    fn failed_context_lists_owner_in_error() {
        let graph = MemoryGraph::new();
        graph.install_context("bad", ContextSeed::new()).unwrap();
        graph.fail_context("bad", "kaboom").unwrap();

        let mut root = unit("app.jar");
        root.produced_output = true;
        root.register_context_name("bad");

        let report = CompletenessChecker::check([&root], &graph);
        assert_eq!(report.contexts_in_error.get("bad").map(String::as_str), Some("kaboom"));
        assert!(report.deployments_in_error.contains_key(root.name()));
    }

    #[test]
    fn deployment_without_any_output_is_missing_a_deployer() {
        let graph = MemoryGraph::new();
        let root = unit("untouched.jar");

        let report = CompletenessChecker::check([&root], &graph);
        assert!(report.deployments_missing_deployer.contains(root.name()));
        assert!(report.is_incomplete());
    }

    #[test]
    fn completed_async_target_is_a_hard_miss() {
        let graph = MemoryGraph::new();
        graph
            .install_context(
                "dep",
                ContextSeed::new()
                    .asynchronous()
                    .with_demand("nowhere", ContextState::Installed),
            )
            .unwrap();
        graph
            .install_context(
                "bean",
                ContextSeed::new().with_demand("dep", ContextState::Installed),
            )
            .unwrap();

        let mut root = unit("app.jar");
        root.produced_output = true;
        root.register_context_name("bean");

        // Worker still running: the miss is merely in flight.
        let report = CompletenessChecker::check([&root], &graph);
        assert_eq!(
            report.contexts_missing_dependencies["bean"][0].kind,
            MissingKind::BlockedOnAsync
        );

        // Worker done but the target still unresolved: nothing left to
        // wait for, so the miss is genuine.
        graph.complete_async("dep").unwrap();
        let report = CompletenessChecker::check([&root], &graph);
        assert_eq!(
            report.contexts_missing_dependencies["bean"][0].kind,
            MissingKind::HardMissing
        );
    }

    #[test]
    fn absent_target_is_a_hard_miss() {
        let graph = MemoryGraph::new();
        graph
            .install_context(
                "bean",
                ContextSeed::new().with_demand("nowhere", ContextState::Installed),
            )
            .unwrap();

        let mut root = unit("app.jar");
        root.produced_output = true;
        root.register_context_name("bean");

        let report = CompletenessChecker::check([&root], &graph);
        let demands = &report.contexts_missing_dependencies["bean"];
        assert_eq!(demands.len(), 1);
        assert_eq!(demands[0].kind, MissingKind::HardMissing);
        assert_eq!(demands[0].target, "nowhere");
    }
}
