// ABOUTME: In-memory dependency graph with fixpoint resolution.
// ABOUTME: Asynchronous contexts stay in flight until completed externally.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{ContextSeed, ContextState, Demand, DependencyGraph, GraphContext, GraphError};

#[derive(Debug, Clone)]
struct Entry {
    demands: Vec<Demand>,
    asynchronous: bool,
    async_completed: bool,
    state: ContextState,
    problem: Option<String>,
}

/// Point-in-time snapshot of one context.
#[derive(Debug, Clone)]
struct ContextSnapshot {
    name: String,
    state: ContextState,
    unresolved: Vec<Demand>,
    asynchronous: bool,
    problem: Option<String>,
}

impl GraphContext for ContextSnapshot {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> ContextState {
        self.state
    }

    fn unresolved_demands(&self) -> Vec<Demand> {
        self.unresolved.clone()
    }

    fn is_asynchronous(&self) -> bool {
        self.asynchronous
    }

    fn problem(&self) -> Option<String> {
        self.problem.clone()
    }
}

/// In-memory `DependencyGraph` implementation.
///
/// Synchronous contexts are re-resolved to a fixpoint whenever the graph
/// changes; a context reaches `Installed` once every demand target is at
/// its required state. Asynchronous contexts model installs running on
/// graph-managed workers: they stay `Resolving` until `complete_async`
/// is called, which is why the lock is taken per operation rather than
/// per pipeline pass.
#[derive(Default)]
pub struct MemoryGraph {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an asynchronous context's worker as finished; the context
    /// then resolves like a synchronous one.
    pub fn complete_async(&self, name: &str) -> Result<(), GraphError> {
        {
            let mut entries = self.entries.write();
            let entry = entries
                .get_mut(name)
                .ok_or_else(|| GraphError::UnknownContext(name.to_string()))?;
            entry.async_completed = true;
        }
        self.settle();
        Ok(())
    }

    /// Record a failure against a context.
    pub fn fail_context(&self, name: &str, problem: impl Into<String>) -> Result<(), GraphError> {
        {
            let mut entries = self.entries.write();
            let entry = entries
                .get_mut(name)
                .ok_or_else(|| GraphError::UnknownContext(name.to_string()))?;
            entry.state = ContextState::Failed;
            entry.problem = Some(problem.into());
        }
        self.settle();
        Ok(())
    }

    fn demand_satisfied(entries: &BTreeMap<String, Entry>, demand: &Demand) -> bool {
        entries.get(&demand.target).is_some_and(|target| {
            target.state != ContextState::Failed && target.state >= demand.required_state
        })
    }

    /// Re-resolve until no state changes. Contexts whose worker is still
    /// in flight are pinned at `Resolving`.
    fn settle(&self) {
        let mut entries = self.entries.write();
        loop {
            let mut changed = false;
            let names: Vec<String> = entries.keys().cloned().collect();
            for name in names {
                let entry = &entries[&name];
                if entry.state == ContextState::Failed {
                    continue;
                }
                let satisfied = entry
                    .demands
                    .iter()
                    .all(|d| Self::demand_satisfied(&entries, d));
                let next = if entry.asynchronous && !entry.async_completed {
                    ContextState::Resolving
                } else if satisfied {
                    ContextState::Installed
                } else {
                    ContextState::Registered
                };
                let entry = entries.get_mut(&name).expect("key enumerated above");
                if entry.state != next {
                    entry.state = next;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn snapshot(entries: &BTreeMap<String, Entry>, name: &str) -> Option<ContextSnapshot> {
        let entry = entries.get(name)?;
        let unresolved = entry
            .demands
            .iter()
            .filter(|d| !Self::demand_satisfied(entries, d))
            .cloned()
            .collect();
        Some(ContextSnapshot {
            name: name.to_string(),
            state: entry.state,
            unresolved,
            // In flight only until the worker reports back; a completed
            // asynchronous context resolves like a synchronous one.
            asynchronous: entry.asynchronous && !entry.async_completed,
            problem: entry.problem.clone(),
        })
    }
}

impl DependencyGraph for MemoryGraph {
    fn install_context(&self, name: &str, seed: ContextSeed) -> Result<(), GraphError> {
        {
            let mut entries = self.entries.write();
            if entries.contains_key(name) {
                return Err(GraphError::AlreadyInstalled(name.to_string()));
            }
            entries.insert(
                name.to_string(),
                Entry {
                    demands: seed.demands,
                    asynchronous: seed.asynchronous,
                    async_completed: false,
                    state: ContextState::Registered,
                    problem: None,
                },
            );
        }
        self.settle();
        tracing::debug!(context = name, "context installed into dependency graph");
        Ok(())
    }

    fn context(&self, name: &str) -> Option<Arc<dyn GraphContext>> {
        let entries = self.entries.read();
        Self::snapshot(&entries, name).map(|s| Arc::new(s) as Arc<dyn GraphContext>)
    }

    fn installed_context(&self, name: &str) -> Option<Arc<dyn GraphContext>> {
        self.context(name)
            .filter(|c| c.state() == ContextState::Installed)
    }

    fn uninstall_context(&self, name: &str) {
        self.entries.write().remove(name);
        self.settle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_with_no_demands_installs_immediately() {
        let graph = MemoryGraph::new();
        graph.install_context("a", ContextSeed::new()).unwrap();
        assert_eq!(graph.context("a").unwrap().state(), ContextState::Installed);
        assert!(graph.installed_context("a").is_some());
    }

    #[test]
    fn demand_resolves_when_target_arrives() {
        let graph = MemoryGraph::new();
        graph
            .install_context(
                "bean",
                ContextSeed::new().with_demand("dep", ContextState::Installed),
            )
            .unwrap();
        assert_eq!(graph.context("bean").unwrap().state(), ContextState::Registered);
        assert_eq!(graph.context("bean").unwrap().unresolved_demands().len(), 1);

        graph.install_context("dep", ContextSeed::new()).unwrap();
        assert_eq!(graph.context("bean").unwrap().state(), ContextState::Installed);
        assert!(graph.context("bean").unwrap().unresolved_demands().is_empty());
    }

    #[test]
    fn async_context_stays_resolving_until_completed() {
        let graph = MemoryGraph::new();
        graph
            .install_context("slow", ContextSeed::new().asynchronous())
            .unwrap();

        let ctx = graph.context("slow").unwrap();
        assert_eq!(ctx.state(), ContextState::Resolving);
        assert!(ctx.is_asynchronous());
        assert!(graph.installed_context("slow").is_none());

        graph.complete_async("slow").unwrap();
        let ctx = graph.context("slow").unwrap();
        assert_eq!(ctx.state(), ContextState::Installed);
        assert!(!ctx.is_asynchronous());
    }

    #[test]
    fn failed_target_never_satisfies_a_demand() {
        let graph = MemoryGraph::new();
        graph.install_context("dep", ContextSeed::new()).unwrap();
        graph
            .install_context(
                "bean",
                ContextSeed::new().with_demand("dep", ContextState::Installed),
            )
            .unwrap();
        assert_eq!(graph.context("bean").unwrap().state(), ContextState::Installed);

        graph.fail_context("dep", "exploded").unwrap();
        let bean = graph.context("bean").unwrap();
        assert_eq!(bean.state(), ContextState::Registered);
        assert_eq!(bean.unresolved_demands().len(), 1);
        assert_eq!(graph.context("dep").unwrap().problem().as_deref(), Some("exploded"));
    }

    #[test]
    fn mutual_demands_both_stay_unresolved() {
        let graph = MemoryGraph::new();
        graph
            .install_context("a", ContextSeed::new().with_demand("b", ContextState::Installed))
            .unwrap();
        graph
            .install_context("b", ContextSeed::new().with_demand("a", ContextState::Installed))
            .unwrap();

        assert_eq!(graph.context("a").unwrap().state(), ContextState::Registered);
        assert_eq!(graph.context("b").unwrap().state(), ContextState::Registered);
    }

    #[test]
    fn duplicate_install_is_rejected() {
        let graph = MemoryGraph::new();
        graph.install_context("a", ContextSeed::new()).unwrap();
        assert!(matches!(
            graph.install_context("a", ContextSeed::new()),
            Err(GraphError::AlreadyInstalled(_))
        ));
    }

    #[test]
    fn uninstall_revokes_satisfaction() {
        let graph = MemoryGraph::new();
        graph.install_context("dep", ContextSeed::new()).unwrap();
        graph
            .install_context(
                "bean",
                ContextSeed::new().with_demand("dep", ContextState::Installed),
            )
            .unwrap();

        graph.uninstall_context("dep");
        assert!(graph.context("dep").is_none());
        assert_eq!(graph.context("bean").unwrap().state(), ContextState::Registered);
    }
}
