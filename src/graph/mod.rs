// ABOUTME: Narrow contract over the external dependency graph runtime.
// ABOUTME: The engine only reads states, demands, async flags, and problems.

mod memory;

pub use memory::MemoryGraph;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Resolution state of a named context in the dependency graph.
///
/// Ordered: a demand for `Resolving` is satisfied by a context that is
/// `Resolving` or `Installed`, never by a `Failed` one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ContextState {
    Registered,
    Resolving,
    Installed,
    Failed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContextState::Registered => "Registered",
            ContextState::Resolving => "Resolving",
            ContextState::Installed => "Installed",
            ContextState::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}

/// A dependency demanded by one context: a target name and the state the
/// target must reach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Demand {
    pub target: String,
    pub required_state: ContextState,
}

impl Demand {
    pub fn new(target: impl Into<String>, required_state: ContextState) -> Self {
        Self {
            target: target.into(),
            required_state,
        }
    }
}

/// Everything needed to install a context: its demands and whether its
/// installation runs asynchronously on graph-managed workers.
#[derive(Debug, Clone, Default)]
pub struct ContextSeed {
    pub demands: Vec<Demand>,
    pub asynchronous: bool,
}

impl ContextSeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_demand(mut self, target: impl Into<String>, required_state: ContextState) -> Self {
        self.demands.push(Demand::new(target, required_state));
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.asynchronous = true;
        self
    }
}

/// Read view of one installed context. Implementations return momentary
/// snapshots; the engine never blocks on them.
pub trait GraphContext: Send + Sync {
    fn name(&self) -> &str;

    fn state(&self) -> ContextState;

    /// Demands not currently satisfied by the graph.
    fn unresolved_demands(&self) -> Vec<Demand>;

    /// True while installation is still running on a worker the engine
    /// does not wait for; false once the worker reported back.
    fn is_asynchronous(&self) -> bool;

    /// Recorded failure, if any.
    fn problem(&self) -> Option<String>;
}

/// The dependency graph runtime, consumed through a narrow contract.
pub trait DependencyGraph: Send + Sync {
    fn install_context(&self, name: &str, seed: ContextSeed) -> Result<(), GraphError>;

    /// Snapshot of a context regardless of state.
    fn context(&self, name: &str) -> Option<Arc<dyn GraphContext>>;

    /// Snapshot of a context only if it reached `Installed`.
    fn installed_context(&self, name: &str) -> Option<Arc<dyn GraphContext>>;

    fn uninstall_context(&self, name: &str);
}

/// Errors from dependency graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("context already installed: {0}")]
    AlreadyInstalled(String),

    #[error("unknown context: {0}")]
    UnknownContext(String),
}
