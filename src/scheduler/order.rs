// ABOUTME: Deterministic per-stage deployer ordering.
// ABOUTME: Kahn's algorithm over produced/consumed tokens with stable tie-breaking.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use super::deployer::Deployer;
use super::error::SchedulerError;

/// Order one stage's deployers: an edge `A → B` exists whenever A's
/// outputs intersect B's inputs (A must run before B). Remaining ties
/// resolve by `relative_order` ascending, then registration sequence.
///
/// Input pairs are `(registration index, deployer)`; the result is the
/// registration indices in execution order. A cycle among the stage's
/// producers/consumers is a registration configuration error.
pub fn order_stage(
    stage: &str,
    deployers: &[(usize, Arc<dyn Deployer>)],
) -> Result<Vec<usize>, SchedulerError> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<NodeIndex> = deployers
        .iter()
        .map(|(reg, _)| graph.add_node(*reg))
        .collect();

    for (a, (_, da)) in deployers.iter().enumerate() {
        for (b, (_, db)) in deployers.iter().enumerate() {
            if a == b {
                continue;
            }
            let produces_for = da
                .meta()
                .outputs
                .iter()
                .any(|out| db.meta().inputs.contains(out));
            if produces_for {
                graph.add_edge(nodes[a], nodes[b], ());
            }
        }
    }

    let mut in_degree: Vec<usize> = nodes
        .iter()
        .map(|&n| graph.neighbors_directed(n, Direction::Incoming).count())
        .collect();

    // Ready set keyed by (relative_order, registration index) so the pick
    // is deterministic and replayable regardless of registration order.
    let mut ready: BinaryHeap<Reverse<(i32, usize, usize)>> = BinaryHeap::new();
    for (pos, (reg, deployer)) in deployers.iter().enumerate() {
        if in_degree[pos] == 0 {
            ready.push(Reverse((deployer.meta().relative_order, *reg, pos)));
        }
    }

    let mut order = Vec::with_capacity(deployers.len());
    while let Some(Reverse((_, reg, pos))) = ready.pop() {
        order.push(reg);
        for neighbor in graph.neighbors_directed(nodes[pos], Direction::Outgoing) {
            let npos = graph[neighbor];
            // Node weights store registration indices; map back to slice position.
            let npos = deployers
                .iter()
                .position(|(r, _)| *r == npos)
                .expect("neighbor weight is a registered index");
            in_degree[npos] -= 1;
            if in_degree[npos] == 0 {
                let (reg, deployer) = &deployers[npos];
                ready.push(Reverse((deployer.meta().relative_order, *reg, npos)));
            }
        }
    }

    if order.len() != deployers.len() {
        let mut members: Vec<String> = deployers
            .iter()
            .enumerate()
            .filter(|(pos, _)| in_degree[*pos] > 0)
            .map(|(_, (_, d))| d.meta().name.clone())
            .collect();
        members.sort();
        return Err(SchedulerError::DeployerCycle {
            stage: stage.to_string(),
            members,
        });
    }

    Ok(order)
}
