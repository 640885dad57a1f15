//! Dijkstra search over the cost graph

mod state;

use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::network::CostGraph;
use state::State;

/// Settled costs and the edge each node was reached through.
/// Nodes only discovered before an early exit are not part of the tree.
#[derive(Debug, Clone)]
pub struct SearchTree {
    source: NodeIndex,
    settled: FixedBitSet,
    costs: HashMap<NodeIndex, f64>,
    predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
}

impl SearchTree {
    pub fn is_settled(&self, node: NodeIndex) -> bool {
        self.settled.contains(node.index())
    }

    /// Final least cost to `node`, `None` unless the node was settled
    pub fn cost(&self, node: NodeIndex) -> Option<f64> {
        if !self.is_settled(node) {
            return None;
        }
        self.costs.get(&node).copied()
    }

    /// Number of settled nodes
    pub fn reached(&self) -> usize {
        self.settled.count_ones(..)
    }

    /// Nodes and edges from the source to `target`, or `None` when the
    /// target was not settled
    pub fn path_to(&self, target: NodeIndex) -> Option<(Vec<NodeIndex>, Vec<EdgeIndex>)> {
        if !self.is_settled(target) {
            return None;
        }
        let mut nodes = vec![target];
        let mut edges = Vec::new();
        let mut current = target;
        while current != self.source {
            let &(prev, edge) = self.predecessors.get(&current)?;
            nodes.push(prev);
            edges.push(edge);
            current = prev;
        }
        nodes.reverse();
        edges.reverse();
        Some((nodes, edges))
    }
}

/// Single-source search on edge cost. Stops early once `target` is settled.
pub fn dijkstra(graph: &CostGraph, source: NodeIndex, target: Option<NodeIndex>) -> SearchTree {
    let inner = graph.graph();
    let mut settled = FixedBitSet::with_capacity(inner.node_count());
    let mut costs: HashMap<NodeIndex, f64> = HashMap::new();
    let mut predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)> = HashMap::new();
    let mut heap = BinaryHeap::new();

    heap.push(State {
        cost: 0.0,
        node: source,
    });
    costs.insert(source, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        if settled.put(node.index()) {
            continue;
        }
        if target == Some(node) {
            break;
        }

        for edge in inner.edges(node) {
            let next = edge.target();
            if settled.contains(next.index()) {
                continue;
            }
            let next_cost = cost + edge.weight().cost;

            match costs.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                    predecessors.insert(next, (node, edge.id()));
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                        predecessors.insert(next, (node, edge.id()));
                    }
                }
            }
        }
    }

    SearchTree {
        source,
        settled,
        costs,
        predecessors,
    }
}
