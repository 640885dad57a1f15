//! Undirected road graph weighted by composite cost, with a spatial index
//! over its junctions for snapping arbitrary coordinates.

use geo::{Distance, Haversine, Point};
use hashbrown::HashMap;
use log::{info, warn};
use petgraph::graph::{NodeIndex, UnGraph};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rstar::RTree;
use rstar::primitives::GeomWithData;

use super::arc_costs::ArcCost;
use super::components::{ArcEdge, ArcNode, EdgeAggregation};
use crate::{Error, NodeId};

pub type IndexedNode = GeomWithData<[f64; 2], NodeIndex>;

#[derive(Debug, Clone)]
pub struct CostGraph {
    graph: UnGraph<ArcNode, ArcEdge>,
    node_lookup: HashMap<NodeId, NodeIndex>,
    rtree: RTree<IndexedNode>,
}

#[derive(Debug, Default)]
struct SkippedArcs {
    self_loops: usize,
    invalid_costs: usize,
    degenerate: usize,
}

impl CostGraph {
    /// Builds the graph from arc cost rows.
    ///
    /// A node takes its coordinate from the first row mentioning it: the
    /// first geometry point for an upstream node, the last for a downstream
    /// one. Self-loops, rows with a negative or non-finite cost and rows with
    /// fewer than two points are skipped. Repeated rows between the same
    /// pair of nodes are merged according to `aggregation`.
    pub fn from_arcs(arcs: &[ArcCost], aggregation: EdgeAggregation) -> Self {
        let mut graph = UnGraph::<ArcNode, ArcEdge>::default();
        let mut node_lookup: HashMap<NodeId, NodeIndex> = HashMap::new();
        let mut groups: Vec<(NodeIndex, NodeIndex, Vec<&ArcCost>)> = Vec::new();
        let mut group_of: HashMap<(NodeIndex, NodeIndex), usize> = HashMap::new();
        let mut skipped = SkippedArcs::default();

        for arc in arcs {
            if arc.upstream == arc.downstream {
                skipped.self_loops += 1;
                continue;
            }
            if !arc.cost.is_finite() || arc.cost < 0.0 {
                skipped.invalid_costs += 1;
                continue;
            }
            if arc.shape.line.0.len() < 2 {
                skipped.degenerate += 1;
                continue;
            }

            let mut node_index = |id: NodeId, point: Point<f64>| {
                *node_lookup
                    .entry(id)
                    .or_insert_with(|| graph.add_node(ArcNode { id, geometry: point }))
            };
            let from = node_index(arc.upstream, arc.shape.first().into());
            let to = node_index(arc.downstream, arc.shape.last().into());

            let key = if from < to { (from, to) } else { (to, from) };
            match group_of.entry(key) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(groups.len());
                    groups.push((from, to, vec![arc]));
                }
                hashbrown::hash_map::Entry::Occupied(entry) => {
                    groups[*entry.get()].2.push(arc);
                }
            }
        }

        let mut merged = 0usize;
        for (from, to, rows) in &groups {
            merged += rows.len() - 1;
            if let Some(edge) = merge_rows(rows, aggregation) {
                graph.add_edge(*from, *to, edge);
            }
        }

        let total_skipped = skipped.self_loops + skipped.invalid_costs + skipped.degenerate;
        if total_skipped > 0 {
            warn!(
                "Skipped {total_skipped} arcs: {} self-loops, {} invalid costs, {} degenerate geometries",
                skipped.self_loops, skipped.invalid_costs, skipped.degenerate
            );
        }
        if merged > 0 {
            info!("Merged {merged} repeated arcs ({aggregation:?})");
        }
        if graph.node_count() == 0 {
            warn!("Cost graph is empty");
        }

        let points: Vec<IndexedNode> = graph
            .node_indices()
            .map(|idx| {
                let geometry = graph[idx].geometry;
                GeomWithData::new([geometry.x(), geometry.y()], idx)
            })
            .collect();
        let rtree = RTree::bulk_load(points);

        info!(
            "Built cost graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Self {
            graph,
            node_lookup,
            rtree,
        }
    }

    pub fn graph(&self) -> &UnGraph<ArcNode, ArcEdge> {
        &self.graph
    }

    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_lookup.get(&id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&ArcNode> {
        self.graph.node_weight(idx)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_lookup.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Junction closest to `point` (lon, lat) and its haversine distance
    /// in metres
    ///
    /// # Errors
    ///
    /// Returns `NoPointsFound` if the graph has no nodes.
    pub fn nearest_node(&self, point: Point<f64>) -> Result<(NodeId, f64), Error> {
        let idx = self
            .rtree
            .nearest_neighbor(&[point.x(), point.y()])
            .map(|n| n.data)
            .ok_or(Error::NoPointsFound)?;
        let node = &self.graph[idx];
        Ok((node.id, Haversine.distance(point, node.geometry)))
    }

    /// Node ids of each connected component, ids sorted, largest component
    /// first
    pub fn connected_components(&self) -> Vec<Vec<NodeId>> {
        let mut components: Vec<Vec<NodeId>> =
            rustworkx_core::connectivity::connected_components(&self.graph)
                .into_iter()
                .map(|component| {
                    let mut ids: Vec<NodeId> =
                        component.into_iter().map(|idx| self.graph[idx].id).collect();
                    ids.sort_unstable();
                    ids
                })
                .collect();
        components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        components
    }

    /// Two distinct nodes of the same component, drawn with a seeded RNG
    ///
    /// # Errors
    ///
    /// Returns an error if no component has more than one node.
    pub fn random_connected_pair(&self, seed: u64) -> Result<(NodeId, NodeId), Error> {
        let candidates: Vec<Vec<NodeId>> = self
            .connected_components()
            .into_iter()
            .filter(|component| component.len() > 1)
            .collect();

        let mut rng = StdRng::seed_from_u64(seed);
        let component = candidates.choose(&mut rng).ok_or_else(|| {
            Error::InvalidData("no connected pair of nodes in the graph".to_string())
        })?;
        let picked: Vec<&NodeId> = component.choose_multiple(&mut rng, 2).collect();
        match picked.as_slice() {
            [source, target] => Ok((**source, **target)),
            _ => Err(Error::InvalidData(
                "no connected pair of nodes in the graph".to_string(),
            )),
        }
    }
}

fn merge_rows(rows: &[&ArcCost], aggregation: EdgeAggregation) -> Option<ArcEdge> {
    let representative = match aggregation {
        EdgeAggregation::Mean => rows.first(),
        EdgeAggregation::Last => rows.last(),
        EdgeAggregation::Min => rows.iter().min_by(|a, b| a.cost.total_cmp(&b.cost)),
    }?;

    let mut edge = ArcEdge {
        arc_id: representative.arc_id,
        label: representative.label.clone(),
        cost: representative.cost,
        distance_km: representative.distance_km,
        emission_g: representative.emission_g,
        upstream: representative.upstream,
        geometry: representative.shape.line.clone(),
        samples: rows.len(),
    };

    if aggregation == EdgeAggregation::Mean && rows.len() > 1 {
        #[allow(clippy::cast_precision_loss)]
        let n = rows.len() as f64;
        edge.cost = rows.iter().map(|r| r.cost).sum::<f64>() / n;
        edge.distance_km = rows.iter().map(|r| r.distance_km).sum::<f64>() / n;
        edge.emission_g = rows.iter().map(|r| r.emission_g).sum::<f64>() / n;
    }
    Some(edge)
}
