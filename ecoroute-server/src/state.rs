use std::sync::Arc;

use ecoroute_core::Error;
use ecoroute_core::cost::ArcFeatureModel;
use ecoroute_core::learning::load_json;
use ecoroute_core::network::{CostGraph, read_arc_costs};

use crate::config::ServerConfig;

/// Read-only artifacts shared by every request
#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<CostGraph>,
    pub arc_model: Arc<ArcFeatureModel>,
}

impl AppState {
    pub fn new(graph: CostGraph, arc_model: ArcFeatureModel) -> Self {
        Self {
            graph: Arc::new(graph),
            arc_model: Arc::new(arc_model),
        }
    }

    /// Loads the arc cost table and the arc feature model named in `config`
    ///
    /// # Errors
    ///
    /// Returns an error if either artifact cannot be read.
    pub fn load(config: &ServerConfig) -> Result<Self, Error> {
        let arcs = read_arc_costs(&config.arc_costs_path)?;
        let graph = CostGraph::from_arcs(&arcs, config.aggregation);
        let arc_model: ArcFeatureModel = load_json(&config.arc_model_path)?;
        tracing::info!(
            "Loaded cost graph ({} nodes, {} edges) and arc model from {}",
            graph.node_count(),
            graph.edge_count(),
            config.arc_model_path.display()
        );
        Ok(Self::new(graph, arc_model))
    }
}
