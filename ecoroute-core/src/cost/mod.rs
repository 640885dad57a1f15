//! Composite arc cost: distance and CO2 emission weighted by traffic state.
//!
//! `cost = (alpha * distance_km + beta * emission_g) * state_factor`

pub mod arc_model;
pub mod cost_model;
pub mod training;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::learning::metrics::median;
use crate::model::TrafficState;

pub use arc_model::{ArcFeatureModel, ArcPrediction};
pub use cost_model::CostModel;
pub use training::{CostSource, ModelEvaluation, TrainingConfig, TrainingReport, train};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostWeights {
    /// Weight of the distance in kilometres
    pub alpha: f64,
    /// Weight of the emission in grams
    pub beta: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.5,
        }
    }
}

impl CostWeights {
    pub fn composite_cost(&self, distance_km: f64, emission_g: f64, state_factor: f64) -> f64 {
        (self.alpha * distance_km + self.beta * emission_g) * state_factor
    }
}

/// Multiplier applied to the cost for each traffic state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrafficFactors(pub BTreeMap<TrafficState, f64>);

impl Default for TrafficFactors {
    fn default() -> Self {
        Self(BTreeMap::from([
            (TrafficState::Fluide, 1.0),
            (TrafficState::PreSature, 1.5),
            (TrafficState::Ouvert, 1.2),
            (TrafficState::Invalide, 2.0),
        ]))
    }
}

impl TrafficFactors {
    /// Fixes the factor of unmapped states to the median of the mapped
    /// factors seen across `states`, or 1 when no mapped state was seen.
    pub fn resolve(&self, states: impl IntoIterator<Item = TrafficState>) -> ResolvedFactors {
        let observed: Vec<f64> = states
            .into_iter()
            .filter_map(|state| self.0.get(&state).copied())
            .collect();
        let fallback = if observed.is_empty() {
            1.0
        } else {
            median(&observed)
        };
        ResolvedFactors {
            factors: self.0.clone(),
            fallback,
        }
    }
}

/// Traffic factors with the fill value for unmapped states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFactors {
    factors: BTreeMap<TrafficState, f64>,
    fallback: f64,
}

impl ResolvedFactors {
    pub fn factor(&self, state: TrafficState) -> f64 {
        self.factors.get(&state).copied().unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> f64 {
        self.fallback
    }
}

impl Default for ResolvedFactors {
    fn default() -> Self {
        TrafficFactors::default().resolve([])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_cost_formula() {
        let weights = CostWeights::default();
        assert_eq!(weights.composite_cost(2.0, 100.0, 1.5), 76.5);

        let distance_only = CostWeights {
            alpha: 1.0,
            beta: 0.0,
        };
        assert_eq!(distance_only.composite_cost(2.0, 100.0, 2.0), 4.0);
    }

    #[test]
    fn unmapped_states_take_the_observed_median() {
        let factors = TrafficFactors::default().resolve([
            TrafficState::Fluide,
            TrafficState::Fluide,
            TrafficState::PreSature,
            TrafficState::Sature,
        ]);
        assert_eq!(factors.factor(TrafficState::PreSature), 1.5);
        assert_eq!(factors.factor(TrafficState::Sature), 1.0);
        assert_eq!(factors.factor(TrafficState::Bloque), 1.0);

        let congested = TrafficFactors::default().resolve([
            TrafficState::Invalide,
            TrafficState::PreSature,
        ]);
        assert_eq!(congested.factor(TrafficState::Bloque), 1.75);
    }

    #[test]
    fn falls_back_to_one_without_mapped_states() {
        let factors = TrafficFactors::default().resolve([TrafficState::Bloque]);
        assert_eq!(factors.fallback(), 1.0);
    }
}
