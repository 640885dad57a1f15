use serde::{Deserialize, Serialize};

/// Row of the permanent counter export, kept as text until cleaning
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawCountRecord {
    #[serde(rename = "Identifiant arc")]
    pub arc_id: String,
    #[serde(rename = "Libelle")]
    pub label: String,
    #[serde(rename = "Date et heure de comptage")]
    pub counted_at: String,
    #[serde(rename = "Debit_Horaire", alias = "Débit horaire")]
    pub flow: String,
    #[serde(rename = "Taux d'occupation")]
    pub occupancy: String,
    #[serde(rename = "Etat trafic")]
    pub state: String,
    #[serde(rename = "Identifiant noeud amont")]
    pub upstream_node: String,
    #[serde(rename = "Identifiant noeud aval")]
    pub downstream_node: String,
    pub geo_shape: String,
}

impl RawCountRecord {
    /// True when any field needed to build an observation is blank.
    /// The counting timestamp may be missing; it is filled downstream.
    pub fn has_missing_fields(&self) -> bool {
        [
            &self.arc_id,
            &self.label,
            &self.flow,
            &self.occupancy,
            &self.state,
            &self.upstream_node,
            &self.downstream_node,
            &self.geo_shape,
        ]
        .iter()
        .any(|field| field.trim().is_empty())
    }
}

/// Row of the cleaned counter file
#[derive(Debug, Serialize)]
pub struct CleanedCountRow<'a> {
    #[serde(rename = "Identifiant arc")]
    pub arc_id: i64,
    #[serde(rename = "Libelle")]
    pub label: &'a str,
    #[serde(rename = "Date et heure de comptage")]
    pub counted_at: String,
    #[serde(rename = "Debit_Horaire")]
    pub flow: f64,
    #[serde(rename = "Taux d'occupation")]
    pub occupancy: f64,
    #[serde(rename = "Etat trafic")]
    pub state: &'static str,
    #[serde(rename = "Identifiant noeud amont")]
    pub upstream_node: i64,
    #[serde(rename = "Identifiant noeud aval")]
    pub downstream_node: i64,
    pub geo_shape: String,
    pub geo_type: &'a str,
    pub distance_arc: f64,
    #[serde(rename = "Emission_CO2")]
    pub emission_co2: f64,
}
