//! Traffic state reported by the counters

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrafficState {
    #[serde(rename = "Fluide")]
    Fluide,
    #[serde(rename = "Pre_sature")]
    PreSature,
    #[serde(rename = "Sature")]
    Sature,
    #[serde(rename = "Bloque")]
    Bloque,
    #[serde(rename = "Ouvert")]
    Ouvert,
    #[serde(rename = "Invalide")]
    Invalide,
    #[serde(rename = "Inconnu")]
    Unknown,
}

impl TrafficState {
    pub const ALL: [TrafficState; 7] = [
        TrafficState::Fluide,
        TrafficState::PreSature,
        TrafficState::Sature,
        TrafficState::Bloque,
        TrafficState::Ouvert,
        TrafficState::Invalide,
        TrafficState::Unknown,
    ];

    /// Maps a raw or already normalized label to a state.
    /// Accented spellings from the raw export are accepted.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Fluide" => Self::Fluide,
            "Pré-saturé" | "Pre_sature" | "Pre-sature" => Self::PreSature,
            "Saturé" | "Sature" => Self::Sature,
            "Bloqué" | "Bloque" => Self::Bloque,
            "Ouvert" => Self::Ouvert,
            "Invalide" => Self::Invalide,
            _ => Self::Unknown,
        }
    }

    /// Normalized label used in cleaned files
    pub fn label(self) -> &'static str {
        match self {
            Self::Fluide => "Fluide",
            Self::PreSature => "Pre_sature",
            Self::Sature => "Sature",
            Self::Bloque => "Bloque",
            Self::Ouvert => "Ouvert",
            Self::Invalide => "Invalide",
            Self::Unknown => "Inconnu",
        }
    }
}

impl fmt::Display for TrafficState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
