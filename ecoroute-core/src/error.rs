use thiserror::Error;

use crate::NodeId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No nearby points found for snapping")]
    NoPointsFound,
    #[error("Unknown network node: {0}")]
    UnknownNode(NodeId),
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Empty dataset: {0}")]
    EmptyDataset(&'static str),
    #[error("Model error: {0}")]
    ModelError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
