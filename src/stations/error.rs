use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StationConfigError {
    #[error("Failed to read station file '{0}'")]
    Read(PathBuf, #[source] Arc<std::io::Error>),

    #[error("Failed to parse station configuration")]
    Parse(#[source] Arc<serde_json::Error>),

    #[error("Station {0} is configured more than once")]
    DuplicateStation(u32),

    #[error("Station configuration contains no stations")]
    Empty,
}
