//! Run configuration, assembled by the CLI and passed down explicitly.

use std::path::PathBuf;

use crate::traffic::TrafficConfig;

pub const DEFAULT_SOURCE: &str =
    "https://raw.githubusercontent.com/TaylorsvilleGIS/Traffic/main/road_midpoints.csv";
pub const DEFAULT_OUTPUT: &str = "traffic_data.geojson";

#[derive(Debug, Clone)]
pub struct Config {
    /// URL or local path of the midpoint CSV.
    pub source: String,
    pub output: PathBuf,
    pub traffic: TrafficConfig,
    /// Stamp `last_updated` on every feature.
    pub stamp_timestamp: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            traffic: TrafficConfig::default(),
            stamp_timestamp: true,
        }
    }
}
