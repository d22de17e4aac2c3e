//! Loads the road-midpoint dataset.
//!
//! The dataset is a CSV file, local or remote, that must carry `Latitude`
//! and `Longitude` columns. Any other columns are ignored.

use std::time::Duration;

use csv::ReaderBuilder;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fetch::{HttpClient, fetch_bytes};

pub const LATITUDE_COLUMN: &str = "Latitude";
pub const LONGITUDE_COLUMN: &str = "Longitude";

const SOURCE_TIMEOUT: Duration = Duration::from_secs(30);

/// One midpoint to look up. `index` is the zero-based data row in the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRow {
    pub index: usize,
    pub latitude: f64,
    pub longitude: f64,
}

/// Fatal problems with the dataset. Either one aborts the run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("dataset unavailable at {location}: {reason}")]
    DataUnavailable { location: String, reason: String },

    #[error("dataset is missing required column(s): {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<&'static str> },
}

impl SourceError {
    fn unavailable(location: &str, reason: impl ToString) -> Self {
        SourceError::DataUnavailable {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Fetches (or reads) the dataset at `location` and parses it into points.
#[tracing::instrument(skip(client))]
pub async fn load_points<C: HttpClient>(
    client: &C,
    location: &str,
) -> Result<Vec<PointRow>, SourceError> {
    let bytes = if is_remote(location) {
        fetch_bytes(client, location, SOURCE_TIMEOUT)
            .await
            .map_err(|e| SourceError::unavailable(location, format!("{e:#}")))?
    } else {
        std::fs::read(location).map_err(|e| SourceError::unavailable(location, e))?
    };
    debug!(bytes = bytes.len(), "Dataset received");

    let points = parse_points(&bytes).map_err(|e| match e {
        ParseError::Schema(err) => err,
        ParseError::Csv(err) => SourceError::unavailable(location, err),
    })?;

    info!(rows = points.len(), "Dataset loaded");
    Ok(points)
}

enum ParseError {
    Schema(SourceError),
    Csv(csv::Error),
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        ParseError::Csv(err)
    }
}

fn parse_points(bytes: &[u8]) -> Result<Vec<PointRow>, ParseError> {
    // Short rows are tolerated; their missing cells fail `parse_coord`.
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(bytes);

    let headers = reader.headers()?.clone();
    let lat_pos = headers.iter().position(|h| h == LATITUDE_COLUMN);
    let lon_pos = headers.iter().position(|h| h == LONGITUDE_COLUMN);

    let (lat_pos, lon_pos) = match (lat_pos, lon_pos) {
        (Some(lat), Some(lon)) => (lat, lon),
        (lat, lon) => {
            let mut missing = Vec::new();
            if lat.is_none() {
                missing.push(LATITUDE_COLUMN);
            }
            if lon.is_none() {
                missing.push(LONGITUDE_COLUMN);
            }
            return Err(ParseError::Schema(SourceError::SchemaMismatch { missing }));
        }
    };

    let mut points = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let lat = parse_coord(record.get(lat_pos));
        let lon = parse_coord(record.get(lon_pos));

        match (lat, lon) {
            (Some(latitude), Some(longitude)) => points.push(PointRow {
                index,
                latitude,
                longitude,
            }),
            _ => warn!(row = index, "Row has no usable coordinates, skipping"),
        }
    }

    Ok(points)
}

fn parse_coord(cell: Option<&str>) -> Option<f64> {
    cell.and_then(|c| c.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
