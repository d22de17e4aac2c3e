//! Turns point rows into GeoJSON features, one traffic lookup per row.

use chrono::{DateTime, Utc};
use tracing::{Instrument, debug, info, warn};

use crate::fetch::HttpClient;
use crate::geojson::{Feature, FeatureCollection};
use crate::source::PointRow;
use crate::traffic::{SkipReason, TrafficApi};

/// Result of processing one row.
#[derive(Debug)]
pub enum RowOutcome {
    Built(Feature),
    Skipped(SkipReason),
}

/// Counters for one processing pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub rows: usize,
    pub built: usize,

    // skips by reason
    pub transport_errors: usize,
    pub http_errors: usize,
    pub decode_errors: usize,
    pub no_segment_data: usize,
    pub empty_geometry: usize,
}

impl BuildReport {
    fn record(&mut self, outcome: &RowOutcome) {
        self.rows += 1;
        match outcome {
            RowOutcome::Built(_) => self.built += 1,
            RowOutcome::Skipped(reason) => match reason {
                SkipReason::Transport(_) => self.transport_errors += 1,
                SkipReason::HttpStatus(_) => self.http_errors += 1,
                SkipReason::Decode(_) => self.decode_errors += 1,
                SkipReason::NoSegmentData => self.no_segment_data += 1,
                SkipReason::EmptyGeometry => self.empty_geometry += 1,
            },
        }
    }

    pub fn skipped(&self) -> usize {
        self.rows - self.built
    }
}

/// Looks up a single row and builds its feature.
pub async fn build_row<C: HttpClient>(
    api: &TrafficApi<C>,
    row: &PointRow,
    last_updated: Option<DateTime<Utc>>,
) -> RowOutcome {
    let segment = match api.flow_segment(row).await {
        Ok(segment) => segment,
        Err(reason) => return RowOutcome::Skipped(reason),
    };

    if segment.coordinates.coordinate.is_empty() {
        return RowOutcome::Skipped(SkipReason::EmptyGeometry);
    }

    RowOutcome::Built(Feature::from_segment(
        segment,
        api.config().include_road_closure,
        last_updated,
    ))
}

/// Processes `rows` in order, one request at a time, skipping rows that
/// yield nothing. `last_updated` is stamped on every feature when set.
pub async fn build_features<C: HttpClient>(
    api: &TrafficApi<C>,
    rows: &[PointRow],
    last_updated: Option<DateTime<Utc>>,
) -> (FeatureCollection, BuildReport) {
    let mut collection = FeatureCollection::default();
    let mut report = BuildReport::default();

    info!(rows = rows.len(), "Building features");

    for row in rows {
        let span = tracing::debug_span!(
            "row",
            row = row.index,
            lat = row.latitude,
            lon = row.longitude
        );

        let outcome = build_row(api, row, last_updated).instrument(span).await;
        report.record(&outcome);

        match outcome {
            RowOutcome::Built(feature) => {
                debug!(
                    row = row.index,
                    points = feature.coordinates().len(),
                    "Feature built"
                );
                collection.push(feature);
            }
            RowOutcome::Skipped(reason) => {
                warn!(row = row.index, kind = reason.kind(), %reason, "Row skipped");
            }
        }
    }

    info!(
        rows = report.rows,
        built = report.built,
        skipped = report.skipped(),
        transport_errors = report.transport_errors,
        http_errors = report.http_errors,
        decode_errors = report.decode_errors,
        no_segment_data = report.no_segment_data,
        empty_geometry = report.empty_geometry,
        "Feature build finished"
    );

    (collection, report)
}
