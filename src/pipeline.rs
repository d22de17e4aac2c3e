//! One end-to-end run: load the points, build the features, write or preserve.

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use crate::builder::build_features;
use crate::config::Config;
use crate::fetch::HttpClient;
use crate::output::{RunOutcome, write_collection};
use crate::source::load_points;
use crate::traffic::TrafficApi;

/// Runs the conversion.
///
/// `source_client` fetches the dataset and must not carry the API key;
/// `api` wraps the authenticated client. A [`SourceError`](crate::source::SourceError)
/// aborts before any traffic request is sent.
#[tracing::instrument(skip_all, fields(source = %config.source, output = %config.output.display()))]
pub async fn run<S: HttpClient, C: HttpClient>(
    config: &Config,
    source_client: &S,
    api: &TrafficApi<C>,
) -> Result<RunOutcome> {
    let rows = load_points(source_client, &config.source).await?;

    let stamp = config.stamp_timestamp.then(Utc::now);
    let (collection, report) = build_features(api, &rows, stamp).await;

    let outcome = write_collection(&config.output, &collection)?;
    info!(
        rows = report.rows,
        features = collection.len(),
        written = matches!(outcome, RunOutcome::Written { .. }),
        "Run complete"
    );
    Ok(outcome)
}
