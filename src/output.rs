//! Persistence for the finished feature collection.
//!
//! An empty collection is never written: a run that produced nothing (API
//! outage, bad key, network down) leaves the previous file in place.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::geojson::FeatureCollection;

/// What happened to the output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Written { path: PathBuf, features: usize },
    Preserved { path: PathBuf },
}

/// Writes `collection` to `path`, or leaves `path` alone if it is empty.
///
/// The JSON goes to a temporary file in the same directory first and is then
/// renamed over `path`, so readers never see a half-written document. A
/// failed write leaves neither a partial target nor a stray temporary file.
pub fn write_collection(path: &Path, collection: &FeatureCollection) -> Result<RunOutcome> {
    if collection.is_empty() {
        warn!(
            path = %path.display(),
            existing = path.exists(),
            "No features created, existing GeoJSON will be preserved"
        );
        return Ok(RunOutcome::Preserved {
            path: path.to_path_buf(),
        });
    }

    let dir = match path.parent().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create output directory {}", dir.display())
            })?;
            dir
        }
        None => Path::new("."),
    };

    let body = serde_json::to_vec(collection)?;

    let mut builder = tempfile::Builder::new();
    builder.prefix(".traffic_geojson").suffix(".tmp");
    // Temp files default to 0600; the published file stays world-readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }

    // Dropping `tmp` on any early return deletes it.
    let mut tmp = builder
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    debug!(tmp = %tmp.path().display(), bytes = body.len(), "Writing GeoJSON");

    tmp.write_all(&body)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to move GeoJSON into place at {}", path.display()))?;

    info!(path = %path.display(), features = collection.len(), "GeoJSON written");
    Ok(RunOutcome::Written {
        path: path.to_path_buf(),
        features: collection.len(),
    })
}

/// Reads a previously written collection back.
pub fn read_collection(path: &Path) -> Result<FeatureCollection> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}
