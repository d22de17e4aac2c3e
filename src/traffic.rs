//! Client for the TomTom Traffic Flow `flowSegmentData` endpoint.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use serde_json::Value;

use crate::fetch::{HttpClient, get_request};
use crate::source::PointRow;

pub const DEFAULT_BASE_URL: &str = "https://api.tomtom.com";

/// Speed unit requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SpeedUnit {
    Kmph,
    Mph,
}

impl SpeedUnit {
    fn as_param(self) -> &'static str {
        match self {
            SpeedUnit::Kmph => "KMPH",
            SpeedUnit::Mph => "MPH",
        }
    }
}

/// Static request settings shared by every lookup in a run.
#[derive(Debug, Clone)]
pub struct TrafficConfig {
    pub base_url: String,
    /// `absolute`, `relative`, `relative0`, ...
    pub style: String,
    pub zoom: u8,
    pub unit: SpeedUnit,
    pub timeout: Duration,
    pub include_road_closure: bool,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            style: "absolute".to_string(),
            zoom: 10,
            unit: SpeedUnit::Kmph,
            timeout: Duration::from_secs(10),
            include_road_closure: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Coordinates {
    pub coordinate: Vec<Coordinate>,
}

/// The `flowSegmentData` payload. Unused response fields are dropped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSegment {
    pub coordinates: Coordinates,
    pub current_speed: Option<f64>,
    pub free_flow_speed: Option<f64>,
    pub confidence: Option<f64>,
    pub road_closure: Option<bool>,
}

/// Why a row produced no feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Transport(String),
    HttpStatus(u16),
    Decode(String),
    NoSegmentData,
    EmptyGeometry,
}

impl SkipReason {
    /// Short stable label, used as a log field and report key.
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::Transport(_) => "transport",
            SkipReason::HttpStatus(_) => "http_status",
            SkipReason::Decode(_) => "decode",
            SkipReason::NoSegmentData => "no_segment_data",
            SkipReason::EmptyGeometry => "empty_geometry",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Transport(msg) => write!(f, "request failed: {msg}"),
            SkipReason::HttpStatus(code) => write!(f, "API returned status {code}"),
            SkipReason::Decode(msg) => write!(f, "could not decode response: {msg}"),
            SkipReason::NoSegmentData => f.write_str("no flow segment data for this point"),
            SkipReason::EmptyGeometry => f.write_str("flow segment has no coordinates"),
        }
    }
}

/// Looks up flow segments through an (already authenticated) [`HttpClient`].
pub struct TrafficApi<C> {
    client: C,
    config: TrafficConfig,
    endpoint: reqwest::Url,
}

impl<C: HttpClient> TrafficApi<C> {
    pub fn new(client: C, config: TrafficConfig) -> Result<Self> {
        let endpoint = format!(
            "{}/traffic/services/4/flowSegmentData/{}/{}/json",
            config.base_url.trim_end_matches('/'),
            config.style,
            config.zoom
        );
        let endpoint = reqwest::Url::parse(&endpoint)
            .with_context(|| format!("invalid traffic API endpoint {endpoint}"))?;

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    pub fn config(&self) -> &TrafficConfig {
        &self.config
    }

    fn request_url(&self, point: &PointRow) -> reqwest::Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("point", &format!("{},{}", point.latitude, point.longitude))
            .append_pair("unit", self.config.unit.as_param())
            .append_pair("openLr", "false");
        url
    }

    /// One request, no retry.
    pub async fn flow_segment(&self, point: &PointRow) -> Result<FlowSegment, SkipReason> {
        let req = get_request(self.request_url(point), self.config.timeout);

        let resp = self.client.execute(req).await.map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SkipReason::HttpStatus(status.as_u16()));
        }

        let body = resp.bytes().await.map_err(transport)?;

        decode_segment(&body)
    }
}

// The request URL carries the API key when `QueryKey` is in use.
fn transport(err: reqwest::Error) -> SkipReason {
    SkipReason::Transport(err.without_url().to_string())
}

/// Pulls `flowSegmentData` out of a response body.
///
/// A missing, `null` or empty payload means the API has nothing for the point.
pub fn decode_segment(body: &[u8]) -> Result<FlowSegment, SkipReason> {
    let mut doc: Value =
        serde_json::from_slice(body).map_err(|e| SkipReason::Decode(e.to_string()))?;

    let segment = match doc.get_mut("flowSegmentData").map(Value::take) {
        None | Some(Value::Null) => return Err(SkipReason::NoSegmentData),
        Some(Value::Object(map)) if map.is_empty() => return Err(SkipReason::NoSegmentData),
        Some(segment) => segment,
    };

    serde_json::from_value(segment).map_err(|e| SkipReason::Decode(e.to_string()))
}
