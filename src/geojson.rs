//! The small slice of GeoJSON this tool emits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::traffic::FlowSegment;

/// `[longitude, latitude]`, GeoJSON axis order.
pub type Position = [f64; 2];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    LineString { coordinates: Vec<Position> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficProperties {
    pub current_speed: Option<f64>,
    pub free_flow_speed: Option<f64>,
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_closure: Option<bool>,
    #[serde(
        rename = "last_updated",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: TrafficProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }
}

impl Feature {
    /// Turns a flow segment into a LineString feature, swapping each
    /// `{latitude, longitude}` into `[longitude, latitude]`.
    pub fn from_segment(
        segment: FlowSegment,
        include_road_closure: bool,
        last_updated: Option<DateTime<Utc>>,
    ) -> Self {
        let coordinates = segment
            .coordinates
            .coordinate
            .iter()
            .map(|c| [c.longitude, c.latitude])
            .collect();

        Feature {
            geometry: Geometry::LineString { coordinates },
            properties: TrafficProperties {
                current_speed: segment.current_speed,
                free_flow_speed: segment.free_flow_speed,
                confidence: segment.confidence,
                road_closure: segment.road_closure.filter(|_| include_road_closure),
                last_updated,
            },
        }
    }

    pub fn coordinates(&self) -> &[Position] {
        match &self.geometry {
            Geometry::LineString { coordinates } => coordinates,
        }
    }
}
