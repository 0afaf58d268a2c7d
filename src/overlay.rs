//! Overlay features from external map sources
//!
//! The obstacle map is built from overlay features: roads, waterways, water
//! bodies and wetlands crossing the route corridor. This module defines the
//! feature contract and a blocking fetcher against the OpenStreetMap Overpass
//! API. The fetch is the only suspension point in a request: it is bounded by
//! a 30 second timeout, and on failure the caller builds the obstacle map
//! from terrain data alone and records the degradation.
//!
//! Features can also be loaded from a JSON file produced by the
//! `overlay_fetch` binary, which keeps the core network-free in tests and
//! batch runs.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Overpass API endpoint
pub const OVERPASS_API_URL: &str = "https://overpass-api.de/api/interpreter";

/// Bound on the overlay fetch (s)
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Category of an overlay feature
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    /// Flowing water: river, canal, drain, ditch, stream
    Waterway,
    /// Standing water: lakes, reservoirs, basins
    Water,
    Wetland,
    /// Major roads: motorway through tertiary
    Highway,
}

/// Vertex of an overlay feature polyline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// One feature fetched from the overlay source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverlayFeature {
    pub kind: OverlayKind,

    /// Display name from the source tags, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Specific subtype, e.g. "river", "ditch", "motorway"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    /// Feature polyline
    pub geometry: Vec<GeoPoint>,
}

impl OverlayFeature {
    /// Buffer half-width for intersection tests (m)
    ///
    /// Narrow ditches and drains still get a 5 m exclusion; everything else
    /// uses the default 11 m corridor.
    pub fn buffer_m(&self) -> f64 {
        match self.subtype.as_deref() {
            Some("drain") | Some("ditch") => 5.0,
            _ => 11.0,
        }
    }

    /// Human-readable label for nudge messages
    pub fn label(&self) -> String {
        match (&self.name, &self.subtype) {
            (Some(name), _) => name.clone(),
            (None, Some(sub)) => format!("{:?} ({})", self.kind, sub).to_lowercase(),
            (None, None) => format!("{:?}", self.kind).to_lowercase(),
        }
    }
}

/// Load overlay features from a JSON file written by `overlay_fetch`
pub fn load_overlays<P: AsRef<Path>>(path: P) -> Result<Vec<OverlayFeature>, Box<dyn Error>> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Save overlay features as JSON
pub fn save_overlays<P: AsRef<Path>>(
    path: P,
    features: &[OverlayFeature],
) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(features)?;
    fs::write(path, json)?;
    Ok(())
}

/// Build the Overpass QL query for a bounding box
///
/// Covers flowing water, standing water, wetlands and major roads.
fn overpass_query(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> String {
    let bbox = format!("{},{},{},{}", min_lat, min_lon, max_lat, max_lon);
    format!(
        "[out:json][timeout:25];\n(\n  way[\"waterway\"~\"^(river|canal|drain|ditch|stream)$\"]({bbox});\n  way[\"natural\"=\"water\"]({bbox});\n  way[\"landuse\"=\"reservoir\"]({bbox});\n  way[\"landuse\"=\"basin\"]({bbox});\n  way[\"natural\"=\"wetland\"]({bbox});\n  way[\"highway\"~\"^(motorway|trunk|primary|secondary|tertiary)$\"]({bbox});\n);\nout geom;"
    )
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    tags: std::collections::HashMap<String, String>,
    #[serde(default)]
    geometry: Vec<GeoPoint>,
}

fn classify_element(element: &OverpassElement) -> Option<(OverlayKind, Option<String>)> {
    let tags = &element.tags;
    if let Some(highway) = tags.get("highway") {
        return Some((OverlayKind::Highway, Some(highway.clone())));
    }
    if let Some(waterway) = tags.get("waterway") {
        return Some((OverlayKind::Waterway, Some(waterway.clone())));
    }
    match tags.get("natural").map(String::as_str) {
        Some("water") => return Some((OverlayKind::Water, None)),
        Some("wetland") => return Some((OverlayKind::Wetland, None)),
        _ => {}
    }
    match tags.get("landuse").map(String::as_str) {
        Some("reservoir") | Some("basin") => Some((OverlayKind::Water, tags.get("landuse").cloned())),
        _ => None,
    }
}

/// Fetch overlay features for a route bounding box
///
/// Blocks for at most [`FETCH_TIMEOUT_SECS`]. The bounding box is padded by
/// roughly a kilometre so features just off the corridor are still seen.
pub fn fetch_overlays(
    lats: &[f64],
    lons: &[f64],
) -> Result<Vec<OverlayFeature>, Box<dyn Error>> {
    if lats.is_empty() || lons.is_empty() {
        return Err("route has no coordinates for an overlay query".into());
    }

    let pad = 0.01;
    let min_lat = lats.iter().cloned().fold(f64::INFINITY, f64::min) - pad;
    let max_lat = lats.iter().cloned().fold(f64::NEG_INFINITY, f64::max) + pad;
    let min_lon = lons.iter().cloned().fold(f64::INFINITY, f64::min) - pad;
    let max_lon = lons.iter().cloned().fold(f64::NEG_INFINITY, f64::max) + pad;

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()?;

    let response: OverpassResponse = client
        .post(OVERPASS_API_URL)
        .form(&[("data", overpass_query(min_lat, min_lon, max_lat, max_lon))])
        .send()?
        .error_for_status()?
        .json()?;

    let mut features = Vec::new();
    for element in &response.elements {
        if element.geometry.len() < 2 {
            continue;
        }
        if let Some((kind, subtype)) = classify_element(element) {
            let name = element
                .tags
                .get("name")
                .or_else(|| element.tags.get("ref"))
                .cloned();
            features.push(OverlayFeature {
                kind,
                name,
                subtype,
                geometry: element.geometry.clone(),
            });
        }
    }

    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_widths() {
        let ditch = OverlayFeature {
            kind: OverlayKind::Waterway,
            name: None,
            subtype: Some("ditch".to_string()),
            geometry: vec![],
        };
        let river = OverlayFeature {
            kind: OverlayKind::Waterway,
            name: Some("Ganges".to_string()),
            subtype: Some("river".to_string()),
            geometry: vec![],
        };
        assert_eq!(ditch.buffer_m(), 5.0);
        assert_eq!(river.buffer_m(), 11.0);
    }

    #[test]
    fn test_label_prefers_name() {
        let river = OverlayFeature {
            kind: OverlayKind::Waterway,
            name: Some("NH-1 Canal".to_string()),
            subtype: Some("canal".to_string()),
            geometry: vec![],
        };
        assert_eq!(river.label(), "NH-1 Canal");
    }

    #[test]
    fn test_overpass_query_contains_selectors() {
        let q = overpass_query(28.0, 77.0, 28.5, 77.5);
        assert!(q.contains("waterway"));
        assert!(q.contains("highway"));
        assert!(q.contains("wetland"));
        assert!(q.contains("28,77"));
    }

    #[test]
    fn test_overlay_roundtrip_json() {
        let features = vec![OverlayFeature {
            kind: OverlayKind::Highway,
            name: Some("NH-44".to_string()),
            subtype: Some("trunk".to_string()),
            geometry: vec![GeoPoint { lat: 28.1, lon: 77.2 }],
        }];
        let json = serde_json::to_string(&features).unwrap();
        let parsed: Vec<OverlayFeature> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, features);
    }
}
