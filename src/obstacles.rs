//! Forbidden zones and safe-spot finding
//!
//! Builds a per-route map of distance intervals where towers cannot stand:
//!
//! - Overlay features (roads, waterways, water bodies, wetlands) buffered by
//!   a type-dependent width and projected onto the route as `[start, end]`
//!   intervals with a 25 m safety margin on each side
//! - Steep-slope runs where the terrain gradient exceeds 30 %
//!
//! Overlapping zones of the same kind are merged before publishing. The map
//! exposes `safe_spot`, which nudges a proposed tower position out of any
//! forbidden interval by searching alternately forward and backward in 5 m
//! steps.

use crate::overlay::{GeoPoint, OverlayFeature, OverlayKind};
use crate::route::{Route, TerrainProfile};
use serde::{Deserialize, Serialize};

/// Safety margin added on each side of an overlay intersection (m)
pub const INTERSECTION_MARGIN_M: f64 = 25.0;

/// Step used by the safe-spot search (m)
pub const NUDGE_STEP_M: f64 = 5.0;

/// Terrain gradient above which a segment is unbuildable
pub const MAX_SLOPE_RATIO: f64 = 0.30;

/// Kind of forbidden zone
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Waterway,
    Water,
    Wetland,
    Highway,
    SteepSlope,
}

impl ZoneKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ZoneKind::Waterway => "waterway",
            ZoneKind::Water => "water",
            ZoneKind::Wetland => "wetland",
            ZoneKind::Highway => "highway",
            ZoneKind::SteepSlope => "steep_slope",
        }
    }
}

impl From<OverlayKind> for ZoneKind {
    fn from(kind: OverlayKind) -> Self {
        match kind {
            OverlayKind::Waterway => ZoneKind::Waterway,
            OverlayKind::Water => ZoneKind::Water,
            OverlayKind::Wetland => ZoneKind::Wetland,
            OverlayKind::Highway => ZoneKind::Highway,
        }
    }
}

/// Half-open distance interval where towers cannot be placed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForbiddenZone {
    #[serde(rename = "startDistanceM")]
    pub start_distance: f64,

    #[serde(rename = "endDistanceM")]
    pub end_distance: f64,

    pub kind: ZoneKind,

    /// Display name, e.g. "Ganges River" or "NH-44"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Feature polyline for visualisation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<GeoPoint>>,
}

impl ForbiddenZone {
    pub fn new(start_distance: f64, end_distance: f64, kind: ZoneKind) -> Self {
        Self {
            start_distance,
            end_distance,
            kind,
            name: None,
            geometry: None,
        }
    }

    pub fn contains(&self, distance: f64) -> bool {
        self.start_distance <= distance && distance <= self.end_distance
    }

    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.kind.as_str().to_string())
    }
}

/// Forbidden-interval map for one route
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ObstacleMap {
    pub zones: Vec<ForbiddenZone>,

    /// Set when the overlay source was unavailable and the map degraded to
    /// steep-slope detection only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degradation: Option<String>,
}

impl ObstacleMap {
    /// Build the map from overlay features and the terrain profile
    pub fn build(route: &Route, profile: &TerrainProfile, overlays: &[OverlayFeature]) -> Self {
        let mut zones = Vec::new();

        for feature in overlays {
            if let Some(zone) = project_overlay(route, feature) {
                zones.push(zone);
            }
        }

        zones.extend(detect_steep_slopes(profile));

        Self {
            zones: merge_same_kind(zones),
            degradation: None,
        }
    }

    /// Map built without overlay data, recording why
    pub fn degraded(profile: &TerrainProfile, reason: String) -> Self {
        Self {
            zones: merge_same_kind(detect_steep_slopes(profile)),
            degradation: Some(reason),
        }
    }

    /// Zone containing `distance`, if any
    pub fn zone_at(&self, distance: f64) -> Option<&ForbiddenZone> {
        self.zones.iter().find(|z| z.contains(distance))
    }

    fn is_forbidden(&self, distance: f64) -> bool {
        self.zone_at(distance).is_some()
    }

    /// Nearest buildable distance to `target`
    ///
    /// Returns `target` unchanged when it is outside every zone. Otherwise
    /// searches alternately forward and backward in [`NUDGE_STEP_M`] steps up
    /// to `max_shift`; the nearer escape wins. When no buildable point exists
    /// within the shift budget the search fails and the caller records a
    /// violation while keeping the tower at `target`.
    pub fn safe_spot(&self, target: f64, max_shift: f64) -> Result<f64, String> {
        if !self.is_forbidden(target) {
            return Ok(target);
        }

        let blocking = self
            .zone_at(target)
            .map(|z| format!("{} ({})", z.label(), z.kind.as_str()))
            .unwrap_or_else(|| "obstacle".to_string());

        let mut shift = NUDGE_STEP_M;
        while shift <= max_shift {
            let forward = target + shift;
            if !self.is_forbidden(forward) {
                return Ok(forward);
            }

            let backward = target - shift;
            if backward >= 0.0 && !self.is_forbidden(backward) {
                return Ok(backward);
            }

            shift += NUDGE_STEP_M;
        }

        Err(format!(
            "No safe spot found within {:.0} m of {:.1} m (conflicting with {})",
            max_shift, target, blocking
        ))
    }
}

/// Project an overlay feature onto the route as a forbidden interval
///
/// A route vertex is inside the feature's corridor when its distance to any
/// feature segment, measured in a local tangent plane, is below the feature's
/// buffer width. The interval spans the first to the last matching vertex
/// with [`INTERSECTION_MARGIN_M`] added on each side.
fn project_overlay(route: &Route, feature: &OverlayFeature) -> Option<ForbiddenZone> {
    if feature.geometry.len() < 2 || route.points.len() < 2 {
        return None;
    }

    let origin = route.points.iter().find(|p| p.lat.is_some())?;
    let (lat0, lon0) = (origin.lat?, origin.lon?);

    let to_local = |lat: f64, lon: f64| -> (f64, f64) {
        let x = (lon - lon0) * 111_320.0 * lat0.to_radians().cos();
        let y = (lat - lat0) * 111_320.0;
        (x, y)
    };

    let feature_local: Vec<(f64, f64)> = feature
        .geometry
        .iter()
        .map(|p| to_local(p.lat, p.lon))
        .collect();

    let buffer = feature.buffer_m();
    let mut min_dist = f64::INFINITY;
    let mut max_dist = f64::NEG_INFINITY;
    let mut hit = false;

    for point in &route.points {
        let (Some(lat), Some(lon)) = (point.lat, point.lon) else {
            continue;
        };
        let p = to_local(lat, lon);

        let near = feature_local
            .windows(2)
            .any(|seg| point_to_segment(p, seg[0], seg[1]) < buffer);

        if near {
            hit = true;
            min_dist = min_dist.min(point.distance);
            max_dist = max_dist.max(point.distance);
        }
    }

    if !hit {
        return None;
    }

    Some(ForbiddenZone {
        start_distance: (min_dist - INTERSECTION_MARGIN_M).max(0.0),
        end_distance: max_dist + INTERSECTION_MARGIN_M,
        kind: feature.kind.into(),
        name: Some(feature.label()),
        geometry: Some(feature.geometry.clone()),
    })
}

/// Euclidean distance from `p` to the segment `a`-`b` in local metres
fn point_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (px, py) = p;
    let (ax, ay) = a;
    let (bx, by) = b;

    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }

    let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

/// Steep-slope zones: contiguous runs with gradient above [`MAX_SLOPE_RATIO`]
fn detect_steep_slopes(profile: &TerrainProfile) -> Vec<ForbiddenZone> {
    let mut zones = Vec::new();
    let mut run_start: Option<f64> = None;

    for pair in profile.points.windows(2) {
        let (p1, p2) = (&pair[0], &pair[1]);
        let dist = p2.distance - p1.distance;
        if dist <= 0.0 {
            continue;
        }

        let slope = ((p2.elevation - p1.elevation) / dist).abs();
        if slope > MAX_SLOPE_RATIO {
            run_start.get_or_insert(p1.distance);
        } else if let Some(start) = run_start.take() {
            zones.push(steep_zone(start, p1.distance));
        }
    }

    if let Some(start) = run_start {
        zones.push(steep_zone(start, profile.end_distance()));
    }

    zones
}

fn steep_zone(start: f64, end: f64) -> ForbiddenZone {
    ForbiddenZone {
        start_distance: start,
        end_distance: end,
        kind: ZoneKind::SteepSlope,
        name: Some("Steep slope (>30%)".to_string()),
        geometry: None,
    }
}

/// Merge overlapping intervals of the same kind
fn merge_same_kind(mut zones: Vec<ForbiddenZone>) -> Vec<ForbiddenZone> {
    zones.sort_by(|a, b| {
        a.start_distance
            .partial_cmp(&b.start_distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut merged: Vec<ForbiddenZone> = Vec::with_capacity(zones.len());
    for zone in zones {
        match merged
            .last_mut()
            .filter(|last| last.kind == zone.kind && zone.start_distance <= last.end_distance)
        {
            Some(last) => {
                last.end_distance = last.end_distance.max(zone.end_distance);
                if last.name.is_none() {
                    last.name = zone.name;
                }
            }
            None => merged.push(zone),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::TerrainPoint;

    fn map_with(zones: Vec<ForbiddenZone>) -> ObstacleMap {
        ObstacleMap {
            zones,
            degradation: None,
        }
    }

    #[test]
    fn test_safe_spot_outside_zones() {
        let map = map_with(vec![ForbiddenZone::new(100.0, 200.0, ZoneKind::Waterway)]);
        assert_eq!(map.safe_spot(50.0, 100.0).unwrap(), 50.0);
    }

    #[test]
    fn test_safe_spot_nudges_to_nearer_edge() {
        // Zone [475, 545]; target 500 is 25 m from the lower edge, 45 m from
        // the upper edge, so the search escapes backward first.
        let map = map_with(vec![ForbiddenZone::new(475.0, 545.0, ZoneKind::Waterway)]);
        let spot = map.safe_spot(500.0, 100.0).unwrap();
        assert!(spot < 475.0, "expected escape below the zone, got {spot}");
        assert_eq!(spot, 470.0);
    }

    #[test]
    fn test_safe_spot_fails_when_hemmed_in() {
        let map = map_with(vec![ForbiddenZone::new(0.0, 1000.0, ZoneKind::Water)]);
        let err = map.safe_spot(500.0, 100.0).unwrap_err();
        assert!(err.contains("No safe spot"));
    }

    #[test]
    fn test_steep_slope_detection() {
        let profile = TerrainProfile::new(vec![
            TerrainPoint { distance: 0.0, elevation: 100.0, lat: None, lon: None },
            TerrainPoint { distance: 100.0, elevation: 100.0, lat: None, lon: None },
            // 40 m rise over 100 m: 40% slope
            TerrainPoint { distance: 200.0, elevation: 140.0, lat: None, lon: None },
            TerrainPoint { distance: 300.0, elevation: 145.0, lat: None, lon: None },
        ]);

        let zones = detect_steep_slopes(&profile);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].kind, ZoneKind::SteepSlope);
        assert_eq!(zones[0].start_distance, 100.0);
        assert_eq!(zones[0].end_distance, 200.0);
    }

    #[test]
    fn test_steep_slope_run_to_profile_end() {
        let profile = TerrainProfile::new(vec![
            TerrainPoint { distance: 0.0, elevation: 0.0, lat: None, lon: None },
            TerrainPoint { distance: 100.0, elevation: 50.0, lat: None, lon: None },
        ]);
        let zones = detect_steep_slopes(&profile);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].end_distance, 100.0);
    }

    #[test]
    fn test_merge_same_kind_zones() {
        let merged = merge_same_kind(vec![
            ForbiddenZone::new(100.0, 200.0, ZoneKind::Waterway),
            ForbiddenZone::new(150.0, 260.0, ZoneKind::Waterway),
            ForbiddenZone::new(150.0, 260.0, ZoneKind::Highway),
        ]);
        assert_eq!(merged.len(), 2);
        let water = merged.iter().find(|z| z.kind == ZoneKind::Waterway).unwrap();
        assert_eq!(water.start_distance, 100.0);
        assert_eq!(water.end_distance, 260.0);
    }

    #[test]
    fn test_point_to_segment_distance() {
        // Point at (0, 5) above the segment (−10, 0)-(10, 0)
        let d = point_to_segment((0.0, 5.0), (-10.0, 0.0), (10.0, 0.0));
        assert!((d - 5.0).abs() < 1e-9);
        // Beyond the segment end, distance is to the endpoint
        let d = point_to_segment((15.0, 0.0), (-10.0, 0.0), (10.0, 0.0));
        assert!((d - 5.0).abs() < 1e-9);
    }
}
