//! Inbound optimization request
//!
//! The only request shape the core handles. Validation runs before the
//! pipeline is invoked and surfaces structured errors; once a request
//! parses into a [`ProjectContext`] and [`Route`], runtime failures degrade
//! to conservative SAFE results instead of propagating.

use crate::project::{
    DesignFlags, GeoContext, ProjectContext, RowMode, SoilCategory, TerrainType, TowerType,
    WindZone,
};
use crate::route::{route_from_coordinates, Route};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request validation failure
///
/// Raised before the core runs; never from inside the pipeline.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("route must have at least 2 coordinate points, got {0}")]
    TooFewPoints(usize),

    #[error("invalid latitude {0}: must be between -90 and 90")]
    InvalidLatitude(f64),

    #[error("invalid longitude {0}: must be between -180 and 180")]
    InvalidLongitude(f64),

    #[error("voltage must be positive, got {0}")]
    InvalidVoltage(f64),

    #[error("project length must be positive, got {0}")]
    InvalidProjectLength(f64),

    #[error("route points need either coordinates or explicit distances")]
    MissingGeometry,

    #[error("route distances must be strictly increasing at point {0}")]
    NonMonotoneDistances(usize),
}

/// One route point as submitted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,

    /// Ground elevation (m); defaults to 0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,

    /// Cumulative distance from the route start (m)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
}

/// Route optimization request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationRequest {
    /// Route polyline; at least 2 points
    pub route: Vec<RequestPoint>,

    /// Total project length (km); derived from the route when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_length_km: Option<f64>,

    /// Line voltage (kV)
    pub voltage: f64,

    pub terrain: TerrainType,

    pub wind_zone: WindZone,

    pub soil: SoilCategory,

    #[serde(default = "default_tower_preference")]
    pub tower_preference: TowerType,

    #[serde(default)]
    pub flags: DesignFlags,

    #[serde(default)]
    pub row_mode: RowMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_context: Option<GeoContext>,
}

fn default_tower_preference() -> TowerType {
    TowerType::Suspension
}

impl OptimizationRequest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate the request shape
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.route.len() < 2 {
            return Err(ValidationError::TooFewPoints(self.route.len()));
        }

        for point in &self.route {
            if let Some(lat) = point.lat {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(ValidationError::InvalidLatitude(lat));
                }
            }
            if let Some(lon) = point.lon {
                if !(-180.0..=180.0).contains(&lon) {
                    return Err(ValidationError::InvalidLongitude(lon));
                }
            }
        }

        if self.voltage <= 0.0 {
            return Err(ValidationError::InvalidVoltage(self.voltage));
        }

        if let Some(length) = self.project_length_km {
            if length <= 0.0 {
                return Err(ValidationError::InvalidProjectLength(length));
            }
        }

        let has_coords = self
            .route
            .iter()
            .all(|p| p.lat.is_some() && p.lon.is_some());
        let has_distances = self.route.iter().all(|p| p.distance_m.is_some());
        if !has_coords && !has_distances {
            return Err(ValidationError::MissingGeometry);
        }

        if has_distances {
            for (i, pair) in self.route.windows(2).enumerate() {
                if pair[1].distance_m <= pair[0].distance_m {
                    return Err(ValidationError::NonMonotoneDistances(i + 1));
                }
            }
        }

        Ok(())
    }

    /// Validate, then split into the immutable design context and the route
    pub fn into_parts(self) -> Result<(ProjectContext, Route), ValidationError> {
        self.validate()?;

        let coords: Vec<(Option<f64>, Option<f64>, f64, Option<f64>)> = self
            .route
            .iter()
            .map(|p| (p.lat, p.lon, p.elevation.unwrap_or(0.0), p.distance_m))
            .collect();
        let route = route_from_coordinates(&coords);

        let mut ctx = ProjectContext::new(self.voltage);
        ctx.terrain = self.terrain;
        ctx.wind_zone = self.wind_zone;
        ctx.soil = self.soil;
        ctx.tower_preference = self.tower_preference;
        ctx.flags = self.flags;
        ctx.row_mode = self.row_mode;
        ctx.geo_context = self.geo_context.unwrap_or_default();

        Ok((ctx, route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_request() -> OptimizationRequest {
        OptimizationRequest {
            route: vec![
                RequestPoint {
                    lat: Some(28.6),
                    lon: Some(77.2),
                    elevation: Some(210.0),
                    distance_m: None,
                },
                RequestPoint {
                    lat: Some(28.62),
                    lon: Some(77.25),
                    elevation: Some(215.0),
                    distance_m: None,
                },
            ],
            project_length_km: None,
            voltage: 400.0,
            terrain: TerrainType::Flat,
            wind_zone: WindZone::Zone2,
            soil: SoilCategory::Medium,
            tower_preference: TowerType::Suspension,
            flags: DesignFlags::default(),
            row_mode: RowMode::default(),
            geo_context: None,
        }
    }

    #[test]
    fn test_valid_request_parses() {
        let request = minimal_request();
        assert!(request.validate().is_ok());

        let (ctx, route) = request.into_parts().unwrap();
        assert_eq!(ctx.voltage_kv, 400.0);
        assert_eq!(route.points.len(), 2);
        assert!(route.points[1].distance > 0.0);
    }

    #[test]
    fn test_too_few_points() {
        let mut request = minimal_request();
        request.route.truncate(1);
        assert_eq!(request.validate(), Err(ValidationError::TooFewPoints(1)));
    }

    #[test]
    fn test_latitude_range() {
        let mut request = minimal_request();
        request.route[0].lat = Some(91.0);
        assert_eq!(
            request.validate(),
            Err(ValidationError::InvalidLatitude(91.0))
        );
    }

    #[test]
    fn test_longitude_range() {
        let mut request = minimal_request();
        request.route[1].lon = Some(-190.0);
        assert_eq!(
            request.validate(),
            Err(ValidationError::InvalidLongitude(-190.0))
        );
    }

    #[test]
    fn test_synthetic_route_needs_distances() {
        let mut request = minimal_request();
        for p in &mut request.route {
            p.lat = None;
            p.lon = None;
            p.distance_m = None;
        }
        assert_eq!(request.validate(), Err(ValidationError::MissingGeometry));

        request.route[0].distance_m = Some(0.0);
        request.route[1].distance_m = Some(500.0);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_elevation_defaults_to_zero() {
        let mut request = minimal_request();
        request.route[0].elevation = None;
        let (_, route) = request.into_parts().unwrap();
        assert_eq!(route.points[0].elevation, 0.0);
    }

    #[test]
    fn test_request_json_round_trip() {
        let json = r#"{
            "route": [
                {"lat": 28.6, "lon": 77.2, "elevation": 210.0},
                {"lat": 28.7, "lon": 77.3}
            ],
            "voltage": 220,
            "terrain": "rolling",
            "wind_zone": "zone_3",
            "soil": "hard",
            "tower_preference": "suspension",
            "flags": {"include_ice_load": true},
            "row_mode": "government_corridor",
            "geo_context": {"country_code": "IN", "resolution_mode": "map-derived"}
        }"#;

        let request = OptimizationRequest::from_json(json).unwrap();
        assert_eq!(request.voltage, 220.0);
        assert_eq!(request.wind_zone, WindZone::Zone3);
        assert!(request.flags.include_ice_load);
        assert_eq!(request.row_mode, RowMode::GovernmentCorridor);
        assert_eq!(
            request.geo_context.as_ref().unwrap().country_code.as_deref(),
            Some("IN")
        );
    }

    #[test]
    fn test_non_monotone_distances_rejected() {
        let mut request = minimal_request();
        request.route[0].distance_m = Some(100.0);
        request.route[1].distance_m = Some(50.0);
        assert_eq!(
            request.validate(),
            Err(ValidationError::NonMonotoneDistances(1))
        );
    }
}
