//! Route geometry and terrain profiles
//!
//! This module holds the geometric primitives the rest of the pipeline is
//! built on:
//!
//! - Great-circle (haversine) distance on a spherical Earth
//! - Linear interpolation of ground elevation along a terrain profile
//! - Walking a route polyline to the coordinates at a given distance
//!
//! All three operations are pure functions of their inputs. Elevation
//! queries outside the profile clamp to the endpoint elevations.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for all great-circle math (m)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Single geocoded point along the route polyline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutePoint {
    /// Latitude in decimal degrees (-90 to 90), absent for synthetic terrain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees (-180 to 180), absent for synthetic terrain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,

    /// Ground elevation (m). Defaults to 0 when the input omits it.
    pub elevation: f64,

    /// Cumulative distance from the route start (m), strictly monotone
    #[serde(rename = "distanceM")]
    pub distance: f64,
}

/// Ordered route polyline
///
/// The first point sits at cumulative distance 0; distances increase
/// strictly. Coordinates are optional as a set: either every point carries
/// lat/lon or the route is treated as synthetic (distance/elevation only).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub points: Vec<RoutePoint>,
}

impl Route {
    pub fn new(points: Vec<RoutePoint>) -> Self {
        Self { points }
    }

    /// Total route length (m); 0 for an empty route
    pub fn length(&self) -> f64 {
        self.points.last().map(|p| p.distance).unwrap_or(0.0)
    }

    /// Whether every point carries coordinates
    pub fn has_coordinates(&self) -> bool {
        !self.points.is_empty()
            && self
                .points
                .iter()
                .all(|p| p.lat.is_some() && p.lon.is_some())
    }

    /// Coordinates at `distance` along the polyline
    ///
    /// Locates the segment containing `distance` and interpolates linearly
    /// between its endpoints. Returns `None` when the route has no
    /// coordinates or the distance falls outside every segment.
    pub fn walk(&self, distance: f64) -> Option<(f64, f64)> {
        for pair in self.points.windows(2) {
            let (p1, p2) = (&pair[0], &pair[1]);
            if p1.distance <= distance && distance <= p2.distance {
                let (lat1, lon1) = (p1.lat?, p1.lon?);
                let (lat2, lon2) = (p2.lat?, p2.lon?);
                let seg = p2.distance - p1.distance;
                if seg <= 0.0 {
                    return Some((lat1, lon1));
                }
                let t = (distance - p1.distance) / seg;
                return Some((lat1 + t * (lat2 - lat1), lon1 + t * (lon2 - lon1)));
            }
        }
        None
    }

    /// Derive a terrain profile from the route points themselves
    pub fn terrain_profile(&self) -> TerrainProfile {
        TerrainProfile {
            points: self
                .points
                .iter()
                .map(|p| TerrainPoint {
                    distance: p.distance,
                    elevation: p.elevation,
                    lat: p.lat,
                    lon: p.lon,
                })
                .collect(),
        }
    }
}

/// Single sample of the ground-height profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerrainPoint {
    /// Distance from route start (m)
    #[serde(rename = "distanceM")]
    pub distance: f64,

    /// Ground elevation (m)
    pub elevation: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

/// Ground-height sampler over an ordered profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerrainProfile {
    pub points: Vec<TerrainPoint>,
}

impl TerrainProfile {
    pub fn new(points: Vec<TerrainPoint>) -> Self {
        Self { points }
    }

    /// End distance of the profile (m)
    pub fn end_distance(&self) -> f64 {
        self.points.last().map(|p| p.distance).unwrap_or(0.0)
    }

    /// Interpolated ground elevation at `distance` (m)
    ///
    /// Linear interpolation inside the bracketing segment; queries beyond
    /// either end clamp to the endpoint elevation. An empty profile samples
    /// as 0.
    pub fn elevation_at(&self, distance: f64) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }

        for pair in self.points.windows(2) {
            let (p1, p2) = (&pair[0], &pair[1]);
            if p1.distance <= distance && distance <= p2.distance {
                let seg = p2.distance - p1.distance;
                if seg <= 0.0 {
                    return p1.elevation;
                }
                let t = (distance - p1.distance) / seg;
                return p1.elevation + t * (p2.elevation - p1.elevation);
            }
        }

        if distance < self.points[0].distance {
            self.points[0].elevation
        } else {
            self.points[self.points.len() - 1].elevation
        }
    }

    /// Coordinates at `distance`, interpolated from profile samples that
    /// carry lat/lon. Returns `None` when the bracketing samples lack
    /// coordinates.
    pub fn coordinates_at(&self, distance: f64) -> Option<(f64, f64)> {
        for pair in self.points.windows(2) {
            let (p1, p2) = (&pair[0], &pair[1]);
            if p1.distance <= distance && distance <= p2.distance {
                let (lat1, lon1) = (p1.lat?, p1.lon?);
                let (lat2, lon2) = (p2.lat?, p2.lon?);
                let seg = p2.distance - p1.distance;
                if seg <= 0.0 {
                    return Some((lat1, lon1));
                }
                let t = (distance - p1.distance) / seg;
                return Some((lat1 + t * (lat2 - lat1), lon1 + t * (lon2 - lon1)));
            }
        }
        None
    }
}

/// Great-circle distance between two points (m)
///
/// Haversine formula on a sphere of radius [`EARTH_RADIUS_M`]. Symmetric in
/// its arguments to machine precision.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Build a route from raw coordinate tuples, computing cumulative haversine
/// distances when the input does not carry them.
pub fn route_from_coordinates(
    coords: &[(Option<f64>, Option<f64>, f64, Option<f64>)],
) -> Route {
    let mut points = Vec::with_capacity(coords.len());
    let mut cumulative = 0.0;

    for (i, &(lat, lon, elevation, distance)) in coords.iter().enumerate() {
        let d = match distance {
            Some(d) => d,
            None => {
                if i > 0 {
                    let prev: &RoutePoint = &points[i - 1];
                    match (prev.lat, prev.lon, lat, lon) {
                        (Some(la1), Some(lo1), Some(la2), Some(lo2)) => {
                            cumulative += haversine(la1, lo1, la2, lo2);
                        }
                        _ => cumulative += 100.0,
                    }
                }
                cumulative
            }
        };
        cumulative = d;
        points.push(RoutePoint {
            lat,
            lon,
            elevation,
            distance: d,
        });
    }

    Route::new(points)
}
