//! CSV input for routes and terrain profiles
//!
//! Parsers for driving the tool from spreadsheets, so a line route surveyed
//! in the field can be analysed without writing JSON by hand.
//!
//! # CSV Formats
//!
//! ## Route CSV
//! Columns: `lat`, `lon`, `elevation`, `distance_m`
//!
//! `lat`/`lon` may be left empty for synthetic terrain as long as
//! `distance_m` is given; `elevation` defaults to 0; `distance_m` is
//! computed from coordinates when omitted.
//!
//! ## Terrain CSV
//! Columns: `distance_m`, `elevation`, optional `lat`, `lon`

use crate::route::{route_from_coordinates, Route, TerrainPoint, TerrainProfile};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::error::Error;
use std::fs::File;
use std::path::Path;

/// CSV record for a route point
#[derive(Debug, Deserialize)]
pub struct RouteCsvRecord {
    /// Latitude (decimal degrees), optional for synthetic routes
    pub lat: Option<f64>,
    /// Longitude (decimal degrees), optional for synthetic routes
    pub lon: Option<f64>,
    /// Ground elevation (m)
    pub elevation: Option<f64>,
    /// Cumulative distance from route start (m)
    pub distance_m: Option<f64>,
}

/// CSV record for a terrain profile sample
#[derive(Debug, Deserialize)]
pub struct TerrainCsvRecord {
    /// Distance from route start (m)
    pub distance_m: f64,
    /// Ground elevation (m)
    pub elevation: f64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Parse a route polyline from CSV
pub fn parse_route_csv<P: AsRef<Path>>(path: P) -> Result<Route, Box<dyn Error>> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut coords = Vec::new();
    for record in reader.deserialize() {
        let record: RouteCsvRecord = record?;
        coords.push((
            record.lat,
            record.lon,
            record.elevation.unwrap_or(0.0),
            record.distance_m,
        ));
    }

    if coords.len() < 2 {
        return Err(format!("route CSV needs at least 2 points, got {}", coords.len()).into());
    }

    Ok(route_from_coordinates(&coords))
}

/// Parse a terrain profile from CSV
pub fn parse_terrain_csv<P: AsRef<Path>>(path: P) -> Result<TerrainProfile, Box<dyn Error>> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut points = Vec::new();
    for record in reader.deserialize() {
        let record: TerrainCsvRecord = record?;
        points.push(TerrainPoint {
            distance: record.distance_m,
            elevation: record.elevation,
            lat: record.lat,
            lon: record.lon,
        });
    }

    if points.is_empty() {
        return Err("terrain CSV is empty".into());
    }

    for pair in points.windows(2) {
        if pair[1].distance <= pair[0].distance {
            return Err(format!(
                "terrain distances must be strictly increasing ({} then {})",
                pair[0].distance, pair[1].distance
            )
            .into());
        }
    }

    Ok(TerrainProfile::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_route_csv_with_coordinates() {
        let path = write_temp(
            "linespan_route_coords.csv",
            "lat,lon,elevation,distance_m\n28.60,77.20,210,\n28.62,77.25,215,\n",
        );

        let route = parse_route_csv(&path).unwrap();
        assert_eq!(route.points.len(), 2);
        assert_eq!(route.points[0].distance, 0.0);
        assert!(route.points[1].distance > 1000.0);
        assert!(route.has_coordinates());
    }

    #[test]
    fn test_parse_route_csv_synthetic() {
        let path = write_temp(
            "linespan_route_synthetic.csv",
            "lat,lon,elevation,distance_m\n,,100,0\n,,120,800\n",
        );

        let route = parse_route_csv(&path).unwrap();
        assert!(!route.has_coordinates());
        assert_eq!(route.points[1].distance, 800.0);
        assert_eq!(route.points[1].elevation, 120.0);
    }

    #[test]
    fn test_parse_route_csv_rejects_single_point() {
        let path = write_temp(
            "linespan_route_single.csv",
            "lat,lon,elevation,distance_m\n28.6,77.2,210,0\n",
        );
        assert!(parse_route_csv(&path).is_err());
    }

    #[test]
    fn test_parse_terrain_csv() {
        let path = write_temp(
            "linespan_terrain.csv",
            "distance_m,elevation,lat,lon\n0,100,,\n500,130,,\n1000,110,,\n",
        );

        let profile = parse_terrain_csv(&path).unwrap();
        assert_eq!(profile.points.len(), 3);
        assert_eq!(profile.elevation_at(250.0), 115.0);
    }

    #[test]
    fn test_parse_terrain_csv_rejects_non_monotone() {
        let path = write_temp(
            "linespan_terrain_bad.csv",
            "distance_m,elevation,lat,lon\n0,100,,\n500,130,,\n400,110,,\n",
        );
        assert!(parse_terrain_csv(&path).is_err());
    }
}
