//! OpenStreetMap overlay fetcher
//!
//! Fetches route-corridor obstacle features (waterways, water bodies,
//! wetlands, major roads) from the OSM Overpass API and writes them as an
//! overlay JSON file the main tool can consume offline.
//!
//! ## Usage
//!
//! Using a route CSV:
//! ```bash
//! overlay_fetch --route route.csv --output overlays.json
//! ```
//!
//! Using an explicit bounding box:
//! ```bash
//! overlay_fetch --bbox "28.55,77.15,28.70,77.35" --output overlays.json
//! ```

use clap::Parser;
use linespan::csv::parse_route_csv;
use linespan::overlay::{fetch_overlays, save_overlays};
use std::error::Error;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "overlay_fetch")]
#[command(version = "0.1.0")]
#[command(about = "Fetch OSM obstacle overlays for a route corridor", long_about = None)]
struct Cli {
    /// Route CSV with lat/lon columns; the query covers its bounding box
    #[arg(short, long, value_name = "FILE", conflicts_with = "bbox")]
    route: Option<PathBuf>,

    /// Explicit bounding box "min_lat,min_lon,max_lat,max_lon"
    #[arg(short, long, value_name = "BBOX")]
    bbox: Option<String>,

    /// Output JSON file path
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let (lats, lons) = match (&cli.route, &cli.bbox) {
        (Some(path), _) => {
            let route = parse_route_csv(path)?;
            let lats: Vec<f64> = route.points.iter().filter_map(|p| p.lat).collect();
            let lons: Vec<f64> = route.points.iter().filter_map(|p| p.lon).collect();
            if lats.is_empty() {
                return Err("route CSV has no coordinates".into());
            }
            (lats, lons)
        }
        (None, Some(bbox)) => {
            let parts: Vec<f64> = bbox
                .split(',')
                .map(|s| s.trim().parse::<f64>())
                .collect::<Result<_, _>>()?;
            if parts.len() != 4 {
                return Err("bbox must be min_lat,min_lon,max_lat,max_lon".into());
            }
            (vec![parts[0], parts[2]], vec![parts[1], parts[3]])
        }
        (None, None) => {
            return Err("either --route or --bbox is required".into());
        }
    };

    println!("Querying Overpass API...");
    let features = fetch_overlays(&lats, &lons)?;
    println!("  {} overlay features found", features.len());

    save_overlays(&cli.output, &features)?;
    println!("Overlays written to {}", cli.output.display());

    Ok(())
}
