//! Transmission-Line Layout CLI
//!
//! Command-line tool for route-level tower placement and sizing. Takes a
//! route CSV, design parameters as flags, and produces a canonical layout
//! report as text or JSON.

use clap::{Parser, ValueEnum};
use linespan::codes::DesignStandard;
use linespan::csv::{parse_route_csv, parse_terrain_csv};
use linespan::optimizer::{OptimizerConfig, RouteOptimizer};
use linespan::overlay::{fetch_overlays, load_overlays, OverlayFeature};
use linespan::project::{
    GeoContext, ProjectContext, RowMode, SoilCategory, TerrainType, TowerType, WindZone,
};
use linespan::rates::ReferenceStore;
use linespan::result::CanonicalResult;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "linespan")]
#[command(version = "0.1.0")]
#[command(about = "Transmission-line layout and tower sizing", long_about = None)]
struct Cli {
    /// Path to route CSV (columns: lat, lon, elevation, distance_m)
    #[arg(short, long, value_name = "FILE")]
    route: PathBuf,

    /// Optional terrain profile CSV (columns: distance_m, elevation)
    #[arg(short, long, value_name = "FILE")]
    terrain: Option<PathBuf>,

    /// Overlay features JSON produced by overlay_fetch
    #[arg(long, value_name = "FILE")]
    overlays: Option<PathBuf>,

    /// Fetch overlays live from the Overpass API (30 s timeout; degrades to
    /// terrain-only obstacles on failure)
    #[arg(long)]
    fetch_overlays: bool,

    /// Line voltage (kV)
    #[arg(short, long, default_value = "400")]
    voltage: f64,

    /// Terrain classification
    #[arg(long, value_enum, default_value = "flat")]
    terrain_type: TerrainArg,

    /// Wind zone
    #[arg(long, value_enum, default_value = "zone2")]
    wind: WindArg,

    /// Soil category
    #[arg(long, value_enum, default_value = "medium")]
    soil: SoilArg,

    /// Preferred tower type where the classifier allows a choice
    #[arg(long, value_enum, default_value = "suspension")]
    tower: TowerArg,

    /// Right-of-way scenario
    #[arg(long, value_enum, default_value = "rural-private")]
    row_mode: RowArg,

    /// ISO-3166-1 alpha-2 country code for standard and rate resolution
    #[arg(long, value_name = "CODE")]
    country: Option<String>,

    /// Force a governing standard instead of resolving from the country
    #[arg(long, value_enum)]
    standard: Option<StandardArg>,

    /// Design for one wind zone higher
    #[arg(long)]
    higher_wind: bool,

    /// Include the ice accretion load case
    #[arg(long)]
    ice_load: bool,

    /// Stricter footing limits
    #[arg(long)]
    conservative_foundation: bool,

    /// Increased safety factors
    #[arg(long)]
    high_reliability: bool,

    /// Seed for the per-tower sizing swarms (reproducible runs)
    #[arg(long)]
    seed: Option<u64>,

    /// Seed for placement jitter (placement stays deterministic without it)
    #[arg(long)]
    jitter_seed: Option<u64>,

    /// Reference-data directory with ingested market-rate overrides
    #[arg(long, value_name = "DIR")]
    reference_dir: Option<PathBuf>,

    /// Output file path (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum TerrainArg {
    Flat,
    Rolling,
    Mountainous,
    Desert,
}

#[derive(Debug, Clone, ValueEnum)]
enum WindArg {
    Zone1,
    Zone2,
    Zone3,
    Zone4,
}

#[derive(Debug, Clone, ValueEnum)]
enum SoilArg {
    Soft,
    Medium,
    Hard,
    Rock,
}

#[derive(Debug, Clone, ValueEnum)]
enum TowerArg {
    Suspension,
    Angle,
    Tension,
    DeadEnd,
}

#[derive(Debug, Clone, ValueEnum)]
enum RowArg {
    GovernmentCorridor,
    RuralPrivate,
    UrbanPrivate,
    Mixed,
}

#[derive(Debug, Clone, ValueEnum)]
enum StandardArg {
    Is,
    Iec,
    Eurocode,
    Asce,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable text report
    Text,
    /// Canonical JSON
    Json,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading route...");
    let route = parse_route_csv(&cli.route)?;
    println!("  {} route points, {:.1} m", route.points.len(), route.length());

    let (profile, detailed_terrain) = match &cli.terrain {
        Some(path) => {
            let profile = parse_terrain_csv(path)?;
            println!("  Terrain profile: {} samples", profile.points.len());
            (profile, true)
        }
        None => (route.terrain_profile(), false),
    };

    // Overlay features: pre-fetched file, live fetch, or none
    let mut overlay_failure = None;
    let overlays: Vec<OverlayFeature> = if let Some(path) = &cli.overlays {
        let features = load_overlays(path)?;
        println!("  {} overlay features loaded", features.len());
        features
    } else if cli.fetch_overlays {
        let lats: Vec<f64> = route.points.iter().filter_map(|p| p.lat).collect();
        let lons: Vec<f64> = route.points.iter().filter_map(|p| p.lon).collect();
        println!("Fetching obstacle overlays...");
        match fetch_overlays(&lats, &lons) {
            Ok(features) => {
                println!("  {} overlay features found", features.len());
                features
            }
            Err(e) => {
                println!("  Overlay fetch failed: {}. Continuing with terrain only.", e);
                overlay_failure = Some(e.to_string());
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let ctx = build_context(&cli);
    let store = match &cli.reference_dir {
        Some(dir) => ReferenceStore::load(dir),
        None => ReferenceStore::builtin(),
    };

    let config = OptimizerConfig {
        standard: cli.standard.as_ref().map(|s| match s {
            StandardArg::Is => DesignStandard::Is,
            StandardArg::Iec => DesignStandard::Iec,
            StandardArg::Eurocode => DesignStandard::Eurocode,
            StandardArg::Asce => DesignStandard::Asce,
        }),
        seed: cli.seed,
        jitter_seed: cli.jitter_seed,
        max_iterations: None,
        detailed_terrain,
        project_length_km: None,
    };

    println!("\nPlacing and sizing towers...");
    let optimizer = RouteOptimizer::new(&ctx, &store, config);
    let result = optimizer.run(&route, &profile, &overlays, overlay_failure)?;

    let standard_label = [
        DesignStandard::Is,
        DesignStandard::Iec,
        DesignStandard::Eurocode,
        DesignStandard::Asce,
    ]
    .into_iter()
    .find(|s| s.as_str() == result.regional_context.governing_standard)
    .map(|s| s.description())
    .unwrap_or("unknown standard");
    println!(
        "  {} towers, {} spans, governing standard: {}",
        result.towers.len(),
        result.spans.len(),
        standard_label
    );

    match cli.format {
        OutputFormat::Text => {
            let report = format_text_report(&result);
            match &cli.output {
                Some(path) => {
                    std::fs::write(path, &report)?;
                    println!("Report written to {}", path.display());
                }
                None => println!("\n{}", report),
            }
        }
        OutputFormat::Json => {
            let json = result.to_json()?;
            match &cli.output {
                Some(path) => {
                    std::fs::write(path, &json)?;
                    println!("Result written to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

fn build_context(cli: &Cli) -> ProjectContext {
    let mut ctx = ProjectContext::new(cli.voltage);

    ctx.terrain = match cli.terrain_type {
        TerrainArg::Flat => TerrainType::Flat,
        TerrainArg::Rolling => TerrainType::Rolling,
        TerrainArg::Mountainous => TerrainType::Mountainous,
        TerrainArg::Desert => TerrainType::Desert,
    };
    ctx.wind_zone = match cli.wind {
        WindArg::Zone1 => WindZone::Zone1,
        WindArg::Zone2 => WindZone::Zone2,
        WindArg::Zone3 => WindZone::Zone3,
        WindArg::Zone4 => WindZone::Zone4,
    };
    ctx.soil = match cli.soil {
        SoilArg::Soft => SoilCategory::Soft,
        SoilArg::Medium => SoilCategory::Medium,
        SoilArg::Hard => SoilCategory::Hard,
        SoilArg::Rock => SoilCategory::Rock,
    };
    ctx.tower_preference = match cli.tower {
        TowerArg::Suspension => TowerType::Suspension,
        TowerArg::Angle => TowerType::Angle,
        TowerArg::Tension => TowerType::Tension,
        TowerArg::DeadEnd => TowerType::DeadEnd,
    };
    ctx.row_mode = match cli.row_mode {
        RowArg::GovernmentCorridor => RowMode::GovernmentCorridor,
        RowArg::RuralPrivate => RowMode::RuralPrivate,
        RowArg::UrbanPrivate => RowMode::UrbanPrivate,
        RowArg::Mixed => RowMode::Mixed,
    };

    ctx.flags.design_for_higher_wind = cli.higher_wind;
    ctx.flags.include_ice_load = cli.ice_load;
    ctx.flags.conservative_foundation = cli.conservative_foundation;
    ctx.flags.high_reliability = cli.high_reliability;

    if let Some(country) = &cli.country {
        ctx.geo_context = GeoContext {
            country_code: Some(country.to_uppercase()),
            country_name: None,
            state: None,
            resolution_mode: Some("user-specified".to_string()),
        };
    }

    ctx
}

fn format_text_report(result: &CanonicalResult) -> String {
    let mut report = String::new();
    let symbol = &result.cost_breakdown.currency_symbol;

    report.push_str("TOWER SCHEDULE\n");
    report.push_str(&format!("{:-<100}\n", ""));
    report.push_str(&format!(
        "{:<6} {:<12} {:<12} {:<10} {:<10} {:<14} {:<12} {:<10}\n",
        "Tower", "Distance", "Type", "Height", "Base", "Footing", "Cost", "Status"
    ));
    report.push_str(&format!("{:-<100}\n", ""));

    for tower in &result.towers {
        let footing = format!(
            "{:.1}x{:.1}x{:.1}",
            tower.foundation_dimensions.get("length").unwrap_or(&0.0),
            tower.foundation_dimensions.get("width").unwrap_or(&0.0),
            tower.foundation_dimensions.get("depth").unwrap_or(&0.0)
        );
        report.push_str(&format!(
            "{:<6} {:>9.1} m  {:<12} {:>7.1} m {:>7.1} m {:<14} {}{:>10.0} {:<10}\n",
            tower.index,
            tower.distance_along_route,
            tower.tower_type,
            tower.total_height,
            tower.base_width,
            footing,
            symbol,
            tower.total_cost,
            match tower.safety_status {
                linespan::result::TowerSafetyStatus::Safe => "SAFE",
                linespan::result::TowerSafetyStatus::Governing => "GOVERNING",
            }
        ));
        if let Some(nudge) = &tower.nudge_description {
            report.push_str(&format!("       note: {}\n", nudge));
        }
    }

    report.push('\n');
    report.push_str("SPAN SCHEDULE\n");
    report.push_str(&format!("{:-<80}\n", ""));
    report.push_str(&format!(
        "{:<10} {:<12} {:<10} {:<14} {:<10}\n",
        "Span", "Length", "Sag", "Clearance", "Safe"
    ));
    report.push_str(&format!("{:-<80}\n", ""));

    for span in &result.spans {
        report.push_str(&format!(
            "{:<2}->{:<5} {:>9.1} m {:>7.2} m {:>11.2} m {:<10}\n",
            span.from_tower_index,
            span.to_tower_index,
            span.span_length,
            span.sag,
            span.minimum_clearance,
            if span.is_safe { "yes" } else { "NO" }
        ));
    }

    let ls = &result.line_summary;
    report.push('\n');
    report.push_str("LINE SUMMARY\n");
    report.push_str(&format!("{:-<80}\n", ""));
    report.push_str(&format!("  Route length:        {:>12.2} km\n", ls.route_length_km));
    report.push_str(&format!("  Towers:              {:>12}\n", ls.total_towers));
    report.push_str(&format!("  Average span:        {:>12.1} m\n", ls.avg_span));
    report.push_str(&format!("  Tallest tower:       {:>12.1} m\n", ls.tallest_tower));
    report.push_str(&format!("  Steel:               {:>12.1} t\n", ls.total_steel_tonnes));
    report.push_str(&format!("  Concrete:            {:>12.1} m3\n", ls.total_concrete_m3));
    report.push_str(&format!(
        "  Total cost:          {}{:>12.0}\n",
        symbol, ls.total_project_cost
    ));
    report.push_str(&format!(
        "  Cost per km:         {}{:>12.0}  (range {})\n",
        symbol, ls.cost_per_km, result.cost_sensitivity.expected_range
    ));
    report.push_str(&format!(
        "  Overall status:      {:>12}\n",
        result.safety_summary.overall_status
    ));
    report.push_str(&format!(
        "  Confidence:          {:>11}%\n",
        result.regional_context.confidence.score
    ));

    if !result.warnings.is_empty() {
        report.push('\n');
        report.push_str("WARNINGS\n");
        for warning in &result.warnings {
            report.push_str(&format!("  - {}\n", warning));
        }
    }

    if !result.advisories.is_empty() {
        report.push('\n');
        report.push_str("ADVISORIES\n");
        for advisory in &result.advisories {
            report.push_str(&format!("  - {}: {}\n", advisory.risk_name, advisory.reason));
        }
    }

    report
}
