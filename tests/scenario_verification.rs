//! End-to-end scenario verification
//!
//! Each test drives the full pipeline (obstacle map -> spotting ->
//! classification -> sizing -> aggregation) on a literal scenario and checks
//! the documented expectations: placement geometry, type assignment,
//! nudging, clearances, cost envelope and the safe-on-the-wire invariant.

use linespan::codes::DesignStandard;
use linespan::conductor::ruling_span;
use linespan::obstacles::ObstacleMap;
use linespan::optimizer::{OptimizerConfig, RouteOptimizer};
use linespan::overlay::{GeoPoint, OverlayFeature, OverlayKind};
use linespan::project::{ProjectContext, SoilCategory, TerrainType, WindZone};
use linespan::rates::ReferenceStore;
use linespan::result::CanonicalResult;
use linespan::route::{route_from_coordinates, Route, TerrainPoint, TerrainProfile};

const DEG_PER_M: f64 = 1.0 / 111_195.0;

/// Straight west-east route along the equator with vertices at the given
/// cumulative distances (m), all at the given elevation
fn straight_route(stations: &[f64], elevation: f64) -> Route {
    let coords: Vec<(Option<f64>, Option<f64>, f64, Option<f64>)> = stations
        .iter()
        .map(|d| (Some(0.0), Some(d * DEG_PER_M), elevation, None))
        .collect();
    route_from_coordinates(&coords)
}

fn run(
    ctx: &ProjectContext,
    route: &Route,
    profile: &TerrainProfile,
    overlays: &[OverlayFeature],
    max_iterations: Option<usize>,
) -> CanonicalResult {
    let store = ReferenceStore::builtin();
    let config = OptimizerConfig {
        seed: Some(42),
        max_iterations,
        ..OptimizerConfig::default()
    };
    RouteOptimizer::new(ctx, &store, config)
        .run(route, profile, overlays, None)
        .expect("pipeline should not fail")
}

/// Flat 1.2 km route at 400 kV: three uniform 400 m spans, suspension
/// interior towers between dead-end terminals, and a line rate inside the
/// feasibility envelope.
#[test]
fn scenario_flat_1200m_400kv() {
    let route = straight_route(&[0.0, 400.0, 800.0, 1200.0], 100.0);
    let profile = route.terrain_profile();

    let mut ctx = ProjectContext::new(400.0);
    ctx.soil = SoilCategory::Medium;
    ctx.wind_zone = WindZone::Zone2;

    let result = run(&ctx, &route, &profile, &[], None);

    assert_eq!(result.safety_summary.overall_status, "SAFE");
    assert_eq!(result.spans.len(), 3, "expected exactly 3 spans");
    for span in &result.spans {
        assert!(
            (span.span_length - 400.0).abs() < 2.0,
            "span {} not ~400 m",
            span.span_length
        );
    }

    assert_eq!(result.towers.first().unwrap().tower_type, "dead_end");
    assert_eq!(result.towers.last().unwrap().tower_type, "dead_end");
    for tower in &result.towers[1..result.towers.len() - 1] {
        assert_eq!(tower.tower_type, "suspension");
    }

    let rate = result.line_summary.cost_per_km;
    assert!(
        (80_000.0..=250_000.0).contains(&rate),
        "cost per km {rate} outside the 80k-250k envelope"
    );
}

/// A waterway crossing the route at 500-520 m: the tower proposed inside
/// the buffered zone must be nudged clear of it and say why; the crossing
/// span still clears the river requirement.
#[test]
fn scenario_river_crossing_nudges_tower() {
    // 1 km route with a vertex at 500 m so a tower lands on the river
    let route = straight_route(&[0.0, 500.0, 1000.0], 100.0);
    let profile = route.terrain_profile();

    // North-south river crossing the route between 500 and 520 m
    let river = OverlayFeature {
        kind: OverlayKind::Waterway,
        name: Some("Test River".to_string()),
        subtype: Some("river".to_string()),
        geometry: vec![
            GeoPoint { lat: -0.01, lon: 510.0 * DEG_PER_M },
            GeoPoint { lat: 0.01, lon: 510.0 * DEG_PER_M },
        ],
    };

    let ctx = ProjectContext::new(220.0);
    let result = run(&ctx, &route, &profile, &[river], None);

    assert_eq!(result.safety_summary.overall_status, "SAFE");

    // The zone spans roughly [475, 545] after buffer and margins; any tower
    // that was proposed inside it must have been shifted out
    let nudged: Vec<_> = result
        .towers
        .iter()
        .filter(|t| t.nudge_description.is_some())
        .collect();
    assert!(!nudged.is_empty(), "no tower was nudged off the river");

    for tower in &nudged {
        assert!(
            tower.distance_along_route <= 475.0 || tower.distance_along_route >= 545.0,
            "tower at {} still inside the forbidden interval",
            tower.distance_along_route
        );
        assert!(tower
            .nudge_description
            .as_ref()
            .unwrap()
            .contains("waterway"));
        assert!(tower.original_distance.is_some());
    }

    // The span that carries the line over the river clears the 6 m floor
    let mut crossing_checked = false;
    for span in &result.spans {
        let from = result.towers[span.from_tower_index].distance_along_route;
        let to = result.towers[span.to_tower_index].distance_along_route;
        if from <= 510.0 && 510.0 <= to {
            crossing_checked = true;
            assert!(
                span.minimum_clearance >= 6.0,
                "river crossing clearance {}",
                span.minimum_clearance
            );
        }
    }
    assert!(crossing_checked, "no span crosses the river");
}

/// 2 km route with a 50 m hill between 800 and 1200 m: no span over the
/// hill may report mid-span ground clearance below 10 m.
#[test]
fn scenario_hill_preserves_clearance() {
    let route = straight_route(&[0.0, 500.0, 1000.0, 1500.0, 2000.0], 100.0);
    let profile = TerrainProfile::new(vec![
        TerrainPoint { distance: 0.0, elevation: 100.0, lat: Some(0.0), lon: Some(0.0) },
        TerrainPoint { distance: 800.0, elevation: 100.0, lat: Some(0.0), lon: Some(800.0 * DEG_PER_M) },
        TerrainPoint { distance: 1000.0, elevation: 150.0, lat: Some(0.0), lon: Some(1000.0 * DEG_PER_M) },
        TerrainPoint { distance: 1200.0, elevation: 100.0, lat: Some(0.0), lon: Some(1200.0 * DEG_PER_M) },
        TerrainPoint { distance: 2000.0, elevation: 100.0, lat: Some(0.0), lon: Some(2000.0 * DEG_PER_M) },
    ]);

    let ctx = ProjectContext::new(400.0);
    let result = run(&ctx, &route, &profile, &[], None);

    assert_eq!(result.safety_summary.overall_status, "SAFE");

    for span in &result.spans {
        let from = result.towers[span.from_tower_index].distance_along_route;
        let to = result.towers[span.to_tower_index].distance_along_route;
        let mid = (from + to) / 2.0;
        if (800.0..=1200.0).contains(&mid) {
            assert!(
                span.minimum_clearance >= 10.0,
                "span {}->{} over the hill has clearance {}",
                span.from_tower_index,
                span.to_tower_index,
                span.minimum_clearance
            );
        }
    }
}

/// Degenerate 25 m route: two stations at the endpoints, one full-length
/// span flagged as end-of-line, no monotonicity violation, still SAFE.
#[test]
fn scenario_degenerate_25m_route() {
    // Synthetic (coordinate-free) route, shorter than the minimum span
    let route = Route::new(vec![]);
    let profile = TerrainProfile::new(vec![
        TerrainPoint { distance: 0.0, elevation: 50.0, lat: None, lon: None },
        TerrainPoint { distance: 25.0, elevation: 50.0, lat: None, lon: None },
    ]);

    let ctx = ProjectContext::new(132.0);
    let store = ReferenceStore::builtin();
    let result = RouteOptimizer::new(
        &ctx,
        &store,
        OptimizerConfig {
            seed: Some(1),
            max_iterations: Some(20),
            ..OptimizerConfig::default()
        },
    )
    .run(&route, &profile, &[], None)
    .unwrap();

    assert_eq!(result.towers.len(), 2);
    assert_eq!(result.towers[0].distance_along_route, 0.0);
    assert_eq!(result.towers[1].distance_along_route, 25.0);
    assert_eq!(result.spans.len(), 1);
    assert!((result.spans[0].span_length - 25.0).abs() < 1e-9);
    assert_eq!(result.safety_summary.overall_status, "SAFE");
}

/// 3 km 400 kV route with a 45 degree bend at 1 km and a 10 degree bend at
/// 2 km: the sharp bend classifies as tension, the slight one as angle, and
/// the first strain section's ruling span follows the documented formula.
#[test]
fn scenario_bends_classify_and_rule() {
    // Leg 1: 1 km east; leg 2: 1 km at 45 degrees; leg 3: 1 km turning
    // another 10 degrees
    let leg = 1000.0 * DEG_PER_M;
    let a45 = 45.0_f64.to_radians();
    let a55 = 55.0_f64.to_radians();

    let p0 = (0.0, 0.0);
    let p1 = (0.0, leg);
    let p2 = (p1.0 + leg * a45.sin(), p1.1 + leg * a45.cos());
    let p3 = (p2.0 + leg * a55.sin(), p2.1 + leg * a55.cos());

    let route = route_from_coordinates(&[
        (Some(p0.0), Some(p0.1), 100.0, None),
        (Some(p1.0), Some(p1.1), 100.0, None),
        (Some(p2.0), Some(p2.1), 100.0, None),
        (Some(p3.0), Some(p3.1), 100.0, None),
    ]);
    let profile = route.terrain_profile();

    let ctx = ProjectContext::new(400.0);
    let result = run(&ctx, &route, &profile, &[], Some(25));

    // Corner stations sit at ~1000 m and ~2000 m cumulative distance
    let corner1 = result
        .towers
        .iter()
        .find(|t| (t.distance_along_route - 1000.0).abs() < 5.0)
        .expect("no tower at the first bend");
    let corner2 = result
        .towers
        .iter()
        .find(|t| (t.distance_along_route - 2000.0).abs() < 5.0)
        .expect("no tower at the second bend");

    assert_eq!(corner1.tower_type, "tension", "45 degree bend");
    assert_eq!(corner2.tower_type, "angle", "10 degree bend");

    // First strain section runs from the line start to the tension tower
    let first = result
        .strain_sections
        .iter()
        .find(|s| s.start_tower_index == 0)
        .expect("no strain section from the line start");
    assert_eq!(result.towers[first.end_tower_index].index, corner1.index);

    let section_spans: Vec<f64> = result
        .spans
        .iter()
        .filter(|s| s.to_tower_index <= corner1.index)
        .map(|s| s.span_length)
        .collect();
    let expected = ruling_span(&section_spans);
    assert!(
        (first.ruling_span - expected).abs() < 0.01 * expected,
        "ruling span {} vs expected {}",
        first.ruling_span,
        expected
    );
}

/// Conservative fallback trigger: a 765 kV mountainous soft-soil zone-4
/// request with the swarm cut to 3 iterations must still report SAFE with a
/// conservative geometry on every tower.
#[test]
fn scenario_conservative_fallback_765kv() {
    let route = straight_route(&[0.0, 1000.0, 2000.0, 3000.0], 1500.0);
    let profile = route.terrain_profile();

    let mut ctx = ProjectContext::new(765.0);
    ctx.terrain = TerrainType::Mountainous;
    ctx.soil = SoilCategory::Soft;
    ctx.wind_zone = WindZone::Zone4;

    let result = run(&ctx, &route, &profile, &[], Some(3));

    assert_eq!(result.safety_summary.overall_status, "SAFE");
    for tower in &result.towers {
        assert!(
            tower.total_height >= 50.0,
            "tower {} height {} below the 765 kV floor",
            tower.index,
            tower.total_height
        );
        let depth = tower.foundation_dimensions.get("depth").copied().unwrap();
        assert!(
            depth >= 4.0,
            "tower {} footing depth {} below 4 m",
            tower.index,
            depth
        );
    }
}

/// Obstacle map built from the scenario overlays merges same-kind zones and
/// carries display names through to the result.
#[test]
fn scenario_obstacles_surface_in_result() {
    let route = straight_route(&[0.0, 500.0, 1000.0], 100.0);
    let profile = route.terrain_profile();

    let river = OverlayFeature {
        kind: OverlayKind::Waterway,
        name: Some("Broad Creek".to_string()),
        subtype: Some("river".to_string()),
        geometry: vec![
            GeoPoint { lat: -0.01, lon: 510.0 * DEG_PER_M },
            GeoPoint { lat: 0.01, lon: 510.0 * DEG_PER_M },
        ],
    };

    let map = ObstacleMap::build(&route, &profile, &[river.clone()]);
    assert_eq!(map.zones.len(), 1);
    assert_eq!(map.zones[0].label(), "Broad Creek");

    let ctx = ProjectContext::new(220.0);
    let result = run(&ctx, &route, &profile, &[river], Some(20));
    assert!(!result.obstacles.is_empty());
}

/// The governing standard resolves from the geographic context.
#[test]
fn scenario_standard_resolution() {
    let route = straight_route(&[0.0, 400.0, 800.0], 100.0);
    let profile = route.terrain_profile();
    let store = ReferenceStore::builtin();

    let mut ctx = ProjectContext::new(220.0);
    ctx.geo_context.country_code = Some("IN".to_string());

    let result = RouteOptimizer::new(
        &ctx,
        &store,
        OptimizerConfig {
            seed: Some(5),
            max_iterations: Some(20),
            ..OptimizerConfig::default()
        },
    )
    .run(&route, &profile, &[], None)
    .unwrap();

    assert_eq!(result.regional_context.governing_standard, "IS");
    assert_eq!(result.currency.code, "INR");

    // Explicit override wins over geography
    let result = RouteOptimizer::new(
        &ctx,
        &store,
        OptimizerConfig {
            standard: Some(DesignStandard::Asce),
            seed: Some(5),
            max_iterations: Some(20),
            ..OptimizerConfig::default()
        },
    )
    .run(&route, &profile, &[], None)
    .unwrap();
    assert_eq!(result.regional_context.governing_standard, "ASCE");
}
