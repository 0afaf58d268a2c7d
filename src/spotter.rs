//! Automatic tower spotting along a route
//!
//! The spotter decides *where* towers stand; the sizer decides *how* each
//! tower is designed. No cost data originates here; candidate spans are
//! priced through the cost model so the spotter can pick the cheapest safe
//! span, but the authoritative per-tower design comes later.
//!
//! Two algorithms coexist:
//!
//! - **Adaptive** (this module): walk the route evaluating the candidate
//!   span set {300, 340, 380, 420, 450} m against the code engine and cost
//!   model, picking the cheapest safe candidate. Falls back to a plain
//!   max-span walk with a mid-span clearance check and 10 m step-back when
//!   no code engine is available.
//! - **Section-based** (`sections` module): corner-anchored placement,
//!   preferred when the route carries coordinates.
//!
//! Invariants upheld and validated before returning: station distances are
//! strictly monotone, every span is at least [`MIN_SPAN_M`] (a route shorter
//! than the floor degenerates to a single full-length span), and the first
//! and last stations sit at the route endpoints.

use crate::codes::CodeEngine;
use crate::conductor::{SagModel, DEFAULT_CLEARANCE_MARGIN_M};
use crate::cost::{self, TowerCost, INFEASIBLE_COST};
use crate::obstacles::ObstacleMap;
use crate::project::{ProjectContext, TowerGeometry, TowerType};
use crate::rates::MarketRates;
use crate::route::{Route, TerrainProfile};
use serde::{Deserialize, Serialize};

/// Absolute physical spacing floor between towers (m)
pub const MIN_SPAN_M: f64 = 30.0;

/// Step-back distance when a mid-span clearance check fails (m)
pub const STEP_BACK_M: f64 = 10.0;

/// Shift budget for the obstacle nudge search (m)
pub const MAX_NUDGE_SHIFT_M: f64 = 100.0;

/// Conservative tower height assumed before sizing (m)
const PROVISIONAL_TOWER_HEIGHT_M: f64 = 40.0;

/// Placement role assigned by the section-based placer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlacementRole {
    /// Exactly on a section corner
    Anchor,
    /// Interpolated between corners
    Suspension,
}

/// One tower position along the route
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TowerStation {
    pub index: usize,

    /// Distance from route start (m)
    #[serde(rename = "distanceM")]
    pub distance: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,

    /// Ground elevation at the station (m)
    pub elevation: f64,

    /// Span used to reach this tower from the previous one (m)
    #[serde(skip_serializing_if = "Option::is_none", rename = "selectedSpan")]
    pub selected_span: Option<f64>,

    /// Why that span was selected
    #[serde(skip_serializing_if = "Option::is_none", rename = "selectionReason")]
    pub selection_reason: Option<String>,

    /// Role tag from the section placer
    #[serde(skip_serializing_if = "Option::is_none", rename = "placementRole")]
    pub placement_role: Option<PlacementRole>,

    /// Structural type from the classifier
    #[serde(skip_serializing_if = "Option::is_none", rename = "towerType")]
    pub tower_type: Option<TowerType>,

    /// Horizontal deviation angle at this station (degrees)
    #[serde(skip_serializing_if = "Option::is_none", rename = "deviationAngle")]
    pub deviation_angle: Option<f64>,

    /// Explanation for the type assignment
    #[serde(skip_serializing_if = "Option::is_none", rename = "designReason")]
    pub design_reason: Option<String>,

    /// Proposed distance before an obstacle nudge (m)
    #[serde(skip_serializing_if = "Option::is_none", rename = "originalDistance")]
    pub original_distance: Option<f64>,

    /// Human-readable nudge explanation
    #[serde(skip_serializing_if = "Option::is_none", rename = "nudgeDescription")]
    pub nudge_description: Option<String>,

    /// Placement constraint violations recorded on this station
    #[serde(default, rename = "safetyViolations")]
    pub safety_violations: Vec<String>,
}

impl TowerStation {
    /// Bare station at a distance and elevation
    pub fn at(index: usize, distance: f64, elevation: f64) -> Self {
        Self {
            index,
            distance,
            lat: None,
            lon: None,
            elevation,
            selected_span: None,
            selection_reason: None,
            placement_role: None,
            tower_type: None,
            deviation_angle: None,
            design_reason: None,
            original_distance: None,
            nudge_description: None,
            safety_violations: Vec::new(),
        }
    }

    fn with_coords(mut self, coords: Option<(f64, f64)>) -> Self {
        if let Some((lat, lon)) = coords {
            self.lat = Some(lat);
            self.lon = Some(lon);
        }
        self
    }
}

/// Spotting configuration
#[derive(Debug, Clone)]
pub struct SpotterConfig {
    /// Maximum allowed span (m)
    pub max_span: f64,
    /// Minimum allowed span (m), floored at [`MIN_SPAN_M`]
    pub min_span: f64,
    /// Minimum mid-span ground clearance (m)
    pub clearance_margin: f64,
    /// Candidate spans for adaptive optimisation (m)
    pub span_candidates: Vec<f64>,
    /// Seed for placement jitter; `None` disables jitter entirely
    pub jitter_seed: Option<u64>,
}

impl SpotterConfig {
    pub fn new(min_span: f64, max_span: f64) -> Self {
        let min_span = min_span.max(MIN_SPAN_M);
        let candidates: Vec<f64> = [300.0, 340.0, 380.0, 420.0, 450.0]
            .into_iter()
            .filter(|s| (min_span..=max_span).contains(s))
            .collect();

        Self {
            max_span,
            min_span,
            clearance_margin: DEFAULT_CLEARANCE_MARGIN_M,
            span_candidates: if candidates.is_empty() {
                vec![max_span]
            } else {
                candidates
            },
            jitter_seed: None,
        }
    }
}

impl Default for SpotterConfig {
    fn default() -> Self {
        Self::new(250.0, 450.0)
    }
}

/// Evaluation of one candidate span
#[derive(Debug, Clone)]
pub struct SpanCandidate {
    pub span_length: f64,
    pub is_safe: bool,
    /// Tower height needed to hold the clearance margin over mid-span (m)
    pub required_height: f64,
    pub required_base_width: f64,
    pub sag: f64,
    pub clearance: f64,
    pub total_cost: f64,
    pub violations: Vec<String>,
    pub breakdown: TowerCost,
}

/// Minimum tower height for span evaluation by voltage (m)
fn evaluation_height_floor(voltage_kv: f64) -> f64 {
    if voltage_kv >= 900.0 {
        55.0
    } else if voltage_kv >= 765.0 {
        50.0
    } else if voltage_kv >= 400.0 {
        40.0
    } else if voltage_kv >= 220.0 {
        30.0
    } else {
        25.0
    }
}

/// Evaluate one candidate span leaving a station
///
/// Computes the sag, the tower height required to hold the clearance margin
/// over the mid-span ground, asks the code engine whether the corresponding
/// conservative geometry is safe, and prices it when it is.
pub fn evaluate_span_candidate(
    config: &SpotterConfig,
    ctx: &ProjectContext,
    engine: &CodeEngine,
    rates: &MarketRates,
    from_distance: f64,
    from_elevation: f64,
    span_length: f64,
    profile: &TerrainProfile,
) -> SpanCandidate {
    let sag_model = SagModel::default();
    let sag = sag_model.sag(span_length);

    let to_distance = from_distance + span_length;
    let mid_elevation = profile.elevation_at((from_distance + to_distance) / 2.0);
    let to_elevation = profile.elevation_at(to_distance);

    // Clearance = avg_tower_top - sag - mid_elevation >= margin, solved for
    // the average tower height over the average ground elevation
    let min_conductor_height = mid_elevation + sag + config.clearance_margin;
    let avg_ground = (from_elevation + to_elevation) / 2.0;
    let required_height =
        (min_conductor_height - avg_ground).max(evaluation_height_floor(ctx.voltage_kv));

    let ratio = TowerType::Suspension.base_width_ratio()
        * ctx.effective_wind_zone().base_width_multiplier();
    let required_base_width = (required_height * ratio).max(8.0);

    let geometry = TowerGeometry::clamped(
        TowerType::Suspension,
        required_height,
        required_base_width,
        span_length,
        5.0,
        5.0,
        3.0,
        ctx,
    );

    let check = engine.check(&geometry, ctx);
    let (per_tower, breakdown) = cost::evaluate(&geometry, ctx, rates, check.safe);

    // Candidates compete on line cost, not tower cost: a short span must pay
    // for the extra towers it implies
    let total_cost = if check.safe {
        cost::cost_per_km(per_tower, &geometry, ctx)
    } else {
        INFEASIBLE_COST
    };

    let avg_tower_top = avg_ground + required_height;
    let clearance = avg_tower_top - sag - mid_elevation;

    SpanCandidate {
        span_length,
        is_safe: check.safe && clearance >= config.clearance_margin,
        required_height,
        required_base_width,
        sag,
        clearance,
        total_cost,
        violations: check.violations,
        breakdown,
    }
}

/// Mid-span clearance check with a provisional tower height
///
/// Used by the fallback walk before any tower has been sized.
fn provisional_clearance(
    config: &SpotterConfig,
    from_distance: f64,
    from_elevation: f64,
    to_distance: f64,
    to_elevation: f64,
    profile: &TerrainProfile,
) -> (bool, f64) {
    let sag_model = SagModel::default();
    let span = to_distance - from_distance;
    let mid_elevation = profile.elevation_at((from_distance + to_distance) / 2.0);

    let clearance = sag_model.midspan_clearance(
        span,
        from_elevation + PROVISIONAL_TOWER_HEIGHT_M,
        to_elevation + PROVISIONAL_TOWER_HEIGHT_M,
        mid_elevation,
    );

    (clearance >= config.clearance_margin, clearance)
}

fn station_at(
    index: usize,
    distance: f64,
    route: &Route,
    profile: &TerrainProfile,
) -> TowerStation {
    let coords = route.walk(distance).or_else(|| profile.coordinates_at(distance));
    TowerStation::at(index, distance, profile.elevation_at(distance)).with_coords(coords)
}

/// Adaptive placement along a route
///
/// With a code engine, each step evaluates the candidate span set and takes
/// the cheapest safe candidate (the shortest is taken and flagged when none
/// is safe). Without one, a plain max-span walk with clearance step-back is
/// used.
pub fn place_towers_adaptive(
    config: &SpotterConfig,
    ctx: &ProjectContext,
    route: &Route,
    profile: &TerrainProfile,
    engine: Option<&CodeEngine>,
    rates: &MarketRates,
) -> Result<Vec<TowerStation>, String> {
    let route_end = profile.end_distance();
    if route_end <= 0.0 {
        return Err("Route has zero length".to_string());
    }

    // Degenerate route: endpoints only, one full-length span
    if route_end <= MIN_SPAN_M {
        let mut last = station_at(1, route_end, route, profile);
        last.selected_span = Some(route_end);
        last.selection_reason = Some(format!(
            "end-of-line: full route span {:.1} m (route shorter than minimum span {:.0} m)",
            route_end, MIN_SPAN_M
        ));
        let stations = vec![station_at(0, 0.0, route, profile), last];
        validate_stations(&stations, route_end)?;
        return Ok(stations);
    }

    let mut stations = vec![station_at(0, 0.0, route, profile)];
    let mut current = 0.0;

    loop {
        let remaining = route_end - current;

        // End-of-line: too little room for two more regular spans
        if remaining < 2.0 * config.min_span {
            place_end_of_line(config, route, profile, &mut stations, current, route_end);
            break;
        }

        let (selected_span, reason) = match engine {
            Some(engine) => select_candidate_span(
                config,
                ctx,
                engine,
                rates,
                current,
                stations.last().map(|s| s.elevation).unwrap_or(0.0),
                remaining,
                profile,
            ),
            None => select_fallback_span(config, &stations, current, remaining, profile),
        };

        let next = current + selected_span;

        // A stub below the minimum span may not be left at the line end
        if route_end - next < config.min_span {
            let span = route_end - current;
            let mut last = station_at(stations.len(), route_end, route, profile);
            last.selected_span = Some(span);
            last.selection_reason = Some(format!("end-of-line: final span {:.1} m", span));
            stations.push(last);
            break;
        }

        let mut station = station_at(stations.len(), next, route, profile);
        station.selected_span = Some(selected_span);
        station.selection_reason = Some(reason);
        stations.push(station);
        current = next;
    }

    validate_stations(&stations, route_end)?;
    Ok(stations)
}

/// End-of-line handling: split the remainder into two equal spans when both
/// stay above the minimum, otherwise run a single span to the endpoint.
fn place_end_of_line(
    config: &SpotterConfig,
    route: &Route,
    profile: &TerrainProfile,
    stations: &mut Vec<TowerStation>,
    current: f64,
    route_end: f64,
) {
    let remaining = route_end - current;
    let half = remaining / 2.0;

    if half >= config.min_span {
        let mid = current + half;
        let mut mid_station = station_at(stations.len(), mid, route, profile);
        mid_station.selected_span = Some(half);
        mid_station.selection_reason = Some(format!(
            "end-of-line: divided {:.1} m into 2 equal spans ({:.1} m each)",
            remaining, half
        ));
        stations.push(mid_station);

        let mut last = station_at(stations.len(), route_end, route, profile);
        last.selected_span = Some(route_end - mid);
        last.selection_reason = Some(format!(
            "end-of-line: divided {:.1} m into 2 equal spans ({:.1} m each)",
            remaining, half
        ));
        stations.push(last);
    } else {
        let mut last = station_at(stations.len(), route_end, route, profile);
        last.selected_span = Some(remaining);
        last.selection_reason = Some(format!(
            "end-of-line: single span {:.1} m (too small to divide)",
            remaining
        ));
        stations.push(last);
    }
}

/// Pick the cheapest safe candidate span that fits in the remaining distance
fn select_candidate_span(
    config: &SpotterConfig,
    ctx: &ProjectContext,
    engine: &CodeEngine,
    rates: &MarketRates,
    current: f64,
    current_elevation: f64,
    remaining: f64,
    profile: &TerrainProfile,
) -> (f64, String) {
    let mut feasible: Vec<f64> = config
        .span_candidates
        .iter()
        .copied()
        .filter(|s| *s <= remaining)
        .collect();
    if feasible.is_empty() {
        feasible.push(remaining.min(config.max_span));
    }

    let candidates: Vec<SpanCandidate> = feasible
        .iter()
        .map(|&span| {
            evaluate_span_candidate(
                config,
                ctx,
                engine,
                rates,
                current,
                current_elevation,
                span,
                profile,
            )
        })
        .collect();

    let mut safe: Vec<&SpanCandidate> = candidates.iter().filter(|c| c.is_safe).collect();

    if !safe.is_empty() {
        safe.sort_by(|a, b| {
            a.total_cost
                .partial_cmp(&b.total_cost)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let selected = safe[0];
        let mut reason = format!("cheapest safe span (${:.0}/km)", selected.total_cost);

        if selected.span_length < config.max_span {
            if let Some(max_candidate) = candidates
                .iter()
                .find(|c| (c.span_length - config.max_span).abs() < f64::EPSILON)
            {
                if max_candidate.is_safe {
                    reason.push_str(&format!(
                        " (max span ${:.0}/km was more expensive)",
                        max_candidate.total_cost
                    ));
                } else {
                    reason.push_str(" (max span was unsafe)");
                }
            }
        }

        (selected.span_length, reason)
    } else {
        let shortest = candidates
            .iter()
            .min_by(|a, b| {
                a.span_length
                    .partial_cmp(&b.span_length)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("candidate set is never empty");
        (
            shortest.span_length,
            format!(
                "no safe candidates, using shortest ({:.0} m)",
                shortest.span_length
            ),
        )
    }
}

/// Max-span walk with clearance step-back (no code engine available)
fn select_fallback_span(
    config: &SpotterConfig,
    stations: &[TowerStation],
    current: f64,
    remaining: f64,
    profile: &TerrainProfile,
) -> (f64, String) {
    let current_elevation = stations.last().map(|s| s.elevation).unwrap_or(0.0);
    let mut span = config.max_span.min(remaining);

    while span > MIN_SPAN_M {
        let to = current + span;
        let (safe, _clearance) = provisional_clearance(
            config,
            current,
            current_elevation,
            to,
            profile.elevation_at(to),
            profile,
        );
        if safe {
            return (span, "max clearing span (no code engine)".to_string());
        }
        span -= STEP_BACK_M;
    }

    (
        MIN_SPAN_M,
        "minimum span forced (clearance unresolved)".to_string(),
    )
}

/// Pass every station through the obstacle map's safe-spot search
///
/// Nudged stations record their original distance and a human-readable
/// description; refreshed coordinates and elevation come from the polyline
/// walker. A failed search leaves the station in place and records the
/// constraint violation. A nudge that would break the strict ordering is
/// reverted and recorded the same way.
pub fn apply_nudges(
    stations: &mut [TowerStation],
    map: &ObstacleMap,
    route: &Route,
    profile: &TerrainProfile,
) {
    for i in 0..stations.len() {
        let original = stations[i].distance;

        match map.safe_spot(original, MAX_NUDGE_SHIFT_M) {
            Ok(spot) if spot != original => {
                let prev_ok = i == 0 || spot - stations[i - 1].distance >= MIN_SPAN_M;
                let next_ok = i + 1 >= stations.len()
                    || stations[i + 1].distance - spot >= MIN_SPAN_M;

                if !(prev_ok && next_ok) {
                    stations[i].safety_violations.push(format!(
                        "Nudge from {:.1} m to {:.1} m would violate minimum tower spacing; \
                         station kept inside {}",
                        original,
                        spot,
                        map.zone_at(original)
                            .map(|z| z.label())
                            .unwrap_or_else(|| "obstacle".to_string())
                    ));
                    continue;
                }

                let shift = spot - original;
                let direction = if shift > 0.0 { "forward" } else { "backward" };
                let label = map
                    .zone_at(original)
                    .map(|z| format!("{} ({})", z.label(), z.kind.as_str()))
                    .unwrap_or_else(|| "obstacle".to_string());

                stations[i].original_distance = Some(original);
                stations[i].distance = spot;
                stations[i].nudge_description = Some(format!(
                    "Shifted {:.1} m {} to avoid {}",
                    shift.abs(),
                    direction,
                    label
                ));

                if let Some(coords) = route.walk(spot).or_else(|| profile.coordinates_at(spot)) {
                    stations[i].lat = Some(coords.0);
                    stations[i].lon = Some(coords.1);
                }
                stations[i].elevation = profile.elevation_at(spot);

                // Spans on both sides changed with the station
                if i > 0 {
                    stations[i].selected_span = Some(spot - stations[i - 1].distance);
                }
                if i + 1 < stations.len() {
                    let next_distance = stations[i + 1].distance;
                    stations[i + 1].selected_span = Some(next_distance - spot);
                }
            }
            Ok(_) => {}
            Err(violation) => {
                stations[i].safety_violations.push(violation);
            }
        }
    }
}

/// Validate the placement invariants
///
/// Strictly monotone distances, spans at or above the floor (a degenerate
/// two-station route spanning its whole length is the one exception), first
/// station at 0 and last within [`MIN_SPAN_M`] of the route end.
pub fn validate_stations(stations: &[TowerStation], route_end: f64) -> Result<(), String> {
    if stations.len() < 2 {
        return Err(format!(
            "Placement produced {} stations; at least 2 required",
            stations.len()
        ));
    }

    let degenerate = stations.len() == 2 && route_end <= MIN_SPAN_M;

    for pair in stations.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if b.distance <= a.distance {
            return Err(format!(
                "Tower sequencing violation: tower {} at {:.2} m must be before tower {} at {:.2} m",
                a.index, a.distance, b.index, b.distance
            ));
        }
        let span = b.distance - a.distance;
        if span < MIN_SPAN_M && !degenerate {
            return Err(format!(
                "Minimum span violation: span from tower {} ({:.2} m) to tower {} ({:.2} m) \
                 is {:.2} m, below the {:.0} m floor",
                a.index, a.distance, b.index, b.distance, span, MIN_SPAN_M
            ));
        }
    }

    if stations[0].distance != 0.0 {
        return Err(format!(
            "First station must sit at the route start, found {:.2} m",
            stations[0].distance
        ));
    }

    let last = stations.last().expect("validated non-empty");
    if (route_end - last.distance).abs() > MIN_SPAN_M {
        return Err(format!(
            "Last station at {:.2} m is more than {:.0} m from the route end ({:.2} m)",
            last.distance, MIN_SPAN_M, route_end
        ));
    }

    Ok(())
}

/// Spans between consecutive stations (m)
pub fn span_lengths(stations: &[TowerStation]) -> Vec<f64> {
    stations
        .windows(2)
        .map(|pair| pair[1].distance - pair[0].distance)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::DesignStandard;
    use crate::obstacles::{ForbiddenZone, ZoneKind};
    use crate::route::TerrainPoint;

    fn flat_profile(length: f64, elevation: f64) -> TerrainProfile {
        TerrainProfile::new(vec![
            TerrainPoint { distance: 0.0, elevation, lat: None, lon: None },
            TerrainPoint { distance: length, elevation, lat: None, lon: None },
        ])
    }

    fn empty_route() -> Route {
        Route::new(vec![])
    }

    #[test]
    fn test_degenerate_route_two_stations() {
        let profile = flat_profile(25.0, 50.0);
        let ctx = ProjectContext::new(132.0);
        let config = SpotterConfig::default();

        let stations = place_towers_adaptive(
            &config,
            &ctx,
            &empty_route(),
            &profile,
            None,
            &MarketRates::global_default(),
        )
        .unwrap();

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].distance, 0.0);
        assert_eq!(stations[1].distance, 25.0);
        assert_eq!(stations[1].selected_span, Some(25.0));
        assert!(stations[1]
            .selection_reason
            .as_ref()
            .unwrap()
            .contains("end-of-line"));
    }

    #[test]
    fn test_flat_route_with_engine_monotone_and_bounded() {
        let profile = flat_profile(2000.0, 100.0);
        let ctx = ProjectContext::new(400.0);
        let config = SpotterConfig::default();
        let engine = CodeEngine::new(DesignStandard::Iec);

        let stations = place_towers_adaptive(
            &config,
            &ctx,
            &empty_route(),
            &profile,
            Some(&engine),
            &MarketRates::global_default(),
        )
        .unwrap();

        assert!(stations.len() >= 2);
        assert_eq!(stations[0].distance, 0.0);
        assert_eq!(stations.last().unwrap().distance, 2000.0);
        for span in span_lengths(&stations) {
            assert!(span >= MIN_SPAN_M);
        }
    }

    #[test]
    fn test_fallback_walk_without_engine() {
        let profile = flat_profile(1350.0, 0.0);
        let ctx = ProjectContext::new(220.0);
        let config = SpotterConfig::default();

        let stations = place_towers_adaptive(
            &config,
            &ctx,
            &empty_route(),
            &profile,
            None,
            &MarketRates::global_default(),
        )
        .unwrap();

        assert_eq!(stations[0].distance, 0.0);
        assert_eq!(stations.last().unwrap().distance, 1350.0);
        validate_stations(&stations, 1350.0).unwrap();
    }

    #[test]
    fn test_candidate_evaluation_prefers_cheapest_safe() {
        let profile = flat_profile(3000.0, 100.0);
        let ctx = ProjectContext::new(400.0);
        let config = SpotterConfig::default();
        let engine = CodeEngine::new(DesignStandard::Iec);
        let rates = MarketRates::global_default();

        let (span, reason) =
            select_candidate_span(&config, &ctx, &engine, &rates, 0.0, 100.0, 3000.0, &profile);

        assert!(config.span_candidates.contains(&span));
        assert!(reason.contains("cheapest safe") || reason.contains("no safe candidates"));
    }

    #[test]
    fn test_span_candidate_sentinel_for_unsafe() {
        let profile = flat_profile(3000.0, 100.0);
        // 132 kV: candidate 450 exceeds the 1.1 x 250 m suspension window
        let ctx = ProjectContext::new(132.0);
        let config = SpotterConfig::default();
        let engine = CodeEngine::new(DesignStandard::Iec);

        let candidate = evaluate_span_candidate(
            &config,
            &ctx,
            &engine,
            &MarketRates::global_default(),
            0.0,
            100.0,
            450.0,
            &profile,
        );

        assert!(!candidate.is_safe);
        assert_eq!(candidate.total_cost, INFEASIBLE_COST);
        assert!(!candidate.violations.is_empty());
    }

    #[test]
    fn test_nudge_off_forbidden_zone() {
        let profile = flat_profile(1000.0, 0.0);
        let map = ObstacleMap {
            zones: vec![ForbiddenZone::new(475.0, 545.0, ZoneKind::Waterway)],
            degradation: None,
        };

        let mut stations = vec![
            TowerStation::at(0, 0.0, 0.0),
            TowerStation::at(1, 500.0, 0.0),
            TowerStation::at(2, 1000.0, 0.0),
        ];

        apply_nudges(&mut stations, &map, &empty_route(), &profile);

        let nudged = &stations[1];
        assert!(nudged.distance <= 475.0 || nudged.distance >= 545.0);
        assert_eq!(nudged.original_distance, Some(500.0));
        assert!(nudged
            .nudge_description
            .as_ref()
            .unwrap()
            .contains("waterway"));
    }

    #[test]
    fn test_nudge_failure_records_violation() {
        let profile = flat_profile(1000.0, 0.0);
        let map = ObstacleMap {
            zones: vec![ForbiddenZone::new(0.0, 1000.0, ZoneKind::Water)],
            degradation: None,
        };

        let mut stations = vec![TowerStation::at(0, 500.0, 0.0)];
        apply_nudges(&mut stations, &map, &empty_route(), &profile);

        assert_eq!(stations[0].distance, 500.0);
        assert_eq!(stations[0].safety_violations.len(), 1);
        assert!(stations[0].safety_violations[0].contains("No safe spot"));
    }

    #[test]
    fn test_validation_rejects_short_span() {
        let stations = vec![
            TowerStation::at(0, 0.0, 0.0),
            TowerStation::at(1, 10.0, 0.0),
            TowerStation::at(2, 500.0, 0.0),
        ];
        assert!(validate_stations(&stations, 500.0).is_err());
    }

    #[test]
    fn test_validation_rejects_non_monotone() {
        let stations = vec![
            TowerStation::at(0, 0.0, 0.0),
            TowerStation::at(1, 400.0, 0.0),
            TowerStation::at(2, 350.0, 0.0),
        ];
        assert!(validate_stations(&stations, 400.0).is_err());
    }

    #[test]
    fn test_no_stub_span_at_line_end() {
        // 960 m route: a 450 m candidate would leave 510, then 60 stub after
        // another 450; the walk must end exactly at the route end without a
        // sub-minimum span
        let profile = flat_profile(960.0, 0.0);
        let ctx = ProjectContext::new(400.0);
        let config = SpotterConfig::default();
        let engine = CodeEngine::new(DesignStandard::Iec);

        let stations = place_towers_adaptive(
            &config,
            &ctx,
            &empty_route(),
            &profile,
            Some(&engine),
            &MarketRates::global_default(),
        )
        .unwrap();

        validate_stations(&stations, 960.0).unwrap();
        assert_eq!(stations.last().unwrap().distance, 960.0);
    }
}
