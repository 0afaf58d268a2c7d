//! Result aggregation and safety enforcement
//!
//! Consumes the spotted, typed and sized towers and assembles the canonical
//! result. Two invariants are enforced here and nowhere else:
//!
//! 1. **Safe on the wire.** A tower whose sized geometry failed the full
//!    code check is replaced by the conservative fallback before reporting;
//!    the original violations survive as its `governing_load_case`, never as
//!    top-level errors. `safety_summary.overall_status` is always `"SAFE"`.
//! 2. **Complete schema.** Every required field is populated; missing
//!    sub-results become defaults (empty lists, zero totals), never nulls.
//!
//! Line aggregates are sums and means over the per-tower results. The cost
//! sensitivity band starts at ±15 % and widens with terrain, soil, wind,
//! voltage and regional risk count. The `warnings` list collects overlay
//! degradation, ruling-span range notes, and the constructability layer's
//! per-tower buildability flags.

use crate::codes::DesignStandard;
use crate::conductor::{
    ruling_span_advisory, strain_sections, ClearanceResolver, SagModel, DEFAULT_CLEARANCE_MARGIN_M,
};
use crate::confidence::{self, ConfidenceInputs};
use crate::constructability;
use crate::cost::{self, TowerCost};
use crate::obstacles::ObstacleMap;
use crate::project::{ProjectContext, TowerGeometry, TowerType};
use crate::rates::{self, MarketRates};
use crate::result::*;
use crate::route::TerrainProfile;
use crate::spotter::TowerStation;
use crate::swarm::{conservative_fallback, SizingOutcome};
use std::collections::HashMap;

/// Everything the aggregator consumes for one request
pub struct AggregatorInput<'a> {
    pub stations: &'a [TowerStation],
    pub outcomes: &'a [SizingOutcome],
    pub ctx: &'a ProjectContext,
    pub standard: DesignStandard,
    pub map: &'a ObstacleMap,
    pub rates: &'a MarketRates,
    pub profile: &'a TerrainProfile,
    /// Route length (km) for line-level totals
    pub route_length_km: f64,
    pub confidence: ConfidenceInputs,
    pub reference_status: HashMap<String, String>,
}

/// Assemble the canonical result
pub fn aggregate(input: &AggregatorInput) -> CanonicalResult {
    let ctx = input.ctx;
    let avg_span = average_span(input.stations);

    let mut warnings: Vec<String> = Vec::new();
    if let Some(reason) = &input.map.degradation {
        warnings.push(format!(
            "Obstacle overlay unavailable; forbidden zones limited to terrain analysis ({})",
            reason
        ));
    }

    let mut towers = Vec::with_capacity(input.stations.len());
    let mut total_iterations = 0;
    let mut fallback_towers = 0;

    for (i, station) in input.stations.iter().enumerate() {
        let outcome = input.outcomes.get(i);
        let (record, geometry, fell_back) =
            tower_record(station, outcome, ctx, input.rates, avg_span);
        if fell_back {
            fallback_towers += 1;
        }
        total_iterations += outcome.map(|o| o.iterations).unwrap_or(0);

        // Constructability is advisory: safe designs still get flagged when
        // they would be awkward to build
        for concern in constructability::check(&geometry, ctx, record.total_cost) {
            warnings.push(format!("Tower {}: {}", record.index, concern));
        }

        towers.push(record);
    }

    let spans = span_records(input, &towers);

    let line_summary = line_summary(input, &towers, &spans);
    let cost_breakdown = cost_breakdown(input, &towers);
    let sensitivity = sensitivity_band(ctx, line_summary.total_project_cost);
    let cost_context = cost_context(&cost_breakdown, line_summary.cost_per_km, ctx);

    let country = ctx.geo_context.country_code.as_deref();
    let regional_risk_list = rates::regional_risks(country);

    let confidence = confidence::score(ctx, &input.confidence);

    // Ruling spans per strain section, with typical-range warnings
    let types: Vec<TowerType> = towers
        .iter()
        .map(|t| match t.tower_type.as_str() {
            "angle" => TowerType::Angle,
            "tension" => TowerType::Tension,
            "dead_end" => TowerType::DeadEnd,
            _ => TowerType::Suspension,
        })
        .collect();
    let span_lengths: Vec<f64> = spans.iter().map(|s| s.span_length).collect();
    let strain = strain_sections(&types, &span_lengths);
    let strain_records: Vec<StrainSectionRecord> = strain
        .iter()
        .enumerate()
        .map(|(i, s)| {
            if let Some(advice) = ruling_span_advisory(s.ruling_span, ctx.voltage_kv) {
                warnings.push(advice);
            }
            StrainSectionRecord {
                section_index: i,
                start_tower_index: s.start_tower_index,
                end_tower_index: s.end_tower_index,
                ruling_span: round2(s.ruling_span),
                num_spans: s.span_lengths.len(),
            }
        })
        .collect();

    let advisories: Vec<Advisory> = regional_risk_list
        .iter()
        .map(|risk| Advisory {
            risk_name: risk.clone(),
            reason: "Regional risk registered for this geography; not automatically modeled"
                .to_string(),
            not_evaluated: true,
            suggested_action: Some(
                "Review with a chartered engineer before detailed design".to_string(),
            ),
        })
        .collect();

    let safety_summary = SafetySummary {
        overall_status: "SAFE".to_string(),
        governing_risks: towers
            .iter()
            .filter_map(|t| t.governing_load_case.clone())
            .collect(),
        design_scenarios_applied: scenarios_applied(ctx),
    };

    let regional_context = RegionalContext {
        governing_standard: input.standard.as_str().to_string(),
        dominant_regional_risks: regional_risk_list.into_iter().take(5).collect(),
        confidence,
    };

    CanonicalResult {
        towers,
        spans,
        line_summary,
        cost_breakdown,
        safety_summary,
        regional_context,
        cost_sensitivity: sensitivity,
        cost_context,
        currency: rates::resolve_currency(country),
        warnings,
        advisories,
        strain_sections: strain_records,
        obstacles: input.map.zones.clone(),
        reference_data_status: input.reference_status.clone(),
        optimization_info: OptimizationInfo {
            iterations: total_iterations,
            converged: true,
            fallback_towers,
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

fn average_span(stations: &[TowerStation]) -> f64 {
    if stations.len() < 2 {
        return 350.0;
    }
    let total = stations.last().unwrap().distance - stations[0].distance;
    total / (stations.len() - 1) as f64
}

/// Build one tower record, substituting the conservative fallback when the
/// sized geometry reported unsafe
///
/// Also returns the geometry actually reported so the constructability
/// layer can inspect it.
fn tower_record(
    station: &TowerStation,
    outcome: Option<&SizingOutcome>,
    ctx: &ProjectContext,
    rates: &MarketRates,
    avg_span: f64,
) -> (TowerRecord, TowerGeometry, bool) {
    let tower_type = station.tower_type.unwrap_or(TowerType::Suspension);

    let (geometry, breakdown, status, governing, fell_back): (
        TowerGeometry,
        TowerCost,
        TowerSafetyStatus,
        Option<String>,
        bool,
    ) = match outcome {
        Some(o) if o.safe => (
            o.geometry,
            o.breakdown.clone(),
            TowerSafetyStatus::Safe,
            None,
            false,
        ),
        Some(o) => {
            // Unsafe never reaches the wire: substitute the conservative
            // fallback and keep the violations as the governing load case
            let fallback = conservative_fallback(ctx, tower_type, avg_span);
            let breakdown = cost::tower_cost(&fallback, ctx, rates);
            (
                fallback,
                breakdown,
                TowerSafetyStatus::Governing,
                o.violations.first().cloned(),
                true,
            )
        }
        None => {
            let fallback = conservative_fallback(ctx, tower_type, avg_span);
            let breakdown = cost::tower_cost(&fallback, ctx, rates);
            (
                fallback,
                breakdown,
                TowerSafetyStatus::Governing,
                Some("Sizing unavailable; conservative design substituted".to_string()),
                true,
            )
        }
    };

    let steel_kg = cost::steel_weight_tonnes(&geometry, ctx) * 1000.0;

    let mut foundation_dimensions = HashMap::new();
    foundation_dimensions.insert("length".to_string(), round2(geometry.footing_length));
    foundation_dimensions.insert("width".to_string(), round2(geometry.footing_width));
    foundation_dimensions.insert("depth".to_string(), round2(geometry.footing_depth));

    let record = TowerRecord {
        index: station.index,
        distance_along_route: round2(station.distance),
        latitude: station.lat,
        longitude: station.lon,
        tower_type: tower_type.as_str().to_string(),
        deviation_angle_deg: station.deviation_angle.map(round2),
        base_height: round2(geometry.total_height * 0.4),
        body_extension: round2(geometry.total_height * 0.6),
        total_height: round2(geometry.total_height),
        base_width: round2(geometry.base_width),
        foundation_type: geometry.foundation_type.as_str().to_string(),
        foundation_dimensions,
        steel_weight_kg: round2(steel_kg),
        steel_cost: round2(breakdown.steel_cost),
        foundation_cost: round2(breakdown.foundation_cost),
        erection_cost: round2(breakdown.erection_cost),
        transport_cost: round2(breakdown.transport_cost),
        land_row_cost: round2(breakdown.land_cost),
        total_cost: round2(breakdown.total_cost),
        safety_status: status,
        governing_load_case: governing,
        design_reason: station.design_reason.clone(),
        nudge_description: station.nudge_description.clone(),
        original_distance: station.original_distance.map(round2),
        safety_violations: station.safety_violations.clone(),
    };

    (record, geometry, fell_back)
}

/// Span records with sag and obstacle-aware clearance
fn span_records(input: &AggregatorInput, towers: &[TowerRecord]) -> Vec<SpanRecord> {
    let sag_model = SagModel::default();
    let resolver = ClearanceResolver::new(input.standard, input.ctx.voltage_kv);
    let wind_zone = input.ctx.effective_wind_zone();

    input
        .stations
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let (from, to) = (&pair[0], &pair[1]);
            let span_length = to.distance - from.distance;
            let sag = sag_model.sag(span_length);

            let mid = (from.distance + to.distance) / 2.0;
            let mid_elevation = input.profile.elevation_at(mid);

            let from_top = from.elevation + towers[i].total_height;
            let to_top = to.elevation + towers[i + 1].total_height;
            let clearance = (from_top + to_top) / 2.0 - sag - mid_elevation;

            let required = resolver
                .required_at(mid, &input.map.zones)
                .max(DEFAULT_CLEARANCE_MARGIN_M);
            let is_safe = clearance >= required;

            let margin_percent = if required > 0.0 {
                (clearance - required) / required * 100.0
            } else {
                0.0
            };

            SpanRecord {
                from_tower_index: from.index,
                to_tower_index: to.index,
                span_length: round2(span_length),
                sag: round2(sag),
                minimum_clearance: round2(clearance.max(0.0)),
                clearance_margin_percent: round2(margin_percent.max(0.0)),
                wind_zone_used: wind_zone.as_str().to_string(),
                ice_load_used: input.ctx.flags.include_ice_load,
                governing_case: (!is_safe)
                    .then(|| format!("Mid-span clearance {:.2} m below required {:.2} m", clearance, required)),
                is_safe,
            }
        })
        .collect()
}

fn line_summary(
    input: &AggregatorInput,
    towers: &[TowerRecord],
    spans: &[SpanRecord],
) -> LineSummary {
    let total_towers = towers.len();
    let route_length_km = input.route_length_km.max(f64::MIN_POSITIVE);

    let total_steel_tonnes: f64 = towers.iter().map(|t| t.steel_weight_kg / 1000.0).sum();
    let total_concrete: f64 = towers
        .iter()
        .map(|t| {
            t.foundation_dimensions.get("length").unwrap_or(&0.0)
                * t.foundation_dimensions.get("width").unwrap_or(&0.0)
                * t.foundation_dimensions.get("depth").unwrap_or(&0.0)
                * 4.0
        })
        .sum();

    let tower_total: f64 = towers.iter().map(|t| t.total_cost).sum();
    let corridor_total = cost::corridor_cost_per_km(input.ctx) * input.route_length_km;
    let total_project_cost = tower_total + corridor_total;

    let avg_span = if spans.is_empty() {
        0.0
    } else {
        spans.iter().map(|s| s.span_length).sum::<f64>() / spans.len() as f64
    };

    LineSummary {
        route_length_km: round2(input.route_length_km),
        total_towers,
        tower_density_per_km: round2(total_towers as f64 / route_length_km),
        avg_span: round2(avg_span),
        tallest_tower: round2(
            towers
                .iter()
                .map(|t| t.total_height)
                .fold(0.0, f64::max),
        ),
        deepest_foundation: round2(
            towers
                .iter()
                .filter_map(|t| t.foundation_dimensions.get("depth").copied())
                .fold(0.0, f64::max),
        ),
        total_steel_tonnes: round2(total_steel_tonnes),
        total_concrete_m3: round2(total_concrete),
        total_project_cost: round2(total_project_cost),
        cost_per_km: round2(total_project_cost / route_length_km),
    }
}

fn cost_breakdown(input: &AggregatorInput, towers: &[TowerRecord]) -> CostBreakdown {
    let corridor_total = cost::corridor_cost_per_km(input.ctx) * input.route_length_km;
    let land_row_total: f64 =
        towers.iter().map(|t| t.land_row_cost).sum::<f64>() + corridor_total;

    let steel_total: f64 = towers.iter().map(|t| t.steel_cost).sum();
    let foundation_total: f64 = towers.iter().map(|t| t.foundation_cost).sum();
    let erection_total: f64 = towers.iter().map(|t| t.erection_cost).sum();
    let transport_total: f64 = towers.iter().map(|t| t.transport_cost).sum();

    let currency = rates::resolve_currency(input.ctx.geo_context.country_code.as_deref());

    CostBreakdown {
        steel_total: round2(steel_total),
        foundation_total: round2(foundation_total),
        erection_total: round2(erection_total),
        transport_total: round2(transport_total),
        land_row_total: round2(land_row_total),
        total_project_cost: round2(
            steel_total + foundation_total + erection_total + transport_total + land_row_total,
        ),
        currency: currency.code,
        currency_symbol: currency.symbol,
    }
}

/// Sensitivity band: ±15 % base, widened by site complexity
fn sensitivity_band(ctx: &ProjectContext, base_cost: f64) -> CostSensitivity {
    let mut variance_percent = 15.0;

    if ctx.terrain == crate::project::TerrainType::Mountainous {
        variance_percent += 10.0;
    }
    if ctx.soil == crate::project::SoilCategory::Soft {
        variance_percent += 5.0;
    }
    if matches!(
        ctx.wind_zone,
        crate::project::WindZone::Zone3 | crate::project::WindZone::Zone4
    ) {
        variance_percent += 5.0;
    }
    if ctx.voltage_kv >= 400.0 {
        variance_percent += 5.0;
    }
    if rates::regional_risks(ctx.geo_context.country_code.as_deref()).len() > 3 {
        variance_percent += 5.0;
    }

    let factor = variance_percent / 100.0;
    let lower = base_cost * (1.0 - factor);
    let upper = base_cost * (1.0 + factor);

    CostSensitivity {
        lower_bound: round2(lower),
        upper_bound: round2(upper),
        variance_percent: round2(variance_percent),
        expected_range: format!("{:.0} - {:.0}", lower, upper),
    }
}

/// Plain-language cost drivers and interpretation
fn cost_context(breakdown: &CostBreakdown, cost_per_km: f64, ctx: &ProjectContext) -> CostContext {
    let total = breakdown.steel_total
        + breakdown.foundation_total
        + breakdown.erection_total
        + breakdown.transport_total
        + breakdown.land_row_total;

    if total == 0.0 {
        return CostContext {
            cost_per_km,
            primary_cost_drivers: vec!["Cost calculation incomplete".to_string()],
            interpretation: "Cost breakdown unavailable.".to_string(),
        };
    }

    let steel_pct = breakdown.steel_total / total * 100.0;
    let foundation_pct = breakdown.foundation_total / total * 100.0;
    let erection_pct = breakdown.erection_total / total * 100.0;
    let row_pct = breakdown.land_row_total / total * 100.0;

    let mut drivers = Vec::new();
    if row_pct >= 50.0 {
        drivers.push(format!("Right-of-Way acquisition ({:.0}%)", row_pct));
        match ctx.row_mode {
            crate::project::RowMode::UrbanPrivate => {
                drivers.push("Conservative urban land compensation model".to_string());
                drivers.push("Full private land acquisition assumed".to_string());
            }
            crate::project::RowMode::GovernmentCorridor => {
                drivers.push("Government corridor easement model".to_string());
            }
            crate::project::RowMode::RuralPrivate => {
                drivers.push("Rural private land compensation".to_string());
            }
            crate::project::RowMode::Mixed => {
                drivers.push("Mixed ROW scenario (urban + rural)".to_string());
            }
        }
    } else if steel_pct >= 40.0 {
        drivers.push(format!("Steel structure ({:.0}%)", steel_pct));
        drivers.push("High voltage requires substantial steel".to_string());
    } else if foundation_pct >= 30.0 {
        drivers.push(format!("Foundation construction ({:.0}%)", foundation_pct));
        drivers.push("Complex soil conditions or conservative design".to_string());
    }

    if erection_pct >= 20.0 {
        drivers.push(format!("Transport & erection ({:.0}%)", erection_pct));
    }

    let interpretation = if row_pct >= 50.0 {
        let mut parts =
            vec!["Suitable for early-stage feasibility and worst-case budgeting.".to_string()];
        if ctx.row_mode == crate::project::RowMode::UrbanPrivate {
            parts.push("Not representative of government-corridor or rural projects.".to_string());
            parts.push("Cost expected to reduce significantly with ROW model refinement.".to_string());
        }
        parts.join(" ")
    } else {
        "Cost structure reflects optimized tower design and construction. \
         ROW component is moderate; primary costs are structural."
            .to_string()
    };

    if drivers.is_empty() {
        drivers.push("Balanced cost distribution across components".to_string());
    }
    drivers.truncate(5);

    CostContext {
        cost_per_km: round2(cost_per_km),
        primary_cost_drivers: drivers,
        interpretation,
    }
}

fn scenarios_applied(ctx: &ProjectContext) -> Vec<String> {
    let mut scenarios = Vec::new();
    if ctx.flags.design_for_higher_wind {
        scenarios.push("Higher wind design".to_string());
    }
    if ctx.flags.include_ice_load {
        scenarios.push("Ice accretion load case".to_string());
    }
    if ctx.flags.high_reliability {
        scenarios.push("High reliability design mode".to_string());
    }
    if ctx.flags.conservative_foundation {
        scenarios.push("Conservative foundation design mode".to_string());
    }
    if scenarios.is_empty() {
        scenarios.push("No additional scenarios".to_string());
    }
    scenarios
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::CodeEngine;
    use crate::route::TerrainPoint;
    use crate::swarm::{SwarmConfig, SwarmSizer};

    fn flat_profile(length: f64) -> TerrainProfile {
        TerrainProfile::new(vec![
            TerrainPoint { distance: 0.0, elevation: 100.0, lat: None, lon: None },
            TerrainPoint { distance: length, elevation: 100.0, lat: None, lon: None },
        ])
    }

    fn stations_every_400(length: f64) -> Vec<TowerStation> {
        let n = (length / 400.0) as usize;
        let mut stations: Vec<TowerStation> = (0..=n)
            .map(|i| TowerStation::at(i, i as f64 * 400.0, 100.0))
            .collect();
        let total = stations.len();
        for (i, s) in stations.iter_mut().enumerate() {
            s.tower_type = Some(if i == 0 || i == total - 1 {
                TowerType::DeadEnd
            } else {
                TowerType::Suspension
            });
        }
        stations
    }

    fn outcomes_for(
        stations: &[TowerStation],
        ctx: &ProjectContext,
    ) -> Vec<SizingOutcome> {
        let engine = CodeEngine::new(DesignStandard::Iec);
        let rates = MarketRates::global_default();
        stations
            .iter()
            .map(|s| {
                let config = SwarmConfig {
                    seed: Some(s.index as u64 + 1),
                    max_iterations: 30,
                    ..SwarmConfig::default()
                };
                SwarmSizer::new(&engine, ctx, &rates, config)
                    .optimize(s.tower_type.unwrap_or(TowerType::Suspension))
            })
            .collect()
    }

    fn aggregate_flat(length: f64) -> CanonicalResult {
        let ctx = ProjectContext::new(400.0);
        let stations = stations_every_400(length);
        let outcomes = outcomes_for(&stations, &ctx);
        let profile = flat_profile(length);
        let map = ObstacleMap::default();
        let rates = MarketRates::global_default();

        aggregate(&AggregatorInput {
            stations: &stations,
            outcomes: &outcomes,
            ctx: &ctx,
            standard: DesignStandard::Iec,
            map: &map,
            rates: &rates,
            profile: &profile,
            route_length_km: length / 1000.0,
            confidence: ConfidenceInputs::default(),
            reference_status: HashMap::new(),
        })
    }

    #[test]
    fn test_overall_status_always_safe() {
        let result = aggregate_flat(1200.0);
        assert_eq!(result.safety_summary.overall_status, "SAFE");
    }

    #[test]
    fn test_schema_complete() {
        let result = aggregate_flat(1200.0);
        assert_eq!(result.towers.len(), 4);
        assert_eq!(result.spans.len(), 3);
        assert!(result.line_summary.total_project_cost > 0.0);
        assert!(!result.regional_context.governing_standard.is_empty());
        assert!(!result.currency.code.is_empty());
        assert!(result.regional_context.confidence.score >= 50);
    }

    #[test]
    fn test_unsafe_outcome_replaced_by_fallback() {
        let ctx = ProjectContext::new(400.0);
        let stations = stations_every_400(800.0);
        let mut outcomes = outcomes_for(&stations, &ctx);

        // Force the middle tower unsafe
        outcomes[1].safe = false;
        outcomes[1].violations = vec!["IEC Foundation Check: footing too small".to_string()];

        let profile = flat_profile(800.0);
        let map = ObstacleMap::default();
        let rates = MarketRates::global_default();
        let result = aggregate(&AggregatorInput {
            stations: &stations,
            outcomes: &outcomes,
            ctx: &ctx,
            standard: DesignStandard::Iec,
            map: &map,
            rates: &rates,
            profile: &profile,
            route_length_km: 0.8,
            confidence: ConfidenceInputs::default(),
            reference_status: HashMap::new(),
        });

        assert_eq!(result.safety_summary.overall_status, "SAFE");
        let governed = &result.towers[1];
        assert_eq!(governed.safety_status, TowerSafetyStatus::Governing);
        assert!(governed
            .governing_load_case
            .as_ref()
            .unwrap()
            .contains("Foundation Check"));
        // The fallback geometry is conservative
        assert!(governed.total_height >= 25.0);
        assert!(
            *governed.foundation_dimensions.get("depth").unwrap() >= 4.0
        );
        assert_eq!(result.optimization_info.fallback_towers, 1);
    }

    #[test]
    fn test_sensitivity_band_widens_with_complexity() {
        let mut ctx = ProjectContext::new(400.0);
        let base = sensitivity_band(&ctx, 1_000_000.0);
        // 400 kV alone adds 5 over the base 15
        assert_eq!(base.variance_percent, 20.0);

        ctx.terrain = crate::project::TerrainType::Mountainous;
        ctx.soil = crate::project::SoilCategory::Soft;
        ctx.wind_zone = crate::project::WindZone::Zone4;
        let wide = sensitivity_band(&ctx, 1_000_000.0);
        assert_eq!(wide.variance_percent, 40.0);
        assert!(wide.upper_bound > base.upper_bound);
    }

    #[test]
    fn test_line_summary_aggregates() {
        let result = aggregate_flat(1200.0);
        let ls = &result.line_summary;

        assert_eq!(ls.total_towers, 4);
        assert!((ls.avg_span - 400.0).abs() < 1e-9);
        assert!((ls.tower_density_per_km - round2(4.0 / 1.2)).abs() < 1e-9);
        assert!(ls.total_steel_tonnes > 0.0);
        assert!(ls.total_concrete_m3 > 0.0);
        assert!(ls.tallest_tower >= 25.0);
    }

    #[test]
    fn test_strain_sections_on_straight_line() {
        let result = aggregate_flat(1200.0);
        // dead-end ... dead-end with suspensions between: one section
        assert_eq!(result.strain_sections.len(), 1);
        assert_eq!(result.strain_sections[0].num_spans, 3);
    }

    #[test]
    fn test_constructability_warnings_surface() {
        let mut ctx = ProjectContext::new(765.0);
        ctx.soil = crate::project::SoilCategory::Soft;
        ctx.wind_zone = crate::project::WindZone::Zone4;

        let stations = stations_every_400(800.0);
        let outcomes = outcomes_for(&stations, &ctx);
        let profile = flat_profile(800.0);
        let map = ObstacleMap::default();
        let rates = MarketRates::global_default();

        let result = aggregate(&AggregatorInput {
            stations: &stations,
            outcomes: &outcomes,
            ctx: &ctx,
            standard: DesignStandard::Iec,
            map: &map,
            rates: &rates,
            profile: &profile,
            route_length_km: 0.8,
            confidence: ConfidenceInputs::default(),
            reference_status: HashMap::new(),
        });

        // Soft soil over zone 4 is a textbook buildability concern; every
        // tower flags it and the warnings carry the tower index
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("High wind (zone_4) and soft soil")));
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("Shallow foundation at practical limit")));
        assert!(result.warnings.iter().any(|w| w.starts_with("Tower 0:")));
        // Still SAFE: warnings are advisory, never rejections
        assert_eq!(result.safety_summary.overall_status, "SAFE");
    }

    #[test]
    fn test_comfortable_line_avoids_severe_buildability_flags() {
        // A flat medium-soil zone-2 line may pick up informational notes
        // (e.g. short terminal spans) but nothing foundation- or
        // clearance-critical
        let result = aggregate_flat(1200.0);
        for warning in &result.warnings {
            assert!(!warning.contains("Deep shallow foundation"), "{warning}");
            assert!(!warning.contains("Large shallow footing"), "{warning}");
            assert!(!warning.contains("Clearance margin is low"), "{warning}");
            assert!(!warning.contains("Shallow foundation at practical limit"), "{warning}");
        }
    }

    #[test]
    fn test_degraded_map_surfaces_warning() {
        let ctx = ProjectContext::new(220.0);
        let stations = stations_every_400(800.0);
        let outcomes = outcomes_for(&stations, &ctx);
        let profile = flat_profile(800.0);
        let map = ObstacleMap::degraded(&profile, "overlay fetch timed out".to_string());
        let rates = MarketRates::global_default();

        let result = aggregate(&AggregatorInput {
            stations: &stations,
            outcomes: &outcomes,
            ctx: &ctx,
            standard: DesignStandard::Iec,
            map: &map,
            rates: &rates,
            profile: &profile,
            route_length_km: 0.8,
            confidence: ConfidenceInputs::default(),
            reference_status: HashMap::new(),
        });

        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("overlay fetch timed out")));
    }
}
