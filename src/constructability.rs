//! Constructability and practicality warnings
//!
//! Advisory layer bridging "structurally safe" and "practically buildable".
//! A design that passes the code engine can still be awkward to construct:
//! deep shallow footings need shoring, compact bases complicate erection,
//! high wind over soft soil makes uplift governing. These checks never
//! reject a design; they only flag warnings the aggregator surfaces in the
//! result's `warnings` list.
//!
//! Checks, in order:
//!
//! 1. Deep shallow foundation (> 3.5 m, with a soft-soil rider)
//! 2. Large footing footprint (> 6.5 m plan dimension)
//! 3. Low clearance margin under maximum sag (< 10 % of the requirement)
//! 4. Short span relative to the voltage-typical span (< 80 %)
//! 5. High wind + soft soil combination
//! 6. Compact tower base relative to height
//! 7. Per-tower cost outside the typical installed range
//! 8. Shallow pad footing at its practical limit

use crate::conductor::{required_clearance, sag_allowance};
use crate::project::{
    FoundationType, ProjectContext, SoilCategory, TowerGeometry, WindZone,
};

/// Footing depth above which groundwater and shoring become a concern (m)
pub const DEEP_FOOTING_WARNING_M: f64 = 3.5;

/// Plan dimension above which excavation logistics get flagged (m)
pub const LARGE_FOOTING_WARNING_M: f64 = 6.5;

/// Depth at which a pad footing reaches its practical limit (m)
pub const PRACTICAL_DEPTH_LIMIT_M: f64 = 4.0;

/// Spans below this fraction of the voltage-typical span get flagged
const SHORT_SPAN_FRACTION: f64 = 0.8;

/// Typical installed per-tower cost range for this cost model (USD)
const TYPICAL_TOWER_COST_USD: (f64, f64) = (10_000.0, 1_000_000.0);

/// Run all constructability checks against one reported design
///
/// `per_tower_cost` is the installed cost the aggregator reports for the
/// tower. Returns human-readable warnings; empty when nothing is flagged.
pub fn check(
    geometry: &TowerGeometry,
    ctx: &ProjectContext,
    per_tower_cost: f64,
) -> Vec<String> {
    let mut warnings = Vec::new();

    check_foundation_depth(geometry, ctx, &mut warnings);
    check_footing_size(geometry, &mut warnings);
    check_clearance_margin(geometry, ctx, &mut warnings);
    check_span_conservatism(geometry, ctx, &mut warnings);
    check_wind_soil_combination(ctx, &mut warnings);
    check_base_width_practicality(geometry, &mut warnings);
    check_cost_anomaly(per_tower_cost, &mut warnings);
    check_foundation_type_limit(geometry, ctx, &mut warnings);

    warnings
}

/// Check 1: deep shallow foundation
fn check_foundation_depth(
    geometry: &TowerGeometry,
    ctx: &ProjectContext,
    warnings: &mut Vec<String>,
) {
    if geometry.footing_depth > DEEP_FOOTING_WARNING_M {
        let mut msg = format!(
            "Deep shallow foundation detected ({:.2} m > {:.1} m). \
             May require groundwater assessment, shoring, or alternate foundation type.",
            geometry.footing_depth, DEEP_FOOTING_WARNING_M
        );
        if ctx.soil == SoilCategory::Soft {
            msg.push_str(" Soft soil + deep footing increases excavation risk.");
        }
        warnings.push(msg);
    }
}

/// Check 2: footing footprint constructability
fn check_footing_size(geometry: &TowerGeometry, warnings: &mut Vec<String>) {
    if geometry.footing_length > LARGE_FOOTING_WARNING_M
        || geometry.footing_width > LARGE_FOOTING_WARNING_M
    {
        warnings.push(format!(
            "Large shallow footing footprint ({:.2} m x {:.2} m). \
             Check excavation stability, working space, and concreting logistics.",
            geometry.footing_length, geometry.footing_width
        ));
    }
}

/// Check 3: low clearance margin under maximum sag (EHV risk)
///
/// Uses the same allowance and requirement tables as the code engine; the
/// warning threshold is 10 % of the required clearance.
fn check_clearance_margin(
    geometry: &TowerGeometry,
    ctx: &ProjectContext,
    warnings: &mut Vec<String>,
) {
    let required = required_clearance(ctx.voltage_kv);
    let allowance = sag_allowance(ctx.voltage_kv, geometry.span_length);
    let margin = (geometry.total_height - allowance) - required;
    let threshold = 0.10 * required;

    if margin < threshold {
        warnings.push(format!(
            "Clearance margin is low under maximum sag and wind conditions \
             (margin: {:.2} m < threshold: {:.2} m). \
             Detailed sag-tension analysis recommended.",
            margin, threshold
        ));
    }
}

/// Check 4: span conservatism (informational)
fn check_span_conservatism(
    geometry: &TowerGeometry,
    ctx: &ProjectContext,
    warnings: &mut Vec<String>,
) {
    let typical = ctx.typical_span();
    let threshold = typical * SHORT_SPAN_FRACTION;

    if geometry.span_length < threshold {
        warnings.push(format!(
            "Short span selected ({:.2} m vs typical ~{:.0} m for {} kV). \
             May increase number of towers and total project cost.",
            geometry.span_length, typical, ctx.voltage_kv
        ));
    }
}

/// Check 5: high wind over soft soil
fn check_wind_soil_combination(ctx: &ProjectContext, warnings: &mut Vec<String>) {
    let high_wind = matches!(
        ctx.effective_wind_zone(),
        WindZone::Zone3 | WindZone::Zone4
    );

    if high_wind && ctx.soil == SoilCategory::Soft {
        warnings.push(format!(
            "High wind ({}) and soft soil combination. \
             Foundation uplift and overturning sensitivity expected.",
            ctx.effective_wind_zone().as_str()
        ));
    }
}

/// Check 6: base width practicality
fn check_base_width_practicality(geometry: &TowerGeometry, warnings: &mut Vec<String>) {
    let ratio = geometry.base_width / geometry.total_height;

    if ratio < 0.25 {
        warnings.push(format!(
            "Compact tower base relative to height (base_width/height = {:.3} < 0.25). \
             Check erection stability and leg force concentration.",
            ratio
        ));
    }
}

/// Check 7: cost anomaly (advisory)
fn check_cost_anomaly(per_tower_cost: f64, warnings: &mut Vec<String>) {
    let (low, high) = TYPICAL_TOWER_COST_USD;

    if per_tower_cost < low {
        warnings.push(format!(
            "Estimated cost (${:.2} USD) below typical per-tower range \
             (${:.0} - ${:.0} USD). \
             Verify geometry, cost assumptions, and regional multipliers.",
            per_tower_cost, low, high
        ));
    } else if per_tower_cost > high {
        warnings.push(format!(
            "Estimated cost (${:.2} USD) exceeds typical per-tower range \
             (${:.0} - ${:.0} USD). \
             Verify geometry, cost assumptions, and regional multipliers.",
            per_tower_cost, low, high
        ));
    }
}

/// Check 8: shallow foundation at its practical limit
fn check_foundation_type_limit(
    geometry: &TowerGeometry,
    ctx: &ProjectContext,
    warnings: &mut Vec<String>,
) {
    if geometry.foundation_type != FoundationType::PadFooting {
        return;
    }

    let deep_footing = geometry.footing_depth > PRACTICAL_DEPTH_LIMIT_M;
    let very_high_wind = ctx.effective_wind_zone() == WindZone::Zone4;
    let soft_soil = ctx.soil == SoilCategory::Soft;

    if deep_footing || very_high_wind || soft_soil {
        let mut conditions = Vec::new();
        if deep_footing {
            conditions.push(format!(
                "deep footing ({:.2} m > {:.1} m)",
                geometry.footing_depth, PRACTICAL_DEPTH_LIMIT_M
            ));
        }
        if very_high_wind {
            conditions.push(format!(
                "very high wind ({})",
                ctx.effective_wind_zone().as_str()
            ));
        }
        if soft_soil {
            conditions.push("soft soil".to_string());
        }

        warnings.push(format!(
            "Shallow foundation at practical limit ({}). \
             Alternate foundation systems (pile / anchor) may be required.",
            conditions.join(", ")
        ));
    }
}
