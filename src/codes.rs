//! Code-of-practice safety engine
//!
//! The sole arbiter of whether a candidate tower geometry is safe. The
//! engine is polymorphic over a closed set of design standards:
//!
//! - **IS**: Indian Standards (IS 802, IS 875, IS 456)
//! - **IEC**: IEC 60826 / BS EN 50341
//! - **EUROCODE**: EN 50341, EN 1993, EN 1997
//! - **ASCE**: ASCE 10, AISC 360, IEEE 691
//!
//! Every standard runs the same ordered battery of checks; standards differ
//! in constants, never in logic:
//!
//! 1. Shallow-foundation feasibility (soil-indexed footing windows)
//! 2. Structural sanity (type/span compatibility, span-height, aspect ratio)
//! 3. Electrical clearance under maximum sag (the only *critical* class)
//! 4. Wind exposure (zone-scaled minimum base width)
//! 5. Standard-specific constants (depth minima, base-width window,
//!    slenderness, span caps)
//!
//! The engine is stateless and referentially transparent; it is invoked
//! millions of times per optimisation run and never mutates its inputs.

use crate::conductor::{required_clearance, sag_allowance};
use crate::project::{ProjectContext, SoilCategory, TowerGeometry, TowerType};
use serde::{Deserialize, Serialize};

/// Governing design standard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DesignStandard {
    #[serde(rename = "IS")]
    Is,
    #[serde(rename = "IEC")]
    Iec,
    #[serde(rename = "EUROCODE")]
    Eurocode,
    #[serde(rename = "ASCE")]
    Asce,
}

impl DesignStandard {
    pub fn as_str(self) -> &'static str {
        match self {
            DesignStandard::Is => "IS",
            DesignStandard::Iec => "IEC",
            DesignStandard::Eurocode => "EUROCODE",
            DesignStandard::Asce => "ASCE",
        }
    }

    /// Full standard family name
    pub fn description(self) -> &'static str {
        match self {
            DesignStandard::Is => "Indian Standards (IS 802, IS 875, IS 456)",
            DesignStandard::Iec => "IEC / BS (IEC 60826, BS EN 50341)",
            DesignStandard::Eurocode => "Eurocode (EN 50341, EN 1993, EN 1997)",
            DesignStandard::Asce => "ASCE / AISC / IEEE (ASCE 10, AISC 360, IEEE 691)",
        }
    }
}

/// EU-27 member state codes (ISO-3166-1 alpha-2)
const EU_27: [&str; 27] = [
    "AT", "BE", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE", "IT",
    "LV", "LT", "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE",
];

/// Resolve the governing standard from an ISO country code
///
/// IN maps to IS; US, CA and MX to ASCE; EU-27 members to EUROCODE;
/// everything else, including an unresolved location, to IEC. This is a
/// plain lookup, not a heuristic.
pub fn resolve_standard(country_code: Option<&str>) -> DesignStandard {
    let Some(code) = country_code else {
        return DesignStandard::Iec;
    };
    let code = code.to_ascii_uppercase();

    match code.as_str() {
        "IN" => DesignStandard::Is,
        "US" | "CA" | "MX" => DesignStandard::Asce,
        c if EU_27.contains(&c) => DesignStandard::Eurocode,
        _ => DesignStandard::Iec,
    }
}

/// Result of a codal safety check
///
/// The only way safety is communicated between components. An unsafe result
/// never escapes the aggregator to the output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyCheck {
    pub safe: bool,
    pub violations: Vec<String>,
}

impl SafetyCheck {
    pub fn from_violations(violations: Vec<String>) -> Self {
        Self {
            safe: violations.is_empty(),
            violations,
        }
    }

    /// Whether any violation is an electrical-clearance violation, the only
    /// class the sizer treats as critical
    pub fn has_clearance_violation(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.to_lowercase().contains("clearance"))
    }
}

/// Per-standard constants; the check logic itself is shared
struct StandardConstants {
    /// Check label prefixes: foundation, structural, clearance, wind,
    /// depth, base width
    foundation_ref: &'static str,
    structural_ref: &'static str,
    clearance_ref: &'static str,
    wind_ref: &'static str,
    depth_ref: &'static str,
    base_width_ref: &'static str,
    /// Minimum footing depth by soil: soft, medium, hard, rock (m)
    min_depth_by_soil: [f64; 4],
    /// Upper bound of the base-width window as a fraction of height
    base_width_ratio_max: f64,
    /// Extra slenderness/aspect cap, with its reference label
    slenderness_cap: Option<(f64, &'static str)>,
    /// Hard suspension-span cap (m)
    suspension_span_cap: Option<(f64, &'static str)>,
}

fn constants(standard: DesignStandard) -> StandardConstants {
    match standard {
        DesignStandard::Is => StandardConstants {
            foundation_ref: "IS Foundation Check",
            structural_ref: "IS Structural Check",
            clearance_ref: "IS 802 Clearance Check",
            wind_ref: "IS 875 Wind Check",
            depth_ref: "IS 456 Foundation Depth",
            base_width_ref: "IS 802 Base Width",
            min_depth_by_soil: [3.0, 2.5, 2.0, 2.0],
            base_width_ratio_max: 0.40,
            slenderness_cap: None,
            suspension_span_cap: None,
        },
        DesignStandard::Iec => StandardConstants {
            foundation_ref: "IEC Foundation Check",
            structural_ref: "IEC Structural Check",
            clearance_ref: "IEC 60826 Clearance Check",
            wind_ref: "IEC 60826 Wind Check",
            depth_ref: "IEC Foundation Depth",
            base_width_ref: "IEC 60826 Base Width",
            min_depth_by_soil: [2.0, 2.0, 2.0, 2.0],
            base_width_ratio_max: 0.35,
            slenderness_cap: None,
            suspension_span_cap: None,
        },
        DesignStandard::Eurocode => StandardConstants {
            foundation_ref: "Eurocode Foundation Check",
            structural_ref: "Eurocode Structural Check",
            clearance_ref: "EN 50341 Clearance Check",
            wind_ref: "EN 50341 Wind Check",
            depth_ref: "EN 1997 Foundation Depth",
            base_width_ref: "EN 50341 Base Width",
            min_depth_by_soil: [2.5, 2.0, 1.5, 1.5],
            base_width_ratio_max: 0.40,
            slenderness_cap: Some((12.0, "EN 1993 Slenderness")),
            suspension_span_cap: None,
        },
        DesignStandard::Asce => StandardConstants {
            foundation_ref: "ASCE Foundation Check",
            structural_ref: "ASCE Structural Check",
            clearance_ref: "ASCE 10 Clearance Check",
            wind_ref: "ASCE 10 Wind Check",
            depth_ref: "IEEE 691 Foundation Depth",
            base_width_ref: "ASCE 10 Base Width",
            min_depth_by_soil: [3.0, 2.5, 2.0, 2.0],
            base_width_ratio_max: 0.40,
            slenderness_cap: Some((14.0, "AISC 360 Aspect Ratio")),
            suspension_span_cap: Some((400.0, "ASCE 10 Span Length")),
        },
    }
}

fn soil_index(soil: SoilCategory) -> usize {
    match soil {
        SoilCategory::Soft => 0,
        SoilCategory::Medium => 1,
        SoilCategory::Hard => 2,
        SoilCategory::Rock => 3,
    }
}

/// Span window consistent with a tower type, intersected with the project
/// span bounds (m)
///
/// Suspension and angle towers carry 0.6-1.1 × the voltage-typical span;
/// tension and dead-end towers need at least 0.75 × the typical span.
pub fn type_span_window(tower_type: TowerType, ctx: &ProjectContext) -> (f64, f64) {
    let typical = ctx.typical_span();
    let (lo, hi) = match tower_type {
        TowerType::Suspension | TowerType::Angle => (0.6 * typical, 1.1 * typical),
        TowerType::Tension | TowerType::DeadEnd => (0.75 * typical, f64::INFINITY),
    };

    let min = lo.max(ctx.span_min).min(ctx.span_max);
    let max = hi.min(ctx.span_max).max(min);
    (min, max)
}

/// Soil-indexed shallow-foundation windows: (plan min, plan max, depth min)
pub fn soil_window(soil: SoilCategory) -> (f64, f64, f64) {
    match soil {
        SoilCategory::Soft => (5.0, 8.0, 4.0),
        SoilCategory::Medium => (3.5, 6.5, 2.5),
        SoilCategory::Hard | SoilCategory::Rock => (3.0, 5.5, 2.0),
    }
}

/// Codal safety engine for one governing standard
#[derive(Debug, Clone, Copy)]
pub struct CodeEngine {
    standard: DesignStandard,
}

impl CodeEngine {
    pub fn new(standard: DesignStandard) -> Self {
        Self { standard }
    }

    pub fn standard(&self) -> DesignStandard {
        self.standard
    }

    /// Run the full check battery on a candidate geometry
    ///
    /// Deterministic and side-effect free. Collects one violation per failed
    /// check category rather than stopping at the first.
    pub fn check(&self, geometry: &TowerGeometry, ctx: &ProjectContext) -> SafetyCheck {
        let consts = constants(self.standard);
        let mut violations = Vec::new();

        if let Some(msg) = self.check_shallow_foundation(geometry, ctx) {
            violations.push(format!("{}: {}", consts.foundation_ref, msg));
        }
        if let Some(msg) = self.check_structural(geometry, ctx) {
            violations.push(format!("{}: {}", consts.structural_ref, msg));
        }
        if let Some(msg) = self.check_electrical_clearance(geometry, ctx) {
            violations.push(format!("{}: {}", consts.clearance_ref, msg));
        }
        if let Some(msg) = self.check_wind_exposure(geometry, ctx) {
            violations.push(format!("{}: {}", consts.wind_ref, msg));
        }
        self.check_standard_specific(geometry, ctx, &consts, &mut violations);

        SafetyCheck::from_violations(violations)
    }

    /// Check 1: shallow-foundation feasibility for the soil category
    ///
    /// Deterministic sanity limits; designs that would need piles are
    /// rejected rather than re-modelled.
    fn check_shallow_foundation(
        &self,
        geometry: &TowerGeometry,
        ctx: &ProjectContext,
    ) -> Option<String> {
        let (plan_min, plan_max, depth_min) = soil_window(ctx.soil);
        let soil = ctx.soil.as_str();

        if geometry.footing_length < plan_min {
            return Some(format!(
                "Soil category '{}' requires minimum footing length of {:.1} m. Design has {:.2} m",
                soil, plan_min, geometry.footing_length
            ));
        }
        if geometry.footing_length > plan_max {
            return Some(format!(
                "Soil category '{}' requires maximum footing length of {:.1} m. Design has {:.2} m",
                soil, plan_max, geometry.footing_length
            ));
        }
        if geometry.footing_width < plan_min {
            return Some(format!(
                "Soil category '{}' requires minimum footing width of {:.1} m. Design has {:.2} m",
                soil, plan_min, geometry.footing_width
            ));
        }
        if geometry.footing_width > plan_max {
            return Some(format!(
                "Soil category '{}' requires maximum footing width of {:.1} m. Design has {:.2} m",
                soil, plan_max, geometry.footing_width
            ));
        }
        if geometry.footing_depth < depth_min {
            return Some(format!(
                "Soil category '{}' requires minimum footing depth of {:.1} m. Design has {:.2} m",
                soil, depth_min, geometry.footing_depth
            ));
        }

        None
    }

    /// Check 2: structural sanity
    fn check_structural(&self, geometry: &TowerGeometry, ctx: &ProjectContext) -> Option<String> {
        if let Some(msg) = self.check_type_span_consistency(geometry, ctx) {
            return Some(msg);
        }

        let span_height_ratio = geometry.span_length / geometry.total_height;
        if span_height_ratio > 10.0 {
            return Some(format!(
                "Span-height ratio ({:.2}) exceeds maximum allowed (10.0). Span: {:.2} m, Height: {:.2} m",
                span_height_ratio, geometry.span_length, geometry.total_height
            ));
        }

        let aspect = geometry.aspect_ratio();
        if aspect > 15.0 {
            return Some(format!(
                "Aspect ratio (H/B) too high: {:.2}. Maximum allowed: 15.0",
                aspect
            ));
        }
        if aspect < 2.0 {
            return Some(format!(
                "Aspect ratio (H/B) too low: {:.2}. Minimum required: 2.0",
                aspect
            ));
        }

        None
    }

    /// Span length must be consistent with the tower's structural role
    ///
    /// Suspension and angle towers: 0.6-1.1 × the voltage-typical span.
    /// Tension and dead-end towers: at least 0.75 × the typical span.
    fn check_type_span_consistency(
        &self,
        geometry: &TowerGeometry,
        ctx: &ProjectContext,
    ) -> Option<String> {
        let typical = ctx.typical_span();
        let span = geometry.span_length;

        match geometry.tower_type {
            TowerType::Suspension | TowerType::Angle => {
                let (min_span, max_span) = (0.6 * typical, 1.1 * typical);
                let label = match geometry.tower_type {
                    TowerType::Suspension => "Suspension",
                    _ => "Angle",
                };
                if span < min_span {
                    return Some(format!(
                        "{} tower requires span >= {:.0} m (0.6 x typical span of {:.0} m for {} kV). Design has {:.2} m",
                        label, min_span, typical, ctx.voltage_kv, span
                    ));
                }
                if span > max_span {
                    return Some(format!(
                        "{} tower requires span <= {:.0} m (1.1 x typical span of {:.0} m for {} kV). Design has {:.2} m",
                        label, max_span, typical, ctx.voltage_kv, span
                    ));
                }
            }
            TowerType::Tension | TowerType::DeadEnd => {
                let min_span = 0.75 * typical;
                if span < min_span {
                    let label = match geometry.tower_type {
                        TowerType::Tension => "Tension",
                        _ => "Dead-end",
                    };
                    return Some(format!(
                        "{} tower requires span >= {:.0} m (0.75 x typical span of {:.0} m for {} kV). Design has {:.2} m",
                        label, min_span, typical, ctx.voltage_kv, span
                    ));
                }
            }
        }

        None
    }

    /// Check 3: electrical clearance under maximum sag conditions
    ///
    /// Conservative: assumes conductor attachment at the tower top, so the
    /// available clearance is the height minus the worst-case sag allowance.
    fn check_electrical_clearance(
        &self,
        geometry: &TowerGeometry,
        ctx: &ProjectContext,
    ) -> Option<String> {
        let required = required_clearance(ctx.voltage_kv);
        let allowance = sag_allowance(ctx.voltage_kv, geometry.span_length);
        let actual = geometry.total_height - allowance;

        if actual < required {
            return Some(format!(
                "Electrical clearance violation under maximum sag conditions. \
                 Required clearance: {:.2} m, Actual clearance: {:.2} m \
                 (tower height: {:.2} m - sag allowance: {:.2} m)",
                required, actual, geometry.total_height, allowance
            ));
        }

        None
    }

    /// Check 4: wind exposure
    fn check_wind_exposure(&self, geometry: &TowerGeometry, ctx: &ProjectContext) -> Option<String> {
        let zone = ctx.effective_wind_zone();
        let min_base_width = geometry.total_height * 0.25 * zone.base_width_multiplier();

        if geometry.base_width < min_base_width {
            return Some(format!(
                "Base width ({:.2} m) insufficient for wind {}. Minimum required: {:.2} m",
                geometry.base_width,
                zone.as_str(),
                min_base_width
            ));
        }

        None
    }

    /// Check 5: standard-specific constants
    fn check_standard_specific(
        &self,
        geometry: &TowerGeometry,
        ctx: &ProjectContext,
        consts: &StandardConstants,
        violations: &mut Vec<String>,
    ) {
        let mut min_depth = consts.min_depth_by_soil[soil_index(ctx.soil)];
        if ctx.flags.conservative_foundation {
            min_depth += 0.5;
        }
        if geometry.footing_depth < min_depth {
            violations.push(format!(
                "{}: Minimum depth {:.1} m required for {} soil. Design has {:.2} m",
                consts.depth_ref,
                min_depth,
                ctx.soil.as_str(),
                geometry.footing_depth
            ));
        }

        let ratio_min = geometry.total_height * 0.25;
        let ratio_max = geometry.total_height * consts.base_width_ratio_max;
        if geometry.base_width < ratio_min || geometry.base_width > ratio_max {
            violations.push(format!(
                "{}: Must be between 0.25H ({:.2} m) and {:.2}H ({:.2} m). Design has {:.2} m",
                consts.base_width_ref,
                ratio_min,
                consts.base_width_ratio_max,
                ratio_max,
                geometry.base_width
            ));
        }

        if let Some((cap, label)) = consts.slenderness_cap {
            let slenderness = geometry.aspect_ratio();
            if slenderness > cap {
                violations.push(format!(
                    "{}: Slenderness ratio ({:.2}) exceeds maximum allowed ({:.1})",
                    label, slenderness, cap
                ));
            }
        }

        if let Some((cap, label)) = consts.suspension_span_cap {
            if geometry.tower_type == TowerType::Suspension && geometry.span_length > cap {
                violations.push(format!(
                    "{}: Suspension tower span ({:.2} m) exceeds maximum ({:.0} m)",
                    label, geometry.span_length, cap
                ));
            }
        }
    }
}
