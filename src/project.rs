//! Project context and site classification
//!
//! Defines the user-supplied design context every component consumes: voltage
//! level, terrain, wind zone, soil category, tower preference, scenario flags
//! and right-of-way mode. The context is immutable once the request has been
//! parsed.

use serde::{Deserialize, Serialize};

/// Transmission tower structural role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TowerType {
    /// Carries conductors on a straight run; lightest loads
    Suspension,
    /// Takes moderate route deviations
    Angle,
    /// Holds full longitudinal tension (strain tower)
    Tension,
    /// Line terminal or section break; heaviest loads
    DeadEnd,
}

impl TowerType {
    /// Minimum base-width to height ratio for this tower type
    ///
    /// Heavier structural roles need wider bases.
    pub fn base_width_ratio(self) -> f64 {
        match self {
            TowerType::Suspension => 0.25,
            TowerType::Angle => 0.28,
            TowerType::Tension => 0.32,
            TowerType::DeadEnd => 0.35,
        }
    }

    /// Steel-weight multiplier relative to a suspension tower
    pub fn steel_multiplier(self) -> f64 {
        match self {
            TowerType::Suspension => 1.0,
            TowerType::Angle => 1.5,
            TowerType::Tension => 1.2,
            TowerType::DeadEnd => 2.5,
        }
    }

    /// Whether this tower can hold full longitudinal conductor tension
    pub fn is_anchor(self) -> bool {
        !matches!(self, TowerType::Suspension)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TowerType::Suspension => "suspension",
            TowerType::Angle => "angle",
            TowerType::Tension => "tension",
            TowerType::DeadEnd => "dead_end",
        }
    }
}

/// Foundation types supported by the shallow-foundation model
///
/// Pile foundations are out of scope; designs that would need them are
/// rejected by the code engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FoundationType {
    PadFooting,
    /// Pad and chimney / open footing
    ChimneyFooting,
}

impl FoundationType {
    pub fn as_str(self) -> &'static str {
        match self {
            FoundationType::PadFooting => "pad_footing",
            FoundationType::ChimneyFooting => "chimney_footing",
        }
    }
}

/// Terrain classification for construction cost and confidence factors
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TerrainType {
    Flat,
    Rolling,
    Mountainous,
    Desert,
}

impl TerrainType {
    /// Erection cost multiplier for access and logistics difficulty
    pub fn erection_factor(self) -> f64 {
        match self {
            TerrainType::Flat => 1.0,
            TerrainType::Rolling => 1.15,
            TerrainType::Mountainous => 1.5,
            TerrainType::Desert => 1.2,
        }
    }
}

/// Wind zone classification (increasing severity)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum WindZone {
    Zone1,
    Zone2,
    Zone3,
    Zone4,
}

impl WindZone {
    /// Base-width multiplier applied by the wind exposure check
    pub fn base_width_multiplier(self) -> f64 {
        match self {
            WindZone::Zone1 => 1.0,
            WindZone::Zone2 => 1.1,
            WindZone::Zone3 => 1.2,
            WindZone::Zone4 => 1.3,
        }
    }

    /// Next more severe zone; saturates at zone 4
    pub fn upgraded(self) -> Self {
        match self {
            WindZone::Zone1 => WindZone::Zone2,
            WindZone::Zone2 => WindZone::Zone3,
            WindZone::Zone3 | WindZone::Zone4 => WindZone::Zone4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WindZone::Zone1 => "zone_1",
            WindZone::Zone2 => "zone_2",
            WindZone::Zone3 => "zone_3",
            WindZone::Zone4 => "zone_4",
        }
    }
}

/// Soil classification for foundation design
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SoilCategory {
    Soft,
    Medium,
    Hard,
    Rock,
}

impl SoilCategory {
    /// Concrete placement factor (soft soil needs more over-pour and forming;
    /// rock needs controlled excavation)
    pub fn concrete_factor(self) -> f64 {
        match self {
            SoilCategory::Soft => 1.35,
            SoilCategory::Medium => 1.1,
            SoilCategory::Hard => 1.0,
            SoilCategory::Rock => 1.2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SoilCategory::Soft => "soft",
            SoilCategory::Medium => "medium",
            SoilCategory::Hard => "hard",
            SoilCategory::Rock => "rock",
        }
    }
}

/// Right-of-way acquisition scenario
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RowMode {
    GovernmentCorridor,
    RuralPrivate,
    UrbanPrivate,
    Mixed,
}

impl RowMode {
    /// Land rate (USD per m²) for corridor and footprint acquisition
    pub fn land_rate(self) -> f64 {
        match self {
            RowMode::GovernmentCorridor => 0.4,
            RowMode::RuralPrivate => 0.8,
            RowMode::UrbanPrivate => 10.0,
            RowMode::Mixed => 3.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RowMode::GovernmentCorridor => "government_corridor",
            RowMode::RuralPrivate => "rural_private",
            RowMode::UrbanPrivate => "urban_private",
            RowMode::Mixed => "mixed",
        }
    }
}

impl Default for RowMode {
    fn default() -> Self {
        RowMode::RuralPrivate
    }
}

/// User-controlled design scenario toggles
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DesignFlags {
    /// Upgrade the wind zone by one step
    #[serde(default)]
    pub design_for_higher_wind: bool,

    /// Include the ice accretion load case
    #[serde(default)]
    pub include_ice_load: bool,

    /// Stricter footing limits
    #[serde(default)]
    pub conservative_foundation: bool,

    /// Increased safety factors across checks
    #[serde(default)]
    pub high_reliability: bool,
}

/// Geographic context resolved by the (external) reverse geocoder
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeoContext {
    /// ISO-3166-1 alpha-2 country code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// How the context was resolved (e.g. "map-derived", "unresolved")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_mode: Option<String>,
}

/// Immutable per-request design context
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectContext {
    /// Line voltage (kV)
    #[serde(rename = "voltageKv")]
    pub voltage_kv: f64,

    pub terrain: TerrainType,

    #[serde(rename = "windZone")]
    pub wind_zone: WindZone,

    pub soil: SoilCategory,

    /// Preferred type for sized towers where the classifier allows a choice
    #[serde(rename = "towerPreference")]
    pub tower_preference: TowerType,

    pub flags: DesignFlags,

    #[serde(rename = "rowMode")]
    pub row_mode: RowMode,

    /// Minimum allowed span (m)
    #[serde(rename = "spanMin")]
    pub span_min: f64,

    /// Maximum allowed span (m)
    #[serde(rename = "spanMax")]
    pub span_max: f64,

    #[serde(default, rename = "geoContext")]
    pub geo_context: GeoContext,
}

impl ProjectContext {
    /// Context with the standard span window and neutral site defaults
    pub fn new(voltage_kv: f64) -> Self {
        Self {
            voltage_kv,
            terrain: TerrainType::Flat,
            wind_zone: WindZone::Zone2,
            soil: SoilCategory::Medium,
            tower_preference: TowerType::Suspension,
            flags: DesignFlags::default(),
            row_mode: RowMode::default(),
            span_min: 250.0,
            span_max: 450.0,
            geo_context: GeoContext::default(),
        }
    }

    /// Wind zone with the higher-wind scenario flag applied
    pub fn effective_wind_zone(&self) -> WindZone {
        if self.flags.design_for_higher_wind {
            self.wind_zone.upgraded()
        } else {
            self.wind_zone
        }
    }

    /// Typical suspension span for the voltage level (m)
    pub fn typical_span(&self) -> f64 {
        if self.voltage_kv >= 900.0 {
            500.0
        } else if self.voltage_kv >= 765.0 {
            450.0
        } else if self.voltage_kv >= 400.0 {
            400.0
        } else if self.voltage_kv >= 220.0 {
            300.0
        } else {
            250.0
        }
    }

    /// Right-of-way corridor width for the voltage level (m)
    pub fn corridor_width(&self) -> f64 {
        if self.voltage_kv >= 900.0 {
            70.0
        } else if self.voltage_kv >= 765.0 {
            64.0
        } else if self.voltage_kv >= 400.0 {
            46.0
        } else if self.voltage_kv >= 220.0 {
            35.0
        } else {
            27.0
        }
    }
}

/// Absolute tower height ceiling (m)
pub const MAX_TOWER_HEIGHT_M: f64 = 60.0;

/// Footing plan-dimension bounds (m)
pub const FOOTING_PLAN_MIN_M: f64 = 3.0;
pub const FOOTING_PLAN_MAX_M: f64 = 8.0;

/// Footing depth bounds (m)
pub const FOOTING_DEPTH_MIN_M: f64 = 2.0;
pub const FOOTING_DEPTH_MAX_M: f64 = 6.0;

/// Maximum base width as a fraction of height
pub const BASE_WIDTH_RATIO_MAX: f64 = 0.40;

/// Voltage-based minimum tower height (m)
pub fn voltage_height_floor(voltage_kv: f64) -> f64 {
    if voltage_kv >= 900.0 {
        55.0
    } else if voltage_kv >= 765.0 {
        50.0
    } else if voltage_kv >= 400.0 {
        25.0
    } else if voltage_kv >= 220.0 {
        18.0
    } else {
        15.0
    }
}

/// Complete tower design candidate
///
/// All dimensions in metres. Candidates are produced by clamping into the
/// hard bounds, never by construction-time validation, so the sizer can move
/// freely through the search space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TowerGeometry {
    #[serde(rename = "towerType")]
    pub tower_type: TowerType,

    /// Total height, ground to peak
    #[serde(rename = "totalHeight")]
    pub total_height: f64,

    /// Base width at ground level
    #[serde(rename = "baseWidth")]
    pub base_width: f64,

    /// Span to the next tower
    #[serde(rename = "spanLength")]
    pub span_length: f64,

    #[serde(rename = "foundationType")]
    pub foundation_type: FoundationType,

    #[serde(rename = "footingLength")]
    pub footing_length: f64,

    #[serde(rename = "footingWidth")]
    pub footing_width: f64,

    #[serde(rename = "footingDepth")]
    pub footing_depth: f64,
}

impl TowerGeometry {
    /// Geometry clamped into every hard bound for the given context
    ///
    /// Height is floored at the voltage minimum; the base width window is
    /// coupled to the clamped height through the tower-type ratio.
    pub fn clamped(
        tower_type: TowerType,
        total_height: f64,
        base_width: f64,
        span_length: f64,
        footing_length: f64,
        footing_width: f64,
        footing_depth: f64,
        ctx: &ProjectContext,
    ) -> Self {
        let height = total_height
            .max(voltage_height_floor(ctx.voltage_kv))
            .min(MAX_TOWER_HEIGHT_M);

        let bw_min = height * tower_type.base_width_ratio();
        let bw_max = height * BASE_WIDTH_RATIO_MAX;
        let base_width = base_width.max(bw_min).min(bw_max);

        Self {
            tower_type,
            total_height: height,
            base_width,
            span_length: span_length.max(ctx.span_min).min(ctx.span_max),
            foundation_type: FoundationType::PadFooting,
            footing_length: footing_length.max(FOOTING_PLAN_MIN_M).min(FOOTING_PLAN_MAX_M),
            footing_width: footing_width.max(FOOTING_PLAN_MIN_M).min(FOOTING_PLAN_MAX_M),
            footing_depth: footing_depth.max(FOOTING_DEPTH_MIN_M).min(FOOTING_DEPTH_MAX_M),
        }
    }

    /// Aspect ratio height / base width
    pub fn aspect_ratio(&self) -> f64 {
        self.total_height / self.base_width
    }

    /// Foundation concrete volume, four footings per tower (m³)
    pub fn concrete_volume(&self) -> f64 {
        4.0 * self.footing_length * self.footing_width * self.footing_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_clamps_into_bounds() {
        let ctx = ProjectContext::new(400.0);
        let g = TowerGeometry::clamped(
            TowerType::Suspension,
            5.0,   // below the 400 kV floor
            1.0,   // below the ratio window
            900.0, // beyond max span
            0.5,
            20.0,
            0.1,
            &ctx,
        );
        assert_eq!(g.total_height, 25.0);
        assert_eq!(g.base_width, 25.0 * 0.25);
        assert_eq!(g.span_length, 450.0);
        assert_eq!(g.footing_length, FOOTING_PLAN_MIN_M);
        assert_eq!(g.footing_width, FOOTING_PLAN_MAX_M);
        assert_eq!(g.footing_depth, FOOTING_DEPTH_MIN_M);
    }

    #[test]
    fn test_geometry_base_width_couples_to_height() {
        let ctx = ProjectContext::new(132.0);
        let g = TowerGeometry::clamped(
            TowerType::DeadEnd,
            30.0,
            0.0,
            300.0,
            4.0,
            4.0,
            3.0,
            &ctx,
        );
        assert_eq!(g.base_width, 30.0 * 0.35);
    }

    #[test]
    fn test_voltage_height_floor_table() {
        assert_eq!(voltage_height_floor(132.0), 15.0);
        assert_eq!(voltage_height_floor(220.0), 18.0);
        assert_eq!(voltage_height_floor(400.0), 25.0);
        assert_eq!(voltage_height_floor(765.0), 50.0);
        assert_eq!(voltage_height_floor(900.0), 55.0);
    }

    #[test]
    fn test_concrete_volume_four_footings() {
        let ctx = ProjectContext::new(220.0);
        let g = TowerGeometry::clamped(
            TowerType::Suspension,
            30.0,
            8.0,
            300.0,
            4.0,
            5.0,
            3.0,
            &ctx,
        );
        assert_eq!(g.concrete_volume(), 4.0 * 4.0 * 5.0 * 3.0);
    }

    #[test]
    fn test_base_width_ratios_ordered_by_load() {
        assert!(TowerType::Suspension.base_width_ratio() < TowerType::Angle.base_width_ratio());
        assert!(TowerType::Angle.base_width_ratio() < TowerType::Tension.base_width_ratio());
        assert!(TowerType::Tension.base_width_ratio() < TowerType::DeadEnd.base_width_ratio());
    }

    #[test]
    fn test_wind_zone_upgrade_saturates() {
        assert_eq!(WindZone::Zone1.upgraded(), WindZone::Zone2);
        assert_eq!(WindZone::Zone4.upgraded(), WindZone::Zone4);
    }

    #[test]
    fn test_effective_wind_zone_with_flag() {
        let mut ctx = ProjectContext::new(400.0);
        ctx.wind_zone = WindZone::Zone2;
        assert_eq!(ctx.effective_wind_zone(), WindZone::Zone2);
        ctx.flags.design_for_higher_wind = true;
        assert_eq!(ctx.effective_wind_zone(), WindZone::Zone3);
    }

    #[test]
    fn test_typical_span_brackets() {
        assert_eq!(ProjectContext::new(132.0).typical_span(), 250.0);
        assert_eq!(ProjectContext::new(220.0).typical_span(), 300.0);
        assert_eq!(ProjectContext::new(400.0).typical_span(), 400.0);
        assert_eq!(ProjectContext::new(765.0).typical_span(), 450.0);
        assert_eq!(ProjectContext::new(900.0).typical_span(), 500.0);
    }

    #[test]
    fn test_anchor_capability() {
        assert!(!TowerType::Suspension.is_anchor());
        assert!(TowerType::Tension.is_anchor());
        assert!(TowerType::DeadEnd.is_anchor());
        assert!(TowerType::Angle.is_anchor());
    }
}
