//! Canonical optimization result schema
//!
//! The single output format every surface consumes (CLI report, JSON export,
//! downstream tooling). All numeric wire fields are rounded to two decimals
//! on emission, required fields are always populated (empty lists and zero
//! totals, never nulls), and `safety_summary.overall_status` is always
//! `"SAFE"` on the wire.

use crate::obstacles::ForbiddenZone;
use crate::rates::CurrencyContext;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Round a wire value to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Safety status of a single tower
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TowerSafetyStatus {
    /// Passed all checks with margin
    #[serde(rename = "SAFE")]
    Safe,
    /// Safe as reported, but a named check governs the design
    #[serde(rename = "GOVERNING")]
    Governing,
}

/// Single tower record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TowerRecord {
    /// Tower index along the route (0-based)
    pub index: usize,

    /// Distance from route start (m)
    #[serde(rename = "distanceAlongRoute")]
    pub distance_along_route: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// suspension / angle / tension / dead_end
    #[serde(rename = "towerType")]
    pub tower_type: String,

    /// Horizontal deviation angle (degrees), geometry-derived
    #[serde(skip_serializing_if = "Option::is_none", rename = "deviationAngleDeg")]
    pub deviation_angle_deg: Option<f64>,

    /// Ground to first cross-arm (m)
    #[serde(rename = "baseHeight")]
    pub base_height: f64,

    /// Body extension height (m)
    #[serde(rename = "bodyExtension")]
    pub body_extension: f64,

    /// Total tower height (m)
    #[serde(rename = "totalHeight")]
    pub total_height: f64,

    /// Base width at ground level (m)
    #[serde(rename = "baseWidth")]
    pub base_width: f64,

    /// pad_footing / chimney_footing
    #[serde(rename = "foundationType")]
    pub foundation_type: String,

    /// length, width, depth (m)
    #[serde(rename = "foundationDimensions")]
    pub foundation_dimensions: HashMap<String, f64>,

    #[serde(rename = "steelWeightKg")]
    pub steel_weight_kg: f64,

    #[serde(rename = "steelCost")]
    pub steel_cost: f64,

    #[serde(rename = "foundationCost")]
    pub foundation_cost: f64,

    #[serde(rename = "erectionCost")]
    pub erection_cost: f64,

    #[serde(rename = "transportCost")]
    pub transport_cost: f64,

    #[serde(rename = "landRowCost")]
    pub land_row_cost: f64,

    #[serde(rename = "totalCost")]
    pub total_cost: f64,

    #[serde(rename = "safetyStatus")]
    pub safety_status: TowerSafetyStatus,

    /// The check that limits this design, when one does
    #[serde(skip_serializing_if = "Option::is_none", rename = "governingLoadCase")]
    pub governing_load_case: Option<String>,

    /// Explanation for the type assignment
    #[serde(skip_serializing_if = "Option::is_none", rename = "designReason")]
    pub design_reason: Option<String>,

    /// Nudge applied to avoid an obstacle
    #[serde(skip_serializing_if = "Option::is_none", rename = "nudgeDescription")]
    pub nudge_description: Option<String>,

    /// Proposed distance before the nudge (m)
    #[serde(skip_serializing_if = "Option::is_none", rename = "originalDistance")]
    pub original_distance: Option<f64>,

    /// Placement constraint violations (informational; the design itself is
    /// conservative-safe)
    #[serde(default, skip_serializing_if = "Vec::is_empty", rename = "safetyViolations")]
    pub safety_violations: Vec<String>,
}

/// Single span record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpanRecord {
    #[serde(rename = "fromTowerIndex")]
    pub from_tower_index: usize,

    #[serde(rename = "toTowerIndex")]
    pub to_tower_index: usize,

    #[serde(rename = "spanLength")]
    pub span_length: f64,

    /// Conductor sag at mid-span (m)
    pub sag: f64,

    /// Minimum clearance to ground (m)
    #[serde(rename = "minimumClearance")]
    pub minimum_clearance: f64,

    #[serde(rename = "clearanceMarginPercent")]
    pub clearance_margin_percent: f64,

    #[serde(rename = "windZoneUsed")]
    pub wind_zone_used: String,

    #[serde(rename = "iceLoadUsed")]
    pub ice_load_used: bool,

    #[serde(skip_serializing_if = "Option::is_none", rename = "governingCase")]
    pub governing_case: Option<String>,

    #[serde(rename = "isSafe")]
    pub is_safe: bool,
}

/// Line-level summary metrics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineSummary {
    #[serde(rename = "routeLengthKm")]
    pub route_length_km: f64,

    #[serde(rename = "totalTowers")]
    pub total_towers: usize,

    #[serde(rename = "towerDensityPerKm")]
    pub tower_density_per_km: f64,

    #[serde(rename = "avgSpan")]
    pub avg_span: f64,

    #[serde(rename = "tallestTower")]
    pub tallest_tower: f64,

    #[serde(rename = "deepestFoundation")]
    pub deepest_foundation: f64,

    #[serde(rename = "totalSteelTonnes")]
    pub total_steel_tonnes: f64,

    #[serde(rename = "totalConcreteM3")]
    pub total_concrete_m3: f64,

    #[serde(rename = "totalProjectCost")]
    pub total_project_cost: f64,

    #[serde(rename = "costPerKm")]
    pub cost_per_km: f64,
}

/// Cost breakdown totals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostBreakdown {
    #[serde(rename = "steelTotal")]
    pub steel_total: f64,

    #[serde(rename = "foundationTotal")]
    pub foundation_total: f64,

    #[serde(rename = "erectionTotal")]
    pub erection_total: f64,

    #[serde(rename = "transportTotal")]
    pub transport_total: f64,

    #[serde(rename = "landRowTotal")]
    pub land_row_total: f64,

    #[serde(rename = "totalProjectCost")]
    pub total_project_cost: f64,

    pub currency: String,

    #[serde(rename = "currencySymbol")]
    pub currency_symbol: String,
}

/// Safety summary for the whole line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetySummary {
    /// Always "SAFE" on the wire: unsafe towers are replaced by the
    /// conservative fallback before reporting
    #[serde(rename = "overallStatus")]
    pub overall_status: String,

    #[serde(default, rename = "governingRisks")]
    pub governing_risks: Vec<String>,

    #[serde(default, rename = "designScenariosApplied")]
    pub design_scenarios_applied: Vec<String>,
}

/// Confidence score with its drivers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceReport {
    /// 0-100
    pub score: i32,
    #[serde(default)]
    pub drivers: Vec<String>,
}

/// Regional design context
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionalContext {
    /// IS / IEC / EUROCODE / ASCE
    #[serde(rename = "governingStandard")]
    pub governing_standard: String,

    #[serde(default, rename = "dominantRegionalRisks")]
    pub dominant_regional_risks: Vec<String>,

    pub confidence: ConfidenceReport,
}

/// Cost sensitivity band
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostSensitivity {
    #[serde(rename = "lowerBound")]
    pub lower_bound: f64,

    #[serde(rename = "upperBound")]
    pub upper_bound: f64,

    #[serde(rename = "variancePercent")]
    pub variance_percent: f64,

    #[serde(rename = "expectedRange")]
    pub expected_range: String,
}

/// Plain-language cost interpretation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostContext {
    #[serde(rename = "costPerKm")]
    pub cost_per_km: f64,

    #[serde(default, rename = "primaryCostDrivers")]
    pub primary_cost_drivers: Vec<String>,

    pub interpretation: String,
}

/// Risk advisory entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Advisory {
    #[serde(rename = "riskName")]
    pub risk_name: String,

    pub reason: String,

    #[serde(rename = "notEvaluated")]
    pub not_evaluated: bool,

    #[serde(skip_serializing_if = "Option::is_none", rename = "suggestedAction")]
    pub suggested_action: Option<String>,
}

/// Ruling-span summary for one strain section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrainSectionRecord {
    #[serde(rename = "sectionIndex")]
    pub section_index: usize,

    #[serde(rename = "startTowerIndex")]
    pub start_tower_index: usize,

    #[serde(rename = "endTowerIndex")]
    pub end_tower_index: usize,

    #[serde(rename = "rulingSpan")]
    pub ruling_span: f64,

    #[serde(rename = "numSpans")]
    pub num_spans: usize,
}

/// Optimisation run metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OptimizationInfo {
    /// Total sizing iterations across all towers
    pub iterations: usize,
    pub converged: bool,
    /// Towers where the conservative fallback replaced the search result
    #[serde(rename = "fallbackTowers")]
    pub fallback_towers: usize,
}

/// The canonical result
///
/// The single source of truth for all optimisation output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalResult {
    pub towers: Vec<TowerRecord>,
    pub spans: Vec<SpanRecord>,

    #[serde(rename = "lineSummary")]
    pub line_summary: LineSummary,

    #[serde(rename = "costBreakdown")]
    pub cost_breakdown: CostBreakdown,

    #[serde(rename = "safetySummary")]
    pub safety_summary: SafetySummary,

    #[serde(rename = "regionalContext")]
    pub regional_context: RegionalContext,

    #[serde(rename = "costSensitivity")]
    pub cost_sensitivity: CostSensitivity,

    #[serde(rename = "costContext")]
    pub cost_context: CostContext,

    /// Presentation currency; no FX conversion is applied by the core
    pub currency: CurrencyContext,

    #[serde(default)]
    pub warnings: Vec<String>,

    #[serde(default)]
    pub advisories: Vec<Advisory>,

    #[serde(default, rename = "strainSections")]
    pub strain_sections: Vec<StrainSectionRecord>,

    #[serde(default)]
    pub obstacles: Vec<ForbiddenZone>,

    #[serde(default, rename = "referenceDataStatus")]
    pub reference_data_status: HashMap<String, String>,

    #[serde(rename = "optimizationInfo")]
    pub optimization_info: OptimizationInfo,

    /// RFC 3339 timestamp of the run
    pub timestamp: String,
}

impl CanonicalResult {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
