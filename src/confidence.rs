//! Confidence scoring
//!
//! Honest estimates carry a confidence score. The score starts at 100 and
//! is reduced for every documented assumption; each reduction is reported
//! verbatim as a driver string. Without survey-grade terrain and
//! geotechnical inputs the score is capped at 85, and it never drops below
//! 50.

use crate::project::{ProjectContext, SoilCategory, TerrainType};
use crate::result::ConfidenceReport;

/// Data provenance flags feeding the score
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceInputs {
    /// A detailed terrain profile was supplied (vs derived from route points)
    pub has_terrain_profile: bool,
    /// Site soil survey available
    pub has_soil_survey: bool,
    /// Site-specific wind data available
    pub has_wind_data: bool,
    /// Geographic context resolved automatically from the route
    pub location_auto_detected: bool,
    /// Terrain profile resolution (sample count), when provided
    pub terrain_samples: usize,
}

/// Confidence cap without survey-grade inputs
const UNSURVEYED_CAP: i32 = 85;

/// Hard floor
const FLOOR: i32 = 50;

/// Score the run and report every driver
pub fn score(ctx: &ProjectContext, inputs: &ConfidenceInputs) -> ConfidenceReport {
    let mut confidence = 100;
    let mut drivers = Vec::new();

    drivers.push("Structural physics fully validated".to_string());

    if inputs.has_terrain_profile {
        drivers.push("Terrain modeled using detailed elevation profile".to_string());
        if inputs.terrain_samples > 100 {
            drivers.push("High-resolution terrain sampling (>100 points)".to_string());
        } else if inputs.terrain_samples > 50 {
            drivers.push("Medium-resolution terrain sampling (50-100 points)".to_string());
        } else {
            confidence -= 5;
            drivers.push("Low-resolution terrain sampling (<50 points)".to_string());
        }
    } else {
        confidence -= 15;
        drivers.push("Terrain modeled using satellite elevation data".to_string());
    }

    if inputs.has_soil_survey {
        drivers.push("Soil properties from site survey".to_string());
    } else {
        confidence -= 10;
        drivers.push("Soil category assumed from regional norms".to_string());
    }

    if inputs.has_wind_data {
        drivers.push("Wind loads from site-specific data".to_string());
    } else {
        confidence -= 10;
        drivers.push("Wind zone assumed from regional classification".to_string());
    }

    if ctx.terrain == TerrainType::Mountainous {
        confidence -= 5;
        drivers.push("Mountainous terrain increases uncertainty".to_string());
    }

    if ctx.soil == SoilCategory::Soft {
        confidence -= 5;
        drivers.push("Soft soil conditions increase foundation uncertainty".to_string());
    }

    if inputs.location_auto_detected {
        drivers.push("Geographic context derived from route geometry".to_string());
    } else {
        confidence -= 5;
        drivers.push("Location manually specified (may not match route coordinates)".to_string());
    }

    drivers.push(match ctx.row_mode {
        crate::project::RowMode::UrbanPrivate => {
            "ROW model assumed conservative (urban private land)".to_string()
        }
        crate::project::RowMode::GovernmentCorridor => {
            "ROW model assumes government corridor easement".to_string()
        }
        crate::project::RowMode::RuralPrivate => {
            "ROW model assumes rural private land compensation".to_string()
        }
        crate::project::RowMode::Mixed => "ROW model assumes mixed scenario".to_string(),
    });

    drivers.push("Seismic, ice, wildfire treated as advisory (not auto-applied)".to_string());
    drivers.push(
        "Currency inferred from route geography (presentation-only, no FX applied)".to_string(),
    );

    if let Some(mode) = ctx.geo_context.resolution_mode.as_deref() {
        match mode {
            "unresolved" => {
                confidence -= 15;
                drivers
                    .push("Geographic context could not be resolved from coordinates".to_string());
            }
            "map-derived" => {
                drivers.push("Geographic context derived from map reverse geocoding".to_string());
            }
            other => drivers.push(format!("Geographic resolution mode: {}", other)),
        }
    }

    // Foundation costs are classification-based, not detailed design
    confidence -= 10;
    drivers.push("Foundation costs are classification-based (not detailed design)".to_string());

    let survey_grade = inputs.has_terrain_profile && inputs.has_soil_survey;
    if !survey_grade && confidence > UNSURVEYED_CAP {
        confidence = UNSURVEYED_CAP;
        drivers.push(
            "Confidence capped at 85% - requires survey-grade terrain and geotech inputs"
                .to_string(),
        );
    }

    ConfidenceReport {
        score: confidence.max(FLOOR),
        drivers,
    }
}
