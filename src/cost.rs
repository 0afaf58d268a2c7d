//! Tower and line cost model
//!
//! Deterministic cost of a feasible geometry. This is a decision-support
//! cost model, not a contract bill of quantities: it exists so the sizer can
//! compare candidate geometries and the aggregator can report line totals.
//!
//! Components per tower:
//!
//! - **Steel**: empirical lattice weight `k × H × B × type multiplier`,
//!   with an ice-load bonus, priced at the regional rate per tonne
//! - **Foundation**: concrete for four footings at the soil-adjusted rate,
//!   plus excavation
//! - **Erection + transport**: a fraction of the steel cost scaled by
//!   terrain, labour and logistics factors
//! - **Land**: the tower footprint at the right-of-way land rate
//!
//! The optimisation objective is the cost per kilometre of line,
//! `per_tower × (1000 / span) + corridor_per_km`; minimising bare per-tower
//! cost would reward short, cheap towers at ruinous line cost.
//!
//! An infeasible geometry costs [`INFEASIBLE_COST`]; the sentinel dominates
//! any realistic cost by several orders of magnitude.

use crate::project::{ProjectContext, TowerGeometry};
use crate::rates::MarketRates;
use serde::{Deserialize, Serialize};

/// Sentinel cost for infeasible geometries
pub const INFEASIBLE_COST: f64 = 1e10;

/// Empirical lattice steel factor (tonnes per m² of height × base width)
const LATTICE_FACTOR: f64 = 0.035;

/// Ice accretion steel bonus
const ICE_BONUS: f64 = 0.35;

/// Excavation rate (USD per m³)
const EXCAVATION_RATE_USD: f64 = 10.0;

/// Erection base cost as a fraction of steel cost
const ERECTION_STEEL_FRACTION: f64 = 0.10;

/// Transport as a fraction of erection cost
const TRANSPORT_ERECTION_FRACTION: f64 = 0.2;

/// Cleared footprint margin around the tower base
const FOOTPRINT_MARGIN: f64 = 1.5;

/// Per-tower cost components (USD)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TowerCost {
    #[serde(rename = "steelCost")]
    pub steel_cost: f64,

    #[serde(rename = "foundationCost")]
    pub foundation_cost: f64,

    #[serde(rename = "erectionCost")]
    pub erection_cost: f64,

    #[serde(rename = "transportCost")]
    pub transport_cost: f64,

    #[serde(rename = "landCost")]
    pub land_cost: f64,

    #[serde(rename = "totalCost")]
    pub total_cost: f64,
}

/// Steel weight for a geometry (tonnes)
///
/// `k × H × B × type multiplier`, times the ice bonus when the ice-load
/// scenario is active.
pub fn steel_weight_tonnes(geometry: &TowerGeometry, ctx: &ProjectContext) -> f64 {
    let mut tonnes = LATTICE_FACTOR
        * geometry.total_height
        * geometry.base_width
        * geometry.tower_type.steel_multiplier();

    if ctx.flags.include_ice_load {
        tonnes *= 1.0 + ICE_BONUS;
    }

    tonnes
}

/// Per-tower cost breakdown at the given market rates
pub fn tower_cost(geometry: &TowerGeometry, ctx: &ProjectContext, rates: &MarketRates) -> TowerCost {
    let steel_cost = steel_weight_tonnes(geometry, ctx) * rates.steel_price_usd;

    let volume = geometry.concrete_volume();
    let foundation_cost = volume * rates.concrete_price_usd * ctx.soil.concrete_factor()
        + EXCAVATION_RATE_USD * volume;

    let erection_cost = ERECTION_STEEL_FRACTION
        * steel_cost
        * ctx.terrain.erection_factor()
        * rates.labor_factor
        * rates.logistics_factor;

    let transport_cost = TRANSPORT_ERECTION_FRACTION * erection_cost;

    let footprint = (FOOTPRINT_MARGIN * geometry.base_width).powi(2);
    let land_cost = footprint * ctx.row_mode.land_rate();

    let total_cost = steel_cost + foundation_cost + erection_cost + transport_cost + land_cost;

    TowerCost {
        steel_cost,
        foundation_cost,
        erection_cost,
        transport_cost,
        land_cost,
        total_cost,
    }
}

/// Right-of-way corridor cost per line kilometre (USD/km)
pub fn corridor_cost_per_km(ctx: &ProjectContext) -> f64 {
    ctx.corridor_width() * ctx.row_mode.land_rate() * 1000.0
}

/// The optimisation objective: cost per kilometre of line (USD/km)
pub fn cost_per_km(per_tower_cost: f64, geometry: &TowerGeometry, ctx: &ProjectContext) -> f64 {
    let towers_per_km = 1000.0 / geometry.span_length;
    per_tower_cost * towers_per_km + corridor_cost_per_km(ctx)
}

/// Cost of a candidate, honouring the safety verdict
///
/// Unsafe candidates cost the sentinel so they can never win a comparison
/// against a feasible design.
pub fn evaluate(
    geometry: &TowerGeometry,
    ctx: &ProjectContext,
    rates: &MarketRates,
    safe: bool,
) -> (f64, TowerCost) {
    if !safe {
        return (
            INFEASIBLE_COST,
            TowerCost {
                total_cost: INFEASIBLE_COST,
                ..TowerCost::default()
            },
        );
    }

    let breakdown = tower_cost(geometry, ctx, rates);
    (breakdown.total_cost, breakdown)
}
