//! Conductor sag, electrical clearance and ruling span
//!
//! The shared physical model consulted by both the tower spotter and the
//! per-tower sizer.
//!
//! ## Key equations
//!
//! Mid-span sag (parabolic approximation of the catenary):
//!
//! - S = w × L² / (8 × T)
//!
//! Where:
//! - S = sag at mid-span (m)
//! - w = conductor running weight (N/m)
//! - L = span length (m)
//! - T = horizontal tension (N)
//!
//! Ruling span for a strain section:
//!
//! - Sr = √(Σ Lᵢ³ / Σ Lᵢ)
//!
//! The ruling span is an approximation for tension sizing advisories; full
//! multi-span cable equilibrium (broken-wire redistribution) is not solved.

use crate::codes::DesignStandard;
use crate::obstacles::{ForbiddenZone, ZoneKind};

/// Default conductor weight (kg/m), typical ACSR
pub const DEFAULT_CONDUCTOR_WEIGHT_KG_PER_M: f64 = 1.5;

/// Default horizontal conductor tension (kN)
pub const DEFAULT_TENSION_KN: f64 = 50.0;

/// Default minimum mid-span ground clearance margin (m)
pub const DEFAULT_CLEARANCE_MARGIN_M: f64 = 10.0;

const GRAVITY: f64 = 9.81;

/// Conductor sag calculator
///
/// Parameterised on running weight and tension; defaults match a typical
/// ACSR conductor strung at 50 kN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SagModel {
    /// Conductor weight (kg/m)
    pub weight_kg_per_m: f64,
    /// Horizontal tension (kN)
    pub tension_kn: f64,
}

impl Default for SagModel {
    fn default() -> Self {
        Self {
            weight_kg_per_m: DEFAULT_CONDUCTOR_WEIGHT_KG_PER_M,
            tension_kn: DEFAULT_TENSION_KN,
        }
    }
}

impl SagModel {
    pub fn new(weight_kg_per_m: f64, tension_kn: f64) -> Self {
        Self {
            weight_kg_per_m,
            tension_kn,
        }
    }

    /// Mid-span sag for a span of `span_length` metres
    ///
    /// S = w·L²/(8·T) with w in N/m and T in N.
    pub fn sag(&self, span_length: f64) -> f64 {
        let weight_n_per_m = self.weight_kg_per_m * GRAVITY;
        let tension_n = self.tension_kn * 1000.0;
        (weight_n_per_m * span_length * span_length) / (8.0 * tension_n)
    }

    /// Ground clearance at mid-span (m)
    ///
    /// The conductor's lowest point is taken at the average of the two tower
    /// top elevations minus the sag.
    pub fn midspan_clearance(
        &self,
        span_length: f64,
        top_elev_from: f64,
        top_elev_to: f64,
        ground_elev_midspan: f64,
    ) -> f64 {
        let conductor_low = (top_elev_from + top_elev_to) / 2.0 - self.sag(span_length);
        conductor_low - ground_elev_midspan
    }
}

/// Conservative sag allowance for code clearance checks (m)
///
/// A lookup over voltage and span brackets standing in for maximum sag under
/// worst-case conditions (high temperature, ice, wind deflection). Voltage
/// brackets: ≤132, ≤220, ≤400, ≤765 and above; span brackets: ≤300, ≤400,
/// ≤450 and above.
pub fn sag_allowance(voltage_kv: f64, span_length: f64) -> f64 {
    if voltage_kv <= 132.0 {
        if span_length <= 300.0 {
            6.0
        } else if span_length <= 400.0 {
            7.0
        } else {
            8.0
        }
    } else if voltage_kv <= 220.0 {
        if span_length <= 300.0 {
            7.0
        } else if span_length <= 400.0 {
            8.5
        } else {
            10.0
        }
    } else if voltage_kv <= 400.0 {
        if span_length <= 300.0 {
            8.0
        } else if span_length <= 400.0 {
            9.5
        } else {
            11.0
        }
    } else if voltage_kv <= 765.0 {
        if span_length <= 400.0 {
            10.0
        } else if span_length <= 450.0 {
            11.5
        } else {
            13.0
        }
    } else {
        if span_length <= 400.0 {
            11.0
        } else if span_length <= 450.0 {
            12.5
        } else {
            14.5
        }
    }
}

/// Required ground clearance by voltage level (m)
pub fn required_clearance(voltage_kv: f64) -> f64 {
    if voltage_kv >= 900.0 {
        12.5
    } else if voltage_kv >= 765.0 {
        11.0
    } else if voltage_kv >= 400.0 {
        8.5
    } else if voltage_kv >= 220.0 {
        7.0
    } else {
        6.1
    }
}

/// Context-aware clearance resolver
///
/// Voltage-indexed clearance requirements that adapt to the governing
/// standard and to the obstacle being crossed. Voltages snap to the next
/// tier (132 / 220 / 400 kV); above 400 kV an extra 0.01 m per kV is added.
#[derive(Debug, Clone)]
pub struct ClearanceResolver {
    standard: DesignStandard,
    voltage_kv: f64,
    tier: usize,
}

impl ClearanceResolver {
    const TIERS: [f64; 3] = [132.0, 220.0, 400.0];

    pub fn new(standard: DesignStandard, voltage_kv: f64) -> Self {
        let tier = if voltage_kv <= 132.0 {
            0
        } else if voltage_kv <= 220.0 {
            1
        } else {
            2
        };
        Self {
            standard,
            voltage_kv,
            tier,
        }
    }

    /// Clearance table row for this standard and voltage tier
    ///
    /// Columns: default, road, railway, river, power line (m).
    fn table_row(&self) -> [f64; 5] {
        match self.standard {
            DesignStandard::Is => [
                [6.1, 6.1, 14.6, 6.1, 2.75],
                [7.0, 7.0, 15.4, 7.0, 4.6],
                [8.84, 8.84, 17.9, 8.84, 6.5],
            ][self.tier],
            DesignStandard::Asce => [
                [5.6, 6.7, 9.5, 5.2, 2.5],
                [6.1, 7.5, 10.5, 5.5, 3.5],
                [8.0, 9.5, 12.5, 7.5, 5.5],
            ][self.tier],
            DesignStandard::Eurocode => [
                [6.0, 7.0, 7.0, 6.0, 2.0],
                [7.0, 8.0, 8.0, 7.0, 3.0],
                [8.0, 9.0, 9.0, 8.0, 4.0],
            ][self.tier],
            DesignStandard::Iec => [
                [6.0, 7.0, 8.0, 6.0, 3.0],
                [7.0, 8.0, 9.0, 7.0, 4.0],
                [8.5, 9.5, 10.5, 8.5, 5.0],
            ][self.tier],
        }
    }

    /// Table column for a zone kind: default, road, railway, river, power
    /// line. Railway and power-line crossings come from dedicated overlay
    /// sources; the map kinds here cover roads and water.
    fn crossing_column(zone: &ForbiddenZone) -> usize {
        match zone.kind {
            ZoneKind::Highway => 1,
            ZoneKind::Waterway | ZoneKind::Water | ZoneKind::Wetland => 3,
            ZoneKind::SteepSlope => 0,
        }
    }

    /// Required clearance at a distance along the route (m)
    ///
    /// Starts at the standard's default for the voltage tier; when the
    /// distance lies inside one of the supplied zones the obstacle-specific
    /// requirement supersedes by maximum.
    pub fn required_at(&self, distance: f64, zones: &[ForbiddenZone]) -> f64 {
        let row = self.table_row();
        let mut req = row[0];

        for zone in zones {
            if zone.start_distance <= distance && distance <= zone.end_distance {
                req = req.max(row[Self::crossing_column(zone)]);
            }
        }

        if self.voltage_kv > Self::TIERS[2] {
            req += (self.voltage_kv - Self::TIERS[2]) * 0.01;
        }

        req
    }
}

/// Equivalent ruling span for a strain section (m)
///
/// Sr = √(ΣLᵢ³ / ΣLᵢ). A single span is its own ruling span; an empty
/// section rules at 0.
pub fn ruling_span(span_lengths: &[f64]) -> f64 {
    if span_lengths.is_empty() {
        return 0.0;
    }
    if span_lengths.len() == 1 {
        return span_lengths[0];
    }

    let sum_l3: f64 = span_lengths.iter().map(|l| l * l * l).sum();
    let sum_l: f64 = span_lengths.iter().sum();
    if sum_l == 0.0 {
        return 0.0;
    }

    (sum_l3 / sum_l).sqrt()
}

/// A strain section: a run of spans between consecutive anchor-capable
/// towers (dead-end, tension, angle) or route endpoints. The whole section
/// shares one tensioning regime, summarised by its ruling span.
#[derive(Debug, Clone, PartialEq)]
pub struct StrainSection {
    pub start_tower_index: usize,
    pub end_tower_index: usize,
    pub span_lengths: Vec<f64>,
    pub ruling_span: f64,
}

/// Group spans into strain sections
///
/// `tower_types[i]` is the type of tower `i`; `span_lengths[i]` is the span
/// from tower `i` to `i+1`. Sections are cut at every anchor-capable tower;
/// the first and last towers always bound a section regardless of type.
pub fn strain_sections(
    tower_types: &[crate::project::TowerType],
    span_lengths: &[f64],
) -> Vec<StrainSection> {
    if tower_types.len() < 2 || span_lengths.len() + 1 != tower_types.len() {
        return Vec::new();
    }

    let mut sections = Vec::new();
    let mut section_start = 0;

    for i in 1..tower_types.len() {
        let is_boundary = i == tower_types.len() - 1 || tower_types[i].is_anchor();
        if is_boundary {
            let spans: Vec<f64> = span_lengths[section_start..i].to_vec();
            sections.push(StrainSection {
                start_tower_index: section_start,
                end_tower_index: i,
                ruling_span: ruling_span(&spans),
                span_lengths: spans,
            });
            section_start = i;
        }
    }

    sections
}

/// Advisory when a ruling span falls outside the typical range for the
/// voltage level. Returns `None` inside the range.
pub fn ruling_span_advisory(ruling_span_m: f64, voltage_kv: f64) -> Option<String> {
    let (min_typical, max_typical, tier) = if voltage_kv >= 900.0 {
        (500.0, 600.0, 900)
    } else if voltage_kv >= 765.0 {
        (450.0, 550.0, 765)
    } else if voltage_kv >= 400.0 {
        (400.0, 500.0, 400)
    } else if voltage_kv >= 220.0 {
        (350.0, 450.0, 220)
    } else {
        (300.0, 400.0, 132)
    };

    if ruling_span_m < min_typical {
        Some(format!(
            "Ruling span ({:.0} m) is below the typical range ({:.0}-{:.0} m) for {} kV. \
             Consider longer spans to reduce tower count.",
            ruling_span_m, min_typical, max_typical, tier
        ))
    } else if ruling_span_m > max_typical {
        Some(format!(
            "Ruling span ({:.0} m) exceeds the typical range ({:.0}-{:.0} m) for {} kV. \
             Verify conductor tension and sag limits.",
            ruling_span_m, min_typical, max_typical, tier
        ))
    } else {
        None
    }
}
