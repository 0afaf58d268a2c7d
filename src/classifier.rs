//! Tower type classification from route geometry
//!
//! Assigns each station a structural role from the horizontal deviation
//! angle between its incoming and outgoing spans, measured in a local
//! tangent plane:
//!
//! | Station | Deviation | Type |
//! |---|---|---|
//! | first or last | n/a | dead-end |
//! | interior | < 5° | suspension |
//! | interior | 5°–30° | angle |
//! | interior | ≥ 30° | tension |
//!
//! When the angle cannot be computed (missing coordinates) the station
//! defaults to suspension, the most common role.

use crate::project::TowerType;
use crate::spotter::TowerStation;

/// Deviation thresholds (degrees)
pub const ANGLE_THRESHOLD_DEG: f64 = 5.0;
pub const TENSION_THRESHOLD_DEG: f64 = 30.0;

/// Horizontal deviation angle at the middle of three stations (degrees)
///
/// Vectors to the previous and next stations are formed in a local tangent
/// plane (longitude scaled by cos of the local latitude); the deviation is
/// 180° minus the angle between them, i.e. how far the route turns here.
pub fn deviation_angle(
    prev: &TowerStation,
    current: &TowerStation,
    next: &TowerStation,
) -> Option<f64> {
    let (lat_p, lon_p) = (prev.lat?, prev.lon?);
    let (lat_c, lon_c) = (current.lat?, current.lon?);
    let (lat_n, lon_n) = (next.lat?, next.lon?);

    let scale = lat_c.to_radians().cos();

    let (dx1, dy1) = ((lon_p - lon_c) * scale, lat_p - lat_c);
    let (dx2, dy2) = ((lon_n - lon_c) * scale, lat_n - lat_c);

    let m1 = (dx1 * dx1 + dy1 * dy1).sqrt();
    let m2 = (dx2 * dx2 + dy2 * dy2).sqrt();
    if m1 == 0.0 || m2 == 0.0 {
        return None;
    }

    let cos_angle = ((dx1 * dx2 + dy1 * dy2) / (m1 * m2)).clamp(-1.0, 1.0);
    let angle_deg = cos_angle.acos().to_degrees();

    Some(180.0 - angle_deg)
}

/// Classify one station by its position and deviation angle
pub fn classify(
    index: usize,
    total: usize,
    deviation_deg: Option<f64>,
) -> (TowerType, String) {
    if index == 0 || index + 1 == total {
        return (TowerType::DeadEnd, "First or last tower (dead-end)".to_string());
    }

    let Some(angle) = deviation_deg else {
        return (
            TowerType::Suspension,
            "Angle cannot be computed (default to suspension)".to_string(),
        );
    };

    let abs_angle = angle.abs();
    if abs_angle < ANGLE_THRESHOLD_DEG {
        (
            TowerType::Suspension,
            format!("Deviation angle {:.1}\u{b0} < 5\u{b0} (straight line)", abs_angle),
        )
    } else if abs_angle < TENSION_THRESHOLD_DEG {
        (
            TowerType::Angle,
            format!("Deviation angle {:.1}\u{b0} between 5\u{b0} and 30\u{b0}", abs_angle),
        )
    } else {
        (
            TowerType::Tension,
            format!("Deviation angle {:.1}\u{b0} >= 30\u{b0} (sharp turn)", abs_angle),
        )
    }
}

/// Tag every station in a placed sequence with its type and reason
pub fn classify_stations(stations: &mut [TowerStation]) {
    let total = stations.len();

    for i in 0..total {
        let angle = if i > 0 && i + 1 < total {
            deviation_angle(&stations[i - 1], &stations[i], &stations[i + 1])
        } else {
            None
        };

        let (tower_type, reason) = classify(i, total, angle);
        stations[i].tower_type = Some(tower_type);
        stations[i].deviation_angle = angle;
        stations[i].design_reason = Some(reason);
    }
}
