//! Section-based tower placement with anchor corners
//!
//! The preferred placement algorithm when the route carries coordinates.
//! Four phases:
//!
//! 1. **Corner merge**: drop route vertices whose incoming segment is
//!    shorter than 50 m
//! 2. **Section definition**: consecutive surviving corners become section
//!    boundaries; section length is the haversine distance between them
//! 3. **Span optimisation**: interior sections minimise tower count
//!    (`N = ⌈L/max⌉`, reduced by one when that still keeps `L/N ≥ min`);
//!    the first and last sections attempt a 150 m smart slack terminal span
//! 4. **Precise placement**: anchors exactly on section corners,
//!    intermediates at the chosen cumulative distances with an optional
//!    seeded ±10 % jitter that preserves the section total
//!
//! After placement every station passes through the obstacle map's
//! safe-spot search (see `spotter::apply_nudges`).

use crate::route::{haversine, Route, TerrainProfile};
use crate::spotter::{PlacementRole, TowerStation};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Vertices closer than this merge into one corner (m)
pub const CORNER_MERGE_THRESHOLD_M: f64 = 50.0;

/// Terminal span reserved by the smart slack rule (m)
pub const SLACK_SPAN_M: f64 = 150.0;

/// Jitter band applied to intermediate spans (fraction)
const JITTER_FRACTION: f64 = 0.10;

/// A surviving corner after the merge phase
#[derive(Debug, Clone)]
struct RouteCorner {
    lat: f64,
    lon: f64,
    distance: f64,
}

/// A logical section between two corners
#[derive(Debug, Clone)]
struct RouteSection {
    start: RouteCorner,
    end: RouteCorner,
    length: f64,
    is_first: bool,
    is_last: bool,
}

/// Span plan for one section
#[derive(Debug, Clone, PartialEq)]
struct SpanPlan {
    num_spans: usize,
    uniform_span: f64,
    /// Smart slack terminal: (slack span, inner span)
    slack: Option<(f64, f64)>,
}

/// Section-based placer
pub struct SectionPlacer<'a> {
    route: &'a Route,
    profile: &'a TerrainProfile,
    min_span: f64,
    max_span: f64,
    jitter_seed: Option<u64>,
}

impl<'a> SectionPlacer<'a> {
    pub fn new(
        route: &'a Route,
        profile: &'a TerrainProfile,
        min_span: f64,
        max_span: f64,
        jitter_seed: Option<u64>,
    ) -> Self {
        Self {
            route,
            profile,
            min_span,
            max_span,
            jitter_seed,
        }
    }

    /// Run all four phases and return the placed stations
    pub fn place_towers(&self) -> Result<Vec<TowerStation>, String> {
        let corners = self.merge_corners()?;
        let sections = define_sections(&corners);
        if sections.is_empty() {
            return Err("Route collapsed to fewer than two corners".to_string());
        }

        let mut rng = self.jitter_seed.map(ChaCha8Rng::seed_from_u64);
        let mut stations: Vec<TowerStation> = Vec::new();

        for section in &sections {
            let plan = plan_spans(section, self.min_span, self.max_span);
            self.place_section(section, &plan, &mut stations, &mut rng);
        }

        Ok(stations)
    }

    /// Phase 1: drop vertices whose incoming segment is under the threshold
    fn merge_corners(&self) -> Result<Vec<RouteCorner>, String> {
        let points = &self.route.points;
        if points.len() < 2 {
            return Err("Route needs at least two points".to_string());
        }

        let coord = |i: usize| -> Result<(f64, f64), String> {
            match (points[i].lat, points[i].lon) {
                (Some(lat), Some(lon)) => Ok((lat, lon)),
                _ => Err("Section placement requires coordinates on every route point".to_string()),
            }
        };

        let (lat0, lon0) = coord(0)?;
        let mut merged = vec![RouteCorner {
            lat: lat0,
            lon: lon0,
            distance: 0.0,
        }];

        let mut cumulative = 0.0;
        for i in 1..points.len() {
            let (prev_lat, prev_lon) = coord(i - 1)?;
            let (lat, lon) = coord(i)?;
            let segment = haversine(prev_lat, prev_lon, lat, lon);
            cumulative += segment;

            if segment < CORNER_MERGE_THRESHOLD_M && i != points.len() - 1 {
                continue;
            }

            merged.push(RouteCorner {
                lat,
                lon,
                distance: cumulative,
            });
        }

        Ok(merged)
    }

    /// Phases 3+4 for one section
    fn place_section(
        &self,
        section: &RouteSection,
        plan: &SpanPlan,
        stations: &mut Vec<TowerStation>,
        rng: &mut Option<ChaCha8Rng>,
    ) {
        // Anchor at the section start; for non-first sections the previous
        // section already placed it as its end corner
        if section.is_first {
            stations.push(self.station_at(0, section.start.distance, PlacementRole::Anchor, None));
        }

        let spans = expand_spans(section, plan, rng);

        let mut cumulative = section.start.distance;
        for (i, span) in spans.iter().enumerate() {
            cumulative += span;
            let is_section_end = i == spans.len() - 1;

            let (role, distance) = if is_section_end {
                // Land exactly on the corner regardless of jitter residue
                (PlacementRole::Anchor, section.end.distance)
            } else {
                (PlacementRole::Suspension, cumulative)
            };

            let span_used = distance - stations.last().map(|s| s.distance).unwrap_or(0.0);
            let reason = if plan.slack.is_some() {
                format!("smart slack section split ({:.1} m)", span_used)
            } else {
                format!("uniform section split ({:.1} m)", span_used)
            };

            let mut station = self.station_at(stations.len(), distance, role, Some(span_used));
            station.selection_reason = Some(reason);
            stations.push(station);
        }
    }

    fn station_at(
        &self,
        index: usize,
        distance: f64,
        role: PlacementRole,
        span: Option<f64>,
    ) -> TowerStation {
        let mut station = TowerStation::at(index, distance, self.profile.elevation_at(distance));
        if let Some((lat, lon)) = self
            .route
            .walk(distance)
            .or_else(|| self.profile.coordinates_at(distance))
        {
            station.lat = Some(lat);
            station.lon = Some(lon);
        }
        station.placement_role = Some(role);
        station.selected_span = span;
        station
    }
}

/// Phase 2: consecutive corners become sections
fn define_sections(corners: &[RouteCorner]) -> Vec<RouteSection> {
    let mut sections = Vec::new();
    for i in 0..corners.len().saturating_sub(1) {
        let start = corners[i].clone();
        let end = corners[i + 1].clone();
        let length = haversine(start.lat, start.lon, end.lat, end.lon);
        sections.push(RouteSection {
            start,
            end,
            length,
            is_first: i == 0,
            is_last: i + 2 == corners.len(),
        });
    }
    sections
}

/// Phase 3: span plan for a section
///
/// Interior sections minimise tower count. Terminal sections attempt the
/// smart slack split: reserve a 150 m span at the line end and spread the
/// remainder over the other N−1 spans, provided the resulting inner span
/// stays inside the allowed window; otherwise fall back to the uniform
/// split.
fn plan_spans(section: &RouteSection, min_span: f64, max_span: f64) -> SpanPlan {
    let length = section.length;

    if section.is_first || section.is_last {
        let n = (length / max_span).ceil().max(1.0) as usize;

        if n > 1 {
            let remaining = length - SLACK_SPAN_M;
            if remaining > 0.0 {
                let inner = remaining / (n - 1) as f64;
                if (min_span..=max_span).contains(&inner) {
                    return SpanPlan {
                        num_spans: n,
                        uniform_span: length / n as f64,
                        slack: Some((SLACK_SPAN_M, inner)),
                    };
                }
            }
        }

        return uniform_plan(length, min_span, max_span);
    }

    uniform_plan(length, min_span, max_span)
}

/// Minimum-tower uniform split
fn uniform_plan(length: f64, min_span: f64, max_span: f64) -> SpanPlan {
    let mut num_spans = (length / max_span).ceil().max(1.0) as usize;
    let mut span = length / num_spans as f64;

    if span < min_span && num_spans > 1 {
        num_spans -= 1;
        span = length / num_spans as f64;
    }

    SpanPlan {
        num_spans,
        uniform_span: span,
        slack: None,
    }
}

/// Phase 4 span expansion: the ordered span lengths for a section
///
/// Smart slack puts the 150 m span at the line end: first in the first
/// section, last in the last section. Uniform splits get an optional ±10 %
/// jitter, bounded so each intermediate span stays in place and the section
/// total is preserved (the closing span absorbs the residue, the final
/// station lands exactly on the corner).
fn expand_spans(
    section: &RouteSection,
    plan: &SpanPlan,
    rng: &mut Option<ChaCha8Rng>,
) -> Vec<f64> {
    if let Some((slack, inner)) = plan.slack {
        let mut spans = vec![inner; plan.num_spans - 1];
        if section.is_first {
            spans.insert(0, slack);
        } else {
            spans.push(slack);
        }
        return spans;
    }

    let mut spans = vec![plan.uniform_span; plan.num_spans];

    if let Some(rng) = rng.as_mut() {
        let mut remaining = section.length;
        for i in 0..plan.num_spans {
            let spans_left = plan.num_spans - i;
            if spans_left == 1 {
                spans[i] = remaining;
                break;
            }
            let jitter = rng.random_range(1.0 - JITTER_FRACTION..=1.0 + JITTER_FRACTION);
            let mut span = plan.uniform_span * jitter;
            let cap = remaining / spans_left as f64 * (1.0 + JITTER_FRACTION);
            span = span.min(cap);
            spans[i] = span;
            remaining -= span;
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{route_from_coordinates, RoutePoint};

    /// Route along the equator with the given eastward leg lengths (m)
    fn straight_route(legs: &[f64]) -> Route {
        let deg_per_m = 1.0 / 111_195.0;
        let mut lon = 0.0;
        let mut coords = vec![(Some(0.0), Some(0.0), 100.0, None)];
        for leg in legs {
            lon += leg * deg_per_m;
            coords.push((Some(0.0), Some(lon), 100.0, None));
        }
        route_from_coordinates(&coords)
    }

    fn placer_output(route: &Route, seed: Option<u64>) -> Vec<TowerStation> {
        let profile = route.terrain_profile();
        SectionPlacer::new(route, &profile, 250.0, 450.0, seed)
            .place_towers()
            .unwrap()
    }

    #[test]
    fn test_single_section_uniform_split() {
        // 1200 m straight line: one section per leg of 400 m each
        let route = straight_route(&[400.0, 400.0, 400.0]);
        let stations = placer_output(&route, None);

        assert_eq!(stations.len(), 4);
        for (i, station) in stations.iter().enumerate() {
            assert!((station.distance - 400.0 * i as f64).abs() < 1.0);
            assert_eq!(station.placement_role, Some(PlacementRole::Anchor));
        }
    }

    #[test]
    fn test_long_section_minimises_towers() {
        // One 1200 m leg: N = ceil(1200/450) = 3 spans of 400
        let route = straight_route(&[1200.0]);
        let stations = placer_output(&route, None);

        assert_eq!(stations.len(), 4);
        let spans: Vec<f64> = stations.windows(2).map(|w| w[1].distance - w[0].distance).collect();
        for span in &spans {
            assert!((span - 400.0).abs() < 2.0, "span {span} not ~400");
        }
        assert_eq!(stations[1].placement_role, Some(PlacementRole::Suspension));
        assert_eq!(stations[3].placement_role, Some(PlacementRole::Anchor));
    }

    #[test]
    fn test_smart_slack_on_terminal_section() {
        // 950 m leg: N = 3; slack attempt: (950-150)/2 = 400 in range, so
        // the first span is 150 and the rest are 400
        let route = straight_route(&[950.0]);
        let stations = placer_output(&route, None);

        assert_eq!(stations.len(), 4);
        let spans: Vec<f64> = stations.windows(2).map(|w| w[1].distance - w[0].distance).collect();
        assert!((spans[0] - 150.0).abs() < 2.0, "slack span was {}", spans[0]);
        assert!((spans[1] - 400.0).abs() < 2.0);
        assert!((spans[2] - 400.0).abs() < 2.0);
    }

    #[test]
    fn test_smart_slack_falls_back_when_inner_out_of_range() {
        // 1000 m leg: N = 3; inner = (1000-150)/2 = 425 in range -> slack.
        // 1300 m leg: N = 3; inner = (1300-150)/2 = 575 > 450 -> uniform.
        let route = straight_route(&[1300.0]);
        let stations = placer_output(&route, None);

        let spans: Vec<f64> = stations.windows(2).map(|w| w[1].distance - w[0].distance).collect();
        for span in &spans {
            assert!(
                (span - 1300.0 / 3.0).abs() < 2.0,
                "expected uniform ~433, got {span}"
            );
        }
    }

    #[test]
    fn test_corner_merge_drops_short_segments() {
        // Middle leg of 30 m merges away; the line still ends on the last
        // vertex
        let route = straight_route(&[400.0, 30.0, 400.0]);
        let profile = route.terrain_profile();
        let placer = SectionPlacer::new(&route, &profile, 250.0, 450.0, None);
        let corners = placer.merge_corners().unwrap();

        assert_eq!(corners.len(), 3);
        assert!((corners.last().unwrap().distance - 830.0).abs() < 1.0);
    }

    #[test]
    fn test_jitter_determinism_by_seed() {
        let route = straight_route(&[1200.0]);
        let a = placer_output(&route, Some(42));
        let b = placer_output(&route, Some(42));
        let c = placer_output(&route, Some(7));

        let dist = |s: &[TowerStation]| s.iter().map(|t| t.distance).collect::<Vec<_>>();
        assert_eq!(dist(&a), dist(&b));
        // A different seed moves the intermediates
        assert_ne!(dist(&a), dist(&c));
    }

    #[test]
    fn test_jitter_preserves_section_total() {
        let route = straight_route(&[1200.0]);
        let stations = placer_output(&route, Some(123));
        let last = stations.last().unwrap();
        assert!((last.distance - 1200.0).abs() < 1.0);
    }

    #[test]
    fn test_bend_creates_anchor_corner() {
        // Two 600 m legs with a bend: corner survives as an anchor
        let deg = 600.0 / 111_195.0;
        let route = route_from_coordinates(&[
            (Some(0.0), Some(0.0), 100.0, None),
            (Some(0.0), Some(deg), 100.0, None),
            (Some(deg), Some(deg), 100.0, None),
        ]);
        let stations = placer_output(&route, None);

        let corner = stations
            .iter()
            .find(|s| (s.distance - 600.0).abs() < 1.0)
            .expect("corner station missing");
        assert_eq!(corner.placement_role, Some(PlacementRole::Anchor));
    }

    #[test]
    fn test_requires_coordinates() {
        let route = Route::new(vec![
            RoutePoint { lat: None, lon: None, elevation: 0.0, distance: 0.0 },
            RoutePoint { lat: None, lon: None, elevation: 0.0, distance: 500.0 },
        ]);
        let profile = route.terrain_profile();
        let placer = SectionPlacer::new(&route, &profile, 250.0, 450.0, None);
        assert!(placer.place_towers().is_err());
    }
}
