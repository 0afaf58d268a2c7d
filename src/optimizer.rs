//! Route-level optimization pipeline
//!
//! Drives one request from obstacle mapping through aggregation:
//!
//! 1. Build the obstacle map from overlay features and terrain
//! 2. Spot towers (section-based when the route carries coordinates,
//!    adaptive otherwise), then nudge stations off forbidden zones
//! 3. Classify tower types from route geometry
//! 4. Size each tower with the particle swarm under the governing code
//! 5. Aggregate into the canonical result
//!
//! The pipeline is strictly sequential and single-threaded per request; no
//! step reads a later step's output, and concurrent requests share no
//! mutable state. Failures inside the pipeline never propagate as errors:
//! every component returns a well-formed value carrying violation strings,
//! and the aggregator turns those into conservative geometries.

use crate::aggregator::{aggregate, AggregatorInput};
use crate::classifier::classify_stations;
use crate::codes::{resolve_standard, CodeEngine, DesignStandard};
use crate::confidence::ConfidenceInputs;
use crate::obstacles::ObstacleMap;
use crate::overlay::OverlayFeature;
use crate::project::ProjectContext;
use crate::rates::ReferenceStore;
use crate::result::CanonicalResult;
use crate::route::{Route, TerrainProfile};
use crate::sections::SectionPlacer;
use crate::spotter::{apply_nudges, place_towers_adaptive, SpotterConfig, TowerStation};
use crate::swarm::{SizingOutcome, SwarmConfig, SwarmSizer};

/// Pipeline configuration
#[derive(Debug, Clone, Default)]
pub struct OptimizerConfig {
    /// Explicit governing standard; resolved from the geographic context
    /// when absent
    pub standard: Option<DesignStandard>,

    /// Base seed for per-tower swarm runs; tower index is mixed in so each
    /// tower explores independently but reproducibly
    pub seed: Option<u64>,

    /// Seed for placement jitter; `None` keeps placement deterministic
    pub jitter_seed: Option<u64>,

    /// Swarm iteration budget override
    pub max_iterations: Option<usize>,

    /// Marks the terrain profile as externally supplied (affects the
    /// confidence score)
    pub detailed_terrain: bool,

    /// Stated project length (km); the route length is used when absent
    pub project_length_km: Option<f64>,
}

/// One-request optimizer
pub struct RouteOptimizer<'a> {
    ctx: &'a ProjectContext,
    store: &'a ReferenceStore,
    config: OptimizerConfig,
}

impl<'a> RouteOptimizer<'a> {
    pub fn new(ctx: &'a ProjectContext, store: &'a ReferenceStore, config: OptimizerConfig) -> Self {
        Self { ctx, store, config }
    }

    /// Run the full pipeline
    ///
    /// `overlays` may be empty (no overlay source); `overlay_failure`
    /// carries the reason when the overlay fetch failed so the obstacle map
    /// can record its degradation.
    pub fn run(
        &self,
        route: &Route,
        profile: &TerrainProfile,
        overlays: &[OverlayFeature],
        overlay_failure: Option<String>,
    ) -> Result<CanonicalResult, String> {
        let route_length = profile.end_distance().max(route.length());
        if route_length <= 0.0 {
            return Err("Route has zero length".to_string());
        }

        let standard = self.config.standard.unwrap_or_else(|| {
            resolve_standard(self.ctx.geo_context.country_code.as_deref())
        });
        let engine = CodeEngine::new(standard);
        let rates = self
            .store
            .rates_for(self.ctx.geo_context.country_code.as_deref());

        // Step 1: obstacle map
        let map = match overlay_failure {
            Some(reason) => ObstacleMap::degraded(profile, reason),
            None => ObstacleMap::build(route, profile, overlays),
        };

        // Step 2: spotting + nudging
        let mut stations = self.spot(route, profile, &engine, &rates)?;
        apply_nudges(&mut stations, &map, route, profile);

        // Step 3: classification
        classify_stations(&mut stations);

        // Step 4: per-tower sizing
        let outcomes = self.size_towers(&stations, &engine, &rates);

        // Step 5: aggregation
        let confidence = ConfidenceInputs {
            has_terrain_profile: self.config.detailed_terrain,
            has_soil_survey: false,
            has_wind_data: false,
            location_auto_detected: self
                .ctx
                .geo_context
                .resolution_mode
                .as_deref()
                .map(|m| m == "map-derived")
                .unwrap_or(false),
            terrain_samples: profile.points.len(),
        };

        let route_length_km = self
            .config
            .project_length_km
            .filter(|l| *l > 0.0)
            .unwrap_or(route_length / 1000.0);

        Ok(aggregate(&AggregatorInput {
            stations: &stations,
            outcomes: &outcomes,
            ctx: self.ctx,
            standard,
            map: &map,
            rates: &rates,
            profile,
            route_length_km,
            confidence,
            reference_status: self.store.status(),
        }))
    }

    /// Choose and run a placement algorithm
    ///
    /// Section-based placement needs haversine section lengths, so it runs
    /// only when every route point carries coordinates; synthetic routes
    /// use the adaptive spotter, which also covers the no-engine fallback.
    fn spot(
        &self,
        route: &Route,
        profile: &TerrainProfile,
        engine: &CodeEngine,
        rates: &crate::rates::MarketRates,
    ) -> Result<Vec<TowerStation>, String> {
        let mut spotter_config = SpotterConfig::new(self.ctx.span_min, self.ctx.span_max);
        spotter_config.jitter_seed = self.config.jitter_seed;

        if route.has_coordinates() && route.points.len() >= 2 {
            let placer = SectionPlacer::new(
                route,
                profile,
                spotter_config.min_span,
                spotter_config.max_span,
                self.config.jitter_seed,
            );
            match placer.place_towers() {
                Ok(stations) => {
                    crate::spotter::validate_stations(&stations, profile.end_distance())
                        .map(|_| stations.clone())
                        .or_else(|_| {
                            // Terminal sections below the span floor fall
                            // back to the adaptive walk
                            place_towers_adaptive(
                                &spotter_config,
                                self.ctx,
                                route,
                                profile,
                                Some(engine),
                                rates,
                            )
                        })
                }
                Err(_) => place_towers_adaptive(
                    &spotter_config,
                    self.ctx,
                    route,
                    profile,
                    Some(engine),
                    rates,
                ),
            }
        } else {
            place_towers_adaptive(
                &spotter_config,
                self.ctx,
                route,
                profile,
                Some(engine),
                rates,
            )
        }
    }

    /// Size every station with its own reproducible swarm
    fn size_towers(
        &self,
        stations: &[TowerStation],
        engine: &CodeEngine,
        rates: &crate::rates::MarketRates,
    ) -> Vec<SizingOutcome> {
        stations
            .iter()
            .enumerate()
            .map(|(i, station)| {
                let avg_span = adjacent_average_span(stations, i);

                let mut swarm_config = SwarmConfig {
                    avg_span,
                    seed: self.config.seed.map(|s| s.wrapping_add(i as u64)),
                    ..SwarmConfig::default()
                };
                if let Some(iterations) = self.config.max_iterations {
                    swarm_config.max_iterations = iterations;
                }

                let tower_type = station
                    .tower_type
                    .unwrap_or(self.ctx.tower_preference);

                SwarmSizer::new(engine, self.ctx, rates, swarm_config).optimize(tower_type)
            })
            .collect()
    }
}

/// Mean of the spans adjacent to station `i` (m)
fn adjacent_average_span(stations: &[TowerStation], i: usize) -> f64 {
    let mut total = 0.0;
    let mut count = 0;

    if i > 0 {
        total += stations[i].distance - stations[i - 1].distance;
        count += 1;
    }
    if i + 1 < stations.len() {
        total += stations[i + 1].distance - stations[i].distance;
        count += 1;
    }

    if count == 0 {
        350.0
    } else {
        total / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::route_from_coordinates;

    fn straight_route(length: f64, points: usize) -> Route {
        let deg_per_m = 1.0 / 111_195.0;
        let coords: Vec<(Option<f64>, Option<f64>, f64, Option<f64>)> = (0..points)
            .map(|i| {
                let d = length * i as f64 / (points - 1) as f64;
                (Some(0.0), Some(d * deg_per_m), 100.0, None)
            })
            .collect();
        route_from_coordinates(&coords)
    }

    fn run_flat(length: f64) -> CanonicalResult {
        let ctx = ProjectContext::new(400.0);
        let store = ReferenceStore::builtin();
        let route = straight_route(length, 4);
        let profile = route.terrain_profile();

        RouteOptimizer::new(
            &ctx,
            &store,
            OptimizerConfig {
                seed: Some(99),
                max_iterations: Some(25),
                ..OptimizerConfig::default()
            },
        )
        .run(&route, &profile, &[], None)
        .unwrap()
    }

    #[test]
    fn test_pipeline_end_to_end_safe() {
        let result = run_flat(1200.0);
        assert_eq!(result.safety_summary.overall_status, "SAFE");
        assert!(result.towers.len() >= 2);
        assert_eq!(result.spans.len(), result.towers.len() - 1);
    }

    #[test]
    fn test_pipeline_monotone_spacing() {
        let result = run_flat(2400.0);
        for pair in result.towers.windows(2) {
            let gap = pair[1].distance_along_route - pair[0].distance_along_route;
            assert!(gap >= 30.0 - 1e-6, "gap {gap} below floor");
        }
    }

    #[test]
    fn test_pipeline_determinism_with_seeds() {
        let a = run_flat(1200.0);
        let b = run_flat(1200.0);
        let da: Vec<f64> = a.towers.iter().map(|t| t.distance_along_route).collect();
        let db: Vec<f64> = b.towers.iter().map(|t| t.distance_along_route).collect();
        assert_eq!(da, db);
        assert_eq!(
            a.line_summary.total_project_cost,
            b.line_summary.total_project_cost
        );
    }

    #[test]
    fn test_zero_length_route_is_error() {
        let ctx = ProjectContext::new(132.0);
        let store = ReferenceStore::builtin();
        let route = Route::new(vec![]);
        let profile = route.terrain_profile();

        let result = RouteOptimizer::new(&ctx, &store, OptimizerConfig::default())
            .run(&route, &profile, &[], None);
        assert!(result.is_err());
    }

    #[test]
    fn test_overlay_failure_degrades_not_fails() {
        let ctx = ProjectContext::new(220.0);
        let store = ReferenceStore::builtin();
        let route = straight_route(900.0, 3);
        let profile = route.terrain_profile();

        let result = RouteOptimizer::new(
            &ctx,
            &store,
            OptimizerConfig {
                seed: Some(1),
                max_iterations: Some(20),
                ..OptimizerConfig::default()
            },
        )
        .run(
            &route,
            &profile,
            &[],
            Some("connection timed out after 30 s".to_string()),
        )
        .unwrap();

        assert_eq!(result.safety_summary.overall_status, "SAFE");
        assert!(result.warnings.iter().any(|w| w.contains("timed out")));
    }
}
