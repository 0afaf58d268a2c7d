//! Particle-swarm tower sizing
//!
//! Explores the continuous 6-dimensional geometry space (height, base width,
//! span, footing length, footing width, footing depth) for one tower under
//! one code engine, minimising cost per line-kilometre.
//!
//! The contract is non-negotiable: the sizer always produces the cheapest
//! geometry it can defend. It never interprets engineering codes itself
//! (the code engine is the only safety arbiter), never rewards an
//! electrical-clearance violation (sentinel fitness), and always tracks the
//! best sub-sentinel design separately so a clean fallback exists. When no
//! sub-sentinel geometry is ever seen, a deterministic conservative design
//! is substituted.
//!
//! Bounds enforcement happens on decode: after every velocity/position
//! update the decoded geometry is clamped into the hard bounds and the
//! position vector is rewritten from the clamped geometry. Without the
//! rewrite, personal and global bests would store illegal positions and
//! drag the swarm toward infeasible regions.

use crate::codes::{soil_window, type_span_window, CodeEngine};
use crate::cost::{self, TowerCost, INFEASIBLE_COST};
use crate::project::{
    voltage_height_floor, ProjectContext, TowerGeometry, TowerType, MAX_TOWER_HEIGHT_M,
};
use crate::rates::MarketRates;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Search space dimensionality
const DIMENSIONS: usize = 6;

/// Fraction of each bound range used for the cheap-biased initialisation
const INIT_QUARTILE: f64 = 0.25;

/// Iterations examined by the early-stop window
const CONVERGENCE_WINDOW: usize = 20;

/// Minimum per-window improvement to keep iterating (currency units per km)
const CONVERGENCE_THRESHOLD: f64 = 1000.0;

/// Swarm hyper-parameters
#[derive(Debug, Clone)]
pub struct SwarmConfig {
    pub num_particles: usize,
    pub max_iterations: usize,
    /// Inertia weight
    pub inertia: f64,
    /// Cognitive coefficient (pull toward the personal best)
    pub cognitive: f64,
    /// Social coefficient (pull toward the global best)
    pub social: f64,
    /// Average adjacent span, used for the physics-based height floor (m)
    pub avg_span: f64,
    /// RNG seed; `None` draws a fresh one per run
    pub seed: Option<u64>,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            num_particles: 30,
            max_iterations: 100,
            inertia: 0.7,
            cognitive: 1.5,
            social: 1.5,
            avg_span: 350.0,
            seed: None,
        }
    }
}

/// One particle: position, velocity and personal best
#[derive(Debug, Clone)]
struct Particle {
    position: [f64; DIMENSIONS],
    velocity: [f64; DIMENSIONS],
    best_position: [f64; DIMENSIONS],
    best_fitness: f64,
    current: TowerGeometry,
}

/// Outcome of sizing one tower
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SizingOutcome {
    pub geometry: TowerGeometry,

    /// Verdict of the final full code check on the returned geometry
    pub safe: bool,
    pub violations: Vec<String>,

    /// Objective value for the returned geometry (USD/km)
    #[serde(rename = "costPerKm")]
    pub cost_per_km: f64,

    #[serde(rename = "perTowerCost")]
    pub per_tower_cost: f64,

    pub breakdown: TowerCost,

    pub iterations: usize,

    /// Trailing objective history (last 50 iterations)
    pub convergence: Vec<f64>,

    /// Whether any sub-sentinel design was seen during the search
    #[serde(rename = "foundSafeDesign")]
    pub found_safe_design: bool,

    /// Whether the conservative fallback replaced the search result
    #[serde(rename = "fallbackApplied")]
    pub fallback_applied: bool,
}

/// Per-tower particle-swarm sizer
pub struct SwarmSizer<'a> {
    engine: &'a CodeEngine,
    ctx: &'a ProjectContext,
    rates: &'a MarketRates,
    config: SwarmConfig,
    /// Physics-based minimum height for this request (m)
    height_floor: f64,
    /// Per-dimension (lower, upper) bounds for initialisation
    bounds: [(f64, f64); DIMENSIONS],
}

impl<'a> SwarmSizer<'a> {
    pub fn new(
        engine: &'a CodeEngine,
        ctx: &'a ProjectContext,
        rates: &'a MarketRates,
        config: SwarmConfig,
    ) -> Self {
        let height_floor = Self::compute_height_floor(ctx, config.avg_span);

        let bounds = [
            (height_floor, MAX_TOWER_HEIGHT_M),
            (height_floor * 0.25, height_floor * 0.40),
            (ctx.span_min, ctx.span_max),
            (crate::project::FOOTING_PLAN_MIN_M, crate::project::FOOTING_PLAN_MAX_M),
            (crate::project::FOOTING_PLAN_MIN_M, crate::project::FOOTING_PLAN_MAX_M),
            (crate::project::FOOTING_DEPTH_MIN_M, crate::project::FOOTING_DEPTH_MAX_M),
        ];

        Self {
            engine,
            ctx,
            rates,
            config,
            height_floor,
            bounds,
        }
    }

    /// Physics-based height floor: ground clearance + estimated sag
    /// (2.5 % of span) + structural spacing, rounded up, never below the
    /// voltage table minimum.
    fn compute_height_floor(ctx: &ProjectContext, avg_span: f64) -> f64 {
        let (structural, ground_clearance) = if ctx.voltage_kv >= 400.0 {
            (9.0, 8.0)
        } else if ctx.voltage_kv >= 220.0 {
            (6.0, 7.0)
        } else {
            (4.0, 6.0)
        };

        let estimated_sag = avg_span * 0.025;
        let logical = (ground_clearance + estimated_sag + structural).ceil();

        logical.max(voltage_height_floor(ctx.voltage_kv))
    }

    /// Run the optimisation for one tower of the given type
    pub fn optimize(&self, tower_type: TowerType) -> SizingOutcome {
        let seed = self
            .config
            .seed
            .unwrap_or_else(|| rand::rng().random());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut particles = self.initialize_swarm(tower_type, &mut rng);

        let mut global_best_fitness = f64::INFINITY;
        let mut global_best_position = particles[0].position;
        let mut global_best: Option<TowerGeometry> = None;

        // Best design that never scored the sentinel, tracked separately so
        // a clean fallback always exists
        let mut best_safe_fitness = f64::INFINITY;
        let mut best_safe: Option<TowerGeometry> = None;

        let mut convergence: Vec<f64> = Vec::with_capacity(self.config.max_iterations);
        let mut iterations = 0;

        for iteration in 0..self.config.max_iterations {
            iterations = iteration + 1;

            for particle in particles.iter_mut() {
                let fitness = self.fitness(&particle.current);

                if fitness < particle.best_fitness {
                    particle.best_fitness = fitness;
                    particle.best_position = particle.position;
                }

                if global_best.is_none() || fitness < global_best_fitness {
                    global_best_fitness = fitness;
                    global_best_position = particle.position;
                    global_best = Some(particle.current);
                }

                if fitness < INFEASIBLE_COST && fitness < best_safe_fitness {
                    best_safe_fitness = fitness;
                    best_safe = Some(particle.current);
                }
            }

            convergence.push(global_best_fitness);

            if iteration + 1 >= self.config.max_iterations {
                break;
            }

            for particle in particles.iter_mut() {
                self.update_particle(particle, &global_best_position, tower_type, &mut rng);
            }

            // Early stop once the objective has flattened out
            if iteration > CONVERGENCE_WINDOW {
                let window_start = convergence[convergence.len() - CONVERGENCE_WINDOW];
                let improvement = window_start - global_best_fitness;
                if improvement < CONVERGENCE_THRESHOLD {
                    break;
                }
            }
        }

        self.select_result(
            tower_type,
            global_best,
            global_best_fitness,
            best_safe,
            iterations,
            convergence,
        )
    }

    /// Cheap-biased swarm initialisation
    ///
    /// Positions draw from the lower quartile of each bound: risky, cheap
    /// starting points that the code engine pushes back into feasibility.
    fn initialize_swarm(&self, tower_type: TowerType, rng: &mut ChaCha8Rng) -> Vec<Particle> {
        let mut particles = Vec::with_capacity(self.config.num_particles);

        for _ in 0..self.config.num_particles {
            let height = lower_quartile(rng, self.bounds[0]);

            let bw_lo = height * 0.25;
            let bw_hi = height * 0.40;
            let base_width = lower_quartile(rng, (bw_lo, bw_hi));

            let position = [
                height,
                base_width,
                lower_quartile(rng, self.bounds[2]),
                lower_quartile(rng, self.bounds[3]),
                lower_quartile(rng, self.bounds[4]),
                lower_quartile(rng, self.bounds[5]),
            ];

            let mut velocity = [0.0; DIMENSIONS];
            for (i, v) in velocity.iter_mut().enumerate() {
                let range = self.bounds[i].1 - self.bounds[i].0;
                *v = rng.random_range(-1.0..=1.0) * range * 0.1;
            }

            let mut particle = Particle {
                position,
                velocity,
                best_position: position,
                best_fitness: f64::INFINITY,
                current: self.decode(&position, tower_type),
            };
            self.rewrite_position(&mut particle);
            particles.push(particle);
        }

        particles
    }

    /// Decode a raw position into a bounds-clamped geometry
    ///
    /// Beyond the hard bounds, the coupled structural constraints are folded
    /// into the clamp: the span stays inside the tower-type window, the
    /// height holds the span-height ratio, and the base-width floor carries
    /// the wind-zone multiplier. Soil-window footing minima apply directly.
    /// What remains for the code engine are the standard-specific constants
    /// (depth minima, ratio caps, span caps) and the clearance check.
    fn decode(&self, position: &[f64; DIMENSIONS], tower_type: TowerType) -> TowerGeometry {
        let (span_lo, span_hi) = type_span_window(tower_type, self.ctx);
        let span = position[2].clamp(span_lo, span_hi);

        // Span-height ratio <= 10
        let height = position[0]
            .max(self.height_floor)
            .max(span / 10.0)
            .min(MAX_TOWER_HEIGHT_M);

        let wind_ratio = 0.25 * self.ctx.effective_wind_zone().base_width_multiplier();
        let bw_lo = height * tower_type.base_width_ratio().max(wind_ratio);
        let bw_hi = (height * crate::project::BASE_WIDTH_RATIO_MAX).max(bw_lo);
        let base_width = position[1].clamp(bw_lo, bw_hi);

        let (plan_lo, plan_hi, depth_lo) = soil_window(self.ctx.soil);
        let footing_length = position[3].clamp(plan_lo, plan_hi);
        let footing_width = position[4].clamp(plan_lo, plan_hi);
        let footing_depth = position[5].clamp(
            depth_lo.max(crate::project::FOOTING_DEPTH_MIN_M),
            crate::project::FOOTING_DEPTH_MAX_M,
        );

        let mut geometry = TowerGeometry::clamped(
            tower_type,
            height,
            base_width,
            span,
            footing_length,
            footing_width,
            footing_depth,
            self.ctx,
        );
        // The span window can be narrower than the project bounds the
        // generic clamp applies
        geometry.span_length = span;
        geometry.base_width = base_width;
        geometry
    }

    /// Rewrite the position vector from the clamped geometry so best
    /// captures store legal positions
    fn rewrite_position(&self, particle: &mut Particle) {
        let g = &particle.current;
        particle.position = [
            g.total_height,
            g.base_width,
            g.span_length,
            g.footing_length,
            g.footing_width,
            g.footing_depth,
        ];
    }

    /// Objective for one candidate
    ///
    /// Clearance violations are the only critical class and score the
    /// sentinel; other violations still price normally and are caught by
    /// the aggregator's safety enforcement.
    fn fitness(&self, geometry: &TowerGeometry) -> f64 {
        let check = self.engine.check(geometry, self.ctx);

        if check.has_clearance_violation() {
            return INFEASIBLE_COST;
        }

        let breakdown = cost::tower_cost(geometry, self.ctx, self.rates);
        cost::cost_per_km(breakdown.total_cost, geometry, self.ctx)
    }

    /// Standard inertia-cognitive-social velocity update, then position
    /// update, decode, and position rewrite
    fn update_particle(
        &self,
        particle: &mut Particle,
        global_best_position: &[f64; DIMENSIONS],
        tower_type: TowerType,
        rng: &mut ChaCha8Rng,
    ) {
        for i in 0..DIMENSIONS {
            let r1: f64 = rng.random_range(0.0..=1.0);
            let r2: f64 = rng.random_range(0.0..=1.0);

            let cognitive =
                self.config.cognitive * r1 * (particle.best_position[i] - particle.position[i]);
            let social =
                self.config.social * r2 * (global_best_position[i] - particle.position[i]);

            particle.velocity[i] = self.config.inertia * particle.velocity[i] + cognitive + social;
            particle.position[i] += particle.velocity[i];
        }

        particle.current = self.decode(&particle.position, tower_type);
        self.rewrite_position(particle);
    }

    /// Pick the returned geometry, falling back conservatively when the
    /// search never left the sentinel
    fn select_result(
        &self,
        tower_type: TowerType,
        global_best: Option<TowerGeometry>,
        global_best_fitness: f64,
        best_safe: Option<TowerGeometry>,
        iterations: usize,
        mut convergence: Vec<f64>,
    ) -> SizingOutcome {
        let found_safe_design = best_safe.is_some();

        let (geometry, fallback_applied) = match global_best {
            Some(g) if global_best_fitness < INFEASIBLE_COST => (g, false),
            _ => match best_safe {
                Some(g) => (g, false),
                None => (self.conservative_fallback(tower_type), true),
            },
        };

        let check = self.engine.check(&geometry, self.ctx);
        let breakdown = cost::tower_cost(&geometry, self.ctx, self.rates);
        let per_tower_cost = breakdown.total_cost;
        let cost_per_km = cost::cost_per_km(per_tower_cost, &geometry, self.ctx);

        if convergence.len() > 50 {
            convergence.drain(..convergence.len() - 50);
        }

        SizingOutcome {
            geometry,
            safe: check.safe,
            violations: check.violations,
            cost_per_km,
            per_tower_cost,
            breakdown,
            iterations,
            convergence,
            found_safe_design,
            fallback_applied,
        }
    }

    /// Deterministic conservative design used when the search found nothing
    /// below the sentinel
    pub fn conservative_fallback(&self, tower_type: TowerType) -> TowerGeometry {
        conservative_fallback(self.ctx, tower_type, self.config.avg_span)
    }
}

/// Deterministic safe geometry for a context
///
/// Substituted when the swarm never found a sub-sentinel design, and by the
/// aggregator when a tower would otherwise report unsafe: height at the
/// voltage floor, base width at least 0.3 of the height (and whatever the
/// wind zone demands), footings enlarged to the soil window with a depth of
/// at least 4 m, span clamped in range.
pub fn conservative_fallback(
    ctx: &ProjectContext,
    tower_type: TowerType,
    avg_span: f64,
) -> TowerGeometry {
    let (span_lo, span_hi) = type_span_window(tower_type, ctx);
    let span = (ctx.span_min + 100.0).clamp(span_lo, span_hi);

    let height = SwarmSizer::compute_height_floor(ctx, avg_span)
        .max(voltage_height_floor(ctx.voltage_kv))
        .max(span / 10.0)
        .min(crate::project::MAX_TOWER_HEIGHT_M);

    let wind_ratio = 0.25 * ctx.effective_wind_zone().base_width_multiplier();
    let base_width = (height * 0.3)
        .max(height * wind_ratio)
        .max(height * tower_type.base_width_ratio());

    let (plan_min, _, depth_min) = soil_window(ctx.soil);
    let plan = plan_min.max(5.0);
    let depth = depth_min.max(4.0);

    let mut geometry = TowerGeometry::clamped(
        tower_type,
        height,
        base_width,
        span,
        plan,
        plan,
        depth,
        ctx,
    );
    geometry.span_length = span;
    geometry
}

/// Draw from the lower quartile of a bound
fn lower_quartile(rng: &mut ChaCha8Rng, (lo, hi): (f64, f64)) -> f64 {
    let span = (hi - lo).max(0.0);
    rng.random_range(lo..=lo + span * INIT_QUARTILE)
}
