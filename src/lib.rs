//! # Transmission-Line Layout and Tower Sizing
//!
//! This library produces a full transmission-line layout from a route
//! polyline, a voltage level and site context: tower positions, per-tower
//! geometry and foundation, per-span sag and clearance, and aggregated
//! cost, all guaranteed to satisfy a configurable design code.
//!
//! ## Overview
//!
//! The library is organized into several modules:
//!
//! - [`route`] - Route polylines, terrain profiles, geometric primitives
//! - [`conductor`] - Sag, electrical clearance, ruling span
//! - [`codes`] - Code-of-practice safety engine (IS / IEC / EUROCODE / ASCE)
//! - [`cost`] - Tower and line cost model
//! - [`rates`] - Regional market rates, risks, currencies, reference store
//! - [`obstacles`] - Forbidden zones and safe-spot finding
//! - [`overlay`] - Overlay feature contract and Overpass fetch
//! - [`spotter`] - Adaptive tower spotting and span-candidate evaluation
//! - [`sections`] - Section-based placement with anchor corners
//! - [`classifier`] - Tower type classification from route geometry
//! - [`swarm`] - Particle-swarm tower sizing
//! - [`constructability`] - Advisory buildability warnings
//! - [`aggregator`] - Canonical result assembly and safety enforcement
//! - [`optimizer`] - The one-request pipeline
//! - [`request`] - Inbound request model and validation
//! - [`csv`] - CSV input for routes and terrain profiles
//!
//! ## Example
//!
//! ```no_run
//! use linespan::optimizer::{OptimizerConfig, RouteOptimizer};
//! use linespan::rates::ReferenceStore;
//! use linespan::request::OptimizationRequest;
//!
//! let json = std::fs::read_to_string("request.json").unwrap();
//! let request = OptimizationRequest::from_json(&json).unwrap();
//! let (ctx, route) = request.into_parts().unwrap();
//!
//! let store = ReferenceStore::builtin();
//! let profile = route.terrain_profile();
//! let optimizer = RouteOptimizer::new(&ctx, &store, OptimizerConfig::default());
//! let result = optimizer.run(&route, &profile, &[], None).unwrap();
//!
//! assert_eq!(result.safety_summary.overall_status, "SAFE");
//! ```

pub mod aggregator;
pub mod classifier;
pub mod codes;
pub mod conductor;
pub mod confidence;
pub mod constructability;
pub mod cost;
pub mod csv;
pub mod obstacles;
pub mod optimizer;
pub mod overlay;
pub mod project;
pub mod rates;
pub mod request;
pub mod result;
pub mod route;
pub mod sections;
pub mod spotter;
pub mod swarm;

pub use codes::{CodeEngine, DesignStandard, SafetyCheck};
pub use optimizer::{OptimizerConfig, RouteOptimizer};
pub use project::{ProjectContext, TowerGeometry, TowerType};
pub use request::{OptimizationRequest, ValidationError};
pub use result::CanonicalResult;
