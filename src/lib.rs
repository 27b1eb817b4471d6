//! Deterministic Voronoi-partitioned cave map generation
//!
//! A standalone library that turns one integer seed and a small parameter
//! block into a 2D floor/wall tile grid: blue-noise seeds partition the
//! canvas into Voronoi cells, a biased spanning tree plus coverage edges
//! choose the passages between cells, and a masked cellular automata carves
//! each cell into a cave. Suitable for use with any engine (Bevy, Macroquad,
//! a terminal renderer) since all outputs are plain grids and index-linked
//! structs.
//!
//! # Quick Start
//!
//! ```rust
//! use voronoi_caves::*;
//!
//! let config = CaveConfigBuilder::new()
//!     .base_seed(42)
//!     .canvas_size(96, 96).unwrap()
//!     .poisson_radius(18.0).unwrap()
//!     .build().unwrap();
//!
//! let map = CaveMap::generate(config).unwrap();
//! println!(
//!     "{} cells, {} connections, {}x{} tiles",
//!     map.cell_count(),
//!     map.traversal().connections.len(),
//!     map.width(),
//!     map.height()
//! );
//! ```
//!
//! # Determinism
//!
//! The whole pipeline is a pure function of the configuration. Stage seeds
//! derive from the base seed, every worker owns its RNG, and the parallel
//! CA results are merged by cell index, so the same configuration yields a
//! byte-identical map at any `parallelism` setting.
//!
//! # Features
//!
//! - `spatial-index` (default): O(log n) position-to-cell lookups using a
//!   KD-tree over the seed points
//! - `serde`: serialization support for the configuration types

// Modules
pub mod error;
pub mod config;
pub mod seed;
pub mod grid;
pub mod cell;
pub mod generation;
pub mod ca;
pub mod map;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use error::{CaveError, Result};
pub use config::{CaveConfig, CaveConfigBuilder};
pub use seed::{mix, SeedChain, XorShiftRng};
pub use grid::{Grid, Rect};
pub use cell::{DelaunayTriangle, VoronoiCell, VoronoiEdge};
pub use generation::{
    build_traversal, generate_diagram, sample_points, Connection, TraversalGraph,
    TraversalOptions, VoronoiDiagram,
};
pub use ca::{
    build_cell_tasks, run_cell, CaConfig, CellConnector, CellResult, CellTask, FLOOR, WALL,
};
pub use map::CaveMap;

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam::Vec2 for convenience
pub use glam::Vec2;
