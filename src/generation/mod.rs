//! Generation pipeline stages ahead of the cellular automata
//!
//! Poisson sampling, Delaunay triangulation, Voronoi construction, and the
//! traversal graph. Each stage is a pure function of its inputs plus a
//! stage seed, so the pipeline can be re-run stage by stage for inspection.

mod delaunay;
mod poisson;
mod traversal;
mod voronoi;

pub use delaunay::{circumcenter, triangulate};
pub use poisson::sample_points;
pub use traversal::{build_traversal, Connection, TraversalGraph, TraversalOptions};
pub use voronoi::VoronoiDiagram;

use crate::config::CaveConfig;
use crate::error::Result;

/// Sample seeds and build the Voronoi diagram for a configuration
///
/// Convenience wrapper over the first two stages; `CaveMap::generate` runs
/// the same steps with per-stage progress logging.
pub fn generate_diagram(config: &CaveConfig) -> Result<VoronoiDiagram> {
    let chain = config.seed_chain();
    let seeds = sample_points(
        config.canvas_size(),
        config.poisson_radius,
        config.poisson_attempts,
        config.seed_padding,
        chain.poisson_seed,
    )?;
    VoronoiDiagram::build(seeds, config.canvas_size())
}
