//! CaveMap: the generated map aggregate and the pipeline orchestrator
//!
//! `CaveMap::generate` runs the whole pipeline: seed chain, Poisson
//! sampling, Voronoi construction, traversal, CA prep, the parallel CA
//! fan-out, and the final merge. Everything up to the fan-out runs on the
//! calling thread; the per-cell CA jobs run on a bounded rayon pool and
//! write into slots indexed by cell, so the output is identical for any
//! worker count.

use std::time::Instant;

use rayon::prelude::*;

use crate::ca::{self, build_cell_tasks, CaConfig, CellResult, CellTask, WALL};
use crate::cell::VoronoiCell;
use crate::config::CaveConfig;
use crate::error::{CaveError, Result};
use crate::generation::{build_traversal, sample_points, TraversalGraph, VoronoiDiagram};
use crate::grid::Grid;
use crate::seed::SeedChain;

#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;
#[cfg(feature = "spatial-index")]
use glam::Vec2;

/// A fully generated cave map
///
/// Holds the configuration it was generated from, the intermediate
/// geometry (diagram and traversal graph) for inspection or rendering, the
/// per-cell CA results, and the merged canvas-sized tile grid.
///
/// # Examples
///
/// ```
/// use voronoi_caves::*;
///
/// let config = CaveConfigBuilder::new()
///     .base_seed(42)
///     .canvas_size(96, 96).unwrap()
///     .poisson_radius(18.0).unwrap()
///     .build().unwrap();
///
/// let map = CaveMap::generate(config).unwrap();
/// assert_eq!(map.width(), 96);
/// println!("{} cells, {} connections", map.cell_count(),
///     map.traversal().connections.len());
/// ```
pub struct CaveMap {
    config: CaveConfig,
    seed_chain: SeedChain,
    diagram: VoronoiDiagram,
    traversal: TraversalGraph,
    results: Vec<CellResult>,
    merged: Grid<u8>,

    #[cfg(feature = "spatial-index")]
    spatial_index: Option<SpatialIndex>,
}

impl CaveMap {
    /// Run the full generation pipeline for a configuration
    ///
    /// Deterministic: the same configuration produces a byte-identical map
    /// on every run, regardless of the parallelism setting.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for out-of-range parameters, `GenerationFailed` when
    /// the worker pool cannot be constructed. A panicking CA worker aborts
    /// the call; no partial map is returned.
    pub fn generate(config: CaveConfig) -> Result<Self> {
        config.validate()?;
        let seed_chain = config.seed_chain();
        let canvas = config.canvas_size();
        let total_start = Instant::now();

        let stage_start = Instant::now();
        let seeds = sample_points(
            canvas,
            config.poisson_radius,
            config.poisson_attempts,
            config.seed_padding,
            seed_chain.poisson_seed,
        )?;
        eprintln!(
            "[Poisson] {} seeds in {:?}",
            seeds.len(),
            stage_start.elapsed()
        );

        let stage_start = Instant::now();
        let diagram = VoronoiDiagram::build(seeds, canvas)?;
        eprintln!(
            "[Voronoi] {} cells, {} edges, {} triangles in {:?}",
            diagram.cell_count(),
            diagram.edges().len(),
            diagram.triangles().len(),
            stage_start.elapsed()
        );

        let stage_start = Instant::now();
        let traversal = build_traversal(
            &diagram,
            &config.traversal_options(),
            seed_chain.traversal_seed,
        );
        eprintln!(
            "[Traversal] {} connections (target {}) in {:?}",
            traversal.connections.len(),
            traversal.target_connections,
            stage_start.elapsed()
        );

        let stage_start = Instant::now();
        let tasks = build_cell_tasks(&diagram, &traversal, &seed_chain, config.cell_padding);
        let results = run_all_cells(&tasks, &config.ca, config.parallelism)?;
        eprintln!(
            "[CA] {} cells in {:?}",
            results.len(),
            stage_start.elapsed()
        );

        let merged = merge_results(&diagram, &results);
        eprintln!("[Generate] total {:?}", total_start.elapsed());

        #[cfg(feature = "spatial-index")]
        let spatial_index = if diagram.seeds().is_empty() {
            None
        } else {
            Some(SpatialIndex::new(diagram.seeds()))
        };

        Ok(Self {
            config,
            seed_chain,
            diagram,
            traversal,
            results,
            merged,
            #[cfg(feature = "spatial-index")]
            spatial_index,
        })
    }

    /// Configuration this map was generated from
    #[inline]
    pub fn config(&self) -> &CaveConfig {
        &self.config
    }

    /// The fully derived seed chain
    #[inline]
    pub fn seed_chain(&self) -> SeedChain {
        self.seed_chain
    }

    /// The Voronoi diagram, for rendering or inspection
    #[inline]
    pub fn diagram(&self) -> &VoronoiDiagram {
        &self.diagram
    }

    /// The traversal graph, connector points in canvas coordinates
    #[inline]
    pub fn traversal(&self) -> &TraversalGraph {
        &self.traversal
    }

    /// Per-cell CA outputs, indexed by cell
    #[inline]
    pub fn cell_results(&self) -> &[CellResult] {
        &self.results
    }

    /// The merged canvas-sized tile grid, 0 = floor, 1 = wall
    #[inline]
    pub fn merged(&self) -> &Grid<u8> {
        &self.merged
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.merged.width()
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.merged.height()
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.diagram.cell_count()
    }

    /// Whether the tile at `(x, y)` is wall; out-of-canvas queries are wall
    #[inline]
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        if self.merged.in_bounds(x, y) {
            self.merged.at(x, y) == WALL
        } else {
            true
        }
    }

    /// Index of the cell owning pixel `(x, y)`, or `-1` outside the canvas
    #[inline]
    pub fn cell_at(&self, x: i32, y: i32) -> i32 {
        self.diagram.cell_at(x, y)
    }

    /// Get a cell by index
    #[inline]
    pub fn get_cell(&self, index: usize) -> Option<&VoronoiCell> {
        self.diagram.get_cell(index)
    }

    /// Neighbor indices of a cell; empty for an invalid index
    pub fn get_neighbors(&self, cell_index: usize) -> &[usize] {
        self.diagram
            .get_cell(cell_index)
            .map(|c| c.neighbors.as_slice())
            .unwrap_or(&[])
    }

    /// The CA result for one cell
    ///
    /// # Errors
    ///
    /// `CellNotFound` for an out-of-range index.
    pub fn cell_result(&self, cell_index: usize) -> Result<&CellResult> {
        self.results
            .get(cell_index)
            .ok_or(CaveError::CellNotFound(cell_index))
    }

    /// Cells within `hops` steps of `center_id` over the Voronoi adjacency
    ///
    /// Breadth-first; includes the center cell. Empty for an invalid index.
    pub fn find_cells_within_radius(&self, center_id: usize, hops: usize) -> Vec<usize> {
        if center_id >= self.cell_count() {
            return vec![];
        }

        let mut visited = std::collections::HashSet::new();
        let mut current = vec![center_id];
        visited.insert(center_id);

        for _ in 0..hops {
            let mut next = Vec::new();
            for &cell_id in &current {
                for &neighbor in self.get_neighbors(cell_id) {
                    if visited.insert(neighbor) {
                        next.push(neighbor);
                    }
                }
            }
            current = next;
        }

        let mut cells: Vec<usize> = visited.into_iter().collect();
        cells.sort();
        cells
    }

    /// Find the cell nearest to a canvas-space position
    ///
    /// Uses the KD-tree index; `None` when the map has no cells.
    #[cfg(feature = "spatial-index")]
    pub fn find_cell_at(&self, position: Vec2) -> Option<usize> {
        self.spatial_index
            .as_ref()
            .map(|index| index.find_nearest(position))
    }
}

/// Fan the CA jobs out over a bounded worker pool
///
/// Results are collected in task order, so slot `k` always holds cell `k`'s
/// output; completion order never shows in the result.
fn run_all_cells(
    tasks: &[CellTask],
    config: &CaConfig,
    parallelism: i32,
) -> Result<Vec<CellResult>> {
    let threads = if parallelism > 0 {
        parallelism as usize
    } else {
        0 // rayon's hardware default
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| CaveError::GenerationFailed(format!("worker pool: {}", e)))?;

    Ok(pool.install(|| {
        tasks
            .par_iter()
            .map(|task| ca::run_cell(task, config))
            .collect()
    }))
}

/// Merge per-cell tiles into the canvas grid, arbitrated by ownership
///
/// A pixel takes the tile of the result whose cell owns it; pixels of cells
/// that produced no result stay wall.
fn merge_results(diagram: &VoronoiDiagram, results: &[CellResult]) -> Grid<u8> {
    let size = diagram.size();
    let mut merged = Grid::new(size.x, size.y, WALL);

    for result in results {
        let x0 = result.region.x.max(0);
        let y0 = result.region.y.max(0);
        let x1 = result.region.right().min(size.x);
        let y1 = result.region.bottom().min(size.y);
        for y in y0..y1 {
            for x in x0..x1 {
                if diagram.cell_at(x, y) == result.cell_index as i32 {
                    merged.set(
                        x,
                        y,
                        result.tiles.at(x - result.region.x, y - result.region.y),
                    );
                }
            }
        }
    }
    merged
}
