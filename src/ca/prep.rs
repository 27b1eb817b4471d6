//! Per-cell CA task preparation
//!
//! Cuts each cell's padded bounding box out of the ownership grid as a byte
//! mask, rebases the cell's traversal connectors into region-local
//! coordinates, and derives the per-cell CA seed. Tasks are fully
//! materialized here, before any worker runs, so scheduling order can never
//! influence the output.

use glam::{IVec2, Vec2};

use crate::generation::{TraversalGraph, VoronoiDiagram};
use crate::grid::{Grid, Rect};
use crate::seed::SeedChain;

/// A traversal connector rebased into one cell's CA region
#[derive(Debug, Clone, Copy)]
pub struct CellConnector {
    /// The cell on the far side of the hosting edge
    pub other_cell: usize,
    /// Index of the hosting edge in the diagram
    pub edge_index: usize,
    /// Connector point in canvas space
    pub world_point: Vec2,
    /// Connector pixel in region-local coordinates, clamped into the region
    pub local_point: IVec2,
    /// Unit direction from the connector toward the cell seed; `(1, 0)`
    /// when the connector coincides with the seed
    pub direction_into_cell: Vec2,
}

/// Everything one CA worker needs to process one cell
///
/// Immutable once built; consumed by exactly one worker.
#[derive(Debug, Clone)]
pub struct CellTask {
    pub cell_index: usize,
    /// Padded cell bounding box, clamped to the canvas
    pub region: Rect,
    /// `region`-sized mask: 1 where the ownership grid names this cell
    pub mask: Grid<u8>,
    pub connectors: Vec<CellConnector>,
    pub ca_seed: u32,
    /// Cell seed position in canvas space
    pub seed_position: Vec2,
}

/// The tiles one CA worker produced for one cell
#[derive(Debug, Clone)]
pub struct CellResult {
    pub cell_index: usize,
    pub region: Rect,
    /// `region`-sized tile grid: 1 = wall, 0 = floor
    pub tiles: Grid<u8>,
    /// Connectors carried through from the task
    pub connectors: Vec<CellConnector>,
}

/// Materialize one CA task per cell
pub fn build_cell_tasks(
    diagram: &VoronoiDiagram,
    traversal: &TraversalGraph,
    seed_chain: &SeedChain,
    cell_padding: i32,
) -> Vec<CellTask> {
    let size = diagram.size();
    diagram
        .cells()
        .iter()
        .map(|cell| {
            let index = cell.seed_index;
            let region = cell
                .bounds
                .padded(cell_padding)
                .clamped_to(size.x, size.y);

            let mut mask = Grid::new(region.w, region.h, 0u8);
            for y in 0..region.h {
                for x in 0..region.w {
                    if diagram.cell_at(region.x + x, region.y + y) == index as i32 {
                        mask.set(x, y, 1);
                    }
                }
            }

            let connectors = traversal
                .connections
                .iter()
                .filter(|c| c.cell_a == index || c.cell_b == index)
                .map(|c| {
                    let other_cell = if c.cell_a == index { c.cell_b } else { c.cell_a };
                    let local_point = IVec2::new(
                        (c.point_on_edge.x.floor() as i32 - region.x).clamp(0, region.w - 1),
                        (c.point_on_edge.y.floor() as i32 - region.y).clamp(0, region.h - 1),
                    );
                    let inward = cell.seed - c.point_on_edge;
                    let direction_into_cell = if inward.length_squared() > f32::EPSILON {
                        inward.normalize()
                    } else {
                        Vec2::new(1.0, 0.0)
                    };
                    CellConnector {
                        other_cell,
                        edge_index: c.edge_index,
                        world_point: c.point_on_edge,
                        local_point,
                        direction_into_cell,
                    }
                })
                .collect();

            CellTask {
                cell_index: index,
                region,
                mask,
                connectors,
                ca_seed: seed_chain.ca_seed(index),
                seed_position: cell.seed,
            }
        })
        .collect()
}
