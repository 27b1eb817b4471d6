//! Per-cell masked cellular automata
//!
//! Each cell runs a classic cave CA restricted to its ownership mask. A
//! carve mask rasterized from the cell's traversal connectors pins the
//! passage mouths open: carved pixels are floor before, during, and after
//! every step, so the connectivity chosen by the traversal stage survives
//! the automata.
//!
//! Identical `(CellTask, CaConfig)` input yields an identical tile grid on
//! every run, platform, and thread count; the RNG is seeded per task and
//! the neighbour scan order is fixed.

mod prep;

pub use prep::{build_cell_tasks, CellConnector, CellResult, CellTask};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::seed::XorShiftRng;

/// Tile byte for open floor
pub const FLOOR: u8 = 0;

/// Tile byte for solid wall
pub const WALL: u8 = 1;

/// Cave CA rule parameters
///
/// `kernel_size` is the side of the neighbour window; even values are
/// rounded up to the next odd size, so a configured 4 behaves as 5. The
/// birth and survival limits are clamped to the neighbour count of the
/// effective kernel at run time.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaConfig {
    /// Neighbour window side length (odd, at least 3)
    pub kernel_size: u32,
    /// Floor becomes wall at this many wall neighbours
    pub birth_limit: u32,
    /// Wall stays wall at this many wall neighbours
    pub survival_limit: u32,
    /// Number of CA steps; 0 leaves the initial noise fill untouched
    pub iterations: u32,
    /// Probability that an in-mask pixel starts as wall, in `[0, 1]`
    pub initial_wall_probability: f32,
    /// Length in pixels of the carved passage behind each connector
    pub connector_depth: u32,
}

impl Default for CaConfig {
    fn default() -> Self {
        Self {
            kernel_size: 3,
            birth_limit: 5,
            survival_limit: 4,
            iterations: 4,
            initial_wall_probability: 0.45,
            connector_depth: 4,
        }
    }
}

impl CaConfig {
    /// Kernel side actually used: even sizes round up to odd
    #[inline]
    pub fn effective_kernel(&self) -> u32 {
        if self.kernel_size % 2 == 0 {
            self.kernel_size + 1
        } else {
            self.kernel_size
        }
    }
}

/// Run the automata for one cell
///
/// The caller guarantees the task's mask and region are consistent; the
/// result covers exactly `task.region`.
pub fn run_cell(task: &CellTask, config: &CaConfig) -> CellResult {
    let width = task.region.w;
    let height = task.region.h;

    let kernel = config.effective_kernel() as i32;
    let max_neighbors = (kernel * kernel - 1) as u32;
    let birth = config.birth_limit.min(max_neighbors);
    let survival = config.survival_limit.min(max_neighbors);
    let half = kernel / 2;

    let carve = build_carve_mask(task, config.connector_depth);

    // initial fill, row-major so the RNG stream is consumed in fixed order
    let mut rng = XorShiftRng::new(task.ca_seed);
    let mut tiles = Grid::new(width, height, WALL);
    for y in 0..height {
        for x in 0..width {
            let tile = if carve.at(x, y) == 1 {
                FLOOR
            } else if task.mask.at(x, y) == 0 {
                WALL
            } else if rng.next_f32() < config.initial_wall_probability {
                WALL
            } else {
                FLOOR
            };
            tiles.set(x, y, tile);
        }
    }

    let mut back = tiles.clone();
    for _ in 0..config.iterations {
        for y in 0..height {
            for x in 0..width {
                let tile = if carve.at(x, y) == 1 {
                    FLOOR
                } else if task.mask.at(x, y) == 0 {
                    WALL
                } else {
                    let walls = count_wall_neighbors(&tiles, &task.mask, &carve, x, y, half);
                    if tiles.at(x, y) == WALL {
                        if walls >= survival {
                            WALL
                        } else {
                            FLOOR
                        }
                    } else if walls >= birth {
                        WALL
                    } else {
                        FLOOR
                    }
                };
                back.set(x, y, tile);
            }
        }
        std::mem::swap(&mut tiles, &mut back);
    }

    CellResult {
        cell_index: task.cell_index,
        region: task.region,
        tiles,
        connectors: task.connectors.clone(),
    }
}

/// Count wall neighbours in the kernel window around `(x, y)`
///
/// Out-of-region and masked-out pixels count as wall; carved pixels count
/// as open regardless of their mask state.
fn count_wall_neighbors(
    tiles: &Grid<u8>,
    mask: &Grid<u8>,
    carve: &Grid<u8>,
    x: i32,
    y: i32,
    half: i32,
) -> u32 {
    let mut walls = 0u32;
    for dy in -half..=half {
        for dx in -half..=half {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x + dx;
            let ny = y + dy;
            if !tiles.in_bounds(nx, ny) {
                walls += 1;
                continue;
            }
            if carve.at(nx, ny) == 1 {
                continue;
            }
            if mask.at(nx, ny) == 0 {
                walls += 1;
                continue;
            }
            walls += tiles.at(nx, ny) as u32;
        }
    }
    walls
}

/// Rasterize the connector carve lines into a region-sized byte mask
///
/// Each connector steps `connector_depth` pixels inward from its local
/// point along its inward direction. Steps that leave the region or land
/// outside the cell mask are skipped without stopping the line.
fn build_carve_mask(task: &CellTask, depth: u32) -> Grid<u8> {
    let mut carve = Grid::new(task.region.w, task.region.h, 0u8);
    for connector in &task.connectors {
        let mut px = connector.local_point.x as f32 + 0.5;
        let mut py = connector.local_point.y as f32 + 0.5;
        for _ in 0..depth {
            let cx = px.floor() as i32;
            let cy = py.floor() as i32;
            if carve.in_bounds(cx, cy) && task.mask.at(cx, cy) == 1 {
                carve.set(cx, cy, 1);
            }
            px += connector.direction_into_cell.x;
            py += connector.direction_into_cell.y;
        }
    }
    carve
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Rect;
    use glam::{IVec2, Vec2};

    /// A free-standing task with a full mask and one connector
    fn simple_task(width: i32, height: i32, connectors: Vec<CellConnector>) -> CellTask {
        CellTask {
            cell_index: 0,
            region: Rect::new(0, 0, width, height),
            mask: Grid::new(width, height, 1u8),
            connectors,
            ca_seed: 12345,
            seed_position: Vec2::new(width as f32 / 2.0, height as f32 / 2.0),
        }
    }

    fn east_connector(x: i32, y: i32) -> CellConnector {
        CellConnector {
            other_cell: 1,
            edge_index: 0,
            world_point: Vec2::new(x as f32 + 0.5, y as f32 + 0.5),
            local_point: IVec2::new(x, y),
            direction_into_cell: Vec2::new(1.0, 0.0),
        }
    }

    #[test]
    fn test_effective_kernel_rounds_up() {
        let config = CaConfig {
            kernel_size: 4,
            ..Default::default()
        };
        assert_eq!(config.effective_kernel(), 5);
        let config = CaConfig {
            kernel_size: 3,
            ..Default::default()
        };
        assert_eq!(config.effective_kernel(), 3);
    }

    #[test]
    fn test_deterministic_tiles() {
        let task = simple_task(24, 24, vec![east_connector(0, 12)]);
        let config = CaConfig::default();
        let a = run_cell(&task, &config);
        let b = run_cell(&task, &config);
        assert_eq!(a.tiles, b.tiles);
    }

    #[test]
    fn test_masked_out_pixels_stay_wall() {
        let mut task = simple_task(16, 16, Vec::new());
        for y in 0..16 {
            for x in 8..16 {
                task.mask.set(x, y, 0);
            }
        }
        let result = run_cell(&task, &CaConfig::default());
        for y in 0..16 {
            for x in 8..16 {
                assert_eq!(result.tiles.at(x, y), WALL);
            }
        }
    }

    #[test]
    fn test_carved_pixels_are_floor_after_iterations() {
        let task = simple_task(24, 24, vec![east_connector(0, 12)]);
        let config = CaConfig {
            iterations: 8,
            initial_wall_probability: 1.0,
            connector_depth: 6,
            ..Default::default()
        };
        let result = run_cell(&task, &config);
        // the connector line is pinned open even in an all-wall cell
        for step in 0..6 {
            assert_eq!(
                result.tiles.at(step, 12),
                FLOOR,
                "carved pixel {} sealed",
                step
            );
        }
    }

    #[test]
    fn test_zero_iterations_is_initial_fill() {
        let task = simple_task(20, 20, vec![east_connector(0, 10)]);
        let config = CaConfig {
            iterations: 0,
            ..Default::default()
        };
        let result = run_cell(&task, &config);

        // replay the fill rule with the same stream
        let carve = build_carve_mask(&task, config.connector_depth);
        let mut rng = XorShiftRng::new(task.ca_seed);
        for y in 0..20 {
            for x in 0..20 {
                let expected = if carve.at(x, y) == 1 {
                    FLOOR
                } else if task.mask.at(x, y) == 0 {
                    WALL
                } else if rng.next_f32() < config.initial_wall_probability {
                    WALL
                } else {
                    FLOOR
                };
                assert_eq!(result.tiles.at(x, y), expected);
            }
        }
    }

    #[test]
    fn test_all_floor_with_zero_probability_and_limits() {
        let task = simple_task(12, 12, Vec::new());
        let config = CaConfig {
            initial_wall_probability: 0.0,
            birth_limit: 9,
            survival_limit: 9,
            iterations: 2,
            ..Default::default()
        };
        let result = run_cell(&task, &config);
        // interior pixels see at most the region border as walls; with a
        // 3x3 kernel only the outer ring can reach the birth limit
        for y in 2..10 {
            for x in 2..10 {
                assert_eq!(result.tiles.at(x, y), FLOOR);
            }
        }
    }

    #[test]
    fn test_region_border_counts_as_wall() {
        let task = simple_task(8, 8, Vec::new());
        let config = CaConfig {
            initial_wall_probability: 0.0,
            birth_limit: 5,
            survival_limit: 4,
            iterations: 1,
            ..Default::default()
        };
        let result = run_cell(&task, &config);
        // a corner floor pixel has 5 out-of-region neighbours, meeting the
        // birth limit
        assert_eq!(result.tiles.at(0, 0), WALL);
    }

    #[test]
    fn test_limits_clamped_to_kernel() {
        let task = simple_task(10, 10, Vec::new());
        let config = CaConfig {
            kernel_size: 3,
            birth_limit: 100,
            survival_limit: 100,
            initial_wall_probability: 1.0,
            iterations: 1,
            ..Default::default()
        };
        // birth/survival clamp to 8; an interior all-wall block survives
        let result = run_cell(&task, &config);
        assert_eq!(result.tiles.at(5, 5), WALL);
    }

    #[test]
    fn test_carve_skips_masked_out_pixels() {
        let mut task = simple_task(16, 16, vec![east_connector(0, 8)]);
        // mask out a column the carve line crosses
        for y in 0..16 {
            task.mask.set(2, y, 0);
        }
        let config = CaConfig {
            connector_depth: 6,
            iterations: 0,
            initial_wall_probability: 1.0,
            ..Default::default()
        };
        let result = run_cell(&task, &config);
        assert_eq!(result.tiles.at(2, 8), WALL, "masked pixel was carved");
        assert_eq!(result.tiles.at(3, 8), FLOOR, "line stopped at the gap");
    }

    #[test]
    fn test_result_carries_task_identity() {
        let task = simple_task(10, 10, vec![east_connector(0, 5)]);
        let result = run_cell(&task, &CaConfig::default());
        assert_eq!(result.cell_index, task.cell_index);
        assert_eq!(result.region, task.region);
        assert_eq!(result.connectors.len(), 1);
    }
}
