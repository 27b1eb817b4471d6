//! Poisson-disk blue-noise sampling
//!
//! Bridson's algorithm: an acceleration grid with cells of side `r / sqrt(2)`
//! guarantees at most one sample per cell, so a 5x5 cell neighborhood is
//! enough to check the minimum-separation constraint. Samples are generated
//! inside a rectangle shrunk by `padding` on every side and translated back
//! afterwards, keeping seeds away from the canvas border.
//!
//! All randomness comes from the provided seed, so the sample sequence is a
//! pure function of `(canvas_size, radius, attempts, padding, seed)`.

use glam::{IVec2, Vec2};
use std::f32::consts::TAU;

use crate::error::{CaveError, Result};
use crate::grid::Grid;
use crate::seed::XorShiftRng;

/// Generate a blue-noise point set inside the padded canvas rectangle
///
/// # Arguments
///
/// * `canvas_size` - Canvas extent in pixels
/// * `radius` - Minimum separation between any two samples
/// * `attempts` - Annulus candidates tried per active sample before it is
///   retired (Bridson's `k`, typically 30)
/// * `padding` - Border keep-out in pixels
/// * `seed` - RNG seed for this stage
///
/// # Returns
///
/// Sample positions in canvas space, in generation order. The set is empty
/// when the padded region has no area, and holds a single point when the
/// region is smaller than the separation radius.
///
/// # Errors
///
/// `InvalidConfig` when `radius` is not positive.
pub fn sample_points(
    canvas_size: IVec2,
    radius: f32,
    attempts: u32,
    padding: i32,
    seed: u32,
) -> Result<Vec<Vec2>> {
    if radius <= 0.0 {
        return Err(CaveError::InvalidConfig(format!(
            "poisson radius must be positive (got {})",
            radius
        )));
    }

    let region = Vec2::new(
        (canvas_size.x - 2 * padding) as f32,
        (canvas_size.y - 2 * padding) as f32,
    );
    if region.x <= 0.0 || region.y <= 0.0 {
        return Ok(Vec::new());
    }

    let mut rng = XorShiftRng::new(seed);
    let cell_size = radius / std::f32::consts::SQRT_2;
    let grid_w = ((region.x / cell_size).ceil() as i32).max(1);
    let grid_h = ((region.y / cell_size).ceil() as i32).max(1);

    // grid entry holds the index of the sample occupying that cell, or -1
    let mut occupancy: Grid<i32> = Grid::new(grid_w, grid_h, -1);
    let mut samples: Vec<Vec2> = Vec::new();
    let mut active: Vec<usize> = Vec::new();

    let first = Vec2::new(rng.next_f32() * region.x, rng.next_f32() * region.y);
    insert_sample(first, cell_size, &mut occupancy, &mut samples, &mut active);

    while !active.is_empty() {
        let pick = rng.next_int(0, active.len() as i32 - 1) as usize;
        let center = samples[active[pick]];
        let mut placed = false;

        for _ in 0..attempts {
            let u = rng.next_f32();
            let v = rng.next_f32();
            let dist = radius * (1.0 + u.sqrt());
            let angle = TAU * v;
            let candidate = center + Vec2::new(angle.cos(), angle.sin()) * dist;

            if candidate.x < 0.0
                || candidate.y < 0.0
                || candidate.x >= region.x
                || candidate.y >= region.y
            {
                continue;
            }
            if !fits(candidate, radius, cell_size, &occupancy, &samples) {
                continue;
            }

            insert_sample(candidate, cell_size, &mut occupancy, &mut samples, &mut active);
            placed = true;
            break;
        }

        if !placed {
            active.swap_remove(pick);
        }
    }

    let offset = Vec2::splat(padding as f32);
    Ok(samples.into_iter().map(|p| p + offset).collect())
}

fn insert_sample(
    position: Vec2,
    cell_size: f32,
    occupancy: &mut Grid<i32>,
    samples: &mut Vec<Vec2>,
    active: &mut Vec<usize>,
) {
    let index = samples.len();
    let cell = grid_cell(position, cell_size);
    samples.push(position);
    occupancy.set(cell.x, cell.y, index as i32);
    active.push(index);
}

#[inline]
fn grid_cell(position: Vec2, cell_size: f32) -> IVec2 {
    IVec2::new(
        (position.x / cell_size).floor() as i32,
        (position.y / cell_size).floor() as i32,
    )
}

/// Check the 5x5 cell neighborhood for a sample closer than `radius`
fn fits(
    candidate: Vec2,
    radius: f32,
    cell_size: f32,
    occupancy: &Grid<i32>,
    samples: &[Vec2],
) -> bool {
    let cell = grid_cell(candidate, cell_size);
    let radius_sq = radius * radius;
    for dy in -2..=2 {
        for dx in -2..=2 {
            let nx = cell.x + dx;
            let ny = cell.y + dy;
            if !occupancy.in_bounds(nx, ny) {
                continue;
            }
            let occupant = occupancy.at(nx, ny);
            if occupant < 0 {
                continue;
            }
            if samples[occupant as usize].distance_squared(candidate) < radius_sq {
                return false;
            }
        }
    }
    true
}
