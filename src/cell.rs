//! Voronoi cell, edge, and triangle records
//!
//! These are the plain value types that make up a [`VoronoiDiagram`]. Cells,
//! edges, and triangles reference each other purely through indices into the
//! diagram's sequences, which keeps the diagram trivially shareable
//! read-only across CA workers.
//!
//! [`VoronoiDiagram`]: crate::generation::VoronoiDiagram

use glam::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::grid::Rect;

/// A single Voronoi cell of the partition
///
/// Each cell owns the set of canvas pixels closer to its seed than to any
/// other seed. Neighbor and edge links are indices into the parent diagram.
///
/// # Design Notes
///
/// Cells are not serialized as part of a saved map; a map is regenerated
/// from its configuration, which keeps save data to a handful of bytes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct VoronoiCell {
    /// Index of this cell's seed in the diagram's seed sequence
    pub seed_index: usize,
    /// Seed position in canvas space
    pub seed: Vec2,
    /// Indices of adjacent cells, sorted ascending
    pub neighbors: Vec<usize>,
    /// Indices into the diagram's edge sequence, in edge-discovery order
    pub edge_indices: Vec<usize>,
    /// Integer envelope of the seed and every referenced edge endpoint
    ///
    /// Covers every pixel the cell owns in the ownership grid, and always
    /// includes the seed pixel with one pixel of slack.
    pub bounds: Rect,
}

impl VoronoiCell {
    /// Number of adjacent cells
    #[inline]
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }
}

/// An undirected Voronoi edge between two cells, clipped to the canvas
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct VoronoiEdge {
    /// First endpoint in canvas space
    pub from: Vec2,
    /// Second endpoint in canvas space
    pub to: Vec2,
    /// Smaller of the two incident cell indices
    pub seed_a: usize,
    /// Larger of the two incident cell indices
    pub seed_b: usize,
    /// Whether this edge came from the hull (one incident triangle) and was
    /// clipped against the canvas boundary
    pub is_border: bool,
}

impl VoronoiEdge {
    /// Euclidean length of the clipped segment
    #[inline]
    pub fn length(&self) -> f32 {
        self.from.distance(self.to)
    }

    /// Whether this edge separates cells `a` and `b` (order-insensitive)
    #[inline]
    pub fn connects(&self, a: usize, b: usize) -> bool {
        (self.seed_a == a && self.seed_b == b) || (self.seed_a == b && self.seed_b == a)
    }
}

/// A Delaunay triangle over the seed set
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct DelaunayTriangle {
    /// Seed indices of the three corners
    pub vertices: [usize; 3],
    /// Circumcenter in canvas space (centroid when the corners are
    /// near-collinear)
    pub circumcenter: Vec2,
}
