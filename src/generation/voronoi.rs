//! Voronoi diagram construction from Delaunay triangulation
//!
//! Builds the full diagram consumed by the later stages: clipped Voronoi
//! edges, symmetric cell adjacency, per-cell bounding boxes, and the
//! canvas-wide ownership grid. The ownership grid is computed by brute-force
//! nearest-seed labelling of every pixel centre; it is the single source of
//! truth when per-cell CA output is merged back into the canvas.

use glam::{IVec2, Vec2};
use std::collections::{BTreeSet, HashMap};

use crate::cell::{DelaunayTriangle, VoronoiCell, VoronoiEdge};
use crate::error::Result;
use crate::generation::delaunay;
use crate::grid::{Grid, Rect};

/// Clipped edges shorter than this are dropped
const MIN_EDGE_LENGTH: f32 = 0.5;

/// An immutable Voronoi partition of the canvas
///
/// All cross-references (cell to edge, edge to cell, triangle to seed) are
/// indices into the diagram's sequences, never pointers, so the diagram can
/// be shared read-only across worker threads.
#[derive(Debug, Clone)]
pub struct VoronoiDiagram {
    size: IVec2,
    seeds: Vec<Vec2>,
    cells: Vec<VoronoiCell>,
    edges: Vec<VoronoiEdge>,
    triangles: Vec<DelaunayTriangle>,
    ownership: Grid<i32>,
}

impl VoronoiDiagram {
    /// Build a diagram from seed points inside a `size` canvas
    ///
    /// Fewer than three seeds are handled specially: zero or one seed
    /// produce no edges, and exactly two seeds produce their perpendicular
    /// bisector clipped to the canvas as a single border edge.
    pub fn build(seeds: Vec<Vec2>, size: IVec2) -> Result<Self> {
        let cell_count = seeds.len();
        let canvas_max = Vec2::new(size.x as f32, size.y as f32);

        let triangles = if cell_count >= 3 {
            delaunay::triangulate(&seeds)
        } else {
            Vec::new()
        };

        let mut neighbor_sets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); cell_count];
        let mut edges: Vec<VoronoiEdge> = Vec::new();
        let mut edge_refs: Vec<Vec<usize>> = vec![Vec::new(); cell_count];

        if cell_count == 2 {
            build_bisector_edge(
                &seeds,
                canvas_max,
                &mut edges,
                &mut edge_refs,
                &mut neighbor_sets,
            );
        } else if cell_count >= 3 {
            build_edges_from_triangles(
                &seeds,
                &triangles,
                canvas_max,
                &mut edges,
                &mut edge_refs,
                &mut neighbor_sets,
            );
        }

        let cells = (0..cell_count)
            .map(|i| {
                let bounds = cell_bounds(seeds[i], &edge_refs[i], &edges);
                VoronoiCell {
                    seed_index: i,
                    seed: seeds[i],
                    neighbors: neighbor_sets[i].iter().copied().collect(),
                    edge_indices: edge_refs[i].clone(),
                    bounds,
                }
            })
            .collect();

        let ownership = build_ownership_grid(&seeds, size);

        Ok(Self {
            size,
            seeds,
            cells,
            edges,
            triangles,
            ownership,
        })
    }

    /// Canvas extent in pixels
    #[inline]
    pub fn size(&self) -> IVec2 {
        self.size
    }

    /// Seed positions; `cell_index` is a position in this sequence
    #[inline]
    pub fn seeds(&self) -> &[Vec2] {
        &self.seeds
    }

    #[inline]
    pub fn cells(&self) -> &[VoronoiCell] {
        &self.cells
    }

    #[inline]
    pub fn edges(&self) -> &[VoronoiEdge] {
        &self.edges
    }

    #[inline]
    pub fn triangles(&self) -> &[DelaunayTriangle] {
        &self.triangles
    }

    /// Per-pixel nearest-seed indices; `-1` only when there are no seeds
    #[inline]
    pub fn ownership(&self) -> &Grid<i32> {
        &self.ownership
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Get a cell by index
    #[inline]
    pub fn get_cell(&self, index: usize) -> Option<&VoronoiCell> {
        self.cells.get(index)
    }

    /// Index of the cell owning pixel `(x, y)`, or `-1` outside the canvas
    #[inline]
    pub fn cell_at(&self, x: i32, y: i32) -> i32 {
        if self.ownership.in_bounds(x, y) {
            self.ownership.at(x, y)
        } else {
            -1
        }
    }

    /// Number of unordered adjacent cell pairs
    pub fn total_neighbor_pairs(&self) -> usize {
        self.cells.iter().map(|c| c.neighbors.len()).sum::<usize>() / 2
    }
}

/// Two-seed special case: the perpendicular bisector, clipped to the canvas
fn build_bisector_edge(
    seeds: &[Vec2],
    canvas_max: Vec2,
    edges: &mut Vec<VoronoiEdge>,
    edge_refs: &mut [Vec<usize>],
    neighbor_sets: &mut [BTreeSet<usize>],
) {
    neighbor_sets[0].insert(1);
    neighbor_sets[1].insert(0);

    let mid = (seeds[0] + seeds[1]) * 0.5;
    let along = perpendicular(seeds[1] - seeds[0]);
    if along == Vec2::ZERO {
        return;
    }
    let reach = (canvas_max.x + canvas_max.y) * 2.0;
    if let Some((from, to)) = clip_segment(mid - along * reach, mid + along * reach, canvas_max) {
        if from.distance(to) >= MIN_EDGE_LENGTH {
            edges.push(VoronoiEdge {
                from,
                to,
                seed_a: 0,
                seed_b: 1,
                is_border: true,
            });
            edge_refs[0].push(0);
            edge_refs[1].push(0);
        }
    }
}

/// General case: walk the triangle list, accumulate the undirected Delaunay
/// edge map, then emit one Voronoi edge per surviving Delaunay edge
fn build_edges_from_triangles(
    seeds: &[Vec2],
    triangles: &[DelaunayTriangle],
    canvas_max: Vec2,
    edges: &mut Vec<VoronoiEdge>,
    edge_refs: &mut [Vec<usize>],
    neighbor_sets: &mut [BTreeSet<usize>],
) {
    // per Delaunay edge: incident triangles plus the vertex opposite each,
    // stored in first-encounter order so the edge sequence is deterministic
    struct EdgeEntry {
        key: (usize, usize),
        triangles: Vec<usize>,
        opposites: Vec<usize>,
    }

    let mut entry_index: HashMap<(usize, usize), usize> = HashMap::new();
    let mut entries: Vec<EdgeEntry> = Vec::new();

    for (tri_index, tri) in triangles.iter().enumerate() {
        for k in 0..3 {
            let a = tri.vertices[k];
            let b = tri.vertices[(k + 1) % 3];
            let opposite = tri.vertices[(k + 2) % 3];
            let key = (a.min(b), a.max(b));

            let slot = *entry_index.entry(key).or_insert_with(|| {
                entries.push(EdgeEntry {
                    key,
                    triangles: Vec::new(),
                    opposites: Vec::new(),
                });
                entries.len() - 1
            });
            entries[slot].triangles.push(tri_index);
            entries[slot].opposites.push(opposite);

            neighbor_sets[a].insert(b);
            neighbor_sets[b].insert(a);
        }
    }

    for entry in &entries {
        let (seed_a, seed_b) = entry.key;
        let (from, to, is_border) = match entry.triangles.len() {
            2 => (
                triangles[entry.triangles[0]].circumcenter,
                triangles[entry.triangles[1]].circumcenter,
                false,
            ),
            1 => {
                // hull edge: a ray from the lone circumcenter along the
                // Delaunay edge's perpendicular, away from the opposite vertex
                let start = triangles[entry.triangles[0]].circumcenter;
                let mut direction = perpendicular(seeds[seed_b] - seeds[seed_a]);
                if direction == Vec2::ZERO {
                    continue;
                }
                if direction.dot(seeds[entry.opposites[0]] - start) > 0.0 {
                    direction = -direction;
                }
                let reach = (canvas_max.x + canvas_max.y) * 2.0;
                (start, start + direction * reach, true)
            }
            _ => continue,
        };

        let Some((from, to)) = clip_segment(from, to, canvas_max) else {
            continue;
        };
        if from.distance(to) < MIN_EDGE_LENGTH {
            continue;
        }

        let edge_index = edges.len();
        edges.push(VoronoiEdge {
            from,
            to,
            seed_a,
            seed_b,
            is_border,
        });
        edge_refs[seed_a].push(edge_index);
        edge_refs[seed_b].push(edge_index);
    }
}

/// Unit perpendicular of `v`, or zero when `v` is degenerate
#[inline]
fn perpendicular(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x).normalize_or_zero()
}

/// Integer envelope of the seed and every referenced edge endpoint
///
/// Mins are floored and maxes are ceiled; the seed always contributes a
/// one-pixel margin so the box is never empty.
fn cell_bounds(seed: Vec2, edge_refs: &[usize], edges: &[VoronoiEdge]) -> Rect {
    let mut x0 = seed.x.floor() as i32 - 1;
    let mut y0 = seed.y.floor() as i32 - 1;
    let mut x1 = seed.x.ceil() as i32 + 1;
    let mut y1 = seed.y.ceil() as i32 + 1;

    for &edge_index in edge_refs {
        let edge = &edges[edge_index];
        for endpoint in [edge.from, edge.to] {
            x0 = x0.min(endpoint.x.floor() as i32);
            y0 = y0.min(endpoint.y.floor() as i32);
            x1 = x1.max(endpoint.x.ceil() as i32);
            y1 = y1.max(endpoint.y.ceil() as i32);
        }
    }

    Rect::from_bounds(x0, y0, x1, y1)
}

/// Label every pixel centre with its nearest seed, smaller index winning ties
fn build_ownership_grid(seeds: &[Vec2], size: IVec2) -> Grid<i32> {
    let mut ownership = Grid::new(size.x, size.y, -1);
    if seeds.is_empty() {
        return ownership;
    }

    for y in 0..size.y {
        for x in 0..size.x {
            let centre = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let mut best = 0usize;
            let mut best_dist = centre.distance_squared(seeds[0]);
            for (i, seed) in seeds.iter().enumerate().skip(1) {
                let dist = centre.distance_squared(*seed);
                if dist < best_dist {
                    best = i;
                    best_dist = dist;
                }
            }
            ownership.set(x, y, best as i32);
        }
    }
    ownership
}

/// Liang-Barsky clip of a segment against `[0, max.x] x [0, max.y]`
fn clip_segment(p0: Vec2, p1: Vec2, max: Vec2) -> Option<(Vec2, Vec2)> {
    let delta = p1 - p0;
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;

    let checks = [
        (-delta.x, p0.x),
        (delta.x, max.x - p0.x),
        (-delta.y, p0.y),
        (delta.y, max.y - p0.y),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return None;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }
    }

    Some((p0 + delta * t0, p0 + delta * t1))
}
