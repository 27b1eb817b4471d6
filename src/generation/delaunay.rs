//! Delaunay triangulation via Bowyer-Watson incremental insertion
//!
//! Points are inserted in input order into a triangulation seeded with one
//! large super-triangle; triangles whose circumcircle contains the new point
//! are removed and the resulting cavity is re-triangulated as a fan. The
//! insertion order is fixed, so identical input produces an identical
//! triangle sequence.
//!
//! The in-circle test and circumcenter math run in `f64` to keep the
//! predicates stable at canvas scale.

use glam::Vec2;

use crate::cell::DelaunayTriangle;

/// Determinant threshold below which a triangle counts as degenerate
const DEGENERATE_EPSILON: f64 = 1e-9;

/// Triangulate a point set; fewer than three points yield no triangles
///
/// Triangle vertex indices refer to positions in `points`. Each triangle
/// carries its circumcenter; near-collinear corners fall back to the
/// centroid.
pub fn triangulate(points: &[Vec2]) -> Vec<DelaunayTriangle> {
    if points.len() < 3 {
        return Vec::new();
    }

    // working vertex list: the input points followed by the super-triangle
    let mut vertices: Vec<Vec2> = points.to_vec();
    let mut min = points[0];
    let mut max = points[0];
    for p in points {
        min = min.min(*p);
        max = max.max(*p);
    }
    let span = (max - min).max_element().max(1.0);
    let mid = (min + max) * 0.5;

    let super_base = vertices.len();
    vertices.push(Vec2::new(mid.x - 20.0 * span, mid.y - span));
    vertices.push(Vec2::new(mid.x + 20.0 * span, mid.y - span));
    vertices.push(Vec2::new(mid.x, mid.y + 20.0 * span));

    let mut triangles: Vec<[usize; 3]> = vec![[super_base, super_base + 1, super_base + 2]];

    for point_index in 0..points.len() {
        let point = vertices[point_index];

        // triangles invalidated by the new point
        let mut bad: Vec<usize> = Vec::new();
        for (tri_index, tri) in triangles.iter().enumerate() {
            if circumcircle_contains(
                vertices[tri[0]],
                vertices[tri[1]],
                vertices[tri[2]],
                point,
            ) {
                bad.push(tri_index);
            }
        }

        // cavity boundary: edges owned by exactly one invalidated triangle
        let mut boundary: Vec<(usize, usize)> = Vec::new();
        for &tri_index in &bad {
            let tri = triangles[tri_index];
            for k in 0..3 {
                let edge = (tri[k], tri[(k + 1) % 3]);
                let shared = bad
                    .iter()
                    .any(|&other| other != tri_index && has_edge(triangles[other], edge));
                if !shared {
                    boundary.push(edge);
                }
            }
        }

        // remove invalidated triangles, largest index first so swap_remove
        // never disturbs a pending index
        for &tri_index in bad.iter().rev() {
            triangles.swap_remove(tri_index);
        }

        for &(a, b) in &boundary {
            triangles.push([a, b, point_index]);
        }
    }

    triangles.retain(|tri| tri.iter().all(|&v| v < super_base));
    triangles
        .iter()
        .map(|tri| DelaunayTriangle {
            vertices: *tri,
            circumcenter: circumcenter(vertices[tri[0]], vertices[tri[1]], vertices[tri[2]]),
        })
        .collect()
}

/// Circumcenter of a triangle, falling back to the centroid when the
/// corners are near-collinear
pub fn circumcenter(a: Vec2, b: Vec2, c: Vec2) -> Vec2 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (cx, cy) = (c.x as f64, c.y as f64);

    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < DEGENERATE_EPSILON {
        return (a + b + c) / 3.0;
    }

    let a_sq = ax * ax + ay * ay;
    let b_sq = bx * bx + by * by;
    let c_sq = cx * cx + cy * cy;
    let ux = (a_sq * (by - cy) + b_sq * (cy - ay) + c_sq * (ay - by)) / d;
    let uy = (a_sq * (cx - bx) + b_sq * (ax - cx) + c_sq * (bx - ax)) / d;
    Vec2::new(ux as f32, uy as f32)
}

/// Whether `p` lies strictly inside the circumcircle of `(a, b, c)`
fn circumcircle_contains(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> bool {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (cx, cy) = (c.x as f64, c.y as f64);

    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < DEGENERATE_EPSILON {
        return false;
    }

    let a_sq = ax * ax + ay * ay;
    let b_sq = bx * bx + by * by;
    let c_sq = cx * cx + cy * cy;
    let ux = (a_sq * (by - cy) + b_sq * (cy - ay) + c_sq * (ay - by)) / d;
    let uy = (a_sq * (cx - bx) + b_sq * (ax - cx) + c_sq * (bx - ax)) / d;

    let radius_sq = (ax - ux) * (ax - ux) + (ay - uy) * (ay - uy);
    let (px, py) = (p.x as f64, p.y as f64);
    (px - ux) * (px - ux) + (py - uy) * (py - uy) < radius_sq
}

#[inline]
fn has_edge(tri: [usize; 3], edge: (usize, usize)) -> bool {
    tri.contains(&edge.0) && tri.contains(&edge.1)
}
