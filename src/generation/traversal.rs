//! Traversal graph construction over the Voronoi adjacency
//!
//! Two phases. Phase A runs Kruskal over the candidate edges sorted by
//! length descending, which biases the spanning tree toward long, open
//! connections and guarantees a single connected component. Phase B then
//! keeps drawing additional edges by cumulative-weighted sampling until the
//! requested share of neighbor pairs is connected, the pool is exhausted,
//! or the attempt bound is hit.
//!
//! Each accepted edge gets a connector point sampled along it with a cubic
//! smoothstep, pulled toward the edge midpoint by the distribution scaling.

use glam::Vec2;
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::cell::VoronoiEdge;
use crate::generation::voronoi::VoronoiDiagram;
use crate::seed::XorShiftRng;

/// Tuning knobs for traversal construction
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraversalOptions {
    /// Target share of neighbor pairs connected after phase B, in `[0, 1]`
    pub neighbor_coverage: f32,
    /// Connector sample bias in `[0, 1]`: 0 pins connectors to the edge
    /// midpoint, 1 applies the full smoothstep spread
    pub connection_distribution_scaling: f32,
    /// Whether canvas-border edges may host connections
    pub include_border_edges: bool,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            neighbor_coverage: 0.3,
            connection_distribution_scaling: 0.5,
            include_border_edges: false,
        }
    }
}

/// A chosen passage between two adjacent cells
#[derive(Debug, Clone, Copy)]
pub struct Connection {
    pub cell_a: usize,
    pub cell_b: usize,
    /// Index of the hosting edge in the diagram
    pub edge_index: usize,
    /// Connector point on the edge, in canvas space
    pub point_on_edge: Vec2,
    pub edge_length: f32,
}

/// The connectivity layer produced from a diagram
#[derive(Debug, Clone)]
pub struct TraversalGraph {
    /// Number of unordered adjacent cell pairs in the diagram
    pub total_neighbor_pairs: usize,
    /// Connection count phase B aimed for
    pub target_connections: usize,
    /// Accepted connections, spanning tree first
    pub connections: Vec<Connection>,
    /// Unordered cell pairs already connected
    pub connected_pairs: HashSet<(usize, usize)>,
}

impl TraversalGraph {
    /// Whether cells `a` and `b` are directly connected
    #[inline]
    pub fn is_connected_pair(&self, a: usize, b: usize) -> bool {
        self.connected_pairs.contains(&pair_key(a, b))
    }

    /// Connections touching `cell_index`, in acceptance order
    pub fn connections_for(&self, cell_index: usize) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.cell_a == cell_index || c.cell_b == cell_index)
            .collect()
    }
}

/// Union-find over cell indices
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`; false when already joined
    fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            Ordering::Less => self.parent[ra] = rb,
            Ordering::Greater => self.parent[rb] = ra,
            Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Build the traversal graph for a diagram
///
/// Deterministic for a given `(diagram, options, seed)`; all randomness
/// comes from the seed.
pub fn build_traversal(
    diagram: &VoronoiDiagram,
    options: &TraversalOptions,
    seed: u32,
) -> TraversalGraph {
    let edges = diagram.edges();
    let mut rng = XorShiftRng::new(seed);

    let total_neighbor_pairs = diagram.total_neighbor_pairs();

    // candidates in edge-index order; the stable sort below keeps that order
    // for equal weights
    let mut candidates: Vec<usize> = (0..edges.len())
        .filter(|&i| {
            let edge = &edges[i];
            (options.include_border_edges || !edge.is_border) && edge.length() > 0.0
        })
        .collect();
    candidates.sort_by(|&a, &b| {
        edges[b]
            .length()
            .partial_cmp(&edges[a].length())
            .unwrap_or(Ordering::Equal)
    });

    let mut connections: Vec<Connection> = Vec::new();
    let mut connected_pairs: HashSet<(usize, usize)> = HashSet::new();

    // phase A: biased spanning tree
    let cell_count = diagram.cell_count();
    let mut components = cell_count;
    let mut disjoint = DisjointSet::new(cell_count);
    for &edge_index in &candidates {
        if components <= 1 {
            break;
        }
        let edge = &edges[edge_index];
        if disjoint.union(edge.seed_a, edge.seed_b) {
            components -= 1;
            accept(
                edge,
                edge_index,
                &mut rng,
                options.connection_distribution_scaling,
                &mut connections,
                &mut connected_pairs,
            );
        }
    }

    // phase B: extra edges until the coverage target is met
    let target = connections.len().max(
        (options.neighbor_coverage as f64 * total_neighbor_pairs as f64).ceil() as usize,
    );

    let mut pool: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&i| {
            let edge = &edges[i];
            !connected_pairs.contains(&pair_key(edge.seed_a, edge.seed_b))
        })
        .collect();

    let mut attempts_left = 5 * pool.len();
    while connections.len() < target && !pool.is_empty() && attempts_left > 0 {
        attempts_left -= 1;

        let mut cumulative: Vec<f32> = Vec::with_capacity(pool.len());
        let mut total = 0.0f32;
        for &edge_index in &pool {
            total += edges[edge_index].length();
            cumulative.push(total);
        }
        if total <= 0.0 {
            break;
        }

        // smallest index whose cumulative weight reaches the draw
        let draw = rng.next_f32() * total;
        let chosen = cumulative
            .partition_point(|&c| c < draw)
            .min(pool.len() - 1);
        let edge_index = pool.remove(chosen);

        let edge = &edges[edge_index];
        if connected_pairs.contains(&pair_key(edge.seed_a, edge.seed_b)) {
            continue;
        }
        accept(
            edge,
            edge_index,
            &mut rng,
            options.connection_distribution_scaling,
            &mut connections,
            &mut connected_pairs,
        );
    }

    TraversalGraph {
        total_neighbor_pairs,
        target_connections: target,
        connections,
        connected_pairs,
    }
}

fn accept(
    edge: &VoronoiEdge,
    edge_index: usize,
    rng: &mut XorShiftRng,
    scaling: f32,
    connections: &mut Vec<Connection>,
    connected_pairs: &mut HashSet<(usize, usize)>,
) {
    connections.push(Connection {
        cell_a: edge.seed_a,
        cell_b: edge.seed_b,
        edge_index,
        point_on_edge: sample_edge_point(edge, rng, scaling),
        edge_length: edge.length(),
    });
    connected_pairs.insert(pair_key(edge.seed_a, edge.seed_b));
}

/// Smoothstep sample along the edge, pulled toward the midpoint by `scaling`
fn sample_edge_point(edge: &VoronoiEdge, rng: &mut XorShiftRng, scaling: f32) -> Vec2 {
    let t = rng.next_f32();
    let s = 3.0 * t * t - 2.0 * t * t * t;
    let fraction = (s - 0.5) * scaling + 0.5;
    edge.from + (edge.to - edge.from) * fraction
}

#[inline]
fn pair_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::poisson::sample_points;
    use glam::IVec2;

    const CANVAS: IVec2 = IVec2::new(96, 96);

    fn sample_diagram(seed: u32) -> VoronoiDiagram {
        let seeds = sample_points(CANVAS, 16.0, 30, 4, seed).unwrap();
        assert!(seeds.len() >= 4, "need a few cells, got {}", seeds.len());
        VoronoiDiagram::build(seeds, CANVAS).unwrap()
    }

    fn assert_connected(diagram: &VoronoiDiagram, traversal: &TraversalGraph) {
        let n = diagram.cell_count();
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        for c in &traversal.connections {
            adjacency[c.cell_a].push(c.cell_b);
            adjacency[c.cell_b].push(c.cell_a);
        }
        let mut visited = vec![false; n];
        let mut stack = vec![0usize];
        visited[0] = true;
        while let Some(cell) = stack.pop() {
            for &next in &adjacency[cell] {
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
        assert!(visited.iter().all(|&v| v), "traversal graph disconnected");
    }

    #[test]
    fn test_spanning_tree_connects_all_cells() {
        let diagram = sample_diagram(21);
        let options = TraversalOptions {
            neighbor_coverage: 0.0,
            include_border_edges: true,
            ..Default::default()
        };
        let traversal = build_traversal(&diagram, &options, 77);
        assert!(traversal.connections.len() >= diagram.cell_count() - 1);
        assert_connected(&diagram, &traversal);
    }

    #[test]
    fn test_connections_sit_on_their_edges() {
        let diagram = sample_diagram(21);
        let traversal =
            build_traversal(&diagram, &TraversalOptions::default(), 77);
        for c in &traversal.connections {
            let edge = &diagram.edges()[c.edge_index];
            assert!(edge.connects(c.cell_a, c.cell_b));
            assert!((c.edge_length - edge.length()).abs() < 1e-5);
            // the connector point lies on the segment
            let d = edge.to - edge.from;
            let t = if d.x.abs() > d.y.abs() {
                (c.point_on_edge.x - edge.from.x) / d.x
            } else {
                (c.point_on_edge.y - edge.from.y) / d.y
            };
            assert!((-1e-3..=1.0 + 1e-3).contains(&t), "off-edge connector t={}", t);
            let projected = edge.from + d * t;
            assert!(projected.distance(c.point_on_edge) < 1e-3);
        }
    }

    #[test]
    fn test_full_coverage_connects_every_candidate_pair() {
        let diagram = sample_diagram(5);
        let options = TraversalOptions {
            neighbor_coverage: 1.0,
            include_border_edges: true,
            ..Default::default()
        };
        let traversal = build_traversal(&diagram, &options, 9);

        // pairs that actually have a usable edge
        let candidate_pairs: HashSet<(usize, usize)> = diagram
            .edges()
            .iter()
            .filter(|e| e.length() > 0.0)
            .map(|e| pair_key(e.seed_a, e.seed_b))
            .collect();
        assert_eq!(traversal.target_connections, diagram.total_neighbor_pairs());
        assert_eq!(traversal.connections.len(), candidate_pairs.len());
        assert_eq!(traversal.connected_pairs, candidate_pairs);
    }

    #[test]
    fn test_coverage_target_met() {
        let diagram = sample_diagram(33);
        let options = TraversalOptions {
            neighbor_coverage: 0.5,
            include_border_edges: true,
            ..Default::default()
        };
        let traversal = build_traversal(&diagram, &options, 4);
        let target =
            (0.5f64 * diagram.total_neighbor_pairs() as f64).ceil() as usize;
        assert!(traversal.target_connections >= target);

        let candidate_pairs: HashSet<(usize, usize)> = diagram
            .edges()
            .iter()
            .filter(|e| e.length() > 0.0)
            .map(|e| pair_key(e.seed_a, e.seed_b))
            .collect();
        if candidate_pairs.len() >= target {
            assert!(
                traversal.connections.len() >= target,
                "coverage {} below target {}",
                traversal.connections.len(),
                target
            );
        }
        assert_connected(&diagram, &traversal);
    }

    #[test]
    fn test_no_duplicate_pairs() {
        let diagram = sample_diagram(2);
        let options = TraversalOptions {
            neighbor_coverage: 1.0,
            include_border_edges: true,
            ..Default::default()
        };
        let traversal = build_traversal(&diagram, &options, 1);
        let mut seen = HashSet::new();
        for c in &traversal.connections {
            assert!(
                seen.insert(pair_key(c.cell_a, c.cell_b)),
                "pair ({}, {}) connected twice",
                c.cell_a,
                c.cell_b
            );
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let diagram = sample_diagram(12);
        let options = TraversalOptions::default();
        let a = build_traversal(&diagram, &options, 55);
        let b = build_traversal(&diagram, &options, 55);
        assert_eq!(a.connections.len(), b.connections.len());
        for (ca, cb) in a.connections.iter().zip(b.connections.iter()) {
            assert_eq!(ca.cell_a, cb.cell_a);
            assert_eq!(ca.cell_b, cb.cell_b);
            assert_eq!(ca.edge_index, cb.edge_index);
            assert_eq!(ca.point_on_edge, cb.point_on_edge);
        }
    }

    #[test]
    fn test_border_edges_excluded_by_default() {
        let diagram = sample_diagram(12);
        let traversal =
            build_traversal(&diagram, &TraversalOptions::default(), 3);
        for c in &traversal.connections {
            assert!(!diagram.edges()[c.edge_index].is_border);
        }
    }

    #[test]
    fn test_midpoint_pinning_at_zero_scaling() {
        let diagram = sample_diagram(12);
        let options = TraversalOptions {
            connection_distribution_scaling: 0.0,
            ..Default::default()
        };
        let traversal = build_traversal(&diagram, &options, 3);
        for c in &traversal.connections {
            let edge = &diagram.edges()[c.edge_index];
            let midpoint = (edge.from + edge.to) * 0.5;
            assert!(c.point_on_edge.distance(midpoint) < 1e-3);
        }
    }
}
