//! Spatial indexing for fast position-to-cell lookups
//!
//! This module is only available with the `spatial-index` feature. The
//! ownership grid already answers pixel queries exactly; the KD-tree is for
//! callers holding arbitrary float positions (cursor coordinates, entity
//! positions) who want the nearest cell without a grid lookup contract.

#[cfg(feature = "spatial-index")]
use kiddo::immutable::float::kdtree::ImmutableKdTree;
#[cfg(feature = "spatial-index")]
use kiddo::SquaredEuclidean;

#[cfg(feature = "spatial-index")]
use glam::Vec2;

/// Wrapper around a 2D KD-tree over the diagram's seed points
///
/// Construction is O(n log n) once per generated map; queries are O(log n).
#[cfg(feature = "spatial-index")]
#[derive(Clone)]
pub struct SpatialIndex {
    tree: ImmutableKdTree<f32, usize, 2, 32>,
}

#[cfg(feature = "spatial-index")]
impl SpatialIndex {
    /// Build the index from seed positions
    ///
    /// The caller guarantees `seeds` is non-empty.
    pub fn new(seeds: &[Vec2]) -> Self {
        let points: Vec<[f32; 2]> = seeds.iter().map(|s| [s.x, s.y]).collect();
        Self {
            tree: ImmutableKdTree::new_from_slice(&points),
        }
    }

    /// Index of the seed nearest to `position`
    pub fn find_nearest(&self, position: Vec2) -> usize {
        let query = [position.x, position.y];
        let result = self.tree.nearest_one::<SquaredEuclidean>(&query);
        result.item as usize
    }
}

#[cfg(test)]
#[cfg(feature = "spatial-index")]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_index_basic() {
        let seeds = vec![
            Vec2::new(10.0, 10.0),
            Vec2::new(50.0, 12.0),
            Vec2::new(30.0, 48.0),
        ];
        let index = SpatialIndex::new(&seeds);

        assert_eq!(index.find_nearest(Vec2::new(11.0, 9.0)), 0);
        assert_eq!(index.find_nearest(Vec2::new(48.0, 14.0)), 1);
        assert_eq!(index.find_nearest(Vec2::new(31.0, 50.0)), 2);
    }

    #[test]
    fn test_exact_seed_positions() {
        let seeds = vec![Vec2::new(5.0, 5.0), Vec2::new(20.0, 20.0)];
        let index = SpatialIndex::new(&seeds);
        for (i, seed) in seeds.iter().enumerate() {
            assert_eq!(index.find_nearest(*seed), i);
        }
    }
}
