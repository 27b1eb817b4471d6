//! Cave generation configuration and builder
//!
//! The configuration is a small plain block of numbers; a map is always
//! regenerated from it, never stored. The builder validates every parameter
//! up front so `CaveMap::generate` can assume a sane configuration, and
//! `CaveConfig::validate` re-checks hand-assembled configurations.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::IVec2;

use crate::ca::CaConfig;
use crate::error::{CaveError, Result};
use crate::generation::TraversalOptions;
use crate::seed::SeedChain;

/// Configuration for deterministic cave map generation
///
/// The same configuration always produces the identical map, including
/// across thread counts. Only this block needs to be persisted to reproduce
/// a map.
///
/// # Example
///
/// ```rust
/// use voronoi_caves::*;
///
/// let config = CaveConfigBuilder::new()
///     .base_seed(42)
///     .canvas_size(96, 96).unwrap()
///     .poisson_radius(18.0).unwrap()
///     .build().unwrap();
///
/// # #[cfg(feature = "serde")]
/// # {
/// let json = serde_json::to_string(&config).unwrap();
/// let restored: CaveConfig = serde_json::from_str(&json).unwrap();
/// assert_eq!(config.base_seed, restored.base_seed);
/// # }
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaveConfig {
    /// Base seed; zero is normalized to a fixed constant
    pub base_seed: u32,
    /// Pinned Poisson stage seed; `None` derives it from the base seed
    pub poisson_seed: Option<u32>,
    /// Pinned traversal stage seed; `None` derives it from the base seed
    pub traversal_seed: Option<u32>,
    /// Canvas width in pixels
    pub canvas_width: i32,
    /// Canvas height in pixels
    pub canvas_height: i32,
    /// Minimum seed separation in pixels
    pub poisson_radius: f32,
    /// Rejection samples per active point (Bridson's k)
    pub poisson_attempts: u32,
    /// Border keep-out for seed placement, in pixels
    pub seed_padding: i32,
    /// Target share of neighbor pairs connected by traversal, in `[0, 1]`
    pub neighbor_coverage: f32,
    /// Connector sample bias in `[0, 1]`; 0 pins connectors to midpoints
    pub connection_distribution_scaling: f32,
    /// Whether canvas-border edges may host connections
    pub include_border_edges: bool,
    /// Extra pixels around each cell's CA region
    pub cell_padding: i32,
    /// Cellular automata rule
    pub ca: CaConfig,
    /// Maximum concurrent CA workers; 0 or below means hardware default
    pub parallelism: i32,
}

impl CaveConfig {
    /// Canvas extent as a vector
    #[inline]
    pub fn canvas_size(&self) -> IVec2 {
        IVec2::new(self.canvas_width, self.canvas_height)
    }

    /// Derive the full seed chain, honoring pinned stage seeds
    #[inline]
    pub fn seed_chain(&self) -> SeedChain {
        SeedChain::with_overrides(self.base_seed, self.poisson_seed, self.traversal_seed)
    }

    pub(crate) fn traversal_options(&self) -> TraversalOptions {
        TraversalOptions {
            neighbor_coverage: self.neighbor_coverage,
            connection_distribution_scaling: self.connection_distribution_scaling,
            include_border_edges: self.include_border_edges,
        }
    }

    /// Check every parameter range
    ///
    /// Builder-made configurations always pass; this guards configurations
    /// assembled or deserialized by hand.
    pub fn validate(&self) -> Result<()> {
        if self.canvas_width <= 0 || self.canvas_height <= 0 {
            return Err(CaveError::InvalidConfig(format!(
                "canvas size must be positive (got {}x{})",
                self.canvas_width, self.canvas_height
            )));
        }
        if self.poisson_radius <= 0.0 {
            return Err(CaveError::InvalidConfig(format!(
                "poisson radius must be positive (got {})",
                self.poisson_radius
            )));
        }
        if self.poisson_attempts == 0 {
            return Err(CaveError::InvalidConfig(
                "poisson attempts must be at least 1".to_string(),
            ));
        }
        if self.seed_padding < 0 {
            return Err(CaveError::InvalidConfig(format!(
                "seed padding must be non-negative (got {})",
                self.seed_padding
            )));
        }
        if !(0.0..=1.0).contains(&self.neighbor_coverage) {
            return Err(CaveError::InvalidConfig(format!(
                "neighbor coverage must be in [0, 1] (got {})",
                self.neighbor_coverage
            )));
        }
        if !(0.0..=1.0).contains(&self.connection_distribution_scaling) {
            return Err(CaveError::InvalidConfig(format!(
                "connection distribution scaling must be in [0, 1] (got {})",
                self.connection_distribution_scaling
            )));
        }
        if self.cell_padding < 0 {
            return Err(CaveError::InvalidConfig(format!(
                "cell padding must be non-negative (got {})",
                self.cell_padding
            )));
        }
        if self.ca.kernel_size < 3 {
            return Err(CaveError::InvalidConfig(format!(
                "CA kernel size must be at least 3 (got {})",
                self.ca.kernel_size
            )));
        }
        if !(0.0..=1.0).contains(&self.ca.initial_wall_probability) {
            return Err(CaveError::InvalidConfig(format!(
                "initial wall probability must be in [0, 1] (got {})",
                self.ca.initial_wall_probability
            )));
        }
        Ok(())
    }
}

impl Default for CaveConfig {
    fn default() -> Self {
        CaveConfigBuilder::new().build().unwrap()
    }
}

/// Builder for creating a [`CaveConfig`] with validation
///
/// Fallible setters reject out-of-range values immediately, so an
/// assembled configuration is always valid.
///
/// # Example
///
/// ```rust
/// use voronoi_caves::*;
///
/// let config = CaveConfigBuilder::new()
///     .base_seed(12345)
///     .canvas_size(128, 96).unwrap()
///     .poisson_radius(20.0).unwrap()
///     .neighbor_coverage(0.5).unwrap()
///     .parallelism(4)
///     .build().unwrap();
/// assert_eq!(config.canvas_height, 96);
/// ```
#[derive(Debug, Clone)]
pub struct CaveConfigBuilder {
    base_seed: Option<u32>,
    poisson_seed: Option<u32>,
    traversal_seed: Option<u32>,
    canvas_width: i32,
    canvas_height: i32,
    poisson_radius: f32,
    poisson_attempts: u32,
    seed_padding: i32,
    neighbor_coverage: f32,
    connection_distribution_scaling: f32,
    include_border_edges: bool,
    cell_padding: i32,
    ca: CaConfig,
    parallelism: i32,
}

impl CaveConfigBuilder {
    /// Create a builder with the default parameter block
    ///
    /// Defaults: random base seed, 128x128 canvas, radius 24, 30 attempts,
    /// padding 2, coverage 0.3, scaling 0.5, border edges excluded, cell
    /// padding 2, default CA rule, hardware parallelism.
    pub fn new() -> Self {
        Self {
            base_seed: None,
            poisson_seed: None,
            traversal_seed: None,
            canvas_width: 128,
            canvas_height: 128,
            poisson_radius: 24.0,
            poisson_attempts: 30,
            seed_padding: 2,
            neighbor_coverage: 0.3,
            connection_distribution_scaling: 0.5,
            include_border_edges: false,
            cell_padding: 2,
            ca: CaConfig::default(),
            parallelism: 0,
        }
    }

    /// Set the base seed
    ///
    /// Zero is accepted and normalized during seed-chain derivation, so a
    /// zero seed reproduces the fixed-seed baseline rather than failing.
    pub fn base_seed(mut self, seed: u32) -> Self {
        self.base_seed = Some(seed);
        self
    }

    /// Pin the Poisson stage seed independently of the base seed
    pub fn poisson_seed(mut self, seed: u32) -> Self {
        self.poisson_seed = Some(seed);
        self
    }

    /// Pin the traversal stage seed independently of the base seed
    pub fn traversal_seed(mut self, seed: u32) -> Self {
        self.traversal_seed = Some(seed);
        self
    }

    /// Set the canvas extent in pixels
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when either component is not positive.
    pub fn canvas_size(mut self, width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(CaveError::InvalidConfig(format!(
                "canvas size must be positive (got {}x{})",
                width, height
            )));
        }
        self.canvas_width = width;
        self.canvas_height = height;
        Ok(self)
    }

    /// Set the minimum seed separation
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the radius is not positive.
    pub fn poisson_radius(mut self, radius: f32) -> Result<Self> {
        if radius <= 0.0 {
            return Err(CaveError::InvalidConfig(format!(
                "poisson radius must be positive (got {})",
                radius
            )));
        }
        self.poisson_radius = radius;
        Ok(self)
    }

    /// Set the rejection samples tried per active Poisson point
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when zero.
    pub fn poisson_attempts(mut self, attempts: u32) -> Result<Self> {
        if attempts == 0 {
            return Err(CaveError::InvalidConfig(
                "poisson attempts must be at least 1".to_string(),
            ));
        }
        self.poisson_attempts = attempts;
        Ok(self)
    }

    /// Set the border keep-out for seed placement
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when negative.
    pub fn seed_padding(mut self, padding: i32) -> Result<Self> {
        if padding < 0 {
            return Err(CaveError::InvalidConfig(format!(
                "seed padding must be non-negative (got {})",
                padding
            )));
        }
        self.seed_padding = padding;
        Ok(self)
    }

    /// Set the traversal coverage target
    ///
    /// # Errors
    ///
    /// `InvalidConfig` outside `[0, 1]`.
    pub fn neighbor_coverage(mut self, coverage: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&coverage) {
            return Err(CaveError::InvalidConfig(format!(
                "neighbor coverage must be in [0, 1] (got {})",
                coverage
            )));
        }
        self.neighbor_coverage = coverage;
        Ok(self)
    }

    /// Set the connector sample bias
    ///
    /// # Errors
    ///
    /// `InvalidConfig` outside `[0, 1]`.
    pub fn connection_distribution_scaling(mut self, scaling: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&scaling) {
            return Err(CaveError::InvalidConfig(format!(
                "connection distribution scaling must be in [0, 1] (got {})",
                scaling
            )));
        }
        self.connection_distribution_scaling = scaling;
        Ok(self)
    }

    /// Allow or forbid connections on canvas-border edges
    pub fn include_border_edges(mut self, include: bool) -> Self {
        self.include_border_edges = include;
        self
    }

    /// Set the extra pixels around each cell's CA region
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when negative.
    pub fn cell_padding(mut self, padding: i32) -> Result<Self> {
        if padding < 0 {
            return Err(CaveError::InvalidConfig(format!(
                "cell padding must be non-negative (got {})",
                padding
            )));
        }
        self.cell_padding = padding;
        Ok(self)
    }

    /// Set the cellular automata rule
    ///
    /// Even kernel sizes are legal and round up at run time; sizes below 3
    /// are rejected.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when `kernel_size < 3` or the wall probability is
    /// outside `[0, 1]`.
    pub fn ca(mut self, ca: CaConfig) -> Result<Self> {
        if ca.kernel_size < 3 {
            return Err(CaveError::InvalidConfig(format!(
                "CA kernel size must be at least 3 (got {})",
                ca.kernel_size
            )));
        }
        if !(0.0..=1.0).contains(&ca.initial_wall_probability) {
            return Err(CaveError::InvalidConfig(format!(
                "initial wall probability must be in [0, 1] (got {})",
                ca.initial_wall_probability
            )));
        }
        self.ca = ca;
        Ok(self)
    }

    /// Cap the number of concurrent CA workers; 0 or below means the
    /// hardware default
    pub fn parallelism(mut self, parallelism: i32) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Build the configuration
    ///
    /// Generates a random base seed when none was pinned.
    pub fn build(self) -> Result<CaveConfig> {
        let base_seed = self.base_seed.unwrap_or_else(rand::random);

        Ok(CaveConfig {
            base_seed,
            poisson_seed: self.poisson_seed,
            traversal_seed: self.traversal_seed,
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
            poisson_radius: self.poisson_radius,
            poisson_attempts: self.poisson_attempts,
            seed_padding: self.seed_padding,
            neighbor_coverage: self.neighbor_coverage,
            connection_distribution_scaling: self.connection_distribution_scaling,
            include_border_edges: self.include_border_edges,
            cell_padding: self.cell_padding,
            ca: self.ca,
            parallelism: self.parallelism,
        })
    }
}

impl Default for CaveConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = CaveConfigBuilder::new().build().unwrap();
        assert_eq!(config.canvas_width, 128);
        assert_eq!(config.canvas_height, 128);
        assert_eq!(config.poisson_attempts, 30);
        assert_eq!(config.parallelism, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom() {
        let config = CaveConfigBuilder::new()
            .base_seed(42)
            .canvas_size(200, 100)
            .unwrap()
            .poisson_radius(16.0)
            .unwrap()
            .neighbor_coverage(0.75)
            .unwrap()
            .include_border_edges(true)
            .parallelism(2)
            .build()
            .unwrap();
        assert_eq!(config.base_seed, 42);
        assert_eq!(config.canvas_size(), IVec2::new(200, 100));
        assert_eq!(config.neighbor_coverage, 0.75);
        assert!(config.include_border_edges);
        assert_eq!(config.parallelism, 2);
    }

    #[test]
    fn test_invalid_canvas() {
        assert!(CaveConfigBuilder::new().canvas_size(0, 64).is_err());
        assert!(CaveConfigBuilder::new().canvas_size(64, -1).is_err());
    }

    #[test]
    fn test_invalid_radius() {
        assert!(CaveConfigBuilder::new().poisson_radius(0.0).is_err());
        assert!(CaveConfigBuilder::new().poisson_radius(-3.0).is_err());
    }

    #[test]
    fn test_invalid_ratios() {
        assert!(CaveConfigBuilder::new().neighbor_coverage(1.5).is_err());
        assert!(CaveConfigBuilder::new().neighbor_coverage(-0.1).is_err());
        assert!(CaveConfigBuilder::new()
            .connection_distribution_scaling(2.0)
            .is_err());
    }

    #[test]
    fn test_invalid_kernel() {
        let ca = CaConfig {
            kernel_size: 2,
            ..Default::default()
        };
        assert!(CaveConfigBuilder::new().ca(ca).is_err());
        // even sizes of at least 4 are accepted and round up at run time
        let ca = CaConfig {
            kernel_size: 4,
            ..Default::default()
        };
        assert!(CaveConfigBuilder::new().ca(ca).is_ok());
    }

    #[test]
    fn test_validate_rejects_hand_built_config() {
        let mut config = CaveConfigBuilder::new().base_seed(1).build().unwrap();
        config.poisson_radius = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_seed_chain_overrides() {
        let config = CaveConfigBuilder::new()
            .base_seed(5)
            .poisson_seed(1111)
            .build()
            .unwrap();
        let chain = config.seed_chain();
        assert_eq!(chain.poisson_seed, 1111);
        assert_eq!(
            chain.traversal_seed,
            SeedChain::new(5).traversal_seed
        );
    }

    #[test]
    fn test_random_seed_when_unpinned() {
        // two unpinned builds extremely unlikely to share all 32 bits twice
        let a = CaveConfigBuilder::new().build().unwrap();
        let _ = a.base_seed;
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serialization() {
        let config = CaveConfigBuilder::new()
            .base_seed(12345)
            .canvas_size(64, 64)
            .unwrap()
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let restored: CaveConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
