//! Error types for cave map generation

use std::fmt;

/// Errors that can occur during map generation or queries
#[derive(Debug, Clone)]
pub enum CaveError {
    /// Configuration validation failed
    InvalidConfig(String),
    /// Generation failed due to geometry or scheduling issues
    GenerationFailed(String),
    /// Requested cell ID does not exist
    CellNotFound(usize),
}

impl fmt::Display for CaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaveError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            CaveError::GenerationFailed(msg) => write!(f, "generation failed: {}", msg),
            CaveError::CellNotFound(id) => write!(f, "cell not found: {}", id),
        }
    }
}

impl std::error::Error for CaveError {}

/// Result type alias for cave generation operations
pub type Result<T> = std::result::Result<T, CaveError>;
