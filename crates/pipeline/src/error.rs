//! Error types for the vectile pipeline

use thiserror::Error;
use vectile_core::Error as CoreError;

/// Errors produced by pipeline construction and execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Transform construction or inversion failed while deriving the
    /// request context; no usable pipeline exists and the caller must
    /// abort the request.
    #[error("pipeline setup failed: {0}")]
    Setup(#[source] CoreError),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A specific geometry failed reprojection. The pipeline stays
    /// usable; sibling features are unaffected.
    #[error("geometry transform failed: {0}")]
    GeometryTransform(#[source] CoreError),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
