//! Error types for vectile core

use crate::crs::Crs;
use thiserror::Error;

/// Errors produced by transform construction and application.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no coordinate transform path from {from} to {to}")]
    NoTransformPath { from: Crs, to: Crs },

    #[error("transform is singular and cannot be inverted")]
    NonInvertibleTransform,

    #[error("cannot transform coordinate ({x}, {y}): {reason}")]
    TransformFailed { x: f64, y: f64, reason: String },
}

/// Result type alias for vectile core operations
pub type Result<T> = std::result::Result<T, Error>;
