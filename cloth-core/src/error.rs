//! Cloth simulation errors

use thiserror::Error;

/// Core result type
pub type Result<T> = std::result::Result<T, ClothError>;

/// Failures that can occur while setting a simulation up.
///
/// Nothing raised during a tick ends up here; per-frame problems degrade to
/// "unchanged" instead (see [`ProjectionError`] and
/// [`crate::kernel::StepStats::rejected`]).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClothError {
    #[error("grid resolution must be at least 1, got {0}")]
    InvalidResolution(usize),

    #[error("invalid config value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

/// Why a pointer sample could not be mapped into simulation space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error("screen coordinates are not finite")]
    NonFiniteInput,

    #[error("viewport has no area")]
    EmptyViewport,

    #[error("view-projection matrix is not invertible")]
    SingularCamera,

    #[error("pointer ray is parallel to the reference plane")]
    ParallelToPlane,

    #[error("reference plane lies behind the pointer ray")]
    BehindRay,

    #[error("mapped point is not finite")]
    NonFiniteResult,
}
