//! Error types for drishti-plan.

use thiserror::Error;

/// Planner error type.
///
/// The planning loop itself never fails; errors only arise at the edges
/// (cost-map export, configuration parsing).
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PlanError>;
