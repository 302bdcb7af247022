use thiserror::Error;

/// Failure of the normalization pipeline as a whole.
///
/// Per-record and per-field problems never surface here; they are recovered
/// and reported through [`crate::processor::Diagnostics`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    #[error("Unrecognized response shape: {0}")]
    Structural(String),
}

pub type Result<T> = std::result::Result<T, ProcessError>;
