//! Estimation errors.
//!
//! Three kinds of failure are distinguished:
//! a model that cannot be composed, an operation used out of order or with badly shaped data,
//! and a numerical failure of the linear algebra.

use thiserror::Error;

/// Error of any estimation operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimateError {
    /// Type or dimension mismatch between composed parts. Raised when the composition is built.
    #[error("construction error: {0}")]
    Construction(String),

    /// Operation called in the wrong state or with data of the wrong shape.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Factorisation failed, matrix not positive definite or a result is not finite.
    #[error("numerical error: {0}")]
    Numerical(String),
}

impl EstimateError {
    pub fn construction(message: impl Into<String>) -> Self {
        EstimateError::Construction(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        EstimateError::Precondition(message.into())
    }

    pub fn numerical(message: impl Into<String>) -> Self {
        EstimateError::Numerical(message.into())
    }
}

pub type Result<T> = std::result::Result<T, EstimateError>;
