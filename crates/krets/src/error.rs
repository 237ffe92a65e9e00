//! The facade error type.
//!
//! Aggregates the member-crate errors into the taxonomy callers see:
//! parse, probe-resolution, structural, numerical and state errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed netlist text.
    #[error(transparent)]
    Parse(#[from] krets_parser::Error),

    /// A probe or component name does not resolve.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// The circuit topology cannot produce a solvable system.
    #[error("structural error: {0}")]
    Structural(String),

    /// The solver pivot fell below threshold.
    #[error("singular matrix")]
    SingularMatrix,

    /// Newton iteration exhausted its iteration budget.
    #[error("Newton iteration did not converge after {iterations} iterations")]
    NewtonDidNotConverge { iterations: usize },

    /// A transient step size was zero or negative.
    #[error("time step must be positive, got {0}")]
    TimeStepNonPositive(f64),

    /// A device parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The requested operation does not fit the current analysis state.
    #[error("invalid analysis state: {0}")]
    InvalidState(String),
}

impl From<krets_solver::Error> for Error {
    fn from(err: krets_solver::Error) -> Self {
        match err {
            krets_solver::Error::SingularMatrix => Error::SingularMatrix,
            krets_solver::Error::DidNotConverge { iterations } => {
                Error::NewtonDidNotConverge { iterations }
            }
            krets_solver::Error::DimensionMismatch { .. } => Error::Structural(err.to_string()),
        }
    }
}

impl From<krets_devices::Error> for Error {
    fn from(err: krets_devices::Error) -> Self {
        Error::InvalidParameter(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
