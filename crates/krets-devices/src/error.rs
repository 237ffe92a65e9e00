//! Error types for krets-devices.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid device parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid device name \"{name}\": {reason}")]
    InvalidName { name: String, reason: String },

    #[error("the device name \"{0}\" is used more than once")]
    DuplicateName(String),
}

pub type Result<T> = std::result::Result<T, Error>;
