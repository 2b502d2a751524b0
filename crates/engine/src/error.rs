//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`NoParticipants`] thrown when a balance computation is asked to split
//!   among nobody.
//! - [`KeyNotFound`] thrown when an item is not found.
//!
//! [`NoParticipants`]: EngineError::NoParticipants
//! [`KeyNotFound`]: EngineError::KeyNotFound
use thiserror::Error;

use crate::remote::RemoteError;

/// Engine custom errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("Cannot split among zero participants: {0}")]
    NoParticipants(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}
