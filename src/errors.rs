//! Error type for the fallible stored-object operations.
//!
//! Only metadata access (`properties` / `store_properties`) reports errors.
//! The descriptive accessors degrade to default values instead and never
//! surface an `ObjectError`.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("malformed properties at line {line}: {reason}")]
    MalformedProperties { line: usize, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ObjectError {
    /// Shortcut for a malformed sidecar entry.
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedProperties {
            line,
            reason: reason.into(),
        }
    }

    /// True when the error is an I/O `NotFound`, e.g. no sidecar written yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(err) if err.kind() == io::ErrorKind::NotFound)
    }
}

pub type ObjectResult<T> = Result<T, ObjectError>;
