//! Error types for the public surface of the library.
//!
//! Internally everything is `anyhow`. At the boundary of a public function the internal error is
//! tagged with an `ErrorType` so that callers can tell a rejected form submission from a failed
//! save without string matching.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = std::result::Result<T, anyhow::Error>;

/// The result type returned by public functions.
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of failure. None of these are fatal; each degrades to a visible but non-blocking
/// state in whatever is driving the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The input was rejected before anything was mutated, e.g. unbalanced splits.
    Validation,
    /// A call to the storage backend failed.
    Persistence,
    /// The referenced transaction does not exist.
    NotFound,
    /// The budget home directory or its config file is missing or invalid.
    Config,
    /// No user is signed in.
    Session,
    /// Bad command-line input.
    Request,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// An error paired with the `ErrorType` that describes it.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Returns true if this error is of the given `ErrorType`.
    pub fn is(&self, error_type: ErrorType) -> bool {
        self.error_type == error_type
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // The alternate form prints the whole context chain on one line.
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts an internal result into a public `Result` by tagging the error with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}
