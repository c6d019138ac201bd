//! The crate uses `anyhow` for errors. Errors that cross the boundary to the Google APIs or to the
//! terminal are additionally tagged with an `ErrorType` so that callers can decide whether to
//! retry, re-prompt, or give up.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The classification of an error.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Standard input reached end-of-file.
    InputClosed,
    /// A network failure, rate limit or server-side failure that may succeed if tried again.
    Transient,
    /// The credentials were rejected or a token could not be obtained.
    Auth,
    /// Something is wrong with the local configuration or the spreadsheet it points to.
    Config,
    /// Any other failure reported by the remote service.
    Service,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

impl ErrorType {
    /// Returns true if the operation that produced the error should be retried.
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorType::Transient)
    }
}

/// An `anyhow::Error` together with its `ErrorType`.
pub struct TypedError {
    error_type: ErrorType,
    inner: Error,
}

impl TypedError {
    pub fn new(error_type: ErrorType, inner: impl Into<Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Debug for TypedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl Display for TypedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for TypedError {}

/// Tags the error of a `Result` with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| TypedError::new(error_type, e).into())
    }
}

/// Creates a new tagged error from a message.
pub(crate) fn typed<S>(error_type: ErrorType, message: S) -> Error
where
    S: Display + Debug + Send + Sync + 'static,
{
    TypedError::new(error_type, anyhow::anyhow!(message)).into()
}

/// Finds the outermost `ErrorType` attached to `e`, if any.
pub fn error_type(e: &Error) -> Option<ErrorType> {
    if let Some(typed) = e.downcast_ref::<TypedError>() {
        return Some(typed.error_type());
    }
    e.chain()
        .find_map(|cause| cause.downcast_ref::<TypedError>())
        .map(TypedError::error_type)
}
