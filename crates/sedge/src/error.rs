//! Engine-level errors.
//!
//! Two orthogonal channels exist at runtime: this one, `Result`-threaded
//! [`JsError`]s raised by abstract operations (the host-visible channel),
//! and language-level abrupt completions. A `try` statement recovers from
//! both: it consumes a pending `Err` by materializing the matching Error
//! object and binding it in the catch scope.

use std::fmt;

use strum::{Display, EnumString, IntoStaticStr};

use crate::value::JsValue;

/// Result type alias for operations that can raise a runtime error.
pub type EvalResult<T> = Result<T, JsError>;

/// Error kinds surfaced across the host boundary.
///
/// These mirror the native error constructors; `NativeError` covers
/// host-defined shapes with no dedicated constructor. There is no `Ok` kind:
/// success is the `Ok` variant of [`EvalResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    Error,
    EvalError,
    RangeError,
    ReferenceError,
    SyntaxError,
    TypeError,
    #[strum(serialize = "URIError")]
    UriError,
    NativeError,
}

/// An engine-raised error: a kind plus an optional message.
///
/// When a `throw` statement rethrows a caught engine error, or a thrown
/// value crosses back into the engine channel, the original value rides
/// along in `value`.
#[derive(Debug, Clone)]
pub struct JsError {
    pub kind: ErrorKind,
    pub message: Option<String>,
    /// The language-level value this error corresponds to, when one exists
    /// (a thrown Error object escaping the program, for example).
    pub value: Option<JsValue>,
}

impl JsError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
            value: None,
        }
    }

    pub fn bare(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            value: None,
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ReferenceError, message)
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxError, message)
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RangeError, message)
    }
}

impl fmt::Display for JsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Public exception surface returned by [`crate::Runner`].
#[derive(Debug, Clone)]
pub struct Exception {
    kind: ErrorKind,
    message: Option<String>,
}

impl Exception {
    pub(crate) fn new(kind: ErrorKind, message: Option<String>) -> Self {
        Self { kind, message }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl From<JsError> for Exception {
    fn from(error: JsError) -> Self {
        Self::new(error.kind, error.message)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Exception {}
