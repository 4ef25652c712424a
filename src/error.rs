use std::fmt::{self, Formatter};

/// Result type alias using fudge's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure raised by a fake, its registry, or its configuration.
///
/// Failures come in two kinds. *Assertion* failures ([`NotCalled`],
/// [`UnexpectedCall`], [`UnexpectedKeywordCall`], [`ArityMismatch`],
/// [`CallsExhausted`]) mean
/// the code under test used a fake incorrectly. Everything else means
/// the fake itself was configured or accessed incorrectly. Use
/// [`Error::is_assertion`] to tell them apart.
///
/// [`NotCalled`]: Error::NotCalled
/// [`UnexpectedCall`]: Error::UnexpectedCall
/// [`UnexpectedKeywordCall`]: Error::UnexpectedKeywordCall
/// [`ArityMismatch`]: Error::ArityMismatch
/// [`CallsExhausted`]: Error::CallsExhausted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An expected call was never made.
    #[error("{call} was not called")]
    NotCalled { call: String },

    /// A call was made with arguments other than the expected ones.
    #[error("{call} was called unexpectedly with args {actual}")]
    UnexpectedCall { call: String, actual: String },

    /// A call was made with keyword arguments other than the expected ones.
    #[error("{call} was called unexpectedly with keyword args {actual}")]
    UnexpectedKeywordCall { call: String, actual: String },

    /// A call was made with the wrong number of (keyword) arguments.
    #[error("{call} was called with {actual} {kind}(s) but expected {expected}")]
    ArityMismatch {
        call: String,
        kind: ArgKind,
        actual: usize,
        expected: usize,
    },

    /// A member declared with `next_call` ran out of calls.
    #[error("This attribute of {fake} can only be called {limit} time(s).  Call reset() if necessary.")]
    CallsExhausted { fake: String, limit: usize },

    #[error("Fake('{name}'): invalid name ({reason})")]
    InvalidName { name: String, reason: String },

    #[error("{target} object cannot be called (maybe you want callable = true?)")]
    NotCallable { target: String },

    #[error("{target} object does not allow call or attribute '{name}'")]
    UndeclaredCall { target: String, name: String },

    /// An error deliberately returned by a replacement function.
    #[error("{0}")]
    Raised(String),
}

/// Which argument list an [`Error::ArityMismatch`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Positional,
    Keyword,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ArgKind::Positional => f.write_str("arg"),
            ArgKind::Keyword => f.write_str("keyword arg"),
        }
    }
}

impl Error {
    /// Creates an error to be returned from a replacement function.
    pub fn raised(message: impl fmt::Display) -> Self {
        Error::Raised(message.to_string())
    }

    /// Returns `true` for failures of the code under test rather than
    /// of the fake's configuration.
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            Error::NotCalled { .. }
                | Error::UnexpectedCall { .. }
                | Error::UnexpectedKeywordCall { .. }
                | Error::ArityMismatch { .. }
                | Error::CallsExhausted { .. }
        )
    }

    pub(crate) fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Error::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
