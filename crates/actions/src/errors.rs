//! Error types for guarded actions.
//!
//! Only conditions the caller cannot treat as an ordinary business outcome
//! live here. Authentication, authorization, presence-mismatch and
//! validation failures are *values* ([`crate::ActionResult`]), never errors.
//!
//! [`ActionError`] is what a guarded invocation returns in its `Err` arm.
//! [`SessionError`] is produced by [`crate::SessionProvider`] implementations.
//! [`Aborted`] is the marker the retry executor raises on cancellation; any
//! error type that participates in retries must be constructible from it.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// The operation was cancelled before a successful attempt completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Aborted")]
pub struct Aborted;

// ---------------------------------------------------------------------------
// Session lookup
// ---------------------------------------------------------------------------

/// Failure to obtain an answer from the session endpoint.
///
/// A well-formed "not authenticated" answer is *not* an error; it is a
/// [`crate::Session`] with `authenticated == false`.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The endpoint configuration is missing or unusable.
    #[error("Session endpoint configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The request could not be sent or no response was received.
    #[error("Session lookup transport failure: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The endpoint answered but the body was not a session document.
    #[error("Session response could not be decoded: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Action invocation
// ---------------------------------------------------------------------------

/// Boxed error raised by business handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Exceptional outcome of a guarded invocation.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Cancellation was requested before a successful attempt.
    #[error("Aborted")]
    Aborted,

    /// The session endpoint could not be consulted.
    #[error(transparent)]
    SessionLookup(#[from] SessionError),

    /// The business handler failed on its last permitted attempt.
    ///
    /// Displays exactly as the handler's own error.
    #[error("{0}")]
    Handler(BoxError),
}

impl ActionError {
    /// Wraps a handler failure.
    ///
    /// Accepts anything convertible to a boxed error, including `&str` and
    /// `String`.
    pub fn handler(error: impl Into<BoxError>) -> Self {
        Self::Handler(error.into())
    }

    /// Returns `true` if this error represents a cancellation.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

impl From<Aborted> for ActionError {
    fn from(_: Aborted) -> Self {
        Self::Aborted
    }
}
