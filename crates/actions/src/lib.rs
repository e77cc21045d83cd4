//! Guarded actions: the server-side half of the action framework.
//!
//! This crate holds every domain type, port trait and the two pieces of core
//! logic, the retry executor and the action guard. Infrastructure crates
//! implement the ports defined here; they never add authorization or
//! validation rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** No I/O dependencies. Session lookup
//! arrives through [`SessionProvider`], notifications leave through
//! [`NotificationSink`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`Role`, `ActionName`, `ToastId`, etc.) |
//! | [`types`] | `Session`, `ActionResult` and its wire envelope |
//! | [`errors`] | `ActionError`, `SessionError`, `Aborted` |
//! | [`retry`] | Bounded, cancellable retry executor |
//! | [`schema`] | `Schema` port, validation issues, JSON Schema validator |
//! | [`session`] | `SessionProvider` port |
//! | [`notify`] | `NotificationSink` port |
//! | [`guard`] | Action guard, builder and typed action shapes |

pub mod errors;
pub mod guard;
pub mod identifiers;
pub mod notify;
pub mod retry;
pub mod schema;
pub mod session;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{Aborted, ActionError, BoxError, SessionError};
pub use guard::{
    ActionBuilder, CallOptions, GuardedAction, Handler, InputAction, Invoke, NoInputAction,
};
pub use identifiers::{ActionName, Role, RunId, SessionCookie, ToastId};
pub use notify::NotificationSink;
pub use retry::{RetryBudget, RetryConfig};
pub use schema::{JsonSchema, Schema, SchemaError, ValidationIssue, ValidationIssues};
pub use session::{SessionProvider, StaticSession};
pub use types::{ActionResult, FieldErrors, Session};

// Handlers receive this token; re-exported so callers need no direct
// tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
