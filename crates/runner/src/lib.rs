//! Client-side action runner.
//!
//! An [`ActionRunner`] binds to one guarded action (anything implementing
//! [`actions::Invoke`]) and drives a single logical invocation at a time:
//! it shows a loading notification, calls the action with a fresh
//! cancellation token, records the outcome in an observable
//! [`RunnerState`], fires the configured callbacks and replaces the loading
//! notification with the outcome.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The runner sequences calls between the action and
//! the notification port. It contains no authorization or validation rules
//! of its own.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`runner`] | `ActionRunner`, `CancelHandle` |
//! | [`options`] | `RunnerOptions`: callbacks, retry override, messages |
//! | [`state`] | `RunnerState` snapshot |
//! | [`notifier`] | `TracingNotifier` |

pub mod notifier;
pub mod options;
pub mod runner;
pub mod state;

pub use notifier::TracingNotifier;
pub use options::RunnerOptions;
pub use runner::{ActionRunner, CancelHandle};
pub use state::RunnerState;
