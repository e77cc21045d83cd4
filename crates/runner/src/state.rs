//! Observable runner state.

use actions::FieldErrors;

/// Snapshot of an [`ActionRunner`](crate::ActionRunner)'s state.
///
/// Each terminal transition replaces `data`, `error` and `field_errors`
/// together, so the snapshot always describes the latest completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerState<O> {
    /// A run is in flight.
    pub is_pending: bool,
    /// Payload of the last successful run.
    pub data: Option<O>,
    /// Message of the last failed run, reported or exceptional.
    pub error: Option<String>,
    /// Field errors of the last run that failed validation.
    pub field_errors: Option<FieldErrors>,
}

impl<O> Default for RunnerState<O> {
    fn default() -> Self {
        Self {
            is_pending: false,
            data: None,
            error: None,
            field_errors: None,
        }
    }
}

impl<O> RunnerState<O> {
    /// `true` before the first run and whenever the last run succeeded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
