//! Notification sink that renders toasts as structured log events.

use std::time::Duration;

use actions::{NotificationSink, ToastId};

/// How long an outcome notification stays visible.
pub const OUTCOME_VISIBLE_FOR: Duration = Duration::from_secs(2);

/// Writes every notification to `tracing` under the `toast` target.
///
/// Loading toasts carry no duration; outcome toasts carry
/// [`OUTCOME_VISIBLE_FOR`] so a log-driven UI can expire them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn loading(&self, message: &str) -> ToastId {
        let id = ToastId::new_random();
        tracing::info!(target: "toast", toast = %id, kind = "loading", message);
        id
    }

    fn success(&self, message: &str, id: &ToastId) {
        tracing::info!(
            target: "toast",
            toast = %id,
            kind = "success",
            visible_ms = OUTCOME_VISIBLE_FOR.as_millis() as u64,
            message
        );
    }

    fn error(&self, message: &str, id: &ToastId) {
        tracing::warn!(
            target: "toast",
            toast = %id,
            kind = "error",
            visible_ms = OUTCOME_VISIBLE_FOR.as_millis() as u64,
            message
        );
    }
}
