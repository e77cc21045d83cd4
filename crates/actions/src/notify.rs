//! Notification port used by the client-side runner.

use crate::ToastId;

/// Renders progress and outcome notifications ("toasts").
///
/// A run shows one loading notification and later replaces it, through the
/// returned [`ToastId`], with exactly one success or error notification.
/// Display durations are the sink's concern: loading notifications stay until
/// replaced, outcome notifications are shown for a fixed time.
pub trait NotificationSink: Send + Sync {
    /// Shows an indefinite loading notification.
    fn loading(&self, message: &str) -> ToastId;

    /// Replaces the notification `id` with a success message.
    fn success(&self, message: &str, id: &ToastId);

    /// Replaces the notification `id` with an error message.
    fn error(&self, message: &str, id: &ToastId);
}
