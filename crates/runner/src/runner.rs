//! The execute/cancel state machine.
//!
//! ```text
//!            execute
//!   Idle ─────────────▶ Pending ──┬─▶ Succeeded        (Ok(Success))
//!    ▲                            ├─▶ Failed/reported  (Ok(Failure | ValidationFailure))
//!    │                            └─▶ Failed/thrown    (Err(ActionError))
//!    └──────────── on_complete, is_pending = false ◀───┘
//! ```
//!
//! Each run gets its own cancellation token. [`CancelHandle::cancel`] only
//! signals that token; the run then settles through the normal
//! Failed/thrown path once the in-flight call observes it.
//!
//! A runner never has two runs in flight: [`ActionRunner::execute`] rejects a
//! call made while another run is pending. [`ActionRunner::cancel`] and any
//! [`CancelHandle`] target the pending run.

use std::sync::{Arc, Mutex, PoisonError};

use actions::{
    retry, ActionError, ActionResult, CallOptions, CancellationToken, Invoke, NotificationSink,
    RunId, ToastId,
};
use serde_json::Value;
use tokio::sync::watch;
use tracing::Instrument;

use crate::{RunnerOptions, RunnerState};

/// Message shown for an exceptional failure whose error renders as nothing.
pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

type ActiveToken = Arc<Mutex<Option<CancellationToken>>>;

/// Client-side controller bound to one guarded action.
pub struct ActionRunner<O> {
    action: Arc<dyn Invoke<O>>,
    notifier: Arc<dyn NotificationSink>,
    options: RunnerOptions<O>,
    state: watch::Sender<RunnerState<O>>,
    active: ActiveToken,
}

impl<O> ActionRunner<O>
where
    O: Clone + Send + Sync + 'static,
{
    /// Binds a runner to `action`, reporting progress through `notifier`.
    pub fn new(
        action: Arc<dyn Invoke<O>>,
        notifier: Arc<dyn NotificationSink>,
        options: RunnerOptions<O>,
    ) -> Self {
        let (state, _) = watch::channel(RunnerState::default());
        Self {
            action,
            notifier,
            options,
            state,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> RunnerState<O> {
        self.state.borrow().clone()
    }

    /// `true` while a run is in flight.
    pub fn is_pending(&self) -> bool {
        self.state.borrow().is_pending
    }

    /// Receives every state change.
    pub fn subscribe(&self) -> watch::Receiver<RunnerState<O>> {
        self.state.subscribe()
    }

    /// A handle that cancels whichever run is in flight when it is used.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            active: Arc::clone(&self.active),
        }
    }

    /// Cancels the run in flight, if any. See [`CancelHandle::cancel`].
    pub fn cancel(&self) -> bool {
        self.cancel_handle().cancel()
    }

    /// Runs the action once with `input` and records the outcome.
    ///
    /// Never fails: every outcome, reported or exceptional, lands in
    /// [`RunnerState`] and the notification sink.
    ///
    /// A runner drives one run at a time. While a run is in flight further
    /// calls are rejected: they return `false` and leave state, callbacks and
    /// notifications untouched.
    pub async fn execute(&self, input: Option<Value>) -> bool {
        let token = {
            let mut active = lock(&self.active);
            if active.is_some() {
                tracing::warn!("Run already in flight; execute rejected");
                return false;
            }
            let token = CancellationToken::new();
            *active = Some(token.clone());
            token
        };

        let run = RunId::new_random();
        let span = tracing::info_span!("action_run", run = %run);
        self.run(input, token).instrument(span).await;
        true
    }

    async fn run(&self, input: Option<Value>, token: CancellationToken) {
        self.state.send_modify(|state| state.is_pending = true);
        if let Some(on_start) = &self.options.on_start {
            on_start();
        }
        let toast = self.notifier.loading(&self.options.loading_message);
        tracing::debug!(toast = %toast, "Run started");

        // Each arm stores the outcome before callbacks and notifications see it.
        match self.call(input, token).await {
            Ok(ActionResult::Success(data)) => {
                tracing::debug!("Run succeeded");
                self.state.send_modify(|state| {
                    state.data = Some(data.clone());
                    state.error = None;
                    state.field_errors = None;
                });
                if let Some(on_success) = &self.options.on_success {
                    on_success(&data);
                }
                self.notifier.success(&self.options.success_message, &toast);
            }
            Ok(ActionResult::ValidationFailure {
                field_errors,
                message,
            }) => {
                tracing::debug!(error = %message, "Run rejected by validation");
                self.state.send_modify(|state| {
                    state.data = None;
                    state.error = Some(message.clone());
                    state.field_errors = Some(field_errors);
                });
                self.report_error(&message, &toast);
            }
            Ok(ActionResult::Failure { message }) => {
                tracing::debug!(error = %message, "Run reported failure");
                self.state.send_modify(|state| {
                    state.data = None;
                    state.error = Some(message.clone());
                    state.field_errors = None;
                });
                self.report_error(&message, &toast);
            }
            Err(error) => {
                let message = describe(&error);
                tracing::warn!(error = %message, aborted = error.is_aborted(), "Run failed");
                self.state.send_modify(|state| {
                    state.data = None;
                    state.error = Some(message.clone());
                    state.field_errors = None;
                });
                self.report_error(&message, &toast);
            }
        }

        // Runs on every path above.
        *lock(&self.active) = None;
        self.state.send_modify(|state| state.is_pending = false);
        if let Some(on_complete) = &self.options.on_complete {
            on_complete();
        }
    }

    async fn call(
        &self,
        input: Option<Value>,
        token: CancellationToken,
    ) -> Result<ActionResult<O>, ActionError> {
        let mut options = CallOptions::new().cancellation(token.clone());
        options.session_cookie = self.options.session_cookie.clone();

        match &self.options.retry {
            Some(config) => {
                retry::attempt(
                    || self.action.invoke(input.clone(), options.clone()),
                    config,
                    Some(&token),
                )
                .await
            }
            None => self.action.invoke(input, options).await,
        }
    }

    fn report_error(&self, message: &str, toast: &ToastId) {
        if let Some(on_error) = &self.options.on_error {
            on_error(message);
        }
        self.notifier.error(message, toast);
    }
}

/// Cancels the run in flight on the runner it was taken from.
#[derive(Clone)]
pub struct CancelHandle {
    active: ActiveToken,
}

impl CancelHandle {
    /// Signals the current run's token.
    ///
    /// Returns `false` if no run was in flight. Never changes runner state
    /// directly; the run observes the token at its next checkpoint.
    pub fn cancel(&self) -> bool {
        match lock(&self.active).as_ref() {
            Some(token) => {
                tracing::debug!("Cancelling current run");
                token.cancel();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle").finish_non_exhaustive()
    }
}

fn lock(active: &ActiveToken) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

/// User-facing message for an exceptional failure.
fn describe(error: &ActionError) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_uses_error_message() {
        assert_eq!(describe(&ActionError::Aborted), "Aborted");
        assert_eq!(describe(&ActionError::handler("disk full")), "disk full");
    }

    #[test]
    fn test_describe_falls_back_for_empty_message() {
        assert_eq!(describe(&ActionError::handler("")), UNKNOWN_ERROR);
        assert_eq!(describe(&ActionError::handler("  ")), UNKNOWN_ERROR);
    }
}
