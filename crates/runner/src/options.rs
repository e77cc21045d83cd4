//! Runner configuration: lifecycle callbacks, retry override and messages.

use actions::{RetryConfig, SessionCookie};

/// Loading message used when none is configured.
pub const DEFAULT_LOADING_MESSAGE: &str = "Processing...";

/// Success message used when none is configured.
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Done!";

type Callback = Box<dyn Fn() + Send + Sync>;
type SuccessCallback<O> = Box<dyn Fn(&O) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Options for an [`ActionRunner`](crate::ActionRunner).
///
/// ```ignore
/// let options = RunnerOptions::new()
///     .on_success(|post: &Post| tracing::info!(id = %post.id, "created"))
///     .success_message("Post created");
/// ```
pub struct RunnerOptions<O> {
    pub(crate) on_start: Option<Callback>,
    pub(crate) on_success: Option<SuccessCallback<O>>,
    pub(crate) on_error: Option<ErrorCallback>,
    pub(crate) on_complete: Option<Callback>,
    pub(crate) retry: Option<RetryConfig>,
    pub(crate) loading_message: String,
    pub(crate) success_message: String,
    pub(crate) session_cookie: Option<SessionCookie>,
}

impl<O> RunnerOptions<O> {
    /// No callbacks, no client-side retry, default messages.
    pub fn new() -> Self {
        Self {
            on_start: None,
            on_success: None,
            on_error: None,
            on_complete: None,
            retry: None,
            loading_message: DEFAULT_LOADING_MESSAGE.to_string(),
            success_message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            session_cookie: None,
        }
    }

    /// Called when a run starts.
    #[must_use]
    pub fn on_start(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Called with the payload of a successful run.
    #[must_use]
    pub fn on_success(mut self, f: impl Fn(&O) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Called with the message of a failed run.
    #[must_use]
    pub fn on_error(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Called after every run, whatever its outcome.
    #[must_use]
    pub fn on_complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Retries exceptional failures on the client side as well, sharing the
    /// run's cancellation token.
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Overrides the loading notification text.
    #[must_use]
    pub fn loading_message(mut self, message: impl Into<String>) -> Self {
        self.loading_message = message.into();
        self
    }

    /// Overrides the success notification text.
    #[must_use]
    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    /// Forwards `cookie` with every invocation.
    #[must_use]
    pub fn session_cookie(mut self, cookie: SessionCookie) -> Self {
        self.session_cookie = Some(cookie);
        self
    }
}

impl<O> Default for RunnerOptions<O> {
    fn default() -> Self {
        Self::new()
    }
}
