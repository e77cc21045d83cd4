//! The action guard: authentication, authorization, validation and retried
//! execution around a business handler.
//!
//! Every invocation runs the same short-circuiting sequence:
//!
//! 1. session lookup (`"Un-authenticated"` if not signed in)
//! 2. role presence (`"No role found in session"`)
//! 3. role membership (`"Un-authorized"`), skipped when no roles are configured
//! 4. schema/input presence must agree
//! 5. schema validation
//! 6. handler execution through [`retry::attempt`](crate::retry::attempt)
//!
//! Steps 1–5 report failures as [`ActionResult`] values. Only session transport
//! failures, exhausted retries and cancellation produce an [`ActionError`].
//!
//! Two ways to build an action:
//!
//! - [`ActionBuilder::build`] gives a [`GuardedAction`] that accepts an
//!   optional input and checks schema/input agreement at call time.
//! - [`ActionBuilder::without_input`] and [`ActionBuilder::with_schema`] give
//!   [`NoInputAction`] and [`InputAction`], whose call signatures make a
//!   mismatch impossible to express.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::retry::{self, RetryBudget, RetryConfig};
use crate::{
    ActionError, ActionName, ActionResult, Role, Schema, SessionCookie, SessionProvider,
};

/// Returned when the session is not authenticated.
pub const UNAUTHENTICATED: &str = "Un-authenticated";
/// Returned when an authenticated session carries no role.
pub const NO_ROLE: &str = "No role found in session";
/// Returned when the session's role is not among the allowed roles.
pub const UNAUTHORIZED: &str = "Un-authorized";
/// Returned when a schema is configured but no input was sent.
pub const DATA_REQUIRED: &str = "Data is required when schema is provided";
/// Returned when input was sent to an action without a schema.
pub const SCHEMA_REQUIRED: &str = "Schema is required when data is provided";

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Per-call options.
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Cancels the call between retry attempts; also handed to the handler.
    pub cancellation: CancellationToken,
    /// Cookie forwarded to the session endpoint.
    pub session_cookie: Option<SessionCookie>,
}

impl CallOptions {
    /// Options with a fresh, uncancelled token and no cookie.
    pub fn new() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            session_cookie: None,
        }
    }

    /// Uses `token` for cancellation.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Forwards `cookie` to the session endpoint.
    #[must_use]
    pub fn session_cookie(mut self, cookie: SessionCookie) -> Self {
        self.session_cookie = Some(cookie);
        self
    }
}

impl Default for CallOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Business logic wrapped by the guard.
///
/// Receives the validated input (`None` for actions without a schema) and the
/// call's cancellation token. Returning `Err` counts as a failed attempt and
/// is retried while the budget lasts.
#[async_trait]
pub trait Handler<V, O>: Send + Sync {
    /// Runs one attempt.
    async fn handle(
        &self,
        input: Option<V>,
        cancellation: CancellationToken,
    ) -> Result<ActionResult<O>, ActionError>;
}

#[async_trait]
impl<V, O, F, Fut> Handler<V, O> for F
where
    F: Fn(Option<V>, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ActionResult<O>, ActionError>> + Send,
    V: Send + 'static,
    O: Send + 'static,
{
    async fn handle(
        &self,
        input: Option<V>,
        cancellation: CancellationToken,
    ) -> Result<ActionResult<O>, ActionError> {
        self(input, cancellation).await
    }
}

/// A guarded invocable: anything the client-side runner can call.
#[async_trait]
pub trait Invoke<O>: Send + Sync {
    /// Invokes the action with an optional raw input.
    async fn invoke(
        &self,
        input: Option<Value>,
        options: CallOptions,
    ) -> Result<ActionResult<O>, ActionError>;
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects the authorization and retry settings shared by every action
/// shape.
pub struct ActionBuilder {
    name: ActionName,
    sessions: Arc<dyn SessionProvider>,
    allowed_roles: Vec<Role>,
    retry: RetryConfig,
}

impl ActionBuilder {
    /// Starts an action named `name` that resolves sessions through
    /// `sessions`. Any authenticated role is accepted until
    /// [`allowed_roles`](Self::allowed_roles) is called; the retry budget
    /// defaults to three attempts one second apart.
    pub fn new(name: ActionName, sessions: Arc<dyn SessionProvider>) -> Self {
        Self {
            name,
            sessions,
            allowed_roles: Vec::new(),
            retry: RetryConfig::default(),
        }
    }

    /// Restricts the action to sessions whose role is in `roles`. An empty
    /// list accepts any role.
    #[must_use]
    pub fn allowed_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.allowed_roles = roles.into_iter().collect();
        self
    }

    /// Sets the maximum number of handler attempts.
    #[must_use]
    pub fn max_attempts(mut self, budget: RetryBudget) -> Self {
        self.retry.budget = budget;
        self
    }

    /// Replaces the whole retry configuration.
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Builds an action whose schema is optional and whose input presence is
    /// checked on every call.
    pub fn build<V, O>(
        self,
        handler: impl Handler<V, O> + 'static,
        schema: Option<Arc<dyn Schema<V>>>,
    ) -> GuardedAction<V, O> {
        GuardedAction {
            name: self.name,
            sessions: self.sessions,
            handler: Arc::new(handler),
            schema,
            allowed_roles: self.allowed_roles,
            retry: self.retry,
        }
    }

    /// Builds an action that never takes input.
    pub fn without_input<O, F, Fut>(self, handler: F) -> NoInputAction<O>
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ActionResult<O>, ActionError>> + Send,
        O: Send + 'static,
    {
        NoInputAction {
            inner: self.build(NoInputHandler(handler), None),
        }
    }

    /// Builds an action that always takes input validated by `schema`.
    pub fn with_schema<V, O, F, Fut>(
        self,
        schema: impl Schema<V> + 'static,
        handler: F,
    ) -> InputAction<V, O>
    where
        F: Fn(V, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ActionResult<O>, ActionError>> + Send,
        V: Send + 'static,
        O: Send + 'static,
    {
        InputAction {
            inner: self.build(InputHandler(handler), Some(Arc::new(schema))),
        }
    }
}

// ---------------------------------------------------------------------------
// Guarded action
// ---------------------------------------------------------------------------

/// A handler wrapped with session, role and schema checks and retries.
pub struct GuardedAction<V, O> {
    name: ActionName,
    sessions: Arc<dyn SessionProvider>,
    handler: Arc<dyn Handler<V, O>>,
    schema: Option<Arc<dyn Schema<V>>>,
    allowed_roles: Vec<Role>,
    retry: RetryConfig,
}

impl<V, O> GuardedAction<V, O> {
    /// The action's name.
    pub fn name(&self) -> &ActionName {
        &self.name
    }

    /// The retry configuration applied to the handler.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }
}

impl<V, O> GuardedAction<V, O>
where
    V: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    async fn run(
        &self,
        input: Option<Value>,
        options: CallOptions,
    ) -> Result<ActionResult<O>, ActionError> {
        let session = self
            .sessions
            .current_session(options.session_cookie.as_ref())
            .await?;

        if !session.authenticated {
            tracing::info!("Rejected: session not authenticated");
            return Ok(ActionResult::failure(UNAUTHENTICATED));
        }

        let Some(role) = session.role else {
            tracing::info!("Rejected: session has no role");
            return Ok(ActionResult::failure(NO_ROLE));
        };

        if !self.allowed_roles.is_empty() && !self.allowed_roles.contains(&role) {
            tracing::info!(role = %role, "Rejected: role not allowed");
            return Ok(ActionResult::failure(UNAUTHORIZED));
        }

        let validated = match (&self.schema, input) {
            (Some(_), None) => {
                tracing::info!("Rejected: schema configured but no input sent");
                return Ok(ActionResult::failure(DATA_REQUIRED));
            }
            (None, Some(_)) => {
                tracing::info!("Rejected: input sent to an action without schema");
                return Ok(ActionResult::failure(SCHEMA_REQUIRED));
            }
            (None, None) => None,
            (Some(schema), Some(raw)) => match schema.parse(&raw) {
                Ok(value) => Some(value),
                Err(issues) => {
                    let message = issues.summary();
                    tracing::info!(summary = %message, "Rejected: input failed validation");
                    return Ok(ActionResult::ValidationFailure {
                        field_errors: issues.field_errors(),
                        message,
                    });
                }
            },
        };

        tracing::debug!(role = %role, "Authorized; running handler");
        let cancellation = options.cancellation;
        retry::attempt(
            || {
                self.handler
                    .handle(validated.clone(), cancellation.clone())
            },
            &self.retry,
            Some(&cancellation),
        )
        .await
    }
}

#[async_trait]
impl<V, O> Invoke<O> for GuardedAction<V, O>
where
    V: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    async fn invoke(
        &self,
        input: Option<Value>,
        options: CallOptions,
    ) -> Result<ActionResult<O>, ActionError> {
        let span = tracing::info_span!("guarded_action", action = %self.name);
        self.run(input, options).instrument(span).await
    }
}

// ---------------------------------------------------------------------------
// Typed shapes
// ---------------------------------------------------------------------------

struct NoInputHandler<F>(F);

#[async_trait]
impl<O, F, Fut> Handler<(), O> for NoInputHandler<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ActionResult<O>, ActionError>> + Send,
    O: Send + 'static,
{
    async fn handle(
        &self,
        _input: Option<()>,
        cancellation: CancellationToken,
    ) -> Result<ActionResult<O>, ActionError> {
        (self.0)(cancellation).await
    }
}

struct InputHandler<F>(F);

#[async_trait]
impl<V, O, F, Fut> Handler<V, O> for InputHandler<F>
where
    F: Fn(V, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ActionResult<O>, ActionError>> + Send,
    V: Send + 'static,
    O: Send + 'static,
{
    async fn handle(
        &self,
        input: Option<V>,
        cancellation: CancellationToken,
    ) -> Result<ActionResult<O>, ActionError> {
        match input {
            Some(input) => (self.0)(input, cancellation).await,
            None => Ok(ActionResult::failure(DATA_REQUIRED)),
        }
    }
}

/// An action that takes no input and has no schema.
pub struct NoInputAction<O> {
    inner: GuardedAction<(), O>,
}

impl<O: Send + 'static> NoInputAction<O> {
    /// Invokes the action.
    ///
    /// # Errors
    ///
    /// See [`Invoke::invoke`].
    pub async fn call(&self, options: CallOptions) -> Result<ActionResult<O>, ActionError> {
        self.inner.invoke(None, options).await
    }
}

#[async_trait]
impl<O: Send + 'static> Invoke<O> for NoInputAction<O> {
    async fn invoke(
        &self,
        input: Option<Value>,
        options: CallOptions,
    ) -> Result<ActionResult<O>, ActionError> {
        self.inner.invoke(input, options).await
    }
}

/// An action whose input is mandatory and validated by a schema.
pub struct InputAction<V, O> {
    inner: GuardedAction<V, O>,
}

impl<V, O> InputAction<V, O>
where
    V: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    /// Invokes the action with `input`.
    ///
    /// # Errors
    ///
    /// See [`Invoke::invoke`].
    pub async fn call(
        &self,
        input: Value,
        options: CallOptions,
    ) -> Result<ActionResult<O>, ActionError> {
        self.inner.invoke(Some(input), options).await
    }
}

#[async_trait]
impl<V, O> Invoke<O> for InputAction<V, O>
where
    V: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    async fn invoke(
        &self,
        input: Option<Value>,
        options: CallOptions,
    ) -> Result<ActionResult<O>, ActionError> {
        self.inner.invoke(input, options).await
    }
}
