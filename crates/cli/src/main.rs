//! action-guard CLI entry point.
//!
//! This binary is the composition root for the workspace:
//!
//! 1. **Parse arguments**: `clap` with environment fallbacks for the session
//!    endpoint.
//! 2. **Wire observability**: `tracing-subscriber` with an `EnvFilter`
//!    (`RUST_LOG`) and either human-readable or JSON output.
//! 3. **Construct infrastructure**: an [`HttpSessionProvider`] injected into
//!    the guarded demo action, and a [`TracingNotifier`] for the runner.
//! 4. **Dispatch** the selected subcommand.

use std::sync::Arc;
use std::time::Duration;

use actions::{
    ActionBuilder, ActionError, ActionName, ActionResult, CancellationToken, JsonSchema,
    RetryBudget, Role, SessionCookie, SessionProvider,
};
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use runner::{ActionRunner, RunnerOptions, TracingNotifier};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use session::config::{BASE_URL_VAR, ROUTE_VAR};
use session::{ConfigSource, HttpSessionProvider, SessionEndpointConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guarded server actions driven from the command line.
#[derive(Parser, Debug)]
#[command(name = "action-guard")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    endpoint: EndpointArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct EndpointArgs {
    /// Base URL of the session endpoint
    #[arg(long, global = true, env = BASE_URL_VAR)]
    base_url: Option<String>,

    /// Route of the session endpoint
    #[arg(long, global = true, env = ROUTE_VAR)]
    route: Option<String>,

    /// Cookie header forwarded to the session endpoint
    #[arg(long, global = true)]
    cookie: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve and print the caller's session
    Session,

    /// Create a post through the guarded demo action
    CreatePost {
        /// Post title (at least 3 characters)
        #[arg(long)]
        title: Option<String>,

        /// Raw JSON input, overriding --title
        #[arg(long, conflicts_with = "title")]
        input: Option<String>,

        /// Handler attempts per call
        #[arg(long, default_value_t = 3)]
        attempts: u32,

        /// Cancel the run after this many milliseconds
        #[arg(long)]
        cancel_after_ms: Option<u64>,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct NewPost {
    title: String,
}

#[derive(Debug, Clone, Serialize)]
struct Post {
    id: String,
    title: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let sessions: Arc<dyn SessionProvider> = Arc::new(HttpSessionProvider::new(
        reqwest::Client::new(),
        config_source(&cli.endpoint),
    ));
    let cookie = cli.endpoint.cookie.clone().and_then(SessionCookie::new);

    match cli.command {
        Commands::Session => show_session(sessions.as_ref(), cookie.as_ref()).await,
        Commands::CreatePost {
            title,
            input,
            attempts,
            cancel_after_ms,
        } => {
            let input = match (input, title) {
                (Some(raw), _) => Some(
                    serde_json::from_str::<Value>(&raw).context("--input is not valid JSON")?,
                ),
                (None, Some(title)) => Some(json!({ "title": title })),
                (None, None) => None,
            };
            let budget = RetryBudget::new(attempts)
                .ok_or_else(|| anyhow!("--attempts must be at least 1"))?;
            create_post(
                sessions,
                cookie,
                input,
                budget,
                cancel_after_ms.map(Duration::from_millis),
            )
            .await
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Pins the endpoint when both settings were given; otherwise the provider
/// reads the environment on every lookup.
fn config_source(endpoint: &EndpointArgs) -> ConfigSource {
    match (&endpoint.base_url, &endpoint.route) {
        (Some(base_url), Some(route)) => {
            ConfigSource::Fixed(SessionEndpointConfig::new(base_url, route))
        }
        _ => ConfigSource::Environment,
    }
}

async fn show_session(sessions: &dyn SessionProvider, cookie: Option<&SessionCookie>) -> Result<()> {
    let session = sessions
        .current_session(cookie)
        .await
        .context("session lookup failed")?;
    println!(
        "{}",
        json!({
            "authenticated": session.authenticated,
            "role": session.role.as_ref().map(Role::as_str),
        })
    );
    Ok(())
}

async fn create_post(
    sessions: Arc<dyn SessionProvider>,
    cookie: Option<SessionCookie>,
    input: Option<Value>,
    budget: RetryBudget,
    cancel_after: Option<Duration>,
) -> Result<()> {
    let schema = JsonSchema::<NewPost>::new(&json!({
        "type": "object",
        "properties": { "title": { "type": "string", "minLength": 3 } },
        "required": ["title"]
    }))?;

    let name = ActionName::new("create-post").ok_or_else(|| anyhow!("empty action name"))?;
    let roles = ["admin", "user"].into_iter().filter_map(Role::new);
    let action = ActionBuilder::new(name, sessions)
        .allowed_roles(roles)
        .max_attempts(budget)
        .with_schema(schema, |post: NewPost, token: CancellationToken| async move {
            if token.is_cancelled() {
                return Err(ActionError::Aborted);
            }
            Ok(ActionResult::Success(Post {
                id: uuid::Uuid::new_v4().to_string(),
                title: post.title,
            }))
        });

    let mut options = RunnerOptions::new()
        .loading_message("Creating post...")
        .success_message("Post created")
        .on_success(|post: &Post| tracing::info!(id = %post.id, "Post created"))
        .on_error(|message| tracing::warn!(error = message, "Post not created"));
    if let Some(cookie) = cookie {
        options = options.session_cookie(cookie);
    }

    let runner = ActionRunner::new(Arc::new(action), Arc::new(TracingNotifier), options);

    if let Some(delay) = cancel_after {
        let handle = runner.cancel_handle();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if handle.cancel() {
                tracing::info!(after_ms = delay.as_millis() as u64, "Run cancelled");
            }
        });
    }

    runner.execute(input).await;

    let state = runner.state();
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "data": state.data,
            "error": state.error,
            "fieldErrors": state.field_errors,
        }))?
    );
    Ok(())
}
