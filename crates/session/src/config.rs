//! Session endpoint configuration.
//!
//! Two settings locate the endpoint: a base URL and a route. They are read
//! from the environment on every lookup, so a changed setting takes effect on
//! the next invocation without a restart.

use actions::SessionError;
use reqwest::Url;

/// Environment variable holding the session endpoint's base URL.
pub const BASE_URL_VAR: &str = "ACTION_GUARD_SESSION_BASE_URL";

/// Environment variable holding the session route (e.g. `/api/auth/session`).
pub const ROUTE_VAR: &str = "ACTION_GUARD_SESSION_ROUTE";

/// Location of the session endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEndpointConfig {
    /// Scheme, host and optional path prefix (e.g. `https://app.example.com`).
    pub base_url: String,
    /// Route appended to the base URL.
    pub route: String,
}

impl SessionEndpointConfig {
    /// Creates a configuration from explicit values.
    pub fn new(base_url: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            route: route.into(),
        }
    }

    /// Reads [`BASE_URL_VAR`] and [`ROUTE_VAR`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Configuration`] if either variable is unset or
    /// empty.
    pub fn from_env() -> Result<Self, SessionError> {
        Ok(Self {
            base_url: read_var(BASE_URL_VAR)?,
            route: read_var(ROUTE_VAR)?,
        })
    }

    /// Joins base URL and route with exactly one `/` between them.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Configuration`] if the result is not a valid
    /// absolute URL.
    pub fn url(&self) -> Result<Url, SessionError> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.route.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| SessionError::Configuration {
            message: format!("invalid session URL '{joined}': {e}"),
        })
    }
}

fn read_var(name: &str) -> Result<String, SessionError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SessionError::Configuration {
            message: format!("{name} is not set"),
        }),
    }
}

/// Where the endpoint configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read the environment on every lookup.
    Environment,
    /// Use a fixed configuration.
    Fixed(SessionEndpointConfig),
}

impl ConfigSource {
    /// Produces the configuration for one lookup.
    ///
    /// # Errors
    ///
    /// See [`SessionEndpointConfig::from_env`].
    pub fn resolve(&self) -> Result<SessionEndpointConfig, SessionError> {
        match self {
            Self::Environment => SessionEndpointConfig::from_env(),
            Self::Fixed(config) => Ok(config.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_with_single_slash() {
        let config = SessionEndpointConfig::new("https://app.example.com/", "/api/auth/session");
        assert_eq!(
            config.url().unwrap().as_str(),
            "https://app.example.com/api/auth/session"
        );

        let config = SessionEndpointConfig::new("https://app.example.com", "api/session");
        assert_eq!(
            config.url().unwrap().as_str(),
            "https://app.example.com/api/session"
        );
    }

    #[test]
    fn test_url_rejects_relative_base() {
        let err = SessionEndpointConfig::new("app.example.com", "/session")
            .url()
            .unwrap_err();
        assert!(matches!(err, SessionError::Configuration { .. }));
    }

    // The only test in this crate that touches the process environment.
    #[test]
    fn test_environment_is_read_on_every_resolve() {
        let source = ConfigSource::Environment;

        std::env::remove_var(BASE_URL_VAR);
        std::env::remove_var(ROUTE_VAR);
        assert!(matches!(
            source.resolve(),
            Err(SessionError::Configuration { .. })
        ));

        std::env::set_var(BASE_URL_VAR, "http://localhost:3000");
        std::env::set_var(ROUTE_VAR, "/api/session");
        assert_eq!(
            source.resolve().unwrap(),
            SessionEndpointConfig::new("http://localhost:3000", "/api/session")
        );

        std::env::set_var(ROUTE_VAR, "/api/v2/session");
        assert_eq!(source.resolve().unwrap().route, "/api/v2/session");

        std::env::set_var(ROUTE_VAR, "  ");
        assert!(source.resolve().is_err());

        std::env::remove_var(BASE_URL_VAR);
        std::env::remove_var(ROUTE_VAR);
    }
}
