//! HTTP session lookup adapter.
//!
//! Implements the [`actions::SessionProvider`] trait by calling the
//! application's session endpoint: `GET <base url><route>` with the caller's
//! cookie, answered by `{ "authenticated": bool, "role": "..." }`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL construction, the HTTP request, status handling and
//! body decoding all live here. The [`actions`] crate sees only
//! [`actions::SessionProvider`] and [`actions::SessionError`].
//!
//! ## Configuration
//!
//! The endpoint is located by [`config::BASE_URL_VAR`] and
//! [`config::ROUTE_VAR`], read at call time. Tests and embedders can pin a
//! [`ConfigSource::Fixed`] configuration instead.

pub mod config;
pub mod provider;

pub use config::{ConfigSource, SessionEndpointConfig};
pub use provider::HttpSessionProvider;
