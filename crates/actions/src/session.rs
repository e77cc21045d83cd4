//! Session lookup port.
//!
//! The guard asks a [`SessionProvider`] for the caller's session once per
//! invocation. The HTTP implementation lives in the `session` crate; tests use
//! [`StaticSession`].

use async_trait::async_trait;

use crate::{Session, SessionCookie, SessionError};

/// Resolves the session of the current caller.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Looks up the session identified by `cookie`.
    ///
    /// A definitive "not signed in" answer is `Ok` with
    /// `authenticated == false`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] only when no answer could be obtained.
    async fn current_session(&self, cookie: Option<&SessionCookie>)
        -> Result<Session, SessionError>;
}

/// A provider that always answers with the same session, ignoring the cookie.
#[derive(Debug, Clone)]
pub struct StaticSession(pub Session);

#[async_trait]
impl SessionProvider for StaticSession {
    async fn current_session(
        &self,
        _cookie: Option<&SessionCookie>,
    ) -> Result<Session, SessionError> {
        Ok(self.0.clone())
    }
}
