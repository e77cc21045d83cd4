//! [`SessionProvider`] over HTTP.

use actions::{Session, SessionCookie, SessionError, SessionProvider};
use async_trait::async_trait;
use reqwest::header::COOKIE;

use crate::ConfigSource;

/// Asks the session endpoint who the caller is.
///
/// Every lookup issues one `GET`, forwarding the caller's cookie. The JSON
/// body is authoritative whatever the status code: a `401` whose body says
/// `{"authenticated": false}` is an ordinary unauthenticated session.
#[derive(Debug, Clone)]
pub struct HttpSessionProvider {
    client: reqwest::Client,
    source: ConfigSource,
}

impl HttpSessionProvider {
    /// A provider that reads its endpoint from the environment on every call.
    pub fn from_env() -> Self {
        Self::new(reqwest::Client::new(), ConfigSource::Environment)
    }

    /// A provider with an explicit client and configuration source.
    pub fn new(client: reqwest::Client, source: ConfigSource) -> Self {
        Self { client, source }
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn current_session(
        &self,
        cookie: Option<&SessionCookie>,
    ) -> Result<Session, SessionError> {
        let url = self.source.resolve()?.url()?;

        let mut request = self.client.get(url.clone());
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie.as_str());
        }

        let response = request.send().await.map_err(|e| SessionError::Transport {
            message: e.to_string(),
        })?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| SessionError::Transport {
            message: e.to_string(),
        })?;

        let session: Session =
            serde_json::from_slice(&body).map_err(|e| SessionError::Decode {
                message: format!("{e} (status {status})"),
            })?;

        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            authenticated = session.authenticated,
            role = session.role.as_ref().map(|r| r.as_str()),
            "Session resolved"
        );
        Ok(session)
    }
}
