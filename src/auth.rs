//! HTTP login handshake
//!
//! Trades a challstr for a signed assertion by POSTing the credentials to
//! the login server. The response body is one throwaway character followed
//! by JSON, e.g. `]{"actionsuccess":true,"assertion":"..."}`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::AuthError;
use crate::session::Credentials;

/// Exchanges a challstr for an assertion
///
/// Only the parser task calls this, so there is never more than one
/// handshake in flight per client.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, credentials: &Credentials, challstr: &str) -> Result<String, AuthError>;
}

/// Authenticator backed by the login server's HTTP API
#[derive(Debug, Clone)]
pub struct HttpAuthenticator {
    http: reqwest::Client,
    login_url: String,
}

impl HttpAuthenticator {
    /// Build an authenticator for the login URL and timeout in `config`
    pub fn new(config: &ClientConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(config.login_timeout)
            .build()?;
        Ok(Self {
            http,
            login_url: config.login_url.clone(),
        })
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn login(&self, credentials: &Credentials, challstr: &str) -> Result<String, AuthError> {
        debug!("POST {} for {}", self.login_url, credentials.username);

        let response = self
            .http
            .post(&self.login_url)
            .form(&[
                ("name", credentials.username.as_str()),
                ("pass", credentials.password.as_str()),
                ("challstr", challstr),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_login_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    assertion: Option<String>,
}

/// Extract the assertion from a login response body
pub fn parse_login_response(body: &str) -> Result<String, AuthError> {
    let mut chars = body.chars();
    if chars.next().is_none() {
        return Err(AuthError::InvalidResponse("empty body".to_string()));
    }

    let response: LoginResponse = serde_json::from_str(chars.as_str())?;
    let Some(assertion) = response.assertion else {
        return Err(AuthError::InvalidResponse("missing assertion".to_string()));
    };

    // The server reports bad credentials as an assertion starting with ";;"
    if let Some(reason) = assertion.strip_prefix(";;") {
        return Err(AuthError::Rejected(reason.to_string()));
    }
    if assertion.is_empty() {
        return Err(AuthError::Rejected("empty assertion".to_string()));
    }

    Ok(assertion)
}
