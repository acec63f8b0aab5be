//! Client configuration
//!
//! Where to connect and where to log in.

use std::time::Duration;

/// Default server host
pub const DEFAULT_HOST: &str = "localhost";

/// Default server port
pub const DEFAULT_PORT: u16 = 8000;

/// Well-known login endpoint
pub const DEFAULT_LOGIN_URL: &str = "https://play.pokemonshowdown.com/api/login";

/// Upper bound on a single login POST
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection and login settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server host name or address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Use `wss://` instead of `ws://`
    pub secure: bool,
    /// HTTP endpoint for the challstr login
    pub login_url: String,
    /// Timeout applied to the login request
    pub login_timeout: Duration,
}

impl ClientConfig {
    /// Create a config for the given server with default login settings
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }

    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    /// The websocket endpoint, e.g. `ws://localhost:8000/showdown/websocket`
    pub fn websocket_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}:{}/showdown/websocket", scheme, self.host, self.port)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            secure: false,
            login_url: DEFAULT_LOGIN_URL.to_string(),
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }
}
