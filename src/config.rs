//! Session configuration.
//!
//! `SessionConfig` controls how the shared HTTP client used by every
//! [`Session`](crate::session::Session) is built: which `Accept` header is sent
//! by default, the user agent, timeouts and the redirect policy.
//!
//! `SessionConfig` provides sensible defaults via [`Default`] and a fluent
//! [`SessionConfig::builder()`] for customization with validation.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use gosub_session::config::SessionConfig;
//! let cfg = SessionConfig::default();
//! assert_eq!(cfg.accept, "text/html");
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use std::time::Duration;
//! use gosub_session::config::SessionConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = SessionConfig::builder()
//!     .user_agent("Gosub/0.1")
//!     .timeout(Duration::from_secs(30))
//!     .max_redirects(0)
//!     .build()?; // returns Result<SessionConfig, ConfigError>
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `accept`: Value of the `Accept` header attached to every request (default: `text/html`).
//! - `user_agent`: `User-Agent` header value.
//! - `timeout`: Optional total request timeout, enforced by the HTTP client.
//! - `connect_timeout`: Optional connect timeout, enforced by the HTTP client.
//! - `max_redirects`: `None` keeps the client's default redirect policy, `Some(0)`
//!   disables following redirects so callers can inspect `Location` themselves.

use std::fmt;
use std::time::Duration;

use http::HeaderValue;

const DEFAULT_USER_AGENT: &str = "Gosub/1.0 (X11; Linux x86_64) Gecko/20250802 GosubBrowser/1.0";
const DEFAULT_ACCEPT: &str = "text/html";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub accept: String,
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub max_redirects: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            accept: DEFAULT_ACCEPT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            connect_timeout: None,
            max_redirects: None,
        }
    }
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    inner: SessionConfig,
}

impl SessionConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut SessionConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn accept<S: Into<String>>(self, accept: S) -> Self { self.map(|c| c.accept = accept.into()) }
    pub fn user_agent<S: Into<String>>(self, ua: S) -> Self { self.map(|c| c.user_agent = ua.into()) }
    pub fn timeout(self, t: Duration) -> Self { self.map(|c| c.timeout = Some(t)) }
    pub fn connect_timeout(self, t: Duration) -> Self { self.map(|c| c.connect_timeout = Some(t)) }
    pub fn max_redirects(self, n: usize) -> Self { self.map(|c| c.max_redirects = Some(n)) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut SessionConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<SessionConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyHeader(&'static str),
    InvalidHeader { name: &'static str, value: String },
    ZeroTimeout(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyHeader(name) =>
                write!(f, "{name} must not be empty"),
            ConfigError::InvalidHeader { name, value } =>
                write!(f, "{name} {value:?} is not a valid header value"),
            ConfigError::ZeroTimeout(name) =>
                write!(f, "{name} must be larger than zero"),
        }
    }
}
impl std::error::Error for ConfigError {}

fn validate_header(name: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyHeader(name));
    }
    if HeaderValue::from_str(value).is_err() {
        return Err(ConfigError::InvalidHeader { name, value: value.to_string() });
    }
    Ok(())
}

pub(crate) fn validate(c: &SessionConfig) -> Result<(), ConfigError> {
    validate_header("accept", &c.accept)?;
    validate_header("user_agent", &c.user_agent)?;
    if c.timeout == Some(Duration::ZERO) {
        return Err(ConfigError::ZeroTimeout("timeout"));
    }
    if c.connect_timeout == Some(Duration::ZERO) {
        return Err(ConfigError::ZeroTimeout("connect_timeout"));
    }
    Ok(())
}
