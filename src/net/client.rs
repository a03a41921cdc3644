//! Shared HTTP client accessor.
//!
//! An [`HttpClient`] is created once by the application and handed to every
//! [`Session`](crate::session::Session). The underlying `reqwest::Client` is
//! only built on the first [`HttpClient::acquire`] call and is then reused by
//! all sessions holding a clone of the handle, so connection pools and TLS
//! configuration are set up at most once.
//!
//! Concurrent first calls are single-flight: exactly one client is constructed
//! and every caller receives that same instance.

use std::sync::Arc;

use http::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::redirect::Policy;
use tokio::sync::OnceCell;

use crate::config::{self, SessionConfig};
use crate::errors::{Result, SessionError};

#[derive(Clone, Debug, Default)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

#[derive(Debug, Default)]
struct HttpClientInner {
    config: SessionConfig,
    client: OnceCell<Arc<reqwest::Client>>,
}

impl HttpClient {
    /// Creates an accessor that will build its client from `config`.
    ///
    /// Nothing is constructed until the first call to [`acquire`](Self::acquire).
    pub fn new(config: SessionConfig) -> Result<Self> {
        config::validate(&config)?;
        Ok(Self {
            inner: Arc::new(HttpClientInner {
                config,
                client: OnceCell::new(),
            }),
        })
    }

    /// Returns the shared client, building it on first use.
    pub async fn acquire(&self) -> Result<Arc<reqwest::Client>> {
        let client = self
            .inner
            .client
            .get_or_try_init(|| async { build_client(&self.inner.config).map(Arc::new) })
            .await?;
        Ok(client.clone())
    }

    /// Returns `true` once the client has been constructed.
    pub fn is_initialized(&self) -> bool {
        self.inner.client.initialized()
    }
}

fn build_client(config: &SessionConfig) -> Result<reqwest::Client> {
    let accept = HeaderValue::from_str(&config.accept)
        .map_err(|e| SessionError::InvalidHeader(format!("accept: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, accept);

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .user_agent(config.user_agent.as_str());

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(timeout) = config.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    match config.max_redirects {
        Some(0) => builder = builder.redirect(Policy::none()),
        Some(n) => builder = builder.redirect(Policy::limited(n)),
        None => {}
    }

    let client = builder.build()?;
    log::debug!("constructed shared HTTP client (accept: {})", config.accept);
    Ok(client)
}
