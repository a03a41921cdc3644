//! Caller-supplied request options.
//!
//! Options pass through to the outgoing request unmodified, with one exception:
//! the `Cookie` header always belongs to the session and any caller value for it
//! is dropped.

use std::time::Duration;

use http::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};

use crate::errors::{Result, SessionError};

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra request headers. A `Cookie` entry is ignored.
    pub headers: HeaderMap,
    /// Query string pairs appended to the URL.
    pub query: Vec<(String, String)>,
    /// Per-request timeout, overriding the client timeout.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header, validating name and value.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| SessionError::InvalidHeader(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| SessionError::InvalidHeader(format!("{name}: {e}")))?;
        self.headers.append(name, value);
        Ok(self)
    }

    pub fn query<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Headers to forward, with any caller `Cookie` header removed.
    pub(crate) fn forwarded_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        if headers.remove(COOKIE).is_some() {
            log::debug!("ignoring caller supplied Cookie header");
        }
        headers
    }
}
