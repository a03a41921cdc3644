//! Session response model.
//!
//! A [`SessionResponse`] is one **fully buffered** request/response exchange made
//! through a [`Session`]. It carries the final URL, status, headers and the body
//! decoded as text.
//!
//! ## Deferred commit
//! Cookies the server hands out with `Set-Cookie` are *not* stored when the
//! response arrives. The caller decides whether this response is trustworthy
//! (e.g. a successful login, the end of a redirect chain) and then calls
//! [`SessionResponse::save_session`], which replaces the session's cookies with
//! the ones from this response and persists them.
//!
//! ```ignore
//! let resp = session.post("https://example.com/login", &form, RequestOptions::new()).await?;
//! if resp.status == 302 && resp.location() == Some("/home") {
//!     resp.save_session().await?;
//! }
//! ```
use http::header::{HeaderMap, LOCATION, SET_COOKIE};
use serde::de::DeserializeOwned;

use crate::errors::{CookieStoreError, Result};
use crate::session::Session;

pub struct SessionResponse {
    /// Final URL of the response (after redirects, if any were followed).
    pub url: url::Url,

    /// Numeric HTTP status code (e.g., `200`, `302`).
    pub status: u16,

    /// Response headers as a case-insensitive map.
    pub headers: HeaderMap,

    /// Response body as text.
    pub data: String,

    /// Session that issued the request; target of `save_session`.
    session: Session,
}

impl std::fmt::Debug for SessionResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionResponse")
            .field("url", &self.url.as_str())
            .field("status", &self.status)
            .field("headers", &self.headers.len())
            .field("data", &self.data.len())
            .finish()
    }
}

impl SessionResponse {
    pub(crate) async fn from_reqwest(res: reqwest::Response, session: Session) -> Result<Self> {
        let url = res.url().clone();
        let status = res.status().as_u16();
        let headers = res.headers().clone();

        // Note: does not deal with streaming
        let data = res.text().await?;

        Ok(Self { url, status, headers, data, session })
    }

    /// Value of the `Location` header, if present and valid text.
    ///
    /// Redirects are never acted upon here; this is for callers that follow
    /// them by hand.
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }

    /// Raw `Set-Cookie` header values, in the order they were received.
    ///
    /// Values that are not valid UTF-8 are rejected rather than skipped.
    pub fn set_cookies(&self) -> Result<Vec<String>, CookieStoreError> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| {
                std::str::from_utf8(v.as_bytes())
                    .map(str::to_string)
                    .map_err(|_| CookieStoreError::MalformedSetCookie(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            })
            .collect()
    }

    /// Returns `true` when the server sent at least one `Set-Cookie` header.
    pub fn has_new_cookies(&self) -> bool {
        self.headers.contains_key(SET_COOKIE)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.data)
    }

    /// Commits the cookies of this response to the session.
    ///
    /// The `Set-Cookie` values are converted by the session's cookie store and
    /// then replace the stored cookies entirely, exactly like
    /// [`Session::save_session_from_cookies`]. A response without `Set-Cookie`
    /// headers therefore clears the session. Calling this more than once stores
    /// the same entries again.
    pub async fn save_session(&self) -> Result<()> {
        let raw = self.set_cookies()?;
        if raw.is_empty() {
            log::warn!("committing response from {} without Set-Cookie headers, session will be cleared", self.url);
        }
        let cookies = self.session.store().convert_set_cookies(&raw)?;
        self.session.save_session_from_cookies(cookies).await
    }
}
