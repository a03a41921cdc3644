//! Cookie store infrastructure.
//!
//! A **cookie store** is the durable side of a session: it loads the ordered
//! list of `name=value` entries a [`CookieCollection`](crate::cookies::CookieCollection)
//! starts from, and overwrites that list wholesale when the collection is saved.
//! Sessions never see the storage format; they only hold a [`CookieStoreHandle`].
//!
//! This module exports three reference implementations:
//! - [`InMemoryCookieStore`]: no persistence (tests, ephemeral sessions).
//! - [`JsonCookieStore`]: file-backed JSON store (good for simple setups).
//! - [`SqliteCookieStore`]: SQLite-backed store (feature `sqlite_cookie_store`).
//!
//! ## Design notes
//! - Implementations must be `Send + Sync` and manage their own synchronization.
//! - `load` must not hide failures: a missing store is an empty list, but an
//!   unreadable or corrupt one is an error.
//! - `save` replaces previous content; there is no merge and no history.
//!
//! ## Example: plugging a store into a session
//! ```rust,no_run
//! use std::sync::Arc;
//! use gosub_session::cookies::JsonCookieStore;
//! use gosub_session::net::HttpClient;
//! use gosub_session::session::Session;
//!
//! let client = HttpClient::default();
//! let store = Arc::new(JsonCookieStore::new("session-cookies.json".into()));
//! let session = Session::new(client, store);
//! ```
mod in_memory;
mod json;
#[cfg(feature = "sqlite_cookie_store")]
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::cookies::parse::convert_set_cookies;
use crate::errors::CookieStoreError;

/// Process-local store without persistence.
pub use in_memory::InMemoryCookieStore;
/// File-backed JSON cookie store.
pub use json::JsonCookieStore;
/// SQLite-backed cookie store.
#[cfg(feature = "sqlite_cookie_store")]
pub use sqlite::SqliteCookieStore;

/// A handle to a cookie store trait object.
pub type CookieStoreHandle = Arc<dyn CookieStore>;

/// Durable storage for one session's cookie entries.
#[async_trait]
pub trait CookieStore: Send + Sync {
    /// Short backend name, used in log output.
    fn name(&self) -> &'static str;

    /// Loads the stored entries in their stored order.
    ///
    /// Returns an empty list when nothing was saved yet.
    async fn load(&self) -> Result<Vec<String>, CookieStoreError>;

    /// Replaces the stored entries with `cookies`.
    async fn save(&self, cookies: &[String]) -> Result<(), CookieStoreError>;

    /// Converts raw `Set-Cookie` header values into entries for this store.
    ///
    /// The default keeps only the leading `name=value` pair of every header
    /// and rejects malformed input.
    fn convert_set_cookies(&self, raw: &[String]) -> Result<Vec<String>, CookieStoreError> {
        convert_set_cookies(raw)
    }
}
