//! Cookie-authenticated HTTP sessions.
//!
//! A [`Session`](session::Session) issues GET/POST requests through a shared
//! [`HttpClient`](net::HttpClient), attaching the cookies kept in a
//! [`CookieStore`](cookies::CookieStore). New cookies from the server are only
//! persisted when the caller commits a response.
pub mod config;
pub mod cookies;
pub mod errors;
pub mod net;
pub mod session;

pub use config::SessionConfig;
pub use errors::{CookieStoreError, SessionError};
pub use net::{HttpClient, RequestOptions, SessionResponse};
pub use session::Session;
