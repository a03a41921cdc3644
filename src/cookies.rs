// src/cookies.rs
//! Cookies: [`CookieCollection`], [`CookieStore`] and backends.

mod collection;
mod parse;
mod store;

pub use collection::CookieCollection;
pub use collection::COOKIE_SEPARATOR;
pub use parse::convert_set_cookies;

pub use store::CookieStore;
pub use store::CookieStoreHandle;
pub use store::InMemoryCookieStore;
pub use store::JsonCookieStore;
#[cfg(feature = "sqlite_cookie_store")]
pub use store::SqliteCookieStore;
