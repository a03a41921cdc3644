use crate::config::ConfigError;

/// Errors raised by a [`CookieStore`](crate::cookies::CookieStore) backend or
/// while turning `Set-Cookie` values into stored entries.
#[derive(Debug, thiserror::Error)]
pub enum CookieStoreError {
    #[error("Cookie storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cookie storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cookie database error: {0}")]
    Database(String),

    #[error("Malformed Set-Cookie header: {0:?}")]
    MalformedSetCookie(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] CookieStoreError),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
