//! Networking: the shared [`HttpClient`], per-request [`RequestOptions`] and
//! the [`SessionResponse`] handed back to callers.

mod client;
mod options;
mod response;

pub use client::HttpClient;
pub use options::RequestOptions;
pub use response::SessionResponse;
