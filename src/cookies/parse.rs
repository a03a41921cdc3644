//! Conversion of `Set-Cookie` response header values into stored entries.
//!
//! A session keeps a flat, ordered list of `name=value` strings. Only the
//! leading name/value pair of each `Set-Cookie` value is retained; attributes
//! like `Path`, `Domain`, `Expires`, `Max-Age`, `Secure` and `HttpOnly` are
//! dropped. There is no domain, path or expiry matching at this level.
//!
//! Input that does not start with a valid `name=value` pair is rejected with
//! [`CookieStoreError::MalformedSetCookie`] instead of being skipped, so a
//! broken login response never silently produces a partial session.

use crate::errors::CookieStoreError;

/// Converts raw `Set-Cookie` header values into `name=value` entries.
///
/// The output keeps the order of `raw`. An empty input yields an empty list.
pub fn convert_set_cookies<S: AsRef<str>>(raw: &[S]) -> Result<Vec<String>, CookieStoreError> {
    raw.iter().map(|header| convert_one(header.as_ref())).collect()
}

fn convert_one(header: &str) -> Result<String, CookieStoreError> {
    let pair = header.split(';').next().unwrap_or_default().trim();

    let Some((name, value)) = pair.split_once('=') else {
        return Err(CookieStoreError::MalformedSetCookie(header.to_string()));
    };

    let name = name.trim();
    if !is_valid_name(name) {
        return Err(CookieStoreError::MalformedSetCookie(header.to_string()));
    }

    Ok(format!("{}={}", name, value.trim()))
}

// RFC 6265 token: no separators, whitespace or control characters.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            c.is_ascii()
                && !c.is_ascii_control()
                && !c.is_ascii_whitespace()
                && !"()<>@,;:\\\"/[]?={}".contains(c)
        })
}
