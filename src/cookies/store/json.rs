//! JSON-backed cookie store.
//!
//! `JsonCookieStore` persists a session's cookie entries in a single JSON file:
//!
//! ```json
//! { "cookies": ["sid=42", "lang=nl"] }
//! ```
//!
//! ### I/O characteristics
//! - A missing file loads as an empty list. A file that exists but cannot be
//!   parsed is reported as an error, never replaced by an empty list.
//! - `save` writes the full payload to a sibling `*.tmp` file and renames it
//!   over the target, so readers never observe a half-written file.
//! - Missing parent directories are created on save.
//!
//! ### Example
//! ```ignore
//! let store = Arc::new(JsonCookieStore::new("cookies.json".into()));
//! let session = Session::new(client, store);
//! ```
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cookies::store::CookieStore;
use crate::errors::CookieStoreError;

/// On-disk representation of the cookie entries.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CookieStoreFile {
    cookies: Vec<String>,
}

/// A JSON-based cookie store that persists cookies across process runs.
pub struct JsonCookieStore {
    /// Path to the JSON file where cookies are stored.
    path: PathBuf,
}

impl JsonCookieStore {
    /// Creates a store backed by `path`. The file is not touched until the
    /// first load or save.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CookieStore for JsonCookieStore {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn load(&self) -> Result<Vec<String>, CookieStoreError> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let file: CookieStoreFile = serde_json::from_slice(&contents)?;
        Ok(file.cookies)
    }

    async fn save(&self, cookies: &[String]) -> Result<(), CookieStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_vec_pretty(&CookieStoreFile { cookies: cookies.to_vec() })?;

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
