use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::cookies::store::CookieStore;
use crate::errors::CookieStoreError;

/// In-memory cookie store (no persistence).
#[derive(Default)]
pub struct InMemoryCookieStore {
    cookies: Mutex<Vec<String>>,
    saves: AtomicUsize,
}

impl InMemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that starts out with `cookies`, as if saved earlier.
    pub fn with_cookies<I, S>(cookies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cookies: Mutex::new(cookies.into_iter().map(Into::into).collect()),
            saves: AtomicUsize::new(0),
        }
    }

    /// Entries as last saved.
    pub fn stored(&self) -> Vec<String> {
        self.cookies.lock().unwrap().clone()
    }

    /// Number of completed saves.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CookieStore for InMemoryCookieStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self) -> Result<Vec<String>, CookieStoreError> {
        Ok(self.stored())
    }

    async fn save(&self, cookies: &[String]) -> Result<(), CookieStoreError> {
        *self.cookies.lock().unwrap() = cookies.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
