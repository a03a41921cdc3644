//! The in-memory cookie collection of a single session.
//!
//! A [`CookieCollection`] owns an ordered list of raw `name=value` strings and
//! delegates durable storage to the [`CookieStore`](crate::cookies::CookieStore)
//! it was loaded from. Mutations (`set`, `empty`) only touch memory; nothing is
//! written until [`CookieCollection::save`] is called. [`CookieCollection::commit`]
//! works the other way round: it writes first and swaps the entries only once
//! the store accepted them.
//!
//! ```ignore
//! let mut cookies = CookieCollection::load(store).await?;
//! cookies.set(vec!["sid=42".into()]);
//! cookies.save().await?;
//! assert_eq!(cookies.header_value(), "sid=42");
//! ```

use crate::cookies::store::CookieStoreHandle;
use crate::errors::CookieStoreError;

/// Separator between entries in a `Cookie` request header.
pub const COOKIE_SEPARATOR: &str = "; ";

pub struct CookieCollection {
    entries: Vec<String>,
    store: CookieStoreHandle,
}

impl std::fmt::Debug for CookieCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // values are credentials, only show the names
        let names: Vec<&str> = self
            .entries
            .iter()
            .map(|e| e.split_once('=').map_or(e.as_str(), |(n, _)| n))
            .collect();
        f.debug_struct("CookieCollection")
            .field("names", &names)
            .field("store", &self.store.name())
            .finish()
    }
}

impl CookieCollection {
    /// Creates a collection pre-populated from `store`.
    ///
    /// Load failures are returned as-is.
    pub async fn load(store: CookieStoreHandle) -> Result<Self, CookieStoreError> {
        let entries = store.load().await?;
        log::debug!("loaded {} cookie(s) from {} store", entries.len(), store.name());
        Ok(Self { entries, store })
    }

    /// Current entries, in stored order.
    pub fn get(&self) -> &[String] {
        &self.entries
    }

    /// Replaces all entries with `cookies`.
    pub fn set(&mut self, cookies: Vec<String>) {
        self.entries = cookies;
    }

    /// Removes all entries.
    pub fn empty(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the current entries to the backing store, overwriting what was there.
    pub async fn save(&self) -> Result<(), CookieStoreError> {
        self.store.save(&self.entries).await?;
        log::debug!("saved {} cookie(s) to {} store", self.entries.len(), self.store.name());
        Ok(())
    }

    /// Persists `cookies` and only then makes them the current entries.
    ///
    /// If the store fails, the collection keeps its previous entries.
    pub async fn commit(&mut self, cookies: Vec<String>) -> Result<(), CookieStoreError> {
        self.store.save(&cookies).await?;
        self.entries = cookies;
        log::debug!("committed {} cookie(s) to {} store", self.entries.len(), self.store.name());
        Ok(())
    }

    /// Value for the `Cookie` request header: all entries joined with `"; "`.
    pub fn header_value(&self) -> String {
        self.entries.join(COOKIE_SEPARATOR)
    }
}
