//! SQLite-backed cookie store.
//!
//! `SqliteCookieStore` persists a session's cookie entries in a single SQLite
//! database, one row per entry. The `position` column keeps the stored order.
//!
//! ## Design
//! - One **table** (`session_cookies`) holding the ordered entries.
//! - Database access is via an `r2d2` pool for safe multi-threaded use.
//! - All database work runs on tokio's blocking pool.
//! - `save` **rewrites** the table (DELETE + INSERT) inside one transaction, so
//!   a failed save leaves the previous entries in place.
//!
//! ## Example
//! ```ignore
//! let store = Arc::new(SqliteCookieStore::new("cookies.sqlite".into())?);
//! let session = Session::new(client, store);
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::rusqlite::params;
use r2d2_sqlite::SqliteConnectionManager;

use crate::cookies::store::CookieStore;
use crate::errors::CookieStoreError;

/// A SQLite-based cookie store that persists cookies across process runs.
pub struct SqliteCookieStore {
    /// Connection pool for SQLite database (so it can run multithreaded)
    pool: Pool<SqliteConnectionManager>,
}

fn db_error(e: impl std::fmt::Display) -> CookieStoreError {
    CookieStoreError::Database(e.to_string())
}

impl SqliteCookieStore {
    /// Opens (or creates) a SQLite database at `path` and ensures the schema exists.
    pub fn new(path: PathBuf) -> Result<Self, CookieStoreError> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::new(manager).map_err(db_error)?;

        let conn = pool.get().map_err(db_error)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS session_cookies (
                position INTEGER PRIMARY KEY,
                entry TEXT NOT NULL
            );",
        )
        .map_err(db_error)?;

        Ok(Self { pool })
    }

    /// Runs `f` with a pooled connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, CookieStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PooledConnection<SqliteConnectionManager>) -> Result<T, CookieStoreError>
            + Send
            + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(db_error)?;
            f(&mut conn)
        })
        .await
        .map_err(db_error)?
    }
}

#[async_trait]
impl CookieStore for SqliteCookieStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn load(&self) -> Result<Vec<String>, CookieStoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT entry FROM session_cookies ORDER BY position")
                .map_err(db_error)?;

            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(db_error)?;

            rows.collect::<Result<Vec<_>, _>>().map_err(db_error)
        })
        .await
    }

    async fn save(&self, cookies: &[String]) -> Result<(), CookieStoreError> {
        let cookies = cookies.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(db_error)?;
            tx.execute("DELETE FROM session_cookies", []).map_err(db_error)?;
            {
                let mut stmt = tx
                    .prepare("INSERT INTO session_cookies (position, entry) VALUES (?1, ?2)")
                    .map_err(db_error)?;
                for (position, entry) in cookies.iter().enumerate() {
                    stmt.execute(params![position as i64, entry]).map_err(db_error)?;
                }
            }
            tx.commit().map_err(db_error)
        })
        .await
    }
}
