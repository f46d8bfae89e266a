//! Opaque string→string key/value store with atomic increment.
//!
//! Backs the idempotency keys (`RLD<reviewId>`, `LastReplyId_<reviewId>`)
//! and the `reviewsDone`/`commentsMade` stat counters. All operations are
//! serialized against each other process-wide: the pool underneath is
//! capped at a single connection, so a held connection blocks every other
//! caller exactly the way the original's single-writer SQLite access does,
//! and `incr`'s read-modify-write is atomic because no other operation can
//! interleave on that one connection.

pub mod errors;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::debug;

pub use errors::{Error, StoreResult};

/// Handle to the key/value store.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens (creating if absent) the sqlite database at `path`, serialized
    /// behind a single-connection pool.
    pub async fn open(path: &str) -> StoreResult<Self> {
        let opts = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kvstore (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Opens an in-memory store, for tests.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kvstore (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    /// Retrieves a value, if present.
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM kvstore WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    /// Writes a value, overwriting any existing one.
    pub async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query("INSERT INTO kvstore (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        debug!(key, "store: put");
        Ok(())
    }

    /// Increments an integer-valued key by `delta`, treating an absent key
    /// as zero. Atomic with respect to other `get`/`put`/`incr` calls.
    pub async fn incr(&self, key: &str, delta: i64) -> StoreResult<i64> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query("SELECT value FROM kvstore WHERE key = ?")
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?;

        let current: i64 = match row {
            Some(r) => {
                let raw: String = r.get("value");
                raw.parse()
                    .map_err(|_| Error::NotAnInteger(raw))?
            }
            None => 0,
        };
        let updated = current + delta;

        sqlx::query("INSERT INTO kvstore (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value")
            .bind(key)
            .bind(updated.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(key, updated, "store: incr");
        Ok(updated)
    }
}
