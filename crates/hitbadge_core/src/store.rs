//! Process-wide counter store handle.
//!
//! # Responsibility
//! - Open the database once and share it across request threads.
//! - Validate keys and route every call through a pooled connection.
//!
//! # Invariants
//! - Every read and write reaches SQLite; nothing is cached in memory.
//! - Open failures surface as `StoreError::Unavailable`; everything after
//!   that as `StoreError::OperationFailed` (or a key/data error).

use crate::db::ConnectionPool;
use crate::model::counter::{validate_identifier, CounterKey, KeyPart, RepoCount, UserRepoCount};
use crate::repo::counter_repo::{CounterRepository, SqliteCounterRepository, StoreError, StoreResult};
use log::{debug, error, info};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Default number of pooled connections for file databases.
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Cheaply cloneable, thread-safe handle to the counter database.
#[derive(Debug, Clone)]
pub struct CounterStore {
    pool: Arc<ConnectionPool>,
}

impl CounterStore {
    /// Opens (creating if needed) the database file and ensures the schema.
    ///
    /// # Errors
    /// - `StoreError::Unavailable` when the file cannot be opened, the schema
    ///   cannot be created, or `pool_size` is zero.
    pub fn open(path: impl AsRef<Path>, pool_size: usize) -> StoreResult<Self> {
        let path = path.as_ref();
        let pool = ConnectionPool::open(path, pool_size).map_err(|err| {
            error!(
                "event=store_init module=store status=error path={} error_code=storage_unavailable error={}",
                path.display(),
                err
            );
            StoreError::Unavailable(err)
        })?;
        info!(
            "event=store_init module=store status=ok path={} pool_size={}",
            path.display(),
            pool.size()
        );
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Opens a private in-memory store, mainly for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        let pool = ConnectionPool::in_memory().map_err(StoreError::Unavailable)?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Database file backing this store, if any.
    pub fn location(&self) -> Option<&Path> {
        self.pool.location()
    }

    /// Atomically adds one to the `(user, repo)` counter and returns the new
    /// value. An unseen key starts at 1.
    pub fn increment_and_get(&self, user: &str, repo: &str) -> StoreResult<u64> {
        let key = CounterKey::new(user, repo)?;
        let started_at = Instant::now();
        let result = self
            .pool
            .with_conn(|conn| SqliteCounterRepository::new(conn).increment_and_get(&key));

        match &result {
            Ok(1) => info!("event=counter_created module=store key={key}"),
            Ok(count) => debug!(
                "event=counter_increment module=store status=ok key={key} count={count} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=counter_increment module=store status=error key={key} error_code={} error={}",
                err.code(),
                err
            ),
        }
        result
    }

    /// Returns the current count for `(user, repo)`, or 0 if never incremented.
    pub fn get(&self, user: &str, repo: &str) -> StoreResult<u64> {
        let key = CounterKey::new(user, repo)?;
        self.pool
            .with_conn(|conn| SqliteCounterRepository::new(conn).get_count(&key))
            .inspect_err(|err| log_read_failure("get", err))
    }

    /// Lists the user's counters ordered by repo ascending.
    pub fn list_repo_counts(&self, user: &str) -> StoreResult<Vec<RepoCount>> {
        validate_identifier(KeyPart::User, user)?;
        self.pool
            .with_conn(|conn| SqliteCounterRepository::new(conn).list_repo_counts(user))
            .inspect_err(|err| log_read_failure("list_repo_counts", err))
    }

    /// Lists every counter ordered by user, then repo, ascending.
    pub fn list_all_counts(&self) -> StoreResult<Vec<UserRepoCount>> {
        self.pool
            .with_conn(|conn| SqliteCounterRepository::new(conn).list_all_counts())
            .inspect_err(|err| log_read_failure("list_all_counts", err))
    }
}

fn log_read_failure(op: &str, err: &StoreError) {
    error!(
        "event=counter_read module=store status=error op={op} error_code={} error={}",
        err.code(),
        err
    );
}
