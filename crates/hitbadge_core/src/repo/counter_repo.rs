//! Counter repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide increment, point read and ordered range reads over `counts`.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `increment_and_get` runs as one upsert inside an IMMEDIATE transaction,
//!   so SQLite serializes concurrent increments on the same key.
//! - Range reads return every row or an error, never a prefix.
//! - Read paths reject invalid persisted counts instead of masking them.

use crate::db::DbError;
use crate::model::counter::{CounterKey, KeyValidationError, RepoCount, UserRepoCount};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const INCREMENT_SQL: &str = "INSERT INTO counts (user, repo, count)
VALUES (?1, ?2, 1)
ON CONFLICT (user, repo) DO UPDATE SET count = count + 1
RETURNING count;";

pub type StoreResult<T> = Result<T, StoreError>;

/// Error for counter storage and query operations.
#[derive(Debug)]
pub enum StoreError {
    /// The backing store cannot be opened or its schema ensured.
    Unavailable(DbError),
    /// A read or write against the open store failed.
    OperationFailed(DbError),
    InvalidKey(KeyValidationError),
    InvalidData(String),
}

impl StoreError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "storage_unavailable",
            Self::OperationFailed(_) => "storage_operation_failed",
            Self::InvalidKey(_) => "invalid_key",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(err) => write!(f, "counter store unavailable: {err}"),
            Self::OperationFailed(err) => write!(f, "counter store operation failed: {err}"),
            Self::InvalidKey(err) => write!(f, "invalid counter key: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted counter data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) | Self::OperationFailed(err) => Some(err),
            Self::InvalidKey(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<KeyValidationError> for StoreError {
    fn from(value: KeyValidationError) -> Self {
        Self::InvalidKey(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::OperationFailed(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::OperationFailed(DbError::Sqlite(value))
    }
}

/// Repository interface for counter persistence.
pub trait CounterRepository {
    /// Adds one to the counter, creating it at 1, and returns the new value.
    fn increment_and_get(&self, key: &CounterKey) -> StoreResult<u64>;
    /// Returns the current count, or 0 for a counter never incremented.
    fn get_count(&self, key: &CounterKey) -> StoreResult<u64>;
    /// Lists one user's counters ordered by repo ascending.
    fn list_repo_counts(&self, user: &str) -> StoreResult<Vec<RepoCount>>;
    /// Lists every counter ordered by user, then repo, ascending.
    fn list_all_counts(&self) -> StoreResult<Vec<UserRepoCount>>;
}

/// SQLite-backed counter repository over a borrowed connection.
pub struct SqliteCounterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCounterRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CounterRepository for SqliteCounterRepository<'_> {
    fn increment_and_get(&self, key: &CounterKey) -> StoreResult<u64> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let raw: Option<i64> =
            tx.query_row(INCREMENT_SQL, params![key.user(), key.repo()], |row| row.get(0))?;
        // An error here drops `tx` uncommitted, leaving the row untouched.
        let count = nullable_count(raw, key.user(), key.repo())?;
        tx.commit()?;
        Ok(count)
    }

    fn get_count(&self, key: &CounterKey) -> StoreResult<u64> {
        let raw = self
            .conn
            .query_row(
                "SELECT count FROM counts WHERE user = ?1 AND repo = ?2;",
                params![key.user(), key.repo()],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?;

        match raw {
            None => Ok(0),
            Some(value) => nullable_count(value, key.user(), key.repo()),
        }
    }

    fn list_repo_counts(&self, user: &str) -> StoreResult<Vec<RepoCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT repo, count
             FROM counts
             WHERE user = ?1
             ORDER BY repo ASC;",
        )?;
        let mut rows = stmt.query([user])?;
        let mut counts = Vec::new();

        while let Some(row) = rows.next()? {
            let repo: String = row.get("repo")?;
            let count = nullable_count(row.get("count")?, user, &repo)?;
            counts.push(RepoCount { repo, count });
        }

        Ok(counts)
    }

    fn list_all_counts(&self) -> StoreResult<Vec<UserRepoCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT user, repo, count
             FROM counts
             ORDER BY user ASC, repo ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut counts = Vec::new();

        while let Some(row) = rows.next()? {
            counts.push(parse_user_repo_row(row)?);
        }

        Ok(counts)
    }
}

fn parse_user_repo_row(row: &Row<'_>) -> StoreResult<UserRepoCount> {
    let user: String = row.get("user")?;
    let repo: String = row.get("repo")?;
    let count = nullable_count(row.get("count")?, &user, &repo)?;
    Ok(UserRepoCount { user, repo, count })
}

// Tables created by older deployments allowed NULL counts.
fn nullable_count(value: Option<i64>, user: &str, repo: &str) -> StoreResult<u64> {
    match value {
        Some(raw) => count_from_db(raw, user, repo),
        None => Err(StoreError::InvalidData(format!(
            "NULL count for `{user}/{repo}` in counts.count"
        ))),
    }
}

fn count_from_db(raw: i64, user: &str, repo: &str) -> StoreResult<u64> {
    u64::try_from(raw).map_err(|_| {
        StoreError::InvalidData(format!(
            "negative count `{raw}` for `{user}/{repo}` in counts.count"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::{CounterRepository, SqliteCounterRepository, StoreError};
    use crate::db::migrations::apply_migrations;
    use crate::db::open_db_in_memory;
    use crate::model::counter::CounterKey;
    use rusqlite::Connection;

    fn legacy_conn_with_null_count() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE counts (user TEXT NOT NULL, repo TEXT NOT NULL, count INTEGER, PRIMARY KEY(user, repo));
             INSERT INTO counts (user, repo, count) VALUES ('old', 'repo', NULL);
             INSERT INTO counts (user, repo, count) VALUES ('old', 'ok', 5);",
        )
        .unwrap();
        apply_migrations(&mut conn).unwrap();
        conn
    }

    #[test]
    fn increment_creates_then_adds_one() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteCounterRepository::new(&conn);
        let key = CounterKey::new("alice", "proj").unwrap();

        assert_eq!(repo.get_count(&key).unwrap(), 0);
        assert_eq!(repo.increment_and_get(&key).unwrap(), 1);
        assert_eq!(repo.increment_and_get(&key).unwrap(), 2);
        assert_eq!(repo.get_count(&key).unwrap(), 2);
    }

    #[test]
    fn negative_persisted_count_is_invalid_data() {
        let conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO counts (user, repo, count) VALUES ('u', 'r', -4);",
            [],
        )
        .unwrap();
        let repo = SqliteCounterRepository::new(&conn);
        let key = CounterKey::new("u", "r").unwrap();

        let err = repo.get_count(&key).unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(message) if message.contains("-4")));
        assert!(repo.list_all_counts().is_err());
    }

    #[test]
    fn null_persisted_count_is_invalid_data() {
        let conn = legacy_conn_with_null_count();
        let repo = SqliteCounterRepository::new(&conn);
        let key = CounterKey::new("old", "repo").unwrap();

        let err = repo.get_count(&key).unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(message) if message.contains("NULL")));
        assert!(matches!(
            repo.list_repo_counts("old"),
            Err(StoreError::InvalidData(_))
        ));
        assert!(matches!(repo.list_all_counts(), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn increment_on_null_count_is_rejected_and_rolled_back() {
        let conn = legacy_conn_with_null_count();
        let repo = SqliteCounterRepository::new(&conn);
        let key = CounterKey::new("old", "repo").unwrap();

        let err = repo.increment_and_get(&key).unwrap_err();
        assert_eq!(err.code(), "invalid_data");
        assert!(conn.is_autocommit());

        let stored: Option<i64> = conn
            .query_row(
                "SELECT count FROM counts WHERE user = 'old' AND repo = 'repo';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(stored, None);

        let ok = CounterKey::new("old", "ok").unwrap();
        assert_eq!(repo.increment_and_get(&ok).unwrap(), 6);
    }

    #[test]
    fn failed_increment_leaves_no_open_transaction() {
        let conn = open_db_in_memory().unwrap();
        conn.execute("DROP TABLE counts;", []).unwrap();
        let repo = SqliteCounterRepository::new(&conn);
        let key = CounterKey::new("u", "r").unwrap();

        let err = repo.increment_and_get(&key).unwrap_err();
        assert_eq!(err.code(), "storage_operation_failed");
        assert!(conn.is_autocommit());
    }
}
