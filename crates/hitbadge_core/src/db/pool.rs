//! Fixed-size pool of SQLite connections shared across threads.
//!
//! # Responsibility
//! - Own every connection to one database for the process lifetime.
//! - Lend a connection to exactly one caller at a time.
//!
//! # Invariants
//! - The pool never grows or shrinks after construction.
//! - A borrowed connection is returned when the closure finishes, even on error.

use super::{open_db, open_db_in_memory, DbError, DbResult};
use log::debug;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, TryLockError};

/// Thread-safe set of ready-to-use connections.
///
/// File-backed pools hold several connections so readers run in parallel
/// under WAL; in-memory pools hold one, because each in-memory connection is
/// its own database.
#[derive(Debug)]
pub struct ConnectionPool {
    slots: Vec<Mutex<Connection>>,
    next: AtomicUsize,
    location: Option<PathBuf>,
}

impl ConnectionPool {
    /// Opens `size` connections to the database file at `path`.
    ///
    /// The first connection applies migrations; the rest find the schema
    /// already current.
    pub fn open(path: impl AsRef<Path>, size: usize) -> DbResult<Self> {
        if size == 0 {
            return Err(DbError::InvalidPoolSize(size));
        }
        let path = path.as_ref();
        let slots = (0..size)
            .map(|_| open_db(path).map(Mutex::new))
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Self {
            slots,
            next: AtomicUsize::new(0),
            location: Some(path.to_path_buf()),
        })
    }

    /// Opens a single-connection pool over a fresh in-memory database.
    pub fn in_memory() -> DbResult<Self> {
        Ok(Self {
            slots: vec![Mutex::new(open_db_in_memory()?)],
            next: AtomicUsize::new(0),
            location: None,
        })
    }

    /// Number of pooled connections.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Database file path, or `None` for in-memory pools.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Runs `f` with exclusive access to one pooled connection.
    ///
    /// Prefers an idle connection; when all are busy, waits on the slot
    /// chosen round-robin.
    pub fn with_conn<T, E>(&self, f: impl FnOnce(&mut Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let start = self.next.fetch_add(1, Ordering::Relaxed) % self.slots.len();

        for offset in 0..self.slots.len() {
            let slot = &self.slots[(start + offset) % self.slots.len()];
            match slot.try_lock() {
                Ok(mut conn) => return f(&mut *conn),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(_)) => return Err(DbError::PoolPoisoned.into()),
            }
        }

        debug!("event=pool_wait module=db slot={start}");
        let mut conn = self.slots[start]
            .lock()
            .map_err(|_| E::from(DbError::PoolPoisoned))?;
        f(&mut *conn)
    }
}
