pub mod error;
pub mod filter;
pub mod migrations;
pub mod models;
pub mod queries;

pub use error::{DbError, MatchRuleViolation};
pub use filter::CatFilter;

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

/// Limits for the connection pool.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Number of read-only connections. All writes share a single connection.
    pub max_readers: usize,
    /// Connections older than this are reopened on next use.
    pub max_lifetime: Duration,
    /// Connections unused for longer than this are reopened on next use.
    pub idle_timeout: Duration,
    /// How long SQLite waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_readers: 4,
            max_lifetime: Duration::from_secs(3600),
            idle_timeout: Duration::from_secs(1800),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

struct Slot {
    conn: Connection,
    opened_at: Instant,
    last_used: Instant,
}

impl Slot {
    fn new(conn: Connection) -> Self {
        let now = Instant::now();
        Self {
            conn,
            opened_at: now,
            last_used: now,
        }
    }

    fn is_stale(&self, options: &PoolOptions) -> bool {
        self.opened_at.elapsed() >= options.max_lifetime
            || self.last_used.elapsed() >= options.idle_timeout
    }
}

/// Pooled SQLite handle: one writer plus a fixed set of readers, WAL mode.
///
/// Acquiring a busy slot blocks on its mutex, so callers run on the blocking
/// thread pool.
pub struct Database {
    path: PathBuf,
    options: PoolOptions,
    writer: Mutex<Slot>,
    readers: Vec<Mutex<Slot>>,
    reader_idx: AtomicUsize,
}

impl Database {
    pub fn open(path: &Path, options: PoolOptions) -> Result<Self> {
        let writer = open_writer(path, &options)?;

        migrations::run(&writer)?;

        let reader_count = options.max_readers.max(1);
        let mut readers = Vec::with_capacity(reader_count);
        for _ in 0..reader_count {
            readers.push(Mutex::new(Slot::new(open_reader(path, &options)?)));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            reader_count
        );
        Ok(Self {
            path: path.to_path_buf(),
            options,
            writer: Mutex::new(Slot::new(writer)),
            readers,
            reader_idx: AtomicUsize::new(0),
        })
    }

    /// Run `f` on one of the read-only connections.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let idx = self.reader_idx.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let mut slot = self.readers[idx]
            .lock()
            .map_err(|e| DbError::Pool(format!("reader lock poisoned: {e}")))?;

        if slot.is_stale(&self.options) {
            debug!("Recycling reader connection {}", idx);
            *slot = Slot::new(open_reader(&self.path, &self.options)?);
        }

        let out = f(&slot.conn);
        slot.last_used = Instant::now();
        out
    }

    /// Run `f` on the writer connection. Mutable so callers can open
    /// transactions.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&mut Connection) -> Result<T, DbError>,
    {
        let mut slot = self
            .writer
            .lock()
            .map_err(|e| DbError::Pool(format!("writer lock poisoned: {e}")))?;

        if slot.is_stale(&self.options) {
            debug!("Recycling writer connection");
            *slot = Slot::new(open_writer(&self.path, &self.options)?);
        }

        let out = f(&mut slot.conn);
        slot.last_used = Instant::now();
        out
    }
}

fn open_writer(path: &Path, options: &PoolOptions) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;

    // WAL mode so readers don't block on the writer
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    debug!("journal_mode={}", mode);
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(options.busy_timeout)?;
    Ok(conn)
}

fn open_reader(path: &Path, options: &PoolOptions) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(options.busy_timeout)?;
    Ok(conn)
}
