//! SQLite-backed store for the durable buffer
//!
//! One file per logical target, one partition per source kind. The
//! connection runs in exclusive locking mode: the write lock is taken at
//! open and retained for the process lifetime, so a second invocation
//! racing on the same path waits out `busy_timeout` and then fails cleanly
//! instead of interleaving writes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use contracts::MetricBatch;
use rusqlite::{params, Connection};
use tracing::debug;

use crate::{BufferError, BufferKey, Clock, SystemClock};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS partitions (
        name TEXT PRIMARY KEY
    );

    CREATE TABLE IF NOT EXISTS entries (
        partition TEXT NOT NULL,
        key INTEGER NOT NULL,
        payload TEXT NOT NULL,
        PRIMARY KEY (partition, key)
    ) WITHOUT ROWID;
";

/// Options for opening a buffer store
#[derive(Debug, Clone)]
pub struct BufferOptions {
    /// Unix permission bits applied when the store file is first created
    pub mode: u32,

    /// Bounded wait for the exclusive lock before open fails with
    /// [`BufferError::Timeout`]
    pub lock_wait: Duration,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            mode: 0o600,
            lock_wait: Duration::from_secs(5),
        }
    }
}

/// Crash-safe, ordered, partitioned local queue
pub struct DurableBuffer {
    conn: Connection,
    path: PathBuf,
    clock: Box<dyn Clock>,
    last_key: i64,
}

impl std::fmt::Debug for DurableBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableBuffer")
            .field("path", &self.path)
            .field("last_key", &self.last_key)
            .finish_non_exhaustive()
    }
}

impl DurableBuffer {
    /// Open the store at `path`, acquiring exclusive ownership
    ///
    /// The file is created lazily with `options.mode` on first open.
    ///
    /// # Errors
    /// - [`BufferError::Timeout`] when another process holds the store past
    ///   the bounded wait
    /// - [`BufferError::OpenFailed`] for invalid paths or permissions
    pub fn open(path: impl AsRef<Path>, options: BufferOptions) -> Result<Self, BufferError> {
        Self::open_with_clock(path, options, Box::new(SystemClock))
    }

    /// Open with an explicit clock; key generation reads it at write time
    pub fn open_with_clock(
        path: impl AsRef<Path>,
        options: BufferOptions,
        clock: Box<dyn Clock>,
    ) -> Result<Self, BufferError> {
        let path = path.as_ref().to_path_buf();
        create_with_mode(&path, options.mode)?;

        let conn = Connection::open(&path).map_err(|e| open_failed(&path, &e))?;
        conn.busy_timeout(options.lock_wait)
            .map_err(|e| open_failed(&path, &e))?;
        conn.pragma_update(None, "locking_mode", "exclusive")
            .map_err(|e| open_failed(&path, &e))?;

        // Schema creation plus an explicit exclusive transaction; under
        // exclusive locking mode the write lock is retained afterwards.
        conn.execute_batch(SCHEMA)
            .map_err(|e| lock_or_open_failed(&path, e))?;
        conn.execute_batch("BEGIN EXCLUSIVE; COMMIT;")
            .map_err(|e| lock_or_open_failed(&path, e))?;

        debug!(path = %path.display(), "buffer store opened");

        Ok(Self {
            conn,
            path,
            clock,
            last_key: 0,
        })
    }

    /// Serialize `batch` and commit it atomically under a fresh key
    ///
    /// The key is strictly greater than every key previously issued for
    /// `partition`, both in this process and persisted. Creates the
    /// partition if absent.
    pub fn write(&mut self, partition: &str, batch: &MetricBatch) -> Result<BufferKey, BufferError> {
        let payload = serde_json::to_string(batch).map_err(BufferError::SerializationFailed)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO partitions (name) VALUES (?1)",
            params![partition],
        )?;

        let persisted: i64 = tx.query_row(
            "SELECT COALESCE(MAX(key), 0) FROM entries WHERE partition = ?1",
            params![partition],
            |row| row.get(0),
        )?;

        let key = self
            .clock
            .now_nanos()
            .max(self.last_key + 1)
            .max(persisted + 1);

        tx.execute(
            "INSERT INTO entries (partition, key, payload) VALUES (?1, ?2, ?3)",
            params![partition, key, payload],
        )?;
        tx.commit()?;

        self.last_key = key;
        let key = BufferKey::from_nanos(key);
        debug!(partition, %key, metrics = batch.len(), "batch buffered");
        Ok(key)
    }

    /// Read up to `limit` entries in ascending key order (`0` means all)
    ///
    /// # Errors
    /// - [`BufferError::PartitionNotFound`] when the partition was never
    ///   created; expected on a first-ever run
    /// - [`BufferError::DeserializationFailed`] when any entry is corrupt;
    ///   the whole call fails rather than skipping silently
    pub fn read_oldest(
        &self,
        partition: &str,
        limit: usize,
    ) -> Result<Vec<(BufferKey, MetricBatch)>, BufferError> {
        self.require_partition(partition)?;

        let limit: i64 = if limit == 0 { -1 } else { limit as i64 };
        let mut stmt = self.conn.prepare(
            "SELECT key, payload FROM entries WHERE partition = ?1 ORDER BY key ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![partition, limit], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (nanos, payload) = row?;
            let key = BufferKey::from_nanos(nanos);
            let batch: MetricBatch = serde_json::from_str(&payload).map_err(|e| {
                BufferError::DeserializationFailed {
                    partition: partition.to_string(),
                    key,
                    message: e.to_string(),
                }
            })?;
            entries.push((key, batch));
        }

        Ok(entries)
    }

    /// Remove exactly one entry; no-op when the key is already absent
    ///
    /// # Errors
    /// [`BufferError::PartitionNotFound`] when the partition does not exist.
    pub fn delete(&mut self, partition: &str, key: BufferKey) -> Result<(), BufferError> {
        self.require_partition(partition)?;

        let removed = self.conn.execute(
            "DELETE FROM entries WHERE partition = ?1 AND key = ?2",
            params![partition, key.as_nanos()],
        )?;
        debug!(partition, %key, removed, "entry deleted");
        Ok(())
    }

    /// Release the storage handle
    ///
    /// Dropping the buffer releases it as well; this only makes the point
    /// in the run explicit.
    pub fn close(self) {
        debug!(path = %self.path.display(), "buffer store closed");
    }

    fn require_partition(&self, partition: &str) -> Result<(), BufferError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM partitions WHERE name = ?1",
            params![partition],
            |row| row.get(0),
        )?;
        if count == 0 {
            return Err(BufferError::PartitionNotFound(partition.to_string()));
        }
        Ok(())
    }
}

/// Create the store file with the requested mode if it does not exist yet
fn create_with_mode(path: &Path, mode: u32) -> Result<(), BufferError> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    match options.open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(BufferError::OpenFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}

fn open_failed(path: &Path, e: &dyn std::fmt::Display) -> BufferError {
    BufferError::OpenFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

fn lock_or_open_failed(path: &Path, e: rusqlite::Error) -> BufferError {
    if is_busy(&e) {
        BufferError::Timeout {
            path: path.display().to_string(),
        }
    } else {
        open_failed(path, &e)
    }
}

fn is_busy(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(inner, _) if matches!(
            inner.code,
            rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
        )
    )
}
