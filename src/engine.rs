//! Engine Module
//!
//! The core storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and Storage
//! - Handle concurrent read/write access
//! - Trigger flushes when the MemTable reaches its threshold
//! - Replay the WAL and check segment integrity on startup

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::memtable::MemTable;
use crate::protocol::Command;
use crate::scheduler::FlushTarget;
use crate::storage::{IntegrityReport, SegmentMeta, StorageManager};
use crate::wal::{Action, LogRecord, WalRecovery, WalWriter};

/// The main storage engine
///
/// ## Concurrency Model
///
/// - **Writes** (set/delete/flush): serialized by `write_lock`
///   - Order inside the lock: WAL append → memtable → optional flush
///   - A failed WAL append returns before the memtable is touched
///   - A flush holds the lock across snapshot → segment → WAL truncate →
///     clear, so no set/delete can slip in between snapshot and clear
///
/// - **Reads** (get): never take `write_lock`
///   - MemTable takes its own short internal lock
///   - Segment scans open immutable files and need no lock
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Directory holding the segment files
    segment_dir: PathBuf,

    /// Durability log (appends serialized by this mutex)
    wal: Mutex<WalWriter>,

    /// In-memory table for recent writes
    memtable: MemTable,

    /// Segment storage
    storage: StorageManager,

    /// Serializes write operations (set/delete/flush)
    write_lock: Mutex<()>,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const SEGMENT_DIR: &'static str = "segments";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data and segment directories
    /// 2. Run the integrity check (reported, never fatal)
    /// 3. Replay the WAL into the memtable
    /// 4. Flush replayed data so the log can be truncated; on failure the
    ///    records stay in the memtable and the WAL for a later flush
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        fs::create_dir_all(&config.data_dir)?;
        let segment_dir = config.data_dir.join(Self::SEGMENT_DIR);
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);

        let storage = StorageManager::open(&segment_dir)?;

        match storage.check_integrity() {
            Ok(reports) => {
                let failed = reports.iter().filter(|r| !r.is_ok()).count();
                tracing::info!(segments = reports.len(), failed, "integrity check complete");
            }
            Err(e) => tracing::error!(error = %e, "integrity check could not run"),
        }

        let memtable = MemTable::new();
        let (records, recovery) = WalRecovery::recover(&wal_path)?;
        for record in records {
            apply(&memtable, record);
        }

        if recovery.records_recovered > 0 || recovery.corrupt_tail {
            tracing::info!(
                recovered = recovery.records_recovered,
                discarded_bytes = recovery.bytes_discarded,
                "WAL replayed"
            );
        }

        let engine = Self {
            wal: Mutex::new(WalWriter::open(&wal_path, config.wal_sync_strategy)?),
            config,
            segment_dir,
            memtable,
            storage,
            write_lock: Mutex::new(()),
        };

        // Replayed records are only in memory now: make them durable before
        // the log is cut. An empty memtable still truncates a torn tail.
        {
            let _write_guard = engine.write_lock.lock();
            match engine.flush_internal() {
                Ok(Some(_)) => {}
                Ok(None) => {
                    let mut wal = engine.wal.lock();
                    if !wal.is_empty() {
                        wal.truncate()?;
                    }
                }
                // The WAL still holds every replayed record; a later flush retries
                Err(e) => tracing::error!(
                    error = %e,
                    pending = engine.memtable.snapshot().entry_count(),
                    "flush of replayed records failed; keeping them in the memtable"
                ),
            }
        }

        Ok(engine)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Execute a command
    ///
    /// Routes request-layer commands onto the core API
    pub fn execute(&self, command: Command) -> Result<Option<Vec<u8>>> {
        match command {
            Command::Get { key } => self.get(&key),
            Command::Set { key, value } => {
                self.set(&key, &value)?;
                Ok(None)
            }
            Command::Delete { key } => self.delete(&key),
            Command::Ping => Ok(Some(b"PONG".to_vec())),
        }
    }

    /// Get a value by key
    ///
    /// Search order:
    /// 1. MemTable tombstones (deleted since the last flush)
    /// 2. MemTable live values
    /// 3. Segments (newest to oldest)
    ///
    /// Deleted and never-written keys both come back as `None`.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if self.memtable.is_deleted(key) {
            return Ok(None);
        }
        if let Some(value) = self.memtable.get(key) {
            return Ok(Some(value));
        }
        Ok(self.storage.lookup(key).into_value())
    }

    /// Set a key-value pair
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Append to WAL (durability)
    /// 3. Write to MemTable
    /// 4. Flush if the threshold is reached
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        self.wal
            .lock()
            .append(&LogRecord::set(key.to_vec(), value.to_vec()))?;

        self.memtable.set(key.to_vec(), value.to_vec());

        self.maybe_flush()
    }

    /// Delete a key
    ///
    /// Returns the value visible before the delete, from the memtable or
    /// the segments. The tombstone is recorded either way.
    pub fn delete(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let _write_guard = self.write_lock.lock();

        let previous = self.get(key)?;

        self.wal.lock().append(&LogRecord::delete(key.to_vec()))?;

        self.memtable.delete(key.to_vec());

        self.maybe_flush()?;

        Ok(previous)
    }

    /// Flush memtable to disk (public API)
    ///
    /// Returns the new segment, or `None` when there was nothing to flush
    pub fn flush(&self) -> Result<Option<SegmentMeta>> {
        let _write_guard = self.write_lock.lock();
        self.flush_internal()
    }

    fn maybe_flush(&self) -> Result<()> {
        if self.memtable.exceeds(self.config.flush_threshold) {
            tracing::debug!(threshold = self.config.flush_threshold, "memtable threshold reached");
            self.flush_internal()?;
        }
        Ok(())
    }

    /// Internal flush implementation (called with write lock held)
    ///
    /// A failure leaves the memtable and WAL untouched for the next attempt.
    fn flush_internal(&self) -> Result<Option<SegmentMeta>> {
        let snapshot = self.memtable.snapshot();
        if snapshot.is_empty() {
            return Ok(None);
        }

        // Step 1: Write the snapshot to a new segment
        let meta = self.storage.flush(&snapshot)?;

        // Step 2: Truncate WAL (entries are now durable in the segment)
        self.wal.lock().truncate()?;

        // Step 3: Clear memtable
        self.memtable.clear();

        Ok(meta)
    }

    /// Re-run the segment integrity check
    pub fn check_integrity(&self) -> Result<Vec<IntegrityReport>> {
        self.storage.check_integrity()
    }

    /// Flush pending data and sync the WAL
    pub fn close(&self) -> Result<()> {
        self.flush()?;
        self.wal.lock().sync()?;
        tracing::info!("engine closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the segment directory path
    pub fn segment_dir(&self) -> &Path {
        &self.segment_dir
    }

    /// Get the WAL file path
    pub fn wal_path(&self) -> PathBuf {
        self.config.data_dir.join(Self::WAL_FILENAME)
    }

    /// `(live_count, tombstone_count)` of the memtable
    pub fn memtable_size(&self) -> (usize, usize) {
        self.memtable.size()
    }

    /// True when nothing is waiting to be flushed
    pub fn memtable_is_empty(&self) -> bool {
        self.memtable.is_empty()
    }

    /// Get the number of segments
    pub fn segment_count(&self) -> usize {
        self.storage.segment_count()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl FlushTarget for Engine {
    fn flush_now(&self) -> Result<()> {
        self.flush().map(|_| ())
    }
}

/// Apply a replayed record to the memtable
fn apply(memtable: &MemTable, record: LogRecord) {
    match record.action {
        Action::Set => memtable.set(record.key, record.value),
        Action::Delete => {
            memtable.delete(record.key);
        }
    }
}
