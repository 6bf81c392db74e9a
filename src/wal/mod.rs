//! Write-Ahead Log (WAL) Module
//!
//! Append-only record of every mutation, replayed on restart.
//!
//! ## Responsibilities
//! - Append a record before any memtable mutation
//! - Replay records in write order after a crash
//! - Treat a partial trailing record as end of stream
//! - Truncate once the records are durable in a segment
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Record 1                                                │
//! │ ┌──────────┬─────────┬─────┬───────────┬───────┐        │
//! │ │Action (1)│KeyLen(4)│ Key │ValueLen(4)│ Value │        │
//! │ └──────────┴─────────┴─────┴───────────┴───────┘        │
//! ├─────────────────────────────────────────────────────────┤
//! │ Record 2 ...                                            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//! Action is `'S'` or `'D'`; lengths are big-endian; deletes carry an
//! empty value. No header and no checksum.

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{Action, LogRecord, MIN_RECORD_SIZE};
pub use writer::WalWriter;
pub use reader::{WalIterator, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};
