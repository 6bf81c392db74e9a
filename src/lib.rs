//! # SegKV
//!
//! A log-structured key-value store with:
//! - A write-ahead log replayed on restart
//! - A memtable with a separate tombstone set
//! - Immutable, checksummed segment files written by flushes
//! - Size-triggered and interval-triggered flushing
//! - A TCP request layer over get/set/delete
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                             │
//! │                  (Multiple Clients)                         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ get / set / delete
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                │
//! │      (serialized writes, lock-free segment reads)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐     ┌─────────────┐
//!   │     WAL     │          │  MemTable   │◄────│   Flush     │
//!   │  (Append)   │          │ live + tomb │     │  Scheduler  │
//!   └─────────────┘          └──────┬──────┘     └─────────────┘
//!                                   │ flush
//!                                   ▼
//!                           ┌─────────────┐
//!                           │  Segments   │
//!                           │ (newest →   │
//!                           │   oldest)   │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod codec;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod scheduler;
pub mod network;
pub mod protocol;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, SegError};
pub use config::Config;
pub use engine::Engine;
pub use scheduler::FlushScheduler;
pub use storage::LookupResult;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of SegKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
