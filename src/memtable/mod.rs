//! MemTable Module
//!
//! In-memory buffer of recent writes.
//!
//! ## Responsibilities
//! - `live` map of current values and a separate tombstone set
//! - A key is never live and tombstoned at the same time
//! - Count-based size reporting for the flush trigger
//! - Owned snapshots in key order for segment creation
//!
//! ## Data Structure Choice
//! BTreeMap/BTreeSet behind a single mutex: both maps must be observed and
//! mutated together, so a reader/writer split buys nothing.

mod table;

pub use table::{MemTable, MemTableSnapshot};
