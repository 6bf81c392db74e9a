//! Integrity Checker
//!
//! Recomputes each segment's CRC-32 and compares it with the stored
//! trailer. Results are diagnostic only: a failing segment is still served.

use std::fs;
use std::path::{Path, PathBuf};

use crate::codec::CHECKSUM_SIZE;
use crate::error::{Result, SegError};

use super::segment::list_segments;

/// Outcome of checking one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityStatus {
    Ok,
    Fail { reason: String },
}

/// Per-file integrity result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
    pub path: PathBuf,
    pub status: IntegrityStatus,
}

impl IntegrityReport {
    pub fn is_ok(&self) -> bool {
        self.status == IntegrityStatus::Ok
    }

    /// File name for display
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub struct IntegrityChecker;

impl IntegrityChecker {
    /// Verify one segment's trailer
    ///
    /// Returns `ChecksumMismatch` when the trailer disagrees and `Format` when
    /// the file is too short to hold one.
    pub fn check_file(path: &Path) -> Result<()> {
        let data = fs::read(path)?;
        if data.len() < CHECKSUM_SIZE {
            return Err(SegError::Format(format!(
                "segment is {} bytes, too short for a checksum",
                data.len()
            )));
        }

        let (body, trailer) = data.split_at(data.len() - CHECKSUM_SIZE);
        let stored = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let computed = crc32fast::hash(body);

        if stored != computed {
            return Err(SegError::ChecksumMismatch { stored, computed });
        }
        Ok(())
    }

    /// Check every segment in `dir`, oldest first
    ///
    /// Only listing the directory can fail; per-file problems become `Fail`
    /// reports.
    pub fn check_all(dir: &Path) -> Result<Vec<IntegrityReport>> {
        let mut reports = Vec::new();

        for (_, path) in list_segments(dir)? {
            let status = match Self::check_file(&path) {
                Ok(()) => IntegrityStatus::Ok,
                Err(e) => IntegrityStatus::Fail {
                    reason: e.to_string(),
                },
            };

            match &status {
                IntegrityStatus::Ok => {
                    tracing::info!(segment = %path.display(), "integrity check: Ok")
                }
                IntegrityStatus::Fail { reason } => {
                    tracing::warn!(segment = %path.display(), %reason, "integrity check: Fail")
                }
            }

            reports.push(IntegrityReport { path, status });
        }

        Ok(reports)
    }
}
