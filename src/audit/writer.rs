//! Append-only audit log writer.
//!
//! [`AuditLog`] owns the destination path and serializes all appends behind
//! a [`tokio::sync::Mutex`], so concurrent connection tasks never interleave
//! partial lines and the header is written exactly once even when several
//! first writers race on a fresh file.

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::record::{AuditRecord, CSV_HEADER};
use crate::error::RelayError;

/// Durable, append-only CSV log of every event crossing the relay.
///
/// Rows are never mutated or deleted; the file grows monotonically for the
/// process lifetime. Each append is a complete, flushed line.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    // Serializes the header-if-empty check with the subsequent write.
    write_lock: Mutex<()>,
}

impl AuditLog {
    /// Creates a writer for the given destination. The file itself is not
    /// touched until the first [`append`](Self::append).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the destination path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record, creating the file with its header when absent.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::AuditAppend`] if the destination cannot be
    /// opened or written. Callers treat this as a durability degradation
    /// only: the event is still forwarded to its audience.
    pub async fn append(&self, record: &AuditRecord) -> Result<(), RelayError> {
        let _guard = self.write_lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut line = String::new();
        if file.metadata().await?.len() == 0 {
            line.push_str(CSV_HEADER);
            line.push('\n');
        }
        line.push_str(&record.to_csv_line());
        line.push('\n');

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
