//! Audit layer: record shape, CSV encoding, and the append-only writer.
//!
//! Every event that crosses the relay produces exactly one [`AuditRecord`],
//! written before the forwarding emit is attempted. Log failures degrade
//! durability only; they never block delivery.

pub mod record;
pub mod writer;

pub use record::{AuditRecord, CSV_HEADER, format_timestamp};
pub use writer::AuditLog;
