//! # wizard-relay
//!
//! Real-time event relay for a Wizard-of-Oz experiment setup: an operator
//! console sends scripted stimulus events to participant clients, and
//! participants send inputs and confirmations back, with every event
//! appended to a CSV audit log.
//!
//! ## Architecture
//!
//! ```text
//! Clients (operator console, participant)
//!     │
//!     ├── WS Handler + connection loop (ws/)
//!     │
//!     ├── EventRelay (relay/)
//!     │       │
//!     │       ├── SessionRegistry (session/)   — connections & groups
//!     │       └── AuditLog (audit/)            — append-only CSV
//!     │
//!     └── "wizard" operator group receives forwarded participant events
//! ```

pub mod app_state;
pub mod audit;
pub mod config;
pub mod error;
pub mod relay;
pub mod session;
pub mod ws;
