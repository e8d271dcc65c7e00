//! WebSocket layer: upgrade handling and the per-connection loop.
//!
//! The endpoint at `/ws` is the only client-facing surface: operator
//! consoles and participant clients both speak the same bidirectional
//! JSON-frame protocol over it.

pub mod connection;
pub mod handler;
