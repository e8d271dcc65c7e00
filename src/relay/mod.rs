//! Relay layer: wire events and the central dispatcher.
//!
//! [`EventRelay`] receives typed events from either role, writes one audit
//! record per event, and forwards to the audience each variant defines:
//! triggers go to everyone, participant inputs and confirmations to the
//! operator group, acks nowhere.

pub mod dispatcher;
pub mod events;

pub use dispatcher::EventRelay;
pub use events::{ClientEvent, ServerEvent};
