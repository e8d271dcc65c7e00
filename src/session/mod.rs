//! Session layer: connection identity, registry, and group membership.
//!
//! Sessions are created on connect, destroyed on disconnect, and mutated
//! only through explicit registry operations. The one well-known broadcast
//! group is the operator ("wizard") group.

pub mod registry;
pub mod session_id;

pub use registry::{SessionInfo, SessionRegistry};
pub use session_id::SessionId;

/// Name of the operator broadcast group. Connections that join it receive
/// forwarded participant events and presence notifications.
pub const OPERATOR_GROUP: &str = "wizard";
