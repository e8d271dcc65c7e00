//! Relay error types.
//!
//! [`RelayError`] is the central error type for the relay. Every variant is
//! local and non-propagating: audit failures degrade durability without
//! blocking delivery, and group-operation failures are logged at the call
//! site instead of being surfaced to any connected client.

use crate::session::SessionId;

/// Server-side error enum for relay operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The audit log destination could not be opened or written.
    #[error("audit log append failed: {0}")]
    AuditAppend(#[from] std::io::Error),

    /// A registry operation referenced a connection that no longer exists.
    #[error("unknown session: {0}")]
    SessionNotFound(SessionId),

    /// An inbound frame did not match any known event tag.
    #[error("malformed event: {0}")]
    MalformedEvent(#[from] serde_json::Error),
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn session_not_found_names_the_session() {
        let id = SessionId::new();
        let err = RelayError::SessionNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = RelayError::from(io);
        assert!(err.to_string().starts_with("audit log append failed"));
    }
}
