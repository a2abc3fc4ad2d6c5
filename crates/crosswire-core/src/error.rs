//! Error types shared across the protocol layer.

use crate::capability::CapabilityId;
use crate::invocation::InvocationError;
use crate::message::{Message, MessageHeader};
use crate::peer_id::PeerId;
use crate::version::SemanticVersion;
use thiserror::Error;

/// Errors from capability identifier and version parsing.
///
/// Always local and surfaced synchronously to the caller that requested the
/// parse — never retried, never swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("invalid version format: '{0}' (expected major.minor.patch)")]
    InvalidVersionFormat(String),

    #[error("invalid namespace: '{0}' (must be lowercase dot-separated identifiers)")]
    InvalidNamespace(String),

    #[error("invalid capability name: '{0}' (must be lowercase with underscores)")]
    InvalidName(String),

    #[error("invalid capability ID format: '{0}' (expected namespace.name.major.minor.patch)")]
    InvalidIdFormat(String),

    #[error("capability not found: {0}")]
    NotFound(CapabilityId),

    #[error("incompatible version: required {required}, provided {provided}")]
    IncompatibleVersion {
        required: SemanticVersion,
        provided: SemanticVersion,
    },
}

/// Errors from message serialization and deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("peer name is {0} bytes (max {max})", max = MessageHeader::MAX_PEER_NAME_BYTES)]
    PeerNameTooLong(usize),

    #[error("insufficient data for message deserialization")]
    InsufficientData,

    #[error("invalid message type byte: 0x{0:02x}")]
    InvalidMessageType(u8),

    #[error("invalid peer ID in message")]
    InvalidPeerId,
}

/// Message validation failures.
///
/// Returned as the error half of [`Message::validate`](crate::Message) —
/// the caller decides whether to drop or reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    #[error("header payload length does not match payload size")]
    PayloadLengthMismatch,

    #[error("payload exceeds {} bytes", Message::MAX_PAYLOAD_SIZE)]
    PayloadTooLarge,

    #[error("malformed message header")]
    MalformedHeader,

    #[error("malformed message payload")]
    MalformedPayload,
}

/// Errors raised by transport operations.
///
/// The coordinator treats [`TransportError::Invocation`] specially
/// (propagated after exhausting fallback transports); most others are
/// transport-local and recoverable by trying the next transport.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("transport not started")]
    NotStarted,

    #[error("transport already started")]
    AlreadyStarted,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("failed to resolve peer '{0}'")]
    ResolutionFailed(PeerId),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("operation timed out")]
    Timeout,

    #[error("invalid data received")]
    InvalidData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_render_their_limits() {
        assert_eq!(
            MessageError::PeerNameTooLong(80).to_string(),
            "peer name is 80 bytes (max 63)"
        );
        assert_eq!(
            ValidationError::PayloadTooLarge.to_string(),
            "payload exceeds 1048576 bytes"
        );
    }

    #[test]
    fn invocation_errors_pass_through_transparently() {
        let inner = InvocationError::new(crate::ErrorCode::InvocationTimeout, "too slow");
        let wrapped = TransportError::from(inner.clone());
        assert_eq!(wrapped.to_string(), inner.to_string());
    }
}
