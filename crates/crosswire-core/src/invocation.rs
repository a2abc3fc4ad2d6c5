//! Capability invocation results and the shared error-code registry.

use crate::peer_id::PeerId;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Wire-level error codes shared by all peers.
///
/// Codes are grouped by the thousands digit: 1xxx message, 2xxx capability,
/// 3xxx invocation, 4xxx trust, 5xxx resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    Unknown = 0,
    InvalidMessage = 1001,
    InvalidSignature = 1002,
    TimestampExpired = 1003,
    CapabilityNotFound = 2001,
    CapabilityNotAvailable = 2002,
    IncompatibleVersion = 2003,
    InvocationFailed = 3001,
    InvocationTimeout = 3002,
    InvocationDenied = 3003,
    TrustInsufficient = 4001,
    TrustExpired = 4002,
    RateLimitExceeded = 5001,
    ResourceUnavailable = 5002,
}

impl ErrorCode {
    /// Decode a raw wire code. Unrecognized codes map to `None`; callers
    /// that must proceed anyway fall back to [`ErrorCode::Unknown`].
    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1001 => Some(Self::InvalidMessage),
            1002 => Some(Self::InvalidSignature),
            1003 => Some(Self::TimestampExpired),
            2001 => Some(Self::CapabilityNotFound),
            2002 => Some(Self::CapabilityNotAvailable),
            2003 => Some(Self::IncompatibleVersion),
            3001 => Some(Self::InvocationFailed),
            3002 => Some(Self::InvocationTimeout),
            3003 => Some(Self::InvocationDenied),
            4001 => Some(Self::TrustInsufficient),
            4002 => Some(Self::TrustExpired),
            5001 => Some(Self::RateLimitExceeded),
            5002 => Some(Self::ResourceUnavailable),
            _ => None,
        }
    }

    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::InvalidMessage => "invalid_message",
            Self::InvalidSignature => "invalid_signature",
            Self::TimestampExpired => "timestamp_expired",
            Self::CapabilityNotFound => "capability_not_found",
            Self::CapabilityNotAvailable => "capability_not_available",
            Self::IncompatibleVersion => "incompatible_version",
            Self::InvocationFailed => "invocation_failed",
            Self::InvocationTimeout => "invocation_timeout",
            Self::InvocationDenied => "invocation_denied",
            Self::TrustInsufficient => "trust_insufficient",
            Self::TrustExpired => "trust_expired",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::ResourceUnavailable => "resource_unavailable",
        };
        write!(f, "{} ({})", name, self.as_u32())
    }
}

/// Structured failure detail for a capability invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invocation error {code}: {message}")]
pub struct InvocationError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, String>>,
}

impl InvocationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: HashMap<String, String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details: Some(details),
        }
    }
}

/// Outcome of a single capability invocation.
///
/// Carries either JSON-encoded result data or an [`InvocationError`], plus
/// the measured round-trip time and the responding peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    pub success: bool,
    pub data: Option<Vec<u8>>,
    pub error: Option<InvocationError>,
    pub round_trip_time: Duration,
    pub source_peer: PeerId,
}

impl InvocationResult {
    pub fn success(data: Vec<u8>, round_trip_time: Duration, source_peer: PeerId) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            round_trip_time,
            source_peer,
        }
    }

    pub fn failure(
        error: InvocationError,
        round_trip_time: Duration,
        source_peer: PeerId,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            round_trip_time,
            source_peer,
        }
    }
}
