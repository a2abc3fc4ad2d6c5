//! JSON payload bodies carried inside wire messages.
//!
//! Payloads are serialized as JSON with camelCase keys. Opaque binary fields
//! (invocation arguments and results) travel as base64 strings so the JSON
//! stays transport-safe.

use crate::capability::CapabilityId;
use crate::peer_id::PeerId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

mod base64_bytes_opt {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        bytes
            .as_ref()
            .map(|b| STANDARD.encode(b))
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Body of an ANNOUNCE message: who the peer is and what it offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncePayload {
    #[serde(rename = "peerID")]
    pub peer_id: PeerId,
    pub capabilities: Vec<CapabilityId>,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl AnnouncePayload {
    pub fn new(peer_id: PeerId, capabilities: Vec<CapabilityId>) -> Self {
        Self {
            peer_id,
            capabilities,
            display_name: None,
            metadata: HashMap::new(),
        }
    }
}

/// Body of a QUERY message: which capability is sought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPayload {
    pub capability: CapabilityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<HashMap<String, String>>,
}

/// Body of an INVOKE message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokePayload {
    pub capability: CapabilityId,
    #[serde(rename = "invocationID")]
    pub invocation_id: String,
    #[serde(with = "base64_bytes")]
    pub arguments: Vec<u8>,
}

impl InvokePayload {
    /// Build an invoke payload with a fresh correlation ID.
    pub fn new(capability: CapabilityId, arguments: Vec<u8>) -> Self {
        Self {
            capability,
            invocation_id: uuid::Uuid::new_v4().to_string(),
            arguments,
        }
    }
}

/// Body of an INVOKE_RESPONSE message, correlated by invocation ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeResponsePayload {
    #[serde(rename = "invocationID")]
    pub invocation_id: String,
    pub success: bool,
    #[serde(with = "base64_bytes_opt", default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<u8>>,
    #[serde(rename = "errorCode", skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u32>,
    #[serde(rename = "errorMessage", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl InvokeResponsePayload {
    pub fn success(invocation_id: String, result: Vec<u8>) -> Self {
        Self {
            invocation_id,
            success: true,
            result: Some(result),
            error_code: None,
            error_message: None,
        }
    }

    pub fn failure(invocation_id: String, error_code: u32, error_message: String) -> Self {
        Self {
            invocation_id,
            success: false,
            result: None,
            error_code: Some(error_code),
            error_message: Some(error_message),
        }
    }
}

/// Body of an ERROR message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: u32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
}

/// Published peer document for HTTP-reachable peers.
///
/// Servers expose this at [`PeerDescriptor::WELL_KNOWN_PATH`] so a peer can
/// be discovered from a bare base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerDescriptor {
    /// Peer name.
    pub id: String,
    /// Protocol version.
    #[serde(default = "PeerDescriptor::default_version")]
    pub version: u32,
    /// Capability IDs this peer provides.
    #[serde(default)]
    pub provides: Vec<String>,
    /// Capability IDs this peer accepts.
    #[serde(default)]
    pub accepts: Vec<String>,
    /// Socket endpoint path, defaults to `/crosswire` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub websocket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

impl PeerDescriptor {
    /// Well-known HTTP path where the descriptor is published.
    pub const WELL_KNOWN_PATH: &'static str = ".well-known/crosswire-peer.json";

    fn default_version() -> u32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityId;

    fn move_capability() -> CapabilityId {
        "robot.mobility.move.1.0.0".parse().unwrap()
    }

    #[test]
    fn announce_round_trip_with_metadata() {
        let mut payload = AnnouncePayload::new(PeerId::new("rover"), vec![move_capability()]);
        payload.display_name = Some("Rover".to_string());
        payload.metadata.insert("port".to_string(), "9300".to_string());

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"peerID\":\"rover\""));
        assert!(json.contains("\"displayName\":\"Rover\""));
        let back: AnnouncePayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn announce_metadata_defaults_to_empty() {
        let json = r#"{"peerID":"rover","capabilities":[]}"#;
        let payload: AnnouncePayload = serde_json::from_str(json).unwrap();
        assert!(payload.metadata.is_empty());
        assert!(payload.display_name.is_none());
    }

    #[test]
    fn invoke_arguments_travel_as_base64() {
        let payload = InvokePayload {
            capability: move_capability(),
            invocation_id: "abc-123".to_string(),
            arguments: b"{\"speed\":2}".to_vec(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"invocationID\":\"abc-123\""));
        // raw JSON bytes must not appear verbatim
        assert!(!json.contains("speed"));
        let back: InvokePayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back.arguments, b"{\"speed\":2}");
    }

    #[test]
    fn invoke_new_generates_unique_ids() {
        let a = InvokePayload::new(move_capability(), Vec::new());
        let b = InvokePayload::new(move_capability(), Vec::new());
        assert_ne!(a.invocation_id, b.invocation_id);
    }

    #[test]
    fn invoke_response_success_and_failure() {
        let ok = InvokeResponsePayload::success("id-1".to_string(), b"42".to_vec());
        let json = serde_json::to_string(&ok).unwrap();
        assert!(!json.contains("errorCode"));
        let back: InvokeResponsePayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back.result, Some(b"42".to_vec()));

        let failed =
            InvokeResponsePayload::failure("id-2".to_string(), 3001, "boom".to_string());
        let json = serde_json::to_string(&failed).unwrap();
        assert!(json.contains("\"errorCode\":3001"));
        let back: InvokeResponsePayload = serde_json::from_str(&json).unwrap();
        assert!(!back.success);
        assert_eq!(back.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn error_payload_round_trip() {
        let payload = ErrorPayload {
            code: 2001,
            message: "capability not found".to_string(),
            details: None,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"code":2001,"message":"capability not found"}"#);
        let back: ErrorPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn peer_descriptor_defaults() {
        let json = r#"{"id":"hub"}"#;
        let descriptor: PeerDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.version, 1);
        assert!(descriptor.provides.is_empty());
        assert!(descriptor.accepts.is_empty());
        assert!(descriptor.websocket.is_none());
    }

    #[test]
    fn peer_descriptor_full_document() {
        let descriptor = PeerDescriptor {
            id: "hub".to_string(),
            version: 1,
            provides: vec!["home.lights.toggle.1.0.0".to_string()],
            accepts: vec![],
            websocket: Some("/crosswire".to_string()),
            metadata: None,
        };
        let json = serde_json::to_string(&descriptor).unwrap();
        let back: PeerDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, descriptor);
    }
}
