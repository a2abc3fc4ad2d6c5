//! Crosswire — transport-agnostic peer discovery and capability invocation.
//!
//! Peers advertise named, versioned capabilities, discover each other over
//! arbitrary transports, and invoke capabilities on one another with
//! request/response correlation.
//!
//! ## Architecture
//!
//! - **Identity**: [`PeerId`] (self-declared, mDNS-style) and
//!   [`CapabilityId`]/[`SemanticVersion`] with compatibility rules
//! - **Capability model**: [`Capability`], [`CapabilitySet`] with compatible
//!   version lookup
//! - **Wire protocol**: [`Message`]/[`MessageHeader`] binary framing with
//!   JSON payload structures
//! - **Transport contract**: the [`Transport`] trait every backend implements
//! - **Coordinator**: [`TransportCoordinator`] fanning discovery and
//!   invocation out across all registered backends

pub mod capability;
pub mod coordinator;
pub mod error;
pub mod framing;
pub mod invocation;
pub mod message;
pub mod payload;
pub mod peer;
pub mod peer_id;
pub mod transport;
pub mod version;

pub use capability::{
    Capability, CapabilityId, CapabilitySchema, CapabilitySet, PropertySchema, SchemaType,
};
pub use coordinator::{InvocationHandler, PeerStream, TransportCoordinator};
pub use error::{CapabilityError, MessageError, TransportError, ValidationError};
pub use invocation::{ErrorCode, InvocationError, InvocationResult};
pub use message::{Message, MessageFlags, MessageHeader, MessageType};
pub use payload::{
    AnnouncePayload, ErrorPayload, InvokePayload, InvokeResponsePayload, PeerDescriptor,
    QueryPayload,
};
pub use peer::{DiscoveredPeer, LocalPeer, ResolvedPeer};
pub use peer_id::PeerId;
pub use transport::{
    DiscoveryStream, EventChannel, EventStream, ResponseSender, Transport, TransportEvent,
};
pub use version::SemanticVersion;

/// Current wire protocol version.
pub const PROTOCOL_VERSION: u8 = 1;
