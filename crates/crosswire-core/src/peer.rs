//! Peer representations: the local peer and transport-agnostic views of
//! remote peers.

use crate::capability::{CapabilityId, CapabilitySet};
use crate::message::{Message, MessageFlags, MessageType};
use crate::peer_id::PeerId;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// The peer running this process.
///
/// Owns the peer's identity, its provided and accepted capability sets, and
/// the per-sender message sequence counter. Clones share the counter, so a
/// clone handed to a transport keeps sequence numbers gap-free.
#[derive(Debug, Clone)]
pub struct LocalPeer {
    peer_id: PeerId,
    provides: CapabilitySet,
    accepts: CapabilitySet,
    display_name: Option<String>,
    metadata: HashMap<String, String>,
    sequence: Arc<AtomicU32>,
}

impl LocalPeer {
    pub fn new(name: &str, provides: CapabilitySet, accepts: CapabilitySet) -> Self {
        Self {
            peer_id: PeerId::new(name),
            provides,
            accepts,
            display_name: None,
            metadata: HashMap::new(),
            sequence: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn provides(&self) -> &CapabilitySet {
        &self.provides
    }

    pub fn accepts(&self) -> &CapabilitySet {
        &self.accepts
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Next sequence number. Starts at 1 and wraps on overflow.
    pub fn next_sequence_number(&self) -> u32 {
        self.sequence.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Create an addressed message from this peer.
    pub fn create_message(
        &self,
        message_type: MessageType,
        flags: MessageFlags,
        recipient: PeerId,
        payload: Vec<u8>,
    ) -> Message {
        Message::new(
            message_type,
            flags,
            self.peer_id.clone(),
            recipient,
            self.next_sequence_number(),
            payload,
        )
    }

    /// Create a broadcast message from this peer.
    pub fn create_broadcast(&self, message_type: MessageType, payload: Vec<u8>) -> Message {
        Message::broadcast(
            message_type,
            self.peer_id.clone(),
            self.next_sequence_number(),
            payload,
        )
    }
}

/// A peer found during a capability search.
///
/// Transport details are abstracted away: the application sees who the peer
/// is and what matched, not how it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredPeer {
    /// Peer's self-declared ID.
    pub peer_id: PeerId,
    /// The capability that matched the search.
    pub capability: CapabilityId,
    /// Signal quality in `[0.0, 1.0]`. Transport-defined: BLE RSSI, network
    /// latency, or a constant for transports without a quality signal.
    pub quality: f64,
    /// When the peer was discovered.
    pub discovered_at: DateTime<Utc>,
    /// Transport-supplied metadata.
    pub metadata: HashMap<String, String>,
}

impl DiscoveredPeer {
    /// Create a discovered-peer record, clamping quality into `[0.0, 1.0]`.
    pub fn new(peer_id: PeerId, capability: CapabilityId, quality: f64) -> Self {
        Self {
            peer_id,
            capability,
            quality: quality.clamp(0.0, 1.0),
            discovered_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A resolved peer reference with a bounded lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPeer {
    /// Peer's self-declared ID.
    pub peer_id: PeerId,
    /// Capability IDs this peer provides.
    pub provides: Vec<CapabilityId>,
    /// Capability IDs this peer accepts.
    pub accepts: Vec<CapabilityId>,
    /// Transport-supplied metadata.
    pub metadata: HashMap<String, String>,
    /// When the resolution was performed.
    pub resolved_at: DateTime<Utc>,
    /// How long the resolution stays valid. May be negative, in which case
    /// the resolution is already expired.
    pub ttl: TimeDelta,
}

impl ResolvedPeer {
    /// Default resolution lifetime: 5 minutes.
    pub const DEFAULT_TTL_SECS: i64 = 300;

    pub fn new(peer_id: PeerId, provides: Vec<CapabilityId>, accepts: Vec<CapabilityId>) -> Self {
        Self {
            peer_id,
            provides,
            accepts,
            metadata: HashMap::new(),
            resolved_at: Utc::now(),
            ttl: TimeDelta::seconds(Self::DEFAULT_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: TimeDelta) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether the resolution is still within its TTL.
    pub fn is_valid(&self) -> bool {
        Utc::now() < self.resolved_at + self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilitySet;

    fn capability() -> CapabilityId {
        "robot.mobility.move.1.0.0".parse().unwrap()
    }

    #[test]
    fn sequence_starts_at_one_and_increments() {
        let peer = LocalPeer::new("tester", CapabilitySet::new(), CapabilitySet::new());
        assert_eq!(peer.next_sequence_number(), 1);
        assert_eq!(peer.next_sequence_number(), 2);
        assert_eq!(peer.next_sequence_number(), 3);
    }

    #[test]
    fn sequence_numbers_stay_unique_under_concurrent_callers() {
        use std::collections::HashSet;

        let peer = LocalPeer::new("tester", CapabilitySet::new(), CapabilitySet::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let clone = peer.clone();
                std::thread::spawn(move || {
                    (0..250)
                        .map(|_| clone.next_sequence_number())
                        .collect::<Vec<u32>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            let numbers = handle.join().unwrap();
            // each thread sees its own draws strictly increase
            assert!(numbers.windows(2).all(|pair| pair[0] < pair[1]));
            for number in numbers {
                assert!(seen.insert(number), "sequence number {number} issued twice");
            }
        }
        assert_eq!(seen.len(), 8 * 250);
        assert_eq!(peer.next_sequence_number(), 8 * 250 + 1);
    }

    #[test]
    fn clones_share_the_sequence_counter() {
        let peer = LocalPeer::new("tester", CapabilitySet::new(), CapabilitySet::new());
        let clone = peer.clone();
        assert_eq!(peer.next_sequence_number(), 1);
        assert_eq!(clone.next_sequence_number(), 2);
    }

    #[test]
    fn created_messages_carry_identity_and_sequence() {
        let peer = LocalPeer::new("My Sender", CapabilitySet::new(), CapabilitySet::new());
        let first = peer.create_message(
            MessageType::Ping,
            MessageFlags::NONE,
            PeerId::new("target"),
            Vec::new(),
        );
        let second = peer.create_broadcast(MessageType::Announce, Vec::new());
        assert_eq!(first.header.sender, PeerId::new("my-sender"));
        assert_eq!(first.header.sequence_number, 1);
        assert_eq!(second.header.sequence_number, 2);
        assert!(second.header.recipient.is_broadcast());
    }

    #[test]
    fn quality_is_clamped() {
        let high = DiscoveredPeer::new(PeerId::new("a"), capability(), 1.7);
        let low = DiscoveredPeer::new(PeerId::new("a"), capability(), -0.3);
        assert_eq!(high.quality, 1.0);
        assert_eq!(low.quality, 0.0);
    }

    #[test]
    fn fresh_resolution_is_valid() {
        let peer = ResolvedPeer::new(PeerId::new("a"), vec![capability()], Vec::new());
        assert!(peer.is_valid());
    }

    #[test]
    fn negative_ttl_is_immediately_invalid() {
        let peer = ResolvedPeer::new(PeerId::new("a"), Vec::new(), Vec::new())
            .with_ttl(TimeDelta::seconds(-1));
        assert!(!peer.is_valid());
    }

    #[test]
    fn zero_ttl_is_invalid() {
        let peer = ResolvedPeer::new(PeerId::new("a"), Vec::new(), Vec::new())
            .with_ttl(TimeDelta::zero());
        assert!(!peer.is_valid());
    }
}
