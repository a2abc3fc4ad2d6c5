//! Transport abstraction — any communication method plugs in here.
//!
//! Transport details (endpoints, addresses, connection types) stay internal
//! to each implementation and are never exposed to the application layer.

use crate::capability::CapabilityId;
use crate::error::TransportError;
use crate::invocation::InvocationResult;
use crate::message::Message;
use crate::peer::{DiscoveredPeer, ResolvedPeer};
use crate::peer_id::PeerId;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, UnboundedReceiverStream};

/// Stream of discovery results. Ends when the transport's search window
/// closes; individual items may be transport errors.
pub type DiscoveryStream = ReceiverStream<Result<DiscoveredPeer, TransportError>>;

/// Stream of transport lifecycle and traffic events.
pub type EventStream = UnboundedReceiverStream<TransportEvent>;

/// Events emitted by a transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Transport started.
    Started,
    /// Transport stopped.
    Stopped,
    /// Peer discovered.
    PeerDiscovered(DiscoveredPeer),
    /// Peer no longer reachable.
    PeerLost(PeerId),
    /// Message received from a peer.
    MessageReceived { message: Message, from: PeerId },
    /// Message sent to a peer.
    MessageSent { message: Message, to: PeerId },
    /// Transport-level error.
    Error(TransportError),
}

/// A communication method for discovering and invoking peers.
///
/// Implementations cover local network (mDNS/DNS-SD), nearby radio (BLE),
/// direct TCP, HTTP well-known documents, or anything else that can carry
/// the wire protocol.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Unique identifier, e.g. `"crosswire.tcp"`.
    fn transport_id(&self) -> &str;

    /// Human-readable display name.
    fn display_name(&self) -> &str;

    /// Whether the transport is currently active.
    async fn is_active(&self) -> bool;

    /// Start the transport. Fails with [`TransportError::AlreadyStarted`]
    /// if already running.
    async fn start(&self) -> Result<(), TransportError>;

    /// Stop the transport. A no-op when not running, so repeated stops
    /// always succeed.
    async fn stop(&self) -> Result<(), TransportError>;

    /// Resolve a peer by ID. `Ok(None)` means the peer was conclusively not
    /// found; an error means the transport could not complete the attempt.
    async fn resolve(&self, peer_id: &PeerId) -> Result<Option<ResolvedPeer>, TransportError>;

    /// Discover peers that provide a capability. Results stream in as they
    /// arrive until the timeout window closes.
    fn discover_provides(&self, capability: &CapabilityId, timeout: Duration) -> DiscoveryStream;

    /// Discover peers that accept a capability.
    fn discover_accepts(&self, capability: &CapabilityId, timeout: Duration) -> DiscoveryStream;

    /// Discover all reachable peers regardless of capability.
    fn discover_all(&self, timeout: Duration) -> DiscoveryStream;

    /// Invoke a capability on a remote peer and wait for the response.
    ///
    /// A completed-but-failed invocation is `Ok` with an unsuccessful
    /// [`InvocationResult`]; `Err` means the request could not be carried
    /// out at all.
    async fn invoke(
        &self,
        capability: &CapabilityId,
        peer_id: &PeerId,
        arguments: Vec<u8>,
        timeout: Duration,
    ) -> Result<InvocationResult, TransportError>;

    /// Take the transport's event stream.
    ///
    /// Single-consumer: the first call returns the live stream, later calls
    /// return a stream that is already closed.
    async fn events(&self) -> EventStream;

    /// Response channel for inbound invocations, if this transport can
    /// route responses back to a requester. Defaults to none.
    fn response_sender(&self) -> Option<&dyn ResponseSender> {
        None
    }
}

/// Capability to send a response back to the peer that sent a request.
#[async_trait]
pub trait ResponseSender: Send + Sync {
    /// Send response data (a JSON-encoded invoke-response payload) to
    /// `recipient`, correlated with the original inbound message.
    async fn send_response(
        &self,
        data: Vec<u8>,
        recipient: &PeerId,
        in_response_to: &Message,
    ) -> Result<(), TransportError>;
}

/// One-producer event channel backing [`Transport::events`].
///
/// Holds the receiver until the first `events()` call takes it; sends after
/// the consumer drops are silently discarded.
#[derive(Debug)]
pub struct EventChannel {
    sender: mpsc::UnboundedSender<TransportEvent>,
    receiver: tokio::sync::Mutex<Option<mpsc::UnboundedReceiver<TransportEvent>>>,
}

impl EventChannel {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: tokio::sync::Mutex::new(Some(receiver)),
        }
    }

    /// Emit an event. No-op once the consumer is gone.
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.sender.send(event);
    }

    /// Take the stream. Second and later calls get an already-closed stream.
    pub async fn take_stream(&self) -> EventStream {
        let mut slot = self.receiver.lock().await;
        match slot.take() {
            Some(receiver) => UnboundedReceiverStream::new(receiver),
            None => {
                let (_, receiver) = mpsc::unbounded_channel();
                UnboundedReceiverStream::new(receiver)
            }
        }
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a bounded discovery channel pair. The sender side is handed to the
/// transport's search task; the stream side goes to the caller.
pub fn discovery_channel(
    capacity: usize,
) -> (
    mpsc::Sender<Result<DiscoveredPeer, TransportError>>,
    DiscoveryStream,
) {
    let (sender, receiver) = mpsc::channel(capacity);
    (sender, ReceiverStream::new(receiver))
}

/// Convenience for a discovery stream that is already finished, used when a
/// search cannot start at all.
pub fn failed_discovery(error: TransportError) -> DiscoveryStream {
    let (sender, stream) = discovery_channel(1);
    // capacity 1, send cannot fail before the stream is consumed
    let _ = sender.try_send(Err(error));
    stream
}
