//! Multi-transport coordination — one front door over any number of
//! registered transports.

use crate::capability::CapabilityId;
use crate::error::TransportError;
use crate::invocation::{ErrorCode, InvocationError, InvocationResult};
use crate::message::MessageType;
use crate::payload::{InvokePayload, InvokeResponsePayload};
use crate::peer::{DiscoveredPeer, LocalPeer, ResolvedPeer};
use crate::peer_id::PeerId;
use crate::transport::{DiscoveryStream, Transport, TransportEvent};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

/// Handler for invocation requests arriving from remote peers.
#[async_trait::async_trait]
pub trait InvocationHandler: Send + Sync {
    /// Handle one inbound invocation. Returning an error produces a failure
    /// response with [`ErrorCode::InvocationFailed`].
    async fn handle_invocation(
        &self,
        payload: InvokePayload,
        sender: PeerId,
    ) -> Result<InvokeResponsePayload, InvocationError>;
}

/// Merged stream of peers discovered across all transports. Per-transport
/// failures are logged and do not appear in the stream.
pub type PeerStream = ReceiverStream<DiscoveredPeer>;

/// Coordinates multiple transports behind one discovery and invocation API.
///
/// Discovery fans out to every registered transport concurrently and merges
/// the results; one transport failing never poisons the others. Invocation
/// resolves the peer first, then walks active transports until one carries
/// the request.
///
/// ```no_run
/// # use crosswire_core::{CapabilitySet, LocalPeer, TransportCoordinator};
/// # async fn demo(transport: std::sync::Arc<dyn crosswire_core::Transport>) {
/// let peer = LocalPeer::new("my-robot", CapabilitySet::new(), CapabilitySet::new());
/// let coordinator = TransportCoordinator::new(peer);
/// coordinator.register(transport);
/// coordinator.start_all().await.ok();
/// # }
/// ```
pub struct TransportCoordinator {
    local_peer: LocalPeer,
    transports: RwLock<HashMap<String, Arc<dyn Transport>>>,
    handler: Arc<RwLock<Option<Arc<dyn InvocationHandler>>>>,
    listeners: RwLock<HashMap<String, JoinHandle<()>>>,
}

impl TransportCoordinator {
    /// Default discovery window.
    pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

    /// Default invocation timeout.
    pub const DEFAULT_INVOCATION_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(local_peer: LocalPeer) -> Self {
        Self {
            local_peer,
            transports: RwLock::new(HashMap::new()),
            handler: Arc::new(RwLock::new(None)),
            listeners: RwLock::new(HashMap::new()),
        }
    }

    pub fn local_peer(&self) -> &LocalPeer {
        &self.local_peer
    }

    // ---- invocation handler ----

    /// Install the handler for inbound invocations, replacing any previous
    /// one.
    pub fn set_invocation_handler(&self, handler: Arc<dyn InvocationHandler>) {
        *self
            .handler
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(handler);
    }

    /// Remove the inbound invocation handler. Later invoke requests are
    /// dropped silently.
    pub fn clear_invocation_handler(&self) {
        *self
            .handler
            .write()
            .unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn has_invocation_handler(&self) -> bool {
        self.handler
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    // ---- transport registry ----

    /// Register a transport, keyed by its transport ID. Registering the same
    /// ID again replaces the previous transport.
    pub fn register(&self, transport: Arc<dyn Transport>) {
        let id = transport.transport_id().to_string();
        debug!(transport = %id, "registering transport");
        self.transports
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, transport);
    }

    /// Unregister a transport and stop listening to its events. The
    /// transport itself is not stopped.
    pub fn unregister(&self, transport_id: &str) {
        self.transports
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(transport_id);
        if let Some(task) = self
            .listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(transport_id)
        {
            task.abort();
        }
    }

    /// Look up a registered transport by ID.
    pub fn transport(&self, transport_id: &str) -> Option<Arc<dyn Transport>> {
        self.transports
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(transport_id)
            .cloned()
    }

    /// Snapshot of all registered transports.
    pub fn all_transports(&self) -> Vec<Arc<dyn Transport>> {
        self.transports
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    // ---- lifecycle ----

    /// Start every registered transport and begin dispatching its events.
    ///
    /// Fails fast: the first start error is returned and later transports
    /// are left unstarted.
    pub async fn start_all(&self) -> Result<(), TransportError> {
        for transport in self.all_transports() {
            transport.start().await?;
            self.spawn_event_listener(transport).await;
        }
        Ok(())
    }

    /// Stop every registered transport.
    ///
    /// Best-effort: every transport gets a stop attempt; the first error
    /// encountered is returned after all attempts finish.
    pub async fn stop_all(&self) -> Result<(), TransportError> {
        let listeners = std::mem::take(
            &mut *self.listeners.write().unwrap_or_else(|e| e.into_inner()),
        );
        for task in listeners.into_values() {
            task.abort();
        }

        let mut first_error = None;
        for transport in self.all_transports() {
            if let Err(e) = transport.stop().await {
                warn!(transport = transport.transport_id(), error = %e, "stop failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn spawn_event_listener(&self, transport: Arc<dyn Transport>) {
        let transport_id = transport.transport_id().to_string();
        let handler = Arc::clone(&self.handler);
        let mut events = transport.events().await;
        let task = tokio::spawn({
            let transport_id = transport_id.clone();
            async move {
                while let Some(event) = events.next().await {
                    match event {
                        TransportEvent::MessageReceived { message, from } => {
                            dispatch_inbound(&transport, &handler, message, from).await;
                        }
                        TransportEvent::Error(error) => {
                            warn!(transport = %transport_id, %error, "transport error");
                        }
                        _ => {}
                    }
                }
            }
        });
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(transport_id, task);
    }

    // ---- resolution ----

    /// Resolve a peer, asking transports in turn and short-circuiting on the
    /// first hit. `Ok(None)` means no transport knows the peer.
    pub async fn resolve(&self, peer_id: &PeerId) -> Result<Option<ResolvedPeer>, TransportError> {
        for transport in self.all_transports() {
            if let Some(resolved) = transport.resolve(peer_id).await? {
                return Ok(Some(resolved));
            }
        }
        Ok(None)
    }

    // ---- discovery ----

    /// Discover peers providing a capability across all transports at once.
    pub fn discover_provides(&self, capability: &CapabilityId, timeout: Duration) -> PeerStream {
        let capability = capability.clone();
        self.fan_out(move |t| t.discover_provides(&capability, timeout))
    }

    /// Discover peers accepting a capability across all transports at once.
    pub fn discover_accepts(&self, capability: &CapabilityId, timeout: Duration) -> PeerStream {
        let capability = capability.clone();
        self.fan_out(move |t| t.discover_accepts(&capability, timeout))
    }

    /// Discover all reachable peers across all transports at once.
    pub fn discover_all(&self, timeout: Duration) -> PeerStream {
        self.fan_out(move |t| t.discover_all(timeout))
    }

    /// Fan a discovery call out to every transport and merge the streams.
    /// The merged stream ends once every per-transport stream has ended.
    fn fan_out<F>(&self, start: F) -> PeerStream
    where
        F: Fn(&Arc<dyn Transport>) -> DiscoveryStream,
    {
        let (tx, rx) = mpsc::channel(32);
        for transport in self.all_transports() {
            let transport_id = transport.transport_id().to_string();
            let mut stream = start(&transport);
            let tx = tx.clone();
            tokio::spawn(async move {
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(peer) => {
                            if tx.send(peer).await.is_err() {
                                break;
                            }
                        }
                        Err(error) => {
                            warn!(transport = %transport_id, %error, "discovery failed");
                        }
                    }
                }
            });
        }
        ReceiverStream::new(rx)
    }

    // ---- invocation ----

    /// Invoke a capability on a peer via the best available transport.
    ///
    /// The peer is resolved first and must list the capability among its
    /// provided IDs. Active transports are then tried in turn; a transport
    /// error falls through to the next one, and only when every active
    /// transport has failed (or none exists) does the call fail.
    pub async fn invoke(
        &self,
        capability: &CapabilityId,
        peer_id: &PeerId,
        arguments: Vec<u8>,
        timeout: Duration,
    ) -> Result<InvocationResult, TransportError> {
        let resolved = self
            .resolve(peer_id)
            .await?
            .ok_or_else(|| TransportError::ResolutionFailed(peer_id.clone()))?;

        if !resolved.provides.contains(capability) {
            return Err(TransportError::Invocation(InvocationError::new(
                ErrorCode::CapabilityNotFound,
                format!("peer does not provide capability: {capability}"),
            )));
        }

        for transport in self.all_transports() {
            if !transport.is_active().await {
                continue;
            }
            match transport
                .invoke(capability, peer_id, arguments.clone(), timeout)
                .await
            {
                Ok(result) => return Ok(result),
                Err(error) => {
                    warn!(
                        transport = transport.transport_id(),
                        %error,
                        "invoke failed, trying next transport"
                    );
                }
            }
        }

        Err(TransportError::Invocation(InvocationError::new(
            ErrorCode::ResourceUnavailable,
            "no transport available",
        )))
    }
}

/// Handle one inbound message from a transport: decode invoke requests, run
/// the handler, and push the response back over the same transport.
async fn dispatch_inbound(
    transport: &Arc<dyn Transport>,
    handler: &Arc<RwLock<Option<Arc<dyn InvocationHandler>>>>,
    message: crate::message::Message,
    sender: PeerId,
) {
    if message.header.message_type != MessageType::Invoke {
        return;
    }

    let payload: InvokePayload = match serde_json::from_slice(&message.payload) {
        Ok(payload) => payload,
        Err(error) => {
            debug!(%sender, %error, "dropping undecodable invoke payload");
            return;
        }
    };

    let handler = handler
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone();
    let Some(handler) = handler else {
        debug!(%sender, "no invocation handler installed, dropping invoke");
        return;
    };

    let invocation_id = payload.invocation_id.clone();
    let response = match handler.handle_invocation(payload, sender.clone()).await {
        Ok(response) => response,
        Err(error) => InvokeResponsePayload::failure(
            invocation_id,
            ErrorCode::InvocationFailed.as_u32(),
            error.message,
        ),
    };

    let Some(sender_channel) = transport.response_sender() else {
        debug!(
            transport = transport.transport_id(),
            "transport cannot send responses, dropping reply"
        );
        return;
    };
    let data = match serde_json::to_vec(&response) {
        Ok(data) => data,
        Err(error) => {
            warn!(%error, "failed to encode invoke response");
            return;
        }
    };
    if let Err(error) = sender_channel.send_response(data, &sender, &message).await {
        warn!(%sender, %error, "failed to send invoke response");
    }
}
