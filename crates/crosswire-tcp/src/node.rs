//! TcpTransport — TCP listener, dialer, and peer cache.
//!
//! Wire dialogue: a dialing peer opens a connection and sends an ANNOUNCE
//! frame carrying its provided capability IDs plus two reserved metadata
//! keys — `port` (its own listen port, for dial-back) and `accepts` (a
//! space-separated list of accepted capability IDs). The listening peer
//! caches the dialer and answers with its own ANNOUNCE. After that exchange
//! either side can send INVOKE or PING frames on any connection.
//!
//! Discovery dials the configured seed addresses plus every cached peer
//! address, refreshes the cache from the announce exchange, then emits the
//! cache entries that match. Invocation opens a fresh connection per
//! request and waits for the correlated INVOKE_RESPONSE.

use crosswire_core::framing::{read_frame, write_frame};
use crosswire_core::transport::{discovery_channel, failed_discovery};
use crosswire_core::{
    AnnouncePayload, CapabilityId, DiscoveredPeer, DiscoveryStream, ErrorCode, EventChannel,
    EventStream, InvocationError, InvocationResult, InvokePayload, InvokeResponsePayload,
    LocalPeer, Message, MessageFlags, MessageType, PeerId, ResolvedPeer, ResponseSender,
    Transport, TransportError, TransportEvent,
};

use async_trait::async_trait;
use dashmap::DashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::RwLock as StdRwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Reserved announce metadata key carrying the peer's listen port.
const PORT_KEY: &str = "port";

/// Reserved announce metadata key carrying the accepted capability IDs.
const ACCEPTS_KEY: &str = "accepts";

/// Configuration for a [`TcpTransport`].
#[derive(Debug, Clone)]
pub struct TcpTransportConfig {
    /// Address to bind the listener on.
    pub listen_addr: SocketAddr,
    /// Addresses dialed during discovery and resolution.
    pub seed_addrs: Vec<SocketAddr>,
    /// Per-connection dial and announce-exchange timeout.
    pub dial_timeout: Duration,
}

impl Default for TcpTransportConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:0".parse().expect("valid literal addr"),
            seed_addrs: Vec::new(),
            dial_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedPeer {
    resolved: ResolvedPeer,
    /// Dial-back address, present when the peer announced a listen port.
    addr: Option<SocketAddr>,
}

/// State shared between the transport handle and its connection tasks.
struct Shared {
    local_peer: LocalPeer,
    config: TcpTransportConfig,
    seeds: StdRwLock<Vec<SocketAddr>>,
    listen_port: StdRwLock<Option<u16>>,
    peers: DashMap<PeerId, CachedPeer>,
    /// Outboxes for inbound invokes awaiting a response, keyed by
    /// (requester name, request sequence number).
    pending: DashMap<(String, u32), mpsc::Sender<Message>>,
    events: EventChannel,
}

struct Running {
    local_addr: SocketAddr,
    accept_task: JoinHandle<()>,
}

/// Direct TCP transport.
pub struct TcpTransport {
    shared: Arc<Shared>,
    state: RwLock<Option<Running>>,
}

impl TcpTransport {
    pub const TRANSPORT_ID: &'static str = "crosswire.tcp";

    pub fn new(local_peer: LocalPeer, config: TcpTransportConfig) -> Self {
        let seeds = config.seed_addrs.clone();
        Self {
            shared: Arc::new(Shared {
                local_peer,
                config,
                seeds: StdRwLock::new(seeds),
                listen_port: StdRwLock::new(None),
                peers: DashMap::new(),
                pending: DashMap::new(),
                events: EventChannel::new(),
            }),
            state: RwLock::new(None),
        }
    }

    /// Actual bound address, available once started. Useful when binding to
    /// port 0.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.state.read().await.as_ref().map(|r| r.local_addr)
    }

    /// Add a seed address for later discovery and resolution dials.
    pub fn add_seed(&self, addr: SocketAddr) {
        self.shared
            .seeds
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(addr);
    }

    fn discover_with<F>(&self, window: Duration, matched: F) -> DiscoveryStream
    where
        F: Fn(&ResolvedPeer) -> Vec<CapabilityId> + Send + 'static,
    {
        if self
            .shared
            .listen_port
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
        {
            return failed_discovery(TransportError::NotStarted);
        }

        let shared = Arc::clone(&self.shared);
        let (tx, stream) = discovery_channel(32);
        tokio::spawn(async move {
            // scan bounded by the discovery window
            let _ = tokio::time::timeout(window, refresh_from_seeds(&shared)).await;

            let snapshot: Vec<CachedPeer> =
                shared.peers.iter().map(|e| e.value().clone()).collect();
            for cached in snapshot {
                if !cached.resolved.is_valid() {
                    continue;
                }
                for capability in matched(&cached.resolved) {
                    let peer =
                        DiscoveredPeer::new(cached.resolved.peer_id.clone(), capability, 1.0)
                            .with_metadata(cached.resolved.metadata.clone());
                    if tx.send(Ok(peer)).await.is_err() {
                        return;
                    }
                }
            }
        });
        stream
    }
}

#[async_trait]
impl Transport for TcpTransport {
    fn transport_id(&self) -> &str {
        Self::TRANSPORT_ID
    }

    fn display_name(&self) -> &str {
        "Direct TCP"
    }

    async fn is_active(&self) -> bool {
        self.state.read().await.is_some()
    }

    async fn start(&self) -> Result<(), TransportError> {
        let mut state = self.state.write().await;
        if state.is_some() {
            return Err(TransportError::AlreadyStarted);
        }

        let listener = TcpListener::bind(self.shared.config.listen_addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        *self
            .shared
            .listen_port
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(local_addr.port());

        info!(
            peer = %self.shared.local_peer.peer_id(),
            %local_addr,
            "tcp transport listening"
        );

        let shared = Arc::clone(&self.shared);
        let accept_task = tokio::spawn(accept_loop(listener, shared));

        *state = Some(Running {
            local_addr,
            accept_task,
        });
        self.shared.events.emit(TransportEvent::Started);
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        let mut state = self.state.write().await;
        let Some(running) = state.take() else {
            return Ok(());
        };
        running.accept_task.abort();
        *self
            .shared
            .listen_port
            .write()
            .unwrap_or_else(|e| e.into_inner()) = None;
        self.shared.peers.clear();
        self.shared.pending.clear();
        self.shared.events.emit(TransportEvent::Stopped);
        info!(peer = %self.shared.local_peer.peer_id(), "tcp transport stopped");
        Ok(())
    }

    async fn resolve(&self, peer_id: &PeerId) -> Result<Option<ResolvedPeer>, TransportError> {
        if let Some(cached) = self.shared.peers.get(peer_id) {
            if cached.resolved.is_valid() {
                return Ok(Some(cached.resolved.clone()));
            }
        }

        if self
            .shared
            .listen_port
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
        {
            return Ok(None);
        }

        refresh_from_seeds(&self.shared).await;
        Ok(self
            .shared
            .peers
            .get(peer_id)
            .filter(|cached| cached.resolved.is_valid())
            .map(|cached| cached.resolved.clone()))
    }

    fn discover_provides(&self, capability: &CapabilityId, timeout: Duration) -> DiscoveryStream {
        let capability = capability.clone();
        self.discover_with(timeout, move |peer| {
            if peer.provides.contains(&capability) {
                vec![capability.clone()]
            } else {
                Vec::new()
            }
        })
    }

    fn discover_accepts(&self, capability: &CapabilityId, timeout: Duration) -> DiscoveryStream {
        let capability = capability.clone();
        self.discover_with(timeout, move |peer| {
            if peer.accepts.contains(&capability) {
                vec![capability.clone()]
            } else {
                Vec::new()
            }
        })
    }

    fn discover_all(&self, timeout: Duration) -> DiscoveryStream {
        self.discover_with(timeout, |peer| peer.provides.clone())
    }

    async fn invoke(
        &self,
        capability: &CapabilityId,
        peer_id: &PeerId,
        arguments: Vec<u8>,
        timeout: Duration,
    ) -> Result<InvocationResult, TransportError> {
        let started = Instant::now();
        let addr = self
            .shared
            .peers
            .get(peer_id)
            .and_then(|cached| cached.addr)
            .ok_or_else(|| TransportError::ResolutionFailed(peer_id.clone()))?;

        let stream = tokio::time::timeout(self.shared.config.dial_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        let (mut reader, mut writer) = stream.into_split();

        let payload = InvokePayload::new(capability.clone(), arguments);
        let invocation_id = payload.invocation_id.clone();
        let body = serde_json::to_vec(&payload).map_err(|_| TransportError::InvalidData)?;
        let message = self.shared.local_peer.create_message(
            MessageType::Invoke,
            MessageFlags::NONE,
            peer_id.clone(),
            body,
        );
        write_frame(&mut writer, &message).await?;

        let response = tokio::time::timeout(timeout, async {
            loop {
                match read_frame(&mut reader).await? {
                    Some(frame) if frame.header.message_type == MessageType::InvokeResponse => {
                        return Ok::<Message, TransportError>(frame);
                    }
                    Some(_) => continue,
                    None => return Err(TransportError::ConnectionClosed),
                }
            }
        })
        .await
        .map_err(|_| TransportError::Timeout)??;

        let round_trip = started.elapsed();
        let payload: InvokeResponsePayload =
            serde_json::from_slice(&response.payload).map_err(|_| TransportError::InvalidData)?;
        if payload.invocation_id != invocation_id {
            return Err(TransportError::InvalidData);
        }

        if payload.success {
            Ok(InvocationResult::success(
                payload.result.unwrap_or_default(),
                round_trip,
                peer_id.clone(),
            ))
        } else {
            let code = payload
                .error_code
                .and_then(ErrorCode::from_u32)
                .unwrap_or(ErrorCode::Unknown);
            let message = payload
                .error_message
                .unwrap_or_else(|| "unknown error".to_string());
            Ok(InvocationResult::failure(
                InvocationError::new(code, message),
                round_trip,
                peer_id.clone(),
            ))
        }
    }

    async fn events(&self) -> EventStream {
        self.shared.events.take_stream().await
    }

    fn response_sender(&self) -> Option<&dyn ResponseSender> {
        Some(self)
    }
}

#[async_trait]
impl ResponseSender for TcpTransport {
    async fn send_response(
        &self,
        data: Vec<u8>,
        recipient: &PeerId,
        in_response_to: &Message,
    ) -> Result<(), TransportError> {
        let key = (
            recipient.name().to_string(),
            in_response_to.header.sequence_number,
        );
        let outbox = self
            .shared
            .pending
            .remove(&key)
            .map(|(_, outbox)| outbox)
            .ok_or(TransportError::ConnectionClosed)?;

        let message = self.shared.local_peer.create_message(
            MessageType::InvokeResponse,
            MessageFlags::RESPONSE,
            recipient.clone(),
            data,
        );
        outbox
            .send(message)
            .await
            .map_err(|_| TransportError::ConnectionClosed)
    }
}

// ---- connection handling ----

async fn accept_loop(listener: TcpListener, shared: Arc<Shared>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!(%addr, "accepted connection");
                let shared = Arc::clone(&shared);
                tokio::spawn(async move {
                    serve_connection(stream, addr, shared).await;
                });
            }
            Err(e) => {
                warn!(error = %e, "accept failed");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

/// Serve one inbound connection: answer announces and pings, surface invoke
/// frames as events, and keep an outbox so responses can flow back.
async fn serve_connection(stream: TcpStream, addr: SocketAddr, shared: Arc<Shared>) {
    let (mut reader, writer) = stream.into_split();
    let (outbox, outbox_rx) = mpsc::channel::<Message>(32);
    let writer_task = tokio::spawn(write_loop(writer, outbox_rx));
    let mut pending_keys: Vec<(String, u32)> = Vec::new();

    loop {
        let message = match read_frame(&mut reader).await {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(error) => {
                debug!(%addr, %error, "connection ended");
                shared.events.emit(TransportEvent::Error(error));
                break;
            }
        };
        if let Err(error) = message.validate() {
            debug!(%addr, %error, "dropping invalid frame");
            continue;
        }

        let sender = message.header.sender.clone();

        // the outbox must be registered before the event goes out, or a fast
        // handler could respond before send_response can find the connection
        if message.header.message_type == MessageType::Invoke {
            let key = (sender.name().to_string(), message.header.sequence_number);
            shared.pending.insert(key.clone(), outbox.clone());
            pending_keys.push(key);
        }

        shared.events.emit(TransportEvent::MessageReceived {
            message: message.clone(),
            from: sender.clone(),
        });

        match message.header.message_type {
            MessageType::Announce => {
                handle_announce(&shared, &message, addr.ip(), &outbox).await;
            }
            MessageType::Ping => {
                let pong = shared.local_peer.create_message(
                    MessageType::Pong,
                    MessageFlags::RESPONSE,
                    sender,
                    Vec::new(),
                );
                let _ = outbox.send(pong).await;
            }
            _ => {}
        }
    }

    // release this connection's unanswered response slots; entries that a
    // retransmit moved to another connection stay untouched
    for key in pending_keys {
        shared
            .pending
            .remove_if(&key, |_, slot| slot.same_channel(&outbox));
    }

    drop(outbox);
    let _ = writer_task.await;
}

async fn write_loop(mut writer: OwnedWriteHalf, mut outbox_rx: mpsc::Receiver<Message>) {
    while let Some(message) = outbox_rx.recv().await {
        if let Err(error) = write_frame(&mut writer, &message).await {
            debug!(%error, "write failed, closing outbox");
            break;
        }
    }
}

async fn handle_announce(
    shared: &Arc<Shared>,
    message: &Message,
    remote_ip: IpAddr,
    outbox: &mpsc::Sender<Message>,
) {
    let Ok(payload) = serde_json::from_slice::<AnnouncePayload>(&message.payload) else {
        debug!("dropping undecodable announce");
        return;
    };
    cache_announce(shared, payload, remote_ip);

    // answer with our own announce so the dialer learns us symmetrically
    if let Some(reply) = build_announce(shared, Some(message.header.sender.clone())) {
        let _ = outbox.send(reply).await;
    }
}

/// Record an announced peer in the cache. Returns quietly for our own
/// announces bounced back by another node.
fn cache_announce(shared: &Arc<Shared>, payload: AnnouncePayload, remote_ip: IpAddr) {
    if &payload.peer_id == shared.local_peer.peer_id() {
        return;
    }

    let mut metadata = payload.metadata;
    let addr = metadata
        .remove(PORT_KEY)
        .and_then(|port| port.parse::<u16>().ok())
        .map(|port| SocketAddr::new(remote_ip, port));
    let accepts = metadata
        .remove(ACCEPTS_KEY)
        .map(|list| parse_id_list(&list))
        .unwrap_or_default();

    let mut resolved = ResolvedPeer::new(payload.peer_id.clone(), payload.capabilities, accepts)
        .with_metadata(metadata);
    if let Some(name) = payload.display_name {
        resolved.metadata.insert("name".to_string(), name);
    }

    let newly_known = !shared.peers.contains_key(&payload.peer_id);
    let provides = resolved.provides.clone();
    let peer_metadata = resolved.metadata.clone();
    shared
        .peers
        .insert(payload.peer_id.clone(), CachedPeer { resolved, addr });

    if newly_known {
        debug!(peer = %payload.peer_id, "cached announced peer");
        for capability in provides {
            let discovered =
                DiscoveredPeer::new(payload.peer_id.clone(), capability, 1.0)
                    .with_metadata(peer_metadata.clone());
            shared
                .events
                .emit(TransportEvent::PeerDiscovered(discovered));
        }
    }
}

/// Build our announce frame: provided capability IDs in the body, listen
/// port and accepted IDs in reserved metadata keys.
fn build_announce(shared: &Arc<Shared>, recipient: Option<PeerId>) -> Option<Message> {
    let local = &shared.local_peer;
    let mut payload = AnnouncePayload::new(local.peer_id().clone(), local.provides().ids());
    payload.display_name = local.display_name().map(str::to_string);
    payload.metadata = local.metadata().clone();

    let port = (*shared
        .listen_port
        .read()
        .unwrap_or_else(|e| e.into_inner()))?;
    payload.metadata.insert(PORT_KEY.to_string(), port.to_string());

    let accepts = local
        .accepts()
        .ids()
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    if !accepts.is_empty() {
        payload.metadata.insert(ACCEPTS_KEY.to_string(), accepts);
    }

    let body = serde_json::to_vec(&payload).ok()?;
    Some(match recipient {
        Some(recipient) => local.create_message(
            MessageType::Announce,
            MessageFlags::NONE,
            recipient,
            body,
        ),
        None => local.create_broadcast(MessageType::Announce, body),
    })
}

fn parse_id_list(list: &str) -> Vec<CapabilityId> {
    list.split_whitespace()
        .filter_map(|id| id.parse().ok())
        .collect()
}

/// Dial every seed plus every cached peer address and run the announce
/// exchange, refreshing the cache. Failures are logged and skipped.
async fn refresh_from_seeds(shared: &Arc<Shared>) {
    let mut targets: Vec<SocketAddr> = shared
        .seeds
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone();
    for entry in shared.peers.iter() {
        if let Some(addr) = entry.value().addr {
            targets.push(addr);
        }
    }
    targets.sort();
    targets.dedup();

    for addr in targets {
        if let Err(error) = exchange_announce(shared, addr).await {
            debug!(%addr, %error, "announce exchange failed");
        }
    }
}

/// Client side of the announce dialogue: dial, announce ourselves, read the
/// peer's announce back, and cache it.
async fn exchange_announce(shared: &Arc<Shared>, addr: SocketAddr) -> Result<(), TransportError> {
    let dial_timeout = shared.config.dial_timeout;
    let stream = tokio::time::timeout(dial_timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| TransportError::Timeout)?
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
    let (mut reader, mut writer) = stream.into_split();

    let announce = build_announce(shared, None).ok_or(TransportError::NotStarted)?;
    write_frame(&mut writer, &announce).await?;

    let reply = tokio::time::timeout(dial_timeout, read_until_announce(&mut reader))
        .await
        .map_err(|_| TransportError::Timeout)??;
    let payload: AnnouncePayload =
        serde_json::from_slice(&reply.payload).map_err(|_| TransportError::InvalidData)?;
    cache_announce(shared, payload, addr.ip());
    Ok(())
}

async fn read_until_announce(reader: &mut OwnedReadHalf) -> Result<Message, TransportError> {
    loop {
        match read_frame(reader).await? {
            Some(frame) if frame.header.message_type == MessageType::Announce => {
                return Ok(frame);
            }
            Some(_) => continue,
            None => return Err(TransportError::ConnectionClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosswire_core::{Capability, CapabilitySet};

    fn capability(id: &str) -> CapabilityId {
        id.parse().unwrap()
    }

    fn peer_with(name: &str, provides: &[&str], accepts: &[&str]) -> LocalPeer {
        let mut provided = CapabilitySet::new();
        for id in provides {
            provided.add(Capability::new(capability(id), "test capability"));
        }
        let mut accepted = CapabilitySet::new();
        for id in accepts {
            accepted.add(Capability::new(capability(id), "test capability"));
        }
        LocalPeer::new(name, provided, accepted)
    }

    #[tokio::test]
    async fn lifecycle_guards() {
        let transport = TcpTransport::new(
            peer_with("solo", &[], &[]),
            TcpTransportConfig::default(),
        );
        assert!(!transport.is_active().await);
        // stopping an idle transport is a quiet no-op
        assert_eq!(transport.stop().await, Ok(()));

        transport.start().await.unwrap();
        assert!(transport.is_active().await);
        assert!(transport.local_addr().await.is_some());
        assert_eq!(transport.start().await, Err(TransportError::AlreadyStarted));

        transport.stop().await.unwrap();
        assert!(!transport.is_active().await);
        assert_eq!(transport.stop().await, Ok(()));
    }

    #[tokio::test]
    async fn discovery_before_start_fails_cleanly() {
        use tokio_stream::StreamExt;

        let transport = TcpTransport::new(
            peer_with("solo", &[], &[]),
            TcpTransportConfig::default(),
        );
        let mut stream =
            transport.discover_all(Duration::from_millis(100));
        assert!(matches!(
            stream.next().await,
            Some(Err(TransportError::NotStarted))
        ));
    }

    #[tokio::test]
    async fn announce_exchange_populates_both_caches() {
        let a = TcpTransport::new(
            peer_with("alpha", &["home.lights.toggle.1.0.0"], &[]),
            TcpTransportConfig::default(),
        );
        a.start().await.unwrap();
        let a_addr = a.local_addr().await.unwrap();

        let b = TcpTransport::new(
            peer_with("beta", &[], &["home.lights.toggle.1.0.0"]),
            TcpTransportConfig {
                seed_addrs: vec![a_addr],
                ..TcpTransportConfig::default()
            },
        );
        b.start().await.unwrap();

        // b resolves alpha by dialing the seed
        let resolved = b.resolve(&PeerId::new("alpha")).await.unwrap().unwrap();
        assert_eq!(
            resolved.provides,
            vec![capability("home.lights.toggle.1.0.0")]
        );

        // the exchange also taught alpha about beta, including a dial-back
        // address from the announced port
        tokio::time::sleep(Duration::from_millis(100)).await;
        let back = a.resolve(&PeerId::new("beta")).await.unwrap().unwrap();
        assert_eq!(back.accepts, vec![capability("home.lights.toggle.1.0.0")]);
    }

    #[tokio::test]
    async fn resolve_unknown_peer_is_none() {
        let transport = TcpTransport::new(
            peer_with("solo", &[], &[]),
            TcpTransportConfig::default(),
        );
        transport.start().await.unwrap();
        assert_eq!(transport.resolve(&PeerId::new("ghost")).await, Ok(None));
    }

    #[tokio::test]
    async fn unanswered_invokes_are_purged_when_the_connection_closes() {
        let server = TcpTransport::new(
            peer_with("server", &["home.lights.toggle.1.0.0"], &[]),
            TcpTransportConfig::default(),
        );
        server.start().await.unwrap();
        let addr = server.local_addr().await.unwrap();

        // raw dial: send an invoke and never read the response; with no
        // handler wired up the response slot would otherwise live forever
        let caller = peer_with("caller", &[], &[]);
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let payload = InvokePayload::new(capability("home.lights.toggle.1.0.0"), Vec::new());
        let invoke = caller.create_message(
            MessageType::Invoke,
            MessageFlags::NONE,
            PeerId::new("server"),
            serde_json::to_vec(&payload).unwrap(),
        );
        write_frame(&mut writer, &invoke).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(server.shared.pending.len(), 1);

        drop(reader);
        drop(writer);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(server.shared.pending.is_empty());
    }

    #[tokio::test]
    async fn invoke_unknown_peer_is_resolution_failure() {
        let transport = TcpTransport::new(
            peer_with("solo", &[], &[]),
            TcpTransportConfig::default(),
        );
        transport.start().await.unwrap();
        let err = transport
            .invoke(
                &capability("home.lights.toggle.1.0.0"),
                &PeerId::new("ghost"),
                Vec::new(),
                Duration::from_millis(200),
            )
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::ResolutionFailed(PeerId::new("ghost")));
    }
}
