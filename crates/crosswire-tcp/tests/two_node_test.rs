//! End-to-end tests over real TCP sockets.
//!
//! Two peers run on loopback, each behind its own TransportCoordinator:
//! one provides a capability and answers invocations through its handler,
//! the other discovers it via a seed address and invokes it.

use async_trait::async_trait;
use crosswire_core::{
    Capability, CapabilityId, CapabilitySet, ErrorCode, InvocationError, InvocationHandler,
    InvokePayload, InvokeResponsePayload, LocalPeer, PeerId, TransportCoordinator,
};
use crosswire_tcp::{TcpTransport, TcpTransportConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;

fn toggle_capability() -> CapabilityId {
    "home.lights.toggle.1.0.0".parse().unwrap()
}

fn provider_peer() -> LocalPeer {
    let mut provides = CapabilitySet::new();
    provides.add(Capability::new(toggle_capability(), "Toggle the lights"));
    LocalPeer::new("light-hub", provides, CapabilitySet::new())
}

fn consumer_peer() -> LocalPeer {
    LocalPeer::new("wall-switch", CapabilitySet::new(), CapabilitySet::new())
}

/// Echoes the arguments back, uppercased, so the test can tell the handler
/// actually ran.
struct ToggleHandler;

#[async_trait]
impl InvocationHandler for ToggleHandler {
    async fn handle_invocation(
        &self,
        payload: InvokePayload,
        _sender: PeerId,
    ) -> Result<InvokeResponsePayload, InvocationError> {
        let echoed = payload.arguments.to_ascii_uppercase();
        Ok(InvokeResponsePayload::success(payload.invocation_id, echoed))
    }
}

struct DenyingHandler;

#[async_trait]
impl InvocationHandler for DenyingHandler {
    async fn handle_invocation(
        &self,
        _payload: InvokePayload,
        _sender: PeerId,
    ) -> Result<InvokeResponsePayload, InvocationError> {
        Err(InvocationError::new(ErrorCode::InvocationDenied, "locked"))
    }
}

/// Bring up a provider node and return its coordinator plus listen address.
async fn start_provider(
    handler: Arc<dyn InvocationHandler>,
) -> (Arc<TransportCoordinator>, std::net::SocketAddr) {
    let peer = provider_peer();
    let transport = Arc::new(TcpTransport::new(
        peer.clone(),
        TcpTransportConfig::default(),
    ));
    let coordinator = Arc::new(TransportCoordinator::new(peer));
    coordinator.register(transport.clone());
    coordinator.set_invocation_handler(handler);
    coordinator.start_all().await.unwrap();
    let addr = transport.local_addr().await.unwrap();
    (coordinator, addr)
}

/// Bring up a consumer node seeded with the provider's address.
async fn start_consumer(seed: std::net::SocketAddr) -> Arc<TransportCoordinator> {
    let peer = consumer_peer();
    let transport = Arc::new(TcpTransport::new(
        peer.clone(),
        TcpTransportConfig {
            seed_addrs: vec![seed],
            ..TcpTransportConfig::default()
        },
    ));
    let coordinator = Arc::new(TransportCoordinator::new(peer));
    coordinator.register(transport);
    coordinator.start_all().await.unwrap();
    coordinator
}

#[tokio::test]
async fn discover_provider_over_tcp() {
    let (_provider, addr) = start_provider(Arc::new(ToggleHandler)).await;
    let consumer = start_consumer(addr).await;

    let mut stream =
        consumer.discover_provides(&toggle_capability(), Duration::from_secs(2));
    let found = stream.next().await.expect("provider should be discovered");
    assert_eq!(found.peer_id, PeerId::new("light-hub"));
    assert_eq!(found.capability, toggle_capability());
}

#[tokio::test]
async fn invoke_round_trip_over_tcp() {
    let (_provider, addr) = start_provider(Arc::new(ToggleHandler)).await;
    let consumer = start_consumer(addr).await;

    // populate the consumer's peer cache
    let resolved = consumer
        .resolve(&PeerId::new("light-hub"))
        .await
        .unwrap()
        .expect("provider should resolve");
    assert!(resolved.provides.contains(&toggle_capability()));

    let result = consumer
        .invoke(
            &toggle_capability(),
            &PeerId::new("light-hub"),
            b"on".to_vec(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.data, Some(b"ON".to_vec()));
    assert_eq!(result.source_peer, PeerId::new("light-hub"));
    assert!(result.round_trip_time > Duration::ZERO);
}

#[tokio::test]
async fn handler_rejection_travels_back_as_failure() {
    let (_provider, addr) = start_provider(Arc::new(DenyingHandler)).await;
    let consumer = start_consumer(addr).await;

    consumer
        .resolve(&PeerId::new("light-hub"))
        .await
        .unwrap()
        .expect("provider should resolve");

    let result = consumer
        .invoke(
            &toggle_capability(),
            &PeerId::new("light-hub"),
            b"on".to_vec(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    assert!(!result.success);
    let error = result.error.expect("failure carries an error");
    assert_eq!(error.code, ErrorCode::InvocationFailed);
    assert_eq!(error.message, "locked");
}

#[tokio::test]
async fn invoking_capability_the_peer_lacks_fails_at_the_coordinator() {
    let (_provider, addr) = start_provider(Arc::new(ToggleHandler)).await;
    let consumer = start_consumer(addr).await;

    consumer
        .resolve(&PeerId::new("light-hub"))
        .await
        .unwrap()
        .expect("provider should resolve");

    let missing: CapabilityId = "home.heating.boost.1.0.0".parse().unwrap();
    let err = consumer
        .invoke(
            &missing,
            &PeerId::new("light-hub"),
            Vec::new(),
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();

    match err {
        crosswire_core::TransportError::Invocation(e) => {
            assert_eq!(e.code, ErrorCode::CapabilityNotFound)
        }
        other => panic!("expected invocation error, got {other:?}"),
    }
}

#[tokio::test]
async fn shutdown_is_clean_on_both_sides() {
    let (provider, addr) = start_provider(Arc::new(ToggleHandler)).await;
    let consumer = start_consumer(addr).await;

    consumer.stop_all().await.unwrap();
    provider.stop_all().await.unwrap();
}
