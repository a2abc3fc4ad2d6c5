//! Direct TCP transport for Crosswire.
//!
//! Peers announce themselves to configured seed addresses, cache what they
//! learn, and invoke capabilities over short-lived framed TCP connections.
//! Scope: any network where peers can reach each other's listen sockets.

mod node;

pub use node::{TcpTransport, TcpTransportConfig};
