//! Peer identity — self-declared names following the mDNS philosophy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Self-declared peer identifier, sanitized to a DNS-compatible label.
///
/// Construction never fails: the input is lowercased, whitespace is mapped to
/// hyphens, anything that is not a letter, digit, or hyphen is dropped, and
/// the result is truncated to 63 characters. Two `PeerId`s are equal iff
/// their sanitized names match. There is no central allocation — identity is
/// per-peer convention, like an mDNS hostname.
///
/// The empty name is the reserved broadcast identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PeerId {
    name: String,
}

impl PeerId {
    /// Maximum name length in characters.
    ///
    /// The wire format additionally caps names at 63 UTF-8 *bytes*; a name
    /// of multibyte letters can pass this character bound and still be
    /// rejected by [`MessageHeader::serialize`](crate::MessageHeader).
    pub const MAX_LEN: usize = 63;

    /// Create a peer ID, sanitizing the input.
    pub fn new(name: &str) -> Self {
        let sanitized: String = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_whitespace() { '-' } else { c })
            .filter(|c| c.is_alphanumeric() || *c == '-')
            .take(Self::MAX_LEN)
            .collect();
        Self { name: sanitized }
    }

    /// The broadcast identifier (empty name).
    pub fn broadcast() -> Self {
        Self {
            name: String::new(),
        }
    }

    /// The sanitized name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the broadcast identifier.
    pub fn is_broadcast(&self) -> bool {
        self.name.is_empty()
    }

    /// Full mDNS-style identifier (`name.local`).
    pub fn local_name(&self) -> String {
        format!("{}.local", self.name)
    }

    /// Short prefix for display (first 8 characters).
    pub fn short(&self) -> String {
        self.name.chars().take(8).collect()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<String> for PeerId {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<PeerId> for String {
    fn from(id: PeerId) -> Self {
        id.name
    }
}
