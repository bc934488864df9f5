//! Simulated packets

use derive_more::Display;
use netlab_crypto::SealedPayload;
use serde::{Deserialize, Serialize};

use crate::component::ComponentId;

/// Unique identifier for a simulated packet
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[display("p{_0}")]
pub struct PacketId(pub u64);

/// Packet body: plaintext, or sealed by a secure node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    Plain(Vec<u8>),
    Sealed(SealedPayload),
}

impl Payload {
    pub fn is_sealed(&self) -> bool {
        matches!(self, Payload::Sealed(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Plain(bytes) => bytes.len(),
            Payload::Sealed(sealed) => sealed.ciphertext.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A packet travelling through the topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPacket {
    pub id: PacketId,
    pub source: ComponentId,
    pub destination: ComponentId,
    pub payload: Payload,
    /// Service port, matched by firewall rules
    pub port: u16,
    /// Whether the packet depends on a name lookup on its way
    pub needs_name_resolution: bool,
    /// Credential presented to secure nodes
    pub credential: Option<String>,
    /// Source address after NAT, if a gateway rewrote it
    pub translated_source: Option<ComponentId>,
    /// Set when a hop damaged the payload
    pub corrupted: bool,
    /// Remaining hop budget; `None` never expires
    pub ttl: Option<u8>,
    /// Components that have handled the packet, in order
    pub visited: Vec<ComponentId>,
}

impl NetworkPacket {
    pub fn new(id: PacketId, source: ComponentId, destination: ComponentId, payload: Vec<u8>) -> Self {
        Self {
            id,
            source,
            destination,
            payload: Payload::Plain(payload),
            port: 0,
            needs_name_resolution: false,
            credential: None,
            translated_source: None,
            corrupted: false,
            ttl: None,
            visited: Vec::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_name_resolution(mut self) -> Self {
        self.needs_name_resolution = true;
        self
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Source address as seen by the next hop
    pub fn effective_source(&self) -> ComponentId {
        self.translated_source.unwrap_or(self.source)
    }

    /// Record that a component has handled this packet
    pub fn mark_visited(&mut self, component: ComponentId) {
        self.visited.push(component);
    }

    pub fn was_visited(&self, component: ComponentId) -> bool {
        self.visited.contains(&component)
    }

    /// Decrement TTL, returns false if packet should be dropped
    pub fn decrement_ttl(&mut self) -> bool {
        match &mut self.ttl {
            Some(0) => false,
            Some(ttl) => {
                *ttl -= 1;
                true
            }
            None => true,
        }
    }
}
