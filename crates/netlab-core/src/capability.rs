//! Descriptive capabilities advertised by component logic

use serde::{Deserialize, Serialize};

/// What a capability is about, used by faults to suppress it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CapabilityKind {
    Connectivity,
    Routing,
    Nat,
    Firewall,
    DnsForwarding,
    WirelessCoverage,
    Uplink,
    Hosting,
    Encryption,
    Messaging,
}

/// A named capability with a human description
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Capability {
    pub kind: CapabilityKind,
    pub name: &'static str,
    pub description: &'static str,
}

impl Capability {
    pub fn of(kind: CapabilityKind) -> Self {
        let (name, description) = match kind {
            CapabilityKind::Connectivity => ("Connectivity", "Links to neighbouring devices"),
            CapabilityKind::Routing => ("Routing", "Forwards packets between networks"),
            CapabilityKind::Nat => ("NAT", "Translates private source addresses to its own"),
            CapabilityKind::Firewall => ("Firewall", "Filters traffic against a rule set"),
            CapabilityKind::DnsForwarding => {
                ("DNS Forwarding", "Relays name lookups to an upstream resolver")
            }
            CapabilityKind::WirelessCoverage => {
                ("Wireless Coverage", "Serves devices inside its coverage area")
            }
            CapabilityKind::Uplink => ("Uplink", "Connects the local network to the internet"),
            CapabilityKind::Hosting => ("Hosting", "Runs services reachable over the network"),
            CapabilityKind::Encryption => {
                ("Encryption", "Seals outbound and opens inbound payloads")
            }
            CapabilityKind::Messaging => ("Messaging", "Sends and receives user messages"),
        };
        Self {
            kind,
            name,
            description,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.description)
    }
}
