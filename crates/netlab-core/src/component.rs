//! Component type registry
//!
//! Every device kind the simulator knows about, tagged with its
//! [`Category`]. The registry is static data: the order of
//! [`ComponentType::ALL`] is the order tools list types in.

use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::capability::{Capability, CapabilityKind};
use crate::pins::{ConnectionPoint, CoverageZone};
use crate::problem::ComponentProblem;

/// Unique identifier of a component in a topology
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[display("c{_0}")]
pub struct ComponentId(pub u64);

/// Unique identifier of a connection in a topology
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[display("l{_0}")]
pub struct ConnectionId(pub u64);

/// Coarse grouping of component types
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[display("client")]
    Client,
    #[display("infrastructure")]
    Infrastructure,
    #[display("security")]
    Security,
    #[display("cloud")]
    Cloud,
}

/// Kind of network device
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Mobile,
    Laptop,
    Desktop,
    Router,
    WifiRouter,
    Gateway,
    AccessPoint,
    SignalTower,
    CellTower,
    Isp,
    Server,
    Firewall,
    Nilternius,
    Cloud,
    EdgeNode,
}

impl ComponentType {
    /// All known types, in registry order
    pub const ALL: [ComponentType; 15] = [
        ComponentType::Mobile,
        ComponentType::Laptop,
        ComponentType::Desktop,
        ComponentType::Router,
        ComponentType::WifiRouter,
        ComponentType::Gateway,
        ComponentType::AccessPoint,
        ComponentType::SignalTower,
        ComponentType::CellTower,
        ComponentType::Isp,
        ComponentType::Server,
        ComponentType::Firewall,
        ComponentType::Nilternius,
        ComponentType::Cloud,
        ComponentType::EdgeNode,
    ];

    /// All known types, in registry order
    pub fn all() -> &'static [ComponentType] {
        &Self::ALL
    }

    pub fn category(self) -> Category {
        match self {
            ComponentType::Mobile | ComponentType::Laptop | ComponentType::Desktop => {
                Category::Client
            }
            ComponentType::Router
            | ComponentType::WifiRouter
            | ComponentType::Gateway
            | ComponentType::AccessPoint
            | ComponentType::SignalTower
            | ComponentType::CellTower
            | ComponentType::Isp
            | ComponentType::Server => Category::Infrastructure,
            ComponentType::Firewall | ComponentType::Nilternius => Category::Security,
            ComponentType::Cloud | ComponentType::EdgeNode => Category::Cloud,
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            ComponentType::Mobile => "Mobile",
            ComponentType::Laptop => "Laptop",
            ComponentType::Desktop => "Desktop",
            ComponentType::Router => "Router",
            ComponentType::WifiRouter => "Wi-Fi Router",
            ComponentType::Gateway => "Gateway",
            ComponentType::AccessPoint => "Access Point",
            ComponentType::SignalTower => "Signal Tower",
            ComponentType::CellTower => "Cell Tower",
            ComponentType::Isp => "ISP",
            ComponentType::Server => "Server",
            ComponentType::Firewall => "Firewall",
            ComponentType::Nilternius => "Nilternius",
            ComponentType::Cloud => "Cloud",
            ComponentType::EdgeNode => "Edge Node",
        }
    }

    /// Connection points this type exposes
    pub fn pins(self) -> &'static [ConnectionPoint] {
        match self {
            ComponentType::Router
            | ComponentType::WifiRouter
            | ComponentType::Gateway
            | ComponentType::Isp
            | ComponentType::Cloud
            | ComponentType::CellTower => &ConnectionPoint::ALL,
            _ => &ConnectionPoint::SIDES,
        }
    }

    pub fn has_pin(self, pin: ConnectionPoint) -> bool {
        self.pins().contains(&pin)
    }

    /// Signal coverage area, for types that broadcast
    pub fn coverage_zone(self) -> Option<CoverageZone> {
        match self {
            ComponentType::AccessPoint | ComponentType::WifiRouter => Some(CoverageZone::new(240.0, 240.0)),
            ComponentType::SignalTower => Some(CoverageZone::new(480.0, 480.0)),
            ComponentType::CellTower => Some(CoverageZone::new(720.0, 720.0)),
            _ => None,
        }
    }

    pub fn has_coverage_zone(self) -> bool {
        self.coverage_zone().is_some()
    }

    /// Faults a UI would offer for this type.
    ///
    /// Advisory only: any fault may be set on any component.
    pub fn available_problems(self) -> &'static [ComponentProblem] {
        use ComponentProblem::*;
        match self {
            ComponentType::Gateway => &ComponentProblem::ALL,
            ComponentType::Router | ComponentType::WifiRouter => &[
                PowerOff,
                RestartInProgress,
                ConfigurationLoss,
                DnsForwardingNotWorking,
                FirmwareOutdated,
                FirmwareCorruption,
                CpuOverload,
                Overheating,
                InterfaceDown,
                PacketLoss,
                HighLatency,
            ],
            ComponentType::Firewall => &[
                PowerOff,
                RestartInProgress,
                ConfigurationLoss,
                FirewallBlockingTraffic,
                FirmwareOutdated,
                CpuOverload,
                InterfaceDown,
            ],
            ComponentType::Nilternius => &[
                PowerOff,
                RestartInProgress,
                UnauthorizedAccess,
                CpuOverload,
                PacketLoss,
                HighLatency,
            ],
            ComponentType::Mobile | ComponentType::Laptop | ComponentType::Desktop => {
                &[PowerOff, RestartInProgress, Overheating, InterfaceDown, PacketLoss]
            }
            _ => &[
                PowerOff,
                RestartInProgress,
                CpuOverload,
                Overheating,
                InterfaceDown,
                PacketLoss,
                HighLatency,
            ],
        }
    }

    /// Full advertised capability list, before fault filtering
    pub fn capabilities(self) -> Vec<Capability> {
        use CapabilityKind::*;
        let kinds: &[CapabilityKind] = match self {
            ComponentType::Mobile | ComponentType::Laptop | ComponentType::Desktop => {
                &[Connectivity, Messaging]
            }
            ComponentType::Router => &[Connectivity, Routing, DnsForwarding],
            ComponentType::WifiRouter => &[Connectivity, Routing, DnsForwarding, WirelessCoverage],
            ComponentType::Gateway => &[Connectivity, Routing, Nat, Firewall, DnsForwarding],
            ComponentType::AccessPoint | ComponentType::SignalTower | ComponentType::CellTower => {
                &[Connectivity, WirelessCoverage]
            }
            ComponentType::Isp => &[Connectivity, Routing, Uplink],
            ComponentType::Server => &[Connectivity, Hosting],
            ComponentType::Firewall => &[Connectivity, Firewall],
            ComponentType::Nilternius => &[Connectivity, Encryption, Messaging],
            ComponentType::Cloud => &[Connectivity, Hosting, Uplink],
            ComponentType::EdgeNode => &[Connectivity, Hosting, Routing],
        };
        kinds.iter().map(|k| Capability::of(*k)).collect()
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Error returned when a string names no known component type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown component type: {0}")]
pub struct UnknownComponentType(pub String);

impl FromStr for ComponentType {
    type Err = UnknownComponentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let ty = match normalized.as_str() {
            "mobile" | "phone" => ComponentType::Mobile,
            "laptop" => ComponentType::Laptop,
            "desktop" | "pc" => ComponentType::Desktop,
            "router" => ComponentType::Router,
            "wifirouter" | "wifi" => ComponentType::WifiRouter,
            "gateway" => ComponentType::Gateway,
            "accesspoint" | "ap" => ComponentType::AccessPoint,
            "signaltower" => ComponentType::SignalTower,
            "celltower" => ComponentType::CellTower,
            "isp" => ComponentType::Isp,
            "server" => ComponentType::Server,
            "firewall" => ComponentType::Firewall,
            "nilternius" | "securenode" => ComponentType::Nilternius,
            "cloud" => ComponentType::Cloud,
            "edgenode" | "edge" => ComponentType::EdgeNode,
            _ => return Err(UnknownComponentType(s.to_string())),
        };
        Ok(ty)
    }
}
