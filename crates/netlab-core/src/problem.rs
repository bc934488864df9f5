//! Fault catalog
//!
//! A [`ComponentProblem`] is a plain value. It does nothing on its own;
//! component logic consults the active set while listing capabilities and
//! processing packets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityKind;

/// A named failure condition that can be active on a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentProblem {
    PowerOff,
    RestartInProgress,
    ConfigurationLoss,
    FirewallBlockingTraffic,
    NatNotWorking,
    DnsForwardingNotWorking,
    FirmwareOutdated,
    FirmwareCorruption,
    UnauthorizedAccess,
    CpuOverload,
    Overheating,
    InterfaceDown,
    PacketLoss,
    HighLatency,
}

/// How a fault acts on packet processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultEffect {
    /// The component forwards nothing
    Halt,
    /// Packets are dropped at random
    Loss,
    /// Payload bytes are damaged in transit
    Corrupt,
    /// Extra latency in milliseconds
    Delay(u64),
    /// Only specific component logic reacts to it
    Targeted,
}

impl ComponentProblem {
    /// Catalog order; also the precedence order among faults of equal effect
    pub const ALL: [ComponentProblem; 14] = [
        ComponentProblem::PowerOff,
        ComponentProblem::RestartInProgress,
        ComponentProblem::ConfigurationLoss,
        ComponentProblem::FirewallBlockingTraffic,
        ComponentProblem::NatNotWorking,
        ComponentProblem::DnsForwardingNotWorking,
        ComponentProblem::FirmwareOutdated,
        ComponentProblem::FirmwareCorruption,
        ComponentProblem::UnauthorizedAccess,
        ComponentProblem::CpuOverload,
        ComponentProblem::Overheating,
        ComponentProblem::InterfaceDown,
        ComponentProblem::PacketLoss,
        ComponentProblem::HighLatency,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ComponentProblem::PowerOff => "Power Off",
            ComponentProblem::RestartInProgress => "Restart In Progress",
            ComponentProblem::ConfigurationLoss => "Configuration Loss",
            ComponentProblem::FirewallBlockingTraffic => "Firewall Blocking Traffic",
            ComponentProblem::NatNotWorking => "NAT Not Working",
            ComponentProblem::DnsForwardingNotWorking => "DNS Forwarding Not Working",
            ComponentProblem::FirmwareOutdated => "Firmware Outdated",
            ComponentProblem::FirmwareCorruption => "Firmware Corruption",
            ComponentProblem::UnauthorizedAccess => "Unauthorized Access",
            ComponentProblem::CpuOverload => "CPU Overload",
            ComponentProblem::Overheating => "Overheating",
            ComponentProblem::InterfaceDown => "Interface Down",
            ComponentProblem::PacketLoss => "Packet Loss",
            ComponentProblem::HighLatency => "High Latency",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ComponentProblem::PowerOff => "The device has no power and forwards nothing",
            ComponentProblem::RestartInProgress => "The device is rebooting and forwards nothing",
            ComponentProblem::ConfigurationLoss => {
                "Routing or filtering configuration was wiped; managed devices drop traffic"
            }
            ComponentProblem::FirewallBlockingTraffic => {
                "Filtering rejects all traffic passing through"
            }
            ComponentProblem::NatNotWorking => "Address translation fails; the gateway drops traffic",
            ComponentProblem::DnsForwardingNotWorking => {
                "Name lookups are not relayed; traffic needing resolution is dropped"
            }
            ComponentProblem::FirmwareOutdated => "Old firmware slows packet handling",
            ComponentProblem::FirmwareCorruption => "Corrupted firmware damages payloads in transit",
            ComponentProblem::UnauthorizedAccess => {
                "An intruder is present; secure nodes demand valid credentials"
            }
            ComponentProblem::CpuOverload => "Processor saturation delays forwarding",
            ComponentProblem::Overheating => "Thermal throttling delays forwarding",
            ComponentProblem::InterfaceDown => "The network interface is down and forwards nothing",
            ComponentProblem::PacketLoss => "Packets are dropped at random",
            ComponentProblem::HighLatency => "Forwarding is slow",
        }
    }

    pub fn effect(self) -> FaultEffect {
        match self {
            ComponentProblem::PowerOff
            | ComponentProblem::RestartInProgress
            | ComponentProblem::InterfaceDown => FaultEffect::Halt,
            ComponentProblem::PacketLoss => FaultEffect::Loss,
            ComponentProblem::FirmwareCorruption => FaultEffect::Corrupt,
            ComponentProblem::FirmwareOutdated => FaultEffect::Delay(5),
            ComponentProblem::CpuOverload => FaultEffect::Delay(20),
            ComponentProblem::Overheating => FaultEffect::Delay(15),
            ComponentProblem::HighLatency => FaultEffect::Delay(100),
            ComponentProblem::ConfigurationLoss
            | ComponentProblem::FirewallBlockingTraffic
            | ComponentProblem::NatNotWorking
            | ComponentProblem::DnsForwardingNotWorking
            | ComponentProblem::UnauthorizedAccess => FaultEffect::Targeted,
        }
    }

    /// Faults a filtering device treats as "reject everything"
    pub fn is_blocking(self) -> bool {
        matches!(self, ComponentProblem::FirewallBlockingTraffic)
    }

    /// Whether this fault hides a capability from the advertised list
    pub fn suppresses(self, kind: CapabilityKind) -> bool {
        match self {
            ComponentProblem::PowerOff | ComponentProblem::RestartInProgress => true,
            ComponentProblem::NatNotWorking => kind == CapabilityKind::Nat,
            ComponentProblem::DnsForwardingNotWorking => kind == CapabilityKind::DnsForwarding,
            ComponentProblem::InterfaceDown => kind == CapabilityKind::Connectivity,
            _ => false,
        }
    }
}

impl std::fmt::Display for ComponentProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string names no catalog fault
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown problem: {0}")]
pub struct UnknownProblem(pub String);

impl std::str::FromStr for ComponentProblem {
    type Err = UnknownProblem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        ComponentProblem::ALL
            .into_iter()
            .find(|p| {
                let name: String = p
                    .name()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                name == wanted
            })
            .ok_or_else(|| UnknownProblem(s.to_string()))
    }
}

/// The set of faults currently active on one component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveFaults(BTreeSet<ComponentProblem>);

impl ActiveFaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate or clear a fault; returns whether the set changed
    pub fn set(&mut self, problem: ComponentProblem, active: bool) -> bool {
        if active {
            self.0.insert(problem)
        } else {
            self.0.remove(&problem)
        }
    }

    pub fn contains(&self, problem: ComponentProblem) -> bool {
        self.0.contains(&problem)
    }

    /// Active faults in catalog order
    pub fn iter(&self) -> impl Iterator<Item = ComponentProblem> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// First active fault with the given effect
    pub fn first_with(&self, wanted: FaultEffect) -> Option<ComponentProblem> {
        self.iter().find(|p| p.effect() == wanted)
    }

    pub fn any_blocking(&self) -> Option<ComponentProblem> {
        self.iter().find(|p| p.is_blocking())
    }

    /// Sum of the delays of all active delay faults
    pub fn total_delay_ms(&self) -> u64 {
        self.iter()
            .map(|p| match p.effect() {
                FaultEffect::Delay(ms) => ms,
                _ => 0,
            })
            .sum()
    }

    pub fn suppresses(&self, kind: CapabilityKind) -> bool {
        self.iter().any(|p| p.suppresses(kind))
    }
}
