//! Core types for the netlab simulation
//!
//! Components placed in a topology, the links between their pins, the
//! session event log and the hop-by-hop trace a packet leaves behind.

use serde::Serialize;

use netlab_core::{
    ActiveFaults, Capability, ComponentId, ComponentLogic, ComponentProblem, ComponentType,
    ConnectionId, ConnectionPoint, DropReason, FirewallRule, HopAction, NetworkPacket, PacketId,
    Point, Rect, pins,
};

/// A device placed in a topology
#[derive(Debug, Clone)]
pub struct NetworkComponent {
    pub id: ComponentId,
    pub name: String,
    pub kind: ComponentType,
    pub logic: ComponentLogic,
    /// Logical center, used to resolve pin positions and coverage
    pub center: Point,
    pub faults: ActiveFaults,
    /// Only consulted when `kind` is a firewall
    pub firewall_rules: Vec<FirewallRule>,
}

impl NetworkComponent {
    pub fn new(id: ComponentId, kind: ComponentType, name: impl Into<String>, center: Point) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            logic: ComponentLogic::for_type(kind),
            center,
            faults: ActiveFaults::new(),
            firewall_rules: Vec::new(),
        }
    }

    /// Capabilities after fault filtering
    pub fn capabilities(&self) -> Vec<Capability> {
        self.logic.capabilities(&self.faults)
    }

    pub fn pin_position(&self, pin: ConnectionPoint) -> Point {
        pins::position(pin, self.center)
    }

    /// Coverage area around the center, for broadcasting types
    pub fn coverage_bounds(&self) -> Option<Rect> {
        self.kind.coverage_zone().map(|zone| zone.bounds(self.center))
    }
}

impl std::fmt::Display for NetworkComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.id, self.name, self.kind)
    }
}

/// One end of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Endpoint {
    pub component: ComponentId,
    pub pin: ConnectionPoint,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.component, self.pin)
    }
}

/// An undirected link between two pins of two different components
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub a: Endpoint,
    pub b: Endpoint,
}

impl Connection {
    pub fn touches(&self, component: ComponentId) -> bool {
        self.a.component == component || self.b.component == component
    }

    /// The component at the far end from `component`
    pub fn other(&self, component: ComponentId) -> Option<ComponentId> {
        if self.a.component == component {
            Some(self.b.component)
        } else if self.b.component == component {
            Some(self.a.component)
        } else {
            None
        }
    }

    /// The endpoint belonging to `component`
    pub fn endpoint_of(&self, component: ComponentId) -> Option<Endpoint> {
        if self.a.component == component {
            Some(self.a)
        } else if self.b.component == component {
            Some(self.b)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} <-> {}", self.id, self.a, self.b)
    }
}

/// Events that occur during a simulation session
#[derive(Debug, Clone, Serialize)]
pub enum NetworkEvent {
    ComponentAdded {
        id: ComponentId,
        kind: ComponentType,
    },
    /// Removal cascades to every incident connection
    ComponentRemoved {
        id: ComponentId,
        connections_removed: usize,
    },
    Connected {
        connection: ConnectionId,
        a: Endpoint,
        b: Endpoint,
    },
    Disconnected {
        connection: ConnectionId,
    },
    FaultChanged {
        component: ComponentId,
        problem: ComponentProblem,
        active: bool,
    },
    PacketSent {
        packet: PacketId,
        from: ComponentId,
        to: ComponentId,
    },
    PacketDelivered {
        packet: PacketId,
        at: ComponentId,
        hops: usize,
        latency_ms: u64,
    },
    PacketDropped {
        packet: PacketId,
        at: ComponentId,
        reason: DropReason,
    },
    PacketUnreachable {
        packet: PacketId,
        from: ComponentId,
        to: ComponentId,
    },
}

/// What happened to a packet at one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HopOutcome {
    /// The source handed the packet to the next hop
    Forwarded,
    /// An intermediate component forwarded it
    PassedThrough,
    Delivered,
    Dropped(DropReason),
}

impl std::fmt::Display for HopOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HopOutcome::Forwarded => write!(f, "delivered-to-next"),
            HopOutcome::PassedThrough => write!(f, "pass-through"),
            HopOutcome::Delivered => write!(f, "delivered"),
            HopOutcome::Dropped(reason) => write!(f, "dropped ({})", reason),
        }
    }
}

/// One entry of a trace
#[derive(Debug, Clone, Serialize)]
pub struct HopRecord {
    pub component: ComponentId,
    pub name: String,
    pub kind: ComponentType,
    /// Connection the packet arrived on; `None` at the source
    pub ingress: Option<ConnectionId>,
    pub outcome: HopOutcome,
    pub actions: Vec<HopAction>,
    /// Latency charged at this hop
    pub latency_ms: u64,
}

/// Final fate of a packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TraceOutcome {
    Delivered { at: ComponentId },
    Dropped { at: ComponentId, reason: DropReason },
    /// No path joins source and destination
    Unreachable,
}

/// Hop-by-hop record of one packet simulation
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub packet: PacketId,
    pub source: ComponentId,
    pub destination: ComponentId,
    pub hops: Vec<HopRecord>,
    pub outcome: TraceOutcome,
    pub total_latency_ms: u64,
    /// The packet as it arrived, when delivered
    pub delivered_packet: Option<NetworkPacket>,
}

impl Trace {
    pub fn is_delivered(&self) -> bool {
        matches!(self.outcome, TraceOutcome::Delivered { .. })
    }

    pub fn is_unreachable(&self) -> bool {
        self.outcome == TraceOutcome::Unreachable
    }

    /// Components visited, in order
    pub fn path(&self) -> Vec<ComponentId> {
        self.hops.iter().map(|h| h.component).collect()
    }

    /// `(component, outcome)` pairs, in order
    pub fn outcomes(&self) -> Vec<(ComponentId, HopOutcome)> {
        self.hops
            .iter()
            .map(|h| (h.component, h.outcome.clone()))
            .collect()
    }

    pub fn last_hop(&self) -> Option<&HopRecord> {
        self.hops.last()
    }
}

impl std::fmt::Display for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unreachable() {
            return write!(f, "{} {} -> {}: unreachable", self.packet, self.source, self.destination);
        }
        let hops: Vec<String> = self
            .hops
            .iter()
            .map(|h| format!("{}: {}", h.name, h.outcome))
            .collect();
        write!(f, "{} [{}] ({} ms)", self.packet, hops.join(", "), self.total_latency_ms)
    }
}
