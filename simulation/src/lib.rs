//! # netlab
//!
//! A network topology teaching simulator. Typed components are placed in a
//! graph, linked pin to pin, broken on purpose with faults from a fixed
//! catalog, and then a packet is walked through them to see what happens.
//!
//! ## Overview
//!
//! - **Components**: phones, routers, gateways, firewalls, secure nodes and
//!   more, each with its own connectivity rules and packet handling
//! - **Pins**: every link ends on a named connection point; a pin carries at
//!   most one link
//! - **Faults**: power loss, NAT failure, corruption, latency and the rest of
//!   the catalog change how a component treats packets and what it advertises
//! - **Traces**: a send returns the hop-by-hop record of where the packet went
//!   and how it ended
//!
//! ## Architecture
//!
//! - **Types** (`types.rs`): placed components, connections, events, traces
//! - **Topology** (`topology.rs`): the graph and its invariants, shortest paths
//! - **Simulation** (`simulation.rs`): session context and the packet walk
//! - **Shared** (`shared.rs`): lock-guarded handle for concurrent callers
//! - **Scenarios** (`scenarios.rs`): pre-built demonstrations
//!
//! Per-type behaviour lives in `netlab-core`.
//!
//! ## Example
//!
//! ```rust
//! use netlab_simulation::*;
//!
//! let mut sim = Simulation::with_config(SimConfig::seeded(1));
//! let phone = sim.add_component(ComponentType::Mobile, "M");
//! let router = sim.add_component(ComponentType::Router, "R");
//! let gateway = sim.add_component(ComponentType::Gateway, "G");
//! sim.link(phone, router).unwrap();
//! sim.link(router, gateway).unwrap();
//!
//! let trace = sim.send_message(phone, gateway, b"hello".to_vec()).unwrap();
//! assert!(trace.is_delivered());
//!
//! sim.set_fault(router, ComponentProblem::PowerOff, true).unwrap();
//! let trace = sim.send_message(phone, gateway, b"hello".to_vec()).unwrap();
//! assert!(!trace.is_delivered());
//! ```

pub mod types;
pub mod topology;
pub mod simulation;
pub mod shared;
pub mod scenarios;

#[cfg(test)]
mod integration_scenarios;

// Re-export main types
pub use types::{
    Connection,
    Endpoint,
    HopOutcome,
    HopRecord,
    NetworkComponent,
    NetworkEvent,
    Trace,
    TraceOutcome,
};

pub use topology::{
    ComponentSnapshot,
    PathStep,
    Topology,
    TopologySnapshot,
};

pub use simulation::{
    ConfigError,
    SimConfig,
    SimStats,
    Simulation,
};

pub use shared::SharedSimulation;

// Re-export core types so callers need a single dependency
pub use netlab_core::{
    ActiveFaults, Capability, CapabilityKind, Category, ComponentId, ComponentProblem,
    ComponentType, ConnectionId, ConnectionPoint, DropReason, FirewallRule, HopAction,
    NetworkPacket, PacketId, Payload, Point, RuleAction, TopologyError, TopologyResult,
};
