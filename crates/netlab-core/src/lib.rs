//! # netlab-core
//!
//! Building blocks of the netlab topology simulator.
//!
//! - [`ComponentType`] / [`Category`]: the registry of device kinds
//! - [`ConnectionPoint`] and the [`pins`] geometry: where links attach
//! - [`ComponentProblem`] / [`ActiveFaults`]: the fault catalog
//! - [`ComponentLogic`]: per-type capabilities, connectivity and packet processing
//! - [`NetworkPacket`]: what travels through a topology
//!
//! The graph itself and the packet walk live in `netlab-simulation`.

pub mod capability;
pub mod component;
pub mod error;
pub mod firewall;
pub mod logic;
pub mod packet;
pub mod pins;
pub mod problem;

pub use capability::{Capability, CapabilityKind};
pub use component::{Category, ComponentId, ComponentType, ConnectionId, UnknownComponentType};
pub use error::{TopologyError, TopologyResult};
pub use firewall::{FirewallRule, RuleAction};
pub use logic::{ComponentLogic, DropReason, HopAction, HopContext, Processed};
pub use packet::{NetworkPacket, PacketId, Payload};
pub use pins::{ConnectionPoint, CoverageZone, DEFAULT_SIZE, Point, Rect, UnknownConnectionPoint};
pub use problem::{ActiveFaults, ComponentProblem, FaultEffect, UnknownProblem};

// Re-export the channel key so callers need not depend on netlab-crypto directly
pub use netlab_crypto::ChannelKey;
