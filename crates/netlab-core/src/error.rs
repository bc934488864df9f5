//! Error types for topology mutations and queries

use thiserror::Error;

use crate::component::{ComponentId, ComponentType, ConnectionId};
use crate::pins::ConnectionPoint;

/// Errors returned by topology operations.
///
/// A failed operation leaves the topology unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("Unknown component: {0}")]
    UnknownComponent(ComponentId),

    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    #[error("Incompatible types: {a} cannot be linked to {b}")]
    IncompatibleTypes { a: ComponentType, b: ComponentType },

    #[error("Pin {pin} of {component} already carries a connection")]
    PinInUse {
        component: ComponentId,
        pin: ConnectionPoint,
    },

    #[error("{kind} {component} has no {pin} pin")]
    InvalidPin {
        component: ComponentId,
        kind: ComponentType,
        pin: ConnectionPoint,
    },

    #[error("{0} has no free pin")]
    NoFreePin(ComponentId),

    #[error("Cannot connect {0} to itself")]
    SelfConnection(ComponentId),

    #[error("{0} is not a firewall")]
    NotAFirewall(ComponentId),
}

/// Result type for topology operations
pub type TopologyResult<T> = Result<T, TopologyError>;
