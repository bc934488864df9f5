//! Thread-safe handle to a simulation session
//!
//! Mutations and packet sends take the write lock, so a walk never observes
//! a graph mid-mutation. Queries share the read lock.

use parking_lot::RwLock;
use std::sync::Arc;

use netlab_core::{
    ActiveFaults, Capability, ComponentId, ComponentProblem, ComponentType, ConnectionId,
    ConnectionPoint, NetworkPacket, TopologyResult,
};

use crate::simulation::{SimConfig, SimStats, Simulation};
use crate::topology::TopologySnapshot;
use crate::types::{Connection, NetworkComponent, Trace};

/// Cloneable, lock-guarded simulation
#[derive(Debug, Clone)]
pub struct SharedSimulation {
    inner: Arc<RwLock<Simulation>>,
}

impl SharedSimulation {
    pub fn new(simulation: Simulation) -> Self {
        Self {
            inner: Arc::new(RwLock::new(simulation)),
        }
    }

    pub fn with_config(config: SimConfig) -> Self {
        Self::new(Simulation::with_config(config))
    }

    pub fn add_component(&self, kind: ComponentType, name: impl Into<String>) -> ComponentId {
        self.inner.write().add_component(kind, name)
    }

    pub fn remove_component(&self, id: ComponentId) -> Option<NetworkComponent> {
        self.inner.write().remove_component(id)
    }

    pub fn connect(
        &self,
        a: ComponentId,
        pin_a: ConnectionPoint,
        b: ComponentId,
        pin_b: ConnectionPoint,
    ) -> TopologyResult<ConnectionId> {
        self.inner.write().connect(a, pin_a, b, pin_b)
    }

    pub fn link(&self, a: ComponentId, b: ComponentId) -> TopologyResult<ConnectionId> {
        self.inner.write().link(a, b)
    }

    pub fn disconnect(&self, id: ConnectionId) -> TopologyResult<Connection> {
        self.inner.write().disconnect(id)
    }

    pub fn set_fault(&self, id: ComponentId, problem: ComponentProblem, active: bool) -> TopologyResult<bool> {
        self.inner.write().set_fault(id, problem, active)
    }

    pub fn send(&self, packet: NetworkPacket) -> TopologyResult<Trace> {
        self.inner.write().send(packet)
    }

    pub fn send_message(&self, from: ComponentId, to: ComponentId, payload: Vec<u8>) -> TopologyResult<Trace> {
        self.inner.write().send_message(from, to, payload)
    }

    pub fn capabilities(&self, id: ComponentId) -> TopologyResult<Vec<Capability>> {
        self.inner.read().topology().capabilities(id)
    }

    pub fn active_faults(&self, id: ComponentId) -> TopologyResult<ActiveFaults> {
        self.inner.read().topology().active_faults(id).cloned()
    }

    pub fn snapshot(&self) -> TopologySnapshot {
        self.inner.read().topology().snapshot()
    }

    pub fn stats(&self) -> SimStats {
        self.inner.read().stats.clone()
    }

    /// Run `f` with shared access to the whole session
    pub fn read<R>(&self, f: impl FnOnce(&Simulation) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access to the whole session
    pub fn write<R>(&self, f: impl FnOnce(&mut Simulation) -> R) -> R {
        f(&mut self.inner.write())
    }
}
