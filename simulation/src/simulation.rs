//! Simulation session for netlab
//!
//! A [`Simulation`] owns one topology together with everything a session
//! needs around it: configuration, the secure channel key, a seeded RNG for
//! packet loss, the event log and statistics.
//!
//! Sending a packet walks the shortest path from source to destination and
//! lets every component on it process the packet in turn. The first drop
//! ends the walk.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, info_span, trace};

use netlab_core::{
    ChannelKey, ComponentId, ComponentProblem, ComponentType, ConnectionId, ConnectionPoint,
    DropReason, FirewallRule, HopContext, NetworkPacket, PacketId, Point, Processed,
    TopologyResult,
};

use crate::topology::Topology;
use crate::types::*;

/// Configuration for a simulation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Base latency charged at every hop
    pub hop_latency_ms: u64,
    /// Chance that an active packet-loss fault drops a packet
    pub packet_loss_probability: f64,
    /// Seed for the session RNG; `None` draws one from the OS
    pub seed: Option<u64>,
    /// Drop packets whose accumulated latency exceeds this (None = no limit)
    pub max_latency_ms: Option<u64>,
    /// Hop limit stamped on new packets (None = no limit)
    pub default_ttl: Option<u8>,
    /// Secret the secure-node channel key is derived from
    pub secure_secret: String,
    /// Credential secure nodes accept while under unauthorized access
    pub access_token: String,
    /// Enable detailed tracing of events
    pub trace_routing: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            hop_latency_ms: 1,
            packet_loss_probability: 0.5,
            seed: None,
            max_latency_ms: None,
            default_ttl: None,
            secure_secret: "nilternius".to_string(),
            access_token: "nilternius-access".to_string(),
            trace_routing: true,
        }
    }
}

/// Errors loading a [`SimConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl SimConfig {
    /// Deterministic configuration with the given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.packet_loss_probability) {
            return Err(ConfigError::Invalid(format!(
                "packet_loss_probability must be within [0, 1], got {}",
                self.packet_loss_probability
            )));
        }
        if self.default_ttl == Some(0) {
            return Err(ConfigError::Invalid("default_ttl must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimStats {
    pub packets_sent: u64,
    pub packets_delivered: u64,
    pub packets_dropped: u64,
    pub packets_unreachable: u64,
    /// Hops processed across all packets
    pub total_hops: u64,
    /// Latency of delivered packets
    pub total_delivery_latency_ms: u64,
}

impl SimStats {
    pub fn delivery_rate(&self) -> f64 {
        if self.packets_sent == 0 {
            0.0
        } else {
            self.packets_delivered as f64 / self.packets_sent as f64
        }
    }

    pub fn average_latency_ms(&self) -> f64 {
        if self.packets_delivered == 0 {
            0.0
        } else {
            self.total_delivery_latency_ms as f64 / self.packets_delivered as f64
        }
    }
}

/// One simulation session
#[derive(Debug)]
pub struct Simulation {
    topology: Topology,
    pub config: SimConfig,
    /// Global event log
    pub event_log: Vec<NetworkEvent>,
    pub stats: SimStats,
    channel_key: ChannelKey,
    rng: StdRng,
    next_packet: u64,
}

impl Simulation {
    /// Create a session over an existing topology
    pub fn new(topology: Topology, config: SimConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let channel_key = ChannelKey::derive(&config.secure_secret);
        info!(seed = ?config.seed, "Simulation session created");
        Self {
            topology,
            config,
            event_log: Vec::new(),
            stats: SimStats::default(),
            channel_key,
            rng,
            next_packet: 0,
        }
    }

    /// Create a session over an empty topology
    pub fn with_config(config: SimConfig) -> Self {
        Self::new(Topology::new(), config)
    }

    /// The component graph; every mutation goes through the session
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn add_component(&mut self, kind: ComponentType, name: impl Into<String>) -> ComponentId {
        let id = self.topology.add_component(kind, name);
        self.emit_event(NetworkEvent::ComponentAdded { id, kind });
        id
    }

    pub fn add_component_at(
        &mut self,
        kind: ComponentType,
        name: impl Into<String>,
        center: Point,
    ) -> ComponentId {
        let id = self.topology.add_component_at(kind, name, center);
        self.emit_event(NetworkEvent::ComponentAdded { id, kind });
        id
    }

    /// Remove a component and its connections; `None` if it was absent
    pub fn remove_component(&mut self, id: ComponentId) -> Option<NetworkComponent> {
        let (component, connections_removed) = self.topology.remove_component(id)?;
        self.emit_event(NetworkEvent::ComponentRemoved {
            id,
            connections_removed,
        });
        Some(component)
    }

    pub fn connect(
        &mut self,
        a: ComponentId,
        pin_a: ConnectionPoint,
        b: ComponentId,
        pin_b: ConnectionPoint,
    ) -> TopologyResult<ConnectionId> {
        let id = self.topology.connect(a, pin_a, b, pin_b)?;
        self.emit_connected(id)?;
        Ok(id)
    }

    /// Connect on the first free pins of each side
    pub fn link(&mut self, a: ComponentId, b: ComponentId) -> TopologyResult<ConnectionId> {
        let id = self.topology.link(a, b)?;
        self.emit_connected(id)?;
        Ok(id)
    }

    pub fn disconnect(&mut self, id: ConnectionId) -> TopologyResult<Connection> {
        let connection = self.topology.disconnect(id)?;
        self.emit_event(NetworkEvent::Disconnected { connection: id });
        Ok(connection)
    }

    /// Activate or clear a fault; returns whether anything changed
    pub fn set_fault(
        &mut self,
        component: ComponentId,
        problem: ComponentProblem,
        active: bool,
    ) -> TopologyResult<bool> {
        let changed = self.topology.set_fault(component, problem, active)?;
        if changed {
            self.emit_event(NetworkEvent::FaultChanged {
                component,
                problem,
                active,
            });
        }
        Ok(changed)
    }

    pub fn set_firewall_rules(&mut self, id: ComponentId, rules: Vec<FirewallRule>) -> TopologyResult<()> {
        self.topology.set_firewall_rules(id, rules)
    }

    /// A fresh packet carrying the session's default TTL, if any
    pub fn new_packet(&mut self, from: ComponentId, to: ComponentId, payload: Vec<u8>) -> NetworkPacket {
        let id = PacketId(self.next_packet);
        self.next_packet += 1;
        let packet = NetworkPacket::new(id, from, to, payload);
        match self.config.default_ttl {
            Some(ttl) => packet.with_ttl(ttl),
            None => packet,
        }
    }

    /// Build and send a plain packet
    pub fn send_message(&mut self, from: ComponentId, to: ComponentId, payload: Vec<u8>) -> TopologyResult<Trace> {
        let packet = self.new_packet(from, to, payload);
        self.send(packet)
    }

    /// Walk `packet` from its source to its destination.
    ///
    /// Fails only when source or destination is unknown; drops and missing
    /// paths are reported in the returned trace.
    pub fn send(&mut self, mut packet: NetworkPacket) -> TopologyResult<Trace> {
        let source = packet.source;
        let destination = packet.destination;
        self.topology.component(source)?;
        self.topology.component(destination)?;

        let packet_id = packet.id;
        self.stats.packets_sent += 1;
        self.emit_event(NetworkEvent::PacketSent {
            packet: packet_id,
            from: source,
            to: destination,
        });

        let mut trace = Trace {
            packet: packet_id,
            source,
            destination,
            hops: Vec::new(),
            outcome: TraceOutcome::Unreachable,
            total_latency_ms: 0,
            delivered_packet: None,
        };

        let Some(path) = self.topology.shortest_path(source, destination) else {
            self.stats.packets_unreachable += 1;
            info!(packet = %packet_id, from = %source, to = %destination, "No path, packet unreachable");
            self.emit_event(NetworkEvent::PacketUnreachable {
                packet: packet_id,
                from: source,
                to: destination,
            });
            return Ok(trace);
        };

        let last = path.len() - 1;
        for (index, (component_id, ingress)) in path.into_iter().enumerate() {
            let span = info_span!("hop", component = %component_id, packet = %packet_id);
            let _enter = span.enter();

            self.stats.total_hops += 1;
            let loss_sample: f64 = self.rng.random();
            let component = self.topology.component(component_id)?;

            let mut record = HopRecord {
                component: component_id,
                name: component.name.clone(),
                kind: component.kind,
                ingress,
                outcome: HopOutcome::Delivered,
                actions: Vec::new(),
                latency_ms: 0,
            };

            let processed = if index > 0 && !packet.decrement_ttl() {
                Processed::Drop(DropReason::TtlExpired)
            } else {
                packet.mark_visited(component_id);
                let ctx = HopContext {
                    component: component_id,
                    faults: &component.faults,
                    firewall_rules: &component.firewall_rules,
                    channel_key: &self.channel_key,
                    access_token: &self.config.access_token,
                    loss_probability: self.config.packet_loss_probability,
                    loss_sample,
                };
                component.logic.process_packet(&ctx, packet)
            };

            let (forwarded, delay_ms, actions) = match processed {
                Processed::Forward {
                    packet,
                    delay_ms,
                    actions,
                } => (packet, delay_ms, actions),
                Processed::Drop(reason) => return Ok(self.finish_dropped(trace, record, reason)),
            };
            packet = forwarded;
            record.actions = actions;
            record.latency_ms = self.config.hop_latency_ms + delay_ms;
            trace.total_latency_ms += record.latency_ms;
            if let Some(budget) = self.config.max_latency_ms
                && trace.total_latency_ms > budget
            {
                return Ok(self.finish_dropped(trace, record, DropReason::LatencyBudgetExceeded));
            }

            record.outcome = if index == last {
                HopOutcome::Delivered
            } else if index == 0 {
                HopOutcome::Forwarded
            } else {
                HopOutcome::PassedThrough
            };
            trace!(outcome = %record.outcome, latency_ms = record.latency_ms, "Hop processed");
            trace.hops.push(record);
        }

        trace.outcome = TraceOutcome::Delivered { at: destination };
        trace.delivered_packet = Some(packet);
        self.stats.packets_delivered += 1;
        self.stats.total_delivery_latency_ms += trace.total_latency_ms;
        info!(
            packet = %packet_id,
            hops = trace.hops.len(),
            latency_ms = trace.total_latency_ms,
            "Packet delivered"
        );
        self.emit_event(NetworkEvent::PacketDelivered {
            packet: packet_id,
            at: destination,
            hops: trace.hops.len(),
            latency_ms: trace.total_latency_ms,
        });
        Ok(trace)
    }

    fn finish_dropped(&mut self, mut trace: Trace, mut record: HopRecord, reason: DropReason) -> Trace {
        let at = record.component;
        debug!(%reason, "Packet dropped");
        record.outcome = HopOutcome::Dropped(reason.clone());
        trace.hops.push(record);
        trace.outcome = TraceOutcome::Dropped {
            at,
            reason: reason.clone(),
        };
        self.stats.packets_dropped += 1;
        self.emit_event(NetworkEvent::PacketDropped {
            packet: trace.packet,
            at,
            reason,
        });
        trace
    }

    fn emit_connected(&mut self, id: ConnectionId) -> TopologyResult<()> {
        let connection = self.topology.connection(id)?;
        let event = NetworkEvent::Connected {
            connection: id,
            a: connection.a,
            b: connection.b,
        };
        self.emit_event(event);
        Ok(())
    }

    fn emit_event(&mut self, event: NetworkEvent) {
        if self.config.trace_routing {
            trace!("Event: {:?}", event);
        }
        self.event_log.push(event);
    }

    /// Get a summary of the current state
    pub fn state_summary(&self) -> String {
        let faulty = self
            .topology
            .components()
            .filter(|c| !c.faults.is_empty())
            .count();
        format!(
            "{} components, {} connections, {} faulty; {} sent, {} delivered, {} dropped, {} unreachable",
            self.topology.component_count(),
            self.topology.connection_count(),
            faulty,
            self.stats.packets_sent,
            self.stats.packets_delivered,
            self.stats.packets_dropped,
            self.stats.packets_unreachable,
        )
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::with_config(SimConfig::default())
    }
}
