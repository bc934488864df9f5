//! Topology graph for netlab
//!
//! Components are nodes, connections are undirected edges between two pins.
//! Every mutation is validated up front so a failed call leaves the graph
//! exactly as it was.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

use netlab_core::{
    ActiveFaults, Capability, ComponentId, ComponentProblem, ComponentType, ConnectionId,
    ConnectionPoint, FirewallRule, Point, TopologyError, TopologyResult,
};

use crate::types::{Connection, Endpoint, NetworkComponent};

/// Spacing of the default placement grid
const GRID_SPACING: f64 = 200.0;
/// Components per row of the default placement grid
const GRID_COLUMNS: u64 = 8;

/// A graph of components and the links between their pins
#[derive(Debug, Clone, Default)]
pub struct Topology {
    components: BTreeMap<ComponentId, NetworkComponent>,
    connections: BTreeMap<ConnectionId, Connection>,
    /// Which connection occupies each pin
    occupied: BTreeMap<Endpoint, ConnectionId>,
    /// Incident connections per component
    adjacency: BTreeMap<ComponentId, BTreeSet<ConnectionId>>,
    next_component: u64,
    next_connection: u64,
}

/// One hop of a path: the component and the connection used to reach it
pub type PathStep = (ComponentId, Option<ConnectionId>);

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component on the default placement grid
    pub fn add_component(&mut self, kind: ComponentType, name: impl Into<String>) -> ComponentId {
        let n = self.next_component;
        let center = Point::new(
            (n % GRID_COLUMNS) as f64 * GRID_SPACING,
            (n / GRID_COLUMNS) as f64 * GRID_SPACING,
        );
        self.add_component_at(kind, name, center)
    }

    /// Add a component centered at `center`
    pub fn add_component_at(
        &mut self,
        kind: ComponentType,
        name: impl Into<String>,
        center: Point,
    ) -> ComponentId {
        let id = ComponentId(self.next_component);
        self.next_component += 1;

        let component = NetworkComponent::new(id, kind, name, center);
        debug!(component = %id, kind = %kind, name = %component.name, "Added component");
        self.components.insert(id, component);
        self.adjacency.insert(id, BTreeSet::new());
        id
    }

    /// Remove a component and every connection incident to it.
    ///
    /// Returns the removed component and how many connections went with it,
    /// or `None` if the id was not present.
    pub fn remove_component(&mut self, id: ComponentId) -> Option<(NetworkComponent, usize)> {
        let component = self.components.remove(&id)?;
        let incident = self.adjacency.remove(&id).unwrap_or_default();
        for connection in &incident {
            self.drop_connection(*connection);
        }
        debug!(component = %id, connections = incident.len(), "Removed component");
        Some((component, incident.len()))
    }

    /// Link `pin_a` of `a` to `pin_b` of `b`.
    ///
    /// Checks run in order: both ids known, not a self-link, both sides accept
    /// the link, both pins exposed by their types, both pins free.
    pub fn connect(
        &mut self,
        a: ComponentId,
        pin_a: ConnectionPoint,
        b: ComponentId,
        pin_b: ConnectionPoint,
    ) -> TopologyResult<ConnectionId> {
        let kind_a = self.component(a)?.kind;
        let kind_b = self.component(b)?.kind;
        if a == b {
            return Err(TopologyError::SelfConnection(a));
        }
        self.check_compatible(a, b)?;
        for (id, kind, pin) in [(a, kind_a, pin_a), (b, kind_b, pin_b)] {
            if !kind.has_pin(pin) {
                return Err(TopologyError::InvalidPin {
                    component: id,
                    kind,
                    pin,
                });
            }
        }

        let end_a = Endpoint {
            component: a,
            pin: pin_a,
        };
        let end_b = Endpoint {
            component: b,
            pin: pin_b,
        };
        for end in [end_a, end_b] {
            if self.occupied.contains_key(&end) {
                return Err(TopologyError::PinInUse {
                    component: end.component,
                    pin: end.pin,
                });
            }
        }

        Ok(self.insert_connection(end_a, end_b))
    }

    /// Link two components on their first free pins
    pub fn link(&mut self, a: ComponentId, b: ComponentId) -> TopologyResult<ConnectionId> {
        self.component(a)?;
        self.component(b)?;
        if a == b {
            return Err(TopologyError::SelfConnection(a));
        }
        self.check_compatible(a, b)?;
        let pin_a = self.free_pin(a)?.ok_or(TopologyError::NoFreePin(a))?;
        let pin_b = self.free_pin(b)?.ok_or(TopologyError::NoFreePin(b))?;
        self.connect(a, pin_a, b, pin_b)
    }

    /// Remove a connection, freeing both pins
    pub fn disconnect(&mut self, id: ConnectionId) -> TopologyResult<Connection> {
        let connection = self
            .drop_connection(id)
            .ok_or(TopologyError::UnknownConnection(id))?;
        debug!(connection = %id, "Disconnected");
        Ok(connection)
    }

    /// Activate or clear a fault; returns whether anything changed
    pub fn set_fault(
        &mut self,
        id: ComponentId,
        problem: ComponentProblem,
        active: bool,
    ) -> TopologyResult<bool> {
        let component = self.component_mut(id)?;
        let changed = component.faults.set(problem, active);
        if changed {
            debug!(component = %id, %problem, active, "Fault toggled");
        }
        Ok(changed)
    }

    /// Replace the rule set of a firewall
    pub fn set_firewall_rules(&mut self, id: ComponentId, rules: Vec<FirewallRule>) -> TopologyResult<()> {
        let component = self.component_mut(id)?;
        if component.kind != ComponentType::Firewall {
            return Err(TopologyError::NotAFirewall(id));
        }
        component.firewall_rules = rules;
        Ok(())
    }

    pub fn move_component(&mut self, id: ComponentId, center: Point) -> TopologyResult<()> {
        self.component_mut(id)?.center = center;
        Ok(())
    }

    /// Incident connections paired with the component at the far end,
    /// ordered by that component's id, then by connection id.
    ///
    /// Unknown ids have no neighbors.
    pub fn neighbors(&self, id: ComponentId) -> Vec<(&Connection, ComponentId)> {
        let mut out: Vec<(&Connection, ComponentId)> = self
            .adjacency
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|cid| self.connections.get(cid))
            .filter_map(|c| c.other(id).map(|other| (c, other)))
            .collect();
        out.sort_by_key(|(c, other)| (*other, c.id));
        out
    }

    /// Shortest path by hop count from `from` to `to`, inclusive.
    ///
    /// Breadth-first; among equally short paths the one through lower
    /// component ids wins. Cycles are fine: each component is visited once.
    pub fn shortest_path(&self, from: ComponentId, to: ComponentId) -> Option<Vec<PathStep>> {
        if !self.components.contains_key(&from) || !self.components.contains_key(&to) {
            return None;
        }

        let mut parent: BTreeMap<ComponentId, (ComponentId, ConnectionId)> = BTreeMap::new();
        let mut seen = BTreeSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            if current == to {
                break;
            }
            for (connection, next) in self.neighbors(current) {
                if seen.insert(next) {
                    parent.insert(next, (current, connection.id));
                    queue.push_back(next);
                }
            }
        }

        if !seen.contains(&to) {
            return None;
        }

        let mut path = Vec::new();
        let mut cursor = to;
        while let Some((prev, via)) = parent.get(&cursor) {
            path.push((cursor, Some(*via)));
            cursor = *prev;
        }
        path.push((from, None));
        path.reverse();
        Some(path)
    }

    pub fn component(&self, id: ComponentId) -> TopologyResult<&NetworkComponent> {
        self.components
            .get(&id)
            .ok_or(TopologyError::UnknownComponent(id))
    }

    fn component_mut(&mut self, id: ComponentId) -> TopologyResult<&mut NetworkComponent> {
        self.components
            .get_mut(&id)
            .ok_or(TopologyError::UnknownComponent(id))
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    /// All components in id order
    pub fn components(&self) -> impl Iterator<Item = &NetworkComponent> {
        self.components.values()
    }

    /// All connections in id order
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn connection(&self, id: ConnectionId) -> TopologyResult<&Connection> {
        self.connections
            .get(&id)
            .ok_or(TopologyError::UnknownConnection(id))
    }

    pub fn active_faults(&self, id: ComponentId) -> TopologyResult<&ActiveFaults> {
        Ok(&self.component(id)?.faults)
    }

    /// Capabilities of a component under its current faults
    pub fn capabilities(&self, id: ComponentId) -> TopologyResult<Vec<Capability>> {
        Ok(self.component(id)?.capabilities())
    }

    pub fn pin_position(&self, id: ComponentId, pin: ConnectionPoint) -> TopologyResult<Point> {
        let component = self.component(id)?;
        if !component.kind.has_pin(pin) {
            return Err(TopologyError::InvalidPin {
                component: id,
                kind: component.kind,
                pin,
            });
        }
        Ok(component.pin_position(pin))
    }

    /// Logical coordinates of both ends of a connection
    pub fn connection_endpoints(&self, id: ConnectionId) -> TopologyResult<(Point, Point)> {
        let connection = self.connection(id)?;
        let a = self.component(connection.a.component)?.pin_position(connection.a.pin);
        let b = self.component(connection.b.component)?.pin_position(connection.b.pin);
        Ok((a, b))
    }

    /// Components whose center lies inside the coverage area of `id`.
    ///
    /// Empty for types without a coverage zone.
    pub fn covered_by(&self, id: ComponentId) -> TopologyResult<Vec<ComponentId>> {
        let Some(zone) = self.component(id)?.coverage_bounds() else {
            return Ok(Vec::new());
        };
        Ok(self
            .components
            .values()
            .filter(|c| c.id != id && zone.contains(c.center))
            .map(|c| c.id)
            .collect())
    }

    /// First component with the given name, in id order
    pub fn find_by_name(&self, name: &str) -> Option<ComponentId> {
        self.components.values().find(|c| c.name == name).map(|c| c.id)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// First pin of `id` not carrying a connection, in pin order
    pub fn free_pin(&self, id: ComponentId) -> TopologyResult<Option<ConnectionPoint>> {
        let component = self.component(id)?;
        Ok(component.kind.pins().iter().copied().find(|pin| {
            !self.occupied.contains_key(&Endpoint {
                component: id,
                pin: *pin,
            })
        }))
    }

    /// Serializable view of the whole graph
    pub fn snapshot(&self) -> TopologySnapshot {
        TopologySnapshot {
            components: self
                .components
                .values()
                .map(|c| ComponentSnapshot {
                    id: c.id,
                    name: c.name.clone(),
                    kind: c.kind,
                    center: c.center,
                    faults: c.faults.iter().collect(),
                    firewall_rules: c.firewall_rules.clone(),
                })
                .collect(),
            connections: self.connections.values().cloned().collect(),
        }
    }

    /// Text rendering of the graph
    pub fn visualize(&self) -> String {
        let mut output = String::new();
        output.push_str("Topology:\n");
        output.push_str(&format!("  Components: {}\n", self.component_count()));
        output.push_str(&format!("  Connections: {}\n\n", self.connection_count()));

        for component in self.components.values() {
            let links: Vec<String> = self
                .neighbors(component.id)
                .iter()
                .map(|(c, other)| {
                    let pin = c.endpoint_of(component.id).map(|e| e.pin.to_string()).unwrap_or_default();
                    format!("{}@{}", other, pin)
                })
                .collect();
            let faults: Vec<String> = component.faults.iter().map(|p| p.to_string()).collect();
            output.push_str(&format!("  {} -> [{}]", component, links.join(", ")));
            if !faults.is_empty() {
                output.push_str(&format!(" faults: {}", faults.join(", ")));
            }
            output.push('\n');
        }
        output
    }

    fn check_compatible(&self, a: ComponentId, b: ComponentId) -> TopologyResult<()> {
        let ca = self.component(a)?;
        let cb = self.component(b)?;
        if ca.logic.can_connect(cb.kind) && cb.logic.can_connect(ca.kind) {
            Ok(())
        } else {
            Err(TopologyError::IncompatibleTypes {
                a: ca.kind,
                b: cb.kind,
            })
        }
    }

    fn insert_connection(&mut self, a: Endpoint, b: Endpoint) -> ConnectionId {
        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;

        self.occupied.insert(a, id);
        self.occupied.insert(b, id);
        self.adjacency.entry(a.component).or_default().insert(id);
        self.adjacency.entry(b.component).or_default().insert(id);
        self.connections.insert(id, Connection { id, a, b });
        debug!(connection = %id, a = %a, b = %b, "Connected");
        id
    }

    /// Remove the edge and free its pins; adjacency of the far end is updated
    fn drop_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.remove(&id)?;
        for end in [connection.a, connection.b] {
            self.occupied.remove(&end);
            if let Some(incident) = self.adjacency.get_mut(&end.component) {
                incident.remove(&id);
            }
        }
        Some(connection)
    }
}

/// One component in a [`TopologySnapshot`]
#[derive(Debug, Clone, Serialize)]
pub struct ComponentSnapshot {
    pub id: ComponentId,
    pub name: String,
    pub kind: ComponentType,
    pub center: Point,
    pub faults: Vec<ComponentProblem>,
    pub firewall_rules: Vec<FirewallRule>,
}

/// Components with their active faults, and the connections between them
#[derive(Debug, Clone, Serialize)]
pub struct TopologySnapshot {
    pub components: Vec<ComponentSnapshot>,
    pub connections: Vec<Connection>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionPoint::*;

    #[test]
    fn test_add_assigns_fresh_ids() {
        let mut topo = Topology::new();
        let a = topo.add_component(ComponentType::Router, "r1");
        let b = topo.add_component(ComponentType::Router, "r2");
        assert_ne!(a, b);
        topo.remove_component(b);
        let c = topo.add_component(ComponentType::Router, "r3");
        assert_ne!(b, c);
        assert_eq!(topo.component_count(), 2);
    }

    #[test]
    fn test_connect_validation_order() {
        let mut topo = Topology::new();
        let m = topo.add_component(ComponentType::Mobile, "m");
        let r = topo.add_component(ComponentType::Router, "r");
        let g = topo.add_component(ComponentType::Gateway, "g");

        assert_eq!(
            topo.connect(m, Top, ComponentId(99), Top),
            Err(TopologyError::UnknownComponent(ComponentId(99)))
        );
        assert_eq!(topo.connect(r, Top, r, Bottom), Err(TopologyError::SelfConnection(r)));
        // Compatibility is judged before pin exposure
        assert_eq!(
            topo.connect(m, TopLeft, g, Bottom),
            Err(TopologyError::IncompatibleTypes {
                a: ComponentType::Mobile,
                b: ComponentType::Gateway
            })
        );
        assert_eq!(
            topo.connect(m, TopLeft, r, Right),
            Err(TopologyError::InvalidPin {
                component: m,
                kind: ComponentType::Mobile,
                pin: TopLeft
            })
        );
        assert_eq!(topo.connection_count(), 0);
    }

    #[test]
    fn test_pin_carries_one_connection() {
        let mut topo = Topology::new();
        let r = topo.add_component(ComponentType::Router, "r");
        let s1 = topo.add_component(ComponentType::Server, "s1");
        let s2 = topo.add_component(ComponentType::Server, "s2");

        topo.connect(r, Right, s1, Left).unwrap();
        assert_eq!(
            topo.connect(r, Right, s2, Left),
            Err(TopologyError::PinInUse { component: r, pin: Right })
        );
        assert_eq!(topo.connection_count(), 1);
        topo.connect(r, Bottom, s2, Left).unwrap();
    }

    #[test]
    fn test_disconnect_frees_pins() {
        let mut topo = Topology::new();
        let r = topo.add_component(ComponentType::Router, "r");
        let s = topo.add_component(ComponentType::Server, "s");
        let l = topo.connect(r, Right, s, Left).unwrap();

        topo.disconnect(l).unwrap();
        assert_eq!(topo.disconnect(l), Err(TopologyError::UnknownConnection(l)));
        assert!(topo.neighbors(r).is_empty());
        topo.connect(r, Right, s, Left).unwrap();
    }

    #[test]
    fn test_remove_cascades() {
        let mut topo = Topology::new();
        let r = topo.add_component(ComponentType::Router, "r");
        let a = topo.add_component(ComponentType::Server, "a");
        let b = topo.add_component(ComponentType::Server, "b");
        topo.link(r, a).unwrap();
        topo.link(r, b).unwrap();
        topo.link(a, b).unwrap();

        let (removed, count) = topo.remove_component(r).unwrap();
        assert_eq!(removed.id, r);
        assert_eq!(count, 2);
        assert_eq!(topo.connection_count(), 1);
        assert!(topo.connections().all(|c| !c.touches(r)));
        assert_eq!(topo.neighbors(a).len(), 1);
        assert!(topo.neighbors(a).iter().all(|(_, other)| *other != r));

        // Second removal is a no-op
        assert!(topo.remove_component(r).is_none());
        assert_eq!(topo.component_count(), 2);
    }

    #[test]
    fn test_link_exhausts_pins() {
        let mut topo = Topology::new();
        let m = topo.add_component(ComponentType::Mobile, "m");
        let routers: Vec<ComponentId> = (0..5)
            .map(|i| topo.add_component(ComponentType::Router, format!("r{}", i)))
            .collect();
        for r in &routers[..4] {
            topo.link(m, *r).unwrap();
        }
        assert_eq!(topo.link(m, routers[4]), Err(TopologyError::NoFreePin(m)));
    }

    #[test]
    fn test_neighbors_sorted_by_id() {
        let mut topo = Topology::new();
        let hub = topo.add_component(ComponentType::Router, "hub");
        let a = topo.add_component(ComponentType::Server, "a");
        let b = topo.add_component(ComponentType::Server, "b");
        let c = topo.add_component(ComponentType::Server, "c");
        topo.link(hub, c).unwrap();
        topo.link(hub, a).unwrap();
        topo.link(hub, b).unwrap();

        let order: Vec<ComponentId> = topo.neighbors(hub).iter().map(|(_, id)| *id).collect();
        assert_eq!(order, vec![a, b, c]);
        assert!(topo.neighbors(ComponentId(42)).is_empty());
    }

    #[test]
    fn test_shortest_path_tie_break() {
        // hub -> {a, b} -> target, both two hops; links made in reverse id order
        let mut topo = Topology::new();
        let hub = topo.add_component(ComponentType::Router, "hub");
        let a = topo.add_component(ComponentType::Router, "a");
        let b = topo.add_component(ComponentType::Router, "b");
        let target = topo.add_component(ComponentType::Server, "target");
        topo.link(hub, b).unwrap();
        topo.link(hub, a).unwrap();
        topo.link(b, target).unwrap();
        topo.link(a, target).unwrap();

        let path: Vec<ComponentId> = topo
            .shortest_path(hub, target)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(path, vec![hub, a, target]);
    }

    #[test]
    fn test_shortest_path_handles_cycles() {
        let mut topo = Topology::new();
        let ring: Vec<ComponentId> = (0..4)
            .map(|i| topo.add_component(ComponentType::Router, format!("r{}", i)))
            .collect();
        for i in 0..4 {
            topo.link(ring[i], ring[(i + 1) % 4]).unwrap();
        }
        let island = topo.add_component(ComponentType::Server, "island");

        assert!(topo.shortest_path(ring[0], island).is_none());
        assert_eq!(topo.shortest_path(ring[0], ring[2]).unwrap().len(), 3);
        assert_eq!(topo.shortest_path(ring[1], ring[1]).unwrap(), vec![(ring[1], None)]);
    }

    #[test]
    fn test_fault_toggle_restores_capabilities() {
        let mut topo = Topology::new();
        let g = topo.add_component(ComponentType::Gateway, "g");
        let before = topo.capabilities(g).unwrap();

        assert!(topo.set_fault(g, ComponentProblem::PowerOff, true).unwrap());
        assert!(!topo.set_fault(g, ComponentProblem::PowerOff, true).unwrap());
        assert!(topo.capabilities(g).unwrap().is_empty());

        assert!(topo.set_fault(g, ComponentProblem::PowerOff, false).unwrap());
        assert_eq!(topo.capabilities(g).unwrap(), before);
        assert_eq!(
            topo.set_fault(ComponentId(7), ComponentProblem::PowerOff, true),
            Err(TopologyError::UnknownComponent(ComponentId(7)))
        );
    }

    #[test]
    fn test_firewall_rules_only_on_firewalls() {
        let mut topo = Topology::new();
        let f = topo.add_component(ComponentType::Firewall, "f");
        let r = topo.add_component(ComponentType::Router, "r");
        topo.set_firewall_rules(f, vec![FirewallRule::deny()]).unwrap();
        assert_eq!(topo.component(f).unwrap().firewall_rules.len(), 1);
        assert_eq!(
            topo.set_firewall_rules(r, vec![]),
            Err(TopologyError::NotAFirewall(r))
        );
    }

    #[test]
    fn test_geometry_queries() {
        let mut topo = Topology::new();
        let ap = topo.add_component_at(ComponentType::AccessPoint, "ap", Point::new(0.0, 0.0));
        let near = topo.add_component_at(ComponentType::Laptop, "near", Point::new(100.0, 50.0));
        let far = topo.add_component_at(ComponentType::Laptop, "far", Point::new(500.0, 0.0));
        let l = topo.connect(ap, Right, near, Left).unwrap();

        let (a, b) = topo.connection_endpoints(l).unwrap();
        assert_eq!(a, Point::new(60.0, 0.0));
        assert_eq!(b, Point::new(40.0, 50.0));
        assert_eq!(topo.covered_by(ap).unwrap(), vec![near]);
        assert!(topo.covered_by(far).unwrap().is_empty());

        topo.move_component(far, Point::new(10.0, 10.0)).unwrap();
        assert_eq!(topo.covered_by(ap).unwrap(), vec![near, far]);
    }

    #[test]
    fn test_snapshot_lists_faults() {
        let mut topo = Topology::new();
        let r = topo.add_component(ComponentType::Router, "r");
        let s = topo.add_component(ComponentType::Server, "s");
        topo.link(r, s).unwrap();
        topo.set_fault(s, ComponentProblem::HighLatency, true).unwrap();

        let snap = topo.snapshot();
        assert_eq!(snap.components.len(), 2);
        assert_eq!(snap.connections.len(), 1);
        assert_eq!(snap.components[1].faults, vec![ComponentProblem::HighLatency]);
        assert_eq!(topo.find_by_name("s"), Some(s));
        assert!(topo.visualize().contains("faults: High Latency"));
    }
}
