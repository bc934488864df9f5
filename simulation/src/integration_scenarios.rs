//! End-to-end scenarios over the whole stack
//!
//! Registry, connectivity policy, fault catalog, topology and packet walk
//! exercised together through a [`Simulation`].

use netlab_core::{
    ComponentId, ComponentLogic, ComponentProblem, ComponentType, ConnectionPoint, DropReason,
    FirewallRule, HopAction, TopologyError,
};

use crate::simulation::{SimConfig, Simulation};
use crate::types::{HopOutcome, TraceOutcome};

fn session() -> Simulation {
    Simulation::with_config(SimConfig::seeded(42))
}

#[test]
fn test_mobile_router_gateway_trace() {
    let mut sim = session();
    let m = sim.add_component(ComponentType::Mobile, "M");
    let r = sim.add_component(ComponentType::Router, "R");
    let g = sim.add_component(ComponentType::Gateway, "G");
    sim.connect(r, ConnectionPoint::Left, m, ConnectionPoint::Top).unwrap();
    sim.connect(g, ConnectionPoint::Left, r, ConnectionPoint::Right).unwrap();

    let trace = sim.send_message(m, g, b"ping".to_vec()).unwrap();
    assert_eq!(
        trace.outcomes(),
        vec![
            (m, HopOutcome::Forwarded),
            (r, HopOutcome::PassedThrough),
            (g, HopOutcome::Delivered),
        ]
    );
    assert_eq!(trace.to_string(), "p0 [M: delivered-to-next, R: pass-through, G: delivered] (3 ms)");
    // Destination gateway keeps the original source
    assert_eq!(trace.delivered_packet.unwrap().translated_source, None);
}

#[test]
fn test_blocking_firewall_ends_trace() {
    let mut sim = session();
    let m = sim.add_component(ComponentType::Mobile, "M");
    let r1 = sim.add_component(ComponentType::Router, "R1");
    let f = sim.add_component(ComponentType::Firewall, "F");
    let r2 = sim.add_component(ComponentType::Router, "R2");
    let g = sim.add_component(ComponentType::Gateway, "G");
    for (a, b) in [(m, r1), (r1, f), (f, r2), (r2, g)] {
        sim.link(a, b).unwrap();
    }
    assert!(sim.send_message(m, g, vec![]).unwrap().is_delivered());

    sim.set_fault(f, ComponentProblem::FirewallBlockingTraffic, true).unwrap();
    let trace = sim.send_message(m, g, vec![]).unwrap();
    let last = trace.last_hop().unwrap();
    assert_eq!(last.component, f);
    assert_eq!(
        last.outcome,
        HopOutcome::Dropped(DropReason::Blocked(ComponentProblem::FirewallBlockingTraffic))
    );
    assert_eq!(trace.hops.len(), 3);
}

#[test]
fn test_firewall_rule_by_source() {
    let mut sim = session();
    let a = sim.add_component(ComponentType::Laptop, "A");
    let b = sim.add_component(ComponentType::Desktop, "B");
    let f = sim.add_component(ComponentType::Firewall, "F");
    let s = sim.add_component(ComponentType::Server, "S");
    sim.link(a, f).unwrap();
    sim.link(b, f).unwrap();
    sim.link(f, s).unwrap();
    sim.set_firewall_rules(f, vec![FirewallRule::deny().from_source(b)]).unwrap();

    assert!(sim.send_message(a, s, vec![]).unwrap().is_delivered());
    assert_eq!(
        sim.send_message(b, s, vec![]).unwrap().outcome,
        TraceOutcome::Dropped {
            at: f,
            reason: DropReason::RuleRejected
        }
    );
}

#[test]
fn test_two_mobiles_are_incompatible() {
    let mut sim = session();
    let a = sim.add_component(ComponentType::Mobile, "A");
    let b = sim.add_component(ComponentType::Mobile, "B");
    for pin_a in ConnectionPoint::ALL {
        for pin_b in ConnectionPoint::ALL {
            assert_eq!(
                sim.connect(a, pin_a, b, pin_b),
                Err(TopologyError::IncompatibleTypes {
                    a: ComponentType::Mobile,
                    b: ComponentType::Mobile
                }),
                "{} / {}",
                pin_a,
                pin_b
            );
        }
    }
    assert_eq!(sim.topology().connection_count(), 0);
}

#[test]
fn test_connect_matches_mutual_verdict_for_all_pairs() {
    for a_kind in ComponentType::all() {
        for b_kind in ComponentType::all() {
            let mut sim = session();
            let a = sim.add_component(*a_kind, "a");
            let b = sim.add_component(*b_kind, "b");
            let expected = ComponentLogic::for_type(*a_kind).can_connect(*b_kind)
                && ComponentLogic::for_type(*b_kind).can_connect(*a_kind);
            for pin_a in a_kind.pins() {
                for pin_b in b_kind.pins() {
                    match sim.connect(a, *pin_a, b, *pin_b) {
                        Ok(link) => {
                            assert!(expected, "{} -> {} linked on {}/{}", a_kind, b_kind, pin_a, pin_b);
                            sim.disconnect(link).unwrap();
                        }
                        Err(e) => {
                            assert!(!expected, "{} -> {} on {}/{}: {}", a_kind, b_kind, pin_a, pin_b, e);
                            assert!(matches!(e, TopologyError::IncompatibleTypes { .. }));
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_mobile_links_to_router_on_any_side_pin() {
    let mut sim = session();
    let m = sim.add_component(ComponentType::Mobile, "M");
    let r = sim.add_component(ComponentType::Router, "R");
    let link = sim
        .connect(m, ConnectionPoint::Left, r, ConnectionPoint::Right)
        .unwrap();
    assert_eq!(sim.topology().connection(link).unwrap().a.pin, ConnectionPoint::Left);
}

#[test]
fn test_remove_leaves_no_dangling_edges() {
    let mut sim = session();
    let hub = sim.add_component(ComponentType::Router, "hub");
    let spokes: Vec<ComponentId> = (0..4)
        .map(|i| sim.add_component(ComponentType::Server, format!("s{}", i)))
        .collect();
    for s in &spokes {
        sim.link(hub, *s).unwrap();
    }
    sim.link(spokes[0], spokes[1]).unwrap();

    sim.remove_component(hub).unwrap();
    for s in &spokes {
        assert!(sim.topology().neighbors(*s).iter().all(|(_, other)| *other != hub));
    }
    assert_eq!(sim.topology().connection_count(), 1);
    assert!(sim.remove_component(hub).is_none());

    // Freed pins can be reused by a new hub
    let hub2 = sim.add_component(ComponentType::Router, "hub2");
    for s in &spokes {
        sim.link(hub2, *s).unwrap();
    }
}

#[test]
fn test_cycle_without_path_is_unreachable() {
    let mut sim = session();
    let ring: Vec<ComponentId> = (0..3)
        .map(|i| sim.add_component(ComponentType::Router, format!("r{}", i)))
        .collect();
    sim.link(ring[0], ring[1]).unwrap();
    sim.link(ring[1], ring[2]).unwrap();
    sim.link(ring[2], ring[0]).unwrap();
    let lonely = sim.add_component(ComponentType::Cloud, "lonely");

    let trace = sim.send_message(ring[0], lonely, vec![]).unwrap();
    assert!(trace.is_unreachable());
    assert!(trace.hops.is_empty());
    assert_eq!(sim.stats.packets_unreachable, 1);
}

#[test]
fn test_disconnect_then_unreachable() {
    let mut sim = session();
    let m = sim.add_component(ComponentType::Mobile, "M");
    let ap = sim.add_component(ComponentType::AccessPoint, "AP");
    let link = sim.link(m, ap).unwrap();
    assert!(sim.send_message(m, ap, vec![]).unwrap().is_delivered());

    sim.disconnect(link).unwrap();
    assert!(sim.send_message(m, ap, vec![]).unwrap().is_unreachable());
    assert_eq!(sim.disconnect(link), Err(TopologyError::UnknownConnection(link)));
}

#[test]
fn test_gateway_translates_passing_traffic() {
    let mut sim = session();
    let laptop = sim.add_component(ComponentType::Laptop, "L");
    let router = sim.add_component(ComponentType::Router, "R");
    let gateway = sim.add_component(ComponentType::Gateway, "G");
    let isp = sim.add_component(ComponentType::Isp, "ISP");
    for (a, b) in [(laptop, router), (router, gateway), (gateway, isp)] {
        sim.link(a, b).unwrap();
    }

    let trace = sim.send_message(laptop, isp, vec![]).unwrap();
    assert_eq!(trace.hops[2].actions, vec![HopAction::NatTranslated]);
    let packet = trace.delivered_packet.unwrap();
    assert_eq!(packet.translated_source, Some(gateway));
    assert_eq!(packet.effective_source(), gateway);
}

#[test]
fn test_dns_fault_only_drops_lookups() {
    let mut sim = session();
    let laptop = sim.add_component(ComponentType::Laptop, "L");
    let router = sim.add_component(ComponentType::Router, "R");
    let server = sim.add_component(ComponentType::Server, "S");
    sim.link(laptop, router).unwrap();
    sim.link(router, server).unwrap();
    sim.set_fault(router, ComponentProblem::DnsForwardingNotWorking, true).unwrap();

    assert!(sim.send_message(laptop, server, vec![]).unwrap().is_delivered());
    let lookup = sim.new_packet(laptop, server, vec![]).with_name_resolution();
    assert_eq!(
        sim.send(lookup).unwrap().outcome,
        TraceOutcome::Dropped {
            at: router,
            reason: DropReason::DnsFailure
        }
    );
}

#[test]
fn test_fault_toggle_restores_capabilities_everywhere() {
    let mut sim = session();
    for kind in ComponentType::all() {
        let id = sim.add_component(*kind, kind.label());
        let before = sim.topology().capabilities(id).unwrap();
        for problem in ComponentProblem::ALL {
            sim.set_fault(id, problem, true).unwrap();
            sim.set_fault(id, problem, true).unwrap();
            sim.set_fault(id, problem, false).unwrap();
            assert_eq!(sim.topology().capabilities(id).unwrap(), before, "{} / {}", kind, problem);
        }
    }
}

#[test]
fn test_halt_precedes_type_rules() {
    let mut sim = session();
    let m = sim.add_component(ComponentType::Mobile, "M");
    let r = sim.add_component(ComponentType::Router, "R");
    let f = sim.add_component(ComponentType::Firewall, "F");
    sim.link(m, r).unwrap();
    sim.link(r, f).unwrap();
    sim.set_fault(f, ComponentProblem::FirewallBlockingTraffic, true).unwrap();
    sim.set_fault(f, ComponentProblem::RestartInProgress, true).unwrap();

    let trace = sim.send_message(m, f, vec![]).unwrap();
    assert_eq!(
        trace.outcome,
        TraceOutcome::Dropped {
            at: f,
            reason: DropReason::Halted(ComponentProblem::RestartInProgress)
        }
    );
}
