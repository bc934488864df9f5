//! Pre-defined simulation scenarios for netlab
//!
//! Each scenario builds a small topology, sends packets through it while
//! injecting faults, prints the traces and returns the session.

use tracing::info;

use netlab_core::{ComponentId, ComponentProblem, ComponentType, FirewallRule};

use crate::simulation::{SimConfig, Simulation};
use crate::types::Trace;

/// Names accepted by [`run_named`]
pub const SCENARIOS: [&str; 4] = ["home", "firewall", "secure", "loop"];

/// Run a scenario by name
pub fn run_named(name: &str, config: SimConfig) -> Option<Simulation> {
    match name {
        "home" => Some(run_home_scenario(config)),
        "firewall" => Some(run_firewall_scenario(config)),
        "secure" => Some(run_secure_scenario(config)),
        "loop" => Some(run_loop_scenario(config)),
        _ => None,
    }
}

/// Print a trace hop by hop
pub fn print_trace(trace: &Trace) {
    println!("  {}", trace);
    for hop in &trace.hops {
        let actions: Vec<String> = hop.actions.iter().map(|a| a.to_string()).collect();
        println!(
            "    {:<4} {:<14} {:<24} {:>4} ms  {}",
            hop.component.to_string(),
            hop.name,
            hop.outcome.to_string(),
            hop.latency_ms,
            actions.join(",")
        );
    }
}

fn toggle_fault(sim: &mut Simulation, id: ComponentId, problem: ComponentProblem, active: bool) {
    if let Err(e) = sim.set_fault(id, problem, active) {
        println!("  fault change failed: {}", e);
    }
}

fn send_and_print(sim: &mut Simulation, label: &str, from: ComponentId, to: ComponentId) {
    println!("\n--- {} ---", label);
    match sim.send_message(from, to, b"hello".to_vec()) {
        Ok(trace) => print_trace(&trace),
        Err(e) => println!("  error: {}", e),
    }
}

/// Home network: phone, wifi router, router, gateway, ISP, cloud.
///
/// Shows NAT at the gateway, then a powered-off router and a broken NAT.
pub fn run_home_scenario(config: SimConfig) -> Simulation {
    info!("=== Running home scenario ===");
    let mut sim = Simulation::with_config(config);

    let phone = sim.add_component(ComponentType::Mobile, "phone");
    let wifi = sim.add_component(ComponentType::WifiRouter, "wifi");
    let router = sim.add_component(ComponentType::Router, "router");
    let gateway = sim.add_component(ComponentType::Gateway, "gateway");
    let isp = sim.add_component(ComponentType::Isp, "isp");
    let cloud = sim.add_component(ComponentType::Cloud, "cloud");
    for (a, b) in [(phone, wifi), (wifi, router), (router, gateway), (gateway, isp), (isp, cloud)] {
        if let Err(e) = sim.link(a, b) {
            println!("  link failed: {}", e);
        }
    }
    println!("{}", sim.topology().visualize());

    send_and_print(&mut sim, "Step 1: phone reaches the cloud", phone, cloud);

    toggle_fault(&mut sim, router, ComponentProblem::PowerOff, true);
    send_and_print(&mut sim, "Step 2: router loses power", phone, cloud);
    toggle_fault(&mut sim, router, ComponentProblem::PowerOff, false);

    toggle_fault(&mut sim, gateway, ComponentProblem::NatNotWorking, true);
    send_and_print(&mut sim, "Step 3: gateway NAT breaks", phone, cloud);
    toggle_fault(&mut sim, gateway, ComponentProblem::NatNotWorking, false);

    toggle_fault(&mut sim, wifi, ComponentProblem::Overheating, true);
    send_and_print(&mut sim, "Step 4: wifi router overheats", phone, cloud);

    println!("\n  {}", sim.state_summary());
    sim
}

/// Office edge: phone, router, firewall, router, gateway.
///
/// Shows a blocking fault on the firewall, then a port rule.
pub fn run_firewall_scenario(config: SimConfig) -> Simulation {
    info!("=== Running firewall scenario ===");
    let mut sim = Simulation::with_config(config);

    let phone = sim.add_component(ComponentType::Mobile, "phone");
    let inner = sim.add_component(ComponentType::Router, "inner");
    let firewall = sim.add_component(ComponentType::Firewall, "firewall");
    let outer = sim.add_component(ComponentType::Router, "outer");
    let gateway = sim.add_component(ComponentType::Gateway, "gateway");
    for (a, b) in [(phone, inner), (inner, firewall), (firewall, outer), (outer, gateway)] {
        if let Err(e) = sim.link(a, b) {
            println!("  link failed: {}", e);
        }
    }
    println!("{}", sim.topology().visualize());

    send_and_print(&mut sim, "Step 1: open path", phone, gateway);

    toggle_fault(&mut sim, firewall, ComponentProblem::FirewallBlockingTraffic, true);
    send_and_print(&mut sim, "Step 2: firewall blocks all traffic", phone, gateway);
    toggle_fault(&mut sim, firewall, ComponentProblem::FirewallBlockingTraffic, false);

    if let Err(e) = sim.set_firewall_rules(firewall, vec![FirewallRule::deny().on_port(23)]) {
        println!("  rule change failed: {}", e);
    }
    println!("\n--- Step 3: telnet denied, web allowed ---");
    for port in [80, 23] {
        let packet = sim.new_packet(phone, gateway, b"request".to_vec()).with_port(port);
        match sim.send(packet) {
            Ok(trace) => {
                println!("  port {}:", port);
                print_trace(&trace);
            }
            Err(e) => println!("  error: {}", e),
        }
    }

    println!("\n  {}", sim.state_summary());
    sim
}

/// Secure channel: laptop, secure node, router, secure node, server.
///
/// Shows sealing and opening, then an intrusion that demands credentials.
pub fn run_secure_scenario(config: SimConfig) -> Simulation {
    info!("=== Running secure channel scenario ===");
    let token = config.access_token.clone();
    let mut sim = Simulation::with_config(config);

    let laptop = sim.add_component(ComponentType::Laptop, "laptop");
    let entry = sim.add_component(ComponentType::Nilternius, "entry");
    let router = sim.add_component(ComponentType::Router, "router");
    let exit = sim.add_component(ComponentType::Nilternius, "exit");
    let server = sim.add_component(ComponentType::Server, "server");
    for (a, b) in [(laptop, entry), (entry, router), (router, exit), (exit, server)] {
        if let Err(e) = sim.link(a, b) {
            println!("  link failed: {}", e);
        }
    }
    println!("{}", sim.topology().visualize());

    send_and_print(&mut sim, "Step 1: payload sealed across the router", laptop, server);

    toggle_fault(&mut sim, exit, ComponentProblem::UnauthorizedAccess, true);
    send_and_print(&mut sim, "Step 2: intrusion, no credential", laptop, server);

    println!("\n--- Step 3: intrusion, valid credential ---");
    let packet = sim.new_packet(laptop, server, b"hello".to_vec()).with_credential(token);
    match sim.send(packet) {
        Ok(trace) => print_trace(&trace),
        Err(e) => println!("  error: {}", e),
    }

    toggle_fault(&mut sim, exit, ComponentProblem::UnauthorizedAccess, false);
    toggle_fault(&mut sim, router, ComponentProblem::FirmwareCorruption, true);
    send_and_print(&mut sim, "Step 4: corrupting router damages the ciphertext", laptop, server);

    println!("\n  {}", sim.state_summary());
    sim
}

/// A ring of routers with an isolated server.
///
/// Cycles never trap the walk; a missing path yields an unreachable trace.
pub fn run_loop_scenario(config: SimConfig) -> Simulation {
    info!("=== Running loop scenario ===");
    let mut sim = Simulation::with_config(config);

    let ring: Vec<_> = (0..5)
        .map(|i| sim.add_component(ComponentType::Router, format!("r{}", i)))
        .collect();
    for i in 0..ring.len() {
        if let Err(e) = sim.link(ring[i], ring[(i + 1) % ring.len()]) {
            println!("  link failed: {}", e);
        }
    }
    let island = sim.add_component(ComponentType::Server, "island");
    println!("{}", sim.topology().visualize());

    send_and_print(&mut sim, "Step 1: across the ring", ring[0], ring[3]);
    send_and_print(&mut sim, "Step 2: to the island", ring[0], island);

    toggle_fault(&mut sim, ring[4], ComponentProblem::InterfaceDown, true);
    send_and_print(&mut sim, "Step 3: shortest path runs through a dead interface", ring[0], ring[3]);

    println!("\n  {}", sim.state_summary());
    sim
}
