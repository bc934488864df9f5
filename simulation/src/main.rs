//! netlab - Network Topology Simulator
//!
//! Build small networks from typed components, inject faults and watch
//! packets walk through them hop by hop.

use std::path::PathBuf;

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};

use netlab_logging::{LogConfig, NetlabSubscriberBuilder};
use netlab_simulation::{
    ComponentId, ComponentProblem, ComponentType, ConnectionId, ConnectionPoint, FirewallRule,
    Payload, Point, SimConfig, Simulation, scenarios,
};

#[derive(Parser)]
#[command(
    name = "netlab",
    about = "Network topology simulator with fault injection and packet traces",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON instead of pretty text
    #[arg(long, global = true)]
    json_logs: bool,

    /// Also write JSON logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Simulation config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed the simulator RNG
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List component types with their category, pins and capabilities
    Types,

    /// List the fault catalog
    Problems,

    /// Run a pre-built scenario
    Scenario {
        #[arg(value_parser = clap::builder::PossibleValuesParser::new(scenarios::SCENARIOS))]
        name: String,
    },

    /// Interactive simulation mode
    Interactive,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = NetlabSubscriberBuilder::new()
        .with_config(LogConfig::from_flags(cli.verbose, cli.json_logs, cli.log_dir.clone()))
        .init()?;

    let mut config = match &cli.config {
        Some(path) => SimConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    match cli.command {
        Commands::Types => print_types(),
        Commands::Problems => print_problems(),
        Commands::Scenario { name } => {
            scenarios::run_named(&name, config).ok_or_else(|| anyhow!("Unknown scenario: {}", name))?;
        }
        Commands::Interactive => run_interactive(config)?,
    }

    Ok(())
}

fn print_types() {
    for ty in ComponentType::all() {
        let pins: Vec<String> = ty.pins().iter().map(|p| p.to_string()).collect();
        let caps: Vec<&str> = ty.capabilities().iter().map(|c| c.name).collect();
        println!("{:<14} {:<15} pins: {}", ty.label(), ty.category().to_string(), pins.join(" "));
        println!("{:<14} capabilities: {}", "", caps.join(", "));
        if let Some(zone) = ty.coverage_zone() {
            println!("{:<14} coverage: {} x {}", "", zone.width, zone.height);
        }
    }
}

fn print_problems() {
    for problem in ComponentProblem::ALL {
        println!("{:<28} {}", problem.name(), problem.description());
    }
}

const HELP: &str = "\
Commands:
  add <type> <name> [x y]              - Add a component (e.g. 'add router r1')
  remove <c>                           - Remove a component and its links
  connect <a> <pin> <b> <pin>          - Link two pins (e.g. 'connect m top r1 left')
  link <a> <b>                         - Link on the first free pins
  disconnect <lN>                      - Remove a link
  fault <c> <problem> on|off           - Toggle a fault (e.g. 'fault r1 power off on')
  rule <fw> allow|deny [src=<c>] [dst=<c>] [port=<n>]
  rule <fw> clear                      - Reset a firewall's rules
  send <a> <b> [port=<n>] [dns] [cred=<token>] [message]
  caps <c>                             - Capabilities under current faults
  faults <c>                           - Active and typical faults
  coverage <c>                         - Components inside a coverage area
  ls                                   - Show the topology
  show [--json]                        - Snapshot of the topology
  stats                                - Show statistics
  events                               - Show event log
  quit                                 - Exit
Components may be given by name or id (c3).";

fn run_interactive(config: SimConfig) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let mut sim = Simulation::with_config(config);

    println!("\nInteractive mode.");
    println!("{}", HELP);
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let parts: Vec<&str> = input.split_whitespace().collect();

        if parts.is_empty() {
            continue;
        }
        if matches!(parts[0], "quit" | "exit" | "q") {
            println!("Goodbye!");
            break;
        }

        if let Err(e) = run_command(&mut sim, &parts) {
            println!("  error: {}", e);
        }
    }

    Ok(())
}

fn run_command(sim: &mut Simulation, parts: &[&str]) -> anyhow::Result<()> {
    match parts[0] {
        "help" | "?" => println!("{}", HELP),
        "add" => {
            let [_, kind, name, rest @ ..] = parts else {
                bail!("Usage: add <type> <name> [x y]");
            };
            let kind: ComponentType = kind.parse()?;
            let id = match rest {
                [x, y] => sim.add_component_at(kind, *name, Point::new(x.parse()?, y.parse()?)),
                [] => sim.add_component(kind, *name),
                _ => bail!("Usage: add <type> <name> [x y]"),
            };
            println!("  Added {}", sim.topology().component(id)?);
        }
        "remove" | "rm" => {
            let [_, c] = parts else {
                bail!("Usage: remove <component>");
            };
            let id = resolve(sim, c)?;
            match sim.remove_component(id) {
                Some(removed) => println!("  Removed {}", removed),
                None => println!("  {} was not present", id),
            }
        }
        "connect" => {
            let [_, a, pin_a, b, pin_b] = parts else {
                bail!("Usage: connect <a> <pin> <b> <pin>");
            };
            let a = resolve(sim, a)?;
            let b = resolve(sim, b)?;
            let pin_a: ConnectionPoint = pin_a.parse()?;
            let pin_b: ConnectionPoint = pin_b.parse()?;
            let link = sim.connect(a, pin_a, b, pin_b)?;
            println!("  {}", sim.topology().connection(link)?);
        }
        "link" => {
            let [_, a, b] = parts else {
                bail!("Usage: link <a> <b>");
            };
            let a = resolve(sim, a)?;
            let b = resolve(sim, b)?;
            let link = sim.link(a, b)?;
            println!("  {}", sim.topology().connection(link)?);
        }
        "disconnect" => {
            let [_, l] = parts else {
                bail!("Usage: disconnect <lN>");
            };
            let id = ConnectionId(l.trim_start_matches('l').parse().context("connection id")?);
            let removed = sim.disconnect(id)?;
            println!("  Removed {}", removed);
        }
        "fault" => {
            let [_, c, problem @ .., state] = parts else {
                bail!("Usage: fault <component> <problem> on|off");
            };
            let active = match *state {
                "on" => true,
                "off" => false,
                _ => bail!("Expected on or off, got {}", state),
            };
            let id = resolve(sim, c)?;
            let problem: ComponentProblem = problem.join(" ").parse()?;
            let changed = sim.set_fault(id, problem, active)?;
            println!(
                "  {} {} on {}{}",
                problem,
                if active { "active" } else { "cleared" },
                id,
                if changed { "" } else { " (unchanged)" }
            );
        }
        "rule" => {
            let [_, fw, action, matchers @ ..] = parts else {
                bail!("Usage: rule <firewall> allow|deny|clear [src=<c>] [dst=<c>] [port=<n>]");
            };
            let id = resolve(sim, fw)?;
            if *action == "clear" {
                sim.set_firewall_rules(id, Vec::new())?;
                println!("  Rules cleared on {}", id);
                return Ok(());
            }
            let mut rule = match *action {
                "allow" => FirewallRule::allow(),
                "deny" => FirewallRule::deny(),
                _ => bail!("Expected allow, deny or clear, got {}", action),
            };
            for matcher in matchers {
                rule = match matcher.split_once('=') {
                    Some(("src", c)) => rule.from_source(resolve(sim, c)?),
                    Some(("dst", c)) => rule.to_destination(resolve(sim, c)?),
                    Some(("port", p)) => rule.on_port(p.parse()?),
                    _ => bail!("Unknown matcher: {}", matcher),
                };
            }
            let mut rules = sim.topology().component(id)?.firewall_rules.clone();
            rules.push(rule);
            sim.set_firewall_rules(id, rules)?;
            println!("  {} rule(s) on {}", sim.topology().component(id)?.firewall_rules.len(), id);
        }
        "send" => {
            let [_, from, to, rest @ ..] = parts else {
                bail!("Usage: send <from> <to> [port=<n>] [dns] [cred=<token>] [message]");
            };
            let from = resolve(sim, from)?;
            let to = resolve(sim, to)?;
            let mut words = Vec::new();
            let mut packet = sim.new_packet(from, to, Vec::new());
            for token in rest {
                if let Some(port) = token.strip_prefix("port=") {
                    packet = packet.with_port(port.parse()?);
                } else if let Some(cred) = token.strip_prefix("cred=") {
                    packet = packet.with_credential(cred);
                } else if *token == "dns" {
                    packet = packet.with_name_resolution();
                } else {
                    words.push(*token);
                }
            }
            packet.payload = Payload::Plain(words.join(" ").into_bytes());
            let trace = sim.send(packet)?;
            scenarios::print_trace(&trace);
        }
        "caps" => {
            let [_, c] = parts else {
                bail!("Usage: caps <component>");
            };
            let id = resolve(sim, c)?;
            for cap in sim.topology().capabilities(id)? {
                println!("  {:<18} {}", cap.name, cap.description);
            }
        }
        "faults" => {
            let [_, c] = parts else {
                bail!("Usage: faults <component>");
            };
            let id = resolve(sim, c)?;
            let component = sim.topology().component(id)?;
            let active: Vec<String> = component.faults.iter().map(|p| p.to_string()).collect();
            let typical: Vec<&str> = component.kind.available_problems().iter().map(|p| p.name()).collect();
            println!("  active:  [{}]", active.join(", "));
            println!("  typical: [{}]", typical.join(", "));
        }
        "coverage" => {
            let [_, c] = parts else {
                bail!("Usage: coverage <component>");
            };
            let id = resolve(sim, c)?;
            let covered: Vec<String> = sim.topology().covered_by(id)?.iter().map(|c| c.to_string()).collect();
            println!("  [{}]", covered.join(", "));
        }
        "ls" | "status" => {
            println!("{}", sim.topology().visualize());
            println!("  {}", sim.state_summary());
        }
        "show" => {
            let snapshot = sim.topology().snapshot();
            if parts.get(1) == Some(&"--json") {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                for c in &snapshot.components {
                    println!("  {} {} ({}) at ({}, {}) faults: {:?}", c.id, c.name, c.kind, c.center.x, c.center.y, c.faults);
                }
                for l in &snapshot.connections {
                    println!("  {}", l);
                }
            }
        }
        "stats" => {
            let stats = &sim.stats;
            println!("  Packets sent: {}", stats.packets_sent);
            println!("  Packets delivered: {}", stats.packets_delivered);
            println!("  Packets dropped: {}", stats.packets_dropped);
            println!("  Packets unreachable: {}", stats.packets_unreachable);
            println!("  Total hops: {}", stats.total_hops);
            println!("  Delivery rate: {:.1}%", stats.delivery_rate() * 100.0);
            println!("  Average latency: {:.1} ms", stats.average_latency_ms());
        }
        "events" => {
            println!("  Event log ({} events):", sim.event_log.len());
            for event in sim.event_log.iter().rev().take(20) {
                println!("    {:?}", event);
            }
            if sim.event_log.len() > 20 {
                println!("    ... ({} more)", sim.event_log.len() - 20);
            }
        }
        other => println!("  Unknown command: {} (try 'help')", other),
    }
    Ok(())
}

/// Accept a component name, `cN`, or a bare id
fn resolve(sim: &Simulation, token: &str) -> anyhow::Result<ComponentId> {
    if let Some(id) = sim.topology().find_by_name(token) {
        return Ok(id);
    }
    let id = token
        .strip_prefix('c')
        .unwrap_or(token)
        .parse()
        .map(ComponentId)
        .map_err(|_| anyhow!("Unknown component: {}", token))?;
    sim.topology().component(id)?;
    Ok(id)
}
