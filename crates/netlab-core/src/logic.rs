//! Per-type component logic
//!
//! [`ComponentLogic`] is a closed set of variants, one per
//! [`ComponentType`]. Each variant answers three questions:
//!
//! 1. **Capabilities**: what the device advertises, minus what active faults suppress
//! 2. **Connectivity**: whether it accepts a link to another type
//! 3. **Processing**: what happens to a packet passing through it
//!
//! Logic is stateless. Everything a hop depends on (active faults, firewall
//! rules, the secure channel key) arrives through a [`HopContext`].
//!
//! ## Fault precedence
//!
//! When several faults are active on one component they apply in this order,
//! and the first drop wins:
//!
//! 1. Halt faults (power off, restart, interface down), in catalog order
//! 2. Packet loss
//! 3. Type-specific rules (blocking, NAT, DNS, configuration, credentials)
//! 4. Payload corruption
//! 5. Delays, summed

use netlab_crypto::ChannelKey;
use serde::Serialize;
use tracing::trace;

use crate::capability::Capability;
use crate::component::{Category, ComponentId, ComponentType};
use crate::firewall::{self, FirewallRule, RuleAction};
use crate::packet::{NetworkPacket, Payload};
use crate::problem::{ActiveFaults, ComponentProblem, FaultEffect};

/// Per-type ruleset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentLogic {
    Mobile,
    Laptop,
    Desktop,
    Router,
    WifiRouter,
    Gateway,
    AccessPoint,
    SignalTower,
    CellTower,
    Isp,
    Server,
    Firewall,
    Nilternius,
    Cloud,
    EdgeNode,
}

/// Everything a hop needs besides the packet
pub struct HopContext<'a> {
    /// The component processing the packet
    pub component: ComponentId,
    pub faults: &'a ActiveFaults,
    /// Only consulted by firewalls
    pub firewall_rules: &'a [FirewallRule],
    /// Shared by all secure nodes of a session
    pub channel_key: &'a ChannelKey,
    /// Credential secure nodes accept while under unauthorized access
    pub access_token: &'a str,
    /// Chance that an active packet-loss fault drops this packet
    pub loss_probability: f64,
    /// Uniform sample in `[0, 1)` drawn by the caller for this hop
    pub loss_sample: f64,
}

/// Why a component dropped a packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DropReason {
    /// A halting fault stopped the component
    Halted(ComponentProblem),
    PacketLoss,
    ConfigurationLost,
    /// A blocking fault rejected all traffic
    Blocked(ComponentProblem),
    /// A firewall rule denied the packet
    RuleRejected,
    NatFailure,
    DnsFailure,
    Unauthorized,
    CryptoFailure(String),
    TtlExpired,
    LatencyBudgetExceeded,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::Halted(p) => write!(f, "halted ({})", p),
            DropReason::PacketLoss => write!(f, "packet lost"),
            DropReason::ConfigurationLost => write!(f, "configuration lost"),
            DropReason::Blocked(p) => write!(f, "blocked ({})", p),
            DropReason::RuleRejected => write!(f, "rejected by firewall rule"),
            DropReason::NatFailure => write!(f, "NAT failure"),
            DropReason::DnsFailure => write!(f, "DNS forwarding failure"),
            DropReason::Unauthorized => write!(f, "unauthorized"),
            DropReason::CryptoFailure(e) => write!(f, "crypto failure: {}", e),
            DropReason::TtlExpired => write!(f, "TTL expired"),
            DropReason::LatencyBudgetExceeded => write!(f, "latency budget exceeded"),
        }
    }
}

/// Something a component did to a packet it forwarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HopAction {
    /// Source address rewritten to the gateway
    NatTranslated,
    Sealed,
    Opened,
    Corrupted,
}

impl std::fmt::Display for HopAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HopAction::NatTranslated => write!(f, "nat"),
            HopAction::Sealed => write!(f, "sealed"),
            HopAction::Opened => write!(f, "opened"),
            HopAction::Corrupted => write!(f, "corrupted"),
        }
    }
}

/// Result of processing a packet at one component
#[derive(Debug, Clone)]
pub enum Processed {
    Forward {
        packet: NetworkPacket,
        /// Extra latency caused by faults
        delay_ms: u64,
        /// Empty for a plain pass-through
        actions: Vec<HopAction>,
    },
    Drop(DropReason),
}

impl ComponentLogic {
    pub fn for_type(ty: ComponentType) -> Self {
        match ty {
            ComponentType::Mobile => ComponentLogic::Mobile,
            ComponentType::Laptop => ComponentLogic::Laptop,
            ComponentType::Desktop => ComponentLogic::Desktop,
            ComponentType::Router => ComponentLogic::Router,
            ComponentType::WifiRouter => ComponentLogic::WifiRouter,
            ComponentType::Gateway => ComponentLogic::Gateway,
            ComponentType::AccessPoint => ComponentLogic::AccessPoint,
            ComponentType::SignalTower => ComponentLogic::SignalTower,
            ComponentType::CellTower => ComponentLogic::CellTower,
            ComponentType::Isp => ComponentLogic::Isp,
            ComponentType::Server => ComponentLogic::Server,
            ComponentType::Firewall => ComponentLogic::Firewall,
            ComponentType::Nilternius => ComponentLogic::Nilternius,
            ComponentType::Cloud => ComponentLogic::Cloud,
            ComponentType::EdgeNode => ComponentLogic::EdgeNode,
        }
    }

    pub fn component_type(self) -> ComponentType {
        match self {
            ComponentLogic::Mobile => ComponentType::Mobile,
            ComponentLogic::Laptop => ComponentType::Laptop,
            ComponentLogic::Desktop => ComponentType::Desktop,
            ComponentLogic::Router => ComponentType::Router,
            ComponentLogic::WifiRouter => ComponentType::WifiRouter,
            ComponentLogic::Gateway => ComponentType::Gateway,
            ComponentLogic::AccessPoint => ComponentType::AccessPoint,
            ComponentLogic::SignalTower => ComponentType::SignalTower,
            ComponentLogic::CellTower => ComponentType::CellTower,
            ComponentLogic::Isp => ComponentType::Isp,
            ComponentLogic::Server => ComponentType::Server,
            ComponentLogic::Firewall => ComponentType::Firewall,
            ComponentLogic::Nilternius => ComponentType::Nilternius,
            ComponentLogic::Cloud => ComponentType::Cloud,
            ComponentLogic::EdgeNode => ComponentType::EdgeNode,
        }
    }

    /// Advertised capabilities, minus those an active fault suppresses
    pub fn capabilities(self, faults: &ActiveFaults) -> Vec<Capability> {
        self.component_type()
            .capabilities()
            .into_iter()
            .filter(|c| !faults.suppresses(c.kind))
            .collect()
    }

    /// This side's verdict on a link to `other`.
    ///
    /// The topology only links two components when both sides agree.
    pub fn can_connect(self, other: ComponentType) -> bool {
        match self {
            ComponentLogic::Mobile => matches!(
                other,
                ComponentType::WifiRouter
                    | ComponentType::AccessPoint
                    | ComponentType::SignalTower
                    | ComponentType::Router
            ),
            ComponentLogic::Gateway => matches!(
                other,
                ComponentType::Router
                    | ComponentType::Gateway
                    | ComponentType::Isp
                    | ComponentType::CellTower
                    | ComponentType::Server
                    | ComponentType::Cloud
                    | ComponentType::EdgeNode
            ),
            ComponentLogic::Nilternius => {
                matches!(other.category(), Category::Client | Category::Infrastructure)
                    || other == ComponentType::Nilternius
            }
            ComponentLogic::Router => true,
            ComponentLogic::Laptop
            | ComponentLogic::Desktop
            | ComponentLogic::WifiRouter
            | ComponentLogic::AccessPoint
            | ComponentLogic::SignalTower
            | ComponentLogic::CellTower
            | ComponentLogic::Isp
            | ComponentLogic::Server
            | ComponentLogic::Firewall
            | ComponentLogic::Cloud
            | ComponentLogic::EdgeNode => true,
        }
    }

    /// Process a packet passing through this component
    pub fn process_packet(self, ctx: &HopContext<'_>, mut packet: NetworkPacket) -> Processed {
        if let Some(problem) = ctx.faults.first_with(FaultEffect::Halt) {
            return Processed::Drop(DropReason::Halted(problem));
        }

        if ctx.faults.contains(ComponentProblem::PacketLoss) && ctx.loss_sample < ctx.loss_probability {
            return Processed::Drop(DropReason::PacketLoss);
        }

        let mut actions = Vec::new();
        let specific = match self {
            ComponentLogic::Gateway => self.process_gateway(ctx, &mut packet, &mut actions),
            ComponentLogic::Router | ComponentLogic::WifiRouter => self.process_router(ctx, &packet),
            ComponentLogic::Firewall => self.process_firewall(ctx, &packet),
            ComponentLogic::Nilternius => self.process_secure(ctx, &mut packet, &mut actions),
            ComponentLogic::Mobile
            | ComponentLogic::Laptop
            | ComponentLogic::Desktop
            | ComponentLogic::AccessPoint
            | ComponentLogic::SignalTower
            | ComponentLogic::CellTower
            | ComponentLogic::Isp
            | ComponentLogic::Server
            | ComponentLogic::Cloud
            | ComponentLogic::EdgeNode => Ok(()),
        };
        if let Err(reason) = specific {
            return Processed::Drop(reason);
        }

        if ctx.faults.first_with(FaultEffect::Corrupt).is_some() {
            corrupt(&mut packet);
            actions.push(HopAction::Corrupted);
        }

        let delay_ms = ctx.faults.total_delay_ms();
        trace!(component = %ctx.component, packet = %packet.id, ?actions, delay_ms, "Processed packet");

        Processed::Forward {
            packet,
            delay_ms,
            actions,
        }
    }

    fn process_gateway(
        self,
        ctx: &HopContext<'_>,
        packet: &mut NetworkPacket,
        actions: &mut Vec<HopAction>,
    ) -> Result<(), DropReason> {
        if let Some(problem) = ctx.faults.any_blocking() {
            return Err(DropReason::Blocked(problem));
        }
        if ctx.faults.contains(ComponentProblem::NatNotWorking) {
            return Err(DropReason::NatFailure);
        }
        if ctx.faults.contains(ComponentProblem::ConfigurationLoss) {
            return Err(DropReason::ConfigurationLost);
        }
        check_dns(ctx, packet)?;

        // Only traffic passing through is translated
        if packet.source != ctx.component && packet.destination != ctx.component {
            packet.translated_source = Some(ctx.component);
            actions.push(HopAction::NatTranslated);
        }
        Ok(())
    }

    fn process_router(self, ctx: &HopContext<'_>, packet: &NetworkPacket) -> Result<(), DropReason> {
        if ctx.faults.contains(ComponentProblem::ConfigurationLoss) {
            return Err(DropReason::ConfigurationLost);
        }
        check_dns(ctx, packet)
    }

    fn process_firewall(self, ctx: &HopContext<'_>, packet: &NetworkPacket) -> Result<(), DropReason> {
        if let Some(problem) = ctx.faults.any_blocking() {
            return Err(DropReason::Blocked(problem));
        }
        if ctx.faults.contains(ComponentProblem::ConfigurationLoss) {
            return Err(DropReason::ConfigurationLost);
        }
        match firewall::evaluate(ctx.firewall_rules, packet) {
            RuleAction::Allow => Ok(()),
            RuleAction::Deny => Err(DropReason::RuleRejected),
        }
    }

    fn process_secure(
        self,
        ctx: &HopContext<'_>,
        packet: &mut NetworkPacket,
        actions: &mut Vec<HopAction>,
    ) -> Result<(), DropReason> {
        if ctx.faults.contains(ComponentProblem::UnauthorizedAccess)
            && packet.credential.as_deref() != Some(ctx.access_token)
        {
            return Err(DropReason::Unauthorized);
        }

        match &packet.payload {
            Payload::Sealed(sealed) => {
                let plain = ctx
                    .channel_key
                    .open(sealed)
                    .map_err(|e| DropReason::CryptoFailure(e.to_string()))?;
                packet.payload = Payload::Plain(plain);
                actions.push(HopAction::Opened);
            }
            Payload::Plain(plain) if packet.destination != ctx.component => {
                let sealed = ctx
                    .channel_key
                    .seal(plain)
                    .map_err(|e| DropReason::CryptoFailure(e.to_string()))?;
                packet.payload = Payload::Sealed(sealed);
                actions.push(HopAction::Sealed);
            }
            Payload::Plain(_) => {}
        }
        Ok(())
    }
}

fn check_dns(ctx: &HopContext<'_>, packet: &NetworkPacket) -> Result<(), DropReason> {
    if packet.needs_name_resolution && ctx.faults.contains(ComponentProblem::DnsForwardingNotWorking) {
        return Err(DropReason::DnsFailure);
    }
    Ok(())
}

fn corrupt(packet: &mut NetworkPacket) {
    match &mut packet.payload {
        Payload::Plain(bytes) => bytes.iter_mut().for_each(|b| *b ^= 0xff),
        Payload::Sealed(sealed) => {
            if let Some(first) = sealed.ciphertext.first_mut() {
                *first ^= 0xff;
            }
        }
    }
    packet.corrupted = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityKind;
    use crate::packet::PacketId;

    struct Fixture {
        faults: ActiveFaults,
        rules: Vec<FirewallRule>,
        key: ChannelKey,
        loss_sample: f64,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                faults: ActiveFaults::new(),
                rules: Vec::new(),
                key: ChannelKey::derive("test"),
                loss_sample: 0.99,
            }
        }

        fn with_fault(mut self, problem: ComponentProblem) -> Self {
            self.faults.set(problem, true);
            self
        }

        fn ctx(&self, component: u64) -> HopContext<'_> {
            HopContext {
                component: ComponentId(component),
                faults: &self.faults,
                firewall_rules: &self.rules,
                channel_key: &self.key,
                access_token: "token",
                loss_probability: 0.5,
                loss_sample: self.loss_sample,
            }
        }
    }

    fn packet() -> NetworkPacket {
        NetworkPacket::new(PacketId(1), ComponentId(1), ComponentId(9), b"hello".to_vec())
    }

    fn forwarded(result: Processed) -> (NetworkPacket, u64, Vec<HopAction>) {
        match result {
            Processed::Forward {
                packet,
                delay_ms,
                actions,
            } => (packet, delay_ms, actions),
            Processed::Drop(reason) => panic!("unexpected drop: {}", reason),
        }
    }

    fn dropped(result: Processed) -> DropReason {
        match result {
            Processed::Drop(reason) => reason,
            Processed::Forward { .. } => panic!("expected a drop"),
        }
    }

    #[test]
    fn test_logic_type_roundtrip() {
        for ty in ComponentType::all() {
            assert_eq!(ComponentLogic::for_type(*ty).component_type(), *ty);
        }
    }

    #[test]
    fn test_mobile_connectivity() {
        let mobile = ComponentLogic::Mobile;
        assert!(mobile.can_connect(ComponentType::Router));
        assert!(mobile.can_connect(ComponentType::WifiRouter));
        assert!(mobile.can_connect(ComponentType::AccessPoint));
        assert!(mobile.can_connect(ComponentType::SignalTower));
        assert!(!mobile.can_connect(ComponentType::Mobile));
        assert!(!mobile.can_connect(ComponentType::Gateway));
        assert!(!mobile.can_connect(ComponentType::Firewall));
    }

    #[test]
    fn test_gateway_connectivity() {
        let gateway = ComponentLogic::Gateway;
        assert!(gateway.can_connect(ComponentType::Isp));
        assert!(gateway.can_connect(ComponentType::EdgeNode));
        assert!(!gateway.can_connect(ComponentType::Mobile));
        assert!(!gateway.can_connect(ComponentType::Firewall));
    }

    #[test]
    fn test_secure_node_connectivity() {
        let node = ComponentLogic::Nilternius;
        assert!(node.can_connect(ComponentType::Laptop));
        assert!(node.can_connect(ComponentType::Server));
        assert!(node.can_connect(ComponentType::Nilternius));
        assert!(!node.can_connect(ComponentType::Firewall));
        assert!(!node.can_connect(ComponentType::Cloud));
    }

    #[test]
    fn test_router_and_defaults_accept_everything() {
        for ty in ComponentType::all() {
            assert!(ComponentLogic::Router.can_connect(*ty));
            assert!(ComponentLogic::Firewall.can_connect(*ty));
        }
    }

    #[test]
    fn test_default_pass_through() {
        let fx = Fixture::new();
        let (out, delay, actions) = forwarded(ComponentLogic::Server.process_packet(&fx.ctx(2), packet()));
        assert_eq!(out, packet());
        assert_eq!(delay, 0);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_halt_beats_everything() {
        let fx = Fixture::new()
            .with_fault(ComponentProblem::InterfaceDown)
            .with_fault(ComponentProblem::PowerOff)
            .with_fault(ComponentProblem::FirewallBlockingTraffic);
        let reason = dropped(ComponentLogic::Firewall.process_packet(&fx.ctx(2), packet()));
        assert_eq!(reason, DropReason::Halted(ComponentProblem::PowerOff));
    }

    #[test]
    fn test_packet_loss_uses_sample() {
        let mut fx = Fixture::new().with_fault(ComponentProblem::PacketLoss);
        fx.loss_sample = 0.1;
        assert_eq!(
            dropped(ComponentLogic::Router.process_packet(&fx.ctx(2), packet())),
            DropReason::PacketLoss
        );
        fx.loss_sample = 0.9;
        forwarded(ComponentLogic::Router.process_packet(&fx.ctx(2), packet()));
    }

    #[test]
    fn test_firewall_blocking_fault() {
        let fx = Fixture::new().with_fault(ComponentProblem::FirewallBlockingTraffic);
        assert_eq!(
            dropped(ComponentLogic::Firewall.process_packet(&fx.ctx(2), packet())),
            DropReason::Blocked(ComponentProblem::FirewallBlockingTraffic)
        );
    }

    #[test]
    fn test_firewall_rules() {
        let mut fx = Fixture::new();
        fx.rules = vec![FirewallRule::deny().on_port(23)];
        forwarded(ComponentLogic::Firewall.process_packet(&fx.ctx(2), packet().with_port(80)));
        assert_eq!(
            dropped(ComponentLogic::Firewall.process_packet(&fx.ctx(2), packet().with_port(23))),
            DropReason::RuleRejected
        );
    }

    #[test]
    fn test_gateway_nat() {
        let fx = Fixture::new();
        let (out, _, actions) = forwarded(ComponentLogic::Gateway.process_packet(&fx.ctx(5), packet()));
        assert_eq!(out.translated_source, Some(ComponentId(5)));
        assert_eq!(actions, vec![HopAction::NatTranslated]);

        // Destination gateway does not translate
        let (out, _, actions) = forwarded(ComponentLogic::Gateway.process_packet(&fx.ctx(9), packet()));
        assert_eq!(out.translated_source, None);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_gateway_faults() {
        let fx = Fixture::new().with_fault(ComponentProblem::NatNotWorking);
        assert_eq!(
            dropped(ComponentLogic::Gateway.process_packet(&fx.ctx(5), packet())),
            DropReason::NatFailure
        );

        let fx = Fixture::new().with_fault(ComponentProblem::FirewallBlockingTraffic);
        assert_eq!(
            dropped(ComponentLogic::Gateway.process_packet(&fx.ctx(5), packet())),
            DropReason::Blocked(ComponentProblem::FirewallBlockingTraffic)
        );
    }

    #[test]
    fn test_dns_fault_only_hits_lookups() {
        let fx = Fixture::new().with_fault(ComponentProblem::DnsForwardingNotWorking);
        forwarded(ComponentLogic::Router.process_packet(&fx.ctx(2), packet()));
        assert_eq!(
            dropped(ComponentLogic::Router.process_packet(&fx.ctx(2), packet().with_name_resolution())),
            DropReason::DnsFailure
        );
        // Non-routing devices ignore it
        forwarded(ComponentLogic::Server.process_packet(&fx.ctx(2), packet().with_name_resolution()));
    }

    #[test]
    fn test_secure_node_seals_then_opens() {
        let fx = Fixture::new();
        let (sealed, _, actions) = forwarded(ComponentLogic::Nilternius.process_packet(&fx.ctx(2), packet()));
        assert!(sealed.payload.is_sealed());
        assert_eq!(actions, vec![HopAction::Sealed]);

        let (opened, _, actions) = forwarded(ComponentLogic::Nilternius.process_packet(&fx.ctx(3), sealed));
        assert_eq!(opened.payload, Payload::Plain(b"hello".to_vec()));
        assert_eq!(actions, vec![HopAction::Opened]);
    }

    #[test]
    fn test_secure_node_unauthorized() {
        let fx = Fixture::new().with_fault(ComponentProblem::UnauthorizedAccess);
        assert_eq!(
            dropped(ComponentLogic::Nilternius.process_packet(&fx.ctx(2), packet())),
            DropReason::Unauthorized
        );
        assert_eq!(
            dropped(ComponentLogic::Nilternius.process_packet(&fx.ctx(2), packet().with_credential("wrong"))),
            DropReason::Unauthorized
        );
        forwarded(ComponentLogic::Nilternius.process_packet(&fx.ctx(2), packet().with_credential("token")));
    }

    #[test]
    fn test_corruption_and_delay() {
        let fx = Fixture::new()
            .with_fault(ComponentProblem::FirmwareCorruption)
            .with_fault(ComponentProblem::HighLatency);
        let (out, delay, actions) = forwarded(ComponentLogic::Router.process_packet(&fx.ctx(2), packet()));
        assert!(out.corrupted);
        assert_ne!(out.payload, Payload::Plain(b"hello".to_vec()));
        assert_eq!(delay, 100);
        assert_eq!(actions, vec![HopAction::Corrupted]);
    }

    #[test]
    fn test_corrupted_sealed_payload_fails_to_open() {
        let fx = Fixture::new();
        let (sealed, _, _) = forwarded(ComponentLogic::Nilternius.process_packet(&fx.ctx(2), packet()));

        let damaging = Fixture::new().with_fault(ComponentProblem::FirmwareCorruption);
        let (damaged, _, _) = forwarded(ComponentLogic::Router.process_packet(&damaging.ctx(3), sealed));

        let reason = dropped(ComponentLogic::Nilternius.process_packet(&fx.ctx(4), damaged));
        assert!(matches!(reason, DropReason::CryptoFailure(_)));
    }

    #[test]
    fn test_capabilities_filtered_and_restored() {
        let mut faults = ActiveFaults::new();
        let before = ComponentLogic::Gateway.capabilities(&faults);
        assert!(before.iter().any(|c| c.kind == CapabilityKind::Nat));

        faults.set(ComponentProblem::NatNotWorking, true);
        let during = ComponentLogic::Gateway.capabilities(&faults);
        assert!(!during.iter().any(|c| c.kind == CapabilityKind::Nat));
        assert_eq!(during.len(), before.len() - 1);

        faults.set(ComponentProblem::NatNotWorking, false);
        assert_eq!(ComponentLogic::Gateway.capabilities(&faults), before);
    }

    #[test]
    fn test_blocking_fault_keeps_firewall_listed() {
        let mut faults = ActiveFaults::new();
        faults.set(ComponentProblem::FirewallBlockingTraffic, true);
        let caps = ComponentLogic::Firewall.capabilities(&faults);
        assert!(caps.iter().any(|c| c.kind == CapabilityKind::Firewall));
    }
}
