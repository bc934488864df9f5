//! Firewall rule sets
//!
//! Rules are evaluated in order and the first match decides. A packet that
//! matches no rule is allowed.

use serde::{Deserialize, Serialize};

use crate::component::ComponentId;
use crate::packet::NetworkPacket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleAction {
    Allow,
    Deny,
}

/// One filtering rule; `None` matchers match anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub action: RuleAction,
    pub source: Option<ComponentId>,
    pub destination: Option<ComponentId>,
    pub port: Option<u16>,
}

impl FirewallRule {
    pub fn allow() -> Self {
        Self {
            action: RuleAction::Allow,
            source: None,
            destination: None,
            port: None,
        }
    }

    pub fn deny() -> Self {
        Self {
            action: RuleAction::Deny,
            ..Self::allow()
        }
    }

    pub fn from_source(mut self, source: ComponentId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn to_destination(mut self, destination: ComponentId) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn on_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Source matching uses the address the firewall sees, so a rule
    /// written against a client no longer matches once a gateway has
    /// translated it.
    pub fn matches(&self, packet: &NetworkPacket) -> bool {
        self.source.is_none_or(|s| s == packet.effective_source())
            && self.destination.is_none_or(|d| d == packet.destination)
            && self.port.is_none_or(|p| p == packet.port)
    }
}

/// Verdict of a rule set: the first matching rule's action, or allow
pub fn evaluate(rules: &[FirewallRule], packet: &NetworkPacket) -> RuleAction {
    rules
        .iter()
        .find(|r| r.matches(packet))
        .map(|r| r.action)
        .unwrap_or(RuleAction::Allow)
}
