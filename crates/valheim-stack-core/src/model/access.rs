//! Inbound access rule

use serde::{Deserialize, Serialize};
use std::fmt;

/// Peer that matches every IPv4 source
pub const ANY_IPV4: &str = "0.0.0.0/0";

/// Transport protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    #[default]
    Udp,
}

impl Protocol {
    /// Parse a protocol name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tcp" => Some(Protocol::Tcp),
            "udp" => Some(Protocol::Udp),
            _ => None,
        }
    }

    /// Name used by both the security group and `docker run -p`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }

    /// Whether the protocol is connectionless
    pub fn is_connectionless(&self) -> bool {
        matches!(self, Self::Udp)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contiguous, inclusive port range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub low: u16,
    pub high: u16,
}

impl PortRange {
    pub fn new(low: u16, high: u16) -> Self {
        Self { low, high }
    }

    /// Port players connect to
    pub fn primary(&self) -> u16 {
        self.low
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.low..=self.high).contains(&port)
    }

    pub fn ports(&self) -> impl Iterator<Item = u16> {
        self.low..=self.high
    }

    /// `docker run -p` mapping publishing the range one-to-one
    pub fn publish_spec(&self, protocol: Protocol) -> String {
        format!("{self}:{self}/{protocol}")
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self::new(2456, 2458)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{}-{}", self.low, self.high)
        }
    }
}

/// The single inbound rule of the server security group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    pub peer: String,
    pub protocol: Protocol,
    pub ports: PortRange,
    pub description: String,
}

impl Default for IngressRule {
    fn default() -> Self {
        Self {
            peer: ANY_IPV4.to_string(),
            protocol: Protocol::Udp,
            ports: PortRange::default(),
            description: "Valheim game ports".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_range_members() {
        let range = PortRange::default();
        assert_eq!(range.ports().collect::<Vec<_>>(), vec![2456, 2457, 2458]);
        assert!(range.contains(2457));
        assert!(!range.contains(2459));
        assert_eq!(range.primary(), 2456);
    }

    #[test]
    fn test_publish_spec() {
        let range = PortRange::default();
        assert_eq!(
            range.publish_spec(Protocol::Udp),
            "2456-2458:2456-2458/udp"
        );
    }

    #[test]
    fn test_single_port_display() {
        assert_eq!(PortRange::new(27015, 27015).to_string(), "27015");
    }

    #[test]
    fn test_protocol_parse() {
        assert_eq!(Protocol::parse("UDP"), Some(Protocol::Udp));
        assert_eq!(Protocol::parse("tcp"), Some(Protocol::Tcp));
        assert_eq!(Protocol::parse("icmp"), None);
        assert!(Protocol::Udp.is_connectionless());
        assert!(!Protocol::Tcp.is_connectionless());
    }
}
