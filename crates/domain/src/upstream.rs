use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

pub const DEFAULT_DNS_PORT: u16 = 53;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamTransport {
    #[default]
    Udp,
    Tcp,
}

impl UpstreamTransport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "UDP",
            Self::Tcp => "TCP",
        }
    }
}

/// One upstream resolver. The position in the loaded list is its failover priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Upstream {
    pub addr: SocketAddr,
    pub transport: UpstreamTransport,
}

impl Upstream {
    pub fn new(addr: SocketAddr, transport: UpstreamTransport) -> Self {
        Self { addr, transport }
    }

    pub fn udp(addr: SocketAddr) -> Self {
        Self::new(addr, UpstreamTransport::Udp)
    }

    pub fn tcp(addr: SocketAddr) -> Self {
        Self::new(addr, UpstreamTransport::Tcp)
    }

    /// Same resolver reached over a different transport.
    pub fn with_transport(&self, transport: UpstreamTransport) -> Self {
        Self::new(self.addr, transport)
    }

    /// Parses a list-file entry.
    ///
    /// Accepted forms:
    /// - `1.1.1.1` (port and transport from the defaults)
    /// - `1.1.1.1:5353` / `[2001:db8::1]:53` (transport from the defaults)
    /// - `udp://1.1.1.1:53`, `tcp://1.1.1.1:53` (port optional)
    pub fn parse_with_defaults(
        s: &str,
        default_transport: UpstreamTransport,
        default_port: u16,
    ) -> Result<Self, String> {
        let s = s.trim();
        let (transport, rest) = if let Some(rest) = s.strip_prefix("udp://") {
            (UpstreamTransport::Udp, rest)
        } else if let Some(rest) = s.strip_prefix("tcp://") {
            (UpstreamTransport::Tcp, rest)
        } else if s.contains("://") {
            return Err(format!(
                "Unsupported upstream scheme in '{}'. Expected udp://, tcp:// or a bare address",
                s
            ));
        } else {
            (default_transport, s)
        };

        if let Ok(addr) = rest.parse::<SocketAddr>() {
            return Ok(Self::new(addr, transport));
        }
        if let Ok(ip) = rest.parse::<IpAddr>() {
            return Ok(Self::new(SocketAddr::new(ip, default_port), transport));
        }
        Err(format!("Invalid upstream address '{}'", s))
    }
}

impl FromStr for Upstream {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_defaults(s, UpstreamTransport::Udp, DEFAULT_DNS_PORT)
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.transport {
            UpstreamTransport::Udp => write!(f, "udp://{}", self.addr),
            UpstreamTransport::Tcp => write!(f, "tcp://{}", self.addr),
        }
    }
}
