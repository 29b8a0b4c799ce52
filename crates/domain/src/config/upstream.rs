use crate::upstream::{UpstreamTransport, DEFAULT_DNS_PORT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Newline-delimited list of upstream resolvers, in failover order.
    #[serde(default = "default_servers_file")]
    pub servers_file: String,

    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Extra attempts against the same upstream after its first failure.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Transport for list entries that do not name one.
    #[serde(default)]
    pub transport: UpstreamTransport,

    /// Port for list entries that do not name one.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl UpstreamConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            servers_file: default_servers_file(),
            query_timeout_ms: default_query_timeout_ms(),
            retry_count: default_retry_count(),
            transport: UpstreamTransport::Udp,
            port: default_port(),
        }
    }
}

fn default_servers_file() -> String {
    "dns-servers.list".to_string()
}

fn default_query_timeout_ms() -> u64 {
    5000
}

fn default_retry_count() -> u32 {
    2
}

fn default_port() -> u16 {
    DEFAULT_DNS_PORT
}
