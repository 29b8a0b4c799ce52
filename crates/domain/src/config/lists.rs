use serde::{Deserialize, Serialize};

/// Paths of the range and candidate list files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListsConfig {
    #[serde(default = "default_cdn_ipv4")]
    pub cdn_ipv4: String,

    #[serde(default = "default_cdn_ipv6")]
    pub cdn_ipv6: String,

    #[serde(default = "default_candidates_ipv4")]
    pub candidates_ipv4: String,

    #[serde(default = "default_candidates_ipv6")]
    pub candidates_ipv6: String,
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self {
            cdn_ipv4: default_cdn_ipv4(),
            cdn_ipv6: default_cdn_ipv6(),
            candidates_ipv4: default_candidates_ipv4(),
            candidates_ipv6: default_candidates_ipv6(),
        }
    }
}

fn default_cdn_ipv4() -> String {
    "cloudflare-ipv4-list.list".to_string()
}

fn default_cdn_ipv6() -> String {
    "cloudflare-ipv6-list.list".to_string()
}

fn default_candidates_ipv4() -> String {
    "cloudflare-ipv4-cfst-list.list".to_string()
}

fn default_candidates_ipv6() -> String {
    "cloudflare-ipv6-cfst-list.list".to_string()
}
