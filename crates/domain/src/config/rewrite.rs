use crate::candidate_pool::DEFAULT_REPLACEMENT_COUNT;
use crate::replacement::REPLACEMENT_TTL;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RewriteConfig {
    /// How many candidate addresses replace a matched answer.
    #[serde(default = "default_replacement_count")]
    pub replacement_count: usize,

    #[serde(default = "default_replacement_ttl")]
    pub replacement_ttl: u32,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            replacement_count: default_replacement_count(),
            replacement_ttl: default_replacement_ttl(),
        }
    }
}

fn default_replacement_count() -> usize {
    DEFAULT_REPLACEMENT_COUNT
}

fn default_replacement_ttl() -> u32 {
    REPLACEMENT_TTL
}
