use crate::RecordType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;

pub const REPLACEMENT_TTL: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum DnsClass {
    #[default]
    #[serde(rename = "IN")]
    In,
}

/// An answer record synthesized from a candidate address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReplacementAnswer {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub ttl: u32,
    #[serde(default)]
    pub class: DnsClass,
    #[serde(default)]
    pub flush: bool,
    pub data: IpAddr,
}

impl ReplacementAnswer {
    pub fn new(name: impl Into<String>, record_type: RecordType, data: IpAddr, ttl: u32) -> Self {
        Self {
            name: name.into(),
            record_type,
            ttl,
            class: DnsClass::In,
            flush: false,
            data,
        }
    }

    pub fn from_addresses(
        name: &str,
        record_type: RecordType,
        addresses: &[IpAddr],
        ttl: u32,
    ) -> Vec<Self> {
        addresses
            .iter()
            .map(|ip| Self::new(name, record_type, *ip, ttl))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheEntry {
    pub answers: Vec<ReplacementAnswer>,
    /// Unix seconds at creation.
    pub timestamp: i64,
}

/// On-disk shape of the replacement cache: one mapping per rewritable type,
/// keyed by queried name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReplacementDocument {
    #[serde(rename = "A", default)]
    pub a: BTreeMap<String, CacheEntry>,
    #[serde(rename = "AAAA", default)]
    pub aaaa: BTreeMap<String, CacheEntry>,
}

impl ReplacementDocument {
    pub fn bucket(&self, record_type: RecordType) -> Option<&BTreeMap<String, CacheEntry>> {
        match record_type {
            RecordType::A => Some(&self.a),
            RecordType::AAAA => Some(&self.aaaa),
            _ => None,
        }
    }

    pub fn bucket_mut(
        &mut self,
        record_type: RecordType,
    ) -> Option<&mut BTreeMap<String, CacheEntry>> {
        match record_type {
            RecordType::A => Some(&mut self.a),
            RecordType::AAAA => Some(&mut self.aaaa),
            _ => None,
        }
    }

    pub fn get(&self, record_type: RecordType, name: &str) -> Option<&CacheEntry> {
        self.bucket(record_type)?.get(name)
    }

    pub fn len(&self) -> usize {
        self.a.len() + self.aaaa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
