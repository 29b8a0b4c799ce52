use serde::{Deserialize, Serialize};
use std::fmt;

/// Record types the relay knows by name. Anything else is relayed by numeric code only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    A,
    NS,
    CNAME,
    SOA,
    PTR,
    MX,
    TXT,
    AAAA,
    SRV,
    DS,
    DNSKEY,
    CAA,
}

const RECORD_TYPE_TABLE: [(RecordType, u16, &str); 12] = [
    (RecordType::A, 1, "A"),
    (RecordType::NS, 2, "NS"),
    (RecordType::CNAME, 5, "CNAME"),
    (RecordType::SOA, 6, "SOA"),
    (RecordType::PTR, 12, "PTR"),
    (RecordType::MX, 15, "MX"),
    (RecordType::TXT, 16, "TXT"),
    (RecordType::AAAA, 28, "AAAA"),
    (RecordType::SRV, 33, "SRV"),
    (RecordType::DS, 43, "DS"),
    (RecordType::DNSKEY, 48, "DNSKEY"),
    (RecordType::CAA, 257, "CAA"),
];

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::NS => "NS",
            RecordType::CNAME => "CNAME",
            RecordType::SOA => "SOA",
            RecordType::PTR => "PTR",
            RecordType::MX => "MX",
            RecordType::TXT => "TXT",
            RecordType::AAAA => "AAAA",
            RecordType::SRV => "SRV",
            RecordType::DS => "DS",
            RecordType::DNSKEY => "DNSKEY",
            RecordType::CAA => "CAA",
        }
    }

    pub fn to_u16(&self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::PTR => 12,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
            RecordType::SRV => 33,
            RecordType::DS => 43,
            RecordType::DNSKEY => 48,
            RecordType::CAA => 257,
        }
    }

    /// Maps a wire type code through the table; unknown codes yield `None`.
    pub fn from_u16(code: u16) -> Option<Self> {
        RECORD_TYPE_TABLE
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(rt, _, _)| *rt)
    }

    /// Only address records are candidates for answer replacement.
    pub fn is_rewritable(&self) -> bool {
        matches!(self, RecordType::A | RecordType::AAAA)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
