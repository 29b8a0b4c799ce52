//! CIDR / literal membership tests for IPv4 and IPv6 range sets.
//!
//! Addresses are reduced to plain integers (`u32` widened to `u128` for IPv4,
//! `u128` for IPv6) so a single entry type serves both families. A set is
//! bound to one family at construction and never mixes them.

use crate::DomainError;
use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    pub fn bits(&self) -> u8 {
        match self {
            AddressFamily::V4 => 32,
            AddressFamily::V6 => 128,
        }
    }

    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }

    /// Parses `address` in this family into its integer form.
    pub fn parse(&self, address: &str) -> Result<u128, DomainError> {
        match self {
            AddressFamily::V4 => parse_ipv4(address)
                .map(u128::from)
                .ok_or_else(|| DomainError::InvalidAddress(address.to_string())),
            AddressFamily::V6 => ipv6_to_bits(address),
        }
    }

    fn mask(&self, prefix_len: u8) -> u128 {
        let bits = self.bits();
        let full = match self {
            AddressFamily::V4 => u128::from(u32::MAX),
            AddressFamily::V6 => u128::MAX,
        };
        full.checked_shl(u32::from(bits - prefix_len)).unwrap_or(0) & full
    }
}

/// Parses a dotted-quad IPv4 address. Anything other than four decimal octets
/// in `0..=255` yields `None`.
pub fn parse_ipv4(address: &str) -> Option<u32> {
    let mut value: u32 = 0;
    let mut octets = 0;

    for part in address.split('.') {
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let octet: u32 = part.parse().ok()?;
        if octet > 255 {
            return None;
        }
        value = (value << 8) | octet;
        octets += 1;
    }

    (octets == 4).then_some(value)
}

pub fn format_ipv4(value: u32) -> String {
    let [a, b, c, d] = value.to_be_bytes();
    format!("{}.{}.{}.{}", a, b, c, d)
}

/// Expands an IPv6 address (with at most one `::`) into its 128-bit value.
pub fn ipv6_to_bits(address: &str) -> Result<u128, DomainError> {
    let invalid = || DomainError::InvalidAddress(address.to_string());

    let parts: Vec<&str> = address.split("::").collect();
    if parts.len() > 2 {
        return Err(invalid());
    }

    let left = hex_groups(parts[0]).ok_or_else(invalid)?;
    let right = match parts.get(1) {
        Some(tail) => hex_groups(tail).ok_or_else(invalid)?,
        None => Vec::new(),
    };

    let explicit = left.len() + right.len();
    let compressed = parts.len() == 2;
    if explicit > 8 || (!compressed && explicit != 8) || (compressed && explicit == 8) {
        return Err(invalid());
    }

    let mut value: u128 = 0;
    let zeros = std::iter::repeat("0").take(8 - explicit);
    for group in left.iter().copied().chain(zeros).chain(right.iter().copied()) {
        if group.len() > 4 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let word = u16::from_str_radix(group, 16).map_err(|_| invalid())?;
        value = (value << 16) | u128::from(word);
    }

    Ok(value)
}

/// Splits one side of a `::` into groups. A lone `:` at either end leaves an
/// empty group, which is rejected.
fn hex_groups(side: &str) -> Option<Vec<&str>> {
    if side.is_empty() {
        return Some(Vec::new());
    }
    let groups: Vec<&str> = side.split(':').collect();
    if groups.iter().any(|g| g.is_empty()) {
        return None;
    }
    Some(groups)
}

/// A single line of a range list: either one exact address or a CIDR block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpRangeEntry {
    Literal(u128),
    Cidr { base: u128, prefix_len: u8 },
}

impl IpRangeEntry {
    pub fn parse(entry: &str, family: AddressFamily) -> Result<Self, DomainError> {
        let entry = entry.trim();
        match entry.split_once('/') {
            Some((base, prefix)) => {
                let prefix_len: u8 = prefix
                    .parse()
                    .map_err(|_| DomainError::InvalidAddress(entry.to_string()))?;
                if prefix_len > family.bits() {
                    return Err(DomainError::InvalidAddress(entry.to_string()));
                }
                Ok(IpRangeEntry::Cidr {
                    base: family.parse(base)?,
                    prefix_len,
                })
            }
            None => Ok(IpRangeEntry::Literal(family.parse(entry)?)),
        }
    }

    fn matches(&self, value: u128, family: AddressFamily) -> bool {
        match *self {
            IpRangeEntry::Literal(literal) => literal == value,
            IpRangeEntry::Cidr { base, prefix_len } => {
                let mask = family.mask(prefix_len);
                value & mask == base & mask
            }
        }
    }
}

/// Immutable set of ranges for one address family, evaluated by linear scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpRangeSet {
    family: AddressFamily,
    entries: Vec<IpRangeEntry>,
}

impl IpRangeSet {
    pub fn new(family: AddressFamily, entries: Vec<IpRangeEntry>) -> Self {
        Self { family, entries }
    }

    /// Parses every entry, failing on the first malformed one.
    pub fn parse<I, S>(family: AddressFamily, entries: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|e| IpRangeEntry::parse(e.as_ref(), family))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(family, entries))
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn contains_value(&self, value: u128) -> bool {
        self.entries.iter().any(|e| e.matches(value, self.family))
    }

    /// Unparsable input is simply not a member.
    pub fn contains_ipv4(&self, address: &str) -> bool {
        if self.family != AddressFamily::V4 {
            return false;
        }
        match parse_ipv4(address) {
            Some(value) => self.contains_value(u128::from(value)),
            None => false,
        }
    }

    /// Unparsable input is reported as `InvalidAddress`; the caller decides what it means.
    pub fn contains_ipv6(&self, address: &str) -> Result<bool, DomainError> {
        let value = ipv6_to_bits(address)?;
        Ok(self.family == AddressFamily::V6 && self.contains_value(value))
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        match ip {
            IpAddr::V4(v4) if self.family == AddressFamily::V4 => {
                self.contains_value(u128::from(u32::from(v4)))
            }
            IpAddr::V6(v6) if self.family == AddressFamily::V6 => {
                self.contains_value(u128::from(v6))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    fn v4_set(entries: &[&str]) -> IpRangeSet {
        IpRangeSet::parse(AddressFamily::V4, entries).unwrap()
    }

    fn v6_set(entries: &[&str]) -> IpRangeSet {
        IpRangeSet::parse(AddressFamily::V6, entries).unwrap()
    }

    #[test]
    fn test_parse_ipv4_roundtrip() {
        for addr in ["0.0.0.0", "1.1.1.1", "104.16.0.1", "192.168.100.254", "255.255.255.255"] {
            let value = parse_ipv4(addr).unwrap();
            assert_eq!(format_ipv4(value), addr);
        }
    }

    #[test]
    fn test_parse_ipv4_rejects_malformed() {
        for addr in ["", "1.1.1", "1.1.1.1.1", "256.0.0.1", "1.1.1.-1", "a.b.c.d", "1..1.1", " 1.1.1.1"] {
            assert_eq!(parse_ipv4(addr), None, "{} should be rejected", addr);
        }
    }

    #[test]
    fn test_cdn_range_membership() {
        let set = v4_set(&["104.16.0.0/12"]);
        assert!(set.contains_ipv4("104.16.0.1"));
        assert!(set.contains_ipv4("104.31.255.255"));
        assert!(!set.contains_ipv4("104.32.0.0"));
        assert!(!set.contains_ipv4("8.8.8.8"));
    }

    #[test]
    fn test_malformed_ipv4_is_not_member() {
        let set = v4_set(&["0.0.0.0/0"]);
        assert!(!set.contains_ipv4("300.1.1.1"));
        assert!(!set.contains_ipv4("not-an-ip"));
    }

    #[test]
    fn test_prefix_zero_matches_everything() {
        let set = v4_set(&["10.0.0.0/0"]);
        for addr in ["0.0.0.0", "8.8.8.8", "255.255.255.255"] {
            assert!(set.contains_ipv4(addr));
        }
        let set = v6_set(&["2001:db8::/0"]);
        assert!(set.contains_ipv6("::").unwrap());
        assert!(set.contains_ipv6("ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff").unwrap());
    }

    #[test]
    fn test_full_prefix_matches_only_base() {
        let set = v4_set(&["1.2.3.4/32"]);
        assert!(set.contains_ipv4("1.2.3.4"));
        assert!(!set.contains_ipv4("1.2.3.5"));

        let set = v6_set(&["2606:4700::1/128"]);
        assert!(set.contains_ipv6("2606:4700::1").unwrap());
        assert!(!set.contains_ipv6("2606:4700::2").unwrap());
    }

    #[test]
    fn test_literal_entries() {
        let set = v4_set(&["9.9.9.9", "1.1.1.1"]);
        assert!(set.contains_ipv4("1.1.1.1"));
        assert!(!set.contains_ipv4("1.1.1.2"));
    }

    #[test]
    fn test_ipv6_compression_expands() {
        assert_eq!(
            ipv6_to_bits("2606:4700::1").unwrap(),
            ipv6_to_bits("2606:4700:0:0:0:0:0:1").unwrap()
        );
        let expected: Ipv6Addr = "2606:4700::1".parse().unwrap();
        assert_eq!(ipv6_to_bits("2606:4700::1").unwrap(), u128::from(expected));
        assert_eq!(ipv6_to_bits("::").unwrap(), 0);
        assert_eq!(ipv6_to_bits("::1").unwrap(), 1);
        assert_eq!(ipv6_to_bits("1::").unwrap(), 1u128 << 112);
    }

    #[test]
    fn test_ipv6_rejects_malformed() {
        for addr in [
            "1::2::3",
            "12345::1",
            "1:2:3:4:5:6:7:8:9",
            "1:2:3",
            "1:2:3:4:5:6:7:8::",
            "g::1",
            ":1:2:3:4:5:6:7:8",
            "1:2:3:4:5:6:7:8:",
            "1:::2",
            ":::",
            ":1::2",
            "1::2:",
        ] {
            assert!(
                matches!(ipv6_to_bits(addr), Err(DomainError::InvalidAddress(_))),
                "{} should be rejected",
                addr
            );
        }
    }

    #[test]
    fn test_ipv6_invalid_candidate_is_error() {
        let set = v6_set(&["2606:4700::/32"]);
        assert!(set.contains_ipv6("2606:4700:10::6816:1").unwrap());
        assert!(!set.contains_ipv6("2001:db8::1").unwrap());
        assert!(set.contains_ipv6("2606::4700::1").is_err());
    }

    #[test]
    fn test_entry_parse_rejects_bad_prefix() {
        assert!(IpRangeEntry::parse("1.1.1.0/33", AddressFamily::V4).is_err());
        assert!(IpRangeEntry::parse("1.1.1.0/x", AddressFamily::V4).is_err());
        assert!(IpRangeEntry::parse("::/129", AddressFamily::V6).is_err());
        assert!(IpRangeEntry::parse("1.1.1.0/", AddressFamily::V4).is_err());
    }

    #[test]
    fn test_typed_contains_respects_family() {
        let set = v4_set(&["1.1.1.0/24"]);
        assert!(set.contains("1.1.1.1".parse().unwrap()));
        assert!(!set.contains("::1".parse().unwrap()));

        let set = v6_set(&["2400:cb00::/32"]);
        assert!(set.contains("2400:cb00:2048::1".parse().unwrap()));
        assert!(!set.contains("1.1.1.1".parse().unwrap()));
    }
}
