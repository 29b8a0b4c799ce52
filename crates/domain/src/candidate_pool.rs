use crate::ip_range::AddressFamily;
use crate::DomainError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

pub const DEFAULT_REPLACEMENT_COUNT: usize = 2;

/// Operator-curated replacement addresses for one family.
///
/// The backing slice is shared and never reordered; every selection works on
/// its own copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePool {
    family: AddressFamily,
    addresses: Arc<[IpAddr]>,
}

impl CandidatePool {
    pub fn new(family: AddressFamily, addresses: Vec<IpAddr>) -> Result<Self, DomainError> {
        if let Some(foreign) = addresses.iter().find(|ip| AddressFamily::of(ip) != family) {
            return Err(DomainError::InvalidAddress(format!(
                "{} does not belong to the {:?} candidate pool",
                foreign, family
            )));
        }
        Ok(Self {
            family,
            addresses: addresses.into(),
        })
    }

    pub fn parse<I, S>(family: AddressFamily, entries: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let addresses = entries
            .into_iter()
            .map(|e| parse_candidate(e.as_ref(), family))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(family, addresses)
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub fn addresses(&self) -> &[IpAddr] {
        &self.addresses
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn select(&self, count: usize, rng: &mut fastrand::Rng) -> Vec<IpAddr> {
        select(&self.addresses, count, rng)
    }
}

pub fn parse_candidate(entry: &str, family: AddressFamily) -> Result<IpAddr, DomainError> {
    let value = family.parse(entry.trim())?;
    Ok(match family {
        AddressFamily::V4 => IpAddr::V4(Ipv4Addr::from(value as u32)),
        AddressFamily::V6 => IpAddr::V6(Ipv6Addr::from(value)),
    })
}

/// Picks up to `count` entries from `pool` without touching `pool` itself.
///
/// Pools larger than `count` are copied, Fisher–Yates shuffled and truncated.
/// Smaller pools come back whole, in their original order.
pub fn select<T: Clone>(pool: &[T], count: usize, rng: &mut fastrand::Rng) -> Vec<T> {
    if pool.len() <= count {
        return pool.to_vec();
    }

    let mut shuffled = pool.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = rng.usize(..=i);
        shuffled.swap(i, j);
    }
    shuffled.truncate(count);
    shuffled
}
