//! CIDR notation parsing and address-range arithmetic.
//!
//! This module provides the two value types the rest of the crate works in:
//! [`Cidr`], a network-aligned `address/prefix` block, and [`AddrRange`], the
//! closed integer interval `[start, end]` it covers over the 32-bit IPv4
//! address space.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors produced while parsing CIDR notation
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CidrError {
    #[error("invalid CIDR '{0}': expected 'address/prefix_length'")]
    MissingPrefix(String),
    #[error("invalid address '{0}' in CIDR")]
    InvalidAddress(String),
    #[error("invalid prefix length '{0}': must be 0-32")]
    InvalidPrefix(String),
}

/// An IPv4 CIDR block: a network address plus a prefix length.
///
/// Parsing is lenient: host bits in the supplied address are masked off, so
/// `"10.0.0.5/24"` canonicalizes to `10.0.0.0/24`. The stored address is
/// therefore always a multiple of the block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cidr {
    network: u32,
    prefix: u8,
}

impl Cidr {
    /// Build a CIDR from a raw address and prefix length, masking host bits.
    pub fn new(addr: u32, prefix: u8) -> Result<Self, CidrError> {
        if prefix > 32 {
            return Err(CidrError::InvalidPrefix(prefix.to_string()));
        }
        Ok(Cidr {
            network: addr & prefix_mask(prefix),
            prefix,
        })
    }

    /// The network address (low end of the block).
    pub fn network(&self) -> u32 {
        self.network
    }

    /// The prefix length in `0..=32`.
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Number of addresses in the block (`2^(32-prefix)`).
    ///
    /// Returned as `u64` so a `/0` block does not overflow.
    pub fn size(&self) -> u64 {
        1u64 << (32 - self.prefix)
    }

    /// The highest address in the block (broadcast address).
    pub fn broadcast(&self) -> u32 {
        self.network | !prefix_mask(self.prefix)
    }

    /// The closed integer interval covered by this block.
    pub fn range(&self) -> AddrRange {
        AddrRange::new(self.network, self.broadcast())
    }

    /// True if `other` lies entirely within this block.
    pub fn contains(&self, other: &Cidr) -> bool {
        self.network <= other.network && other.broadcast() <= self.broadcast()
    }
}

impl FromStr for Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_part, prefix_part) = s
            .split_once('/')
            .ok_or_else(|| CidrError::MissingPrefix(s.to_string()))?;
        let addr: Ipv4Addr = addr_part
            .parse()
            .map_err(|_| CidrError::InvalidAddress(addr_part.to_string()))?;
        let prefix: u8 = prefix_part
            .parse()
            .map_err(|_| CidrError::InvalidPrefix(prefix_part.to_string()))?;
        Cidr::new(u32::from(addr), prefix)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", Ipv4Addr::from(self.network), self.prefix)
    }
}

impl TryFrom<String> for Cidr {
    type Error = CidrError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Cidr> for String {
    fn from(cidr: Cidr) -> String {
        cidr.to_string()
    }
}

/// Netmask for a prefix length. A `/0` mask is all zeros.
fn prefix_mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix)
    }
}

/// A closed interval `[start, end]` of 32-bit addresses.
///
/// Invariant: `start <= end`. Size arithmetic is done in `u64` so intervals
/// touching `255.255.255.255` behave correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddrRange {
    pub start: u32,
    pub end: u32,
}

impl AddrRange {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        AddrRange { start, end }
    }

    /// Number of addresses covered.
    pub fn size(&self) -> u64 {
        u64::from(self.end) - u64::from(self.start) + 1
    }

    /// True if the two intervals share at least one address.
    pub fn intersects(&self, other: &AddrRange) -> bool {
        !(self.end < other.start || self.start > other.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical() {
        let cidr: Cidr = "10.0.0.0/16".parse().unwrap();
        assert_eq!(cidr.network(), 0x0A00_0000);
        assert_eq!(cidr.prefix(), 16);
        assert_eq!(cidr.to_string(), "10.0.0.0/16");
    }

    #[test]
    fn test_parse_masks_host_bits() {
        let cidr: Cidr = "10.0.0.5/24".parse().unwrap();
        assert_eq!(cidr.to_string(), "10.0.0.0/24");
        assert_eq!(cidr.broadcast(), 0x0A00_00FF);
    }

    #[test]
    fn test_parse_rejects_missing_prefix() {
        let err = "10.0.0.0".parse::<Cidr>().unwrap_err();
        assert!(matches!(err, CidrError::MissingPrefix(_)));
    }

    #[test]
    fn test_parse_rejects_bad_address() {
        let err = "10.0.0.300/24".parse::<Cidr>().unwrap_err();
        assert!(matches!(err, CidrError::InvalidAddress(_)));
    }

    #[test]
    fn test_parse_rejects_prefix_out_of_range() {
        let err = "10.0.0.0/33".parse::<Cidr>().unwrap_err();
        assert!(matches!(err, CidrError::InvalidPrefix(_)));
    }

    #[test]
    fn test_size_of_slash_zero() {
        let cidr: Cidr = "0.0.0.0/0".parse().unwrap();
        assert_eq!(cidr.size(), 1u64 << 32);
        assert_eq!(cidr.broadcast(), u32::MAX);
    }

    #[test]
    fn test_host_route_size() {
        let cidr: Cidr = "192.168.1.7/32".parse().unwrap();
        assert_eq!(cidr.size(), 1);
        assert_eq!(cidr.network(), cidr.broadcast());
    }

    #[test]
    fn test_contains() {
        let parent: Cidr = "10.0.0.0/16".parse().unwrap();
        let child: Cidr = "10.0.42.0/24".parse().unwrap();
        let outside: Cidr = "10.1.0.0/24".parse().unwrap();
        assert!(parent.contains(&child));
        assert!(!parent.contains(&outside));
        assert!(!child.contains(&parent));
    }

    #[test]
    fn test_range_intersects() {
        let a = AddrRange::new(10, 20);
        let b = AddrRange::new(20, 30);
        let c = AddrRange::new(21, 30);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.size(), 11);
    }

    #[test]
    fn test_serde_round_trip() {
        let cidr: Cidr = "172.16.0.0/12".parse().unwrap();
        let json = serde_json::to_string(&cidr).unwrap();
        assert_eq!(json, "\"172.16.0.0/12\"");
        let back: Cidr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cidr);
    }
}
