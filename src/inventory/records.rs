//! Record types for the three hierarchy levels and VPC groupings.
//!
//! Records are plain serializable values; relationships are expressed by
//! name (parent pool, VPC) rather than object references, matching how they
//! are persisted in snapshots.

use serde::{Deserialize, Serialize};

use crate::cidr::Cidr;

/// Top-level supernet (/0 to /16), e.g. `10.0.0.0/16`. Pools are carved
/// from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPool {
    pub name: String,
    pub cidr: Cidr,
}

impl AddressPool {
    /// Largest prefix length (smallest block) an address pool may have.
    pub const MAX_PREFIX: u8 = 16;

    /// Check if a CIDR is within this address pool.
    pub fn contains(&self, cidr: &Cidr) -> bool {
        self.cidr.contains(cidr)
    }
}

/// Logical grouping for pools and subnets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vpc {
    pub name: String,
}

/// Mid-level pool (/22 to /30), child of an address pool, tagged with a VPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub name: String,
    pub cidr: Cidr,
    pub address_pool: String,
    pub vpc: String,
}

impl Pool {
    pub const MIN_PREFIX: u8 = 22;
    pub const MAX_PREFIX: u8 = 30;

    /// Check if a CIDR is within this pool.
    pub fn contains(&self, cidr: &Cidr) -> bool {
        self.cidr.contains(cidr)
    }
}

/// Leaf subnet (/24 to /32), child of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub name: String,
    pub cidr: Cidr,
    pub pool: String,
    pub vpc: String,
}

impl Subnet {
    pub const MIN_PREFIX: u8 = 24;
    pub const MAX_PREFIX: u8 = 32;
}
