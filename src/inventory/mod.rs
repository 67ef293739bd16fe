//! Hierarchical IPAM records and the in-memory store that owns them.
//!
//! The hierarchy has three levels of address-bearing records, each keyed by
//! name: an `AddressPool` (/0 to /16) contains `Pool`s (/22 to /30), and each
//! pool contains leaf `Subnet`s (/24 to /32). A `Vpc` is a logical grouping
//! that pools and subnets are tagged with. CIDRs for pools and subnets are
//! never chosen by the caller; they come from best-fit allocation against the
//! parent's current children.

pub mod records;
pub mod store;

// Re-export commonly used types
pub use records::{AddressPool, Pool, Subnet, Vpc};
pub use store::{AddressPoolUtilization, Inventory, InventoryError, PoolUtilization};
