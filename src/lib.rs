//! # ipam-core - Hierarchical IPv4 address-space management
//!
//! This library manages a three-level hierarchy of IPv4 address space with
//! best-fit CIDR allocation: top-level address pools (/0-/16) contain pools
//! (/22-/30), which contain leaf subnets (/24-/32). New pools and subnets
//! are never placed by hand; they are carved out of the free gap whose size
//! is closest to the request, centered on a network boundary, so sibling
//! allocations never overlap and fragmentation stays low.
//!
//! ## Architecture
//!
//! The library is organized into three modules:
//!
//! - `cidr`: the `Cidr` block notation type and `AddrRange` interval math
//! - `allocator`: the best-fit gap allocator, rebuilt fresh per decision
//! - `inventory`: the record hierarchy, in-memory store, utilization
//!   figures, and JSON snapshots
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ipam_core::inventory::Inventory;
//!
//! let mut inventory = Inventory::new();
//! inventory.create_address_pool("main", "10.0.0.0/16")?;
//! inventory.create_vpc("prod")?;
//! inventory.create_pool("web", "main", "prod", 24)?;
//! inventory.create_subnet("frontend", "web", "prod", 27)?;
//! inventory.save_to("inventory.json")?;
//! # Ok::<(), ipam_core::inventory::InventoryError>(())
//! ```
//!
//! ## Concurrency model
//!
//! Allocation decisions are made against an allocator rebuilt from the
//! current child list inside the same `&mut Inventory` borrow that commits
//! the result, so no allocator state is shared or cached across operations.
//! Integrations that persist records elsewhere must keep that
//! read-then-decide-then-write sequence inside one exclusion boundary.
//!
//! ## Error Handling
//!
//! Fallible operations return typed `thiserror` enums (`CidrError`,
//! `InventoryError`). Capacity exhaustion inside the allocator is an
//! `Option::None`, mapped to `InventoryError::NoSpace` at the store level;
//! nothing in the library prints or logs user-facing messages beyond the
//! `log` facade.

pub mod allocator;
pub mod cidr;
pub mod inventory;

// Re-export commonly used types
pub use allocator::RangeAllocator;
pub use cidr::{AddrRange, Cidr, CidrError};
pub use inventory::{Inventory, InventoryError};
