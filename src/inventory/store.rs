//! In-memory inventory store with best-fit allocation at both levels.
//!
//! The store owns all four record collections and is the mutual-exclusion
//! boundary around allocation: every operation that decides where a new
//! child goes rebuilds a fresh [`RangeAllocator`] from the parent's current
//! children, decides, and records the result, all under one `&mut self`
//! borrow. No allocator state survives between operations.
//!
//! Snapshots persist the whole inventory as a single JSON document.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::allocator::RangeAllocator;
use crate::cidr::{Cidr, CidrError};
use crate::inventory::records::{AddressPool, Pool, Subnet, Vpc};

/// Inventory operation errors
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error(transparent)]
    Cidr(#[from] CidrError),
    #[error("address pool '{0}' not found")]
    AddressPoolNotFound(String),
    #[error("VPC '{0}' not found")]
    VpcNotFound(String),
    #[error("pool '{0}' not found")]
    PoolNotFound(String),
    #[error("subnet '{0}' not found")]
    SubnetNotFound(String),
    #[error("address pool '{0}' already exists")]
    AddressPoolExists(String),
    #[error("VPC '{0}' already exists")]
    VpcExists(String),
    #[error("pool '{name}' already exists in address pool '{address_pool}'")]
    PoolExists { name: String, address_pool: String },
    #[error("subnet '{name}' already exists in pool '{pool}'")]
    SubnetExists { name: String, pool: String },
    #[error("address pool prefix must be /16 or shorter, got /{0}")]
    AddressPoolPrefixOutOfRange(u8),
    #[error("pool prefix must be /22-/30, got /{0}")]
    PoolPrefixOutOfRange(u8),
    #[error("subnet prefix must be /24-/32, got /{0}")]
    SubnetPrefixOutOfRange(u8),
    #[error("VPC mismatch: pool '{pool}' belongs to '{expected}', not '{requested}'")]
    VpcMismatch {
        pool: String,
        expected: String,
        requested: String,
    },
    #[error("cannot delete address pool '{name}': {pool_count} pools exist")]
    AddressPoolNotEmpty { name: String, pool_count: usize },
    #[error("no space available in '{0}'")]
    NoSpace(String),
    #[error("snapshot I/O failed: {0}")]
    SnapshotIo(#[from] std::io::Error),
    #[error("snapshot is not valid JSON: {0}")]
    SnapshotFormat(#[from] serde_json::Error),
}

/// Per-pool utilization figures: address usage by subnets.
#[derive(Debug, Clone, Serialize)]
pub struct PoolUtilization {
    pub name: String,
    pub cidr: Cidr,
    pub vpc: String,
    pub subnet_count: usize,
    pub total_addresses: u64,
    pub used_addresses: u64,
}

/// Per-address-pool utilization figures: /24-equivalent slot usage by pools.
#[derive(Debug, Clone, Serialize)]
pub struct AddressPoolUtilization {
    pub name: String,
    pub cidr: Cidr,
    pub pool_slots: u64,
    pub pool_count: usize,
    pub pools: Vec<PoolUtilization>,
}

/// The complete IPAM inventory: address pools, VPCs, pools, and subnets.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    address_pools: Vec<AddressPool>,
    #[serde(default)]
    vpcs: Vec<Vpc>,
    #[serde(default)]
    pools: Vec<Pool>,
    #[serde(default)]
    subnets: Vec<Subnet>,
}

impl Inventory {
    pub fn new() -> Self {
        Inventory::default()
    }

    // ---- record access ----

    pub fn address_pools(&self) -> &[AddressPool] {
        &self.address_pools
    }

    pub fn vpcs(&self) -> &[Vpc] {
        &self.vpcs
    }

    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    /// Pools belonging to one address pool.
    pub fn pools_in<'a>(&'a self, address_pool: &'a str) -> impl Iterator<Item = &'a Pool> + 'a {
        self.pools
            .iter()
            .filter(move |p| p.address_pool == address_pool)
    }

    /// Subnets belonging to one pool.
    pub fn subnets_in<'a>(&'a self, pool: &'a str) -> impl Iterator<Item = &'a Subnet> + 'a {
        self.subnets.iter().filter(move |s| s.pool == pool)
    }

    fn find_address_pool(&self, name: &str) -> Result<&AddressPool, InventoryError> {
        self.address_pools
            .iter()
            .find(|ap| ap.name == name)
            .ok_or_else(|| InventoryError::AddressPoolNotFound(name.to_string()))
    }

    fn find_pool(&self, name: &str) -> Result<&Pool, InventoryError> {
        self.pools
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| InventoryError::PoolNotFound(name.to_string()))
    }

    fn require_vpc(&self, name: &str) -> Result<(), InventoryError> {
        if self.vpcs.iter().any(|v| v.name == name) {
            Ok(())
        } else {
            Err(InventoryError::VpcNotFound(name.to_string()))
        }
    }

    // ---- allocator factories ----

    /// Fresh allocator over an address pool and all of its current pools.
    ///
    /// Rebuilt on every call; never cached across operations.
    fn address_pool_allocator(&self, name: &str) -> Result<RangeAllocator, InventoryError> {
        let parent = self.find_address_pool(name)?.cidr;
        let children = self.pools_in(name).map(|p| p.cidr);
        log::debug!("rebuilding allocator for address pool '{}'", name);
        Ok(RangeAllocator::from_children(parent, children))
    }

    /// Fresh allocator over a pool and all of its current subnets.
    fn pool_allocator(&self, name: &str) -> Result<RangeAllocator, InventoryError> {
        let parent = self.find_pool(name)?.cidr;
        let children = self.subnets_in(name).map(|s| s.cidr);
        log::debug!("rebuilding allocator for pool '{}'", name);
        Ok(RangeAllocator::from_children(parent, children))
    }

    // ---- creation ----

    /// Create a top-level address pool from an explicit CIDR.
    pub fn create_address_pool(
        &mut self,
        name: &str,
        cidr: &str,
    ) -> Result<&AddressPool, InventoryError> {
        let cidr: Cidr = cidr.parse()?;
        if cidr.prefix() > AddressPool::MAX_PREFIX {
            return Err(InventoryError::AddressPoolPrefixOutOfRange(cidr.prefix()));
        }
        if self.address_pools.iter().any(|ap| ap.name == name) {
            return Err(InventoryError::AddressPoolExists(name.to_string()));
        }

        let idx = self.address_pools.len();
        self.address_pools.push(AddressPool {
            name: name.to_string(),
            cidr,
        });
        log::info!("created address pool '{}' ({})", name, cidr);
        Ok(&self.address_pools[idx])
    }

    /// Create a VPC grouping.
    pub fn create_vpc(&mut self, name: &str) -> Result<&Vpc, InventoryError> {
        if self.vpcs.iter().any(|v| v.name == name) {
            return Err(InventoryError::VpcExists(name.to_string()));
        }
        let idx = self.vpcs.len();
        self.vpcs.push(Vpc {
            name: name.to_string(),
        });
        log::info!("created VPC '{}'", name);
        Ok(&self.vpcs[idx])
    }

    /// Create a pool inside an address pool, best-fit allocated.
    pub fn create_pool(
        &mut self,
        name: &str,
        address_pool: &str,
        vpc: &str,
        prefix_length: u8,
    ) -> Result<&Pool, InventoryError> {
        if !(Pool::MIN_PREFIX..=Pool::MAX_PREFIX).contains(&prefix_length) {
            return Err(InventoryError::PoolPrefixOutOfRange(prefix_length));
        }
        self.require_vpc(vpc)?;
        if self
            .pools_in(address_pool)
            .any(|p| p.name == name)
        {
            return Err(InventoryError::PoolExists {
                name: name.to_string(),
                address_pool: address_pool.to_string(),
            });
        }

        let mut allocator = self.address_pool_allocator(address_pool)?;
        let cidr = allocator
            .find_best_fit(prefix_length)
            .ok_or_else(|| InventoryError::NoSpace(address_pool.to_string()))?;

        let idx = self.pools.len();
        self.pools.push(Pool {
            name: name.to_string(),
            cidr,
            address_pool: address_pool.to_string(),
            vpc: vpc.to_string(),
        });
        log::info!(
            "allocated pool '{}' ({}) in address pool '{}' for VPC '{}'",
            name,
            cidr,
            address_pool,
            vpc
        );
        Ok(&self.pools[idx])
    }

    /// Create a subnet inside a pool, best-fit allocated. The subnet's VPC
    /// must match its pool's VPC.
    pub fn create_subnet(
        &mut self,
        name: &str,
        pool: &str,
        vpc: &str,
        prefix_length: u8,
    ) -> Result<&Subnet, InventoryError> {
        if !(Subnet::MIN_PREFIX..=Subnet::MAX_PREFIX).contains(&prefix_length) {
            return Err(InventoryError::SubnetPrefixOutOfRange(prefix_length));
        }
        self.require_vpc(vpc)?;
        let parent = self.find_pool(pool)?;
        if parent.vpc != vpc {
            return Err(InventoryError::VpcMismatch {
                pool: pool.to_string(),
                expected: parent.vpc.clone(),
                requested: vpc.to_string(),
            });
        }
        if self.subnets_in(pool).any(|s| s.name == name) {
            return Err(InventoryError::SubnetExists {
                name: name.to_string(),
                pool: pool.to_string(),
            });
        }

        let mut allocator = self.pool_allocator(pool)?;
        let cidr = allocator
            .find_best_fit(prefix_length)
            .ok_or_else(|| InventoryError::NoSpace(pool.to_string()))?;

        let idx = self.subnets.len();
        self.subnets.push(Subnet {
            name: name.to_string(),
            cidr,
            pool: pool.to_string(),
            vpc: vpc.to_string(),
        });
        log::info!(
            "allocated subnet '{}' ({}) in pool '{}' for VPC '{}'",
            name,
            cidr,
            pool,
            vpc
        );
        Ok(&self.subnets[idx])
    }

    // ---- availability queries ----

    /// Check whether an explicit CIDR is free inside an address pool.
    pub fn is_pool_available(
        &self,
        address_pool: &str,
        cidr: &str,
    ) -> Result<bool, InventoryError> {
        let cidr: Cidr = cidr.parse()?;
        let allocator = self.address_pool_allocator(address_pool)?;
        Ok(allocator.is_available(&cidr))
    }

    /// Check whether an explicit CIDR is free inside a pool.
    pub fn is_subnet_available(&self, pool: &str, cidr: &str) -> Result<bool, InventoryError> {
        let cidr: Cidr = cidr.parse()?;
        let allocator = self.pool_allocator(pool)?;
        Ok(allocator.is_available(&cidr))
    }

    // ---- deletion ----

    /// Delete an address pool. Refuses while child pools exist.
    pub fn delete_address_pool(&mut self, name: &str) -> Result<(), InventoryError> {
        self.find_address_pool(name)?;
        let pool_count = self.pools_in(name).count();
        if pool_count > 0 {
            return Err(InventoryError::AddressPoolNotEmpty {
                name: name.to_string(),
                pool_count,
            });
        }
        self.address_pools.retain(|ap| ap.name != name);
        log::info!("deleted address pool '{}'", name);
        Ok(())
    }

    /// Delete a VPC and every pool and subnet tagged with it.
    pub fn delete_vpc(&mut self, name: &str) -> Result<(), InventoryError> {
        self.require_vpc(name)?;
        let pools_before = self.pools.len();
        let subnets_before = self.subnets.len();
        self.subnets.retain(|s| s.vpc != name);
        self.pools.retain(|p| p.vpc != name);
        self.vpcs.retain(|v| v.name != name);
        log::info!(
            "deleted VPC '{}' ({} pools, {} subnets cascaded)",
            name,
            pools_before - self.pools.len(),
            subnets_before - self.subnets.len()
        );
        Ok(())
    }

    /// Delete a pool and every subnet inside it.
    pub fn delete_pool(&mut self, name: &str) -> Result<(), InventoryError> {
        self.find_pool(name)?;
        let subnets_before = self.subnets.len();
        self.subnets.retain(|s| s.pool != name);
        self.pools.retain(|p| p.name != name);
        log::info!(
            "deleted pool '{}' ({} subnets cascaded)",
            name,
            subnets_before - self.subnets.len()
        );
        Ok(())
    }

    /// Delete a single subnet.
    pub fn delete_subnet(&mut self, name: &str) -> Result<(), InventoryError> {
        if !self.subnets.iter().any(|s| s.name == name) {
            return Err(InventoryError::SubnetNotFound(name.to_string()));
        }
        self.subnets.retain(|s| s.name != name);
        log::info!("deleted subnet '{}'", name);
        Ok(())
    }

    // ---- reporting ----

    /// Structured utilization figures for every address pool.
    ///
    /// Address pools count their pools against /24-equivalent slots
    /// (`2^(24 - prefix)`); pools count addresses consumed by their subnets.
    pub fn utilization(&self) -> Vec<AddressPoolUtilization> {
        self.address_pools
            .iter()
            .map(|ap| {
                let pools: Vec<PoolUtilization> = self
                    .pools_in(&ap.name)
                    .map(|p| {
                        let used_addresses =
                            self.subnets_in(&p.name).map(|s| s.cidr.size()).sum();
                        PoolUtilization {
                            name: p.name.clone(),
                            cidr: p.cidr,
                            vpc: p.vpc.clone(),
                            subnet_count: self.subnets_in(&p.name).count(),
                            total_addresses: p.cidr.size(),
                            used_addresses,
                        }
                    })
                    .collect();
                AddressPoolUtilization {
                    name: ap.name.clone(),
                    cidr: ap.cidr,
                    pool_slots: 1u64 << 24u32.saturating_sub(u32::from(ap.cidr.prefix())),
                    pool_count: pools.len(),
                    pools,
                }
            })
            .collect()
    }

    // ---- snapshots ----

    /// Write the whole inventory to a JSON snapshot file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), InventoryError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("saved inventory snapshot to {:?}", path.as_ref());
        Ok(())
    }

    /// Load an inventory from a JSON snapshot file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, InventoryError> {
        let json = fs::read_to_string(path.as_ref())?;
        let inventory = serde_json::from_str(&json)?;
        log::info!("loaded inventory snapshot from {:?}", path.as_ref());
        Ok(inventory)
    }
}
