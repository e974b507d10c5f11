//! Resource factories for the PrivX storage tier.
//!
//! Each factory takes a [`Scope`] to declare into plus the caller's network
//! and security context, and returns a handle to what it declared. The
//! factories are independent of each other and may run in any order.
//!
//! - [`database`]: PostgreSQL on RDS
//! - [`cache`]: Redis on ElastiCache
//! - [`file_system`]: EFS with mount targets

pub mod cache;
pub mod database;
pub mod file_system;

pub use cache::{cache, CacheHandle, CacheSubnetGroup};
pub use database::{database, DatabaseEngine, DatabaseHandle, Endpoint};
pub use file_system::{file_system, FileSystemHandle};

use crate::construct::Scope;
use crate::error::Result;
use crate::network::{NetworkContext, SecurityGroupRef};
use crate::secret::SecretRef;
use crate::token::Token;

/// Everything the storage tier needs from its surroundings.
#[derive(Debug, Clone)]
pub struct StorageContext {
    pub network: NetworkContext,
    pub security_group: SecurityGroupRef,
    pub secret: SecretRef,
}

/// Handles of the whole storage tier.
#[derive(Debug, Clone)]
pub struct StorageHandles {
    pub database: DatabaseHandle,
    pub cache: CacheHandle,
    pub file_system: FileSystemHandle,
}

/// Declare the database, cache and file system into one scope and export
/// their endpoints as stack outputs.
pub fn storage(scope: &mut Scope<'_>, context: &StorageContext) -> Result<StorageHandles> {
    let db = database(
        scope,
        &context.network,
        &context.security_group,
        &context.secret,
    )?;
    let redis = cache(scope, &context.network, &context.security_group)?;
    let efs = file_system(scope, &context.network, &context.security_group)?;

    scope.add_output(
        "DbEndpointAddress",
        db.endpoint().address().clone(),
        Some("PostgreSQL endpoint address"),
    )?;
    scope.add_output(
        "DbEndpointPort",
        db.endpoint().port_token().clone(),
        Some("PostgreSQL endpoint port"),
    )?;
    scope.add_output(
        "RedisEndpointAddress",
        redis.endpoint_address(),
        Some("Redis endpoint address"),
    )?;
    scope.add_output(
        "RedisEndpointPort",
        redis.endpoint_port(),
        Some("Redis endpoint port"),
    )?;
    scope.add_output(
        "FileSystemId",
        efs.file_system_id(),
        Some("EFS file system id"),
    )?;

    Ok(StorageHandles {
        database: db,
        cache: redis,
        file_system: efs,
    })
}

/// Logical id of every output [`storage`] registers.
pub const STORAGE_OUTPUTS: [&str; 5] = [
    "DbEndpointAddress",
    "DbEndpointPort",
    "RedisEndpointAddress",
    "RedisEndpointPort",
    "FileSystemId",
];

impl StorageHandles {
    /// Output values in [`STORAGE_OUTPUTS`] order.
    pub fn output_values(&self) -> [Token; 5] {
        [
            self.database.endpoint().address().clone(),
            self.database.endpoint().port_token().clone(),
            self.cache.endpoint_address(),
            self.cache.endpoint_port(),
            self.file_system.file_system_id(),
        ]
    }
}
