//! # privx-infra - the PrivX storage tier as code
//!
//! privx-infra declares the managed services PrivX keeps its state in and
//! wires them into a network and security group that already exist:
//!
//! - **Database**: single-instance PostgreSQL on RDS, reachable from the
//!   caller's security group on its endpoint port
//! - **Cache**: single-node Redis on ElastiCache in the private subnets
//! - **File system**: EFS with a mount target per public subnet and NFS open
//!   inside the security group
//!
//! Declarations go into an explicit registry, the [`Stack`], which is then
//! synthesized into a CloudFormation template for an external pipeline to
//! deploy. Nothing here talks to AWS.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        CLI / Config                           │
//! │          (clap commands, TOML/YAML/JSON + env overrides)      │
//! └──────────────────────────────────────────────────────────────┘
//!                               │ StorageContext
//!          ┌────────────────────┼────────────────────┐
//!          ▼                    ▼                    ▼
//!   ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//!   │  database() │      │   cache()   │      │file_system()│
//!   └─────────────┘      └─────────────┘      └─────────────┘
//!          └────────────────────┼────────────────────┘
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │               Stack (declaration registry)                    │
//! │          construct paths -> logical ids -> resources          │
//! └──────────────────────────────────────────────────────────────┘
//!                               │ synthesize()
//!                               ▼
//!                    CloudFormation template
//! ```
//!
//! ## Quick Example
//!
//! ```rust
//! use privx_infra::prelude::*;
//!
//! let network = NetworkContext::new("vpc-0123")
//!     .with_private_subnets(["subnet-p1", "subnet-p2"])
//!     .with_public_subnets(["subnet-a", "subnet-b"]);
//! let sg = SecurityGroupRef::from_id("sg-0123");
//! let secret = SecretRef::new("privx/db");
//!
//! let mut stack = Stack::new("PrivX");
//! let mut scope = stack.scope();
//! let db = database(&mut scope, &network, &sg, &secret)?;
//! cache(&mut scope, &network, &sg)?;
//! file_system(&mut scope, &network, &sg)?;
//!
//! assert_eq!(db.endpoint().port(), 5432);
//! let template = stack.synthesize().to_json()?;
//! assert!(template.contains("AWS::EFS::MountTarget"));
//! # Ok::<(), privx_infra::Error>(())
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod prelude {
    //! Convenient re-exports of commonly used types and functions.

    pub use crate::construct::{RemovalPolicy, ResourceOptions, Scope, Stack};
    pub use crate::error::{Error, Result};
    pub use crate::network::{NetworkContext, Port, Protocol, SecurityGroupRef};
    pub use crate::resources::{
        cache, database, file_system, storage, CacheHandle, DatabaseHandle, FileSystemHandle,
        StorageContext, StorageHandles,
    };
    pub use crate::secret::SecretRef;
    pub use crate::template::Template;
    pub use crate::token::Token;
}

pub mod config;
pub mod construct;
pub mod error;
pub mod network;
pub mod resources;
pub mod secret;
pub mod template;
pub mod token;

pub use construct::Stack;
pub use error::{Error, Result};
pub use template::Template;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
