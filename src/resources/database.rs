//! Managed PostgreSQL database.
//!
//! ## Declared resources
//!
//! | Construct id | Type | Notes |
//! |--------------|------|-------|
//! | `DbSubnetGroup` | `AWS::RDS::DBSubnetGroup` | All private subnets of the network |
//! | `DbSecurityGroup` | `AWS::EC2::SecurityGroup` | Owned by the database, allow-all egress |
//! | `Db` | `AWS::RDS::DBInstance` | Single AZ, no deletion protection |
//! | `DbSecurityGroup/from <sg>:RDS:<port>` | `AWS::EC2::SecurityGroupIngress` | Caller's group to the endpoint port |
//!
//! ## Fixed settings
//!
//! | Property | Value |
//! |----------|-------|
//! | `Engine` | `postgres` |
//! | `DBName` | `privx` |
//! | `MasterUsername` | `privx` |
//! | `DBInstanceClass` | `db.t3.small` |
//! | `MultiAZ` | `false` |
//! | `DeletionProtection` | `false` |
//! | `MasterUserPassword` | JSON field `secret` of the supplied secret |
//!
//! The master password is a dynamic reference; its shape is never checked
//! here. A malformed secret fails when the provider resolves it.

use crate::construct::{RemovalPolicy, ResourceOptions, Scope};
use crate::error::Result;
use crate::network::{NetworkContext, Port, SecurityGroupRef, SECURITY_GROUP_RESOURCE_TYPE};
use crate::secret::SecretRef;
use crate::token::Token;
use serde::Serialize;
use tracing::info;

pub const DB_INSTANCE_RESOURCE_TYPE: &str = "AWS::RDS::DBInstance";
pub const DB_SUBNET_GROUP_RESOURCE_TYPE: &str = "AWS::RDS::DBSubnetGroup";

pub const DATABASE_NAME: &str = "privx";
pub const MASTER_USERNAME: &str = "privx";
pub const INSTANCE_CLASS: &str = "db.t3.small";
/// Secret JSON field holding the master password.
pub const PASSWORD_FIELD: &str = "secret";
/// GiB
const ALLOCATED_STORAGE: &str = "100";

const DB_ID: &str = "Db";

/// Relational engine of the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseEngine {
    Postgres,
}

impl DatabaseEngine {
    /// Value of the `Engine` property
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseEngine::Postgres => "postgres",
        }
    }

    /// Port the engine listens on unless told otherwise.
    pub fn default_port(&self) -> u16 {
        match self {
            DatabaseEngine::Postgres => 5432,
        }
    }
}

/// Where clients reach the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    address: Token,
    port: u16,
    port_token: Token,
}

impl Endpoint {
    /// Hostname, resolved at deploy time
    pub fn address(&self) -> &Token {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `Fn::GetAtt` of the deployed port, for stack outputs.
    pub fn port_token(&self) -> &Token {
        &self.port_token
    }
}

/// Result of [`database`].
#[derive(Debug, Clone)]
pub struct DatabaseHandle {
    logical_id: String,
    engine: DatabaseEngine,
    endpoint: Endpoint,
    security_group: SecurityGroupRef,
    subnet_group: String,
    ingress_rule: String,
}

impl DatabaseHandle {
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn engine(&self) -> DatabaseEngine {
        self.engine
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Security group attached to the instance.
    pub fn security_group(&self) -> &SecurityGroupRef {
        &self.security_group
    }

    /// Logical id of the DB subnet group
    pub fn subnet_group(&self) -> &str {
        &self.subnet_group
    }

    /// Logical id of the ingress rule opened for the caller's group
    pub fn ingress_rule(&self) -> &str {
        &self.ingress_rule
    }
}

#[derive(Debug, Serialize)]
struct DbSubnetGroupProperties {
    #[serde(rename = "DBSubnetGroupDescription")]
    description: String,
    #[serde(rename = "SubnetIds")]
    subnet_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SecurityGroupProperties {
    group_description: String,
    vpc_id: String,
    security_group_egress: Vec<EgressRule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct EgressRule {
    cidr_ip: &'static str,
    description: &'static str,
    ip_protocol: &'static str,
}

#[derive(Debug, Serialize)]
struct DbInstanceProperties {
    #[serde(rename = "DBInstanceClass")]
    instance_class: &'static str,
    #[serde(rename = "AllocatedStorage")]
    allocated_storage: &'static str,
    #[serde(rename = "CopyTagsToSnapshot")]
    copy_tags_to_snapshot: bool,
    #[serde(rename = "DBName")]
    database_name: &'static str,
    #[serde(rename = "DBSubnetGroupName")]
    subnet_group_name: Token,
    #[serde(rename = "DeletionProtection")]
    deletion_protection: bool,
    #[serde(rename = "Engine")]
    engine: &'static str,
    #[serde(rename = "MasterUsername")]
    master_username: &'static str,
    #[serde(rename = "MasterUserPassword")]
    master_user_password: Token,
    #[serde(rename = "MultiAZ")]
    multi_az: bool,
    #[serde(rename = "Port")]
    port: String,
    #[serde(rename = "PubliclyAccessible")]
    publicly_accessible: bool,
    #[serde(rename = "StorageType")]
    storage_type: &'static str,
    #[serde(rename = "VPCSecurityGroups")]
    security_groups: Vec<Token>,
}

/// Declare the database and open its port to `security_group`.
pub fn database(
    scope: &mut Scope<'_>,
    network: &NetworkContext,
    security_group: &SecurityGroupRef,
    secret: &SecretRef,
) -> Result<DatabaseHandle> {
    let engine = DatabaseEngine::Postgres;

    let subnet_group = scope.declare(
        "DbSubnetGroup",
        DB_SUBNET_GROUP_RESOURCE_TYPE,
        &DbSubnetGroupProperties {
            description: format!("Subnet group for {} database", DB_ID),
            subnet_ids: network.private_subnets.clone(),
        },
    )?;

    let db_security_group_id = scope.declare(
        "DbSecurityGroup",
        SECURITY_GROUP_RESOURCE_TYPE,
        &SecurityGroupProperties {
            group_description: format!("Security group for {} database", DB_ID),
            vpc_id: network.vpc_id.clone(),
            security_group_egress: vec![EgressRule {
                cidr_ip: "0.0.0.0/0",
                description: "Allow all outbound traffic by default",
                ip_protocol: "-1",
            }],
        },
    )?;
    let db_security_group = SecurityGroupRef::declared("DbSecurityGroup", &db_security_group_id);

    let properties = DbInstanceProperties {
        instance_class: INSTANCE_CLASS,
        allocated_storage: ALLOCATED_STORAGE,
        copy_tags_to_snapshot: true,
        database_name: DATABASE_NAME,
        subnet_group_name: Token::reference(&subnet_group),
        deletion_protection: false,
        engine: engine.as_str(),
        master_username: MASTER_USERNAME,
        master_user_password: secret.secret_value_from_json(PASSWORD_FIELD),
        multi_az: false,
        port: engine.default_port().to_string(),
        publicly_accessible: false,
        storage_type: "gp2",
        security_groups: vec![db_security_group.group_id().clone()],
    };

    let logical_id = scope.declare_with(
        DB_ID,
        DB_INSTANCE_RESOURCE_TYPE,
        &properties,
        ResourceOptions {
            removal_policy: Some(RemovalPolicy::Snapshot),
            ..ResourceOptions::default()
        },
    )?;

    let endpoint = Endpoint {
        address: Token::get_att(&logical_id, "Endpoint.Address"),
        port: engine.default_port(),
        port_token: Token::get_att(&logical_id, "Endpoint.Port"),
    };

    let port = Port::tcp(endpoint.port()).labeled("RDS");
    let ingress_rule = db_security_group.allow_from(scope, security_group, &port)?;

    info!(
        logical_id = %logical_id,
        engine = engine.as_str(),
        port = endpoint.port(),
        "Declared database"
    );

    Ok(DatabaseHandle {
        logical_id,
        engine,
        endpoint,
        security_group: db_security_group,
        subnet_group,
        ingress_rule,
    })
}
