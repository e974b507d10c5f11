//! Single-node Redis cluster.
//!
//! One node in one zone. There is no replication group and no failover; the
//! cluster is lost with its zone.

use crate::construct::Scope;
use crate::error::Result;
use crate::network::{NetworkContext, SecurityGroupRef};
use crate::token::Token;
use serde::Serialize;
use tracing::{info, warn};

pub const CACHE_CLUSTER_RESOURCE_TYPE: &str = "AWS::ElastiCache::CacheCluster";
pub const CACHE_SUBNET_GROUP_RESOURCE_TYPE: &str = "AWS::ElastiCache::SubnetGroup";

pub const CACHE_NODE_TYPE: &str = "cache.t3.small";
pub const CACHE_ENGINE: &str = "redis";
pub const CACHE_NODE_COUNT: u32 = 1;
pub const SUBNET_GROUP_DESCRIPTION: &str = "PrivX Private Subnets";

/// Subnet group the cluster is placed in.
#[derive(Debug, Clone)]
pub struct CacheSubnetGroup {
    logical_id: String,
}

impl CacheSubnetGroup {
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Group name, resolved at deploy time
    pub fn name(&self) -> Token {
        Token::reference(&self.logical_id)
    }
}

/// Result of [`cache`].
#[derive(Debug, Clone)]
pub struct CacheHandle {
    logical_id: String,
    subnet_group: CacheSubnetGroup,
}

impl CacheHandle {
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn subnet_group(&self) -> &CacheSubnetGroup {
        &self.subnet_group
    }

    pub fn endpoint_address(&self) -> Token {
        Token::get_att(&self.logical_id, "RedisEndpoint.Address")
    }

    pub fn endpoint_port(&self) -> Token {
        Token::get_att(&self.logical_id, "RedisEndpoint.Port")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SubnetGroupProperties {
    description: &'static str,
    subnet_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CacheClusterProperties {
    cache_node_type: &'static str,
    cache_subnet_group_name: Token,
    engine: &'static str,
    num_cache_nodes: u32,
    vpc_security_group_ids: Vec<Token>,
}

/// Declare a subnet group over the private subnets, then the cluster in it.
///
/// An empty subnet list is passed through; the provider rejects it at deploy
/// time.
pub fn cache(
    scope: &mut Scope<'_>,
    network: &NetworkContext,
    security_group: &SecurityGroupRef,
) -> Result<CacheHandle> {
    if network.private_subnets.is_empty() {
        warn!(
            vpc = %network.vpc_id,
            "Cache subnet group has no private subnets; the provider will reject it"
        );
    }

    let subnet_group = CacheSubnetGroup {
        logical_id: scope.declare(
            "RedisNets",
            CACHE_SUBNET_GROUP_RESOURCE_TYPE,
            &SubnetGroupProperties {
                description: SUBNET_GROUP_DESCRIPTION,
                subnet_ids: network.private_subnets.clone(),
            },
        )?,
    };

    let logical_id = scope.declare(
        "Redis",
        CACHE_CLUSTER_RESOURCE_TYPE,
        &CacheClusterProperties {
            cache_node_type: CACHE_NODE_TYPE,
            cache_subnet_group_name: subnet_group.name(),
            engine: CACHE_ENGINE,
            num_cache_nodes: CACHE_NODE_COUNT,
            vpc_security_group_ids: vec![security_group.group_id().clone()],
        },
    )?;

    info!(logical_id = %logical_id, node_type = CACHE_NODE_TYPE, "Declared cache cluster");

    Ok(CacheHandle {
        logical_id,
        subnet_group,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::Stack;
    use serde_json::json;

    #[test]
    fn test_cluster_properties() {
        let mut stack = Stack::new("PrivX");
        let network = NetworkContext::new("vpc-1").with_private_subnets(["subnet-a", "subnet-b"]);
        let handle = cache(
            &mut stack.scope(),
            &network,
            &SecurityGroupRef::from_id("sg-1"),
        )
        .unwrap();

        let cluster = stack.resource(handle.logical_id()).unwrap();
        assert_eq!(
            cluster.properties,
            json!({
                "CacheNodeType": "cache.t3.small",
                "CacheSubnetGroupName": { "Ref": "RedisNets" },
                "Engine": "redis",
                "NumCacheNodes": 1,
                "VpcSecurityGroupIds": ["sg-1"],
            })
        );
    }

    #[test]
    fn test_subnet_group_properties() {
        let mut stack = Stack::new("PrivX");
        let network = NetworkContext::new("vpc-1").with_private_subnets(["subnet-b", "subnet-a"]);
        let handle = cache(
            &mut stack.scope(),
            &network,
            &SecurityGroupRef::from_id("sg-1"),
        )
        .unwrap();

        let group = stack.resource(handle.subnet_group().logical_id()).unwrap();
        assert_eq!(group.resource_type, CACHE_SUBNET_GROUP_RESOURCE_TYPE);
        assert_eq!(group.property("Description"), Some(&json!("PrivX Private Subnets")));
        assert_eq!(group.property("SubnetIds"), Some(&json!(["subnet-b", "subnet-a"])));
    }

    #[test]
    fn test_empty_private_subnets_not_rejected() {
        let mut stack = Stack::new("PrivX");
        let handle = cache(
            &mut stack.scope(),
            &NetworkContext::new("vpc-1"),
            &SecurityGroupRef::from_id("sg-1"),
        )
        .unwrap();

        let group = stack.resource(handle.subnet_group().logical_id()).unwrap();
        assert_eq!(group.property("SubnetIds"), Some(&json!([])));
    }
}
