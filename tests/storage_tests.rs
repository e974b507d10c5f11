//! Integration tests for the storage tier declarations
//!
//! These tests drive the public API end to end and assert on the synthesized
//! template, the way the deployment pipeline sees it:
//! - Database fixed settings and its ingress rule
//! - Cache subnet group and cluster
//! - File system, mount targets and the NFS rule
//! - Registry collisions and stack outputs

use pretty_assertions::assert_eq;
use privx_infra::prelude::*;
use privx_infra::resources::STORAGE_OUTPUTS;
use serde_json::{json, Value};

// ============================================================================
// Helpers
// ============================================================================

fn network(private: &[&str], public: &[&str]) -> NetworkContext {
    NetworkContext::new("vpc-0123456789abcdef0")
        .with_private_subnets(private.iter().copied())
        .with_public_subnets(public.iter().copied())
}

fn context(private: &[&str], public: &[&str]) -> StorageContext {
    StorageContext {
        network: network(private, public),
        security_group: SecurityGroupRef::from_id("sg-privx"),
        secret: SecretRef::new("privx/database"),
    }
}

fn synthesize(context: &StorageContext) -> Value {
    let mut stack = Stack::new("PrivX").with_description("PrivX storage tier");
    storage(&mut stack.scope(), context).unwrap();
    stack.synthesize().to_value().unwrap()
}

fn resources_of_type<'a>(template: &'a Value, resource_type: &str) -> Vec<(&'a String, &'a Value)> {
    template["Resources"]
        .as_object()
        .unwrap()
        .iter()
        .filter(|(_, r)| r["Type"] == resource_type)
        .collect()
}

// ============================================================================
// Database Tests
// ============================================================================

#[test]
fn test_database_instance_properties() {
    let template = synthesize(&context(&["subnet-p1"], &["subnet-a"]));
    let db = &template["Resources"]["Db"];

    assert_eq!(db["Type"], json!("AWS::RDS::DBInstance"));
    let props = &db["Properties"];
    assert_eq!(props["Engine"], json!("postgres"));
    assert_eq!(props["DBName"], json!("privx"));
    assert_eq!(props["MasterUsername"], json!("privx"));
    assert_eq!(props["DBInstanceClass"], json!("db.t3.small"));
    assert_eq!(props["MultiAZ"], json!(false));
    assert_eq!(props["DeletionProtection"], json!(false));
    assert_eq!(
        props["MasterUserPassword"],
        json!("{{resolve:secretsmanager:privx/database:SecretString:secret::}}")
    );
    assert_eq!(db["DeletionPolicy"], json!("Snapshot"));
}

#[test]
fn test_database_settings_do_not_depend_on_input() {
    for (private, public) in [
        (vec![], vec![]),
        (vec!["subnet-p1"], vec![]),
        (vec!["subnet-p1", "subnet-p2", "subnet-p3"], vec!["subnet-a"]),
    ] {
        let template = synthesize(&context(&private, &public));
        let props = &template["Resources"]["Db"]["Properties"];
        assert_eq!(props["MultiAZ"], json!(false));
        assert_eq!(props["DeletionProtection"], json!(false));
    }
}

#[test]
fn test_database_ingress_matches_endpoint_port() {
    let mut stack = Stack::new("PrivX");
    let ctx = context(&["subnet-p1"], &[]);
    let handle = database(
        &mut stack.scope(),
        &ctx.network,
        &ctx.security_group,
        &ctx.secret,
    )
    .unwrap();

    let port = handle.endpoint().port();
    assert_eq!(port, 5432);

    let rule = stack.resource(handle.ingress_rule()).unwrap();
    assert_eq!(rule.resource_type, "AWS::EC2::SecurityGroupIngress");
    assert_eq!(rule.property("FromPort"), Some(&json!(port)));
    assert_eq!(rule.property("ToPort"), Some(&json!(port)));
    assert_eq!(rule.property("SourceSecurityGroupId"), Some(&json!("sg-privx")));
    assert_eq!(
        rule.property("Description"),
        Some(&json!("from sg-privx:RDS:5432"))
    );
}

// ============================================================================
// Cache Tests
// ============================================================================

#[test]
fn test_cache_subnet_group_lists_private_subnets_in_order() {
    let private = ["subnet-p3", "subnet-p1", "subnet-p2"];
    let template = synthesize(&context(&private, &["subnet-a"]));

    assert_eq!(
        template["Resources"]["RedisNets"]["Properties"]["SubnetIds"],
        json!(private)
    );
    assert_eq!(
        template["Resources"]["Redis"]["Properties"]["CacheSubnetGroupName"],
        json!({ "Ref": "RedisNets" })
    );
}

#[test]
fn test_cache_cluster_is_single_node() {
    let template = synthesize(&context(&["subnet-p1"], &[]));
    let props = &template["Resources"]["Redis"]["Properties"];

    assert_eq!(props["NumCacheNodes"], json!(1));
    assert_eq!(props["CacheNodeType"], json!("cache.t3.small"));
    assert_eq!(props["Engine"], json!("redis"));
    assert_eq!(props["VpcSecurityGroupIds"], json!(["sg-privx"]));
}

// ============================================================================
// File System Tests
// ============================================================================

#[test]
fn test_one_mount_target_per_public_subnet() {
    let public = ["subnet-a", "subnet-b", "subnet-c"];
    let template = synthesize(&context(&["subnet-p1"], &public));

    let mounts = resources_of_type(&template, "AWS::EFS::MountTarget");
    assert_eq!(mounts.len(), public.len());

    for ((logical_id, mount), (index, subnet)) in mounts.iter().zip(public.iter().enumerate()) {
        assert_eq!(logical_id.as_str(), format!("Mount{}", index));
        assert_eq!(mount["Properties"]["SubnetId"], json!(subnet));
        assert_eq!(mount["Properties"]["SecurityGroups"], json!(["sg-privx"]));
        assert_eq!(mount["Properties"]["FileSystemId"], json!({ "Ref": "Efs" }));
    }
}

#[test]
fn test_empty_public_subnets_declares_file_system_only() {
    let template = synthesize(&context(&["subnet-p1"], &[]));

    assert_eq!(resources_of_type(&template, "AWS::EFS::FileSystem").len(), 1);
    assert!(resources_of_type(&template, "AWS::EFS::MountTarget").is_empty());
}

#[test]
fn test_file_system_name_tag() {
    let template = synthesize(&context(&[], &[]));
    assert_eq!(
        template["Resources"]["Efs"]["Properties"]["FileSystemTags"],
        json!([{ "Key": "Name", "Value": "PrivX/efs" }])
    );
}

#[test]
fn test_nfs_rule_is_port_2049_within_group() {
    for public in [vec![], vec!["subnet-a"], vec!["subnet-a", "subnet-b"]] {
        let template = synthesize(&context(&["subnet-p1"], &public));
        let nfs: Vec<_> = resources_of_type(&template, "AWS::EC2::SecurityGroupIngress")
            .into_iter()
            .filter(|(_, r)| r["Properties"]["GroupId"] == json!("sg-privx"))
            .collect();

        assert_eq!(nfs.len(), 1);
        let props = &nfs[0].1["Properties"];
        assert_eq!(props["FromPort"], json!(2049));
        assert_eq!(props["ToPort"], json!(2049));
        assert_eq!(props["IpProtocol"], json!("tcp"));
        assert_eq!(props["SourceSecurityGroupId"], json!("sg-privx"));
        assert_eq!(props["Description"], json!("from sg-privx:NFS:2049"));
    }
}

// ============================================================================
// Registry Tests
// ============================================================================

#[test]
fn test_factories_are_independent_of_order() {
    let ctx = context(&["subnet-p1"], &["subnet-a"]);

    let mut forward = Stack::new("PrivX");
    {
        let mut scope = forward.scope();
        database(&mut scope, &ctx.network, &ctx.security_group, &ctx.secret).unwrap();
        cache(&mut scope, &ctx.network, &ctx.security_group).unwrap();
        file_system(&mut scope, &ctx.network, &ctx.security_group).unwrap();
    }

    let mut reverse = Stack::new("PrivX");
    {
        let mut scope = reverse.scope();
        file_system(&mut scope, &ctx.network, &ctx.security_group).unwrap();
        cache(&mut scope, &ctx.network, &ctx.security_group).unwrap();
        database(&mut scope, &ctx.network, &ctx.security_group, &ctx.secret).unwrap();
    }

    let forward = forward.synthesize().to_value().unwrap();
    let reverse = reverse.synthesize().to_value().unwrap();
    for (logical_id, resource) in forward["Resources"].as_object().unwrap() {
        assert_eq!(&reverse["Resources"][logical_id], resource);
    }
}

#[test]
fn test_redeclaring_in_same_scope_is_a_collision() {
    let ctx = context(&["subnet-p1"], &["subnet-a"]);
    let mut stack = Stack::new("PrivX");
    let mut scope = stack.scope();

    file_system(&mut scope, &ctx.network, &ctx.security_group).unwrap();
    let err = file_system(&mut scope, &ctx.network, &ctx.security_group).unwrap_err();
    assert!(matches!(err, Error::DuplicateConstruct { .. }));
}

#[test]
fn test_separate_scopes_declare_separate_resources() {
    let ctx = context(&["subnet-p1"], &["subnet-a"]);
    let mut stack = Stack::new("PrivX");
    let mut root = stack.scope();

    let primary = cache(&mut root.child("Primary").unwrap(), &ctx.network, &ctx.security_group)
        .unwrap();
    let secondary = cache(
        &mut root.child("Secondary").unwrap(),
        &ctx.network,
        &ctx.security_group,
    )
    .unwrap();

    assert_ne!(primary.logical_id(), secondary.logical_id());
    assert_eq!(stack.resources_of_type("AWS::ElastiCache::CacheCluster").count(), 2);
}

#[test]
fn test_stack_outputs() {
    let template = synthesize(&context(&["subnet-p1"], &["subnet-a"]));
    let outputs = template["Outputs"].as_object().unwrap();

    let names: Vec<_> = outputs.keys().map(String::as_str).collect();
    assert_eq!(names, STORAGE_OUTPUTS.to_vec());
    assert_eq!(
        outputs["DbEndpointAddress"]["Value"],
        json!({ "Fn::GetAtt": ["Db", "Endpoint.Address"] })
    );
    assert_eq!(outputs["FileSystemId"]["Value"], json!({ "Ref": "Efs" }));
}

#[test]
fn test_yaml_and_json_agree() {
    let mut stack = Stack::new("PrivX");
    storage(&mut stack.scope(), &context(&["subnet-p1"], &["subnet-a"])).unwrap();
    let template = stack.synthesize();

    let from_json: Value = serde_json::from_str(&template.to_json().unwrap()).unwrap();
    let from_yaml: Value = serde_yaml::from_str(&template.to_yaml().unwrap()).unwrap();
    assert_eq!(from_json, from_yaml);
}
