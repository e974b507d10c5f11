//! Shared NFS file system.
//!
//! Mount targets are placed in the network's *public* subnets, one per subnet
//! in list order. Private-subnet placement was the intended target but was
//! never wired up; callers that need it must decide that explicitly.

use crate::construct::Scope;
use crate::error::Result;
use crate::network::{NetworkContext, Port, SecurityGroupRef};
use crate::token::Token;
use serde::Serialize;
use tracing::info;

pub const FILE_SYSTEM_RESOURCE_TYPE: &str = "AWS::EFS::FileSystem";
pub const MOUNT_TARGET_RESOURCE_TYPE: &str = "AWS::EFS::MountTarget";

/// NFS port, see "Using VPC security groups" in the EFS user guide.
pub const NFS_PORT: u16 = 2049;

/// Result of [`file_system`].
#[derive(Debug, Clone)]
pub struct FileSystemHandle {
    logical_id: String,
    mount_targets: Vec<String>,
    ingress_rule: String,
}

impl FileSystemHandle {
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// File system id, resolved at deploy time
    pub fn file_system_id(&self) -> Token {
        Token::reference(&self.logical_id)
    }

    /// Logical ids of the mount targets, in subnet order
    pub fn mount_targets(&self) -> &[String] {
        &self.mount_targets
    }

    pub fn ingress_rule(&self) -> &str {
        &self.ingress_rule
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Tag {
    key: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct FileSystemProperties {
    file_system_tags: Vec<Tag>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MountTargetProperties {
    file_system_id: Token,
    security_groups: Vec<Token>,
    subnet_id: String,
}

/// Declare the file system, its mount targets, and NFS access within
/// `security_group`.
pub fn file_system(
    scope: &mut Scope<'_>,
    network: &NetworkContext,
    security_group: &SecurityGroupRef,
) -> Result<FileSystemHandle> {
    let properties = FileSystemProperties {
        file_system_tags: vec![Tag {
            key: "Name",
            value: format!("{}/efs", scope.path()),
        }],
    };
    let logical_id = scope.declare("Efs", FILE_SYSTEM_RESOURCE_TYPE, &properties)?;
    let file_system_id = Token::reference(&logical_id);

    // TODO: mount in private subnets once placement is decided
    let mount_targets = network
        .public_subnets
        .iter()
        .enumerate()
        .map(|(index, subnet)| {
            scope.declare(
                &format!("Mount{}", index),
                MOUNT_TARGET_RESOURCE_TYPE,
                &MountTargetProperties {
                    file_system_id: file_system_id.clone(),
                    security_groups: vec![security_group.group_id().clone()],
                    subnet_id: subnet.clone(),
                },
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let ingress_rule =
        security_group.allow_internally(scope, &Port::tcp(NFS_PORT).labeled("NFS"))?;

    info!(
        logical_id = %logical_id,
        mount_targets = mount_targets.len(),
        "Declared file system"
    );

    Ok(FileSystemHandle {
        logical_id,
        mount_targets,
        ingress_rule,
    })
}
