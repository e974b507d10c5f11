//! Network and firewall references supplied by the caller.
//!
//! Nothing in here creates a VPC, subnet, or security group of the caller's.
//! A [`SecurityGroupRef`] can however be *extended*: `allow_from` and
//! `allow_internally` declare standalone ingress rules against it.

use crate::construct::Scope;
use crate::error::Result;
use crate::token::Token;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource type of a standalone ingress rule.
pub const INGRESS_RESOURCE_TYPE: &str = "AWS::EC2::SecurityGroupIngress";

/// Resource type of a security group.
pub const SECURITY_GROUP_RESOURCE_TYPE: &str = "AWS::EC2::SecurityGroup";

/// An existing VPC and its subnets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkContext {
    /// VPC id
    pub vpc_id: String,
    /// Private subnet ids, in placement order
    pub private_subnets: Vec<String>,
    /// Public subnet ids, in placement order
    pub public_subnets: Vec<String>,
}

impl NetworkContext {
    /// Create a network context with no subnets.
    pub fn new(vpc_id: impl Into<String>) -> Self {
        Self {
            vpc_id: vpc_id.into(),
            ..Self::default()
        }
    }

    /// Set the private subnets
    pub fn with_private_subnets<I, S>(mut self, subnets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.private_subnets = subnets.into_iter().map(Into::into).collect();
        self
    }

    /// Set the public subnets
    pub fn with_public_subnets<I, S>(mut self, subnets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_subnets = subnets.into_iter().map(Into::into).collect();
        self
    }
}

/// IP protocol of a firewall rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    /// Every protocol
    All,
}

impl Protocol {
    /// Value of the `IpProtocol` property
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
            Protocol::All => "-1",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A protocol and port range, with the label used in rule descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    protocol: Protocol,
    from_port: Option<u16>,
    to_port: Option<u16>,
    string_representation: String,
}

impl Port {
    /// Fully specified port.
    pub fn new(
        protocol: Protocol,
        from_port: u16,
        to_port: u16,
        string_representation: impl Into<String>,
    ) -> Self {
        Self {
            protocol,
            from_port: Some(from_port),
            to_port: Some(to_port),
            string_representation: string_representation.into(),
        }
    }

    /// A single TCP port, labeled by its number.
    pub fn tcp(port: u16) -> Self {
        Self::new(Protocol::Tcp, port, port, port.to_string())
    }

    /// A TCP port range.
    pub fn tcp_range(from_port: u16, to_port: u16) -> Self {
        Self::new(
            Protocol::Tcp,
            from_port,
            to_port,
            format!("{}-{}", from_port, to_port),
        )
    }

    /// Every protocol on every port.
    pub fn all_traffic() -> Self {
        Self {
            protocol: Protocol::All,
            from_port: None,
            to_port: None,
            string_representation: "ALL TRAFFIC".to_string(),
        }
    }

    /// Prefix the label with a service name, e.g. `Port::tcp(2049).labeled("NFS")`
    /// renders as `NFS:2049`.
    pub fn labeled(mut self, service: &str) -> Self {
        self.string_representation = format!("{}:{}", service, self.string_representation);
        self
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn from_port(&self) -> Option<u16> {
        self.from_port
    }

    pub fn to_port(&self) -> Option<u16> {
        self.to_port
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.string_representation)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct IngressProperties {
    ip_protocol: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_port: Option<u16>,
    group_id: Token,
    source_security_group_id: Token,
    description: String,
}

/// A security group, either supplied by the caller or declared in this stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupRef {
    construct_id: String,
    group_id: Token,
}

impl SecurityGroupRef {
    /// Reference an existing security group by id.
    pub fn from_id(group_id: impl Into<String>) -> Self {
        Self {
            construct_id: "SecurityGroup".to_string(),
            group_id: Token::Literal(group_id.into()),
        }
    }

    /// Reference a security group declared in this stack.
    pub fn declared(construct_id: impl Into<String>, logical_id: &str) -> Self {
        Self {
            construct_id: construct_id.into(),
            group_id: Token::get_att(logical_id, "GroupId"),
        }
    }

    /// Construct id under which rules on this group are declared.
    pub fn with_construct_id(mut self, construct_id: impl Into<String>) -> Self {
        self.construct_id = construct_id.into();
        self
    }

    /// Group id, literal for imported groups
    pub fn group_id(&self) -> &Token {
        &self.group_id
    }

    pub fn construct_id(&self) -> &str {
        &self.construct_id
    }

    /// Stable label for this group in rule ids and descriptions.
    pub fn unique_id(&self) -> String {
        match &self.group_id {
            Token::Literal(id) => id.clone(),
            _ => self.construct_id.clone(),
        }
    }

    /// Permit `port` into this group from members of `peer`.
    ///
    /// Declares one `AWS::EC2::SecurityGroupIngress` under
    /// `<scope>/<construct id>/from <peer>:<port>` and returns its logical id.
    pub fn allow_from(
        &self,
        scope: &mut Scope<'_>,
        peer: &SecurityGroupRef,
        port: &Port,
    ) -> Result<String> {
        let description = format!("from {}:{}", peer.unique_id(), port);
        let properties = IngressProperties {
            ip_protocol: port.protocol().as_str(),
            from_port: port.from_port(),
            to_port: port.to_port(),
            group_id: self.group_id.clone(),
            source_security_group_id: peer.group_id.clone(),
            description: description.clone(),
        };

        let logical_id = scope.child(&self.construct_id)?.declare(
            &description,
            INGRESS_RESOURCE_TYPE,
            &properties,
        )?;

        tracing::debug!(
            group = %self.unique_id(),
            peer = %peer.unique_id(),
            port = %port,
            "Added ingress rule"
        );
        Ok(logical_id)
    }

    /// Permit `port` between members of this group.
    pub fn allow_internally(&self, scope: &mut Scope<'_>, port: &Port) -> Result<String> {
        self.allow_from(scope, self, port)
    }
}
