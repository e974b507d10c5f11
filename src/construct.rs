//! The declaration registry.
//!
//! A [`Stack`] owns every resource declared during the definition phase.
//! Declarations are made through a [`Scope`], which is a construct path
//! borrowed from the stack. Each path may be declared exactly once; the path
//! also determines the resource's logical id in the synthesized template.
//!
//! ```rust
//! use privx_infra::construct::Stack;
//! use serde_json::json;
//!
//! let mut stack = Stack::new("PrivX");
//! let logical_id = stack
//!     .scope()
//!     .declare("Efs", "AWS::EFS::FileSystem", &json!({}))
//!     .unwrap();
//! assert_eq!(logical_id, "Efs");
//! ```

use crate::error::{Error, Result};
use crate::token::Token;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Maximum length of a CloudFormation logical id.
const MAX_LOGICAL_ID_LEN: usize = 255;

/// Number of hash characters appended to nested logical ids.
const HASH_LEN: usize = 8;

/// Path components that never contribute to the human part of a logical id.
const HIDDEN_ID: &str = "Default";
const HIDDEN_FROM_HUMAN_ID: &str = "Resource";

/// What the provider does with a resource when it is removed or replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalPolicy {
    /// Delete the underlying resource
    Delete,
    /// Keep the underlying resource, orphaned
    Retain,
    /// Take a final snapshot before deleting
    Snapshot,
}

/// Per-declaration options that sit beside the properties.
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    /// Applied to both `DeletionPolicy` and `UpdateReplacePolicy`
    pub removal_policy: Option<RemovalPolicy>,
    /// Logical ids this resource must be created after
    pub depends_on: Vec<String>,
}

/// One declared resource.
#[derive(Debug, Clone)]
pub struct ResourceDeclaration {
    /// Logical id in the template
    pub logical_id: String,
    /// Full construct path, e.g. `PrivX/Db`
    pub path: String,
    /// Provider resource type, e.g. `AWS::RDS::DBInstance`
    pub resource_type: String,
    /// Serialized resource properties
    pub properties: serde_json::Value,
    /// Options such as removal policy
    pub options: ResourceOptions,
}

impl ResourceDeclaration {
    /// Look up a top-level property by name.
    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }
}

/// A stack output.
#[derive(Debug, Clone)]
pub struct StackOutput {
    /// Output value
    pub value: Token,
    /// Human readable description
    pub description: Option<String>,
}

/// Collects resource declarations for later synthesis.
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    description: Option<String>,
    resources: IndexMap<String, ResourceDeclaration>,
    paths: HashSet<String>,
    outputs: IndexMap<String, StackOutput>,
}

impl Stack {
    /// Create an empty stack. The name is also the root of every construct path.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            resources: IndexMap::new(),
            paths: HashSet::new(),
            outputs: IndexMap::new(),
        }
    }

    /// Set the template description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Stack name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template description
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Root scope of this stack.
    pub fn scope(&mut self) -> Scope<'_> {
        let path = vec![self.name.clone()];
        Scope { stack: self, path }
    }

    /// All declarations, in declaration order.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceDeclaration> {
        self.resources.values()
    }

    /// Declaration by logical id.
    pub fn resource(&self, logical_id: &str) -> Option<&ResourceDeclaration> {
        self.resources.get(logical_id)
    }

    /// Declarations of one resource type, in declaration order.
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a ResourceDeclaration> + 'a {
        self.resources
            .values()
            .filter(move |r| r.resource_type == resource_type)
    }

    /// Number of declared resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if nothing has been declared
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Register a stack output.
    pub fn add_output(
        &mut self,
        name: impl Into<String>,
        value: Token,
        description: Option<&str>,
    ) -> Result<()> {
        let name = name.into();
        if self.outputs.contains_key(&name) {
            return Err(Error::DuplicateOutput(name));
        }
        self.outputs.insert(
            name,
            StackOutput {
                value,
                description: description.map(str::to_string),
            },
        );
        Ok(())
    }

    /// Registered outputs, in registration order.
    pub fn outputs(&self) -> &IndexMap<String, StackOutput> {
        &self.outputs
    }

    fn declare(
        &mut self,
        components: &[String],
        resource_type: &str,
        properties: serde_json::Value,
        options: ResourceOptions,
    ) -> Result<String> {
        let path = components.join("/");
        if self.paths.contains(&path) {
            return Err(Error::DuplicateConstruct { path });
        }

        // Every component hidden leaves nothing but a hash.
        if components[1..].iter().all(|c| c == HIDDEN_ID) {
            return Err(Error::InvalidConstructId(path));
        }

        // The stack name is not part of the logical id.
        let logical_id = logical_id_for(&components[1..]);
        if self.resources.contains_key(&logical_id) {
            return Err(Error::LogicalIdCollision { logical_id, path });
        }

        debug!(
            logical_id = %logical_id,
            resource_type = %resource_type,
            path = %path,
            "Declared resource"
        );

        self.paths.insert(path.clone());
        self.resources.insert(
            logical_id.clone(),
            ResourceDeclaration {
                logical_id: logical_id.clone(),
                path,
                resource_type: resource_type.to_string(),
                properties,
                options,
            },
        );
        Ok(logical_id)
    }
}

/// A construct path inside a [`Stack`] through which resources are declared.
pub struct Scope<'a> {
    stack: &'a mut Stack,
    path: Vec<String>,
}

impl<'a> Scope<'a> {
    /// Full construct path of this scope, e.g. `PrivX` or `PrivX/Storage`.
    pub fn path(&self) -> String {
        self.path.join("/")
    }

    /// Name of the enclosing stack
    pub fn stack_name(&self) -> &str {
        self.stack.name()
    }

    /// Nested scope under this one.
    pub fn child(&mut self, id: &str) -> Result<Scope<'_>> {
        validate_id(id)?;
        let mut path = self.path.clone();
        path.push(id.to_string());
        Ok(Scope {
            stack: &mut *self.stack,
            path,
        })
    }

    /// Register a stack output from within this scope.
    pub fn add_output(&mut self, name: &str, value: Token, description: Option<&str>) -> Result<()> {
        self.stack.add_output(name, value, description)
    }

    /// Declare a resource with default options. Returns its logical id.
    pub fn declare<P: Serialize>(
        &mut self,
        id: &str,
        resource_type: &str,
        properties: &P,
    ) -> Result<String> {
        self.declare_with(id, resource_type, properties, ResourceOptions::default())
    }

    /// Declare a resource. Returns its logical id.
    pub fn declare_with<P: Serialize>(
        &mut self,
        id: &str,
        resource_type: &str,
        properties: &P,
        options: ResourceOptions,
    ) -> Result<String> {
        validate_id(id)?;
        let properties = serde_json::to_value(properties)?;
        let mut components = self.path.clone();
        components.push(id.to_string());
        self.stack
            .declare(&components, resource_type, properties, options)
    }
}

fn validate_id(id: &str) -> Result<()> {
    if id.contains('/') || !id.chars().any(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidConstructId(id.to_string()));
    }
    Ok(())
}

fn remove_non_alphanumeric(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Derive a template logical id from construct path components below the stack.
///
/// A single component is used as-is (minus non-alphanumerics). Deeper paths
/// get a human readable prefix plus an 8 character hash of the full path.
pub fn logical_id_for(components: &[String]) -> String {
    let components: Vec<&str> = components
        .iter()
        .map(String::as_str)
        .filter(|c| *c != HIDDEN_ID)
        .collect();

    if components.len() == 1 {
        let candidate = remove_non_alphanumeric(components[0]);
        if candidate.len() <= MAX_LOGICAL_ID_LEN {
            return candidate;
        }
    }

    let digest = md5::compute(components.join("/"));
    let hash: String = format!("{:X}", digest).chars().take(HASH_LEN).collect();

    let mut human: String = components
        .iter()
        .filter(|c| **c != HIDDEN_FROM_HUMAN_ID)
        .map(|c| remove_non_alphanumeric(c))
        .collect();
    human.truncate(MAX_LOGICAL_ID_LEN - HASH_LEN);

    format!("{}{}", human, hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn components(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_top_level_logical_id_is_verbatim() {
        assert_eq!(logical_id_for(&components(&["Db"])), "Db");
        assert_eq!(logical_id_for(&components(&["Mount0"])), "Mount0");
        assert_eq!(logical_id_for(&components(&["my-bucket"])), "mybucket");
    }

    #[test]
    fn test_nested_logical_id_has_hash() {
        let id = logical_id_for(&components(&["Storage", "Db"]));
        assert!(id.starts_with("StorageDb"));
        assert_eq!(id.len(), "StorageDb".len() + HASH_LEN);
        assert!(id["StorageDb".len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_resource_component_hidden_from_human_part() {
        let id = logical_id_for(&components(&["Db", "Resource"]));
        assert!(id.starts_with("Db"));
        assert_eq!(id.len(), 2 + HASH_LEN);
    }

    #[test]
    fn test_default_component_is_dropped() {
        assert_eq!(
            logical_id_for(&components(&["Db", "Default"])),
            logical_id_for(&components(&["Db"]))
        );
    }

    #[test]
    fn test_scope_paths() {
        let mut stack = Stack::new("PrivX");
        let mut root = stack.scope();
        assert_eq!(root.path(), "PrivX");
        let child = root.child("Storage").unwrap();
        assert_eq!(child.path(), "PrivX/Storage");
        assert_eq!(child.stack_name(), "PrivX");
    }

    #[test]
    fn test_declare_records_resource() {
        let mut stack = Stack::new("PrivX");
        let id = stack
            .scope()
            .declare("Efs", "AWS::EFS::FileSystem", &json!({ "Encrypted": true }))
            .unwrap();

        assert_eq!(id, "Efs");
        let resource = stack.resource("Efs").unwrap();
        assert_eq!(resource.path, "PrivX/Efs");
        assert_eq!(resource.resource_type, "AWS::EFS::FileSystem");
        assert_eq!(resource.property("Encrypted"), Some(&json!(true)));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let mut stack = Stack::new("PrivX");
        let mut scope = stack.scope();
        scope.declare("Db", "AWS::RDS::DBInstance", &json!({})).unwrap();
        let err = scope
            .declare("Db", "AWS::RDS::DBInstance", &json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateConstruct { ref path } if path == "PrivX/Db"));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_logical_id_collision_rejected() {
        let mut stack = Stack::new("PrivX");
        let mut scope = stack.scope();
        scope.declare("MyDb", "AWS::RDS::DBInstance", &json!({})).unwrap();
        let err = scope
            .declare("My-Db", "AWS::RDS::DBInstance", &json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::LogicalIdCollision { .. }));
    }

    #[test]
    fn test_invalid_ids_rejected() {
        let mut stack = Stack::new("PrivX");
        let mut scope = stack.scope();
        assert!(matches!(
            scope.declare("", "AWS::EFS::FileSystem", &json!({})),
            Err(Error::InvalidConstructId(_))
        ));
        assert!(matches!(
            scope.child("a/b"),
            Err(Error::InvalidConstructId(_))
        ));
        assert!(matches!(
            scope.declare("--", "AWS::EFS::FileSystem", &json!({})),
            Err(Error::InvalidConstructId(_))
        ));
        assert!(matches!(
            scope.child(" :."),
            Err(Error::InvalidConstructId(_))
        ));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_fully_hidden_path_rejected() {
        let mut stack = Stack::new("PrivX");
        let mut root = stack.scope();
        let err = root
            .child("Default")
            .unwrap()
            .declare("Default", "AWS::EFS::FileSystem", &json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConstructId(ref path) if path == "PrivX/Default/Default"));

        let id = root
            .child("Storage")
            .unwrap()
            .declare("Default", "AWS::EFS::FileSystem", &json!({}))
            .unwrap();
        assert!(id.starts_with("Storage"));
    }

    #[test]
    fn test_same_id_in_different_scopes() {
        let mut stack = Stack::new("PrivX");
        let mut root = stack.scope();
        root.declare("Db", "AWS::RDS::DBInstance", &json!({})).unwrap();
        root.child("Replica")
            .unwrap()
            .declare("Db", "AWS::RDS::DBInstance", &json!({}))
            .unwrap();
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_outputs() {
        let mut stack = Stack::new("PrivX");
        stack
            .add_output("FileSystemId", Token::reference("Efs"), None)
            .unwrap();
        assert!(matches!(
            stack.add_output("FileSystemId", Token::reference("Efs"), None),
            Err(Error::DuplicateOutput(_))
        ));
        assert_eq!(stack.outputs().len(), 1);
    }

    #[test]
    fn test_resources_of_type() {
        let mut stack = Stack::new("PrivX");
        let mut scope = stack.scope();
        scope.declare("Mount0", "AWS::EFS::MountTarget", &json!({})).unwrap();
        scope.declare("Efs", "AWS::EFS::FileSystem", &json!({})).unwrap();
        scope.declare("Mount1", "AWS::EFS::MountTarget", &json!({})).unwrap();

        let mounts: Vec<_> = stack
            .resources_of_type("AWS::EFS::MountTarget")
            .map(|r| r.logical_id.as_str())
            .collect();
        assert_eq!(mounts, vec!["Mount0", "Mount1"]);
    }
}
