//! Template synthesis.
//!
//! Turns a [`Stack`] into a CloudFormation template that the deployment
//! pipeline consumes. Resources appear in declaration order.

use crate::construct::{RemovalPolicy, Stack};
use crate::error::Result;
use crate::token::Token;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;

/// Template format version understood by CloudFormation.
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// A synthesized CloudFormation template.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub resources: IndexMap<String, TemplateResource>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, TemplateOutput>,
}

/// One entry of the `Resources` section.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateResource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    pub properties: serde_json::Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<RemovalPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<RemovalPolicy>,
    pub metadata: ResourceMetadata,
}

/// Metadata recorded for every resource so the template can be traced back
/// to the construct that declared it.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceMetadata {
    #[serde(rename = "privx:path")]
    pub path: String,
}

/// One entry of the `Outputs` section.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateOutput {
    pub value: Token,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Stack {
    /// Synthesize the declared resources into a template.
    pub fn synthesize(&self) -> Template {
        let resources = self
            .resources()
            .map(|r| {
                (
                    r.logical_id.clone(),
                    TemplateResource {
                        resource_type: r.resource_type.clone(),
                        properties: r.properties.clone(),
                        depends_on: r.options.depends_on.clone(),
                        deletion_policy: r.options.removal_policy,
                        update_replace_policy: r.options.removal_policy,
                        metadata: ResourceMetadata {
                            path: r.path.clone(),
                        },
                    },
                )
            })
            .collect();

        let outputs = self
            .outputs()
            .iter()
            .map(|(name, output)| {
                (
                    name.clone(),
                    TemplateOutput {
                        value: output.value.clone(),
                        description: output.description.clone(),
                    },
                )
            })
            .collect();

        tracing::info!(
            stack = %self.name(),
            resources = self.len(),
            "Synthesized template"
        );

        Template {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: self.description().map(str::to_string),
            resources,
            outputs,
        }
    }
}

impl Template {
    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// JSON value, handy for inspecting properties in tests.
    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Write the template to a file, choosing YAML for `.yml`/`.yaml` and
    /// JSON otherwise.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let rendered = match path.extension().and_then(|e| e.to_str()) {
            Some("yml") | Some("yaml") => self.to_yaml()?,
            _ => self.to_json()?,
        };
        std::fs::write(path, rendered)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::ResourceOptions;
    use serde_json::json;

    fn sample_stack() -> Stack {
        let mut stack = Stack::new("PrivX").with_description("PrivX storage");
        let mut scope = stack.scope();
        scope
            .declare("Efs", "AWS::EFS::FileSystem", &json!({ "Encrypted": false }))
            .unwrap();
        scope
            .declare_with(
                "Db",
                "AWS::RDS::DBInstance",
                &json!({ "Engine": "postgres" }),
                ResourceOptions {
                    removal_policy: Some(RemovalPolicy::Snapshot),
                    depends_on: vec!["Efs".to_string()],
                },
            )
            .unwrap();
        stack
            .add_output("FileSystemId", Token::reference("Efs"), Some("EFS id"))
            .unwrap();
        stack
    }

    #[test]
    fn test_template_shape() {
        let value = sample_stack().synthesize().to_value().unwrap();

        assert_eq!(value["AWSTemplateFormatVersion"], json!("2010-09-09"));
        assert_eq!(value["Description"], json!("PrivX storage"));
        assert_eq!(value["Resources"]["Efs"]["Type"], json!("AWS::EFS::FileSystem"));
        assert_eq!(
            value["Resources"]["Efs"]["Metadata"]["privx:path"],
            json!("PrivX/Efs")
        );
        assert!(value["Resources"]["Efs"].get("DeletionPolicy").is_none());
        assert_eq!(value["Resources"]["Db"]["DeletionPolicy"], json!("Snapshot"));
        assert_eq!(
            value["Resources"]["Db"]["UpdateReplacePolicy"],
            json!("Snapshot")
        );
        assert_eq!(value["Resources"]["Db"]["DependsOn"], json!(["Efs"]));
        assert_eq!(
            value["Outputs"]["FileSystemId"],
            json!({ "Value": { "Ref": "Efs" }, "Description": "EFS id" })
        );
    }

    #[test]
    fn test_resource_order_preserved() {
        let template = sample_stack().synthesize();
        let ids: Vec<_> = template.resources.keys().cloned().collect();
        assert_eq!(ids, vec!["Efs", "Db"]);
    }

    #[test]
    fn test_empty_outputs_omitted() {
        let stack = Stack::new("Empty");
        let value = stack.synthesize().to_value().unwrap();
        assert!(value.get("Outputs").is_none());
        assert!(value.get("Description").is_none());
        assert_eq!(value["Resources"], json!({}));
    }

    #[test]
    fn test_yaml_rendering() {
        let yaml = sample_stack().synthesize().to_yaml().unwrap();
        assert!(yaml.contains("AWSTemplateFormatVersion:"));
        assert!(yaml.contains("2010-09-09"));
        assert!(yaml.contains("Type: AWS::RDS::DBInstance"));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.json");
        sample_stack().synthesize().write_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["Resources"]["Db"]["Properties"]["Engine"], json!("postgres"));
    }
}
