//! Configuration module for privx-infra
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/privx-infra/privx-infra.toml)
//! - User configuration (~/.privx-infra.toml)
//! - Project configuration (./privx-infra.toml)
//! - Environment variables
//! - Command-line arguments

use crate::network::{NetworkContext, SecurityGroupRef};
use crate::resources::StorageContext;
use crate::secret::SecretRef;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default stack name, also the root of every construct path.
pub const DEFAULT_STACK_NAME: &str = "PrivX";

/// Template description used when no layer sets one.
pub const DEFAULT_STACK_DESCRIPTION: &str = "PrivX storage tier";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stack settings
    pub stack: StackConfig,

    /// Existing network the storage tier is placed in
    pub network: NetworkContext,

    /// Existing security group
    pub security: SecurityConfig,

    /// Credential source for the database
    pub secret: SecretConfig,

    /// Output settings
    pub output: OutputConfig,
}

/// Stack settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Stack name
    pub name: String,

    /// Template description
    pub description: Option<String>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_STACK_NAME.to_string(),
            description: None,
        }
    }
}

/// Security group settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Id of the security group shared by PrivX hosts
    pub security_group_id: Option<String>,
}

/// Secret settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretConfig {
    /// Secrets Manager secret name or ARN
    pub id: Option<String>,
}

/// Template rendering format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
    #[default]
    Json,
    Yaml,
}

/// Output settings
///
/// Unset fields fall through to earlier layers; see [`OutputConfig::format`]
/// and [`OutputConfig::color`] for the effective values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Template format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<TemplateFormat>,

    /// Enable colored output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

impl OutputConfig {
    /// Effective template format, JSON unless a layer chose otherwise
    pub fn format(&self) -> TemplateFormat {
        self.format.unwrap_or_default()
    }

    /// Effective color setting, on unless a layer turned it off
    pub fn color(&self) -> bool {
        self.color.unwrap_or(true)
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                tracing::debug!("Loading config from {}", path.display());
                config = config.merge_from_file(&path)?;
            } else if config_path.is_some() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Explicit path takes priority
        if let Some(path) = explicit_path {
            paths.push(path.clone());
            return paths;
        }

        // System-wide config
        paths.push(PathBuf::from("/etc/privx-infra/privx-infra.toml"));

        // User config
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".privx-infra.toml"));
        }

        // Project config (current directory)
        paths.push(PathBuf::from("privx-infra.toml"));

        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => toml::from_str(&content)
                .or_else(|_| serde_yaml::from_str(&content))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one; values set in `other` win.
    fn merge(&self, other: Config) -> Config {
        Config {
            stack: StackConfig {
                name: if other.stack.name != DEFAULT_STACK_NAME {
                    other.stack.name
                } else {
                    self.stack.name.clone()
                },
                description: other.stack.description.or_else(|| self.stack.description.clone()),
            },
            network: NetworkContext {
                vpc_id: if other.network.vpc_id.is_empty() {
                    self.network.vpc_id.clone()
                } else {
                    other.network.vpc_id
                },
                private_subnets: if other.network.private_subnets.is_empty() {
                    self.network.private_subnets.clone()
                } else {
                    other.network.private_subnets
                },
                public_subnets: if other.network.public_subnets.is_empty() {
                    self.network.public_subnets.clone()
                } else {
                    other.network.public_subnets
                },
            },
            security: SecurityConfig {
                security_group_id: other
                    .security
                    .security_group_id
                    .or_else(|| self.security.security_group_id.clone()),
            },
            secret: SecretConfig {
                id: other.secret.id.or_else(|| self.secret.id.clone()),
            },
            output: OutputConfig {
                format: other.output.format.or(self.output.format),
                color: other.output.color.or(self.output.color),
            },
        }
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        // PRIVX_INFRA_STACK_NAME
        if let Ok(name) = std::env::var("PRIVX_INFRA_STACK_NAME") {
            self.stack.name = name;
        }

        // PRIVX_INFRA_VPC_ID
        if let Ok(vpc) = std::env::var("PRIVX_INFRA_VPC_ID") {
            self.network.vpc_id = vpc;
        }

        // PRIVX_INFRA_PRIVATE_SUBNETS
        if let Ok(subnets) = std::env::var("PRIVX_INFRA_PRIVATE_SUBNETS") {
            self.network.private_subnets = split_list(&subnets);
        }

        // PRIVX_INFRA_PUBLIC_SUBNETS
        if let Ok(subnets) = std::env::var("PRIVX_INFRA_PUBLIC_SUBNETS") {
            self.network.public_subnets = split_list(&subnets);
        }

        // PRIVX_INFRA_SECURITY_GROUP
        if let Ok(sg) = std::env::var("PRIVX_INFRA_SECURITY_GROUP") {
            self.security.security_group_id = Some(sg);
        }

        // PRIVX_INFRA_SECRET_ID
        if let Ok(secret) = std::env::var("PRIVX_INFRA_SECRET_ID") {
            self.secret.id = Some(secret);
        }

        // NO_COLOR
        if std::env::var("NO_COLOR").is_ok() {
            self.output.color = Some(false);
        }
    }

    /// Build the storage context, failing if a required reference is missing.
    pub fn storage_context(&self) -> Result<StorageContext> {
        let security_group_id = self
            .security
            .security_group_id
            .clone()
            .context("security.security_group_id is not set")?;
        let secret_id = self.secret.id.clone().context("secret.id is not set")?;

        Ok(StorageContext {
            network: self.network.clone(),
            security_group: SecurityGroupRef::from_id(security_group_id),
            secret: SecretRef::new(secret_id),
        })
    }

    /// Load from a specific file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Config::default().merge_from_file(path.as_ref())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
