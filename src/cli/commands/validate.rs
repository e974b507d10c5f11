//! Validate command - check the caller-supplied context before synthesis
//!
//! The resource factories accept whatever they are given. This command is the
//! place to catch a missing security group or a typo in a subnet id before
//! the deployment pipeline does.

use super::CommandContext;
use crate::cli::output::FindingLevel;
use anyhow::Result;
use clap::Parser;
use once_cell::sync::Lazy;
use privx_infra::config::Config;
use regex::Regex;

static VPC_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^vpc-([0-9a-f]{8}|[0-9a-f]{17})$").expect("valid regex"));
static SUBNET_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^subnet-([0-9a-f]{8}|[0-9a-f]{17})$").expect("valid regex"));
static SECURITY_GROUP_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^sg-([0-9a-f]{8}|[0-9a-f]{17})$").expect("valid regex"));

/// Arguments for the validate command
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// One validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub level: FindingLevel,
    pub field: &'static str,
    pub message: String,
}

impl Finding {
    fn error(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            level: FindingLevel::Error,
            field,
            message: message.into(),
        }
    }

    fn warning(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            level: FindingLevel::Warning,
            field,
            message: message.into(),
        }
    }
}

fn check_subnets(field: &'static str, subnets: &[String], findings: &mut Vec<Finding>) {
    for subnet in subnets {
        if !SUBNET_ID.is_match(subnet) {
            findings.push(Finding::error(field, format!("'{}' is not a subnet id", subnet)));
        }
    }
}

/// Check a configuration without declaring anything.
pub fn check(config: &Config) -> Vec<Finding> {
    let mut findings = Vec::new();
    let network = &config.network;

    if network.vpc_id.is_empty() {
        findings.push(Finding::error("network.vpc_id", "not set"));
    } else if !VPC_ID.is_match(&network.vpc_id) {
        findings.push(Finding::error(
            "network.vpc_id",
            format!("'{}' is not a VPC id", network.vpc_id),
        ));
    }

    if network.private_subnets.is_empty() {
        findings.push(Finding::warning(
            "network.private_subnets",
            "empty; the database and cache subnet groups will be rejected at deploy time",
        ));
    }
    check_subnets("network.private_subnets", &network.private_subnets, &mut findings);

    if network.public_subnets.is_empty() {
        findings.push(Finding::warning(
            "network.public_subnets",
            "empty; the file system will have no mount targets",
        ));
    }
    check_subnets("network.public_subnets", &network.public_subnets, &mut findings);

    match config.security.security_group_id.as_deref() {
        None => findings.push(Finding::error("security.security_group_id", "not set")),
        Some(id) if !SECURITY_GROUP_ID.is_match(id) => findings.push(Finding::error(
            "security.security_group_id",
            format!("'{}' is not a security group id", id),
        )),
        Some(_) => {}
    }

    match config.secret.id.as_deref() {
        None | Some("") => findings.push(Finding::error("secret.id", "not set")),
        Some(_) => {}
    }

    findings
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        ctx.output.banner("PRIVX-INFRA VALIDATE");
        let findings = check(&ctx.config);

        for finding in &findings {
            ctx.output
                .finding(finding.level, finding.field, &finding.message);
        }

        let failed = findings.iter().any(|f| {
            f.level == FindingLevel::Error || (self.strict && f.level == FindingLevel::Warning)
        });

        if failed {
            ctx.output.error("Configuration is not valid");
            Ok(1)
        } else {
            ctx.output.finding(FindingLevel::Ok, "config", "valid");
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use privx_infra::network::NetworkContext;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.network = NetworkContext::new("vpc-0123456789abcdef0")
            .with_private_subnets(["subnet-0a1b2c3d"])
            .with_public_subnets(["subnet-1a2b3c4d"]);
        config.security.security_group_id = Some("sg-0a1b2c3d".to_string());
        config.secret.id = Some("privx/db".to_string());
        config
    }

    #[test]
    fn test_valid_config_has_no_findings() {
        assert!(check(&valid_config()).is_empty());
    }

    #[test]
    fn test_missing_references_are_errors() {
        let findings = check(&Config::default());
        let errors: Vec<_> = findings
            .iter()
            .filter(|f| f.level == FindingLevel::Error)
            .map(|f| f.field)
            .collect();
        assert_eq!(
            errors,
            vec!["network.vpc_id", "security.security_group_id", "secret.id"]
        );
    }

    #[test]
    fn test_empty_subnets_are_warnings() {
        let mut config = valid_config();
        config.network.public_subnets.clear();
        let findings = check(&config);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].level, FindingLevel::Warning);
        assert_eq!(findings[0].field, "network.public_subnets");
    }

    #[test]
    fn test_malformed_ids() {
        let mut config = valid_config();
        config.network.private_subnets = vec!["subnet-XYZ".to_string()];
        config.security.security_group_id = Some("group-1".to_string());
        let findings = check(&config);
        assert!(findings
            .iter()
            .any(|f| f.field == "network.private_subnets" && f.level == FindingLevel::Error));
        assert!(findings
            .iter()
            .any(|f| f.field == "security.security_group_id" && f.level == FindingLevel::Error));
    }
}
