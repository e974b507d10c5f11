//! CLI module for privx-infra
//!
//! This module provides the command-line interface, including argument
//! parsing and subcommand handling.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use privx_infra::config::TemplateFormat;
use std::path::PathBuf;

/// privx-infra - the PrivX storage tier as code
///
/// Declares RDS PostgreSQL, ElastiCache Redis and EFS for PrivX and
/// synthesizes a CloudFormation template.
#[derive(Parser, Debug, Clone)]
#[command(name = "privx-infra")]
#[command(author = "PrivX Infra Contributors")]
#[command(version)]
#[command(about = "Declare the PrivX storage tier and synthesize a CloudFormation template", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "PRIVX_INFRA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Template format (overrides the config file)
    #[arg(long, global = true)]
    pub format: Option<FormatArg>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Template format flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// CloudFormation JSON
    Json,
    /// CloudFormation YAML
    Yaml,
}

impl From<FormatArg> for TemplateFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => TemplateFormat::Json,
            FormatArg::Yaml => TemplateFormat::Yaml,
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Synthesize the CloudFormation template
    Synth(commands::synth::SynthArgs),

    /// List the resources that would be declared
    List(commands::list::ListArgs),

    /// Validate the network, security group and secret settings
    Validate(commands::validate::ValidateArgs),

    /// Write a sample configuration file
    Init(InitArgs),
}

/// Arguments for init command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Directory to write privx-infra.toml into
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }
}
