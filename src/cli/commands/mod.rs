//! Subcommands module for privx-infra CLI
//!
//! This module contains all the subcommand implementations.

pub mod list;
pub mod synth;
pub mod validate;

use crate::cli::output::OutputFormatter;
use anyhow::{Context, Result};
use privx_infra::config::{Config, TemplateFormat, DEFAULT_STACK_DESCRIPTION};
use privx_infra::resources::{storage, StorageHandles};
use privx_infra::Stack;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
    /// Effective template format
    pub format: TemplateFormat,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: Config) -> Self {
        let output = OutputFormatter::new(!cli.no_color && config.output.color(), cli.verbosity());
        let format = cli
            .format
            .map(TemplateFormat::from)
            .unwrap_or_else(|| config.output.format());

        Self {
            config,
            output,
            format,
        }
    }

    /// Declare the storage tier into a fresh stack.
    pub fn build_stack(&self) -> Result<(Stack, StorageHandles)> {
        let context = self
            .config
            .storage_context()
            .context("Incomplete configuration, run `privx-infra validate` for details")?;

        let description = self
            .config
            .stack
            .description
            .as_deref()
            .unwrap_or(DEFAULT_STACK_DESCRIPTION);
        let mut stack = Stack::new(&self.config.stack.name).with_description(description);

        if context.network.public_subnets.is_empty() {
            self.output
                .warning("No public subnets configured; EFS will have no mount targets");
        }

        self.output
            .debug(&format!("Declaring storage tier in stack '{}'", stack.name()));
        let handles = storage(&mut stack.scope(), &context)?;

        Ok((stack, handles))
    }
}
