//! List command - show declared resources without rendering a template

use super::CommandContext;
use anyhow::Result;
use clap::Parser;

/// Arguments for the list command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Only show resources of this type, e.g. AWS::EFS::MountTarget
    #[arg(short = 't', long = "type")]
    pub resource_type: Option<String>,
}

impl ListArgs {
    /// Execute the list command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let (stack, _) = ctx.build_stack()?;

        ctx.output.resource_header();
        let mut shown = 0;
        for resource in stack.resources().filter(|r| {
            self.resource_type
                .as_deref()
                .map_or(true, |t| r.resource_type == t)
        }) {
            ctx.output.resource_row(resource);
            shown += 1;
        }

        ctx.output
            .summary(&format!("{} of {} resources", shown, stack.len()));
        Ok(0)
    }
}
