//! Synth command - render the CloudFormation template
//!
//! Prints the template to stdout, or writes it to `--out`.

use super::CommandContext;
use anyhow::{Context, Result};
use clap::Parser;
use privx_infra::config::TemplateFormat;
use std::path::PathBuf;

/// Arguments for the synth command
#[derive(Parser, Debug, Clone)]
pub struct SynthArgs {
    /// Write the template to this file instead of stdout
    #[arg(short = 'o', long)]
    pub out: Option<PathBuf>,
}

impl SynthArgs {
    /// Execute the synth command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let (stack, _) = ctx.build_stack()?;
        let template = stack.synthesize();

        let rendered = match ctx.format {
            TemplateFormat::Json => template.to_json()?,
            TemplateFormat::Yaml => template.to_yaml()?,
        };

        match &self.out {
            Some(path) => {
                ctx.output.info(&format!("Synthesizing stack '{}'", stack.name()));
                std::fs::write(path, &rendered)
                    .with_context(|| format!("Failed to write template: {}", path.display()))?;
                ctx.output.summary(&format!(
                    "Wrote {} resources to {}",
                    template.resources.len(),
                    path.display()
                ));
            }
            None => println!("{}", rendered.trim_end()),
        }

        Ok(0)
    }
}
