//! privx-infra - the PrivX storage tier as code
//!
//! This is the main entry point for the privx-infra CLI.

mod cli;

use anyhow::{Context, Result};
use cli::commands::CommandContext;
use cli::{Cli, Commands};
use privx_infra::config::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

const SAMPLE_CONFIG: &str = r#"# privx-infra configuration
# TOML, YAML (.yml/.yaml) and JSON (.json) are accepted.

[stack]
name = "PrivX"
description = "PrivX storage tier"

[network]
# Existing VPC and its subnets. The database and cache use the private
# subnets; the file system gets one mount target per public subnet.
vpc_id = "vpc-0123456789abcdef0"
private_subnets = ["subnet-0a1b2c3d4e5f60718", "subnet-1a2b3c4d5e6f70819"]
public_subnets = ["subnet-2a3b4c5d6e7f8091a", "subnet-3a4b5c6d7e8f90a1b"]

[security]
# Security group shared by the PrivX hosts
security_group_id = "sg-0123456789abcdef0"

[secret]
# Secrets Manager secret whose JSON field "secret" holds the DB password
id = "privx/database"

[output]
format = "json"
color = true
"#;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbosity());

    if cli.verbosity() >= 2 {
        eprintln!("privx-infra v{}", VERSION);
    }

    if let Commands::Init(args) = &cli.command {
        let exit_code = init_config(&args.path, args.force)?;
        std::process::exit(exit_code);
    }

    let config = Config::load(cli.config.as_ref())?;
    let mut ctx = CommandContext::new(&cli, config);

    let exit_code = match &cli.command {
        Commands::Synth(args) => args.execute(&mut ctx)?,
        Commands::List(args) => args.execute(&mut ctx)?,
        Commands::Validate(args) => args.execute(&mut ctx)?,
        Commands::Init(_) => unreachable!("handled above"),
    };

    std::process::exit(exit_code);
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity >= 3),
        )
        .with(env_filter)
        .init();
}

/// Write a sample privx-infra.toml
fn init_config(path: &std::path::Path, force: bool) -> Result<i32> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))?;

    let config_path = path.join("privx-infra.toml");
    if config_path.exists() && !force {
        eprintln!(
            "{} already exists, use --force to overwrite",
            config_path.display()
        );
        return Ok(1);
    }

    std::fs::write(&config_path, SAMPLE_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    eprintln!("Created: {}", config_path.display());
    Ok(0)
}
