//! Output formatting module for privx-infra
//!
//! Status lines go to stderr so that a template printed on stdout can be
//! piped straight into the deployment pipeline.

use colored::Colorize;
use privx_infra::construct::ResourceDeclaration;
use std::time::Instant;

/// Severity of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingLevel {
    Ok,
    Warning,
    Error,
}

impl FindingLevel {
    /// Get the colored string representation
    pub fn colored_string(&self) -> String {
        match self {
            FindingLevel::Ok => "ok".green().to_string(),
            FindingLevel::Warning => "warning".yellow().to_string(),
            FindingLevel::Error => "error".red().bold().to_string(),
        }
    }

    /// Get the plain string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingLevel::Ok => "ok",
            FindingLevel::Warning => "warning",
            FindingLevel::Error => "error",
        }
    }
}

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// Verbosity level
    verbosity: u8,
    /// Start time for duration calculations
    start_time: Instant,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();
        colored::control::set_override(use_color);

        Self {
            use_color,
            verbosity,
            start_time: Instant::now(),
        }
    }

    /// Print a banner/header
    pub fn banner(&self, title: &str) {
        let line = "=".repeat(title.len() + 4);
        if self.use_color {
            eprintln!("\n{}", line.bright_blue());
            eprintln!("{}", format!("  {}  ", title).bright_blue().bold());
            eprintln!("{}\n", line.bright_blue());
        } else {
            eprintln!("\n{}", line);
            eprintln!("  {}  ", title);
            eprintln!("{}\n", line);
        }
    }

    /// Print an informational message
    pub fn info(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "info:".cyan(), message);
        } else {
            eprintln!("info: {}", message);
        }
    }

    /// Print a warning
    pub fn warning(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "warning:".yellow().bold(), message);
        } else {
            eprintln!("warning: {}", message);
        }
    }

    /// Print an error
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "error:".red().bold(), message);
        } else {
            eprintln!("error: {}", message);
        }
    }

    /// Print a debug message (only at -vv and above)
    pub fn debug(&self, message: &str) {
        if self.verbosity < 2 {
            return;
        }
        if self.use_color {
            eprintln!("{} {}", "debug:".bright_black(), message.bright_black());
        } else {
            eprintln!("debug: {}", message);
        }
    }

    /// Print one validation finding
    pub fn finding(&self, level: FindingLevel, field: &str, message: &str) {
        let level_str = if self.use_color {
            level.colored_string()
        } else {
            level.as_str().to_string()
        };
        println!("{}: [{}] {}", level_str, field, message);
    }

    /// Print one declared resource as a table row
    pub fn resource_row(&self, resource: &ResourceDeclaration) {
        if self.use_color {
            println!(
                "{:<40} {:<36} {}",
                resource.logical_id.bright_white().bold(),
                resource.resource_type.cyan(),
                resource.path.bright_black()
            );
        } else {
            println!(
                "{:<40} {:<36} {}",
                resource.logical_id, resource.resource_type, resource.path
            );
        }
    }

    /// Print the header of the resource table
    pub fn resource_header(&self) {
        let header = format!("{:<40} {:<36} {}", "LOGICAL ID", "TYPE", "PATH");
        if self.use_color {
            println!("{}", header.bold());
        } else {
            println!("{}", header);
        }
    }

    /// Print a closing summary line with elapsed time
    pub fn summary(&self, message: &str) {
        let elapsed = self.start_time.elapsed();
        let line = format!("{} ({:.2?})", message, elapsed);
        if self.use_color {
            eprintln!("{}", line.green());
        } else {
            eprintln!("{}", line);
        }
    }
}
