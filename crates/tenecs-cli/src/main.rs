//! Tenecs type checker CLI
//!
//! Reads parsed files (JSON-serialized `FileTopLevel`s, as produced by the
//! parser) and type checks them as one package.

mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tenecs_engine::CheckerConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tenecs")]
#[command(about = "Tenecs type checker", long_about = None)]
#[command(version)]
struct Cli {
    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file; tenecs.toml in the working directory is used when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// When to use colors: auto, always, never
    #[arg(long, global = true)]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Type-check a package
    Check {
        /// Parsed files or directories containing them
        #[arg(default_value = ".")]
        files: Vec<String>,
        #[command(flatten)]
        options: CheckOptions,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },

    /// List the tests and entry points of a package
    Tests {
        /// Parsed files or directories containing them
        #[arg(default_value = ".")]
        files: Vec<String>,
        #[command(flatten)]
        options: CheckOptions,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
}

/// Flags overriding the `[checker]` table
#[derive(clap::Args)]
pub struct CheckOptions {
    /// Check declarations one after another on this thread
    #[arg(long)]
    sequential: bool,
    /// Maximum concurrent declaration workers
    #[arg(long)]
    max_workers: Option<usize>,
    /// Per-declaration timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Stop at the first error
    #[arg(long)]
    fail_fast: bool,
}

impl CheckOptions {
    fn apply(&self, config: &mut CheckerConfig) {
        if self.sequential {
            config.parallel = false;
        }
        if let Some(max_workers) = self.max_workers {
            config.max_workers = max_workers;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if self.fail_fast {
            config.fail_fast = true;
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Colored diagnostics with source excerpts
    Pretty,
    /// Numbered lines with a caret under each error
    Caret,
    /// Machine-readable summary on stdout
    Json,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<CheckerConfig> {
    match path {
        Some(path) => CheckerConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e)),
        None => {
            let default = PathBuf::from("tenecs.toml");
            if default.is_file() {
                CheckerConfig::from_file(&default).map_err(|e| anyhow::anyhow!("tenecs.toml: {}", e))
            } else {
                Ok(CheckerConfig::default())
            }
        }
    }
}

fn init_logging(verbose: u8, config: &CheckerConfig) {
    let level = match verbose {
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    init_logging(cli.verbose, &config);
    let color = output::resolve_color_choice(cli.color.as_deref());

    let passed = match cli.command {
        Commands::Check { files, options, format } => {
            options.apply(&mut config);
            config.validate()?;
            commands::check::execute(&files, &config, format, color)?
        }
        Commands::Tests { files, options, format } => {
            options.apply(&mut config);
            config.validate()?;
            commands::tests::execute(&files, &config, format, color)?
        }
    };

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from(["tenecs", "check", "--sequential", "--timeout-ms", "250", "pkg"]);
        let mut config = CheckerConfig::default();
        match cli.command {
            Commands::Check { files, options, format } => {
                options.apply(&mut config);
                assert_eq!(files, vec!["pkg".to_string()]);
                assert!(format == Format::Pretty);
            }
            Commands::Tests { .. } => panic!("parsed the wrong command"),
        }
        assert!(!config.parallel);
        assert_eq!(config.timeout_ms, 250);
        assert!(!config.fail_fast);
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::parse_from(["tenecs", "tests", "-vv", "--format", "json"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Tests { format: Format::Json, .. }));
    }
}
