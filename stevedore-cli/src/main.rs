//! Stevedore: scaffold and deploy container configuration for app projects.
//!
//! # Usage
//!
//! ```text
//! stevedore init [PATH] [--target compose|kubernetes] [--force | --non-interactive] [--dry-run]
//! stevedore diff [PATH] [--target ...]
//! stevedore deploy [PATH] [--target ...] [--force | --non-interactive] [--skip-build]
//! ```

mod commands;
mod tooling;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{deploy::DeployArgs, diff::DiffArgs, init::InitArgs};
use stevedore_core::DeployTarget;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stevedore",
    version,
    about = "Generate and deploy container configuration for app projects",
    long_about = None,
)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect the stack and write Dockerfile, compose or Kubernetes files.
    Init(InitArgs),

    /// Show unified diffs of what `init` would change.
    Diff(DiffArgs),

    /// Reconcile generated files, then build and deploy with the target's tools.
    Deploy(DeployArgs),
}

// ---------------------------------------------------------------------------
// Shared DeployTarget argument
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse `DeployTarget` from CLI args.
#[derive(Debug, Clone, Copy)]
pub struct TargetArg(pub DeployTarget);

impl FromStr for TargetArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compose" | "docker-compose" => Ok(Self(DeployTarget::Compose)),
            "kubernetes" | "k8s" => Ok(Self(DeployTarget::Kubernetes)),
            other => Err(format!(
                "unknown target '{other}'; expected: compose, kubernetes"
            )),
        }
    }
}

impl fmt::Display for TargetArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<TargetArg> for DeployTarget {
    fn from(t: TargetArg) -> Self {
        t.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Deploy(args) => args.run(),
    }
}
