//! External deploy tools: which commands a target needs and how to run them.

use std::env;
use std::fmt;
use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};

use stevedore_core::DeployTarget;

/// One external command, run from the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    fn new(program: &str, args: &[&str]) -> Self {
        ToolCommand {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Commands that build and deploy `target`, in order.
///
/// Kubernetes prefers `skaffold run` when skaffold is installed; `skip_build`
/// goes straight to `kubectl apply`.
pub fn plan(
    target: DeployTarget,
    image: &str,
    skip_build: bool,
    skaffold_available: bool,
) -> Vec<ToolCommand> {
    match target {
        DeployTarget::Compose if skip_build => {
            vec![ToolCommand::new("docker", &["compose", "up", "-d"])]
        }
        DeployTarget::Compose => {
            vec![ToolCommand::new("docker", &["compose", "up", "--build", "-d"])]
        }
        DeployTarget::Kubernetes if skip_build => {
            vec![ToolCommand::new("kubectl", &["apply", "-f", "k8s"])]
        }
        DeployTarget::Kubernetes if skaffold_available => {
            vec![ToolCommand::new("skaffold", &["run"])]
        }
        DeployTarget::Kubernetes => vec![
            ToolCommand::new("docker", &["build", "-t", image, "."]),
            ToolCommand::new("kubectl", &["apply", "-f", "k8s"]),
        ],
    }
}

/// Whether `program` resolves to a file on `PATH`.
pub fn on_path(program: &str) -> bool {
    let Some(paths) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&paths).any(|dir| {
        let candidate = dir.join(program);
        candidate.is_file() || (cfg!(windows) && candidate.with_extension("exe").is_file())
    })
}

/// Run `commands` in `root`, stopping at the first failure.
pub fn run_all(commands: &[ToolCommand], root: &Path) -> Result<()> {
    for command in commands {
        tracing::info!("running: {command}");
        let status = Command::new(&command.program)
            .args(&command.args)
            .current_dir(root)
            .status()
            .with_context(|| format!("failed to start `{command}`"))?;
        if !status.success() {
            bail!("`{command}` exited with {status}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(commands: &[ToolCommand]) -> Vec<String> {
        commands.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn compose_builds_and_starts_detached() {
        assert_eq!(
            rendered(&plan(DeployTarget::Compose, "shop", false, false)),
            vec!["docker compose up --build -d"]
        );
        assert_eq!(
            rendered(&plan(DeployTarget::Compose, "shop", true, true)),
            vec!["docker compose up -d"]
        );
    }

    #[test]
    fn kubernetes_prefers_skaffold() {
        assert_eq!(
            rendered(&plan(DeployTarget::Kubernetes, "shop", false, true)),
            vec!["skaffold run"]
        );
    }

    #[test]
    fn kubernetes_without_skaffold_builds_then_applies() {
        assert_eq!(
            rendered(&plan(DeployTarget::Kubernetes, "ghcr.io/acme/shop", false, false)),
            vec!["docker build -t ghcr.io/acme/shop .", "kubectl apply -f k8s"]
        );
        assert_eq!(
            rendered(&plan(DeployTarget::Kubernetes, "shop", true, true)),
            vec!["kubectl apply -f k8s"]
        );
    }

    #[test]
    fn missing_program_is_not_on_path() {
        assert!(!on_path("stevedore-definitely-not-a-real-tool"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_tool_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = run_all(&[ToolCommand::new("false", &[])], tmp.path()).unwrap_err();
        assert!(err.to_string().contains("`false` exited"));
        run_all(&[ToolCommand::new("true", &[])], tmp.path()).unwrap();
    }
}
