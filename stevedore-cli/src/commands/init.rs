//! `stevedore init [PATH] [--target ...] [--force | --non-interactive] [--dry-run]`

use std::io;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use stevedore_reconcile::{pipeline, Session};

use super::plan::{prompt_for, OverwriteArgs, Plan, ProjectArgs};
use super::summary;

/// Detect the stack and write the deployment files.
#[derive(Args, Debug)]
pub struct InitArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub overwrite: OverwriteArgs,

    /// Print the generated files to stdout instead of writing them.
    #[arg(long)]
    pub dry_run: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let plan = Plan::build(&self.project)?;
        let (policy, mut prompt) = prompt_for(self.overwrite.policy(self.dry_run));

        let mut stdout = io::stdout();
        let mut stderr = io::stderr();
        let session = Session::new(&plan.root, policy, prompt.as_mut(), &mut stdout, &mut stderr);
        let applied = pipeline::run(session, plan.config_dirs(), &plan.artifacts).map_err(|aborted| {
            let rolled_back = summary::describe_rollback(&aborted.rollback);
            anyhow::Error::new(aborted).context(format!("init failed; {rolled_back}"))
        })?;

        let header = format!(
            "{} {} for {} ({})",
            "✓".green().bold(),
            plan.config.target,
            plan.config.name,
            plan.stack.language,
        );
        let table = summary::render(&applied.reports);
        if self.dry_run {
            // stdout carries only file content.
            eprintln!("[dry-run] {header}");
            eprintln!("{table}");
        } else {
            println!("{header}: {}", summary::tally(&applied.reports));
            println!("{table}");
            if let Some(hint) = summary::kept_hint(&applied.reports) {
                println!("{hint}");
            }
        }
        Ok(())
    }
}
