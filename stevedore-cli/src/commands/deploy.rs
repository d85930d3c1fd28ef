//! `stevedore deploy [PATH]`: reconcile the deployment files, then hand over
//! to docker compose, skaffold or kubectl.

use std::io;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use stevedore_reconcile::{pipeline, rollback, Session};

use super::plan::{prompt_for, OverwriteArgs, Plan, ProjectArgs};
use super::summary;
use crate::tooling;

/// Arguments for `stevedore deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub overwrite: OverwriteArgs,

    /// Deploy the existing image without building.
    #[arg(long)]
    pub skip_build: bool,
}

impl DeployArgs {
    pub fn run(self) -> Result<()> {
        let plan = Plan::build(&self.project)?;
        let (policy, mut prompt) = prompt_for(self.overwrite.policy(false));

        let mut stdout = io::stdout();
        let mut stderr = io::stderr();
        let session = Session::new(&plan.root, policy, prompt.as_mut(), &mut stdout, &mut stderr);
        let applied = pipeline::run(session, plan.config_dirs(), &plan.artifacts).map_err(|aborted| {
            let rolled_back = summary::describe_rollback(&aborted.rollback);
            anyhow::Error::new(aborted).context(format!("deploy failed; {rolled_back}"))
        })?;
        println!("{}", summary::render(&applied.reports));

        let commands = tooling::plan(
            plan.config.target,
            &plan.config.image,
            self.skip_build,
            tooling::on_path("skaffold"),
        );
        if let Err(err) = tooling::run_all(&commands, &plan.root) {
            let report = rollback(&plan.root, applied.ledger);
            return Err(err.context(format!(
                "deploy failed; {}",
                summary::describe_rollback(&report)
            )));
        }

        println!(
            "{} deployed {} to {}",
            "✓".green().bold(),
            plan.config.name,
            plan.config.target
        );
        Ok(())
    }
}
