//! `stevedore diff [PATH]`: show unified diffs for what `init` would write.

use std::fs;
use std::io;

use anyhow::{Context, Result};
use clap::Args;

use stevedore_reconcile::diff::unified_diff;

use super::plan::{Plan, ProjectArgs};

/// Arguments for `stevedore diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let plan = Plan::build(&self.project)?;

        let mut any = false;
        for artifact in &plan.artifacts {
            let desired = artifact
                .resolve()
                .with_context(|| format!("failed to resolve {}", artifact.path.display()))?;
            let target = plan.root.join(&artifact.path);
            let current = match fs::read_to_string(&target) {
                Ok(text) => text,
                Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
                Err(e) => {
                    return Err(e).with_context(|| format!("cannot read {}", target.display()))
                }
            };
            if current == desired {
                continue;
            }
            any = true;
            let diff = unified_diff(&artifact.path, &current, &desired);
            print!("{diff}");
            if !diff.ends_with('\n') {
                println!();
            }
        }

        if !any {
            println!("No differences for '{}'.", plan.config.name);
        }
        Ok(())
    }
}
