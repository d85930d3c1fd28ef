//! Shared project resolution for `init`, `diff` and `deploy`: detect the
//! stack, merge configuration sources and render the artifacts.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use stevedore_core::{
    AppName, Artifact, DeployTarget, OverwriteMode, Policy, ProjectConfig, UserDefaults,
    PROJECT_CONFIG_FILE,
};
use stevedore_detector::{detect_stack, DetectedStack};
use stevedore_reconcile::{NoPrompt, PromptGateway, TerminalPrompt};
use stevedore_renderer::{Renderer, TemplateContext};

use crate::TargetArg;

/// Project selection and deployment parameters.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project root directory.
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Deploy target: compose | kubernetes.
    #[arg(long, short = 't', value_name = "TARGET")]
    pub target: Option<TargetArg>,

    /// Application name (defaults to the package name or directory name).
    #[arg(long)]
    pub name: Option<String>,

    /// Port the application listens on.
    #[arg(long)]
    pub port: Option<u16>,

    /// Image reference to build and deploy.
    #[arg(long)]
    pub image: Option<String>,

    /// Replica count (kubernetes).
    #[arg(long)]
    pub replicas: Option<u32>,
}

/// How to treat existing files that differ from the generated ones.
#[derive(Args, Debug, Clone, Copy)]
pub struct OverwriteArgs {
    /// Overwrite differing files without asking.
    #[arg(long, conflicts_with = "non_interactive")]
    pub force: bool,

    /// Never ask; keep existing files that differ.
    #[arg(long)]
    pub non_interactive: bool,
}

impl OverwriteArgs {
    pub fn policy(&self, dry_run: bool) -> Policy {
        let policy = if self.force {
            Policy::force()
        } else if self.non_interactive {
            Policy::non_interactive()
        } else {
            Policy::interactive()
        };
        policy.with_dry_run(dry_run)
    }
}

/// Pick a prompt gateway for `policy`. An interactive run without a terminal
/// on stdin is downgraded to non-interactive.
pub fn prompt_for(policy: Policy) -> (Policy, Box<dyn PromptGateway>) {
    if policy.dry_run || policy.mode != OverwriteMode::Interactive {
        return (policy, Box::new(NoPrompt));
    }
    if std::io::stdin().is_terminal() {
        (policy, Box::new(TerminalPrompt::new()))
    } else {
        tracing::info!("stdin is not a terminal; differing files will be kept");
        (
            Policy::non_interactive().with_dry_run(policy.dry_run),
            Box::new(NoPrompt),
        )
    }
}

/// Everything needed to reconcile one project.
pub struct Plan {
    pub root: PathBuf,
    pub config: ProjectConfig,
    pub stack: DetectedStack,
    /// Rendered artifacts followed by `stevedore.yaml`.
    pub artifacts: Vec<Artifact>,
}

impl Plan {
    pub fn build(args: &ProjectArgs) -> Result<Plan> {
        let root = args
            .path
            .canonicalize()
            .with_context(|| format!("cannot resolve path '{}'", args.path.display()))?;
        let stack = detect_stack(&root)
            .with_context(|| format!("could not detect the stack in '{}'", root.display()))?;
        tracing::debug!(
            "detected {} ({:?} confidence)",
            stack.language,
            stack.confidence
        );

        let existing = ProjectConfig::load_at(&root)
            .with_context(|| format!("failed to read {PROJECT_CONFIG_FILE}"))?;
        let defaults = UserDefaults::load().context("failed to read user defaults")?;
        let config = resolve_config(args, existing, &defaults, &stack, &root);

        let renderer = Renderer::with_user_templates(&root.join(".stevedore").join("templates"))
            .context("failed to load templates")?;
        let ctx = TemplateContext::new(&config, &stack);
        let mut artifacts = renderer
            .render_all(&ctx, &config)
            .context("failed to render artifacts")?;
        let config_yaml = config
            .to_yaml()
            .with_context(|| format!("failed to serialize {PROJECT_CONFIG_FILE}"))?;
        artifacts.push(Artifact::literal(PROJECT_CONFIG_FILE, config_yaml));

        Ok(Plan {
            root,
            config,
            stack,
            artifacts,
        })
    }

    pub fn config_dirs(&self) -> &'static [&'static str] {
        self.config.target.config_dirs()
    }
}

/// Flags > project config > user defaults > detected stack.
pub(crate) fn resolve_config(
    args: &ProjectArgs,
    existing: Option<ProjectConfig>,
    defaults: &UserDefaults,
    stack: &DetectedStack,
    root: &Path,
) -> ProjectConfig {
    let (saved_name, saved_target, saved_port, saved_image, saved_replicas, env, overrides) =
        match existing {
            Some(c) => (
                Some(c.name),
                Some(c.target),
                Some(c.port),
                Some(c.image),
                Some(c.replicas),
                c.env,
                c.overrides,
            ),
            None => (None, None, None, None, None, Default::default(), Default::default()),
        };

    let name = args
        .name
        .as_deref()
        .map(AppName::sanitized)
        .or(saved_name)
        .or_else(|| stack.declared_name.as_deref().map(AppName::sanitized))
        .unwrap_or_else(|| {
            let dir = root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            AppName::sanitized(&dir)
        });

    let target = args
        .target
        .map(DeployTarget::from)
        .or(saved_target)
        .or(defaults.target)
        .unwrap_or_default();

    let image = args
        .image
        .clone()
        .or(saved_image)
        .unwrap_or_else(|| defaults.qualify_image(&name.0));

    ProjectConfig {
        target,
        port: args.port.or(saved_port).unwrap_or(stack.port),
        image,
        replicas: args.replicas.or(saved_replicas).unwrap_or(1),
        env,
        overrides,
        name,
    }
}
