//! Tera rendering engine: [`ArtifactKind`] enum and [`Renderer`].
//!
//! # Path mapping
//!
//! | Kind         | Output path            | Target     | Content |
//! |--------------|------------------------|------------|---------|
//! | Dockerfile   | `Dockerfile`           | both       | literal |
//! | DockerIgnore | `.dockerignore`        | both       | literal |
//! | Compose      | `docker-compose.yaml`  | compose    | merged  |
//! | Deployment   | `k8s/deployment.yaml`  | kubernetes | merged  |
//! | Service      | `k8s/service.yaml`     | kubernetes | merged  |
//! | Skaffold     | `skaffold.yaml`        | kubernetes | merged  |
//!
//! Merged kinds are parsed into YAML after rendering so that the overlay from
//! `stevedore.yaml` can be deep-merged on top by the reconciler.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tera::Tera;

use stevedore_core::{Artifact, DeployTarget, ProjectConfig};

use crate::context::TemplateContext;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates: baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("dockerfile/node.tera", include_str!("templates/dockerfile/node.tera")),
    ("dockerfile/python.tera", include_str!("templates/dockerfile/python.tera")),
    ("dockerfile/ruby.tera", include_str!("templates/dockerfile/ruby.tera")),
    ("dockerfile/go.tera", include_str!("templates/dockerfile/go.tera")),
    ("dockerfile/static.tera", include_str!("templates/dockerfile/static.tera")),
    ("dockerignore.tera", include_str!("templates/dockerignore.tera")),
    ("compose.yaml.tera", include_str!("templates/compose.yaml.tera")),
    (
        "k8s/deployment.yaml.tera",
        include_str!("templates/k8s/deployment.yaml.tera"),
    ),
    ("k8s/service.yaml.tera", include_str!("templates/k8s/service.yaml.tera")),
    ("skaffold.yaml.tera", include_str!("templates/skaffold.yaml.tera")),
];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .to_lowercase()
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    let mut templates = Vec::new();
    for path in files {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert(
            normalize_template_name(Path::new(name)),
            (*content).to_string(),
        );
    }
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

/// Every artifact Stevedore can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Dockerfile,
    DockerIgnore,
    Compose,
    Deployment,
    Service,
    Skaffold,
}

impl ArtifactKind {
    /// All kinds in a stable order.
    pub fn all() -> &'static [ArtifactKind] {
        &[
            ArtifactKind::Dockerfile,
            ArtifactKind::DockerIgnore,
            ArtifactKind::Compose,
            ArtifactKind::Deployment,
            ArtifactKind::Service,
            ArtifactKind::Skaffold,
        ]
    }

    /// Kinds generated for `target`, in write order.
    pub fn for_target(target: DeployTarget) -> &'static [ArtifactKind] {
        match target {
            DeployTarget::Compose => &[
                ArtifactKind::Dockerfile,
                ArtifactKind::DockerIgnore,
                ArtifactKind::Compose,
            ],
            DeployTarget::Kubernetes => &[
                ArtifactKind::Dockerfile,
                ArtifactKind::DockerIgnore,
                ArtifactKind::Deployment,
                ArtifactKind::Service,
                ArtifactKind::Skaffold,
            ],
        }
    }

    /// Template name for this kind. Dockerfiles vary by runtime family.
    pub fn template_name(&self, family: &str) -> String {
        match self {
            ArtifactKind::Dockerfile => format!("dockerfile/{family}.tera"),
            ArtifactKind::DockerIgnore => "dockerignore.tera".to_string(),
            ArtifactKind::Compose => "compose.yaml.tera".to_string(),
            ArtifactKind::Deployment => "k8s/deployment.yaml.tera".to_string(),
            ArtifactKind::Service => "k8s/service.yaml.tera".to_string(),
            ArtifactKind::Skaffold => "skaffold.yaml.tera".to_string(),
        }
    }

    /// Output path relative to the project root.
    pub fn output_path(&self) -> PathBuf {
        match self {
            ArtifactKind::Dockerfile => PathBuf::from("Dockerfile"),
            ArtifactKind::DockerIgnore => PathBuf::from(".dockerignore"),
            ArtifactKind::Compose => PathBuf::from("docker-compose.yaml"),
            ArtifactKind::Deployment => Path::new("k8s").join("deployment.yaml"),
            ArtifactKind::Service => Path::new("k8s").join("service.yaml"),
            ArtifactKind::Skaffold => PathBuf::from("skaffold.yaml"),
        }
    }

    /// Whether the rendered output is YAML that accepts an overlay.
    pub fn is_structured(&self) -> bool {
        !matches!(self, ArtifactKind::Dockerfile | ArtifactKind::DockerIgnore)
    }
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine for rendering templates with optional user overrides.
///
/// `user_template_dir` may contain `.tera` files that override embedded
/// defaults (e.g. `dockerfile/node.tera`). Template names are normalised to
/// lowercase relative paths.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let tera = build_tera(user_template_dir)?;
        Ok(TemplateEngine { tera })
    }

    /// Render one artifact. `overlay` only applies to structured kinds.
    pub fn render(
        &self,
        ctx: &TemplateContext,
        kind: ArtifactKind,
        overlay: Option<&Value>,
    ) -> Result<Artifact, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        let name = kind.template_name(&ctx.runtime.family);
        let rendered = self.tera.render(&name, &tera_ctx)?;
        let path = kind.output_path();

        if !kind.is_structured() {
            return Ok(Artifact::literal(path, rendered));
        }

        let template: Value = serde_yaml::from_str(&rendered).map_err(|source| RenderError::Yaml {
            template: name.clone(),
            source,
        })?;
        Ok(Artifact::merged(
            path,
            template,
            overlay.cloned().unwrap_or(Value::Null),
        ))
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renderer for every artifact kind of a deploy target.
///
/// Create once with [`Renderer::new`] and reuse.
pub struct Renderer {
    engine: TemplateEngine,
}

impl Renderer {
    /// Construct a new [`Renderer`] with embedded templates.
    pub fn new() -> Result<Self, RenderError> {
        Ok(Renderer { engine: TemplateEngine::new(None)? })
    }

    /// Construct a [`Renderer`] whose templates may be overridden from `dir`.
    pub fn with_user_templates(dir: &Path) -> Result<Self, RenderError> {
        Ok(Renderer { engine: TemplateEngine::new(Some(dir))? })
    }

    pub fn render(
        &self,
        ctx: &TemplateContext,
        kind: ArtifactKind,
        overlay: Option<&Value>,
    ) -> Result<Artifact, RenderError> {
        self.engine.render(ctx, kind, overlay)
    }

    /// Render every artifact for `config.target`, attaching the overlays
    /// configured under `overrides`.
    pub fn render_all(
        &self,
        ctx: &TemplateContext,
        config: &ProjectConfig,
    ) -> Result<Vec<Artifact>, RenderError> {
        ArtifactKind::for_target(config.target)
            .iter()
            .map(|kind| {
                let overlay = config.overlay_for(&kind.output_path());
                self.render(ctx, *kind, overlay)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
