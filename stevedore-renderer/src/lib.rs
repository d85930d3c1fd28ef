//! # stevedore-renderer
//!
//! Tera-based template engine that turns a project config plus a detected
//! stack into deployment artifacts (Dockerfile, compose file, Kubernetes
//! manifests, skaffold config).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stevedore_core::ProjectConfig;
//! use stevedore_detector::DetectedStack;
//! use stevedore_renderer::{Renderer, TemplateContext};
//!
//! fn render_all(config: &ProjectConfig, stack: &DetectedStack) {
//!     if let Ok(renderer) = Renderer::new() {
//!         let ctx = TemplateContext::new(config, stack);
//!         if let Ok(artifacts) = renderer.render_all(&ctx, config) {
//!             for artifact in artifacts {
//!                 println!("{}", artifact.path.display());
//!             }
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::TemplateContext;
pub use engine::{ArtifactKind, Renderer, TemplateEngine};
pub use error::RenderError;
