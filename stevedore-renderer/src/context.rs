//! Template context: serializable rendering payload built from a
//! [`ProjectConfig`] and a [`DetectedStack`].

use serde::{Deserialize, Serialize};

use stevedore_core::ProjectConfig;
use stevedore_detector::DetectedStack;

use crate::error::RenderError;

/// Rendering payload shared by every template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateContext {
    pub app: AppCtx,
    pub runtime: RuntimeCtx,
    /// Environment variables, sorted by name.
    pub env: Vec<EnvVarCtx>,
    /// Backing services started next to the app (compose only).
    pub services: Vec<ServiceCtx>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppCtx {
    pub name: String,
    pub image: String,
    pub port: u16,
    pub replicas: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeCtx {
    /// Template family: `node`, `python`, `ruby`, `go`, `static`.
    pub family: String,
    pub language: String,
    pub framework: Option<String>,
    pub base_image: String,
    pub run_command: Vec<String>,
    /// `run_command` as a JSON array, ready for exec-form `CMD`.
    pub run_command_json: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvVarCtx {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCtx {
    pub name: String,
    pub image: String,
    pub port: u16,
}

impl TemplateContext {
    pub fn new(config: &ProjectConfig, stack: &DetectedStack) -> Self {
        let run_command_json =
            serde_json::to_string(&stack.run_command).unwrap_or_else(|_| "[]".to_string());
        TemplateContext {
            app: AppCtx {
                name: config.name.0.clone(),
                image: config.image.clone(),
                port: config.port,
                replicas: config.replicas,
            },
            runtime: RuntimeCtx {
                family: stack.language.family().to_string(),
                language: stack.language.to_string(),
                framework: stack.framework.clone(),
                base_image: stack.base_image.clone(),
                run_command: stack.run_command.clone(),
                run_command_json,
            },
            env: config
                .env
                .iter()
                .map(|(name, value)| EnvVarCtx {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect(),
            services: stack
                .services
                .iter()
                .map(|s| ServiceCtx {
                    name: s.name().to_string(),
                    image: s.image().to_string(),
                    port: s.port(),
                })
                .collect(),
        }
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use stevedore_core::{AppName, DeployTarget};
    use stevedore_detector::{Confidence, Language, Service};

    fn config() -> ProjectConfig {
        ProjectConfig {
            name: AppName::from("web"),
            target: DeployTarget::Compose,
            port: 3000,
            image: "web".to_string(),
            replicas: 1,
            env: BTreeMap::from([
                ("PORT".to_string(), "3000".to_string()),
                ("NODE_ENV".to_string(), "production".to_string()),
            ]),
            overrides: BTreeMap::new(),
        }
    }

    fn stack() -> DetectedStack {
        DetectedStack {
            language: Language::JavaScript,
            framework: Some("Express".to_string()),
            declared_name: None,
            base_image: "node:20-alpine".to_string(),
            port: 3000,
            run_command: vec!["npm".to_string(), "start".to_string()],
            services: vec![Service::Redis],
            confidence: Confidence::High,
        }
    }

    #[test]
    fn context_fields_populated() {
        let ctx = TemplateContext::new(&config(), &stack());
        assert_eq!(ctx.app.name, "web");
        assert_eq!(ctx.runtime.family, "node");
        assert_eq!(ctx.runtime.run_command_json, r#"["npm","start"]"#);
        assert_eq!(ctx.services[0].name, "redis");
        let names: Vec<_> = ctx.env.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["NODE_ENV", "PORT"]);
    }

    #[test]
    fn to_tera_context_succeeds() {
        let ctx = TemplateContext::new(&config(), &stack());
        ctx.to_tera_context().expect("context conversion");
    }
}
