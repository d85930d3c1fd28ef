use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use stevedore_core::{AppName, ArtifactContent, DeployTarget, ProjectConfig};
use stevedore_detector::{Confidence, DetectedStack, Language, Service};
use stevedore_renderer::{ArtifactKind, Renderer, TemplateContext};
use tempfile::TempDir;

fn make_config(target: DeployTarget) -> ProjectConfig {
    ProjectConfig {
        name: AppName::from("shop"),
        target,
        port: 3000,
        image: "ghcr.io/acme/shop".to_string(),
        replicas: 2,
        env: BTreeMap::from([("NODE_ENV".to_string(), "production".to_string())]),
        overrides: BTreeMap::new(),
    }
}

fn make_stack(language: Language) -> DetectedStack {
    DetectedStack {
        language,
        framework: None,
        declared_name: None,
        base_image: "node:20-alpine".to_string(),
        port: 3000,
        run_command: vec!["npm".to_string(), "start".to_string()],
        services: vec![Service::Redis],
        confidence: Confidence::Medium,
    }
}

fn resolved(renderer: &Renderer, config: &ProjectConfig, stack: &DetectedStack) -> Vec<(PathBuf, String)> {
    let ctx = TemplateContext::new(config, stack);
    renderer
        .render_all(&ctx, config)
        .expect("render_all")
        .into_iter()
        .map(|a| {
            let text = a.resolve().expect("resolve");
            (a.path, text)
        })
        .collect()
}

fn find<'a>(outputs: &'a [(PathBuf, String)], path: &Path) -> &'a str {
    outputs
        .iter()
        .find(|(p, _)| p == path)
        .map(|(_, c)| c.as_str())
        .unwrap_or_else(|| panic!("no output for {}", path.display()))
}

#[test]
fn compose_target_renders_expected_paths() {
    let renderer = Renderer::new().unwrap();
    let outputs = resolved(
        &renderer,
        &make_config(DeployTarget::Compose),
        &make_stack(Language::JavaScript),
    );
    let paths: Vec<_> = outputs.iter().map(|(p, _)| p.clone()).collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("Dockerfile"),
            PathBuf::from(".dockerignore"),
            PathBuf::from("docker-compose.yaml"),
        ]
    );
}

#[test]
fn kubernetes_target_renders_manifests() {
    let renderer = Renderer::new().unwrap();
    let outputs = resolved(
        &renderer,
        &make_config(DeployTarget::Kubernetes),
        &make_stack(Language::TypeScript),
    );
    assert_eq!(outputs.len(), 5);

    let deployment: Value =
        serde_yaml::from_str(find(&outputs, &Path::new("k8s").join("deployment.yaml"))).unwrap();
    assert_eq!(deployment["kind"], Value::from("Deployment"));
    assert_eq!(deployment["spec"]["replicas"], Value::from(2));
    let container = &deployment["spec"]["template"]["spec"]["containers"][0];
    assert_eq!(container["image"], Value::from("ghcr.io/acme/shop"));
    assert_eq!(container["ports"][0]["containerPort"], Value::from(3000));
    assert_eq!(container["env"][0]["name"], Value::from("NODE_ENV"));

    let service: Value =
        serde_yaml::from_str(find(&outputs, &Path::new("k8s").join("service.yaml"))).unwrap();
    assert_eq!(service["spec"]["selector"]["app"], Value::from("shop"));
}

#[test]
fn compose_includes_backing_services() {
    let renderer = Renderer::new().unwrap();
    let outputs = resolved(
        &renderer,
        &make_config(DeployTarget::Compose),
        &make_stack(Language::JavaScript),
    );
    let compose: Value = serde_yaml::from_str(find(&outputs, Path::new("docker-compose.yaml"))).unwrap();
    assert_eq!(compose["services"]["shop"]["ports"][0], Value::from("3000:3000"));
    assert_eq!(
        compose["services"]["shop"]["environment"]["NODE_ENV"],
        Value::from("production")
    );
    assert_eq!(compose["services"]["shop"]["depends_on"][0], Value::from("redis"));
    assert_eq!(compose["services"]["redis"]["image"], Value::from("redis:7-alpine"));
}

#[test]
fn compose_without_env_or_services_is_valid_yaml() {
    let renderer = Renderer::new().unwrap();
    let mut config = make_config(DeployTarget::Compose);
    config.env.clear();
    let mut stack = make_stack(Language::JavaScript);
    stack.services.clear();
    let outputs = resolved(&renderer, &config, &stack);
    let compose: Value = serde_yaml::from_str(find(&outputs, Path::new("docker-compose.yaml"))).unwrap();
    assert!(compose["services"]["shop"].get("environment").is_none());
    assert!(compose["services"]["shop"].get("depends_on").is_none());
}

#[test]
fn dockerfile_uses_exec_form_cmd() {
    let renderer = Renderer::new().unwrap();
    let outputs = resolved(
        &renderer,
        &make_config(DeployTarget::Compose),
        &make_stack(Language::JavaScript),
    );
    let dockerfile = find(&outputs, Path::new("Dockerfile"));
    assert!(dockerfile.starts_with("FROM node:20-alpine"));
    assert!(dockerfile.contains("EXPOSE 3000"));
    assert!(dockerfile.contains(r#"CMD ["npm","start"]"#));
}

#[test]
fn overrides_are_attached_as_overlays() {
    let renderer = Renderer::new().unwrap();
    let mut config = make_config(DeployTarget::Kubernetes);
    config.overrides.insert(
        "k8s/deployment.yaml".to_string(),
        serde_yaml::from_str("spec:\n  replicas: 7\n").unwrap(),
    );
    let ctx = TemplateContext::new(&config, &make_stack(Language::JavaScript));
    let artifacts = renderer.render_all(&ctx, &config).unwrap();
    let deployment = artifacts
        .iter()
        .find(|a| a.path == Path::new("k8s").join("deployment.yaml"))
        .unwrap();
    assert!(matches!(
        &deployment.content,
        ArtifactContent::Merged { overlay, .. } if !overlay.is_null()
    ));

    let merged: Value = serde_yaml::from_str(&deployment.resolve().unwrap()).unwrap();
    assert_eq!(merged["spec"]["replicas"], Value::from(7));
    assert_eq!(merged["kind"], Value::from("Deployment"));
}

#[test]
fn user_template_overrides_embedded_dockerfile() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("dockerfile")).unwrap();
    std::fs::write(
        dir.path().join("dockerfile").join("node.tera"),
        "FROM custom/{{ app.name }}\n",
    )
    .unwrap();

    let renderer = Renderer::with_user_templates(dir.path()).unwrap();
    let ctx = TemplateContext::new(
        &make_config(DeployTarget::Compose),
        &make_stack(Language::JavaScript),
    );
    let artifact = renderer.render(&ctx, ArtifactKind::Dockerfile, None).unwrap();
    assert_eq!(artifact.resolve().unwrap().trim_end(), "FROM custom/shop");
}

#[test]
fn static_dockerfile_has_no_cmd() {
    let renderer = Renderer::new().unwrap();
    let mut stack = make_stack(Language::Static);
    stack.base_image = "nginx:alpine".to_string();
    stack.run_command.clear();
    let ctx = TemplateContext::new(&make_config(DeployTarget::Compose), &stack);
    let artifact = renderer.render(&ctx, ArtifactKind::Dockerfile, None).unwrap();
    let text = artifact.resolve().unwrap();
    assert!(text.contains("/usr/share/nginx/html"));
    assert!(!text.contains("CMD"));
}

#[test]
fn rendering_is_deterministic() {
    let renderer = Renderer::new().unwrap();
    let config = make_config(DeployTarget::Kubernetes);
    let stack = make_stack(Language::JavaScript);
    assert_eq!(
        resolved(&renderer, &config, &stack),
        resolved(&renderer, &config, &stack)
    );
}
