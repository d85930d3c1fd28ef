//! Stack detection for `stevedore-detector`.
//!
//! `detect_stack(path)` inspects indicator files in a project root and returns
//! the language, framework, runtime defaults (base image, port, run command)
//! and backing services the project appears to use. Checks are ordered by
//! specificity: language-specific manifests take priority over loose files.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Confidence level of a detected stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confidence {
    /// Definitive indicator file with content match.
    High,
    /// Indicator file present but no framework match.
    Medium,
    /// Only a loose source file was found.
    Low,
}

/// Language family; selects the Dockerfile template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Ruby,
    Go,
    Static,
}

impl Language {
    /// Runtime family key used by templates (`node`, `python`, …).
    pub fn family(&self) -> &'static str {
        match self {
            Language::JavaScript | Language::TypeScript => "node",
            Language::Python => "python",
            Language::Ruby => "ruby",
            Language::Go => "go",
            Language::Static => "static",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Python => "Python",
            Language::Ruby => "Ruby",
            Language::Go => "Go",
            Language::Static => "Static",
        };
        f.write_str(s)
    }
}

/// A backing service the project talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Redis,
    Postgres,
    Mongo,
}

impl Service {
    pub fn name(&self) -> &'static str {
        match self {
            Service::Redis => "redis",
            Service::Postgres => "postgres",
            Service::Mongo => "mongo",
        }
    }

    pub fn image(&self) -> &'static str {
        match self {
            Service::Redis => "redis:7-alpine",
            Service::Postgres => "postgres:16-alpine",
            Service::Mongo => "mongo:7",
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            Service::Redis => 6379,
            Service::Postgres => 5432,
            Service::Mongo => 27017,
        }
    }
}

/// A detected technology stack for a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedStack {
    pub language: Language,
    /// Framework, if identified (e.g. `"Next.js"`, `"Flask"`).
    pub framework: Option<String>,
    /// Name declared by the project manifest, if any.
    pub declared_name: Option<String>,
    /// Container base image.
    pub base_image: String,
    /// Port the application listens on by default.
    pub port: u16,
    /// Container command; empty means "use the base image default".
    pub run_command: Vec<String>,
    /// Backing services referenced by dependencies.
    pub services: Vec<Service>,
    pub confidence: Confidence,
}

/// Errors from stack detection.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("could not determine stack for '{path}'; no known indicator file found")]
    UnknownStack { path: PathBuf },
}

fn read(path: &Path) -> Result<String, DetectError> {
    fs::read_to_string(path).map_err(|source| DetectError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Detect the technology stack of the project at `path`.
///
/// Checks indicator files in priority order. Returns `DetectError::UnknownStack`
/// if no known stack can be inferred.
pub fn detect_stack(path: &Path) -> Result<DetectedStack, DetectError> {
    if let Some(s) = detect_go(path)? { return Ok(s); }
    if let Some(s) = detect_ruby(path)? { return Ok(s); }
    if let Some(s) = detect_python_manifest(path)? { return Ok(s); }
    if let Some(s) = detect_node(path)? { return Ok(s); }
    if let Some(s) = detect_python_script(path)? { return Ok(s); }
    if let Some(s) = detect_static(path)? { return Ok(s); }

    Err(DetectError::UnknownStack { path: path.to_path_buf() })
}

// ---------------------------------------------------------------------------
// Language detectors
// ---------------------------------------------------------------------------

fn detect_node(path: &Path) -> Result<Option<DetectedStack>, DetectError> {
    let file = path.join("package.json");
    if !file.exists() { return Ok(None); }
    let content = read(&file)?;

    let json: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        DetectError::ParseError { path: file.clone(), message: e.to_string() }
    })?;

    let deps = collect_package_json_deps(&json);
    let is_typescript = path.join("tsconfig.json").exists() || deps.contains("typescript");
    let language = if is_typescript { Language::TypeScript } else { Language::JavaScript };

    // Most specific first: meta-frameworks depend on the generic servers.
    let framework = if deps.contains("next") {
        Some("Next.js")
    } else if deps.contains("nuxt") || deps.contains("nuxt3") {
        Some("Nuxt")
    } else if deps.contains("@remix-run/node") || deps.contains("@remix-run/serve") {
        Some("Remix")
    } else if deps.contains("@nestjs/core") {
        Some("NestJS")
    } else if deps.contains("fastify") {
        Some("Fastify")
    } else if deps.contains("koa") {
        Some("Koa")
    } else if deps.contains("hapi") || deps.contains("@hapi/hapi") {
        Some("Hapi")
    } else if deps.contains("express") {
        Some("Express")
    } else {
        None
    };

    let has_start = json
        .get("scripts")
        .and_then(|s| s.get("start"))
        .and_then(|s| s.as_str())
        .is_some();
    let run_command = if has_start {
        vec!["npm".to_string(), "start".to_string()]
    } else {
        let main = json
            .get("main")
            .and_then(|m| m.as_str())
            .unwrap_or("index.js");
        vec!["node".to_string(), main.to_string()]
    };

    let mut services = Vec::new();
    if deps.contains("redis") || deps.contains("ioredis") {
        services.push(Service::Redis);
    }
    if deps.contains("pg") || deps.contains("postgres") {
        services.push(Service::Postgres);
    }
    if deps.contains("mongodb") || deps.contains("mongoose") {
        services.push(Service::Mongo);
    }

    Ok(Some(DetectedStack {
        language,
        framework: framework.map(str::to_string),
        declared_name: json.get("name").and_then(|n| n.as_str()).map(str::to_string),
        base_image: "node:20-alpine".to_string(),
        port: 3000,
        run_command,
        services,
        confidence: if framework.is_some() { Confidence::High } else { Confidence::Medium },
    }))
}

fn detect_python_manifest(path: &Path) -> Result<Option<DetectedStack>, DetectError> {
    let candidates = ["requirements.txt", "pyproject.toml", "Pipfile", "setup.py"];
    let Some(file) = candidates.iter().map(|c| path.join(c)).find(|p| p.exists()) else {
        return Ok(None);
    };
    let lower = read(&file)?.to_lowercase();

    let (framework, port, run_command): (Option<&str>, u16, Vec<&str>) =
        if lower.contains("fastapi") {
            (
                Some("FastAPI"),
                8000,
                vec!["uvicorn", "main:app", "--host", "0.0.0.0", "--port", "8000"],
            )
        } else if lower.contains("django") {
            (
                Some("Django"),
                8000,
                vec!["python", "manage.py", "runserver", "0.0.0.0:8000"],
            )
        } else if lower.contains("flask") {
            (Some("Flask"), 5000, vec!["flask", "run", "--host=0.0.0.0"])
        } else {
            let entry = python_entry(path).unwrap_or("main.py");
            (None, 8080, vec!["python", entry])
        };

    let mut services = Vec::new();
    if lower.contains("redis") {
        services.push(Service::Redis);
    }
    if lower.contains("psycopg") {
        services.push(Service::Postgres);
    }
    if lower.contains("pymongo") {
        services.push(Service::Mongo);
    }

    Ok(Some(DetectedStack {
        language: Language::Python,
        framework: framework.map(str::to_string),
        declared_name: None,
        base_image: "python:3.12-slim".to_string(),
        port,
        run_command: run_command.into_iter().map(str::to_string).collect(),
        services,
        confidence: if framework.is_some() { Confidence::High } else { Confidence::Medium },
    }))
}

/// A project with only a script such as `server.py` and no manifest.
fn detect_python_script(path: &Path) -> Result<Option<DetectedStack>, DetectError> {
    let Some(entry) = python_entry(path) else { return Ok(None); };
    let source = read(&path.join(entry))?;
    let services = if source.contains("import redis") || source.contains("from redis") {
        vec![Service::Redis]
    } else {
        Vec::new()
    };

    Ok(Some(DetectedStack {
        language: Language::Python,
        framework: None,
        declared_name: None,
        base_image: "python:3.12-slim".to_string(),
        port: 8080,
        run_command: vec!["python".to_string(), entry.to_string()],
        services,
        confidence: Confidence::Low,
    }))
}

fn python_entry(path: &Path) -> Option<&'static str> {
    ["server.py", "app.py", "main.py"]
        .into_iter()
        .find(|name| path.join(name).is_file())
}

fn detect_ruby(path: &Path) -> Result<Option<DetectedStack>, DetectError> {
    let file = path.join("Gemfile");
    if !file.exists() { return Ok(None); }
    let lower = read(&file)?.to_lowercase();

    let (framework, port, run_command): (Option<&str>, u16, Vec<&str>) =
        if lower.contains("\"rails\"") || lower.contains("'rails'") {
            (
                Some("Rails"),
                3000,
                vec!["bundle", "exec", "rails", "server", "-b", "0.0.0.0"],
            )
        } else if lower.contains("sinatra") {
            (
                Some("Sinatra"),
                4567,
                vec!["bundle", "exec", "ruby", "app.rb", "-o", "0.0.0.0"],
            )
        } else {
            (None, 8080, vec!["bundle", "exec", "ruby", "app.rb"])
        };

    let mut services = Vec::new();
    if lower.contains("redis") {
        services.push(Service::Redis);
    }
    if lower.contains("\"pg\"") || lower.contains("'pg'") {
        services.push(Service::Postgres);
    }

    Ok(Some(DetectedStack {
        language: Language::Ruby,
        framework: framework.map(str::to_string),
        declared_name: None,
        base_image: "ruby:3.3-slim".to_string(),
        port,
        run_command: run_command.into_iter().map(str::to_string).collect(),
        services,
        confidence: if framework.is_some() { Confidence::High } else { Confidence::Medium },
    }))
}

fn detect_go(path: &Path) -> Result<Option<DetectedStack>, DetectError> {
    let file = path.join("go.mod");
    if !file.exists() { return Ok(None); }
    let content = read(&file)?;
    let lower = content.to_lowercase();

    let framework = if lower.contains("gin-gonic/gin") {
        Some("Gin")
    } else if lower.contains("labstack/echo") {
        Some("Echo")
    } else if lower.contains("gofiber/fiber") {
        Some("Fiber")
    } else if lower.contains("go-chi/chi") {
        Some("Chi")
    } else {
        None
    };

    let declared_name = content
        .lines()
        .find_map(|l| l.trim().strip_prefix("module "))
        .map(|m| m.trim().to_string());

    let mut services = Vec::new();
    if lower.contains("go-redis") {
        services.push(Service::Redis);
    }

    Ok(Some(DetectedStack {
        language: Language::Go,
        framework: framework.map(str::to_string),
        declared_name,
        base_image: "golang:1.22-alpine".to_string(),
        port: 8080,
        run_command: vec!["/app/server".to_string()],
        services,
        confidence: if framework.is_some() { Confidence::High } else { Confidence::Medium },
    }))
}

fn detect_static(path: &Path) -> Result<Option<DetectedStack>, DetectError> {
    if !path.join("index.html").is_file() { return Ok(None); }
    Ok(Some(DetectedStack {
        language: Language::Static,
        framework: None,
        declared_name: None,
        base_image: "nginx:alpine".to_string(),
        port: 80,
        run_command: Vec::new(),
        services: Vec::new(),
        confidence: Confidence::Medium,
    }))
}

// ---------------------------------------------------------------------------
// Utilities
// ---------------------------------------------------------------------------

fn collect_package_json_deps(json: &serde_json::Value) -> HashSet<String> {
    let mut deps = HashSet::new();
    for key in &["dependencies", "devDependencies", "peerDependencies"] {
        if let Some(obj) = json.get(key).and_then(|v| v.as_object()) {
            for k in obj.keys() {
                deps.insert(k.clone());
            }
        }
    }
    deps
}
