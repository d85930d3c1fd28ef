//! Reconciliation session: the per-run state machine that decides, for each
//! artifact, whether to create, overwrite, skip or ask.
//!
//! ## Decision order
//!
//! 1. `dry_run`: stream the content to the output sink, touch nothing.
//! 2. `Force`: write unconditionally.
//! 3. No file on disk: create it.
//! 4. Byte-identical file on disk: skip without writing.
//! 5. `NonInteractive`: keep the user's file and warn.
//! 6. `Interactive`: ask; "show diff" prints the diff and asks again.
//!
//! Writes go to a fresh temp file beside the target and are renamed into
//! place; the temp name never collides with an existing file.
//! Every file or directory that did not exist before the run is recorded in
//! the session's [`WriteLedger`].

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use stevedore_core::types::ensure_relative;
use stevedore_core::{Artifact, OverwriteMode, Policy, WriteDecision};

use crate::diff::{colorize, render_diff};
use crate::error::{io_err, ReconcileError};
use crate::ledger::WriteLedger;
use crate::prompt::{PromptChoice, PromptGateway};
use crate::provision::create_segments;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Why a decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// No file existed; it was created.
    Created,
    /// The user accepted an overwrite.
    Overwritten,
    /// Written under `Force` over an existing file.
    Forced,
    /// Sent to the output stream (dry-run).
    Streamed,
    /// Existing content already matched.
    Unchanged,
    /// The user kept their file.
    Declined,
    /// Non-interactive run refused to overwrite a differing file.
    Protected,
    /// A diff was shown and the question is asked again. Never final.
    DiffShown,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Reason::Created => "created",
            Reason::Overwritten => "overwritten",
            Reason::Forced => "forced",
            Reason::Streamed => "dry-run",
            Reason::Unchanged => "unchanged",
            Reason::Declined => "kept (declined)",
            Reason::Protected => "kept (differs)",
            Reason::DiffShown => "diff shown",
        };
        f.write_str(s)
    }
}

/// Final outcome for one artifact. Never carries [`WriteDecision::AbortRetry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub path: PathBuf,
    pub decision: WriteDecision,
    pub reason: Reason,
}

impl ReconcileReport {
    pub fn written(&self) -> bool {
        self.decision == WriteDecision::Write
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One reconciliation run.
///
/// `output` receives artifact content in dry-run mode and nothing else.
/// `console` receives diffs shown at the user's request.
pub struct Session<'a> {
    root: PathBuf,
    policy: Policy,
    ledger: WriteLedger,
    prompt: &'a mut dyn PromptGateway,
    output: &'a mut dyn Write,
    console: &'a mut dyn Write,
}

impl<'a> Session<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        policy: Policy,
        prompt: &'a mut dyn PromptGateway,
        output: &'a mut dyn Write,
        console: &'a mut dyn Write,
    ) -> Self {
        Session {
            root: root.into(),
            policy,
            ledger: WriteLedger::new(),
            prompt,
            output,
            console,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// End the session and hand over what it created.
    pub fn into_ledger(self) -> WriteLedger {
        self.ledger
    }

    /// Resolve `artifact` and reconcile it. Merge errors surface before any
    /// filesystem access.
    pub fn reconcile_artifact(
        &mut self,
        artifact: &Artifact,
    ) -> Result<ReconcileReport, ReconcileError> {
        let desired = artifact.resolve()?;
        self.reconcile(&artifact.path, &desired)
    }

    /// Bring `path` (relative to the root) in line with `desired`.
    pub fn reconcile(
        &mut self,
        path: &Path,
        desired: &str,
    ) -> Result<ReconcileReport, ReconcileError> {
        ensure_relative(path)?;

        if self.policy.dry_run {
            self.output
                .write_all(desired.as_bytes())
                .and_then(|()| self.output.flush())
                .map_err(|e| io_err(path, e))?;
            tracing::debug!("[dry-run] streamed: {}", path.display());
            return Ok(report(path, WriteDecision::Write, Reason::Streamed));
        }

        loop {
            let (decision, reason) = self.step(path, desired)?;
            if decision != WriteDecision::AbortRetry {
                return Ok(report(path, decision, reason));
            }
        }
    }

    /// Make sure directory `path` (relative to the root) exists, creating and
    /// recording each missing segment. Returns whether anything was created.
    /// Always `false` in dry-run.
    pub fn ensure_dir(&mut self, path: &Path) -> Result<bool, ReconcileError> {
        ensure_relative(path)?;
        if self.policy.dry_run {
            return Ok(false);
        }
        let mut created = Vec::new();
        let result = create_segments(&self.root, path, &mut created);
        for dir in created.iter().rev() {
            self.ledger.record_dir(dir.clone());
        }
        result.map(|()| !created.is_empty())
    }

    fn step(&mut self, path: &Path, desired: &str) -> Result<(WriteDecision, Reason), ReconcileError> {
        let target = self.root.join(path);
        let existing = read_existing(&target).map_err(|e| io_err(path, e))?;

        match (self.policy.mode, existing) {
            (OverwriteMode::Force, existing) => {
                let reason = match existing {
                    None => Reason::Created,
                    Some(_) => Reason::Forced,
                };
                self.write(path, &target, desired, reason == Reason::Created)?;
                Ok((WriteDecision::Write, reason))
            }
            (_, None) => {
                self.write(path, &target, desired, true)?;
                Ok((WriteDecision::Write, Reason::Created))
            }
            (_, Some(current)) if current == desired.as_bytes() => {
                tracing::debug!("unchanged: {}", path.display());
                Ok((WriteDecision::Skip, Reason::Unchanged))
            }
            (OverwriteMode::NonInteractive, Some(_)) => {
                tracing::warn!(
                    "{} differs from the generated version; keeping it (use --force to overwrite)",
                    path.display()
                );
                Ok((WriteDecision::Skip, Reason::Protected))
            }
            (OverwriteMode::Interactive, Some(current)) => match self.prompt.confirm(path)? {
                PromptChoice::Accept => {
                    self.write(path, &target, desired, false)?;
                    Ok((WriteDecision::Write, Reason::Overwritten))
                }
                PromptChoice::Reject => {
                    tracing::info!("kept: {}", path.display());
                    Ok((WriteDecision::Skip, Reason::Declined))
                }
                PromptChoice::ShowDiff => {
                    let old = String::from_utf8_lossy(&current);
                    let shown = colorize(&render_diff(&old, desired));
                    self.console
                        .write_all(shown.as_bytes())
                        .and_then(|()| self.console.flush())
                        .map_err(|e| io_err(path, e))?;
                    Ok((WriteDecision::AbortRetry, Reason::DiffShown))
                }
            },
        }
    }

    fn write(
        &mut self,
        path: &Path,
        target: &Path,
        desired: &str,
        is_new: bool,
    ) -> Result<(), ReconcileError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.ensure_dir(parent)?;
        }
        atomic_write(target, desired.as_bytes()).map_err(|e| io_err(path, e))?;
        if is_new {
            self.ledger.record_file(path);
        }
        tracing::info!("wrote: {}", path.display());
        Ok(())
    }
}

fn report(path: &Path, decision: WriteDecision, reason: Reason) -> ReconcileReport {
    ReconcileReport {
        path: path.to_path_buf(),
        decision,
        reason,
    }
}

fn read_existing(target: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(target) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write through a uniquely named sibling temp file, then rename over
/// `target`. The temp file is deleted on every failure path when dropped.
fn atomic_write(target: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".stevedore-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    if let Some(permissions) = target_permissions(target)? {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// Permissions the written file should end up with: the existing file's,
/// or `0644` for a new file (temp files start out `0600`).
fn target_permissions(target: &Path) -> io::Result<Option<fs::Permissions>> {
    match fs::metadata(target) {
        Ok(meta) => Ok(Some(meta.permissions())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(default_permissions()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
