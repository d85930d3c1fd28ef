//! Prompt gateway: the seam between the reconciler and whoever answers the
//! "overwrite?" question.
//!
//! [`TerminalPrompt`] asks on the controlling terminal via `dialoguer` (it
//! draws on stderr, so stdout stays clean for `--dry-run`). [`ScriptedPrompt`]
//! replays canned answers and [`NoPrompt`] refuses to ask at all.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;

use crate::error::ReconcileError;

/// Answer to an overwrite question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Accept,
    Reject,
    ShowDiff,
}

/// Anything that can answer "overwrite `subject`?".
///
/// Called only for interactive sessions, one question at a time.
pub trait PromptGateway {
    fn confirm(&mut self, subject: &Path) -> Result<PromptChoice, ReconcileError>;
}

// ---------------------------------------------------------------------------
// TerminalPrompt
// ---------------------------------------------------------------------------

const CHOICES: [&str; 3] = ["Overwrite", "Keep existing file", "Show diff"];

pub struct TerminalPrompt {
    theme: ColorfulTheme,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        TerminalPrompt {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptGateway for TerminalPrompt {
    fn confirm(&mut self, subject: &Path) -> Result<PromptChoice, ReconcileError> {
        let index = Select::with_theme(&self.theme)
            .with_prompt(format!("{} has local changes", subject.display()))
            .items(&CHOICES)
            .default(1)
            .interact()
            .map_err(|e| ReconcileError::Prompt {
                path: subject.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(match index {
            0 => PromptChoice::Accept,
            2 => PromptChoice::ShowDiff,
            _ => PromptChoice::Reject,
        })
    }
}

// ---------------------------------------------------------------------------
// ScriptedPrompt
// ---------------------------------------------------------------------------

/// Replays a fixed list of answers and remembers what it was asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<PromptChoice>,
    asked: Vec<PathBuf>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = PromptChoice>) -> Self {
        ScriptedPrompt {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Subjects asked about, in order.
    pub fn asked(&self) -> &[PathBuf] {
        &self.asked
    }
}

impl PromptGateway for ScriptedPrompt {
    fn confirm(&mut self, subject: &Path) -> Result<PromptChoice, ReconcileError> {
        self.asked.push(subject.to_path_buf());
        self.answers.pop_front().ok_or_else(|| ReconcileError::Prompt {
            path: subject.to_path_buf(),
            message: "no scripted answer left".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// NoPrompt
// ---------------------------------------------------------------------------

/// Gateway for sessions that must never ask (force, non-interactive, dry-run).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl PromptGateway for NoPrompt {
    fn confirm(&mut self, subject: &Path) -> Result<PromptChoice, ReconcileError> {
        Err(ReconcileError::Prompt {
            path: subject.to_path_buf(),
            message: "no terminal available to confirm overwrite".to_string(),
        })
    }
}
