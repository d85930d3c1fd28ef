//! # stevedore-reconcile
//!
//! File reconciliation engine: decides, for every generated artifact, whether
//! to write it, skip it, show a diff or ask, and records what a run created so
//! a failed run can be rolled back.
//!
//! Open a [`Session`] per run, call [`Session::ensure_dir`] and
//! [`Session::reconcile`] for each artifact, then either drop the ledger on
//! success or hand it to [`rollback`] on the abort path. [`pipeline::run`]
//! does all of that for a list of artifacts.

pub mod diff;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod prompt;
mod provision;
pub mod reconciler;
pub mod rollback;

pub use diff::{render_diff, DiffSegment, SegmentKind};
pub use error::ReconcileError;
pub use ledger::WriteLedger;
pub use prompt::{NoPrompt, PromptChoice, PromptGateway, ScriptedPrompt, TerminalPrompt};
pub use reconciler::{Reason, ReconcileReport, Session};
pub use rollback::{rollback, RollbackFailure, RollbackReport};
