//! Line-level diff rendering for the "show diff" prompt and `stevedore diff`.

use std::path::Path;

use colored::Colorize;
use similar::{ChangeTag, TextDiff};

/// Classification of one diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Added,
    Removed,
    Unchanged,
}

/// One line of a diff, including its trailing newline if it had one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSegment {
    pub text: String,
    pub kind: SegmentKind,
}

/// Compare `old` and `new` line by line. Pure; no I/O.
pub fn render_diff(old: &str, new: &str) -> Vec<DiffSegment> {
    TextDiff::from_lines(old, new)
        .iter_all_changes()
        .map(|change| DiffSegment {
            text: change.value().to_string(),
            kind: match change.tag() {
                ChangeTag::Insert => SegmentKind::Added,
                ChangeTag::Delete => SegmentKind::Removed,
                ChangeTag::Equal => SegmentKind::Unchanged,
            },
        })
        .collect()
}

/// Terminal rendering: `+` green, `-` red, context dimmed. One line per segment.
pub fn colorize(segments: &[DiffSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        let line = segment.text.trim_end_matches(['\r', '\n']);
        let painted = match segment.kind {
            SegmentKind::Added => format!("+{line}").green(),
            SegmentKind::Removed => format!("-{line}").red(),
            SegmentKind::Unchanged => format!(" {line}").dimmed(),
        };
        out.push_str(&painted.to_string());
        out.push('\n');
    }
    out
}

/// Unified diff with `a/<path>` and `b/<path>` headers.
pub fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    let old_header = format!("a/{}", path.display());
    let new_header = format!("b/{}", path.display());
    TextDiff::from_lines(old, new)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string()
}
