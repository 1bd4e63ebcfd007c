//! Line-granularity diff between expected and actual output.

use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};
use std::time::Duration;

/// Number of lines kept per view by default.
pub const DEFAULT_DIFF_LIMIT: usize = 10;

/// Past this, the diff falls back to a coarser (still valid) edit script.
const DIFF_TIMEOUT: Duration = Duration::from_secs(2);

const EXPECTED_HIGHLIGHT: &str = "\x1b[1;32m";
const ACTUAL_HIGHLIGHT: &str = "\x1b[1;31m";
const RESET: &str = "\x1b[00m";

/// Kind of an edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// Present in both texts.
    Equal,
    /// Present only in the actual text.
    Insert,
    /// Present only in the expected text.
    Delete,
}

/// One run of lines in an edit script. `text` keeps the line breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOp {
    pub kind: DiffKind,
    pub text: String,
}

impl DiffOp {
    fn new(kind: DiffKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Expected and actual side of a formatted diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffViews {
    pub expected: String,
    pub actual: String,
}

/// Compute a line-level edit script turning `expected` into `actual`.
///
/// Runs are merged so no two adjacent ops share a kind. Within a replaced
/// region the deleted run comes before the inserted one.
#[must_use]
pub fn diff_lines(expected: &str, actual: &str) -> Vec<DiffOp> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .timeout(DIFF_TIMEOUT)
        .diff_lines(expected, actual);

    let mut ops: Vec<DiffOp> = Vec::new();
    for change in diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => DiffKind::Equal,
            ChangeTag::Insert => DiffKind::Insert,
            ChangeTag::Delete => DiffKind::Delete,
        };
        let line = change.value();
        match ops.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(line),
            _ => ops.push(DiffOp::new(kind, line)),
        }
    }
    ops
}

/// True when the edit script contains anything other than equal runs.
#[must_use]
pub fn has_changes(diffs: &[DiffOp]) -> bool {
    diffs.iter().any(|op| op.kind != DiffKind::Equal)
}

/// Build the expected and actual views of an edit script.
///
/// Equal runs appear in both views; deleted runs only in the expected view and
/// inserted runs only in the actual view, each wrapped in a terminal color.
/// Each view keeps at most `limit` lines.
#[must_use]
pub fn format_diff(diffs: &[DiffOp], limit: usize) -> DiffViews {
    let mut expected = String::new();
    let mut actual = String::new();

    for op in diffs {
        match op.kind {
            DiffKind::Equal => {
                expected.push_str(&op.text);
                actual.push_str(&op.text);
            }
            DiffKind::Delete => {
                expected.push_str(EXPECTED_HIGHLIGHT);
                expected.push_str(&op.text);
                expected.push_str(RESET);
            }
            DiffKind::Insert => {
                actual.push_str(ACTUAL_HIGHLIGHT);
                actual.push_str(&op.text);
                actual.push_str(RESET);
            }
        }
    }

    DiffViews {
        expected: truncate_lines(&expected, limit),
        actual: truncate_lines(&actual, limit),
    }
}

fn truncate_lines(text: &str, limit: usize) -> String {
    text.split('\n').take(limit).collect::<Vec<_>>().join("\n")
}

/// Remove terminal color sequences produced by [`format_diff`].
#[must_use]
pub fn strip_highlight(text: &str) -> String {
    text.replace(EXPECTED_HIGHLIGHT, "")
        .replace(ACTUAL_HIGHLIGHT, "")
        .replace(RESET, "")
}
