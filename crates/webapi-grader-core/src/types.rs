//! Core data types for web API challenge test suites.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Template parameters available to `{{name}}` placeholders.
pub type Params = serde_json::Map<String, Value>;

/// A whole test suite as loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteConfig {
    pub config: ServiceConfig,
    /// Default per-case timeout in milliseconds.
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub testcases: Vec<RawTestCase>,
}

/// Connection info for the remote challenge service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the service. Older suites spell it `entryPoint`.
    #[serde(rename = "endPoint", alias = "entryPoint", default)]
    pub endpoint: Option<String>,
    #[serde(flatten)]
    pub extra: Params,
}

/// A test case exactly as authored, possibly carrying a `template` chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTestCase(pub Params);

impl RawTestCase {
    /// Wrap an already-parsed mapping.
    #[must_use]
    pub const fn new(fields: Params) -> Self {
        Self(fields)
    }

    /// Access the authored fields.
    #[must_use]
    pub const fn fields(&self) -> &Params {
        &self.0
    }
}

/// Test case title: either one string or one string per language code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Title {
    Plain(String),
    Localized(BTreeMap<String, String>),
}

impl Title {
    /// Pick the title template for `lang`.
    ///
    /// Localized titles fall back to `en`, then to the first entry.
    #[must_use]
    pub fn select(&self, lang: &str) -> &str {
        match self {
            Self::Plain(title) => title,
            Self::Localized(titles) => titles
                .get(lang)
                .or_else(|| titles.get("en"))
                .or_else(|| titles.values().next())
                .map_or("", String::as_str),
        }
    }
}

/// The `generate` step: query parameters and body sent to the generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateSpec {
    #[serde(default)]
    pub queries: Value,
    #[serde(default)]
    pub body: Value,
}

/// The `exec` step: argument templates for the candidate program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecSpec {
    #[serde(default)]
    pub args: Value,
}

/// Expected stdout comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdoutExpectation {
    /// Template for the exact expected stdout.
    #[serde(default)]
    pub plain: Option<String>,
}

/// Expected outcome of the candidate run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedSpec {
    #[serde(default, deserialize_with = "deserialize_exit_code")]
    pub code: i32,
    #[serde(default)]
    pub stdout: Option<StdoutExpectation>,
}

/// Exit codes may be written as numbers or numeric strings; anything
/// non-numeric is 0. A number no process can exit with is rejected.
fn deserialize_exit_code<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    coerce_exit_code(&value).ok_or_else(|| {
        serde::de::Error::custom(format!("exit code {value} is not a 32-bit integer"))
    })
}

/// Coerce an authored exit code to an integer.
///
/// Missing and non-numeric values become 0. Returns `None` for numbers that
/// no exit status can equal: fractions, infinities and values outside `i32`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn coerce_exit_code(value: &Value) -> Option<i32> {
    let number = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => return i32::try_from(i).ok(),
            None => n.as_f64(),
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => return i32::try_from(i).ok(),
                Err(_) => s.parse::<f64>().ok(),
            }
        }
        Value::Bool(true) => return Some(1),
        _ => None,
    };
    match number {
        None => Some(0),
        Some(f) if f.is_nan() => Some(0),
        Some(f) if f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) => {
            Some(f as i32)
        }
        Some(_) => None,
    }
}

const fn default_debug() -> bool {
    true
}

/// A test case with its `template` chain resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTestCase {
    pub title: Title,
    #[serde(default)]
    pub params: Params,
    pub generate: GenerateSpec,
    pub exec: ExecSpec,
    pub expected: ExpectedSpec,
    /// Per-case timeout in milliseconds (overrides the suite default).
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Whether external tooling should include this case in a debug bundle.
    #[serde(default = "default_debug")]
    pub debug: bool,
}

/// Output captured from one candidate program run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub code: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl ExecutionResult {
    /// Stdout lines joined back into one text.
    #[must_use]
    pub fn stdout_text(&self) -> String {
        self.stdout.join("\n")
    }

    /// Stderr lines joined back into one text.
    #[must_use]
    pub fn stderr_text(&self) -> String {
        self.stderr.join("\n")
    }
}

/// Final verdict for one test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    /// Exit code or stdout mismatch.
    Fail,
    /// Generator, invocation or timeout failure.
    Error,
}

/// Report for one executed test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    pub index: usize,
    pub title: String,
    pub verdict: Verdict,
    /// Failure or error message, absent on pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// Totals over a suite run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

impl SuiteSummary {
    /// Count verdicts over case reports.
    #[must_use]
    pub fn from_reports(reports: &[CaseReport]) -> Self {
        let count = |verdict: Verdict| reports.iter().filter(|r| r.verdict == verdict).count();
        Self {
            total: reports.len(),
            passed: count(Verdict::Pass),
            failed: count(Verdict::Fail),
            errored: count(Verdict::Error),
        }
    }

    /// True when every case passed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

/// Full result of a suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// RFC 3339 timestamp of the run start.
    pub started_at: String,
    pub cases: Vec<CaseReport>,
    pub summary: SuiteSummary,
}
