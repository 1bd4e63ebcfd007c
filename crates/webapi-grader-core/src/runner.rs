//! Test runner for executing web API challenge test cases.

use crate::config::{ConfigError, RunnerOptions};
use crate::diff::{DEFAULT_DIFF_LIMIT, DiffOp, DiffViews, diff_lines, format_diff, has_changes};
use crate::generator::{GeneratorClient, GeneratorError};
use crate::i18n::{Message, text};
use crate::invoker::{InvokeError, Invoker};
use crate::normalize::{NormalizeError, normalize};
use crate::template::{render, render_str, value_text};
use crate::types::{ExecutionResult, NormalizedTestCase, Params, RawTestCase, TestSuiteConfig};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Errors that stop a test case before its output can be checked.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("normalize error: {0}")]
    Normalize(#[from] NormalizeError),
    #[error("generator error: {0}")]
    Generator(#[from] GeneratorError),
    #[error("invocation error: {0}")]
    Invoke(#[from] InvokeError),
}

/// Mismatch between the expected and the actual candidate output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckFailure {
    ExitCode {
        expected: i32,
        actual: i32,
    },
    Stdout {
        views: DiffViews,
        diffs: Vec<DiffOp>,
    },
}

impl CheckFailure {
    /// Failure message with labels in `lang`.
    #[must_use]
    pub fn localized_message(&self, lang: &str) -> String {
        match self {
            Self::ExitCode { expected, actual } => format!(
                "{}: {}: {expected}, {}: {actual}",
                text(lang, Message::InvalidExitCode),
                text(lang, Message::Expected),
                text(lang, Message::Actual),
            ),
            Self::Stdout { views, .. } => format!(
                "{}:\n### {}:\n{}\n### {}:\n{}",
                text(lang, Message::InvalidStdout),
                text(lang, Message::Expected),
                views.expected,
                text(lang, Message::Actual),
                views.actual,
            ),
        }
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.localized_message("en"))
    }
}

impl std::error::Error for CheckFailure {}

/// Result of running one test case to completion.
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    /// Raw output of the candidate.
    pub result: ExecutionResult,
    /// Parameters after the generator merge.
    pub params: Params,
    /// Present when the check failed.
    pub failure: Option<CheckFailure>,
}

impl CaseOutcome {
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// A normalized test case ready to hand to a test framework.
#[derive(Debug, Clone)]
pub struct PlannedCase {
    /// Position in the suite.
    pub index: usize,
    /// Rendered title in the runner's language.
    pub title: String,
    /// Timeout in milliseconds: case, then suite, then runner default.
    pub timeout_ms: u64,
    pub case: NormalizedTestCase,
}

/// Drives the generate, exec and check steps of each test case.
#[derive(Debug, Clone)]
pub struct TestRunner<I> {
    suite: TestSuiteConfig,
    options: RunnerOptions,
    generator: GeneratorClient,
    invoker: I,
}

impl<I: Invoker> TestRunner<I> {
    /// Create a runner whose generator client targets the suite endpoint.
    ///
    /// # Errors
    /// Returns an error if the suite has no endpoint or the HTTP client
    /// cannot be built.
    pub fn new(
        suite: TestSuiteConfig,
        options: RunnerOptions,
        invoker: I,
    ) -> Result<Self, RunnerError> {
        let generator = GeneratorClient::new(suite.endpoint()?)?;
        Ok(Self::with_generator(suite, options, generator, invoker))
    }

    /// Create a runner with an explicit generator client.
    #[must_use]
    pub const fn with_generator(
        suite: TestSuiteConfig,
        options: RunnerOptions,
        generator: GeneratorClient,
        invoker: I,
    ) -> Self {
        Self {
            suite,
            options,
            generator,
            invoker,
        }
    }

    #[must_use]
    pub const fn suite(&self) -> &TestSuiteConfig {
        &self.suite
    }

    #[must_use]
    pub const fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Normalize every test case and resolve its title and timeout.
    ///
    /// # Errors
    /// Returns an error if any test case cannot be normalized.
    pub fn plan(&self) -> Result<Vec<PlannedCase>, RunnerError> {
        self.suite
            .testcases
            .iter()
            .enumerate()
            .map(|(index, raw)| self.plan_case(index, raw))
            .collect()
    }

    fn plan_case(&self, index: usize, raw: &RawTestCase) -> Result<PlannedCase, RunnerError> {
        let case = normalize(raw)?;
        Ok(PlannedCase {
            index,
            title: self.resolve_title(&case),
            timeout_ms: self.timeout_for(&case),
            case,
        })
    }

    /// Title in the runner's language, rendered with the case's own params.
    #[must_use]
    pub fn resolve_title(&self, case: &NormalizedTestCase) -> String {
        render_str(case.title.select(&self.options.lang), &case.params)
    }

    /// Timeout for `case`: its own, else the suite's, else the default.
    #[must_use]
    pub fn timeout_for(&self, case: &NormalizedTestCase) -> u64 {
        case.timeout
            .or(self.suite.timeout)
            .unwrap_or(self.options.default_timeout_ms)
    }

    /// Run the generate and exec steps.
    ///
    /// `token` and `state` from the generator are merged into `case.params`,
    /// so later renders of the same case see them.
    ///
    /// # Errors
    /// Returns an error if the generator call or the candidate launch fails.
    pub async fn execute(
        &self,
        case: &mut NormalizedTestCase,
    ) -> Result<ExecutionResult, RunnerError> {
        let generated = self
            .generator
            .generate_default_get(&case.generate.queries, &case.generate.body, &case.params)
            .await?;
        generated.merge_into(&mut case.params);

        let args = exec_args(&render(&case.exec.args, &case.params));
        Ok(self.invoker.invoke(&args).await?)
    }

    /// Compare the candidate output with the expectation of `case`.
    ///
    /// # Errors
    /// Returns a `CheckFailure` describing the first mismatch.
    pub fn check(
        &self,
        case: &NormalizedTestCase,
        actual: &ExecutionResult,
    ) -> Result<(), CheckFailure> {
        check_result(case, actual)
    }

    /// Run the full pipeline for one normalized test case.
    ///
    /// # Errors
    /// Returns an error if the generate or exec step fails. Check failures
    /// are reported in the returned `CaseOutcome`.
    pub async fn run_case(
        &self,
        mut case: NormalizedTestCase,
    ) -> Result<CaseOutcome, RunnerError> {
        let result = self.execute(&mut case).await?;
        let failure = self.check(&case, &result).err();
        Ok(CaseOutcome {
            result,
            params: case.params,
            failure,
        })
    }

    /// Normalize and run one authored test case.
    ///
    /// # Errors
    /// Returns an error if normalization, generation or invocation fails.
    pub async fn run_raw(&self, raw: &RawTestCase) -> Result<CaseOutcome, RunnerError> {
        self.run_case(normalize(raw)?).await
    }
}

/// Check exit code, then stdout, of `actual` against `case`.
///
/// # Errors
/// Returns a `CheckFailure` describing the first mismatch.
pub fn check_result(
    case: &NormalizedTestCase,
    actual: &ExecutionResult,
) -> Result<(), CheckFailure> {
    if actual.code != case.expected.code {
        return Err(CheckFailure::ExitCode {
            expected: case.expected.code,
            actual: actual.code,
        });
    }

    let Some(plain) = case
        .expected
        .stdout
        .as_ref()
        .and_then(|s| s.plain.as_deref())
        .filter(|p| !p.is_empty())
    else {
        return Ok(());
    };
    let expected = render_str(plain, &case.params);
    let diffs = diff_lines(strip_final_newline(&expected), &actual.stdout_text());
    if has_changes(&diffs) {
        return Err(CheckFailure::Stdout {
            views: format_diff(&diffs, DEFAULT_DIFF_LIMIT),
            diffs,
        });
    }
    Ok(())
}

/// YAML block scalars end with one newline; captured stdout is joined without it.
fn strip_final_newline(text: &str) -> &str {
    text.strip_suffix('\n')
        .map_or(text, |rest| rest.strip_suffix('\r').unwrap_or(rest))
}

/// Turn rendered `exec.args` into command-line arguments.
#[must_use]
pub fn exec_args(rendered: &Value) -> Vec<String> {
    match rendered {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(value_text).collect(),
        other => vec![value_text(other)],
    }
}
