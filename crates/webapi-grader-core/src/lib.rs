//! Core library for grading web API challenge submissions.
//!
//! A suite is a YAML file listing test cases. Each case:
//! - Resolves its `template` chain into one flat record
//! - Asks the service's `/_generate` endpoint for a `token` and `state`
//! - Runs the candidate program with rendered arguments
//! - Compares exit code and stdout, reporting a line diff on mismatch

pub mod config;
pub mod diff;
pub mod generator;
pub mod i18n;
pub mod invoker;
pub mod normalize;
pub mod report;
pub mod reporter;
pub mod runner;
pub mod suite;
pub mod template;
pub mod types;

pub use config::{
    ConfigError, ConfigOverrides, DEFAULT_TIMEOUT_MS, LANG_ENV, RunnerOptions, apply_overrides,
    load_suite, parse_suite, validate_suite,
};
pub use diff::{DiffKind, DiffOp, DiffViews, diff_lines, format_diff, has_changes};
pub use generator::{GENERATE_PATH, Generated, GeneratorClient, GeneratorError, query_pairs};
pub use i18n::{DEFAULT_LANG, Message};
pub use invoker::{APP_COMMAND_ENV, CommandInvoker, InvokeError, Invoker};
pub use normalize::{NormalizeError, flatten, normalize};
pub use report::{ReportFormat, format_report, format_report_json};
pub use reporter::{Reporter, ReporterConfig};
pub use runner::{
    CaseOutcome, CheckFailure, PlannedCase, RunnerError, TestRunner, check_result, exec_args,
};
pub use suite::{ProgressEvent, ProgressSender, default_parallelism, run_planned, run_suite};
pub use template::{render, render_str};
pub use types::*;
