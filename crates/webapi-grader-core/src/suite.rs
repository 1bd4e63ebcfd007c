//! Whole-suite execution with progress events.

use crate::invoker::Invoker;
use crate::runner::{PlannedCase, RunnerError, TestRunner};
use crate::types::{CaseReport, SuiteReport, SuiteSummary, Verdict};
use futures::{StreamExt, stream};
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::mpsc;

/// Progress events emitted while a suite runs.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The suite is starting.
    SuiteStarted { total: usize },
    /// A test case has started.
    CaseStarted { index: usize, title: String },
    /// A test case has completed.
    CaseCompleted { report: CaseReport },
    /// Every test case has completed.
    SuiteCompleted { summary: SuiteSummary },
}

/// Sender for progress events.
pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;

/// Run every test case of the runner's suite.
///
/// Cases run one at a time unless `RunnerOptions::parallel` is set, in which
/// case up to that many run at once. Reports are returned in suite order.
///
/// # Errors
/// Returns an error if a test case cannot be normalized. Failures while
/// running a case are recorded in its report instead.
pub async fn run_suite<I: Invoker>(
    runner: &TestRunner<I>,
    progress: Option<&ProgressSender>,
) -> Result<SuiteReport, RunnerError> {
    let started_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    let planned = runner.plan()?;

    tracing::info!(total = planned.len(), "running suite");
    if let Some(tx) = progress {
        let _ = tx.send(ProgressEvent::SuiteStarted {
            total: planned.len(),
        });
    }

    let mut cases = if let Some(n) = runner.options().parallel {
        stream::iter(
            planned
                .into_iter()
                .map(|case| run_planned(runner, case, progress)),
        )
        .buffer_unordered(n.max(1))
        .collect::<Vec<_>>()
        .await
    } else {
        let mut reports = Vec::new();
        for case in planned {
            reports.push(run_planned(runner, case, progress).await);
        }
        reports
    };
    cases.sort_by_key(|report| report.index);

    let summary = SuiteSummary::from_reports(&cases);
    tracing::info!(
        passed = summary.passed,
        failed = summary.failed,
        errored = summary.errored,
        "suite finished"
    );
    if let Some(tx) = progress {
        let _ = tx.send(ProgressEvent::SuiteCompleted { summary });
    }

    Ok(SuiteReport {
        started_at,
        cases,
        summary,
    })
}

/// Run one planned case under its timeout and turn the outcome into a report.
pub async fn run_planned<I: Invoker>(
    runner: &TestRunner<I>,
    planned: PlannedCase,
    progress: Option<&ProgressSender>,
) -> CaseReport {
    let PlannedCase {
        index,
        title,
        timeout_ms,
        case,
    } = planned;

    if let Some(tx) = progress {
        let _ = tx.send(ProgressEvent::CaseStarted {
            index,
            title: title.clone(),
        });
    }

    let start = Instant::now();
    let outcome =
        tokio::time::timeout(Duration::from_millis(timeout_ms), runner.run_case(case)).await;
    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    let (verdict, message) = match outcome {
        Ok(Ok(outcome)) => match outcome.failure {
            None => (Verdict::Pass, None),
            Some(failure) => (
                Verdict::Fail,
                Some(failure.localized_message(&runner.options().lang)),
            ),
        },
        Ok(Err(e)) => (Verdict::Error, Some(e.to_string())),
        Err(_) => (
            Verdict::Error,
            Some(format!("timed out after {timeout_ms}ms")),
        ),
    };

    match verdict {
        Verdict::Pass => tracing::info!(index, %title, duration_ms, "case passed"),
        Verdict::Fail | Verdict::Error => {
            tracing::warn!(index, %title, ?verdict, duration_ms, "case did not pass");
        }
    }

    let report = CaseReport {
        index,
        title,
        verdict,
        message,
        duration_ms,
    };
    if let Some(tx) = progress {
        let _ = tx.send(ProgressEvent::CaseCompleted {
            report: report.clone(),
        });
    }
    report
}

/// Default parallelism level (number of CPU cores).
#[must_use]
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}
