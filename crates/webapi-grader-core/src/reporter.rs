//! Console reporter with cargo test-like formatting.

use crate::suite::ProgressEvent;
use crate::types::{CaseReport, SuiteReport, SuiteSummary, Verdict};
use std::io::{self, Write};
use std::time::Duration;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Reporter configuration.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Show case durations.
    pub verbose: bool,
    /// Use colors in output.
    pub color: bool,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            color: true,
        }
    }
}

/// Test reporter with cargo test-like output.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    config: ReporterConfig,
}

impl Reporter {
    #[must_use]
    pub const fn new(config: ReporterConfig) -> Self {
        Self { config }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.config.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn status(&self, verdict: Verdict) -> String {
        match verdict {
            Verdict::Pass => self.paint(GREEN, "ok"),
            Verdict::Fail => self.paint(RED, "FAILED"),
            Verdict::Error => self.paint(YELLOW, "ERROR"),
        }
    }

    /// `running N tests` header.
    #[must_use]
    pub fn format_start(&self, total: usize) -> String {
        let noun = if total == 1 { "test" } else { "tests" };
        format!("\nrunning {total} {noun}")
    }

    /// One `test <title> ... ok` line.
    #[must_use]
    pub fn format_case(&self, report: &CaseReport) -> String {
        let line = format!("test {} ... {}", report.title, self.status(report.verdict));
        if self.config.verbose {
            format!("{line} ({}ms)", report.duration_ms)
        } else {
            line
        }
    }

    /// Failure details of every case that did not pass, or an empty string.
    #[must_use]
    pub fn format_failures(&self, cases: &[CaseReport]) -> String {
        let failed: Vec<_> = cases
            .iter()
            .filter(|c| c.verdict != Verdict::Pass)
            .collect();
        if failed.is_empty() {
            return String::new();
        }

        let mut out = String::from("\nfailures:\n");
        for case in failed {
            out.push_str(&format!("\n---- #{} {} ----\n", case.index, case.title));
            if let Some(message) = &case.message {
                for line in message.lines() {
                    out.push_str("    ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        out
    }

    /// Final `test result:` line.
    #[must_use]
    pub fn format_summary(&self, summary: &SuiteSummary, duration: Duration) -> String {
        let status = if summary.all_passed() {
            self.paint(GREEN, "ok")
        } else {
            self.paint(RED, "FAILED")
        };
        format!(
            "\ntest result: {status}. {} passed; {} failed; {} errored; finished in {:.1}s",
            summary.passed,
            summary.failed,
            summary.errored,
            duration.as_secs_f64()
        )
    }

    /// Print the start of a suite run.
    pub fn suite_start(&self, total: usize) {
        println!("{}", self.format_start(total));
    }

    /// Print a test result line.
    pub fn case_result(&self, report: &CaseReport) {
        println!("{}", self.format_case(report));
    }

    /// Print the failures section.
    pub fn failures(&self, cases: &[CaseReport]) {
        let text = self.format_failures(cases);
        if !text.is_empty() {
            print!("{text}");
        }
    }

    /// Print the final summary.
    pub fn summary(&self, summary: &SuiteSummary, duration: Duration) {
        println!("{}", self.format_summary(summary, duration));
    }

    /// Print the failures and the summary of a finished run.
    pub fn finish(&self, report: &SuiteReport, duration: Duration) {
        self.failures(&report.cases);
        self.summary(&report.summary, duration);
        self.flush();
    }

    /// Print the line belonging to a progress event, if any.
    pub fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::SuiteStarted { total } => self.suite_start(*total),
            ProgressEvent::CaseCompleted { report } => self.case_result(report),
            ProgressEvent::CaseStarted { .. } | ProgressEvent::SuiteCompleted { .. } => {}
        }
    }

    /// Print a warning message.
    pub fn warn(&self, message: &str) {
        eprintln!("{}: {message}", self.paint(YELLOW, "warning"));
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        eprintln!("{}: {message}", self.paint(RED, "error"));
    }

    /// Flush stdout.
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}
