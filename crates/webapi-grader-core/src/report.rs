//! Report generation for suite results.

use crate::reporter::Reporter;
use crate::types::SuiteReport;
use std::time::Duration;

/// Format for report output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown format: {s}. Valid formats: table, json")),
        }
    }
}

/// Generate a pretty JSON report for a suite run.
#[must_use]
pub fn format_report_json(report: &SuiteReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

/// Render a finished suite run as plain text in the requested format.
#[must_use]
pub fn format_report(
    report: &SuiteReport,
    format: ReportFormat,
    reporter: &Reporter,
    duration: Duration,
) -> String {
    match format {
        ReportFormat::Json => format_report_json(report),
        ReportFormat::Table => {
            let mut out = reporter.format_start(report.cases.len());
            for case in &report.cases {
                out.push('\n');
                out.push_str(&reporter.format_case(case));
            }
            out.push('\n');
            out.push_str(&reporter.format_failures(&report.cases));
            out.push_str(&reporter.format_summary(&report.summary, duration));
            out
        }
    }
}
