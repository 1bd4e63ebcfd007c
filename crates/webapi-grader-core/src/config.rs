//! Suite loading and runner configuration.

use crate::i18n::DEFAULT_LANG;
use crate::normalize::{NormalizeError, normalize};
use crate::types::{NormalizedTestCase, TestSuiteConfig};
use std::path::Path;
use thiserror::Error;

/// Environment variable selecting the report and title language.
pub const LANG_ENV: &str = "CHALLENGE_LANGUAGE";

/// Timeout applied when neither the case nor the suite sets one.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Errors that can occur during suite loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yml::Error),
    #[error("config.endPoint is required")]
    MissingEndpoint,
    #[error("invalid test case #{index}: {source}")]
    InvalidTestCase {
        index: usize,
        #[source]
        source: NormalizeError,
    },
}

/// Load a test suite from a YAML file.
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The YAML is invalid
/// - `config.endPoint` is missing or empty
/// - A test case cannot be normalized
pub fn load_suite(path: &Path) -> Result<TestSuiteConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_suite(&content)
}

/// Parse a test suite from YAML text.
///
/// # Errors
/// Same as [`load_suite`], minus IO.
pub fn parse_suite(content: &str) -> Result<TestSuiteConfig, ConfigError> {
    let suite: TestSuiteConfig = serde_yml::from_str(content)?;
    validate_suite(&suite)?;
    Ok(suite)
}

/// Validate the suite, normalizing every test case once.
///
/// # Errors
/// Returns an error if the endpoint is missing or a test case is malformed.
pub fn validate_suite(suite: &TestSuiteConfig) -> Result<(), ConfigError> {
    suite.endpoint()?;
    suite.normalized_cases().map(|_| ())
}

impl TestSuiteConfig {
    /// Service base URL.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingEndpoint` if it is absent or blank.
    pub fn endpoint(&self) -> Result<&str, ConfigError> {
        self.config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(ConfigError::MissingEndpoint)
    }

    /// Normalize every test case in order.
    ///
    /// # Errors
    /// Returns the first normalization failure with its case index.
    pub fn normalized_cases(&self) -> Result<Vec<NormalizedTestCase>, ConfigError> {
        self.testcases
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                normalize(raw).map_err(|source| ConfigError::InvalidTestCase { index, source })
            })
            .collect()
    }

    /// Test cases that external tooling should expose for debugging.
    ///
    /// # Errors
    /// Returns the first normalization failure with its case index.
    pub fn debug_cases(&self) -> Result<Vec<NormalizedTestCase>, ConfigError> {
        Ok(self
            .normalized_cases()?
            .into_iter()
            .filter(|case| case.debug)
            .collect())
    }
}

/// Options for running a suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Language code for titles and failure labels.
    pub lang: String,
    /// Timeout used when neither the case nor the suite sets one.
    pub default_timeout_ms: u64,
    /// Maximum number of cases run at once (None = sequential).
    pub parallel: Option<usize>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            parallel: None,
        }
    }
}

impl RunnerOptions {
    /// Defaults with the language taken from `CHALLENGE_LANGUAGE` when set.
    #[must_use]
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(lang) = std::env::var(LANG_ENV) {
            if !lang.trim().is_empty() {
                options.lang = lang.trim().to_string();
            }
        }
        options
    }
}

/// Override options layered on top of a loaded suite and runner options.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub timeout: Option<u64>,
    pub lang: Option<String>,
    pub parallel: Option<usize>,
}

/// Apply overrides to a suite and its runner options.
#[must_use]
pub fn apply_overrides(
    mut suite: TestSuiteConfig,
    mut options: RunnerOptions,
    overrides: &ConfigOverrides,
) -> (TestSuiteConfig, RunnerOptions) {
    if let Some(ref endpoint) = overrides.endpoint {
        suite.config.endpoint = Some(endpoint.clone());
    }
    if let Some(timeout) = overrides.timeout {
        suite.timeout = Some(timeout);
    }
    if let Some(ref lang) = overrides.lang {
        options.lang.clone_from(lang);
    }
    if let Some(parallel) = overrides.parallel {
        options.parallel = Some(parallel.max(1));
    }
    (suite, options)
}
