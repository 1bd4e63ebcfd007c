//! Candidate program invocation.

use crate::types::ExecutionResult;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// Environment variable holding the candidate command line.
pub const APP_COMMAND_ENV: &str = "APP_COMMAND";

/// Errors that can occur while launching the candidate program.
///
/// A non-zero exit status is not an error; it is reported in
/// [`ExecutionResult::code`].
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("candidate command is empty")]
    EmptyCommand,
    #[error("{APP_COMMAND_ENV} is not set")]
    MissingCommand,
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs the program under test with a list of arguments.
pub trait Invoker: Send + Sync {
    /// Run the program once and capture its exit code and output.
    fn invoke(
        &self,
        args: &[String],
    ) -> impl Future<Output = Result<ExecutionResult, InvokeError>> + Send;
}

/// [`Invoker`] that spawns a local process.
#[derive(Debug, Clone)]
pub struct CommandInvoker {
    program: String,
    base_args: Vec<String>,
    envs: Vec<(String, String)>,
    current_dir: Option<PathBuf>,
}

impl CommandInvoker {
    /// Invoke `program` with no fixed leading arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
        }
    }

    /// Build from a whitespace-separated command line such as `python app.py`.
    ///
    /// # Errors
    /// Returns `InvokeError::EmptyCommand` if the line has no words.
    pub fn from_command_line(line: &str) -> Result<Self, InvokeError> {
        let mut words = line.split_whitespace().map(ToString::to_string);
        let program = words.next().ok_or(InvokeError::EmptyCommand)?;
        Ok(Self {
            base_args: words.collect(),
            ..Self::new(program)
        })
    }

    /// Build from the `APP_COMMAND` environment variable.
    ///
    /// # Errors
    /// Returns an error if the variable is unset or empty.
    pub fn from_env() -> Result<Self, InvokeError> {
        let line = std::env::var(APP_COMMAND_ENV).map_err(|_| InvokeError::MissingCommand)?;
        Self::from_command_line(&line)
    }

    /// Append a fixed argument placed before the per-case arguments.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.base_args.push(arg.into());
        self
    }

    /// Set an environment variable for the candidate process.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Run the candidate from `dir`.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Program name as launched.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Invoker for CommandInvoker {
    async fn invoke(&self, args: &[String]) -> Result<ExecutionResult, InvokeError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .args(args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // kill_on_drop ensures the child is killed when the case times out
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(program = %self.program, ?args, "invoking candidate");

        let output = cmd.output().await.map_err(|source| InvokeError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // Killed by a signal: no exit code
        let code = output.status.code().unwrap_or(-1);
        tracing::debug!(program = %self.program, code, "candidate exited");

        Ok(ExecutionResult {
            code,
            stdout: split_lines(&output.stdout),
            stderr: split_lines(&output.stderr),
        })
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(ToString::to_string)
        .collect()
}
