//! Real candidate processes launched through `sh`.

use super::{StubServer, TestResult, english, runner_for, suite_at};
use webapi_grader_core::{CheckFailure, CommandInvoker, InvokeError, RunnerError};

const ECHO_SUITE: &str = r#"
config:
  endPoint: http://placeholder
testcases:
  - title: echoes token and state
    generate:
      queries: {}
    exec:
      args: ["{{{token}}}", "{{state.step}}"]
    expected:
      code: 0
      stdout:
        plain: |
          token={{{token}}}
          step={{state.step}}
"#;

const TOKEN_REPLY: &str = r#"{"token": "x/y", "state": {"step": 2}}"#;

/// `sh -c SCRIPT sh ARGS...`: the case arguments become `$1`, `$2`, ...
#[cfg(unix)]
fn shell(script: &str) -> CommandInvoker {
    CommandInvoker::new("sh").arg("-c").arg(script).arg("sh")
}

#[cfg(unix)]
#[tokio::test]
async fn test_real_process_passes() -> TestResult {
    let server = StubServer::repeat(1, TOKEN_REPLY)?;
    let suite = suite_at(ECHO_SUITE, &server.endpoint())?;
    let invoker = shell(r#"echo "token=$1"; echo "step=$2""#);
    let runner = runner_for(suite.clone(), english(), invoker)?;

    let outcome = runner.run_raw(&suite.testcases[0]).await?;

    assert!(outcome.passed(), "unexpected failure: {:?}", outcome.failure);
    assert_eq!(outcome.result.stdout, vec!["token=x/y", "step=2"]);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_real_process_wrong_exit_code() -> TestResult {
    let server = StubServer::repeat(1, TOKEN_REPLY)?;
    let suite = suite_at(ECHO_SUITE, &server.endpoint())?;
    let invoker = shell(r#"echo "token=$1"; echo oops >&2; exit 4"#);
    let runner = runner_for(suite.clone(), english(), invoker)?;

    let outcome = runner.run_raw(&suite.testcases[0]).await?;

    assert_eq!(
        outcome.failure,
        Some(CheckFailure::ExitCode {
            expected: 0,
            actual: 4
        })
    );
    assert_eq!(outcome.result.stderr, vec!["oops"]);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_real_process_extra_line_fails() -> TestResult {
    let server = StubServer::repeat(1, TOKEN_REPLY)?;
    let suite = suite_at(ECHO_SUITE, &server.endpoint())?;
    let invoker = shell(r#"echo "token=$1"; echo "step=$2"; echo debug"#);
    let runner = runner_for(suite.clone(), english(), invoker)?;

    let outcome = runner.run_raw(&suite.testcases[0]).await?;

    let Some(CheckFailure::Stdout { views, .. }) = outcome.failure else {
        return Err("expected a stdout failure".into());
    };
    assert!(views.actual.contains("debug"));
    assert!(!views.expected.contains("debug"));
    Ok(())
}

#[tokio::test]
async fn test_launch_failure_is_an_error() -> TestResult {
    let server = StubServer::repeat(1, TOKEN_REPLY)?;
    let suite = suite_at(ECHO_SUITE, &server.endpoint())?;
    let invoker = CommandInvoker::new("no-such-candidate-binary-for-grader-tests");
    let runner = runner_for(suite.clone(), english(), invoker)?;

    let result = runner.run_raw(&suite.testcases[0]).await;

    assert!(matches!(
        result,
        Err(RunnerError::Invoke(InvokeError::Spawn { .. }))
    ));
    Ok(())
}
