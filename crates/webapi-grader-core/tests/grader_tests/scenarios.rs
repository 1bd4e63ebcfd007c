//! End-to-end scenarios against a stub generator and a fake candidate.

use super::{FakeInvoker, StubServer, TestResult, english, output, runner_for, suite_at};
use webapi_grader_core::{CheckFailure, RunnerOptions};

const HELLO_SUITE: &str = r#"
config:
  endPoint: http://placeholder
testcases:
  - title: t1
    generate:
      queries: {}
      body: {}
    exec:
      args: ["{{token}}"]
    expected:
      code: 0
      stdout:
        plain: ok
"#;

const TOKEN_REPLY: &str = r#"{"token": "abc", "state": "s1"}"#;

fn answers_ok_to_abc(args: &[String]) -> webapi_grader_core::ExecutionResult {
    if args == ["abc"] {
        output(0, "ok")
    } else {
        output(1, "unexpected arguments")
    }
}

#[tokio::test]
async fn test_passing_case() -> TestResult {
    let server = StubServer::repeat(1, TOKEN_REPLY)?;
    let invoker = FakeInvoker::new(answers_ok_to_abc);
    let suite = suite_at(HELLO_SUITE, &server.endpoint())?;
    let runner = runner_for(suite.clone(), english(), invoker.clone())?;

    let outcome = runner.run_raw(&suite.testcases[0]).await?;

    assert!(outcome.passed(), "unexpected failure: {:?}", outcome.failure);
    assert_eq!(invoker.calls(), vec![vec!["abc".to_string()]]);
    assert_eq!(outcome.params.get("token"), Some(&serde_json::json!("abc")));
    assert_eq!(outcome.params.get("state"), Some(&serde_json::json!("s1")));

    let requests = server.requests()?;
    assert!(requests[0].starts_with("GET /_generate"));
    Ok(())
}

#[tokio::test]
async fn test_stdout_mismatch_reports_both_views() -> TestResult {
    let server = StubServer::repeat(1, TOKEN_REPLY)?;
    let suite = suite_at(HELLO_SUITE, &server.endpoint())?;
    let runner = runner_for(suite.clone(), english(), FakeInvoker::printing(0, "ko"))?;

    let outcome = runner.run_raw(&suite.testcases[0]).await?;

    let Some(failure) = outcome.failure else {
        return Err("expected a stdout failure".into());
    };
    assert!(matches!(failure, CheckFailure::Stdout { .. }));
    let message = failure.to_string();
    assert!(message.contains("Invalid stdout"));
    assert!(message.contains("Expected"));
    assert!(message.contains("ok"));
    assert!(message.contains("Actual"));
    assert!(message.contains("ko"));
    Ok(())
}

#[tokio::test]
async fn test_exit_code_mismatch() -> TestResult {
    let server = StubServer::repeat(1, TOKEN_REPLY)?;
    let suite = suite_at(HELLO_SUITE, &server.endpoint())?;
    let runner = runner_for(suite.clone(), english(), FakeInvoker::printing(2, "ok"))?;

    let outcome = runner.run_raw(&suite.testcases[0]).await?;

    assert_eq!(
        outcome.failure,
        Some(CheckFailure::ExitCode {
            expected: 0,
            actual: 2
        })
    );
    assert!(
        outcome
            .failure
            .is_some_and(|f| f.to_string().starts_with("Invalid exit code"))
    );
    Ok(())
}

#[test]
fn test_localized_title() -> TestResult {
    let yaml = r#"
config:
  endPoint: http://placeholder
testcases:
  - title:
      en: "Hello {{name}}"
      ja: "こんにちは{{name}}"
    params:
      name: World
    generate: {}
    exec: {}
    expected: {}
"#;
    let suite = suite_at(yaml, "http://127.0.0.1:9")?;

    let runner = runner_for(suite.clone(), english(), FakeInvoker::printing(0, ""))?;
    assert_eq!(runner.plan()?[0].title, "Hello World");

    let runner = runner_for(suite.clone(), RunnerOptions::default(), FakeInvoker::printing(0, ""))?;
    assert_eq!(runner.plan()?[0].title, "こんにちはWorld");

    let french = RunnerOptions {
        lang: "fr".into(),
        ..RunnerOptions::default()
    };
    let runner = runner_for(suite, french, FakeInvoker::printing(0, ""))?;
    assert_eq!(runner.plan()?[0].title, "Hello World");
    Ok(())
}

#[tokio::test]
async fn test_template_chain_is_shallow() -> TestResult {
    let yaml = r#"
config:
  endPoint: http://placeholder
testcases:
  - title: chained
    template:
      expected:
        code: 1
      exec:
        args: ["{{token}}", "--state={{state}}"]
      template:
        generate:
          queries: {}
    expected:
      code: 0
"#;
    let server = StubServer::repeat(1, TOKEN_REPLY)?;
    let suite = suite_at(yaml, &server.endpoint())?;

    let cases = suite.normalized_cases()?;
    assert_eq!(cases[0].expected.code, 0);
    assert!(cases[0].expected.stdout.is_none());

    let invoker = FakeInvoker::printing(0, "");
    let runner = runner_for(suite.clone(), english(), invoker.clone())?;
    let outcome = runner.run_raw(&suite.testcases[0]).await?;

    assert!(outcome.passed());
    assert_eq!(
        invoker.calls(),
        vec![vec!["abc".to_string(), "--state=s1".to_string()]]
    );
    Ok(())
}

#[tokio::test]
async fn test_expected_stdout_rendered_with_generated_token() -> TestResult {
    let yaml = r#"
config:
  endPoint: http://placeholder
testcases:
  - title: echo token
    generate:
      queries: {}
    exec:
      args: ["{{{token}}}"]
    expected:
      stdout:
        plain: |
          token: {{{token}}}
          done
"#;
    let server = StubServer::repeat(1, r#"{"token": "a&b", "state": null}"#)?;
    let suite = suite_at(yaml, &server.endpoint())?;
    let invoker = FakeInvoker::new(|args| output(0, &format!("token: {}\ndone", args[0])));
    let runner = runner_for(suite.clone(), english(), invoker)?;

    let outcome = runner.run_raw(&suite.testcases[0]).await?;

    assert!(outcome.passed(), "unexpected failure: {:?}", outcome.failure);
    Ok(())
}
