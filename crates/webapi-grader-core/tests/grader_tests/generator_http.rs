//! Generator HTTP contract.

use super::{FakeInvoker, StubServer, TestResult, english, runner_for, suite_at};
use reqwest::Method;
use serde_json::json;
use webapi_grader_core::{GeneratorClient, GeneratorError, Params, RunnerError};

const ONE_CASE: &str = r#"
config:
  endPoint: http://placeholder
testcases:
  - title: t
    params:
      count: 3
      name: World
    generate:
      queries:
        n: "{{count}}"
        tags: [a, b]
        skip: null
      body:
        user: "{{name}}"
    exec:
      args: []
    expected:
      code: 0
"#;

fn client(endpoint: &str) -> Result<GeneratorClient, reqwest::Error> {
    let http = reqwest::Client::builder().no_proxy().build()?;
    Ok(GeneratorClient::with_client(http, endpoint))
}

#[tokio::test]
async fn test_rendered_queries_and_body_are_sent() -> TestResult {
    let server = StubServer::repeat(1, r#"{"token": "t", "state": {}}"#)?;
    let suite = suite_at(ONE_CASE, &server.endpoint())?;
    let runner = runner_for(suite.clone(), english(), FakeInvoker::printing(0, ""))?;

    let outcome = runner.run_raw(&suite.testcases[0]).await?;
    assert!(outcome.passed());

    let requests = server.requests()?;
    let request = &requests[0];
    let request_line = request.lines().next().unwrap_or_default();
    assert!(request_line.starts_with("GET /_generate?"), "{request_line}");
    assert!(request_line.contains("n=3"), "{request_line}");
    assert!(
        request_line.contains("tags%5B%5D=a&tags%5B%5D=b"),
        "{request_line}"
    );
    assert!(!request_line.contains("skip"), "{request_line}");
    assert!(request.ends_with(r#"{"user":"World"}"#), "{request}");
    Ok(())
}

#[tokio::test]
async fn test_null_body_is_not_sent() -> TestResult {
    let server = StubServer::repeat(1, r#"{"token": "t", "state": 1}"#)?;
    let generated = client(&server.endpoint())?
        .generate_default_get(&json!({}), &json!(null), &Params::new())
        .await?;
    assert_eq!(generated.token, json!("t"));

    let requests = server.requests()?;
    assert!(requests[0].ends_with("\r\n\r\n"), "{}", requests[0]);
    Ok(())
}

#[tokio::test]
async fn test_explicit_method_and_path() -> TestResult {
    let server = StubServer::repeat(1, r#"{"token": "t", "state": 1, "extra": true}"#)?;
    let generated = client(&server.endpoint())?
        .generate_with_method(
            Method::POST,
            "/_custom",
            &json!(null),
            &json!({"a": 1}),
            &Params::new(),
        )
        .await?;
    assert_eq!(generated.extra.get("extra"), Some(&json!(true)));

    let requests = server.requests()?;
    assert!(requests[0].starts_with("POST /_custom "), "{}", requests[0]);
    Ok(())
}

#[tokio::test]
async fn test_error_status_fails_the_case() -> TestResult {
    let server = StubServer::start(vec![(500, r#"{"error": "boom"}"#.to_string())])?;
    let suite = suite_at(ONE_CASE, &server.endpoint())?;
    let invoker = FakeInvoker::printing(0, "");
    let runner = runner_for(suite.clone(), english(), invoker.clone())?;

    let result = runner.run_raw(&suite.testcases[0]).await;

    let Err(RunnerError::Generator(GeneratorError::Status { status, body, .. })) = &result else {
        return Err(format!("expected a status error, got {result:?}").into());
    };
    assert_eq!(*status, 500);
    assert!(body.contains("boom"));
    assert!(invoker.calls().is_empty(), "candidate must not run");
    Ok(())
}

#[tokio::test]
async fn test_response_without_token_is_rejected() -> TestResult {
    let server = StubServer::repeat(1, r#"{"state": 1}"#)?;
    let result = client(&server.endpoint())?
        .generate_default_get(&json!({}), &json!(null), &Params::new())
        .await;
    assert!(matches!(result, Err(GeneratorError::Decode { .. })));
    Ok(())
}

#[tokio::test]
async fn test_non_json_response_is_rejected() -> TestResult {
    let server = StubServer::repeat(1, "not json")?;
    let result = client(&server.endpoint())?
        .generate_default_get(&json!({}), &json!(null), &Params::new())
        .await;
    let Err(GeneratorError::Decode { body, .. }) = result else {
        return Err("expected a decode error".into());
    };
    assert_eq!(body, "not json");
    Ok(())
}

#[tokio::test]
async fn test_unreachable_service() -> TestResult {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let endpoint = format!("http://127.0.0.1:{}", listener.local_addr()?.port());
    drop(listener);

    let result = client(&endpoint)?
        .generate_default_get(&json!({}), &json!(null), &Params::new())
        .await;
    assert!(matches!(result, Err(GeneratorError::Request { .. })));
    Ok(())
}
