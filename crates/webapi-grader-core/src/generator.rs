//! Client for the challenge service's state generator.

use crate::template::{render, value_text};
use crate::types::Params;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Path of the generator endpoint relative to the service base URL.
pub const GENERATE_PATH: &str = "/_generate";

const MAX_ERROR_BODY_CHARS: usize = 1000;

/// Errors that can occur while calling the generator.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("generator returned {status} for {url}\nbody: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("invalid generator response: {source}\nbody: {body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

/// Payload returned by the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generated {
    pub token: Value,
    pub state: Value,
    /// Any other fields the service returned.
    #[serde(flatten)]
    pub extra: Params,
}

impl Generated {
    /// Merge `token` and `state` into `params`, replacing existing values.
    pub fn merge_into(&self, params: &mut Params) {
        params.insert("token".to_string(), self.token.clone());
        params.insert("state".to_string(), self.state.clone());
    }
}

/// HTTP client bound to one service endpoint.
#[derive(Debug, Clone)]
pub struct GeneratorClient {
    http: reqwest::Client,
    endpoint: String,
}

impl GeneratorClient {
    /// Create a client for `endpoint`, e.g. `http://localhost:8080`.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, GeneratorError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(GeneratorError::Client)?;
        Ok(Self::with_client(http, endpoint))
    }

    /// Use an already configured HTTP client.
    #[must_use]
    pub fn with_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `GET {endpoint}/_generate` with rendered queries and body.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-2xx status, or a body
    /// without `token` and `state`.
    pub async fn generate_default_get(
        &self,
        queries: &Value,
        body: &Value,
        params: &Params,
    ) -> Result<Generated, GeneratorError> {
        self.generate_with_method(Method::GET, GENERATE_PATH, queries, body, params)
            .await
    }

    /// Call the generator with an explicit method and path.
    ///
    /// `queries` and `body` are rendered with `params` first. A null body is
    /// not sent.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-2xx status, or a body
    /// without `token` and `state`.
    pub async fn generate_with_method(
        &self,
        method: Method,
        path: &str,
        queries: &Value,
        body: &Value,
        params: &Params,
    ) -> Result<Generated, GeneratorError> {
        let url = format!("{}{path}", self.endpoint);
        let query = query_pairs(&render(queries, params));
        let body = render(body, params);

        tracing::debug!(%method, %url, ?query, "calling generator");

        let mut request = self.http.request(method, &url).query(&query);
        if !body.is_null() {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| GeneratorError::Request {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| GeneratorError::Request {
                url: url.clone(),
                source,
            })?;

        if !status.is_success() {
            return Err(GeneratorError::Status {
                url,
                status: status.as_u16(),
                body: truncate_chars(&text, MAX_ERROR_BODY_CHARS),
            });
        }

        serde_json::from_str(&text).map_err(|source| GeneratorError::Decode {
            source,
            body: truncate_chars(&text, MAX_ERROR_BODY_CHARS),
        })
    }
}

/// Flatten rendered query parameters into `key=value` pairs.
///
/// Sequences become repeated `key[]` entries, mappings are sent as JSON and
/// nulls are dropped. Anything other than a mapping yields no pairs.
#[must_use]
pub fn query_pairs(queries: &Value) -> Vec<(String, String)> {
    let Value::Object(fields) = queries else {
        return Vec::new();
    };

    let mut pairs = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                let array_key = format!("{key}[]");
                pairs.extend(
                    items
                        .iter()
                        .filter(|item| !item.is_null())
                        .map(|item| (array_key.clone(), query_value(item))),
                );
            }
            _ => pairs.push((key.clone(), query_value(value))),
        }
    }
    pairs
}

fn query_value(value: &Value) -> String {
    match value {
        Value::Object(_) | Value::Array(_) => value.to_string(),
        _ => value_text(value),
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{truncated}...[truncated]")
    } else {
        truncated
    }
}
