use reqwest::Method;
use serde_json::Value;

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};

/// Thin JSON-over-HTTP client for the agent backend. Never retries and
/// never interprets error bodies beyond reporting them.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        self.send(Method::GET, path, query, None).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let mut url = reqwest::Url::parse(&format!("{}{}", self.base_url, path)).map_err(|e| {
            SyncError::Config(format!("invalid API URL {}{path}: {e}", self.base_url))
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }

        let mut request = self.http.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, path, "sending backend request");
        let response = request.send().await.map_err(|e| SyncError::RequestFailed {
            endpoint: path.to_string(),
            status: None,
            message: format!("failed to reach backend at {}: {e}", self.base_url),
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| SyncError::RequestFailed {
            endpoint: path.to_string(),
            status: Some(status.as_u16()),
            message: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(SyncError::RequestFailed {
                endpoint: path.to_string(),
                status: Some(status.as_u16()),
                message: format!("backend answered {status}"),
            });
        }

        Ok(parse_response_body(&bytes))
    }
}

/// Empty or non-JSON bodies become `Null`; callers fall back from there.
fn parse_response_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&SyncConfig::default().with_api_url(server.uri())).unwrap()
    }

    #[test]
    fn non_json_bodies_degrade_gracefully() {
        assert_eq!(parse_response_body(b""), Value::Null);
        assert_eq!(parse_response_body(b"  \n"), Value::Null);
        assert_eq!(parse_response_body(b"{\"a\":1}"), json!({"a": 1}));
        assert_eq!(parse_response_body(b"plain text"), json!("plain text"));
    }

    #[tokio::test]
    async fn post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mood"))
            .and(body_json(json!({"user_id": 7, "mood": "happy"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "noted"})))
            .expect(1)
            .mount(&server)
            .await;

        let body = client_for(&server)
            .post_json("/mood", &json!({"user_id": 7, "mood": "happy"}))
            .await
            .unwrap();
        assert_eq!(body["message"], "noted");
    }

    #[tokio::test]
    async fn get_appends_query_pairs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/cgm/7"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let body = client_for(&server)
            .get_json("/history/cgm/7", &[("limit", "50".to_string())])
            .await
            .unwrap();
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn non_success_status_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cgm"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .post_json("/cgm", &json!({}))
            .await
            .unwrap_err();
        match err {
            SyncError::RequestFailed { endpoint, status, .. } => {
                assert_eq!(endpoint, "/cgm");
                assert_eq!(status, Some(503));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_is_request_failed_without_status() {
        let client = ApiClient::new(&SyncConfig::default().with_api_url("http://127.0.0.1:9")).unwrap();
        let err = client.get_json("/users", &[]).await.unwrap_err();
        assert!(matches!(err, SyncError::RequestFailed { status: None, .. }));
    }
}
