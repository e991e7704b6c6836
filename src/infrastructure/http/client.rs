//! Upstream HTTP client using reqwest

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::domain::DomainError;
use crate::domain::fetch::{FetchFormat, FetchRequest, UpstreamClient};
use crate::infrastructure::observability::record_upstream_request;

/// Maximum number of characters of an upstream error body kept in logs
const ERROR_BODY_LIMIT: usize = 200;

/// Real HTTP client for external services
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UpstreamClient for HttpClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<Value, DomainError> {
        let started = Instant::now();
        let service = request.service.as_str();

        let mut builder = self.client.get(&request.url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        debug!(service, url = %request.url, "Fetching upstream resource");

        let response = builder.send().await.map_err(|e| {
            record_upstream_request(service, None, started.elapsed());
            DomainError::upstream(service, format!("Request failed: {}", e))
        })?;

        let status = response.status();
        record_upstream_request(service, Some(status.as_u16()), started.elapsed());

        if request.format == FetchFormat::Exists {
            return if status.is_success() {
                Ok(Value::Bool(true))
            } else if status == StatusCode::NOT_FOUND {
                Ok(Value::Bool(false))
            } else {
                Err(DomainError::upstream_status(
                    service,
                    status.as_u16(),
                    format!("HTTP {}", status),
                ))
            };
        }

        if status == StatusCode::NOT_FOUND {
            return Err(DomainError::not_found(format!(
                "{} resource not found",
                service
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();

            return Err(DomainError::upstream_status(
                service,
                status.as_u16(),
                format!("HTTP {}: {}", status, body),
            ));
        }

        match request.format {
            FetchFormat::Json => response.json().await.map_err(|e| {
                DomainError::upstream(service, format!("Failed to parse response: {}", e))
            }),
            FetchFormat::Text => response.text().await.map(Value::String).map_err(|e| {
                DomainError::upstream(service, format!("Failed to read response: {}", e))
            }),
            FetchFormat::Exists => Ok(Value::Bool(true)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> HttpClient {
        HttpClient::new(Duration::from_secs(5), "npmx-test").unwrap()
    }

    #[tokio::test]
    async fn test_fetch_json_with_query_and_headers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vue"))
            .and(query_param("full", "1"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "vue"})))
            .expect(1)
            .mount(&server)
            .await;

        let request = FetchRequest::json("npm", format!("{}/vue", server.uri()))
            .with_query("full", "1")
            .with_header("accept", "application/json");

        let value = client().fetch(&request).await.unwrap();
        assert_eq!(value, json!({"name": "vue"}));
    }

    #[tokio::test]
    async fn test_fetch_text() {
        let server = MockServer::start().await;

        Mock::given(path("/README.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Hello"))
            .mount(&server)
            .await;

        let request = FetchRequest::text("jsdelivr", format!("{}/README.md", server.uri()));
        let value = client().fetch(&request).await.unwrap();

        assert_eq!(value, Value::String("# Hello".to_string()));
    }

    #[tokio::test]
    async fn test_not_found_maps_to_not_found() {
        let server = MockServer::start().await;

        Mock::given(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let request = FetchRequest::json("npm", format!("{}/missing", server.uri()));
        let result = client().fetch(&request).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_upstream() {
        let server = MockServer::start().await;

        Mock::given(path("/boom"))
            .respond_with(ResponseTemplate::new(500).set_body_string("stack trace here"))
            .mount(&server)
            .await;

        let request = FetchRequest::json("npm", format!("{}/boom", server.uri()));

        match client().fetch(&request).await {
            Err(DomainError::Upstream { service, status, .. }) => {
                assert_eq!(service, "npm");
                assert_eq!(status, Some(500));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exists_format() {
        let server = MockServer::start().await;

        Mock::given(path("/present"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(path("/absent"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let present = FetchRequest::exists("gravatar", format!("{}/present", server.uri()));
        let absent = FetchRequest::exists("gravatar", format!("{}/absent", server.uri()));

        assert_eq!(client().fetch(&present).await.unwrap(), Value::Bool(true));
        assert_eq!(client().fetch(&absent).await.unwrap(), Value::Bool(false));
    }

    #[tokio::test]
    async fn test_invalid_json_is_upstream_error() {
        let server = MockServer::start().await;

        Mock::given(path("/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let request = FetchRequest::json("npm", format!("{}/garbage", server.uri()));
        let result = client().fetch(&request).await;

        assert!(matches!(result, Err(DomainError::Upstream { .. })));
    }
}
