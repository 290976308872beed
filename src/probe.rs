use reqwest::StatusCode;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::models::{Outcome, Target};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("Request failed with status code {}", .0.as_u16())]
    HttpStatus(StatusCode),
}

/// Issues single-shot HTTP GETs against targets. Holds no shared state.
#[derive(Clone)]
pub struct Prober {
    http_client: reqwest::Client,
}

impl Prober {
    /// `timeout` of `None` leaves the transport's default in place.
    pub fn new(timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http_client: builder.build()?,
        })
    }

    pub async fn probe(&self, target: &Target) -> Outcome {
        let start = Instant::now();
        match self.fetch(&target.url).await {
            Ok(body) => Outcome::Success {
                response_time_ms: start.elapsed().as_millis() as u64,
                body,
            },
            Err(e) => Outcome::Failure {
                error: e.to_string(),
            },
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, ProbeError> {
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::HttpStatus(status));
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target(url: String) -> Target {
        Target::new("t", "Test", url)
    }

    #[tokio::test]
    async fn success_carries_latency_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"memoryUsage": {"heapUsed": "12 MB"}}}))
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let prober = Prober::new(None).unwrap();
        let outcome = prober.probe(&target(format!("{}/ping", server.uri()))).await;

        match outcome {
            Outcome::Success {
                response_time_ms,
                body,
            } => {
                assert!(response_time_ms >= 50, "latency {response_time_ms}");
                assert!(body.contains("heapUsed"));
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_error_status_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let prober = Prober::new(None).unwrap();
        let outcome = prober.probe(&target(server.uri())).await;
        assert_eq!(
            outcome,
            Outcome::Failure {
                error: "Request failed with status code 503".into()
            }
        );
    }

    #[tokio::test]
    async fn timeout_is_a_failure_not_a_panic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let prober = Prober::new(Some(Duration::from_millis(100))).unwrap();
        let outcome = prober.probe(&target(server.uri())).await;
        assert!(matches!(outcome, Outcome::Failure { .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_failure() {
        let prober = Prober::new(Some(Duration::from_secs(2))).unwrap();
        let outcome = prober
            .probe(&target("http://127.0.0.1:1/unreachable".into()))
            .await;
        match outcome {
            Outcome::Failure { error } => assert!(!error.is_empty()),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
