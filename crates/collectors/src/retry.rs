use crate::error::CollectorError;
use configuration::RetrySettings;
use core_types::SourceKind;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Exponential backoff shared by every upstream request.
///
/// The wait after the n-th failed attempt is `2^(n-1)` seconds, clamped to
/// `[min_backoff, max_backoff]`. Client errors other than 429 are not retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    min_backoff: Duration,
    max_backoff: Duration,
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self::new(
            settings.max_attempts,
            Duration::from_secs(settings.min_backoff_secs),
            Duration::from_secs(settings.max_backoff_secs),
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, min_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            min_backoff,
            max_backoff: max_backoff.max(min_backoff),
        }
    }

    /// A policy that tries once and never sleeps.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// How long to wait after `attempt` (1-based) has failed.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let raw = Duration::from_secs(1u64 << exponent);
        raw.clamp(self.min_backoff, self.max_backoff)
    }

    /// Sends the request produced by `build` until it succeeds or the policy gives up.
    ///
    /// `build` is called once per attempt. A 2xx response is returned as-is.
    pub async fn send(
        &self,
        kind: SourceKind,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<Response, CollectorError> {
        let mut attempt = 1;
        loop {
            let last_attempt = attempt >= self.max_attempts;
            match build().send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    if !is_retryable(status) || last_attempt {
                        tracing::error!(%kind, status = status.as_u16(), %body, "Upstream API error");
                        return Err(CollectorError::Api {
                            kind,
                            status: status.as_u16(),
                            body,
                        });
                    }
                    tracing::warn!(
                        %kind,
                        attempt,
                        max_attempts = self.max_attempts,
                        status = status.as_u16(),
                        "Retryable upstream status"
                    );
                }
                Err(e) => {
                    if last_attempt {
                        return Err(CollectorError::Request(e));
                    }
                    tracing::warn!(%kind, attempt, max_attempts = self.max_attempts, error = %e, "Request failed");
                }
            }

            tokio::time::sleep(self.backoff_after(attempt)).await;
            attempt += 1;
        }
    }

    /// Like [`RetryPolicy::send`], deserializing the JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        kind: SourceKind,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<T, CollectorError> {
        let text = self.send(kind, build).await?.text().await?;
        serde_json::from_str(&text).map_err(|e| CollectorError::Deserialization {
            kind,
            message: e.to_string(),
        })
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn backoff_is_clamped_to_the_configured_window() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.backoff_after(1), Duration::from_secs(4));
        assert_eq!(policy.backoff_after(3), Duration::from_secs(4));
        assert_eq!(policy.backoff_after(4), Duration::from_secs(8));
        assert_eq!(policy.backoff_after(5), Duration::from_secs(10));
        assert_eq!(policy.backoff_after(60), Duration::from_secs(10));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let policy = RetryPolicy::new(0, Duration::ZERO, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_the_limit() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/flaky");
                then.status(503).body("unavailable");
            })
            .await;

        let client = reqwest::Client::new();
        let policy = RetryPolicy::new(3, Duration::ZERO, Duration::ZERO);
        let err = policy
            .send(SourceKind::Ads, || client.get(server.url("/flaky")))
            .await
            .unwrap_err();

        mock.assert_calls_async(3).await;
        assert!(matches!(err, CollectorError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn client_errors_fail_immediately() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/denied");
                then.status(401).body("bad token");
            })
            .await;

        let client = reqwest::Client::new();
        let policy = RetryPolicy::new(3, Duration::ZERO, Duration::ZERO);
        let err = policy
            .send(SourceKind::Expenses, || client.get(server.url("/denied")))
            .await
            .unwrap_err();

        mock.assert_calls_async(1).await;
        match err {
            CollectorError::Api { kind, status, body } => {
                assert_eq!(kind, SourceKind::Expenses);
                assert_eq!(status, 401);
                assert_eq!(body, "bad token");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_deserialization_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/html");
                then.status(200).body("<html>login</html>");
            })
            .await;

        let client = reqwest::Client::new();
        let err = RetryPolicy::no_retry()
            .get_json::<serde_json::Value>(SourceKind::Events, || client.get(server.url("/html")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CollectorError::Deserialization {
                kind: SourceKind::Events,
                ..
            }
        ));
    }
}
