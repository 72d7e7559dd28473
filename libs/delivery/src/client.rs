//! Retrying HTTP sender for gateway requests.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio::time::sleep;
use tracing::warn;

use crate::outcome::DeliveryOutcome;

/// Issues gateway requests with bounded retries and linear backoff.
///
/// An attempt succeeds on status 200, or when the response body contains
/// the gateway's documented async-accepted marker `PENDING` (any case,
/// regardless of status). Any other status, timeout, or transport error is
/// retried until the attempt budget runs out, with `retry_delay * attempt`
/// between attempts.
#[derive(Clone)]
pub struct ResilientClient {
    http: reqwest::Client,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl ResilientClient {
    pub fn new(timeout: Duration, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
            max_retries: max_retries.max(1),
            retry_delay,
        }
    }

    pub async fn post_json(&self, url: &str, api_key: &str, body: &Value) -> DeliveryOutcome {
        self.request(Method::POST, url, api_key, body).await
    }

    pub async fn request(
        &self,
        method: Method,
        url: &str,
        api_key: &str,
        body: &Value,
    ) -> DeliveryOutcome {
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            match self
                .http
                .request(method.clone(), url)
                .header("apikey", api_key)
                .json(body)
                .timeout(self.timeout)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    if status == StatusCode::OK || text.to_ascii_uppercase().contains("PENDING") {
                        let payload = serde_json::from_str(&text)
                            .unwrap_or_else(|_| Value::Object(Default::default()));
                        return DeliveryOutcome::success(payload);
                    }
                    warn!(attempt, status = status.as_u16(), "gateway rejected request");
                    last_error = format!("status {}: {}", status.as_u16(), text);
                }
                Err(err) => {
                    warn!(attempt, error = %err, "gateway request failed");
                    last_error = err.to_string();
                }
            }

            if attempt < self.max_retries {
                sleep(self.retry_delay * attempt).await;
            }
        }

        DeliveryOutcome::error(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, extract::State, routing::post};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::Instant;

    const DELAY: Duration = Duration::from_millis(20);

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/send")
    }

    fn client(max_retries: u32) -> ResilientClient {
        ResilientClient::new(Duration::from_secs(5), max_retries, DELAY)
    }

    #[tokio::test]
    async fn recovers_after_transient_rejections() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/send",
                post(|State(attempts): State<Arc<AtomicUsize>>| async move {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        (StatusCode::SERVICE_UNAVAILABLE, "overloaded".to_string())
                    } else {
                        (StatusCode::OK, r#"{"id": "msg-1"}"#.to_string())
                    }
                }),
            )
            .with_state(attempts.clone());
        let url = serve(app).await;

        let started = Instant::now();
        let outcome = client(3)
            .post_json(&url, "key", &serde_json::json!({}))
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.payload.unwrap()["id"], "msg-1");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // Linear backoff: one delay after the first failure, two after the
        // second.
        assert!(started.elapsed() >= DELAY * 3);
    }

    #[tokio::test]
    async fn pending_body_counts_as_accepted() {
        let app = Router::new().route(
            "/send",
            post(|| async { (StatusCode::BAD_REQUEST, r#"{"status": "Pending"}"#) }),
        );
        let url = serve(app).await;

        let outcome = client(3)
            .post_json(&url, "key", &serde_json::json!({}))
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.payload.unwrap()["status"], "Pending");
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_gateway_body() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/send",
                post(|State(attempts): State<Arc<AtomicUsize>>| async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::UNAUTHORIZED, "invalid apikey")
                }),
            )
            .with_state(attempts.clone());
        let url = serve(app).await;

        let outcome = client(2)
            .post_json(&url, "bad", &serde_json::json!({}))
            .await;

        assert!(!outcome.is_success());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        let message = outcome.message.unwrap();
        assert!(message.contains("401"), "message was {message:?}");
        assert!(message.contains("invalid apikey"));
    }

    #[tokio::test]
    async fn timeouts_are_retried_then_reported() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/send",
                post(|State(attempts): State<Arc<AtomicUsize>>| async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    StatusCode::OK
                }),
            )
            .with_state(attempts.clone());
        let url = serve(app).await;

        let client = ResilientClient::new(Duration::from_millis(50), 2, Duration::from_millis(5));
        let outcome = client.post_json(&url, "key", &serde_json::json!({})).await;

        assert!(!outcome.is_success());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
