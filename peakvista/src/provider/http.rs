//! HTTP client abstraction for testability

use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;

/// Transport-level failure: the request never produced a status line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("failed to create HTTP client: {0}")]
    Build(String),
}

/// Status and body of a completed HTTP exchange.
///
/// Non-success statuses are returned as responses rather than errors so the
/// caller can tell "tile absent" (404) from server trouble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn ok(body: Vec<u8>) -> Self {
        Self { status: 200, body }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Async HTTP GET.
///
/// Returned futures are `Send` so fetches can run on any runtime worker.
pub trait AsyncHttpClient: Send + Sync {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, HttpError>>;
}

impl<C: AsyncHttpClient + ?Sized> AsyncHttpClient for std::sync::Arc<C> {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, HttpError>> {
        (**self).get(url)
    }
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with the given connect timeout.
    ///
    /// The overall per-request deadline is enforced by the caller.
    pub fn new(connect_timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("peakvista/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, HttpError>> {
        Box::pin(async move {
            let response = self.client.get(url).send().await.map_err(classify)?;
            let status = response.status().as_u16();

            let body = response
                .bytes()
                .await
                .map_err(|e| HttpError::Body(e.to_string()))?;

            Ok(HttpResponse {
                status,
                body: body.to_vec(),
            })
        })
    }
}

fn classify(err: reqwest::Error) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout
    } else if err.is_connect() {
        HttpError::Connect(err.to_string())
    } else {
        HttpError::Request(err.to_string())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;
    use tokio::time::Instant;

    /// One scripted reply from the mock.
    #[derive(Debug, Clone)]
    pub struct MockReply {
        pub delay: Duration,
        pub result: Result<HttpResponse, HttpError>,
    }

    impl MockReply {
        pub fn ok(body: Vec<u8>) -> Self {
            Self {
                delay: Duration::ZERO,
                result: Ok(HttpResponse::ok(body)),
            }
        }

        pub fn status(status: u16) -> Self {
            Self {
                delay: Duration::ZERO,
                result: Ok(HttpResponse::status(status)),
            }
        }

        pub fn error(err: HttpError) -> Self {
            Self {
                delay: Duration::ZERO,
                result: Err(err),
            }
        }

        /// A reply that takes longer than any sane timeout.
        pub fn hang() -> Self {
            Self {
                delay: Duration::from_secs(3600),
                result: Ok(HttpResponse::status(200)),
            }
        }

        pub fn after(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    type Handler = dyn Fn(&str) -> MockReply + Send + Sync;

    /// Mock HTTP client for testing.
    ///
    /// Replies come from a per-URL script first (the last scripted reply
    /// repeats), then from the fallback handler. Every request is logged with
    /// the (possibly paused) tokio clock.
    pub struct MockAsyncHttpClient {
        scripts: Mutex<HashMap<String, VecDeque<MockReply>>>,
        fallback: Arc<Handler>,
        requests: Mutex<Vec<(String, Instant)>>,
    }

    impl MockAsyncHttpClient {
        pub fn new(fallback: impl Fn(&str) -> MockReply + Send + Sync + 'static) -> Self {
            Self {
                scripts: Mutex::new(HashMap::new()),
                fallback: Arc::new(fallback),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Every URL gets the same reply.
        pub fn always(reply: MockReply) -> Self {
            Self::new(move |_| reply.clone())
        }

        pub fn script(self, url: &str, replies: Vec<MockReply>) -> Self {
            self.scripts.lock().insert(url.to_string(), replies.into());
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().len()
        }

        pub fn requests_for(&self, url: &str) -> Vec<Instant> {
            self.requests
                .lock()
                .iter()
                .filter(|(u, _)| u == url)
                .map(|(_, at)| *at)
                .collect()
        }

        pub fn urls(&self) -> Vec<String> {
            self.requests.lock().iter().map(|(u, _)| u.clone()).collect()
        }

        fn next_reply(&self, url: &str) -> MockReply {
            let mut scripts = self.scripts.lock();
            if let Some(queue) = scripts.get_mut(url) {
                if queue.len() > 1 {
                    if let Some(reply) = queue.pop_front() {
                        return reply;
                    }
                }
                if let Some(reply) = queue.front() {
                    return reply.clone();
                }
            }
            drop(scripts);
            (self.fallback)(url)
        }
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, HttpError>> {
            self.requests.lock().push((url.to_string(), Instant::now()));
            let reply = self.next_reply(url);
            Box::pin(async move {
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                reply.result
            })
        }
    }

    #[tokio::test]
    async fn test_mock_script_then_fallback() {
        let mock = MockAsyncHttpClient::always(MockReply::status(404))
            .script("a", vec![MockReply::status(500), MockReply::ok(vec![1])]);

        assert_eq!(mock.get("a").await.unwrap().status, 500);
        assert_eq!(mock.get("a").await.unwrap().body, vec![1]);
        assert_eq!(mock.get("a").await.unwrap().body, vec![1]);
        assert_eq!(mock.get("b").await.unwrap().status, 404);
        assert_eq!(mock.request_count(), 4);
        assert_eq!(mock.requests_for("a").len(), 3);
    }

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::ok(vec![]).is_success());
        assert!(HttpResponse::status(204).is_success());
        assert!(!HttpResponse::status(404).is_success());
        assert!(!HttpResponse::status(503).is_success());
    }
}
