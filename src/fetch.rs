use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use tracing::{debug, warn};

use crate::error::FetchError;

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A successfully retrieved document.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub status: u16,
    pub body: String,
}

/// `fetchDocument(url)`, shared by the listing and detail phases.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, referer: &str) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        if let Ok(v) = HeaderValue::from_str(referer) {
            headers.insert(REFERER, v);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(HttpFetcher {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout_secs)
            } else {
                FetchError::from(e)
            }
        })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout_secs)
            } else {
                FetchError::from(e)
            }
        })?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }

        Ok(FetchedDocument { status, body })
    }
}

/// Retry policy for a single fetch.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

/// Fetch with exponential backoff on retryable failures.
/// Returns the document or the last error together with the number of attempts made.
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    url: &str,
    policy: RetryPolicy,
) -> Result<FetchedDocument, (FetchError, u32)> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match fetcher.fetch(url).await {
            Ok(doc) => return Ok(doc),
            Err(e) if e.is_retryable() && attempt <= policy.max_retries => {
                let backoff = policy
                    .base_backoff
                    .saturating_mul(2u32.saturating_pow(attempt - 1));
                warn!(
                    url,
                    attempt,
                    max_retries = policy.max_retries,
                    error = %e,
                    "fetch failed, backing off {:.1}s",
                    backoff.as_secs_f64()
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => {
                debug!(url, attempt, error = %e, "giving up on fetch");
                return Err((e, attempt));
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Serves canned documents; unknown URLs answer 404.
    #[derive(Default)]
    pub struct MemoryFetcher {
        docs: HashMap<String, (u16, String)>,
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<String>>,
    }

    impl MemoryFetcher {
        pub fn with(mut self, url: &str, status: u16, body: &str) -> Self {
            self.docs.insert(url.to_string(), (status, body.to_string()));
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for MemoryFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(url.to_string());
            match self.docs.get(url) {
                Some((status, _)) if !(200..300).contains(status) => Err(FetchError::Status(*status)),
                Some((_, body)) if body.trim().is_empty() => Err(FetchError::EmptyBody),
                Some((status, body)) => Ok(FetchedDocument {
                    status: *status,
                    body: body.clone(),
                }),
                None => Err(FetchError::Status(404)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn http_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/result/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5), &server.uri()).unwrap();
        let doc = fetcher.fetch(&format!("{}/result/1", server.uri())).await.unwrap();
        assert_eq!(doc.status, 200);
        assert!(doc.body.contains("ok"));
    }

    #[tokio::test]
    async fn http_fetch_maps_status_and_empty_body() {
        let server = MockServer::start().await;
        Mock::given(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(path("/blank"))
            .respond_with(ResponseTemplate::new(200).set_body_string("   "))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5), &server.uri()).unwrap();
        let missing = fetcher.fetch(&format!("{}/missing", server.uri())).await;
        assert!(matches!(missing, Err(FetchError::Status(404))));
        let blank = fetcher.fetch(&format!("{}/blank", server.uri())).await;
        assert!(matches!(blank, Err(FetchError::EmptyBody)));
    }

    #[tokio::test]
    async fn http_fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(1), &server.uri()).unwrap();
        let res = fetcher.fetch(&format!("{}/slow", server.uri())).await;
        assert!(matches!(res, Err(FetchError::Timeout(1))));
    }

    #[tokio::test]
    async fn retry_recovers_from_server_error() {
        let server = MockServer::start().await;
        Mock::given(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5), &server.uri()).unwrap();
        let doc = fetch_with_retry(&fetcher, &format!("{}/flaky", server.uri()), policy(2))
            .await
            .unwrap();
        assert_eq!(doc.body, "fine");
    }

    #[tokio::test]
    async fn retry_gives_up_after_bound() {
        let server = MockServer::start().await;
        Mock::given(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5), &server.uri()).unwrap();
        let err = fetch_with_retry(&fetcher, &format!("{}/down", server.uri()), policy(2))
            .await
            .unwrap_err();
        assert!(matches!(err, (FetchError::Status(500), 3)));
    }

    #[tokio::test]
    async fn long_retry_chain_does_not_overflow_backoff() {
        let fetcher = testing::MemoryFetcher::default().with("https://x.test/busy", 503, "busy");
        let policy = RetryPolicy {
            max_retries: 40,
            base_backoff: Duration::ZERO,
        };
        let err = fetch_with_retry(&fetcher, "https://x.test/busy", policy)
            .await
            .unwrap_err();
        assert!(matches!(err, (FetchError::Status(503), 41)));
        assert_eq!(fetcher.call_count(), 41);
    }

    #[tokio::test]
    async fn no_retry_on_not_found() {
        let fetcher = testing::MemoryFetcher::default();
        let err = fetch_with_retry(&fetcher, "https://x.test/none", policy(3))
            .await
            .unwrap_err();
        assert_eq!(err.1, 1);
        assert_eq!(fetcher.call_count(), 1);
    }
}
