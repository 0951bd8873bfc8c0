use thiserror::Error;

/// Failure of a single document fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("non-success status {0}")]
    Status(u16),
    #[error("empty document")]
    EmptyBody,
}

impl FetchError {
    /// Transport failures, timeouts, rate limiting and server errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Timeout(_) => true,
            FetchError::Status(code) => *code == 429 || (500..600).contains(code),
            FetchError::EmptyBody => false,
        }
    }
}

// Timeouts are mapped by `HttpFetcher`, which knows the configured limit.
impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e.to_string())
    }
}

#[derive(Debug, Error)]
#[error("could not resolve {key} after {attempts} attempt(s): {source}")]
pub struct ResolveError {
    pub key: String,
    pub attempts: u32,
    #[source]
    pub source: FetchError,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pagination finished with zero entries collected")]
    NoEntries,
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for PipelineError {
    fn from(e: config::ConfigError) -> Self {
        PipelineError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        assert!(FetchError::Status(503).is_retryable());
        assert!(FetchError::Status(429).is_retryable());
        assert!(!FetchError::Status(404).is_retryable());
        assert!(!FetchError::EmptyBody.is_retryable());
        assert!(FetchError::Transport("reset".into()).is_retryable());
    }

    #[test]
    fn timeout_message_carries_limit() {
        assert_eq!(FetchError::Timeout(30).to_string(), "request timed out after 30s");
    }

    #[tokio::test]
    async fn reqwest_errors_become_transport() {
        let err = reqwest::Client::new().get("not a url").send().await.unwrap_err();
        assert!(matches!(FetchError::from(err), FetchError::Transport(_)));
    }
}
