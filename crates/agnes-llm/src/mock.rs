//! Mock LLM provider for testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};

#[derive(Debug, Clone)]
enum Behavior {
    /// Cycle through canned responses
    Canned(Vec<String>),
    /// Every call fails with a connection error
    Fail,
    /// Every call hangs for the given duration, then fails
    Stall(Duration),
}

/// A mock LLM provider: canned, failing or stalling on demand
///
/// Every request is recorded so tests can inspect the prompts an engine built.
#[derive(Debug)]
pub struct MockProvider {
    /// Name of this mock
    pub name: String,
    behavior: Behavior,
    /// Current response index
    index: AtomicUsize,
    /// Simulated latency in ms
    latency_ms: u64,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            name: "mock".to_string(),
            behavior,
            index: AtomicUsize::new(0),
            latency_ms: 5,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a new mock provider with given responses (cycles through them)
    pub fn new(responses: Vec<String>) -> Self {
        Self::with_behavior(Behavior::Canned(responses))
    }

    /// Create a mock that always returns the same response
    pub fn constant(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    /// Create a mock whose every call fails
    pub fn failing() -> Self {
        Self::with_behavior(Behavior::Fail)
    }

    /// Create a mock whose every call hangs before failing
    pub fn stalled(duration: Duration) -> Self {
        Self::with_behavior(Behavior::Stall(duration))
    }

    /// Override the simulated latency
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of calls made
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        matches!(self.behavior, Behavior::Canned(_))
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let responses = match &self.behavior {
            Behavior::Fail => {
                return Err(LlmError::ConnectionFailed("mock provider offline".to_string()))
            }
            Behavior::Stall(duration) => {
                tokio::time::sleep(*duration).await;
                return Err(LlmError::Timeout(duration.as_millis() as u64));
            }
            Behavior::Canned(responses) => responses,
        };

        tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;

        if responses.is_empty() {
            return Err(LlmError::InvalidResponse("no canned responses".to_string()));
        }
        let idx = self.index.fetch_add(1, Ordering::Relaxed);
        let content = responses[idx % responses.len()].clone();

        Ok(LlmResponse {
            content,
            model: self.name.clone(),
            tokens_used: Some((request.prompt.len() / 4) as u32 + 20),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider() {
        let mock = MockProvider::constant("Hello, world!");
        let response = mock.ask("test").await.unwrap();
        assert_eq!(response, "Hello, world!");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_cycles() {
        let mock = MockProvider::new(vec!["one".into(), "two".into()]);
        assert_eq!(mock.ask("a").await.unwrap(), "one");
        assert_eq!(mock.ask("b").await.unwrap(), "two");
        assert_eq!(mock.ask("c").await.unwrap(), "one");
        assert_eq!(mock.requests()[1].prompt, "b");
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockProvider::failing();
        assert!(!mock.is_available().await);
        assert!(matches!(
            mock.ask("x").await,
            Err(LlmError::ConnectionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_stalled_mock_can_be_timed_out() {
        let mock = MockProvider::stalled(Duration::from_secs(60));
        let result =
            tokio::time::timeout(Duration::from_millis(20), mock.ask("hello")).await;
        assert!(result.is_err());
        assert_eq!(mock.call_count(), 1);
    }
}
