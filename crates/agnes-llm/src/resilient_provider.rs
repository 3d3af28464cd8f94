//! Fail-fast wrapper for a flaky provider
//!
//! A practice session only lasts a handful of turns. If the provider keeps
//! timing out, each of those turns would sit through the full reply deadline
//! before the scripted line shows up. After [`Backoff::trip_after`] transient
//! failures in a row the wrapper refuses calls for [`Backoff::cooldown`], so
//! the engine falls back at once. The first call after the cooldown goes
//! through; one more failure pauses again.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::{LlmError, LlmProvider, LlmRequest, LlmResponse};

/// When to stop calling the provider, and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Consecutive transient failures that pause the provider
    pub trip_after: u32,
    /// How long calls are refused once paused
    pub cooldown: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            trip_after: 2,
            cooldown: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Default)]
struct Health {
    consecutive_failures: u32,
    paused_until: Option<Instant>,
}

/// Provider wrapper that stops calling a provider that keeps failing
#[derive(Debug)]
pub struct ResilientProvider<P: LlmProvider> {
    inner: P,
    backoff: Backoff,
    health: Mutex<Health>,
    refused: AtomicU64,
}

impl<P: LlmProvider> ResilientProvider<P> {
    pub fn new(provider: P, backoff: Backoff) -> Self {
        Self {
            inner: provider,
            backoff,
            health: Mutex::new(Health::default()),
            refused: AtomicU64::new(0),
        }
    }

    /// Wrap with the default backoff
    pub fn wrap(provider: P) -> Self {
        Self::new(provider, Backoff::default())
    }

    /// The wrapped provider
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Whether calls are currently being refused
    pub fn is_paused(&self) -> bool {
        self.health()
            .paused_until
            .is_some_and(|until| Instant::now() < until)
    }

    /// Transient failures since the last success
    pub fn consecutive_failures(&self) -> u32 {
        self.health().consecutive_failures
    }

    /// Calls refused without reaching the provider
    pub fn refused_calls(&self) -> u64 {
        self.refused.load(Ordering::Relaxed)
    }

    fn health(&self) -> MutexGuard<'_, Health> {
        self.health.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn admit(&self) -> Result<(), LlmError> {
        let mut health = self.health();
        match health.paused_until {
            Some(until) if Instant::now() < until => {
                self.refused.fetch_add(1, Ordering::Relaxed);
                Err(LlmError::NotAvailable)
            }
            Some(_) => {
                health.paused_until = None;
                // One more failure pauses again straight away
                health.consecutive_failures = self.backoff.trip_after.saturating_sub(1);
                tracing::info!(provider = %self.inner.name(), "Cooldown over, trying provider again");
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn observe(&self, outcome: &Result<LlmResponse, LlmError>) {
        let mut health = self.health();
        match outcome {
            Ok(_) => health.consecutive_failures = 0,
            // A bad payload says nothing about whether the provider is up
            Err(e) if !e.is_transient() => {}
            Err(e) => {
                health.consecutive_failures += 1;
                if health.consecutive_failures >= self.backoff.trip_after {
                    health.paused_until = Some(Instant::now() + self.backoff.cooldown);
                    tracing::warn!(
                        provider = %self.inner.name(),
                        failures = health.consecutive_failures,
                        cooldown_s = self.backoff.cooldown.as_secs(),
                        error = %e,
                        "Provider paused"
                    );
                }
            }
        }
    }
}

#[async_trait]
impl<P: LlmProvider + 'static> LlmProvider for ResilientProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn is_available(&self) -> bool {
        !self.is_paused() && self.inner.is_available().await
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.admit()?;
        let outcome = self.inner.complete(request).await;
        self.observe(&outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;

    #[tokio::test]
    async fn test_passes_through() {
        let provider = ResilientProvider::wrap(MockProvider::constant("ok"));

        assert_eq!(provider.ask("test").await.unwrap(), "ok");
        assert!(!provider.is_paused());
        assert_eq!(provider.name(), "mock");
    }

    #[tokio::test]
    async fn test_pauses_after_repeated_failures() {
        let provider = ResilientProvider::wrap(MockProvider::failing());

        assert!(provider.ask("1").await.is_err());
        assert!(!provider.is_paused());
        assert!(provider.ask("2").await.is_err());
        assert!(provider.is_paused());

        // Refused without reaching the mock
        assert!(matches!(
            provider.ask("3").await,
            Err(LlmError::NotAvailable)
        ));
        assert_eq!(provider.inner().call_count(), 2);
        assert_eq!(provider.refused_calls(), 1);
        assert!(!provider.is_available().await);
    }

    #[tokio::test]
    async fn test_bad_payloads_do_not_pause() {
        // No canned responses: every call is an invalid response
        let provider = ResilientProvider::wrap(MockProvider::new(Vec::new()));

        for _ in 0..4 {
            assert!(matches!(
                provider.ask("x").await,
                Err(LlmError::InvalidResponse(_))
            ));
        }
        assert_eq!(provider.consecutive_failures(), 0);
        assert_eq!(provider.inner().call_count(), 4);
    }

    #[tokio::test]
    async fn test_success_resets_failures() {
        let provider = ResilientProvider::new(
            MockProvider::constant("fine"),
            Backoff {
                trip_after: 3,
                cooldown: Duration::from_secs(60),
            },
        );
        provider.observe(&Err(LlmError::Timeout(10)));
        provider.observe(&Err(LlmError::RateLimited));
        assert_eq!(provider.consecutive_failures(), 2);

        assert_eq!(provider.ask("again").await.unwrap(), "fine");
        assert_eq!(provider.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_resumes_after_cooldown() {
        let provider = ResilientProvider::new(
            MockProvider::constant("back"),
            Backoff {
                trip_after: 1,
                cooldown: Duration::from_millis(20),
            },
        );
        provider.observe(&Err(LlmError::ConnectionFailed("down".into())));
        assert!(provider.is_paused());
        assert!(provider.ask("early").await.is_err());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(provider.ask("later").await.unwrap(), "back");
        assert!(!provider.is_paused());
        assert_eq!(provider.consecutive_failures(), 0);
    }
}
