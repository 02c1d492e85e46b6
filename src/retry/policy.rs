//! Retry policy, classification, and the retrying executor.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::RetryConfig;
use crate::error::{ClientError, ClientResult, OperationError};
use crate::observability::events::{emit, ClientEvent, EventSink, LogSink};
use crate::observability::metrics;
use crate::retry::backoff::{compute_delay, BackoffStrategy};
use crate::retry::budget::RetryBudget;

/// Predicate deciding whether a failed attempt is worth repeating.
pub type RetryClassifier = Arc<dyn Fn(&OperationError) -> bool + Send + Sync>;

/// Default classification: server-side statuses and timeouts are
/// transient; everything else is terminal.
pub fn default_classifier(error: &OperationError) -> bool {
    match error {
        OperationError::Status(code) => matches!(code, 500 | 502 | 503 | 504),
        OperationError::Timeout(_) => true,
        OperationError::Network(_) => true,
        OperationError::Other(_) => false,
    }
}

/// Immutable description of how one client retries.
#[derive(Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub strategy: BackoffStrategy,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
    classifier: RetryClassifier,
}

impl RetryPolicy {
    /// Build the policy described by the configuration. Disabled retries
    /// collapse to a single attempt.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: if config.enabled { config.max_attempts } else { 1 },
            strategy: config.strategy,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter: config.jitter,
            classifier: Arc::new(default_classifier),
        }
    }

    /// Replace the retryability classifier.
    pub fn with_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&OperationError) -> bool + Send + Sync + 'static,
    {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Whether `error` should be retried under this policy.
    pub fn is_retryable(&self, error: &OperationError) -> bool {
        (self.classifier)(error)
    }

    /// Delay before the given retry attempt (1-indexed).
    pub fn compute_delay(&self, attempt: u32) -> Duration {
        compute_delay(
            self.strategy,
            attempt,
            self.base_delay,
            self.max_delay,
            self.jitter,
        )
    }
}

/// Outcome of one retry-wrapped operation, kept for observability.
#[derive(Debug, Clone, Copy)]
pub struct RetryOutcome {
    pub attempts: u32,
    pub succeeded: bool,
    pub elapsed: Duration,
}

/// Executes operations under a [`RetryPolicy`], with an optional shared
/// [`RetryBudget`]. Clones share the outcome log and budget.
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    budget: Option<Arc<RetryBudget>>,
    outcomes: Arc<Mutex<Vec<RetryOutcome>>>,
    sink: Arc<dyn EventSink>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            budget: None,
            outcomes: Arc::new(Mutex::new(Vec::new())),
            sink: Arc::new(LogSink),
        }
    }

    pub fn with_budget(mut self, budget: Arc<RetryBudget>) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&OperationError) -> bool + Send + Sync + 'static,
    {
        self.policy = self.policy.with_classifier(classifier);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Append-only log of completed executions.
    pub fn outcomes(&self) -> Vec<RetryOutcome> {
        self.outcomes
            .lock()
            .expect("retry outcome log mutex poisoned")
            .clone()
    }

    /// Run `operation`, retrying per policy until it succeeds, the error
    /// is terminal, or the attempt/budget limit is reached.
    ///
    /// The backoff sleep suspends only the calling task.
    pub async fn execute_with_retry<T, F, Fut>(&self, mut operation: F) -> ClientResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OperationError>>,
    {
        if let Some(budget) = &self.budget {
            budget.record_request();
        }

        let started = Instant::now();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => {
                    self.record_outcome(attempt, true, started.elapsed());
                    return Ok(value);
                }
                Err(error) => {
                    if !self.policy.is_retryable(&error) {
                        tracing::debug!(attempt, error = %error, "Terminal failure, not retrying");
                        self.record_outcome(attempt, false, started.elapsed());
                        return Err(ClientError::NonRetryable { source: error });
                    }

                    if attempt >= max_attempts {
                        self.record_outcome(attempt, false, started.elapsed());
                        return Err(ClientError::RetryExhausted {
                            attempts: attempt,
                            source: error,
                        });
                    }

                    if let Some(budget) = &self.budget {
                        if !budget.try_spend() {
                            tracing::warn!(attempt, "Retry budget exhausted");
                            metrics::record_retry_budget_exhausted();
                            self.record_outcome(attempt, false, started.elapsed());
                            return Err(ClientError::RetryExhausted {
                                attempts: attempt,
                                source: error,
                            });
                        }
                    }

                    let delay = self.policy.compute_delay(attempt);
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying after backoff"
                    );
                    metrics::record_retry();
                    emit(
                        self.sink.as_ref(),
                        &ClientEvent::RetryScheduled { attempt, delay },
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn record_outcome(&self, attempts: u32, succeeded: bool, elapsed: Duration) {
        self.outcomes
            .lock()
            .expect("retry outcome log mutex poisoned")
            .push(RetryOutcome {
                attempts,
                succeeded,
                elapsed,
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::from_config(&RetryConfig {
            enabled: true,
            max_attempts,
            strategy: BackoffStrategy::Fixed,
            base_delay_ms: 1,
            max_delay_ms: 10,
            jitter: false,
            budget_ratio: 0.0,
        })
    }

    #[test]
    fn test_default_classifier() {
        assert!(default_classifier(&OperationError::Status(500)));
        assert!(default_classifier(&OperationError::Status(503)));
        assert!(default_classifier(&OperationError::Timeout(
            Duration::from_secs(1)
        )));
        assert!(!default_classifier(&OperationError::Status(404)));
        assert!(!default_classifier(&OperationError::Other("bad input".into())));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let executor = RetryExecutor::new(policy(3));
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();

        let result = executor
            .execute_with_retry(move || {
                let calls = calls2.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(OperationError::Status(503))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let outcomes = executor.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].attempts, 3);
        assert!(outcomes[0].succeeded);
    }

    #[tokio::test]
    async fn test_exhaustion_preserves_last_error() {
        let executor = RetryExecutor::new(policy(2));

        let result: ClientResult<()> = executor
            .execute_with_retry(|| async { Err(OperationError::Status(502)) })
            .await;

        match result {
            Err(ClientError::RetryExhausted { attempts, source }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(source, OperationError::Status(502)));
            }
            other => panic!("expected RetryExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_terminal_error_fails_fast() {
        let executor = RetryExecutor::new(policy(5));
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();

        let result: ClientResult<()> = executor
            .execute_with_retry(move || {
                let calls = calls2.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(OperationError::Status(404))
                }
            })
            .await;

        assert!(matches!(result, Err(ClientError::NonRetryable { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_budget_stops_retries() {
        let executor = RetryExecutor::new(policy(5))
            .with_budget(Arc::new(RetryBudget::new(0.0, 0)));
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();

        let result: ClientResult<()> = executor
            .execute_with_retry(move || {
                let calls = calls2.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(OperationError::Status(503))
                }
            })
            .await;

        assert!(matches!(
            result,
            Err(ClientError::RetryExhausted { attempts: 1, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_classifier() {
        let executor = RetryExecutor::new(policy(3))
            .with_classifier(|error| matches!(error, OperationError::Status(418)));
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();

        let result: ClientResult<()> = executor
            .execute_with_retry(move || {
                let calls = calls2.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(OperationError::Status(418))
                }
            })
            .await;

        assert!(matches!(result, Err(ClientError::RetryExhausted { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
