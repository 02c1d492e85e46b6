//! The per-call pipeline and its configuration surface.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use tokio::sync::broadcast;

use crate::cache::TtlCache;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, OperationError};
use crate::lifecycle::Shutdown;
use crate::observability::events::{emit, ClientEvent, EventSink, LogSink};
use crate::queue::{QueueStats, RequestQueue};
use crate::rate_limit::RateLimiter;
use crate::retry::{RetryBudget, RetryExecutor, RetryOutcome, RetryPolicy};

/// Minimum retries per budget window once a budget is configured, so
/// low-traffic clients are not starved of their first retries.
const BUDGET_MIN_RETRIES: u64 = 100;

/// Per-call overrides.
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Whether a successful response may be served from and written to
    /// the cache. Only idempotent reads should set this.
    pub cacheable: bool,

    /// TTL override for the cached response; the configured default
    /// applies when unset.
    pub ttl: Option<Duration>,

    /// Cache key override; defaults to the endpoint key.
    pub cache_key: Option<String>,

    /// Invalidation tags attached to the cached response.
    pub cache_tags: Vec<String>,

    /// Queue priority; higher dispatches first.
    pub priority: i32,

    /// Deadline for each individual attempt.
    pub attempt_timeout: Option<Duration>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            cacheable: false,
            ttl: None,
            cache_key: None,
            cache_tags: Vec::new(),
            priority: 0,
            attempt_timeout: None,
        }
    }
}

impl CallOptions {
    /// Options for an idempotent read cached under the default TTL.
    pub fn cached() -> Self {
        Self {
            cacheable: true,
            ..Self::default()
        }
    }

    /// Options for an idempotent read cached for `ttl`.
    pub fn cached_for(ttl: Duration) -> Self {
        Self {
            cacheable: true,
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn with_cache_tags(mut self, tags: Vec<String>) -> Self {
        self.cache_tags = tags;
        self
    }
}

/// Wraps arbitrary asynchronous operations with caching, admission
/// control, bounded concurrency, and retries.
///
/// Construct one per upstream and share it; callers receive the instance
/// explicitly instead of reaching into ambient global state.
pub struct ResilientClient<T: Clone + Send + 'static> {
    cache: TtlCache<T>,
    limiter: Option<RateLimiter>,
    executor: RetryExecutor,
    queue: RequestQueue<T>,
    sink: Arc<dyn EventSink>,
    shutdown: Shutdown,
}

impl<T: Clone + Send + 'static> ResilientClient<T> {
    /// Build a client from configuration with the default logging sink.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_sink(config, Arc::new(LogSink))
    }

    /// Build a client that reports events to `sink`.
    pub fn with_sink(config: ClientConfig, sink: Arc<dyn EventSink>) -> Self {
        let cache = TtlCache::new(
            config.cache.max_entries,
            Duration::from_millis(config.cache.default_ttl_ms),
        );

        let limiter = if config.rate_limit.enabled {
            Some(RateLimiter::from_config(&config.rate_limit))
        } else {
            tracing::debug!("Rate limiting disabled by configuration");
            None
        };

        let mut executor =
            RetryExecutor::new(RetryPolicy::from_config(&config.retry)).with_sink(sink.clone());
        if config.retry.budget_ratio > 0.0 {
            executor = executor.with_budget(Arc::new(RetryBudget::new(
                config.retry.budget_ratio,
                BUDGET_MIN_RETRIES,
            )));
        }

        let queue = RequestQueue::new(config.queue.max_size, config.queue.concurrency_limit);

        tracing::info!(
            cache_entries = config.cache.max_entries,
            rate_limiting = config.rate_limit.enabled,
            max_attempts = config.retry.max_attempts,
            concurrency = config.queue.concurrency_limit,
            "Resilient client initialized"
        );

        Self {
            cache,
            limiter,
            executor,
            queue,
            sink,
            shutdown: Shutdown::new(),
        }
    }

    /// Replace the retryability classifier.
    pub fn with_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&OperationError) -> bool + Send + Sync + 'static,
    {
        self.executor = self.executor.with_classifier(classifier);
        self
    }

    /// The response cache, for explicit invalidation.
    pub fn cache(&self) -> &TtlCache<T> {
        &self.cache
    }

    /// The request queue, for stats and cancellation of queued work.
    pub fn queue(&self) -> &RequestQueue<T> {
        &self.queue
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Append-only log of retry-wrapped executions.
    pub fn retry_outcomes(&self) -> Vec<RetryOutcome> {
        self.executor.outcomes()
    }

    /// Stop admitting calls. Queued and running work drains normally.
    pub fn shutdown(&self) {
        tracing::info!("Client shutting down");
        self.shutdown.trigger();
        self.queue.close();
    }

    /// Subscribe to the shutdown signal.
    pub fn shutdown_signal(&self) -> broadcast::Receiver<()> {
        self.shutdown.subscribe()
    }

    /// Run `operation` through the pipeline.
    ///
    /// `endpoint` selects rate limits and the default cache key; `caller`
    /// scopes rate-limit accounting. The operation is a factory so each
    /// retry attempt gets a fresh future.
    pub async fn call<F, Fut>(
        &self,
        endpoint: &str,
        caller: &str,
        operation: F,
        options: CallOptions,
    ) -> ClientResult<T>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, OperationError>> + Send + 'static,
    {
        if self.shutdown.is_triggered() {
            return Err(ClientError::Shutdown);
        }

        let cache_key = options
            .cache_key
            .clone()
            .unwrap_or_else(|| endpoint.to_string());

        if options.cacheable {
            if let Some(value) = self.cache.get(&cache_key) {
                tracing::debug!(key = %cache_key, "Cache hit");
                emit(
                    self.sink.as_ref(),
                    &ClientEvent::CacheHit {
                        key: cache_key.clone(),
                    },
                );
                return Ok(value);
            }
            emit(
                self.sink.as_ref(),
                &ClientEvent::CacheMiss {
                    key: cache_key.clone(),
                },
            );
        }

        if let Some(limiter) = &self.limiter {
            let decision = limiter.check_and_consume(caller, endpoint);
            if !decision.allowed {
                tracing::warn!(caller = %caller, endpoint = %endpoint, "Rate limit exceeded");
                emit(
                    self.sink.as_ref(),
                    &ClientEvent::RateLimited {
                        endpoint: endpoint.to_string(),
                        caller: caller.to_string(),
                        reset_in: decision.reset_at.saturating_duration_since(Instant::now()),
                    },
                );
                return Err(ClientError::RateLimitExceeded {
                    reset_at: decision.reset_at,
                });
            }
        }

        let executor = self.executor.clone();
        let attempt_timeout = options.attempt_timeout;
        let mut operation = operation;
        let task = async move {
            executor
                .execute_with_retry(move || {
                    let fut = operation();
                    async move {
                        match attempt_timeout {
                            Some(deadline) => match tokio::time::timeout(deadline, fut).await {
                                Ok(result) => result,
                                Err(_) => Err(OperationError::Timeout(deadline)),
                            },
                            None => fut.await,
                        }
                    }
                })
                .await
        }
        .boxed();

        let handle = match self.queue.enqueue(task, options.priority) {
            Ok(handle) => handle,
            Err(error) => {
                if let ClientError::QueueFull { capacity } = &error {
                    emit(
                        self.sink.as_ref(),
                        &ClientEvent::QueueRejected {
                            capacity: *capacity,
                        },
                    );
                }
                return Err(error);
            }
        };
        emit(
            self.sink.as_ref(),
            &ClientEvent::QueueAdmitted {
                id: handle.id(),
                depth: self.queue.stats().queued,
            },
        );

        let result = handle.wait().await;

        if let Ok(value) = &result {
            if options.cacheable {
                let ttl = options.ttl.unwrap_or_else(|| self.cache.default_ttl());
                self.cache.set(
                    cache_key.clone(),
                    value.clone(),
                    ttl,
                    options.cache_tags.clone(),
                );
                emit(
                    self.sink.as_ref(),
                    &ClientEvent::CacheStore {
                        key: cache_key,
                        ttl,
                    },
                );
            }
        }

        result
    }
}
