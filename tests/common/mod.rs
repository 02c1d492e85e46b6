//! Shared helpers for integration tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use resilient_client::OperationError;

/// Operation that always succeeds, counting its executions.
pub fn counting_operation(
    calls: Arc<AtomicU32>,
) -> impl FnMut() -> BoxFuture<'static, Result<String, OperationError>> + Send + 'static {
    move || {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("ok".to_string())
        }
        .boxed()
    }
}

/// Operation that fails `failures` times with `status`, then succeeds.
#[allow(dead_code)]
pub fn flaky_operation(
    failures: u32,
    status: u16,
    calls: Arc<AtomicU32>,
) -> impl FnMut() -> BoxFuture<'static, Result<String, OperationError>> + Send + 'static {
    move || {
        let calls = calls.clone();
        async move {
            if calls.fetch_add(1, Ordering::SeqCst) < failures {
                Err(OperationError::Status(status))
            } else {
                Ok("recovered".to_string())
            }
        }
        .boxed()
    }
}

/// Operation that always fails with `status`.
#[allow(dead_code)]
pub fn failing_operation(
    status: u16,
    calls: Arc<AtomicU32>,
) -> impl FnMut() -> BoxFuture<'static, Result<String, OperationError>> + Send + 'static {
    move || {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(OperationError::Status(status))
        }
        .boxed()
    }
}

/// Operation that sleeps for `delay` before succeeding.
#[allow(dead_code)]
pub fn slow_operation(
    delay: Duration,
    calls: Arc<AtomicU32>,
) -> impl FnMut() -> BoxFuture<'static, Result<String, OperationError>> + Send + 'static {
    move || {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            Ok("slow".to_string())
        }
        .boxed()
    }
}
