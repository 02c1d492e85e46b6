//! Priority dispatch with a bounded concurrency pool.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures_util::future::BoxFuture;
use tokio::sync::{oneshot, Semaphore};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::observability::metrics;

/// A task waiting for a concurrency slot.
struct Pending<T> {
    id: Uuid,
    priority: i32,
    enqueued_at: Instant,
    task: BoxFuture<'static, ClientResult<T>>,
    tx: oneshot::Sender<ClientResult<T>>,
}

struct QueueState<T> {
    queued: VecDeque<Pending<T>>,
    running: usize,
    completed: u64,
    failed: u64,
    average_wait_ms: f64,
    closed: bool,
}

struct QueueInner<T> {
    state: Mutex<QueueState<T>>,
    slots: Arc<Semaphore>,
    max_size: usize,
}

/// Completion handle for an enqueued task.
///
/// Resolves when the task reaches a terminal state. If the task is
/// cancelled while queued, the handle resolves to [`ClientError::Cancelled`].
pub struct QueueHandle<T> {
    id: Uuid,
    rx: oneshot::Receiver<ClientResult<T>>,
}

impl<T> QueueHandle<T> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the task's outcome.
    pub async fn wait(self) -> ClientResult<T> {
        self.rx.await.unwrap_or(Err(ClientError::Cancelled))
    }
}

/// Snapshot of queue counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueStats {
    pub queued: usize,
    pub running: usize,
    pub completed: u64,
    pub failed: u64,
    /// Mean time tasks spent queued before starting, in milliseconds.
    pub average_wait_ms: f64,
}

/// Bounded FIFO-with-priority dispatcher.
///
/// Cloning is cheap; clones share the same queue.
pub struct RequestQueue<T: Send + 'static> {
    inner: Arc<QueueInner<T>>,
}

impl<T: Send + 'static> Clone for RequestQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> RequestQueue<T> {
    pub fn new(max_size: usize, concurrency_limit: usize) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState {
                    queued: VecDeque::new(),
                    running: 0,
                    completed: 0,
                    failed: 0,
                    average_wait_ms: 0.0,
                    closed: false,
                }),
                slots: Arc::new(Semaphore::new(concurrency_limit)),
                max_size,
            }),
        }
    }

    /// Admit a task, or reject immediately when the queue is full or the
    /// queue has been closed for shutdown.
    ///
    /// Higher `priority` values dispatch first; ties dispatch in enqueue
    /// order.
    pub fn enqueue(
        &self,
        task: BoxFuture<'static, ClientResult<T>>,
        priority: i32,
    ) -> ClientResult<QueueHandle<T>> {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();

        {
            let mut state = self.inner.state.lock().expect("queue mutex poisoned");
            if state.closed {
                return Err(ClientError::Shutdown);
            }
            if state.queued.len() >= self.inner.max_size {
                metrics::record_queue_rejected();
                return Err(ClientError::QueueFull {
                    capacity: self.inner.max_size,
                });
            }

            let pending = Pending {
                id,
                priority,
                enqueued_at: Instant::now(),
                task,
                tx,
            };
            let position = state
                .queued
                .iter()
                .position(|existing| existing.priority < priority)
                .unwrap_or(state.queued.len());
            state.queued.insert(position, pending);
            metrics::record_queue_depth(state.queued.len());
        }

        Self::dispatch(&self.inner);
        Ok(QueueHandle { id, rx })
    }

    /// Cancel a task that has not started running. Returns `true` if the
    /// task was found and removed; its handle resolves to `Cancelled`.
    pub fn cancel(&self, id: Uuid) -> bool {
        let removed = {
            let mut state = self.inner.state.lock().expect("queue mutex poisoned");
            match state.queued.iter().position(|p| p.id == id) {
                Some(index) => {
                    let pending = state.queued.remove(index).expect("index in bounds");
                    metrics::record_queue_depth(state.queued.len());
                    Some(pending)
                }
                None => None,
            }
        };

        match removed {
            Some(pending) => {
                tracing::debug!(id = %id, "Cancelled queued task");
                let _ = pending.tx.send(Err(ClientError::Cancelled));
                true
            }
            None => false,
        }
    }

    /// Stop admitting new tasks. Queued and running tasks drain normally.
    pub fn close(&self) {
        let mut state = self.inner.state.lock().expect("queue mutex poisoned");
        state.closed = true;
    }

    pub fn stats(&self) -> QueueStats {
        let state = self.inner.state.lock().expect("queue mutex poisoned");
        QueueStats {
            queued: state.queued.len(),
            running: state.running,
            completed: state.completed,
            failed: state.failed,
            average_wait_ms: state.average_wait_ms,
        }
    }

    /// Spawn queued tasks while concurrency slots are free.
    fn dispatch(inner: &Arc<QueueInner<T>>) {
        loop {
            let permit = match inner.slots.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => return,
            };

            let pending = {
                let mut state = inner.state.lock().expect("queue mutex poisoned");
                match state.queued.pop_front() {
                    Some(pending) => {
                        state.running += 1;
                        metrics::record_queue_depth(state.queued.len());
                        pending
                    }
                    // Permit drops here, freeing the slot
                    None => return,
                }
            };

            let wait = pending.enqueued_at.elapsed();
            let inner = inner.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let result = pending.task.await;

                {
                    let mut state = inner.state.lock().expect("queue mutex poisoned");
                    state.running -= 1;
                    let failed = result.is_err();
                    if failed {
                        state.failed += 1;
                    } else {
                        state.completed += 1;
                    }
                    metrics::record_task_finished(failed);

                    // Incremental running mean over finished tasks
                    let finished = (state.completed + state.failed) as f64;
                    let wait_ms = wait.as_secs_f64() * 1000.0;
                    state.average_wait_ms += (wait_ms - state.average_wait_ms) / finished;
                }

                let _ = pending.tx.send(result);
                drop(_permit);
                Self::dispatch(&inner);
            });
        }
    }
}
