//! # Work Queue
//!
//! Carries fire-and-forget pipeline runs from the trigger to a worker.
//! Delivery is at-least-once:
//!
//! ```text
//! enqueue ──▶ [mpsc] ──▶ worker ──▶ tokio::spawn(handle)
//!                ▲                      │ panicked?
//!                └── sleep(base · 2ⁿ) ◀─┘ delivery < max_deliveries
//!                                       │ otherwise
//!                                       ▼
//!                                  on_exhausted
//! ```
//!
//! Each task carries the generation attempt it was enqueued for. Handlers
//! drop tasks whose attempt is no longer current, so a redelivered or
//! duplicated task never produces a second batch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use docket_core::CaseId;

/// One queued pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineTask {
    pub case_id: CaseId,
    /// Generation attempt the run belongs to.
    pub attempt: u64,
    /// 1 for the first delivery.
    pub delivery: u32,
}

impl PipelineTask {
    pub fn new(case_id: CaseId, attempt: u64) -> Self {
        Self {
            case_id,
            attempt,
            delivery: 1,
        }
    }

    fn redelivery(self) -> Self {
        Self {
            delivery: self.delivery + 1,
            ..self
        }
    }
}

/// Queue failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("work queue is closed")]
    Closed,
}

/// Sending half of the work queue.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    tx: mpsc::Sender<PipelineTask>,
}

impl WorkQueue {
    /// Create a queue and the receiver a [`Worker`] consumes.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<PipelineTask>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Enqueue a task, waiting for capacity.
    pub async fn enqueue(&self, task: PipelineTask) -> Result<(), QueueError> {
        self.tx.send(task).await.map_err(|_| QueueError::Closed)
    }
}

/// Processes delivered tasks.
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    /// Run one task. A panic here triggers redelivery.
    async fn handle(&self, task: PipelineTask);

    /// Called once a task has panicked on every allowed delivery.
    async fn on_exhausted(&self, task: PipelineTask);
}

/// Consumes the queue, one task at a time.
pub struct Worker<H: TaskHandler> {
    rx: mpsc::Receiver<PipelineTask>,
    requeue: mpsc::WeakSender<PipelineTask>,
    handler: Arc<H>,
    max_deliveries: u32,
    base_delay: Duration,
}

impl<H: TaskHandler> Worker<H> {
    pub fn new(
        queue: &WorkQueue,
        rx: mpsc::Receiver<PipelineTask>,
        handler: Arc<H>,
        max_deliveries: u32,
        base_delay: Duration,
    ) -> Self {
        Self {
            rx,
            requeue: queue.tx.downgrade(),
            handler,
            max_deliveries: max_deliveries.max(1),
            base_delay,
        }
    }

    /// Run until every [`WorkQueue`] handle has been dropped.
    pub async fn run(mut self) {
        while let Some(task) = self.rx.recv().await {
            self.process(task).await;
        }
        tracing::info!("work queue closed, worker stopping");
    }

    async fn process(&self, task: PipelineTask) {
        let handler = Arc::clone(&self.handler);
        let outcome = tokio::spawn(async move { handler.handle(task).await }).await;
        let Err(join_error) = outcome else {
            return;
        };

        if task.delivery < self.max_deliveries {
            let delay = self.base_delay * 2u32.saturating_pow(task.delivery - 1);
            tracing::warn!(
                case_id = %task.case_id,
                attempt = task.attempt,
                delivery = task.delivery,
                max_deliveries = self.max_deliveries,
                "pipeline task failed, redelivering in {delay:?}: {join_error}"
            );
            let Some(tx) = self.requeue.upgrade() else {
                tracing::error!(case_id = %task.case_id, "work queue closed, task dropped");
                self.handler.on_exhausted(task).await;
                return;
            };
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if tx.send(task.redelivery()).await.is_err() {
                    tracing::error!(case_id = %task.case_id, "work queue closed before redelivery");
                }
            });
        } else {
            tracing::error!(
                case_id = %task.case_id,
                attempt = task.attempt,
                deliveries = task.delivery,
                "pipeline task failed on every delivery: {join_error}"
            );
            self.handler.on_exhausted(task).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Recorder {
        panics_left: AtomicU32,
        handled: Mutex<Vec<PipelineTask>>,
        exhausted: Mutex<Vec<PipelineTask>>,
    }

    #[async_trait]
    impl TaskHandler for Recorder {
        async fn handle(&self, task: PipelineTask) {
            self.handled.lock().push(task);
            if self
                .panics_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                panic!("scripted handler panic");
            }
        }

        async fn on_exhausted(&self, task: PipelineTask) {
            self.exhausted.lock().push(task);
        }
    }

    async fn drive(panics: u32, max_deliveries: u32) -> Arc<Recorder> {
        let handler = Arc::new(Recorder {
            panics_left: AtomicU32::new(panics),
            ..Default::default()
        });
        let (queue, rx) = WorkQueue::channel(4);
        let worker = Worker::new(
            &queue,
            rx,
            Arc::clone(&handler),
            max_deliveries,
            Duration::from_millis(5),
        );
        let running = tokio::spawn(worker.run());
        queue.enqueue(PipelineTask::new(CaseId::new(), 1)).await.unwrap();

        for _ in 0..200 {
            let handled = handler.handled.lock().len() as u32;
            let done = handled > panics || !handler.exhausted.lock().is_empty();
            if done {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        drop(queue);
        let _ = tokio::time::timeout(Duration::from_secs(1), running).await;
        handler
    }

    #[tokio::test]
    async fn successful_task_is_delivered_once() {
        let h = drive(0, 3).await;
        assert_eq!(h.handled.lock().len(), 1);
        assert!(h.exhausted.lock().is_empty());
    }

    #[tokio::test]
    async fn panicking_task_is_redelivered() {
        let h = drive(2, 3).await;
        let deliveries: Vec<u32> = h.handled.lock().iter().map(|t| t.delivery).collect();
        assert_eq!(deliveries, vec![1, 2, 3]);
        assert!(h.exhausted.lock().is_empty());
    }

    #[tokio::test]
    async fn exhausted_task_is_reported() {
        let h = drive(5, 2).await;
        assert_eq!(h.handled.lock().len(), 2);
        let exhausted = h.exhausted.lock();
        assert_eq!(exhausted.len(), 1);
        assert_eq!(exhausted[0].delivery, 2);
    }

    #[tokio::test]
    async fn enqueue_fails_when_worker_is_gone() {
        let (queue, rx) = WorkQueue::channel(1);
        drop(rx);
        assert_eq!(
            queue.enqueue(PipelineTask::new(CaseId::new(), 1)).await,
            Err(QueueError::Closed)
        );
    }
}
