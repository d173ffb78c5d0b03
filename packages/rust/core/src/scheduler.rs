//! Bounded-concurrency batch executor with an inter-batch cooldown.
//!
//! Items are split into sequential batches of `concurrency`. Every member of
//! a batch is spawned as its own task and the batch is awaited until all of
//! them settle; a panic, timeout, or error in one member never affects its
//! siblings. The next batch starts only after the cooldown.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::pipeline::ProgressReporter;

/// How one scheduled item settled.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<R> {
    /// The task ran to completion.
    Settled(R),
    /// The task panicked or was aborted.
    Failed(String),
    /// The task exceeded the per-item timeout.
    TimedOut,
    /// The task was never dispatched because the run was cancelled.
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct BatchScheduler {
    concurrency: usize,
    delay: Duration,
    item_timeout: Option<Duration>,
}

impl BatchScheduler {
    /// A zero concurrency is treated as 1.
    pub fn new(concurrency: usize, delay: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            delay,
            item_timeout: None,
        }
    }

    pub fn with_item_timeout(mut self, timeout: Duration) -> Self {
        self.item_timeout = Some(timeout);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn item_timeout(&self) -> Option<Duration> {
        self.item_timeout
    }

    /// Run `task` over every item; one outcome per item, in submission order.
    pub async fn run<T, R, F, Fut>(
        &self,
        items: Vec<T>,
        cancel: &CancellationToken,
        progress: &dyn ProgressReporter,
        task: F,
    ) -> Vec<TaskOutcome<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut,
        Fut: Future<Output = R> + Send + 'static,
    {
        let total = items.len();
        let batches = total.div_ceil(self.concurrency);
        let mut outcomes: Vec<TaskOutcome<R>> = Vec::with_capacity(total);
        let mut pending = items.into_iter();
        let mut batch_no = 0;

        info!(
            items = total,
            batches,
            concurrency = self.concurrency,
            delay_ms = self.delay.as_millis() as u64,
            "starting batch run"
        );

        loop {
            let batch: Vec<T> = pending.by_ref().take(self.concurrency).collect();
            if batch.is_empty() {
                break;
            }
            batch_no += 1;

            if cancel.is_cancelled() {
                let skipped = batch.len() + pending.len();
                warn!(batch = batch_no, skipped, "run cancelled, remaining items not dispatched");
                outcomes.extend((0..skipped).map(|_| TaskOutcome::Cancelled));
                break;
            }

            progress.batch_started(batch_no, batches, batch.len());
            debug!(batch = batch_no, size = batch.len(), "dispatching batch");

            let handles: Vec<_> = batch
                .into_iter()
                .map(|item| {
                    let fut = task(item);
                    let timeout = self.item_timeout;
                    tokio::spawn(async move {
                        match timeout {
                            Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
                            None => Some(fut.await),
                        }
                    })
                })
                .collect();

            // Collect results
            for handle in handles {
                let outcome = match handle.await {
                    Ok(Some(result)) => TaskOutcome::Settled(result),
                    Ok(None) => TaskOutcome::TimedOut,
                    Err(e) => {
                        warn!(batch = batch_no, error = %e, "task failed");
                        TaskOutcome::Failed(e.to_string())
                    }
                };
                outcomes.push(outcome);
                progress.item_settled(outcomes.len(), total);
            }

            if pending.len() > 0 && !self.delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use crate::pipeline::SilentProgress;

    /// Tracks how many tasks are running at once.
    #[derive(Default)]
    struct InFlight {
        current: AtomicUsize,
        max: AtomicUsize,
    }

    impl InFlight {
        fn enter(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max.fetch_max(now, Ordering::SeqCst);
        }

        fn leave(&self) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn never_exceeds_concurrency() {
        let scheduler = BatchScheduler::new(3, Duration::ZERO);
        let gauge = Arc::new(InFlight::default());

        let outcomes = scheduler
            .run(
                (0..10).collect(),
                &CancellationToken::new(),
                &SilentProgress,
                |i: usize| {
                    let gauge = gauge.clone();
                    async move {
                        gauge.enter();
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        gauge.leave();
                        i * 2
                    }
                },
            )
            .await;

        assert_eq!(gauge.max.load(Ordering::SeqCst), 3);
        let values: Vec<usize> = outcomes
            .into_iter()
            .map(|o| match o {
                TaskOutcome::Settled(v) => v,
                other => panic!("unexpected outcome {other:?}"),
            })
            .collect();
        assert_eq!(values, (0..10).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn sequential_when_concurrency_is_one() {
        let scheduler = BatchScheduler::new(1, Duration::ZERO);
        let gauge = Arc::new(InFlight::default());

        let outcomes = scheduler
            .run((0..4).collect(), &CancellationToken::new(), &SilentProgress, |i: u32| {
                let gauge = gauge.clone();
                async move {
                    gauge.enter();
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    gauge.leave();
                    i
                }
            })
            .await;

        assert_eq!(gauge.max.load(Ordering::SeqCst), 1);
        assert_eq!(outcomes.len(), 4);
    }

    #[tokio::test]
    async fn failure_does_not_block_siblings() {
        let scheduler = BatchScheduler::new(3, Duration::ZERO)
            .with_item_timeout(Duration::from_millis(100));

        let outcomes = scheduler
            .run(
                vec![0u8, 1, 2, 3],
                &CancellationToken::new(),
                &SilentProgress,
                |i| async move {
                    match i {
                        1 => panic!("boom"),
                        2 => {
                            tokio::time::sleep(Duration::from_secs(5)).await;
                            i
                        }
                        _ => i,
                    }
                },
            )
            .await;

        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[0], TaskOutcome::Settled(0));
        assert!(matches!(outcomes[1], TaskOutcome::Failed(_)));
        assert_eq!(outcomes[2], TaskOutcome::TimedOut);
        assert_eq!(outcomes[3], TaskOutcome::Settled(3));
    }

    #[tokio::test]
    async fn delay_only_between_batches() {
        let scheduler = BatchScheduler::new(2, Duration::from_millis(60));
        let start = Instant::now();

        let outcomes = scheduler
            .run(vec![1, 2, 3], &CancellationToken::new(), &SilentProgress, |i: i32| async move { i })
            .await;

        let elapsed = start.elapsed();
        assert_eq!(outcomes.len(), 3);
        // Two batches, one cooldown.
        assert!(elapsed >= Duration::from_millis(60));
        assert!(elapsed < Duration::from_millis(600));
    }

    #[tokio::test]
    async fn cancellation_settles_remaining_items() {
        let scheduler = BatchScheduler::new(2, Duration::from_secs(10));
        let cancel = CancellationToken::new();
        let ran = Arc::new(AtomicUsize::new(0));

        let trigger = cancel.clone();
        let outcomes = scheduler
            .run((0..5).collect(), &cancel, &SilentProgress, |i: usize| {
                let ran = ran.clone();
                let trigger = trigger.clone();
                async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                    trigger.cancel();
                    i
                }
            })
            .await;

        assert_eq!(ran.load(Ordering::SeqCst), 2);
        assert_eq!(outcomes.len(), 5);
        assert_eq!(outcomes[1], TaskOutcome::Settled(1));
        assert!(outcomes[2..].iter().all(|o| *o == TaskOutcome::Cancelled));
    }

    #[tokio::test]
    async fn empty_input() {
        let scheduler = BatchScheduler::new(2, Duration::from_secs(10));
        let outcomes = scheduler
            .run(Vec::<u8>::new(), &CancellationToken::new(), &SilentProgress, |i| async move { i })
            .await;
        assert!(outcomes.is_empty());
    }
}
