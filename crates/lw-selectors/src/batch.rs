//! Debounced Batching
//!
//! Collects changed nodes and hands them out in batches.
//!
//! # Architecture
//!
//! ```text
//! push(items) ──► command channel ──► batcher task ──► batch channel ──► next_batch()
//!                                        │
//!                                        ├─ pending > max_pending → flush now
//!                                        ├─ quiet for `wait`      → flush
//!                                        └─ `max_wait` since first → flush
//! ```
//!
//! The timing rules live in [`Debouncer`], which is plain state and can be
//! driven without a runtime. [`Batcher`] wraps it in a tokio task.

use std::collections::HashSet;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::error::BatchClosed;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Quiet period after the last push.
    pub wait: Duration,
    /// Upper bound on how long the first pending item waits.
    pub max_wait: Duration,
    /// Flush immediately once more than this many items are pending.
    pub max_pending: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            wait: Duration::from_millis(25),
            max_wait: Duration::from_millis(1000),
            max_pending: 512,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// More than `max_pending` items were queued.
    Threshold,
    /// No push for `wait`.
    Wait,
    /// `max_wait` elapsed under continuous pushes.
    MaxWait,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    /// Distinct items in first-pushed order.
    pub items: Vec<T>,
    pub reason: FlushReason,
}

// =============================================================================
// Debouncer
// =============================================================================

/// Trailing-edge debounce with a maximum wait.
#[derive(Debug, Clone)]
pub struct Debouncer {
    wait: Duration,
    max_wait: Duration,
    first: Option<Instant>,
    last: Option<Instant>,
}

impl Debouncer {
    pub fn new(config: &BatchConfig) -> Self {
        Self {
            wait: config.wait,
            max_wait: config.max_wait,
            first: None,
            last: None,
        }
    }

    /// Record activity at `now`.
    pub fn touch(&mut self, now: Instant) {
        self.first.get_or_insert(now);
        self.last = Some(now);
    }

    /// When the next flush is due, if anything is armed.
    pub fn deadline(&self) -> Option<(Instant, FlushReason)> {
        let (first, last) = (self.first?, self.last?);
        let quiet = last + self.wait;
        let capped = first + self.max_wait;
        Some(if quiet <= capped {
            (quiet, FlushReason::Wait)
        } else {
            (capped, FlushReason::MaxWait)
        })
    }

    pub fn reset(&mut self) {
        self.first = None;
        self.last = None;
    }
}

// =============================================================================
// Batcher
// =============================================================================

enum Command<T> {
    Push(Vec<T>),
    Stop,
}

/// Insertion-ordered set of pending items.
struct Pending<T> {
    items: Vec<T>,
    seen: HashSet<T>,
}

impl<T: Eq + Hash + Clone> Pending<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn extend(&mut self, items: Vec<T>) {
        for item in items {
            if self.seen.insert(item.clone()) {
                self.items.push(item);
            }
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn take(&mut self) -> Vec<T> {
        self.seen.clear();
        std::mem::take(&mut self.items)
    }
}

/// Handle to a spawned batcher task. Must be created inside a tokio runtime.
pub struct Batcher<T> {
    commands: Option<mpsc::UnboundedSender<Command<T>>>,
    batches: mpsc::UnboundedReceiver<Batch<T>>,
    task: JoinHandle<()>,
}

impl<T> Batcher<T>
where
    T: Eq + Hash + Clone + Send + 'static,
{
    pub fn spawn(config: BatchConfig) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(config, command_rx, batch_tx));
        Self {
            commands: Some(command_tx),
            batches: batch_rx,
            task,
        }
    }

    /// Queue items. Duplicates of already pending items are dropped.
    pub fn push(&self, items: Vec<T>) -> Result<(), BatchClosed> {
        let commands = self.commands.as_ref().ok_or(BatchClosed)?;
        commands.send(Command::Push(items)).map_err(|_| BatchClosed)
    }

    /// Stop the task. Pending items are discarded; batches already flushed
    /// can still be read.
    pub fn stop(&mut self) {
        if let Some(commands) = self.commands.take() {
            let _ = commands.send(Command::Stop);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.commands.is_none() || self.task.is_finished()
    }

    /// Next flushed batch; `None` once the task has ended and every batch
    /// was read.
    pub async fn next_batch(&mut self) -> Option<Batch<T>> {
        self.batches.recv().await
    }
}

impl<T> Drop for Batcher<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T>(
    config: BatchConfig,
    mut commands: mpsc::UnboundedReceiver<Command<T>>,
    batches: mpsc::UnboundedSender<Batch<T>>,
) where
    T: Eq + Hash + Clone,
{
    let mut pending = Pending::new();
    let mut debouncer = Debouncer::new(&config);

    loop {
        let deadline = debouncer.deadline();
        let reason = tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Push(items)) => {
                    if items.is_empty() {
                        continue;
                    }
                    pending.extend(items);
                    if pending.len() <= config.max_pending {
                        debouncer.touch(Instant::now());
                        continue;
                    }
                    FlushReason::Threshold
                }
                Some(Command::Stop) | None => break,
            },
            reason = expire(deadline) => reason,
        };

        debouncer.reset();
        let items = pending.take();
        log::trace!("flushing {} items ({:?})", items.len(), reason);
        if batches.send(Batch { items, reason }).is_err() {
            break;
        }
    }
    log::trace!("batcher stopped with {} items pending", pending.len());
}

async fn expire(deadline: Option<(Instant, FlushReason)>) -> FlushReason {
    match deadline {
        Some((at, reason)) => {
            sleep_until(at).await;
            reason
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debouncer_deadlines() {
        let config = BatchConfig::default();
        let mut debouncer = Debouncer::new(&config);
        assert_eq!(debouncer.deadline(), None);

        let start = Instant::now();
        debouncer.touch(start);
        assert_eq!(debouncer.deadline(), Some((start + config.wait, FlushReason::Wait)));

        let late = start + Duration::from_millis(990);
        debouncer.touch(late);
        assert_eq!(debouncer.deadline(), Some((start + config.max_wait, FlushReason::MaxWait)));

        debouncer.reset();
        assert_eq!(debouncer.deadline(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn flushes_past_threshold_immediately() {
        let mut batcher = Batcher::spawn(BatchConfig::default());
        let start = Instant::now();
        batcher.push((0..600).collect()).expect("push");

        let batch = batcher.next_batch().await.expect("batch");
        assert_eq!(batch.reason, FlushReason::Threshold);
        assert_eq!(batch.items.len(), 600);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn flushes_after_quiet_period() {
        let mut batcher = Batcher::spawn(BatchConfig::default());
        let start = Instant::now();
        batcher.push(vec![1, 2, 2, 3]).expect("push");
        batcher.push(vec![1]).expect("push");

        let batch = batcher.next_batch().await.expect("batch");
        assert_eq!(batch, Batch { items: vec![1, 2, 3], reason: FlushReason::Wait });
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(25) && elapsed < Duration::from_millis(30), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn max_wait_fires_under_continuous_input() {
        let mut batcher = Batcher::spawn(BatchConfig::default());
        let start = Instant::now();

        let mut ticker = tokio::time::interval(Duration::from_millis(20));
        let mut next = 0u32;
        let batch = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    batcher.push(vec![next]).expect("push");
                    next += 1;
                }
                batch = batcher.next_batch() => break batch.expect("batch"),
            }
        };

        assert_eq!(batch.reason, FlushReason::MaxWait);
        assert!(batch.items.len() >= 50, "{}", batch.items.len());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1000) && elapsed < Duration::from_millis(1025), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn stop_closes_the_batcher() {
        let mut batcher = Batcher::spawn(BatchConfig::default());
        batcher.push(vec![1]).expect("push");
        batcher.stop();

        assert_eq!(batcher.push(vec![2]), Err(BatchClosed));
        assert_eq!(batcher.next_batch().await, None);
        assert!(batcher.is_stopped());
    }
}
