//! Fixed-partition worker pools
//!
//! Each phase (capture, asset download, verification) splits its work list
//! round-robin into disjoint chunks up front and runs one tokio task per
//! chunk. Tasks stream finished records back over an unbounded channel; the
//! merged ledger is sorted by URL once every task has joined. There is no
//! shared queue and no work stealing.

use futures::future::join_all;
use std::collections::HashSet;
use std::future::Future;
use tokio::sync::mpsc::{self, UnboundedSender};

/// A ledger entry keyed by the URL it describes
pub trait Ledgered {
    fn ledger_key(&self) -> &str;
}

/// Splits `items` round-robin into exactly `max(workers, 1)` chunks
///
/// Chunk `i` holds items `i, i + n, i + 2n, ...`, so chunk sizes differ by at
/// most one and later chunks may be empty.
///
/// # Examples
///
/// ```
/// use site_snapshot::crawler::partition;
///
/// let chunks = partition(&[1, 2, 3, 4, 5], 2);
/// assert_eq!(chunks, vec![vec![1, 3, 5], vec![2, 4]]);
/// ```
pub fn partition<T: Clone>(items: &[T], workers: usize) -> Vec<Vec<T>> {
    let workers = workers.max(1);
    let mut chunks: Vec<Vec<T>> = (0..workers).map(|_| Vec::new()).collect();
    for (index, item) in items.iter().enumerate() {
        chunks[index % workers].push(item.clone());
    }
    chunks
}

/// Runs `work` once per non-empty chunk and merges the records
///
/// `work` receives the 1-based worker id, its chunk and a sender for
/// finished records. When a worker returns an error or panics, every item of
/// its chunk that produced no record gets one from `on_failure`, so each
/// item appears in the merged ledger exactly once. A failing worker never
/// cancels the others.
pub async fn run_pool<T, R, F, Fut, E>(
    phase: &str,
    items: &[T],
    workers: usize,
    work: F,
    on_failure: E,
) -> Vec<R>
where
    T: AsRef<str> + Clone + Send + 'static,
    R: Ledgered + Send + 'static,
    F: Fn(usize, Vec<T>, UnboundedSender<R>) -> Fut,
    Fut: Future<Output = Result<(), String>> + Send + 'static,
    E: Fn(usize, &T, &str) -> R,
{
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut assigned = Vec::new();
    let mut handles = Vec::new();
    for (index, chunk) in partition(items, workers).into_iter().enumerate() {
        if chunk.is_empty() {
            continue;
        }
        let worker_id = index + 1;
        tracing::debug!("[{}] worker={} assigned {} items", phase, worker_id, chunk.len());
        handles.push(tokio::spawn(work(worker_id, chunk.clone(), tx.clone())));
        assigned.push((worker_id, chunk));
    }
    drop(tx);

    let results = join_all(handles).await;

    let mut records = Vec::with_capacity(items.len());
    while let Some(record) = rx.recv().await {
        records.push(record);
    }

    let mut failed = Vec::new();
    for ((worker_id, chunk), result) in assigned.into_iter().zip(results) {
        let failure = match result {
            Ok(Ok(())) => continue,
            Ok(Err(message)) => message,
            Err(join_error) if join_error.is_panic() => "worker task panicked".to_string(),
            Err(join_error) => format!("worker task did not finish: {}", join_error),
        };
        tracing::error!("[{}] worker={} failed: {}", phase, worker_id, failure);
        failed.push((worker_id, chunk, failure));
    }

    if !failed.is_empty() {
        let recorded: HashSet<String> = records.iter().map(|r| r.ledger_key().to_string()).collect();
        for (worker_id, chunk, failure) in failed {
            let message = format!("worker {} failed: {}", worker_id, failure);
            for item in chunk.iter().filter(|item| !recorded.contains(item.as_ref())) {
                records.push(on_failure(worker_id, item, &message));
            }
        }
    }

    records.sort_by(|a, b| a.ledger_key().cmp(b.ledger_key()));
    records
}
