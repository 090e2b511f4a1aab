//! Bounded, order-preserving parallel map over a stream of work items.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

/// Apply `f` over `input` with at most `workers` concurrent invocations,
/// yielding outputs in submission order.
///
/// Each worker holds at most one in-flight item and the internal channels are
/// tightly bounded, so the input is never drained much faster than the
/// consumer reads the output. Dropping the returned receiver unwinds the
/// whole assembly: workers finish their in-flight item and stop, and the
/// closed `input` channel signals the producer feeding it.
pub fn map_ordered<T, U, F, Fut>(input: mpsc::Receiver<T>, workers: usize, f: F) -> mpsc::Receiver<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    let workers = workers.max(1);
    let (work_tx, work_rx) = mpsc::channel::<(u64, T)>(1);
    let (done_tx, done_rx) = mpsc::channel::<(u64, U)>(workers);
    let (out_tx, out_rx) = mpsc::channel::<U>(1);

    // Dispatcher stamps each item with its submission index.
    tokio::spawn(async move {
        let mut input = input;
        let mut seq = 0u64;
        while let Some(item) = input.recv().await {
            if work_tx.send((seq, item)).await.is_err() {
                break;
            }
            seq += 1;
        }
    });

    let work_rx = Arc::new(Mutex::new(work_rx));
    for _ in 0..workers {
        let work_rx = Arc::clone(&work_rx);
        let done_tx = done_tx.clone();
        let f = f.clone();
        tokio::spawn(async move {
            loop {
                let next = work_rx.lock().await.recv().await;
                let Some((seq, item)) = next else { break };
                let out = f(item).await;
                if done_tx.send((seq, out)).await.is_err() {
                    break;
                }
            }
        });
    }
    drop(done_tx);

    // Sequencer buffers out-of-order completions and releases them in
    // submission order.
    tokio::spawn(async move {
        let mut done_rx = done_rx;
        let mut next = 0u64;
        let mut pending = BTreeMap::new();
        while let Some((seq, out)) = done_rx.recv().await {
            pending.insert(seq, out);
            while let Some(out) = pending.remove(&next) {
                if out_tx.send(out).await.is_err() {
                    return;
                }
                next += 1;
            }
        }
    });

    out_rx
}

/// Map an in-memory list through [`map_ordered`] and collect the results.
pub async fn map_ordered_collect<T, U, F, Fut>(items: Vec<T>, workers: usize, f: F) -> Vec<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    let expected = items.len();
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        for item in items {
            if tx.send(item).await.is_err() {
                break;
            }
        }
    });
    let mut out_rx = map_ordered(rx, workers, f);
    let mut out = Vec::with_capacity(expected);
    while let Some(item) = out_rx.recv().await {
        out.push(item);
    }
    out
}
