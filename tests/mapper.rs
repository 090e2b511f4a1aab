use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use dircast::mapper::{map_ordered, map_ordered_collect};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn output_preserves_submission_order() {
    // Earlier items sleep longer, so any unordered implementation would
    // yield them last.
    let items: Vec<u64> = (0..16).collect();
    let out = map_ordered_collect(items.clone(), 4, |i| async move {
        tokio::time::sleep(Duration::from_millis((16 - i) * 5)).await;
        i
    })
    .await;
    assert_eq!(out, items);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_never_exceeds_worker_count() {
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let items: Vec<u32> = (0..24).collect();
    let (current2, peak2) = (Arc::clone(&current), Arc::clone(&peak));
    let out = map_ordered_collect(items, 3, move |i| {
        let current = Arc::clone(&current2);
        let peak = Arc::clone(&peak2);
        async move {
            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            current.fetch_sub(1, Ordering::SeqCst);
            i * 2
        }
    })
    .await;
    assert_eq!(out.len(), 24);
    assert!(
        peak.load(Ordering::SeqCst) <= 3,
        "observed {} concurrent workers",
        peak.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn empty_input_yields_empty_output() {
    let out = map_ordered_collect(Vec::<u32>::new(), 8, |i| async move { i }).await;
    assert!(out.is_empty());
}

#[tokio::test]
async fn single_worker_still_completes() {
    let out = map_ordered_collect(vec![1, 2, 3], 1, |i| async move { i + 10 }).await;
    assert_eq!(out, vec![11, 12, 13]);
}

#[tokio::test]
async fn zero_workers_is_clamped_to_one() {
    let out = map_ordered_collect(vec![5, 6], 0, |i| async move { i }).await;
    assert_eq!(out, vec![5, 6]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dropping_the_output_stops_the_producer() {
    let (tx, rx) = mpsc::channel::<u32>(1);
    let out_rx = map_ordered(rx, 2, |i| async move { i });
    drop(out_rx);
    // With the consumer gone the pipeline unwinds and the producer's channel
    // closes rather than accepting input forever.
    let mut accepted = 0;
    for i in 0..100 {
        if tx.send(i).await.is_err() {
            break;
        }
        accepted += 1;
    }
    assert!(accepted < 100, "producer was never signalled to stop");
}
