//! Ordering guarantees of the sequencer.
//!
//! Run with: cargo test --test ordering

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;
use testharness_bridge::{DispatchSlot, DriverLoop, DriverOptions, Response, Sequencer, handler_fn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Helpers
// ============================================================================

type Log = Arc<Mutex<Vec<String>>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn recording_slot(log: &Log) -> DispatchSlot<String> {
    let log = Arc::clone(log);
    DispatchSlot::new(move |payload| {
        log.lock().push(payload);
        Ok(())
    })
}

fn ack(payload: &str) -> String {
    format!("ack:{payload}")
}

/// Answers the oldest dispatched-but-unanswered payload, if there is one.
fn answer_next(seq: &Sequencer<String, String>, log: &Log, answered: &mut usize) -> bool {
    let Some(payload) = log.lock().get(*answered).cloned() else {
        return false;
    };
    seq.resolve(recording_slot(log), ack(&payload))
        .expect("driver follows the handshake");
    *answered += 1;
    true
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Any interleaving of sends and answers keeps dispatch order equal to
    /// call order and routes every result to its own caller.
    #[test]
    fn prop_results_match_their_own_payloads(
        early in 0usize..4,
        steps in proptest::collection::vec(any::<bool>(), 0..48),
    ) {
        let seq: Sequencer<String, String> = Sequencer::new();
        let log = Log::default();
        let mut sent: Vec<(String, Response<String>)> = Vec::new();
        let mut answered = 0usize;

        for i in 0..early {
            let payload = format!("early{i}");
            sent.push((payload.clone(), seq.send(payload)));
        }
        prop_assert!(log.lock().is_empty());

        seq.bootstrap(recording_slot(&log)).unwrap();

        for (i, is_send) in steps.into_iter().enumerate() {
            if is_send {
                let payload = format!("p{i}");
                sent.push((payload.clone(), seq.send(payload)));
            } else {
                answer_next(&seq, &log, &mut answered);
            }

            // Depth one: never more than one unanswered dispatch.
            prop_assert!(log.lock().len() <= answered + 1);
        }

        while answer_next(&seq, &log, &mut answered) {}

        let expected: Vec<String> = sent.iter().map(|(payload, _)| payload.clone()).collect();
        prop_assert_eq!(&*log.lock(), &expected);

        for (payload, mut response) in sent {
            prop_assert_eq!(response.try_take().unwrap().unwrap(), ack(&payload));
        }

        let stats = seq.stats();
        prop_assert_eq!(stats.resolved, stats.sent + 1);
        prop_assert_eq!(stats.dispatched, stats.sent);
        prop_assert_eq!(stats.pending, 0);
    }
}

// ============================================================================
// Deep Backlog
// ============================================================================

/// Driver that answers from inside its own slot, recording what it saw.
fn inline_slot(seq: &Sequencer<String, String>, log: &Log) -> DispatchSlot<String> {
    let seq = seq.clone();
    let log = Arc::clone(log);
    DispatchSlot::new(move |payload: String| {
        let next = inline_slot(&seq, &log);
        let result = ack(&payload);
        log.lock().push(payload);
        seq.resolve(next, result)
    })
}

#[test]
fn test_inline_driver_drains_large_backlog() {
    const BACKLOG: usize = 100_000;

    let seq: Sequencer<String, String> = Sequencer::new();
    let log = Log::default();
    let responses = seq.send_all((0..BACKLOG).map(|i| format!("m{i}")));

    seq.bootstrap(inline_slot(&seq, &log)).unwrap();

    assert_eq!(log.lock().len(), BACKLOG);
    for (i, mut response) in responses.into_iter().enumerate() {
        assert_eq!(response.try_take().unwrap().unwrap(), format!("ack:m{i}"));
    }
    assert_eq!(seq.stats().resolved, BACKLOG as u64 + 1);

    seq.close();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_driver_loop_drains_large_backlog() {
    init_tracing();
    const BACKLOG: usize = 20_000;

    let seq: Sequencer<String, String> = Sequencer::new();
    let responses = seq.send_all((0..BACKLOG).map(|i| format!("m{i}")));
    let handler = handler_fn(|payload: String| std::future::ready(ack(&payload)));
    let driver = DriverLoop::spawn(seq.clone(), handler, DriverOptions::new()).unwrap();

    for (i, response) in responses.into_iter().enumerate() {
        assert_eq!(response.await.unwrap(), format!("ack:m{i}"));
    }

    let summary = driver.shutdown().await.unwrap();
    assert_eq!(summary.rounds, BACKLOG as u64);
}

// ============================================================================
// Concurrent Senders
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_senders_are_serialized() {
    init_tracing();

    let seq: Sequencer<String, String> = Sequencer::new();
    let received = Log::default();
    let received_by_driver = Arc::clone(&received);

    let handler = handler_fn(move |payload: String| {
        received_by_driver.lock().push(payload.clone());
        std::future::ready(ack(&payload))
    });
    let driver = DriverLoop::spawn(seq.clone(), handler, DriverOptions::new()).unwrap();

    let mut tasks = Vec::new();
    for task_id in 0..16 {
        let seq = seq.clone();
        tasks.push(tokio::spawn(async move {
            let mut order = Vec::new();
            for n in 0..4 {
                let payload = format!("t{task_id}-{n}");
                let response = seq.send(payload.clone());
                order.push((response.seq(), payload.clone()));
                assert_eq!(response.await.unwrap(), ack(&payload));
            }
            order
        }));
    }

    let mut by_seq = BTreeMap::new();
    for task in tasks {
        by_seq.extend(task.await.unwrap());
    }

    let call_order: Vec<String> = by_seq.into_values().collect();
    assert_eq!(call_order.len(), 64);
    assert_eq!(*received.lock(), call_order);

    let summary = driver.shutdown().await.unwrap();
    assert_eq!(summary.rounds, 64);
}

#[tokio::test]
async fn test_responses_awaited_out_of_order() {
    init_tracing();

    let seq: Sequencer<String, String> = Sequencer::new();
    let handler = handler_fn(|payload: String| async move {
        tokio::task::yield_now().await;
        ack(&payload)
    });

    let mut responses = seq.send_all(["A", "B", "C"].map(String::from));
    let driver = DriverLoop::spawn(seq.clone(), handler, DriverOptions::new()).unwrap();

    let c = responses.pop().unwrap();
    assert_eq!(c.await.unwrap(), "ack:C");
    let b = responses.pop().unwrap();
    let a = responses.pop().unwrap();
    assert_eq!(a.await.unwrap(), "ack:A");
    assert_eq!(b.await.unwrap(), "ack:B");

    driver.shutdown().await.unwrap();
}
