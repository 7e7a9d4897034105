// tests/lease_expiry.rs

mod common;
use crate::common::builders::ConfigFileBuilder;
use crate::common::{init_tracing, store_with_mock_clock};

use std::sync::Arc;
use std::time::Duration;

use calcdag::clock::MockClock;
use calcdag::config::ConfigFile;
use calcdag::dag::TaskStatus;
use calcdag::errors::CalcError;
use calcdag::monitor::LeaseMonitor;
use calcdag::store::{ExpressionStatus, SchedulerStore};
use calcdag::types::{FailureReason, Operation};

const OP_MS: u64 = 100;

fn setup(max_retries: u32) -> (SchedulerStore, MockClock) {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_uniform_operation_time(OP_MS)
        .with_lease_grace_ms(0)
        .with_max_retries(max_retries)
        .build();
    store_with_mock_clock(&cfg)
}

#[test]
fn lease_is_not_expired_exactly_at_its_deadline() {
    let (store, clock) = setup(3);
    store.submit("1+2").unwrap();
    let task = store.next_task().unwrap();

    clock.advance(Duration::from_millis(OP_MS));
    assert!(store.reap_expired().is_empty());
    assert_eq!(store.get_task(task.id).unwrap().status, TaskStatus::Assigned);

    clock.advance(Duration::from_millis(1));
    let report = store.reap_expired();
    assert_eq!(report.requeued, vec![task.id]);
    assert_eq!(store.get_task(task.id).unwrap().status, TaskStatus::Ready);
}

#[test]
fn lease_grace_extends_the_deadline() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_uniform_operation_time(OP_MS)
        .with_lease_grace_ms(50)
        .build();
    let (store, clock) = store_with_mock_clock(&cfg);
    store.submit("1+2").unwrap();
    store.next_task().unwrap();

    clock.advance(Duration::from_millis(OP_MS + 50));
    assert!(store.reap_expired().is_empty());

    clock.advance(Duration::from_millis(1));
    assert_eq!(store.reap_expired().requeued.len(), 1);
}

#[test]
fn expired_task_is_offered_again_with_same_operands() {
    let (store, clock) = setup(3);
    store.submit("6*7").unwrap();

    let first = store.next_task().unwrap();
    clock.advance(Duration::from_millis(OP_MS + 1));
    store.reap_expired();

    let second = store.next_task().unwrap();
    assert_eq!(second, first);
    assert_eq!(store.get_task(second.id).unwrap().retry_count, 1);

    let ack = store.submit_result(second.id, 42.0).unwrap();
    assert_eq!(ack.expression_status, ExpressionStatus::Done);
}

#[test]
fn result_after_expiry_but_before_release_is_stale() {
    let (store, clock) = setup(3);
    store.submit("6*7").unwrap();

    let task = store.next_task().unwrap();
    clock.advance(Duration::from_millis(OP_MS + 1));
    store.reap_expired();

    let err = store.submit_result(task.id, 42.0).unwrap_err();
    assert!(matches!(
        err,
        CalcError::StaleLease {
            status: TaskStatus::Ready,
            ..
        }
    ));
}

#[test]
fn task_is_retried_max_retries_times_then_times_out() {
    let max_retries = 2;
    let (store, clock) = setup(max_retries);
    let id = store.submit("(1+2)*3").unwrap();

    let mut leases = 0;
    while let Ok(task) = store.next_task() {
        assert_eq!(task.operation, Operation::Add);
        leases += 1;
        clock.advance(Duration::from_millis(OP_MS + 1));
        store.reap_expired();
    }

    // Initial lease plus one per retry.
    assert_eq!(leases, max_retries + 1);

    let expr = store.get_expression(id).unwrap();
    assert_eq!(expr.status, ExpressionStatus::Error);
    assert_eq!(
        expr.error_detail,
        Some(FailureReason::Timeout {
            expiries: max_retries + 1
        })
    );
    assert!(!expr.error_detail.unwrap().is_arithmetic());
}

#[test]
fn zero_retries_fails_on_first_expiry() {
    let (store, clock) = setup(0);
    let id = store.submit("1+1").unwrap();
    let task = store.next_task().unwrap();

    clock.advance(Duration::from_millis(OP_MS + 1));
    let report = store.reap_expired();
    assert_eq!(report.failed, vec![task.id]);
    assert_eq!(report.settled, vec![id]);
    assert!(report.requeued.is_empty());

    let err = store.submit_result(task.id, 2.0).unwrap_err();
    assert!(matches!(
        err,
        CalcError::StaleLease {
            status: TaskStatus::Error,
            ..
        }
    ));
}

#[test]
fn completes_normally_within_retry_budget() {
    let (store, clock) = setup(3);
    let id = store.submit("(1+2)*3").unwrap();

    // Two expiries on the leaf, then an honest worker.
    for _ in 0..2 {
        store.next_task().unwrap();
        clock.advance(Duration::from_millis(OP_MS + 1));
        store.reap_expired();
    }

    while let Ok(task) = store.next_task() {
        store.submit_result(task.id, task.compute()).unwrap();
    }

    let expr = store.get_expression(id).unwrap();
    assert_eq!(expr.status, ExpressionStatus::Done);
    assert_eq!(expr.result, Some(9.0));
}

#[test]
fn requeued_task_goes_to_the_back_of_the_queue() {
    let (store, clock) = setup(3);
    let first = store.submit("1+1").unwrap();
    let second = store.submit("2+2").unwrap();

    let leased = store.next_task().unwrap();
    assert_eq!(leased.id.expression, first);

    clock.advance(Duration::from_millis(OP_MS + 1));
    store.reap_expired();

    assert_eq!(store.next_task().unwrap().id.expression, second);
    assert_eq!(store.next_task().unwrap().id.expression, first);
}

#[test]
fn expired_lease_of_settled_expression_is_released() {
    let (store, clock) = setup(3);
    let id = store.submit("1/0 + 2*3").unwrap();

    let div = store.next_task().unwrap();
    let mul = store.next_task().unwrap();
    store.submit_result(div.id, div.compute()).unwrap();

    clock.advance(Duration::from_millis(OP_MS + 1));
    let report = store.reap_expired();
    assert_eq!(report.released, vec![mul.id]);
    assert!(report.requeued.is_empty());

    assert!(matches!(store.next_task(), Err(CalcError::NoTaskAvailable)));
    assert_eq!(
        store.get_expression(id).unwrap().error_detail,
        Some(FailureReason::DivisionByZero)
    );
}

#[test]
fn monitor_sweep_reaps_through_the_store() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_uniform_operation_time(OP_MS)
        .with_max_retries(0)
        .build();
    let clock = MockClock::new();
    let store = Arc::new(SchedulerStore::with_clock(&cfg, Arc::new(clock.clone())));
    let monitor = LeaseMonitor::new(Arc::clone(&store), cfg.scheduler.lease_check_interval());

    let id = store.submit("2*2").unwrap();
    store.next_task().unwrap();

    assert!(monitor.sweep().is_empty());

    clock.advance(Duration::from_millis(OP_MS + 1));
    let report = monitor.sweep();
    assert_eq!(report.settled, vec![id]);
    assert_eq!(
        store.get_expression(id).unwrap().error_detail,
        Some(FailureReason::Timeout { expiries: 1 })
    );
}

#[test]
fn default_config_leases_for_exactly_the_operation_time() {
    init_tracing();
    let cfg = ConfigFile::default();
    let (store, clock) = store_with_mock_clock(&cfg);
    store.submit("1+2").unwrap();
    let task = store.next_task().unwrap();

    clock.advance(task.operation_time);
    assert!(store.reap_expired().is_empty());

    clock.advance(Duration::from_millis(1));
    assert_eq!(store.reap_expired().requeued, vec![task.id]);
}

#[test]
fn expired_leases_are_reaped_in_deadline_order() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_operation_time(Operation::Add, 100)
        .with_operation_time(Operation::Multiply, 200)
        .build();
    let (store, clock) = store_with_mock_clock(&cfg);
    store.submit("3*3").unwrap();
    store.submit("1+1").unwrap();

    let mul = store.next_task().unwrap();
    let add = store.next_task().unwrap();
    assert_eq!(store.stats().assigned, 2);

    clock.advance(Duration::from_millis(150));
    assert_eq!(store.reap_expired().requeued, vec![add.id]);
    assert_eq!(store.stats().assigned, 1);

    clock.advance(Duration::from_millis(100));
    assert_eq!(store.reap_expired().requeued, vec![mul.id]);
    assert_eq!(store.stats().assigned, 0);
}

#[test]
fn settled_history_is_never_reaped() {
    let (store, clock) = setup(0);

    // Completed, arithmetically failed and released leases all leave the
    // live set behind.
    for _ in 0..2_000 {
        let id = store.submit("(1+2)*3").unwrap();
        while let Ok(task) = store.next_task() {
            store.submit_result(task.id, task.compute()).unwrap();
        }
        assert!(store.is_settled(&[id]));
    }
    let failed = store.submit("1/0").unwrap();
    let div = store.next_task().unwrap();
    store.submit_result(div.id, div.compute()).unwrap();

    assert_eq!(store.stats().assigned, 0);
    clock.advance(Duration::from_secs(3_600));
    assert!(store.reap_expired().is_empty());
    assert_eq!(
        store.get_expression(failed).unwrap().error_detail,
        Some(FailureReason::DivisionByZero)
    );

    // A live lease among all that history is still found.
    store.submit("5+5").unwrap();
    let live = store.next_task().unwrap();
    clock.advance(Duration::from_millis(OP_MS + 1));
    let report = store.reap_expired();
    assert_eq!(report.failed, vec![live.id]);
    assert_eq!(store.stats().assigned, 0);
}

#[test]
fn timed_out_task_leaves_the_live_lease_set() {
    let (store, clock) = setup(0);
    store.submit("1+1").unwrap();
    store.next_task().unwrap();

    clock.advance(Duration::from_millis(OP_MS + 1));
    assert_eq!(store.reap_expired().failed.len(), 1);

    clock.advance(Duration::from_millis(OP_MS + 1));
    assert!(store.reap_expired().is_empty());
    assert_eq!(store.stats().assigned, 0);
}
