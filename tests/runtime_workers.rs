// tests/runtime_workers.rs

mod common;
use crate::common::builders::ConfigFileBuilder;
use crate::common::init_tracing;

use calcdag_test_utils::{wait_settled, with_timeout};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

use calcdag::dag::TaskSnapshot;
use calcdag::engine::Runtime;
use calcdag::errors::{CalcError, Result};
use calcdag::exec::{spawn_workers, TaskBroker};
use calcdag::monitor::LeaseMonitor;
use calcdag::store::{Ack, ExpressionStatus, SchedulerStore};
use calcdag::types::{FailureReason, TaskId};

type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

#[tokio::test]
async fn workers_evaluate_submitted_expressions() -> TestResult {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_uniform_operation_time(5)
        .with_lease_grace_ms(1_000)
        .with_workers(4)
        .build();
    let store = Arc::new(SchedulerStore::new(&cfg));
    let runtime = Runtime::start(&cfg, Arc::clone(&store));

    let cases = [
        ("(2+3)*4-5", 15.0),
        ("2+2*2", 6.0),
        ("(1+2)*(3+4)", 21.0),
        ("-(8/4)", -2.0),
        ("7", 7.0),
    ];
    let mut ids = Vec::new();
    for (raw, _) in &cases {
        ids.push(store.submit(raw)?);
    }

    let results = with_timeout(runtime.wait_for(&ids)).await;
    assert_eq!(results.len(), cases.len());
    for (expr, (raw, expected)) in results.iter().zip(cases.iter()) {
        assert_eq!(expr.raw, *raw);
        assert_eq!(expr.status, ExpressionStatus::Done, "{raw}");
        assert_eq!(expr.result, Some(*expected), "{raw}");
    }

    let total_tasks: usize = results.iter().map(|e| e.task_count).sum();
    let stats = runtime.shutdown().await?;
    assert_eq!(stats.completed, total_tasks);
    assert_eq!(stats.rejected, 0);
    Ok(())
}

#[tokio::test]
async fn arithmetic_error_settles_expression_while_others_finish() -> TestResult {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_uniform_operation_time(2)
        .with_lease_grace_ms(1_000)
        .build();
    let store = Arc::new(SchedulerStore::new(&cfg));
    let runtime = Runtime::start(&cfg, Arc::clone(&store));

    let bad = store.submit("1/(3-3)")?;
    let good = store.submit("9-3")?;

    let results = with_timeout(runtime.wait_for(&[bad, good])).await;
    assert_eq!(results[0].status, ExpressionStatus::Error);
    assert_eq!(results[0].error_detail, Some(FailureReason::DivisionByZero));
    assert_eq!(results[1].result, Some(6.0));

    let stats = runtime.shutdown().await?;
    assert_eq!(stats.rejected, 1);
    Ok(())
}

#[tokio::test]
async fn wait_for_returns_immediately_when_nothing_is_pending() -> TestResult {
    init_tracing();
    let cfg = ConfigFileBuilder::new().build();
    let store = Arc::new(SchedulerStore::new(&cfg));
    let runtime = Runtime::start(&cfg, Arc::clone(&store));

    assert!(with_timeout(runtime.wait_for(&[])).await.is_empty());

    let stats = runtime.shutdown().await?;
    assert_eq!(stats.completed, 0);
    Ok(())
}

/// Broker that silently drops the first `drop_first` results, as if the
/// worker holding the lease had crashed.
struct DroppingBroker {
    store: Arc<SchedulerStore>,
    remaining_drops: AtomicUsize,
    dropped: AtomicUsize,
}

impl TaskBroker for DroppingBroker {
    fn next_task(&self) -> Result<TaskSnapshot> {
        self.store.next_task()
    }

    fn submit_result(&self, task: TaskId, value: f64) -> Result<Ack> {
        let drop_this = self
            .remaining_drops
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if drop_this {
            self.dropped.fetch_add(1, Ordering::SeqCst);
            // The worker sees a lost lease; the store never hears about it.
            let status = self.store.get_task(task)?.status;
            return Err(CalcError::StaleLease { task, status });
        }
        self.store.submit_result(task, value)
    }
}

#[tokio::test]
async fn lost_results_are_recovered_by_the_lease_monitor() -> TestResult {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_uniform_operation_time(5)
        .with_lease_grace_ms(40)
        .with_lease_check_interval_ms(10)
        .with_max_retries(3)
        .with_workers(2)
        .build();
    let store = Arc::new(SchedulerStore::new(&cfg));
    let broker = Arc::new(DroppingBroker {
        store: Arc::clone(&store),
        remaining_drops: AtomicUsize::new(2),
        dropped: AtomicUsize::new(0),
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor = LeaseMonitor::new(Arc::clone(&store), cfg.scheduler.lease_check_interval())
        .spawn(shutdown_rx.clone());
    let workers = spawn_workers(Arc::clone(&broker), &cfg.worker, shutdown_rx);

    let id = store.submit("2*3+1")?;
    wait_settled(&store, &[id]).await;

    let expr = store.get_expression(id)?;
    assert_eq!(expr.status, ExpressionStatus::Done);
    assert_eq!(expr.result, Some(7.0));
    assert_eq!(broker.dropped.load(Ordering::SeqCst), 2);

    shutdown_tx.send(true)?;
    monitor.await?;
    let mut stale = 0;
    for handle in workers {
        stale += handle.await?.stale;
    }
    assert_eq!(stale, 2);
    Ok(())
}

#[tokio::test]
async fn crashed_workers_exhaust_retries_into_timeout() -> TestResult {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_uniform_operation_time(1)
        .with_lease_grace_ms(5)
        .with_lease_check_interval_ms(5)
        .with_max_retries(2)
        .with_workers(1)
        .build();
    let store = Arc::new(SchedulerStore::new(&cfg));
    let broker = Arc::new(DroppingBroker {
        store: Arc::clone(&store),
        remaining_drops: AtomicUsize::new(usize::MAX),
        dropped: AtomicUsize::new(0),
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor = LeaseMonitor::new(Arc::clone(&store), cfg.scheduler.lease_check_interval())
        .spawn(shutdown_rx.clone());
    let workers = spawn_workers(Arc::clone(&broker), &cfg.worker, shutdown_rx);

    let id = store.submit("4/2")?;
    wait_settled(&store, &[id]).await;

    let expr = store.get_expression(id)?;
    assert_eq!(expr.status, ExpressionStatus::Error);
    assert_eq!(expr.error_detail, Some(FailureReason::Timeout { expiries: 3 }));
    assert_eq!(store.get_task(TaskId::new(id, 0))?.retry_count, 3);
    assert!(broker.dropped.load(Ordering::SeqCst) >= 2);

    shutdown_tx.send(true)?;
    monitor.await?;
    for handle in workers {
        handle.await?;
    }
    Ok(())
}
