use calcdag::dag::TaskSnapshot;
use calcdag::errors::CalcError;
use calcdag::store::{Expression, SchedulerStore};

/// A fake worker that:
/// - leases tasks from the store synchronously, one at a time
/// - immediately submits the honest result for each
/// - records every task it executed, in order.
pub struct FakeWorker<'a> {
    store: &'a SchedulerStore,
    executed: Vec<TaskSnapshot>,
}

impl<'a> FakeWorker<'a> {
    pub fn new(store: &'a SchedulerStore) -> Self {
        Self {
            store,
            executed: Vec::new(),
        }
    }

    /// Lease and complete one task; `None` if nothing is ready.
    pub fn step(&mut self) -> Option<TaskSnapshot> {
        match self.store.next_task() {
            Ok(task) => {
                self.store
                    .submit_result(task.id, task.compute())
                    .expect("a freshly leased task must accept its result");
                self.executed.push(task.clone());
                Some(task)
            }
            Err(CalcError::NoTaskAvailable) => None,
            Err(e) => panic!("unexpected error from next_task: {e:?}"),
        }
    }

    /// Keep stepping until the ready queue is empty. Returns the number of
    /// tasks executed by this call.
    pub fn run_until_idle(&mut self) -> usize {
        let mut n = 0;
        while self.step().is_some() {
            n += 1;
        }
        n
    }

    pub fn executed(&self) -> &[TaskSnapshot] {
        &self.executed
    }
}

/// Submit `raw`, drive it to completion with a [`FakeWorker`] and return the
/// final expression record.
pub fn evaluate_sync(store: &SchedulerStore, raw: &str) -> Expression {
    let id = store.submit(raw).expect("expression should parse");
    FakeWorker::new(store).run_until_idle();
    store.get_expression(id).expect("submitted expression must exist")
}
