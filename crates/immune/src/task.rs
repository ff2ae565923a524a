//! Lazy asynchronous computations.
//!
//! A `Task` is a recipe, not a running computation. Nothing happens until it
//! is forked, and every fork runs the effect again from the start. Results are
//! never cached.
//!
//!   let t = Task::of(2.into()).map(|v| Value::from(v.as_number().unwrap_or(0.0) + 1.0));
//!   t.fork(|err| ..., |ok| ...).await;
//!
//! Outcomes are `Result<Value, Value>`: a failure is an ordinary value handed
//! to whoever forks the task.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot};

use crate::error::Error;
use crate::runtime::value::{Func, Value, nth};

pub type Outcome = Result<Value, Value>;

pub type TaskFuture = Pin<Box<dyn Future<Output = Outcome> + Send>>;

type Thunk = dyn Fn() -> TaskFuture + Send + Sync;

/// The failure value a task carries when a dynamic callback inside it errors.
pub fn failure_value(err: &Error) -> Value {
    Value::Str(err.to_string())
}

// ─── Resolver ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Failure,
    Success,
}

/// One of the two callbacks handed to a `Task::new` procedure. The first
/// call on either side settles the run; later calls are ignored.
#[derive(Clone)]
pub struct Resolver {
    slot: Arc<Mutex<Option<oneshot::Sender<Outcome>>>>,
    side: Side,
}

impl Resolver {
    pub fn resolve(&self, value: Value) {
        let sender = self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(tx) = sender {
            let outcome = match self.side {
                Side::Failure => Err(value),
                Side::Success => Ok(value),
            };
            // The receiver is gone when nobody awaits this run any more.
            let _ = tx.send(outcome);
        }
    }

    /// This resolver as a one-argument `Func` for dynamic procedures.
    pub fn to_func(&self) -> Func {
        let name = match self.side {
            Side::Failure => "fail",
            Side::Success => "succeed",
        };
        let this = self.clone();
        Func::new(name, 1, move |args| {
            this.resolve(nth(args, 0));
            Ok(Value::Nil)
        })
    }
}

// ─── Task ─────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Task(Arc<Thunk>);

impl Task {
    /// Wrap a procedure receiving `(fail, succeed)`. A procedure that drops
    /// both resolvers without calling either never settles.
    pub fn new(procedure: impl Fn(Resolver, Resolver) + Send + Sync + 'static) -> Self {
        Self::from_future(move || {
            let (tx, rx) = oneshot::channel();
            let slot = Arc::new(Mutex::new(Some(tx)));
            procedure(
                Resolver { slot: slot.clone(), side: Side::Failure },
                Resolver { slot, side: Side::Success },
            );
            async move {
                match rx.await {
                    Ok(outcome) => outcome,
                    Err(_) => std::future::pending().await,
                }
            }
        })
    }

    /// Build a task from a future factory. The factory is called once per fork.
    pub fn from_future<F, Fut>(make: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        Self(Arc::new(move || Box::pin(make()) as TaskFuture))
    }

    /// A task whose procedure is a dynamic `Func` called with `[fail, succeed]`.
    /// An error returned by the procedure fails the run.
    pub fn from_func(procedure: Func) -> Self {
        Self::new(move |fail, succeed| {
            let args = [Value::Func(fail.to_func()), Value::Func(succeed.to_func())];
            if let Err(err) = procedure.call(&args) {
                fail.resolve(failure_value(&err));
            }
        })
    }

    pub fn of(value: Value) -> Self {
        Self::from_future(move || std::future::ready(Ok(value.clone())))
    }

    pub fn succeed(value: Value) -> Self {
        Self::of(value)
    }

    pub fn fail(value: Value) -> Self {
        Self::from_future(move || std::future::ready(Err(value.clone())))
    }

    /// Never settles.
    pub fn none() -> Self {
        Self::from_future(std::future::pending::<Outcome>)
    }

    /// Start one run of the effect.
    pub fn run(&self) -> TaskFuture {
        (self.0)()
    }

    /// Run the effect and hand its outcome to exactly one of the callbacks.
    pub async fn fork(&self, on_failure: impl FnOnce(Value), on_success: impl FnOnce(Value)) {
        match self.run().await {
            Ok(v) => on_success(v),
            Err(e) => on_failure(e),
        }
    }

    pub fn ptr_eq(&self, other: &Task) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // ─── Combinators ──────────────────────────────────────────────────────────

    /// Run `self`, then the task `next` builds from its outcome.
    pub(crate) fn chain(&self, next: impl Fn(Outcome) -> Task + Send + Sync + 'static) -> Task {
        let this = self.clone();
        let next = Arc::new(next);
        Self::from_future(move || {
            let first = this.run();
            let next = next.clone();
            async move { next(first.await).run().await }
        })
    }

    pub fn map(&self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Task {
        self.try_map(move |v| Ok(f(v)))
    }

    /// Like `map`, but an `Err` from `f` fails the task.
    pub fn try_map(&self, f: impl Fn(Value) -> Result<Value, Error> + Send + Sync + 'static) -> Task {
        self.chain(move |outcome| match outcome.map(&f) {
            Ok(Ok(v))    => Task::of(v),
            Ok(Err(err)) => Task::fail(failure_value(&err)),
            Err(e)       => Task::fail(e),
        })
    }

    pub fn and_then(&self, f: impl Fn(Value) -> Task + Send + Sync + 'static) -> Task {
        self.try_and_then(move |v| Ok(f(v)))
    }

    pub fn try_and_then(&self, f: impl Fn(Value) -> Result<Task, Error> + Send + Sync + 'static) -> Task {
        self.chain(move |outcome| match outcome {
            Ok(v) => f(v).unwrap_or_else(|err| Task::fail(failure_value(&err))),
            Err(e) => Task::fail(e),
        })
    }

    /// Collapse a task of a task. A non-task success value passes through.
    pub fn flatten(&self) -> Task {
        self.and_then(|v| match v {
            Value::Task(inner) => inner,
            other => Task::of(other),
        })
    }

    /// Always succeeds: `f(value, initial)` on success, `initial` on failure.
    pub fn fold_left(&self, f: impl Fn(Value, Value) -> Value + Send + Sync + 'static, initial: Value) -> Task {
        self.chain(move |outcome| match outcome {
            Ok(v)  => Task::of(f(v, initial.clone())),
            Err(_) => Task::of(initial.clone()),
        })
    }

    /// Same outcome as [`Task::fold_left`]: a task holds at most one value.
    pub fn fold_right(&self, f: impl Fn(Value, Value) -> Value + Send + Sync + 'static, initial: Value) -> Task {
        self.fold_left(f, initial)
    }

    /// Transform both channels. The failure transform stays on the failure channel.
    pub fn bimap(
        &self,
        on_success: impl Fn(Value) -> Value + Send + Sync + 'static,
        on_failure: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Task {
        self.chain(move |outcome| match outcome {
            Ok(v)  => Task::of(on_success(v)),
            Err(e) => Task::fail(on_failure(e)),
        })
    }

    /// A task that never fails: the failure is turned into a success value by `on_failure`.
    pub fn perform(
        task: &Task,
        on_failure: impl Fn(Value) -> Value + Send + Sync + 'static,
        on_success: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Task {
        task.chain(move |outcome| match outcome {
            Ok(v)  => Task::of(on_success(v)),
            Err(e) => Task::of(on_failure(e)),
        })
    }

    /// Run every task concurrently. Succeeds with the results in input order,
    /// or fails with the first failure observed. Siblings of a failed task keep
    /// running and their outcomes are dropped.
    ///
    /// Each child is started with `tokio::spawn`, so the returned task must be
    /// forked inside a tokio runtime. Forking it elsewhere panics.
    pub fn parallel(tasks: impl IntoIterator<Item = Task>) -> Task {
        let tasks: Arc<[Task]> = tasks.into_iter().collect();
        Self::from_future(move || join_all(tasks.clone()))
    }
}

async fn join_all(tasks: Arc<[Task]>) -> Outcome {
    let (tx, mut rx) = mpsc::unbounded_channel();
    for (index, task) in tasks.iter().enumerate() {
        let tx = tx.clone();
        let run = task.run();
        tokio::spawn(async move {
            let _ = tx.send((index, run.await));
        });
    }
    drop(tx);

    let mut slots: Vec<Option<Value>> = vec![None; tasks.len()];
    let mut pending = tasks.len();
    while pending > 0 {
        match rx.recv().await {
            Some((index, Ok(v))) => {
                slots[index] = Some(v);
                pending -= 1;
            }
            Some((_, Err(e))) => return Err(e),
            None => return Err(Value::from("task dropped before settling")),
        }
    }
    Ok(Value::list(slots.into_iter().map(|v| v.unwrap_or(Value::Nil))))
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Task {}")
    }
}
