//! Fork/join host for one batch of builder tasks.
//!
//! Tasks are registered with [`ParallelHost::add_task`]. The first task is
//! kept for the calling thread; every later task gets its own named worker
//! thread, which parks on a start gate until [`ParallelHost::exec`] opens
//! it. `exec` then runs the local task, joins every worker and hands the
//! results back in registration order. The host is idle again afterwards
//! and can accept a new batch.

use std::io;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::error::ExecError;

type LocalTask<T> = Box<dyn FnOnce() -> T + Send>;

/// Body of a worker thread. Yields `None` when the batch was dropped
/// without running.
pub type WorkerBody<T> = Box<dyn FnOnce() -> Option<T> + Send + 'static>;

/// Starts the worker thread for one task body.
pub type Spawner<T> =
    Box<dyn FnMut(thread::Builder, WorkerBody<T>) -> io::Result<JoinHandle<Option<T>>> + Send>;

/// One-shot fork/join executor.
pub struct ParallelHost<T: Send + 'static> {
    name: String,
    spawner: Spawner<T>,
    local: Option<LocalTask<T>>,
    workers: Vec<JoinHandle<Option<T>>>,
    gate_tx: Option<Sender<()>>,
    gate_rx: Receiver<()>,
    cancelled: Arc<AtomicBool>,
    spawned: usize,
}

impl<T: Send + 'static> ParallelHost<T> {
    /// Create an idle host. Worker threads are named `"{name}-{index}"`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_spawner(
            name,
            Box::new(|builder: thread::Builder, body: WorkerBody<T>| builder.spawn(body)),
        )
    }

    /// Create an idle host that starts workers through `spawner` instead
    /// of [`thread::Builder::spawn`].
    pub fn with_spawner(name: impl Into<String>, spawner: Spawner<T>) -> Self {
        let (gate_tx, gate_rx) = crossbeam_channel::bounded(0);
        Self {
            name: name.into(),
            spawner,
            local: None,
            workers: Vec::new(),
            gate_tx: Some(gate_tx),
            gate_rx,
            cancelled: Arc::new(AtomicBool::new(false)),
            spawned: 0,
        }
    }

    /// Recommended number of tasks: the available hardware parallelism,
    /// never fewer than two.
    pub fn suggest_task_count() -> usize {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2)
            .max(2)
    }

    /// Number of tasks registered for the next `exec()`.
    pub fn pending_tasks(&self) -> usize {
        usize::from(self.local.is_some()) + self.workers.len()
    }

    /// Name of the host, used as the worker thread prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Worker threads started over the host's lifetime.
    pub fn threads_spawned(&self) -> usize {
        self.spawned
    }

    /// Register a task.
    ///
    /// Returns [`ExecError::SpawnFailed`] if the worker thread could not be
    /// started; the task is dropped and the host stays usable for the
    /// tasks already accepted.
    pub fn add_task<F>(&mut self, task: F) -> Result<(), ExecError>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        if self.local.is_none() {
            self.local = Some(Box::new(task));
            return Ok(());
        }

        let index = self.workers.len() + 1;
        let thread_name = format!("{}-{index}", self.name);
        let gate = self.gate_rx.clone();
        let cancelled = Arc::clone(&self.cancelled);

        let body: WorkerBody<T> = Box::new(move || {
            // Blocks until the host drops its sender.
            let _ = gate.recv();
            if cancelled.load(Ordering::Acquire) {
                return None;
            }
            Some(task())
        });
        let builder = thread::Builder::new().name(thread_name.clone());

        match (self.spawner)(builder, body) {
            Ok(handle) => {
                self.workers.push(handle);
                self.spawned += 1;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(thread = %thread_name, error = %e, "worker spawn failed, task rejected");
                Err(ExecError::SpawnFailed {
                    thread_name,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Run every registered task and wait for all of them.
    ///
    /// Results come back in registration order. A panic in any task is
    /// re-raised on the calling thread after the remaining workers were
    /// released.
    pub fn exec(&mut self) -> Result<Vec<T>, ExecError> {
        let local = self.local.take().ok_or(ExecError::NoTasks)?;
        let workers = std::mem::take(&mut self.workers);

        // Fresh gate for the next batch; dropping the old sender opens the
        // current one.
        let (gate_tx, gate_rx) = crossbeam_channel::bounded(0);
        let open = self.gate_tx.replace(gate_tx);
        self.gate_rx = gate_rx;
        drop(open);

        tracing::debug!(host = %self.name, tasks = workers.len() + 1, "exec");

        let mut results = Vec::with_capacity(workers.len() + 1);
        results.push(local());
        for handle in workers {
            match handle.join() {
                Ok(Some(result)) => results.push(result),
                // Only produced after cancellation, which exec never sets.
                Ok(None) => {}
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        Ok(results)
    }
}

impl<T: Send + 'static> Drop for ParallelHost<T> {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            // Release parked workers without running their tasks.
            self.cancelled.store(true, Ordering::Release);
            self.gate_tx.take();
            for handle in self.workers.drain(..) {
                let _ = handle.join();
            }
        }
    }
}

/// Run `make_task(range)` for every range, one task per range.
///
/// A range whose worker could not be started is run on the calling thread
/// after the others complete, so every range is always covered. Results are
/// returned paired with their range, accepted tasks first.
pub fn run_partitioned<T, F, G>(
    name: &str,
    ranges: Vec<Range<usize>>,
    make_task: F,
) -> Result<Vec<(Range<usize>, T)>, ExecError>
where
    T: Send + 'static,
    F: Fn(Range<usize>) -> G,
    G: FnOnce() -> T + Send + 'static,
{
    run_partitioned_on(&mut ParallelHost::new(name), ranges, make_task)
}

/// [`run_partitioned`] on an existing host.
pub fn run_partitioned_on<T, F, G>(
    host: &mut ParallelHost<T>,
    ranges: Vec<Range<usize>>,
    make_task: F,
) -> Result<Vec<(Range<usize>, T)>, ExecError>
where
    T: Send + 'static,
    F: Fn(Range<usize>) -> G,
    G: FnOnce() -> T + Send + 'static,
{
    let mut accepted = Vec::with_capacity(ranges.len());
    let mut rejected = Vec::new();

    for range in ranges {
        match host.add_task(make_task(range.clone())) {
            Ok(()) => accepted.push(range),
            Err(_) => rejected.push(range),
        }
    }

    let results = host.exec()?;
    let mut out: Vec<(Range<usize>, T)> = accepted.into_iter().zip(results).collect();

    if !rejected.is_empty() {
        tracing::warn!(host = %host.name(), ranges = rejected.len(), "running rejected ranges on caller");
        for range in rejected {
            let result = make_task(range.clone())();
            out.push((range, result));
        }
    }
    Ok(out)
}
