// src/engine/batch.rs
//
// Batch processor: drives a BatchQueue through the pipeline one task at a
// time, in insertion order.
//
// State machine: Idle -> Running (start) -> Idle (all tasks visited, or
// cancel). Cancellation is polled between tasks only; a resampling pass
// that has started always runs to completion.
//
// Locking: the queue lock is held only while task state is read or written,
// never while the pipeline runs or the sink is called. When both locks are
// needed the queue is locked before the run state.

use crate::engine::notify::{NotificationSink, NullSink, Progress, QueueChanged};
use crate::engine::pipeline::process;
use crate::engine::tasks::{BatchQueue, TaskId, TaskStatus};
use crate::error::UpscaleError;
use crate::ops::UpscaleOptions;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

type BatchResult<T> = std::result::Result<T, UpscaleError>;

#[derive(Debug, Default)]
struct RunState {
    running: bool,
    /// Bumped on every start so a cancelled run cannot clobber a newer one
    generation: u64,
    current_task: Option<TaskId>,
}

/// Counts for one `start` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Tasks in the queue when the run started
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// Tasks left alone because an earlier, cancelled run was still on them
    pub skipped: usize,
    /// True when the run stopped early because of `cancel`
    pub cancelled: bool,
}

/// Cloneable handle for cancelling a run from another thread or a sink.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    state: Arc<Mutex<RunState>>,
}

impl CancelHandle {
    /// Stop the active run after its in-flight task. Returns false when idle.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        let was_running = state.running;
        state.running = false;
        state.current_task = None;
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }
}

/// Resets the run state when the run ends, including on unwind.
struct RunGuard<'a> {
    state: &'a Mutex<RunState>,
    generation: u64,
}

impl RunGuard<'_> {
    fn is_current(&self) -> bool {
        let state = self.state.lock();
        state.running && state.generation == self.generation
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.generation == self.generation {
            state.running = false;
            state.current_task = None;
        }
    }
}

/// Sequential batch driver.
///
/// Only one run may be active at a time: `start` while running returns
/// [`UpscaleError::AlreadyRunning`] and leaves the active run untouched.
pub struct BatchProcessor {
    state: Arc<Mutex<RunState>>,
    sink: Arc<dyn NotificationSink>,
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new(Arc::new(NullSink))
    }
}

impl BatchProcessor {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RunState::default())),
            sink,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Task the active run is currently driving, if any.
    pub fn current_task_id(&self) -> Option<TaskId> {
        self.state.lock().current_task
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Stop after the in-flight task. No-op when idle.
    pub fn cancel(&self) {
        if self.cancel_handle().cancel() {
            info!(target: "pixel_upscale::batch", "batch cancelled");
        }
    }

    /// Process every task in `queue` with `options`, in insertion order.
    ///
    /// The set of tasks is fixed when the run starts: tasks removed meanwhile
    /// are skipped, tasks enqueued meanwhile wait for the next run. A task
    /// still `Processing` under a cancelled run is left to that run. A failing
    /// task is marked `Error` and the run continues. An empty queue returns
    /// immediately without touching the run state or notifying.
    pub fn start(
        &self,
        queue: &Mutex<BatchQueue>,
        options: &UpscaleOptions,
    ) -> BatchResult<BatchSummary> {
        let ids = queue.lock().ids();
        if ids.is_empty() {
            return Ok(BatchSummary::default());
        }

        let guard = self.begin_run()?;
        let total = ids.len() as u32;
        let mut summary = BatchSummary {
            total: ids.len(),
            ..BatchSummary::default()
        };
        info!(
            target: "pixel_upscale::batch",
            tasks = total,
            scale = options.scale_factor,
            algorithm = %options.algorithm,
            sharpness = options.sharpness,
            "batch started"
        );

        for (index, &id) in ids.iter().enumerate() {
            if !guard.is_current() {
                summary.cancelled = true;
                break;
            }

            let (source, listing) = {
                let mut q = queue.lock();
                let Some(task) = q.get_mut(id) else {
                    continue;
                };
                // Still driven by a cancelled run that is finishing up
                if task.status() == TaskStatus::Processing {
                    summary.skipped += 1;
                    continue;
                }
                task.mark_processing();
                let source = task.shared_source();
                self.state.lock().current_task = Some(id);
                (source, QueueChanged { tasks: q.snapshot() })
            };
            self.sink.on_queue_changed(&listing);
            self.sink.on_progress(Progress::new(index as u32, total));

            let outcome = process(&source, options);

            {
                let mut q = queue.lock();
                if let Some(task) = q.get_mut(id) {
                    match outcome {
                        Ok(result) => {
                            task.complete(result);
                            summary.completed += 1;
                        }
                        Err(err) => {
                            warn!(
                                target: "pixel_upscale::batch",
                                task = %id,
                                name = task.original_name(),
                                error = %err,
                                "task failed"
                            );
                            task.fail(err.to_string());
                            summary.failed += 1;
                        }
                    }
                }
            }
            self.sink.on_progress(Progress::new(index as u32 + 1, total));
        }

        drop(guard);
        let listing = QueueChanged {
            tasks: queue.lock().snapshot(),
        };
        self.sink.on_queue_changed(&listing);

        info!(
            target: "pixel_upscale::batch",
            completed = summary.completed,
            failed = summary.failed,
            skipped = summary.skipped,
            cancelled = summary.cancelled,
            "batch finished"
        );
        Ok(summary)
    }

    fn begin_run(&self) -> BatchResult<RunGuard<'_>> {
        let mut state = self.state.lock();
        if state.running {
            return Err(UpscaleError::already_running());
        }
        state.running = true;
        state.generation += 1;
        state.current_task = None;
        Ok(RunGuard {
            state: &self.state,
            generation: state.generation,
        })
    }
}
