// src/engine/tasks.rs
//
// Batch queue: ordered upscale tasks and their lifecycle.
//
// Insertion order is processing order and display order. Ids come from a
// per-queue counter, so they are unique for the queue's whole lifetime even
// after removals.

use crate::engine::buffer::{PixelBuffer, Resolution};
use crate::engine::pipeline::ProcessingResult;
use crate::error::UpscaleError;
use std::fmt;
use std::sync::Arc;

type QueueResult<T> = std::result::Result<T, UpscaleError>;

/// Scale the queue reports in `after_resolution` until configured otherwise.
pub const DEFAULT_DISPLAY_SCALE: f64 = 2.0;

/// Opaque task identifier, unique within one [`BatchQueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Rebuild an id from its raw value, e.g. one echoed back by a host UI.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle: `Pending -> Processing -> Completed | Error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl TaskStatus {
    /// Machine-readable status code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Human-readable label shown in queue listings
    pub fn label(&self) -> &'static str {
        status_label(self.as_str())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// Map a status code to its display label; unknown codes become `"unknown"`.
pub fn status_label(code: &str) -> &'static str {
    match code {
        "pending" => "waiting",
        "processing" => "processing",
        "completed" => "done",
        "error" => "failed",
        _ => "unknown",
    }
}

/// One image's unit of work. Owned exclusively by a [`BatchQueue`].
#[derive(Debug)]
pub struct UpscaleTask {
    id: TaskId,
    /// Shared so the processor can run the pipeline without holding the queue
    source: Arc<PixelBuffer>,
    original_name: String,
    original_size_bytes: u64,
    status: TaskStatus,
    result: Option<ProcessingResult>,
    error: Option<String>,
}

impl UpscaleTask {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn source(&self) -> &PixelBuffer {
        &self.source
    }

    pub(crate) fn shared_source(&self) -> Arc<PixelBuffer> {
        Arc::clone(&self.source)
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn original_size_bytes(&self) -> u64 {
        self.original_size_bytes
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn result(&self) -> Option<&ProcessingResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn mark_processing(&mut self) {
        self.status = TaskStatus::Processing;
    }

    pub(crate) fn complete(&mut self, result: ProcessingResult) {
        self.status = TaskStatus::Completed;
        self.result = Some(result);
        self.error = None;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.status = TaskStatus::Error;
        self.result = None;
        self.error = Some(message);
    }

    fn snapshot(&self, display_scale: f64) -> TaskSnapshot {
        let before = self.source.resolution();
        TaskSnapshot {
            id: self.id,
            name: self.original_name.clone(),
            size_bytes: self.original_size_bytes,
            status: self.status,
            before_resolution: before,
            after_resolution: before.scaled(display_scale),
            error: self.error.clone(),
        }
    }
}

/// Display row for one task.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub name: String,
    pub size_bytes: u64,
    pub status: TaskStatus,
    pub before_resolution: Resolution,
    /// Source resolution times the queue's display scale
    pub after_resolution: Resolution,
    pub error: Option<String>,
}

impl TaskSnapshot {
    /// Size in kilobytes (1000 bytes), e.g. `"12.345KB"`.
    pub fn size_human(&self) -> String {
        format!("{}KB", self.size_bytes as f64 / 1000.0)
    }

    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }
}

/// Ordered collection of upscale tasks.
#[derive(Debug)]
pub struct BatchQueue {
    tasks: Vec<UpscaleTask>,
    next_id: u64,
    scale_factor: f64,
}

impl Default for BatchQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchQueue {
    pub fn new() -> Self {
        Self::with_scale_factor(DEFAULT_DISPLAY_SCALE)
    }

    pub fn with_scale_factor(scale_factor: f64) -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
            scale_factor,
        }
    }

    /// Scale used for the display-only `after_resolution` field.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
    }

    /// Append a `Pending` task and return its id.
    pub fn enqueue(
        &mut self,
        source: PixelBuffer,
        name: impl Into<String>,
        size_bytes: u64,
    ) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(UpscaleTask {
            id,
            source: Arc::new(source),
            original_name: name.into(),
            original_size_bytes: size_bytes,
            status: TaskStatus::Pending,
            result: None,
            error: None,
        });
        id
    }

    /// Remove a task, keeping the relative order of the rest.
    ///
    /// Fails with `TaskBusy` while the task is `Processing` and with
    /// `TaskNotFound` for an unknown id; the queue is unchanged on failure.
    pub fn remove(&mut self, id: TaskId) -> QueueResult<UpscaleTask> {
        let pos = self
            .position(id)
            .ok_or_else(|| UpscaleError::task_not_found(id))?;
        if self.tasks[pos].status == TaskStatus::Processing {
            return Err(UpscaleError::task_busy(id));
        }
        Ok(self.tasks.remove(pos))
    }

    pub fn snapshot(&self) -> Vec<TaskSnapshot> {
        self.tasks
            .iter()
            .map(|t| t.snapshot(self.scale_factor))
            .collect()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count()
    }

    /// Completed tasks and their results, in queue order.
    pub fn completed(&self) -> impl Iterator<Item = (&UpscaleTask, &ProcessingResult)> {
        self.tasks
            .iter()
            .filter_map(|t| t.result.as_ref().map(|r| (t, r)))
    }

    pub fn get(&self, id: TaskId) -> Option<&UpscaleTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut UpscaleTask> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UpscaleTask> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }
}
