// src/engine/export.rs
//
// Writing finished results to disk as PNG.

use crate::engine::encoder::encode;
use crate::engine::pipeline::ProcessingResult;
use crate::engine::tasks::BatchQueue;
use crate::error::UpscaleError;
use crate::ops::OutputFormat;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;
use tracing::{debug, info};

type ExportResult<T> = std::result::Result<T, UpscaleError>;

/// Stem used when a task name has nothing usable left.
const FALLBACK_STEM: &str = "image";

/// Download name for an upscaled image:
/// `photo.jpg` at 2x becomes `photo-2x-<timestamp_ms>.png`.
///
/// Only the final path component of `original_name` is kept (either `/` or
/// `\` separates), so the result is always a bare file name. Only the last
/// extension is dropped.
pub fn output_file_name(original_name: &str, scale_factor: f64, timestamp_ms: u64) -> String {
    format!(
        "{}-{}x-{}.png",
        file_stem(original_name),
        scale_factor,
        timestamp_ms
    )
}

fn file_stem(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match strip_extension(base) {
        "" | "." | ".." => FALLBACK_STEM,
        stem => stem,
    }
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() => &name[..dot],
        _ => name,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Encode `result` as PNG and write it into `dir`, creating `dir` if needed.
///
/// An existing file is never overwritten: the timestamp is bumped past any
/// name already present in `dir`.
pub fn save_result(
    result: &ProcessingResult,
    dir: &Path,
    original_name: &str,
) -> ExportResult<PathBuf> {
    let file_name = free_name(dir, original_name, result.scale_factor(), now_ms(), |_| false);
    write_png(result, dir, &file_name)
}

/// First name at or after `timestamp_ms` that is neither `taken` nor on disk.
fn free_name(
    dir: &Path,
    original_name: &str,
    scale_factor: f64,
    timestamp_ms: u64,
    taken: impl Fn(&str) -> bool,
) -> String {
    let mut stamp = timestamp_ms;
    loop {
        let name = output_file_name(original_name, scale_factor, stamp);
        if !taken(&name) && !dir.join(&name).exists() {
            return name;
        }
        stamp = stamp.wrapping_add(1);
    }
}

/// Write every completed task in queue order.
///
/// Fails with `NothingToExport` when no task has completed. Names that
/// would collide within one export, or with a file already in `dir`, get
/// the timestamp bumped.
pub fn export_completed(queue: &BatchQueue, dir: &Path) -> ExportResult<Vec<PathBuf>> {
    if queue.completed_count() == 0 {
        return Err(UpscaleError::nothing_to_export());
    }

    let timestamp = now_ms();
    let mut used = HashSet::new();
    let mut written = Vec::with_capacity(queue.completed_count());
    for (task, result) in queue.completed() {
        let file_name = free_name(
            dir,
            task.original_name(),
            result.scale_factor(),
            timestamp,
            |name| used.contains(name),
        );
        used.insert(file_name.clone());
        written.push(write_png(result, dir, &file_name)?);
    }

    info!(
        target: "pixel_upscale::export",
        count = written.len(),
        dir = %dir.display(),
        "exported completed images"
    );
    Ok(written)
}

fn write_png(result: &ProcessingResult, dir: &Path, file_name: &str) -> ExportResult<PathBuf> {
    let bytes = encode(result.output(), OutputFormat::Png)?;
    fs::create_dir_all(dir)
        .map_err(|e| UpscaleError::file_write_failed(dir.display().to_string(), e))?;
    let path = dir.join(file_name);

    // Write to a temp file beside the target, then rename it into place.
    // The temp file is removed on drop if any step fails.
    let mut temp = NamedTempFile::new_in(dir)
        .map_err(|e| UpscaleError::file_write_failed(dir.display().to_string(), e))?;
    temp.write_all(&bytes)
        .map_err(|e| UpscaleError::file_write_failed(temp.path().display().to_string(), e))?;
    temp.as_file_mut()
        .sync_all()
        .map_err(|e| UpscaleError::file_write_failed(temp.path().display().to_string(), e))?;
    // Never replaces an existing file
    temp.persist_noclobber(&path)
        .map_err(|e| UpscaleError::file_write_failed(path.display().to_string(), e.error))?;

    debug!(
        target: "pixel_upscale::export",
        path = %path.display(),
        bytes = bytes.len(),
        "wrote image"
    );
    Ok(path)
}
