//! Background compression of rotated log files
//!
//! Rotation hands backup paths to a single worker thread and never waits for
//! the result. Once the worker exists, retention deletes go through it too, so
//! a delete always runs after any compression queued before it. A path that no
//! longer exists when its job starts is skipped, which makes duplicate
//! submissions harmless.

use super::rotating_file::RotationStats;
use crate::core::error::{LoggerError, Result};
use crate::core::fallback::SharedFallback;
use crossbeam_channel::{unbounded, Sender};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

const BUFFER_SIZE: usize = 64 * 1024;

enum Job {
    Compress(PathBuf),
    Remove(PathBuf),
}

pub(crate) struct CompressionWorker {
    log_name: String,
    sender: Option<Sender<Job>>,
    handle: Option<thread::JoinHandle<()>>,
    fallback: SharedFallback,
}

impl CompressionWorker {
    pub(crate) fn spawn(
        log_name: &str,
        fallback: SharedFallback,
        stats: Arc<RotationStats>,
    ) -> Result<Self> {
        let (sender, receiver) = unbounded::<Job>();
        let worker_fallback = Arc::clone(&fallback);

        let handle = thread::Builder::new()
            .name(format!("{}-compress", log_name))
            .spawn(move || {
                for job in receiver.iter() {
                    let outcome = match job {
                        Job::Compress(path) if path.exists() => compress_file(&path).map(|done| {
                            if done {
                                stats.record_compressed();
                            }
                        }),
                        Job::Compress(_) => Ok(()),
                        Job::Remove(path) => remove_backup(&path),
                    };
                    if let Err(e) = outcome {
                        stats.record_fault();
                        worker_fallback.report(&e);
                    }
                }
            })
            .map_err(|e| {
                LoggerError::file_rotation(
                    log_name,
                    format!("Failed to start compression worker: {}", e),
                )
            })?;

        Ok(Self {
            log_name: log_name.to_string(),
            sender: Some(sender),
            handle: Some(handle),
            fallback,
        })
    }

    /// Queue a backup for compression
    pub(crate) fn compress(&self, path: PathBuf) -> bool {
        self.send(Job::Compress(path))
    }

    /// Queue a backup for deletion behind any pending compression
    pub(crate) fn remove(&self, path: PathBuf) -> bool {
        self.send(Job::Remove(path))
    }

    fn send(&self, job: Job) -> bool {
        match self.sender {
            Some(ref sender) => sender.send(job).is_ok(),
            None => false,
        }
    }
}

impl Drop for CompressionWorker {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain pending jobs and exit
        drop(self.sender.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                self.fallback.report(&LoggerError::file_rotation(
                    self.log_name.as_str(),
                    "Compression worker panicked during shutdown",
                ));
            }
        }
    }
}

/// Path of the compressed copy of `path`
pub(crate) fn compressed_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".gz");
    path.with_file_name(name)
}

/// Delete a backup together with its compressed copy
pub(crate) fn remove_backup(path: &Path) -> Result<()> {
    for target in [path.to_path_buf(), compressed_path(path)] {
        match fs::remove_file(&target) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(LoggerError::file_rotation(
                    target.display().to_string(),
                    format!("Failed to remove old backup: {}", e),
                ))
            }
        }
    }
    Ok(())
}

/// Gzip `path` next to itself, then remove the original
///
/// The compressed data is written to a temporary file and renamed into place,
/// so a partial `.gz` never exists. The original is removed only after the
/// rename succeeds. Returns `false` if the original was deleted meanwhile, in
/// which case the compressed copy is discarded too.
pub(crate) fn compress_file(path: &Path) -> Result<bool> {
    let gz_path = compressed_path(path);
    let mut temp_name = gz_path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_gz_path = gz_path.with_file_name(temp_name);

    let fail = |message: String| LoggerError::file_rotation(path.display().to_string(), message);

    let input = File::open(path)
        .map_err(|e| fail(format!("Failed to open file for compression: {}", e)))?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, input);

    let output = File::create(&temp_gz_path).map_err(|e| {
        fail(format!(
            "Failed to create temporary compressed file {}: {}",
            temp_gz_path.display(),
            e
        ))
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(BUFFER_SIZE, output),
        flate2::Compression::default(),
    );

    let streamed = (|| -> io::Result<()> {
        let mut buffer = vec![0u8; BUFFER_SIZE];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            encoder.write_all(&buffer[..bytes_read])?;
        }
        encoder.finish()?.flush()
    })();

    if let Err(e) = streamed {
        let _ = fs::remove_file(&temp_gz_path);
        return Err(fail(format!("Failed to compress data: {}", e)));
    }

    if let Err(e) = fs::rename(&temp_gz_path, &gz_path) {
        let _ = fs::remove_file(&temp_gz_path);
        return Err(fail(format!(
            "Failed to rename compressed file to {}: {}",
            gz_path.display(),
            e
        )));
    }

    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        // Evicted by retention while compressing
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            remove_backup(&gz_path)?;
            Ok(false)
        }
        // Both copies now exist; the next retention pass retries the removal
        Err(e) => Err(fail(format!("Compressed but failed to remove original: {}", e))),
    }
}
