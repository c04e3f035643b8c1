//! JSONL file writer for pipeline events.
//!
//! Each [`PipelineEvent`] is serialized as a single JSON line with a `type`
//! field and `timestamp`, appended to the file by a background writer thread.

use math_comic_application::{PipelineEvent, PipelineLogger};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::warn;

/// JSONL pipeline logger that writes one JSON object per line.
///
/// `log` only enqueues: when the bounded queue is full the event is dropped
/// and counted. The file is flushed whenever the queue drains and on `Drop`.
pub struct JsonlPipelineLogger {
    sender: Mutex<Option<SyncSender<String>>>,
    writer: Option<JoinHandle<()>>,
    dropped: Arc<AtomicU64>,
    path: PathBuf,
}

impl JsonlPipelineLogger {
    /// Create a new logger appending to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>, capacity: usize) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event log file {}: {}", path.display(), e);
                return None;
            }
        };

        let (sender, receiver) = sync_channel(capacity.max(1));
        let writer = std::thread::Builder::new()
            .name("math-comic-events".to_string())
            .spawn(move || write_loop(receiver, BufWriter::new(file)));
        let writer = match writer {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Could not start event log writer: {}", e);
                return None;
            }
        };

        Some(Self {
            sender: Mutex::new(Some(sender)),
            writer: Some(writer),
            dropped: Arc::new(AtomicU64::new(0)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Events discarded because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

fn write_loop(receiver: Receiver<String>, mut writer: BufWriter<File>) {
    while let Ok(line) = receiver.recv() {
        let _ = writeln!(writer, "{}", line);
        while let Ok(line) = receiver.try_recv() {
            let _ = writeln!(writer, "{}", line);
        }
        let _ = writer.flush();
    }
    let _ = writer.flush();
}

impl PipelineLogger for JsonlPipelineLogger {
    fn log(&self, event: PipelineEvent) {
        let Ok(line) = serde_json::to_string(&event) else {
            return;
        };

        let Ok(guard) = self.sender.lock() else {
            return;
        };
        let Some(sender) = guard.as_ref() else {
            return;
        };

        match sender.try_send(line) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

impl Drop for JsonlPipelineLogger {
    fn drop(&mut self) {
        // Closing the channel lets the writer drain, flush and exit
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        if let Some(handle) = self.writer.take() {
            let _ = handle.join();
        }
        let dropped = self.dropped();
        if dropped > 0 {
            warn!(dropped, path = %self.path.display(), "Pipeline events dropped (queue full)");
        }
    }
}
