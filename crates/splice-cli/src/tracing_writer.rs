//! File sink for the log file layer.
//!
//! The terminal layer writes to stderr directly (stdout carries the
//! transformed text). The file layer appends to `<dir>/splice.log` through
//! [`LogFile`], which buffers one event per writer and flushes it under a
//! lock so lines from concurrent tasks never interleave. Build the layer with
//! `.with_ansi(false)`.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Log file name inside the log directory.
pub const LOG_FILE_NAME: &str = "splice.log";

/// Shared append-only log file; a [`MakeWriter`](tracing_subscriber::fmt::MakeWriter).
#[derive(Clone)]
pub struct LogFile {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl LogFile {
    /// Opens `<log_dir>/splice.log` for appending, creating the directory.
    pub fn open(log_dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(log_dir)?;
        let path = log_dir.join(LOG_FILE_NAME);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    /// Full path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogFile {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter {
            file: Arc::clone(&self.file),
            buf: Vec::with_capacity(256),
        }
    }
}

/// Buffers one formatted event and appends it on drop.
pub struct EventWriter {
    file: Arc<Mutex<File>>,
    buf: Vec<u8>,
}

impl Write for EventWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }

        let mut file = self.file.lock();
        let _ = file.write_all(&self.buf);
        let _ = file.flush();
    }
}
