//! Logging setup
//!
//! The frontend logs through `tracing`. On the console, formatted output is
//! routed into the system log one line at a time by [`LineBufferedWriter`].

use crate::config::{LogLevel, LoggingConfig};
use crate::error::{FrontendError, Result};
use std::io::{self, Write};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Destination for complete log lines
pub trait LogSink: Send {
    fn emit(&mut self, line: &str);
}

/// Sink that writes lines to the host's stderr
#[derive(Debug, Default)]
pub struct StderrSink;

impl LogSink for StderrSink {
    fn emit(&mut self, line: &str) {
        let _ = io::stderr().write_all(line.as_bytes());
    }
}

/// Line buffering in front of a [`LogSink`].
///
/// Bytes accumulate until a write leaves a trailing newline in the buffer or
/// the buffer fills up, then the buffered text goes to the sink in one piece.
/// Anything that does not fit in the remaining space is dropped, and every
/// write reports its full length as consumed.
pub struct LineBufferedWriter<S: LogSink> {
    line: Vec<u8>,
    capacity: usize,
    sink: S,
}

impl<S: LogSink> LineBufferedWriter<S> {
    pub fn new(capacity: usize, sink: S) -> Self {
        Self {
            line: Vec::with_capacity(capacity),
            capacity,
            sink,
        }
    }

    /// Bytes currently waiting for a newline
    pub fn pending(&self) -> usize {
        self.line.len()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn limit(&self) -> usize {
        self.capacity.saturating_sub(2)
    }

    fn emit_line(&mut self) {
        let text = String::from_utf8_lossy(&self.line);
        self.sink.emit(&text);
        self.line.clear();
    }
}

impl<S: LogSink> Write for LineBufferedWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.limit().saturating_sub(self.line.len());
        let take = buf.len().min(room);
        self.line.extend_from_slice(&buf[..take]);

        if self.line.last() == Some(&b'\n') || self.line.len() >= self.limit() {
            self.emit_line();
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Partial lines stay buffered until their newline arrives
        Ok(())
    }
}

fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()))
}

/// Install a subscriber that writes through a line buffer into `sink`
pub fn init_with_sink<S: LogSink + 'static>(config: &LoggingConfig, sink: S) -> Result<()> {
    let writer = LineBufferedWriter::new(config.line_buffer, sink);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config.level))
        .with_ansi(false)
        .with_writer(Mutex::new(writer))
        .try_init()
        .map_err(|e| FrontendError::Config(e.to_string()))
}
