//! Buffered formatted output.
//!
//! Strategies append fixed-width column fragments at a report level; the
//! direction core flushes the buffer once per inner iteration. Flushed text
//! is retained so tests can inspect exactly what was printed, and optionally
//! forwarded to a sink (stderr, a file).

use std::fmt::Write as FmtWrite;
use std::io::Write;
use std::sync::Mutex;

/// How much per-solve detail to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReportLevel {
    /// One summary line per outer iteration.
    PerIteration = 0,
    /// Additionally, one line per inner iteration of the direction
    /// computation.
    PerInnerIteration = 1,
}

/// A line buffer with a print-level threshold.
pub struct Reporter {
    threshold: ReportLevel,
    buffer: Mutex<String>,
    flushed: Mutex<String>,
    sink: Mutex<Option<Box<dyn Write + Send>>>,
}

impl Reporter {
    /// Reporter that keeps everything in memory.
    pub fn new(threshold: ReportLevel) -> Self {
        Self {
            threshold,
            buffer: Mutex::new(String::with_capacity(4 * 1024)),
            flushed: Mutex::new(String::new()),
            sink: Mutex::new(None),
        }
    }

    /// Reporter that also forwards flushed text to `sink`.
    pub fn with_sink(threshold: ReportLevel, sink: Box<dyn Write + Send>) -> Self {
        let reporter = Self::new(threshold);
        *reporter.sink.lock().unwrap() = Some(sink);
        reporter
    }

    /// Whether output at `level` is enabled.
    pub fn enabled(&self, level: ReportLevel) -> bool {
        level <= self.threshold
    }

    /// Append formatted text to the buffer if `level` is enabled.
    ///
    /// No newline is implied; callers compose full lines from column
    /// fragments the way C's printf does.
    pub fn printf(&self, level: ReportLevel, args: std::fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        let mut buf = self.buffer.lock().unwrap();
        let _ = buf.write_fmt(args);
    }

    /// Move buffered text to the retained output and any sink.
    pub fn flush_buffer(&self) {
        let mut buf = self.buffer.lock().unwrap();
        if buf.is_empty() {
            return;
        }
        if let Some(sink) = self.sink.lock().unwrap().as_mut() {
            let _ = sink.write_all(buf.as_bytes());
            let _ = sink.flush();
        }
        self.flushed.lock().unwrap().push_str(&buf);
        buf.clear();
    }

    /// Everything printed so far, flushed or not.
    pub fn output(&self) -> String {
        let mut out = self.flushed.lock().unwrap().clone();
        out.push_str(&self.buffer.lock().unwrap());
        out
    }

    /// Output split into lines.
    pub fn lines(&self) -> Vec<String> {
        self.output().lines().map(|s| s.to_string()).collect()
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(ReportLevel::PerIteration)
    }
}
