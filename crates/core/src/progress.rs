//! Progress reporting and cooperative cancellation for both transcoding
//! directions.
//!
//! # Design
//!
//! Decoders and encoders own one `Progress` each and thread it through their
//! per-line loop. It counts lines and bytes, fires the caller's callback every
//! `interval` lines plus once at completion, and polls the cancellation token
//! once per line. Nothing here is delivered asynchronously: cancellation
//! latency is bounded by one GEDCOM line.
//!
//! # Thread Safety
//!
//! `Progress` is NOT thread-safe and lives inside one decoder or encoder.
//! `CancellationToken` is the only handle meant to cross threads.

use crate::encoding::Encoding;
use crate::error::{Error, Result};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A snapshot of how far a read or write has got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Logical lines decoded or encoded so far
    pub lines_processed: u64,

    /// Bytes consumed from the source or produced to the sink so far
    pub bytes_processed: u64,

    /// Set on the final event only
    pub complete: bool,
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "progress [complete={}, lines={}, bytes={}]",
            self.complete, self.lines_processed, self.bytes_processed
        )
    }
}

/// Callback invoked with each progress event.
pub type ProgressCallback<'a> = Box<dyn FnMut(&ProgressEvent) + 'a>;

/// Shared flag a caller sets to stop a read or write at the next line.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the "not cancelled" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    ///
    /// Returns `true` if this call flipped the flag, `false` if it was already set.
    pub fn cancel(&self) -> bool {
        self.flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Final figures for one completed read or write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranscodeSummary {
    /// Encoding used for the stream
    pub encoding: Encoding,

    /// Logical lines transferred
    pub lines: u64,

    /// Bytes consumed (read) or produced (write)
    pub bytes: u64,

    /// Wall time from construction to completion
    pub elapsed: Duration,
}

impl TranscodeSummary {
    /// Throughput in bytes/second, or 0.0 when no time was measured.
    pub fn throughput_bps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.bytes as f64 / secs
        }
    }

    /// Export as `key=value` lines (for logs and tests).
    pub fn export_text(&self) -> String {
        format!(
            "encoding={}\n\
             lines={}\n\
             bytes={}\n\
             elapsed_ms={}\n",
            self.encoding.character_set_name(),
            self.lines,
            self.bytes,
            self.elapsed.as_millis(),
        )
    }
}

/// Per-stream counters, callback and cancellation check.
pub(crate) struct Progress<'a> {
    interval: u64,
    lines: u64,
    bytes: u64,
    started: Instant,
    finished: bool,
    callback: Option<ProgressCallback<'a>>,
    cancel: Option<CancellationToken>,
}

impl<'a> Progress<'a> {
    /// `interval` of zero is treated as one.
    pub(crate) fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            lines: 0,
            bytes: 0,
            started: Instant::now(),
            finished: false,
            callback: None,
            cancel: None,
        }
    }

    pub(crate) fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&ProgressEvent) + 'a,
    {
        self.callback = Some(Box::new(callback));
    }

    pub(crate) fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancel = Some(token);
    }

    /// Fail with `Cancelled` if the caller has asked us to stop.
    pub(crate) fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => {
                tracing::debug!(lines = self.lines, "transcoding cancelled by caller");
                Err(Error::Cancelled { lines: self.lines })
            }
            _ => Ok(()),
        }
    }

    /// Count one completed line; `bytes_total` is the running byte position.
    pub(crate) fn record_line(&mut self, bytes_total: u64) {
        self.lines += 1;
        self.bytes = bytes_total;
        if self.lines % self.interval == 0 {
            self.notify(false);
        }
    }

    /// Update the byte position without counting a line.
    pub(crate) fn record_bytes(&mut self, bytes_total: u64) {
        self.bytes = bytes_total;
    }

    /// Fire the completion event, once.
    pub(crate) fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.notify(true);
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn lines(&self) -> u64 {
        self.lines
    }

    pub(crate) fn bytes(&self) -> u64 {
        self.bytes
    }

    pub(crate) fn summary(&self, encoding: Encoding) -> TranscodeSummary {
        TranscodeSummary {
            encoding,
            lines: self.lines,
            bytes: self.bytes,
            elapsed: self.started.elapsed(),
        }
    }

    fn notify(&mut self, complete: bool) {
        if let Some(callback) = self.callback.as_mut() {
            callback(&ProgressEvent {
                lines_processed: self.lines,
                bytes_processed: self.bytes,
                complete,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_interval_and_completion() {
        let events = RefCell::new(Vec::new());
        {
            let mut progress = Progress::new(2);
            progress.set_callback(|e| events.borrow_mut().push(*e));
            for i in 1..=5 {
                progress.record_line(i * 10);
            }
            progress.finish();
            progress.finish();
        }

        let events = events.into_inner();
        let lines: Vec<_> = events.iter().map(|e| e.lines_processed).collect();
        assert_eq!(lines, vec![2, 4, 5]);
        assert!(events.last().unwrap().complete);
        assert_eq!(events.last().unwrap().bytes_processed, 50);
        assert!(events[..2].iter().all(|e| !e.complete));
    }

    #[test]
    fn test_zero_interval_is_every_line() {
        let count = RefCell::new(0);
        {
            let mut progress = Progress::new(0);
            progress.set_callback(|_| *count.borrow_mut() += 1);
            progress.record_line(1);
            progress.record_line(2);
        }
        assert_eq!(count.into_inner(), 2);
    }

    #[test]
    fn test_cancellation_token() {
        let token = CancellationToken::new();
        let shared = token.clone();
        assert!(!token.is_cancelled());
        assert!(shared.cancel());
        assert!(!shared.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_check_cancelled_reports_lines() {
        let token = CancellationToken::new();
        let mut progress = Progress::new(10);
        progress.set_cancellation(token.clone());
        progress.record_line(4);
        assert!(progress.check_cancelled().is_ok());

        token.cancel();
        let err = progress.check_cancelled().unwrap_err();
        assert!(matches!(err, Error::Cancelled { lines: 1 }));
    }

    #[test]
    fn test_summary_export() {
        let summary = TranscodeSummary {
            encoding: Encoding::Ansel,
            lines: 12,
            bytes: 340,
            elapsed: Duration::from_millis(0),
        };
        let text = summary.export_text();
        assert!(text.contains("encoding=ANSEL"));
        assert!(text.contains("lines=12"));
        assert!(text.contains("bytes=340"));
        assert_eq!(summary.throughput_bps(), 0.0);
    }

    #[test]
    fn test_event_display() {
        let event = ProgressEvent {
            lines_processed: 3,
            bytes_processed: 42,
            complete: true,
        };
        assert_eq!(event.to_string(), "progress [complete=true, lines=3, bytes=42]");
    }
}
