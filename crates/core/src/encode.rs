//! Encoders that turn logical lines back into GEDCOM bytes.
//!
//! Mirrors `decode`: one `LineEncoder` with a closed per-encoding strategy.
//! Every line is followed by exactly one terminator, encoded at the same
//! byte width as the line body. No byte order mark is ever written.
//!
//! # Lossy Cases
//! - ASCII: characters above U+007F become `'?'`
//! - ANSEL: characters outside the table degrade to their low byte
//!
//! # Example
//! ```
//! use gedcom_io_core::encode::LineEncoder;
//! use gedcom_io_core::encoding::{Encoding, LineTerminator};
//!
//! let mut encoder = LineEncoder::new(Vec::new(), Encoding::Ansel, LineTerminator::Crlf);
//! encoder.write_lines(["0 Hello"]).unwrap();
//! let bytes = encoder.into_inner().unwrap();
//! assert_eq!(bytes, b"0 Hello\r\n");
//! ```

use crate::ansel;
use crate::config::{DiacriticMode, WriteConfig};
use crate::encoding::{Encoding, LineTerminator};
use crate::error::{EncodeError, Result};
use crate::progress::{CancellationToken, Progress, ProgressEvent, TranscodeSummary};
use std::io::{BufWriter, Write};

/// Append `text` to `out` in `encoding`.
///
/// Used for both line bodies and terminators, so the two always share one
/// byte width.
pub fn encode_text(text: &str, encoding: Encoding, diacritics: DiacriticMode, out: &mut Vec<u8>) {
    match encoding {
        Encoding::Ascii => {
            out.extend(text.chars().map(|c| if c.is_ascii() { c as u8 } else { b'?' }));
        }
        Encoding::Ansel => match diacritics {
            DiacriticMode::Raw => out.extend(text.chars().map(ansel::encode)),
            DiacriticMode::Compose => out.extend(ansel::to_ansel_line(text)),
        },
        Encoding::UnicodeBigEndian => {
            for unit in text.encode_utf16() {
                out.extend_from_slice(&unit.to_be_bytes());
            }
        }
        Encoding::UnicodeLittleEndian => {
            for unit in text.encode_utf16() {
                out.extend_from_slice(&unit.to_le_bytes());
            }
        }
        Encoding::Utf8 => out.extend_from_slice(text.as_bytes()),
    }
}

/// Writes logical lines to a byte sink in one encoding.
pub struct LineEncoder<'a, W: Write> {
    sink: BufWriter<W>,
    encoding: Encoding,
    terminator: LineTerminator,
    diacritics: DiacriticMode,
    progress: Progress<'a>,

    /// Encoded terminator, computed once
    terminator_bytes: Vec<u8>,
    /// Scratch buffer for one encoded line
    line_bytes: Vec<u8>,
    bytes_written: u64,
}

impl<'a, W: Write> LineEncoder<'a, W> {
    /// Encode to `writer` with default settings.
    pub fn new(writer: W, encoding: Encoding, terminator: LineTerminator) -> Self {
        Self::with_config(writer, encoding, terminator, &WriteConfig::default())
    }

    /// Encode to `writer`, taking the progress interval and diacritic mode
    /// from `config`. The config's own encoding and terminator are ignored.
    pub fn with_config(
        writer: W,
        encoding: Encoding,
        terminator: LineTerminator,
        config: &WriteConfig,
    ) -> Self {
        let mut terminator_bytes = Vec::with_capacity(4);
        encode_text(terminator.as_str(), encoding, DiacriticMode::Raw, &mut terminator_bytes);

        Self {
            sink: BufWriter::new(writer),
            encoding,
            terminator,
            diacritics: config.diacritics,
            progress: Progress::new(config.progress_interval),
            terminator_bytes,
            line_bytes: Vec::new(),
            bytes_written: 0,
        }
    }

    /// Call `callback` every progress interval and once when finished.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ProgressEvent) + 'a,
    {
        self.progress.set_callback(callback);
        self
    }

    /// Stop with `Error::Cancelled` before the next line once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.progress.set_cancellation(token);
        self
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn terminator(&self) -> LineTerminator {
        self.terminator
    }

    pub fn lines_written(&self) -> u64 {
        self.progress.lines()
    }

    /// Bytes handed to the sink so far (some may still be buffered).
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Encode and write one line followed by its terminator.
    ///
    /// # Errors
    /// - `Error::Cancelled` if the token was cancelled; nothing is written
    /// - `EncodeError::EmbeddedTerminator` if `line` holds a CR or LF;
    ///   nothing is written
    /// - `Error::Io` if the sink fails
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.progress.check_cancelled()?;
        if line.contains(['\r', '\n']) {
            return Err(EncodeError::EmbeddedTerminator {
                line: self.progress.lines() + 1,
            }
            .into());
        }

        self.line_bytes.clear();
        encode_text(line, self.encoding, self.diacritics, &mut self.line_bytes);
        self.line_bytes.extend_from_slice(&self.terminator_bytes);

        self.sink.write_all(&self.line_bytes)?;
        self.bytes_written += self.line_bytes.len() as u64;
        self.progress.record_line(self.bytes_written);
        Ok(())
    }

    /// Write every line, then flush and report.
    pub fn write_lines<I, S>(&mut self, lines: I) -> Result<TranscodeSummary>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.write_line(line.as_ref())?;
        }
        self.finish()
    }

    /// Flush the sink and fire the completion event.
    pub fn finish(&mut self) -> Result<TranscodeSummary> {
        self.sink.flush()?;
        if !self.progress.is_finished() {
            self.progress.finish();
            tracing::debug!(
                encoding = %self.encoding,
                terminator = ?self.terminator,
                lines = self.progress.lines(),
                bytes = self.bytes_written,
                "finished encoding GEDCOM stream"
            );
        }
        Ok(self.progress.summary(self.encoding))
    }

    /// Flush and give back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.sink.into_inner().map_err(|e| e.into_error().into())
    }
}
