//! Decoders that turn a GEDCOM byte stream into logical lines.
//!
//! One `LineDecoder` handles every encoding; the per-encoding behavior is a
//! closed strategy picked once at construction. The decoder is a fused
//! iterator of `Result<String>`: it yields each non-empty line, then `None`
//! forever after the end of the stream or the first error.
//!
//! # Line Breaks
//!
//! Any CR or LF code unit ends a line and zero-length lines are dropped, so
//! `CR LF`, `LF CR` and runs of blank lines all collapse to a single break.
//! Terminators never appear in the yielded text.
//!
//! # Example
//! ```
//! use gedcom_io_core::decode::LineDecoder;
//! use gedcom_io_core::encoding::Encoding;
//!
//! let bytes: &[u8] = b"0 HEAD\r\n1 CHAR ANSEL\r\n";
//! let lines: Vec<String> = LineDecoder::new(bytes, Encoding::Ansel)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(lines, vec!["0 HEAD", "1 CHAR ANSEL"]);
//! ```

use crate::ansel;
use crate::config::{DiacriticMode, ReadConfig};
use crate::encoding::Encoding;
use crate::error::{DecodeError, Error, Result};
use crate::progress::{CancellationToken, Progress, ProgressEvent, TranscodeSummary};
use crate::sniff::{Detection, UTF8_BOM};
use std::io::{self, BufRead, BufReader, Read};
use std::iter::FusedIterator;

const CR: u8 = 0x0D;
const LF: u8 = 0x0A;

/// Byte order mark as a decoded two-byte code unit.
const BOM_UNIT: u16 = 0xFEFF;

/// Reads single bytes from a buffered source and tracks the absolute offset.
///
/// # Invariants
/// - `position` equals the number of bytes handed out so far
struct ByteSource<R> {
    inner: BufReader<R>,
    position: u64,
}

impl<R: Read> ByteSource<R> {
    fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            position: 0,
        }
    }

    /// Next byte, or `None` at end of stream.
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        loop {
            let byte = match self.inner.fill_buf() {
                Ok(buf) => buf.first().copied(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if byte.is_some() {
                self.inner.consume(1);
                self.position += 1;
            }
            return Ok(byte);
        }
    }

    fn position(&self) -> u64 {
        self.position
    }
}

/// How raw bytes become characters for one encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineStrategy {
    Ascii,
    Ansel(DiacriticMode),
    DoubleByte { little_endian: bool },
    Utf8 { byte_order_mark: bool },
}

impl LineStrategy {
    fn select(encoding: Encoding, byte_order_mark: bool, diacritics: DiacriticMode) -> Self {
        match encoding {
            Encoding::Ascii => LineStrategy::Ascii,
            Encoding::Ansel => LineStrategy::Ansel(diacritics),
            Encoding::UnicodeBigEndian => LineStrategy::DoubleByte { little_endian: false },
            Encoding::UnicodeLittleEndian => LineStrategy::DoubleByte { little_endian: true },
            Encoding::Utf8 => LineStrategy::Utf8 { byte_order_mark },
        }
    }
}

/// Lazily decodes one byte stream into logical lines.
pub struct LineDecoder<'a, R> {
    source: ByteSource<R>,
    encoding: Encoding,
    strategy: LineStrategy,
    progress: Progress<'a>,

    // === Scratch buffers, reused across lines ===
    raw: Vec<u8>,
    units: Vec<u16>,

    done: bool,
}

impl<'a, R: Read> LineDecoder<'a, R> {
    /// Decode `reader` as `encoding` with default settings.
    pub fn new(reader: R, encoding: Encoding) -> Self {
        Self::with_config(reader, encoding, &ReadConfig::default())
    }

    /// Decode `reader` as `encoding`, taking the progress interval and
    /// diacritic mode from `config`.
    pub fn with_config(reader: R, encoding: Encoding, config: &ReadConfig) -> Self {
        Self::build(reader, encoding, false, config)
    }

    /// Decode `reader` the way a sniffer result says to.
    ///
    /// `reader` must start at the same byte the sniffer saw first.
    pub fn from_detection(reader: R, detection: &Detection, config: &ReadConfig) -> Self {
        Self::build(reader, detection.encoding, detection.byte_order_mark, config)
    }

    fn build(reader: R, encoding: Encoding, byte_order_mark: bool, config: &ReadConfig) -> Self {
        Self {
            source: ByteSource::new(reader),
            encoding,
            strategy: LineStrategy::select(encoding, byte_order_mark, config.diacritics),
            progress: Progress::new(config.progress_interval),
            raw: Vec::new(),
            units: Vec::new(),
            done: false,
        }
    }

    /// Call `callback` every progress interval and once at end of stream.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ProgressEvent) + 'a,
    {
        self.progress.set_callback(callback);
        self
    }

    /// Stop with `Error::Cancelled` at the next line once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.progress.set_cancellation(token);
        self
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Lines yielded so far.
    pub fn lines_read(&self) -> u64 {
        self.progress.lines()
    }

    /// Bytes consumed from the source so far.
    pub fn bytes_read(&self) -> u64 {
        self.source.position()
    }

    /// Whether the whole stream has been decoded.
    pub fn is_finished(&self) -> bool {
        self.progress.is_finished()
    }

    pub fn summary(&self) -> TranscodeSummary {
        self.progress.summary(self.encoding)
    }

    /// Decode the remaining stream into memory.
    pub fn read_all(mut self) -> Result<(Vec<String>, TranscodeSummary)> {
        let mut lines = Vec::new();
        for line in self.by_ref() {
            lines.push(line?);
        }
        Ok((lines, self.summary()))
    }

    /// 1-based number of the line currently being assembled.
    fn line_number(&self) -> u64 {
        self.progress.lines() + 1
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        self.progress.check_cancelled()?;

        let line = match self.strategy {
            LineStrategy::Ascii => self.read_single_byte_line(true, DiacriticMode::Raw)?,
            LineStrategy::Ansel(mode) => self.read_single_byte_line(false, mode)?,
            LineStrategy::DoubleByte { little_endian } => self.read_double_byte_line(little_endian)?,
            LineStrategy::Utf8 { byte_order_mark } => self.read_utf8_line(byte_order_mark)?,
        };

        match line {
            Some(_) => self.progress.record_line(self.source.position()),
            None => self.progress.record_bytes(self.source.position()),
        }
        Ok(line)
    }

    /// Collect the next non-empty run of bytes between CR/LF bytes into `raw`.
    ///
    /// Returns the offset of the run's first byte, or `None` at end of stream.
    fn fill_raw_line(&mut self, reject_extended: bool) -> Result<Option<u64>> {
        self.raw.clear();
        let mut start = self.source.position();

        while let Some(byte) = self.source.next_byte()? {
            match byte {
                CR | LF if self.raw.is_empty() => start = self.source.position(),
                CR | LF => return Ok(Some(start)),
                _ if reject_extended && byte >= 0x80 => {
                    return Err(DecodeError::NonAsciiByte {
                        byte,
                        line: self.line_number(),
                        offset: self.source.position() - 1,
                    }
                    .into());
                }
                _ => self.raw.push(byte),
            }
        }

        Ok((!self.raw.is_empty()).then_some(start))
    }

    fn read_single_byte_line(
        &mut self,
        reject_extended: bool,
        diacritics: DiacriticMode,
    ) -> Result<Option<String>> {
        if self.fill_raw_line(reject_extended)?.is_none() {
            return Ok(None);
        }

        let line = match diacritics {
            DiacriticMode::Raw => ansel::decode_line(&self.raw),
            DiacriticMode::Compose => ansel::to_unicode_line(&self.raw),
        };
        Ok(Some(line))
    }

    fn read_utf8_line(&mut self, byte_order_mark: bool) -> Result<Option<String>> {
        loop {
            let Some(mut start) = self.fill_raw_line(false)? else {
                return Ok(None);
            };

            let mut body = &self.raw[..];
            if start == 0 && body.starts_with(&UTF8_BOM) {
                if !byte_order_mark {
                    tracing::warn!("discarding UTF-8 byte order mark the sniffer did not report");
                }
                body = &body[UTF8_BOM.len()..];
                start += UTF8_BOM.len() as u64;
                if body.is_empty() {
                    continue;
                }
            }

            return match std::str::from_utf8(body) {
                Ok(text) => Ok(Some(text.to_string())),
                Err(e) => {
                    let line = self.line_number();
                    let offset = start + e.valid_up_to() as u64;
                    let err = match e.error_len() {
                        None => DecodeError::TruncatedUtf8 { line, offset },
                        Some(_) => DecodeError::InvalidUtf8 { line, offset },
                    };
                    Err(err.into())
                }
            };
        }
    }

    /// Next two-byte code unit, or `None` at a clean end of stream.
    fn next_unit(&mut self, little_endian: bool) -> Result<Option<u16>> {
        let Some(first) = self.source.next_byte()? else {
            return Ok(None);
        };
        let Some(second) = self.source.next_byte()? else {
            return Err(DecodeError::TruncatedCodeUnit {
                line: self.line_number(),
                offset: self.source.position() - 1,
            }
            .into());
        };

        let bytes = [first, second];
        Ok(Some(if little_endian {
            u16::from_le_bytes(bytes)
        } else {
            u16::from_be_bytes(bytes)
        }))
    }

    fn read_double_byte_line(&mut self, little_endian: bool) -> Result<Option<String>> {
        self.units.clear();

        while let Some(unit) = self.next_unit(little_endian)? {
            match unit {
                BOM_UNIT if self.source.position() == 2 => {}
                0x000D | 0x000A if self.units.is_empty() => {}
                0x000D | 0x000A => break,
                _ => self.units.push(unit),
            }
        }

        if self.units.is_empty() {
            return Ok(None);
        }

        let line = self.line_number();
        char::decode_utf16(self.units.iter().copied())
            .map(|unit| {
                unit.map_err(|e| {
                    Error::from(DecodeError::UnpairedSurrogate {
                        unit: e.unpaired_surrogate(),
                        line,
                    })
                })
            })
            .collect::<Result<String>>()
            .map(Some)
    }
}

impl<R: Read> Iterator for LineDecoder<'_, R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.done = true;
                self.progress.finish();
                tracing::debug!(
                    encoding = %self.encoding,
                    lines = self.progress.lines(),
                    bytes = self.progress.bytes(),
                    "finished decoding GEDCOM stream"
                );
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> FusedIterator for LineDecoder<'_, R> {}
