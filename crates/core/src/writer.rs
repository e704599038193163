//! Writing already-decoded GEDCOM lines back to bytes.
//!
//! When the caller does not name a target encoding, the content picks one:
//! the first line that reads exactly `1 CHAR ASCII`, `1 CHAR UTF-8` or
//! `1 CHAR UNICODE` wins, otherwise ANSEL. The terminator falls back to the
//! platform's native line ending.

use crate::config::WriteConfig;
use crate::encode::LineEncoder;
use crate::encoding::{Encoding, LineTerminator};
use crate::error::Result;
use crate::progress::TranscodeSummary;
use std::io::Write;

/// Pick the output encoding from the content's `1 CHAR` line.
///
/// `UNICODE` does not say which byte order; `unicode_little_endian` decides.
pub fn default_encoding<S: AsRef<str>>(lines: &[S], unicode_little_endian: bool) -> Encoding {
    let declared = lines.iter().find_map(|line| match line.as_ref() {
        "1 CHAR ASCII" => Some(Encoding::Ascii),
        "1 CHAR UTF-8" => Some(Encoding::Utf8),
        "1 CHAR UNICODE" if unicode_little_endian => Some(Encoding::UnicodeLittleEndian),
        "1 CHAR UNICODE" => Some(Encoding::UnicodeBigEndian),
        _ => None,
    });
    declared.unwrap_or(Encoding::Ansel)
}

/// Writes whole line sequences using a `WriteConfig`.
#[derive(Debug, Clone, Default)]
pub struct GedcomWriter {
    config: WriteConfig,
}

impl GedcomWriter {
    /// A writer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// A writer with explicit settings, validated up front.
    pub fn with_config(config: WriteConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &WriteConfig {
        &self.config
    }

    /// The encoding and terminator that writing `lines` would use.
    pub fn resolve<S: AsRef<str>>(&self, lines: &[S]) -> (Encoding, LineTerminator) {
        let encoding = self
            .config
            .encoding
            .unwrap_or_else(|| default_encoding(lines, self.config.unicode_little_endian));
        let terminator = self.config.terminator.unwrap_or_else(LineTerminator::native);
        (encoding, terminator)
    }

    /// An encoder for `lines`, so the caller can attach progress or
    /// cancellation before writing.
    pub fn encoder<'a, W: Write, S: AsRef<str>>(&self, writer: W, lines: &[S]) -> LineEncoder<'a, W> {
        let (encoding, terminator) = self.resolve(lines);
        tracing::debug!(%encoding, ?terminator, explicit = self.config.encoding.is_some(), "selected output encoding");
        LineEncoder::with_config(writer, encoding, terminator, &self.config)
    }

    /// Encode every line to `writer`.
    pub fn write<W: Write, S: AsRef<str>>(&self, writer: W, lines: &[S]) -> Result<TranscodeSummary> {
        self.encoder(writer, lines).write_lines(lines)
    }

    /// Encode every line into a new buffer.
    pub fn to_bytes<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<u8>> {
        let mut encoder = self.encoder(Vec::new(), lines);
        encoder.write_lines(lines)?;
        encoder.into_inner()
    }
}
