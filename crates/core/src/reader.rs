//! Opening an unlabeled GEDCOM byte stream.
//!
//! `GedcomReader::open` buffers a bounded prefix, sniffs the encoding from it,
//! then replays the prefix ahead of the rest of the stream into the matching
//! decoder. The caller never sees the sniff buffer; the first line it gets is
//! the first line of the file.

use crate::config::ReadConfig;
use crate::decode::LineDecoder;
use crate::encoding::Encoding;
use crate::error::Result;
use crate::progress::{CancellationToken, ProgressEvent, TranscodeSummary};
use crate::sniff::{Detection, Sniffer};
use std::io::{Chain, Cursor, Read};
use std::iter::FusedIterator;

/// Source type after the sniff buffer has been put back in front.
pub type ReplaySource<R> = Chain<Cursor<Vec<u8>>, R>;

/// Reads logical lines from a GEDCOM stream whose encoding is detected on open.
pub struct GedcomReader<'a, R: Read> {
    detection: Detection,
    decoder: LineDecoder<'a, ReplaySource<R>>,
}

impl<'a, R: Read> GedcomReader<'a, R> {
    /// Open with default settings.
    pub fn open(reader: R) -> Result<Self> {
        Self::open_with_config(reader, &ReadConfig::default())
    }

    /// Sniff `reader` and prepare a decoder for it.
    ///
    /// # Errors
    /// - `Error::Config` if `config` is invalid
    /// - `Error::Io` if the prefix cannot be read
    /// - `Error::Format` / `Error::UnsupportedCharset` from detection
    pub fn open_with_config(mut reader: R, config: &ReadConfig) -> Result<Self> {
        config.validate()?;

        let prefix = read_prefix(&mut reader, config.sniff_buffer_bytes)?;
        // A short read means the prefix is the whole stream
        let at_eof = prefix.len() < config.sniff_buffer_bytes;
        let detection = Sniffer::from_config(config).detect(&prefix, at_eof)?;

        let source = Cursor::new(prefix).chain(reader);
        let decoder = LineDecoder::from_detection(source, &detection, config);
        Ok(Self { detection, decoder })
    }

    /// Call `callback` every progress interval and once at end of stream.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ProgressEvent) + 'a,
    {
        self.decoder = self.decoder.on_progress(callback);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.decoder = self.decoder.with_cancellation(token);
        self
    }

    /// How the encoding was detected.
    pub fn detection(&self) -> &Detection {
        &self.detection
    }

    pub fn encoding(&self) -> Encoding {
        self.detection.encoding
    }

    pub fn lines_read(&self) -> u64 {
        self.decoder.lines_read()
    }

    /// Decode the remaining stream into memory.
    pub fn read_all(self) -> Result<(Vec<String>, TranscodeSummary)> {
        self.decoder.read_all()
    }
}

impl<R: Read> Iterator for GedcomReader<'_, R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.next()
    }
}

impl<R: Read> FusedIterator for GedcomReader<'_, R> {}

/// Detect and decode a whole in-memory file.
pub fn read_lines(bytes: &[u8]) -> Result<(Vec<String>, Detection)> {
    let reader = GedcomReader::open(bytes)?;
    let detection = reader.detection().clone();
    let (lines, _) = reader.read_all()?;
    Ok((lines, detection))
}

/// Read up to `limit` bytes from the front of `reader`.
fn read_prefix<R: Read>(reader: &mut R, limit: usize) -> Result<Vec<u8>> {
    let mut prefix = Vec::with_capacity(limit);
    reader.by_ref().take(limit as u64).read_to_end(&mut prefix)?;
    Ok(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, FormatError};
    use crate::sniff::DetectionBasis;

    #[test]
    fn test_prefix_is_replayed() {
        let (lines, detection) = read_lines(b"0 HEAD\r\n1 CHAR ASCII\r\n0 TRLR\r\n").unwrap();
        assert_eq!(detection.encoding, Encoding::Ascii);
        assert_eq!(lines, vec!["0 HEAD", "1 CHAR ASCII", "0 TRLR"]);
    }

    #[test]
    fn test_stream_longer_than_sniff_buffer() {
        let mut text = String::from("0 HEAD\n1 CHAR UTF-8\n");
        for i in 0..200 {
            text.push_str(&format!("1 NOTE line {i} \u{e9}\n"));
        }
        text.push_str("0 TRLR\n");

        let config = ReadConfig {
            sniff_buffer_bytes: 64,
            ..ReadConfig::default()
        };
        let reader = GedcomReader::open_with_config(text.as_bytes(), &config).unwrap();
        assert_eq!(reader.encoding(), Encoding::Utf8);

        let (lines, summary) = reader.read_all().unwrap();
        assert_eq!(lines.len(), 203);
        assert_eq!(lines[2], "1 NOTE line 0 \u{e9}");
        assert_eq!(lines.last().map(String::as_str), Some("0 TRLR"));
        assert_eq!(summary.bytes, text.len() as u64);
    }

    #[test]
    fn test_declaration_cut_by_small_sniff_buffer() {
        let config = ReadConfig {
            sniff_buffer_bytes: 16,
            ..ReadConfig::default()
        };
        let reader =
            GedcomReader::open_with_config(&b"0 HEAD\n1 CHAR ASCII\n0 TRLR\n"[..], &config).unwrap();
        assert_eq!(reader.detection().basis, DetectionBasis::Defaulted);

        let (lines, _) = reader.read_all().unwrap();
        assert_eq!(lines, vec!["0 HEAD", "1 CHAR ASCII", "0 TRLR"]);
    }

    #[test]
    fn test_declaration_straddling_default_sniff_buffer() {
        let mut text = String::from("0 HEAD\n1 NOTE ");
        let declaration = "\n1 CHAR ASCII\n";
        // Put the buffer boundary right after "1 CHAR AS"
        let boundary = ReadConfig::default().sniff_buffer_bytes;
        while text.len() + 10 < boundary {
            text.push('x');
        }
        text.push_str(declaration);
        text.push_str("0 TRLR\n");
        assert_eq!(&text[boundary - 9..boundary], "1 CHAR AS");

        let reader = GedcomReader::open(text.as_bytes()).unwrap();
        assert_eq!(reader.encoding(), Encoding::Ansel);
        let (lines, _) = reader.read_all().unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "1 CHAR ASCII");
    }

    #[test]
    fn test_whole_file_in_buffer_scans_last_line() {
        // No trailing terminator, and shorter than the buffer
        let (lines, detection) = read_lines(b"0 HEAD\n1 CHAR ASCII").unwrap();
        assert_eq!(detection.encoding, Encoding::Ascii);
        assert_eq!(lines, vec!["0 HEAD", "1 CHAR ASCII"]);
    }

    #[test]
    fn test_utf8_bom_stream() {
        let (lines, detection) = read_lines(b"\xEF\xBB\xBF0 HEAD\n1 CHAR UTF-8\n").unwrap();
        assert_eq!(detection.basis, DetectionBasis::ByteOrderMark);
        assert_eq!(lines[0], "0 HEAD");
    }

    #[test]
    fn test_utf16_stream() {
        let bytes: Vec<u8> = "\u{feff}0 HEAD\r\n1 CHAR UNICODE\r\n"
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        let (lines, detection) = read_lines(&bytes).unwrap();
        assert_eq!(detection.encoding, Encoding::UnicodeLittleEndian);
        assert_eq!(lines, vec!["0 HEAD", "1 CHAR UNICODE"]);
    }

    #[test]
    fn test_detection_errors_surface_on_open() {
        assert!(matches!(
            GedcomReader::open(&b"0"[..]),
            Err(Error::Format(FormatError::TooShort { .. }))
        ));
        assert!(matches!(
            GedcomReader::open(&b"0 HEAD\n1 CHAR EBCDIC\n"[..]),
            Err(Error::UnsupportedCharset(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ReadConfig {
            sniff_buffer_bytes: 1,
            ..ReadConfig::default()
        };
        assert!(matches!(
            GedcomReader::open_with_config(&b"0 HEAD\n"[..], &config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_iterates_lazily() {
        let mut reader = GedcomReader::open(&b"0 HEAD\n1 CHAR ANSEL\n0 TRLR\n"[..]).unwrap();
        assert_eq!(reader.next().unwrap().unwrap(), "0 HEAD");
        assert_eq!(reader.lines_read(), 1);
        assert_eq!(reader.by_ref().count(), 2);
        assert!(reader.next().is_none());
    }
}
