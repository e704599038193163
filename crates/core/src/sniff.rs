//! Encoding detection from the leading bytes of a GEDCOM stream.
//!
//! GEDCOM declares its character set in the header (`1 CHAR ...`), which sits
//! *inside* the text we are trying to decode. The sniffer breaks the cycle by
//! looking at the first two or three bytes, and only when those are
//! ambiguous between the single-byte encodings does it decode the prefix
//! optimistically and search for the declaration.
//!
//! # Detection Rules (first match wins)
//!
//! ```text
//! EF BB BF                              -> UTF-8, BOM present
//! FF FE | 30 00 | 0D 00 | 0A 00         -> UNICODE little-endian
//! FE FF | 00 30 | 00 0D | 00 0A         -> UNICODE big-endian
//! 30 20 | 0A 0A | 0D 0D | 0D 0A |
//! 0A 0D | 0A 30 | 0D 30                 -> scan for "1 CHAR ", default ANSEL
//! anything else                         -> FormatError
//! ```
//!
//! Every GEDCOM file starts with `0 HEAD` (possibly after blank lines), so the
//! two-byte patterns are the digit zero, CR or LF in each byte order, or a BOM.

use crate::config::{ReadConfig, DEFAULT_HEADER_SCAN_LINES};
use crate::encoding::Encoding;
use crate::error::{Error, FormatError, Result};

/// UTF-8 byte order mark.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Fewest bytes the sniffer needs to say anything.
pub const MIN_SNIFF_BYTES: usize = 3;

/// Prefix of the header line that declares the character set.
pub const CHAR_DECLARATION_PREFIX: &str = "1 CHAR ";

/// First two bytes (read big-endian) that mean two-byte little-endian text.
const LITTLE_ENDIAN_PATTERNS: [u16; 4] = [0xFFFE, 0x3000, 0x0D00, 0x0A00];

/// First two bytes (read big-endian) that mean two-byte big-endian text.
const BIG_ENDIAN_PATTERNS: [u16; 4] = [0xFEFF, 0x0030, 0x000D, 0x000A];

/// First two bytes consistent with ASCII, ANSEL or UTF-8.
const SINGLE_BYTE_PATTERNS: [u16; 7] = [0x3020, 0x0A0A, 0x0D0D, 0x0D0A, 0x0A0D, 0x0A30, 0x0D30];

/// Why the sniffer settled on its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionBasis {
    /// A byte order mark named the encoding
    ByteOrderMark,
    /// The leading zero/CR/LF code unit fixed the byte order
    BytePattern,
    /// A `1 CHAR` header line declared this value
    Declared(String),
    /// Nothing declared the charset; GEDCOM's default applies
    Defaulted,
}

/// The outcome of sniffing one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Encoding the decoder must use
    pub encoding: Encoding,

    /// Whether the stream starts with a BOM the decoder must discard
    pub byte_order_mark: bool,

    /// How the encoding was decided
    pub basis: DetectionBasis,
}

/// Detects the encoding of a GEDCOM byte prefix.
#[derive(Debug, Clone, Copy)]
pub struct Sniffer {
    header_scan_lines: usize,
}

impl Default for Sniffer {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER_SCAN_LINES)
    }
}

impl Sniffer {
    /// Create a sniffer that scans at most `header_scan_lines` lines for a
    /// `1 CHAR` declaration.
    pub fn new(header_scan_lines: usize) -> Self {
        Self { header_scan_lines }
    }

    pub fn from_config(config: &ReadConfig) -> Self {
        Self::new(config.header_scan_lines)
    }

    /// Inspect `prefix` and return exactly one encoding.
    ///
    /// `at_eof` says whether `prefix` holds the whole stream. When it does
    /// not, the last unterminated line of the prefix may be cut off and is
    /// left out of the header scan.
    ///
    /// # Errors
    /// - `FormatError::TooShort` if fewer than 3 bytes are available
    /// - `FormatError::UnrecognizedPrefix` if no rule matches
    /// - `FormatError::AmbiguousByteOrder` if a BOM-less two-byte guess is
    ///   contradicted by the next code unit
    /// - `Error::UnsupportedCharset` if the header declares an unknown value
    pub fn detect(&self, prefix: &[u8], at_eof: bool) -> Result<Detection> {
        if prefix.len() < MIN_SNIFF_BYTES {
            return Err(FormatError::TooShort {
                required: MIN_SNIFF_BYTES,
                actual: prefix.len(),
            }
            .into());
        }

        let detection = self.classify(prefix, at_eof)?;
        tracing::debug!(
            encoding = %detection.encoding,
            byte_order_mark = detection.byte_order_mark,
            basis = ?detection.basis,
            "detected GEDCOM encoding"
        );
        Ok(detection)
    }

    fn classify(&self, prefix: &[u8], at_eof: bool) -> Result<Detection> {
        if prefix.starts_with(&UTF8_BOM) {
            return Ok(Detection {
                encoding: Encoding::Utf8,
                byte_order_mark: true,
                basis: DetectionBasis::ByteOrderMark,
            });
        }

        let lead = u16::from_be_bytes([prefix[0], prefix[1]]);

        if LITTLE_ENDIAN_PATTERNS.contains(&lead) {
            return double_byte(prefix, Encoding::UnicodeLittleEndian, lead == 0xFFFE);
        }
        if BIG_ENDIAN_PATTERNS.contains(&lead) {
            return double_byte(prefix, Encoding::UnicodeBigEndian, lead == 0xFEFF);
        }

        if SINGLE_BYTE_PATTERNS.contains(&lead) {
            let detection = match declared_charset(prefix, self.header_scan_lines, at_eof)? {
                Some((encoding, value)) => Detection {
                    encoding,
                    byte_order_mark: false,
                    basis: DetectionBasis::Declared(value),
                },
                // GEDCOM 5.5's default character set
                None => Detection {
                    encoding: Encoding::Ansel,
                    byte_order_mark: false,
                    basis: DetectionBasis::Defaulted,
                },
            };
            return Ok(detection);
        }

        Err(FormatError::UnrecognizedPrefix {
            prefix: [prefix[0], prefix[1]],
        }
        .into())
    }
}

/// Detect with the default scan window, treating `prefix` as the whole stream.
pub fn sniff(prefix: &[u8]) -> Result<Detection> {
    Sniffer::default().detect(prefix, true)
}

/// Decode `prefix` optimistically as UTF-8 and look for a `1 CHAR` line among
/// its first `max_lines` lines, blank ones included.
///
/// Unless `complete` is set, everything after the last CR or LF is dropped
/// first: it is the start of a line the prefix cut off.
///
/// Returns the encoding and the declared value as written.
pub fn declared_charset(
    prefix: &[u8],
    max_lines: usize,
    complete: bool,
) -> Result<Option<(Encoding, String)>> {
    let text = String::from_utf8_lossy(prefix);
    let text = if complete {
        &text[..]
    } else {
        match text.rfind(['\r', '\n']) {
            Some(end) => &text[..=end],
            None => "",
        }
    };

    let declaration = header_lines(text)
        .take(max_lines)
        .find_map(|line| line.strip_prefix(CHAR_DECLARATION_PREFIX));

    let Some(value) = declaration else {
        return Ok(None);
    };
    let value = value.trim_end();

    match parse_declared_charset(value) {
        Some(encoding) => Ok(Some((encoding, value.to_string()))),
        None => Err(Error::UnsupportedCharset(value.to_string())),
    }
}

/// Split `text` into lines the way a line reader does: CR, LF or CRLF ends a
/// line, and a final line needs no terminator.
fn header_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let Some(end) = rest.find(['\r', '\n']) else {
            return Some(std::mem::take(&mut rest));
        };
        let line = &rest[..end];
        let width = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[end + width..];
        Some(line)
    })
}

/// Map a declared `1 CHAR` value (case-insensitive) to a single-byte-family
/// encoding.
///
/// `ANSI` is not a legal GEDCOM value but shows up in the wild; it is read
/// as ANSEL.
pub fn parse_declared_charset(value: &str) -> Option<Encoding> {
    if value.eq_ignore_ascii_case("ANSEL") {
        Some(Encoding::Ansel)
    } else if value.eq_ignore_ascii_case("ASCII") {
        Some(Encoding::Ascii)
    } else if value.eq_ignore_ascii_case("UTF-8") {
        Some(Encoding::Utf8)
    } else if value.eq_ignore_ascii_case("ANSI") {
        tracing::warn!(declared = value, "non-standard charset ANSI, reading as ANSEL");
        Some(Encoding::Ansel)
    } else {
        None
    }
}

/// Accept a two-byte guess, checking the second code unit when no BOM backs it.
fn double_byte(prefix: &[u8], encoding: Encoding, bom: bool) -> Result<Detection> {
    if !bom && prefix.len() >= 4 {
        // The unit after a leading zero/CR/LF is ASCII in any real GEDCOM, so
        // its high-order byte must be zero.
        let high = match encoding {
            Encoding::UnicodeLittleEndian => prefix[3],
            _ => prefix[2],
        };
        if high != 0 {
            return Err(FormatError::AmbiguousByteOrder {
                prefix: [prefix[0], prefix[1], prefix[2], prefix[3]],
            }
            .into());
        }
    }

    Ok(Detection {
        encoding,
        byte_order_mark: bom,
        basis: if bom {
            DetectionBasis::ByteOrderMark
        } else {
            DetectionBasis::BytePattern
        },
    })
}
