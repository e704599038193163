//! Error types for GEDCOM character-set detection and transcoding.
//!
//! All operations return structured errors rather than panicking. Nothing in
//! this crate retries: re-opening a stream under a different encoding is the
//! caller's decision.

use thiserror::Error;

/// Top-level error type for all operations in the crate.
///
/// Each variant corresponds to a specific failure domain:
/// - Charset: the file declares a character set we cannot read
/// - Format: the leading bytes are not a recognizable GEDCOM byte stream
/// - Decode: a byte sequence is illegal for the active encoding
/// - Encode: a line cannot be written as one logical line
/// - Cancellation: the caller asked us to stop
/// - I/O: the underlying byte source or sink failed
#[derive(Debug, Error)]
pub enum Error {
    /// The header declares a charset outside the supported set
    #[error("unsupported charset {0:?}: not a supported GEDCOM character encoding")]
    UnsupportedCharset(String),

    /// Leading bytes do not match any known GEDCOM pattern
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Illegal or truncated byte sequence for the active encoding
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A line that would not read back as the same single line
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Caller-initiated abort, observed at a line boundary
    #[error("cancelled after {lines} lines")]
    Cancelled { lines: u64 },

    /// Byte source or sink I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True when the error was caused by cancellation rather than bad data.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }
}

/// Errors raised while sniffing the leading bytes of a stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// Not enough bytes to recognize anything
    #[error("stream too short: need at least {required} bytes, got {actual}")]
    TooShort { required: usize, actual: usize },

    /// Neither a BOM nor a zero/newline in any supported encoding
    #[error(
        "unrecognized leading bytes {prefix:02X?}: does not begin with a zero or newline \
         in any supported encoding, nor with a UTF-8 byte order mark"
    )]
    UnrecognizedPrefix { prefix: [u8; 2] },

    /// The first code unit suggests a two-byte encoding but the second disagrees
    #[error("ambiguous byte order: leading bytes {prefix:02X?} are not consistent two-byte text")]
    AmbiguousByteOrder { prefix: [u8; 4] },
}

/// Errors raised while decoding bytes into logical lines.
///
/// `line` is the 1-based number of the logical line being assembled when the
/// defect was found; `offset` is the absolute byte offset in the stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// A byte >= 0x80 in a stream declared as ASCII
    #[error("extended byte 0x{byte:02X} not allowed in ASCII (line {line}, offset {offset})")]
    NonAsciiByte { byte: u8, line: u64, offset: u64 },

    /// A two-byte stream ended in the middle of a code unit
    #[error("stream ended mid code unit (line {line}, offset {offset})")]
    TruncatedCodeUnit { line: u64, offset: u64 },

    /// A surrogate code unit without its partner
    #[error("unpaired surrogate 0x{unit:04X} (line {line})")]
    UnpairedSurrogate { unit: u16, line: u64 },

    /// Bytes that are not valid UTF-8
    #[error("invalid UTF-8 sequence (line {line}, offset {offset})")]
    InvalidUtf8 { line: u64, offset: u64 },

    /// A multi-byte UTF-8 sequence cut short by a line break or end of stream
    #[error("truncated UTF-8 sequence (line {line}, offset {offset})")]
    TruncatedUtf8 { line: u64, offset: u64 },
}

/// Errors raised while encoding logical lines.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// A CR or LF inside the line would split it on read
    #[error("line {line} contains an embedded line terminator")]
    EmbeddedTerminator { line: u64 },
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_distinguished() {
        assert!(Error::Cancelled { lines: 3 }.is_cancellation());
        assert!(!Error::UnsupportedCharset("EBCDIC".into()).is_cancellation());
        assert!(!Error::from(DecodeError::InvalidUtf8 { line: 1, offset: 0 }).is_cancellation());
    }

    #[test]
    fn test_messages_name_offending_values() {
        let err = Error::UnsupportedCharset("IBMPC".into());
        assert!(err.to_string().contains("IBMPC"));

        let err = Error::from(DecodeError::NonAsciiByte {
            byte: 0x80,
            line: 2,
            offset: 9,
        });
        let text = err.to_string();
        assert!(text.contains("0x80"));
        assert!(text.contains("line 2"));
    }

    #[test]
    fn test_format_error_converts() {
        let err: Error = FormatError::TooShort {
            required: 3,
            actual: 1,
        }
        .into();
        assert!(matches!(err, Error::Format(FormatError::TooShort { .. })));
    }

    #[test]
    fn test_encode_error_names_line() {
        let err = Error::from(EncodeError::EmbeddedTerminator { line: 4 });
        assert!(err.to_string().contains("line 4"));
        assert!(!err.is_cancellation());
    }
}
