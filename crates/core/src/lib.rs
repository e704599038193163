//! gedcom-io-core: byte-level transcoding for GEDCOM files
//!
//! This library sits beneath a GEDCOM tag-tree parser and handles everything
//! between raw bytes and logical text lines:
//! - Detects which character encoding an unlabeled GEDCOM stream uses
//! - Decodes ASCII, ANSEL, two-byte Unicode (either byte order) and UTF-8
//! - Encodes lines back with a chosen or content-derived encoding and terminator
//! - Reports progress and honours cooperative cancellation
//!
//! # Architecture
//!
//! Modules, leaves first:
//! - `encoding`: the closed sets of encodings and line terminators
//! - `ansel`: ANSEL <-> Unicode table and diacritic reordering
//! - `sniff`: encoding detection from the leading bytes
//! - `progress`: progress events, cancellation token, run summaries
//! - `decode`: bytes -> logical lines, one strategy per encoding
//! - `encode`: logical lines -> bytes, mirroring `decode`
//! - `reader`: sniff, replay and decode an unlabeled stream
//! - `writer`: pick output defaults and encode
//! - `config`: read/write settings, loadable from TOML
//!
//! # Example
//!
//! ```
//! use gedcom_io_core::{read_lines, Encoding, GedcomWriter};
//!
//! let (lines, detection) = read_lines(b"0 HEAD\r\n1 CHAR ASCII\r\n0 TRLR\r\n").unwrap();
//! assert_eq!(detection.encoding, Encoding::Ascii);
//! assert_eq!(lines.len(), 3);
//!
//! let bytes = GedcomWriter::new().to_bytes(&lines).unwrap();
//! assert!(bytes.starts_with(b"0 HEAD"));
//! ```
//!
//! # Design Principles
//!
//! - **No panics**: all errors are structured and recoverable
//! - **Bounded sniffing**: detection reads a fixed-size prefix, then replays it
//! - **Closed variants**: encodings are enums matched exhaustively
//! - **Synchronous**: one line per step, cancellation polled between lines

pub mod ansel;
pub mod config;
pub mod decode;
pub mod encode;
pub mod encoding;
pub mod error;
pub mod progress;
pub mod reader;
pub mod sniff;
pub mod writer;

// Re-export commonly used types
pub use config::{CodecConfig, DiacriticMode, ReadConfig, WriteConfig};
pub use decode::LineDecoder;
pub use encode::LineEncoder;
pub use encoding::{Encoding, LineTerminator};
pub use error::{DecodeError, EncodeError, Error, FormatError, Result};
pub use progress::{CancellationToken, ProgressEvent, TranscodeSummary};
pub use reader::{read_lines, GedcomReader};
pub use sniff::{sniff, Detection, DetectionBasis, Sniffer};
pub use writer::{default_encoding, GedcomWriter};
