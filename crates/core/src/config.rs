//! Configuration for reading and writing GEDCOM byte streams.
//!
//! Every field has a sensible default, so `CodecConfig::default()` works with
//! zero setup. Configurations can also be loaded from TOML:
//!
//! ```
//! use gedcom_io_core::config::{CodecConfig, DiacriticMode};
//!
//! let config = CodecConfig::from_toml_str(
//!     r#"
//!     [read]
//!     progress_interval = 100
//!     diacritics = "compose"
//!
//!     [write]
//!     terminator = "crlf"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.read.progress_interval, 100);
//! assert_eq!(config.read.diacritics, DiacriticMode::Compose);
//! ```

use crate::encoding::{Encoding, LineTerminator};
use crate::error::{Error, Result};
use serde::Deserialize;

/// Default size of the prefix inspected when detecting the encoding (16 KiB).
pub const DEFAULT_SNIFF_BUFFER_BYTES: usize = 16 * 1024;

/// Default number of decoded lines scanned for a `1 CHAR` declaration.
pub const DEFAULT_HEADER_SCAN_LINES: usize = 1000;

/// Default number of lines between progress notifications.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 500;

/// Smallest usable sniff buffer: a BOM plus one two-byte code unit.
pub const MIN_SNIFF_BUFFER_BYTES: usize = 4;

/// How ANSEL combining diacritics are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiacriticMode {
    /// Map byte-for-byte; marks stay where ANSEL puts them (before the base)
    #[default]
    Raw,
    /// Reorder marks to Unicode order and compose to NFC on read; decompose
    /// and reorder on write
    Compose,
}

/// Settings for detecting and decoding an input stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadConfig {
    /// Bytes buffered from the start of the stream for encoding detection
    pub sniff_buffer_bytes: usize,

    /// Lines scanned for a `1 CHAR` declaration when the bytes are ambiguous
    pub header_scan_lines: usize,

    /// Lines between progress notifications
    pub progress_interval: u64,

    /// ANSEL diacritic handling
    pub diacritics: DiacriticMode,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            sniff_buffer_bytes: DEFAULT_SNIFF_BUFFER_BYTES,
            header_scan_lines: DEFAULT_HEADER_SCAN_LINES,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            diacritics: DiacriticMode::Raw,
        }
    }
}

impl ReadConfig {
    /// Check that the settings can drive a reader.
    pub fn validate(&self) -> Result<()> {
        if self.sniff_buffer_bytes < MIN_SNIFF_BUFFER_BYTES {
            return Err(Error::Config(format!(
                "sniff_buffer_bytes must be at least {MIN_SNIFF_BUFFER_BYTES}, got {}",
                self.sniff_buffer_bytes
            )));
        }
        if self.header_scan_lines == 0 {
            return Err(Error::Config("header_scan_lines must be positive".to_string()));
        }
        if self.progress_interval == 0 {
            return Err(Error::Config("read progress_interval must be positive".to_string()));
        }
        Ok(())
    }
}

/// Settings for encoding an output stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriteConfig {
    /// Target encoding; `None` picks one from the content
    pub encoding: Option<Encoding>,

    /// Line terminator; `None` uses the platform's native ending
    pub terminator: Option<LineTerminator>,

    /// Byte order used when the content declares `1 CHAR UNICODE`
    pub unicode_little_endian: bool,

    /// Lines between progress notifications
    pub progress_interval: u64,

    /// ANSEL diacritic handling
    pub diacritics: DiacriticMode,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            encoding: None,
            terminator: None,
            unicode_little_endian: true,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            diacritics: DiacriticMode::Raw,
        }
    }
}

impl WriteConfig {
    /// Check that the settings can drive a writer.
    pub fn validate(&self) -> Result<()> {
        if self.progress_interval == 0 {
            return Err(Error::Config("write progress_interval must be positive".to_string()));
        }
        Ok(())
    }
}

/// Complete configuration for both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    pub read: ReadConfig,
    pub write: WriteConfig,
}

impl CodecConfig {
    /// Parse and validate a configuration from TOML text.
    ///
    /// Missing tables and fields fall back to their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CodecConfig =
            toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate both halves.
    pub fn validate(&self) -> Result<()> {
        self.read.validate()?;
        self.write.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.read.sniff_buffer_bytes, 16384);
        assert_eq!(config.read.header_scan_lines, 1000);
        assert_eq!(config.read.progress_interval, 500);
        assert_eq!(config.read.diacritics, DiacriticMode::Raw);
        assert_eq!(config.write.encoding, None);
        assert_eq!(config.write.terminator, None);
        assert!(config.write.unicode_little_endian);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = CodecConfig::from_toml_str("").unwrap();
        assert_eq!(config, CodecConfig::default());
    }

    #[test]
    fn test_toml_overrides() {
        let config = CodecConfig::from_toml_str(
            r#"
            [read]
            sniff_buffer_bytes = 2048
            header_scan_lines = 50

            [write]
            encoding = "unicode_big_endian"
            terminator = "lfcr"
            unicode_little_endian = false
            "#,
        )
        .unwrap();
        assert_eq!(config.read.sniff_buffer_bytes, 2048);
        assert_eq!(config.read.header_scan_lines, 50);
        assert_eq!(config.write.encoding, Some(Encoding::UnicodeBigEndian));
        assert_eq!(config.write.terminator, Some(LineTerminator::Lfcr));
        assert!(!config.write.unicode_little_endian);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = CodecConfig::from_toml_str("[read]\nsniff_bytes = 10\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validation() {
        let mut read = ReadConfig::default();
        read.sniff_buffer_bytes = 2;
        assert!(read.validate().is_err());

        let mut read = ReadConfig::default();
        read.progress_interval = 0;
        assert!(read.validate().is_err());

        let mut write = WriteConfig::default();
        write.progress_interval = 0;
        assert!(write.validate().is_err());

        let result = CodecConfig::from_toml_str("[read]\nheader_scan_lines = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
