//! The closed sets of character encodings and line terminators GEDCOM uses.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;

/// Line terminator matching the host platform's native ending.
#[cfg(target_os = "windows")]
pub const NATIVE_LINE_TERMINATOR: LineTerminator = LineTerminator::Crlf;

#[cfg(not(target_os = "windows"))]
pub const NATIVE_LINE_TERMINATOR: LineTerminator = LineTerminator::LfOnly;

/// A character encoding a GEDCOM file may use.
///
/// Decided once per file from its leading bytes and never changed mid-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// 7-bit ASCII; extended bytes are illegal
    Ascii,
    /// ANSI Z39.47 extended Latin, GEDCOM 5.5's default
    Ansel,
    /// Two-byte Unicode, most significant byte first
    UnicodeBigEndian,
    /// Two-byte Unicode, least significant byte first
    UnicodeLittleEndian,
    /// UTF-8
    Utf8,
}

impl Encoding {
    /// Every supported encoding, in declaration order.
    pub const ALL: [Encoding; 5] = [
        Encoding::Ascii,
        Encoding::Ansel,
        Encoding::UnicodeBigEndian,
        Encoding::UnicodeLittleEndian,
        Encoding::Utf8,
    ];

    /// The value a `1 CHAR` header line uses for this encoding.
    ///
    /// Both two-byte variants share the name `UNICODE`.
    pub const fn character_set_name(self) -> &'static str {
        match self {
            Encoding::Ascii => "ASCII",
            Encoding::Ansel => "ANSEL",
            Encoding::UnicodeBigEndian | Encoding::UnicodeLittleEndian => "UNICODE",
            Encoding::Utf8 => "UTF-8",
        }
    }

    /// Sorted, de-duplicated set of all supported character-set names.
    pub fn supported_character_set_names() -> BTreeSet<&'static str> {
        Self::ALL.iter().map(|e| e.character_set_name()).collect()
    }

    /// Whether `name` is exactly one of the supported character-set names.
    pub fn is_valid_character_set_name(name: &str) -> bool {
        Self::ALL.iter().any(|e| e.character_set_name() == name)
    }

    /// Number of bytes per code unit (and per encoded line terminator unit).
    pub const fn code_unit_width(self) -> usize {
        match self {
            Encoding::UnicodeBigEndian | Encoding::UnicodeLittleEndian => 2,
            Encoding::Ascii | Encoding::Ansel | Encoding::Utf8 => 1,
        }
    }

    /// Whether this is one of the two-byte Unicode variants.
    pub const fn is_double_byte(self) -> bool {
        self.code_unit_width() == 2
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Encoding::Ascii => "ASCII",
            Encoding::Ansel => "ANSEL",
            Encoding::UnicodeBigEndian => "UNICODE (big-endian)",
            Encoding::UnicodeLittleEndian => "UNICODE (little-endian)",
            Encoding::Utf8 => "UTF-8",
        };
        f.write_str(name)
    }
}

/// How lines are terminated when writing.
///
/// Reading accepts any mix of these; writing emits exactly one per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTerminator {
    /// U+000D only
    CrOnly,
    /// U+000A only
    LfOnly,
    /// U+000D followed by U+000A
    Crlf,
    /// U+000A followed by U+000D
    Lfcr,
}

impl LineTerminator {
    /// Every supported terminator.
    pub const ALL: [LineTerminator; 4] = [
        LineTerminator::CrOnly,
        LineTerminator::LfOnly,
        LineTerminator::Crlf,
        LineTerminator::Lfcr,
    ];

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LineTerminator::CrOnly => "\r",
            LineTerminator::LfOnly => "\n",
            LineTerminator::Crlf => "\r\n",
            LineTerminator::Lfcr => "\n\r",
        }
    }

    /// The host platform's line ending, normalized into the supported set.
    #[inline]
    pub const fn native() -> LineTerminator {
        NATIVE_LINE_TERMINATOR
    }

    /// Recognize one of the four terminator strings.
    // Mirrors `as_str`; FromStr would force an error type nobody needs.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<LineTerminator> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

impl Default for LineTerminator {
    fn default() -> Self {
        Self::native()
    }
}
