//! ANSEL (ANSI Z39.47) single-byte codec.
//!
//! Bytes below 0x80 are plain ASCII. Bytes 0xA1-0xCF carry extended Latin
//! letters and symbols; bytes 0xE0-0xFE are combining diacritics which, unlike
//! Unicode, come *before* the base character they modify.
//!
//! # Mapping Rules
//! - `decode`: unmapped extended bytes become `'?'`
//! - `encode`: unmapped characters pass through as their low byte; callers
//!   that need stricter output must clamp first
//!
//! The "midline e" (0xCD) and "midline o" (0xCE) glyphs are left unmapped:
//! their only Unicode rendering is the plain ASCII letter, which would give
//! two bytes the same code point.
//!
//! # Diacritic Ordering
//!
//! [`to_unicode_line`] and [`to_ansel_line`] operate on whole lines and fix up
//! mark order (and NFC composition) between the two conventions. The plain
//! per-byte functions never reorder anything.

use unicode_normalization::char::{compose, decompose_canonical, is_combining_mark};
use unicode_normalization::UnicodeNormalization;

/// First byte value of ANSEL's combining-diacritic range.
pub const DIACRITICS_BEGIN_AT: u8 = 0xE0;

/// Character substituted for extended bytes the table does not map.
pub const UNMAPPED: char = '?';

/// The mapping table: ANSEL byte to Unicode code point, sorted by byte.
pub const TABLE: [(u8, char); 68] = [
    (0xA1, '\u{0141}'), // latin capital letter L with stroke
    (0xA2, '\u{00D8}'), // latin capital letter O with stroke
    (0xA3, '\u{0110}'), // latin capital letter D with stroke
    (0xA4, '\u{00DE}'), // latin capital letter thorn
    (0xA5, '\u{00C6}'), // latin capital letter AE
    (0xA6, '\u{0152}'), // latin capital ligature OE
    (0xA7, '\u{02B9}'), // modifier letter prime
    (0xA8, '\u{00B7}'), // middle dot
    (0xA9, '\u{266D}'), // music flat sign
    (0xAA, '\u{00AE}'), // registered sign
    (0xAB, '\u{00B1}'), // plus-minus sign
    (0xAC, '\u{01A0}'), // latin capital letter O with horn
    (0xAD, '\u{01AF}'), // latin capital letter U with horn
    (0xAE, '\u{02BC}'), // alif
    (0xB0, '\u{02BB}'), // ayn
    (0xB1, '\u{0142}'), // latin small letter L with stroke
    (0xB2, '\u{00F8}'), // latin small letter O with stroke
    (0xB3, '\u{0111}'), // latin small letter D with stroke
    (0xB4, '\u{00FE}'), // latin small letter thorn
    (0xB5, '\u{00E6}'), // latin small letter AE
    (0xB6, '\u{0153}'), // latin small ligature OE
    (0xB7, '\u{02BA}'), // modifier letter double prime
    (0xB8, '\u{0131}'), // latin small letter dotless i
    (0xB9, '\u{00A3}'), // pound sign
    (0xBA, '\u{00F0}'), // latin small letter eth
    (0xBC, '\u{01A1}'), // latin small letter O with horn
    (0xBD, '\u{01B0}'), // latin small letter U with horn
    (0xBE, '\u{25A1}'), // empty box
    (0xBF, '\u{25A0}'), // black box
    (0xC0, '\u{00B0}'), // degree sign
    (0xC1, '\u{2113}'), // script small L
    (0xC2, '\u{2117}'), // sound recording copyright
    (0xC3, '\u{00A9}'), // copyright sign
    (0xC4, '\u{266F}'), // music sharp sign
    (0xC5, '\u{00BF}'), // inverted question mark
    (0xC6, '\u{00A1}'), // inverted exclamation mark
    (0xC8, '\u{20AC}'), // euro sign
    (0xCF, '\u{00DF}'), // sharp s
    (0xE0, '\u{0309}'), // combining hook above
    (0xE1, '\u{0300}'), // combining grave accent
    (0xE2, '\u{0301}'), // combining acute accent
    (0xE3, '\u{0302}'), // combining circumflex accent
    (0xE4, '\u{0303}'), // combining tilde
    (0xE5, '\u{0304}'), // combining macron
    (0xE6, '\u{0306}'), // combining breve
    (0xE7, '\u{0307}'), // combining dot above
    (0xE8, '\u{0308}'), // combining diaeresis
    (0xE9, '\u{030C}'), // combining caron
    (0xEA, '\u{030A}'), // combining ring above
    (0xEB, '\u{FE20}'), // combining ligature left half
    (0xEC, '\u{FE21}'), // combining ligature right half
    (0xED, '\u{0315}'), // combining comma above right
    (0xEE, '\u{030B}'), // combining double acute accent
    (0xEF, '\u{0310}'), // combining candrabindu
    (0xF0, '\u{0327}'), // combining cedilla
    (0xF1, '\u{0328}'), // combining ogonek
    (0xF2, '\u{0323}'), // combining dot below
    (0xF3, '\u{0324}'), // combining diaeresis below
    (0xF4, '\u{0325}'), // combining ring below
    (0xF5, '\u{0333}'), // combining double low line
    (0xF6, '\u{0332}'), // combining low line
    (0xF7, '\u{0326}'), // combining comma below
    (0xF8, '\u{031C}'), // combining left half ring below
    (0xF9, '\u{032E}'), // combining breve below
    (0xFA, '\u{FE22}'), // combining double tilde left half
    (0xFB, '\u{FE23}'), // combining double tilde right half
    (0xFC, '\u{0338}'), // combining long solidus overlay
    (0xFE, '\u{0313}'), // combining comma above
];

/// Extended half of the decode table, indexed by `byte - 0x80`.
const DECODE_EXTENDED: [char; 128] = build_decode_table();

const fn build_decode_table() -> [char; 128] {
    let mut lut = [UNMAPPED; 128];
    let mut i = 0;
    while i < TABLE.len() {
        let (byte, ch) = TABLE[i];
        lut[(byte - 0x80) as usize] = ch;
        i += 1;
    }
    lut
}

/// Decode one ANSEL byte.
#[inline]
pub fn decode(byte: u8) -> char {
    if byte < 0x80 {
        byte as char
    } else {
        DECODE_EXTENDED[(byte - 0x80) as usize]
    }
}

/// Look up the ANSEL byte for a character, if the table maps it.
pub fn lookup(ch: char) -> Option<u8> {
    if (ch as u32) < 0x80 {
        return Some(ch as u8);
    }
    TABLE.iter().find(|&&(_, c)| c == ch).map(|&(b, _)| b)
}

/// Encode one character, degrading unmapped characters to their low byte.
#[inline]
pub fn encode(ch: char) -> u8 {
    lookup(ch).unwrap_or(ch as u32 as u8)
}

/// Whether `ch` is a combining mark or ligature half in the ANSEL repertoire.
pub fn is_combining_diacritic(ch: char) -> bool {
    matches!(ch, '\u{0300}'..='\u{0338}' | '\u{FE20}'..='\u{FE23}')
}

/// Whether `byte` lies in ANSEL's combining-diacritic range.
#[inline]
pub fn is_diacritic_byte(byte: u8) -> bool {
    byte >= DIACRITICS_BEGIN_AT
}

/// Decode a line byte-for-byte, without reordering diacritics.
pub fn decode_line(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| decode(b)).collect()
}

/// Decode a line, moving ANSEL's leading diacritics after their base character
/// and composing the result to NFC.
///
/// Diacritics with no following base character are kept in place.
pub fn to_unicode_line(bytes: &[u8]) -> String {
    let mut decomposed = String::with_capacity(bytes.len());
    let mut pending: Vec<char> = Vec::new();

    for &byte in bytes {
        if is_diacritic_byte(byte) && decode(byte) != UNMAPPED {
            pending.push(decode(byte));
            continue;
        }
        decomposed.push(decode(byte));
        decomposed.extend(pending.drain(..));
    }
    decomposed.extend(pending);

    decomposed.nfc().collect()
}

/// Encode a line, decomposing precomposed glyphs the table lacks and writing
/// each base character's combining marks before it, as ANSEL expects.
pub fn to_ansel_line(line: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len());
    let mut cluster: Vec<char> = Vec::new();

    for ch in line.chars() {
        if is_combining_mark(ch) && !cluster.is_empty() {
            cluster.push(ch);
            continue;
        }
        flush_cluster(&mut cluster, &mut out);
        expand_glyph(ch, &mut cluster);
    }
    flush_cluster(&mut cluster, &mut out);

    out
}

/// Push `ch` into `cluster`, decomposing it when ANSEL has no byte for it.
fn expand_glyph(ch: char, cluster: &mut Vec<char>) {
    if lookup(ch).is_some() {
        cluster.push(ch);
    } else {
        decompose_canonical(ch, |c| cluster.push(c));
    }
}

/// Emit a base character and its marks in ANSEL order, then clear the cluster.
fn flush_cluster(cluster: &mut Vec<char>, out: &mut Vec<u8>) {
    let Some((&first, marks)) = cluster.split_first() else {
        return;
    };

    if is_combining_mark(first) {
        // Marks with nothing to modify: keep them as they came.
        out.extend(cluster.iter().map(|&c| encode(c)));
        cluster.clear();
        return;
    }

    // Fold marks ANSEL cannot express back into the base where that yields a
    // mapped glyph (o + horn -> U+01A1).
    let mut base = first;
    let mut kept: Vec<char> = Vec::with_capacity(marks.len());
    for &mark in marks {
        if lookup(mark).is_none() {
            if let Some(composed) = compose(base, mark).filter(|&c| lookup(c).is_some()) {
                base = composed;
                continue;
            }
        }
        kept.push(mark);
    }

    out.extend(kept.iter().map(|&m| encode(m)));
    out.push(encode(base));
    cluster.clear();
}
