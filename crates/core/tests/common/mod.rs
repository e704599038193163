//! Seeded GEDCOM sample generation for integration tests.
//!
//! Generated lines look like GEDCOM records (`<level> <TAG> <value>`) and
//! only use characters the target encoding can represent, so they survive an
//! encode/decode round trip unchanged.
//!
//! # Design
//!
//! Values are a mix of:
//! - plain ASCII text (names, dates, places)
//! - extended characters drawn from the encoding's repertoire
//! - empty values, which still leave a non-empty line

#![allow(dead_code)]

use gedcom_io_core::ansel;
use gedcom_io_core::Encoding;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const TAGS: [&str; 10] = ["INDI", "NAME", "SEX", "BIRT", "DATE", "PLAC", "FAMS", "NOTE", "SOUR", "CONC"];

/// Extended characters beyond ASCII that two-byte Unicode and UTF-8 carry.
const WIDE_SAMPLES: [char; 8] = [
    '\u{e9}', '\u{f1}', '\u{141}', '\u{3a9}', '\u{5d0}', '\u{4e2d}', '\u{1f600}', '\u{10348}',
];

/// Characters `encoding` can represent on a round trip, excluding CR and LF.
pub fn repertoire(encoding: Encoding) -> Vec<char> {
    let mut chars: Vec<char> = (0x20u8..0x7F).map(char::from).collect();
    match encoding {
        Encoding::Ascii => {}
        Encoding::Ansel => chars.extend(ansel::TABLE.iter().map(|&(_, c)| c)),
        Encoding::UnicodeBigEndian | Encoding::UnicodeLittleEndian | Encoding::Utf8 => {
            chars.extend(ansel::TABLE.iter().map(|&(_, c)| c));
            chars.extend(WIDE_SAMPLES);
        }
    }
    chars
}

/// Generate `count` GEDCOM-shaped lines representable in `encoding`.
///
/// The first line is always `0 HEAD` so the output sniffs like a real file.
pub fn generate_sample_lines(seed: u64, count: usize, encoding: Encoding) -> Vec<String> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let alphabet = repertoire(encoding);
    let mut lines = Vec::with_capacity(count);

    for i in 0..count {
        if i == 0 {
            lines.push("0 HEAD".to_string());
            continue;
        }

        let level: u8 = rng.gen_range(0..=3);
        let tag = TAGS[rng.gen_range(0..TAGS.len())];
        let value_type: u8 = rng.gen_range(0..10);

        let value: String = match value_type {
            // 50% plain ASCII words
            0..=4 => {
                let len = rng.gen_range(1..=30);
                (0..len)
                    .map(|_| char::from(rng.gen_range(b'A'..=b'z')))
                    .collect()
            }

            // 40% anything in the repertoire
            5..=8 => {
                let len = rng.gen_range(1..=40);
                (0..len)
                    .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                    .collect()
            }

            // 10% no value
            _ => String::new(),
        };

        lines.push(format!("{level} {tag} {value}"));
    }

    lines
}

/// Sample lines with a `1 CHAR` declaration naming `encoding`.
pub fn generate_sample_file(seed: u64, count: usize, encoding: Encoding) -> Vec<String> {
    let mut lines = generate_sample_lines(seed, count.max(2), encoding);
    lines.insert(1, format!("1 CHAR {}", encoding.character_set_name()));
    lines
}
