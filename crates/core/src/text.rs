//! Input gate: cleaning and length validation for raw user reports.
//!
//! Cleaning is deterministic and never fails. Length is measured in chars of
//! the *cleaned* text, so whitespace padding cannot push a report over the
//! minimum.

use crate::error::CuratorError;

/// Default lower bound on cleaned text length.
pub const DEFAULT_MIN_LENGTH: usize = 10;
/// Default upper bound on cleaned text length.
pub const DEFAULT_MAX_LENGTH: usize = 10_000;

/// Normalize raw text: fold diacritics, drop control and zero-width
/// characters, collapse whitespace runs, trim.
pub fn clean(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if c.is_control() || is_zero_width(c) {
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        push_folded(&mut out, c);
    }

    out
}

/// `min <= chars(text) <= max`.
pub fn is_valid_length(text: &str, min: usize, max: usize) -> bool {
    let len = text.chars().count();
    min <= len && len <= max
}

/// Fold a single char to its unaccented form, lowercase or uppercase kept.
pub fn fold_char(c: char) -> Option<&'static str> {
    let folded = match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' | 'ą' => "a",
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' | 'Ā' | 'Ą' => "A",
        'é' | 'è' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'É' | 'È' | 'Ê' | 'Ë' | 'Ē' | 'Ę' | 'Ě' => "E",
        'í' | 'ì' | 'î' | 'ï' | 'ī' => "i",
        'Í' | 'Ì' | 'Î' | 'Ï' | 'Ī' => "I",
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' | 'ō' | 'ő' => "o",
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' | 'Ø' | 'Ō' | 'Ő' => "O",
        'ú' | 'ù' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ú' | 'Ù' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' | 'Ÿ' => "Y",
        'ñ' | 'ń' | 'ň' => "n",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ç' | 'ć' | 'č' => "c",
        'Ç' | 'Ć' | 'Č' => "C",
        'š' | 'ś' => "s",
        'Š' | 'Ś' => "S",
        'ž' | 'ź' | 'ż' => "z",
        'Ž' | 'Ź' | 'Ż' => "Z",
        'ł' => "l",
        'Ł' => "L",
        'ř' => "r",
        'Ř' => "R",
        'ď' => "d",
        'Ď' => "D",
        'ť' => "t",
        'Ť' => "T",
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        _ => return None,
    };
    Some(folded)
}

fn push_folded(out: &mut String, c: char) {
    match fold_char(c) {
        Some(folded) => out.push_str(folded),
        // Combining marks (U+0300..U+036F) left over from decomposed input.
        None if ('\u{0300}'..='\u{036F}').contains(&c) => {}
        None => out.push(c),
    }
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}')
}

/// Hard gate between raw input and the detection pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextGate {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for TextGate {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl TextGate {
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
        }
    }

    /// Clean `raw` and accept it only if the cleaned length is within bounds.
    pub fn admit(&self, raw: &str) -> Result<String, CuratorError> {
        let cleaned = clean(raw);
        if is_valid_length(&cleaned, self.min_length, self.max_length) {
            Ok(cleaned)
        } else {
            Err(CuratorError::InvalidInput {
                length: cleaned.chars().count(),
                min: self.min_length,
                max: self.max_length,
            })
        }
    }
}
