//! Country name normalization.
//!
//! Produces the matching key used on both sides of the country join. The
//! pipeline is applied symmetrically to conflict location fragments and to
//! reference polygon names, so "U.S.A." and "usa" meet on the same key.
//! The key carries no meaning beyond equality comparison.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalizes a country name into its matching key.
///
/// The pipeline:
/// 1. Trim surrounding whitespace
/// 2. Lowercase
/// 3. Decompose (NFD) and drop combining marks, so precomposed and
///    decomposed spellings meet
/// 4. Fold stroke letters and typographic apostrophes
/// 5. Replace `&` with `and`
/// 6. Strip `.` and `,`
/// 7. Trim again (stripping can expose edge whitespace)
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    for c in lowered.nfd().filter(|c| !is_combining_mark(*c)) {
        match c {
            '&' => out.push_str("and"),
            '.' | ',' => {}
            other => out.push(fold_char(other)),
        }
    }

    out.trim().to_string()
}

/// Normalizes an optional name. `None` yields the empty key, which never
/// matches anything.
#[must_use]
pub fn normalize_optional(name: Option<&str>) -> String {
    name.map_or_else(String::new, normalize_name)
}

/// Letters with no canonical decomposition.
const fn fold_char(c: char) -> char {
    match c {
        'ø' => 'o',
        'ł' => 'l',
        'đ' => 'd',
        'ı' => 'i',
        '\u{2018}' | '\u{2019}' | '\u{02bc}' | '`' => '\'',
        other => other,
    }
}
