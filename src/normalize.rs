//! Full-width to half-width numeral normalization and numeric coercion.
//!
//! boatrace.jp renders many numbers with full-width digits (`１`, `５２．０`).
//! Every text value pulled out of a page goes through [`to_halfwidth`] before
//! it is coerced to a number; values that still do not parse become `None`.

/// Full-width characters and their half-width replacements
const FULLWIDTH_MAP: [(char, char); 11] = [
    ('０', '0'),
    ('１', '1'),
    ('２', '2'),
    ('３', '3'),
    ('４', '4'),
    ('５', '5'),
    ('６', '6'),
    ('７', '7'),
    ('８', '8'),
    ('９', '9'),
    ('．', '.'),
];

/// Replace full-width digits and the full-width decimal point.
///
/// Total: characters outside the table are kept as they are.
pub fn to_halfwidth(text: &str) -> String {
    text.chars()
        .map(|c| {
            FULLWIDTH_MAP
                .iter()
                .find(|(full, _)| *full == c)
                .map(|(_, half)| *half)
                .unwrap_or(c)
        })
        .collect()
}

/// Normalize and parse as a float. Non-numeric residue yields `None`.
pub fn to_number(text: &str) -> Option<f64> {
    let normalized = to_halfwidth(text);
    normalized
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Normalize and parse as an integer.
///
/// Accepts integral floats such as `"3.0"`, matching how a numeric column
/// holding only whole numbers is read back.
pub fn to_integer(text: &str) -> Option<i64> {
    let value = to_number(text)?;
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// Apply [`to_number`] to an optional raw value.
pub fn opt_number(text: Option<&str>) -> Option<f64> {
    text.and_then(to_number)
}

/// Apply [`to_integer`] to an optional raw value.
pub fn opt_integer(text: Option<&str>) -> Option<i64> {
    text.and_then(to_integer)
}
