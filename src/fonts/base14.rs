//! Base14 substitute selection.
//!
//! When a span must be redrawn and its embedded font is unusable, the
//! closest of the fourteen standard fonts stands in. Matching works on a
//! normalized name: lowercased, spaces and dashes removed, any `ABCDEF+`
//! subset prefix stripped.

use crate::config::FONT_MAP;

/// Normalized key used for font-name comparisons.
pub fn normalize_key(font_name: &str) -> String {
    let key: String = font_name
        .to_lowercase()
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect();
    strip_subset_prefix(&key).to_string()
}

/// Drop a subset prefix such as `ABCDEF+` from a font name.
pub fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((_, rest)) => rest,
        None => name,
    }
}

/// Map a PDF font name to the closest Base14 identifier.
///
/// Family comes from the first [`FONT_MAP`] pattern contained in the
/// normalized name; bold/italic/oblique tokens pick the styled variant.
/// Unmatched names fall back to Helvetica with the same style tokens.
pub fn normalize_font(font_name: &str) -> String {
    let key = normalize_key(font_name);

    for (pattern, base14) in FONT_MAP {
        if !key.contains(pattern) {
            continue;
        }
        let bold = key.contains("bold");
        let italic = key.contains("italic") || key.contains("oblique");
        return match (bold, italic) {
            (true, true) => format!("{base14}bi"),
            (true, false) => format!("{base14}bo"),
            (false, true) => format!("{base14}it"),
            (false, false) => (*base14).to_string(),
        };
    }

    let raw = font_name.to_lowercase();
    if raw.contains("bold") {
        "hebo".to_string()
    } else if raw.contains("italic") {
        "heit".to_string()
    } else {
        "helv".to_string()
    }
}
