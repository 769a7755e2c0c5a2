//! Name and type heuristics used to decide whether an extension device is a
//! tablet cursor.
//!
//! Determining whether an X device is a tablet-style device is an imperfect
//! science. We rely on common conventions around device names as well as the
//! type atom reported by wacom tablets. This vocabulary will likely need to be
//! expanded for alternate tablet types.

/// Whole-token, ASCII-case-insensitive match of `needle` against the
/// whitespace-separated tokens of `haystack`. Substrings of a token never
/// match ("stylussy" is not a stylus).
pub(crate) fn match_token(haystack: &str, needle: &str) -> bool {
    haystack
        .split_whitespace()
        .any(|token| token.eq_ignore_ascii_case(needle))
}

fn matches_either(name: &str, type_label: Option<&str>, needle: &str) -> bool {
    match_token(name, needle) || type_label.is_some_and(|label| match_token(label, needle))
}

pub(crate) fn is_wacom(name: &str, type_label: Option<&str>) -> bool {
    matches_either(name, type_label, "wacom")
}

pub(crate) fn is_cursor(name: &str, type_label: Option<&str>) -> bool {
    matches_either(name, type_label, "cursor")
}

pub(crate) fn is_stylus(name: &str, type_label: Option<&str>) -> bool {
    matches_either(name, type_label, "stylus")
}

pub(crate) fn is_eraser(name: &str, type_label: Option<&str>) -> bool {
    matches_either(name, type_label, "eraser")
}

pub(crate) fn is_pad(name: &str, type_label: Option<&str>) -> bool {
    matches_either(name, type_label, "pad")
}

/// A device is accepted as a tablet cursor when it matches the vendor token or
/// any of the role tokens. Any single match accepts; there are no ties.
pub(crate) fn is_tablet_cursor(name: &str, type_label: Option<&str>) -> bool {
    is_wacom(name, type_label)
        || is_cursor(name, type_label)
        || is_stylus(name, type_label)
        || is_eraser(name, type_label)
        || is_pad(name, type_label)
}

#[cfg(test)]
mod tests {
    use super::{is_eraser, is_stylus, is_tablet_cursor, match_token};

    #[test]
    fn whole_tokens_only() {
        assert!(match_token("Wacom Intuos4 6x9 Pen stylus", "stylus"));
        assert!(!match_token("Wacom stylussy", "stylus"));
        assert!(!match_token("styl us", "stylus"));
    }

    #[test]
    fn case_insensitive() {
        assert!(match_token("WACOM Stylus", "wacom"));
        assert!(match_token("wacom ERASER", "eraser"));
    }

    #[test]
    fn tolerates_leading_and_repeated_whitespace() {
        assert!(match_token("  Wacom   Bamboo  ", "bamboo"));
        assert!(!match_token("   ", "wacom"));
    }

    #[test]
    fn type_label_participates() {
        assert!(is_stylus("Generic Tablet", Some("STYLUS")));
        assert!(!is_stylus("Generic Tablet", None));
        assert!(is_eraser("Something", Some("Eraser")));
    }

    #[test]
    fn vendor_or_role_accepts() {
        assert!(is_tablet_cursor("Wacom Intuos", None));
        assert!(is_tablet_cursor("Graphics Pad", None));
        assert!(is_tablet_cursor("Tablet PC", Some("cursor")));
        assert!(!is_tablet_cursor("Logitech USB Mouse", Some("MOUSE")));
    }
}
