//! Lenient value parsing.
//!
//! Every helper treats blank input and conversion failures the same way: the
//! value is absent. Callers pick the fallback.

/// Where bound values come from. The first value for a key wins.
pub trait ValueSource {
    fn value(&self, key: &str) -> Option<&str>;
}

impl ValueSource for std::collections::HashMap<String, String> {
    fn value(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl ValueSource for [(String, String)] {
    fn value(&self, key: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl ValueSource for Vec<(String, String)> {
    fn value(&self, key: &str) -> Option<&str> {
        self.as_slice().value(key)
    }
}

/// Non-blank text.
pub fn text(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.trim().is_empty())
}

pub fn int<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    parsed(raw)
}

/// Trimmed, non-blank text converted through `FromStr`.
pub fn parsed<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    text(raw).and_then(|s| s.trim().parse().ok())
}

/// `true` / `false`, case-insensitive.
pub fn boolean(raw: Option<&str>) -> Option<bool> {
    let s = text(raw)?.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
