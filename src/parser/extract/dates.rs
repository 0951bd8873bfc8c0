use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static ON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bon\s+(.+?)(?:\s+via\s+.*)?$").unwrap());
static VIA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bvia\s+(.+)$").unwrap());
static HAS_DIGIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").unwrap());

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATE_PREFIXES: &[&str] = &["Added on", "added on", "on"];

/// "on 15/02/2025 via E-mail" → "15/02/2025".
pub fn notification_on(text: &str) -> Option<String> {
    let caps = ON_RE.captures(text.trim())?;
    let date = caps[1].trim();
    HAS_DIGIT_RE.is_match(date).then(|| date.to_string())
}

/// A value that carries no "on"/"via" wording but looks like a date.
pub fn bare_date(text: &str) -> Option<String> {
    let trimmed = text.trim();
    parse_date(trimmed).map(|_| trimmed.to_string())
}

/// "on 15/02/2025 via E-mail" → "E-mail".
pub fn notification_via(text: &str) -> Option<String> {
    let caps = VIA_RE.captures(text.trim())?;
    Some(caps[1].trim().to_string())
}

/// Parse the date formats seen in listings and notifications.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let mut s = raw.trim();
    for prefix in DATE_PREFIXES {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim();
            break;
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// ISO `YYYY-MM-DD` when the value parses, otherwise the trimmed input.
pub fn to_iso(raw: &str) -> String {
    parse_date(raw)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::super::{Extractor, NOTIFICATION_DATE, NOTIFICATION_METHOD};
    use super::*;

    #[test]
    fn notification_parts() {
        let v = "on 15/02/2025 via E-mail";
        assert_eq!(NOTIFICATION_DATE.extract(v).as_deref(), Some("15/02/2025"));
        assert_eq!(NOTIFICATION_METHOD.extract(v).as_deref(), Some("E-mail"));
    }

    #[test]
    fn notification_without_method() {
        assert_eq!(
            NOTIFICATION_DATE.extract("on March 3, 2025").as_deref(),
            Some("March 3, 2025")
        );
        assert_eq!(NOTIFICATION_METHOD.extract("on March 3, 2025"), None);
        assert_eq!(NOTIFICATION_DATE.extract("2025-03-03").as_deref(), Some("2025-03-03"));
        assert_eq!(NOTIFICATION_DATE.extract("via Website"), None);
    }

    #[test]
    fn iso_conversion() {
        assert_eq!(to_iso("Added on March 31, 2024"), "2024-03-31");
        assert_eq!(to_iso("15/02/2025"), "2025-02-15");
        assert_eq!(to_iso("12 Feb 2025"), "2025-02-12");
        assert_eq!(to_iso(" sometime in spring "), "sometime in spring");
    }
}
