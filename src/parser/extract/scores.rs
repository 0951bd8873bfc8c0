use std::sync::LazyLock;

use regex::Regex;

static BARE_INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d{2,3})\s*$").unwrap());
static BARE_DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d(?:\.\d{1,2})?)\s*$").unwrap());
static GRE_TOTAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bGRE(?:\s+(?:General|Total))?\s*:?\s*(\d{3})\b").unwrap()
});
static GRE_VERBAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bGRE\s*V(?:erbal)?\s*:?\s*(\d{3})\b").unwrap());
static GRE_AW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:GRE\s*AW|Analytical\s+Writing)\s*:?\s*(\d(?:\.\d)?)\b").unwrap()
});
static GPA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bGPA\s*:?\s*(\d(?:\.\d{1,2})?)\b").unwrap());

pub const GRE_TOTAL_RANGE: (u16, u16) = (260, 340);
pub const GRE_VERBAL_RANGE: (u16, u16) = (130, 170);
pub const GRE_AW_RANGE: (f32, f32) = (0.0, 6.0);
pub const GPA_RANGE: (f32, f32) = (0.0, 4.0);

fn capture<T: std::str::FromStr>(re: &Regex, text: &str) -> Option<T> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// A value that is nothing but an integer, e.g. the line after "GRE General".
pub fn bare_int(text: &str) -> Option<u16> {
    capture(&BARE_INT_RE, text)
}

/// A value that is nothing but a one/two-decimal number.
pub fn bare_decimal(text: &str) -> Option<f32> {
    capture(&BARE_DECIMAL_RE, text)
}

/// "GRE 320", "GRE General: 320".
pub fn gre_total_prefixed(text: &str) -> Option<u16> {
    capture(&GRE_TOTAL_RE, text)
}

/// "GRE V 160", "GRE Verbal: 160".
pub fn gre_verbal_prefixed(text: &str) -> Option<u16> {
    capture(&GRE_VERBAL_RE, text)
}

/// "GRE AW 4.5", "Analytical Writing: 4.0".
pub fn gre_aw_prefixed(text: &str) -> Option<f32> {
    capture(&GRE_AW_RE, text)
}

/// "GPA 3.85", "GPA: 3.9".
pub fn gpa_prefixed(text: &str) -> Option<f32> {
    capture(&GPA_RE, text)
}

pub fn gre_total_in_range(v: &u16) -> bool {
    (GRE_TOTAL_RANGE.0..=GRE_TOTAL_RANGE.1).contains(v)
}

pub fn gre_verbal_in_range(v: &u16) -> bool {
    (GRE_VERBAL_RANGE.0..=GRE_VERBAL_RANGE.1).contains(v)
}

pub fn gre_aw_in_range(v: &f32) -> bool {
    (GRE_AW_RANGE.0..=GRE_AW_RANGE.1).contains(v)
}

pub fn gpa_in_range(v: &f32) -> bool {
    (GPA_RANGE.0..=GPA_RANGE.1).contains(v)
}
