use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

const TABLE_YEARS: std::ops::RangeInclusive<u32> = 2020..=2030;
const BARE_YEARS: std::ops::RangeInclusive<u32> = 2020..=2030;

const TABLE_PREFIXES: &[(&str, &str)] = &[
    ("FA", "Fall"),
    ("SP", "Spring"),
    ("SU", "Summer"),
    ("WI", "Winter"),
];

/// Two-letter term codes for the years the site is known to carry, e.g. "FA25" → "Fall 2025".
static CODE_TABLE: LazyLock<HashMap<String, String>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    for year in TABLE_YEARS {
        for (prefix, season) in TABLE_PREFIXES {
            table.insert(format!("{}{:02}", prefix, year % 100), format!("{} {}", season, year));
        }
    }
    table
});

static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([FS])(\d{2})$").unwrap());
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(fall|spring|summer|winter|autumn)\s*(?:of\s+)?'?(\d{4}|\d{2})\b").unwrap()
});
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{4})\b").unwrap());

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
}

/// Exact lookup of any token in the code table.
pub fn from_code_table(text: &str) -> Option<String> {
    tokens(text).find_map(|t| CODE_TABLE.get(&t.to_ascii_uppercase()).cloned())
}

/// Generic "F25"/"S99" decoding: F → Fall, S → Spring, year is 20YY.
pub fn decode_code(text: &str) -> Option<String> {
    tokens(text).find_map(|t| {
        let upper = t.to_ascii_uppercase();
        let caps = CODE_RE.captures(&upper)?;
        let season = match &caps[1] {
            "F" => "Fall",
            "S" => "Spring",
            _ => return None,
        };
        Some(format!("{} 20{}", season, &caps[2]))
    })
}

/// "Fall 2025", "spring of 2026", "Fall '25".
pub fn from_season_name(text: &str) -> Option<String> {
    let caps = NAME_RE.captures(text)?;
    let season = match caps[1].to_ascii_lowercase().as_str() {
        "fall" | "autumn" => "Fall",
        "spring" => "Spring",
        "summer" => "Summer",
        _ => "Winter",
    };
    let year = &caps[2];
    if year.len() == 2 {
        Some(format!("{} 20{}", season, year))
    } else {
        Some(format!("{} {}", season, year))
    }
}

/// A bare four-digit year inside the plausible admissions window.
pub fn from_bare_year(text: &str) -> Option<String> {
    YEAR_RE.captures_iter(text).find_map(|caps| {
        let year: u32 = caps[1].parse().ok()?;
        BARE_YEARS.contains(&year).then(|| year.to_string())
    })
}
