const DOCTORAL: &[&str] = &["phd", "dphil", "doctorate", "doctoral", "doctor", "edd", "psyd", "dsc"];
const MASTERS: &[&str] = &[
    "master", "masters", "ms", "msc", "ma", "meng", "mfa", "mba", "mph", "mpp", "mpa", "mres",
];
const INTERNATIONAL: &[&str] = &["international", "intl", "foreign"];
const DOMESTIC: &[&str] = &["american", "domestic", "us citizen", "u.s.", "united states"];

/// Lowercased words with punctuation removed, so "Ph.D." reads as "phd" and "Master's" as "masters".
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '.' || c == '\''))
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn has_word(text: &str, vocab: &[&str]) -> bool {
    words(text).iter().any(|w| vocab.contains(&w.as_str()))
}

fn has_phrase(text: &str, vocab: &[&str]) -> bool {
    let lower = text.to_lowercase();
    vocab.iter().any(|p| lower.contains(p))
}

pub fn doctoral(text: &str) -> Option<String> {
    has_word(text, DOCTORAL).then(|| "PhD".to_string())
}

pub fn masters(text: &str) -> Option<String> {
    has_word(text, MASTERS).then(|| "Masters".to_string())
}

pub fn international(text: &str) -> Option<String> {
    has_phrase(text, INTERNATIONAL).then(|| "International".to_string())
}

pub fn domestic(text: &str) -> Option<String> {
    has_phrase(text, DOMESTIC).then(|| "American".to_string())
}

fn contains_ci(text: &str, needle: &str) -> bool {
    text.to_lowercase().contains(needle)
}

pub fn accepted(text: &str) -> Option<String> {
    contains_ci(text, "accept").then(|| "Accepted".to_string())
}

pub fn rejected(text: &str) -> Option<String> {
    (contains_ci(text, "reject") || contains_ci(text, "denied")).then(|| "Rejected".to_string())
}

pub fn waitlisted(text: &str) -> Option<String> {
    (contains_ci(text, "waitlist") || contains_ci(text, "wait list"))
        .then(|| "Waitlisted".to_string())
}

pub fn interview(text: &str) -> Option<String> {
    contains_ci(text, "interview").then(|| "Interview".to_string())
}

/// Unrecognized decisions pass through unchanged rather than being dropped.
pub fn verbatim(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::super::{Extractor, DECISION, DEGREE, ORIGIN};

    #[test]
    fn degree_keywords() {
        assert_eq!(DEGREE.extract("PhD").as_deref(), Some("PhD"));
        assert_eq!(DEGREE.extract("Ph.D.").as_deref(), Some("PhD"));
        assert_eq!(DEGREE.extract("Master's").as_deref(), Some("Masters"));
        assert_eq!(DEGREE.extract("M.S.").as_deref(), Some("Masters"));
        assert_eq!(DEGREE.extract("Computer Science").as_deref(), None);
        // doctoral keywords outrank masters keywords
        assert_eq!(DEGREE.extract("MS/PhD track").as_deref(), Some("PhD"));
    }

    #[test]
    fn origin_checks_international_first() {
        assert_eq!(ORIGIN.extract("International").as_deref(), Some("International"));
        assert_eq!(ORIGIN.extract("American").as_deref(), Some("American"));
        assert_eq!(
            ORIGIN.extract("International (American degree)").as_deref(),
            Some("International")
        );
        assert_eq!(ORIGIN.extract("Other").as_deref(), None);
    }

    #[test]
    fn decision_priority() {
        assert_eq!(DECISION.extract("Accepted via E-mail").as_deref(), Some("Accepted"));
        assert_eq!(DECISION.extract("Rejected").as_deref(), Some("Rejected"));
        assert_eq!(DECISION.extract("Application denied").as_deref(), Some("Rejected"));
        assert_eq!(DECISION.extract("Wait listed").as_deref(), Some("Waitlisted"));
        assert_eq!(DECISION.extract("Interview").as_deref(), Some("Interview"));
        assert_eq!(
            DECISION.extract("Accepted after interview").as_deref(),
            Some("Accepted")
        );
    }

    #[test]
    fn unknown_decision_passes_through() {
        assert_eq!(DECISION.extract("  Other  ").as_deref(), Some("Other"));
        assert_eq!(DECISION.extract("   "), None);
    }
}
