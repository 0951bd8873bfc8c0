use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use tracing::debug;

use crate::parser::extract::notes::{BOILERPLATE, MIN_NOTES_LEN};
use crate::parser::extract::{dates, Extractor, DECISION};
use crate::parser::text::collapse_ws;
use crate::record::{AggregatedRecord, NormalizedRecord};

/// Fields that count toward the completeness score.
pub const IMPORTANT_FIELDS: &[&str] = &[
    "institution",
    "program",
    "degree_type",
    "origin",
    "decision",
    "season",
    "added_on",
    "notes",
];

/// Values that mean "unknown" anywhere in the record.
const PLACEHOLDERS: &[&str] = &["", "Unknown", "-", "N/A", "n/a", "Submit yours"];

const PROGRAM_MAP: &[(&str, &str)] = &[
    ("CS", "Computer Science"),
    ("EE", "Electrical Engineering"),
    ("ME", "Mechanical Engineering"),
    ("Bio", "Biology"),
    ("Chem", "Chemistry"),
    ("Math", "Mathematics"),
    ("Phys", "Physics"),
];

const DEGREE_MAP: &[(&str, &str)] = &[
    ("PhD", "PhD"),
    ("Ph.D.", "PhD"),
    ("Ph.D", "PhD"),
    ("Masters", "Masters"),
    ("Master's", "Masters"),
    ("MS", "Masters"),
    ("M.S.", "Masters"),
    ("MA", "Masters"),
    ("M.A.", "Masters"),
    ("MBA", "MBA"),
    ("M.B.A.", "MBA"),
];

const ORIGIN_MAP: &[(&str, &str)] = &[
    ("US", "United States"),
    ("USA", "United States"),
    ("UK", "United Kingdom"),
    ("Domestic", "United States"),
    ("International", "International"),
];

static BOILERPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = BOILERPLATE.iter().map(|s| regex::escape(s)).collect();
    Regex::new(&format!("(?i){}", alternatives.join("|"))).unwrap()
});

/// Trimmed value, or None for placeholders and values shorter than `min_len`.
fn present(value: Option<String>, min_len: usize) -> Option<String> {
    let v = value?;
    let trimmed = v.trim();
    if PLACEHOLDERS.contains(&trimmed) || trimmed.chars().count() < min_len {
        return None;
    }
    Some(trimmed.to_string())
}

/// Whole-value lookup only. "CS" maps, "CS Theory" is left alone.
fn canonical(value: Option<String>, map: &[(&str, &str)]) -> Option<String> {
    value.map(|v| {
        map.iter()
            .find(|(from, _)| *from == v)
            .map(|(_, to)| to.to_string())
            .unwrap_or(v)
    })
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    let collapsed = collapse_ws(&notes?);
    let stripped = collapse_ws(&BOILERPLATE_RE.replace_all(&collapsed, ""));
    (stripped.chars().count() >= MIN_NOTES_LEN).then_some(stripped)
}

fn iso_date(value: Option<String>) -> Option<String> {
    present(value, 1).map(|v| dates::to_iso(&v))
}

/// Canonicalize one record and score it.
pub fn normalize(record: AggregatedRecord) -> NormalizedRecord {
    let mut out = NormalizedRecord {
        key: record.key,
        detail_url: record.detail_url,
        institution: present(record.institution, 3),
        program: canonical(present(record.program, 2), PROGRAM_MAP),
        degree_type: canonical(present(record.degree_type, 2), DEGREE_MAP),
        origin: canonical(present(record.origin, 2), ORIGIN_MAP),
        decision: present(record.decision, 1).and_then(|d| DECISION.extract(&d)),
        season: present(record.season, 1),
        added_on: iso_date(record.added_on),
        notification_date: iso_date(record.notification_date),
        notification_method: present(record.notification_method, 1),
        gre_total: record.gre_total,
        gre_verbal: record.gre_verbal,
        gre_aw: record.gre_aw,
        gpa: record.gpa,
        notes: clean_notes(record.notes),
        completeness: 0,
    };
    out.completeness = completeness(&out);
    out
}

fn important_values(r: &NormalizedRecord) -> [bool; 8] {
    [
        r.institution.is_some(),
        r.program.is_some(),
        r.degree_type.is_some(),
        r.origin.is_some(),
        r.decision.is_some(),
        r.season.is_some(),
        r.added_on.is_some(),
        r.notes.is_some(),
    ]
}

/// Integer percentage of important fields that are filled.
pub fn completeness(r: &NormalizedRecord) -> u8 {
    let filled = important_values(r).iter().filter(|v| **v).count();
    (filled * 100 / IMPORTANT_FIELDS.len()) as u8
}

/// A record with nothing but its key is not worth emitting.
pub fn is_viable(r: &NormalizedRecord) -> bool {
    important_values(r).iter().any(|v| *v)
}

/// Normalize in parallel, keep input order, drop non-viable records.
/// Returns the kept records and the number dropped.
pub fn normalize_all(records: Vec<AggregatedRecord>) -> (Vec<NormalizedRecord>, usize) {
    let total = records.len();
    let kept: Vec<NormalizedRecord> = records
        .into_par_iter()
        .map(normalize)
        .filter(is_viable)
        .collect();
    let dropped = total - kept.len();
    debug!(total, kept = kept.len(), dropped, "normalized records");
    (kept, dropped)
}

/// Filled count per important field over a record set, in `IMPORTANT_FIELDS` order.
pub fn field_coverage(records: &[NormalizedRecord]) -> Vec<(&'static str, usize)> {
    let mut counts = [0usize; 8];
    for r in records {
        for (slot, filled) in counts.iter_mut().zip(important_values(r)) {
            if filled {
                *slot += 1;
            }
        }
    }
    IMPORTANT_FIELDS.iter().copied().zip(counts).collect()
}

/// Records per decision label, sorted by label. Missing decisions count as "Unknown".
pub fn decision_distribution(records: &[NormalizedRecord]) -> Vec<(String, usize)> {
    let mut dist: std::collections::BTreeMap<String, usize> = Default::default();
    for r in records {
        let label = r.decision.clone().unwrap_or_else(|| "Unknown".to_string());
        *dist.entry(label).or_default() += 1;
    }
    dist.into_iter().collect()
}
