pub mod classify;
pub mod dates;
pub mod notes;
pub mod scores;
pub mod season;

use super::detail::{DetailPage, Label};
use crate::record::DetailRecord;

/// A pure `text -> value` extractor.
pub trait Extractor {
    type Output;
    fn extract(&self, text: &str) -> Option<Self::Output>;
}

pub type Step<T> = (&'static str, fn(&str) -> Option<T>);

/// Ordered extraction steps for one field. The first step yielding an in-range value wins.
pub struct Chain<T: 'static> {
    pub steps: &'static [Step<T>],
    pub valid: fn(&T) -> bool,
}

impl<T> Extractor for Chain<T> {
    type Output = T;

    fn extract(&self, text: &str) -> Option<T> {
        self.steps
            .iter()
            .find_map(|(_, step)| step(text).filter(|v| (self.valid)(v)))
    }
}

impl<T> Chain<T> {
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|(name, _)| *name).collect()
    }
}

fn any<T>(_: &T) -> bool {
    true
}

pub static GRE_TOTAL: Chain<u16> = Chain {
    steps: &[("bare", scores::bare_int), ("prefixed", scores::gre_total_prefixed)],
    valid: scores::gre_total_in_range,
};

pub static GRE_VERBAL: Chain<u16> = Chain {
    steps: &[("bare", scores::bare_int), ("prefixed", scores::gre_verbal_prefixed)],
    valid: scores::gre_verbal_in_range,
};

pub static GRE_AW: Chain<f32> = Chain {
    steps: &[("bare", scores::bare_decimal), ("prefixed", scores::gre_aw_prefixed)],
    valid: scores::gre_aw_in_range,
};

pub static GPA: Chain<f32> = Chain {
    steps: &[("bare", scores::bare_decimal), ("prefixed", scores::gpa_prefixed)],
    valid: scores::gpa_in_range,
};

pub static DEGREE: Chain<String> = Chain {
    steps: &[("doctoral", classify::doctoral), ("masters", classify::masters)],
    valid: any,
};

pub static ORIGIN: Chain<String> = Chain {
    steps: &[("international", classify::international), ("domestic", classify::domestic)],
    valid: any,
};

pub static DECISION: Chain<String> = Chain {
    steps: &[
        ("accepted", classify::accepted),
        ("rejected", classify::rejected),
        ("waitlisted", classify::waitlisted),
        ("interview", classify::interview),
        ("verbatim", classify::verbatim),
    ],
    valid: any,
};

pub static SEASON: Chain<String> = Chain {
    steps: &[
        ("code_table", season::from_code_table),
        ("code_decode", season::decode_code),
        ("season_name", season::from_season_name),
        ("bare_year", season::from_bare_year),
    ],
    valid: any,
};

/// Season lookup for free row text, where a bare year is more likely a date than a term.
pub static SEASON_IN_TEXT: Chain<String> = Chain {
    steps: &[
        ("code_table", season::from_code_table),
        ("code_decode", season::decode_code),
        ("season_name", season::from_season_name),
    ],
    valid: any,
};

pub static NOTIFICATION_DATE: Chain<String> = Chain {
    steps: &[("on_via", dates::notification_on), ("bare_date", dates::bare_date)],
    valid: any,
};

pub static NOTIFICATION_METHOD: Chain<String> = Chain {
    steps: &[("via", dates::notification_via)],
    valid: any,
};

/// Apply `chain` to the labeled value, falling back to the whole document text.
fn labeled_or_text<T>(page: &DetailPage, label: Label, chain: &Chain<T>) -> Option<T> {
    page.value(label)
        .and_then(|v| chain.extract(v))
        .or_else(|| chain.extract(&page.text))
}

fn labeled<T>(page: &DetailPage, label: Label, chain: &Chain<T>) -> Option<T> {
    page.value(label).and_then(|v| chain.extract(v))
}

fn plain(page: &DetailPage, label: Label) -> Option<String> {
    page.value(label).map(str::to_string)
}

/// Run every field's chain over a labeled detail page.
pub fn detail_record(page: &DetailPage) -> DetailRecord {
    let program = plain(page, Label::Program);
    let degree_type = labeled(page, Label::DegreeType, &DEGREE)
        .or_else(|| program.as_deref().and_then(|p| DEGREE.extract(p)));

    DetailRecord {
        institution: plain(page, Label::Institution),
        program,
        degree_type,
        origin: labeled(page, Label::Origin, &ORIGIN),
        decision: labeled(page, Label::Decision, &DECISION),
        season: labeled(page, Label::Season, &SEASON),
        notification_date: labeled(page, Label::Notification, &NOTIFICATION_DATE),
        notification_method: labeled(page, Label::Notification, &NOTIFICATION_METHOD),
        gre_total: labeled_or_text(page, Label::GreTotal, &GRE_TOTAL),
        gre_verbal: labeled_or_text(page, Label::GreVerbal, &GRE_VERBAL),
        gre_aw: labeled_or_text(page, Label::GreAw, &GRE_AW),
        gpa: labeled_or_text(page, Label::Gpa, &GPA),
        notes: notes::extract(&page.text),
    }
}
