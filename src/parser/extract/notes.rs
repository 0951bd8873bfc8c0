use crate::parser::detail::{is_boundary, match_label, Label};

/// Exact sentences the site prints on every entry.
pub const BOILERPLATE: &[&str] = &[
    "Details and information about the application.",
    "This data is estimated based on applicant submissions at The GradCafe.",
];

pub const MIN_NOTES_LEN: usize = 6;

/// Text following the "Notes" label up to the next section boundary, minus boilerplate lines.
pub fn extract(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let start = lines
        .iter()
        .position(|l| match_label(l) == Some(Label::Notes))?;

    let collected: Vec<&str> = lines[start + 1..]
        .iter()
        .take_while(|l| !is_boundary(l))
        .filter(|l| !l.is_empty() && !BOILERPLATE.contains(l))
        .copied()
        .collect();

    let notes = collected.join(" ");
    (notes.chars().count() >= MIN_NOTES_LEN).then_some(notes)
}
