/// Field labels recognized on a detail document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Institution,
    Program,
    DegreeType,
    Origin,
    Decision,
    Notification,
    Gpa,
    GreTotal,
    GreVerbal,
    GreAw,
    Season,
    Notes,
}

const LABELS: &[(Label, &[&str])] = &[
    (Label::Institution, &["institution", "school", "university"]),
    (Label::Program, &["program"]),
    (Label::DegreeType, &["degree type", "degree"]),
    (Label::Origin, &["degree's country of origin", "country of origin", "citizenship"]),
    (Label::Decision, &["decision"]),
    (Label::Notification, &["notification"]),
    (Label::Gpa, &["undergrad gpa", "gpa"]),
    (Label::GreTotal, &["gre general", "gre total", "gre"]),
    (Label::GreVerbal, &["gre verbal"]),
    (Label::GreAw, &["analytical writing", "gre analytical writing", "gre aw"]),
    (Label::Season, &["term", "season"]),
    (Label::Notes, &["notes"]),
];

/// Values that mean "nothing here" in the line after a label.
const PLACEHOLDERS: &[&str] = &["Submit yours", "-", "--", "n/a", "N/A"];

/// Lines that end a free-text section even though they are not field labels.
pub const SECTION_MARKERS: &[&str] = &["Timeline", "Application Information"];

/// A detail document reduced to text lines and the label → value pairs found in them.
#[derive(Debug, Clone, Default)]
pub struct DetailPage {
    pub text: String,
    fields: Vec<(Label, String)>,
}

impl DetailPage {
    /// First value recorded for `label`.
    pub fn value(&self, label: Label) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Match a whole line (case-insensitive, trailing colon allowed) against the label vocabulary.
pub fn match_label(line: &str) -> Option<Label> {
    let norm = line.trim().trim_end_matches(':').trim().to_lowercase();
    LABELS
        .iter()
        .find(|(_, names)| names.contains(&norm.as_str()))
        .map(|(label, _)| *label)
}

/// True when `line` starts another section: a field label or a known section marker.
pub fn is_boundary(line: &str) -> bool {
    match_label(line).is_some()
        || SECTION_MARKERS.contains(&line)
        || line.starts_with("Received notification")
}

/// `Label: value` on a single line.
fn split_inline(line: &str) -> Option<(Label, String)> {
    let (head, tail) = line.split_once(':')?;
    let label = match_label(head)?;
    let value = tail.trim();
    if value.is_empty() || PLACEHOLDERS.contains(&value) {
        return None;
    }
    Some((label, value.to_string()))
}

/// Pair each label line with the value on the following line.
pub fn label_fields(lines: &[String]) -> DetailPage {
    let mut fields: Vec<(Label, String)> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].as_str();

        if let Some(label) = match_label(line) {
            // Notes are collected from the raw text by their own extractor.
            if label != Label::Notes {
                if let Some(next) = lines.get(i + 1) {
                    if !PLACEHOLDERS.contains(&next.as_str()) && match_label(next).is_none() {
                        fields.push((label, next.clone()));
                        i += 2;
                        continue;
                    }
                }
            }
        } else if let Some(pair) = split_inline(line) {
            fields.push(pair);
        }
        i += 1;
    }

    DetailPage {
        text: lines.join("\n"),
        fields,
    }
}
