use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::text::element_text;
use crate::record::RowMetadata;

static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").unwrap());
static HEADER_CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());
static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static RESULT_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/result/(\d+)").unwrap());

/// Header words that mark a results table.
pub const HEADER_KEYWORDS: &[&str] = &[
    "institution",
    "school",
    "university",
    "program",
    "decision",
    "status",
    "date",
    "added",
    "season",
    "term",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Institution,
    Program,
    Decision,
    AddedOn,
    Season,
}

/// Checked in order; the first column whose keyword the header cell contains wins.
const COLUMN_KEYWORDS: &[(Column, &[&str])] = &[
    (Column::Institution, &["institution", "school", "university"]),
    (Column::Program, &["program"]),
    (Column::Decision, &["decision", "status"]),
    (Column::AddedOn, &["added", "date"]),
    (Column::Season, &["season", "term"]),
];

/// The chosen table within a document.
#[derive(Debug, Clone, Copy)]
pub struct TableHandle<'a> {
    pub element: ElementRef<'a>,
    pub score: usize,
    pub row_count: usize,
}

impl<'a> TableHandle<'a> {
    fn rows(&self) -> Vec<ElementRef<'a>> {
        self.element.select(&ROW_SEL).collect()
    }

    /// Header row: the first row with `<th>` cells, else the first row.
    fn header_index(&self, rows: &[ElementRef<'a>]) -> Option<usize> {
        rows.iter()
            .position(|r| r.select(&HEADER_CELL_SEL).next().is_some())
            .or(if rows.is_empty() { None } else { Some(0) })
    }
}

/// Index-aligned header cell → field mapping, derived once per page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
    columns: Vec<Option<Column>>,
}

impl ColumnMap {
    pub fn from_headers(headers: &[String]) -> Self {
        let mut taken: Vec<Column> = Vec::new();
        let columns = headers
            .iter()
            .map(|h| {
                let lower = h.to_lowercase();
                let col = COLUMN_KEYWORDS
                    .iter()
                    .filter(|(c, _)| !taken.contains(c))
                    .find(|(_, kws)| kws.iter().any(|k| lower.contains(k)))
                    .map(|(c, _)| *c);
                if let Some(c) = col {
                    taken.push(c);
                }
                col
            })
            .collect();
        ColumnMap { columns }
    }

    pub fn index_of(&self, column: Column) -> Option<usize> {
        self.columns.iter().position(|c| *c == Some(column))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(Option::is_none)
    }
}

fn keyword_score(header_text: &str) -> usize {
    let lower = header_text.to_lowercase();
    HEADER_KEYWORDS.iter().filter(|k| lower.contains(*k)).count()
}

/// Pick the table whose header hits the most keywords; with no hits anywhere, the largest table.
pub fn locate(doc: &Html) -> Option<TableHandle<'_>> {
    let candidates: Vec<TableHandle<'_>> = doc
        .select(&TABLE_SEL)
        .map(|element| {
            let rows: Vec<ElementRef<'_>> = element.select(&ROW_SEL).collect();
            let score = rows.first().map(|r| keyword_score(&element_text(*r))).unwrap_or(0);
            TableHandle {
                element,
                score,
                row_count: rows.len(),
            }
        })
        .collect();

    let best_score = candidates.iter().map(|c| c.score).max()?;
    if best_score > 0 {
        candidates.into_iter().find(|c| c.score == best_score)
    } else {
        candidates.into_iter().max_by_key(|c| c.row_count)
    }
}

/// Canonical key for a detail link: the numeric result id when present, else the absolute URL.
pub fn canonical_key(detail_url: &str) -> String {
    RESULT_ID_RE
        .captures(detail_url)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| detail_url.to_string())
}

/// The row's first `/result/<id>` link, else its first link of any kind.
fn detail_link(row: ElementRef<'_>, base: &Url) -> Option<Url> {
    let links: Vec<Url> = row
        .select(&LINK_SEL)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|h| base.join(h).ok())
        .collect();
    let result = links.iter().position(|u| RESULT_ID_RE.is_match(u.as_str()));
    links.into_iter().nth(result.unwrap_or(0))
}

fn cell_value(cells: &[String], idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| cells.get(i))
        .filter(|v| !v.is_empty())
        .cloned()
}

/// Extract one RowMetadata per linked row. `None` when the document has no table at all.
pub fn read_listing(html: &str, base: &Url) -> Option<Vec<RowMetadata>> {
    let doc = Html::parse_document(html);
    let table = locate(&doc)?;
    let rows = table.rows();
    let header_idx = table.header_index(&rows)?;

    let headers: Vec<String> = rows[header_idx]
        .select(&CELL_SEL)
        .map(element_text)
        .collect();
    let map = ColumnMap::from_headers(&headers);
    debug!(score = table.score, rows = rows.len(), ?map, "located listing table");

    let mut out: Vec<RowMetadata> = Vec::new();
    for row in &rows[header_idx + 1..] {
        let cells: Vec<String> = row.select(&CELL_SEL).map(element_text).collect();
        let row_text = element_text(*row);
        if row_text.is_empty() {
            continue;
        }

        let Some(detail_url) = detail_link(*row, base) else {
            // Tag/notes rows belong to the entry above them.
            if let Some(prev) = out.last_mut() {
                prev.row_text.push(' ');
                prev.row_text.push_str(&row_text);
            }
            continue;
        };

        let detail_url = detail_url.to_string();
        out.push(RowMetadata {
            key: canonical_key(&detail_url),
            institution: cell_value(&cells, map.index_of(Column::Institution)),
            program: cell_value(&cells, map.index_of(Column::Program)),
            decision: cell_value(&cells, map.index_of(Column::Decision)),
            added_on: cell_value(&cells, map.index_of(Column::AddedOn)),
            season: cell_value(&cells, map.index_of(Column::Season)),
            detail_url,
            row_text,
        });
    }

    // A table no header maps onto is only trusted when its rows link to results.
    if map.is_empty() && !out.iter().any(|r| RESULT_ID_RE.is_match(&r.detail_url)) {
        debug!(rows = out.len(), "unrecognized table structure, treating page as empty");
        return Some(Vec::new());
    }

    Some(out)
}
