use serde::{Deserialize, Serialize};

/// Outcome of reading one listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Ok,
    Empty,
    Failed,
}

/// One fetched listing page. Dropped as soon as its rows are extracted.
#[derive(Debug)]
pub struct ListingPage {
    pub index: usize,
    pub document: String,
    pub status: PageStatus,
}

/// Row-level data read from a listing table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowMetadata {
    pub key: String,
    pub detail_url: String,
    pub institution: Option<String>,
    pub program: Option<String>,
    pub decision: Option<String>,
    pub added_on: Option<String>,
    pub season: Option<String>,
    /// Whitespace-collapsed text of the row and any continuation rows.
    pub row_text: String,
}

/// Fields extracted from one detail document. Every present value already passed validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub institution: Option<String>,
    pub program: Option<String>,
    pub degree_type: Option<String>,
    pub origin: Option<String>,
    pub decision: Option<String>,
    pub season: Option<String>,
    pub notification_date: Option<String>,
    pub notification_method: Option<String>,
    pub gre_total: Option<u16>,
    pub gre_verbal: Option<u16>,
    pub gre_aw: Option<f32>,
    pub gpa: Option<f32>,
    pub notes: Option<String>,
}

impl DetailRecord {
    pub fn has_notes(&self) -> bool {
        self.notes.as_deref().is_some_and(|n| !n.trim().is_empty())
    }
}

/// Listing metadata merged with its detail record; the unit stored in checkpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    pub key: String,
    pub detail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gre_total: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gre_verbal: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gre_aw: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Final output row: canonicalized values plus a 0-100 completeness score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub key: String,
    pub detail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gre_total: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gre_verbal: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gre_aw: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub completeness: u8,
}
