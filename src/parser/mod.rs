pub mod detail;
pub mod extract;
pub mod table;
pub mod text;

use tracing::trace;

use crate::record::DetailRecord;

/// Three-pass pipeline: html → text lines → labeled fields → validated record.
pub fn parse_detail(html: &str) -> DetailRecord {
    let lines = text::document_lines(html);
    let page = detail::label_fields(&lines);
    trace!(lines = lines.len(), labeled = page.field_count(), "detail page labeled");
    extract::detail_record(&page)
}
