use scraper::{ElementRef, Html};

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Collapse every whitespace run to one space and trim.
pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of a document as normalized, non-empty lines.
pub fn document_lines(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    element_lines(doc.root_element())
}

/// One line per text node (split on embedded newlines), skipping script/style content.
pub fn element_lines(el: ElementRef<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    for node in el.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
        });
        if hidden {
            continue;
        }
        for part in text.split('\n') {
            let line = collapse_ws(part);
            if !line.is_empty() {
                lines.push(line);
            }
        }
    }
    lines
}

/// All visible text of an element on one normalized line.
pub fn element_text(el: ElementRef<'_>) -> String {
    collapse_ws(&el.text().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(collapse_ws("  a \t b\n\nc  "), "a b c");
        assert_eq!(collapse_ws("   "), "");
    }

    #[test]
    fn lines_skip_scripts_and_blank_nodes() {
        let html = "<html><head><title>T</title><style>p{}</style></head>\
                    <body><h1>Institution</h1>\n  <p>MIT</p><script>var x = 1;</script>\
                    <p>two\nlines</p></body></html>";
        let lines = document_lines(html);
        assert_eq!(lines, vec!["Institution", "MIT", "two", "lines"]);
    }

    #[test]
    fn element_text_joins_children() {
        let doc = Html::parse_fragment("<div><b>GRE</b>   <i>320</i></div>");
        let text = element_text(doc.root_element());
        assert_eq!(text, "GRE 320");
    }
}
