//! Shared HTML traversal helpers for the markup extractors.
//!
//! Provider notifications are generated by ticketing systems and share
//! a handful of shapes: a bold/span label whose value lives in the
//! following text, and tables of either label/value rows or circuit
//! listings. The per-provider extractors express their rules on top of
//! these helpers instead of touching the tree directly.

use scraper::{ElementRef, Html, Node, Selector};

/// Parses raw bytes into an HTML tree, lossily decoding as UTF-8.
pub fn parse_document(raw: &[u8]) -> Html {
    Html::parse_document(&String::from_utf8_lossy(raw))
}

/// Selects all elements matching a CSS selector.
///
/// The selector must be a valid literal; this is for the fixed rules
/// the extractors ship with, not user input.
pub fn select<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    let selector = Selector::parse(css).expect("extractor selectors are valid CSS");
    doc.select(&selector).collect()
}

/// Collapses whitespace and strips the quoted-printable artifacts that
/// survive lax gateways (`=C2`, `=A0`, stray `=`).
pub fn clean_text(text: &str) -> String {
    let stripped = text.replace("=C2", "").replace("=A0", "").replace('=', "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The cleaned, concatenated text content of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Texts following an element, one entry per sibling node, cleaned.
///
/// This is how label/value markup reads: the label sits in a `<b>` or
/// `<span>`, the value in the text (or elements) after it.
pub fn following_texts(element: ElementRef<'_>) -> Vec<String> {
    let mut texts = Vec::new();
    let mut node = element.next_sibling();
    while let Some(current) = node {
        match current.value() {
            Node::Text(text) => {
                let cleaned = clean_text(text);
                if !cleaned.is_empty() {
                    texts.push(cleaned);
                }
            }
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(current) {
                    let cleaned = element_text(el);
                    if !cleaned.is_empty() {
                        texts.push(cleaned);
                    }
                }
            }
            _ => {}
        }
        node = current.next_sibling();
    }
    texts
}

/// The first non-empty text following an element.
pub fn tail_text(element: ElementRef<'_>) -> Option<String> {
    following_texts(element).into_iter().next()
}

/// The cleaned texts of a table's header cells.
pub fn header_cells(table: ElementRef<'_>) -> Vec<String> {
    cells_of(table, "th")
}

/// The cleaned texts of a table's data cells, in document order.
pub fn data_cells(table: ElementRef<'_>) -> Vec<String> {
    cells_of(table, "td")
}

/// The rows of a table as cleaned cell texts (both `th` and `td`).
pub fn table_rows(table: ElementRef<'_>) -> Vec<Vec<String>> {
    let row_selector = Selector::parse("tr").expect("extractor selectors are valid CSS");
    let cell_selector = Selector::parse("th, td").expect("extractor selectors are valid CSS");
    table
        .select(&row_selector)
        .map(|row| row.select(&cell_selector).map(element_text).collect())
        .collect()
}

fn cells_of(table: ElementRef<'_>, cell: &str) -> Vec<String> {
    let selector = Selector::parse(cell).expect("extractor selectors are valid CSS");
    table.select(&selector).map(element_text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_strips_artifacts_and_whitespace() {
        assert_eq!(clean_text("  a =C2=A0 b\r\n c  "), "a b c");
        assert_eq!(clean_text("\n"), "");
    }

    #[test]
    fn label_value_tail() {
        let doc = parse_document(b"<p><b>Customer:</b> ACME Corp<br></p>");
        let bold = select(&doc, "b");
        assert_eq!(tail_text(bold[0]).as_deref(), Some("ACME Corp"));
    }

    #[test]
    fn following_texts_walks_both_text_and_elements() {
        let doc = parse_document(
            b"<div><b>Activity Date</b><br>1st window ( Mountain )<br>2nd window ( GMT )</div>",
        );
        let bold = select(&doc, "b");
        let texts = following_texts(bold[0]);
        assert_eq!(texts, vec!["1st window ( Mountain )", "2nd window ( GMT )"]);
    }

    #[test]
    fn table_cell_helpers() {
        let doc = parse_document(
            b"<table><tr><th>Circuit Id</th><th>Impact</th></tr>\
              <tr><td>circ-1</td><td>hard down</td></tr></table>",
        );
        let tables = select(&doc, "table");
        assert_eq!(header_cells(tables[0]), vec!["Circuit Id", "Impact"]);
        assert_eq!(data_cells(tables[0]), vec!["circ-1", "hard down"]);
        assert_eq!(
            table_rows(tables[0]),
            vec![
                vec!["Circuit Id".to_string(), "Impact".to_string()],
                vec!["circ-1".to_string(), "hard down".to_string()],
            ]
        );
    }
}
