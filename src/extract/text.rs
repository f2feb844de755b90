//! Element text rendering.

use scraper::{ElementRef, Node};

/// Render the visible text of an element.
///
/// Whitespace runs inside text nodes, source newlines included, collapse to
/// a single space and `<br>` becomes a line break, roughly what a browser
/// reports as `innerText` for inline content. Each line is trimmed.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => raw.extend(text.chars().map(|c| match c {
                '\n' | '\r' => ' ',
                other => other,
            })),
            Node::Element(el) if el.name() == "br" => raw.push('\n'),
            _ => {}
        }
    }
    normalize_text(&raw)
}

/// Collapse whitespace within lines and trim the result.
pub fn normalize_text(raw: &str) -> String {
    raw.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
