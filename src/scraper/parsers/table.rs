//! Table location and cell text helpers shared by the page parsers.
//!
//! boatrace.jp pages carry many `<table>` elements without stable ids, so the
//! relevant one is picked by the visible text it contains.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

pub(crate) static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
pub(crate) static TBODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody").unwrap());
pub(crate) static TR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
pub(crate) static TD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// Return the first table (document order) whose text contains every marker.
///
/// `None` when no table qualifies; callers treat that as a failed page.
pub fn find_table<'a>(document: &'a Html, markers: &[&str]) -> Option<ElementRef<'a>> {
    document.select(&TABLE).find(|table| {
        let text = table.text().collect::<String>();
        markers.iter().all(|marker| text.contains(marker))
    })
}

/// Non-empty, trimmed text nodes of an element, in order.
///
/// A cell such as `7.85<br>58.33<br>75.00` yields three lines.
pub fn cell_lines(elem: &ElementRef) -> Vec<String> {
    elem.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Concatenated trimmed text of an element.
pub fn cell_text(elem: &ElementRef) -> String {
    cell_lines(elem).concat()
}

/// Trimmed text nodes of an element joined with `sep`.
pub fn joined_text(elem: &ElementRef, sep: &str) -> String {
    cell_lines(elem).join(sep)
}

/// All `<td>` cells below an element.
pub fn cells<'a>(elem: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    elem.select(&TD).collect()
}
