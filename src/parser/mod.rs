pub mod detail;
pub mod listing;
pub mod score;

use scraper::{ElementRef, Html};

/// Parse rendered page markup into a queryable document.
pub fn parse(markup: &str) -> Html {
    Html::parse_document(markup)
}

/// Visible text of an element with runs of whitespace collapsed.
pub fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
