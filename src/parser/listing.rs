use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::text_of;

/// Result rows alternate between two classes; their anchors form one
/// sequence in document order.
pub const RESULT_LINK_SELECTOR: &str = ".resultsW a, .resultsY a";

/// Every result row carries two anchors to the same institution, so only
/// every `ANCHORS_PER_RESULT_ROW`-th link is visited.
pub const ANCHORS_PER_RESULT_ROW: usize = 2;

const NEXT_PAGE_LABEL: &str = "Next Page";

static RESULT_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(RESULT_LINK_SELECTOR).unwrap());
static PAGER_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.colorful a").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLink {
    pub text: String,
    pub href: Option<String>,
}

/// One page of a jurisdiction's paginated results.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub links: Vec<ListingLink>,
    pub has_next: bool,
}

impl ListingPage {
    pub fn parse(doc: &Html) -> Self {
        let links = doc
            .select(&RESULT_LINK_SEL)
            .map(|a| ListingLink {
                text: text_of(a),
                href: a.value().attr("href").map(str::to_string),
            })
            .collect();

        // End of listing is the absence of the explicit control, not a short page.
        let has_next = doc
            .select(&PAGER_LINK_SEL)
            .any(|a| text_of(a).contains(NEXT_PAGE_LABEL));

        Self { links, has_next }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn institution_count(&self) -> usize {
        self.links.len().div_ceil(ANCHORS_PER_RESULT_ROW)
    }

    /// Display label for the result row starting at `index`: the first
    /// non-empty anchor text in that row.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.links
            .iter()
            .skip(index)
            .take(ANCHORS_PER_RESULT_ROW)
            .map(|l| l.text.as_str())
            .find(|t| !t.is_empty())
    }
}
