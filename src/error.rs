use thiserror::Error;

/// Any failure reported by the page session. Not retried: it aborts the
/// jurisdiction being crawled.
#[derive(Debug, Error)]
pub enum NavigationFault {
    #[error("navigation to {url} failed: {reason}")]
    Navigate { url: String, reason: String },
    #[error("lookup of `{selector}` failed: {reason}")]
    Find { selector: String, reason: String },
    #[error("click on `{selector}`[{index}] failed: {reason}")]
    Click {
        selector: String,
        index: usize,
        reason: String,
    },
    #[error("element `{selector}`[{index}] is no longer on the page")]
    StaleElement { selector: String, index: usize },
    #[error("history back failed: {0}")]
    Back(String),
    #[error("reading page markup failed: {0}")]
    Markup(String),
}

/// A score cell that is present but not an integer.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed score {raw:?}")]
pub struct MalformedScore {
    pub raw: String,
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Navigation(#[from] NavigationFault),
    #[error("score store failed: {0}")]
    Store(#[from] rusqlite::Error),
}
