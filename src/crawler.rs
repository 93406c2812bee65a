use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::db::{self, UpsertOutcome};
use crate::error::{CrawlError, NavigationFault};
use crate::parser::detail::extract_record;
use crate::parser::listing::{ListingPage, ANCHORS_PER_RESULT_ROW, RESULT_LINK_SELECTOR};
use crate::parser::parse;
use crate::session::{ElementHandle, PageSession};

pub const DEFAULT_BASE_URL: &str = "https://nces.ed.gov/collegenavigator";
pub const DEFAULT_SETTLE_MS: u64 = 1000;

/// Trigger of the collapsible admissions panel on a detail page.
pub const ADMISSIONS_PANEL_SELECTOR: &str = ".collapsing2 a";

#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub base_url: String,
    /// Pause after every navigation, click and history step so the page can
    /// finish rendering before it is read.
    pub settle: Duration,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
        }
    }
}

pub fn listing_url(base_url: &str, jurisdiction: &str, page_number: usize) -> String {
    format!(
        "{}/?s={}&pg={}",
        base_url.trim_end_matches('/'),
        jurisdiction,
        page_number
    )
}

/// Position within one jurisdiction's listing. Lives only for that crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCursor {
    pub jurisdiction: String,
    pub page_number: usize,
    pub link_index: usize,
}

impl ListingCursor {
    pub fn new(jurisdiction: &str) -> Self {
        Self {
            jurisdiction: jurisdiction.to_string(),
            page_number: 1,
            link_index: 0,
        }
    }

    pub fn advance_link(&mut self) {
        self.link_index += ANCHORS_PER_RESULT_ROW;
    }

    pub fn next_page(&mut self) {
        self.page_number += 1;
        self.link_index = 0;
    }
}

/// What happened to one listing link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitOutcome {
    Stored(String),
    Duplicate(String),
    NoAdmissionsPanel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages: usize,
    pub visited: usize,
    pub stored: usize,
    pub duplicates: usize,
    pub no_panel: usize,
}

impl CrawlStats {
    fn record(&mut self, outcome: &VisitOutcome) {
        self.visited += 1;
        match outcome {
            VisitOutcome::Stored(_) => self.stored += 1,
            VisitOutcome::Duplicate(_) => self.duplicates += 1,
            VisitOutcome::NoAdmissionsPanel => self.no_panel += 1,
        }
    }

    pub fn merge(&mut self, other: &CrawlStats) {
        self.pages += other.pages;
        self.visited += other.visited;
        self.stored += other.stored;
        self.duplicates += other.duplicates;
        self.no_panel += other.no_panel;
    }
}

/// Walks every listing page of a jurisdiction, drilling into each
/// institution and storing what its admissions panel reports.
pub struct Crawler<'a, S: PageSession> {
    session: &'a mut S,
    conn: &'a Connection,
    settings: &'a CrawlSettings,
}

impl<'a, S: PageSession> Crawler<'a, S> {
    pub fn new(session: &'a mut S, conn: &'a Connection, settings: &'a CrawlSettings) -> Self {
        Self {
            session,
            conn,
            settings,
        }
    }

    /// Crawl one jurisdiction to the end of its listing. A navigation fault
    /// aborts the crawl; nothing is retried.
    pub fn crawl_jurisdiction(&mut self, jurisdiction: &str) -> Result<CrawlStats, CrawlError> {
        let mut cursor = ListingCursor::new(jurisdiction);
        let mut stats = CrawlStats::default();

        loop {
            let url = listing_url(&self.settings.base_url, &cursor.jurisdiction, cursor.page_number);
            self.navigate(&url)?;
            stats.pages += 1;

            let mut listing = self.read_listing()?;
            if listing.is_empty() {
                info!("{} page {}: no results listed", cursor.jurisdiction, cursor.page_number);
            } else {
                info!(
                    "{} page {}: {} institutions",
                    cursor.jurisdiction,
                    cursor.page_number,
                    listing.institution_count()
                );
            }

            while cursor.link_index < listing.len() {
                let label = listing.label(cursor.link_index).unwrap_or("?").to_string();
                debug!(
                    page = cursor.page_number,
                    link = cursor.link_index,
                    href = ?listing.links[cursor.link_index].href,
                    "visiting {}",
                    label
                );
                let outcome = self.visit(cursor.link_index)?;
                match &outcome {
                    VisitOutcome::Stored(name) => info!("Stored {}", name),
                    VisitOutcome::Duplicate(name) => info!("{} already stored, skipping", name),
                    VisitOutcome::NoAdmissionsPanel => {
                        info!("No admissions information for {}, skipping", label)
                    }
                }
                stats.record(&outcome);
                cursor.advance_link();

                // Handles from before the visit are not trusted after going back.
                listing = self.read_listing()?;
            }

            if !listing.has_next {
                info!("{}: no more pages after page {}", cursor.jurisdiction, cursor.page_number);
                break;
            }
            cursor.next_page();
        }

        Ok(stats)
    }

    /// Open the institution behind listing link `index`, extract and store its
    /// scores, then return to the listing.
    fn visit(&mut self, index: usize) -> Result<VisitOutcome, CrawlError> {
        let links = self.session.find(RESULT_LINK_SELECTOR)?;
        let link = links.get(index).ok_or_else(|| NavigationFault::StaleElement {
            selector: RESULT_LINK_SELECTOR.to_string(),
            index,
        })?;
        self.click(link)?;
        let mut depth = 1;

        let outcome = match self.session.find(ADMISSIONS_PANEL_SELECTOR)?.first() {
            None => VisitOutcome::NoAdmissionsPanel,
            Some(trigger) => {
                self.click(trigger)?;
                depth += 1;

                let markup = self.session.current_markup()?;
                let record = extract_record(&parse(&markup));
                debug!(?record, "extracted");
                match db::upsert(self.conn, &record)? {
                    UpsertOutcome::Inserted => VisitOutcome::Stored(record.name),
                    UpsertOutcome::Skipped => VisitOutcome::Duplicate(record.name),
                }
            }
        };

        // Back once per page opened, not a fixed two: a skipped visit opened only one.
        for _ in 0..depth {
            self.go_back()?;
        }
        Ok(outcome)
    }

    fn read_listing(&mut self) -> Result<ListingPage, NavigationFault> {
        let markup = self.session.current_markup()?;
        Ok(ListingPage::parse(&parse(&markup)))
    }

    fn navigate(&mut self, url: &str) -> Result<(), NavigationFault> {
        self.session.navigate(url)?;
        self.settle();
        Ok(())
    }

    fn click(&mut self, element: &ElementHandle) -> Result<(), NavigationFault> {
        self.session.click(element)?;
        self.settle();
        Ok(())
    }

    fn go_back(&mut self) -> Result<(), NavigationFault> {
        self.session.go_back()?;
        self.settle();
        Ok(())
    }

    fn settle(&self) {
        if !self.settings.settle.is_zero() {
            std::thread::sleep(self.settings.settle);
        }
    }
}
