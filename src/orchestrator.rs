use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{error, info};

use crate::crawler::{CrawlSettings, CrawlStats, Crawler};
use crate::error::CrawlError;
use crate::session::PageSession;

/// Outcome of a full run over the jurisdiction list.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub completed: Vec<String>,
    /// Jurisdictions cut short by a navigation fault, with the fault message.
    pub aborted: Vec<(String, String)>,
    pub totals: CrawlStats,
}

/// Crawl each jurisdiction in order, one at a time. A navigation fault ends
/// only the jurisdiction it occurred in; a store failure ends the run.
pub fn crawl_all<S: PageSession>(
    session: &mut S,
    conn: &Connection,
    settings: &CrawlSettings,
    jurisdictions: &[&str],
) -> Result<RunSummary, rusqlite::Error> {
    let pb = ProgressBar::new(jurisdictions.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let mut summary = RunSummary::default();
    let mut crawler = Crawler::new(session, conn, settings);

    for &code in jurisdictions {
        pb.set_message(code.to_string());
        info!("Processing data for jurisdiction: {}", code);

        match crawler.crawl_jurisdiction(code) {
            Ok(stats) => {
                info!(
                    jurisdiction = code,
                    pages = stats.pages,
                    visited = stats.visited,
                    stored = stats.stored,
                    duplicates = stats.duplicates,
                    no_panel = stats.no_panel,
                    "jurisdiction complete"
                );
                summary.totals.merge(&stats);
                summary.completed.push(code.to_string());
            }
            Err(CrawlError::Navigation(fault)) => {
                error!("Aborting {}: {}", code, fault);
                summary.aborted.push((code.to_string(), fault.to_string()));
            }
            Err(CrawlError::Store(e)) => {
                pb.abandon();
                return Err(e);
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::crawler::fake::{FakeSite, Institution};
    use crate::crawler::listing_url;
    use crate::db;

    const BASE: &str = "http://site.test/nav";

    fn settings() -> CrawlSettings {
        CrawlSettings {
            base_url: BASE.to_string(),
            settle: Duration::ZERO,
        }
    }

    fn scored() -> Institution {
        Institution {
            has_panel: true,
            scores: Some(([500, 550, 600], [510, 560, 610])),
        }
    }

    #[test]
    fn fault_in_one_jurisdiction_does_not_stop_the_next() {
        let mut site = FakeSite::default();
        site.add_listing(&listing_url(BASE, "AL", 1), &["Auburn"], false);
        site.add_listing(&listing_url(BASE, "AK", 1), &["Juneau"], false);
        site.broken.push(listing_url(BASE, "AK", 1));
        site.add_listing(&listing_url(BASE, "AZ", 1), &["Tempe"], false);
        for name in ["Auburn", "Juneau", "Tempe"] {
            site.add_institution(name, scored());
        }
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();

        let summary = crawl_all(&mut site, &conn, &settings(), &["AL", "AK", "AZ"]).unwrap();

        assert_eq!(summary.completed, vec!["AL", "AZ"]);
        assert_eq!(summary.aborted.len(), 1);
        assert_eq!(summary.aborted[0].0, "AK");
        assert_eq!(summary.totals.stored, 2);
        assert_eq!(site.visited, vec!["Auburn", "Tempe"]);
    }

    #[test]
    fn jurisdictions_run_in_given_order() {
        let mut site = FakeSite::default();
        for code in ["WY", "AL"] {
            site.add_listing(&listing_url(BASE, code, 1), &[], false);
        }
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();

        let summary = crawl_all(&mut site, &conn, &settings(), &["WY", "AL"]).unwrap();

        assert_eq!(
            site.navigations,
            vec![listing_url(BASE, "WY", 1), listing_url(BASE, "AL", 1)]
        );
        assert_eq!(summary.totals.visited, 0);
        assert_eq!(summary.totals.pages, 2);
    }

    #[test]
    fn store_failure_ends_the_run() {
        let mut site = FakeSite::default();
        site.add_listing(&listing_url(BASE, "AL", 1), &["Auburn"], false);
        site.add_listing(&listing_url(BASE, "AK", 1), &["Juneau"], false);
        site.add_institution("Auburn", scored());
        site.add_institution("Juneau", scored());
        // No schema: the first upsert fails.
        let conn = rusqlite::Connection::open_in_memory().unwrap();

        assert!(crawl_all(&mut site, &conn, &settings(), &["AL", "AK"]).is_err());
        assert_eq!(site.visited, vec!["Auburn"]);
    }
}
