mod crawler;
mod db;
mod error;
mod jurisdictions;
mod orchestrator;
mod parser;
mod session;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tracing::info;

use crawler::CrawlSettings;
use session::ChromeSession;

#[derive(Parser)]
#[command(name = "sat_scraper", about = "SAT admissions scores from College Navigator")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = db::DB_PATH)]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl listings and store each institution's SAT totals
    Crawl {
        /// Jurisdiction code to crawl, repeatable (default: all, in list order)
        #[arg(short, long = "state")]
        states: Vec<String>,
        /// Site root the listing URLs are built from
        #[arg(long, default_value = crawler::DEFAULT_BASE_URL)]
        base_url: String,
        /// Pause after every navigation or click, in milliseconds
        #[arg(long, default_value_t = crawler::DEFAULT_SETTLE_MS)]
        settle_ms: u64,
        /// Run Chrome with a visible window
        #[arg(long)]
        show_browser: bool,
    },
    /// Show stored row counts
    Stats,
    /// Stored institutions by median total
    Overview {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let conn = db::connect(&cli.db)?;
    db::init_schema(&conn)?;

    let result = match cli.command {
        Commands::Crawl {
            states,
            base_url,
            settle_ms,
            show_browser,
        } => {
            let selected = jurisdictions::select(&states)?;
            let settings = CrawlSettings {
                base_url,
                settle: Duration::from_millis(settle_ms),
            };
            info!(
                jurisdictions = selected.len(),
                db = %cli.db.display(),
                base_url = %settings.base_url,
                settle_ms,
                "Starting crawl"
            );

            let mut session = ChromeSession::launch(!show_browser)?;
            let summary = orchestrator::crawl_all(&mut session, &conn, &settings, &selected)?;

            let t = summary.totals;
            println!(
                "Done: {} jurisdictions, {} pages, {} institutions visited ({} stored, {} duplicates, {} without admissions data).",
                summary.completed.len(),
                t.pages,
                t.visited,
                t.stored,
                t.duplicates,
                t.no_panel
            );
            if !summary.aborted.is_empty() {
                println!("\nAborted jurisdictions:");
                for (code, reason) in &summary.aborted {
                    println!("  {}: {}", code, reason);
                }
            }
            Ok(())
        }
        Commands::Stats => {
            let s = db::get_stats(&conn)?;
            println!("Stored:    {}", s.total);
            println!("Complete:  {}", s.complete);
            println!("No data:   {}", s.no_data);
            Ok(())
        }
        Commands::Overview { limit, json } => {
            let rows = db::fetch_overview(&conn, limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }
            if rows.is_empty() {
                println!("No institutions stored. Run 'crawl' first.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<40} | {:>5} | {:>5} | {:>5}",
                "#", "Institution", "25th", "50th", "75th"
            );
            println!("{}", "-".repeat(70));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<40} | {:>5} | {:>5} | {:>5}",
                    i + 1,
                    truncate(&r.name, 40),
                    show_score(r.score_25th),
                    show_score(r.score_50th),
                    show_score(r.score_75th)
                );
            }
            println!("\n{} institutions", rows.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn show_score(score: Option<u32>) -> String {
    score.map(|s| s.to_string()).unwrap_or_else(|| "-".into())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
