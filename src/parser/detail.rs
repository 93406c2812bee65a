use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use super::score::{parse_score, PercentileScorePair};
use super::text_of;
use crate::db::InstitutionRecord;

pub const UNKNOWN_NAME: &str = "Unknown College";

const READING_WRITING_LABEL: &str = "SAT Evidence-Based Reading and Writing";
const MATH_LABEL: &str = "SAT Math";
const PERCENTILES: [&str; 3] = ["25th", "50th", "75th"];

static NAME_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.headerlg").unwrap());
static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table.tabular").unwrap());
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// One labelled row's 25th/50th/75th percentile cells.
type PercentileCells = [Option<u32>; 3];

/// The score rows found on a detail page.
///
/// Matching is by label text, not by table position. Only the first row
/// carrying each label is kept; later rows with the same label are ignored,
/// as are rows carrying neither label.
#[derive(Debug, Default)]
struct ScoreRows {
    reading_writing: Option<PercentileCells>,
    math: Option<PercentileCells>,
}

impl ScoreRows {
    fn pair(&self, percentile: usize) -> PercentileScorePair {
        PercentileScorePair {
            reading_writing: self.reading_writing.and_then(|cells| cells[percentile]),
            math: self.math.and_then(|cells| cells[percentile]),
        }
    }
}

/// Build an institution record from an expanded detail page.
///
/// Never fails: a missing name becomes [`UNKNOWN_NAME`], and missing tables,
/// rows, cells or unparseable cells leave the affected totals unavailable.
pub fn extract_record(doc: &Html) -> InstitutionRecord {
    let name = extract_name(doc);
    let rows = find_score_rows(doc, &name);

    InstitutionRecord {
        score_25th: rows.pair(0).total(),
        score_50th: rows.pair(1).total(),
        score_75th: rows.pair(2).total(),
        name,
    }
}

fn extract_name(doc: &Html) -> String {
    doc.select(&NAME_SEL)
        .next()
        .map(text_of)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

fn find_score_rows(doc: &Html, name: &str) -> ScoreRows {
    let mut found = ScoreRows::default();

    for row in doc.select(&TABLE_SEL).flat_map(|table| table.select(&ROW_SEL)) {
        let text = text_of(row);
        if text.contains(READING_WRITING_LABEL) {
            if found.reading_writing.is_none() {
                found.reading_writing = Some(read_cells(row, name, READING_WRITING_LABEL));
            }
        } else if text.contains(MATH_LABEL) && found.math.is_none() {
            found.math = Some(read_cells(row, name, MATH_LABEL));
        }
    }

    found
}

/// Cells after the label cell, in percentile order. Absent or malformed
/// cells are `None`.
fn read_cells(row: ElementRef<'_>, name: &str, label: &str) -> PercentileCells {
    let mut cells = [None; 3];
    for (slot, cell) in row.select(&CELL_SEL).skip(1).take(3).enumerate() {
        let raw = text_of(cell);
        match parse_score(&raw) {
            Ok(score) => cells[slot] = Some(score),
            Err(e) => warn!(
                college = name,
                row = label,
                percentile = PERCENTILES[slot],
                "{}, treating as unavailable",
                e
            ),
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn fixture(name: &str) -> Html {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
        parse(&html)
    }

    #[test]
    fn full_scores_are_summed() {
        let record = extract_record(&fixture("detail_full"));
        assert_eq!(record.name, "Auburn University");
        assert_eq!(record.score_25th, Some(560 + 540));
        assert_eq!(record.score_50th, Some(610 + 600));
        assert_eq!(record.score_75th, Some(660 + 670));
    }

    #[test]
    fn missing_math_row_leaves_all_unavailable() {
        let record = extract_record(&fixture("detail_missing_math"));
        assert_eq!(record.name, "Alabama State University");
        assert_eq!(record.score_25th, None);
        assert_eq!(record.score_50th, None);
        assert_eq!(record.score_75th, None);
    }

    #[test]
    fn page_without_tables() {
        let record = extract_record(&fixture("detail_no_tables"));
        assert_eq!(record.name, "Birmingham Southern College");
        assert!(record.score_25th.is_none() && record.score_50th.is_none() && record.score_75th.is_none());
    }

    #[test]
    fn first_matching_row_wins() {
        let record = extract_record(&fixture("detail_duplicate_rows"));
        // Later rows repeat both labels with other figures and must be ignored.
        assert_eq!(record.score_25th, Some(1200));
        assert_eq!(record.score_50th, Some(1300));
        assert_eq!(record.score_75th, Some(1400));
    }

    #[test]
    fn missing_name_uses_placeholder() {
        let doc = parse("<html><body><p>nothing here</p></body></html>");
        let record = extract_record(&doc);
        assert_eq!(record.name, UNKNOWN_NAME);
        assert_eq!(record.score_50th, None);
    }

    #[test]
    fn short_row_and_malformed_cell() {
        let doc = parse(
            r#"<span class="headerlg"> Test College </span>
            <table class="tabular">
              <tr><td>SAT Evidence-Based Reading and Writing</td><td>500</td><td>n/a</td><td>1,000</td></tr>
              <tr><td>SAT Math</td><td>450</td><td>550</td></tr>
            </table>"#,
        );
        let record = extract_record(&doc);
        assert_eq!(record.name, "Test College");
        assert_eq!(record.score_25th, Some(950));
        assert_eq!(record.score_50th, None);
        assert_eq!(record.score_75th, None);
    }

    #[test]
    fn rows_split_across_tables() {
        let doc = parse(
            r#"<table class="tabular"><tr><td>SAT Math</td><td>500</td><td>550</td><td>600</td></tr></table>
            <table class="other"><tr><td>SAT Evidence-Based Reading and Writing</td><td>1</td><td>1</td><td>1</td></tr></table>
            <table class="tabular"><tr><td>SAT Evidence-Based Reading and Writing</td><td>510</td><td>560</td><td>610</td></tr></table>"#,
        );
        let record = extract_record(&doc);
        assert_eq!(record.score_25th, Some(1010));
        assert_eq!(record.score_50th, Some(1110));
        assert_eq!(record.score_75th, Some(1210));
    }
}
