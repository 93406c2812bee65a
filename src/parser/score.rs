use crate::error::MalformedScore;

/// Parse a score cell such as `"1,200"` into an integer. Thousands
/// separators and surrounding whitespace are ignored.
pub fn parse_score(text: &str) -> Result<u32, MalformedScore> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse().map_err(|_| MalformedScore {
        raw: text.to_string(),
    })
}

/// Composite total of two sub-scores. `None` on either side means the total
/// is unavailable.
pub fn combine(reading_writing: Option<u32>, math: Option<u32>) -> Option<u32> {
    reading_writing?.checked_add(math?)
}

/// The two SAT sub-scores behind one percentile's total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PercentileScorePair {
    pub reading_writing: Option<u32>,
    pub math: Option<u32>,
}

impl PercentileScorePair {
    pub fn total(&self) -> Option<u32> {
        combine(self.reading_writing, self.math)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_thousands_separators() {
        assert_eq!(parse_score("1,200"), Ok(1200));
        assert_eq!(parse_score("12,345,678"), Ok(12_345_678));
    }

    #[test]
    fn strips_whitespace() {
        assert_eq!(parse_score("  640\n"), Ok(640));
    }

    #[test]
    fn malformed_scores_fail() {
        for raw in ["", "  ", "-", "n/a", "6 40", "640.5"] {
            let err = parse_score(raw).unwrap_err();
            assert_eq!(err.raw, raw);
        }
    }

    #[test]
    fn unavailable_side_yields_unavailable() {
        for present in [0, 200, 800, u32::MAX] {
            assert_eq!(combine(None, Some(present)), None);
            assert_eq!(combine(Some(present), None), None);
        }
        assert_eq!(combine(None, None), None);
    }

    #[test]
    fn totals_add() {
        assert_eq!(combine(Some(700), Some(700)), Some(1400));
        let pair = PercentileScorePair {
            reading_writing: Some(560),
            math: Some(540),
        };
        assert_eq!(pair.total(), Some(1100));
    }

    #[test]
    fn overflow_is_unavailable() {
        assert_eq!(combine(Some(u32::MAX), Some(1)), None);
    }
}
