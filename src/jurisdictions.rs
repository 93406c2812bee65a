/// Jurisdiction codes in crawl order: the 50 states plus DC.
pub const STATES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH",
    "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY",
];

/// Resolve user-supplied codes against [`STATES`], keeping the fixed crawl
/// order. An empty request selects every jurisdiction.
pub fn select(requested: &[String]) -> anyhow::Result<Vec<&'static str>> {
    if requested.is_empty() {
        return Ok(STATES.to_vec());
    }

    let wanted: Vec<String> = requested.iter().map(|s| s.trim().to_uppercase()).collect();
    if let Some(unknown) = wanted.iter().find(|w| !STATES.contains(&w.as_str())) {
        anyhow::bail!("unknown jurisdiction code: {}", unknown);
    }

    Ok(STATES
        .iter()
        .copied()
        .filter(|code| wanted.iter().any(|w| w == code))
        .collect())
}
