/// Read-only search and filter projection over the registry.
///
/// A stateless view for the presentation layer's station browser: no side
/// effects, no mutation, safe to call as often as the UI re-renders.

use crate::model::Station;

/// Region value meaning "do not filter by region".
pub const ALL_REGIONS: &str = "all";

/// Filter stations by search text and region.
///
/// Search is a case-insensitive substring match against station id and
/// name; the empty string matches everything. Region is an exact match
/// unless it is `"all"`. Output preserves registry insertion order.
pub fn filter<'a>(stations: &'a [Station], search_text: &str, region: &str) -> Vec<&'a Station> {
    let needle = search_text.to_lowercase();
    stations
        .iter()
        .filter(|s| region == ALL_REGIONS || s.region == region)
        .filter(|s| {
            needle.is_empty()
                || s.id.to_lowercase().contains(&needle)
                || s.name.to_lowercase().contains(&needle)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
