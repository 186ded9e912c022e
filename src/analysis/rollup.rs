/// Regional rollups and the national sustainability index.
///
/// Both are derived in a single pass over current registry state and are
/// recomputed on every call. The registry is small; correctness under
/// interleaved updates matters more than recomputation cost.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{DepletionFactor, RegionalAggregate, Station, Status};

// ---------------------------------------------------------------------------
// Regional rollup
// ---------------------------------------------------------------------------

/// Count stations by status within each region.
///
/// One aggregate per distinct region value, ordered by first appearance in
/// the station list, so rollup rows line up with registry ordering.
/// Invariant: `critical + warning + normal == total` for every entry.
pub fn regional_rollup(stations: &[Station]) -> Vec<RegionalAggregate> {
    let mut aggregates: Vec<RegionalAggregate> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for station in stations {
        let pos = match positions.get(station.region.as_str()) {
            Some(&pos) => pos,
            None => {
                positions.insert(station.region.as_str(), aggregates.len());
                aggregates.push(RegionalAggregate {
                    region: station.region.clone(),
                    total: 0,
                    critical: 0,
                    warning: 0,
                    normal: 0,
                });
                aggregates.len() - 1
            }
        };

        let entry = &mut aggregates[pos];
        entry.total += 1;
        match station.status {
            Status::Critical => entry.critical += 1,
            Status::Warning => entry.warning += 1,
            Status::Normal => entry.normal += 1,
        }
    }

    aggregates
}

// ---------------------------------------------------------------------------
// Sustainability index
// ---------------------------------------------------------------------------

/// Composite aquifer health score in [0, 100].
///
/// Each depletion factor contributes `share_percent * pressure / 100`
/// points of load; the index is 100 minus the total load, clamped. Shares
/// are validated to sum to 100 at config load, so a fully benign network
/// (all pressures 0) scores 100 and a fully depleting one scores 0.
pub fn sustainability_index(factors: &[DepletionFactor]) -> f64 {
    let load: f64 = factors
        .iter()
        .map(|f| f.share_percent * f.pressure / 100.0)
        .sum();
    (100.0 - load).clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Network summary
// ---------------------------------------------------------------------------

/// Headline metrics for the whole network, as a dashboard would surface
/// them: station count, mean level, index, and live alert count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkSummary {
    pub station_count: usize,
    pub average_level_m: f64,
    pub sustainability_index: f64,
    pub active_alerts: usize,
}

pub fn network_summary(
    stations: &[Station],
    factors: &[DepletionFactor],
    active_alerts: usize,
) -> NetworkSummary {
    let average_level_m = if stations.is_empty() {
        0.0
    } else {
        stations.iter().map(|s| s.water_level_m).sum::<f64>() / stations.len() as f64
    };

    NetworkSummary {
        station_count: stations.len(),
        average_level_m,
        sustainability_index: sustainability_index(factors),
        active_alerts,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
