/// Water level severity evaluation against per-station calibrated bands.
///
/// Classification is a pure, total function of `(level, bands)`: every
/// non-negative reading maps to exactly one `Status`. Trend is evaluated
/// separately from the signed delta between the last two readings, with an
/// inclusive dead-band so sensor jitter reads as Stable.

use crate::model::{AlertDraft, AlertKind, Status, StatusChange, ThresholdBands, Trend};

// ---------------------------------------------------------------------------
// Status classification
// ---------------------------------------------------------------------------

/// Classify a water level against a station's bands.
///
/// Band boundaries are exclusive on the low side: a level exactly at
/// `critical_below_m` is Warning, exactly at `warning_below_m` is Normal.
pub fn classify_level(level_m: f64, bands: &ThresholdBands) -> Status {
    if level_m < bands.critical_below_m {
        Status::Critical
    } else if level_m < bands.warning_below_m {
        Status::Warning
    } else {
        Status::Normal
    }
}

// ---------------------------------------------------------------------------
// Trend classification
// ---------------------------------------------------------------------------

/// Classify the trend between two consecutive readings.
///
/// The dead-band is inclusive: a delta of exactly `epsilon_m` is Stable.
/// A positive delta beyond the dead-band means the aquifer is recovering.
pub fn classify_trend(previous_m: f64, current_m: f64, epsilon_m: f64) -> Trend {
    let delta = current_m - previous_m;
    if delta.abs() <= epsilon_m {
        Trend::Stable
    } else if delta > 0.0 {
        Trend::Rising
    } else {
        Trend::Declining
    }
}

// ---------------------------------------------------------------------------
// Transition alerts
// ---------------------------------------------------------------------------

/// Build the alert a classification transition should place on the feed.
///
/// Entering Critical or Warning carries the matching severity; recovery to
/// Normal is informational. The message names the station so the feed is
/// readable without a registry lookup (the station reference itself stays
/// weak).
pub fn transition_alert(change: &StatusChange) -> AlertDraft {
    let (kind, message) = match change.to {
        Status::Critical => (
            AlertKind::Critical,
            format!(
                "{}: Water level dropped below critical threshold ({:.1}m)",
                change.station_name, change.water_level_m
            ),
        ),
        Status::Warning => (
            AlertKind::Warning,
            format!(
                "{}: Water level entered warning band ({:.1}m)",
                change.station_name, change.water_level_m
            ),
        ),
        Status::Normal => (
            AlertKind::Info,
            format!(
                "{}: Water level recovered to normal ({:.1}m)",
                change.station_name, change.water_level_m
            ),
        ),
    };

    AlertDraft {
        kind,
        message,
        station_id: Some(change.station_id.clone()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
