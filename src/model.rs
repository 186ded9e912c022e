/// Shared data types for the groundwater monitoring core.
///
/// Everything the registry, alert feed, and aggregation layers exchange is
/// defined here so that no module needs to reach into another's internals.
/// Presentation-facing types derive `Serialize`; the core itself never
/// encodes anything.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Classification enums
// ---------------------------------------------------------------------------

/// Station health derived from the current water level against its
/// calibrated bands. Classification is total: every reading maps to
/// exactly one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Warning,
    Critical,
}

impl Status {
    /// Presentation label keyed by variant. Rendering (colors, icons)
    /// belongs entirely to the presentation layer; the core only names
    /// the variant.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Normal => "normal",
            Status::Warning => "warning",
            Status::Critical => "critical",
        }
    }
}

/// Direction of the water level between the last two readings.
/// Rising means the aquifer is recovering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Stable,
    Declining,
}

impl Trend {
    pub fn label(&self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Stable => "stable",
            Trend::Declining => "declining",
        }
    }
}

// ---------------------------------------------------------------------------
// Stations
// ---------------------------------------------------------------------------

/// Per-station classification bands, in meters of water column.
///
/// Bands are calibrated per station because baseline aquifer depth varies
/// by region — a single national threshold would misclassify naturally
/// shallow or deep aquifers. Invariant: `critical_below_m < warning_below_m`,
/// enforced at configuration load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdBands {
    /// Levels strictly below this are Critical.
    pub critical_below_m: f64,
    /// Levels strictly below this (and at or above critical) are Warning.
    pub warning_below_m: f64,
}

/// A single DWLR (Digital Water Level Recorder) station.
///
/// Owned exclusively by `StationRegistry`; mutated only through
/// `StationRegistry::update`.
#[derive(Debug, Clone, Serialize)]
pub struct Station {
    /// Unique station identifier, e.g. "DWLR001".
    pub id: String,
    /// Human-readable location name.
    pub name: String,
    /// Geographic region the station rolls up into.
    pub region: String,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Calibrated classification bands for this station's aquifer.
    pub bands: ThresholdBands,
    /// Most recent water level, meters. Never negative.
    pub water_level_m: f64,
    pub status: Status,
    pub trend: Trend,
    /// Timestamp of the most recent accepted reading.
    pub last_reading_at: DateTime<Utc>,
}

/// Emitted by `StationRegistry::update` when a reading moves a station
/// across a band boundary. Consumed by the alert feed.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub station_id: String,
    pub station_name: String,
    pub from: Status,
    pub to: Status,
    pub water_level_m: f64,
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Critical,
    Warning,
    Info,
}

/// An alert the feed has accepted: stamped with a unique id and creation
/// time, immutable from then on. Dismissal is removal, never an update.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: u64,
    pub kind: AlertKind,
    pub message: String,
    /// Weak reference — lookup only, never holds the station alive.
    pub station_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An alert as produced by a source or a classification transition,
/// before the feed stamps id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub kind: AlertKind,
    pub message: String,
    pub station_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Per-region station counts by status. Derived on read, never stored.
/// Invariant: `critical + warning + normal == total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionalAggregate {
    pub region: String,
    pub total: usize,
    pub critical: usize,
    pub warning: usize,
    pub normal: usize,
}

/// A categorical contributor to groundwater decline.
///
/// `share_percent` values across all configured factors must sum to 100
/// (± tolerance, checked at load). `pressure` expresses how hard the
/// factor draws on the aquifer, 0 (benign) to 100 (fully depleting).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepletionFactor {
    pub name: String,
    pub share_percent: f64,
    pub pressure: f64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by registry operations.
///
/// Feed eviction at capacity is deliberately absent: it is normal
/// operation, handled internally, and never reported to callers.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("unknown station id '{0}'")]
    NotFound(String),

    #[error("invalid reading for station '{station_id}': {reason}")]
    InvalidReading { station_id: String, reason: String },
}
