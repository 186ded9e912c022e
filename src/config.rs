/// Network configuration loader - parses stations.toml
///
/// Separates station metadata from code, making it easy to recalibrate
/// bands, add stations, or adjust engine timing without recompiling.
/// Per-station bands live here rather than as code constants: baseline
/// aquifer depth varies by region, so thresholds are calibration data.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::model::{DepletionFactor, ThresholdBands};

/// Shares may drift from an exact 100 through rounding in the source data.
pub const SHARE_SUM_TOLERANCE: f64 = 0.5;

// ---------------------------------------------------------------------------
// TOML structures
// ---------------------------------------------------------------------------

/// Root configuration structure for TOML parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(rename = "factor")]
    pub factors: Vec<FactorConfig>,
    #[serde(rename = "station")]
    pub stations: Vec<StationConfig>,
}

/// Engine timing and sizing knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Alert feed capacity; oldest entries are evicted beyond this.
    pub feed_capacity: usize,
    /// Seconds between polls of the background alert source.
    pub alert_interval_secs: i64,
    /// Simulated delay before a manual refresh completes, seconds.
    pub refresh_delay_secs: i64,
    /// Dead-band for trend classification, meters. Deltas with absolute
    /// value at or below this read as Stable.
    pub trend_epsilon_m: f64,
    /// Rolling history samples retained per station for trend and charting.
    pub history_window: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            feed_capacity: 5,
            alert_interval_secs: 30,
            refresh_delay_secs: 2,
            trend_epsilon_m: 0.05,
            history_window: 96,
        }
    }
}

/// One depletion factor entry from stations.toml.
#[derive(Debug, Clone, Deserialize)]
pub struct FactorConfig {
    pub name: String,
    pub share_percent: f64,
    pub pressure: f64,
}

/// Station metadata loaded from stations.toml.
#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub id: String,
    pub name: String,
    pub region: String,

    // Geographic location
    pub latitude: f64,
    pub longitude: f64,

    /// Water level the registry is seeded with, meters.
    pub initial_level_m: f64,

    // Calibrated classification bands for this station's aquifer
    pub critical_below_m: f64,
    pub warning_below_m: f64,
}

impl From<&StationConfig> for ThresholdBands {
    fn from(config: &StationConfig) -> Self {
        ThresholdBands {
            critical_below_m: config.critical_below_m,
            warning_below_m: config.warning_below_m,
        }
    }
}

impl From<&FactorConfig> for DepletionFactor {
    fn from(config: &FactorConfig) -> Self {
        DepletionFactor {
            name: config.name.clone(),
            share_percent: config.share_percent,
            pressure: config.pressure,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no stations configured")]
    NoStations,

    #[error("feed_capacity must be at least 1")]
    ZeroFeedCapacity,

    #[error("trend_epsilon_m must not be negative, got {epsilon_m}")]
    NegativeTrendEpsilon { epsilon_m: f64 },

    #[error("duplicate station id '{0}'")]
    DuplicateStation(String),

    #[error(
        "invalid bands for station '{station_id}': critical_below_m \
         ({critical_below_m}) must be below warning_below_m ({warning_below_m})"
    )]
    InvalidBands {
        station_id: String,
        critical_below_m: f64,
        warning_below_m: f64,
    },

    #[error("negative initial level {level_m} for station '{station_id}'")]
    NegativeLevel { station_id: String, level_m: f64 },

    #[error("depletion factor shares sum to {sum}, expected 100 within {tolerance}")]
    BadFactorShares { sum: f64, tolerance: f64 },

    #[error("pressure {pressure} for factor '{name}' is outside [0, 100]")]
    BadFactorPressure { name: String, pressure: f64 },
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load and validate network configuration from a TOML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<NetworkConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: NetworkConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

/// Load from the default location (stations.toml in the working directory).
pub fn load_config_default() -> Result<NetworkConfig, ConfigError> {
    load_config("stations.toml")
}

impl NetworkConfig {
    /// Checks the structural invariants the rest of the core relies on.
    /// The engine refuses to start on any violation — it cannot operate
    /// with miscalibrated bands or inconsistent factor shares.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.feed_capacity == 0 {
            return Err(ConfigError::ZeroFeedCapacity);
        }
        if self.engine.trend_epsilon_m < 0.0 {
            // A negative dead-band would make an unchanged level classify
            // as Declining.
            return Err(ConfigError::NegativeTrendEpsilon {
                epsilon_m: self.engine.trend_epsilon_m,
            });
        }

        if self.stations.is_empty() {
            return Err(ConfigError::NoStations);
        }

        let mut seen = std::collections::HashSet::new();
        for station in &self.stations {
            if !seen.insert(station.id.as_str()) {
                return Err(ConfigError::DuplicateStation(station.id.clone()));
            }
            if station.critical_below_m >= station.warning_below_m {
                return Err(ConfigError::InvalidBands {
                    station_id: station.id.clone(),
                    critical_below_m: station.critical_below_m,
                    warning_below_m: station.warning_below_m,
                });
            }
            if station.initial_level_m < 0.0 {
                return Err(ConfigError::NegativeLevel {
                    station_id: station.id.clone(),
                    level_m: station.initial_level_m,
                });
            }
        }

        let sum: f64 = self.factors.iter().map(|f| f.share_percent).sum();
        if !self.factors.is_empty() && (sum - 100.0).abs() > SHARE_SUM_TOLERANCE {
            return Err(ConfigError::BadFactorShares {
                sum,
                tolerance: SHARE_SUM_TOLERANCE,
            });
        }
        for factor in &self.factors {
            if !(0.0..=100.0).contains(&factor.pressure) {
                return Err(ConfigError::BadFactorPressure {
                    name: factor.name.clone(),
                    pressure: factor.pressure,
                });
            }
        }

        Ok(())
    }

    /// Depletion factors as model types, in configured order.
    pub fn depletion_factors(&self) -> Vec<DepletionFactor> {
        self.factors.iter().map(DepletionFactor::from).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
