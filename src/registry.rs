/// Station registry: the single source of truth for station state.
///
/// Owns every `Station` record. All mutation flows through `update`, which
/// validates the reading, reclassifies status, recomputes trend, and
/// appends to the per-station rolling history in one step — no caller can
/// observe a station with a new level but a stale status.
///
/// Stations are seeded at construction from configuration and never
/// removed during a session. `list` preserves insertion order.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

use crate::alert::thresholds;
use crate::config::StationConfig;
use crate::model::{RegistryError, Station, StatusChange, ThresholdBands, Trend};

/// One accepted reading, retained for trend and chart projections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSample {
    pub timestamp: DateTime<Utc>,
    pub level_m: f64,
}

pub struct StationRegistry {
    stations: Vec<Station>,
    index: HashMap<String, usize>,
    history: HashMap<String, VecDeque<LevelSample>>,
    trend_epsilon_m: f64,
    history_window: usize,
}

impl StationRegistry {
    /// Seed the registry from validated configuration. Each station starts
    /// at its configured level, classified against its own bands, with a
    /// Stable trend (there is no prior reading to compare against).
    ///
    /// Config is assumed validated (`NetworkConfig::validate`); duplicate
    /// ids or inverted bands never reach this point.
    pub fn from_configs(
        configs: &[StationConfig],
        trend_epsilon_m: f64,
        history_window: usize,
        seeded_at: DateTime<Utc>,
    ) -> Self {
        let mut registry = Self {
            stations: Vec::with_capacity(configs.len()),
            index: HashMap::with_capacity(configs.len()),
            history: HashMap::with_capacity(configs.len()),
            trend_epsilon_m,
            history_window: history_window.max(2),
        };

        for config in configs {
            let bands = ThresholdBands::from(config);
            let station = Station {
                id: config.id.clone(),
                name: config.name.clone(),
                region: config.region.clone(),
                latitude: config.latitude,
                longitude: config.longitude,
                bands,
                water_level_m: config.initial_level_m,
                status: thresholds::classify_level(config.initial_level_m, &bands),
                trend: Trend::Stable,
                last_reading_at: seeded_at,
            };

            registry.index.insert(station.id.clone(), registry.stations.len());
            let mut samples = VecDeque::with_capacity(registry.history_window);
            samples.push_back(LevelSample {
                timestamp: seeded_at,
                level_m: config.initial_level_m,
            });
            registry.history.insert(station.id.clone(), samples);
            registry.stations.push(station);
        }

        registry
    }

    /// Look up a station by id.
    pub fn get(&self, id: &str) -> Result<&Station, RegistryError> {
        self.index
            .get(id)
            .map(|&pos| &self.stations[pos])
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// All stations, in insertion order.
    pub fn list(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// The rolling window of accepted readings for a station, oldest first.
    pub fn history(&self, id: &str) -> Result<&VecDeque<LevelSample>, RegistryError> {
        self.history
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Apply a new sensor reading to a station.
    ///
    /// Rejects negative levels and timestamps that do not advance past the
    /// station's last accepted reading. On success the station's status,
    /// trend, level, and history are updated together; the return value is
    /// `Some(StatusChange)` iff the reading moved the station across a band
    /// boundary.
    pub fn update(
        &mut self,
        id: &str,
        water_level_m: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<StatusChange>, RegistryError> {
        let pos = *self
            .index
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        if water_level_m < 0.0 {
            return Err(RegistryError::InvalidReading {
                station_id: id.to_string(),
                reason: format!("negative water level {}", water_level_m),
            });
        }

        let station = &mut self.stations[pos];
        if timestamp <= station.last_reading_at {
            return Err(RegistryError::InvalidReading {
                station_id: id.to_string(),
                reason: format!(
                    "timestamp {} does not advance past last reading at {}",
                    timestamp, station.last_reading_at
                ),
            });
        }

        let previous_level = station.water_level_m;
        let previous_status = station.status;

        station.water_level_m = water_level_m;
        station.status = thresholds::classify_level(water_level_m, &station.bands);
        station.trend =
            thresholds::classify_trend(previous_level, water_level_m, self.trend_epsilon_m);
        station.last_reading_at = timestamp;

        let samples = self.history.entry(id.to_string()).or_default();
        samples.push_back(LevelSample {
            timestamp,
            level_m: water_level_m,
        });
        while samples.len() > self.history_window {
            samples.pop_front();
        }

        if station.status != previous_status {
            Ok(Some(StatusChange {
                station_id: station.id.clone(),
                station_name: station.name.clone(),
                from: previous_status,
                to: station.status,
                water_level_m,
            }))
        } else {
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;
    use chrono::{Duration, TimeZone};

    fn seed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn station_config(id: &str, region: &str, level: f64) -> StationConfig {
        StationConfig {
            id: id.to_string(),
            name: format!("Station {}", id),
            region: region.to_string(),
            latitude: 28.6,
            longitude: 77.2,
            initial_level_m: level,
            critical_below_m: 30.0,
            warning_below_m: 40.0,
        }
    }

    fn registry() -> StationRegistry {
        StationRegistry::from_configs(
            &[
                station_config("DWLR001", "North", 45.2),
                station_config("DWLR002", "West", 32.8),
                station_config("DWLR003", "South", 28.5),
            ],
            0.05,
            96,
            seed_time(),
        )
    }

    #[test]
    fn test_seeding_classifies_initial_levels() {
        let reg = registry();
        assert_eq!(reg.get("DWLR001").unwrap().status, Status::Normal);
        assert_eq!(reg.get("DWLR002").unwrap().status, Status::Warning);
        assert_eq!(reg.get("DWLR003").unwrap().status, Status::Critical);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let reg = registry();
        let ids: Vec<_> = reg.list().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["DWLR001", "DWLR002", "DWLR003"]);
    }

    #[test]
    fn test_get_unknown_station_is_not_found() {
        let reg = registry();
        assert_eq!(
            reg.get("DWLR999").unwrap_err(),
            RegistryError::NotFound("DWLR999".to_string())
        );
    }

    #[test]
    fn test_update_unknown_station_is_not_found() {
        let mut reg = registry();
        let result = reg.update("DWLR999", 40.0, seed_time() + Duration::minutes(5));
        assert_eq!(result, Err(RegistryError::NotFound("DWLR999".to_string())));
    }

    #[test]
    fn test_update_rejects_negative_level() {
        let mut reg = registry();
        let result = reg.update("DWLR001", -0.1, seed_time() + Duration::minutes(5));
        assert!(matches!(
            result,
            Err(RegistryError::InvalidReading { .. })
        ));
        // Rejected reading must not disturb station state.
        assert_eq!(reg.get("DWLR001").unwrap().water_level_m, 45.2);
    }

    #[test]
    fn test_update_rejects_non_monotonic_timestamp() {
        let mut reg = registry();
        let later = seed_time() + Duration::minutes(10);
        reg.update("DWLR001", 44.0, later).unwrap();

        // Same timestamp: rejected.
        assert!(reg.update("DWLR001", 43.0, later).is_err());
        // Earlier timestamp: rejected.
        assert!(reg
            .update("DWLR001", 43.0, later - Duration::minutes(1))
            .is_err());
        // State reflects only the accepted reading.
        assert_eq!(reg.get("DWLR001").unwrap().water_level_m, 44.0);
    }

    #[test]
    fn test_update_within_band_returns_no_change() {
        let mut reg = registry();
        let change = reg
            .update("DWLR001", 44.0, seed_time() + Duration::minutes(5))
            .unwrap();
        assert!(change.is_none(), "44.0m is still Normal, no transition");
        let station = reg.get("DWLR001").unwrap();
        assert_eq!(station.status, Status::Normal);
        assert_eq!(station.trend, Trend::Declining);
    }

    #[test]
    fn test_update_across_band_emits_status_change() {
        let mut reg = registry();
        let change = reg
            .update("DWLR001", 28.0, seed_time() + Duration::minutes(5))
            .unwrap()
            .expect("45.2m -> 28.0m crosses into Critical");

        assert_eq!(change.from, Status::Normal);
        assert_eq!(change.to, Status::Critical);
        assert_eq!(change.station_id, "DWLR001");

        let station = reg.get("DWLR001").unwrap();
        assert_eq!(station.status, Status::Critical);
        assert_eq!(station.trend, Trend::Declining);
        assert_eq!(station.water_level_m, 28.0);
    }

    #[test]
    fn test_small_delta_reads_as_stable_trend() {
        let mut reg = registry();
        reg.update("DWLR001", 45.23, seed_time() + Duration::minutes(5))
            .unwrap();
        assert_eq!(reg.get("DWLR001").unwrap().trend, Trend::Stable);
    }

    #[test]
    fn test_history_accumulates_in_order_and_is_bounded() {
        let mut reg = StationRegistry::from_configs(
            &[station_config("DWLR001", "North", 45.0)],
            0.05,
            4, // small window to exercise trimming
            seed_time(),
        );

        for n in 1..=10 {
            reg.update(
                "DWLR001",
                45.0 - n as f64 * 0.5,
                seed_time() + Duration::minutes(n),
            )
            .unwrap();
        }

        let samples = reg.history("DWLR001").unwrap();
        assert_eq!(samples.len(), 4, "history should be trimmed to the window");
        let levels: Vec<_> = samples.iter().map(|s| s.level_m).collect();
        assert_eq!(levels, vec![41.5, 41.0, 40.5, 40.0]);
    }

    #[test]
    fn test_update_appends_history_sample() {
        let mut reg = registry();
        let at = seed_time() + Duration::minutes(5);
        reg.update("DWLR001", 44.0, at).unwrap();

        let samples = reg.history("DWLR001").unwrap();
        assert_eq!(samples.len(), 2, "seed sample plus one accepted reading");
        assert_eq!(
            samples.back().unwrap(),
            &LevelSample {
                timestamp: at,
                level_m: 44.0
            }
        );
    }

    #[test]
    fn test_last_reading_at_tracks_accepted_updates() {
        let mut reg = registry();
        let at = seed_time() + Duration::minutes(7);
        reg.update("DWLR002", 33.0, at).unwrap();
        assert_eq!(reg.get("DWLR002").unwrap().last_reading_at, at);
    }
}
