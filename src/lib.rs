/// gwmon_core: groundwater station monitoring and alerting state engine.
///
/// # Module structure
///
/// ```text
/// gwmon_core
/// ├── model      — shared data types (Station, Alert, Status, Trend, errors)
/// ├── config     — network configuration loader (stations.toml)
/// ├── registry   — station registry: owned state, update/classify/trend
/// ├── alert
/// │   ├── thresholds — water level severity and trend evaluation
/// │   ├── feed       — bounded, newest-first alert buffer
/// │   └── source     — pluggable background alert producers
/// ├── analysis
/// │   ├── rollup — regional rollups, sustainability index, summary
/// │   └── series — chart-ready level and factor-share projections
/// ├── query      — read-only search/region filtering
/// └── engine     — owned engine: lifecycle, cooperative scheduler, wiring
/// ```
///
/// The crate is an embedded library: no network, no persistence, no CLI.
/// A presentation layer drives it through `Engine` and reads projections
/// back out; all mutation flows through `StationRegistry::update` via
/// `Engine::submit_reading`.

/// Public modules
pub mod alert;
pub mod analysis;
pub mod config;
pub mod engine;
pub mod model;
pub mod query;
pub mod registry;

pub use config::{load_config, load_config_default, ConfigError, NetworkConfig};
pub use engine::Engine;
pub use model::{
    Alert, AlertDraft, AlertKind, DepletionFactor, RegionalAggregate, RegistryError, Station,
    Status, StatusChange, ThresholdBands, Trend,
};
pub use registry::StationRegistry;
