/// The owned monitoring engine: lifecycle, scheduling, and wiring.
///
/// One `Engine` instance holds the registry, the alert feed, and a
/// cooperative scheduler. The host drives time explicitly through
/// `tick(now)`; every due task runs to completion inside the tick, on the
/// caller's thread, so no observer ever sees partially applied state.
/// `shutdown` cancels all scheduled work and is also invoked from `Drop`,
/// guaranteeing the timer resources are released on every exit path.
///
/// A multi-threaded host must serialize access to the engine behind its
/// own mutex or actor boundary; the engine itself takes no locks.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::alert::thresholds::transition_alert;
use crate::alert::{AlertFeed, AlertSource, SyntheticAlertSource};
use crate::analysis::rollup::{self, NetworkSummary};
use crate::analysis::series::{self, FactorShare, LevelPoint};
use crate::config::{ConfigError, NetworkConfig};
use crate::model::{Alert, DepletionFactor, RegionalAggregate, RegistryError, Station};
use crate::query;
use crate::registry::StationRegistry;

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Handle for cancelling a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskId(u64);

/// What a due task should do. Tasks carry no closures: the engine matches
/// on the kind inside `tick`, which keeps scheduling inspectable and free
/// of borrow gymnastics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskKind {
    /// Poll the background alert source.
    AlertSourcePoll,
    /// Clear the manual-refresh busy flag.
    RefreshComplete,
}

struct ScheduledTask {
    id: TaskId,
    kind: TaskKind,
    due_at: DateTime<Utc>,
    /// `Some` for repeating tasks, `None` for one-shots.
    interval: Option<Duration>,
}

/// A plain-data cooperative scheduler. Nothing runs until the owner calls
/// `fire_due`; callbacks therefore execute on the caller's thread, one
/// after another, never interleaved.
struct Scheduler {
    tasks: Vec<ScheduledTask>,
    next_id: u64,
}

impl Scheduler {
    fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    fn schedule_repeating(&mut self, kind: TaskKind, first_due: DateTime<Utc>, interval: Duration) -> TaskId {
        self.schedule(kind, first_due, Some(interval))
    }

    fn schedule_once(&mut self, kind: TaskKind, due_at: DateTime<Utc>) -> TaskId {
        self.schedule(kind, due_at, None)
    }

    fn schedule(&mut self, kind: TaskKind, due_at: DateTime<Utc>, interval: Option<Duration>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            id,
            kind,
            due_at,
            interval,
        });
        id
    }

    fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Collect every firing due at or before `now`, in registration order.
    /// Repeating tasks that fell behind fire once per elapsed interval and
    /// stay scheduled; one-shots fire once and are removed.
    fn fire_due(&mut self, now: DateTime<Utc>) -> Vec<TaskKind> {
        let mut fired = Vec::new();
        self.tasks.retain_mut(|task| match task.interval {
            Some(interval) => {
                while task.due_at <= now {
                    fired.push(task.kind);
                    task.due_at += interval;
                }
                true
            }
            None => {
                if task.due_at <= now {
                    fired.push(task.kind);
                    false
                } else {
                    true
                }
            }
        });
        fired
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine {
    registry: StationRegistry,
    feed: AlertFeed,
    factors: Vec<DepletionFactor>,
    scheduler: Scheduler,
    alert_source: Box<dyn AlertSource>,
    refreshing: bool,
    refresh_task: Option<TaskId>,
    refresh_delay: Duration,
    shut_down: bool,
}

impl Engine {
    /// Build an engine from validated configuration with the default
    /// synthetic background source.
    pub fn new(config: NetworkConfig, started_at: DateTime<Utc>) -> Result<Self, ConfigError> {
        Self::with_source(
            config,
            Box::new(SyntheticAlertSource::with_default_templates()),
            started_at,
        )
    }

    /// Build an engine with a caller-supplied alert source — the seam where
    /// a real sensor network replaces the synthetic generator.
    pub fn with_source(
        config: NetworkConfig,
        alert_source: Box<dyn AlertSource>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let settings = &config.engine;
        let registry = StationRegistry::from_configs(
            &config.stations,
            settings.trend_epsilon_m,
            settings.history_window,
            started_at,
        );

        let mut scheduler = Scheduler::new();
        let poll_interval = Duration::seconds(settings.alert_interval_secs.max(1));
        scheduler.schedule_repeating(
            TaskKind::AlertSourcePoll,
            started_at + poll_interval,
            poll_interval,
        );

        Ok(Self {
            registry,
            feed: AlertFeed::new(settings.feed_capacity),
            factors: config.depletion_factors(),
            scheduler,
            alert_source,
            refreshing: false,
            refresh_task: None,
            refresh_delay: Duration::seconds(settings.refresh_delay_secs.max(0)),
            shut_down: false,
        })
    }

    // -- readings ----------------------------------------------------------

    /// Apply a sensor reading. A status transition produces exactly one
    /// alert on the feed, synchronously, before this method returns.
    pub fn submit_reading(
        &mut self,
        station_id: &str,
        water_level_m: f64,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        if let Some(change) = self.registry.update(station_id, water_level_m, now)? {
            self.feed.push(transition_alert(&change), now);
        }
        Ok(())
    }

    // -- scheduling --------------------------------------------------------

    /// Run every scheduled task due at or before `now`. Each callback runs
    /// to completion before the next starts. A no-op after shutdown.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self.shut_down {
            return;
        }

        for kind in self.scheduler.fire_due(now) {
            match kind {
                TaskKind::AlertSourcePoll => match self.alert_source.collect(now) {
                    Ok(drafts) => {
                        for draft in drafts {
                            self.feed.push(draft, now);
                        }
                    }
                    // Non-fatal: only the synthetic stream is affected,
                    // classification correctness is not.
                    Err(e) => warn!(error = %e, "background alert source failed"),
                },
                TaskKind::RefreshComplete => {
                    debug!("manual refresh completed");
                    self.refreshing = false;
                    self.refresh_task = None;
                }
            }
        }
    }

    /// Begin a manual refresh: sets the busy flag and schedules its
    /// clearing after the configured delay. Returns false if a refresh is
    /// already in flight or the engine is shut down.
    pub fn request_refresh(&mut self, now: DateTime<Utc>) -> bool {
        if self.refreshing || self.shut_down {
            return false;
        }
        self.refreshing = true;
        self.refresh_task = Some(
            self.scheduler
                .schedule_once(TaskKind::RefreshComplete, now + self.refresh_delay),
        );
        true
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// Cancel all scheduled work. Idempotent; also runs on `Drop`, so the
    /// periodic generator and any pending refresh are released no matter
    /// how the engine goes away.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        if let Some(id) = self.refresh_task.take() {
            self.scheduler.cancel(id);
        }
        self.scheduler.cancel_all();
        self.refreshing = false;
        self.shut_down = true;
        debug!("engine shut down, scheduled tasks cancelled");
    }

    /// True once every scheduled task has been cancelled.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down && self.scheduler.is_idle()
    }

    // -- read access -------------------------------------------------------

    pub fn stations(&self) -> &[Station] {
        self.registry.list()
    }

    pub fn station(&self, id: &str) -> Result<&Station, RegistryError> {
        self.registry.get(id)
    }

    /// Alerts newest first.
    pub fn alerts(&self) -> Vec<&Alert> {
        self.feed.list().collect()
    }

    pub fn dismiss_alert(&mut self, id: u64) -> bool {
        self.feed.dismiss(id)
    }

    /// Search/region projection over the registry (see `query::filter`).
    pub fn filter(&self, search_text: &str, region: &str) -> Vec<&Station> {
        query::filter(self.registry.list(), search_text, region)
    }

    pub fn regional_rollup(&self) -> Vec<RegionalAggregate> {
        rollup::regional_rollup(self.registry.list())
    }

    pub fn sustainability_index(&self) -> f64 {
        rollup::sustainability_index(&self.factors)
    }

    pub fn summary(&self) -> NetworkSummary {
        rollup::network_summary(self.registry.list(), &self.factors, self.feed.len())
    }

    /// Chart series of a station's rolling history.
    pub fn level_series(&self, station_id: &str) -> Result<Vec<LevelPoint>, RegistryError> {
        Ok(series::level_series(self.registry.history(station_id)?))
    }

    pub fn factor_shares(&self) -> Vec<FactorShare> {
        series::factor_shares(&self.factors)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineSettings, FactorConfig, StationConfig};
    use crate::model::{AlertDraft, AlertKind};
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn test_config() -> NetworkConfig {
        NetworkConfig {
            engine: EngineSettings::default(),
            factors: vec![FactorConfig {
                name: "agricultural".to_string(),
                share_percent: 100.0,
                pressure: 28.0,
            }],
            stations: vec![StationConfig {
                id: "DWLR001".to_string(),
                name: "Delhi NCR".to_string(),
                region: "North".to_string(),
                latitude: 28.6139,
                longitude: 77.2090,
                initial_level_m: 45.2,
                critical_below_m: 30.0,
                warning_below_m: 40.0,
            }],
        }
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let mut config = test_config();
        config.stations[0].critical_below_m = 50.0;
        assert!(Engine::new(config, start()).is_err());
    }

    #[test]
    fn test_zero_feed_capacity_fails_construction_with_config_error() {
        // Must surface as a ConfigError, never reach the feed's assert.
        let mut config = test_config();
        config.engine.feed_capacity = 0;
        assert!(matches!(
            Engine::new(config, start()),
            Err(ConfigError::ZeroFeedCapacity)
        ));
    }

    #[test]
    fn test_negative_trend_epsilon_fails_construction() {
        // A negative dead-band would classify an unchanged level as
        // Declining; the engine refuses to start with one.
        let mut config = test_config();
        config.engine.trend_epsilon_m = -0.05;
        assert!(matches!(
            Engine::new(config, start()),
            Err(ConfigError::NegativeTrendEpsilon { .. })
        ));
    }

    #[test]
    fn test_scheduler_fires_repeating_task_per_elapsed_interval() {
        let mut sched = Scheduler::new();
        sched.schedule_repeating(
            TaskKind::AlertSourcePoll,
            start() + Duration::seconds(30),
            Duration::seconds(30),
        );

        assert!(sched.fire_due(start()).is_empty());
        assert_eq!(sched.fire_due(start() + Duration::seconds(30)).len(), 1);
        // 95s in: fires at 60s and 90s.
        assert_eq!(sched.fire_due(start() + Duration::seconds(95)).len(), 2);
    }

    #[test]
    fn test_scheduler_one_shot_fires_once_and_is_removed() {
        let mut sched = Scheduler::new();
        sched.schedule_once(TaskKind::RefreshComplete, start() + Duration::seconds(2));

        assert_eq!(sched.fire_due(start() + Duration::seconds(2)).len(), 1);
        assert!(sched.fire_due(start() + Duration::seconds(60)).is_empty());
        assert!(sched.is_idle());
    }

    #[test]
    fn test_scheduler_cancel_removes_task() {
        let mut sched = Scheduler::new();
        let id = sched.schedule_once(TaskKind::RefreshComplete, start());
        assert!(sched.cancel(id));
        assert!(!sched.cancel(id), "second cancel finds nothing");
        assert!(sched.fire_due(start() + Duration::seconds(10)).is_empty());
    }

    #[test]
    fn test_tick_polls_background_source_on_interval() {
        let mut engine = Engine::new(test_config(), start()).unwrap();
        assert!(engine.alerts().is_empty());

        engine.tick(start() + Duration::seconds(29));
        assert!(engine.alerts().is_empty(), "nothing due before the interval");

        engine.tick(start() + Duration::seconds(30));
        assert_eq!(engine.alerts().len(), 1, "one background alert per poll");
    }

    #[test]
    fn test_failing_source_is_non_fatal() {
        struct FailingSource;
        impl AlertSource for FailingSource {
            fn collect(
                &mut self,
                _now: DateTime<Utc>,
            ) -> Result<Vec<AlertDraft>, Box<dyn std::error::Error>> {
                Err("sensor uplink unavailable".into())
            }
        }

        let mut engine =
            Engine::with_source(test_config(), Box::new(FailingSource), start()).unwrap();
        engine.tick(start() + Duration::seconds(30));
        assert!(engine.alerts().is_empty());

        // Engine still classifies readings after source failures.
        engine
            .submit_reading("DWLR001", 28.0, start() + Duration::seconds(31))
            .unwrap();
        assert_eq!(engine.alerts().len(), 1);
        assert_eq!(engine.alerts()[0].kind, AlertKind::Critical);
    }

    #[test]
    fn test_refresh_flag_lifecycle() {
        let mut engine = Engine::new(test_config(), start()).unwrap();
        assert!(!engine.is_refreshing());

        assert!(engine.request_refresh(start()));
        assert!(engine.is_refreshing());
        assert!(
            !engine.request_refresh(start()),
            "second refresh while busy is ignored"
        );

        engine.tick(start() + Duration::seconds(1));
        assert!(engine.is_refreshing(), "delay has not elapsed yet");

        engine.tick(start() + Duration::seconds(2));
        assert!(!engine.is_refreshing(), "flag clears after the delay");
    }

    #[test]
    fn test_shutdown_cancels_all_scheduled_work() {
        let mut engine = Engine::new(test_config(), start()).unwrap();
        engine.request_refresh(start());
        engine.shutdown();
        assert!(engine.is_shut_down());

        // Ticking long past every deadline produces nothing.
        engine.tick(start() + Duration::minutes(10));
        assert!(engine.alerts().is_empty());
        assert!(!engine.is_refreshing());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut engine = Engine::new(test_config(), start()).unwrap();
        engine.shutdown();
        engine.shutdown();
        assert!(engine.is_shut_down());
    }
}
