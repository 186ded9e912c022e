/// Pluggable background alert producers.
///
/// The engine polls an `AlertSource` on its periodic task and pushes
/// whatever it yields onto the feed. The synthetic source below stands in
/// for real sensor-network events while no ingestion exists; a production
/// deployment substitutes its own implementation without touching
/// classification or aggregation.

use std::error::Error;

use chrono::{DateTime, Utc};

use crate::model::{AlertDraft, AlertKind};

/// A producer of background monitoring alerts.
///
/// `collect` is called once per scheduled poll and returns the batch to
/// append. Sources must not block; a source with nothing to report returns
/// an empty batch. Errors are non-fatal: the engine logs them and keeps
/// polling, since a broken background source affects only the synthetic
/// alert stream, never classification.
pub trait AlertSource {
    fn collect(&mut self, now: DateTime<Utc>) -> Result<Vec<AlertDraft>, Box<dyn Error>>;
}

// ---------------------------------------------------------------------------
// Synthetic source
// ---------------------------------------------------------------------------

/// Rotates through a fixed set of background-noise templates, yielding one
/// alert per poll. Keeps the feed lively in demos and exercises the
/// eviction path under a steady trickle of low-value alerts.
pub struct SyntheticAlertSource {
    templates: Vec<AlertDraft>,
    cursor: usize,
}

impl SyntheticAlertSource {
    pub fn new(templates: Vec<AlertDraft>) -> Self {
        Self {
            templates,
            cursor: 0,
        }
    }

    /// The default template set mirrors typical background traffic on a
    /// national DWLR network: a depletion warning, a recharge notice, and
    /// a telemetry heartbeat.
    pub fn with_default_templates() -> Self {
        Self::new(vec![
            AlertDraft {
                kind: AlertKind::Warning,
                message: "Mumbai Suburban: Rapid depletion detected".to_string(),
                station_id: Some("DWLR002".to_string()),
            },
            AlertDraft {
                kind: AlertKind::Info,
                message: "Bangalore Urban: Recharge event detected".to_string(),
                station_id: Some("DWLR004".to_string()),
            },
            AlertDraft {
                kind: AlertKind::Info,
                message: "Network telemetry sweep completed".to_string(),
                station_id: None,
            },
        ])
    }
}

impl AlertSource for SyntheticAlertSource {
    fn collect(&mut self, _now: DateTime<Utc>) -> Result<Vec<AlertDraft>, Box<dyn Error>> {
        if self.templates.is_empty() {
            return Ok(Vec::new());
        }
        let draft = self.templates[self.cursor % self.templates.len()].clone();
        self.cursor += 1;
        Ok(vec![draft])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
