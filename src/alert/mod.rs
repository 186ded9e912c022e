/// Alerting: severity evaluation, the bounded feed, and background sources.

pub mod feed;
pub mod source;
pub mod thresholds;

pub use feed::AlertFeed;
pub use source::{AlertSource, SyntheticAlertSource};
