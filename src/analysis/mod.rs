/// Derived views over registry state: regional rollups, the sustainability
/// index, and chart-ready projections. Everything here is recomputed on
/// read — nothing is cached, so no aggregate can go stale beyond the
/// update cycle that produced its inputs.

pub mod rollup;
pub mod series;
