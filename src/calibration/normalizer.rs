//! Percentile normalization of raw metrics

use super::table::CalibrationTable;
use crate::error::ScoringError;
use crate::metrics::{MetricId, MetricMap};

/// Map every raw metric to its percentile rank in `table`, in [0, 1].
///
/// A metric missing from the table is an error; falling back to another tier
/// or to the raw value would silently mis-rank the guild.
pub fn normalize_scores(raw: &MetricMap, table: &CalibrationTable) -> Result<MetricMap, ScoringError> {
    let mut normalized = MetricMap::new();
    for metric in MetricId::ALL {
        let value = raw.get(&metric).copied().unwrap_or(0.0);
        let percentiles = table.metric(metric)?;
        normalized.insert(metric, percentiles.normalize(value));
    }
    Ok(normalized)
}
