use serde::{Deserialize, Serialize};
use time::Date;

use super::reading::CommodityValues;

/// One persisted row of the append-only usage history: the raw cumulative
/// readings plus everything derived from them at ingestion time.
///
/// Invariant: `total_usage == usage.values().sum()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub area: String,
    pub date: Date,
    /// Raw cumulative meter values as submitted.
    pub readings: CommodityValues,
    /// Per-commodity deltas against the previous record for this area.
    /// Negative values are kept as-is (meter reset / corrected entry).
    pub usage: CommodityValues,
    pub total_usage: f64,
    /// Single-step forecast that was current at ingestion time, if the
    /// area had enough history for one.
    pub predicted_usage: Option<f64>,
    pub anomaly: bool,
}

impl UsageRecord {
    /// Usage for one commodity, zero when the commodity is absent.
    pub fn usage_for(&self, commodity: &str) -> f64 {
        self.usage.get(commodity).copied().unwrap_or(0.0)
    }
}
