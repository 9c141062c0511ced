use metering_client::domain::{CommodityValues, Reading, UsageRecord};

/// Per-commodity deltas for one new reading against the prior cumulative
/// values, plus their sum.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedUsage {
    pub usage: CommodityValues,
    pub total_usage: f64,
}

/// Derive period usage from a new cumulative reading.
///
/// The prior value for each commodity comes from the most recent stored
/// record for the area; a missing record (fresh area) or a commodity absent
/// from it counts as 0, so the first usage value equals the raw reading.
/// Deltas are not clamped: a meter reset, corrected entry or out-of-order
/// ingestion produces a negative delta and it is passed through unchanged.
pub fn derive_usage(reading: &Reading, prior: Option<&UsageRecord>) -> DerivedUsage {
    let mut usage = CommodityValues::new();

    for (commodity, value) in &reading.commodity_readings {
        let prior_value = prior
            .and_then(|p| p.readings.get(commodity))
            .copied()
            .unwrap_or(0.0);
        usage.insert(commodity.clone(), value - prior_value);
    }

    let total_usage = usage.values().sum();

    DerivedUsage { usage, total_usage }
}
