use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Date;

/// Cumulative or derived values keyed by commodity name ("domestic",
/// "secondary", ...). BTreeMap keeps iteration order deterministic.
pub type CommodityValues = BTreeMap<String, f64>;

/// A raw cumulative meter reading as submitted for one area on one date.
///
/// Values are expected to be non-decreasing per area+commodity but this is
/// not enforced; meter resets and corrected entries do occur.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub area: String,
    pub date: Date,
    pub commodity_readings: CommodityValues,
}
