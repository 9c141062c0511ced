pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use metering_client::domain::UsageRecord;
use time::Date;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// One aggregate usage total for a single date, oldest-first in history
/// queries.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotal {
    pub date: Date,
    pub total_usage: f64,
}

/// Usage summed over a selection of areas, for one date and one commodity.
#[derive(Debug, Clone, PartialEq)]
pub struct CommodityDailyTotal {
    pub date: Date,
    pub commodity: String,
    pub total: f64,
}

/// Accessor contract for the append-only usage history.
///
/// The store serializes individual reads and writes but gives no compound
/// read-modify-write guarantee; the engine provides its own per-area
/// sequencing on top (see `Engine::ingest`).
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Append one derived record.
    async fn insert(&self, record: &UsageRecord) -> Result<(), StoreError>;

    /// Most recently stored record for an area (latest date, insertion
    /// order breaking ties), or `None` for a fresh area.
    async fn last_record(&self, area: &str) -> Result<Option<UsageRecord>, StoreError>;

    /// Usage totals for one area summed per date, oldest first. Several
    /// records on the same date collapse into one entry.
    async fn usage_history(&self, area: &str) -> Result<Vec<DailyTotal>, StoreError>;

    /// Latest date with any data across all areas.
    async fn latest_date(&self) -> Result<Option<Date>, StoreError>;

    /// Every record stored for one date, in insertion order.
    async fn records_on(&self, date: Date) -> Result<Vec<UsageRecord>, StoreError>;

    /// Every record in the inclusive date range, ordered by date then
    /// insertion.
    async fn records_in_range(&self, start: Date, end: Date) -> Result<Vec<UsageRecord>, StoreError>;

    /// Per-date, per-commodity usage sums across the selected areas,
    /// ordered by date. Input for the linear-trend extrapolator.
    async fn daily_commodity_totals(
        &self,
        areas: &[String],
    ) -> Result<Vec<CommodityDailyTotal>, StoreError>;
}
