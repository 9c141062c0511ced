use async_trait::async_trait;
use metering_client::db::usage_queries;
use metering_client::domain::UsageRecord;
use sqlx::PgPool;
use time::Date;

use super::{CommodityDailyTotal, DailyTotal, ReadingStore, StoreError};

/// `ReadingStore` backed by the `usage_records` table. Connectivity
/// failures surface as `StoreError::Unavailable`; there is no retry here.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unavailable(e: anyhow::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl ReadingStore for PgStore {
    async fn insert(&self, record: &UsageRecord) -> Result<(), StoreError> {
        usage_queries::insert_usage_record(&self.pool, record)
            .await
            .map_err(unavailable)
    }

    async fn last_record(&self, area: &str) -> Result<Option<UsageRecord>, StoreError> {
        usage_queries::last_usage_record(&self.pool, area)
            .await
            .map_err(unavailable)
    }

    async fn usage_history(&self, area: &str) -> Result<Vec<DailyTotal>, StoreError> {
        let rows = usage_queries::usage_totals(&self.pool, area)
            .await
            .map_err(unavailable)?;

        Ok(rows
            .into_iter()
            .map(|r| DailyTotal {
                date: r.date,
                total_usage: r.total_usage,
            })
            .collect())
    }

    async fn latest_date(&self) -> Result<Option<Date>, StoreError> {
        usage_queries::latest_date(&self.pool).await.map_err(unavailable)
    }

    async fn records_on(&self, date: Date) -> Result<Vec<UsageRecord>, StoreError> {
        usage_queries::records_on(&self.pool, date)
            .await
            .map_err(unavailable)
    }

    async fn records_in_range(&self, start: Date, end: Date) -> Result<Vec<UsageRecord>, StoreError> {
        usage_queries::records_in_range(&self.pool, start, end)
            .await
            .map_err(unavailable)
    }

    async fn daily_commodity_totals(
        &self,
        areas: &[String],
    ) -> Result<Vec<CommodityDailyTotal>, StoreError> {
        let rows = usage_queries::daily_commodity_totals(&self.pool, areas)
            .await
            .map_err(unavailable)?;

        Ok(rows
            .into_iter()
            .map(|r| CommodityDailyTotal {
                date: r.date,
                commodity: r.commodity,
                total: r.total,
            })
            .collect())
    }
}
