use std::collections::BTreeMap;

use async_trait::async_trait;
use metering_client::domain::UsageRecord;
use time::Date;
use tokio::sync::RwLock;

use super::{CommodityDailyTotal, DailyTotal, ReadingStore, StoreError};

/// In-memory `ReadingStore` used by the unit tests and by local runs that
/// do not want a database. Records live in insertion order, which is what
/// gives "latest date, ties by insertion" its meaning here.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<UsageRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn insert(&self, record: &UsageRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn last_record(&self, area: &str) -> Result<Option<UsageRecord>, StoreError> {
        let records = self.records.read().await;

        // max_by_key on (date, index): latest date wins, last inserted wins
        // on equal dates.
        let found = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.area == area)
            .max_by_key(|(idx, r)| (r.date, *idx))
            .map(|(_, r)| r.clone());

        Ok(found)
    }

    async fn usage_history(&self, area: &str) -> Result<Vec<DailyTotal>, StoreError> {
        let records = self.records.read().await;

        let mut by_date: BTreeMap<Date, f64> = BTreeMap::new();
        for r in records.iter().filter(|r| r.area == area) {
            *by_date.entry(r.date).or_insert(0.0) += r.total_usage;
        }

        Ok(by_date
            .into_iter()
            .map(|(date, total_usage)| DailyTotal { date, total_usage })
            .collect())
    }

    async fn latest_date(&self) -> Result<Option<Date>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().map(|r| r.date).max())
    }

    async fn records_on(&self, date: Date) -> Result<Vec<UsageRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| r.date == date).cloned().collect())
    }

    async fn records_in_range(&self, start: Date, end: Date) -> Result<Vec<UsageRecord>, StoreError> {
        let records = self.records.read().await;

        // Group by date while preserving insertion order within a date.
        let mut by_date: BTreeMap<Date, Vec<UsageRecord>> = BTreeMap::new();
        for r in records.iter().filter(|r| r.date >= start && r.date <= end) {
            by_date.entry(r.date).or_default().push(r.clone());
        }

        Ok(by_date.into_values().flatten().collect())
    }

    async fn daily_commodity_totals(
        &self,
        areas: &[String],
    ) -> Result<Vec<CommodityDailyTotal>, StoreError> {
        let records = self.records.read().await;

        let mut sums: BTreeMap<(Date, String), f64> = BTreeMap::new();
        for r in records.iter().filter(|r| areas.contains(&r.area)) {
            for (commodity, value) in &r.usage {
                *sums.entry((r.date, commodity.clone())).or_insert(0.0) += value;
            }
        }

        Ok(sums
            .into_iter()
            .map(|((date, commodity), total)| CommodityDailyTotal { date, commodity, total })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metering_client::domain::CommodityValues;
    use time::macros::date;

    fn record(area: &str, date: Date, total: f64) -> UsageRecord {
        UsageRecord {
            area: area.to_string(),
            date,
            readings: CommodityValues::from([("domestic".to_string(), total)]),
            usage: CommodityValues::from([("domestic".to_string(), total)]),
            total_usage: total,
            predicted_usage: None,
            anomaly: false,
        }
    }

    #[tokio::test]
    async fn last_record_prefers_latest_date_then_insertion_order() {
        let store = MemoryStore::new();
        store.insert(&record("HOSTEL 1", date!(2025 - 03 - 02), 10.0)).await.unwrap();
        store.insert(&record("HOSTEL 1", date!(2025 - 03 - 01), 5.0)).await.unwrap();
        store.insert(&record("HOSTEL 1", date!(2025 - 03 - 02), 20.0)).await.unwrap();

        let last = store.last_record("HOSTEL 1").await.unwrap().unwrap();
        assert_eq!(last.total_usage, 20.0);
    }

    #[tokio::test]
    async fn last_record_is_scoped_to_the_area() {
        let store = MemoryStore::new();
        store.insert(&record("HOSTEL 1", date!(2025 - 03 - 05), 10.0)).await.unwrap();

        assert!(store.last_record("HOSTEL 2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn usage_history_is_sorted_oldest_first() {
        let store = MemoryStore::new();
        store.insert(&record("NOB", date!(2025 - 03 - 03), 3.0)).await.unwrap();
        store.insert(&record("NOB", date!(2025 - 03 - 01), 1.0)).await.unwrap();
        store.insert(&record("NOB", date!(2025 - 03 - 02), 2.0)).await.unwrap();

        let history = store.usage_history("NOB").await.unwrap();
        let totals: Vec<f64> = history.iter().map(|t| t.total_usage).collect();
        assert_eq!(totals, vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn usage_history_sums_same_date_records() {
        let store = MemoryStore::new();
        store.insert(&record("NOB", date!(2025 - 03 - 01), 2.0)).await.unwrap();
        store.insert(&record("NOB", date!(2025 - 03 - 01), 3.0)).await.unwrap();

        let history = store.usage_history("NOB").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].total_usage, 5.0);
    }

    #[tokio::test]
    async fn range_query_is_inclusive_on_both_ends() {
        let store = MemoryStore::new();
        store.insert(&record("NOB", date!(2025 - 03 - 01), 1.0)).await.unwrap();
        store.insert(&record("NOB", date!(2025 - 03 - 02), 2.0)).await.unwrap();
        store.insert(&record("NOB", date!(2025 - 03 - 03), 3.0)).await.unwrap();

        let rows = store
            .records_in_range(date!(2025 - 03 - 01), date!(2025 - 03 - 02))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }
}
