//! The usage engine: ingestion, anomaly classification and the read-side
//! views, all running against a `ReadingStore`.

use std::collections::HashMap;
use std::sync::Arc;

use metering_client::domain::{CommodityValues, Reading, UsageRecord};
use time::Date;
use tokio::sync::Mutex;

use crate::anomaly::AnomalyPolicy;
use crate::catalog::Catalog;
use crate::config::{AnomalyConfig, DashboardConfig, ForecastConfig};
use crate::forecast::{seasonal, trend, ForecastPoint};
use crate::report::{self, Dashboard, ExportMatrix};
use crate::store::{ReadingStore, StoreError};

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("invalid area: {0}")]
    InvalidArea(String),
    #[error("no data in range {start} to {end}")]
    NoDataInRange { start: Date, end: Date },
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Engine<S> {
    store: S,
    catalog: Catalog,
    policy: AnomalyPolicy,
    forecast_cfg: ForecastConfig,
    top_n: usize,
    // Per-area sequencing point for the read-prior-then-insert step on
    // ingestion. The store only serializes single operations.
    area_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: ReadingStore> Engine<S> {
    pub fn new(
        store: S,
        catalog: Catalog,
        anomaly_cfg: &AnomalyConfig,
        forecast_cfg: ForecastConfig,
        dashboard_cfg: &DashboardConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            policy: AnomalyPolicy::from_config(anomaly_cfg),
            forecast_cfg,
            top_n: dashboard_cfg.top_n,
            area_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Ingest one cumulative reading: derive usage against the prior
    /// record, classify it, and append the result.
    pub async fn ingest(&self, reading: Reading) -> Result<UsageRecord, EngineError> {
        if !self.catalog.contains_area(&reading.area) {
            metrics::counter!("ingest_rejected_total").increment(1);
            return Err(EngineError::InvalidArea(reading.area));
        }

        let lock = self.area_lock(&reading.area).await;
        let _guard = lock.lock().await;

        let prior = self.store.last_record(&reading.area).await?;
        let derived = crate::usage::derive_usage(&reading, prior.as_ref());

        if derived.usage.values().any(|v| *v < 0.0) {
            // Meter reset or corrected entry; kept as-is but counted.
            metrics::counter!("negative_usage_deltas_total").increment(1);
            tracing::info!(area = %reading.area, "negative usage delta ingested");
        }

        let predicted = if self.policy.needs_forecast() {
            let history = self.store.usage_history(&reading.area).await?;
            seasonal::predict_next(&history, self.forecast_cfg.min_history)
        } else {
            None
        };

        let anomaly = self.policy.classify(derived.total_usage, predicted);
        if anomaly {
            metrics::counter!("anomalies_flagged_total").increment(1);
            tracing::warn!(
                area = %reading.area,
                total_usage = derived.total_usage,
                "anomalous usage flagged"
            );
        }

        let record = UsageRecord {
            area: reading.area,
            date: reading.date,
            readings: reading.commodity_readings,
            usage: derived.usage,
            total_usage: derived.total_usage,
            predicted_usage: predicted,
            anomaly,
        };

        self.store.insert(&record).await?;
        metrics::counter!("ingest_readings_total").increment(1);

        Ok(record)
    }

    /// Latest-day dashboard. Never errors on an empty store: the full
    /// catalog comes back zero-filled.
    pub async fn dashboard(&self) -> Result<Dashboard, EngineError> {
        let date = self.store.latest_date().await?;

        let records = match date {
            Some(d) => self.store.records_on(d).await?,
            None => Vec::new(),
        };

        Ok(report::build_dashboard(date, &records, &self.catalog, self.top_n))
    }

    /// Latest record for one area, `None` when the area has no data yet.
    pub async fn area_summary(&self, area: &str) -> Result<Option<UsageRecord>, EngineError> {
        if !self.catalog.contains_area(area) {
            return Err(EngineError::InvalidArea(area.to_string()));
        }

        Ok(self.store.last_record(area).await?)
    }

    /// Blended history+forecast series for the aggregate usage of the
    /// selected areas. An empty selection means the whole catalog. No
    /// matching history yields an empty series, not an error.
    pub async fn forecast(
        &self,
        areas: &[String],
        horizon: Option<usize>,
    ) -> Result<Vec<ForecastPoint>, EngineError> {
        for area in areas {
            if !self.catalog.contains_area(area) {
                return Err(EngineError::InvalidArea(area.clone()));
            }
        }

        let selection: Vec<String> = if areas.is_empty() {
            self.catalog.areas().to_vec()
        } else {
            areas.to_vec()
        };

        let totals = self.store.daily_commodity_totals(&selection).await?;

        // Fold (date, commodity, total) rows into one map per date,
        // preserving date order.
        let mut history: Vec<(Date, CommodityValues)> = Vec::new();
        for row in totals {
            match history.last_mut() {
                Some((date, values)) if *date == row.date => {
                    values.insert(row.commodity, row.total);
                }
                _ => {
                    history.push((row.date, CommodityValues::from([(row.commodity, row.total)])));
                }
            }
        }

        let horizon = horizon.unwrap_or(self.forecast_cfg.horizon);
        Ok(trend::forecast_series(
            &history,
            self.catalog.commodities(),
            self.forecast_cfg.trend_window,
            horizon,
        ))
    }

    /// Export pivot over an inclusive date range. Zero matching rows is a
    /// distinct no-data outcome.
    pub async fn export(&self, start: Date, end: Date) -> Result<ExportMatrix, EngineError> {
        let records = self.store.records_in_range(start, end).await?;

        report::build_export(&records, &self.catalog)
            .ok_or(EngineError::NoDataInRange { start, end })
    }

    async fn area_lock(&self, area: &str) -> Arc<Mutex<()>> {
        let mut locks = self.area_locks.lock().await;
        locks
            .entry(area.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
