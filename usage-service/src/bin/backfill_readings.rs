//! Backfill historical cumulative readings from a CSV file through the
//! full ingestion path, so deltas, predictions and anomaly flags are
//! derived exactly as they would have been live.
//!
//! Expected header: `area,date,<commodity>[,<commodity>...]` with dates as
//! `YYYY-MM-DD`. Rows are ingested in file order.

use std::fs::File;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use metering_client::domain::{CommodityValues, Reading};
use sqlx::postgres::PgPoolOptions;
use time::macros::format_description;
use time::Date;
use usage_service::{
    catalog::Catalog, config::AppConfig, engine::Engine, observability, store::PgStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        bail!("usage: backfill_readings <csv_file_path>");
    }
    let file_path = &args[1];

    let cfg = AppConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;

    let engine = Arc::new(Engine::new(
        PgStore::new(pool),
        Catalog::new(&cfg.catalog),
        &cfg.anomaly,
        cfg.forecast.clone(),
        &cfg.dashboard,
    ));

    let file = File::open(file_path).with_context(|| format!("failed to open {file_path}"))?;
    let mut rdr = csv::Reader::from_reader(file);
    let headers = rdr.headers().context("failed to read CSV headers")?.clone();

    let date_format = format_description!("[year]-[month]-[day]");
    let mut ingested: u64 = 0;
    let mut skipped: u64 = 0;

    for (line, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("failed to read CSV record {line}"))?;

        let mut area = None;
        let mut date = None;
        let mut commodity_readings = CommodityValues::new();

        for (header, field) in headers.iter().zip(record.iter()) {
            match header {
                "area" => area = Some(field.trim().to_string()),
                "date" => {
                    date = Some(
                        Date::parse(field.trim(), &date_format)
                            .with_context(|| format!("invalid date '{field}' at record {line}"))?,
                    );
                }
                commodity => {
                    if !field.trim().is_empty() {
                        let value: f64 = field
                            .trim()
                            .parse()
                            .with_context(|| format!("invalid value '{field}' at record {line}"))?;
                        commodity_readings.insert(commodity.to_string(), value);
                    }
                }
            }
        }

        let (Some(area), Some(date)) = (area, date) else {
            bail!("record {line} is missing the area or date column");
        };

        let reading = Reading { area, date, commodity_readings };
        match engine.ingest(reading).await {
            Ok(_) => ingested += 1,
            Err(e) => {
                // Unknown areas in old exports are common; skip and move on.
                tracing::warn!(error = %e, line, "skipping unprocessable reading");
                skipped += 1;
            }
        }
    }

    tracing::info!(ingested, skipped, "backfill complete");

    Ok(())
}
