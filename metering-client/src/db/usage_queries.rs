use anyhow::Result;
use sqlx::types::Json;
use sqlx::PgPool;
use time::Date;

use crate::domain::{CommodityValues, UsageRecord};

/// Row shape for the `usage_records` table. Commodity maps are stored as
/// JSONB so the commodity catalog can change without a migration.
#[derive(Debug, sqlx::FromRow)]
struct UsageRecordRow {
    area: String,
    date: Date,
    readings: Json<CommodityValues>,
    usage: Json<CommodityValues>,
    total_usage: f64,
    predicted_usage: Option<f64>,
    anomaly: bool,
}

impl From<UsageRecordRow> for UsageRecord {
    fn from(r: UsageRecordRow) -> Self {
        UsageRecord {
            area: r.area,
            date: r.date,
            readings: r.readings.0,
            usage: r.usage.0,
            total_usage: r.total_usage,
            predicted_usage: r.predicted_usage,
            anomaly: r.anomaly,
        }
    }
}

/// One aggregate usage total for a single date.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyTotal {
    pub date: Date,
    pub total_usage: f64,
}

const SELECT_COLUMNS: &str = r#"
    area,
    date,
    readings,
    "usage",
    total_usage,
    predicted_usage,
    anomaly
"#;

/// Append one derived record. The history is append-only; there is no
/// update or delete path.
pub async fn insert_usage_record(pool: &PgPool, record: &UsageRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO usage_records
            (area, date, readings, "usage", total_usage, predicted_usage, anomaly)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(&record.area)
    .bind(record.date)
    .bind(Json(&record.readings))
    .bind(Json(&record.usage))
    .bind(record.total_usage)
    .bind(record.predicted_usage)
    .bind(record.anomaly)
    .execute(pool)
    .await?;

    Ok(())
}

/// Most recently stored record for an area: latest date, insertion order
/// breaking ties. This is the "prior reading" used for delta derivation.
pub async fn last_usage_record(pool: &PgPool, area: &str) -> Result<Option<UsageRecord>> {
    let row = sqlx::query_as::<_, UsageRecordRow>(&format!(
        r#"
        SELECT {SELECT_COLUMNS}
        FROM usage_records
        WHERE area = $1
        ORDER BY date DESC, id DESC
        LIMIT 1
        "#
    ))
    .bind(area)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(UsageRecord::from))
}

/// Usage-total history for one area summed per date, oldest first.
/// Model-fitting input; same-date records collapse into one row.
pub async fn usage_totals(pool: &PgPool, area: &str) -> Result<Vec<DailyTotal>> {
    let rows = sqlx::query_as::<_, DailyTotal>(
        r#"
        SELECT date, SUM(total_usage) AS total_usage
        FROM usage_records
        WHERE area = $1
        GROUP BY date
        ORDER BY date
        "#,
    )
    .bind(area)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Latest date with any data at all, across all areas.
pub async fn latest_date(pool: &PgPool) -> Result<Option<Date>> {
    let row: (Option<Date>,) = sqlx::query_as("SELECT MAX(date) FROM usage_records")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

/// All records stored for one date, in insertion order.
pub async fn records_on(pool: &PgPool, date: Date) -> Result<Vec<UsageRecord>> {
    let rows = sqlx::query_as::<_, UsageRecordRow>(&format!(
        r#"
        SELECT {SELECT_COLUMNS}
        FROM usage_records
        WHERE date = $1
        ORDER BY id
        "#
    ))
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(UsageRecord::from).collect())
}

/// Usage summed per date and commodity across a set of areas. The
/// commodity map lives in JSONB, so the unnesting happens in SQL.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommodityDailyTotalRow {
    pub date: Date,
    pub commodity: String,
    pub total: f64,
}

pub async fn daily_commodity_totals(
    pool: &PgPool,
    areas: &[String],
) -> Result<Vec<CommodityDailyTotalRow>> {
    let rows = sqlx::query_as::<_, CommodityDailyTotalRow>(
        r#"
        SELECT
            u.date,
            kv.key AS commodity,
            SUM((kv.value)::float8) AS total
        FROM usage_records u,
             LATERAL jsonb_each_text(u."usage") kv
        WHERE u.area = ANY($1)
        GROUP BY u.date, kv.key
        ORDER BY u.date, kv.key
        "#,
    )
    .bind(areas)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// All records in an inclusive date range, ordered by date then insertion.
pub async fn records_in_range(pool: &PgPool, start: Date, end: Date) -> Result<Vec<UsageRecord>> {
    let rows = sqlx::query_as::<_, UsageRecordRow>(&format!(
        r#"
        SELECT {SELECT_COLUMNS}
        FROM usage_records
        WHERE date >= $1
          AND date <= $2
        ORDER BY date, id
        "#
    ))
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(UsageRecord::from).collect())
}
