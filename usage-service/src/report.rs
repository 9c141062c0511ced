//! Dashboard and export aggregation over stored usage records.
//!
//! Both views are catalog-complete: every configured area appears in
//! catalog order whether or not it has data, zero-filled where absent.

use metering_client::domain::{CommodityValues, UsageRecord};
use serde::Serialize;
use time::Date;

use crate::catalog::Catalog;

/// One dashboard line: latest-day usage for one area.
#[derive(Debug, Clone, Serialize)]
pub struct AreaSummary {
    pub area: String,
    pub usage: CommodityValues,
    pub total_usage: f64,
    pub anomaly: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardTotals {
    pub per_commodity: CommodityValues,
    pub overall: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// Latest date with data, `None` for an empty store (the area list is
    /// still emitted in full).
    pub date: Option<Date>,
    pub areas: Vec<AreaSummary>,
    pub totals: DashboardTotals,
    /// Top consumers by total usage, descending; ties keep catalog order.
    pub top_consumers: Vec<AreaSummary>,
}

/// Wide export row: one date, one cell per (area, commodity) column.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub date: Date,
    pub cells: Vec<f64>,
}

/// Date x (area x commodity) pivot. Columns follow catalog area order with
/// commodities interleaved per area; `columns` carries the labels in cell
/// order.
#[derive(Debug, Clone, Serialize)]
pub struct ExportMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<ExportRow>,
}

/// Build the latest-day dashboard from the records stored on that day.
///
/// `records` are the rows for `date` in insertion order; when an area has
/// several rows on the same date the last inserted wins, matching the
/// "latest record" rule used at ingestion.
pub fn build_dashboard(
    date: Option<Date>,
    records: &[UsageRecord],
    catalog: &Catalog,
    top_n: usize,
) -> Dashboard {
    let mut areas: Vec<AreaSummary> = Vec::with_capacity(catalog.areas().len());

    for area in catalog.areas() {
        let latest = records.iter().rev().find(|r| &r.area == area);

        let summary = match latest {
            Some(r) => AreaSummary {
                area: area.clone(),
                usage: zero_filled(&r.usage, catalog.commodities()),
                total_usage: r.total_usage,
                anomaly: r.anomaly,
            },
            None => AreaSummary {
                area: area.clone(),
                usage: zero_filled(&CommodityValues::new(), catalog.commodities()),
                total_usage: 0.0,
                anomaly: false,
            },
        };
        areas.push(summary);
    }

    let mut per_commodity = CommodityValues::new();
    for commodity in catalog.commodities() {
        let sum: f64 = areas.iter().map(|a| a.usage.get(commodity).copied().unwrap_or(0.0)).sum();
        per_commodity.insert(commodity.clone(), sum);
    }
    let overall: f64 = areas.iter().map(|a| a.total_usage).sum();

    // Stable sort keeps catalog order for equal totals.
    let mut ranked = areas.clone();
    ranked.sort_by(|a, b| b.total_usage.total_cmp(&a.total_usage));
    ranked.truncate(top_n);

    Dashboard {
        date,
        areas,
        totals: DashboardTotals { per_commodity, overall },
        top_consumers: ranked,
    }
}

/// Build the export pivot for the given in-range records, ordered by date.
///
/// Returns `None` when no records matched; the caller reports that as a
/// distinct no-data outcome rather than an empty matrix.
pub fn build_export(records: &[UsageRecord], catalog: &Catalog) -> Option<ExportMatrix> {
    if records.is_empty() {
        return None;
    }

    let mut dates: Vec<Date> = records.iter().map(|r| r.date).collect();
    dates.sort_unstable();
    dates.dedup();

    let columns: Vec<String> = catalog
        .areas()
        .iter()
        .flat_map(|area| {
            catalog
                .commodities()
                .iter()
                .map(move |commodity| format!("{area} ({commodity})"))
        })
        .collect();

    let rows = dates
        .into_iter()
        .map(|date| {
            let mut cells = Vec::with_capacity(columns.len());
            for area in catalog.areas() {
                for commodity in catalog.commodities() {
                    // Several rows for the same area+date accumulate.
                    let value: f64 = records
                        .iter()
                        .filter(|r| r.date == date && &r.area == area)
                        .map(|r| r.usage_for(commodity))
                        .sum();
                    cells.push(value);
                }
            }
            ExportRow { date, cells }
        })
        .collect();

    Some(ExportMatrix { columns, rows })
}

fn zero_filled(values: &CommodityValues, commodities: &[String]) -> CommodityValues {
    commodities
        .iter()
        .map(|c| (c.clone(), values.get(c).copied().unwrap_or(0.0)))
        .collect()
}
