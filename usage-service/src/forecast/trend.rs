//! Short-window linear-trend extrapolation for aggregate daily series.
//!
//! Fits an ordinary-least-squares line over the trailing window of each
//! commodity's daily totals and evaluates it a few steps past the end.
//! Historical and predicted points are blended into one ordered series.

use metering_client::domain::CommodityValues;
use serde::Serialize;
use time::{Date, Duration};

use super::round2;

/// One point of a blended history+forecast series.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastPoint {
    pub date: Date,
    /// Per-commodity daily totals (actual or predicted).
    pub values: CommodityValues,
    pub is_forecast: bool,
}

/// Build the blended series for an aggregate per-date history.
///
/// `history` must be ordered by date, one entry per date with data. The
/// last `min(window, len)` points feed the line fit; `horizon` predicted
/// points follow the history, clamped to >= 0 and rounded to 2 decimals.
///
/// No history yields an empty series. A single point cannot support a line
/// fit, so the history is returned without predictions.
pub fn forecast_series(
    history: &[(Date, CommodityValues)],
    commodities: &[String],
    window: usize,
    horizon: usize,
) -> Vec<ForecastPoint> {
    let mut series: Vec<ForecastPoint> = history
        .iter()
        .map(|(date, values)| ForecastPoint {
            date: *date,
            values: zero_filled(values, commodities),
            is_forecast: false,
        })
        .collect();

    if history.len() < 2 || horizon == 0 {
        return series;
    }

    let window_len = window.min(history.len());
    let tail = &history[history.len() - window_len..];
    let last_date = history[history.len() - 1].0;

    // One independent line per commodity over the same window.
    let mut fits: Vec<(String, f64, f64)> = Vec::with_capacity(commodities.len());
    for commodity in commodities {
        let ys: Vec<f64> = tail
            .iter()
            .map(|(_, values)| values.get(commodity).copied().unwrap_or(0.0))
            .collect();
        if let Some((slope, intercept)) = fit_line(&ys) {
            fits.push((commodity.clone(), slope, intercept));
        }
    }

    for step in 1..=horizon {
        let x = (window_len - 1 + step) as f64;
        let mut values = CommodityValues::new();
        for (commodity, slope, intercept) in &fits {
            let predicted = (slope * x + intercept).max(0.0);
            values.insert(commodity.clone(), round2(predicted));
        }

        series.push(ForecastPoint {
            date: last_date + Duration::days(step as i64),
            values,
            is_forecast: true,
        });
    }

    series
}

fn zero_filled(values: &CommodityValues, commodities: &[String]) -> CommodityValues {
    commodities
        .iter()
        .map(|c| (c.clone(), values.get(c).copied().unwrap_or(0.0)))
        .collect()
}

/// Least-squares line `y = slope * x + intercept` with x = 0..n-1.
/// Degenerate below two points.
fn fit_line(ys: &[f64]) -> Option<(f64, f64)> {
    let n = ys.len();
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let sum_x: f64 = (0..n).map(|i| i as f64).sum();
    let sum_y: f64 = ys.iter().sum();
    let sum_xx: f64 = (0..n).map(|i| (i as f64) * (i as f64)).sum();
    let sum_xy: f64 = ys.iter().enumerate().map(|(i, y)| (i as f64) * y).sum();

    let denom = n_f * sum_xx - sum_x * sum_x;
    if denom == 0.0 {
        return None;
    }

    let slope = (n_f * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n_f;

    Some((slope, intercept))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn commodities() -> Vec<String> {
        vec!["domestic".to_string()]
    }

    fn history_from(totals: &[f64]) -> Vec<(Date, CommodityValues)> {
        let start = date!(2025 - 03 - 01);
        totals
            .iter()
            .enumerate()
            .map(|(i, v)| {
                (
                    start + Duration::days(i as i64),
                    CommodityValues::from([("domestic".to_string(), *v)]),
                )
            })
            .collect()
    }

    #[test]
    fn perfect_linear_trend_extrapolates_exactly() {
        let history = history_from(&[10.0, 20.0, 30.0]);
        let series = forecast_series(&history, &commodities(), 7, 3);

        assert_eq!(series.len(), 6);
        let predicted: Vec<f64> = series
            .iter()
            .filter(|p| p.is_forecast)
            .map(|p| p.values["domestic"])
            .collect();
        assert_eq!(predicted, vec![40.0, 50.0, 60.0]);
    }

    #[test]
    fn forecast_dates_continue_the_history() {
        let history = history_from(&[10.0, 20.0, 30.0]);
        let series = forecast_series(&history, &commodities(), 7, 3);

        assert_eq!(series[2].date, date!(2025 - 03 - 03));
        assert!(!series[2].is_forecast);
        assert_eq!(series[3].date, date!(2025 - 03 - 04));
        assert!(series[3].is_forecast);
        assert_eq!(series[5].date, date!(2025 - 03 - 06));
    }

    #[test]
    fn declining_series_clamps_to_zero() {
        let history = history_from(&[30.0, 20.0, 10.0]);
        let series = forecast_series(&history, &commodities(), 7, 3);

        let predicted: Vec<f64> = series
            .iter()
            .filter(|p| p.is_forecast)
            .map(|p| p.values["domestic"])
            .collect();
        assert_eq!(predicted, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn only_the_trailing_window_feeds_the_fit() {
        // Seven flat points after an early spike; window 7 excludes the
        // spike entirely.
        let history = history_from(&[1000.0, 50.0, 50.0, 50.0, 50.0, 50.0, 50.0, 50.0]);
        let series = forecast_series(&history, &commodities(), 7, 1);

        let predicted = series.last().unwrap();
        assert!(predicted.is_forecast);
        assert_eq!(predicted.values["domestic"], 50.0);
    }

    #[test]
    fn forecast_points_serialize_calendar_dates() {
        let history = history_from(&[10.0, 20.0]);
        let series = forecast_series(&history, &commodities(), 7, 1);

        let value = serde_json::to_value(series.last().unwrap()).unwrap();
        assert_eq!(value["date"], "2025-03-03");
        assert_eq!(value["is_forecast"], true);
        assert_eq!(value["values"]["domestic"], 30.0);
    }

    #[test]
    fn empty_history_yields_empty_series() {
        let series = forecast_series(&[], &commodities(), 7, 3);
        assert!(series.is_empty());
    }

    #[test]
    fn single_point_returns_history_without_predictions() {
        let history = history_from(&[42.0]);
        let series = forecast_series(&history, &commodities(), 7, 3);

        assert_eq!(series.len(), 1);
        assert!(!series[0].is_forecast);
    }

    #[test]
    fn commodities_fit_independently() {
        let start = date!(2025 - 03 - 01);
        let history: Vec<(Date, CommodityValues)> = (0..3)
            .map(|i| {
                (
                    start + Duration::days(i),
                    CommodityValues::from([
                        ("domestic".to_string(), 10.0 * (i + 1) as f64),
                        ("secondary".to_string(), 5.0),
                    ]),
                )
            })
            .collect();
        let two = vec!["domestic".to_string(), "secondary".to_string()];

        let series = forecast_series(&history, &two, 7, 1);
        let predicted = series.last().unwrap();
        assert_eq!(predicted.values["domestic"], 40.0);
        assert_eq!(predicted.values["secondary"], 5.0);
    }
}
