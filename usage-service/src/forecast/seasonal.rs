//! Per-area single-step forecasting with MSTL + ETS.
//!
//! The model is refit from scratch over the area's full history on every
//! call. That keeps it immune to stale-model bugs at the price of refit
//! latency, which is acceptable at one fit per ingested reading.

use std::collections::HashMap;
use std::time::Instant;

use augurs::{
    ets::AutoETS,
    forecaster::{transforms::LinearInterpolator, Forecaster},
    mstl::MSTLModel,
};
use time::Date;

use super::round2;
use crate::store::DailyTotal;

/// Weekly seasonality period for daily series.
const WEEKLY_PERIOD: usize = 7;

/// Below two full weeks MSTL cannot see a weekly pattern; fall back to a
/// plain trend model.
const MIN_SEASONAL_POINTS: usize = 2 * WEEKLY_PERIOD;

const CONFIDENCE_LEVEL: f64 = 0.95;

/// Predict the next daily usage total for one area.
///
/// Returns `None` (no prediction, never an error) when the history is
/// shorter than `min_history` or the model fails to fit. The result is
/// rounded to 2 decimals.
pub fn predict_next(history: &[DailyTotal], min_history: usize) -> Option<f64> {
    if history.len() < min_history {
        return None;
    }

    let values = gap_filled_values(history);

    let started = Instant::now();
    let result = if values.len() >= MIN_SEASONAL_POINTS {
        fit_and_predict_seasonal(&values)
    } else {
        fit_and_predict_trend(&values)
    };
    metrics::counter!("seasonal_model_fits_total").increment(1);
    metrics::histogram!("seasonal_model_fit_seconds").record(started.elapsed().as_secs_f64());

    match result {
        Ok(predicted) => Some(round2(predicted)),
        Err(e) => {
            tracing::warn!(error = %e, "seasonal model fit failed, no prediction");
            None
        }
    }
}

/// Expand the history to one value per calendar day, zero-filling dates
/// with no reading so the weekly period lines up with real weekdays.
fn gap_filled_values(history: &[DailyTotal]) -> Vec<f64> {
    let by_date: HashMap<Date, f64> = history
        .iter()
        .map(|t| (t.date, t.total_usage))
        .collect();

    let first = history.iter().map(|t| t.date).min();
    let last = history.iter().map(|t| t.date).max();
    let (Some(first), Some(last)) = (first, last) else {
        return Vec::new();
    };

    let mut values = Vec::new();
    let mut current = first;
    while current <= last {
        values.push(by_date.get(&current).copied().unwrap_or(0.0));
        match current.next_day() {
            Some(next) => current = next,
            None => break,
        }
    }

    values
}

fn fit_and_predict_seasonal(values: &[f64]) -> Result<f64, String> {
    let ets = AutoETS::non_seasonal().into_trend_model();
    let mstl = MSTLModel::new(vec![WEEKLY_PERIOD], ets);

    let transformers: Vec<Box<dyn augurs::forecaster::Transformer>> =
        vec![Box::new(LinearInterpolator::default())];
    let mut forecaster = Forecaster::new(mstl).with_transformers(transformers);

    forecaster.fit(values).map_err(|e| format!("MSTL fit error: {e}"))?;
    let forecast = forecaster
        .predict(1, CONFIDENCE_LEVEL)
        .map_err(|e| format!("MSTL predict error: {e}"))?;

    single_point(&forecast.point)
}

fn fit_and_predict_trend(values: &[f64]) -> Result<f64, String> {
    let ets = AutoETS::non_seasonal();

    let transformers: Vec<Box<dyn augurs::forecaster::Transformer>> =
        vec![Box::new(LinearInterpolator::default())];
    let mut forecaster = Forecaster::new(ets).with_transformers(transformers);

    forecaster.fit(values).map_err(|e| format!("ETS fit error: {e}"))?;
    let forecast = forecaster
        .predict(1, CONFIDENCE_LEVEL)
        .map_err(|e| format!("ETS predict error: {e}"))?;

    single_point(&forecast.point)
}

fn single_point(point: &[f64]) -> Result<f64, String> {
    point
        .first()
        .copied()
        .ok_or_else(|| "model returned an empty forecast".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use time::Duration;

    fn history_from(values: &[f64]) -> Vec<DailyTotal> {
        let start = date!(2025 - 01 - 01);
        values
            .iter()
            .enumerate()
            .map(|(i, v)| DailyTotal {
                date: start + Duration::days(i as i64),
                total_usage: *v,
            })
            .collect()
    }

    #[test]
    fn below_min_history_yields_no_prediction() {
        let history = history_from(&[100.0; 9]);
        assert_eq!(predict_next(&history, 10), None);
    }

    #[test]
    fn steady_series_predicts_in_the_neighbourhood() {
        // 10 points: below the seasonal cutoff, plain ETS path.
        let values: Vec<f64> = (0..10).map(|i| 100.0 + (i as f64) * 0.5).collect();
        let history = history_from(&values);
        let predicted = predict_next(&history, 10).unwrap();
        assert!((predicted - 104.5).abs() < 20.0, "got {predicted}");
    }

    #[test]
    fn long_series_uses_the_seasonal_path_and_predicts() {
        // Four weeks of weekday/weekend structure.
        let values: Vec<f64> = (0..28)
            .map(|i| if i % 7 < 5 { 200.0 } else { 50.0 })
            .collect();
        let history = history_from(&values);

        let predicted = predict_next(&history, 10);
        assert!(predicted.is_some());
    }

    #[test]
    fn prediction_is_rounded_to_two_decimals() {
        let values: Vec<f64> = (0..12).map(|i| 100.0 + (i as f64) * 0.37).collect();
        let history = history_from(&values);

        let predicted = predict_next(&history, 10).unwrap();
        assert_eq!(round2(predicted), predicted);
    }

    #[test]
    fn gap_filling_inserts_zero_days() {
        let history = vec![
            DailyTotal { date: date!(2025 - 01 - 01), total_usage: 10.0 },
            DailyTotal { date: date!(2025 - 01 - 04), total_usage: 40.0 },
        ];
        assert_eq!(gap_filled_values(&history), vec![10.0, 0.0, 0.0, 40.0]);
    }
}
