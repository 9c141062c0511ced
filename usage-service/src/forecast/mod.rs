pub mod seasonal;
pub mod trend;

pub use trend::ForecastPoint;

/// Predictions are reported to 2 decimal places everywhere.
pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
