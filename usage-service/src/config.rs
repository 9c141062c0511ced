use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

/// The fixed area/commodity catalog. Loaded once at startup and treated as
/// immutable for the lifetime of the process; every component that needs the
/// catalog gets it injected from here rather than carrying its own copy.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_areas")]
    pub areas: Vec<String>,
    #[serde(default = "default_commodities")]
    pub commodities: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            areas: default_areas(),
            commodities: default_commodities(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyPolicyKind {
    /// `total_usage > threshold`
    Fixed,
    /// `total_usage > predicted * margin`, non-anomalous below the
    /// minimum-history requirement of the forecaster.
    Forecast,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyConfig {
    pub policy: AnomalyPolicyKind,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_margin")]
    pub margin: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            policy: AnomalyPolicyKind::Forecast,
            threshold: default_threshold(),
            margin: default_margin(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    /// Records required before the seasonal model produces a prediction.
    #[serde(default = "default_min_history")]
    pub min_history: usize,
    /// Trailing points fed to the linear-trend extrapolator.
    #[serde(default = "default_trend_window")]
    pub trend_window: usize,
    /// Future steps emitted by the linear-trend extrapolator.
    #[serde(default = "default_horizon")]
    pub horizon: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_history: default_min_history(),
            trend_window: default_trend_window(),
            horizon: default_horizon(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { top_n: default_top_n() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("USAGE_CONFIG").unwrap_or_else(|_| "usage-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        let cfg: AppConfig = toml::from_str(&contents)?;
        Ok(cfg)
    }
}

fn default_areas() -> Vec<String> {
    [
        "HOSTEL 1",
        "HOSTEL 2",
        "HOSTEL 3",
        "HOSTEL 4",
        "HOSTEL 5",
        "HOSTEL 7",
        "HOSTEL 8",
        "HOSTEL 9",
        "HOSTEL 10",
        "CAFETERIA 1",
        "CAFETERIA 2",
        "ACADEMIC BLOCK",
        "NOB",
        "HOUSING FACILITY 1",
        "HOUSING FACILITY 2",
        "HOUSING FACILITY 3",
        "HOUSING FACULTY 4",
        "HOUSING FACULTY 5",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_commodities() -> Vec<String> {
    vec!["domestic".to_string(), "secondary".to_string()]
}

fn default_threshold() -> f64 {
    500.0
}

fn default_margin() -> f64 {
    1.2
}

fn default_min_history() -> usize {
    10
}

fn default_trend_window() -> usize {
    7
}

fn default_horizon() -> usize {
    3
}

fn default_top_n() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let toml_str = r#"
            [database]
            uri = "postgres://localhost:8812/qdb"
            max_connections = 4

            [http]
            bind_addr = "127.0.0.1:8080"
        "#;

        let cfg: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.catalog.areas.len(), 18);
        assert_eq!(cfg.catalog.commodities, vec!["domestic", "secondary"]);
        assert_eq!(cfg.anomaly.policy, AnomalyPolicyKind::Forecast);
        assert_eq!(cfg.anomaly.threshold, 500.0);
        assert_eq!(cfg.anomaly.margin, 1.2);
        assert_eq!(cfg.forecast.min_history, 10);
        assert_eq!(cfg.forecast.trend_window, 7);
        assert_eq!(cfg.forecast.horizon, 3);
        assert_eq!(cfg.dashboard.top_n, 3);
        assert!(cfg.metrics.is_none());
    }

    #[test]
    fn anomaly_policy_parses_from_snake_case() {
        let toml_str = r#"
            [database]
            uri = "postgres://localhost:8812/qdb"
            max_connections = 4

            [http]
            bind_addr = "127.0.0.1:8080"

            [anomaly]
            policy = "fixed"
            threshold = 750.0
        "#;

        let cfg: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.anomaly.policy, AnomalyPolicyKind::Fixed);
        assert_eq!(cfg.anomaly.threshold, 750.0);
        // margin still defaulted even when unused by the fixed policy
        assert_eq!(cfg.anomaly.margin, 1.2);
    }
}
