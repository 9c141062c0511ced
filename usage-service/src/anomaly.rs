use crate::config::{AnomalyConfig, AnomalyPolicyKind};

/// Deployment-selected anomaly policy. Exactly one variant is active per
/// process; callers never combine them.
#[derive(Debug, Clone, Copy)]
pub enum AnomalyPolicy {
    /// Flag when total usage strictly exceeds a fixed threshold.
    Fixed { threshold: f64 },
    /// Flag when total usage strictly exceeds the forecast scaled by a
    /// margin. Absence of a forecast (thin history) means no anomaly.
    ForecastRelative { margin: f64 },
}

impl AnomalyPolicy {
    pub fn from_config(cfg: &AnomalyConfig) -> Self {
        match cfg.policy {
            AnomalyPolicyKind::Fixed => Self::Fixed { threshold: cfg.threshold },
            AnomalyPolicyKind::Forecast => Self::ForecastRelative { margin: cfg.margin },
        }
    }

    /// Whether this policy consumes a per-area forecast at ingestion time.
    pub fn needs_forecast(&self) -> bool {
        matches!(self, Self::ForecastRelative { .. })
    }

    /// Classify one derived usage total. `predicted` is the single-step
    /// forecast for the area, when one exists.
    pub fn classify(&self, total_usage: f64, predicted: Option<f64>) -> bool {
        match self {
            Self::Fixed { threshold } => total_usage > *threshold,
            Self::ForecastRelative { margin } => match predicted {
                Some(p) => total_usage > p * margin,
                None => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_flags_strictly_above_threshold() {
        let policy = AnomalyPolicy::Fixed { threshold: 500.0 };

        assert!(!policy.classify(499.9, None));
        assert!(!policy.classify(500.0, None)); // boundary equality is normal
        assert!(policy.classify(500.1, None));
    }

    #[test]
    fn fixed_policy_ignores_predictions() {
        let policy = AnomalyPolicy::Fixed { threshold: 500.0 };

        assert!(policy.classify(600.0, Some(10_000.0)));
    }

    #[test]
    fn forecast_policy_compares_against_scaled_prediction() {
        let policy = AnomalyPolicy::ForecastRelative { margin: 1.2 };

        assert!(!policy.classify(119.9, Some(100.0)));
        assert!(!policy.classify(120.0, Some(100.0)));
        assert!(policy.classify(120.1, Some(100.0)));
    }

    #[test]
    fn forecast_policy_without_prediction_never_flags() {
        // Thin history: no signal defaults to "no anomaly", whatever the
        // magnitude.
        let policy = AnomalyPolicy::ForecastRelative { margin: 1.2 };

        assert!(!policy.classify(1_000_000.0, None));
    }

    #[test]
    fn from_config_selects_the_tagged_variant() {
        let cfg = AnomalyConfig {
            policy: crate::config::AnomalyPolicyKind::Fixed,
            threshold: 500.0,
            margin: 1.2,
        };
        let policy = AnomalyPolicy::from_config(&cfg);
        assert!(!policy.needs_forecast());

        let cfg = AnomalyConfig::default();
        let policy = AnomalyPolicy::from_config(&cfg);
        assert!(policy.needs_forecast());
    }
}
