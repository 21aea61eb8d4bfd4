//! Pipeline settings, read from the environment (and `.env` via dotenvy in
//! the binary) with CLI overrides applied on top.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::pipeline::types::{Metric, NANOS_PER_MINUTE};

#[derive(Debug, Clone)]
pub struct ForecastConfig {
    /// Buckets forecast past the last historical bucket.
    pub horizon: usize,
    /// Shorter series fail fast with `ForecastUnavailable::TooShort`.
    pub min_points: usize,
    /// Upper bound for seasonality detection; 0 disables it.
    pub max_season_period: usize,
    pub timeout: Duration,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 10,
            min_points: 3,
            max_season_period: 30,
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Bucket width in nanoseconds.
    pub bucket_width: i64,
    /// Metric summed for the main chart.
    pub metric: Metric,
    pub forecast: ForecastConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bucket_width: NANOS_PER_MINUTE,
            metric: Metric::JustJoined,
            forecast: ForecastConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Reads `BUCKET_WIDTH_SECS`, `FORECAST_HORIZON`, `FORECAST_MIN_POINTS`,
    /// `FORECAST_MAX_SEASON` and `FORECAST_TIMEOUT_SECS`, keeping defaults for
    /// unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<i64>(&lookup, "BUCKET_WIDTH_SECS")? {
            config.bucket_width = secs.saturating_mul(1_000_000_000);
        }
        if let Some(horizon) = parse_var(&lookup, "FORECAST_HORIZON")? {
            config.forecast.horizon = horizon;
        }
        if let Some(min_points) = parse_var(&lookup, "FORECAST_MIN_POINTS")? {
            config.forecast.min_points = min_points;
        }
        if let Some(max_season) = parse_var(&lookup, "FORECAST_MAX_SEASON")? {
            config.forecast.max_season_period = max_season;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "FORECAST_TIMEOUT_SECS")? {
            config.forecast.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_width <= 0 {
            return Err(ConfigError::NonPositive("BUCKET_WIDTH_SECS"));
        }
        if self.forecast.min_points == 0 {
            return Err(ConfigError::NonPositive("FORECAST_MIN_POINTS"));
        }
        if self.forecast.timeout.is_zero() {
            return Err(ConfigError::NonPositive("FORECAST_TIMEOUT_SECS"));
        }
        Ok(())
    }

    /// Upper end of the time slider: the newest record plus the forecast horizon.
    pub fn slider_max(&self, max_ts: i64) -> i64 {
        max_ts + self.bucket_width * self.forecast.horizon as i64
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { var, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = PipelineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bucket_width, NANOS_PER_MINUTE);
        assert_eq!(config.forecast.horizon, 10);
        assert_eq!(config.forecast.min_points, 3);
        assert_eq!(config.forecast.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides_from_env() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("BUCKET_WIDTH_SECS", "120"),
            ("FORECAST_HORIZON", " 4 "),
            ("FORECAST_TIMEOUT_SECS", "1"),
        ]))
        .unwrap();

        assert_eq!(config.bucket_width, 2 * NANOS_PER_MINUTE);
        assert_eq!(config.forecast.horizon, 4);
        assert_eq!(config.forecast.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_value_rejected() {
        let err = PipelineConfig::from_lookup(lookup(&[("FORECAST_HORIZON", "ten")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidVar {
                var: "FORECAST_HORIZON",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_bucket_width_rejected() {
        let err = PipelineConfig::from_lookup(lookup(&[("BUCKET_WIDTH_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositive("BUCKET_WIDTH_SECS")));
    }

    #[test]
    fn test_slider_max_includes_horizon() {
        let config = PipelineConfig::default();
        assert_eq!(config.slider_max(0), 10 * NANOS_PER_MINUTE);
    }
}
