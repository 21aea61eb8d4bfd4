//! Short-horizon forecast blended from two independent estimators.
//!
//! The additive trend/seasonality model sees the series as `(offset, value)`
//! pairs; the autoregressive model sees only the value sequence. Each
//! horizon bucket gets the arithmetic mean of both point forecasts.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ForecastConfig;
use crate::error::{FitError, ForecastUnavailable};
use crate::pipeline::arima::{Arima, Constraints, Order};
use crate::pipeline::decomposition::AdditiveModel;
use crate::pipeline::types::{EstimatorPath, ForecastOutcome, SeriesPoint};

/// ARMA(2,1) on the raw values.
const PRIMARY_ORDER: Order = Order::new(2, 0, 1);
/// ARIMA(2,1,1) without stationarity or invertibility checks.
const RELAXED_ORDER: Order = Order::new(2, 1, 1);

/// Forecasts `config.horizon` buckets immediately after the last historical
/// bucket of `series`.
#[tracing::instrument(skip(series), fields(points = series.len(), horizon = config.horizon))]
pub fn forecast(
    series: &[SeriesPoint],
    width: i64,
    config: &ForecastConfig,
) -> Result<ForecastOutcome, ForecastUnavailable> {
    let required = config.min_points.max(2);
    if series.len() < required {
        return Err(ForecastUnavailable::TooShort {
            required,
            actual: series.len(),
        });
    }

    let first = series[0].bucket;
    let last = series[series.len() - 1].bucket;
    let offset = |bucket: i64| ((bucket - first) / width) as f64;

    let observations: Vec<(f64, f64)> = series
        .iter()
        .map(|p| (offset(p.bucket), p.value))
        .collect();
    let trend = AdditiveModel::fit(&observations, config.max_season_period)
        .map_err(ForecastUnavailable::Trend)?;

    let values: Vec<f64> = series.iter().map(|p| p.value).collect();
    let (autoregressive, path) = fit_autoregressive(&values, config.horizon)?;

    let points = (1..=config.horizon)
        .zip(autoregressive)
        .map(|(step, ar)| {
            let bucket = last + step as i64 * width;
            let additive = trend.predict_at(offset(bucket));
            SeriesPoint::new(bucket, (additive + ar) / 2.0)
        })
        .collect();

    debug!(?path, season_period = ?trend.period(), "Forecast blended");

    Ok(ForecastOutcome {
        points,
        path,
        season_period: trend.period(),
    })
}

/// Fits the primary ARMA model, falling back to the relaxed ARIMA model.
fn fit_autoregressive(
    values: &[f64],
    horizon: usize,
) -> Result<(Vec<f64>, EstimatorPath), ForecastUnavailable> {
    let primary = Arima::fit(values, PRIMARY_ORDER, Constraints::Enforced)
        .and_then(|model| model.predict(horizon));

    let primary_err = match primary {
        Ok(forecast) => return Ok((forecast, EstimatorPath::Primary)),
        Err(e) => e,
    };

    warn!(error = %primary_err, "Primary ARMA fit rejected, retrying with relaxed ARIMA");

    Arima::fit(values, RELAXED_ORDER, Constraints::Relaxed)
        .and_then(|model| model.predict(horizon))
        .map(|forecast| (forecast, EstimatorPath::Relaxed))
        .map_err(|relaxed: FitError| ForecastUnavailable::NoConvergence {
            primary: primary_err,
            relaxed,
        })
}

/// Runs [`forecast`] on the blocking pool, giving up after `config.timeout`.
///
/// A timed-out fit is not cancelled: it finishes on its blocking thread and
/// the result is dropped. The fit is bounded by the series length and
/// horizon, so the thread is released shortly after.
pub async fn forecast_bounded(
    series: Vec<SeriesPoint>,
    width: i64,
    config: ForecastConfig,
) -> Result<ForecastOutcome, ForecastUnavailable> {
    let timeout: Duration = config.timeout;
    let task = tokio::task::spawn_blocking(move || forecast(&series, width, &config));

    let joined = tokio::time::timeout(timeout, task)
        .await
        .map_err(|_| ForecastUnavailable::Timeout(timeout))?;
    joined?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::NANOS_PER_MINUTE;

    const W: i64 = NANOS_PER_MINUTE;

    fn series(values: &[f64]) -> Vec<SeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SeriesPoint::new(1_000 * W + i as i64 * W, *v))
            .collect()
    }

    fn config(horizon: usize) -> ForecastConfig {
        ForecastConfig {
            horizon,
            ..ForecastConfig::default()
        }
    }

    #[test]
    fn test_three_bucket_scenario() {
        let input = series(&[10.0, 0.0, 5.0]);
        let outcome = forecast(&input, W, &config(2)).unwrap();

        let buckets: Vec<i64> = outcome.points.iter().map(|p| p.bucket).collect();
        assert_eq!(buckets, vec![1_003 * W, 1_004 * W]);
        assert_eq!(outcome.path, EstimatorPath::Primary);
    }

    #[test]
    fn test_too_short_fails_fast() {
        let err = forecast(&series(&[4.0, 6.0]), W, &config(10)).unwrap_err();
        assert!(matches!(
            err,
            ForecastUnavailable::TooShort {
                required: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_constant_series_uses_relaxed_path() {
        let outcome = forecast(&series(&[6.0; 15]), W, &config(10)).unwrap();

        assert_eq!(outcome.path, EstimatorPath::Relaxed);
        assert_eq!(outcome.points.len(), 10);
        for p in &outcome.points {
            assert!((p.value - 6.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_horizon_is_contiguous_after_gaps() {
        // sparse history: buckets 0, 1, 4, 5, 9
        let input: Vec<SeriesPoint> = [(0i64, 3.0), (1, 5.0), (4, 2.0), (5, 8.0), (9, 4.0)]
            .iter()
            .map(|(i, v)| SeriesPoint::new(i * W, *v))
            .collect();

        let outcome = forecast(&input, W, &config(10)).unwrap();
        assert_eq!(outcome.points.len(), 10);
        for (k, p) in outcome.points.iter().enumerate() {
            assert_eq!(p.bucket, (10 + k as i64) * W);
        }
    }

    #[test]
    fn test_blend_is_mean_of_estimators() {
        let values = [4.0, 9.0, 3.0, 8.0, 5.0, 11.0, 6.0, 7.0];
        let input = series(&values);
        let cfg = config(3);

        let outcome = forecast(&input, W, &cfg).unwrap();

        let observations: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect();
        let trend = AdditiveModel::fit(&observations, cfg.max_season_period).unwrap();
        let (ar, path) = fit_autoregressive(&values, 3).unwrap();
        assert_eq!(outcome.path, path);

        for (k, p) in outcome.points.iter().enumerate() {
            let additive = trend.predict_at((values.len() + k) as f64);
            assert!((p.value - (additive + ar[k]) / 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_no_convergence_reports_both_failures() {
        let err = fit_autoregressive(&[1.0, f64::NAN, 3.0, 4.0], 5).unwrap_err();
        match err {
            ForecastUnavailable::NoConvergence { primary, relaxed } => {
                assert_eq!(primary, FitError::NonFinite);
                assert_eq!(relaxed, FitError::NonFinite);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_forecast_bounded_returns_result() {
        let outcome = forecast_bounded(series(&[10.0, 0.0, 5.0, 7.0]), W, config(4))
            .await
            .unwrap();
        assert_eq!(outcome.points.len(), 4);
    }

    #[tokio::test]
    async fn test_forecast_bounded_times_out() {
        let values: Vec<f64> = (0..50_000).map(|i| (i % 17) as f64).collect();
        let cfg = ForecastConfig {
            timeout: Duration::ZERO,
            ..config(10)
        };

        let err = forecast_bounded(series(&values), W, cfg).await.unwrap_err();
        assert!(matches!(err, ForecastUnavailable::Timeout(d) if d.is_zero()));
    }

    #[tokio::test]
    async fn test_forecast_bounded_propagates_unavailable() {
        let err = forecast_bounded(series(&[1.0]), W, config(4)).await.unwrap_err();
        assert!(matches!(err, ForecastUnavailable::TooShort { .. }));
    }
}
