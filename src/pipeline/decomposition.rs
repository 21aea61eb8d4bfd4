//! Additive trend + seasonality estimator.
//!
//! The series is modelled as `y(t) = intercept + slope * t + s(t mod period)`
//! where `t` is the bucket offset from the first observation. Gaps in the
//! historical series keep their true time offset, so the trend is fitted
//! against time rather than against the observation index.

use crate::error::FitError;

/// Minimum autocorrelation at a lag for it to count as a seasonal period.
const MIN_SEASONAL_ACF: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct AdditiveModel {
    intercept: f64,
    slope: f64,
    /// Centered per-phase offsets; empty when no seasonality was detected.
    seasonal: Vec<f64>,
}

impl AdditiveModel {
    /// Fits the model to `(t, value)` observations.
    ///
    /// `max_period` bounds the seasonality search; pass 0 to disable it.
    pub fn fit(points: &[(f64, f64)], max_period: usize) -> Result<Self, FitError> {
        if points.len() < 2 {
            return Err(FitError::InsufficientData {
                required: 2,
                actual: points.len(),
            });
        }
        if points.iter().any(|(t, y)| !t.is_finite() || !y.is_finite()) {
            return Err(FitError::NonFinite);
        }

        let (intercept, slope) = linear_trend(points)?;

        let seasonal = match detect_period(&dense_values(points), max_period) {
            Some(period) => seasonal_offsets(points, intercept, slope, period),
            None => Vec::new(),
        };

        Ok(Self {
            intercept,
            slope,
            seasonal,
        })
    }

    pub fn period(&self) -> Option<usize> {
        (!self.seasonal.is_empty()).then_some(self.seasonal.len())
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Point forecast at bucket offset `t`.
    pub fn predict_at(&self, t: f64) -> f64 {
        let trend = self.intercept + self.slope * t;
        if self.seasonal.is_empty() {
            return trend;
        }
        let phase = (t.round() as i64).rem_euclid(self.seasonal.len() as i64) as usize;
        trend + self.seasonal[phase]
    }
}

/// Ordinary least squares fit of `y = intercept + slope * t`.
fn linear_trend(points: &[(f64, f64)]) -> Result<(f64, f64), FitError> {
    let n = points.len() as f64;
    let sum_t: f64 = points.iter().map(|(t, _)| t).sum();
    let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
    let sum_t2: f64 = points.iter().map(|(t, _)| t * t).sum();
    let sum_ty: f64 = points.iter().map(|(t, y)| t * y).sum();

    let denominator = n * sum_t2 - sum_t * sum_t;
    if denominator.abs() < 1e-10 {
        // every observation sits on the same offset
        return Err(FitError::Degenerate);
    }

    let slope = (n * sum_ty - sum_t * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_t) / n;
    Ok((intercept, slope))
}

/// Values laid out by time offset, with unobserved offsets as zero, so the
/// autocorrelation lag is measured in the same unit as the seasonal phase.
fn dense_values(points: &[(f64, f64)]) -> Vec<f64> {
    let offsets = points.iter().map(|(t, _)| t.round() as i64);
    let (Some(start), Some(end)) = (offsets.clone().min(), offsets.max()) else {
        return Vec::new();
    };

    let mut dense = vec![0.0; (end - start + 1) as usize];
    for (t, y) in points {
        dense[(t.round() as i64 - start) as usize] = *y;
    }
    dense
}

/// Mean detrended residual per phase, shifted so the offsets sum to zero.
fn seasonal_offsets(points: &[(f64, f64)], intercept: f64, slope: f64, period: usize) -> Vec<f64> {
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];

    for (t, y) in points {
        let phase = (t.round() as i64).rem_euclid(period as i64) as usize;
        sums[phase] += y - (intercept + slope * t);
        counts[phase] += 1;
    }

    let mut offsets: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| if c == 0 { 0.0 } else { s / c as f64 })
        .collect();

    let center = offsets.iter().sum::<f64>() / period as f64;
    for o in &mut offsets {
        *o -= center;
    }
    offsets
}

/// Detects a seasonality period using autocorrelation.
///
/// Only lags that fit at least twice in the series are considered.
pub fn detect_period(data: &[f64], max_period: usize) -> Option<usize> {
    let n = data.len();
    let upper = max_period.min(n / 2);
    if upper < 2 {
        return None;
    }

    let mean: f64 = data.iter().sum::<f64>() / n as f64;
    let var: f64 = data.iter().map(|x| (x - mean).powi(2)).sum();
    if var == 0.0 {
        return None;
    }

    let mut best_period = None;
    let mut best_acf = MIN_SEASONAL_ACF;

    for lag in 2..=upper {
        let acf: f64 = data
            .iter()
            .take(n - lag)
            .zip(data.iter().skip(lag))
            .map(|(a, b)| (a - mean) * (b - mean))
            .sum::<f64>()
            / var;

        if acf > best_acf {
            best_acf = acf;
            best_period = Some(lag);
        }
    }

    best_period
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed(values: &[f64]) -> Vec<(f64, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect()
    }

    #[test]
    fn test_linear_series_extrapolates_exactly() {
        let points = indexed(&[10.0, 12.0, 14.0, 16.0, 18.0, 20.0]);
        let model = AdditiveModel::fit(&points, 0).unwrap();

        assert!((model.slope() - 2.0).abs() < 1e-9);
        assert!((model.predict_at(6.0) - 22.0).abs() < 1e-9);
        assert!((model.predict_at(8.0) - 26.0).abs() < 1e-9);
        assert_eq!(model.period(), None);
    }

    #[test]
    fn test_trend_uses_time_offsets_for_gaps() {
        // y = 3t observed at t = 0, 1, 5
        let points = vec![(0.0, 0.0), (1.0, 3.0), (5.0, 15.0)];
        let model = AdditiveModel::fit(&points, 0).unwrap();
        assert!((model.predict_at(6.0) - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_detects_repeating_pattern() {
        let pattern = [0.0, 10.0, 0.0, 10.0];
        let values: Vec<f64> = pattern.iter().cycle().take(24).copied().collect();
        assert_eq!(detect_period(&values, 6), Some(2));
    }

    #[test]
    fn test_seasonal_model_continues_pattern() {
        let values: Vec<f64> = [5.0, 15.0].iter().cycle().take(20).copied().collect();
        let model = AdditiveModel::fit(&indexed(&values), 4).unwrap();

        assert_eq!(model.period(), Some(2));
        assert!((model.predict_at(20.0) - 5.0).abs() < 1.0);
        assert!((model.predict_at(21.0) - 15.0).abs() < 1.0);
    }

    #[test]
    fn test_period_detected_on_time_axis_despite_gaps() {
        let pattern = [0.0, 10.0, 20.0];
        let points: Vec<(f64, f64)> = (0..18)
            .filter(|t| *t != 4 && *t != 10)
            .map(|t| (t as f64, pattern[t % 3]))
            .collect();

        let squeezed: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
        assert_ne!(detect_period(&squeezed, 6), Some(3));

        let model = AdditiveModel::fit(&points, 6).unwrap();
        assert_eq!(model.period(), Some(3));
        assert!((model.predict_at(18.0) - 0.0).abs() < 3.5);
        assert!((model.predict_at(19.0) - 10.0).abs() < 3.5);
        assert!((model.predict_at(20.0) - 20.0).abs() < 3.5);
    }

    #[test]
    fn test_dense_values_fills_gaps_with_zero() {
        let points = vec![(0.0, 4.0), (1.0, 5.0), (4.0, 6.0)];
        assert_eq!(dense_values(&points), vec![4.0, 5.0, 0.0, 0.0, 6.0]);
    }

    #[test]
    fn test_detect_period_constant_series() {
        assert_eq!(detect_period(&[4.0; 20], 5), None);
    }

    #[test]
    fn test_short_series_rejected() {
        let err = AdditiveModel::fit(&[(0.0, 1.0)], 0).unwrap_err();
        assert_eq!(
            err,
            FitError::InsufficientData {
                required: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = AdditiveModel::fit(&indexed(&[1.0, f64::NAN, 3.0]), 0).unwrap_err();
        assert_eq!(err, FitError::NonFinite);
    }
}
