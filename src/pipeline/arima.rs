//! Autoregressive estimator: ARMA(p, q) with optional first differencing.
//!
//! AR coefficients come from the Yule-Walker equations solved with
//! Levinson-Durbin; MA coefficients from the autocorrelation of the AR
//! residuals. With [`Constraints::Enforced`] a fit is rejected when the
//! series is degenerate, the AR part is at or near a unit root, or the MA
//! part is not invertible. [`Constraints::Relaxed`] skips those checks and
//! falls back to zero coefficients when the autocovariance is degenerate.

use crate::error::FitError;

/// Distance from the stationarity/invertibility boundary treated as a unit root.
const UNIT_ROOT_MARGIN: f64 = 0.02;
const VARIANCE_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl Order {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    fn min_observations(&self) -> usize {
        self.p + self.d + self.q
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraints {
    Enforced,
    Relaxed,
}

/// A fitted ARIMA model, ready to forecast.
#[derive(Debug, Clone)]
pub struct Arima {
    order: Order,
    ar_coeffs: Vec<f64>,
    ma_coeffs: Vec<f64>,
    constant: f64,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
    /// Last observation on the original scale, for undifferencing.
    last_level: f64,
}

impl Arima {
    pub fn fit(data: &[f64], order: Order, constraints: Constraints) -> Result<Self, FitError> {
        if order.d > 1 {
            return Err(FitError::UnsupportedOrder(order.d));
        }

        let required = order.min_observations().max(order.d + 1);
        if data.len() < required {
            return Err(FitError::InsufficientData {
                required,
                actual: data.len(),
            });
        }

        if data.iter().any(|x| !x.is_finite()) {
            return Err(FitError::NonFinite);
        }

        let differenced = difference(data, order.d);
        let n = differenced.len();
        let constant = differenced.iter().sum::<f64>() / n as f64;

        let autocov = autocovariance(&differenced, constant, order.p);
        let ar_coeffs = if order.p == 0 {
            Vec::new()
        } else if autocov[0] <= VARIANCE_EPSILON {
            match constraints {
                Constraints::Enforced => return Err(FitError::Degenerate),
                Constraints::Relaxed => vec![0.0; order.p],
            }
        } else {
            levinson_durbin(&autocov, order.p)
        };

        if ar_coeffs.iter().any(|c| !c.is_finite()) {
            return Err(FitError::NonFinite);
        }
        if constraints == Constraints::Enforced && !is_stationary(&ar_coeffs) {
            return Err(FitError::NonStationary {
                coefficients: ar_coeffs,
            });
        }

        let mut residuals = vec![0.0; n];
        for i in order.p..n {
            let mut prediction = constant;
            for (j, coeff) in ar_coeffs.iter().enumerate() {
                prediction += coeff * (differenced[i - j - 1] - constant);
            }
            residuals[i] = differenced[i] - prediction;
        }

        let ma_coeffs = estimate_ma_coefficients(&residuals[order.p..], order.q);
        if constraints == Constraints::Enforced {
            if let Some(&theta) = ma_coeffs
                .iter()
                .find(|t| t.abs() >= 1.0 - UNIT_ROOT_MARGIN)
            {
                return Err(FitError::NonInvertible { theta });
            }
        }

        Ok(Self {
            order,
            ar_coeffs,
            ma_coeffs,
            constant,
            differenced,
            residuals,
            last_level: data[data.len() - 1],
        })
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coeffs
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coeffs
    }

    /// Point forecasts for the next `steps` observations on the original scale.
    pub fn predict(&self, steps: usize) -> Result<Vec<f64>, FitError> {
        if steps == 0 {
            return Ok(Vec::new());
        }

        let n = self.differenced.len();
        let mut extended = self.differenced.clone();
        let mut extended_residuals = self.residuals.clone();

        for _ in 0..steps {
            let mut forecast = self.constant;

            for (j, coeff) in self.ar_coeffs.iter().enumerate() {
                let idx = extended.len() - j - 1;
                forecast += coeff * (extended[idx] - self.constant);
            }

            for (j, coeff) in self.ma_coeffs.iter().enumerate() {
                if extended_residuals.len() > j {
                    let idx = extended_residuals.len() - j - 1;
                    forecast += coeff * extended_residuals[idx];
                }
            }

            extended.push(forecast);
            // future shocks have zero expectation
            extended_residuals.push(0.0);
        }

        let mut forecasts = extended.split_off(n);
        if self.order.d == 1 {
            let mut level = self.last_level;
            for f in &mut forecasts {
                level += *f;
                *f = level;
            }
        }

        if forecasts.iter().any(|f| !f.is_finite()) {
            return Err(FitError::NonFinite);
        }
        Ok(forecasts)
    }
}

fn difference(data: &[f64], order: usize) -> Vec<f64> {
    let mut result = data.to_vec();
    for _ in 0..order {
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Biased sample autocovariance for lags `0..=max_lag`.
fn autocovariance(data: &[f64], mean: f64, max_lag: usize) -> Vec<f64> {
    let n = data.len();
    (0..=max_lag)
        .map(|k| {
            if k >= n {
                return 0.0;
            }
            (k..n)
                .map(|i| (data[i] - mean) * (data[i - k] - mean))
                .sum::<f64>()
                / n as f64
        })
        .collect()
}

/// Solves the Yule-Walker equations for `p` AR coefficients.
fn levinson_durbin(autocov: &[f64], p: usize) -> Vec<f64> {
    let mut coeffs = vec![0.0; p];
    coeffs[0] = autocov[1] / autocov[0];
    let mut error = autocov[0] * (1.0 - coeffs[0] * coeffs[0]);

    for k in 1..p {
        if error.abs() <= VARIANCE_EPSILON {
            break;
        }

        let mut acc = autocov[k + 1];
        for j in 0..k {
            acc -= coeffs[j] * autocov[k - j];
        }
        let reflection = acc / error;

        let previous = coeffs.clone();
        coeffs[k] = reflection;
        for j in 0..k {
            coeffs[j] = previous[j] - reflection * previous[k - 1 - j];
        }
        error *= 1.0 - reflection * reflection;
    }

    coeffs
}

/// Checks the AR polynomial stays clear of the unit circle.
///
/// Exact for orders 1 and 2; higher orders use the sufficient condition
/// `sum |phi| < 1`.
pub fn is_stationary(coeffs: &[f64]) -> bool {
    let bound = 1.0 - UNIT_ROOT_MARGIN;
    match coeffs {
        [] => true,
        [phi] => phi.abs() < bound,
        [phi1, phi2] => phi2.abs() < bound && phi1 + phi2 < bound && phi2 - phi1 < bound,
        _ => coeffs.iter().map(|c| c.abs()).sum::<f64>() < bound,
    }
}

fn estimate_ma_coefficients(residuals: &[f64], q: usize) -> Vec<f64> {
    let n = residuals.len();
    if q == 0 || n == 0 {
        return vec![0.0; q];
    }

    let mean = residuals.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = residuals.iter().map(|x| x - mean).collect();
    let var = centered.iter().map(|x| x * x).sum::<f64>() / n as f64;

    let mut coeffs = vec![0.0; q];
    if var > VARIANCE_EPSILON {
        for (k, coeff) in coeffs.iter_mut().enumerate() {
            let lag = k + 1;
            let sum: f64 = (lag..n).map(|i| centered[i] * centered[i - lag]).sum();
            *coeff = (sum / n as f64) / var;
        }
    }
    coeffs
}
