//! Simple linear regression by closed-form ordinary least squares.
//!
//! For paired samples `(x, y)`:
//!
//! ```text
//! slope     = Sxy / Sxx
//! intercept = ȳ − slope · x̄
//! R²        = 1 − SS_res / SS_tot
//! σ²        = SS_res / (n − 2)
//! SE(slope) = √(σ² / Sxx)
//! F         = SS_reg / σ²           on (1, n − 2) df
//! ```
//!
//! A constant predictor (`Sxx = 0`) leaves the slope and everything derived
//! from it `None`. A constant outcome leaves R² `None`.

use serde::Serialize;

use crate::binning;
use crate::dataset::Dataset;
use crate::error::{InferenceError, InferenceResult};
use crate::interpretation::{self, EffectMagnitude};
use crate::special;
use crate::stats::{self, finite, safe_div};
use crate::testing::TestConfig;

/// Minimum number of complete `(x, y)` pairs.
pub const MIN_PAIRS: usize = 3;

/// A fitted coefficient with its inference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoefficientEstimate {
    pub estimate: f64,
    pub std_error: f64,
    /// `None` when the standard error is zero.
    pub t_statistic: Option<f64>,
    /// Two-tailed p-value on `n − 2` df.
    pub p_value: Option<f64>,
    pub ci_lower: Option<f64>,
    pub ci_upper: Option<f64>,
}

impl CoefficientEstimate {
    /// `is_zero` marks an estimate that is rounding noise around 0; with a
    /// zero standard error its p-value is then not computable.
    fn new(estimate: f64, std_error: f64, is_zero: bool, df: f64, t_crit: f64) -> Self {
        let t_statistic = safe_div(estimate, std_error);
        let p_value = match t_statistic {
            Some(t) => finite(special::t_two_tailed_p(t, df)),
            None if !is_zero => Some(0.0),
            None => None,
        };
        let margin = finite(t_crit * std_error);
        Self {
            estimate,
            std_error,
            t_statistic,
            p_value,
            ci_lower: margin.map(|m| estimate - m),
            ci_upper: margin.map(|m| estimate + m),
        }
    }
}

/// Result of a simple linear regression of `outcome` on `predictor`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionResult {
    pub outcome: String,
    pub predictor: String,
    /// Complete pairs used in the fit.
    pub n: usize,
    /// `None` when the predictor is constant.
    pub slope: Option<CoefficientEstimate>,
    pub intercept: Option<CoefficientEstimate>,
    pub r_squared: Option<f64>,
    /// `1 − (1 − R²)(n − 1)/(n − 2)`.
    pub adjusted_r_squared: Option<f64>,
    /// `SS_res / (n − 2)`.
    pub residual_variance: Option<f64>,
    pub pearson_r: Option<f64>,
    pub f_statistic: Option<f64>,
    /// Upper-tail F(1, n − 2) probability; equals the slope p-value.
    pub f_p_value: Option<f64>,
    pub effect_size: Option<EffectMagnitude>,
    pub confidence_level: f64,
    /// Slope p-value below alpha.
    pub significant: bool,
    pub interpretation: String,
}

impl RegressionResult {
    /// Fitted value at `x`, when the slope is defined.
    pub fn predict(&self, x: f64) -> Option<f64> {
        let slope = self.slope.as_ref()?;
        let intercept = self.intercept.as_ref()?;
        finite(intercept.estimate + slope.estimate * x)
    }
}

/// Fits `y = intercept + slope · x`.
///
/// Pairs with a non-finite member are dropped. Errors with
/// [`InferenceError::DimensionMismatch`] for unequal lengths and
/// [`InferenceError::InsufficientData`] for fewer than 3 complete pairs.
///
/// ```
/// use u_inference::regression::linear_regression;
/// use u_inference::testing::TestConfig;
///
/// let x = [1.0, 2.0, 3.0, 4.0];
/// let y = [5.0, 7.0, 9.0, 11.0];
/// let r = linear_regression(&x, &y, &TestConfig::default()).unwrap();
/// assert!((r.slope.as_ref().unwrap().estimate - 2.0).abs() < 1e-12);
/// assert!((r.predict(10.0).unwrap() - 23.0).abs() < 1e-9);
/// ```
pub fn linear_regression(
    x: &[f64],
    y: &[f64],
    config: &TestConfig,
) -> InferenceResult<RegressionResult> {
    fit("y", "x", x, y, config)
}

/// Regresses `outcome_column` on `predictor_column`, using rows where both
/// are numeric.
pub fn regression_by_columns(
    dataset: &Dataset,
    outcome_column: &str,
    predictor_column: &str,
    config: &TestConfig,
) -> InferenceResult<RegressionResult> {
    let (x, y) = binning::paired_numeric(dataset, predictor_column, outcome_column)?;
    fit(outcome_column, predictor_column, &x, &y, config)
}

fn fit(
    outcome: &str,
    predictor: &str,
    x: &[f64],
    y: &[f64],
    config: &TestConfig,
) -> InferenceResult<RegressionResult> {
    if x.len() != y.len() {
        return Err(InferenceError::DimensionMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .unzip();
    let n = xs.len();
    if n < MIN_PAIRS {
        return Err(InferenceError::InsufficientData {
            test: "linear regression",
            min_required: MIN_PAIRS,
            actual: n,
        });
    }

    let x_mean = stats::mean(&xs).unwrap_or(0.0);
    let y_mean = stats::mean(&ys).unwrap_or(0.0);
    let sxx = stats::sum_squared_deviations(&xs, x_mean);
    let ss_tot = stats::sum_squared_deviations(&ys, y_mean);
    let cross: Vec<f64> = xs
        .iter()
        .zip(&ys)
        .map(|(a, b)| (a - x_mean) * (b - y_mean))
        .collect();
    let sxy = stats::kahan_sum(&cross);

    let df = (n - 2) as f64;
    let t_crit = special::t_critical(df, config.confidence_level);

    let Some(slope) = safe_div(sxy, sxx) else {
        log::debug!("regression({outcome} on {predictor}): constant predictor, slope not computable");
        return Ok(RegressionResult {
            outcome: outcome.to_string(),
            predictor: predictor.to_string(),
            n,
            slope: None,
            intercept: None,
            r_squared: None,
            adjusted_r_squared: None,
            residual_variance: None,
            pearson_r: None,
            f_statistic: None,
            f_p_value: None,
            effect_size: None,
            confidence_level: config.confidence_level,
            significant: false,
            interpretation: interpretation::regression_sentence(
                outcome,
                predictor,
                None,
                None,
                None,
                config.alpha,
            ),
        });
    };
    let intercept = y_mean - slope * x_mean;

    let residuals: Vec<f64> = xs
        .iter()
        .zip(&ys)
        .map(|(a, b)| (b - intercept - slope * a).powi(2))
        .collect();
    let ss_reg = slope * slope * sxx;
    let magnitude = stats::sum_of_squares(&ys);
    let raw_ss_res = stats::kahan_sum(&residuals);
    let ss_res = if stats::negligible_spread(raw_ss_res, ss_reg, magnitude) {
        log::debug!("regression({outcome} on {predictor}): exact fit, residuals are rounding noise");
        0.0
    } else {
        raw_ss_res
    };
    let residual_variance = ss_res / df;

    let r_squared = if stats::negligible_spread(ss_tot, 0.0, magnitude) {
        None
    } else {
        safe_div(ss_res, ss_tot).map(|ratio| (1.0 - ratio).clamp(0.0, 1.0))
    };
    let adjusted_r_squared =
        r_squared.map(|r2| 1.0 - (1.0 - r2) * (n - 1) as f64 / df);

    let slope_se = (residual_variance / sxx).sqrt();
    let intercept_se = (residual_variance * (1.0 / n as f64 + x_mean * x_mean / sxx)).sqrt();
    let slope_is_zero = stats::negligible_spread(ss_reg, 0.0, magnitude);
    let intercept_is_zero =
        stats::negligible_spread(n as f64 * intercept * intercept, 0.0, magnitude);
    let slope_est = CoefficientEstimate::new(slope, slope_se, slope_is_zero, df, t_crit);
    let intercept_est =
        CoefficientEstimate::new(intercept, intercept_se, intercept_is_zero, df, t_crit);

    let f_statistic = safe_div(ss_reg, residual_variance);
    let f_p_value = match f_statistic {
        Some(f) => finite(special::f_survival(f, 1.0, df)),
        None => slope_est.p_value,
    };
    if f_statistic.is_none() {
        log::debug!("regression({outcome} on {predictor}): zero residual variance");
    }

    let interpretation = interpretation::regression_sentence(
        outcome,
        predictor,
        Some(slope),
        slope_est.p_value,
        r_squared,
        config.alpha,
    );

    Ok(RegressionResult {
        outcome: outcome.to_string(),
        predictor: predictor.to_string(),
        n,
        significant: config.is_significant(slope_est.p_value),
        slope: Some(slope_est),
        intercept: Some(intercept_est),
        r_squared,
        adjusted_r_squared,
        residual_variance: finite(residual_variance),
        pearson_r: stats::pearson(&xs, &ys),
        f_statistic,
        f_p_value,
        effect_size: r_squared.map(interpretation::r_squared_band),
        confidence_level: config.confidence_level,
        interpretation,
    })
}
