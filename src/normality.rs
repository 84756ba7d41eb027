//! Jarque–Bera normality test.
//!
//! `JB = n/6 · (S² + G2²/4)`, where `S` is the sample skewness and `G2` the
//! sample excess kurtosis (`K − 3`). Under normality JB is asymptotically
//! χ²(2), so the p-value is the chi-square survival function with two
//! degrees of freedom.
//!
//! The test is only reported for `n ≥ 8` with finite moments; anything
//! else is "not computable" and yields `None`.
//!
//! ```
//! use u_inference::normality::jarque_bera_from_moments;
//!
//! let r = jarque_bera_from_moments(100, 0.5, 1.0).unwrap();
//! assert!((r.statistic - 100.0 / 6.0 * 0.5).abs() < 1e-12);
//! assert!(!r.is_normal);
//! assert!(jarque_bera_from_moments(7, 0.0, 0.0).is_none());
//! ```

use serde::Serialize;

use crate::special::{chi_square_survival, clamp_probability};
use crate::stats;

/// Smallest sample the test is reported for.
pub const MIN_SAMPLE_SIZE: usize = 8;

/// Significance level for the `is_normal` flag (`p > 0.05`).
pub const NORMALITY_ALPHA: f64 = 0.05;

/// Outcome of a normality test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalityTestResult {
    /// Test name ("Jarque-Bera").
    pub test_name: String,
    /// Sample size the test was computed on.
    pub n: usize,
    /// JB statistic.
    pub statistic: f64,
    /// Upper-tail χ²(2) probability of the statistic.
    pub p_value: f64,
    /// `p_value > 0.05`.
    pub is_normal: bool,
}

/// Jarque–Bera test from precomputed moments.
///
/// `excess_kurtosis` is `G2 = K − 3`. Returns `None` when `n < 8` or either
/// moment is non-finite.
pub fn jarque_bera_from_moments(
    n: usize,
    skewness: f64,
    excess_kurtosis: f64,
) -> Option<NormalityTestResult> {
    if n < MIN_SAMPLE_SIZE || !skewness.is_finite() || !excess_kurtosis.is_finite() {
        return None;
    }
    let nf = n as f64;
    let statistic = nf / 6.0 * (skewness * skewness + excess_kurtosis * excess_kurtosis / 4.0);
    let p_value = stats::finite(clamp_probability(chi_square_survival(statistic, 2.0)))?;
    Some(NormalityTestResult {
        test_name: "Jarque-Bera".into(),
        n,
        statistic,
        p_value,
        is_normal: p_value > NORMALITY_ALPHA,
    })
}

/// Jarque–Bera test on raw finite data.
///
/// `None` when fewer than 8 values are given or all values are equal.
pub fn jarque_bera(data: &[f64]) -> Option<NormalityTestResult> {
    if data.len() < MIN_SAMPLE_SIZE {
        return None;
    }
    let s = stats::skewness(data)?;
    let k = stats::kurtosis(data)?;
    jarque_bera_from_moments(data.len(), s, k)
}
