//! Numeric building blocks shared by the descriptive and inferential modules.
//!
//! Every function takes finite data. Callers filter with
//! [`crate::binning::numeric_values`] or an equivalent before calling, so
//! the helpers here only guard against sample sizes and zero denominators.
//!
//! # Algorithms
//!
//! - **Mean**: Neumaier compensated summation.
//! - **Variance**: two-pass sum of squared deviations, `n − 1` denominator.
//! - **Quantile**: R-7 linear interpolation, `h = (n − 1)·p`.
//!   Reference: Hyndman & Fan (1996), *The American Statistician* 50(4).
//! - **Skewness / kurtosis**: adjusted Fisher–Pearson G1 and excess G2,
//!   the estimators reported by Excel, SAS and SPSS.

/// Neumaier compensated summation.
///
/// ```
/// use u_inference::stats::kahan_sum;
///
/// let v = [1e16, 1.0, -1e16];
/// assert_eq!(kahan_sum(&v), 1.0);
/// ```
pub fn kahan_sum(data: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    let mut c = 0.0_f64;
    for &x in data {
        let t = sum + x;
        if sum.abs() >= x.abs() {
            c += (sum - t) + x;
        } else {
            c += (x - t) + sum;
        }
        sum = t;
    }
    sum + c
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(kahan_sum(data) / data.len() as f64)
}

/// Sum of squared deviations from `center`.
pub fn sum_squared_deviations(data: &[f64], center: f64) -> f64 {
    data.iter().map(|&x| (x - center) * (x - center)).sum()
}

/// Sample variance (Bessel-corrected), `None` when `n < 2`.
///
/// ```
/// use u_inference::stats::variance;
///
/// let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
/// assert!((variance(&v).unwrap() - 4.571428571428571).abs() < 1e-12);
/// assert_eq!(variance(&[1.0]), None);
/// ```
pub fn variance(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let m = mean(data)?;
    Some(sum_squared_deviations(data, m) / (data.len() - 1) as f64)
}

/// Sample standard deviation, `None` when `n < 2`.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    variance(data).map(f64::sqrt)
}

/// Returns a copy of `data` sorted ascending (total order, NaN last).
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut v = data.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

/// R-7 quantile on pre-sorted data.
///
/// `None` if the slice is empty or `p ∉ [0, 1]`.
///
/// ```
/// use u_inference::stats::quantile_sorted;
///
/// let data = [1.0, 2.0, 3.0, 4.0, 100.0];
/// assert_eq!(quantile_sorted(&data, 0.25), Some(2.0));
/// assert_eq!(quantile_sorted(&data, 0.5), Some(3.0));
/// assert_eq!(quantile_sorted(&data, 1.0), Some(100.0));
/// ```
pub fn quantile_sorted(sorted_data: &[f64], p: f64) -> Option<f64> {
    let n = sorted_data.len();
    if n == 0 || !(0.0..=1.0).contains(&p) {
        return None;
    }
    if n == 1 {
        return Some(sorted_data[0]);
    }

    let h = (n - 1) as f64 * p;
    let j = h.floor() as usize;
    let g = h - h.floor();

    if j + 1 >= n {
        Some(sorted_data[n - 1])
    } else {
        Some((1.0 - g) * sorted_data[j] + g * sorted_data[j + 1])
    }
}

/// Standardized moment sum Σ((x − mean)/sd)^k, `None` when the sample
/// standard deviation is zero or undefined.
fn standardized_power_sum(data: &[f64], k: i32) -> Option<f64> {
    let m = mean(data)?;
    let sd = std_dev(data)?;
    if sd < 1e-300 {
        return None;
    }
    Some(data.iter().map(|&x| ((x - m) / sd).powi(k)).sum())
}

/// Adjusted sample skewness G1.
///
/// `None` when `n < 3` or all values are equal.
pub fn skewness(data: &[f64]) -> Option<f64> {
    let n = data.len();
    if n < 3 {
        return None;
    }
    let nf = n as f64;
    let s3 = standardized_power_sum(data, 3)?;
    finite(nf / ((nf - 1.0) * (nf - 2.0)) * s3)
}

/// Sample excess kurtosis G2 (0 for a normal distribution).
///
/// `None` when `n < 4` or all values are equal.
pub fn kurtosis(data: &[f64]) -> Option<f64> {
    let n = data.len();
    if n < 4 {
        return None;
    }
    let nf = n as f64;
    let s4 = standardized_power_sum(data, 4)?;
    let lead = nf * (nf + 1.0) / ((nf - 1.0) * (nf - 2.0) * (nf - 3.0));
    let tail = 3.0 * (nf - 1.0) * (nf - 1.0) / ((nf - 2.0) * (nf - 3.0));
    finite(lead * s4 - tail)
}

/// Sample Pearson correlation of paired slices, `None` when either side
/// has zero variance or the lengths differ.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let sxy: f64 = x.iter().zip(y).map(|(&a, &b)| (a - mx) * (b - my)).sum();
    let sxx = sum_squared_deviations(x, mx);
    let syy = sum_squared_deviations(y, my);
    let denom = (sxx * syy).sqrt();
    if denom < 1e-300 {
        return None;
    }
    finite((sxy / denom).clamp(-1.0, 1.0))
}

/// Maps non-finite values to `None`.
///
/// This is the single point where floating-point `NaN`/`∞` become the
/// explicit "not computable" marker carried by result structs.
#[inline]
pub fn finite(x: f64) -> Option<f64> {
    if x.is_finite() {
        Some(x)
    } else {
        None
    }
}

/// Ratio guarded against a (near-)zero denominator.
#[inline]
pub fn safe_div(num: f64, denom: f64) -> Option<f64> {
    if denom.abs() < 1e-300 {
        None
    } else {
        finite(num / denom)
    }
}

/// Whether a residual sum of squares is rounding noise.
///
/// `spread` is the residual (within-group) sum of squares, `signal` the
/// explained sum of squares it is compared against, and `magnitude` the
/// raw sum of squares Σx² of the data. The spread counts as zero when it
/// underflows, is below `1e-12` of the total, or sits at the rounding
/// floor of the data itself (`1e-24 · Σx²`, i.e. a relative SD near 1e-12).
///
/// ```
/// use u_inference::stats::negligible_spread;
///
/// // [0.1; 3] vs [0.2; 3] leaves ~1e-34 of within-group noise
/// assert!(negligible_spread(3e-34, 0.015, 0.15));
/// assert!(!negligible_spread(2.5, 62.5, 385.0));
/// ```
pub fn negligible_spread(spread: f64, signal: f64, magnitude: f64) -> bool {
    spread < 1e-300 || spread <= 1e-12 * (spread + signal) || spread <= 1e-24 * magnitude
}

/// Raw sum of squares Σx².
pub fn sum_of_squares(data: &[f64]) -> f64 {
    data.iter().map(|&x| x * x).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn negligible_spread_rules() {
        assert!(negligible_spread(0.0, 0.0, 0.0));
        // noise around a zero difference is caught by the magnitude floor
        assert!(negligible_spread(1e-34, 0.0, 0.03));
        assert!(!negligible_spread(1e-3, 0.0, 0.03));
        assert!(negligible_spread(1e-10, 1e3, 1e4));
        assert!(!negligible_spread(1e-6, 1e3, 1e4));
    }

    #[test]
    fn kahan_sum_recovers_cancelled_bits() {
        let v = vec![0.1; 10];
        assert_abs_diff_eq!(kahan_sum(&v), 1.0, epsilon = 1e-15);
        assert_eq!(kahan_sum(&[]), 0.0);
    }

    #[test]
    fn mean_and_variance() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[42.0]), Some(42.0));
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), Some(3.0));
        assert_abs_diff_eq!(variance(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(std_dev(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(), 2.5f64.sqrt(), epsilon = 1e-12);
        assert_eq!(variance(&[7.0]), None);
    }

    #[test]
    fn variance_is_shift_invariant() {
        let base = [1.0, 2.0, 3.0, 4.0];
        let shifted: Vec<f64> = base.iter().map(|x| x + 1e9).collect();
        assert_abs_diff_eq!(
            variance(&base).unwrap(),
            variance(&shifted).unwrap(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn quantile_r7() {
        let data = sorted(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(quantile_sorted(&data, 0.0), Some(1.0));
        assert_abs_diff_eq!(quantile_sorted(&data, 0.25).unwrap(), 1.75, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile_sorted(&data, 0.5).unwrap(), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile_sorted(&data, 0.75).unwrap(), 3.25, epsilon = 1e-12);
        assert_eq!(quantile_sorted(&data, 1.0), Some(4.0));
        assert_eq!(quantile_sorted(&data, 1.5), None);
        assert_eq!(quantile_sorted(&[], 0.5), None);
        assert_eq!(quantile_sorted(&[9.0], 0.3), Some(9.0));
    }

    #[test]
    fn skewness_signs() {
        assert_abs_diff_eq!(skewness(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(), 0.0, epsilon = 1e-12);
        assert!(skewness(&[1.0, 1.0, 1.0, 2.0, 10.0]).unwrap() > 0.0);
        assert!(skewness(&[-10.0, 1.0, 2.0, 2.0, 2.0]).unwrap() < 0.0);
    }

    #[test]
    fn skewness_reference_value() {
        // Excel SKEW({1,2,3,4,10}) = 1.69706 (= 1.2·√2)
        let g1 = skewness(&[1.0, 2.0, 3.0, 4.0, 10.0]).unwrap();
        assert_abs_diff_eq!(g1, 1.697_056_274_847_714, epsilon = 1e-9);
    }

    #[test]
    fn kurtosis_reference_values() {
        // Excel KURT({1,2,3,4,5}) = -1.2
        assert_abs_diff_eq!(kurtosis(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(), -1.2, epsilon = 1e-12);
        // Excel KURT({1,2,3,4,10}) = 3.152
        let g2 = kurtosis(&[1.0, 2.0, 3.0, 4.0, 10.0]).unwrap();
        assert_abs_diff_eq!(g2, 3.152, epsilon = 1e-9);
    }

    #[test]
    fn moments_require_sample_size_and_spread() {
        assert_eq!(skewness(&[1.0, 2.0]), None);
        assert_eq!(kurtosis(&[1.0, 2.0, 3.0]), None);
        assert_eq!(skewness(&[5.0; 10]), None);
        assert_eq!(kurtosis(&[5.0; 10]), None);
    }

    #[test]
    fn pearson_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pearson(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap(), -1.0, epsilon = 1e-12);
        assert_eq!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]), None);
        assert_eq!(pearson(&x, &[1.0, 2.0]), None);
    }

    #[test]
    fn finite_and_safe_div() {
        assert_eq!(finite(1.5), Some(1.5));
        assert_eq!(finite(f64::NAN), None);
        assert_eq!(finite(f64::INFINITY), None);
        assert_eq!(safe_div(1.0, 0.0), None);
        assert_eq!(safe_div(1.0, 4.0), Some(0.25));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn quartiles_are_ordered(data in proptest::collection::vec(-1e6_f64..1e6, 4..100)) {
            let s = sorted(&data);
            let q1 = quantile_sorted(&s, 0.25).unwrap();
            let med = quantile_sorted(&s, 0.5).unwrap();
            let q3 = quantile_sorted(&s, 0.75).unwrap();
            prop_assert!(q1 <= med && med <= q3, "q1={}, median={}, q3={}", q1, med, q3);
        }

        #[test]
        fn mean_within_range(data in proptest::collection::vec(-1e6_f64..1e6, 1..100)) {
            let m = mean(&data).unwrap();
            let lo = data.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(m >= lo - 1e-6 && m <= hi + 1e-6);
        }

        #[test]
        fn variance_non_negative(data in proptest::collection::vec(-1e6_f64..1e6, 2..100)) {
            prop_assert!(variance(&data).unwrap() >= 0.0);
        }
    }
}
