//! Classical hypothesis tests: two-sample t-test, chi-square test of
//! independence and one-way ANOVA with Bonferroni post-hoc comparisons.
//!
//! Precondition failures (too few observations or groups) are returned as
//! [`InferenceError`] before any arithmetic. Degenerate arithmetic (zero
//! variance, empty expected cells) never errors; the affected fields are
//! `None` and the rest of the result stays populated.
//!
//! Every p-value goes through [`crate::special`]:
//!
//! - t-test: `I_{df/(df+t²)}(df/2, ½)` (two-tailed).
//! - chi-square: `Q(df/2, χ²/2)`.
//! - ANOVA: `I_{d2/(d2+d1·F)}(d2/2, d1/2)`.
//!
//! # Example
//!
//! ```
//! use u_inference::testing::{independent_t_test, TestConfig};
//!
//! let a = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let b = [6.0, 7.0, 8.0, 9.0, 10.0];
//! let r = independent_t_test(&a, &b, &TestConfig::default()).unwrap();
//! assert!((r.t_statistic.unwrap() + 5.0).abs() < 1e-12);
//! assert_eq!(r.df, 8);
//! assert!(r.p_value.unwrap() < 0.0011);
//! assert!(r.significant);
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::binning::{self, ContingencyTable};
use crate::dataset::Dataset;
use crate::error::{InferenceError, InferenceResult};
use crate::interpretation::{self, AssociationStrength, EffectMagnitude};
use crate::special;
use crate::stats::{self, finite, safe_div};

/// Expected cell count below which the chi-square approximation is weak.
pub const LOW_EXPECTED_COUNT: f64 = 5.0;

// ── Configuration ─────────────────────────────────────────────────────

/// Configuration shared by the hypothesis tests.
#[derive(Debug, Clone, PartialEq)]
pub struct TestConfig {
    /// Significance threshold. Default: 0.05.
    pub alpha: f64,
    /// Confidence level for intervals. Default: 0.95.
    pub confidence_level: f64,
    /// Compute Bonferroni pairwise comparisons after ANOVA. Default: true.
    pub post_hoc: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            confidence_level: 0.95,
            post_hoc: true,
        }
    }
}

impl TestConfig {
    /// Sets the significance threshold.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the confidence level for intervals.
    pub fn confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Enables or disables post-hoc comparisons.
    pub fn post_hoc(mut self, enabled: bool) -> Self {
        self.post_hoc = enabled;
        self
    }

    pub(crate) fn is_significant(&self, p: Option<f64>) -> bool {
        p.is_some_and(|p| p < self.alpha)
    }
}

/// Per-group sample summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub label: String,
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation, `None` for a single observation.
    pub std_dev: Option<f64>,
}

impl GroupSummary {
    fn new(label: &str, data: &[f64]) -> Self {
        Self {
            label: label.to_string(),
            n: data.len(),
            mean: stats::mean(data).unwrap_or(f64::NAN),
            std_dev: stats::std_dev(data),
        }
    }
}

fn finite_sample(data: &[f64]) -> Vec<f64> {
    data.iter().copied().filter(|v| v.is_finite()).collect()
}

// ── Independent two-sample t-test ─────────────────────────────────────

/// Result of a pooled-variance two-sample t-test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TTestResult {
    pub group1: GroupSummary,
    pub group2: GroupSummary,
    /// `mean1 − mean2`.
    pub mean_difference: f64,
    /// Pooled standard deviation; 0 when the spread is rounding noise.
    pub pooled_std_dev: f64,
    /// Standard error of the mean difference.
    pub standard_error: f64,
    /// `None` when both groups have zero variance.
    pub t_statistic: Option<f64>,
    /// `n1 + n2 − 2`.
    pub df: usize,
    /// Two-tailed p-value.
    pub p_value: Option<f64>,
    /// Confidence level of the interval.
    pub confidence_level: f64,
    pub ci_lower: Option<f64>,
    pub ci_upper: Option<f64>,
    /// `(mean1 − mean2) / pooled SD`.
    pub cohens_d: Option<f64>,
    pub effect_size: Option<EffectMagnitude>,
    pub significant: bool,
    pub interpretation: String,
}

/// Independent two-sample t-test with pooled variance.
///
/// Non-finite values are ignored. Errors with
/// [`InferenceError::InsufficientData`] if either sample has fewer than 2
/// observations.
pub fn independent_t_test(
    sample1: &[f64],
    sample2: &[f64],
    config: &TestConfig,
) -> InferenceResult<TTestResult> {
    t_test_labeled("group 1", sample1, "group 2", sample2, config)
}

/// t-test comparing `value_column` between the two groups of
/// `group_column`.
///
/// Groups are ordered by label; the mean difference is first minus second.
/// Errors with [`InferenceError::GroupCount`] unless there are exactly two
/// non-empty groups.
pub fn t_test_by_group(
    dataset: &Dataset,
    value_column: &str,
    group_column: &str,
    config: &TestConfig,
) -> InferenceResult<TTestResult> {
    let groups = binning::group_numeric_by(dataset, value_column, group_column)?;
    let mut iter = groups.iter();
    match (iter.next(), iter.next(), iter.next()) {
        (Some((l1, s1)), Some((l2, s2)), None) => t_test_labeled(l1, s1, l2, s2, config),
        _ => Err(InferenceError::GroupCount {
            test: "independent t-test",
            expected: "exactly 2",
            actual: groups.len(),
        }),
    }
}

fn t_test_labeled(
    label1: &str,
    sample1: &[f64],
    label2: &str,
    sample2: &[f64],
    config: &TestConfig,
) -> InferenceResult<TTestResult> {
    let a = finite_sample(sample1);
    let b = finite_sample(sample2);
    let (n1, n2) = (a.len(), b.len());
    if n1 < 2 || n2 < 2 {
        return Err(InferenceError::InsufficientData {
            test: "independent t-test (per group)",
            min_required: 2,
            actual: n1.min(n2),
        });
    }

    let mean1 = stats::mean(&a).unwrap_or(0.0);
    let mean2 = stats::mean(&b).unwrap_or(0.0);
    let var1 = stats::variance(&a).unwrap_or(0.0);
    let var2 = stats::variance(&b).unwrap_or(0.0);

    let df = n1 + n2 - 2;
    let diff = mean1 - mean2;
    let ss_within = (n1 - 1) as f64 * var1 + (n2 - 1) as f64 * var2;
    let ss_between = (n1 * n2) as f64 / (n1 + n2) as f64 * diff * diff;
    let magnitude = stats::sum_of_squares(&a) + stats::sum_of_squares(&b);
    let pooled_var = if stats::negligible_spread(ss_within, ss_between, magnitude) {
        0.0
    } else {
        ss_within / df as f64
    };
    let pooled_sd = pooled_var.sqrt();
    let se = pooled_sd * (1.0 / n1 as f64 + 1.0 / n2 as f64).sqrt();

    let t_statistic = safe_div(diff, se);
    let p_value = match t_statistic {
        Some(t) => finite(special::t_two_tailed_p(t, df as f64)),
        None if !stats::negligible_spread(ss_between, 0.0, magnitude) => {
            log::debug!("t-test: zero pooled variance with distinct means, p = 0");
            Some(0.0)
        }
        None => {
            log::debug!("t-test: zero pooled variance and equal means, p not computable");
            None
        }
    };

    let t_crit = special::t_critical(df as f64, config.confidence_level);
    let margin = finite(t_crit * se);
    let cohens_d = safe_div(diff, pooled_sd);

    let group1 = GroupSummary::new(label1, &a);
    let group2 = GroupSummary::new(label2, &b);
    let interpretation =
        interpretation::t_test_sentence(label1, label2, p_value, cohens_d, config.alpha);

    Ok(TTestResult {
        group1,
        group2,
        mean_difference: diff,
        pooled_std_dev: pooled_sd,
        standard_error: se,
        t_statistic,
        df,
        p_value,
        confidence_level: config.confidence_level,
        ci_lower: margin.map(|m| diff - m),
        ci_upper: margin.map(|m| diff + m),
        cohens_d,
        effect_size: cohens_d.map(interpretation::cohens_d_band),
        significant: config.is_significant(p_value),
        interpretation,
    })
}

// ── Chi-square test of independence ───────────────────────────────────

/// Odds ratio of a 2×2 table with a log-scale confidence interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddsRatio {
    /// `(a·d)/(b·c)`.
    pub estimate: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    /// 0.5 was added to every cell because one was zero.
    pub haldane_corrected: bool,
}

/// Result of a chi-square test of independence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquareResult {
    pub row_variable: String,
    pub column_variable: String,
    /// Observed counts.
    pub table: ContingencyTable,
    /// Expected counts under independence.
    pub expected: Vec<Vec<f64>>,
    /// Pearson χ² statistic (cells with zero expected count contribute 0).
    pub statistic: f64,
    /// `(r − 1)(c − 1)` over non-empty rows and columns.
    pub df: usize,
    pub p_value: Option<f64>,
    pub cramers_v: Option<f64>,
    pub association: Option<AssociationStrength>,
    /// Cells with expected count below 5.
    pub low_expected_cells: usize,
    /// Only for 2×2 tables.
    pub odds_ratio: Option<OddsRatio>,
    pub significant: bool,
    pub interpretation: String,
}

/// Chi-square test of independence between two columns of `dataset`.
///
/// Missing values form their own `"Missing"` category.
pub fn chi_square_independence(
    dataset: &Dataset,
    row_column: &str,
    column_column: &str,
    config: &TestConfig,
) -> InferenceResult<ChiSquareResult> {
    let table = binning::contingency_table(dataset, row_column, column_column)?;
    chi_square_named(row_column, column_column, table, config)
}

/// Chi-square test of independence on a prepared contingency table.
///
/// ```
/// use u_inference::binning::ContingencyTable;
/// use u_inference::testing::{chi_square_from_table, TestConfig};
///
/// let table = ContingencyTable::from_matrix(vec![vec![10, 0], vec![0, 10]]).unwrap();
/// let r = chi_square_from_table(table, &TestConfig::default()).unwrap();
/// assert!((r.statistic - 20.0).abs() < 1e-12);
/// assert!((r.cramers_v.unwrap() - 1.0).abs() < 1e-12);
/// ```
pub fn chi_square_from_table(
    table: ContingencyTable,
    config: &TestConfig,
) -> InferenceResult<ChiSquareResult> {
    chi_square_named("the row variable", "the column variable", table, config)
}

fn chi_square_named(
    row_variable: &str,
    column_variable: &str,
    table: ContingencyTable,
    config: &TestConfig,
) -> InferenceResult<ChiSquareResult> {
    let row_totals = table.row_totals();
    let col_totals = table.column_totals();
    let grand = table.total();

    let live_rows = row_totals.iter().filter(|&&t| t > 0).count();
    let live_cols = col_totals.iter().filter(|&&t| t > 0).count();
    if live_rows < 2 || live_cols < 2 {
        return Err(InferenceError::GroupCount {
            test: "chi-square test",
            expected: "at least 2 row and 2 column",
            actual: live_rows.min(live_cols),
        });
    }

    let n = grand as f64;
    let expected: Vec<Vec<f64>> = row_totals
        .iter()
        .map(|&rt| {
            col_totals
                .iter()
                .map(|&ct| rt as f64 * ct as f64 / n)
                .collect()
        })
        .collect();

    let mut statistic = 0.0;
    let mut low_expected_cells = 0usize;
    for (obs_row, exp_row) in table.counts.iter().zip(&expected) {
        for (&o, &e) in obs_row.iter().zip(exp_row) {
            if e <= 0.0 {
                continue;
            }
            if e < LOW_EXPECTED_COUNT {
                low_expected_cells += 1;
            }
            let d = o as f64 - e;
            statistic += d * d / e;
        }
    }
    if low_expected_cells > 0 {
        log::debug!("chi-square: {low_expected_cells} cells with expected count < {LOW_EXPECTED_COUNT}");
    }

    let df = (live_rows - 1) * (live_cols - 1);
    let p_value = finite(special::chi_square_survival(statistic, df as f64));
    let min_dim = (live_rows - 1).min(live_cols - 1) as f64;
    let cramers_v = safe_div(statistic, n * min_dim).map(|v| v.sqrt().clamp(0.0, 1.0));

    let odds_ratio = if table.n_rows() == 2 && table.n_cols() == 2 {
        odds_ratio(&table.counts, config.confidence_level)
    } else {
        None
    };

    let interpretation = interpretation::chi_square_sentence(
        row_variable,
        column_variable,
        p_value,
        cramers_v,
        config.alpha,
    );

    Ok(ChiSquareResult {
        row_variable: row_variable.to_string(),
        column_variable: column_variable.to_string(),
        table,
        expected,
        statistic,
        df,
        p_value,
        cramers_v,
        association: cramers_v.map(interpretation::cramers_v_band),
        low_expected_cells,
        odds_ratio,
        significant: config.is_significant(p_value),
        interpretation,
    })
}

/// Odds ratio with Woolf's log-scale interval; Haldane–Anscombe +0.5 when a
/// cell is zero.
fn odds_ratio(counts: &[Vec<u64>], confidence_level: f64) -> Option<OddsRatio> {
    let cells = [counts[0][0], counts[0][1], counts[1][0], counts[1][1]];
    let haldane_corrected = cells.contains(&0);
    let shift = if haldane_corrected { 0.5 } else { 0.0 };
    if haldane_corrected {
        log::debug!("odds ratio: zero cell, applying Haldane-Anscombe correction");
    }
    let [a, b, c, d] = cells.map(|v| v as f64 + shift);

    let estimate = finite(a * d / (b * c))?;
    let se = (1.0 / a + 1.0 / b + 1.0 / c + 1.0 / d).sqrt();
    let z = special::inverse_normal_cdf(1.0 - (1.0 - confidence_level) / 2.0);
    let ln_or = estimate.ln();
    Some(OddsRatio {
        estimate,
        ci_lower: finite((ln_or - z * se).exp())?,
        ci_upper: finite((ln_or + z * se).exp())?,
        haldane_corrected,
    })
}

// ── One-way ANOVA ─────────────────────────────────────────────────────

/// Bonferroni-corrected comparison of two group means.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseComparison {
    pub group1: String,
    pub group2: String,
    /// `mean1 − mean2`.
    pub mean_difference: f64,
    /// `√(MS_within · (1/n1 + 1/n2))`.
    pub standard_error: f64,
    /// Bonferroni-adjusted interval.
    pub ci_lower: Option<f64>,
    pub ci_upper: Option<f64>,
    /// Unadjusted two-tailed p-value on `df_within`.
    pub p_value: Option<f64>,
    /// `min(1, p · number of pairs)`.
    pub adjusted_p_value: Option<f64>,
    pub significant: bool,
}

/// Result of a one-way ANOVA.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaResult {
    /// Non-empty groups in label order.
    pub groups: Vec<GroupSummary>,
    pub grand_mean: f64,
    pub ss_between: f64,
    pub ss_within: f64,
    /// Σ (x − grand mean)² over all observations.
    pub ss_total: f64,
    pub df_between: usize,
    pub df_within: usize,
    pub ms_between: f64,
    /// 0 when the within-group spread is rounding noise.
    pub ms_within: f64,
    /// `None` when the within-group variance is zero.
    pub f_statistic: Option<f64>,
    pub p_value: Option<f64>,
    /// `SSB / (SSB + SSW)`.
    pub eta_squared: Option<f64>,
    pub effect_size: Option<EffectMagnitude>,
    /// Every group is constant and at least two group means differ.
    pub perfect_separation: bool,
    /// Empty unless post-hoc comparisons were requested.
    pub post_hoc: Vec<PairwiseComparison>,
    pub significant: bool,
    pub interpretation: String,
}

/// One-way ANOVA over labelled samples.
///
/// Non-finite values are ignored and empty groups dropped. Errors with
/// [`InferenceError::GroupCount`] for fewer than two non-empty groups and
/// [`InferenceError::InsufficientData`] when no within-group degrees of
/// freedom remain.
///
/// When every group has zero variance but the means differ, F is not
/// computable; the result reports `perfect_separation`, `p_value = 0` and
/// `eta_squared = 1` instead.
///
/// ```
/// use std::collections::BTreeMap;
/// use u_inference::testing::{one_way_anova, TestConfig};
///
/// let mut groups = BTreeMap::new();
/// groups.insert("a".to_string(), vec![5.0, 6.0, 7.0, 5.5, 6.5]);
/// groups.insert("b".to_string(), vec![8.0, 9.0, 8.5, 9.5, 8.0]);
/// groups.insert("c".to_string(), vec![4.0, 3.0, 3.5, 4.5, 4.0]);
/// let r = one_way_anova(&groups, &TestConfig::default()).unwrap();
/// assert!(r.p_value.unwrap() < 0.01);
/// assert_eq!(r.post_hoc.len(), 3);
/// ```
pub fn one_way_anova(
    groups: &BTreeMap<String, Vec<f64>>,
    config: &TestConfig,
) -> InferenceResult<AnovaResult> {
    anova_named("the outcome", None, groups, config)
}

/// One-way ANOVA of `value_column` across the groups of `group_column`.
pub fn anova_by_group(
    dataset: &Dataset,
    value_column: &str,
    group_column: &str,
    config: &TestConfig,
) -> InferenceResult<AnovaResult> {
    let groups = binning::group_numeric_by(dataset, value_column, group_column)?;
    anova_named(value_column, Some(group_column), &groups, config)
}

fn anova_named(
    outcome: &str,
    group_variable: Option<&str>,
    groups: &BTreeMap<String, Vec<f64>>,
    config: &TestConfig,
) -> InferenceResult<AnovaResult> {
    let samples: Vec<(&str, Vec<f64>)> = groups
        .iter()
        .map(|(label, data)| (label.as_str(), finite_sample(data)))
        .filter(|(_, data)| !data.is_empty())
        .collect();

    let k = samples.len();
    if k < 2 {
        return Err(InferenceError::GroupCount {
            test: "one-way ANOVA",
            expected: "at least 2",
            actual: k,
        });
    }
    let n_total: usize = samples.iter().map(|(_, d)| d.len()).sum();
    if n_total <= k {
        return Err(InferenceError::InsufficientData {
            test: "one-way ANOVA",
            min_required: k + 1,
            actual: n_total,
        });
    }

    let all: Vec<f64> = samples.iter().flat_map(|(_, d)| d.iter().copied()).collect();
    let grand_mean = stats::mean(&all).unwrap_or(0.0);
    let summaries: Vec<GroupSummary> = samples
        .iter()
        .map(|(label, d)| GroupSummary::new(label, d))
        .collect();

    let ss_between: f64 = summaries
        .iter()
        .map(|g| g.n as f64 * (g.mean - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = samples
        .iter()
        .zip(&summaries)
        .map(|((_, d), g)| stats::sum_squared_deviations(d, g.mean))
        .sum();
    let ss_total = stats::sum_squared_deviations(&all, grand_mean);

    let df_between = k - 1;
    let df_within = n_total - k;
    let ms_between = ss_between / df_between as f64;
    let magnitude = stats::sum_of_squares(&all);
    let no_within = stats::negligible_spread(ss_within, ss_between, magnitude);
    let no_between = stats::negligible_spread(ss_between, 0.0, magnitude);
    let ms_within = if no_within {
        0.0
    } else {
        ss_within / df_within as f64
    };
    let perfect_separation = no_within && !no_between;

    let (f_statistic, p_value, eta_squared) = if perfect_separation {
        log::debug!("ANOVA: zero within-group variance with distinct means, reporting perfect separation");
        (None, Some(0.0), Some(1.0))
    } else if no_within {
        log::debug!("ANOVA: all observations identical, F not computable");
        (None, None, None)
    } else {
        let f = safe_div(ms_between, ms_within);
        let p = f.and_then(|f| finite(special::f_survival(f, df_between as f64, df_within as f64)));
        (f, p, safe_div(ss_between, ss_between + ss_within))
    };

    let post_hoc = if config.post_hoc {
        pairwise_comparisons(&summaries, ss_within, df_within, config)
    } else {
        Vec::new()
    };

    let interpretation =
        interpretation::anova_sentence(outcome, group_variable, p_value, eta_squared, config.alpha);

    Ok(AnovaResult {
        groups: summaries,
        grand_mean,
        ss_between,
        ss_within,
        ss_total,
        df_between,
        df_within,
        ms_between,
        ms_within,
        f_statistic,
        p_value,
        eta_squared,
        effect_size: eta_squared.map(interpretation::eta_squared_band),
        perfect_separation,
        post_hoc,
        significant: config.is_significant(p_value),
        interpretation,
    })
}

/// `ss_within` is the pooled within-group sum of squares; each pair treats
/// it as zero when it is rounding noise next to that pair's own separation.
fn pairwise_comparisons(
    groups: &[GroupSummary],
    ss_within: f64,
    df_within: usize,
    config: &TestConfig,
) -> Vec<PairwiseComparison> {
    let magnitude: f64 = groups
        .iter()
        .map(|g| g.n as f64 * g.mean * g.mean + (g.n as f64 - 1.0) * g.std_dev.unwrap_or(0.0).powi(2))
        .sum();
    let k = groups.len();
    let m = k * (k - 1) / 2;
    let tail = (1.0 - config.confidence_level) / (2.0 * m as f64);
    let t_crit = special::t_quantile(1.0 - tail, df_within as f64);

    let mut out = Vec::with_capacity(m);
    for i in 0..k {
        for j in (i + 1)..k {
            let (g1, g2) = (&groups[i], &groups[j]);
            let diff = g1.mean - g2.mean;
            let (n1, n2) = (g1.n as f64, g2.n as f64);
            let separation = n1 * n2 / (n1 + n2) * diff * diff;
            let se = if stats::negligible_spread(ss_within, separation, magnitude) {
                0.0
            } else {
                (ss_within / df_within as f64 * (1.0 / n1 + 1.0 / n2)).sqrt()
            };
            let p_value = match safe_div(diff, se) {
                Some(t) => finite(special::t_two_tailed_p(t, df_within as f64)),
                None if !stats::negligible_spread(separation, 0.0, magnitude) => Some(0.0),
                None => None,
            };
            let adjusted_p_value = p_value.map(|p| (p * m as f64).min(1.0));
            let margin = finite(t_crit * se);
            out.push(PairwiseComparison {
                group1: g1.label.clone(),
                group2: g2.label.clone(),
                mean_difference: diff,
                standard_error: se,
                ci_lower: margin.map(|h| diff - h),
                ci_upper: margin.map(|h| diff + h),
                p_value,
                adjusted_p_value,
                significant: config.is_significant(adjusted_p_value),
            });
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────
