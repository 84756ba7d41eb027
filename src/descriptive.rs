//! Per-column descriptive statistics dispatched by variable kind.
//!
//! Missing values are expected input, not errors. Every summary reports
//! `count` (values usable for its kind) and `missing` (everything else) so
//! that `count + missing` always equals the dataset's row count.
//!
//! | Kind        | Summary                | Usable values                     |
//! |-------------|------------------------|-----------------------------------|
//! | continuous  | [`ContinuousStats`]    | finite numbers (numeric text too) |
//! | categorical | [`CategoricalStats`]   | non-missing cells                 |
//! | boolean     | [`CategoricalStats`]   | non-missing cells                 |
//! | datetime    | [`DatetimeStats`]      | parseable timestamps              |
//! | id          | [`IdentifierStats`]    | non-missing cells                 |
//!
//! # Example
//!
//! ```
//! use u_inference::dataset::{Dataset, Value, Variable, VariableKind};
//! use u_inference::descriptive::{describe_dataset, ColumnSummary, DescribeConfig};
//!
//! let mut ds = Dataset::new(vec!["temp".into(), "status".into()]);
//! for (t, s) in [(20.5, "OK"), (21.3, "OK"), (19.8, "FAIL")] {
//!     ds.push_row(vec![Value::from(t), Value::from(s)]).unwrap();
//! }
//! ds.push_row(vec![Value::Null, Value::from("OK")]).unwrap();
//!
//! let vars = vec![
//!     Variable::new("temp", VariableKind::Continuous),
//!     Variable::new("status", VariableKind::Categorical),
//! ];
//! let out = describe_dataset(&ds, &vars, &DescribeConfig::default()).unwrap();
//!
//! let ColumnSummary::Continuous(temp) = &out[0].summary else { panic!() };
//! assert_eq!(temp.count, 3);
//! assert_eq!(temp.missing, 1);
//! let ColumnSummary::Categorical(status) = &out[1].summary else { panic!() };
//! assert_eq!(status.mode.as_deref(), Some("OK"));
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::binning::canonical_label;
use crate::dataset::{Dataset, Value, Variable, VariableKind};
use crate::error::InferenceResult;
use crate::normality::{self, NormalityTestResult};
use crate::stats;
use crate::temporal::{self, Granularity};

// ── Configuration ─────────────────────────────────────────────────────

/// Configuration for [`describe_column`] and [`describe_dataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct DescribeConfig {
    /// Period datetime values are floored to. Default: `Day`.
    pub granularity: Granularity,
    /// Smallest sample that gets a normality test. Default: 8.
    ///
    /// Values below 8 are treated as 8.
    pub normality_min_n: usize,
    /// Keep only the N most frequent categories. Default: `None` (all,
    /// in first-seen order).
    pub top_categories: Option<usize>,
}

impl Default for DescribeConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Day,
            normality_min_n: normality::MIN_SAMPLE_SIZE,
            top_categories: None,
        }
    }
}

impl DescribeConfig {
    /// Sets the datetime granularity.
    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Sets the minimum sample size for the normality test.
    pub fn normality_min_n(mut self, n: usize) -> Self {
        self.normality_min_n = n;
        self
    }

    /// Truncates frequency tables to the `n` most frequent categories.
    pub fn top_categories(mut self, n: usize) -> Self {
        self.top_categories = Some(n);
        self
    }
}

// ── Result types ──────────────────────────────────────────────────────

/// Statistics of a continuous column, over its finite values only.
///
/// Every statistic is `None` when it is not computable for the sample
/// (too few values, zero spread, zero mean for `cv`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinuousStats {
    /// Number of finite numeric values.
    pub count: usize,
    /// Rows that are missing or not a finite number.
    pub missing: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation (`n − 1`).
    pub std_dev: Option<f64>,
    /// Sample variance (`n − 1`).
    pub variance: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// First quartile (R-7).
    pub q1: Option<f64>,
    /// Third quartile (R-7).
    pub q3: Option<f64>,
    /// `q3 − q1`.
    pub iqr: Option<f64>,
    /// `max − min`.
    pub range: Option<f64>,
    /// Coefficient of variation, `std_dev / |mean|`.
    pub cv: Option<f64>,
    /// Adjusted skewness G1 (n ≥ 3).
    pub skewness: Option<f64>,
    /// Excess kurtosis G2 (n ≥ 4).
    pub kurtosis: Option<f64>,
    /// Jarque–Bera result when the sample is large enough.
    pub normality: Option<NormalityTestResult>,
}

/// One row of a frequency table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyEntry {
    /// Category label.
    pub value: String,
    /// Occurrences.
    pub count: usize,
    /// Share of non-missing values, 0–100.
    pub percentage: f64,
}

/// Statistics of a categorical (or boolean) column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalStats {
    /// Non-missing values.
    pub count: usize,
    /// Missing values.
    pub missing: usize,
    /// Distinct non-missing categories.
    pub unique_count: usize,
    /// Frequencies in first-seen order (or by descending count when
    /// truncated with [`DescribeConfig::top_categories`]).
    pub frequencies: Vec<FrequencyEntry>,
    /// Most frequent category; ties go to the first seen.
    pub mode: Option<String>,
}

/// Statistics of a datetime column after flooring to a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatetimeStats {
    /// Parseable timestamps.
    pub count: usize,
    /// Missing or unparseable values.
    pub missing: usize,
    /// Period the values were floored to.
    pub granularity: Granularity,
    /// Distinct periods.
    pub unique_count: usize,
    /// Earliest period label.
    pub min: Option<String>,
    /// Latest period label.
    pub max: Option<String>,
    /// Most frequent period; ties go to the earliest.
    pub mode: Option<String>,
    /// Period frequencies in chronological order.
    pub frequencies: Vec<FrequencyEntry>,
}

/// Statistics of an identifier column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentifierStats {
    pub count: usize,
    pub missing: usize,
    pub unique_count: usize,
    /// Every non-missing value is distinct.
    pub is_unique: bool,
}

/// Kind-specific summary of a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnSummary {
    Continuous(ContinuousStats),
    Categorical(CategoricalStats),
    Datetime(DatetimeStats),
    Identifier(IdentifierStats),
}

impl ColumnSummary {
    /// `(count, missing)` of the underlying summary.
    pub fn counts(&self) -> (usize, usize) {
        match self {
            Self::Continuous(s) => (s.count, s.missing),
            Self::Categorical(s) => (s.count, s.missing),
            Self::Datetime(s) => (s.count, s.missing),
            Self::Identifier(s) => (s.count, s.missing),
        }
    }
}

/// Description of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescription {
    /// Column name.
    pub name: String,
    /// Kind the column was summarized as.
    pub kind: VariableKind,
    /// Total rows.
    pub total: usize,
    /// Kind-specific statistics.
    pub summary: ColumnSummary,
}

// ── Describe functions ────────────────────────────────────────────────

/// Describes every included variable, in the order given.
///
/// Errors if a variable names a column the dataset does not have.
pub fn describe_dataset(
    dataset: &Dataset,
    variables: &[Variable],
    config: &DescribeConfig,
) -> InferenceResult<Vec<ColumnDescription>> {
    variables
        .iter()
        .filter(|v| v.included)
        .map(|v| describe_column(dataset, v, config))
        .collect()
}

/// Describes one column according to the variable's declared kind.
pub fn describe_column(
    dataset: &Dataset,
    variable: &Variable,
    config: &DescribeConfig,
) -> InferenceResult<ColumnDescription> {
    let values = dataset.column_values(&variable.name)?;
    let summary = match variable.kind {
        VariableKind::Continuous => ColumnSummary::Continuous(describe_continuous(&values, config)),
        VariableKind::Categorical | VariableKind::Boolean => {
            ColumnSummary::Categorical(describe_categorical(&values, config))
        }
        VariableKind::Datetime => ColumnSummary::Datetime(describe_datetime(&values, config)),
        VariableKind::Id => ColumnSummary::Identifier(describe_identifier(&values)),
    };
    Ok(ColumnDescription {
        name: variable.name.clone(),
        kind: variable.kind,
        total: values.len(),
        summary,
    })
}

/// Continuous statistics over the finite numbers among `values`.
pub fn describe_continuous(values: &[&Value], config: &DescribeConfig) -> ContinuousStats {
    let data = crate::binning::numeric_values(values);
    let count = data.len();
    let missing = values.len() - count;

    let unparseable = values.iter().filter(|v| !v.is_missing()).count() - count;
    if unparseable > 0 {
        log::debug!("{unparseable} non-numeric values counted as missing");
    }

    let sorted = stats::sorted(&data);
    let mean = stats::mean(&data);
    let variance = stats::variance(&data);
    let std_dev = variance.map(f64::sqrt);
    let min = sorted.first().copied();
    let max = sorted.last().copied();
    let q1 = stats::quantile_sorted(&sorted, 0.25);
    let q3 = stats::quantile_sorted(&sorted, 0.75);
    let skewness = stats::skewness(&data);
    let kurtosis = stats::kurtosis(&data);

    let normality = match (skewness, kurtosis) {
        (Some(s), Some(k)) if count >= config.normality_min_n => {
            normality::jarque_bera_from_moments(count, s, k)
        }
        _ => None,
    };

    ContinuousStats {
        count,
        missing,
        mean,
        median: stats::quantile_sorted(&sorted, 0.5),
        std_dev,
        variance,
        min,
        max,
        q1,
        q3,
        iqr: q1.zip(q3).map(|(a, b)| b - a),
        range: min.zip(max).map(|(a, b)| b - a),
        cv: std_dev
            .zip(mean)
            .and_then(|(sd, m)| stats::safe_div(sd, m.abs())),
        skewness,
        kurtosis,
        normality,
    }
}

fn frequency_entries(counts: Vec<(String, usize)>, total: usize) -> Vec<FrequencyEntry> {
    counts
        .into_iter()
        .map(|(value, count)| FrequencyEntry {
            percentage: count as f64 / total as f64 * 100.0,
            value,
            count,
        })
        .collect()
}

/// Categorical statistics over the non-missing values.
pub fn describe_categorical(values: &[&Value], config: &DescribeConfig) -> CategoricalStats {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut missing = 0usize;

    for v in values {
        if v.is_missing() {
            missing += 1;
            continue;
        }
        let label = canonical_label(v);
        match index.get(&label) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(label.clone(), order.len());
                order.push((label, 1));
            }
        }
    }

    let count = values.len() - missing;
    let unique_count = order.len();

    // Strict comparison keeps the first-seen category on ties.
    let mode = order
        .iter()
        .fold(None::<&(String, usize)>, |best, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        })
        .map(|(label, _)| label.clone());

    if let Some(n) = config.top_categories {
        order.sort_by(|a, b| b.1.cmp(&a.1));
        order.truncate(n);
    }

    CategoricalStats {
        count,
        missing,
        unique_count,
        frequencies: frequency_entries(order, count),
        mode,
    }
}

/// Datetime statistics over floored periods.
pub fn describe_datetime(values: &[&Value], config: &DescribeConfig) -> DatetimeStats {
    let granularity = config.granularity;
    let mut periods: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for v in values {
        if let Some(start) = temporal::floor_value(v, granularity) {
            *periods.entry(start).or_insert(0) += 1;
        }
    }

    let count: usize = periods.values().sum();
    let missing = values.len() - count;

    let min = periods.keys().next().map(|d| granularity.label(*d));
    let max = periods.keys().next_back().map(|d| granularity.label(*d));
    let mode = periods
        .iter()
        .fold(None::<(&NaiveDate, &usize)>, |best, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        })
        .map(|(d, _)| granularity.label(*d));

    let counts: Vec<(String, usize)> = periods
        .iter()
        .map(|(d, &c)| (granularity.label(*d), c))
        .collect();

    DatetimeStats {
        count,
        missing,
        granularity,
        unique_count: counts.len(),
        min,
        max,
        mode,
        frequencies: frequency_entries(counts, count),
    }
}

/// Identifier statistics: counts and uniqueness.
pub fn describe_identifier(values: &[&Value]) -> IdentifierStats {
    let present: Vec<String> = values
        .iter()
        .filter(|v| !v.is_missing())
        .map(|v| canonical_label(v))
        .collect();
    let unique_count = present.iter().collect::<HashSet<_>>().len();
    IdentifierStats {
        count: present.len(),
        missing: values.len() - present.len(),
        unique_count,
        is_unique: unique_count == present.len(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn cell() -> impl Strategy<Value = Value> {
        prop_oneof![
            (-1e6_f64..1e6).prop_map(Value::from),
            Just(Value::Null),
            Just(Value::from("NA")),
            "[a-d]{1,2}".prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
        ]
    }

    proptest! {
        #[test]
        fn count_plus_missing_is_total(cells in proptest::collection::vec(cell(), 0..80)) {
            let r: Vec<&Value> = cells.iter().collect();
            let cfg = DescribeConfig::default();

            let c = describe_continuous(&r, &cfg);
            prop_assert_eq!(c.count + c.missing, cells.len());

            let k = describe_categorical(&r, &cfg);
            prop_assert_eq!(k.count + k.missing, cells.len());

            let d = describe_datetime(&r, &cfg);
            prop_assert_eq!(d.count + d.missing, cells.len());

            let i = describe_identifier(&r);
            prop_assert_eq!(i.count + i.missing, cells.len());
        }

        #[test]
        fn quartiles_ordered(data in proptest::collection::vec(-1e6_f64..1e6, 4..80)) {
            let cells: Vec<Value> = data.into_iter().map(Value::from).collect();
            let r: Vec<&Value> = cells.iter().collect();
            let s = describe_continuous(&r, &DescribeConfig::default());
            let (q1, med, q3) = (s.q1.unwrap(), s.median.unwrap(), s.q3.unwrap());
            prop_assert!(q1 <= med && med <= q3);
        }

        #[test]
        fn percentages_sum_to_hundred(labels in proptest::collection::vec("[a-e]", 1..60)) {
            let cells: Vec<Value> = labels.into_iter().map(Value::from).collect();
            let r: Vec<&Value> = cells.iter().collect();
            let s = describe_categorical(&r, &DescribeConfig::default());
            let total: f64 = s.frequencies.iter().map(|f| f.percentage).sum();
            prop_assert!((total - 100.0).abs() < 1e-9);
        }
    }
}
