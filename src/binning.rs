//! Histogram bucketing, box-plot summaries and grouping helpers.
//!
//! The grouping helpers are the bridge between a [`Dataset`] and the
//! hypothesis tests: they extract numeric samples per group, paired
//! numeric columns, and contingency tables keyed by canonical labels.
//!
//! # Example
//!
//! ```
//! use u_inference::binning::{box_plot, histogram};
//!
//! let data: Vec<f64> = (1..=100).map(f64::from).collect();
//! let hist = histogram(&data, 10).unwrap();
//! assert!(hist.bins.iter().all(|b| b.count == 10));
//!
//! let bp = box_plot(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
//! assert_eq!(bp.outliers, vec![100.0]);
//! assert_eq!(bp.upper_whisker, 4.0);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::dataset::{Dataset, Value};
use crate::error::{InferenceError, InferenceResult};
use crate::stats;

/// Label given to absent or empty category values.
pub const MISSING_LABEL: &str = "Missing";

/// Box-plot fence multiplier applied to the IQR.
pub const FENCE_FACTOR: f64 = 1.5;

// ── Value helpers ─────────────────────────────────────────────────────

/// Canonical string form of a cell used as a category key.
///
/// Numbers use Rust's shortest round-trip formatting (`3.0` → `"3"`),
/// booleans become `"true"`/`"false"`, text is trimmed, and missing values
/// map to [`MISSING_LABEL`].
///
/// ```
/// use u_inference::binning::canonical_label;
/// use u_inference::dataset::Value;
///
/// assert_eq!(canonical_label(&Value::from(3.0)), "3");
/// assert_eq!(canonical_label(&Value::from(" north ")), "north");
/// assert_eq!(canonical_label(&Value::from("NA")), "Missing");
/// ```
pub fn canonical_label(value: &Value) -> String {
    if value.is_missing() {
        return MISSING_LABEL.to_string();
    }
    match value {
        Value::Number(v) => v.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Text(s) => s.trim().to_string(),
        Value::Null => MISSING_LABEL.to_string(),
    }
}

/// Finite numeric values of a column, skipping everything else.
pub fn numeric_values(values: &[&Value]) -> Vec<f64> {
    values.iter().filter_map(|v| v.as_number()).collect()
}

/// Finite numeric values of the named column.
pub fn column_numbers(dataset: &Dataset, column: &str) -> InferenceResult<Vec<f64>> {
    Ok(numeric_values(&dataset.column_values(column)?))
}

// ── Histogram ─────────────────────────────────────────────────────────

/// One histogram bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    /// Inclusive lower edge.
    pub lower: f64,
    /// Upper edge; exclusive except for the last bin.
    pub upper: f64,
    /// `"[lower, upper)"`, or `"[lower, upper]"` for the last bin.
    pub label: String,
    /// Number of values in the bin.
    pub count: usize,
}

/// Fixed-width histogram over `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Uniform bin width (0 when all values are equal).
    pub bin_width: f64,
    /// Buckets in ascending order.
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Total number of binned values.
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Sturges' rule: `k = ⌈log₂ n⌉ + 1`, a reasonable default bin count.
pub fn sturges_bin_count(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    (n as f64).log2().ceil() as usize + 1
}

fn format_edge(x: f64) -> String {
    let s = format!("{x:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Buckets finite `data` into `n_bins` equal-width bins spanning its range.
///
/// A value falls into bin `⌊(v − min)/width⌋`, so bins are half-open except
/// the last, which also takes `max`. When every value is equal a single bin
/// holds them all. Returns `None` for empty data, `n_bins == 0`, or a range
/// `max − min` too wide to represent as an `f64`.
pub fn histogram(data: &[f64], n_bins: usize) -> Option<Histogram> {
    let values: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() || n_bins == 0 {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(max - min).is_finite() {
        log::debug!("histogram: range [{min}, {max}] overflows f64");
        return None;
    }

    if max - min <= 0.0 {
        return Some(Histogram {
            min,
            max,
            bin_width: 0.0,
            bins: vec![HistogramBin {
                lower: min,
                upper: max,
                label: format!("[{}, {}]", format_edge(min), format_edge(max)),
                count: values.len(),
            }],
        });
    }

    let width = (max - min) / n_bins as f64;
    let mut counts = vec![0usize; n_bins];
    for &v in &values {
        let idx = (((v - min) / width).floor() as usize).min(n_bins - 1);
        counts[idx] += 1;
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lower = min + i as f64 * width;
            let last = i + 1 == n_bins;
            let upper = if last { max } else { min + (i + 1) as f64 * width };
            let close = if last { ']' } else { ')' };
            HistogramBin {
                lower,
                upper,
                label: format!("[{}, {}{close}", format_edge(lower), format_edge(upper)),
                count,
            }
        })
        .collect();

    Some(Histogram {
        min,
        max,
        bin_width: width,
        bins,
    })
}

// ── Box plot ──────────────────────────────────────────────────────────

/// Five-number summary with Tukey fences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlotSummary {
    /// Smallest value inside the lower fence.
    pub lower_whisker: f64,
    /// First quartile (R-7).
    pub q1: f64,
    /// Median.
    pub median: f64,
    /// Third quartile (R-7).
    pub q3: f64,
    /// Largest value inside the upper fence.
    pub upper_whisker: f64,
    /// `q3 − q1`.
    pub iqr: f64,
    /// `q1 − 1.5·iqr`.
    pub lower_fence: f64,
    /// `q3 + 1.5·iqr`.
    pub upper_fence: f64,
    /// Values outside the fences, ascending.
    pub outliers: Vec<f64>,
}

/// Box-plot summary of the finite values in `data`; `None` if there are none.
pub fn box_plot(data: &[f64]) -> Option<BoxPlotSummary> {
    let finite: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    let sorted = stats::sorted(&finite);
    let q1 = stats::quantile_sorted(&sorted, 0.25)?;
    let median = stats::quantile_sorted(&sorted, 0.5)?;
    let q3 = stats::quantile_sorted(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let lower_fence = q1 - FENCE_FACTOR * iqr;
    let upper_fence = q3 + FENCE_FACTOR * iqr;

    let (inside, outliers): (Vec<f64>, Vec<f64>) = sorted
        .iter()
        .partition(|&&v| v >= lower_fence && v <= upper_fence);

    let lower_whisker = inside.first().copied().unwrap_or(q1);
    let upper_whisker = inside.last().copied().unwrap_or(q3);

    Some(BoxPlotSummary {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        iqr,
        lower_fence,
        upper_fence,
        outliers,
    })
}

// ── Grouping ──────────────────────────────────────────────────────────

/// Partitions the numeric column `value_column` by the canonical label of
/// `group_column`.
///
/// Rows whose group key is missing, or whose value is missing or not a
/// finite number, are skipped. Groups are ordered by label.
///
/// ```
/// use u_inference::binning::group_numeric_by;
/// use u_inference::dataset::{Dataset, Value};
///
/// let mut ds = Dataset::new(vec!["score".into(), "arm".into()]);
/// ds.push_row(vec![Value::from(1.0), Value::from("b")]).unwrap();
/// ds.push_row(vec![Value::from("oops"), Value::from("a")]).unwrap();
/// ds.push_row(vec![Value::from(3.0), Value::from("a")]).unwrap();
/// let groups = group_numeric_by(&ds, "score", "arm").unwrap();
/// assert_eq!(groups.keys().collect::<Vec<_>>(), ["a", "b"]);
/// assert_eq!(groups["a"], vec![3.0]);
/// ```
pub fn group_numeric_by(
    dataset: &Dataset,
    value_column: &str,
    group_column: &str,
) -> InferenceResult<BTreeMap<String, Vec<f64>>> {
    let vi = dataset.require_column(value_column)?;
    let gi = dataset.require_column(group_column)?;

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut skipped = 0usize;
    for row in dataset.rows() {
        let key = &row[gi];
        match row[vi].as_number() {
            Some(v) if !key.is_missing() => {
                groups.entry(canonical_label(key)).or_default().push(v);
            }
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        log::debug!(
            "group_numeric_by({value_column} by {group_column}): skipped {skipped} rows with missing group or non-numeric value"
        );
    }
    Ok(groups)
}

/// Extracts `(x, y)` pairs where both cells are finite numbers.
pub fn paired_numeric(
    dataset: &Dataset,
    x_column: &str,
    y_column: &str,
) -> InferenceResult<(Vec<f64>, Vec<f64>)> {
    let xi = dataset.require_column(x_column)?;
    let yi = dataset.require_column(y_column)?;

    let (xs, ys): (Vec<f64>, Vec<f64>) = dataset
        .rows()
        .filter_map(|row| Some((row[xi].as_number()?, row[yi].as_number()?)))
        .unzip();
    let skipped = dataset.row_count() - xs.len();
    if skipped > 0 {
        log::debug!("paired_numeric({x_column}, {y_column}): skipped {skipped} incomplete rows");
    }
    Ok((xs, ys))
}

// ── Contingency table ─────────────────────────────────────────────────

/// Cross-tabulated counts with sorted row and column labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContingencyTable {
    /// Row category labels, ascending.
    pub row_labels: Vec<String>,
    /// Column category labels, ascending.
    pub column_labels: Vec<String>,
    /// `counts[i][j]` = rows with row label `i` and column label `j`.
    pub counts: Vec<Vec<u64>>,
}

impl ContingencyTable {
    /// Builds a table from explicit counts.
    ///
    /// Errors with [`InferenceError::DimensionMismatch`] when the count
    /// matrix does not match the label lengths.
    pub fn from_counts(
        row_labels: Vec<String>,
        column_labels: Vec<String>,
        counts: Vec<Vec<u64>>,
    ) -> InferenceResult<Self> {
        if counts.len() != row_labels.len() {
            return Err(InferenceError::DimensionMismatch {
                expected: row_labels.len(),
                actual: counts.len(),
            });
        }
        if let Some(bad) = counts.iter().find(|r| r.len() != column_labels.len()) {
            return Err(InferenceError::DimensionMismatch {
                expected: column_labels.len(),
                actual: bad.len(),
            });
        }
        Ok(Self {
            row_labels,
            column_labels,
            counts,
        })
    }

    /// Builds a table from a count matrix, labelling rows `R1..` and
    /// columns `C1..`.
    pub fn from_matrix(counts: Vec<Vec<u64>>) -> InferenceResult<Self> {
        let n_rows = counts.len();
        let n_cols = counts.first().map_or(0, Vec::len);
        Self::from_counts(
            (1..=n_rows).map(|i| format!("R{i}")).collect(),
            (1..=n_cols).map(|j| format!("C{j}")).collect(),
            counts,
        )
    }

    /// Number of row categories.
    pub fn n_rows(&self) -> usize {
        self.row_labels.len()
    }

    /// Number of column categories.
    pub fn n_cols(&self) -> usize {
        self.column_labels.len()
    }

    /// Row sums.
    pub fn row_totals(&self) -> Vec<u64> {
        self.counts.iter().map(|r| r.iter().sum()).collect()
    }

    /// Column sums.
    pub fn column_totals(&self) -> Vec<u64> {
        (0..self.n_cols())
            .map(|j| self.counts.iter().map(|r| r[j]).sum())
            .collect()
    }

    /// Grand total.
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }
}

/// Cross-tabulates two columns of `dataset`.
///
/// Every row is counted; missing values become the [`MISSING_LABEL`]
/// category.
pub fn contingency_table(
    dataset: &Dataset,
    row_column: &str,
    column_column: &str,
) -> InferenceResult<ContingencyTable> {
    let ri = dataset.require_column(row_column)?;
    let ci = dataset.require_column(column_column)?;

    let mut cells: BTreeMap<(String, String), u64> = BTreeMap::new();
    let mut row_set = BTreeSet::new();
    let mut col_set = BTreeSet::new();
    for row in dataset.rows() {
        let r = canonical_label(&row[ri]);
        let c = canonical_label(&row[ci]);
        row_set.insert(r.clone());
        col_set.insert(c.clone());
        *cells.entry((r, c)).or_insert(0) += 1;
    }

    let row_labels: Vec<String> = row_set.into_iter().collect();
    let column_labels: Vec<String> = col_set.into_iter().collect();
    let counts = row_labels
        .iter()
        .map(|r| {
            column_labels
                .iter()
                .map(|c| cells.get(&(r.clone(), c.clone())).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    Ok(ContingencyTable {
        row_labels,
        column_labels,
        counts,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(names: &[&str], rows: Vec<Vec<Value>>) -> Dataset {
        let mut ds = Dataset::new(names.iter().map(|s| s.to_string()).collect());
        for r in rows {
            ds.push_row(r).unwrap();
        }
        ds
    }

    // ── Labels ───────────────────────────────────────────────────

    #[test]
    fn canonical_labels() {
        assert_eq!(canonical_label(&Value::from(2.5)), "2.5");
        assert_eq!(canonical_label(&Value::from(7_i64)), "7");
        assert_eq!(canonical_label(&Value::from(true)), "true");
        assert_eq!(canonical_label(&Value::Null), "Missing");
        assert_eq!(canonical_label(&Value::from("   ")), "Missing");
    }

    #[test]
    fn numeric_values_skip_non_numbers() {
        let vals = [
            Value::from(1.0),
            Value::from("2"),
            Value::from("x"),
            Value::Null,
            Value::from(f64::INFINITY),
            Value::from(true),
        ];
        let refs: Vec<&Value> = vals.iter().collect();
        assert_eq!(numeric_values(&refs), vec![1.0, 2.0]);
    }

    // ── Histogram ────────────────────────────────────────────────

    #[test]
    fn histogram_of_one_to_hundred() {
        let data: Vec<f64> = (1..=100).map(f64::from).collect();
        let h = histogram(&data, 10).unwrap();
        assert_eq!(h.bins.len(), 10);
        assert_eq!(h.total(), 100);
        for b in &h.bins {
            assert_eq!(b.count, 10, "bin {}", b.label);
        }
        assert_eq!(h.bins[0].label, "[1, 10.9)");
        assert_eq!(h.bins[9].label, "[91.1, 100]");
    }

    #[test]
    fn histogram_max_lands_in_last_bin() {
        let h = histogram(&[0.0, 1.0, 2.0, 3.0], 3).unwrap();
        let counts: Vec<usize> = h.bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 2]);
    }

    #[test]
    fn histogram_constant_data_single_bin() {
        let h = histogram(&[4.0, 4.0, 4.0], 5).unwrap();
        assert_eq!(h.bins.len(), 1);
        assert_eq!(h.bins[0].count, 3);
        assert_eq!(h.bin_width, 0.0);
    }

    #[test]
    fn histogram_degenerate_inputs() {
        assert!(histogram(&[], 10).is_none());
        assert!(histogram(&[1.0, 2.0], 0).is_none());
        assert!(histogram(&[f64::NAN], 3).is_none());
    }

    #[test]
    fn histogram_range_beyond_f64_is_none() {
        assert!(histogram(&[-1e308, 0.0, 1e308], 4).is_none());
        let h = histogram(&[-1e307, 1e307], 4).unwrap();
        assert_eq!(h.bins.iter().map(|b| b.count).sum::<usize>(), 2);
        assert_eq!(h.bins[3].count, 1);
    }

    #[test]
    fn sturges() {
        assert_eq!(sturges_bin_count(1), 1);
        assert_eq!(sturges_bin_count(100), 8);
        assert_eq!(sturges_bin_count(1024), 11);
    }

    // ── Box plot ─────────────────────────────────────────────────

    #[test]
    fn box_plot_flags_outlier() {
        let bp = box_plot(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(bp.q1, 2.0);
        assert_eq!(bp.median, 3.0);
        assert_eq!(bp.q3, 4.0);
        assert_eq!(bp.iqr, 2.0);
        assert_eq!(bp.upper_fence, 7.0);
        assert_eq!(bp.outliers, vec![100.0]);
        assert_eq!(bp.lower_whisker, 1.0);
        assert_eq!(bp.upper_whisker, 4.0);
    }

    #[test]
    fn box_plot_outliers_both_sides() {
        let bp = box_plot(&[-50.0, 10.0, 11.0, 12.0, 13.0, 14.0, 90.0]).unwrap();
        assert_eq!(bp.outliers, vec![-50.0, 90.0]);
        assert_eq!(bp.lower_whisker, 10.0);
        assert_eq!(bp.upper_whisker, 14.0);
    }

    #[test]
    fn box_plot_empty() {
        assert!(box_plot(&[]).is_none());
        let single = box_plot(&[5.0]).unwrap();
        assert_eq!(single.median, 5.0);
        assert!(single.outliers.is_empty());
    }

    // ── Grouping ─────────────────────────────────────────────────

    #[test]
    fn grouping_skips_bad_rows() {
        let ds = dataset(
            &["y", "g"],
            vec![
                vec![Value::from(1.0), Value::from("a")],
                vec![Value::from(2.0), Value::from(1.0)],
                vec![Value::Null, Value::from("a")],
                vec![Value::from("n/a"), Value::from("b")],
                vec![Value::from(5.0), Value::Null],
                vec![Value::from("6"), Value::from(" a ")],
            ],
        );
        let groups = group_numeric_by(&ds, "y", "g").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["a"], vec![1.0, 6.0]);
        assert_eq!(groups["1"], vec![2.0]);
    }

    #[test]
    fn grouping_unknown_column() {
        let ds = dataset(&["y"], vec![]);
        let err = group_numeric_by(&ds, "y", "nope").unwrap_err();
        assert_eq!(err, InferenceError::ColumnNotFound { name: "nope".into() });
    }

    #[test]
    fn paired_numeric_drops_incomplete_rows() {
        let ds = dataset(
            &["x", "y"],
            vec![
                vec![Value::from(1.0), Value::from(2.0)],
                vec![Value::from(2.0), Value::Null],
                vec![Value::from("3"), Value::from(6.0)],
            ],
        );
        let (x, y) = paired_numeric(&ds, "x", "y").unwrap();
        assert_eq!(x, vec![1.0, 3.0]);
        assert_eq!(y, vec![2.0, 6.0]);
    }

    // ── Contingency ──────────────────────────────────────────────

    #[test]
    fn contingency_sorted_and_missing_kept() {
        let ds = dataset(
            &["sex", "smoker"],
            vec![
                vec![Value::from("m"), Value::from("yes")],
                vec![Value::from("f"), Value::from("no")],
                vec![Value::from("m"), Value::from("no")],
                vec![Value::from("m"), Value::Null],
                vec![Value::from("f"), Value::from("no")],
            ],
        );
        let t = contingency_table(&ds, "sex", "smoker").unwrap();
        assert_eq!(t.row_labels, vec!["f", "m"]);
        assert_eq!(t.column_labels, vec!["Missing", "no", "yes"]);
        assert_eq!(t.counts, vec![vec![0, 2, 0], vec![1, 1, 1]]);
        assert_eq!(t.row_totals(), vec![2, 3]);
        assert_eq!(t.column_totals(), vec![1, 3, 1]);
        assert_eq!(t.total(), 5);
    }

    #[test]
    fn contingency_from_counts_validates_shape() {
        let err = ContingencyTable::from_matrix(vec![vec![1, 2], vec![3]]).unwrap_err();
        assert_eq!(err, InferenceError::DimensionMismatch { expected: 2, actual: 1 });
        let t = ContingencyTable::from_matrix(vec![vec![10, 0], vec![0, 10]]).unwrap();
        assert_eq!(t.row_labels, vec!["R1", "R2"]);
        assert_eq!(t.total(), 20);
    }
}
