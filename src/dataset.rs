//! Row-oriented dataset of scalar values.
//!
//! A [`Dataset`] holds an ordered list of column names and an ordered list
//! of rows. Every row has exactly one [`Value`] per column, so a record
//! that omits a column simply stores [`Value::Null`] there.
//!
//! Column *kinds* are not inferred here. A [`Variable`] carries the kind
//! decided by an upstream classification step, and the engine trusts it.
//!
//! # Example
//!
//! ```
//! use u_inference::dataset::{Dataset, Value};
//!
//! let mut ds = Dataset::new(vec!["temperature".into(), "site".into()]);
//! ds.push_row(vec![Value::from(20.5), Value::from("north")]).unwrap();
//! ds.push_row(vec![Value::from(21.3), Value::Null]).unwrap();
//! assert_eq!(ds.row_count(), 2);
//! assert_eq!(ds.column_count(), 2);
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, InferenceResult};

/// Text markers treated as missing values.
const NULL_MARKERS: &[&str] = &[
    "", "NA", "N/A", "na", "n/a", "null", "NULL", "None", "none", ".", "NaN", "nan", "NAN",
    "#N/A", "#NA",
];

/// Number of non-missing values kept in [`Variable::sample_values`].
const SAMPLE_SIZE: usize = 5;

// ── Value ─────────────────────────────────────────────────────────────

/// A single scalar cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// Numeric value (may be non-finite if the source was corrupted).
    Number(f64),
    /// Free-form text.
    Text(String),
}

impl Value {
    /// Returns `true` for `Null`, blank text, and the standard null markers
    /// (`NA`, `null`, `#N/A`, ...).
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => NULL_MARKERS.contains(&s.trim()),
            Self::Boolean(_) | Self::Number(_) => false,
        }
    }

    /// Returns the value as a finite number.
    ///
    /// Numbers must be finite; text is trimmed and parsed. Booleans are
    /// not numbers.
    ///
    /// ```
    /// use u_inference::dataset::Value;
    ///
    /// assert_eq!(Value::from(" 2.5 ").as_number(), Some(2.5));
    /// assert_eq!(Value::from(f64::NAN).as_number(), None);
    /// assert_eq!(Value::from("abc").as_number(), None);
    /// ```
    pub fn as_number(&self) -> Option<f64> {
        let v = match self {
            Self::Number(v) => *v,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            Self::Null | Self::Boolean(_) => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Returns the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ── Dataset ───────────────────────────────────────────────────────────

/// Row-oriented table of scalar values.
///
/// All rows have the same width as the column list. Rows are appended
/// while loading; analysis functions only take `&Dataset`. Deserialization
/// checks every row's width like [`Dataset::push_row`] does.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    names: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Unchecked wire shape of a [`Dataset`].
#[derive(Deserialize)]
struct RawDataset {
    names: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = InferenceError;

    fn try_from(raw: RawDataset) -> Result<Self, Self::Error> {
        let mut dataset = Dataset::new(raw.names);
        for row in raw.rows {
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }
}

impl Dataset {
    /// Creates an empty dataset with the given column names.
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            rows: Vec::new(),
        }
    }

    /// Builds a dataset from name → value records.
    ///
    /// Columns absent from a record are stored as [`Value::Null`]; keys not
    /// listed in `names` are ignored.
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use u_inference::dataset::{Dataset, Value};
    ///
    /// let mut rec = HashMap::new();
    /// rec.insert("x".to_string(), Value::from(1.0));
    /// let ds = Dataset::from_records(vec!["x".into(), "y".into()], vec![rec]);
    /// assert_eq!(ds.value(0, "y"), Some(&Value::Null));
    /// ```
    pub fn from_records<I>(names: Vec<String>, records: I) -> Self
    where
        I: IntoIterator<Item = HashMap<String, Value>>,
    {
        let rows = records
            .into_iter()
            .map(|mut rec| {
                names
                    .iter()
                    .map(|n| rec.remove(n).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self { names, rows }
    }

    /// Appends a row. Returns an error if its width differs from the
    /// column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> InferenceResult<()> {
        if row.len() != self.names.len() {
            return Err(InferenceError::DimensionMismatch {
                expected: self.names.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Returns the number of rows.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns column names in order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Returns the index of the column with the given `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Returns the index of `name`, or [`InferenceError::ColumnNotFound`].
    pub fn require_column(&self, name: &str) -> InferenceResult<usize> {
        self.column_index(name)
            .ok_or_else(|| InferenceError::ColumnNotFound {
                name: name.to_string(),
            })
    }

    /// Returns the value at (`row`, `column`), if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Returns the values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> InferenceResult<Vec<&Value>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Returns an iterator over rows as value slices.
    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(|r| r.as_slice())
    }
}

// ── Variable ──────────────────────────────────────────────────────────

/// Statistical kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Numeric measurements.
    Continuous,
    /// Labels from a finite set.
    Categorical,
    /// True/false values.
    Boolean,
    /// Dates or timestamps.
    Datetime,
    /// Row identifiers.
    Id,
}

impl std::fmt::Display for VariableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continuous => write!(f, "continuous"),
            Self::Categorical => write!(f, "categorical"),
            Self::Boolean => write!(f, "boolean"),
            Self::Datetime => write!(f, "datetime"),
            Self::Id => write!(f, "id"),
        }
    }
}

/// Column classification handed to the engine.
///
/// `kind` is the declared (possibly user-overridden) kind and is the one
/// used for dispatch; `inferred_kind` records what the upstream inference
/// step guessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Column name.
    pub name: String,
    /// Declared kind used for analysis.
    pub kind: VariableKind,
    /// Kind proposed by type inference.
    pub inferred_kind: VariableKind,
    /// A few non-missing example values.
    pub sample_values: Vec<Value>,
    /// Number of distinct non-missing values.
    pub unique_count: usize,
    /// Whether the column takes part in analysis.
    pub included: bool,
}

impl Variable {
    /// Creates an included variable whose declared and inferred kinds agree.
    pub fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        Self {
            name: name.into(),
            kind,
            inferred_kind: kind,
            sample_values: Vec::new(),
            unique_count: 0,
            included: true,
        }
    }

    /// Builds a variable for `name`, filling sample values and unique count
    /// from the dataset.
    ///
    /// ```
    /// use u_inference::dataset::{Dataset, Value, Variable, VariableKind};
    ///
    /// let mut ds = Dataset::new(vec!["g".into()]);
    /// for v in ["a", "b", "a", "NA"] {
    ///     ds.push_row(vec![Value::from(v)]).unwrap();
    /// }
    /// let var = Variable::from_dataset(&ds, "g", VariableKind::Categorical).unwrap();
    /// assert_eq!(var.unique_count, 2);
    /// assert_eq!(var.sample_values.len(), 3);
    /// ```
    pub fn from_dataset(
        dataset: &Dataset,
        name: &str,
        kind: VariableKind,
    ) -> InferenceResult<Self> {
        let values = dataset.column_values(name)?;
        let present: Vec<&Value> = values.into_iter().filter(|v| !v.is_missing()).collect();
        let unique_count = present
            .iter()
            .map(|v| crate::binning::canonical_label(v))
            .collect::<HashSet<_>>()
            .len();
        let sample_values = present.iter().take(SAMPLE_SIZE).map(|v| (*v).clone()).collect();
        Ok(Self {
            sample_values,
            unique_count,
            ..Self::new(name, kind)
        })
    }

    /// Overrides the declared kind, keeping the inferred one.
    pub fn with_kind(mut self, kind: VariableKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the inclusion flag.
    pub fn with_included(mut self, included: bool) -> Self {
        self.included = included;
        self
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let mut ds = Dataset::new(vec!["x".into(), "label".into()]);
        ds.push_row(vec![Value::from(1.0), Value::from("a")]).unwrap();
        ds.push_row(vec![Value::from("2.5"), Value::Null]).unwrap();
        ds.push_row(vec![Value::Null, Value::from("b")]).unwrap();
        ds
    }

    // ── Value ────────────────────────────────────────────────────

    #[test]
    fn missing_markers() {
        assert!(Value::Null.is_missing());
        assert!(Value::from("").is_missing());
        assert!(Value::from("  ").is_missing());
        assert!(Value::from("NA").is_missing());
        assert!(Value::from("#N/A").is_missing());
        assert!(!Value::from("0").is_missing());
        assert!(!Value::from(false).is_missing());
        assert!(!Value::from(f64::NAN).is_missing());
    }

    #[test]
    fn number_parsing() {
        assert_eq!(Value::from(3.0).as_number(), Some(3.0));
        assert_eq!(Value::from("-4e2").as_number(), Some(-400.0));
        assert_eq!(Value::from("inf").as_number(), None);
        assert_eq!(Value::from(f64::INFINITY).as_number(), None);
        assert_eq!(Value::from(true).as_number(), None);
        assert_eq!(Value::Null.as_number(), None);
    }

    #[test]
    fn option_conversion() {
        assert_eq!(Value::from(None::<f64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }

    #[test]
    fn value_json_shape() {
        let row = vec![Value::Null, Value::from(1.5), Value::from(true), Value::from("a")];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[null,1.5,true,"a"]"#);
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    // ── Dataset ──────────────────────────────────────────────────

    #[test]
    fn empty_dataset() {
        let ds = Dataset::new(vec!["a".into()]);
        assert_eq!(ds.row_count(), 0);
        assert_eq!(ds.column_count(), 1);
        assert!(ds.is_empty());
    }

    #[test]
    fn push_rows() {
        let ds = sample();
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.column_names(), &["x", "label"]);
        assert_eq!(ds.value(1, "x"), Some(&Value::from("2.5")));
        assert_eq!(ds.value(5, "x"), None);
        assert_eq!(ds.value(0, "nope"), None);
    }

    #[test]
    fn row_width_mismatch() {
        let mut ds = Dataset::new(vec!["a".into(), "b".into()]);
        let err = ds.push_row(vec![Value::from(1.0)]).unwrap_err();
        assert_eq!(
            err,
            InferenceError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn json_round_trip_keeps_rows() {
        let ds = sample();
        let json = serde_json::to_string(&ds).unwrap();
        let back: Dataset = serde_json::from_str(&json).unwrap();
        assert_eq!(back.row_count(), 3);
        assert_eq!(back.value(1, "x"), Some(&Value::from("2.5")));
    }

    #[test]
    fn json_with_ragged_row_is_rejected() {
        let json = r#"{"names":["y","g"],"rows":[[1.0,"a"],[1.0]]}"#;
        let err = serde_json::from_str::<Dataset>(json).unwrap_err();
        assert!(err.to_string().contains("expected 2 elements, got 1"), "{err}");
    }

    #[test]
    fn column_lookup() {
        let ds = sample();
        let xs = ds.column_values("x").unwrap();
        assert_eq!(xs.len(), 3);
        assert!(matches!(
            ds.column_values("missing"),
            Err(InferenceError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn records_fill_absent_columns() {
        let mut r1 = HashMap::new();
        r1.insert("a".to_string(), Value::from(1.0));
        r1.insert("extra".to_string(), Value::from("ignored"));
        let mut r2 = HashMap::new();
        r2.insert("b".to_string(), Value::from("z"));
        let ds = Dataset::from_records(vec!["a".into(), "b".into()], vec![r1, r2]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.value(0, "b"), Some(&Value::Null));
        assert_eq!(ds.value(1, "a"), Some(&Value::Null));
        assert_eq!(ds.value(1, "b"), Some(&Value::from("z")));
    }

    // ── Variable ─────────────────────────────────────────────────

    #[test]
    fn variable_from_dataset() {
        let ds = sample();
        let var = Variable::from_dataset(&ds, "x", VariableKind::Continuous).unwrap();
        assert_eq!(var.unique_count, 2);
        assert_eq!(var.sample_values.len(), 2);
        assert!(var.included);
        assert_eq!(var.inferred_kind, VariableKind::Continuous);
    }

    #[test]
    fn kind_override_keeps_inferred() {
        let var = Variable::new("zip", VariableKind::Continuous).with_kind(VariableKind::Categorical);
        assert_eq!(var.kind, VariableKind::Categorical);
        assert_eq!(var.inferred_kind, VariableKind::Continuous);
        assert_eq!(var.kind.to_string(), "categorical");
    }

    #[test]
    fn variable_json_uses_lowercase_kind() {
        let var = Variable::new("d", VariableKind::Datetime).with_included(false);
        let json = serde_json::to_value(&var).unwrap();
        assert_eq!(json["kind"], "datetime");
        assert_eq!(json["included"], false);
    }
}
