//! # u-inference
//!
//! Statistical inference engine: descriptive statistics, classical
//! hypothesis tests and the special functions behind their p-values.
//!
//! Every p-value and critical value is computed in-crate from the gamma,
//! incomplete beta and incomplete gamma functions in [`special`]; there is
//! no external math library. Statistics that cannot be computed for the
//! given data (zero variance, too few values) are `None` rather than an
//! error, and serialize as `null`.
//!
//! ## Modules
//!
//! - [`special`] — Gamma, incomplete beta/gamma, normal quantile, t/F/χ² distributions
//! - [`stats`] — Compensated summation, variance, R-7 quantiles, skewness, kurtosis
//! - [`dataset`] — Row-oriented data model (`Value`, `Dataset`, `Variable`)
//! - [`descriptive`] — Per-column summaries for continuous, categorical, datetime and id variables
//! - [`temporal`] — Timestamp parsing and calendar bucketing
//! - [`normality`] — Jarque–Bera test
//! - [`testing`] — t-test, chi-square independence, one-way ANOVA with Bonferroni post-hoc
//! - [`regression`] — Simple linear regression
//! - [`interpretation`] — Effect-size bands and plain-language sentences
//! - [`binning`] — Histograms, box plots, grouping and contingency tables
//! - [`error`] — Error types
//!
//! ## Quick Start
//!
//! ```
//! use u_inference::dataset::{Dataset, Value};
//! use u_inference::testing::{t_test_by_group, TestConfig};
//!
//! let mut ds = Dataset::new(vec!["score".into(), "arm".into()]);
//! for (score, arm) in [(1.0, "a"), (2.0, "a"), (3.0, "a"), (4.0, "a"), (5.0, "a"),
//!                      (6.0, "b"), (7.0, "b"), (8.0, "b"), (9.0, "b"), (10.0, "b")] {
//!     ds.push_row(vec![Value::from(score), Value::from(arm)]).unwrap();
//! }
//!
//! let r = t_test_by_group(&ds, "score", "arm", &TestConfig::default()).unwrap();
//! assert_eq!(r.df, 8);
//! assert!((r.t_statistic.unwrap() + 5.0).abs() < 1e-12);
//! assert!(r.significant);
//! println!("{}", r.interpretation);
//! ```

pub mod binning;
pub mod dataset;
pub mod descriptive;
pub mod error;
pub mod interpretation;
pub mod normality;
pub mod regression;
pub mod special;
pub mod stats;
pub mod temporal;
pub mod testing;
