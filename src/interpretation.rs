//! Effect-size bands and plain-language interpretation sentences.
//!
//! Cut points (on absolute values):
//!
//! | Measure      | Bands                                                     |
//! |--------------|-----------------------------------------------------------|
//! | Cohen's d    | < 0.2 negligible, < 0.5 small, < 0.8 medium, else large   |
//! | Cramér's V   | < 0.1 weak, < 0.3 moderate, else strong                   |
//! | eta-squared  | < 0.01 small, < 0.06 medium, else large                   |
//! | R²           | < 0.02 negligible, < 0.13 small, < 0.26 medium, else large|
//!
//! ```
//! use u_inference::interpretation::{cohens_d_band, format_stat, EffectMagnitude};
//!
//! assert_eq!(cohens_d_band(-0.65), EffectMagnitude::Medium);
//! assert_eq!(format_stat(None, 3), "N/A");
//! assert_eq!(format_stat(Some(0.12345), 3), "0.123");
//! ```

use std::fmt;

use serde::Serialize;

/// Rendering of a not-computable statistic.
pub const NOT_AVAILABLE: &str = "N/A";

/// Size of a standardized effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectMagnitude {
    Negligible,
    Small,
    Medium,
    Large,
}

impl fmt::Display for EffectMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Negligible => "negligible",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        })
    }
}

/// Strength of an association between categorical variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssociationStrength {
    Weak,
    Moderate,
    Strong,
}

impl fmt::Display for AssociationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Weak => "weak",
            Self::Moderate => "moderate",
            Self::Strong => "strong",
        })
    }
}

// ── Bands ─────────────────────────────────────────────────────────────

/// Band for Cohen's d.
pub fn cohens_d_band(d: f64) -> EffectMagnitude {
    let d = d.abs();
    if d < 0.2 {
        EffectMagnitude::Negligible
    } else if d < 0.5 {
        EffectMagnitude::Small
    } else if d < 0.8 {
        EffectMagnitude::Medium
    } else {
        EffectMagnitude::Large
    }
}

/// Band for Cramér's V.
pub fn cramers_v_band(v: f64) -> AssociationStrength {
    let v = v.abs();
    if v < 0.1 {
        AssociationStrength::Weak
    } else if v < 0.3 {
        AssociationStrength::Moderate
    } else {
        AssociationStrength::Strong
    }
}

/// Band for eta-squared.
pub fn eta_squared_band(eta_squared: f64) -> EffectMagnitude {
    let e = eta_squared.abs();
    if e < 0.01 {
        EffectMagnitude::Small
    } else if e < 0.06 {
        EffectMagnitude::Medium
    } else {
        EffectMagnitude::Large
    }
}

/// Band for a regression R² (Cohen's f² thresholds expressed as R²).
pub fn r_squared_band(r_squared: f64) -> EffectMagnitude {
    let r = r_squared.abs();
    if r < 0.02 {
        EffectMagnitude::Negligible
    } else if r < 0.13 {
        EffectMagnitude::Small
    } else if r < 0.26 {
        EffectMagnitude::Medium
    } else {
        EffectMagnitude::Large
    }
}

// ── Formatting ────────────────────────────────────────────────────────

/// Formats a statistic with `decimals` places, or `"N/A"`.
pub fn format_stat(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Formats a p-value as `"p < 0.001"` or `"p = 0.042"`.
pub fn format_p(p: Option<f64>) -> String {
    match p {
        Some(p) if p.is_finite() && p < 0.001 => "p < 0.001".to_string(),
        Some(p) if p.is_finite() => format!("p = {p:.3}"),
        _ => format!("p = {NOT_AVAILABLE}"),
    }
}

/// Significance statement against an explicit threshold.
///
/// ```
/// use u_inference::interpretation::significance_statement;
///
/// assert_eq!(
///     significance_statement(Some(0.01), 0.05),
///     "statistically significant (p = 0.010 < 0.05)"
/// );
/// assert_eq!(
///     significance_statement(Some(0.2), 0.05),
///     "not statistically significant (p = 0.200 ≥ 0.05)"
/// );
/// ```
///
/// Thresholds below 0.001 print small p-values in scientific notation so the
/// comparison stays readable.
pub fn significance_statement(p: Option<f64>, alpha: f64) -> String {
    let shown = match p {
        Some(pv) if alpha < 0.001 && pv == 0.0 => "p = 0".to_string(),
        Some(pv) if alpha < 0.001 && pv.is_finite() && pv < 0.001 => format!("p = {pv:.2e}"),
        _ => format_p(p),
    };
    match p {
        Some(pv) if pv.is_finite() && pv < alpha => {
            format!("statistically significant ({shown} < {alpha})")
        }
        Some(pv) if pv.is_finite() => {
            format!("not statistically significant ({shown} ≥ {alpha})")
        }
        _ => "of undetermined significance (p-value not computable)".to_string(),
    }
}

// ── Sentences ─────────────────────────────────────────────────────────

/// Interpretation of a two-sample t-test.
pub fn t_test_sentence(
    group1: &str,
    group2: &str,
    p: Option<f64>,
    cohens_d: Option<f64>,
    alpha: f64,
) -> String {
    let effect = match cohens_d {
        Some(d) => format!(
            "a {} effect size (Cohen's d = {})",
            cohens_d_band(d),
            format_stat(Some(d), 2)
        ),
        None => "an effect size that could not be computed".to_string(),
    };
    format!(
        "The difference in means between {group1} and {group2} is {}, with {effect}.",
        significance_statement(p, alpha)
    )
}

/// Interpretation of a chi-square test of independence.
pub fn chi_square_sentence(
    row_variable: &str,
    column_variable: &str,
    p: Option<f64>,
    cramers_v: Option<f64>,
    alpha: f64,
) -> String {
    let effect = match cramers_v {
        Some(v) => format!(
            "a {} association (Cramér's V = {})",
            cramers_v_band(v),
            format_stat(Some(v), 2)
        ),
        None => "an association strength that could not be computed".to_string(),
    };
    format!(
        "The association between {row_variable} and {column_variable} is {}, indicating {effect}.",
        significance_statement(p, alpha)
    )
}

/// Interpretation of a one-way ANOVA.
///
/// Without a named grouping variable the sentence reads "across groups".
pub fn anova_sentence(
    outcome: &str,
    group_variable: Option<&str>,
    p: Option<f64>,
    eta_squared: Option<f64>,
    alpha: f64,
) -> String {
    let effect = match eta_squared {
        Some(e) => format!(
            "a {} effect size (η² = {})",
            eta_squared_band(e),
            format_stat(Some(e), 3)
        ),
        None => "an effect size that could not be computed".to_string(),
    };
    let groups = match group_variable {
        Some(g) => format!("{g} groups"),
        None => "groups".to_string(),
    };
    format!(
        "Differences in {outcome} across {groups} are {}, with {effect}.",
        significance_statement(p, alpha)
    )
}

/// Interpretation of a simple linear regression.
pub fn regression_sentence(
    outcome: &str,
    predictor: &str,
    slope: Option<f64>,
    p: Option<f64>,
    r_squared: Option<f64>,
    alpha: f64,
) -> String {
    let direction = match slope {
        Some(s) if s > 0.0 => format!(
            "Each unit increase in {predictor} is associated with a {} unit increase in {outcome}",
            format_stat(Some(s), 3)
        ),
        Some(s) if s < 0.0 => format!(
            "Each unit increase in {predictor} is associated with a {} unit decrease in {outcome}",
            format_stat(Some(s.abs()), 3)
        ),
        Some(_) => format!("{predictor} shows no linear change in {outcome}"),
        None => format!("The slope of {outcome} on {predictor} could not be computed"),
    };
    let fit = match r_squared {
        Some(r2) => format!(
            "R² = {} ({} effect)",
            format_stat(Some(r2), 3),
            r_squared_band(r2)
        ),
        None => format!("R² = {NOT_AVAILABLE}"),
    };
    format!(
        "{direction}; the relationship is {} and {fit}.",
        significance_statement(p, alpha)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cohens_d_cut_points() {
        assert_eq!(cohens_d_band(0.0), EffectMagnitude::Negligible);
        assert_eq!(cohens_d_band(0.19), EffectMagnitude::Negligible);
        assert_eq!(cohens_d_band(0.2), EffectMagnitude::Small);
        assert_eq!(cohens_d_band(0.5), EffectMagnitude::Medium);
        assert_eq!(cohens_d_band(0.8), EffectMagnitude::Large);
        assert_eq!(cohens_d_band(-3.16), EffectMagnitude::Large);
    }

    #[test]
    fn cramers_v_cut_points() {
        assert_eq!(cramers_v_band(0.05), AssociationStrength::Weak);
        assert_eq!(cramers_v_band(0.1), AssociationStrength::Moderate);
        assert_eq!(cramers_v_band(0.3), AssociationStrength::Strong);
        assert_eq!(cramers_v_band(1.0), AssociationStrength::Strong);
    }

    #[test]
    fn eta_squared_cut_points() {
        assert_eq!(eta_squared_band(0.005), EffectMagnitude::Small);
        assert_eq!(eta_squared_band(0.01), EffectMagnitude::Medium);
        assert_eq!(eta_squared_band(0.06), EffectMagnitude::Large);
    }

    #[test]
    fn r_squared_cut_points() {
        assert_eq!(r_squared_band(0.01), EffectMagnitude::Negligible);
        assert_eq!(r_squared_band(0.1), EffectMagnitude::Small);
        assert_eq!(r_squared_band(0.2), EffectMagnitude::Medium);
        assert_eq!(r_squared_band(0.9), EffectMagnitude::Large);
    }

    #[test]
    fn formatting() {
        assert_eq!(format_stat(Some(2.0), 2), "2.00");
        assert_eq!(format_stat(Some(f64::NAN), 2), "N/A");
        assert_eq!(format_p(Some(0.0004)), "p < 0.001");
        assert_eq!(format_p(Some(0.0421)), "p = 0.042");
        assert_eq!(format_p(None), "p = N/A");
    }

    #[test]
    fn significance_without_p() {
        assert!(significance_statement(None, 0.05).contains("not computable"));
    }

    #[test]
    fn significance_below_thousandth_threshold() {
        assert_eq!(
            significance_statement(Some(0.0008), 0.0005),
            "not statistically significant (p = 8.00e-4 ≥ 0.0005)"
        );
        assert_eq!(
            significance_statement(Some(0.0002), 0.0005),
            "statistically significant (p = 2.00e-4 < 0.0005)"
        );
        assert_eq!(
            significance_statement(Some(0.0), 0.0001),
            "statistically significant (p = 0 < 0.0001)"
        );
        assert!(significance_statement(Some(0.0004), 0.01).contains("p < 0.001 < 0.01"));
    }

    #[test]
    fn t_test_sentence_mentions_threshold_and_band() {
        let s = t_test_sentence("A", "B", Some(0.0005), Some(-3.16), 0.05);
        assert!(s.contains("statistically significant (p < 0.001 < 0.05)"), "{s}");
        assert!(s.contains("large effect size"), "{s}");
        assert!(s.contains("-3.16"), "{s}");
    }

    #[test]
    fn sentences_handle_missing_effects() {
        let s = chi_square_sentence("x", "y", Some(0.5), None, 0.05);
        assert!(s.contains("not statistically significant"));
        assert!(s.contains("could not be computed"));

        let s = anova_sentence("score", Some("arm"), Some(0.0), Some(1.0), 0.05);
        assert!(s.contains("large effect size (η² = 1.000)"), "{s}");
        assert!(s.contains("across arm groups"), "{s}");

        let s = anova_sentence("the outcome", None, Some(0.2), Some(0.01), 0.05);
        assert!(s.starts_with("Differences in the outcome across groups are not"), "{s}");

        let s = regression_sentence("y", "x", Some(-2.0), Some(0.01), Some(0.5), 0.05);
        assert!(s.contains("2.000 unit decrease in y"), "{s}");
        assert!(s.contains("large effect"), "{s}");
    }
}
