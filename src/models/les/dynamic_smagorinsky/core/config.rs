use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::support::{
    constraint::{Constraint, ConstraintError, NonNegative, StrictlyPositive},
    delta::Delta,
    filter::TestFilterKind,
};

use super::LocalAverage;

/// Model coefficients of the dynamic Smagorinsky closure.
///
/// Deserialized from a JSON object with `camelCase` keys. Only `filter` is
/// required:
///
/// ```
/// use twine_les::models::les::dynamic_smagorinsky::DynamicSmagorinskyConfig;
/// use twine_les::support::filter::TestFilterKind;
///
/// let config = DynamicSmagorinskyConfig::from_json(r#"{ "filter": "simple" }"#).unwrap();
/// assert_eq!(config.filter, TestFilterKind::Simple);
/// assert_eq!(config.filter_width_ratio, 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DynamicSmagorinskyConfig {
    /// Test filter.
    pub filter: TestFilterKind,

    /// Weighting of the coefficient neighbourhood average.
    #[serde(default)]
    pub local_average: LocalAverage,

    /// Grid filter width.
    #[serde(default)]
    pub delta: Delta,

    /// Ratio of test to grid filter width, `Δ̂ / Δ`.
    #[serde(default = "default_filter_width_ratio")]
    pub filter_width_ratio: f64,

    /// Lower bound for the SGS kinetic energy, in m²/s².
    #[serde(default)]
    pub k_min: f64,

    /// Coefficient ratios with a denominator at or below this magnitude are
    /// replaced by zero.
    #[serde(default = "default_denominator_floor")]
    pub denominator_floor: f64,

    /// Turbulent Prandtl number.
    #[serde(default = "default_prt")]
    pub prt: f64,
}

fn default_filter_width_ratio() -> f64 {
    2.0
}

fn default_denominator_floor() -> f64 {
    1e-30
}

fn default_prt() -> f64 {
    0.85
}

/// Errors that can occur while reading model coefficients.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The coefficients are malformed, miss a required entry, or name an
    /// unknown selection.
    #[error("invalid model coefficients: {0}")]
    Parse(#[from] serde_json::Error),

    /// An entry is out of range.
    #[error("invalid value for `{key}`")]
    Invalid {
        key: &'static str,
        #[source]
        source: ConstraintError,
    },
}

impl ConfigError {
    fn invalid(key: &'static str) -> impl FnOnce(ConstraintError) -> Self {
        move |source| Self::Invalid { key, source }
    }
}

impl DynamicSmagorinskyConfig {
    /// Creates a configuration with the given test filter and default
    /// values for everything else.
    #[must_use]
    pub fn new(filter: TestFilterKind) -> Self {
        Self {
            filter,
            local_average: LocalAverage::default(),
            delta: Delta::default(),
            filter_width_ratio: default_filter_width_ratio(),
            k_min: 0.0,
            denominator_floor: default_denominator_floor(),
            prt: default_prt(),
        }
    }

    /// Reads and validates coefficients from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the value cannot be deserialized or an
    /// entry is out of range.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let config = Self::deserialize(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates coefficients from JSON text.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the text cannot be deserialized or an
    /// entry is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every entry against its bound.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first entry out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = ConfigError::invalid;

        self.delta.validate().map_err(invalid("delta"))?;
        StrictlyPositive::check(&(self.filter_width_ratio - 1.0))
            .map_err(invalid("filterWidthRatio"))?;
        NonNegative::check(&self.k_min).map_err(invalid("kMin"))?;
        StrictlyPositive::check(&self.denominator_floor).map_err(invalid("denominatorFloor"))?;
        StrictlyPositive::check(&self.prt).map_err(invalid("prt"))?;

        Ok(())
    }

    /// Squared filter width ratio, `β = (Δ̂ / Δ)²`.
    #[must_use]
    pub fn beta(&self) -> f64 {
        self.filter_width_ratio.powi(2)
    }
}
