//! Parameter metadata for detectors
//!
//! Every detector threshold is exposed as a named parameter with a default
//! and a search range, so detectors can be:
//! - built from a plain `HashMap` of values (missing keys fall back to defaults)
//! - swept over a grid during calibration
//! - documented from their metadata
//!
//! # Example
//!
//! ```rust
//! use chartgeo::params::{ParamMeta, ParamType, ParameterizedDetector};
//! use chartgeo::prelude::*;
//!
//! for param in DoubleTopDetector::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//! ```

use std::collections::HashMap;

use rust_decimal::{prelude::FromPrimitive, Decimal};

use crate::{PatternError, Period, Ratio, Result};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Fractional threshold or tolerance in 0.0..=1.0
  Ratio,
  /// Bar count (positive integer)
  Period,
}

/// Metadata for a single detector parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "shoulder_tolerance")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Range for calibration: (min, max, step)
  pub range: (f64, f64, f64),
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  /// All values in `range`, inclusive of both ends
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    if step <= 0.0 {
      return vec![min];
    }
    let steps = ((max - min) / step + 1e-9).floor() as usize;
    (0..=steps).map(|k| min + step * k as f64).collect()
  }

  /// Check a value against the range and type of this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value < min || value > max {
      return Err(PatternError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Ratio => Ratio::new(value).map(|_| ()),
      ParamType::Period => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(PatternError::InvalidValue("Period must be a positive integer"));
        }
        Ok(())
      },
    }
  }
}

// ============================================================
// PARAMETERIZED DETECTOR TRAIT
// ============================================================

/// Detectors that can be built from named parameter values
pub trait ParameterizedDetector: Sized {
  /// Metadata for all configurable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Build a detector; missing parameters use their defaults.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

  fn pattern_id_str() -> &'static str;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
  let value = params.get(key).copied().unwrap_or(default);
  Ratio::new(value)
}

pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
  let value = params.get(key).copied().unwrap_or(default as f64);
  if value < 0.0 || value.fract() != 0.0 {
    return Err(PatternError::InvalidValue("Period must be a positive integer"));
  }
  Period::new(value as usize)
}

/// Decimal-valued parameter (price tolerances compared in exact arithmetic)
pub fn get_decimal(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Decimal> {
  let value = params.get(key).copied().unwrap_or(default);
  Decimal::from_f64(value).ok_or(PatternError::InvalidValue("Decimal parameter must be finite"))
}

// ============================================================
// TESTS
// ============================================================
