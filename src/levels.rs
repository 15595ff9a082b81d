//! Horizontal support and resistance levels
//!
//! Swing highs are clustered into resistance zones, swing lows into support
//! zones. Zones touched at least `min_touches` times are ranked by touch count
//! and the strongest `max_levels` are returned.

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;

use crate::{
    cluster::{LevelClusterer, DEFAULT_CLUSTER_TOLERANCE, MIN_CLUSTER_MEMBERS},
    params::{get_decimal, get_period, ParamMeta, ParamType, ParameterizedDetector},
    swing::{self, SwingPoint, SWING_HALF_WIDTH},
    PatternError, Period, Result, OHLCV,
};

/// Default number of levels returned
pub const DEFAULT_MAX_LEVELS: usize = 5;

/// Side of the market a level was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelType {
    Support,
    Resistance,
}

impl LevelType {
    pub fn as_str(self) -> &'static str {
        match self {
            LevelType::Support => "support",
            LevelType::Resistance => "resistance",
        }
    }
}

impl fmt::Display for LevelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked price zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SupportResistanceLevel {
    /// Mean of the swing prices in the zone
    pub price: Decimal,
    /// Ranking key; always equal to `touches`
    pub strength: usize,
    pub level_type: LevelType,
    pub touches: usize,
}

impl fmt::Display for SupportResistanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: ${:.4} (Strength: {} touches)",
            self.level_type.as_str().to_uppercase(),
            self.price,
            self.touches
        )
    }
}

// ============================================================
// DETECTOR
// ============================================================

/// Support/resistance detector
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SupportResistanceDetector {
    /// Neighbours compared on each side of a swing candidate
    pub swing_width: Period,
    /// Relative distance for a swing to join a zone
    pub tolerance: Decimal,
    pub min_touches: Period,
    pub max_levels: Period,
}

impl Default for SupportResistanceDetector {
    fn default() -> Self {
        Self {
            swing_width: Period::new_const(SWING_HALF_WIDTH),
            tolerance: DEFAULT_CLUSTER_TOLERANCE,
            min_touches: Period::new_const(MIN_CLUSTER_MEMBERS),
            max_levels: Period::new_const(DEFAULT_MAX_LEVELS),
        }
    }
}

impl SupportResistanceDetector {
    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn validate_config(&self) -> Result<()> {
        if self.tolerance.is_sign_negative() || self.tolerance > Decimal::ONE {
            return Err(PatternError::InvalidConfig(format!(
                "tolerance {} outside [0, 1]",
                self.tolerance
            )));
        }
        Ok(())
    }

    fn clusterer(&self) -> LevelClusterer {
        LevelClusterer {
            tolerance: self.tolerance,
            min_members: self.min_touches.get(),
        }
    }

    fn zones(&self, swings: &[SwingPoint], level_type: LevelType) -> Vec<SupportResistanceLevel> {
        let prices: Vec<Decimal> = swings.iter().map(|s| s.price).collect();

        self.clusterer()
            .cluster(&prices)
            .into_iter()
            .filter(|c| c.count() >= self.min_touches.get())
            .map(|c| SupportResistanceLevel {
                price: c.price,
                strength: c.count(),
                level_type,
                touches: c.count(),
            })
            .collect()
    }

    /// Detect levels, strongest first.
    ///
    /// Ties keep resistance zones ahead of support zones, each in ascending
    /// price order.
    pub fn detect<T: OHLCV>(&self, bars: &[T]) -> Vec<SupportResistanceLevel> {
        let (highs, lows) = swing::extract_both(bars, self.swing_width.get());

        let mut levels = self.zones(&highs, LevelType::Resistance);
        levels.extend(self.zones(&lows, LevelType::Support));

        // stable
        levels.sort_by(|a, b| b.strength.cmp(&a.strength));
        levels.truncate(self.max_levels.get());

        tracing::debug!(
            bars = bars.len(),
            swing_highs = highs.len(),
            swing_lows = lows.len(),
            levels = levels.len(),
            "support/resistance detection complete"
        );

        levels
    }
}

// ============================================================
// PARAMETERS
// ============================================================

static SUPPORT_RESISTANCE_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "swing_width",
        param_type: ParamType::Period,
        default: 2.0,
        range: (1.0, 5.0, 1.0),
        description: "Neighbours on each side a swing must exceed",
    },
    ParamMeta {
        name: "tolerance",
        param_type: ParamType::Ratio,
        default: 0.02,
        range: (0.005, 0.05, 0.005),
        description: "Relative distance for a swing to join a zone",
    },
    ParamMeta {
        name: "min_touches",
        param_type: ParamType::Period,
        default: 2.0,
        range: (2.0, 5.0, 1.0),
        description: "Minimum swings in a zone",
    },
    ParamMeta {
        name: "max_levels",
        param_type: ParamType::Period,
        default: 5.0,
        range: (1.0, 10.0, 1.0),
        description: "Number of levels returned",
    },
];

impl ParameterizedDetector for SupportResistanceDetector {
    fn param_meta() -> &'static [ParamMeta] {
        SUPPORT_RESISTANCE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let detector = Self {
            swing_width: get_period(params, "swing_width", SWING_HALF_WIDTH)?,
            tolerance: get_decimal(params, "tolerance", 0.02)?,
            min_touches: get_period(params, "min_touches", MIN_CLUSTER_MEMBERS)?,
            max_levels: get_period(params, "max_levels", DEFAULT_MAX_LEVELS)?,
        };
        detector.validate_config()?;
        Ok(detector)
    }

    fn pattern_id_str() -> &'static str {
        "SUPPORT_RESISTANCE"
    }
}
