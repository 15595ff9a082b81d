//! Triangle detectors
//!
//! Fit a least-squares line through the highs and another through the lows of
//! the trailing window and classify the pair of slopes. The thresholds are the
//! only boundary between the three classes.
//!
//! Note: with the default thresholds the symmetrical triangle cannot fire. A
//! high slope below `-flat_slope` and a low slope above `flat_slope` are always
//! more than `2 * flat_slope` apart, which already exceeds the default
//! `convergence`. Converging windows are reported as both ascending and
//! descending instead.

use std::collections::HashMap;

use super::helpers::{
    regression_slope, trailing_window, COMBINED_SLOPE_SATURATION, CONVERGENCE_TOLERANCE,
    FLAT_SLOPE, SLOPE_SATURATION, TRIANGLE_WINDOW,
};
use crate::{
    params::{get_period, get_ratio, ParamMeta, ParamType, ParameterizedDetector},
    Direction, Pattern, PatternDetector, PatternError, PatternId, Period, PriceField, Ratio,
    Result, OHLCV,
};

impl_with_defaults!(
    AscendingTriangleDetector,
    DescendingTriangleDetector,
    SymmetricalTriangleDetector,
);

/// Slopes of the upper (highs) and lower (lows) boundaries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundarySlopes {
    pub high: f64,
    pub low: f64,
}

impl BoundarySlopes {
    pub fn of<T: OHLCV>(bars: &[T]) -> Self {
        Self {
            high: regression_slope(bars, PriceField::High),
            low: regression_slope(bars, PriceField::Low),
        }
    }
}

/// Slopes over the trailing `window` bars, if that many exist.
fn trailing_slopes<T: OHLCV>(bars: &[T], window: Period) -> Option<BoundarySlopes> {
    trailing_window(bars, window.get()).map(BoundarySlopes::of)
}

fn validate_window(window: Period) -> Result<()> {
    if window.get() < 2 {
        return Err(PatternError::InvalidConfig(format!(
            "triangle window {} is too short for a regression",
            window.get()
        )));
    }
    Ok(())
}

/// `floor + span * min(magnitude, saturation) / saturation`, capped at `cap`
#[inline]
fn saturating_score(floor: f64, span: f64, magnitude: f64, saturation: f64, cap: f64) -> f64 {
    (floor + span * magnitude.min(saturation) / saturation).min(cap)
}

// ============================================================
// ASCENDING TRIANGLE
// ============================================================

/// Ascending Triangle - flat top, rising bottom (bullish)
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AscendingTriangleDetector {
    pub window: Period,
    pub flat_slope: Ratio,
}

impl Default for AscendingTriangleDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(TRIANGLE_WINDOW),
            flat_slope: Ratio::new_const(FLAT_SLOPE),
        }
    }
}

impl PatternDetector for AscendingTriangleDetector {
    fn id(&self) -> PatternId {
        PatternId::ASCENDING_TRIANGLE
    }

    fn min_bars(&self) -> usize {
        self.window.get()
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Pattern> {
        let slopes = trailing_slopes(bars, self.window)?;
        let flat = self.flat_slope.get();

        if !(slopes.high < flat && slopes.low > flat) {
            return None;
        }

        Some(Pattern {
            id: PatternDetector::id(self),
            name: "Ascending Triangle",
            direction: Direction::Bullish,
            confidence: saturating_score(0.6, 0.4, slopes.low.abs(), SLOPE_SATURATION, 0.9),
            description: "Continuation pattern with a bullish breakout bias",
            breakout: false,
        })
    }

    fn validate_config(&self) -> Result<()> {
        validate_window(self.window)
    }
}

// ============================================================
// DESCENDING TRIANGLE
// ============================================================

/// Descending Triangle - flat bottom, falling top (bearish)
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DescendingTriangleDetector {
    pub window: Period,
    pub flat_slope: Ratio,
}

impl Default for DescendingTriangleDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(TRIANGLE_WINDOW),
            flat_slope: Ratio::new_const(FLAT_SLOPE),
        }
    }
}

impl PatternDetector for DescendingTriangleDetector {
    fn id(&self) -> PatternId {
        PatternId::DESCENDING_TRIANGLE
    }

    fn min_bars(&self) -> usize {
        self.window.get()
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Pattern> {
        let slopes = trailing_slopes(bars, self.window)?;
        let flat = self.flat_slope.get();

        if !(slopes.low > -flat && slopes.high < -flat) {
            return None;
        }

        Some(Pattern {
            id: PatternDetector::id(self),
            name: "Descending Triangle",
            direction: Direction::Bearish,
            confidence: saturating_score(0.6, 0.4, slopes.high.abs(), SLOPE_SATURATION, 0.9),
            description: "Continuation pattern with a bearish breakout bias",
            breakout: false,
        })
    }

    fn validate_config(&self) -> Result<()> {
        validate_window(self.window)
    }
}

// ============================================================
// SYMMETRICAL TRIANGLE
// ============================================================

/// Symmetrical Triangle - converging boundaries of similar steepness
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SymmetricalTriangleDetector {
    pub window: Period,
    pub flat_slope: Ratio,
    /// Max `|high_slope - low_slope|`
    pub convergence: Ratio,
}

impl Default for SymmetricalTriangleDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(TRIANGLE_WINDOW),
            flat_slope: Ratio::new_const(FLAT_SLOPE),
            convergence: Ratio::new_const(CONVERGENCE_TOLERANCE),
        }
    }
}

impl SymmetricalTriangleDetector {
    fn matches(&self, slopes: BoundarySlopes) -> bool {
        let flat = self.flat_slope.get();
        slopes.high < -flat
            && slopes.low > flat
            && (slopes.high - slopes.low).abs() < self.convergence.get()
    }
}

impl PatternDetector for SymmetricalTriangleDetector {
    fn id(&self) -> PatternId {
        PatternId::SYMMETRICAL_TRIANGLE
    }

    fn min_bars(&self) -> usize {
        self.window.get()
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Pattern> {
        let slopes = trailing_slopes(bars, self.window)?;
        if !self.matches(slopes) {
            return None;
        }

        let combined = slopes.high.abs() + slopes.low.abs();
        Some(Pattern {
            id: PatternDetector::id(self),
            name: "Symmetrical Triangle",
            direction: Direction::Continuation,
            confidence: saturating_score(0.5, 0.5, combined, COMBINED_SLOPE_SATURATION, 0.85),
            description: "Consolidation pattern, breakout decides the direction",
            breakout: false,
        })
    }

    fn validate_config(&self) -> Result<()> {
        validate_window(self.window)
    }
}

// ============================================================
// PARAMETERS
// ============================================================

static TRIANGLE_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "window",
        param_type: ParamType::Period,
        default: 10.0,
        range: (5.0, 30.0, 5.0),
        description: "Trailing bars used for the boundary regressions",
    },
    ParamMeta {
        name: "flat_slope",
        param_type: ParamType::Ratio,
        default: 0.001,
        range: (0.0005, 0.005, 0.0005),
        description: "Slope magnitude treated as flat",
    },
];

static SYMMETRICAL_TRIANGLE_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "window",
        param_type: ParamType::Period,
        default: 10.0,
        range: (5.0, 30.0, 5.0),
        description: "Trailing bars used for the boundary regressions",
    },
    ParamMeta {
        name: "flat_slope",
        param_type: ParamType::Ratio,
        default: 0.001,
        range: (0.0005, 0.005, 0.0005),
        description: "Slope magnitude treated as flat",
    },
    ParamMeta {
        name: "convergence",
        param_type: ParamType::Ratio,
        default: 0.002,
        range: (0.001, 0.02, 0.001),
        description: "Max difference between the boundary slopes",
    },
];

impl ParameterizedDetector for AscendingTriangleDetector {
    fn param_meta() -> &'static [ParamMeta] {
        TRIANGLE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", TRIANGLE_WINDOW)?,
            flat_slope: get_ratio(params, "flat_slope", FLAT_SLOPE)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::ASCENDING_TRIANGLE.as_str()
    }
}

impl ParameterizedDetector for DescendingTriangleDetector {
    fn param_meta() -> &'static [ParamMeta] {
        TRIANGLE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", TRIANGLE_WINDOW)?,
            flat_slope: get_ratio(params, "flat_slope", FLAT_SLOPE)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::DESCENDING_TRIANGLE.as_str()
    }
}

impl ParameterizedDetector for SymmetricalTriangleDetector {
    fn param_meta() -> &'static [ParamMeta] {
        SYMMETRICAL_TRIANGLE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", TRIANGLE_WINDOW)?,
            flat_slope: get_ratio(params, "flat_slope", FLAT_SLOPE)?,
            convergence: get_ratio(params, "convergence", CONVERGENCE_TOLERANCE)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::SYMMETRICAL_TRIANGLE.as_str()
    }
}
