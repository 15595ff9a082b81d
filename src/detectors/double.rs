//! Double top / double bottom detectors
//!
//! Any two swing points of the same kind at nearly the same price. Pairs are
//! scanned in nested-loop order `(i, j > i)` and the first pair within
//! tolerance is reported, not the closest one.

use std::collections::HashMap;

use super::helpers::{
    relative_diff, to_f64, trailing_window, DOUBLE_EXTREMUM_TOLERANCE, DOUBLE_EXTREMUM_WINDOW,
};
use crate::{
    params::{get_period, get_ratio, ParamMeta, ParamType, ParameterizedDetector},
    swing::{self, SwingKind, SwingPoint, SWING_HALF_WIDTH},
    Direction, Pattern, PatternDetector, PatternError, PatternId, Period, Ratio, Result, OHLCV,
};

impl_with_defaults!(DoubleTopDetector, DoubleBottomDetector);

const CONFIDENCE_SCALE: f64 = 0.8;

/// Relative difference of the first pair of swings within `tolerance`.
pub fn find_matching_pair(swings: &[SwingPoint], tolerance: f64) -> Option<f64> {
    swings.iter().enumerate().find_map(|(i, first)| {
        swings[i + 1..].iter().find_map(|second| {
            let diff = relative_diff(to_f64(first.price), to_f64(second.price));
            (diff <= tolerance).then_some(diff)
        })
    })
}

fn validate_window(window: Period) -> Result<()> {
    let min = 2 * SWING_HALF_WIDTH + 2;
    if window.get() < min {
        return Err(PatternError::InvalidConfig(format!(
            "double top/bottom window {} is below {}",
            window.get(),
            min
        )));
    }
    Ok(())
}

// ============================================================
// DOUBLE TOP
// ============================================================

/// Double Top - two swing highs at the same level (bearish)
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DoubleTopDetector {
    pub window: Period,
    pub tolerance: Ratio,
}

impl Default for DoubleTopDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(DOUBLE_EXTREMUM_WINDOW),
            tolerance: Ratio::new_const(DOUBLE_EXTREMUM_TOLERANCE),
        }
    }
}

impl PatternDetector for DoubleTopDetector {
    fn id(&self) -> PatternId {
        PatternId::DOUBLE_TOP
    }

    fn min_bars(&self) -> usize {
        self.window.get()
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Pattern> {
        let recent = trailing_window(bars, self.window.get())?;
        let peaks = swing::extract(recent, SwingKind::High, SWING_HALF_WIDTH);
        let diff = find_matching_pair(&peaks, self.tolerance.get())?;

        Some(Pattern {
            id: PatternDetector::id(self),
            name: "Double Top",
            direction: Direction::Bearish,
            confidence: CONFIDENCE_SCALE * (1.0 - diff),
            description: "Reversal pattern marking strong resistance",
            breakout: false,
        })
    }

    fn validate_config(&self) -> Result<()> {
        validate_window(self.window)
    }
}

// ============================================================
// DOUBLE BOTTOM
// ============================================================

/// Double Bottom - two swing lows at the same level (bullish)
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DoubleBottomDetector {
    pub window: Period,
    pub tolerance: Ratio,
}

impl Default for DoubleBottomDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(DOUBLE_EXTREMUM_WINDOW),
            tolerance: Ratio::new_const(DOUBLE_EXTREMUM_TOLERANCE),
        }
    }
}

impl PatternDetector for DoubleBottomDetector {
    fn id(&self) -> PatternId {
        PatternId::DOUBLE_BOTTOM
    }

    fn min_bars(&self) -> usize {
        self.window.get()
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Pattern> {
        let recent = trailing_window(bars, self.window.get())?;
        let troughs = swing::extract(recent, SwingKind::Low, SWING_HALF_WIDTH);
        let diff = find_matching_pair(&troughs, self.tolerance.get())?;

        Some(Pattern {
            id: PatternDetector::id(self),
            name: "Double Bottom",
            direction: Direction::Bullish,
            confidence: CONFIDENCE_SCALE * (1.0 - diff),
            description: "Reversal pattern marking strong support",
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

static DOUBLE_EXTREMUM_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "window",
        param_type: ParamType::Period,
        default: 15.0,
        range: (10.0, 40.0, 5.0),
        description: "Trailing bars searched for the pattern",
    },
    ParamMeta {
        name: "tolerance",
        param_type: ParamType::Ratio,
        default: 0.02,
        range: (0.005, 0.04, 0.005),
        description: "Max relative difference between the two extremes",
    },
];

impl ParameterizedDetector for DoubleTopDetector {
    fn param_meta() -> &'static [ParamMeta] {
        DOUBLE_EXTREMUM_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", DOUBLE_EXTREMUM_WINDOW)?,
            tolerance: get_ratio(params, "tolerance", DOUBLE_EXTREMUM_TOLERANCE)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::DOUBLE_TOP.as_str()
    }
}

impl ParameterizedDetector for DoubleBottomDetector {
    fn param_meta() -> &'static [ParamMeta] {
        DOUBLE_EXTREMUM_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", DOUBLE_EXTREMUM_WINDOW)?,
            tolerance: get_ratio(params, "tolerance", DOUBLE_EXTREMUM_TOLERANCE)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::DOUBLE_BOTTOM.as_str()
    }
}
