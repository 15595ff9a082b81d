//! Head-and-shoulders reversal detectors
//!
//! Three consecutive swing points (left shoulder, head, right shoulder) where
//! the head is the extreme of the three and the shoulders are level within a
//! relative tolerance. Triples are scanned in bar order and the first match
//! wins.

use std::collections::HashMap;

use super::helpers::{
    relative_diff, to_f64, trailing_window, HEAD_AND_SHOULDERS_WINDOW, SHOULDER_TOLERANCE,
};
use crate::{
    params::{get_period, get_ratio, ParamMeta, ParamType, ParameterizedDetector},
    swing::{self, SwingKind, SwingPoint, SWING_HALF_WIDTH},
    Direction, Pattern, PatternDetector, PatternError, PatternId, Period, Ratio, Result, OHLCV,
};

impl_with_defaults!(HeadAndShouldersDetector, InverseHeadAndShouldersDetector);

const CONFIDENCE_BASE: f64 = 0.7;
const CONFIDENCE_SYMMETRY_WEIGHT: f64 = 0.3;
const CONFIDENCE_CAP: f64 = 0.95;

/// Shoulder difference of the first qualifying (left, head, right) triple.
///
/// `kind` decides whether the head must be the highest or the lowest of the
/// three.
pub fn find_head_and_shoulders(
    swings: &[SwingPoint],
    kind: SwingKind,
    tolerance: f64,
) -> Option<f64> {
    swings.windows(3).find_map(|triple| {
        let (left, head, right) = (triple[0].price, triple[1].price, triple[2].price);

        let head_is_extreme = match kind {
            SwingKind::High => head > left && head > right,
            SwingKind::Low => head < left && head < right,
        };
        if !head_is_extreme {
            return None;
        }

        let shoulder_diff = relative_diff(to_f64(left), to_f64(right));
        (shoulder_diff <= tolerance).then_some(shoulder_diff)
    })
}

#[inline]
fn confidence(shoulder_diff: f64) -> f64 {
    (CONFIDENCE_BASE + CONFIDENCE_SYMMETRY_WEIGHT * (1.0 - shoulder_diff)).min(CONFIDENCE_CAP)
}

fn validate_window(window: Period) -> Result<()> {
    // 2 * half-width margin plus three swings
    let min = 2 * SWING_HALF_WIDTH + 3;
    if window.get() < min {
        return Err(PatternError::InvalidConfig(format!(
            "head-and-shoulders window {} is below {}",
            window.get(),
            min
        )));
    }
    Ok(())
}

// ============================================================
// HEAD AND SHOULDERS
// ============================================================

/// Head and Shoulders - bearish reversal on swing highs
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HeadAndShouldersDetector {
    pub window: Period,
    pub shoulder_tolerance: Ratio,
}

impl Default for HeadAndShouldersDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(HEAD_AND_SHOULDERS_WINDOW),
            shoulder_tolerance: Ratio::new_const(SHOULDER_TOLERANCE),
        }
    }
}

impl PatternDetector for HeadAndShouldersDetector {
    fn id(&self) -> PatternId {
        PatternId::HEAD_AND_SHOULDERS
    }

    fn min_bars(&self) -> usize {
        self.window.get()
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Pattern> {
        let recent = trailing_window(bars, self.window.get())?;
        let peaks = swing::extract(recent, SwingKind::High, SWING_HALF_WIDTH);

        let diff = find_head_and_shoulders(&peaks, SwingKind::High, self.shoulder_tolerance.get())?;

        Some(Pattern {
            id: PatternDetector::id(self),
            name: "Head and Shoulders",
            direction: Direction::Bearish,
            confidence: confidence(diff),
            description: "Reversal pattern signalling a bearish trend",
            breakout: false,
        })
    }

    fn validate_config(&self) -> Result<()> {
        validate_window(self.window)
    }
}

// ============================================================
// INVERSE HEAD AND SHOULDERS
// ============================================================

/// Inverse Head and Shoulders - bullish reversal on swing lows
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InverseHeadAndShouldersDetector {
    pub window: Period,
    pub shoulder_tolerance: Ratio,
}

impl Default for InverseHeadAndShouldersDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(HEAD_AND_SHOULDERS_WINDOW),
            shoulder_tolerance: Ratio::new_const(SHOULDER_TOLERANCE),
        }
    }
}

impl PatternDetector for InverseHeadAndShouldersDetector {
    fn id(&self) -> PatternId {
        PatternId::INVERSE_HEAD_AND_SHOULDERS
    }

    fn min_bars(&self) -> usize {
        self.window.get()
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Pattern> {
        let recent = trailing_window(bars, self.window.get())?;
        let troughs = swing::extract(recent, SwingKind::Low, SWING_HALF_WIDTH);

        let diff = find_head_and_shoulders(&troughs, SwingKind::Low, self.shoulder_tolerance.get())?;

        Some(Pattern {
            id: PatternDetector::id(self),
            name: "Inverse Head and Shoulders",
            direction: Direction::Bullish,
            confidence: confidence(diff),
            description: "Reversal pattern signalling a bullish trend",
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

static HEAD_AND_SHOULDERS_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "window",
        param_type: ParamType::Period,
        default: 20.0,
        range: (10.0, 60.0, 5.0),
        description: "Trailing bars searched for the pattern",
    },
    ParamMeta {
        name: "shoulder_tolerance",
        param_type: ParamType::Ratio,
        default: 0.03,
        range: (0.01, 0.06, 0.01),
        description: "Max relative difference between shoulders",
    },
];

impl ParameterizedDetector for HeadAndShouldersDetector {
    fn param_meta() -> &'static [ParamMeta] {
        HEAD_AND_SHOULDERS_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", HEAD_AND_SHOULDERS_WINDOW)?,
            shoulder_tolerance: get_ratio(params, "shoulder_tolerance", SHOULDER_TOLERANCE)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::HEAD_AND_SHOULDERS.as_str()
    }
}

impl ParameterizedDetector for InverseHeadAndShouldersDetector {
    fn param_meta() -> &'static [ParamMeta] {
        HEAD_AND_SHOULDERS_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", HEAD_AND_SHOULDERS_WINDOW)?,
            shoulder_tolerance: get_ratio(params, "shoulder_tolerance", SHOULDER_TOLERANCE)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::INVERSE_HEAD_AND_SHOULDERS.as_str()
    }
}
