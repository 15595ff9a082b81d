//! Common helpers for chart pattern detection
//!
//! Window sizes, thresholds and the regression slope shared by the detector
//! modules.

use rust_decimal::{prelude::ToPrimitive, Decimal};

use crate::{OHLCVExt, PriceField, OHLCV};

// ============================================================
// WINDOWS
// ============================================================

/// Trailing bars inspected by the head-and-shoulders family
pub const HEAD_AND_SHOULDERS_WINDOW: usize = 20;
/// Trailing bars inspected by double top/bottom
pub const DOUBLE_EXTREMUM_WINDOW: usize = 15;
/// Trailing bars inspected by the triangle family
pub const TRIANGLE_WINDOW: usize = 10;

// ============================================================
// THRESHOLDS
// ============================================================

/// Max relative difference between the two shoulders
pub const SHOULDER_TOLERANCE: f64 = 0.03;
/// Max relative difference between the two peaks/troughs
pub const DOUBLE_EXTREMUM_TOLERANCE: f64 = 0.02;
/// Slope magnitude below which a boundary counts as flat
pub const FLAT_SLOPE: f64 = 0.001;
/// Max gap between the two boundary slopes of a symmetrical triangle
pub const CONVERGENCE_TOLERANCE: f64 = 0.002;
/// Slope at which a single-boundary triangle score saturates
pub const SLOPE_SATURATION: f64 = 0.01;
/// Combined slope at which the symmetrical triangle score saturates
pub const COMBINED_SLOPE_SATURATION: f64 = 0.02;

// ============================================================
// HELPER FUNCTIONS
// ============================================================

/// The last `len` bars, or `None` when fewer are available.
#[inline]
pub fn trailing_window<T>(bars: &[T], len: usize) -> Option<&[T]> {
    bars.len().checked_sub(len).map(|start| &bars[start..])
}

/// Lossy conversion; NaN if the value does not fit.
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// `|a - b| / max(a, b)`
#[inline]
pub fn relative_diff(a: f64, b: f64) -> f64 {
    (a - b).abs() / a.max(b)
}

/// Ordinary least squares slope of `field` against bar index `0..n`.
///
/// Requires at least two bars; fewer yields NaN.
pub fn regression_slope<T: OHLCV>(bars: &[T], field: PriceField) -> f64 {
    let n = bars.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_x2) = bars.iter().enumerate().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sx2), (i, bar)| {
            let x = i as f64;
            let y = to_f64(bar.price(field));
            (sx + x, sy + y, sxy + x * y, sx2 + x * x)
        },
    );

    (n * sum_xy - sum_x * sum_y) / (n * sum_x2 - sum_x * sum_x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candle;
    use rust_decimal_macros::dec;

    fn line(start: Decimal, step: Decimal, n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let p = start + step * Decimal::from(i);
                Candle::new(i as i64, p, p + dec!(1), p - dec!(1), p, dec!(1))
            })
            .collect()
    }

    #[test]
    fn test_trailing_window() {
        let v = [1, 2, 3, 4, 5];
        assert_eq!(trailing_window(&v, 3), Some(&v[2..]));
        assert_eq!(trailing_window(&v, 5), Some(&v[..]));
        assert_eq!(trailing_window(&v, 6), None);
    }

    #[test]
    fn test_slope_of_line() {
        let bars = line(dec!(100), dec!(0.5), 10);
        assert!((regression_slope(&bars, PriceField::High) - 0.5).abs() < 1e-9);
        assert!((regression_slope(&bars, PriceField::Low) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_slope_of_flat_series_is_zero() {
        let bars = line(dec!(110), dec!(0), 10);
        assert_eq!(regression_slope(&bars, PriceField::High), 0.0);
    }

    #[test]
    fn test_slope_falling() {
        let bars = line(dec!(100), dec!(-0.25), 12);
        assert!((regression_slope(&bars, PriceField::Low) + 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_slope_degenerate() {
        let bars = line(dec!(100), dec!(1), 1);
        assert!(regression_slope(&bars, PriceField::High).is_nan());
    }

    #[test]
    fn test_relative_diff() {
        assert!((relative_diff(100.0, 98.0) - 0.02).abs() < 1e-12);
        assert!((relative_diff(98.0, 100.0) - 0.02).abs() < 1e-12);
        assert_eq!(relative_diff(5.0, 5.0), 0.0);
    }
}
