//! Swing point extraction
//!
//! A swing high is a bar whose high is strictly above the highs of the
//! `half_width` bars on each side; a swing low mirrors that on lows. Bars
//! closer than `half_width` to either end of the slice are never evaluated.

use rust_decimal::Decimal;

use crate::OHLCV;

/// Half-width used by the support/resistance and chart-pattern detectors
pub const SWING_HALF_WIDTH: usize = 2;

/// Which extreme a swing point marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingKind {
    High,
    Low,
}

/// Local extremum found in a bar slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwingPoint {
    /// Index into the slice passed to the extractor
    pub index: usize,
    pub price: Decimal,
    pub kind: SwingKind,
}

#[inline]
fn price_of<T: OHLCV>(bar: &T, kind: SwingKind) -> Decimal {
    match kind {
        SwingKind::High => bar.high(),
        SwingKind::Low => bar.low(),
    }
}

#[inline]
fn is_swing<T: OHLCV>(bars: &[T], index: usize, kind: SwingKind, half_width: usize) -> bool {
    let price = price_of(&bars[index], kind);
    let left = &bars[index - half_width..index];
    let right = &bars[index + 1..=index + half_width];

    left.iter().chain(right).all(|bar| {
        let other = price_of(bar, kind);
        match kind {
            SwingKind::High => price > other,
            SwingKind::Low => price < other,
        }
    })
}

/// Indices eligible for evaluation: `half_width <= i < len - half_width`
#[inline]
fn candidates(len: usize, half_width: usize) -> std::ops::Range<usize> {
    half_width..len.saturating_sub(half_width)
}

/// Extract swing points of one kind, in bar order.
pub fn extract<T: OHLCV>(bars: &[T], kind: SwingKind, half_width: usize) -> Vec<SwingPoint> {
    if half_width == 0 {
        return Vec::new();
    }

    candidates(bars.len(), half_width)
        .filter(|&i| is_swing(bars, i, kind, half_width))
        .map(|index| SwingPoint {
            index,
            price: price_of(&bars[index], kind),
            kind,
        })
        .collect()
}

/// Extract swing highs and swing lows in a single pass.
///
/// A bar may appear in both lists (e.g. an outside bar that spikes both ways).
pub fn extract_both<T: OHLCV>(bars: &[T], half_width: usize) -> (Vec<SwingPoint>, Vec<SwingPoint>) {
    let mut highs = Vec::new();
    let mut lows = Vec::new();

    if half_width == 0 {
        return (highs, lows);
    }

    for i in candidates(bars.len(), half_width) {
        if is_swing(bars, i, SwingKind::High, half_width) {
            highs.push(SwingPoint {
                index: i,
                price: bars[i].high(),
                kind: SwingKind::High,
            });
        }
        if is_swing(bars, i, SwingKind::Low, half_width) {
            lows.push(SwingPoint {
                index: i,
                price: bars[i].low(),
                kind: SwingKind::Low,
            });
        }
    }

    (highs, lows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candle;
    use rust_decimal_macros::dec;

    fn bars_from_highs(highs: &[Decimal]) -> Vec<Candle> {
        highs
            .iter()
            .enumerate()
            .map(|(i, &h)| Candle::new(i as i64, h, h, h - dec!(1), h, dec!(10)))
            .collect()
    }

    #[test]
    fn test_single_peak() {
        let bars = bars_from_highs(&[dec!(1), dec!(2), dec!(5), dec!(2), dec!(1)]);
        let highs = extract(&bars, SwingKind::High, SWING_HALF_WIDTH);
        assert_eq!(highs.len(), 1);
        assert_eq!(highs[0].index, 2);
        assert_eq!(highs[0].price, dec!(5));
    }

    #[test]
    fn test_ties_do_not_qualify() {
        let bars = bars_from_highs(&[dec!(1), dec!(5), dec!(5), dec!(2), dec!(1)]);
        assert!(extract(&bars, SwingKind::High, SWING_HALF_WIDTH).is_empty());

        let bars = bars_from_highs(&[dec!(1), dec!(2), dec!(5), dec!(2), dec!(5)]);
        assert!(extract(&bars, SwingKind::High, SWING_HALF_WIDTH).is_empty());
    }

    #[test]
    fn test_boundaries_never_evaluated() {
        // Extremes sit at the edges; nothing in the middle qualifies.
        let bars = bars_from_highs(&[dec!(9), dec!(8), dec!(3), dec!(4), dec!(5), dec!(8), dec!(9)]);
        assert!(extract(&bars, SwingKind::High, SWING_HALF_WIDTH).is_empty());
    }

    #[test]
    fn test_short_input() {
        let bars = bars_from_highs(&[dec!(1), dec!(5), dec!(1)]);
        assert!(extract(&bars, SwingKind::High, SWING_HALF_WIDTH).is_empty());
        assert!(extract::<Candle>(&[], SwingKind::Low, SWING_HALF_WIDTH).is_empty());
    }

    #[test]
    fn test_swing_low() {
        let bars = bars_from_highs(&[dec!(10), dec!(9), dec!(7), dec!(9), dec!(10), dec!(11)]);
        let lows = extract(&bars, SwingKind::Low, SWING_HALF_WIDTH);
        assert_eq!(lows.len(), 1);
        assert_eq!(lows[0].index, 2);
        assert_eq!(lows[0].price, dec!(6));
        assert_eq!(lows[0].kind, SwingKind::Low);
    }

    #[test]
    fn test_extract_both_matches_extract() {
        let bars = bars_from_highs(&[
            dec!(10),
            dec!(12),
            dec!(15),
            dec!(11),
            dec!(8),
            dec!(11),
            dec!(14),
            dec!(13),
            dec!(12),
        ]);
        let (highs, lows) = extract_both(&bars, SWING_HALF_WIDTH);
        assert_eq!(highs, extract(&bars, SwingKind::High, SWING_HALF_WIDTH));
        assert_eq!(lows, extract(&bars, SwingKind::Low, SWING_HALF_WIDTH));
        assert_eq!(highs.iter().map(|p| p.index).collect::<Vec<_>>(), vec![2, 6]);
        assert_eq!(lows.len(), 1);
        assert_eq!(lows[0].index, 4);
    }

    #[test]
    fn test_zero_half_width() {
        let bars = bars_from_highs(&[dec!(1), dec!(2), dec!(1)]);
        assert!(extract(&bars, SwingKind::High, 0).is_empty());
    }
}
