//! Integration tests for support/resistance detection.

use chartgeo::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn candle(i: usize, high: Decimal, low: Decimal) -> Candle {
    let mid = (high + low) / dec!(2);
    Candle::new(i as i64 * 60_000, mid, high, low, mid, dec!(10))
}

/// Flat 60/40 bars with spiked highs and lows at every third bar from index 2
fn spikes(highs: &[Decimal], lows: &[Decimal]) -> Vec<Candle> {
    let n = 3 * highs.len().max(lows.len()) + 4;
    (0..n)
        .map(|i| {
            let slot = (i >= 2 && (i - 2) % 3 == 0).then(|| (i - 2) / 3);
            let high = slot.and_then(|k| highs.get(k).copied()).unwrap_or(dec!(60));
            let low = slot.and_then(|k| lows.get(k).copied()).unwrap_or(dec!(40));
            candle(i, high, low)
        })
        .collect()
}

#[test]
fn test_empty_input() {
    let bars: Vec<Candle> = Vec::new();
    assert!(detect_support_resistance(&bars).is_empty());
}

#[test]
fn test_fewer_than_five_bars() {
    let bars = spikes(&[dec!(100), dec!(100)], &[]);
    assert!(detect_support_resistance(&bars[..4]).is_empty());
}

#[test]
fn test_two_resistance_zones() {
    let bars = spikes(&[dec!(100), dec!(100.5), dec!(150), dec!(151)], &[]);
    let levels = detect_support_resistance(&bars);

    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0].price, dec!(100.25));
    assert_eq!(levels[1].price, dec!(150.5));
    for level in &levels {
        assert_eq!(level.level_type, LevelType::Resistance);
        assert_eq!(level.strength, 2);
        assert_eq!(level.touches, level.strength);
    }
}

#[test]
fn test_single_touch_is_not_a_level() {
    let bars = spikes(&[dec!(100), dec!(130), dec!(160)], &[dec!(10), dec!(20), dec!(30)]);
    assert!(detect_support_resistance(&bars).is_empty());
}

#[test]
fn test_support_and_resistance() {
    let bars = spikes(
        &[dec!(100), dec!(101), dec!(100.5)],
        &[dec!(20), dec!(20.2)],
    );
    let levels = detect_support_resistance(&bars);

    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0].level_type, LevelType::Resistance);
    assert_eq!(levels[0].strength, 3);
    assert_eq!(levels[0].price, dec!(100.5));
    assert_eq!(levels[1].level_type, LevelType::Support);
    assert_eq!(levels[1].price, dec!(20.1));
}

#[test]
fn test_at_most_five_levels() {
    let highs: Vec<Decimal> = (1..=8)
        .flat_map(|k| {
            let p = Decimal::from(k * 100);
            [p, p]
        })
        .collect();
    let levels = detect_support_resistance(&spikes(&highs, &[]));

    assert_eq!(levels.len(), 5);
    assert!(levels.windows(2).all(|w| w[0].strength >= w[1].strength));
}

#[test]
fn test_plateau_is_not_a_swing() {
    // Equal neighbours never qualify under the strict comparison
    let mut bars = spikes(&[], &[]);
    bars.extend((0..10).map(|i| candle(i + 4, dec!(70), dec!(40))));
    assert!(detect_support_resistance(&bars).is_empty());
}

#[test]
fn test_display_line() {
    let bars = spikes(&[dec!(100), dec!(100.5)], &[]);
    let levels = detect_support_resistance(&bars);
    assert_eq!(levels[0].to_string(), "RESISTANCE: $100.2500 (Strength: 2 touches)");
}

#[test]
fn test_custom_detector() {
    let bars = spikes(&[dec!(100), dec!(103)], &[]);
    assert!(detect_support_resistance(&bars).is_empty());

    let wide = SupportResistanceDetector {
        tolerance: dec!(0.05),
        ..Default::default()
    };
    let levels = wide.detect(&bars);
    assert_eq!(levels.len(), 1);
    assert_eq!(levels[0].price, dec!(101.5));
}

#[test]
fn test_levels_serialize() {
    let bars = spikes(&[dec!(100), dec!(100.5)], &[]);
    let json = serde_json::to_value(analyze(&bars)).unwrap();

    assert_eq!(json["levels"][0]["level_type"], "resistance");
    let price: Decimal = json["levels"][0]["price"].as_str().unwrap().parse().unwrap();
    assert_eq!(price, dec!(100.25));
    assert_eq!(json["levels"][0]["touches"], 2);
    assert!(json["patterns"].is_array());
}
