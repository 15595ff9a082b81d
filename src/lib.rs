//! # chartgeo
//!
//! Horizontal support/resistance levels and classical chart patterns
//! (head-and-shoulders, double top/bottom, triangles) from OHLCV candles.
//!
//! ## Quick Start
//!
//! ```rust
//! use chartgeo::prelude::*;
//! use rust_decimal_macros::dec;
//!
//! let candles: Vec<Candle> = (0..30)
//!     .map(|i| Candle::new(i, dec!(100), dec!(101), dec!(99), dec!(100), dec!(10)))
//!     .collect();
//!
//! // Strongest zones first, at most five
//! let levels = detect_support_resistance(&candles);
//! // Highest confidence first, one per pattern family
//! let patterns = detect_patterns(&candles);
//!
//! assert!(levels.is_empty());
//! assert!(patterns.is_empty());
//!
//! // Or configure the detectors explicitly
//! let engine = EngineBuilder::new()
//!     .with_triangle_defaults()
//!     .min_confidence(0.7)
//!     .validate_data(true)
//!     .build()
//!     .unwrap();
//! assert!(engine.scan(&candles).unwrap().is_empty());
//! ```

use std::fmt;

use rust_decimal::{prelude::ToPrimitive, Decimal};

pub mod cluster;
pub mod detectors;
pub mod levels;
pub mod params;
pub mod swing;

pub mod prelude {
    pub use crate::{
        // Core
        cluster::{cluster_levels, LevelCluster, LevelClusterer},
        // Detectors
        detectors::*,
        levels::{LevelType, SupportResistanceDetector, SupportResistanceLevel},
        // Parameters
        params::{get_decimal, get_period, get_ratio, ParamMeta, ParamType, ParameterizedDetector},
        swing::{SwingKind, SwingPoint},
        // Entry points
        analyze,
        detect_patterns,
        detect_support_resistance,
        rank_patterns,
        scan_parallel,
        validate_bars,
        // Engine
        Analysis,
        Analyzer,
        BuiltinDetector,
        // Types
        Candle,
        Direction,
        DynPatternDetector,
        EngineBuilder,
        EngineConfig,
        OHLCVExt,
        Pattern,
        PatternDetector,
        PatternEngine,
        // Errors
        PatternError,
        PatternId,
        Period,
        PriceField,
        Ratio,
        Result,
        ScanError,
        ScanResult,
        OHLCV,
    };
}

use detectors::*;
use levels::{SupportResistanceDetector, SupportResistanceLevel};

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors from configuration and opt-in input validation.
///
/// Detection itself never fails: short input yields no levels or patterns.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid OHLCV at index {index}: {reason}")]
    InvalidOHLCV { index: usize, reason: &'static str },

    #[error("Timestamp at index {index} does not increase")]
    UnorderedTimestamps { index: usize },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(PatternError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(PatternError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Bar count (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(PatternError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
///
/// Prices are exact decimals so that level clustering compares them without
/// binary rounding.
pub trait OHLCV {
    fn open(&self) -> Decimal;
    fn high(&self) -> Decimal;
    fn low(&self) -> Decimal;
    fn close(&self) -> Decimal;
    fn volume(&self) -> Decimal;

    /// Bar open time in epoch milliseconds
    fn timestamp(&self) -> Option<i64> {
        None
    }
}

/// Blanket impl for references to dyn OHLCV
impl OHLCV for &dyn OHLCV {
    fn open(&self) -> Decimal {
        (*self).open()
    }

    fn high(&self) -> Decimal {
        (*self).high()
    }

    fn low(&self) -> Decimal {
        (*self).low()
    }

    fn close(&self) -> Decimal {
        (*self).close()
    }

    fn volume(&self) -> Decimal {
        (*self).volume()
    }

    fn timestamp(&self) -> Option<i64> {
        (*self).timestamp()
    }
}

/// Which price a regression or swing scan reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    High,
    Low,
}

/// Extension trait with derived values for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn price(&self, field: PriceField) -> Decimal {
        match field {
            PriceField::High => self.high(),
            PriceField::Low => self.low(),
        }
    }

    #[inline]
    fn high_f64(&self) -> f64 {
        self.high().to_f64().unwrap_or(f64::NAN)
    }

    #[inline]
    fn low_f64(&self) -> f64 {
        self.low().to_f64().unwrap_or(f64::NAN)
    }

    /// Validate OHLCV data consistency
    fn validate(&self) -> Result<()> {
        let (open, high, low, close) = (self.open(), self.high(), self.low(), self.close());

        if high < low {
            return Err(PatternError::InvalidOHLCV {
                index: 0,
                reason: "high < low",
            });
        }
        if low.is_sign_negative() && !low.is_zero() {
            return Err(PatternError::InvalidOHLCV {
                index: 0,
                reason: "negative low",
            });
        }
        if high < open.max(close) {
            return Err(PatternError::InvalidOHLCV {
                index: 0,
                reason: "high below open/close",
            });
        }
        if low > open.min(close) {
            return Err(PatternError::InvalidOHLCV {
                index: 0,
                reason: "low above open/close",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

/// One OHLCV price bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    /// Open time in epoch milliseconds
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    pub fn new(
        timestamp: i64,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl OHLCV for Candle {
    fn open(&self) -> Decimal {
        self.open
    }

    fn high(&self) -> Decimal {
        self.high
    }

    fn low(&self) -> Decimal {
        self.low
    }

    fn close(&self) -> Decimal {
        self.close
    }

    fn volume(&self) -> Decimal {
        self.volume
    }

    fn timestamp(&self) -> Option<i64> {
        Some(self.timestamp)
    }
}

/// Check every bar and, where timestamps are present, that they strictly increase.
pub fn validate_bars<T: OHLCV>(bars: &[T]) -> Result<()> {
    let mut previous: Option<i64> = None;

    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            PatternError::InvalidOHLCV { reason, .. } => {
                PatternError::InvalidOHLCV { index: i, reason }
            }
            other => other,
        })?;

        if let Some(ts) = bar.timestamp() {
            if previous.is_some_and(|prev| ts <= prev) {
                return Err(PatternError::UnorderedTimestamps { index: i });
            }
            previous = Some(ts);
        }
    }
    Ok(())
}

// ============================================================
// PATTERN - result of detection
// ============================================================

/// Unique identifier for a pattern type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct PatternId(pub &'static str);

impl PatternId {
    pub const HEAD_AND_SHOULDERS: Self = Self("HEAD_AND_SHOULDERS");
    pub const INVERSE_HEAD_AND_SHOULDERS: Self = Self("INVERSE_HEAD_AND_SHOULDERS");
    pub const DOUBLE_TOP: Self = Self("DOUBLE_TOP");
    pub const DOUBLE_BOTTOM: Self = Self("DOUBLE_BOTTOM");
    pub const ASCENDING_TRIANGLE: Self = Self("ASCENDING_TRIANGLE");
    pub const DESCENDING_TRIANGLE: Self = Self("DESCENDING_TRIANGLE");
    pub const SYMMETRICAL_TRIANGLE: Self = Self("SYMMETRICAL_TRIANGLE");

    /// Returns the string identifier
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Bias of a builtin pattern, `None` for unknown ids
    pub fn typical_direction(&self) -> Option<Direction> {
        match self.0 {
            "INVERSE_HEAD_AND_SHOULDERS" | "DOUBLE_BOTTOM" | "ASCENDING_TRIANGLE" => {
                Some(Direction::Bullish)
            }
            "HEAD_AND_SHOULDERS" | "DOUBLE_TOP" | "DESCENDING_TRIANGLE" => Some(Direction::Bearish),
            "SYMMETRICAL_TRIANGLE" => Some(Direction::Continuation),
            _ => None,
        }
    }
}

/// Direction/bias of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Continuation,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
            Direction::Continuation => "continuation",
        }
    }

    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected chart pattern
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Pattern {
    pub id: PatternId,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub direction: Direction,
    /// Heuristic score in 0.0..=1.0; patterns at 0 are never reported
    pub confidence: f64,
    pub description: &'static str,
    /// Always false: confirmed breakouts are not tracked
    pub breakout: bool,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {:.0}% confidence) - {}",
            self.name,
            self.direction,
            self.confidence * 100.0,
            self.description
        )
    }
}

/// Drop non-positive confidences and sort the rest, highest first.
///
/// The sort is stable: ties keep their input order.
pub fn rank_patterns(mut patterns: Vec<Pattern>) -> Vec<Pattern> {
    patterns.retain(|p| p.confidence > 0.0);
    patterns.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    patterns
}

// ============================================================
// PATTERN DETECTOR TRAITS
// ============================================================

/// Generic pattern detector trait - for concrete types
pub trait PatternDetector: Send + Sync {
    fn id(&self) -> PatternId;
    /// Bars required before the detector can report anything
    fn min_bars(&self) -> usize;
    /// Inspect the trailing window of `bars`; `None` means the pattern is absent.
    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Pattern>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

/// Object-safe pattern detector trait - for custom detectors
pub trait DynPatternDetector: Send + Sync {
    fn id(&self) -> PatternId;
    fn min_bars(&self) -> usize;
    fn detect(&self, bars: &[&dyn OHLCV]) -> Option<Pattern>;
    fn validate_config(&self) -> Result<()>;
}

impl<D: PatternDetector> DynPatternDetector for D {
    fn id(&self) -> PatternId {
        PatternDetector::id(self)
    }

    fn min_bars(&self) -> usize {
        PatternDetector::min_bars(self)
    }

    fn detect(&self, bars: &[&dyn OHLCV]) -> Option<Pattern> {
        PatternDetector::detect(self, bars)
    }

    fn validate_config(&self) -> Result<()> {
        PatternDetector::validate_config(self)
    }
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

/// Macro to generate BuiltinDetector enum without boilerplate
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - enum dispatch, no vtable
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            /// Every builtin detector with default thresholds, in ranking-tie order
            pub fn all_defaults() -> Vec<Self> {
                vec![$(Self::$variant(<$detector>::default())),*]
            }

            #[inline]
            pub fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Pattern> {
                match self {
                    $(Self::$variant(d) => PatternDetector::detect(d, bars)),*
                }
            }

            #[inline]
            pub fn id(&self) -> PatternId {
                match self {
                    $(Self::$variant(d) => PatternDetector::id(d)),*
                }
            }

            #[inline]
            pub fn min_bars(&self) -> usize {
                match self {
                    $(Self::$variant(d) => PatternDetector::min_bars(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => PatternDetector::validate_config(d)),*
                }
            }
        }
    };
}

define_builtin_detectors! {
    // Head and shoulders
    HeadAndShoulders(HeadAndShouldersDetector),
    InverseHeadAndShoulders(InverseHeadAndShouldersDetector),

    // Double extremum
    DoubleTop(DoubleTopDetector),
    DoubleBottom(DoubleBottomDetector),

    // Triangles
    AscendingTriangle(AscendingTriangleDetector),
    DescendingTriangle(DescendingTriangleDetector),
    SymmetricalTriangle(SymmetricalTriangleDetector),
}

// ============================================================
// PATTERN ENGINE
// ============================================================

/// Engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub min_confidence: Option<f64>,
    pub validate_data: bool,
    pub pattern_filter: Option<Vec<PatternId>>,
}

/// Runs a set of pattern detectors and ranks their output
pub struct PatternEngine {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn DynPatternDetector>>,
    config: EngineConfig,
}

impl fmt::Debug for PatternEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternEngine")
            .field("builtin", &self.builtin)
            .field("custom", &self.custom.iter().map(|d| d.id()).collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PatternEngine {
    /// All seven builtin detectors, default thresholds, no filters
    pub fn with_defaults() -> Self {
        Self {
            builtin: BuiltinDetector::all_defaults(),
            custom: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run every detector and rank the results. Never fails.
    pub fn detect_all<T: OHLCV>(&self, bars: &[T]) -> Vec<Pattern> {
        let mut found: Vec<Pattern> = self
            .builtin
            .iter()
            .filter(|d| bars.len() >= d.min_bars())
            .filter_map(|d| d.detect(bars))
            .collect();

        found.extend(self.detect_custom(bars));
        self.finish(bars.len(), found)
    }

    /// Validate (if enabled), then detect.
    pub fn scan<T: OHLCV>(&self, bars: &[T]) -> Result<Vec<Pattern>> {
        if self.config.validate_data {
            validate_bars(bars)?;
        }
        Ok(self.detect_all(bars))
    }

    /// Like [`scan`](Self::scan) but runs the builtin detectors on the rayon pool.
    ///
    /// Output is re-ranked after all detectors finish, so it matches `scan`.
    pub fn scan_parallel<T: OHLCV + Sync>(&self, bars: &[T]) -> Result<Vec<Pattern>> {
        if self.config.validate_data {
            validate_bars(bars)?;
        }

        let mut found: Vec<Pattern> = self
            .builtin
            .par_iter()
            .filter(|d| bars.len() >= d.min_bars())
            .filter_map(|d| d.detect(bars))
            .collect();

        found.extend(self.detect_custom(bars));
        Ok(self.finish(bars.len(), found))
    }

    // ===========================================
    // Internal helpers
    // ===========================================

    fn detect_custom<T: OHLCV>(&self, bars: &[T]) -> Vec<Pattern> {
        if self.custom.is_empty() {
            return Vec::new();
        }

        let bar_refs: Vec<&dyn OHLCV> = bars.iter().map(|b| b as &dyn OHLCV).collect();
        self.custom
            .iter()
            .filter(|d| bar_refs.len() >= d.min_bars())
            .filter_map(|d| d.detect(&bar_refs))
            .collect()
    }

    fn finish(&self, bars: usize, found: Vec<Pattern>) -> Vec<Pattern> {
        for p in &found {
            tracing::trace!(pattern = p.id.as_str(), confidence = p.confidence, "pattern hit");
        }

        let ranked: Vec<Pattern> = rank_patterns(found)
            .into_iter()
            .filter(|p| self.should_include(p))
            .collect();

        tracing::debug!(bars, patterns = ranked.len(), "pattern detection complete");
        ranked
    }

    fn should_include(&self, p: &Pattern) -> bool {
        if let Some(min) = self.config.min_confidence {
            if p.confidence < min {
                return false;
            }
        }
        if let Some(ref filter) = self.config.pattern_filter {
            if !filter.contains(&p.id) {
                return false;
            }
        }
        true
    }

    fn validate(&self) -> Result<()> {
        for d in &self.builtin {
            d.validate_config()?;
        }
        for d in &self.custom {
            d.validate_config()?;
        }
        Ok(())
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating PatternEngine instances
#[derive(Default)]
pub struct EngineBuilder {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn DynPatternDetector>>,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add all seven builtin detectors with default configurations
    pub fn with_all_defaults(mut self) -> Self {
        self.builtin.extend(BuiltinDetector::all_defaults());
        self
    }

    /// Add head-and-shoulders and double top/bottom detectors (4)
    pub fn with_reversal_defaults(mut self) -> Self {
        self.builtin.extend([
            BuiltinDetector::HeadAndShoulders(HeadAndShouldersDetector::with_defaults()),
            BuiltinDetector::InverseHeadAndShoulders(
                InverseHeadAndShouldersDetector::with_defaults(),
            ),
            BuiltinDetector::DoubleTop(DoubleTopDetector::with_defaults()),
            BuiltinDetector::DoubleBottom(DoubleBottomDetector::with_defaults()),
        ]);
        self
    }

    /// Add the triangle detectors (3)
    pub fn with_triangle_defaults(mut self) -> Self {
        self.builtin.extend([
            BuiltinDetector::AscendingTriangle(AscendingTriangleDetector::with_defaults()),
            BuiltinDetector::DescendingTriangle(DescendingTriangleDetector::with_defaults()),
            BuiltinDetector::SymmetricalTriangle(SymmetricalTriangleDetector::with_defaults()),
        ]);
        self
    }

    /// Add a builtin detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        self.builtin.push(detector);
        self
    }

    /// Add with config validation
    pub fn add_checked(mut self, detector: BuiltinDetector) -> Result<Self> {
        detector.validate_config()?;
        self.builtin.push(detector);
        Ok(self)
    }

    /// Add a custom detector (vtable dispatch, runs after the builtins)
    pub fn add_custom<D: DynPatternDetector + 'static>(mut self, detector: D) -> Self {
        self.custom.push(Box::new(detector));
        self
    }

    /// Drop patterns below this confidence
    pub fn min_confidence(mut self, confidence: f64) -> Self {
        self.config.min_confidence = Some(confidence);
        self
    }

    /// Enable/disable input validation in `scan`
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Filter to specific patterns only
    pub fn only_patterns(mut self, ids: impl IntoIterator<Item = PatternId>) -> Self {
        self.config.pattern_filter = Some(ids.into_iter().collect());
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<PatternEngine> {
        let engine = PatternEngine {
            builtin: self.builtin,
            custom: self.custom,
            config: self.config,
        };
        engine.validate()?;
        Ok(engine)
    }
}

// ============================================================
// ANALYSIS
// ============================================================

/// Both artifacts for one instrument
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Analysis {
    pub levels: Vec<SupportResistanceLevel>,
    pub patterns: Vec<Pattern>,
}

/// Support/resistance detector paired with a pattern engine
#[derive(Debug, Default)]
pub struct Analyzer {
    pub levels: SupportResistanceDetector,
    pub engine: PatternEngine,
}

impl Analyzer {
    pub fn new(levels: SupportResistanceDetector, engine: PatternEngine) -> Result<Self> {
        levels.validate_config()?;
        Ok(Self { levels, engine })
    }

    pub fn analyze<T: OHLCV>(&self, bars: &[T]) -> Result<Analysis> {
        let patterns = self.engine.scan(bars)?;
        let levels = self.levels.detect(bars);
        Ok(Analysis { levels, patterns })
    }
}

/// Up to five support/resistance levels, strongest first.
pub fn detect_support_resistance<T: OHLCV>(candles: &[T]) -> Vec<SupportResistanceLevel> {
    SupportResistanceDetector::default().detect(candles)
}

/// All detected chart patterns, highest confidence first.
pub fn detect_patterns<T: OHLCV>(candles: &[T]) -> Vec<Pattern> {
    PatternEngine::with_defaults().detect_all(candles)
}

/// Levels and patterns with default settings.
pub fn analyze<T: OHLCV>(candles: &[T]) -> Analysis {
    Analysis {
        levels: detect_support_resistance(candles),
        patterns: detect_patterns(candles),
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Result of analysing a single instrument
#[derive(Debug)]
pub struct ScanResult {
    pub symbol: String,
    pub analysis: Analysis,
}

/// Error from analysing a single instrument
#[derive(Debug)]
pub struct ScanError {
    pub symbol: String,
    pub error: PatternError,
}

/// Analyse independent instruments on the rayon pool
pub fn scan_parallel<'a, T, I>(analyzer: &Analyzer, instruments: I) -> (Vec<ScanResult>, Vec<ScanError>)
where
    T: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            analyzer
                .analyze(bars)
                .map(|analysis| ScanResult {
                    symbol: symbol.to_string(),
                    analysis,
                })
                .map_err(|error| ScanError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    tracing::debug!(
        analysed = successes.len(),
        failed = errors.len(),
        "parallel scan complete"
    );

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flat(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle::new(i as i64, dec!(100), dec!(101), dec!(99), dec!(100), dec!(10)))
            .collect()
    }

    /// Highs flat at 110, lows rising 0.5 per bar
    fn ascending(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let low = dec!(100) + dec!(0.5) * Decimal::from(i);
                Candle::new(i as i64, low, dec!(110), low, low, dec!(10))
            })
            .collect()
    }

    fn pattern(id: PatternId, confidence: f64) -> Pattern {
        Pattern {
            id,
            name: id.as_str(),
            direction: id.typical_direction().unwrap_or(Direction::Continuation),
            confidence,
            description: "",
            breakout: false,
        }
    }

    /// Always reports a fixed confidence
    struct Fixed(f64);

    impl PatternDetector for Fixed {
        fn id(&self) -> PatternId {
            PatternId("FIXED")
        }

        fn min_bars(&self) -> usize {
            1
        }

        fn detect<T: OHLCV>(&self, _bars: &[T]) -> Option<Pattern> {
            Some(pattern(PatternId("FIXED"), self.0))
        }
    }

    #[test]
    fn test_ratio_validation() {
        assert!(Ratio::new(0.0).is_ok());
        assert!(Ratio::new(1.0).is_ok());
        assert!(Ratio::new(-0.1).is_err());
        assert!(Ratio::new(1.1).is_err());
        assert!(Ratio::new(f64::NAN).is_err());
    }

    #[test]
    fn test_period_validation() {
        assert!(Period::new(1).is_ok());
        assert!(Period::new(0).is_err());
    }

    #[test]
    fn test_candle_validation() {
        let ok = Candle::new(0, dec!(10), dec!(12), dec!(9), dec!(11), dec!(1));
        assert!(ok.validate().is_ok());

        let inverted = Candle::new(0, dec!(10), dec!(9), dec!(12), dec!(11), dec!(1));
        assert!(matches!(
            inverted.validate(),
            Err(PatternError::InvalidOHLCV { reason: "high < low", .. })
        ));

        let body_above_high = Candle::new(0, dec!(10), dec!(12), dec!(9), dec!(13), dec!(1));
        assert!(body_above_high.validate().is_err());

        let negative = Candle::new(0, dec!(-1), dec!(1), dec!(-2), dec!(0), dec!(1));
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_validate_bars_reports_index() {
        let mut bars = flat(5);
        bars[3].high = dec!(50);
        assert!(matches!(
            validate_bars(&bars),
            Err(PatternError::InvalidOHLCV { index: 3, .. })
        ));

        let mut bars = flat(5);
        bars[4].timestamp = 2;
        assert!(matches!(
            validate_bars(&bars),
            Err(PatternError::UnorderedTimestamps { index: 4 })
        ));

        assert!(validate_bars(&flat(5)).is_ok());
    }

    #[test]
    fn test_rank_patterns_drops_sentinels_and_keeps_tie_order() {
        let ranked = rank_patterns(vec![
            pattern(PatternId::DOUBLE_TOP, 0.8),
            pattern(PatternId::HEAD_AND_SHOULDERS, 0.0),
            pattern(PatternId::ASCENDING_TRIANGLE, 0.9),
            pattern(PatternId::DOUBLE_BOTTOM, 0.8),
        ]);

        let ids: Vec<_> = ranked.iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            vec![
                PatternId::ASCENDING_TRIANGLE,
                PatternId::DOUBLE_TOP,
                PatternId::DOUBLE_BOTTOM
            ]
        );
    }

    #[test]
    fn test_pattern_display() {
        let p = Pattern {
            id: PatternId::DOUBLE_TOP,
            name: "Double Top",
            direction: Direction::Bearish,
            confidence: 0.796,
            description: "Reversal pattern marking strong resistance",
            breakout: false,
        };
        assert_eq!(
            p.to_string(),
            "Double Top (bearish, 80% confidence) - Reversal pattern marking strong resistance"
        );
    }

    #[test]
    fn test_pattern_serializes_type_field() {
        let json = serde_json::to_value(pattern(PatternId::DOUBLE_TOP, 0.5)).unwrap();
        assert_eq!(json["type"], "bearish");
        assert_eq!(json["id"], "DOUBLE_TOP");
        assert_eq!(json["breakout"], false);
    }

    #[test]
    fn test_engine_builder() {
        let engine = EngineBuilder::new().with_all_defaults().build().unwrap();
        assert_eq!(engine.builtin.len(), 7);

        let engine = EngineBuilder::new().with_reversal_defaults().build().unwrap();
        assert_eq!(engine.builtin.len(), 4);

        let engine = EngineBuilder::new().with_triangle_defaults().build().unwrap();
        assert_eq!(engine.builtin.len(), 3);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let bad = BuiltinDetector::AscendingTriangle(AscendingTriangleDetector {
            window: Period::new_const(1),
            ..Default::default()
        });
        assert!(EngineBuilder::new().add(bad.clone()).build().is_err());
        assert!(EngineBuilder::new().add_checked(bad).is_err());
    }

    #[test]
    fn test_empty_scan() {
        let engine = PatternEngine::with_defaults();
        let bars: Vec<Candle> = vec![];
        assert!(engine.scan(&bars).unwrap().is_empty());
    }

    #[test]
    fn test_ascending_detection() {
        let patterns = detect_patterns(&ascending(10));
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].id, PatternId::ASCENDING_TRIANGLE);
    }

    #[test]
    fn test_min_confidence_filter() {
        let engine = EngineBuilder::new()
            .with_all_defaults()
            .min_confidence(0.95)
            .build()
            .unwrap();
        assert!(engine.scan(&ascending(10)).unwrap().is_empty());
    }

    #[test]
    fn test_pattern_filter() {
        let engine = EngineBuilder::new()
            .with_all_defaults()
            .only_patterns([PatternId::DOUBLE_TOP])
            .build()
            .unwrap();
        assert!(engine.scan(&ascending(10)).unwrap().is_empty());
    }

    #[test]
    fn test_validate_data() {
        let mut bars = ascending(10);
        bars[2].low = dec!(200);

        let engine = EngineBuilder::new()
            .with_all_defaults()
            .validate_data(true)
            .build()
            .unwrap();
        assert!(engine.scan(&bars).is_err());
        assert!(PatternEngine::with_defaults().scan(&bars).is_ok());
    }

    #[test]
    fn test_custom_detector_ranked_with_builtins() {
        let engine = EngineBuilder::new()
            .with_all_defaults()
            .add_custom(Fixed(0.95))
            .add_custom(Fixed(0.0))
            .build()
            .unwrap();

        let patterns = engine.scan(&ascending(10)).unwrap();
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].id, PatternId("FIXED"));
        assert_eq!(patterns[1].id, PatternId::ASCENDING_TRIANGLE);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let engine = PatternEngine::with_defaults();
        let mut bars = flat(20);
        bars.extend(ascending(10).into_iter().map(|mut c| {
            c.timestamp += 20;
            c
        }));
        assert_eq!(
            engine.scan_parallel(&bars).unwrap(),
            engine.scan(&bars).unwrap()
        );
    }

    #[test]
    fn test_builtin_detectors_from_json() {
        let detectors: Vec<BuiltinDetector> = serde_json::from_str(
            r#"[{"DoubleTop": {"tolerance": 0.03}}, {"AscendingTriangle": {}}]"#,
        )
        .unwrap();

        assert_eq!(detectors[0].id(), PatternId::DOUBLE_TOP);
        assert_eq!(detectors[0].min_bars(), 15);
        assert_eq!(
            detectors[1],
            BuiltinDetector::AscendingTriangle(AscendingTriangleDetector::default())
        );
    }

    #[test]
    fn test_analyzer_and_parallel_scan() {
        let analyzer = Analyzer::new(
            SupportResistanceDetector::default(),
            EngineBuilder::new()
                .with_all_defaults()
                .validate_data(true)
                .build()
                .unwrap(),
        )
        .unwrap();

        let good = ascending(10);
        let mut bad = flat(10);
        bad[0].high = dec!(1);

        let instruments = vec![("SOLUSDT", &good[..]), ("BTCUSDT", &bad[..])];
        let (results, errors) = scan_parallel(&analyzer, instruments);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol, "SOLUSDT");
        assert_eq!(results[0].analysis, analyze(&good));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].symbol, "BTCUSDT");
    }
}
