//! Chart pattern detectors
//!
//! Each detector looks at a trailing window of bars and reports at most one
//! pattern.
//!
//! # Pattern Families
//!
//! - **Head and shoulders (2)**: Head and Shoulders, Inverse Head and Shoulders
//! - **Double extremum (2)**: Double Top, Double Bottom
//! - **Triangles (3)**: Ascending, Descending, Symmetrical

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod double;
pub mod head_shoulders;
pub mod triangle;

// Re-export all detectors for convenience
pub use double::*;
pub use head_shoulders::*;
pub use helpers::*;
pub use triangle::*;
