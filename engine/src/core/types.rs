//! WaveCoach Core Type Definitions
//!
//! Fundamental value types shared by the analysis, annotation and render layers.

use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Analysis run unique identifier (ULID)
pub type RunId = String;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

// =============================================================================
// Geometry Types
// =============================================================================

/// Percentage coordinate in `[0, 100]`, relative to the surface size.
pub type Percent = f64;

/// Annotation anchor in percent-of-surface coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPoint {
    pub x: Percent,
    pub y: Percent,
}

impl AnnotationPoint {
    /// Creates a point, clamping both axes into `[0, 100]`.
    pub fn new(x: Percent, y: Percent) -> Self {
        Self {
            x: clamp_percent(x),
            y: clamp_percent(y),
        }
    }

    /// Converts to pixels for a surface of the given size.
    pub fn to_pixels(self, width: f64, height: f64) -> (f64, f64) {
        (self.x / 100.0 * width, self.y / 100.0 * height)
    }
}

/// Clamps a percentage into `[0, 100]`. NaN becomes 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Rounds to one decimal place, half away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
