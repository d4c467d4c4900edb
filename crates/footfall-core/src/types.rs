//! Core types for the Footfall monitor
//!
//! This module provides the plain data shared by every tier:
//! - Validated ADC readings from the vibration sensors
//! - Corner sensor identifiers and their positions on the surface
//! - Surface dimensions and geometry helpers
//! - Calibration marks for display overlays

use serde::{Deserialize, Serialize};

// ============================================================================
// ADC Samples
// ============================================================================

/// Inclusive range of ADC codes the acquisition front-end can produce.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdcRange {
    /// Lowest valid code
    pub min: i32,
    /// Highest valid code
    pub max: i32,
}

impl AdcRange {
    /// 12-bit converter (0..=4095), the observed default.
    pub const TWELVE_BIT: Self = Self { min: 0, max: 4095 };

    /// Create a new range. Call [`AdcRange::validate`] before relying on it.
    #[inline]
    #[must_use]
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Check whether an integer code lies in range.
    #[inline]
    #[must_use]
    pub const fn contains(self, code: i32) -> bool {
        code >= self.min && code <= self.max
    }

    /// Mid-scale value, used to seed a baseline before any data arrives.
    #[inline]
    #[must_use]
    pub fn midpoint(self) -> f64 {
        (f64::from(self.min) + f64::from(self.max)) / 2.0
    }

    /// Validate a reading.
    ///
    /// Readings are rounded to the nearest code. Non-finite values and codes
    /// outside the range yield `None`.
    #[must_use]
    pub fn sample(self, value: f64) -> Option<RawSample> {
        if !value.is_finite() {
            return None;
        }
        let rounded = libm::round(value);
        if rounded < f64::from(self.min) || rounded > f64::from(self.max) {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        Some(RawSample(rounded as i32))
    }

    /// Parse a textual reading (e.g. one line of a serial log).
    #[must_use]
    pub fn parse(self, text: &str) -> Option<RawSample> {
        text.trim().parse::<f64>().ok().and_then(|v| self.sample(v))
    }
}

impl Default for AdcRange {
    fn default() -> Self {
        Self::TWELVE_BIT
    }
}

/// A single ADC reading known to be inside its [`AdcRange`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RawSample(i32);

impl RawSample {
    /// The ADC code
    #[inline]
    #[must_use]
    pub const fn code(self) -> i32 {
        self.0
    }

    /// The ADC code as a float
    #[inline]
    #[must_use]
    pub fn to_f64(self) -> f64 {
        f64::from(self.0)
    }
}

// ============================================================================
// Sensor Layout
// ============================================================================

/// Corner position of a sensor on the rectangular surface.
///
/// Coordinates grow to the right (x) and downward (y) from the top-left corner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    /// (0, 0)
    TopLeft,
    /// (width, 0)
    TopRight,
    /// (0, height)
    BottomLeft,
    /// (width, height)
    BottomRight,
}

impl Corner {
    /// All corners in channel order.
    pub const ALL: [Self; 4] = [Self::TopLeft, Self::TopRight, Self::BottomLeft, Self::BottomRight];

    /// Channel index of this corner (0-3).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::TopLeft => 0,
            Self::TopRight => 1,
            Self::BottomLeft => 2,
            Self::BottomRight => 3,
        }
    }
}

/// A vibration sensor mounted on the surface.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    /// Which corner the sensor sits in
    pub id: Corner,
    /// X position (cm)
    pub x_cm: f64,
    /// Y position (cm)
    pub y_cm: f64,
}

impl Sensor {
    /// Euclidean distance from the sensor to a point on the surface (cm).
    #[inline]
    #[must_use]
    pub fn distance_to(&self, x_cm: f64, y_cm: f64) -> f64 {
        let dx = x_cm - self.x_cm;
        let dy = y_cm - self.y_cm;
        libm::sqrt(dx * dx + dy * dy)
    }
}

/// Rectangular monitored surface with one sensor in each corner.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceLayout {
    /// Surface width (cm)
    pub width_cm: f64,
    /// Surface height (cm)
    pub height_cm: f64,
}

impl SurfaceLayout {
    /// Create a layout. Call [`SurfaceLayout::validate`] before relying on it.
    #[inline]
    #[must_use]
    pub const fn new(width_cm: f64, height_cm: f64) -> Self {
        Self { width_cm, height_cm }
    }

    /// The four corner sensors, indexed by [`Corner::index`].
    #[must_use]
    pub fn sensors(&self) -> [Sensor; 4] {
        Corner::ALL.map(|id| {
            let (x_cm, y_cm) = match id {
                Corner::TopLeft => (0.0, 0.0),
                Corner::TopRight => (self.width_cm, 0.0),
                Corner::BottomLeft => (0.0, self.height_cm),
                Corner::BottomRight => (self.width_cm, self.height_cm),
            };
            Sensor { id, x_cm, y_cm }
        })
    }

    /// Geometric centre of the surface
    #[inline]
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.width_cm / 2.0, self.height_cm / 2.0)
    }

    /// Whether a point lies on the surface (edges included)
    #[inline]
    #[must_use]
    pub fn contains(&self, x_cm: f64, y_cm: f64) -> bool {
        (0.0..=self.width_cm).contains(&x_cm) && (0.0..=self.height_cm).contains(&y_cm)
    }

    /// Clamp a point onto the surface
    #[inline]
    #[must_use]
    pub fn clamp(&self, x_cm: f64, y_cm: f64) -> (f64, f64) {
        (x_cm.clamp(0.0, self.width_cm), y_cm.clamp(0.0, self.height_cm))
    }
}

impl Default for SurfaceLayout {
    fn default() -> Self {
        Self::new(100.0, 100.0)
    }
}

// ============================================================================
// Calibration Marks
// ============================================================================

/// Reference mark drawn over the surface by display layers.
///
/// The solver never reads these; they are stored and handed back unchanged.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Mark identifier assigned by the operator
    pub id: u16,
    /// X position (cm)
    pub x_cm: f64,
    /// Y position (cm)
    pub y_cm: f64,
}
