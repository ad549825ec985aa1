//! Skateboard bounding box.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::landmark::Point2;

/// Axis-aligned board box in pixel corner format (x1, y1, x2, y2).
///
/// Corners are stored as reported by the detector; nothing reorders them, so
/// the signed board angle sees the raw corner deltas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoardBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoardBox {
    /// Create a new board box from corners.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box midpoint.
    #[inline]
    pub fn center(&self) -> Point2 {
        Point2::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Signed horizontal extent (x2 - x1).
    #[inline]
    pub fn dx(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Signed vertical extent (y2 - y1).
    #[inline]
    pub fn dy(&self) -> f64 {
        self.y2 - self.y1
    }
}
