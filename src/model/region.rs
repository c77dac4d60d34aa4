//! Region (bounding box) data model.

use serde::{Deserialize, Serialize};

/// An axis-aligned labeled rectangle, e.g. an occlusion marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Top-left corner X coordinate
    pub x1: f64,
    /// Top-left corner Y coordinate
    pub y1: f64,
    /// Bottom-right corner X coordinate
    pub x2: f64,
    /// Bottom-right corner Y coordinate
    pub y2: f64,
    pub label: String,
}

impl Region {
    /// Create a region from two arbitrary corners, normalized so that
    /// `x1 <= x2` and `y1 <= y2`.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64, label: impl Into<String>) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
            label: label.into(),
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// A region with zero width or height cannot be committed.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes() {
        let r = Region::from_corners(50.0, 80.0, 10.0, 20.0, "Occlusion");
        assert_eq!((r.x1, r.y1, r.x2, r.y2), (10.0, 20.0, 50.0, 80.0));
        assert_eq!(r.width(), 40.0);
        assert_eq!(r.height(), 60.0);
        assert_eq!(r, Region::from_corners(10.0, 20.0, 50.0, 80.0, "Occlusion"));
    }

    #[test]
    fn test_degenerate() {
        assert!(Region::from_corners(1.0, 1.0, 1.0, 5.0, "Occlusion").is_degenerate());
        assert!(!Region::from_corners(0.0, 0.0, 5.0, 5.0, "Occlusion").is_degenerate());
    }
}
