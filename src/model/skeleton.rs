//! Skeleton edge data model.

use serde::{Deserialize, Serialize};

use super::Keypoint;

/// A directed connector between two keypoints.
///
/// Edges are snapshots of their endpoints' coordinates and labels at creation
/// time rather than id references; two edges are the same edge iff all six
/// fields are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonEdge {
    pub x1: f64,
    pub y1: f64,
    pub label1: String,
    pub x2: f64,
    pub y2: f64,
    pub label2: String,
}

impl SkeletonEdge {
    /// Snapshot an edge from `start` to `end`.
    pub fn between(start: &Keypoint, end: &Keypoint) -> Self {
        Self {
            x1: start.x,
            y1: start.y,
            label1: start.label.clone(),
            x2: end.x,
            y2: end.y,
            label2: end.label.clone(),
        }
    }

    pub fn starts_at(&self, kp: &Keypoint) -> bool {
        kp.matches(self.x1, self.y1, &self.label1)
    }

    pub fn ends_at(&self, kp: &Keypoint) -> bool {
        kp.matches(self.x2, self.y2, &self.label2)
    }

    /// Whether either endpoint is the given keypoint's snapshot.
    pub fn touches(&self, kp: &Keypoint) -> bool {
        self.starts_at(kp) || self.ends_at(kp)
    }
}
