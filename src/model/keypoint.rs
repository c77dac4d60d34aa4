//! Keypoint data model.

/// Unique identifier for a keypoint, assigned monotonically per session.
pub type KeypointId = u64;

/// A labeled point landmark in image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Keypoint {
    /// Unique identifier
    pub id: KeypointId,
    /// Image-space X coordinate
    pub x: f64,
    /// Image-space Y coordinate
    pub y: f64,
    /// Vessel label
    pub label: String,
    /// Keypoints this one continues from, without duplicates
    pub parents: Vec<KeypointId>,
}

impl Keypoint {
    /// Create a keypoint with no parents.
    pub fn new(id: KeypointId, x: f64, y: f64, label: impl Into<String>) -> Self {
        Self {
            id,
            x,
            y,
            label: label.into(),
            parents: Vec::new(),
        }
    }

    /// Calculate distance to an image-space position.
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        let dx = self.x - x;
        let dy = self.y - y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether this keypoint sits at the given coordinate+label snapshot.
    pub fn matches(&self, x: f64, y: f64, label: &str) -> bool {
        self.x == x && self.y == y && self.label == label
    }

    /// Whether two keypoints share the same coordinate+label snapshot.
    pub fn same_snapshot(&self, other: &Keypoint) -> bool {
        self.matches(other.x, other.y, &other.label)
    }

    /// Add a parent link; returns false if it was already present.
    pub fn link_parent(&mut self, parent: KeypointId) -> bool {
        if self.parents.contains(&parent) {
            return false;
        }
        self.parents.push(parent);
        true
    }

    /// Remove a parent link; returns false if it was not present.
    pub fn unlink_parent(&mut self, parent: KeypointId) -> bool {
        let before = self.parents.len();
        self.parents.retain(|&p| p != parent);
        self.parents.len() != before
    }
}
