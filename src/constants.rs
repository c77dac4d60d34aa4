//! Global constants for the VAT annotation engine

/// View transform constants.
pub mod zoom {
    /// Zoom increment/decrement factor
    pub const FACTOR: f64 = 1.1;
    /// Maximum zoom level
    pub const MAX: f64 = 5.0;
    /// Minimum zoom level
    pub const MIN: f64 = 0.5;
}

/// Interaction constants.
pub mod interaction {
    /// Pointer-downs on the same tool closer together than this are one click.
    pub const DEBOUNCE_MS: u64 = 10;
}

/// Annotation constants.
pub mod annotation {
    /// Default keypoint marker radius (image pixels)
    pub const DEFAULT_KEYPOINT_SIZE: f64 = 5.0;
    /// Smallest keypoint marker radius
    pub const MIN_KEYPOINT_SIZE: f64 = 1.0;
    /// Line width for parent links and skeleton edges
    pub const LINK_WIDTH: f64 = 2.0;
    /// Label used for occlusion boxes
    pub const OCCLUSION: &str = "Occlusion";
    /// Label used for masked-out boxes
    pub const HIDE_REGION: &str = "Hide Region";
}
