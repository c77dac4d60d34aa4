//! Annotation tool types.

/// Annotation tools available in the application.
///
/// Keypoint and region tools carry the label that new annotations receive;
/// the skeleton tool connects existing keypoints and needs no label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tool {
    /// Place labeled keypoints
    Keypoint(String),
    /// Connect two existing keypoints
    Skeleton,
    /// Draw labeled rectangles with two clicks
    Region(String),
}

impl Tool {
    /// Get the display name for this tool.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Keypoint(_) => "Keypoint",
            Tool::Skeleton => "Skeleton",
            Tool::Region(_) => "Region",
        }
    }

    /// Label attached to annotations created by this tool.
    pub fn label(&self) -> Option<&str> {
        match self {
            Tool::Keypoint(label) | Tool::Region(label) => Some(label),
            Tool::Skeleton => None,
        }
    }
}
