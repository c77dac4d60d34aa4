//! Image (page) metadata.

use crate::format::VesselJsonFormat;

/// A loaded image as seen by the annotator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageInfo {
    /// File name, used as the export `filename` and to derive the export file name
    pub name: String,
    /// Natural width in pixels
    pub width: u32,
    /// Natural height in pixels
    pub height: u32,
}

impl ImageInfo {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    /// File name annotations of this image are exported under.
    pub fn export_file_name(&self) -> String {
        format!("{}.{}", self.name, VesselJsonFormat.extension())
    }
}
