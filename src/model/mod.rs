//! Data models for VAT.

mod image;
mod keypoint;
mod label;
mod region;
mod skeleton;
mod tool;

pub use image::ImageInfo;
pub use keypoint::{Keypoint, KeypointId};
pub use label::{Color, FALLBACK_COLOR, LabelGroup, LabelLayer, LabelTable, default_groups};
pub use region::Region;
pub use skeleton::SkeletonEdge;
pub use tool::Tool;
