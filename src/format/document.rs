//! JSON interchange document.
//!
//! One document describes the annotations of one image:
//!
//! ```json
//! {
//!   "filename": "angio.png", "width": 512, "height": 512,
//!   "vessel":   [{ "id": 0, "x": 10.0, "y": 10.0, "label": "ICA", "parent": null }],
//!   "skeleton": [{ "x1": 0, "y1": 0, "label1": "ICA", "x2": 5, "y2": 5, "label2": "MCA1" }],
//!   "bbox":     [{ "x1": 0, "y1": 0, "x2": 5, "y2": 5, "label": "Occlusion" }]
//! }
//! ```
//!
//! Vessel `id`s are positions in the `vessel` array and `parent` refers to
//! those positions.

use serde::{Deserialize, Serialize};

use crate::model::{Region, SkeletonEdge};

/// Annotations of a single image as exchanged on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub vessel: Vec<VesselEntry>,
    #[serde(default)]
    pub skeleton: Vec<SkeletonEdge>,
    #[serde(default)]
    pub bbox: Vec<Region>,
}

impl AnnotationDocument {
    /// Total number of annotations of all kinds.
    pub fn total_annotations(&self) -> usize {
        self.vessel.len() + self.skeleton.len() + self.bbox.len()
    }
}

/// A keypoint with positional id and parent references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselEntry {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub label: String,
    /// Serialized as `null` when the keypoint has no parent
    #[serde(default)]
    pub parent: Option<ParentRef>,
}

/// Parent reference: a single index, or an array when there are several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParentRef {
    One(usize),
    Many(Vec<usize>),
}

impl ParentRef {
    /// `None` for no parents, a bare index for one, an array otherwise.
    pub fn from_indices(indices: Vec<usize>) -> Option<Self> {
        match indices.as_slice() {
            [] => None,
            [single] => Some(ParentRef::One(*single)),
            _ => Some(ParentRef::Many(indices)),
        }
    }

    pub fn indices(&self) -> &[usize] {
        match self {
            ParentRef::One(index) => std::slice::from_ref(index),
            ParentRef::Many(indices) => indices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_ref_shapes() {
        assert_eq!(ParentRef::from_indices(vec![]), None);
        assert_eq!(ParentRef::from_indices(vec![3]), Some(ParentRef::One(3)));
        assert_eq!(
            ParentRef::from_indices(vec![1, 2]),
            Some(ParentRef::Many(vec![1, 2]))
        );
        assert_eq!(ParentRef::Many(vec![4, 5]).indices(), &[4, 5]);
        assert_eq!(ParentRef::One(7).indices(), &[7]);
    }

    #[test]
    fn test_missing_sections_default() {
        let doc: AnnotationDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(doc, AnnotationDocument::default());
        assert_eq!(doc.total_annotations(), 0);
    }

    #[test]
    fn test_null_parent_serialized() {
        let entry = VesselEntry {
            id: 0,
            x: 1.0,
            y: 2.0,
            label: "ICA".into(),
            parent: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value["parent"].is_null());
    }
}
