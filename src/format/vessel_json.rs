//! Vessel JSON format.
//!
//! Converts between the in-memory annotations of one image and an
//! [`AnnotationDocument`]. Internal keypoint ids never leave the process:
//! export rewrites them to positions in the `vessel` array and import assigns
//! fresh ids in array order.

use std::path::Path;

use crate::annotation::ImageAnnotations;
use crate::format::document::{AnnotationDocument, ParentRef, VesselEntry};
use crate::format::error::FormatError;
use crate::model::{ImageInfo, Keypoint, KeypointId, Region};

/// Result of converting a document back into annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedImage {
    pub info: ImageInfo,
    pub annotations: ImageAnnotations,
    /// First id not used by `annotations`
    pub next_id: KeypointId,
}

/// Build the interchange document for one image.
pub fn export_image(image: &ImageAnnotations, info: &ImageInfo) -> AnnotationDocument {
    let vessel = image
        .keypoints()
        .iter()
        .enumerate()
        .map(|(index, kp)| VesselEntry {
            id: index,
            x: kp.x,
            y: kp.y,
            label: kp.label.clone(),
            parent: ParentRef::from_indices(
                kp.parents
                    .iter()
                    .filter_map(|id| image.index_of(*id))
                    .collect(),
            ),
        })
        .collect();

    AnnotationDocument {
        filename: info.name.clone(),
        width: info.width,
        height: info.height,
        vessel,
        skeleton: image.edges().cloned().collect(),
        bbox: image.regions().to_vec(),
    }
}

/// Parse a document, reporting schema mismatches as malformed annotations.
pub fn parse_document(bytes: &[u8]) -> Result<AnnotationDocument, FormatError> {
    serde_json::from_slice(bytes).map_err(|e| FormatError::malformed(e.to_string()))
}

/// Rebuild annotations from a document, numbering keypoints from `next_id`.
///
/// Fails without side effects if any parent index is out of range.
pub fn import_image(
    doc: &AnnotationDocument,
    next_id: KeypointId,
) -> Result<ImportedImage, FormatError> {
    let count = doc.vessel.len();
    let id_at = |index: usize| next_id + index as KeypointId;

    let mut keypoints = Vec::with_capacity(count);
    for (index, entry) in doc.vessel.iter().enumerate() {
        let mut kp = Keypoint::new(id_at(index), entry.x, entry.y, entry.label.as_str());
        if let Some(parent) = &entry.parent {
            for &p in parent.indices() {
                if p >= count {
                    return Err(FormatError::malformed(format!(
                        "vessel {} references parent {} but the document has {} vessels",
                        index, p, count
                    )));
                }
                kp.link_parent(id_at(p));
            }
        }
        keypoints.push(kp);
    }

    let dangling = doc
        .skeleton
        .iter()
        .filter(|edge| {
            !keypoints.iter().any(|kp| edge.starts_at(kp))
                || !keypoints.iter().any(|kp| edge.ends_at(kp))
        })
        .count();
    if dangling > 0 {
        log::warn!("{} skeleton edges do not match any vessel", dangling);
    }

    let regions = doc
        .bbox
        .iter()
        .map(|r| Region::from_corners(r.x1, r.y1, r.x2, r.y2, r.label.as_str()))
        .collect();

    Ok(ImportedImage {
        info: ImageInfo::new(doc.filename.as_str(), doc.width, doc.height),
        annotations: ImageAnnotations::from_parts(keypoints, doc.skeleton.clone(), regions),
        next_id: id_at(count),
    })
}

/// File-level helpers for the vessel JSON format.
pub struct VesselJsonFormat;

impl VesselJsonFormat {
    pub fn extension(&self) -> &'static str {
        "json"
    }

    /// Serialize a document as pretty-printed JSON.
    pub fn export_to_bytes(&self, doc: &AnnotationDocument) -> Result<Vec<u8>, FormatError> {
        let json = serde_json::to_string_pretty(doc)?;
        log::info!(
            "Exported '{}': {} vessels, {} skeleton edges, {} regions",
            doc.filename,
            doc.vessel.len(),
            doc.skeleton.len(),
            doc.bbox.len()
        );
        Ok(json.into_bytes())
    }

    pub fn export(&self, doc: &AnnotationDocument, path: &Path) -> Result<(), FormatError> {
        log::info!("Exporting annotations to {:?}", path);
        let bytes = self.export_to_bytes(doc)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn import_from_bytes(&self, bytes: &[u8]) -> Result<AnnotationDocument, FormatError> {
        let doc = parse_document(bytes)?;
        log::info!(
            "Imported '{}': {} annotations",
            doc.filename,
            doc.total_annotations()
        );
        Ok(doc)
    }

    pub fn import(&self, path: &Path) -> Result<AnnotationDocument, FormatError> {
        log::info!("Importing annotations from {:?}", path);
        let bytes = std::fs::read(path)?;
        self.import_from_bytes(&bytes)
    }
}
