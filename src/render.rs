//! Render read model.
//!
//! [`RenderScene`] lists everything a front end draws for the active image,
//! in image coordinates with colors resolved through the [`LabelTable`].

use crate::annotation::ImageAnnotations;
use crate::constants::annotation::{DEFAULT_KEYPOINT_SIZE, LINK_WIDTH, MIN_KEYPOINT_SIZE};
use crate::model::{Color, Keypoint, KeypointId, LabelTable, Region};

/// User-adjustable drawing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    keypoint_size: f64,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            keypoint_size: DEFAULT_KEYPOINT_SIZE,
        }
    }
}

impl RenderStyle {
    pub fn new(keypoint_size: f64) -> Self {
        let mut style = Self::default();
        style.set_keypoint_size(keypoint_size);
        style
    }

    pub fn keypoint_size(&self) -> f64 {
        self.keypoint_size
    }

    pub fn set_keypoint_size(&mut self, size: f64) {
        self.keypoint_size = if size.is_finite() {
            size.max(MIN_KEYPOINT_SIZE)
        } else {
            DEFAULT_KEYPOINT_SIZE
        };
    }

    pub fn increase_keypoint_size(&mut self) {
        self.set_keypoint_size(self.keypoint_size + 1.0);
    }

    pub fn decrease_keypoint_size(&mut self) {
        self.set_keypoint_size(self.keypoint_size - 1.0);
    }
}

/// A keypoint marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: KeypointId,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: Color,
}

impl Marker {
    fn new(kp: &Keypoint, radius: f64, color: Color) -> Self {
        Self {
            id: kp.id,
            x: kp.x,
            y: kp.y,
            radius,
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: Color,
}

impl Rect {
    fn from_region(region: &Region, color: Color) -> Self {
        Self {
            x: region.x1,
            y: region.y1,
            width: region.width(),
            height: region.height(),
            color,
        }
    }
}

/// Everything to draw for one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderScene {
    pub markers: Vec<Marker>,
    /// Lines from a keypoint to each same-label parent
    pub parent_links: Vec<Line>,
    pub skeleton_lines: Vec<Line>,
    pub regions: Vec<Rect>,
    /// Region being drawn
    pub preview: Option<Rect>,
    /// Highlighted start of a pending skeleton edge
    pub pending: Option<Marker>,
}

impl RenderScene {
    pub fn build(
        image: Option<&ImageAnnotations>,
        labels: &LabelTable,
        style: &RenderStyle,
        preview: Option<&Region>,
        pending: Option<&Keypoint>,
    ) -> Self {
        let radius = style.keypoint_size();
        let mut scene = Self {
            preview: preview.map(|r| Rect::from_region(r, labels.color_of(&r.label))),
            pending: pending.map(|kp| Marker::new(kp, radius * 1.5, labels.color_of(&kp.label))),
            ..Default::default()
        };
        let Some(image) = image else {
            return scene;
        };

        for kp in image.keypoints() {
            let color = labels.color_of(&kp.label);
            scene.markers.push(Marker::new(kp, radius, color));

            // Only same-label parents form the vessel's own polyline.
            for parent in kp.parents.iter().filter_map(|id| image.keypoint(*id)) {
                if parent.label == kp.label {
                    scene.parent_links.push(Line {
                        x1: parent.x,
                        y1: parent.y,
                        x2: kp.x,
                        y2: kp.y,
                        width: LINK_WIDTH,
                        color,
                    });
                }
            }
        }

        scene.skeleton_lines = image
            .edges()
            .map(|edge| Line {
                x1: edge.x1,
                y1: edge.y1,
                x2: edge.x2,
                y2: edge.y2,
                width: LINK_WIDTH,
                color: labels.color_of(&edge.label2),
            })
            .collect();

        scene.regions = image
            .regions()
            .iter()
            .map(|r| Rect::from_region(r, labels.color_of(&r.label)))
            .collect();

        scene
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
            && self.skeleton_lines.is_empty()
            && self.regions.is_empty()
            && self.preview.is_none()
            && self.pending.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationStore;
    use crate::model::FALLBACK_COLOR;

    fn labels() -> LabelTable {
        let mut labels = LabelTable::new();
        labels.set_color("ICA", [255, 0, 0]);
        labels.set_color("MCA1", [0, 0, 255]);
        labels
    }

    #[test]
    fn test_keypoint_size_bounds() {
        let mut style = RenderStyle::default();
        assert_eq!(style.keypoint_size(), DEFAULT_KEYPOINT_SIZE);
        style.increase_keypoint_size();
        assert_eq!(style.keypoint_size(), DEFAULT_KEYPOINT_SIZE + 1.0);
        for _ in 0..20 {
            style.decrease_keypoint_size();
        }
        assert_eq!(style.keypoint_size(), MIN_KEYPOINT_SIZE);
        assert_eq!(RenderStyle::new(0.0).keypoint_size(), MIN_KEYPOINT_SIZE);
    }

    #[test]
    fn test_empty_scene() {
        let scene = RenderScene::build(None, &labels(), &RenderStyle::default(), None, None);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_scene_contents() {
        let mut store = AnnotationStore::new();
        let a = store.add_keypoint(0.0, 0.0, "ICA");
        store.add_keypoint(10.0, 0.0, "ICA");
        let m = store.add_keypoint(20.0, 20.0, "MCA1");
        store.complete_skeleton_edge(&a, 20.0, 20.0).unwrap();
        store.add_region(0.0, 0.0, 5.0, 5.0, "Occlusion");

        let labels = labels();
        let style = RenderStyle::new(4.0);
        let preview = Region::from_corners(1.0, 1.0, 2.0, 3.0, "Occlusion");
        let scene = RenderScene::build(store.current(), &labels, &style, Some(&preview), Some(&m));

        assert_eq!(scene.markers.len(), 3);
        assert!(scene.markers.iter().all(|m| m.radius == 4.0));
        assert_eq!(scene.markers[2].color, [0, 0, 255]);
        // Chain ICA->ICA is drawn; the cross-label ICA->MCA1 parent is not.
        assert_eq!(scene.parent_links.len(), 1);
        assert_eq!(scene.parent_links[0].color, [255, 0, 0]);
        assert_eq!(scene.skeleton_lines.len(), 1);
        assert_eq!(scene.skeleton_lines[0].color, [0, 0, 255]);
        assert_eq!(scene.regions.len(), 1);
        assert_eq!(scene.regions[0].color, FALLBACK_COLOR);
        assert_eq!(scene.preview.as_ref().map(|r| r.height), Some(2.0));
        assert_eq!(scene.pending.as_ref().map(|p| p.id), Some(m.id));
    }
}
