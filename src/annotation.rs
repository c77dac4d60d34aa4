//! Annotation state engine.
//!
//! This module provides per-image annotation storage:
//! - [`ImageAnnotations`]: the keypoint, skeleton and region collections of a
//!   single image, each with its own redo history
//! - [`AnnotationStore`]: an arena of [`ImageAnnotations`] keyed by image
//!   index, plus the session-wide keypoint id counter
//!
//! Every mutation goes through the methods defined here. Keypoints reference
//! their parents by id; skeleton edges are coordinate+label snapshots, so
//! removing a keypoint cascades into the edges whose endpoint snapshot matches
//! it and into the `parents` of the other keypoints.

use std::collections::BTreeMap;

use crate::model::{Keypoint, KeypointId, Region, SkeletonEdge};
use crate::undo::{CascadedEdge, Describe, EdgeRecord, History, KeypointRemoval};

/// Index of an image (page) in the loaded image list.
pub type ImageIndex = usize;

// ============================================================================
// Collections
// ============================================================================

/// Items of one annotation layer plus the entries undone from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T, H> {
    items: Vec<T>,
    history: History<H>,
}

impl<T, H> Default for Collection<T, H> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            history: History::default(),
        }
    }
}

impl<T, H: Describe> Collection<T, H> {
    fn with_items(items: Vec<T>) -> Self {
        Self {
            items,
            history: History::new(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    fn clear(&mut self) {
        self.items.clear();
        self.history.clear();
    }
}

/// Why a skeleton edge could not be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRejection {
    /// The image has no keypoints to connect.
    NoKeypoints,
    /// The start keypoint was removed while the edge was pending.
    StartMissing,
    /// Start and end resolve to the same keypoint.
    SelfLoop,
}

// ============================================================================
// Per-image State
// ============================================================================

/// All annotations of a single image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageAnnotations {
    keypoints: Collection<Keypoint, KeypointRemoval>,
    skeleton: Collection<EdgeRecord, EdgeRecord>,
    regions: Collection<Region, Region>,
}

impl ImageAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an image from already-validated collections with empty histories.
    ///
    /// Edges built this way never own the parent links of their end keypoint,
    /// so undoing them leaves `parents` untouched.
    pub fn from_parts(keypoints: Vec<Keypoint>, edges: Vec<SkeletonEdge>, regions: Vec<Region>) -> Self {
        Self {
            keypoints: Collection::with_items(keypoints),
            skeleton: Collection::with_items(
                edges
                    .into_iter()
                    .map(|edge| EdgeRecord::new(edge, false))
                    .collect(),
            ),
            regions: Collection::with_items(regions),
        }
    }

    // ------------------------------------------------------------------------
    // Read model
    // ------------------------------------------------------------------------

    pub fn keypoints(&self) -> &[Keypoint] {
        self.keypoints.items()
    }

    pub fn edges(&self) -> impl Iterator<Item = &SkeletonEdge> {
        self.skeleton.items().iter().map(|r| &r.edge)
    }

    pub fn edge_records(&self) -> &[EdgeRecord] {
        self.skeleton.items()
    }

    pub fn regions(&self) -> &[Region] {
        self.regions.items()
    }

    pub fn keypoint(&self, id: KeypointId) -> Option<&Keypoint> {
        self.keypoints.items.iter().find(|kp| kp.id == id)
    }

    fn keypoint_mut(&mut self, id: KeypointId) -> Option<&mut Keypoint> {
        self.keypoints.items.iter_mut().find(|kp| kp.id == id)
    }

    /// Position of a keypoint in insertion order.
    pub fn index_of(&self, id: KeypointId) -> Option<usize> {
        self.keypoints.items.iter().position(|kp| kp.id == id)
    }

    fn find_snapshot(&self, x: f64, y: f64, label: &str) -> Option<usize> {
        self.keypoints
            .items
            .iter()
            .position(|kp| kp.matches(x, y, label))
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.items.is_empty()
            && self.skeleton.items.is_empty()
            && self.regions.items.is_empty()
    }

    pub fn can_undo_keypoint(&self) -> bool {
        !self.keypoints.items.is_empty()
    }

    pub fn can_undo_skeleton(&self) -> bool {
        !self.skeleton.items.is_empty()
    }

    pub fn can_undo_region(&self) -> bool {
        !self.regions.items.is_empty()
    }

    pub fn can_redo_keypoint(&self) -> bool {
        self.keypoints.history.can_redo()
    }

    pub fn can_redo_skeleton(&self) -> bool {
        self.skeleton.history.can_redo()
    }

    pub fn can_redo_region(&self) -> bool {
        self.regions.history.can_redo()
    }

    /// Nearest keypoint by Euclidean distance, without any cutoff. Ties go to
    /// the earliest keypoint.
    pub fn nearest_keypoint(&self, x: f64, y: f64) -> Option<&Keypoint> {
        let mut best: Option<(&Keypoint, f64)> = None;
        for kp in &self.keypoints.items {
            let distance = kp.distance_to(x, y);
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((kp, distance));
            }
        }
        best.map(|(kp, _)| kp)
    }

    // ------------------------------------------------------------------------
    // Keypoints
    // ------------------------------------------------------------------------

    /// Append a keypoint chained to the previous keypoint with the same label.
    pub fn add_keypoint(&mut self, id: KeypointId, x: f64, y: f64, label: &str) -> Keypoint {
        let mut keypoint = Keypoint::new(id, x, y, label);
        if let Some(previous) = self.keypoints.items.iter().rev().find(|kp| kp.label == label) {
            keypoint.parents.push(previous.id);
        }
        self.keypoints.items.push(keypoint.clone());
        self.keypoints.history.clear();
        self.skeleton.history.clear();
        log::debug!(
            "📍 Added keypoint {} '{}' at ({:.1}, {:.1}), parents {:?}",
            keypoint.id,
            keypoint.label,
            x,
            y,
            keypoint.parents
        );
        keypoint
    }

    /// Remove the most recent keypoint and everything that depends on it.
    pub fn undo_keypoint(&mut self) -> Option<Keypoint> {
        let keypoint = self.keypoints.items.pop()?;
        let mut removal = KeypointRemoval::new(keypoint);

        let mut kept = Vec::with_capacity(self.skeleton.items.len());
        for (index, record) in std::mem::take(&mut self.skeleton.items)
            .into_iter()
            .enumerate()
        {
            if record.edge.touches(&removal.keypoint) {
                removal.cascaded_edges.push(CascadedEdge { index, record });
            } else {
                kept.push(record);
            }
        }
        self.skeleton.items = kept;

        let removed_id = removal.keypoint.id;
        for other in &mut self.keypoints.items {
            if other.unlink_parent(removed_id) {
                removal.unlinked_children.push(other.id);
            }
        }

        // Undone edges that end or start at the removed point can no longer be redone.
        let snapshot = removal.keypoint.clone();
        self.skeleton
            .history
            .discard_where(|record| record.edge.touches(&snapshot));

        self.keypoints.history.push(removal);
        Some(snapshot)
    }

    /// Re-insert the most recently undone keypoint and its cascaded state.
    pub fn redo_keypoint(&mut self) -> Option<Keypoint> {
        let removal = self.keypoints.history.pop()?;
        let id = removal.keypoint.id;
        if self.keypoint(id).is_some() {
            log::warn!("Redo skipped: keypoint {} is already present", id);
            return None;
        }

        self.keypoints.items.push(removal.keypoint.clone());
        for child in &removal.unlinked_children {
            if let Some(kp) = self.keypoint_mut(*child) {
                kp.link_parent(id);
            }
        }
        // Only edges present before this redo count as duplicates, so repeated
        // copies of one edge all come back.
        let existing: Vec<SkeletonEdge> = self
            .skeleton
            .items
            .iter()
            .map(|r| r.edge.clone())
            .collect();
        for cascaded in removal.cascaded_edges {
            if existing.contains(&cascaded.record.edge) {
                continue;
            }
            let at = cascaded.index.min(self.skeleton.items.len());
            self.skeleton.items.insert(at, cascaded.record);
        }
        Some(removal.keypoint)
    }

    /// Remove every keypoint, the edges attached to them and the histories
    /// of both layers. Regions are left alone.
    pub fn reset_keypoints(&mut self) {
        let removed = std::mem::take(&mut self.keypoints.items);
        self.keypoints.history.clear();
        self.skeleton
            .items
            .retain(|record| !removed.iter().any(|kp| record.edge.touches(kp)));
        self.skeleton.history.clear();
        log::debug!("🗑️ Reset {} keypoints", removed.len());
    }

    // ------------------------------------------------------------------------
    // Skeleton
    // ------------------------------------------------------------------------

    /// Connect `start` to the keypoint nearest to `(x, y)`.
    pub fn complete_skeleton_edge(
        &mut self,
        start: &Keypoint,
        x: f64,
        y: f64,
    ) -> Result<SkeletonEdge, EdgeRejection> {
        let end = self
            .nearest_keypoint(x, y)
            .cloned()
            .ok_or(EdgeRejection::NoKeypoints)?;
        if self.keypoint(start.id).is_none() {
            log::warn!("Skeleton start keypoint {} no longer exists", start.id);
            return Err(EdgeRejection::StartMissing);
        }
        if end.same_snapshot(start) {
            log::warn!("Skeleton edge rejected: keypoint {} cannot connect to itself", start.id);
            return Err(EdgeRejection::SelfLoop);
        }

        let edge = SkeletonEdge::between(start, &end);
        let linked_parent = self
            .keypoint_mut(end.id)
            .map(|kp| kp.link_parent(start.id))
            .unwrap_or(false);
        self.skeleton
            .items
            .push(EdgeRecord::new(edge.clone(), linked_parent));
        self.skeleton.history.clear();
        log::debug!(
            "🦴 Added edge {} '{}' -> {} '{}'",
            start.id,
            start.label,
            end.id,
            end.label
        );
        Ok(edge)
    }

    /// Ids of the first keypoints matching an edge's start and end snapshots.
    fn edge_endpoints(&self, edge: &SkeletonEdge) -> Option<(KeypointId, usize)> {
        let start = self.find_snapshot(edge.x1, edge.y1, &edge.label1)?;
        let end = self.find_snapshot(edge.x2, edge.y2, &edge.label2)?;
        Some((self.keypoints.items[start].id, end))
    }

    fn unlink_edge(&mut self, record: &EdgeRecord) {
        if !record.linked_parent {
            return;
        }
        if let Some((start_id, end)) = self.edge_endpoints(&record.edge) {
            self.keypoints.items[end].unlink_parent(start_id);
        }
    }

    pub fn undo_skeleton_edge(&mut self) -> Option<SkeletonEdge> {
        let record = self.skeleton.items.pop()?;
        self.unlink_edge(&record);
        let edge = record.edge.clone();
        self.skeleton.history.push(record);
        Some(edge)
    }

    pub fn redo_skeleton_edge(&mut self) -> Option<SkeletonEdge> {
        let mut record = self.skeleton.history.pop()?;
        let Some((start_id, end)) = self.edge_endpoints(&record.edge) else {
            log::warn!("Redo skipped: an endpoint of {} no longer exists", record.describe());
            return None;
        };
        record.linked_parent =
            record.linked_parent && self.keypoints.items[end].link_parent(start_id);
        let edge = record.edge.clone();
        self.skeleton.items.push(record);
        Some(edge)
    }

    /// Remove every edge (and the parent links they created) and the history.
    pub fn reset_skeleton(&mut self) {
        let removed = std::mem::take(&mut self.skeleton.items);
        for record in removed.iter().rev() {
            self.unlink_edge(record);
        }
        self.skeleton.history.clear();
        log::debug!("🗑️ Reset {} skeleton edges", removed.len());
    }

    // ------------------------------------------------------------------------
    // Regions
    // ------------------------------------------------------------------------

    /// Add a region from two corners. Zero-area regions are rejected.
    pub fn add_region(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, label: &str) -> Option<Region> {
        let region = Region::from_corners(x1, y1, x2, y2, label);
        if region.is_degenerate() {
            log::debug!("Ignoring zero-area region '{}'", label);
            return None;
        }
        self.regions.items.push(region.clone());
        self.regions.history.clear();
        log::debug!(
            "▭ Added region '{}' ({:.1}, {:.1})-({:.1}, {:.1})",
            region.label,
            region.x1,
            region.y1,
            region.x2,
            region.y2
        );
        Some(region)
    }

    pub fn undo_region(&mut self) -> Option<Region> {
        let region = self.regions.items.pop()?;
        self.regions.history.push(region.clone());
        Some(region)
    }

    pub fn redo_region(&mut self) -> Option<Region> {
        let region = self.regions.history.pop()?;
        self.regions.items.push(region.clone());
        Some(region)
    }

    pub fn reset_regions(&mut self) {
        self.regions.clear();
    }
}

// ============================================================================
// Annotation Store
// ============================================================================

/// Annotations of every image in the session.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    images: BTreeMap<ImageIndex, ImageAnnotations>,
    active: ImageIndex,
    next_id: KeypointId,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self {
            images: BTreeMap::new(),
            active: 0,
            next_id: 1,
        }
    }

    pub fn active_image(&self) -> ImageIndex {
        self.active
    }

    /// Switch the image that subsequent operations apply to. Other images'
    /// annotations are kept.
    pub fn set_active_image(&mut self, index: ImageIndex) {
        if self.active != index {
            log::debug!("🖼️ Active image {} -> {}", self.active, index);
            self.active = index;
        }
    }

    /// Id the next keypoint will receive.
    pub fn next_id(&self) -> KeypointId {
        self.next_id
    }

    pub fn image(&self, index: ImageIndex) -> Option<&ImageAnnotations> {
        self.images.get(&index)
    }

    /// Annotations of the active image, if any were ever made.
    pub fn current(&self) -> Option<&ImageAnnotations> {
        self.images.get(&self.active)
    }

    fn current_mut(&mut self) -> &mut ImageAnnotations {
        self.images.entry(self.active).or_default()
    }

    /// Indices of images holding annotations.
    pub fn annotated_images(&self) -> impl Iterator<Item = ImageIndex> + '_ {
        self.images
            .iter()
            .filter(|(_, image)| !image.is_empty())
            .map(|(index, _)| *index)
    }

    /// Replace an image's annotations wholesale (used by import).
    ///
    /// `next_id` is the first id not used by `annotations`; the session
    /// counter never moves backwards.
    pub fn install_image(
        &mut self,
        index: ImageIndex,
        annotations: ImageAnnotations,
        next_id: KeypointId,
    ) {
        self.images.insert(index, annotations);
        self.next_id = self.next_id.max(next_id);
    }

    // ------------------------------------------------------------------------
    // Active-image shortcuts
    // ------------------------------------------------------------------------

    pub fn keypoints(&self) -> &[Keypoint] {
        self.current().map(|i| i.keypoints()).unwrap_or(&[])
    }

    pub fn edges(&self) -> Vec<SkeletonEdge> {
        self.current()
            .map(|i| i.edges().cloned().collect())
            .unwrap_or_default()
    }

    pub fn regions(&self) -> &[Region] {
        self.current().map(|i| i.regions()).unwrap_or(&[])
    }

    pub fn nearest_keypoint(&self, x: f64, y: f64) -> Option<&Keypoint> {
        self.current()?.nearest_keypoint(x, y)
    }

    pub fn add_keypoint(&mut self, x: f64, y: f64, label: &str) -> Keypoint {
        let id = self.next_id;
        self.next_id += 1;
        self.current_mut().add_keypoint(id, x, y, label)
    }

    pub fn undo_keypoint(&mut self) -> Option<Keypoint> {
        self.images.get_mut(&self.active)?.undo_keypoint()
    }

    pub fn redo_keypoint(&mut self) -> Option<Keypoint> {
        self.images.get_mut(&self.active)?.redo_keypoint()
    }

    /// Resolve the start point of a new skeleton edge.
    pub fn begin_skeleton_edge(&self, x: f64, y: f64) -> Option<Keypoint> {
        self.nearest_keypoint(x, y).cloned()
    }

    pub fn complete_skeleton_edge(
        &mut self,
        start: &Keypoint,
        x: f64,
        y: f64,
    ) -> Result<SkeletonEdge, EdgeRejection> {
        match self.images.get_mut(&self.active) {
            Some(image) => image.complete_skeleton_edge(start, x, y),
            None => Err(EdgeRejection::NoKeypoints),
        }
    }

    pub fn undo_skeleton_edge(&mut self) -> Option<SkeletonEdge> {
        self.images.get_mut(&self.active)?.undo_skeleton_edge()
    }

    pub fn redo_skeleton_edge(&mut self) -> Option<SkeletonEdge> {
        self.images.get_mut(&self.active)?.redo_skeleton_edge()
    }

    pub fn add_region(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, label: &str) -> Option<Region> {
        self.current_mut().add_region(x1, y1, x2, y2, label)
    }

    pub fn undo_region(&mut self) -> Option<Region> {
        self.images.get_mut(&self.active)?.undo_region()
    }

    pub fn redo_region(&mut self) -> Option<Region> {
        self.images.get_mut(&self.active)?.redo_region()
    }

    pub fn reset_keypoints(&mut self) {
        if let Some(image) = self.images.get_mut(&self.active) {
            image.reset_keypoints();
        }
    }

    pub fn reset_skeleton(&mut self) {
        if let Some(image) = self.images.get_mut(&self.active) {
            image.reset_skeleton();
        }
    }

    pub fn reset_regions(&mut self) {
        if let Some(image) = self.images.get_mut(&self.active) {
            image.reset_regions();
        }
    }

    pub fn can_redo_keypoint(&self) -> bool {
        self.current().is_some_and(|i| i.can_redo_keypoint())
    }

    pub fn can_redo_skeleton(&self) -> bool {
        self.current().is_some_and(|i| i.can_redo_skeleton())
    }

    pub fn can_redo_region(&self) -> bool {
        self.current().is_some_and(|i| i.can_redo_region())
    }

    pub fn can_undo_keypoint(&self) -> bool {
        self.current().is_some_and(|i| i.can_undo_keypoint())
    }

    pub fn can_undo_skeleton(&self) -> bool {
        self.current().is_some_and(|i| i.can_undo_skeleton())
    }

    pub fn can_undo_region(&self) -> bool {
        self.current().is_some_and(|i| i.can_undo_region())
    }
}

// ============================================================================
// Tests
// ============================================================================
