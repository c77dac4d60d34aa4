//! Redo history for annotation collections.
//!
//! Each collection of each image keeps its own [`History`]: a stack of the
//! entries most recently removed by undo. Redo pops the stack and re-applies
//! the entry. Entries carry everything needed to reverse their removal, which
//! for keypoints includes the skeleton edges and parent links that were
//! cascaded away with them.

use crate::model::{Keypoint, KeypointId, SkeletonEdge};

// ============================================================================
// History Entries
// ============================================================================

/// A stored skeleton edge together with whether creating it added a parent
/// link to its end keypoint (the link existed already otherwise, e.g. from
/// same-label chaining, and must survive the edge's removal).
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub edge: SkeletonEdge,
    pub linked_parent: bool,
}

impl EdgeRecord {
    pub fn new(edge: SkeletonEdge, linked_parent: bool) -> Self {
        Self {
            edge,
            linked_parent,
        }
    }
}

/// A skeleton edge removed as a side effect of removing a keypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadedEdge {
    /// Position the edge occupied in the skeleton collection
    pub index: usize,
    pub record: EdgeRecord,
}

/// A keypoint removed by undo, with everything its removal cascaded into.
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointRemoval {
    pub keypoint: Keypoint,
    /// Edges that touched the keypoint's snapshot, in collection order
    pub cascaded_edges: Vec<CascadedEdge>,
    /// Keypoints whose `parents` contained the removed id
    pub unlinked_children: Vec<KeypointId>,
}

impl KeypointRemoval {
    pub fn new(keypoint: Keypoint) -> Self {
        Self {
            keypoint,
            cascaded_edges: Vec::new(),
            unlinked_children: Vec::new(),
        }
    }
}

/// Short description used in log messages.
pub trait Describe {
    fn describe(&self) -> String;
}

impl Describe for KeypointRemoval {
    fn describe(&self) -> String {
        format!(
            "keypoint {} '{}' (+{} edges)",
            self.keypoint.id,
            self.keypoint.label,
            self.cascaded_edges.len()
        )
    }
}

impl Describe for EdgeRecord {
    fn describe(&self) -> String {
        format!("edge '{}' -> '{}'", self.edge.label1, self.edge.label2)
    }
}

impl Describe for crate::model::Region {
    fn describe(&self) -> String {
        format!("region '{}'", self.label)
    }
}

// ============================================================================
// History Stack
// ============================================================================

/// Stack of undone entries that can be redone (most recent at the end).
#[derive(Debug, Clone, PartialEq)]
pub struct History<T> {
    entries: Vec<T>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Describe> History<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an undone entry.
    pub fn push(&mut self, entry: T) {
        log::debug!("⏪ Undo: {}", entry.describe());
        self.entries.push(entry);
    }

    /// Take the most recently undone entry for redoing.
    pub fn pop(&mut self) -> Option<T> {
        let entry = self.entries.pop()?;
        log::debug!("⏩ Redo: {}", entry.describe());
        Some(entry)
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Drop all entries; called whenever a new action invalidates them.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            log::debug!("🗑️ Redo history cleared ({} entries)", self.entries.len());
        }
        self.entries.clear();
    }

    /// Drop the entries matching `predicate`.
    pub fn discard_where(&mut self, predicate: impl Fn(&T) -> bool) {
        self.entries.retain(|e| !predicate(e));
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================
