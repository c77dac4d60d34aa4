//! Pointer interaction: turns pointer events into store mutations according
//! to the active tool.
//!
//! Transient tool state (the pending skeleton start and the region anchor)
//! lives here, is dropped on tool switch, and is never persisted.

use std::time::Duration;

use web_time::Instant;

use crate::annotation::{AnnotationStore, EdgeRejection};
use crate::constants::interaction::DEBOUNCE_MS;
use crate::model::{Keypoint, Region, SkeletonEdge, Tool};
use crate::zoom_math::CoordinateMapper;

/// State of the skeleton tool between its two clicks.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SkeletonDraft {
    #[default]
    Idle,
    /// First click resolved to this keypoint.
    Pending(Keypoint),
}

/// State of the region tool between its two clicks.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RegionDraft {
    #[default]
    Idle,
    /// First corner placed; `current_*` follows the pointer.
    Anchored {
        start_x: f64,
        start_y: f64,
        current_x: f64,
        current_y: f64,
        label: String,
    },
}

impl RegionDraft {
    pub fn is_drawing(&self) -> bool {
        !matches!(self, RegionDraft::Idle)
    }

    /// Rectangle between the anchor and the pointer.
    pub fn preview(&self) -> Option<Region> {
        match self {
            RegionDraft::Idle => None,
            RegionDraft::Anchored {
                start_x,
                start_y,
                current_x,
                current_y,
                label,
            } => Some(Region::from_corners(
                *start_x,
                *start_y,
                *current_x,
                *current_y,
                label.as_str(),
            )),
        }
    }
}

/// Why a pointer-down produced no change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    NoActiveTool,
    SurfaceNotReady,
    /// Repeat of the previous click within the debounce window
    Debounced,
    /// Skeleton click on an image without keypoints
    NoKeypoints,
    SelfLoopRejected,
    /// The pending skeleton start was removed before completion
    StartMissing,
    /// Region with zero width or height
    DegenerateRegion,
}

/// Result of a pointer-down.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    KeypointAdded(Keypoint),
    SkeletonStarted(Keypoint),
    SkeletonCompleted(SkeletonEdge),
    RegionAnchored { x: f64, y: f64 },
    RegionCommitted(Region),
    Ignored(Ignored),
}

impl InteractionOutcome {
    /// Whether the store was mutated.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            InteractionOutcome::KeypointAdded(_)
                | InteractionOutcome::SkeletonCompleted(_)
                | InteractionOutcome::RegionCommitted(_)
        )
    }
}

/// Dispatches pointer events to the annotation store.
#[derive(Debug, Clone)]
pub struct InteractionController {
    tool: Option<Tool>,
    skeleton: SkeletonDraft,
    region: RegionDraft,
    debounce: Duration,
    last_click: Option<(Tool, Instant)>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEBOUNCE_MS))
    }
}

impl InteractionController {
    pub fn new(debounce: Duration) -> Self {
        Self {
            tool: None,
            skeleton: SkeletonDraft::Idle,
            region: RegionDraft::Idle,
            debounce,
            last_click: None,
        }
    }

    pub fn tool(&self) -> Option<&Tool> {
        self.tool.as_ref()
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Switch the active tool, discarding any in-progress skeleton or region.
    pub fn set_tool(&mut self, tool: Option<Tool>) {
        if self.tool == tool {
            return;
        }
        log::debug!(
            "🔧 Tool {:?} -> {:?}",
            self.tool.as_ref().map(Tool::name),
            tool.as_ref().map(Tool::name)
        );
        self.tool = tool;
        self.cancel();
    }

    /// Drop transient tool state.
    pub fn cancel(&mut self) {
        if self.skeleton != SkeletonDraft::Idle || self.region.is_drawing() {
            log::debug!("Discarding in-progress drawing");
        }
        self.skeleton = SkeletonDraft::Idle;
        self.region = RegionDraft::Idle;
    }

    pub fn pending_start(&self) -> Option<&Keypoint> {
        match &self.skeleton {
            SkeletonDraft::Pending(start) => Some(start),
            SkeletonDraft::Idle => None,
        }
    }

    pub fn skeleton_draft(&self) -> &SkeletonDraft {
        &self.skeleton
    }

    pub fn region_draft(&self) -> &RegionDraft {
        &self.region
    }

    pub fn region_preview(&self) -> Option<Region> {
        self.region.preview()
    }

    /// Whether a click with `tool` at `at` repeats the previous one.
    fn is_repeat(&self, tool: &Tool, at: Instant) -> bool {
        match &self.last_click {
            Some((last_tool, last_at)) => {
                last_tool == tool && at.duration_since(*last_at) < self.debounce
            }
            None => false,
        }
    }

    /// Handle a primary-button press at screen position `(sx, sy)`.
    pub fn on_pointer_down(
        &mut self,
        store: &mut AnnotationStore,
        mapper: &CoordinateMapper,
        sx: f64,
        sy: f64,
        at: Instant,
    ) -> InteractionOutcome {
        let Some(tool) = self.tool.clone() else {
            return InteractionOutcome::Ignored(Ignored::NoActiveTool);
        };
        if !mapper.is_ready() {
            log::debug!("Pointer down ignored: surface size unknown");
            return InteractionOutcome::Ignored(Ignored::SurfaceNotReady);
        }
        if self.is_repeat(&tool, at) {
            return InteractionOutcome::Ignored(Ignored::Debounced);
        }
        self.last_click = Some((tool.clone(), at));

        let (x, y) = mapper.screen_to_image(sx, sy);
        match tool {
            Tool::Keypoint(label) => {
                InteractionOutcome::KeypointAdded(store.add_keypoint(x, y, &label))
            }
            Tool::Skeleton => self.skeleton_click(store, x, y),
            Tool::Region(label) => self.region_click(store, x, y, label),
        }
    }

    fn skeleton_click(&mut self, store: &mut AnnotationStore, x: f64, y: f64) -> InteractionOutcome {
        match std::mem::take(&mut self.skeleton) {
            SkeletonDraft::Idle => match store.begin_skeleton_edge(x, y) {
                Some(start) => {
                    log::debug!("🦴 Skeleton start at keypoint {} '{}'", start.id, start.label);
                    self.skeleton = SkeletonDraft::Pending(start.clone());
                    InteractionOutcome::SkeletonStarted(start)
                }
                None => InteractionOutcome::Ignored(Ignored::NoKeypoints),
            },
            SkeletonDraft::Pending(start) => match store.complete_skeleton_edge(&start, x, y) {
                Ok(edge) => InteractionOutcome::SkeletonCompleted(edge),
                Err(EdgeRejection::SelfLoop) => {
                    InteractionOutcome::Ignored(Ignored::SelfLoopRejected)
                }
                Err(EdgeRejection::StartMissing) => {
                    InteractionOutcome::Ignored(Ignored::StartMissing)
                }
                Err(EdgeRejection::NoKeypoints) => {
                    InteractionOutcome::Ignored(Ignored::NoKeypoints)
                }
            },
        }
    }

    fn region_click(
        &mut self,
        store: &mut AnnotationStore,
        x: f64,
        y: f64,
        label: String,
    ) -> InteractionOutcome {
        match std::mem::take(&mut self.region) {
            RegionDraft::Idle => {
                self.region = RegionDraft::Anchored {
                    start_x: x,
                    start_y: y,
                    current_x: x,
                    current_y: y,
                    label,
                };
                InteractionOutcome::RegionAnchored { x, y }
            }
            RegionDraft::Anchored {
                start_x,
                start_y,
                label,
                ..
            } => match store.add_region(start_x, start_y, x, y, &label) {
                Some(region) => InteractionOutcome::RegionCommitted(region),
                None => InteractionOutcome::Ignored(Ignored::DegenerateRegion),
            },
        }
    }

    /// Track the pointer for the region preview. Returns true if the preview
    /// changed.
    pub fn on_pointer_move(&mut self, mapper: &CoordinateMapper, sx: f64, sy: f64) -> bool {
        let RegionDraft::Anchored {
            current_x,
            current_y,
            ..
        } = &mut self.region
        else {
            return false;
        };
        if !mapper.is_ready() {
            return false;
        }
        let (x, y) = mapper.screen_to_image(sx, sy);
        *current_x = x;
        *current_y = y;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zoom_math::{SurfaceGeometry, ZoomLimits};

    fn mapper() -> CoordinateMapper {
        let mut mapper = CoordinateMapper::new(ZoomLimits::default());
        mapper.set_surface(Some(SurfaceGeometry::natural(100.0, 100.0, 0.0, 0.0)));
        mapper
    }

    /// Clicks spaced well beyond the debounce window.
    struct Clock {
        now: Instant,
    }

    impl Clock {
        fn new() -> Self {
            Self { now: Instant::now() }
        }

        fn tick(&mut self) -> Instant {
            self.now += Duration::from_millis(100);
            self.now
        }
    }

    #[test]
    fn test_no_tool_ignored() {
        let mut controller = InteractionController::default();
        let mut store = AnnotationStore::new();
        let outcome = controller.on_pointer_down(&mut store, &mapper(), 5.0, 5.0, Instant::now());
        assert_eq!(outcome, InteractionOutcome::Ignored(Ignored::NoActiveTool));
        assert!(store.keypoints().is_empty());
    }

    #[test]
    fn test_surface_not_ready() {
        let mut controller = InteractionController::default();
        controller.set_tool(Some(Tool::Keypoint("ICA".into())));
        let mut store = AnnotationStore::new();
        let outcome = controller.on_pointer_down(
            &mut store,
            &CoordinateMapper::default(),
            5.0,
            5.0,
            Instant::now(),
        );
        assert_eq!(outcome, InteractionOutcome::Ignored(Ignored::SurfaceNotReady));
        assert!(store.keypoints().is_empty());
    }

    #[test]
    fn test_keypoint_click_maps_coordinates() {
        let mut controller = InteractionController::default();
        controller.set_tool(Some(Tool::Keypoint("ICA".into())));
        let mut store = AnnotationStore::new();
        let mut mapper = mapper();
        mapper.pan(10.0, 0.0);

        let outcome = controller.on_pointer_down(&mut store, &mapper, 30.0, 40.0, Instant::now());
        assert!(outcome.is_mutation());
        let kp = &store.keypoints()[0];
        assert!((kp.x - 20.0).abs() < 1e-4);
        assert!((kp.y - 40.0).abs() < 1e-4);
        assert_eq!(kp.label, "ICA");
    }

    #[test]
    fn test_debounce_collapses_double_click() {
        let mut controller = InteractionController::default();
        controller.set_tool(Some(Tool::Keypoint("ICA".into())));
        let mut store = AnnotationStore::new();
        let mapper = mapper();
        let t0 = Instant::now();

        controller.on_pointer_down(&mut store, &mapper, 5.0, 5.0, t0);
        let second =
            controller.on_pointer_down(&mut store, &mapper, 5.0, 5.0, t0 + Duration::from_millis(3));
        assert_eq!(second, InteractionOutcome::Ignored(Ignored::Debounced));
        controller.on_pointer_down(&mut store, &mapper, 5.0, 5.0, t0 + Duration::from_millis(50));
        assert_eq!(store.keypoints().len(), 2);
    }

    #[test]
    fn test_skeleton_two_clicks() {
        let mut store = AnnotationStore::new();
        let a = store.add_keypoint(10.0, 10.0, "ICA");
        let m = store.add_keypoint(80.0, 80.0, "MCA1");
        let mut controller = InteractionController::default();
        controller.set_tool(Some(Tool::Skeleton));
        let mapper = mapper();
        let mut clock = Clock::new();

        let first = controller.on_pointer_down(&mut store, &mapper, 12.0, 11.0, clock.tick());
        assert_eq!(first, InteractionOutcome::SkeletonStarted(a.clone()));
        assert_eq!(controller.pending_start(), Some(&a));

        let second = controller.on_pointer_down(&mut store, &mapper, 79.0, 79.0, clock.tick());
        assert_eq!(
            second,
            InteractionOutcome::SkeletonCompleted(SkeletonEdge::between(&a, &m))
        );
        assert!(controller.pending_start().is_none());
        assert_eq!(store.keypoints()[1].parents, vec![a.id]);
    }

    #[test]
    fn test_skeleton_self_loop_clears_pending() {
        let mut store = AnnotationStore::new();
        store.add_keypoint(10.0, 10.0, "ICA");
        let mut controller = InteractionController::default();
        controller.set_tool(Some(Tool::Skeleton));
        let mapper = mapper();
        let mut clock = Clock::new();

        controller.on_pointer_down(&mut store, &mapper, 10.0, 10.0, clock.tick());
        let outcome = controller.on_pointer_down(&mut store, &mapper, 10.0, 10.0, clock.tick());
        assert_eq!(outcome, InteractionOutcome::Ignored(Ignored::SelfLoopRejected));
        assert!(controller.pending_start().is_none());
        assert!(store.edges().is_empty());
        assert!(!store.can_redo_skeleton());
    }

    #[test]
    fn test_skeleton_without_keypoints() {
        let mut store = AnnotationStore::new();
        let mut controller = InteractionController::default();
        controller.set_tool(Some(Tool::Skeleton));
        let outcome = controller.on_pointer_down(&mut store, &mapper(), 1.0, 1.0, Instant::now());
        assert_eq!(outcome, InteractionOutcome::Ignored(Ignored::NoKeypoints));
        assert!(controller.pending_start().is_none());
    }

    #[test]
    fn test_tool_switch_discards_pending() {
        let mut store = AnnotationStore::new();
        store.add_keypoint(10.0, 10.0, "ICA");
        let mut controller = InteractionController::default();
        controller.set_tool(Some(Tool::Skeleton));
        controller.on_pointer_down(&mut store, &mapper(), 10.0, 10.0, Instant::now());
        assert!(controller.pending_start().is_some());

        controller.set_tool(Some(Tool::Keypoint("VA".into())));
        assert!(controller.pending_start().is_none());
    }

    #[test]
    fn test_tool_switch_discards_region_anchor() {
        let mut store = AnnotationStore::new();
        let mut controller = InteractionController::default();
        let region_tool = Tool::Region("Occlusion".into());
        controller.set_tool(Some(region_tool.clone()));
        let mapper = mapper();
        let mut clock = Clock::new();

        controller.on_pointer_down(&mut store, &mapper, 20.0, 30.0, clock.tick());
        controller.on_pointer_move(&mapper, 50.0, 60.0);
        assert!(controller.region_preview().is_some());

        controller.set_tool(Some(Tool::Keypoint("ICA".into())));
        assert!(controller.region_preview().is_none());
        assert!(!controller.region_draft().is_drawing());

        controller.set_tool(Some(region_tool));
        let outcome = controller.on_pointer_down(&mut store, &mapper, 40.0, 40.0, clock.tick());
        assert_eq!(outcome, InteractionOutcome::RegionAnchored { x: 40.0, y: 40.0 });
        assert!(store.regions().is_empty());
    }

    #[test]
    fn test_region_preview_and_commit() {
        let mut store = AnnotationStore::new();
        let mut controller = InteractionController::default();
        controller.set_tool(Some(Tool::Region("Occlusion".into())));
        let mapper = mapper();
        let mut clock = Clock::new();

        assert!(!controller.on_pointer_move(&mapper, 3.0, 3.0));
        let anchored = controller.on_pointer_down(&mut store, &mapper, 20.0, 30.0, clock.tick());
        assert_eq!(anchored, InteractionOutcome::RegionAnchored { x: 20.0, y: 30.0 });

        assert!(controller.on_pointer_move(&mapper, 10.0, 5.0));
        let preview = controller.region_preview().unwrap();
        assert_eq!((preview.x1, preview.y1, preview.x2, preview.y2), (10.0, 5.0, 20.0, 30.0));
        assert!(store.regions().is_empty());

        let committed = controller.on_pointer_down(&mut store, &mapper, 10.0, 5.0, clock.tick());
        assert_eq!(committed, InteractionOutcome::RegionCommitted(preview));
        assert!(controller.region_preview().is_none());
        assert_eq!(store.regions().len(), 1);
    }

    #[test]
    fn test_degenerate_region_resets_draft() {
        let mut store = AnnotationStore::new();
        let mut controller = InteractionController::default();
        controller.set_tool(Some(Tool::Region("Hide Region".into())));
        let mapper = mapper();
        let mut clock = Clock::new();

        controller.on_pointer_down(&mut store, &mapper, 20.0, 30.0, clock.tick());
        let outcome = controller.on_pointer_down(&mut store, &mapper, 20.0, 60.0, clock.tick());
        assert_eq!(outcome, InteractionOutcome::Ignored(Ignored::DegenerateRegion));
        assert!(!controller.region_draft().is_drawing());
        assert!(store.regions().is_empty());
    }
}
