//! VAT annotator session.
//!
//! [`AnnotatorApp`] owns everything one annotation session needs:
//! - the loaded image list and the current page
//! - the coordinate mapper (zoom, pan, surface geometry)
//! - the annotation store and the interaction controller
//! - the label table and render style
//!
//! A front end forwards pointer events and button presses here and redraws
//! from the [`RenderScene`] handed to the render callback after every change.

use std::path::{Path, PathBuf};

use web_time::Instant;

use crate::annotation::{AnnotationStore, ImageAnnotations};
use crate::config::AppConfig;
use crate::format::{
    AnnotationDocument, FormatError, VesselJsonFormat, export_image, import_image,
};
use crate::interaction::{InteractionController, InteractionOutcome};
use crate::model::{ImageInfo, LabelTable, Tool};
use crate::render::{RenderScene, RenderStyle};
use crate::zoom_math::{CoordinateMapper, SurfaceGeometry, ZoomLimits};

/// Called with the current scene after every change.
pub type RenderCallback = Box<dyn FnMut(&RenderScene)>;

/// One annotation session.
pub struct AnnotatorApp {
    images: Vec<ImageInfo>,
    page: usize,
    mapper: CoordinateMapper,
    store: AnnotationStore,
    controller: InteractionController,
    labels: LabelTable,
    style: RenderStyle,
    selected_label: Option<String>,
    export_folder: Option<PathBuf>,
    on_render: Option<RenderCallback>,
}

impl AnnotatorApp {
    pub fn new(labels: LabelTable) -> Self {
        Self {
            images: Vec::new(),
            page: 0,
            mapper: CoordinateMapper::new(ZoomLimits::default()),
            store: AnnotationStore::new(),
            controller: InteractionController::default(),
            labels,
            style: RenderStyle::default(),
            selected_label: None,
            export_folder: None,
            on_render: None,
        }
    }

    /// Session set up from user configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut app = Self::new(config.label_table());
        app.mapper = CoordinateMapper::new(config.view.limits());
        app.controller = InteractionController::new(config.interaction.debounce());
        app.style = RenderStyle::new(config.preferences.keypoint_size);
        app.export_folder = config.preferences.export_dir();
        app
    }

    pub fn set_render_callback(&mut self, callback: RenderCallback) {
        self.on_render = Some(callback);
        self.render();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    pub fn images(&self) -> &[ImageInfo] {
        &self.images
    }

    /// Zero-based index of the current page.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn current_image(&self) -> Option<&ImageInfo> {
        self.images.get(self.page)
    }

    pub fn selected_label(&self) -> Option<&str> {
        self.selected_label.as_deref()
    }

    pub fn tool(&self) -> Option<&Tool> {
        self.controller.tool()
    }

    /// Folder configured for exports, if any.
    pub fn export_folder(&self) -> Option<&Path> {
        self.export_folder.as_deref()
    }

    /// Scene for the current page.
    pub fn scene(&self) -> RenderScene {
        let preview = self.controller.region_preview();
        RenderScene::build(
            self.store.current(),
            &self.labels,
            &self.style,
            preview.as_ref(),
            self.controller.pending_start(),
        )
    }

    fn render(&mut self) {
        if self.on_render.is_none() {
            return;
        }
        let scene = self.scene();
        if let Some(callback) = self.on_render.as_mut() {
            callback(&scene);
        }
    }

    /// Render if `changed`, passing it through.
    fn rendered(&mut self, changed: bool) -> bool {
        if changed {
            self.render();
        }
        changed
    }

    // ========================================================================
    // Images and Pages
    // ========================================================================

    /// Replace the image list. Annotations of the previous list are dropped.
    pub fn load_images(&mut self, images: Vec<ImageInfo>) {
        log::info!("Loaded {} images", images.len());
        self.images = images;
        self.page = 0;
        self.store = AnnotationStore::new();
        self.controller.cancel();
        self.mapper.reset_zoom();
        self.render();
    }

    /// Report the geometry of the display surface, or `None` while unknown.
    pub fn set_surface(&mut self, surface: Option<SurfaceGeometry>) {
        self.mapper.set_surface(surface);
    }

    fn go_to_page(&mut self, page: usize) -> bool {
        if page >= self.images.len() || page == self.page {
            return false;
        }
        log::debug!("📄 Page {} -> {}", self.page + 1, page + 1);
        self.page = page;
        self.store.set_active_image(page);
        self.controller.cancel();
        self.mapper.reset_zoom();
        self.render();
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        match self.page.checked_sub(1) {
            Some(page) => self.go_to_page(page),
            None => false,
        }
    }

    // ========================================================================
    // Tools
    // ========================================================================

    /// Select a label from the label table, activating the matching tool.
    /// `None` or an unknown label deactivates the current tool.
    pub fn select_label(&mut self, label: Option<&str>) {
        let tool = label.and_then(|l| {
            let tool = self.labels.tool_for(l);
            if tool.is_none() {
                log::warn!("Unknown label '{}'", l);
            }
            tool
        });
        self.selected_label = tool.as_ref().and(label.map(str::to_string));
        self.controller.set_tool(tool);
        self.render();
    }

    // ========================================================================
    // Pointer Input
    // ========================================================================

    /// Primary-button press on the surface.
    pub fn pointer_down(&mut self, sx: f64, sy: f64) -> InteractionOutcome {
        self.pointer_down_at(sx, sy, Instant::now())
    }

    /// Primary-button press with an explicit timestamp.
    pub fn pointer_down_at(&mut self, sx: f64, sy: f64, at: Instant) -> InteractionOutcome {
        let outcome = self
            .controller
            .on_pointer_down(&mut self.store, &self.mapper, sx, sy, at);
        if !matches!(outcome, InteractionOutcome::Ignored(_)) {
            self.render();
        }
        outcome
    }

    pub fn pointer_move(&mut self, sx: f64, sy: f64) {
        let changed = self.controller.on_pointer_move(&self.mapper, sx, sy);
        self.rendered(changed);
    }

    // ========================================================================
    // View
    // ========================================================================

    pub fn zoom_in(&mut self) {
        self.mapper.zoom_in();
        self.render();
    }

    pub fn zoom_out(&mut self) {
        self.mapper.zoom_out();
        self.render();
    }

    pub fn reset_zoom(&mut self) {
        self.mapper.reset_zoom();
        self.render();
    }

    pub fn wheel(&mut self, delta_y: f64) {
        self.mapper.wheel(delta_y);
        self.render();
    }

    pub fn begin_pan(&mut self, sx: f64, sy: f64) {
        self.mapper.begin_drag(sx, sy);
    }

    pub fn pan_to(&mut self, sx: f64, sy: f64) {
        let dragging = self.mapper.is_dragging();
        self.mapper.drag_to(sx, sy);
        self.rendered(dragging);
    }

    pub fn end_pan(&mut self) {
        self.mapper.end_drag();
    }

    pub fn increase_keypoint_size(&mut self) {
        self.style.increase_keypoint_size();
        self.render();
    }

    pub fn decrease_keypoint_size(&mut self) {
        self.style.decrease_keypoint_size();
        self.render();
    }

    // ========================================================================
    // Undo / Redo / Reset
    // ========================================================================

    pub fn undo_keypoint(&mut self) -> bool {
        let changed = self.store.undo_keypoint().is_some();
        self.rendered(changed)
    }

    pub fn redo_keypoint(&mut self) -> bool {
        let changed = self.store.redo_keypoint().is_some();
        self.rendered(changed)
    }

    pub fn undo_skeleton(&mut self) -> bool {
        let changed = self.store.undo_skeleton_edge().is_some();
        self.rendered(changed)
    }

    pub fn redo_skeleton(&mut self) -> bool {
        let changed = self.store.redo_skeleton_edge().is_some();
        self.rendered(changed)
    }

    pub fn undo_region(&mut self) -> bool {
        let changed = self.store.undo_region().is_some();
        self.rendered(changed)
    }

    pub fn redo_region(&mut self) -> bool {
        let changed = self.store.redo_region().is_some();
        self.rendered(changed)
    }

    pub fn reset_keypoints(&mut self) {
        self.store.reset_keypoints();
        self.controller.cancel();
        self.render();
    }

    pub fn reset_skeleton(&mut self) {
        self.store.reset_skeleton();
        self.render();
    }

    pub fn reset_regions(&mut self) {
        self.store.reset_regions();
        self.render();
    }

    // ========================================================================
    // Export / Import
    // ========================================================================

    /// Document for the current page, or `None` when no image is loaded.
    pub fn export_current(&self) -> Option<AnnotationDocument> {
        let info = self.current_image()?;
        let empty = ImageAnnotations::new();
        let image = self.store.current().unwrap_or(&empty);
        Some(export_image(image, info))
    }

    /// Write the current page's document into `dir` under its default name.
    pub fn export_current_to(&self, dir: &Path) -> Result<Option<PathBuf>, FormatError> {
        let (Some(info), Some(doc)) = (self.current_image(), self.export_current()) else {
            return Ok(None);
        };
        let path = dir.join(info.export_file_name());
        VesselJsonFormat.export(&doc, &path)?;
        Ok(Some(path))
    }

    /// Write the current page's document into the configured export folder.
    /// `Ok(None)` when no folder is configured or no image is loaded.
    pub fn export_current_to_folder(&self) -> Result<Option<PathBuf>, FormatError> {
        match self.export_folder.as_deref() {
            Some(dir) => self.export_current_to(dir),
            None => Ok(None),
        }
    }

    /// Replace the current page's annotations with `doc`. On error nothing
    /// changes.
    pub fn import_current(&mut self, doc: &AnnotationDocument) -> Result<(), FormatError> {
        let imported = import_image(doc, self.store.next_id())?;
        let mismatch = self
            .current_image()
            .filter(|info| !imported.info.name.is_empty() && imported.info.name != info.name);
        if let Some(info) = mismatch {
            log::warn!(
                "Importing annotations of '{}' onto '{}'",
                imported.info.name,
                info.name
            );
        }
        self.store
            .install_image(self.page, imported.annotations, imported.next_id);
        self.controller.cancel();
        self.render();
        Ok(())
    }

    pub fn import_current_from(&mut self, path: &Path) -> Result<(), FormatError> {
        let doc = VesselJsonFormat.import(path)?;
        self.import_current(&doc)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::format::parse_document;
    use crate::interaction::Ignored;

    fn images() -> Vec<ImageInfo> {
        vec![
            ImageInfo::new("a.png", 100, 100),
            ImageInfo::new("b.png", 100, 100),
        ]
    }

    fn create_app() -> (AnnotatorApp, Rc<RefCell<Vec<RenderScene>>>) {
        let mut app = AnnotatorApp::new(LabelTable::vessels());
        app.load_images(images());
        app.set_surface(Some(SurfaceGeometry::natural(100.0, 100.0, 0.0, 0.0)));
        let frames = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&frames);
        app.set_render_callback(Box::new(move |scene| sink.borrow_mut().push(scene.clone())));
        (app, frames)
    }

    /// Click at `(x, y)` far enough after the previous click.
    fn click(app: &mut AnnotatorApp, clock: &mut Instant, x: f64, y: f64) -> InteractionOutcome {
        *clock += Duration::from_millis(100);
        app.pointer_down_at(x, y, *clock)
    }

    #[test]
    fn test_scenario_end_to_end() {
        let (mut app, frames) = create_app();
        let mut clock = Instant::now();

        app.select_label(Some("ICA"));
        assert_eq!(app.tool(), Some(&Tool::Keypoint("ICA".into())));
        click(&mut app, &mut clock, 10.0, 10.0);
        click(&mut app, &mut clock, 20.0, 20.0);

        app.select_label(Some("Occlusion"));
        click(&mut app, &mut clock, 0.0, 0.0);
        click(&mut app, &mut clock, 5.0, 5.0);

        let doc = app.export_current().unwrap();
        assert_eq!(doc.filename, "a.png");
        assert_eq!(doc.vessel.len(), 2);
        assert_eq!(doc.bbox.len(), 1);
        assert_eq!(
            (doc.bbox[0].x1, doc.bbox[0].y1, doc.bbox[0].x2, doc.bbox[0].y2),
            (0.0, 0.0, 5.0, 5.0)
        );

        let a_id = app.store().keypoints()[0].id;
        assert!(app.undo_keypoint());
        assert_eq!(app.store().keypoints().len(), 1);
        assert!(app.redo_keypoint());
        assert_eq!(app.store().keypoints()[1].parents, vec![a_id]);

        let last = frames.borrow().last().cloned().unwrap();
        assert_eq!(last.markers.len(), 2);
        assert_eq!(last.regions.len(), 1);
        assert_eq!(last.parent_links.len(), 1);
    }

    #[test]
    fn test_render_after_every_mutation() {
        let (mut app, frames) = create_app();
        let mut clock = Instant::now();
        let before = frames.borrow().len();

        app.select_label(Some("ICA"));
        click(&mut app, &mut clock, 10.0, 10.0);
        app.undo_keypoint();
        app.redo_keypoint();
        assert_eq!(frames.borrow().len(), before + 4);

        // No-ops do not render.
        app.redo_keypoint();
        app.undo_region();
        assert_eq!(frames.borrow().len(), before + 4);
    }

    #[test]
    fn test_pages_keep_annotations_and_reset_zoom() {
        let (mut app, _frames) = create_app();
        let mut clock = Instant::now();
        app.select_label(Some("ICA"));
        click(&mut app, &mut clock, 10.0, 10.0);
        app.zoom_in();
        assert!(app.mapper().zoom() > 1.0);

        assert!(app.next_page());
        assert_eq!(app.mapper().zoom(), 1.0);
        assert!(app.store().keypoints().is_empty());
        assert!(!app.next_page());
        assert_eq!(app.export_current().unwrap().filename, "b.png");

        assert!(app.previous_page());
        assert_eq!(app.store().keypoints().len(), 1);
        assert!(!app.previous_page());
    }

    #[test]
    fn test_page_switch_discards_pending_skeleton() {
        let (mut app, _frames) = create_app();
        let mut clock = Instant::now();
        app.select_label(Some("ICA"));
        click(&mut app, &mut clock, 10.0, 10.0);
        app.select_label(Some("MCA1 -> MCA2"));
        assert_eq!(app.tool(), Some(&Tool::Skeleton));
        click(&mut app, &mut clock, 10.0, 10.0);
        assert!(app.controller().pending_start().is_some());

        app.next_page();
        assert!(app.controller().pending_start().is_none());
    }

    #[test]
    fn test_select_unknown_label() {
        let (mut app, _frames) = create_app();
        app.select_label(Some("ICA"));
        app.select_label(Some("Not A Vessel"));
        assert!(app.tool().is_none());
        assert!(app.selected_label().is_none());
        let outcome = app.pointer_down(5.0, 5.0);
        assert_eq!(outcome, InteractionOutcome::Ignored(Ignored::NoActiveTool));
    }

    #[test]
    fn test_surface_not_ready() {
        let mut app = AnnotatorApp::new(LabelTable::vessels());
        app.load_images(images());
        app.select_label(Some("ICA"));
        let outcome = app.pointer_down(5.0, 5.0);
        assert_eq!(outcome, InteractionOutcome::Ignored(Ignored::SurfaceNotReady));
        assert!(app.store().keypoints().is_empty());
    }

    #[test]
    fn test_import_is_atomic() {
        let (mut app, _frames) = create_app();
        let mut clock = Instant::now();
        app.select_label(Some("ICA"));
        click(&mut app, &mut clock, 10.0, 10.0);
        let before = app.export_current().unwrap();

        let bad = parse_document(
            br#"{ "vessel": [ { "id": 0, "x": 1, "y": 1, "label": "ICA", "parent": 3 } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            app.import_current(&bad),
            Err(FormatError::MalformedAnnotation { .. })
        ));
        assert_eq!(app.export_current().unwrap(), before);

        let good = parse_document(
            br#"{ "vessel": [
                { "id": 0, "x": 1, "y": 1, "label": "VA", "parent": null },
                { "id": 1, "x": 2, "y": 2, "label": "VA", "parent": 0 }
            ] }"#,
        )
        .unwrap();
        app.import_current(&good).unwrap();
        let keypoints = app.store().keypoints();
        assert_eq!(keypoints.len(), 2);
        assert_eq!(keypoints[1].parents, vec![keypoints[0].id]);
        assert!(keypoints[0].id > 1);
    }

    #[test]
    fn test_export_to_dir_and_import_back() {
        let (mut app, _frames) = create_app();
        let mut clock = Instant::now();
        app.select_label(Some("ICA"));
        click(&mut app, &mut clock, 10.0, 10.0);
        click(&mut app, &mut clock, 30.0, 10.0);
        let doc = app.export_current().unwrap();

        let dir = std::env::temp_dir().join(format!("vat-app-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = app.export_current_to(&dir).unwrap().unwrap();
        assert!(path.ends_with("a.png.json"));

        app.reset_keypoints();
        assert!(app.store().keypoints().is_empty());
        app.import_current_from(&path).unwrap();
        assert_eq!(app.export_current().unwrap(), doc);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_export_to_configured_folder() {
        let dir = std::env::temp_dir().join(format!("vat-app-folder-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut app = AnnotatorApp::new(LabelTable::vessels());
        app.load_images(images());
        assert_eq!(app.export_current_to_folder().unwrap(), None);

        let mut config = AppConfig::new();
        config.preferences.export_folder = dir.to_string_lossy().into_owned();
        let mut app = AnnotatorApp::from_config(&config);
        app.load_images(images());
        assert_eq!(app.export_folder(), Some(dir.as_path()));
        let path = app.export_current_to_folder().unwrap().unwrap();
        assert_eq!(path, dir.join("a.png.json"));
        assert!(path.exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_page_switch_and_tool_change_discard_region_anchor() {
        let (mut app, _frames) = create_app();
        let mut clock = Instant::now();
        app.select_label(Some("Occlusion"));
        click(&mut app, &mut clock, 10.0, 10.0);
        app.pointer_move(40.0, 40.0);
        assert!(app.controller().region_preview().is_some());

        app.next_page();
        assert!(app.controller().region_preview().is_none());
        assert!(app.scene().preview.is_none());

        // The next click starts a new region instead of committing one.
        let outcome = click(&mut app, &mut clock, 20.0, 20.0);
        assert_eq!(outcome, InteractionOutcome::RegionAnchored { x: 20.0, y: 20.0 });
        assert!(app.store().regions().is_empty());
    }

    #[test]
    fn test_keypoint_size_in_scene() {
        let (mut app, _frames) = create_app();
        let mut clock = Instant::now();
        app.select_label(Some("ICA"));
        click(&mut app, &mut clock, 10.0, 10.0);
        app.increase_keypoint_size();
        assert_eq!(app.scene().markers[0].radius, app.style().keypoint_size());
    }

    #[test]
    fn test_from_config() {
        let mut config = AppConfig::new();
        config.preferences.keypoint_size = 9.0;
        config.view.max_zoom = 2.0;
        let app = AnnotatorApp::from_config(&config);
        assert_eq!(app.style().keypoint_size(), 9.0);
        assert_eq!(app.mapper().limits().max, 2.0);
        assert_eq!(app.controller().debounce(), config.interaction.debounce());
    }
}
