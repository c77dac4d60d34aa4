//! VAT - Vessel Annotation Tool
//!
//! Annotation engine for marking vessel landmarks on angiography images:
//! labeled keypoints chained into vessels, skeleton edges between them, and
//! occlusion regions, with per-collection undo/redo and JSON export/import.

pub mod annotation;
pub mod app;
pub mod color_utils;
pub mod config;
pub mod constants;
pub mod format;
pub mod interaction;
pub mod model;
pub mod render;
pub mod undo;
pub mod zoom_math;

pub use annotation::{AnnotationStore, ImageAnnotations};
pub use app::AnnotatorApp;
pub use interaction::{InteractionController, InteractionOutcome};
pub use render::RenderScene;
pub use zoom_math::CoordinateMapper;
