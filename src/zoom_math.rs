//! Screen-to-image coordinate mapping.
//!
//! The annotation surface is rendered with a `scale(zoom) translate(pan)`
//! transform anchored at its top-left corner, on top of a backing buffer whose
//! resolution (the image's natural size) generally differs from the displayed
//! CSS size. [`CoordinateMapper`] owns the zoom/pan state and converts pointer
//! positions into image coordinates with the exact inverse of that transform.

use crate::constants::zoom as zoom_const;

/// Pan/zoom transform state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Transform {
    /// Create a new transform with the given zoom and pan.
    pub fn new(zoom: f64, pan_x: f64, pan_y: f64) -> Self {
        Self { zoom, pan_x, pan_y }
    }

    /// Create an identity transform (zoom=1, no pan).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Change the zoom level while keeping the image point under `anchor`
    /// (in backing-buffer pixels) fixed.
    pub fn zoom_around(&self, new_zoom: f64, anchor_x: f64, anchor_y: f64) -> Transform {
        Transform {
            zoom: new_zoom,
            pan_x: self.pan_x + anchor_x * (1.0 / new_zoom - 1.0 / self.zoom),
            pan_y: self.pan_y + anchor_y * (1.0 / new_zoom - 1.0 / self.zoom),
        }
    }

    /// Apply a screen-space pan delta; the delta is divided by the zoom so the
    /// perceived drag speed does not depend on the zoom level.
    pub fn pan_by(&self, dx: f64, dy: f64) -> Transform {
        Transform {
            zoom: self.zoom,
            pan_x: self.pan_x + dx / self.zoom,
            pan_y: self.pan_y + dy / self.zoom,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Geometry of the surface the image is displayed on.
///
/// `width`/`height` are the backing (natural image) resolution; the `css_*`
/// fields describe the on-screen rectangle the surface occupies before the
/// view transform is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGeometry {
    pub width: f64,
    pub height: f64,
    pub css_left: f64,
    pub css_top: f64,
    pub css_width: f64,
    pub css_height: f64,
}

impl SurfaceGeometry {
    /// Surface displayed at its natural size with its origin at `(left, top)`.
    pub fn natural(width: f64, height: f64, left: f64, top: f64) -> Self {
        Self {
            width,
            height,
            css_left: left,
            css_top: top,
            css_width: width,
            css_height: height,
        }
    }

    /// Backing-pixels-per-CSS-pixel ratios, or `None` for a degenerate surface.
    fn ratio(&self) -> Option<(f64, f64)> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !(usable(self.width)
            && usable(self.height)
            && usable(self.css_width)
            && usable(self.css_height))
        {
            return None;
        }
        Some((self.width / self.css_width, self.height / self.css_height))
    }
}

/// Zoom limits and step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub step: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            step: zoom_const::FACTOR,
            min: zoom_const::MIN,
            max: zoom_const::MAX,
        }
    }
}

/// Converts pointer positions into image-space coordinates.
#[derive(Debug, Clone, Default)]
pub struct CoordinateMapper {
    transform: Transform,
    limits: ZoomLimits,
    surface: Option<SurfaceGeometry>,
    /// Last pointer position of an active drag pan.
    drag_anchor: Option<(f64, f64)>,
}

impl CoordinateMapper {
    pub fn new(limits: ZoomLimits) -> Self {
        Self {
            limits,
            ..Default::default()
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn zoom(&self) -> f64 {
        self.transform.zoom
    }

    pub fn pan_offset(&self) -> (f64, f64) {
        (self.transform.pan_x, self.transform.pan_y)
    }

    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    pub fn surface(&self) -> Option<&SurfaceGeometry> {
        self.surface.as_ref()
    }

    /// Replace the surface geometry (`None` while no image is loaded).
    pub fn set_surface(&mut self, surface: Option<SurfaceGeometry>) {
        self.surface = surface;
    }

    /// Whether pointer input can be mapped to a meaningful image position.
    pub fn is_ready(&self) -> bool {
        self.surface.and_then(|s| s.ratio()).is_some()
    }

    /// Map a pointer position to image coordinates.
    ///
    /// Returns `(0.0, 0.0)` when no usable surface is available.
    pub fn screen_to_image(&self, screen_x: f64, screen_y: f64) -> (f64, f64) {
        let Some(surface) = self.surface else {
            return (0.0, 0.0);
        };
        let Some((ratio_x, ratio_y)) = surface.ratio() else {
            return (0.0, 0.0);
        };
        let t = &self.transform;
        let canvas_x = (screen_x - surface.css_left) * ratio_x;
        let canvas_y = (screen_y - surface.css_top) * ratio_y;
        (canvas_x / t.zoom - t.pan_x, canvas_y / t.zoom - t.pan_y)
    }

    /// Forward transform used to place image points on screen.
    ///
    /// Returns `(0.0, 0.0)` when no usable surface is available.
    pub fn image_to_screen(&self, image_x: f64, image_y: f64) -> (f64, f64) {
        let Some(surface) = self.surface else {
            return (0.0, 0.0);
        };
        let Some((ratio_x, ratio_y)) = surface.ratio() else {
            return (0.0, 0.0);
        };
        let t = &self.transform;
        (
            surface.css_left + (image_x + t.pan_x) * t.zoom / ratio_x,
            surface.css_top + (image_y + t.pan_y) * t.zoom / ratio_y,
        )
    }

    /// Viewport center in backing-buffer pixels.
    fn center(&self) -> (f64, f64) {
        match self.surface {
            Some(s) if s.ratio().is_some() => (s.width / 2.0, s.height / 2.0),
            _ => (0.0, 0.0),
        }
    }

    fn set_zoom(&mut self, new_zoom: f64) {
        let new_zoom = new_zoom.clamp(self.limits.min, self.limits.max);
        if new_zoom == self.transform.zoom {
            return;
        }
        let (cx, cy) = self.center();
        self.transform = self.transform.zoom_around(new_zoom, cx, cy);
        log::debug!(
            "🔍 Zoom {:.2}x, pan ({:.1}, {:.1})",
            self.transform.zoom,
            self.transform.pan_x,
            self.transform.pan_y
        );
    }

    /// Zoom in by one step, keeping the viewport center fixed.
    pub fn zoom_in(&mut self) {
        self.set_zoom(self.transform.zoom * self.limits.step);
    }

    /// Zoom out by one step, keeping the viewport center fixed.
    pub fn zoom_out(&mut self) {
        self.set_zoom(self.transform.zoom / self.limits.step);
    }

    /// Scroll-wheel zoom: scrolling up (negative delta) zooms in.
    pub fn wheel(&mut self, delta_y: f64) {
        if delta_y < 0.0 {
            self.zoom_in();
        } else if delta_y > 0.0 {
            self.zoom_out();
        }
    }

    pub fn reset_zoom(&mut self) {
        self.transform = Transform::identity();
        self.drag_anchor = None;
        log::debug!("🔄 View reset");
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.transform = self.transform.pan_by(dx, dy);
    }

    pub fn begin_drag(&mut self, screen_x: f64, screen_y: f64) {
        self.drag_anchor = Some((screen_x, screen_y));
    }

    /// Pan by the pointer movement since the previous drag position.
    pub fn drag_to(&mut self, screen_x: f64, screen_y: f64) {
        let Some((last_x, last_y)) = self.drag_anchor else {
            return;
        };
        self.pan(screen_x - last_x, screen_y - last_y);
        self.drag_anchor = Some((screen_x, screen_y));
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 0.001;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON * a.abs().max(b.abs()).max(1.0)
    }

    /// 800x600 image shown at half size, offset on the page.
    fn scaled_surface() -> SurfaceGeometry {
        SurfaceGeometry {
            width: 800.0,
            height: 600.0,
            css_left: 40.0,
            css_top: 25.0,
            css_width: 400.0,
            css_height: 300.0,
        }
    }

    fn mapper() -> CoordinateMapper {
        let mut mapper = CoordinateMapper::new(ZoomLimits::default());
        mapper.set_surface(Some(scaled_surface()));
        mapper
    }

    #[test]
    fn test_identity_maps_through_ratio() {
        let m = mapper();
        let (x, y) = m.screen_to_image(40.0 + 10.0, 25.0 + 20.0);
        assert!(approx_eq(x, 20.0));
        assert!(approx_eq(y, 40.0));
    }

    #[test]
    fn test_zoom_and_pan_are_inverted() {
        let mut m = mapper();
        m.zoom_in();
        m.pan(30.0, -12.0);
        let t = m.transform();
        let (x, y) = m.screen_to_image(140.0, 125.0);
        let expected_x = (100.0 * 2.0) / t.zoom - t.pan_x;
        let expected_y = (100.0 * 2.0) / t.zoom - t.pan_y;
        assert!(approx_eq(x, expected_x));
        assert!(approx_eq(y, expected_y));
    }

    #[test]
    fn test_round_trip_over_zoom_range() {
        let pans = [(0.0, 0.0), (120.0, -45.0), (-300.0, 250.5)];
        let points = [(0.0, 0.0), (17.5, 402.25), (799.0, 599.0), (-20.0, 1000.0)];
        let mut zoom = 0.5;
        while zoom <= 5.0 {
            for &(pan_x, pan_y) in &pans {
                let mut m = mapper();
                m.transform = Transform::new(zoom, pan_x, pan_y);
                for &(px, py) in &points {
                    let (sx, sy) = m.image_to_screen(px, py);
                    let (x, y) = m.screen_to_image(sx, sy);
                    assert!(approx_eq(x, px), "x {x} != {px} at zoom {zoom}");
                    assert!(approx_eq(y, py), "y {y} != {py} at zoom {zoom}");
                }
            }
            zoom += 0.25;
        }
    }

    #[test]
    fn test_missing_surface_yields_origin() {
        let m = CoordinateMapper::default();
        assert_eq!(m.screen_to_image(123.0, 456.0), (0.0, 0.0));
        assert!(!m.is_ready());
    }

    #[test]
    fn test_zero_sized_surface_yields_origin() {
        let mut m = CoordinateMapper::default();
        m.set_surface(Some(SurfaceGeometry::natural(0.0, 0.0, 0.0, 0.0)));
        assert_eq!(m.screen_to_image(10.0, 10.0), (0.0, 0.0));
        m.set_surface(Some(SurfaceGeometry {
            css_width: 0.0,
            ..scaled_surface()
        }));
        assert_eq!(m.screen_to_image(10.0, 10.0), (0.0, 0.0));
        assert!(!m.is_ready());
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut m = mapper();
        for _ in 0..100 {
            m.zoom_in();
        }
        assert_eq!(m.zoom(), 5.0);
        for _ in 0..100 {
            m.zoom_out();
        }
        assert_eq!(m.zoom(), 0.5);
    }

    #[test]
    fn test_zoom_keeps_center_fixed() {
        let mut m = mapper();
        m.pan(14.0, -8.0);
        // Viewport center on screen: css origin + half the css size.
        let (cx, cy) = (40.0 + 200.0, 25.0 + 150.0);
        let before = m.screen_to_image(cx, cy);
        m.zoom_in();
        m.zoom_in();
        let after_in = m.screen_to_image(cx, cy);
        m.zoom_out();
        let after_out = m.screen_to_image(cx, cy);
        assert!(approx_eq(before.0, after_in.0) && approx_eq(before.1, after_in.1));
        assert!(approx_eq(before.0, after_out.0) && approx_eq(before.1, after_out.1));
    }

    #[test]
    fn test_pan_scales_with_zoom() {
        let mut m = mapper();
        m.transform = Transform::new(2.0, 0.0, 0.0);
        m.pan(10.0, -4.0);
        assert_eq!(m.pan_offset(), (5.0, -2.0));
    }

    #[test]
    fn test_reset_zoom() {
        let mut m = mapper();
        m.zoom_in();
        m.pan(3.0, 3.0);
        m.reset_zoom();
        assert_eq!(m.transform(), Transform::identity());
    }

    #[test]
    fn test_wheel_direction() {
        let mut m = mapper();
        m.wheel(-120.0);
        assert!(m.zoom() > 1.0);
        m.wheel(120.0);
        m.wheel(120.0);
        assert!(m.zoom() < 1.0);
        let z = m.zoom();
        m.wheel(0.0);
        assert_eq!(m.zoom(), z);
    }

    #[test]
    fn test_drag_pan_accumulates_deltas() {
        let mut m = mapper();
        m.drag_to(50.0, 50.0);
        assert_eq!(m.pan_offset(), (0.0, 0.0));

        m.begin_drag(100.0, 100.0);
        m.drag_to(110.0, 95.0);
        m.drag_to(120.0, 90.0);
        m.end_drag();
        assert_eq!(m.pan_offset(), (20.0, -10.0));
        assert!(!m.is_dragging());
    }
}
