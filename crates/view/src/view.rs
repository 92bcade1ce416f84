use foundation::math::{Easing, LonLat, Vec2, lerp, mercator};
use foundation::{Millis, TimeSpan};
use serde::Serialize;

/// Camera state in Web Mercator projection units.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: Vec2,
    pub zoom: f64,
    pub viewport_px: [f64; 2],
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl MapView {
    pub fn new(center: LonLat, zoom: f64, viewport_px: [f64; 2]) -> Self {
        Self {
            center: mercator::from_lon_lat(center),
            zoom,
            viewport_px,
            min_zoom: 0.0,
            max_zoom: 20.0,
        }
    }

    pub fn with_zoom_range(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom.max(min_zoom);
        self.zoom = self.clamp_zoom(self.zoom);
        self
    }

    /// Projection units per pixel.
    pub fn resolution(&self) -> f64 {
        mercator::resolution_for_zoom(self.zoom)
    }

    pub fn center_lon_lat(&self) -> LonLat {
        mercator::to_lon_lat(self.center)
    }

    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    pub fn set_viewport(&mut self, width_px: f64, height_px: f64) {
        self.viewport_px = [width_px.max(1.0), height_px.max(1.0)];
    }
}

/// Eased move of center and zoom over a time span.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct CameraAnimation {
    pub from_center: Vec2,
    pub to_center: Vec2,
    pub from_zoom: f64,
    pub to_zoom: f64,
    pub span: TimeSpan,
    #[serde(skip)]
    pub easing: Easing,
}

impl CameraAnimation {
    pub fn new(view: &MapView, to_center: Vec2, to_zoom: f64, start: Millis, duration_ms: u64) -> Self {
        Self {
            from_center: view.center,
            to_center,
            from_zoom: view.zoom,
            to_zoom: view.clamp_zoom(to_zoom),
            span: TimeSpan::new(start, duration_ms),
            easing: Easing::InAndOut,
        }
    }

    /// Writes the interpolated camera into `view`; returns true once finished.
    pub fn apply(&self, now: Millis, view: &mut MapView) -> bool {
        let t = self.easing.apply(self.span.progress(now));
        view.center = self.from_center.lerp(self.to_center, t);
        view.zoom = lerp(self.from_zoom, self.to_zoom, t);
        if self.span.is_complete(now) {
            view.center = self.to_center;
            view.zoom = self.to_zoom;
            true
        } else {
            false
        }
    }

    pub fn end(&self) -> Millis {
        self.span.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraAnimation, MapView};
    use foundation::Millis;
    use foundation::math::{LonLat, Vec2};

    #[test]
    fn animation_lands_exactly() {
        let mut view = MapView::new(LonLat::new(0.0, 0.0), 10.0, [800.0, 600.0]);
        let anim = CameraAnimation::new(&view, Vec2::new(1000.0, -500.0), 12.0, Millis(100), 1_000);
        assert!(!anim.apply(Millis(600), &mut view));
        assert!(view.center.x > 0.0 && view.center.x < 1000.0);
        assert!(view.zoom > 10.0 && view.zoom < 12.0);
        assert!(anim.apply(Millis(1_100), &mut view));
        assert_eq!(view.center, Vec2::new(1000.0, -500.0));
        assert_eq!(view.zoom, 12.0);
    }

    #[test]
    fn zoom_is_clamped_to_range() {
        let view = MapView::new(LonLat::new(0.0, 0.0), 30.0, [800.0, 600.0]).with_zoom_range(2.0, 18.0);
        assert_eq!(view.zoom, 18.0);
        let anim = CameraAnimation::new(&view, view.center, 1.0, Millis(0), 10);
        assert_eq!(anim.to_zoom, 2.0);
    }

    #[test]
    fn resolution_tracks_zoom() {
        let mut view = MapView::new(LonLat::new(16.62, 50.69), 12.0, [800.0, 600.0]);
        let r12 = view.resolution();
        view.zoom = 13.0;
        assert!((view.resolution() * 2.0 - r12).abs() < 1e-9);
    }
}
