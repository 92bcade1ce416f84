use foundation::math::{ease_in_out_quad, lerp};
use foundation::{Millis, TimeSpan};
use serde::Serialize;

/// Cross-fade between the normal and dark tile layers.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct CrossFade {
    pub to_dark: bool,
    pub span: TimeSpan,
}

/// Opacity pair for the two tile layers.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LayerOpacities {
    pub normal: f64,
    pub dark: f64,
}

impl LayerOpacities {
    pub fn steady(dark: bool) -> Self {
        if dark {
            Self {
                normal: 0.0,
                dark: 1.0,
            }
        } else {
            Self {
                normal: 1.0,
                dark: 0.0,
            }
        }
    }
}

impl CrossFade {
    pub fn new(to_dark: bool, start: Millis, duration_ms: u64) -> Self {
        Self {
            to_dark,
            span: TimeSpan::new(start, duration_ms),
        }
    }

    pub fn is_complete(&self, now: Millis) -> bool {
        self.span.is_complete(now)
    }

    /// Opacities at `now`; exactly 0 and 1 once the fade is complete.
    pub fn opacities(&self, now: Millis) -> LayerOpacities {
        if self.is_complete(now) {
            return LayerOpacities::steady(self.to_dark);
        }
        let from = LayerOpacities::steady(!self.to_dark);
        let to = LayerOpacities::steady(self.to_dark);
        let t = ease_in_out_quad(self.span.progress(now));
        LayerOpacities {
            normal: lerp(from.normal, to.normal, t),
            dark: lerp(from.dark, to.dark, t),
        }
    }
}
