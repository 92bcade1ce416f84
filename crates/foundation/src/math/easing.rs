//! Easing curves mapping linear progress `t ∈ [0, 1]` to eased progress.
//!
//! Inputs outside the unit interval are clamped first.

pub fn linear(t: f64) -> f64 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-in-out, used for layer cross-fades.
pub fn ease_in_out_quad(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Cubic smoothstep, the default curve for camera moves.
pub fn ease_in_and_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    InOutQuad,
    #[default]
    InAndOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Easing::Linear => linear(t),
            Easing::InOutQuad => ease_in_out_quad(t),
            Easing::InAndOut => ease_in_and_out(t),
        }
    }
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::{Easing, ease_in_and_out, ease_in_out_quad};

    #[test]
    fn quad_hits_endpoints_and_midpoint() {
        assert_eq!(ease_in_out_quad(0.0), 0.0);
        assert_eq!(ease_in_out_quad(0.5), 0.5);
        assert_eq!(ease_in_out_quad(1.0), 1.0);
        assert_eq!(ease_in_out_quad(0.25), 0.125);
        assert_eq!(ease_in_out_quad(0.75), 0.875);
    }

    #[test]
    fn curves_are_monotonic() {
        for easing in [Easing::Linear, Easing::InOutQuad, Easing::InAndOut] {
            let mut prev = 0.0;
            for i in 0..=100 {
                let v = easing.apply(i as f64 / 100.0);
                assert!(v >= prev, "{easing:?} not monotonic at {i}");
                prev = v;
            }
        }
    }

    #[test]
    fn clamps_out_of_range_progress() {
        assert_eq!(ease_in_and_out(-1.0), 0.0);
        assert_eq!(ease_in_and_out(2.0), 1.0);
    }
}
