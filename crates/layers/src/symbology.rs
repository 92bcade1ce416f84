use serde::Serialize;

/// Straight RGBA, each channel in `[0, 1]`.
pub type Rgba = [f32; 4];

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LayerStyle {
    pub visible: bool,
    /// Layer opacity in `[0, 1]`; written only by the view animator.
    pub opacity: f64,
}

impl LayerStyle {
    pub const fn new(visible: bool, opacity: f64) -> Self {
        Self { visible, opacity }
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            visible: true,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f32,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ShapeStyle {
    pub fill: Option<Rgba>,
    pub stroke: Option<Stroke>,
    /// Screen radius for point markers.
    pub marker_radius_px: f32,
}

impl ShapeStyle {
    pub const fn new(fill: Option<Rgba>, stroke: Option<Stroke>, marker_radius_px: f32) -> Self {
        Self {
            fill,
            stroke,
            marker_radius_px,
        }
    }
}

/// Geometry overlay loaded from GeoJSON or place search.
pub const OVERLAY_STYLE: ShapeStyle = ShapeStyle::new(
    Some([1.0, 0.596, 0.0, 0.15]),
    Some(Stroke {
        color: [1.0, 0.596, 0.0, 1.0],
        width: 3.0,
    }),
    7.0,
);

/// Device position dot.
pub const POSITION_STYLE: ShapeStyle = ShapeStyle::new(
    Some([0.129, 0.588, 0.953, 1.0]),
    Some(Stroke {
        color: [1.0, 1.0, 1.0, 1.0],
        width: 2.0,
    }),
    6.0,
);

/// Faint halo showing fix accuracy around the position dot.
pub const ACCURACY_STYLE: ShapeStyle = ShapeStyle::new(
    Some([0.129, 0.588, 0.953, 0.05]),
    Some(Stroke {
        color: [0.129, 0.588, 0.953, 0.15],
        width: 1.0,
    }),
    0.0,
);
