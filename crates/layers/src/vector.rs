use formats::{Feature, Geometry};
use foundation::math::{LonLat, Vec2, mercator};
use serde::Serialize;

use crate::layer::{Layer, LayerId};
use crate::symbology::{LayerStyle, OVERLAY_STYLE, ShapeStyle};

/// A drawable primitive in Web Mercator projection units.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Marker { at: Vec2 },
    /// `radius` is in projection units, like the map's native circle geometry.
    Circle { center: Vec2, radius: f64 },
    Line { vertices: Vec<Vec2> },
    Polygon { rings: Vec<Vec<Vec2>> },
}

impl Shape {
    fn extend_extent(&self, extent: &mut Option<Extent>) {
        match self {
            Shape::Marker { at } => grow(extent, *at),
            Shape::Circle { center, radius } => {
                grow(extent, Vec2::new(center.x - radius, center.y - radius));
                grow(extent, Vec2::new(center.x + radius, center.y + radius));
            }
            Shape::Line { vertices } => vertices.iter().for_each(|v| grow(extent, *v)),
            Shape::Polygon { rings } => rings.iter().flatten().for_each(|v| grow(extent, *v)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Extent {
    pub min: Vec2,
    pub max: Vec2,
}

impl Extent {
    pub fn center(&self) -> Vec2 {
        self.min.lerp(self.max, 0.5)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

fn grow(extent: &mut Option<Extent>, p: Vec2) {
    let e = extent.get_or_insert(Extent { min: p, max: p });
    e.min.x = e.min.x.min(p.x);
    e.min.y = e.min.y.min(p.y);
    e.max.x = e.max.x.max(p.x);
    e.max.y = e.max.y.max(p.y);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledShape {
    pub shape: Shape,
    pub style: ShapeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorLayer {
    id: LayerId,
    z_index: i32,
    pub style: LayerStyle,
    shapes: Vec<StyledShape>,
}

impl VectorLayer {
    pub fn new(id: u64) -> Self {
        Self {
            id: LayerId(id),
            z_index: 0,
            style: LayerStyle::default(),
            shapes: Vec::new(),
        }
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn shapes(&self) -> &[StyledShape] {
        &self.shapes
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Replaces the whole layer contents.
    pub fn replace(&mut self, shapes: Vec<StyledShape>) {
        self.shapes = shapes;
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    pub fn extent(&self) -> Option<Extent> {
        let mut out = None;
        for s in &self.shapes {
            s.shape.extend_extent(&mut out);
        }
        out
    }
}

impl Layer for VectorLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn z_index(&self) -> i32 {
        self.z_index
    }
}

/// Projects a GeoJSON feature into overlay shapes.
///
/// A Point carrying a numeric `radius` property becomes a circle of that
/// radius instead of a marker.
pub fn shapes_from_feature(feature: &Feature) -> Vec<StyledShape> {
    let project = |p: &LonLat| mercator::from_lon_lat(*p);
    let project_all = |ps: &[LonLat]| ps.iter().map(project).collect::<Vec<_>>();
    let project_rings =
        |rings: &[Vec<LonLat>]| rings.iter().map(|r| project_all(r)).collect::<Vec<_>>();

    let shapes = match &feature.geometry {
        Geometry::Point(p) => match feature.property_f64("radius") {
            Some(radius) if radius.is_finite() && radius > 0.0 => vec![Shape::Circle {
                center: project(p),
                radius,
            }],
            _ => vec![Shape::Marker { at: project(p) }],
        },
        Geometry::MultiPoint(ps) => ps.iter().map(|p| Shape::Marker { at: project(p) }).collect(),
        Geometry::LineString(ps) => vec![Shape::Line {
            vertices: project_all(ps),
        }],
        Geometry::MultiLineString(lines) => lines
            .iter()
            .map(|l| Shape::Line {
                vertices: project_all(l),
            })
            .collect(),
        Geometry::Polygon(rings) => vec![Shape::Polygon {
            rings: project_rings(rings),
        }],
        Geometry::MultiPolygon(polys) => polys
            .iter()
            .map(|rings| Shape::Polygon {
                rings: project_rings(rings),
            })
            .collect(),
    };

    shapes
        .into_iter()
        .map(|shape| StyledShape {
            shape,
            style: OVERLAY_STYLE,
        })
        .collect()
}
