use foundation::Position;
use foundation::math::mercator;
use serde::Serialize;

use crate::layer::{Layer, LayerId};
use crate::symbology::{ACCURACY_STYLE, POSITION_STYLE};
use crate::vector::{Shape, StyledShape, VectorLayer};

/// Draws above every other layer.
pub const POSITION_Z_INDEX: i32 = 1000;

/// Device position marker: an accuracy halo under a dot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionLayer {
    inner: VectorLayer,
}

impl PositionLayer {
    pub fn new(id: u64) -> Self {
        Self {
            inner: VectorLayer::new(id).with_z_index(POSITION_Z_INDEX),
        }
    }

    pub fn update(&mut self, position: &Position) {
        let center = mercator::from_lon_lat(position.lon_lat());
        self.inner.replace(vec![
            StyledShape {
                shape: Shape::Circle {
                    center,
                    radius: position.accuracy_m,
                },
                style: ACCURACY_STYLE,
            },
            StyledShape {
                shape: Shape::Marker { at: center },
                style: POSITION_STYLE,
            },
        ]);
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn is_shown(&self) -> bool {
        !self.inner.is_empty()
    }

    pub fn shapes(&self) -> &[StyledShape] {
        self.inner.shapes()
    }
}

impl Layer for PositionLayer {
    fn id(&self) -> LayerId {
        self.inner.id()
    }

    fn z_index(&self) -> i32 {
        self.inner.z_index()
    }
}
