use serde::Serialize;

use crate::layer::{Layer, LayerId};
use crate::symbology::LayerStyle;

pub const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// CSS canvas filter applied by renderers to the dark tile layer.
pub const DARK_FILTER: &str = "grayscale(90%) brightness(0.3) contrast(1.2)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileSource {
    pub url_template: String,
    pub max_zoom: u8,
}

impl TileSource {
    pub fn osm() -> Self {
        Self {
            url_template: OSM_TILE_URL.to_string(),
            max_zoom: 20,
        }
    }

    pub fn tile_url(&self, z: u8, x: u32, y: u32) -> String {
        self.url_template
            .replace("{z}", &z.min(self.max_zoom).to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterLayer {
    id: LayerId,
    pub style: LayerStyle,
    pub source: TileSource,
    pub filter: Option<String>,
}

impl RasterLayer {
    pub fn new(id: u64, source: TileSource) -> Self {
        Self {
            id: LayerId(id),
            style: LayerStyle::default(),
            source,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.set_opacity(opacity);
        self
    }

    pub fn opacity(&self) -> f64 {
        self.style.opacity
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.style.opacity = opacity.clamp(0.0, 1.0);
    }
}

impl Layer for RasterLayer {
    fn id(&self) -> LayerId {
        self.id
    }
}
