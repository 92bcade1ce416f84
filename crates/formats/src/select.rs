use crate::geojson::{Feature, FeatureCollection};

/// Where an overlay payload came from. Local resources are authored by hand;
/// search results are noisy and need filtering.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FeatureSource {
    Local,
    Search,
}

/// Picks the feature to display from a parsed payload.
///
/// Local payloads yield their first feature. Search payloads only consider
/// polygonal features and prefer an administrative boundary among them.
pub fn select_feature(collection: FeatureCollection, source: FeatureSource) -> Option<Feature> {
    match source {
        FeatureSource::Local => collection.features.into_iter().next(),
        FeatureSource::Search => {
            let mut polygons: Vec<Feature> = collection
                .features
                .into_iter()
                .filter(|f| f.geometry.is_polygonal())
                .collect();
            let idx = polygons
                .iter()
                .position(Feature::is_administrative_boundary)
                .unwrap_or(0);
            if polygons.is_empty() {
                None
            } else {
                Some(polygons.swap_remove(idx))
            }
        }
    }
}
