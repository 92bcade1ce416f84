//! Place-name search (Nominatim-compatible) request shape and response
//! handling. Transport lives in the hosts.

use serde::{Deserialize, Serialize};

use crate::geojson::{Feature, FeatureCollection};
use crate::select::{FeatureSource, select_feature};

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceSearchConfig {
    pub endpoint: String,
    pub limit: u32,
}

impl Default for PlaceSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            limit: 5,
        }
    }
}

impl PlaceSearchConfig {
    pub fn query_params(&self, query: &str) -> Vec<(&'static str, String)> {
        vec![
            ("q", query.to_string()),
            ("format", "geojson".to_string()),
            ("polygon_geojson", "1".to_string()),
            ("limit", self.limit.to_string()),
        ]
    }

    /// Full GET URL with percent-encoded parameters, for hosts without a
    /// query builder.
    pub fn request_url(&self, query: &str) -> String {
        let mut url = self.endpoint.clone();
        let mut sep = if url.contains('?') { '&' } else { '?' };
        for (key, value) in self.query_params(query) {
            url.push(sep);
            url.push_str(key);
            url.push('=');
            url.push_str(&percent_encode(&value));
            sep = '&';
        }
        url
    }
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Turns a search response body into the overlay feature, if any.
/// Malformed bodies are logged and yield `None`.
pub fn parse_search_response(body: &str) -> Option<Feature> {
    match FeatureCollection::from_geojson_str(body) {
        Ok(collection) => {
            let count = collection.len();
            let picked = select_feature(collection, FeatureSource::Search);
            if picked.is_none() {
                tracing::debug!(results = count, "place search returned no polygonal result");
            }
            picked
        }
        Err(e) => {
            tracing::warn!(error = %e, "place search response rejected");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PlaceSearchConfig, parse_search_response};
    use pretty_assertions::assert_eq;

    #[test]
    fn query_params_follow_search_contract() {
        let cfg = PlaceSearchConfig::default();
        assert_eq!(
            cfg.query_params("Jelenia Góra"),
            vec![
                ("q", "Jelenia Góra".to_string()),
                ("format", "geojson".to_string()),
                ("polygon_geojson", "1".to_string()),
                ("limit", "5".to_string()),
            ]
        );
    }

    #[test]
    fn request_url_encodes_query() {
        let cfg = PlaceSearchConfig {
            endpoint: "https://example.test/search".to_string(),
            limit: 1,
        };
        assert_eq!(
            cfg.request_url("a b&c"),
            "https://example.test/search?q=a%20b%26c&format=geojson&polygon_geojson=1&limit=1"
        );
    }

    #[test]
    fn garbage_response_is_none() {
        assert!(parse_search_response("<html>rate limited</html>").is_none());
        assert!(parse_search_response(r#"{"type":"FeatureCollection","features":[]}"#).is_none());
    }

    #[test]
    fn picks_polygon_from_response() {
        let body = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"display_name":"Karpacz"},
             "geometry":{"type":"Polygon","coordinates":[[[15.7,50.7],[15.8,50.7],[15.8,50.8],[15.7,50.7]]]}}
        ]}"#;
        let f = parse_search_response(body).expect("feature");
        assert_eq!(f.property_str("display_name"), Some("Karpacz"));
    }

    #[test]
    fn boundary_survives_unsupported_neighbours() {
        let body = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"display_name":"Sudetes"},
             "geometry":{"type":"GeometryCollection","geometries":[]}},
            {"type":"Feature","properties":{"display_name":"nowhere"},"geometry":null},
            {"type":"Feature","properties":{"display_name":"Karkonosze","category":"boundary","type":"administrative"},
             "geometry":{"type":"Polygon","coordinates":[[[15.5,50.7],[15.9,50.7],[15.9,50.9],[15.5,50.7]]]}}
        ]}"#;
        let f = parse_search_response(body).expect("feature");
        assert_eq!(f.property_str("display_name"), Some("Karkonosze"));
    }
}
