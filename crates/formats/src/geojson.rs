use foundation::math::LonLat;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(LonLat),
    MultiPoint(Vec<LonLat>),
    LineString(Vec<LonLat>),
    MultiLineString(Vec<Vec<LonLat>>),
    Polygon(Vec<Vec<LonLat>>),
    MultiPolygon(Vec<Vec<Vec<LonLat>>>),
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    pub fn is_polygonal(&self) -> bool {
        matches!(self, Geometry::Polygon(_) | Geometry::MultiPolygon(_))
    }

    /// Calls `f` for every coordinate in the geometry.
    pub fn for_each_coord(&self, mut f: impl FnMut(LonLat)) {
        match self {
            Geometry::Point(p) => f(*p),
            Geometry::MultiPoint(ps) | Geometry::LineString(ps) => ps.iter().copied().for_each(f),
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                lines.iter().flatten().copied().for_each(f)
            }
            Geometry::MultiPolygon(polys) => polys.iter().flatten().flatten().copied().for_each(f),
        }
    }

    /// `(south-west, north-east)` corners, or `None` for an empty geometry.
    pub fn bounds(&self) -> Option<(LonLat, LonLat)> {
        let mut out: Option<(LonLat, LonLat)> = None;
        self.for_each_coord(|p| {
            let (min, max) = out.get_or_insert((p, p));
            min.lon = min.lon.min(p.lon);
            min.lat = min.lat.min(p.lat);
            max.lon = max.lon.max(p.lon);
            max.lat = max.lat.max(p.lat);
        });
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: Geometry,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: None,
            properties: Map::new(),
            geometry,
        }
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }

    pub fn property_f64(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(|v| v.as_f64())
    }

    /// Place-search results tag admin areas as `boundary`/`administrative`,
    /// either through `category`/`class` + `type` or a raw OSM `boundary` tag.
    pub fn is_administrative_boundary(&self) -> bool {
        let category = self
            .property_str("category")
            .or_else(|| self.property_str("class"));
        let kind = self.property_str("type");
        (category == Some("boundary") && kind == Some("administrative"))
            || self.property_str("boundary") == Some("administrative")
    }

    pub fn to_geojson_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::String("Feature".to_string()));
        if let Some(id) = &self.id {
            obj.insert("id".to_string(), Value::String(id.clone()));
        }
        obj.insert(
            "properties".to_string(),
            Value::Object(self.properties.clone()),
        );
        obj.insert(
            "geometry".to_string(),
            geometry_to_geojson_value(&self.geometry),
        );
        Value::Object(obj)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug)]
pub enum GeoJsonError {
    Json(serde_json::Error),
    NotFeatureOrCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for GeoJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoJsonError::Json(e) => write!(f, "JSON parse error: {e}"),
            GeoJsonError::NotFeatureOrCollection => {
                write!(f, "expected GeoJSON Feature or FeatureCollection")
            }
            GeoJsonError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for GeoJsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeoJsonError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl FeatureCollection {
    /// Parses either a `FeatureCollection` or a lone `Feature` (wrapped into a
    /// one-element collection).
    pub fn from_geojson_str(payload: &str) -> Result<Self, GeoJsonError> {
        let value: Value = serde_json::from_str(payload).map_err(GeoJsonError::Json)?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, GeoJsonError> {
        let obj = value
            .as_object()
            .ok_or(GeoJsonError::NotFeatureOrCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(GeoJsonError::NotFeatureOrCollection)?;

        match ty {
            "Feature" => {
                let feature = parse_feature(value)
                    .and_then(|f| f.ok_or_else(|| "feature has no drawable geometry".to_string()))
                    .map_err(|reason| GeoJsonError::InvalidFeature { index: 0, reason })?;
                Ok(Self {
                    features: vec![feature],
                })
            }
            "FeatureCollection" => {
                let features_val = obj
                    .get("features")
                    .and_then(|v| v.as_array())
                    .ok_or(GeoJsonError::NotFeatureOrCollection)?;
                let mut features = Vec::with_capacity(features_val.len());
                for (index, feat_val) in features_val.iter().enumerate() {
                    match parse_feature(feat_val)
                        .map_err(|reason| GeoJsonError::InvalidFeature { index, reason })?
                    {
                        Some(feature) => features.push(feature),
                        None => tracing::debug!(index, "skipping feature without drawable geometry"),
                    }
                }
                Ok(Self { features })
            }
            _ => Err(GeoJsonError::NotFeatureOrCollection),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }
}

/// `Ok(None)` for features whose geometry is null or of a type the overlay
/// cannot draw (e.g. GeometryCollection).
fn parse_feature(value: &Value) -> Result<Option<Feature>, String> {
    let feat_obj = value
        .as_object()
        .ok_or("feature must be an object".to_string())?;

    let feat_type = feat_obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("feature missing type".to_string())?;
    if feat_type != "Feature" {
        return Err(format!("unexpected feature type: {feat_type}"));
    }

    let id = match feat_obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let properties = feat_obj
        .get("properties")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();

    let geometry_val = feat_obj
        .get("geometry")
        .ok_or("feature missing geometry".to_string())?;
    if !is_drawable_geometry(geometry_val) {
        return Ok(None);
    }
    let geometry = parse_geometry(geometry_val)?;

    Ok(Some(Feature {
        id,
        properties,
        geometry,
    }))
}

fn is_drawable_geometry(value: &Value) -> bool {
    matches!(
        value.get("type").and_then(|v| v.as_str()),
        Some(
            "Point" | "MultiPoint" | "LineString" | "MultiLineString" | "Polygon" | "MultiPolygon"
        )
    )
}

fn geometry_to_geojson_value(geom: &Geometry) -> Value {
    let coords = match geom {
        Geometry::Point(p) => point_coords(p),
        Geometry::MultiPoint(ps) | Geometry::LineString(ps) => ring_coords(ps),
        Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
            Value::Array(lines.iter().map(|l| ring_coords(l)).collect())
        }
        Geometry::MultiPolygon(polys) => Value::Array(
            polys
                .iter()
                .map(|poly| Value::Array(poly.iter().map(|r| ring_coords(r)).collect()))
                .collect(),
        ),
    };

    let mut obj = Map::new();
    obj.insert(
        "type".to_string(),
        Value::String(geom.type_name().to_string()),
    );
    obj.insert("coordinates".to_string(), coords);
    Value::Object(obj)
}

fn point_coords(p: &LonLat) -> Value {
    Value::Array(vec![Value::from(p.lon), Value::from(p.lat)])
}

fn ring_coords(ps: &[LonLat]) -> Value {
    Value::Array(ps.iter().map(point_coords).collect())
}

fn parse_geometry(value: &Value) -> Result<Geometry, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    match ty {
        "Point" => Ok(Geometry::Point(parse_point(coords)?)),
        "MultiPoint" => Ok(Geometry::MultiPoint(parse_points(coords)?)),
        "LineString" => Ok(Geometry::LineString(parse_points(coords)?)),
        "MultiLineString" => Ok(Geometry::MultiLineString(parse_rings(coords)?)),
        "Polygon" => Ok(Geometry::Polygon(parse_rings(coords)?)),
        "MultiPolygon" => {
            let polys = coords
                .as_array()
                .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
            let mut out = Vec::with_capacity(polys.len());
            for poly in polys {
                out.push(parse_rings(poly)?);
            }
            Ok(Geometry::MultiPolygon(out))
        }
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_point(coords: &Value) -> Result<LonLat, String> {
    let arr = coords
        .as_array()
        .ok_or("Point coordinates must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("Point coordinates must have [lon, lat]".to_string());
    }
    let lon = arr[0]
        .as_f64()
        .ok_or("Point lon must be a number".to_string())?;
    let lat = arr[1]
        .as_f64()
        .ok_or("Point lat must be a number".to_string())?;
    Ok(LonLat::new(lon, lat))
}

fn parse_points(coords: &Value) -> Result<Vec<LonLat>, String> {
    let arr = coords
        .as_array()
        .ok_or("coordinates must be an array".to_string())?;
    arr.iter().map(parse_point).collect()
}

fn parse_rings(coords: &Value) -> Result<Vec<Vec<LonLat>>, String> {
    let rings = coords
        .as_array()
        .ok_or("coordinates must be an array of rings".to_string())?;
    rings.iter().map(parse_points).collect()
}

#[cfg(test)]
mod tests {
    use super::{FeatureCollection, GeoJsonError, Geometry};

    const SQUARE: &str = r#"{
        "type": "Feature",
        "id": 7,
        "properties": {"name": "square"},
        "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}
    }"#;

    #[test]
    fn lone_feature_becomes_single_collection() {
        let fc = FeatureCollection::from_geojson_str(SQUARE).expect("parse");
        assert_eq!(fc.len(), 1);
        let f = &fc.features[0];
        assert_eq!(f.id.as_deref(), Some("7"));
        assert_eq!(f.property_str("name"), Some("square"));
        assert!(f.geometry.is_polygonal());
    }

    #[test]
    fn parses_mixed_collection() {
        let payload = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"radius":120},"geometry":{"type":"Point","coordinates":[16.6,50.7]}},
            {"type":"Feature","properties":null,"geometry":{"type":"LineString","coordinates":[[0,0],[2,3]]}}
        ]}"#;
        let fc = FeatureCollection::from_geojson_str(payload).expect("parse");
        assert_eq!(fc.len(), 2);
        assert_eq!(fc.features[0].property_f64("radius"), Some(120.0));
        assert!(fc.features[1].properties.is_empty());
        assert!(matches!(fc.features[1].geometry, Geometry::LineString(_)));
    }

    #[test]
    fn rejects_bare_geometry() {
        let err = FeatureCollection::from_geojson_str(r#"{"type":"Point","coordinates":[0,0]}"#)
            .unwrap_err();
        assert!(matches!(err, GeoJsonError::NotFeatureOrCollection));
    }

    #[test]
    fn reports_bad_feature_index() {
        let payload = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[0,0]}},
            {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":["x",0]}}
        ]}"#;
        match FeatureCollection::from_geojson_str(payload) {
            Err(GeoJsonError::InvalidFeature { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn collection_skips_null_and_unsupported_geometry() {
        let payload = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"name":"gc"},"geometry":{"type":"GeometryCollection","geometries":[]}},
            {"type":"Feature","properties":{"name":"none"},"geometry":null},
            {"type":"Feature","properties":{"name":"area"},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}
        ]}"#;
        let fc = FeatureCollection::from_geojson_str(payload).expect("parse");
        assert_eq!(fc.len(), 1);
        assert_eq!(fc.features[0].property_str("name"), Some("area"));
    }

    #[test]
    fn lone_feature_without_geometry_is_an_error() {
        let payload = r#"{"type":"Feature","properties":{},"geometry":null}"#;
        assert!(matches!(
            FeatureCollection::from_geojson_str(payload),
            Err(GeoJsonError::InvalidFeature { index: 0, .. })
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            FeatureCollection::from_geojson_str("{not json"),
            Err(GeoJsonError::Json(_))
        ));
    }

    #[test]
    fn bounds_cover_all_rings() {
        let fc = FeatureCollection::from_geojson_str(SQUARE).expect("parse");
        let (min, max) = fc.features[0].geometry.bounds().expect("bounds");
        assert_eq!((min.lon, min.lat, max.lon, max.lat), (0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn export_round_trips_through_parser() {
        let fc = FeatureCollection::from_geojson_str(SQUARE).expect("parse");
        let value = fc.features[0].to_geojson_value();
        let again = FeatureCollection::from_geojson_value(&value).expect("reparse");
        assert_eq!(again.features[0], fc.features[0]);
    }
}
