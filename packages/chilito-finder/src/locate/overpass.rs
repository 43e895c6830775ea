//! OpenStreetMap Overpass fallback.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::LocateQuery;
use crate::error::StrategyResult;
use crate::fetchers::build_url;
use crate::traits::fetcher::{FetchRequest, Fetcher};
use crate::traits::strategy::Strategy;
use crate::types::geo::Coordinates;
use crate::types::location::{PoiRecord, UNKNOWN_ADDRESS};

pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Meters per degree of latitude, used for the bounding box.
const METERS_PER_DEGREE: f64 = 111_000.0;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OverpassResponse {
    elements: Vec<Element>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Element {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<Center>,
    tags: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Center {
    lat: Option<f64>,
    lon: Option<f64>,
}

impl Element {
    /// Nodes carry their own position; ways and relations use `center`.
    fn coordinates(&self) -> Option<Coordinates> {
        let (lat, lon) = if self.kind == "node" {
            (self.lat?, self.lon?)
        } else {
            let center = self.center.as_ref()?;
            (center.lat?, center.lon?)
        };
        Coordinates::new(lat, lon).ok()
    }

    fn tag(&self, key: &str) -> &str {
        self.tags.get(key).map(|v| v.trim()).unwrap_or("")
    }
}

/// House number + street, city, state and postcode. Any missing piece is
/// skipped; with nothing at all the address is unknown.
fn assemble_address(element: &Element) -> String {
    let mut address = String::new();

    let housenumber = element.tag("addr:housenumber");
    let street = element.tag("addr:street");
    if !housenumber.is_empty() && !street.is_empty() {
        address = format!("{} {}", housenumber, street);
    }

    for (key, separator) in [("addr:city", ", "), ("addr:state", ", "), ("addr:postcode", " ")] {
        let value = element.tag(key);
        if value.is_empty() {
            continue;
        }
        if !address.is_empty() {
            address.push_str(separator);
        }
        address.push_str(value);
    }

    if address.is_empty() {
        UNKNOWN_ADDRESS.to_string()
    } else {
        address
    }
}

/// Overpass QL for fast-food places whose name matches the chain.
fn build_query(chain_name: &str, origin: &Coordinates, radius_meters: u32) -> String {
    let degrees = f64::from(radius_meters) / METERS_PER_DEGREE;
    let bbox = format!(
        "{:.6},{:.6},{:.6},{:.6}",
        (origin.latitude() - degrees).max(-90.0),
        (origin.longitude() - degrees).max(-180.0),
        (origin.latitude() + degrees).min(90.0),
        (origin.longitude() + degrees).min(180.0),
    );
    let name = chain_name.replace('\\', "\\\\").replace('"', "\\\"");

    let mut query = String::from("[out:json][timeout:25];\n(\n");
    for kind in ["node", "way", "relation"] {
        query.push_str(&format!(
            "  {}[\"amenity\"=\"fast_food\"][\"name\"~\"{}\",i]({});\n",
            kind, name, bbox
        ));
    }
    query.push_str(");\nout center;");
    query
}

/// Open geographic database fallback. Zero elements is a valid empty answer.
pub struct OverpassLocator {
    fetcher: Arc<dyn Fetcher>,
    chain_name: String,
    endpoint: String,
}

impl OverpassLocator {
    pub fn new(fetcher: Arc<dyn Fetcher>, chain_name: impl Into<String>) -> Self {
        Self {
            fetcher,
            chain_name: chain_name.into(),
            endpoint: OVERPASS_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Strategy<LocateQuery, Vec<PoiRecord>> for OverpassLocator {
    fn name(&self) -> &str {
        "overpass"
    }

    async fn attempt(&self, query: &LocateQuery) -> StrategyResult<Vec<PoiRecord>> {
        let ql = build_query(&self.chain_name, &query.origin, query.radius_meters);
        let url = build_url(&self.endpoint, &[], &[("data", ql.as_str())])?;

        let response = self
            .fetcher
            .fetch(&FetchRequest::new(url).accept_json())
            .await?
            .ensure_success()?;
        let body: OverpassResponse = response.json()?;

        let records: Vec<PoiRecord> = body
            .elements
            .iter()
            .filter_map(|element| {
                let coordinates = element.coordinates()?;
                let name = match element.tag("name") {
                    "" => self.chain_name.as_str(),
                    name => name,
                };

                Some(
                    PoiRecord::new(
                        format!("osm-{}-{}", element.kind, element.id),
                        name,
                        coordinates,
                        query.origin.distance_km(&coordinates),
                    )
                    .with_address(assemble_address(element))
                    .with_phone(element.tag("phone")),
                )
            })
            .collect();

        debug!(
            elements = body.elements.len(),
            usable = records.len(),
            "Parsed Overpass elements"
        );

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    fn element(tags: &[(&str, &str)]) -> Element {
        Element {
            kind: "node".into(),
            id: 1,
            lat: Some(39.1),
            lon: Some(-89.6),
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_address_assembly() {
        let full = element(&[
            ("addr:housenumber", "123"),
            ("addr:street", "Main St"),
            ("addr:city", "Springfield"),
            ("addr:state", "IL"),
            ("addr:postcode", "62701"),
        ]);
        assert_eq!(assemble_address(&full), "123 Main St, Springfield, IL 62701");

        // Street without a house number is dropped
        let partial = element(&[("addr:street", "Main St"), ("addr:city", "Springfield")]);
        assert_eq!(assemble_address(&partial), "Springfield");

        assert_eq!(assemble_address(&element(&[])), UNKNOWN_ADDRESS);
    }

    #[test]
    fn test_query_bbox_is_south_west_north_east() {
        let origin = Coordinates::new(39.0, -89.0).unwrap();
        let query = build_query("Taco Bell", &origin, 111_000);

        assert!(query.contains("(38.000000,-90.000000,40.000000,-88.000000)"));
        assert!(query.contains(r#"way["amenity"="fast_food"]["name"~"Taco Bell",i]"#));
        assert!(query.ends_with("out center;"));
    }

    #[test]
    fn test_query_bbox_clamped_to_valid_range() {
        let near_pole = Coordinates::new(89.5, 179.5).unwrap();
        let query = build_query("Taco Bell", &near_pole, 222_000);
        assert!(query.contains("(87.500000,177.500000,90.000000,180.000000)"));

        let south_west = Coordinates::new(-89.5, -179.5).unwrap();
        let query = build_query("Taco Bell", &south_west, 222_000);
        assert!(query.contains("(-90.000000,-180.000000,-87.500000,-177.500000)"));
    }

    #[tokio::test]
    async fn test_elements_to_records() {
        let body = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 42, "lat": 39.11, "lon": -89.6,
                 "tags": {"name": "Taco Bell", "phone": "+1 217 555 0100"}},
                {"type": "way", "id": 7, "center": {"lat": 39.2, "lon": -89.6},
                 "tags": {"addr:city": "Springfield"}},
                {"type": "relation", "id": 9, "tags": {"name": "Taco Bell"}}
            ]
        }"#;
        let mock = MockFetcher::new().with_prefix_page("https://overpass.test/api", body);
        let locator = OverpassLocator::new(Arc::new(mock.clone()), "Taco Bell")
            .with_endpoint("https://overpass.test/api");

        let origin = Coordinates::new(39.1, -89.6).unwrap();
        let records = locator
            .attempt(&LocateQuery::new(origin, 50_000))
            .await
            .unwrap();

        assert_eq!(records.len(), 2, "relation without center is skipped");
        assert_eq!(records[0].source_key, "osm-node-42");
        assert_eq!(records[0].address, UNKNOWN_ADDRESS);
        assert_eq!(records[0].phone.as_deref(), Some("+1 217 555 0100"));
        assert!(records[0].canonical_id.is_none());
        assert_eq!(records[1].source_key, "osm-way-7");
        assert_eq!(records[1].display_name, "Taco Bell");
        assert!(records[1].distance_km > records[0].distance_km);
    }

    #[tokio::test]
    async fn test_zero_elements_is_success() {
        let mock = MockFetcher::new()
            .with_prefix_page("https://overpass.test/api", r#"{"elements": []}"#);
        let locator = OverpassLocator::new(Arc::new(mock), "Taco Bell")
            .with_endpoint("https://overpass.test/api");

        let origin = Coordinates::new(39.1, -89.6).unwrap();
        let records = locator.attempt(&LocateQuery::new(origin, 1000)).await.unwrap();
        assert!(records.is_empty());
    }
}
