//! End-to-end searches against a mocked web.

use std::sync::Arc;

use chilito_finder::{
    ErrorKind, Finder, FinderConfig, FixedIdentity, MockFetcher, OverrideTable,
    VerificationResult,
};
use tokio_util::sync::CancellationToken;

const SITE: &str = "https://chain.test";
const GEOCODE: &str = "https://chain.test/location/v1/123%20Main%20St,%20Springfield";
const STORES: &str = "https://chain.test/tacobellwebservices/v4/tacobell/stores?";
const OVERPASS: &str = "https://overpass-api.de/api/interpreter?";

fn finder(mock: &MockFetcher) -> Finder {
    let config = FinderConfig::default().with_base_url(SITE).immediate();
    Finder::new(Arc::new(mock.clone()), config)
        .unwrap()
        .with_identity(Arc::new(FixedIdentity("IntegrationTest/1.0".into())))
        .with_overrides(OverrideTable::empty())
}

fn springfield() -> MockFetcher {
    MockFetcher::new().with_page(
        GEOCODE,
        r#"{"success": true, "geometry": {"lat": 39.1, "lng": -89.6}}"#,
    )
}

const TWO_STORES: &str = r#"{
    "nearByStores": [
        {
            "storeNumber": "000222",
            "address": {"line1": "9 Oak Ave", "town": "Springfield", "postalCode": "62702",
                        "region": {"isocode": "US-IL"}},
            "geoPoint": {"latitude": 39.13, "longitude": -89.6},
            "formattedDistance": "3.4 km"
        },
        {
            "storeNumber": "000111",
            "address": {"line1": "123 Main St", "town": "Springfield", "postalCode": "62701",
                        "region": {"isocode": "US-IL"}},
            "geoPoint": {"latitude": 39.11, "longitude": -89.6},
            "formattedDistance": "1.2 km"
        }
    ]
}"#;

#[tokio::test]
async fn test_nearest_verified_location_wins() {
    let mock = springfield()
        .with_prefix_page(STORES, TWO_STORES)
        .with_prefix_page("https://chain.test/food/", "<p>Crunchwrap Supreme</p>")
        .with_page(
            "https://chain.test/food/burritos?store=000222",
            "<div class=\"product-name\">Chili Cheese Burrito</div>",
        );

    let outcome = finder(&mock).search("123 Main St, Springfield", 100_000).await;

    assert!(outcome.found);
    assert!(outcome.error_kind.is_none());

    let location = outcome.location.unwrap();
    assert_eq!(location.source_key, "000222");
    assert_eq!(location.address, "9 Oak Ave, Springfield, IL 62702");
    assert!((location.distance_km - 3.4).abs() < 1e-9);

    let origin = outcome.origin.unwrap();
    assert_eq!((origin.latitude(), origin.longitude()), (39.1, -89.6));

    // Nearest first: A checked and rejected, then B
    assert_eq!(outcome.attempts.len(), 2);
    assert_eq!(outcome.attempts[0].identifier, "000111");
    assert_eq!(outcome.attempts[0].result, VerificationResult::NotFound);
    assert_eq!(outcome.attempts[1].identifier, "000222");
    assert_eq!(outcome.attempts[1].result, VerificationResult::Found);

    // A: all three categories; B: stops at burritos
    assert_eq!(mock.calls_matching("https://chain.test/food/"), 5);
    assert_eq!(mock.calls_matching("https://chain.test/food/specialties?store=000222"), 0);
}

#[tokio::test]
async fn test_nothing_within_radius() {
    let mock = springfield()
        .with_prefix_page(STORES, TWO_STORES)
        .with_prefix_page("https://chain.test/food/", "<p>Chilito</p>");

    let outcome = finder(&mock).search("123 Main St, Springfield", 1_000).await;

    assert!(!outcome.found);
    assert!(outcome.error_kind.is_none());
    assert!(outcome.message.unwrap().contains("within"));
    assert!(outcome.attempts.is_empty());
    assert_eq!(mock.calls_matching("https://chain.test/food/"), 0);
    assert_eq!(mock.calls_matching("https://chain.test/locations/"), 0);
}

#[tokio::test]
async fn test_store_api_down_falls_back_to_overpass() {
    let overpass = r#"{"elements": [
        {"type": "node", "id": 42, "lat": 39.11, "lon": -89.6,
         "tags": {"name": "Taco Bell", "addr:housenumber": "123", "addr:street": "Main St",
                  "addr:city": "Springfield", "addr:state": "IL"}}
    ]}"#;
    let search_page = r#"<div class="location-card" data-store-id="000111">
        <span class="address">123 Main Street, Springfield, IL</span></div>"#;

    let mock = springfield()
        .fail_prefix(STORES)
        .with_prefix_page(OVERPASS, overpass)
        .with_prefix_page("https://chain.test/locations/search?q=", search_page)
        .with_page("https://chain.test/food/menu?store=000111", "<p>The Chilito is back</p>");

    let outcome = finder(&mock).search("123 Main St, Springfield", 100_000).await;

    assert!(outcome.found);
    let location = outcome.location.unwrap();
    assert_eq!(location.source_key, "osm-node-42");
    assert_eq!(location.canonical_id.as_deref(), Some("000111"));
    assert_eq!(mock.calls_matching("https://chain.test/locations/search"), 1);
}

#[tokio::test]
async fn test_all_geocoders_fail() {
    let mock = MockFetcher::new()
        .with_status(GEOCODE, 500, "")
        .fail_prefix("https://nominatim.openstreetmap.org/");

    let outcome = finder(&mock).search("123 Main St, Springfield", 100_000).await;

    assert!(!outcome.found);
    assert_eq!(outcome.error_kind, Some(ErrorKind::Geocode));
    assert!(outcome.message.unwrap().contains("nominatim"));
    assert_eq!(mock.calls_matching(STORES), 0);
}

#[tokio::test]
async fn test_all_discovery_fails() {
    let mock = springfield().fail_prefix(STORES).fail_prefix(OVERPASS);

    let outcome = finder(&mock).search("123 Main St, Springfield", 100_000).await;

    assert_eq!(outcome.error_kind, Some(ErrorKind::Locate));
    assert!(outcome.origin.is_some());
}

#[tokio::test]
async fn test_unreadable_menus_exhaust_candidates() {
    let mock = springfield()
        .with_prefix_page(STORES, TWO_STORES)
        .fail_prefix("https://chain.test/food/");

    let outcome = finder(&mock).search("123 Main St, Springfield", 100_000).await;

    assert!(!outcome.found);
    assert!(outcome.error_kind.is_none());
    assert!(outcome
        .attempts
        .iter()
        .all(|a| a.result == VerificationResult::Inconclusive));
    // 2 candidates x 3 categories x 3 attempts
    assert_eq!(mock.calls_matching("https://chain.test/food/"), 18);
}

#[tokio::test]
async fn test_cancelled_search() {
    let mock = springfield();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = finder(&mock)
        .search_with_cancel("123 Main St, Springfield", 100_000, cancel)
        .await;

    assert!(!outcome.found);
    assert_eq!(outcome.error_kind, Some(ErrorKind::Cancelled));
}

#[tokio::test]
async fn test_outcome_json() {
    let mock = springfield()
        .with_prefix_page(STORES, TWO_STORES)
        .with_prefix_page("https://chain.test/food/", "<p>chili cheese burrito</p>");

    let outcome = finder(&mock).search("123 Main St, Springfield", 100_000).await;
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["found"], true);
    assert_eq!(json["location"]["source_key"], "000111");
    assert_eq!(json["attempts"][0]["result"], "found");
    assert!(json.get("error_kind").is_none());
}
