//! Coordinates and great-circle distance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Miles to kilometers.
pub const KM_PER_MILE: f64 = 1.60934;

/// A validated latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

/// Unchecked wire form of [`Coordinates`].
#[derive(Deserialize)]
struct RawCoordinates {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = InvalidCoordinates;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Coordinates::new(raw.latitude, raw.longitude)
    }
}

/// Latitude or longitude outside its valid range, or not a number.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinates ({latitude}, {longitude})")]
pub struct InvalidCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Create coordinates, rejecting values outside [-90, 90] / [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinates> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if valid {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(InvalidCoordinates {
                latitude,
                longitude,
            })
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Parse the `"lat,lng"` text form produced by device location services.
    ///
    /// Returns `None` for anything that is not exactly two comma-separated
    /// numbers in range.
    pub fn parse(text: &str) -> Option<Self> {
        let (lat, lng) = text.trim().split_once(',')?;
        let lat: f64 = lat.trim().parse().ok()?;
        let lng: f64 = lng.trim().parse().ok()?;
        Self::new(lat, lng).ok()
    }

    /// Render as `"lat,lng"`, the inverse of [`Coordinates::parse`].
    pub fn to_query_text(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }

    /// Great-circle distance to `other` in kilometers.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine_km(self, other)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinates {
    type Err = InvalidCoordinates;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(InvalidCoordinates {
            latitude: f64::NAN,
            longitude: f64::NAN,
        })
    }
}

/// Calculate distance between two coordinates in kilometers
///
/// Uses Haversine formula for accuracy on Earth's surface
pub fn haversine_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (dlng / 2.0).sin().powi(2);

    // Rounding can push h a hair outside [0, 1] for near-antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Parse a source-reported distance such as `"0.25 Miles"`, `"1.3 mi"` or
/// `"2 km"` into kilometers.
///
/// A bare number is taken as miles, which is what the chain's store API
/// reports. Returns `None` for empty, unparseable or negative values.
pub fn parse_distance_km(text: &str) -> Option<f64> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let value: f64 = number.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    match unit.trim() {
        "" | "mi" | "mile" | "miles" => Some(value * KM_PER_MILE),
        "km" | "kms" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => Some(value),
        "m" | "meter" | "meters" | "metre" | "metres" => Some(value / 1000.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    #[test]
    fn test_calculate_distance() {
        // Minneapolis to St. Paul (≈14.6 km)
        let minneapolis = c(44.98, -93.27);
        let st_paul = c(44.95, -93.09);

        let distance = haversine_km(&minneapolis, &st_paul);
        assert!(distance > 14.0 && distance < 15.5, "{distance}");

        // Same location
        assert!(haversine_km(&minneapolis, &minneapolis).abs() < 1e-9);
    }

    #[test]
    fn test_deserialize_validates_range() {
        let ok: Coordinates =
            serde_json::from_str(r#"{"latitude": 39.1, "longitude": -89.6}"#).unwrap();
        assert_eq!(ok, c(39.1, -89.6));

        let json = serde_json::to_string(&ok).unwrap();
        assert_eq!(serde_json::from_str::<Coordinates>(&json).unwrap(), ok);

        assert!(serde_json::from_str::<Coordinates>(r#"{"latitude": 123.0, "longitude": 0.0}"#).is_err());
        assert!(serde_json::from_str::<Coordinates>(r#"{"latitude": 0.0, "longitude": -181.0}"#).is_err());
    }

    #[test]
    fn test_distance_symmetric_and_non_negative() {
        let points = [
            c(0.0, 0.0),
            c(39.1, -89.6),
            c(-33.8688, 151.2093),
            c(90.0, 180.0),
            c(-90.0, -180.0),
            c(51.5, -0.12),
        ];

        for a in &points {
            for b in &points {
                let ab = haversine_km(a, b);
                let ba = haversine_km(b, a);
                assert!(ab >= 0.0);
                assert!((ab - ba).abs() < 1e-9, "asymmetric for {a} / {b}");
                if a == b {
                    assert!(ab < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_distinct_points_have_positive_distance() {
        let a = c(39.1, -89.6);
        let b = c(39.1001, -89.6);
        assert!(haversine_km(&a, &b) > 0.0);
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(90.1, 0.0).is_err());
        assert!(Coordinates::new(0.0, -180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_parse_lat_lng_text() {
        let coords = Coordinates::parse(" 39.1, -89.6 ").unwrap();
        assert_eq!(coords.latitude(), 39.1);
        assert_eq!(coords.longitude(), -89.6);

        assert!(Coordinates::parse("123 Main St, Springfield").is_none());
        assert!(Coordinates::parse("95.0,10.0").is_none());
        assert!(Coordinates::parse("39.1").is_none());

        let round_trip = Coordinates::parse(&coords.to_query_text()).unwrap();
        assert_eq!(round_trip, coords);
    }

    #[test]
    fn test_parse_distance() {
        let km = parse_distance_km("0.25 Miles").unwrap();
        assert!((km - 0.402335).abs() < 1e-6);

        assert_eq!(parse_distance_km("2 km"), Some(2.0));
        assert_eq!(parse_distance_km("500 m"), Some(0.5));
        assert!((parse_distance_km("1").unwrap() - KM_PER_MILE).abs() < 1e-9);

        assert_eq!(parse_distance_km(""), None);
        assert_eq!(parse_distance_km("far away"), None);
        assert_eq!(parse_distance_km("-3 Miles"), None);
        assert_eq!(parse_distance_km("3 parsecs"), None);
    }
}
