//! Point-of-interest records produced by discovery strategies.

use serde::{Deserialize, Serialize};

use super::geo::Coordinates;

/// Fallback address when a source has no usable address fields.
pub const UNKNOWN_ADDRESS: &str = "Address unknown";

/// One candidate chain location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiRecord {
    /// Opaque id, unique within the discovery source
    pub source_key: String,

    /// Human-readable name
    pub display_name: String,

    /// Best-effort formatted address
    pub address: String,

    /// Reported location
    pub coordinates: Coordinates,

    /// Distance from the search origin in kilometers (never negative)
    pub distance_km: f64,

    /// Phone number if the source had one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Chain identifier needed for menu lookups, filled lazily
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_id: Option<String>,
}

impl PoiRecord {
    /// Create a record with the required fields.
    ///
    /// A negative or non-finite distance is clamped to zero.
    pub fn new(
        source_key: impl Into<String>,
        display_name: impl Into<String>,
        coordinates: Coordinates,
        distance_km: f64,
    ) -> Self {
        let distance_km = if distance_km.is_finite() && distance_km > 0.0 {
            distance_km
        } else {
            0.0
        };

        Self {
            source_key: source_key.into(),
            display_name: display_name.into(),
            address: UNKNOWN_ADDRESS.to_string(),
            coordinates,
            distance_km,
            phone: None,
            canonical_id: None,
        }
    }

    /// Set the formatted address. Blank input keeps the unknown marker.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        let address = address.into();
        if !address.trim().is_empty() {
            self.address = address;
        }
        self
    }

    /// Set the phone number. Blank input is ignored.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        let phone = phone.into();
        if !phone.trim().is_empty() {
            self.phone = Some(phone);
        }
        self
    }

    /// Set the canonical chain identifier. Blank input is ignored.
    pub fn with_canonical_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if !id.trim().is_empty() {
            self.canonical_id = Some(id);
        }
        self
    }

    /// Whether the address is something more useful than the unknown marker.
    pub fn has_address(&self) -> bool {
        self.address != UNKNOWN_ADDRESS
    }
}
