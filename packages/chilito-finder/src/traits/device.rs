//! Device location collaborator.
//!
//! The finder does not read GPS hardware. A presentation layer that can
//! supplies an implementation, and the finder searches from its coordinates.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::geo::Coordinates;

/// Source of the device's current position.
#[async_trait]
pub trait DeviceLocator: Send + Sync {
    async fn current_coordinates(&self) -> Result<Coordinates>;
}

/// A device that is always at the same place.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl DeviceLocator for FixedLocation {
    async fn current_coordinates(&self) -> Result<Coordinates> {
        Ok(self.0)
    }
}
