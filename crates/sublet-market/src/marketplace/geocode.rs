use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Resolved coordinates for a street address.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Address resolution collaborator. Lookups that fail for any reason
/// (network, quota, unknown address) degrade to `None`; a missing location
/// never blocks listing creation.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &str) -> Option<GeoPoint>;
}

/// Geocoder that resolves nothing. Used when no upstream geocoding service
/// is configured, and by tests that do not care about coordinates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGeocoder;

#[async_trait]
impl Geocoder for NoGeocoder {
    async fn resolve(&self, _address: &str) -> Option<GeoPoint> {
        None
    }
}
