use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filter::LocationFilter;

/// A resolved place
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    pub state: String,
    pub country: String,
    pub formatted_address: String,
}

/// One component of a provider's place result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl AddressComponent {
    fn has_type(&self, wanted: &str) -> bool {
        self.types.iter().any(|t| t == wanted)
    }
}

impl Address {
    /// Picks city/state/country out of a provider's address components.
    ///
    /// City is the locality, or the second-level administrative area when the
    /// place has no locality.
    pub fn from_components(components: &[AddressComponent], formatted_address: &str) -> Self {
        let find = |kind: &str| {
            components
                .iter()
                .find(|c| c.has_type(kind))
                .map(|c| c.long_name.clone())
        };

        Self {
            city: find("locality")
                .or_else(|| find("administrative_area_level_2"))
                .unwrap_or_default(),
            state: find("administrative_area_level_1").unwrap_or_default(),
            country: find("country").unwrap_or_default(),
            formatted_address: formatted_address.to_string(),
        }
    }
}

/// Address resolution provider
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves coordinates to an address
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Address>;
}

/// Location filter for the place at the given coordinates
pub async fn locate<G: Geocoder + ?Sized>(
    geocoder: &G,
    latitude: f64,
    longitude: f64,
) -> Result<LocationFilter> {
    let address = geocoder.reverse(latitude, longitude).await?;
    debug!(formatted = %address.formatted_address, "resolved location");
    Ok(LocationFilter::from(&address))
}
