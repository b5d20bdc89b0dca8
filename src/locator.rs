//! Supplier Locator
//!
//! Geocodes a free-text address through a Nominatim-compatible search API and
//! returns the closest gas supplier, provided it lies within the search radius.
//!
//! The supplier dataset is loaded once at startup and never mutated; the
//! computed distance only exists on the per-request [`RankedSupplier`].

use crate::geo::Coordinates;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Suppliers further than this are not offered
pub const DEFAULT_RADIUS_KM: f64 = 50.0;

/// Static supplier entry. Fields beyond name/lat/lng are kept as-is and
/// echoed back to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Supplier {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

/// Supplier plus its distance from the user, serialized flat
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSupplier {
    #[serde(flatten)]
    pub supplier: Supplier,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("Address is required")]
    MissingAddress,

    #[error("Address not found")]
    AddressNotFound,

    #[error("No nearby gas supplier found within {0} km.")]
    NoSupplierInRange(f64),

    #[error("geocoder request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("geocoder returned unusable coordinates: {0}")]
    InvalidCoordinates(String),
}

/// Load the supplier dataset (a JSON array)
pub fn load_suppliers(path: &Path) -> Result<Vec<Supplier>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read supplier file: {:?}", path))?;

    let suppliers: Vec<Supplier> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse supplier JSON: {:?}", path))?;

    Ok(suppliers)
}

/// All suppliers, nearest first
pub fn rank_by_distance(origin: Coordinates, suppliers: &[Supplier]) -> Vec<RankedSupplier> {
    let mut ranked: Vec<RankedSupplier> = suppliers
        .iter()
        .map(|s| RankedSupplier {
            distance_km: origin.distance_km(&s.coordinates()),
            supplier: s.clone(),
        })
        .collect();

    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked
}

/// Closest supplier, or `NoSupplierInRange` if it is beyond `radius_km` (or there are none)
pub fn nearest_within(
    origin: Coordinates,
    suppliers: &[Supplier],
    radius_km: f64,
) -> Result<RankedSupplier, LocateError> {
    rank_by_distance(origin, suppliers)
        .into_iter()
        .next()
        .filter(|closest| closest.distance_km <= radius_km)
        .ok_or(LocateError::NoSupplierInRange(radius_km))
}

// ============================================================================
// Geocoding
// ============================================================================

/// Nominatim sends coordinates as strings; some compatible services send numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Degrees {
    Number(f64),
    Text(String),
}

impl Degrees {
    fn value(&self) -> Result<f64, LocateError> {
        let v = match self {
            Degrees::Number(n) => *n,
            Degrees::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| LocateError::InvalidCoordinates(s.clone()))?,
        };
        if v.is_finite() {
            Ok(v)
        } else {
            Err(LocateError::InvalidCoordinates(v.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: Degrees,
    lon: Degrees,
}

/// Client for a Nominatim-style `/search?format=json&q=...` endpoint
#[derive(Debug, Clone)]
pub struct Geocoder {
    http: reqwest::Client,
    search_url: String,
    user_agent: String,
}

impl Geocoder {
    pub fn new(http: reqwest::Client, search_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            http,
            search_url: search_url.into(),
            user_agent: user_agent.into(),
        }
    }

    /// First match for `address`, or `None` when the service found nothing
    pub async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, LocateError> {
        let places: Vec<Place> = self
            .http
            .get(&self.search_url)
            .query(&[("format", "json"), ("q", address)])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match places.first() {
            Some(place) => Ok(Some(Coordinates::new(place.lat.value()?, place.lon.value()?))),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Locator
// ============================================================================

#[derive(Debug, Clone)]
pub struct SupplierLocator {
    geocoder: Geocoder,
    suppliers: Vec<Supplier>,
    radius_km: f64,
}

impl SupplierLocator {
    pub fn new(geocoder: Geocoder, suppliers: Vec<Supplier>) -> Self {
        Self {
            geocoder,
            suppliers,
            radius_km: DEFAULT_RADIUS_KM,
        }
    }

    pub fn suppliers(&self) -> &[Supplier] {
        &self.suppliers
    }

    /// Geocode `address` and pick the closest supplier within the radius
    pub async fn find_nearest(&self, address: Option<&str>) -> Result<RankedSupplier, LocateError> {
        let address = address
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or(LocateError::MissingAddress)?;

        let origin = self
            .geocoder
            .geocode(address)
            .await?
            .ok_or(LocateError::AddressNotFound)?;

        tracing::debug!("Geocoded '{}' to ({}, {})", address, origin.lat, origin.lng);

        let nearest = nearest_within(origin, &self.suppliers, self.radius_km)?;
        tracing::info!(
            "Nearest supplier for '{}': {} at {:.2} km",
            address,
            nearest.supplier.name,
            nearest.distance_km
        );
        Ok(nearest)
    }
}
