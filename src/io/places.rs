//! Store discovery documents
//!
//! Parses a Places text-search style response into `Store`s:
//! `results[].place_id`, `name`, `formatted_address`, `opening_hours.open_now`,
//! `geometry.location.{lat,lng}`, `rating`.

use crate::domain::types::{LatLng, Store, StoreId};
use crate::error::ScoreError;
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    place_id: String,
    name: String,
    formatted_address: String,
    #[serde(default)]
    opening_hours: Option<OpeningHours>,
    geometry: Geometry,
    #[serde(default)]
    rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OpeningHours {
    #[serde(default)]
    open_now: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

impl From<PlaceResult> for Store {
    fn from(place: PlaceResult) -> Self {
        Store {
            id: StoreId(place.place_id),
            name: place.name,
            address: place.formatted_address,
            open_now: place.opening_hours.and_then(|h| h.open_now),
            location: LatLng::new(place.geometry.location.lat, place.geometry.location.lng),
            rating: place.rating.unwrap_or(0.0),
        }
    }
}

/// Parse a discovery document into stores
pub fn parse_places(json: &str) -> Result<Vec<Store>, ScoreError> {
    let response: PlacesResponse =
        serde_json::from_str(json).map_err(|e| ScoreError::Parse(e.to_string()))?;
    Ok(response.results.into_iter().map(Store::from).collect())
}

/// Read and parse a discovery document from disk
pub fn load_places<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Store>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read stores file {}", path.display()))?;
    parse_places(&content).with_context(|| format!("Failed to parse stores file {}", path.display()))
}
