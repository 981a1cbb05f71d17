//! Canonical property records.
//!
//! `Property` is the schema-stable representation produced by the parser,
//! independent of the raw wire shape of any feed revision. It acts as the
//! anti-corruption layer between the upstream feed and everything that
//! reads from the cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a listing is offered for sale or for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Sale,
    Rent,
}

/// The commercial side of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    /// Price in whole currency units. Zero when the feed omits it.
    pub price: u64,
    /// ISO 4217 currency code.
    pub currency: String,
}

/// Geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Postal address of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
}

/// Physical characteristics of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Features {
    pub rooms: u32,
    pub bathrooms: u32,
    /// Constructed area in square metres.
    pub area_m2: u32,
    #[serde(default)]
    pub floor: Option<String>,
}

/// A language-tagged description block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub language: String,
    pub text: String,
}

/// A listing image, ordered by `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub position: u32,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

/// Publication state of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Active,
    Inactive,
}

/// The canonical, normalized listing record.
///
/// Every property in a cached collection has a unique `id`. Empty
/// description/image lists are valid absence, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    #[serde(default)]
    pub external_ref: Option<String>,
    pub operation: Operation,
    pub address: Address,
    pub features: Features,
    #[serde(default)]
    pub descriptions: Vec<Description>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub status: PropertyStatus,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// True only for synthetic records served when every upstream source
    /// failed. Never set on records parsed from a feed.
    #[serde(default)]
    pub placeholder: bool,
}

impl Property {
    /// Synthetic stand-in for a listing that could not be resolved from
    /// any source. Visibly tagged via `placeholder` so it can never be
    /// mistaken for feed data.
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            external_ref: None,
            operation: Operation { kind: OperationKind::Sale, price: 0, currency: "EUR".to_owned() },
            address: Address {
                street: String::new(),
                city: "unknown".to_owned(),
                province: String::new(),
                postal_code: String::new(),
                coordinates: None,
            },
            features: Features { rooms: 0, bathrooms: 0, area_m2: 0, floor: None },
            descriptions: Vec::new(),
            images: Vec::new(),
            status: PropertyStatus::Inactive,
            published_at: None,
            updated_at: None,
            placeholder: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_tagged() {
        let property = Property::placeholder("p-404");
        assert!(property.placeholder);
        assert_eq!(property.id, "p-404");
        assert_eq!(property.status, PropertyStatus::Inactive);
        assert_eq!(property.operation.price, 0);
    }

    #[test]
    fn test_serde_roundtrip_defaults_optional_fields() {
        let json = serde_json::json!({
            "id": "p-1",
            "operation": { "kind": "rent", "price": 950, "currency": "EUR" },
            "address": { "street": "Calle Mayor 1", "city": "Madrid", "province": "Madrid", "postal_code": "28013" },
            "features": { "rooms": 3, "bathrooms": 1, "area_m2": 82 },
            "status": "active"
        });
        let property: Property = serde_json::from_value(json).unwrap();
        assert_eq!(property.operation.kind, OperationKind::Rent);
        assert!(property.descriptions.is_empty());
        assert!(property.images.is_empty());
        assert!(!property.placeholder);
        assert!(property.published_at.is_none());
    }
}
