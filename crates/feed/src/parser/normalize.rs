//! Canonical normalization of decoded feed trees.
//!
//! One malformed record must never lose an entire feed: per-record
//! failures are logged and the record dropped, while the batch itself
//! only fails when no record container can be located at all.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::{ParseError, paths, rules};
use crate::model::{
    Address, Description, Features, GeoPoint, Image, Operation, OperationKind, Property, PropertyStatus,
};

/// Per-record normalization failures. Callers of [`normalize`] never see
/// these; the offending record is dropped from the batch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NormalizeError {
    #[error("record is not an object")]
    NotAnObject,

    #[error("record has no identity: no id field and nothing to derive one from")]
    NoIdentity,
}

/// Normalize a decoded feed tree into canonical records.
///
/// Records that fail to normalize are dropped with a warning. Duplicate
/// identifiers keep their first occurrence, so the returned collection
/// always has unique ids.
///
/// # Errors
///
/// `ParseError::NoContainer` when none of the known container shapes is
/// present in the tree.
pub fn normalize(tree: &Value) -> Result<Vec<Property>, ParseError> {
    let records = find_records(tree).ok_or(ParseError::NoContainer)?;

    let mut seen = HashSet::new();
    let mut properties = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match normalize_record(record) {
            Ok(property) => {
                if seen.insert(property.id.clone()) {
                    properties.push(property);
                } else {
                    tracing::warn!(id = %property.id, "duplicate identifier in feed, dropping record");
                }
            }
            Err(err) => tracing::warn!(index, %err, "dropping unnormalizable record"),
        }
    }
    Ok(properties)
}

fn find_records(tree: &Value) -> Option<Vec<&Value>> {
    if let Value::Array(items) = tree {
        return Some(items.iter().collect());
    }
    paths::list_at(tree, rules::CONTAINER_PATHS)
}

/// Normalize one record. Also used for partner API payloads, which carry
/// a single record in the same vocabulary.
pub fn normalize_record(record: &Value) -> Result<Property, NormalizeError> {
    if !record.is_object() {
        return Err(NormalizeError::NotAnObject);
    }

    let external_ref = paths::string_at(record, rules::EXTERNAL_REF_PATHS);
    let street = paths::string_at(record, rules::STREET_PATHS).unwrap_or_default();
    let postal_code = paths::string_at(record, rules::POSTAL_CODE_PATHS).unwrap_or_default();

    let id = match paths::string_at(record, rules::ID_PATHS) {
        Some(id) => id,
        None => synthesize_id(external_ref.as_deref(), &street, &postal_code)?,
    };

    let sale_price = paths::amount_at(record, rules::SALE_PRICE_PATHS);
    let rent_price = paths::amount_at(record, rules::RENT_PRICE_PATHS);
    let kind = operation_kind(record, sale_price, rent_price);
    let price = match kind {
        OperationKind::Sale => sale_price,
        OperationKind::Rent => rent_price,
    }
    .or_else(|| paths::amount_at(record, rules::PRICE_PATHS))
    .unwrap_or(0);
    let currency = paths::string_at(record, rules::CURRENCY_PATHS)
        .unwrap_or_else(|| rules::DEFAULT_CURRENCY.to_owned());

    let coordinates = match (
        paths::float_at(record, rules::LATITUDE_PATHS),
        paths::float_at(record, rules::LONGITUDE_PATHS),
    ) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
        _ => None,
    };

    let rooms = paths::count_at(record, rules::ROOM_PATHS)
        .or_else(|| paths::count_at(record, rules::BEDROOM_PATHS))
        .unwrap_or(0);

    Ok(Property {
        id,
        external_ref,
        operation: Operation { kind, price, currency },
        address: Address {
            street,
            city: paths::string_at(record, rules::CITY_PATHS)
                .unwrap_or_else(|| rules::CITY_PLACEHOLDER.to_owned()),
            province: paths::string_at(record, rules::PROVINCE_PATHS).unwrap_or_default(),
            postal_code,
            coordinates,
        },
        features: Features {
            rooms,
            bathrooms: paths::count_at(record, rules::BATHROOM_PATHS).unwrap_or(0),
            area_m2: paths::count_at(record, rules::AREA_PATHS).unwrap_or(0),
            floor: paths::string_at(record, rules::FLOOR_PATHS),
        },
        descriptions: descriptions(record),
        images: images(record),
        status: status(record),
        published_at: timestamp_at(record, rules::PUBLISHED_PATHS),
        updated_at: timestamp_at(record, rules::UPDATED_PATHS),
        placeholder: false,
    })
}

/// Stable identifier for records the feed ships without an id.
fn synthesize_id(external_ref: Option<&str>, street: &str, postal_code: &str) -> Result<String, NormalizeError> {
    if external_ref.is_none() && street.is_empty() && postal_code.is_empty() {
        return Err(NormalizeError::NoIdentity);
    }
    let mut hasher = Sha256::new();
    hasher.update(external_ref.unwrap_or_default().as_bytes());
    hasher.update(b"|");
    hasher.update(street.as_bytes());
    hasher.update(b"|");
    hasher.update(postal_code.as_bytes());
    Ok(format!("gen-{}", &hex::encode(hasher.finalize())[..16]))
}

fn operation_kind(record: &Value, sale_price: Option<u64>, rent_price: Option<u64>) -> OperationKind {
    if let Some(label) = paths::string_at(record, rules::OPERATION_PATHS) {
        match label.to_ascii_lowercase().as_str() {
            "sale" | "sell" | "buy" | "venta" => return OperationKind::Sale,
            "rent" | "rental" | "let" | "alquiler" => return OperationKind::Rent,
            _ => {}
        }
    }
    if rent_price.is_some() && sale_price.is_none() {
        OperationKind::Rent
    } else {
        OperationKind::Sale
    }
}

fn descriptions(record: &Value) -> Vec<Description> {
    let Some(blocks) = paths::list_at(record, rules::DESCRIPTION_LIST_PATHS) else {
        return Vec::new();
    };
    blocks
        .into_iter()
        .filter_map(|block| match block {
            Value::String(text) if !text.trim().is_empty() => Some(Description {
                language: rules::DEFAULT_LANGUAGE.to_owned(),
                text: text.trim().to_owned(),
            }),
            Value::Object(_) => {
                let text = paths::string_at(block, rules::DESCRIPTION_TEXT_PATHS)?;
                let language = paths::string_at(block, rules::DESCRIPTION_LANGUAGE_PATHS)
                    .unwrap_or_else(|| rules::DEFAULT_LANGUAGE.to_owned());
                Some(Description { language, text })
            }
            _ => None,
        })
        .collect()
}

fn images(record: &Value) -> Vec<Image> {
    let Some(entries) = paths::list_at(record, rules::IMAGE_LIST_PATHS) else {
        return Vec::new();
    };
    let mut images: Vec<Image> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let url = match entry {
                Value::String(url) if !url.trim().is_empty() => url.trim().to_owned(),
                Value::Object(_) => paths::string_at(entry, rules::IMAGE_URL_PATHS)?,
                _ => return None,
            };
            Some(Image {
                url,
                position: paths::count_at(entry, rules::IMAGE_POSITION_PATHS).unwrap_or(index as u32),
                tag: paths::string_at(entry, rules::IMAGE_TAG_PATHS),
                width: paths::count_at(entry, rules::IMAGE_WIDTH_PATHS),
                height: paths::count_at(entry, rules::IMAGE_HEIGHT_PATHS),
                size_bytes: paths::amount_at(entry, rules::IMAGE_SIZE_PATHS),
            })
        })
        .collect();
    images.sort_by_key(|image| image.position);
    images
}

fn status(record: &Value) -> PropertyStatus {
    match paths::string_at(record, rules::STATUS_PATHS).map(|label| label.to_ascii_lowercase()) {
        Some(label) if matches!(label.as_str(), "inactive" | "disabled" | "archived" | "0" | "false") => {
            PropertyStatus::Inactive
        }
        _ => PropertyStatus::Active,
    }
}

fn timestamp_at(record: &Value, candidates: &[&str]) -> Option<DateTime<Utc>> {
    let raw = paths::string_at(record, candidates)?;
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}
