//! Extraction rules: ordered candidate paths per canonical field.
//!
//! The publisher has shipped at least three container shapes and several
//! key spellings across feed revisions. Everything revision-specific is
//! data in this module; the resolver in `paths` evaluates it. Earlier
//! entries win, so the current revision's spelling goes first and legacy
//! spellings follow.

/// Known record-container shapes, most specific first. Bare collection
/// keys come last so a wrapper object is never mistaken for a record.
pub(super) const CONTAINER_PATHS: &[&str] = &[
    "properties/property",
    "feed/properties/property",
    "propertyList/property",
    "list/property",
    "properties",
    "feed/properties",
];

pub(super) const ID_PATHS: &[&str] = &["id", "propertyId", "property-id", "@id"];

pub(super) const EXTERNAL_REF_PATHS: &[&str] = &["externalRef", "external-ref", "reference", "ref"];

pub(super) const OPERATION_PATHS: &[&str] = &["operation", "operationType", "operation-type", "transaction"];

pub(super) const SALE_PRICE_PATHS: &[&str] = &[
    "prices/byOperation/sale/price",
    "prices/by-operation/sale/price",
    "operations/sale/price",
    "price/sale",
    "salePrice",
];

pub(super) const RENT_PRICE_PATHS: &[&str] = &[
    "prices/byOperation/rent/price",
    "prices/by-operation/rent/price",
    "operations/rent/price",
    "price/rent",
    "rentPrice",
];

pub(super) const PRICE_PATHS: &[&str] = &["price"];

pub(super) const CURRENCY_PATHS: &[&str] = &[
    "prices/byOperation/sale/currency",
    "prices/byOperation/rent/currency",
    "prices/currency",
    "currency",
];

pub(super) const STREET_PATHS: &[&str] = &["address/street", "location/address/line", "address/line", "street"];

pub(super) const CITY_PATHS: &[&str] = &["address/city", "location/address/city", "address/town", "city", "town"];

pub(super) const PROVINCE_PATHS: &[&str] =
    &["address/province", "location/address/province", "address/state", "province"];

pub(super) const POSTAL_CODE_PATHS: &[&str] = &[
    "address/postalCode",
    "address/postal-code",
    "address/zipcode",
    "postalCode",
    "zipcode",
    "zip",
];

pub(super) const LATITUDE_PATHS: &[&str] =
    &["address/coordinates/latitude", "coordinates/latitude", "geo/lat", "latitude", "lat"];

pub(super) const LONGITUDE_PATHS: &[&str] =
    &["address/coordinates/longitude", "coordinates/longitude", "geo/lng", "longitude", "lng"];

pub(super) const ROOM_PATHS: &[&str] = &[
    "property/housing/roomNumber",
    "property/housing/room-number",
    "housing/roomNumber",
    "roomNumber",
    "rooms",
];

/// Legacy revisions only published a bedroom count.
pub(super) const BEDROOM_PATHS: &[&str] =
    &["property/housing/bedroomNumber", "housing/bedroomNumber", "bedroomNumber", "bedrooms"];

pub(super) const BATHROOM_PATHS: &[&str] = &[
    "property/housing/bathroomNumber",
    "property/housing/bathroom-number",
    "housing/bathroomNumber",
    "bathroomNumber",
    "bathrooms",
];

pub(super) const AREA_PATHS: &[&str] = &[
    "property/housing/constructedArea",
    "property/housing/area",
    "housing/constructedArea",
    "constructedArea",
    "surface",
    "area",
];

pub(super) const FLOOR_PATHS: &[&str] = &["property/housing/floor", "housing/floor", "floor"];

pub(super) const DESCRIPTION_LIST_PATHS: &[&str] = &["descriptions/description", "descriptions", "description"];

pub(super) const DESCRIPTION_TEXT_PATHS: &[&str] = &["$text", "text", "value", "body"];

pub(super) const DESCRIPTION_LANGUAGE_PATHS: &[&str] = &["@language", "@lang", "language", "lang"];

pub(super) const IMAGE_LIST_PATHS: &[&str] = &[
    "multimedias/pictures/picture",
    "multimedias/pictures",
    "pictures/picture",
    "pictures",
    "images/image",
    "images",
];

pub(super) const IMAGE_URL_PATHS: &[&str] = &["path", "url", "@path", "@url", "src"];

pub(super) const IMAGE_POSITION_PATHS: &[&str] = &["@position", "position", "@order", "order"];

pub(super) const IMAGE_TAG_PATHS: &[&str] = &["@tag", "tag", "label"];

pub(super) const IMAGE_WIDTH_PATHS: &[&str] = &["@width", "width"];

pub(super) const IMAGE_HEIGHT_PATHS: &[&str] = &["@height", "height"];

pub(super) const IMAGE_SIZE_PATHS: &[&str] = &["@size", "size", "bytes"];

pub(super) const STATUS_PATHS: &[&str] = &["status", "state", "active"];

pub(super) const PUBLISHED_PATHS: &[&str] = &["publishedAt", "published", "creationDate", "created"];

pub(super) const UPDATED_PATHS: &[&str] = &["updatedAt", "modified", "lastUpdate", "lastModified"];

/// Documented fallback when no candidate path yields a city.
pub(super) const CITY_PLACEHOLDER: &str = "unknown";

pub(super) const DEFAULT_CURRENCY: &str = "EUR";

/// Description blocks without a language tag; the publisher's base
/// language.
pub(super) const DEFAULT_LANGUAGE: &str = "es";
