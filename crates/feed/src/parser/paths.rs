//! Generic path resolution over the decoded tree.
//!
//! One resolver serves every extraction rule: `/`-separated segments,
//! case-insensitive key matching, and singleton-array unwrapping so the
//! scalar-vs-singleton-list ambiguity introduced by the decode step never
//! reaches extraction code.

use serde_json::Value;

/// Collapse `[x]` wrappers down to `x`. Arrays with more than one
/// element are left alone.
pub(super) fn unwrap_singleton(value: &Value) -> &Value {
    match value {
        Value::Array(items) if items.len() == 1 => unwrap_singleton(&items[0]),
        _ => value,
    }
}

fn walk<'a>(record: &'a Value, path: &str, unwrap: bool) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split('/') {
        if unwrap {
            current = unwrap_singleton(current);
        }
        let object = current.as_object()?;
        let (_, child) = object.iter().find(|(key, _)| key.eq_ignore_ascii_case(segment))?;
        current = child;
    }
    Some(current)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
        _ => false,
    }
}

/// First candidate path holding a present, non-empty value.
pub(super) fn first_present<'a>(record: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|path| walk(record, path, true).map(unwrap_singleton))
        .find(|value| !is_empty(value))
}

/// String extraction; numbers and booleans are stringified.
pub(super) fn string_at(record: &Value, candidates: &[&str]) -> Option<String> {
    match first_present(record, candidates)? {
        Value::String(text) => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Integer extraction tolerant of currency symbols and separators: every
/// non-digit character is stripped before parsing.
pub(super) fn amount_at(record: &Value, candidates: &[&str]) -> Option<u64> {
    let raw = match first_present(record, candidates)? {
        Value::Number(number) => {
            return number
                .as_u64()
                .or_else(|| number.as_f64().map(|float| float.max(0.0) as u64));
        }
        Value::String(text) => text,
        _ => return None,
    };
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() { None } else { digits.parse().ok() }
}

/// Small-count extraction (rooms, positions, pixel sizes).
pub(super) fn count_at(record: &Value, candidates: &[&str]) -> Option<u32> {
    amount_at(record, candidates).map(|amount| amount.min(u64::from(u32::MAX)) as u32)
}

/// Decimal extraction for coordinates; tolerates comma decimals.
pub(super) fn float_at(record: &Value, candidates: &[&str]) -> Option<f64> {
    match first_present(record, candidates)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

/// Resolve a list-valued path: the first candidate that leads to an
/// array, object, or scalar yields the element list. A lone object or
/// string is a one-element list; an explicit null is an empty list.
///
/// Unlike scalar resolution this walk never unwraps singleton arrays:
/// the list itself is the value being looked for.
pub(super) fn list_at<'a>(record: &'a Value, candidates: &[&str]) -> Option<Vec<&'a Value>> {
    for path in candidates {
        match walk(record, path, false) {
            Some(Value::Array(items)) => return Some(items.iter().collect()),
            Some(value @ (Value::Object(_) | Value::String(_))) => return Some(vec![value]),
            Some(Value::Null) => return Some(Vec::new()),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_at_case_insensitive() {
        let record = json!({"Prices": {"ByOperation": {"SALE": {"Price": "125000"}}}});
        let value = string_at(&record, &["prices/byOperation/sale/price"]);
        assert_eq!(value, Some("125000".to_owned()));
    }

    #[test]
    fn test_string_at_unwraps_singleton_arrays() {
        let record = json!({"address": [{"city": ["Valencia"]}]});
        assert_eq!(string_at(&record, &["address/city"]), Some("Valencia".to_owned()));
    }

    #[test]
    fn test_first_present_skips_empty_values() {
        let record = json!({"reference": "", "ref": "ab-12"});
        assert_eq!(string_at(&record, &["reference", "ref"]), Some("ab-12".to_owned()));
    }

    #[test]
    fn test_amount_at_strips_noise() {
        let record = json!({"price": "1.250.000 \u{20ac}"});
        assert_eq!(amount_at(&record, &["price"]), Some(1_250_000));
    }

    #[test]
    fn test_amount_at_plain_number() {
        let record = json!({"price": 98000});
        assert_eq!(amount_at(&record, &["price"]), Some(98_000));
    }

    #[test]
    fn test_amount_at_negative_number_clamps() {
        let record = json!({"price": -5});
        assert_eq!(amount_at(&record, &["price"]), Some(0));
    }

    #[test]
    fn test_amount_at_no_digits() {
        let record = json!({"price": "call us"});
        assert_eq!(amount_at(&record, &["price"]), None);
    }

    #[test]
    fn test_float_at_comma_decimal() {
        let record = json!({"latitude": "39,4699"});
        assert_eq!(float_at(&record, &["latitude"]), Some(39.4699));
    }

    #[test]
    fn test_list_at_array() {
        let record = json!({"pictures": {"picture": ["a.jpg", "b.jpg"]}});
        let items = list_at(&record, &["pictures/picture"]).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_list_at_lone_object_is_one_element() {
        let record = json!({"pictures": {"picture": {"path": "a.jpg"}}});
        let items = list_at(&record, &["pictures/picture"]).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_list_at_null_is_empty() {
        let record = json!({"pictures": null});
        let items = list_at(&record, &["pictures/picture", "pictures"]).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_list_at_absent() {
        let record = json!({"other": 1});
        assert!(list_at(&record, &["pictures"]).is_none());
    }
}
