use serde_json::Value;

use crate::models::PlaceRecord;

/// Normalize one decoded JSON element into a [`PlaceRecord`].
///
/// Returns `None` when the element has no usable `name`; that is the only
/// reason a record is dropped. Bad coordinates only clear `geolocatable`.
pub fn normalize(raw: &Value) -> Option<PlaceRecord> {
    let Some(object) = raw.as_object() else {
        tracing::debug!(kind = %value_kind(raw), "Dropping non-object place entry");
        return None;
    };

    let name = object
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let Some(name) = name else {
        tracing::debug!("Dropping place entry without a name");
        return None;
    };

    let latitude = object.get("latitude").and_then(coerce_number);
    let longitude = object.get("longitude").and_then(coerce_number);

    let description = object
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let price = object.get("price").and_then(|price| match price {
        Value::String(label) => Some(label.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let place = PlaceRecord::new(name, latitude, longitude, description, price);
    if !place.geolocatable {
        tracing::debug!(name = %place.name, "Place has no usable coordinates");
    }
    Some(place)
}

/// Normalize every element, keeping order and skipping dropped entries.
pub fn normalize_all(raw: &[Value]) -> Vec<PlaceRecord> {
    raw.iter().filter_map(normalize).collect()
}

/// Numbers pass through; numeric strings such as `"37.57"` are parsed.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
