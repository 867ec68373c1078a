//! Decoding of Firestore's typed value encoding.
//!
//! The REST API wraps every value in a single-key object naming its type,
//! e.g. `{"integerValue": "42"}`. These helpers unwrap that encoding into
//! ordinary JSON so documents can be deserialized with `serde`.

use crate::error::FirestoreError;
use serde_json::{Map, Number, Value};

/// Decodes a document's `fields` object.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, FirestoreError> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

/// Decodes one typed value.
pub fn decode_value(value: &Value) -> Result<Value, FirestoreError> {
    let Some((kind, inner)) = value.as_object().and_then(|obj| obj.iter().next()) else {
        return Err(FirestoreError::UnsupportedValue(value.to_string()));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => Ok(Value::Bool(inner.as_bool().unwrap_or_default())),
        // 64-bit integers travel as strings.
        "integerValue" => {
            let parsed = match inner {
                Value::String(text) => text.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            parsed
                .map(|n| Value::Number(n.into()))
                .ok_or_else(|| FirestoreError::UnsupportedValue(format!("integerValue {inner}")))
        }
        // NaN and infinities arrive as strings and have no JSON form.
        "doubleValue" => Ok(inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "geoPointValue" => Ok(inner.clone()),
        "mapValue" => {
            let empty = Map::new();
            let fields = inner.get("fields").and_then(Value::as_object).unwrap_or(&empty);
            Ok(Value::Object(decode_fields(fields)?))
        }
        "arrayValue" => {
            let values = match inner.get("values").and_then(Value::as_array) {
                Some(values) => values.iter().map(decode_value).collect::<Result<Vec<_>, _>>()?,
                None => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        other => Err(FirestoreError::UnsupportedValue(other.to_string())),
    }
}
