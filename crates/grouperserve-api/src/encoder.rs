//! JSON response encoding.
//!
//! Output never contains `null` object fields: absent optional values are
//! dropped instead of being written out. Array elements are left alone.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Failed to encode response: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// Serialize `value` to JSON, pretty-printed when `pretty` is set.
pub fn encode<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, EncodeError> {
    let mut json = serde_json::to_value(value)?;
    strip_nulls(&mut json);
    let text = if pretty {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    Ok(text)
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}
