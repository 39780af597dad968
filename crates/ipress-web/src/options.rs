//! JS option objects to [`PressConfig`].
//!
//! The binding JSON-stringifies whatever object the page passed and decodes
//! it here, so this module has no `wasm-bindgen` dependency and is tested
//! natively.
//!
//! Rules:
//! - unknown keys are ignored;
//! - `null` means "not set", like a missing key;
//! - `maxPressMs` accepts any number: non-positive or non-finite means
//!   unlimited, fractions round down (clock readings are whole milliseconds).

use ipress_core::{ConfigError, PressConfig};
use serde_json::{Map, Value};

const MAX_PRESS_KEY: &str = "maxPressMs";

/// Decode an options payload. An empty string means "no options".
pub fn parse_options(json: &str) -> Result<PressConfig, ConfigError> {
    if json.trim().is_empty() {
        return Ok(PressConfig::default());
    }
    let value: Value =
        serde_json::from_str(json).map_err(|err| ConfigError::Malformed(err.to_string()))?;
    options_from_value(value)
}

/// Decode an already-parsed options value.
pub fn options_from_value(value: Value) -> Result<PressConfig, ConfigError> {
    let mut map = match value {
        Value::Null => return Ok(PressConfig::default()),
        Value::Object(map) => map,
        other => {
            return Err(ConfigError::Malformed(format!(
                "options must be an object, got {}",
                type_name(&other)
            )));
        }
    };
    map.retain(|_, v| !v.is_null());
    normalize_max_press(&mut map)?;

    serde_json::from_value(Value::Object(map)).map_err(|err| ConfigError::Malformed(err.to_string()))
}

fn normalize_max_press(map: &mut Map<String, Value>) -> Result<(), ConfigError> {
    let Some(raw) = map.get(MAX_PRESS_KEY) else {
        return Ok(());
    };
    let Some(ms) = raw.as_f64() else {
        return Err(ConfigError::Malformed(format!(
            "{MAX_PRESS_KEY} must be a number, got {}",
            type_name(raw)
        )));
    };
    let ms = if ms.is_finite() && ms > 0.0 {
        ms.floor().min(f64::from(u32::MAX))
    } else {
        0.0
    };
    map.insert(MAX_PRESS_KEY.to_owned(), Value::from(ms as u32));
    Ok(())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
