pub mod amortization;
pub mod listing;
pub mod quoting;
pub mod servicing;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse an upper-case wire enum (e.g. `REPAYMENT`, `PAID_OFF`) from a flag.
pub(crate) fn parse_enum<T: DeserializeOwned>(
    flag: &str,
    raw: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    let normalized = raw.trim().replace('-', "_").to_uppercase();
    serde_json::from_value(Value::String(normalized))
        .map_err(|_| format!("--{flag}: unrecognised value '{raw}'").into())
}

/// Insert `value` under `key` unless the input already carries one.
pub(crate) fn default_key(input: &mut Value, key: &str, value: Value) {
    if let Some(obj) = input.as_object_mut() {
        obj.entry(key).or_insert(value);
    }
}
